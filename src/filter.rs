use crate::{Adapter, Error, Level};
use env_logger::filter::{Builder as FilterBuilder, Filter};
use log::Metadata;

/// Restricts an adapter with `RUST_LOG` style directives.
///
/// The message tag takes the role of the module path: `net=debug` lets
/// messages tagged `net` (or any tag starting with `net`) through from
/// [`Level::Debug`] on. Untagged messages only match directives without a
/// name. An empty directive string admits errors only.
///
/// # Example
///
/// ```
/// # use adapter_logger::{ConsoleAdapter, FilterAdapter, Pipeline};
/// let pipeline = Pipeline::new();
/// pipeline.add_adapter(FilterAdapter::new(ConsoleAdapter::new(), "warn,net=debug"));
/// ```
pub struct FilterAdapter<A> {
    inner: A,
    filter: Filter,
}

impl<A: Adapter> FilterAdapter<A> {
    /// Parses `filters` and wraps `inner`.
    pub fn new(inner: A, filters: &str) -> Self {
        Self::with_filter(inner, FilterBuilder::new().parse(filters).build())
    }

    /// Wraps `inner` with a prebuilt filter.
    pub fn with_filter(inner: A, filter: Filter) -> Self {
        FilterAdapter { inner, filter }
    }
}

impl<A: Adapter> Adapter for FilterAdapter<A> {
    fn accepts(&self, level: Level, tag: Option<&str>) -> bool {
        let metadata = Metadata::builder()
            .level(level.into())
            .target(tag.unwrap_or_default())
            .build();
        self.filter.enabled(&metadata) && self.inner.accepts(level, tag)
    }

    fn emit(&self, level: Level, tag: Option<&str>, text: &str) -> Result<(), Error> {
        self.inner.emit(level, tag, text)
    }

    fn flush(&self) {
        self.inner.flush()
    }
}
