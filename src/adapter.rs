use crate::{Error, Level};
use std::sync::Arc;

/// Output sink of the pipeline.
///
/// An adapter decides per message whether it wants it ([`accepts`]) and
/// writes accepted text ([`emit`]). The pipeline hands over messages that are
/// already formatted and chunked, so `emit` is called once per chunk.
///
/// Errors returned from `emit` and panics raised by an adapter are contained
/// by the pipeline. The other adapters still receive the message.
///
/// # Example
///
/// ```
/// # use adapter_logger::{Adapter, Error, Level, Pipeline};
/// struct Stdout;
///
/// impl Adapter for Stdout {
///     fn accepts(&self, level: Level, _tag: Option<&str>) -> bool {
///         level >= Level::Info
///     }
///
///     fn emit(&self, level: Level, tag: Option<&str>, text: &str) -> Result<(), Error> {
///         println!("{} {}: {}", level, tag.unwrap_or_default(), text);
///         Ok(())
///     }
/// }
///
/// let pipeline = Pipeline::new();
/// pipeline.add_adapter(Stdout);
/// pipeline.info("hello %s", &["world".into()]);
/// ```
///
/// [`accepts`]: Adapter::accepts
/// [`emit`]: Adapter::emit
pub trait Adapter: Send + Sync {
    /// Filter. Defaults to accepting everything.
    fn accepts(&self, _level: Level, _tag: Option<&str>) -> bool {
        true
    }

    /// Write one chunk of text.
    fn emit(&self, level: Level, tag: Option<&str>, text: &str) -> Result<(), Error>;

    /// Flush buffered output, if any.
    fn flush(&self) {}
}

impl<A: Adapter + ?Sized> Adapter for Box<A> {
    fn accepts(&self, level: Level, tag: Option<&str>) -> bool {
        (**self).accepts(level, tag)
    }

    fn emit(&self, level: Level, tag: Option<&str>, text: &str) -> Result<(), Error> {
        (**self).emit(level, tag, text)
    }

    fn flush(&self) {
        (**self).flush()
    }
}

impl<A: Adapter + ?Sized> Adapter for Arc<A> {
    fn accepts(&self, level: Level, tag: Option<&str>) -> bool {
        (**self).accepts(level, tag)
    }

    fn emit(&self, level: Level, tag: Option<&str>, text: &str) -> Result<(), Error> {
        (**self).emit(level, tag, text)
    }

    fn flush(&self) {
        (**self).flush()
    }
}
