use crate::Pipeline;
use env_logger::filter::{Builder as FilterBuilder, Filter};
use log::LevelFilter;
use parking_lot::RwLock;
use std::{fmt, sync::Arc};

/// Tag mode of records received through the `log` facade
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) enum TagMode {
    /// Use the records target metadata as tag
    Target,
    /// Use root module as tag. The target field contains the module path
    /// if not overwritten. Use the root module as tag. e.g a target of
    /// `crate::module::submodule` will be `crate`.
    #[default]
    TargetStrip,
    /// Custom fixed tag string
    Custom(String),
}

impl TagMode {
    /// Tag for a record with `target`.
    pub(crate) fn resolve<'a>(&'a self, target: &'a str) -> &'a str {
        match self {
            TagMode::Target => target,
            TagMode::TargetStrip => target.split_once("::").map(|(tag, _)| tag).unwrap_or(target),
            TagMode::Custom(tag) => tag.as_str(),
        }
    }
}

/// Settings of the `log` bridge that can change at runtime.
pub(crate) struct Configuration {
    pub(crate) filter: Filter,
    pub(crate) tag: TagMode,
    pub(crate) prepend_module: bool,
}

impl Configuration {
    pub(crate) fn new(filter: Filter, tag: TagMode, prepend_module: bool) -> Self {
        Self {
            filter,
            tag,
            prepend_module,
        }
    }
}

/// Logger configuration handle.
///
/// Returned from [`Builder::init`](crate::Builder::init). Changes apply to
/// all records logged through the `log` facade after the call.
#[derive(Clone)]
pub struct Logger {
    configuration: Arc<RwLock<Configuration>>,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let configuration = self.configuration.read();
        f.debug_struct("Logger")
            .field("tag", &configuration.tag)
            .field("prepend_module", &configuration.prepend_module)
            .field("max_level", &configuration.filter.filter())
            .finish()
    }
}

impl Logger {
    pub(crate) fn new(configuration: Arc<RwLock<Configuration>>) -> Self {
        Self { configuration }
    }

    /// The pipeline records are routed to.
    pub fn pipeline(&self) -> &'static Pipeline {
        crate::pipeline()
    }

    /// Use a fixed tag.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// let logger = adapter_logger::builder().init();
    /// logger.tag("foo");
    /// ```
    pub fn tag(&self, tag: &str) -> &Self {
        self.configuration.write().tag = TagMode::Custom(tag.to_string());
        self
    }

    /// Use the target string as tag
    pub fn tag_target(&self) -> &Self {
        self.configuration.write().tag = TagMode::Target;
        self
    }

    /// Use the target string as tag and strip off ::.*
    pub fn tag_target_strip(&self) -> &Self {
        self.configuration.write().tag = TagMode::TargetStrip;
        self
    }

    /// Prepend the module path to the message.
    pub fn prepend_module(&self, prepend_module: bool) -> &Self {
        self.configuration.write().prepend_module = prepend_module;
        self
    }

    /// Replace the filter with a single level for all modules.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use log::LevelFilter;
    /// let logger = adapter_logger::builder().init();
    /// logger.filter_level(LevelFilter::Warn);
    /// ```
    pub fn filter_level(&self, level: LevelFilter) -> &Self {
        self.set_filter(FilterBuilder::new().filter_level(level).build());
        self
    }

    /// Replace the filter with a level for a single module.
    pub fn filter_module(&self, module: &str, level: LevelFilter) -> &Self {
        self.set_filter(FilterBuilder::new().filter_module(module, level).build());
        self
    }

    /// Replace the filter with directives in the `RUST_LOG` syntax.
    pub fn parse_filters(&self, filters: &str) -> &Self {
        self.set_filter(FilterBuilder::new().parse(filters).build());
        self
    }

    fn set_filter(&self, filter: Filter) {
        log::set_max_level(filter.filter());
        self.configuration.write().filter = filter;
    }
}
