//! `adapter-logger`
//!
//! A tag aware logging facade. Messages are formatted from a template and
//! positional arguments, split into chunks of at most 2001 characters and
//! handed to every registered [`Adapter`] that accepts them.
//!
//! ```
//! use adapter_logger::{info, pipeline, ConsoleAdapter};
//!
//! pipeline().add_adapter(ConsoleAdapter::new());
//! info!("hello %s", "world");
//! info!(tag: "net", "%d bytes received", 1024);
//! ```
//!
//! Records of the `log` crate can be routed into the same pipeline with
//! [`builder`].

#![deny(missing_docs)]

use config::{Configuration, TagMode};
use env_logger::filter::Builder as FilterBuilder;
use log::{set_boxed_logger, LevelFilter, SetLoggerError};
use parking_lot::RwLock;
use std::{env, fmt, io, sync::Arc};
use thiserror::Error;

mod adapter;
mod bridge;
mod chunk;
mod config;
mod console;
mod filter;
mod format;
mod level;
#[cfg(unix)]
mod logd;
mod pipeline;
#[cfg(test)]
mod testing;
mod thread;

pub use adapter::Adapter;
pub use chunk::MAX_LINE_CHARS;
pub use config::Logger;
pub use console::ConsoleAdapter;
pub use filter::FilterAdapter;
pub use format::{format, FormatError, Value};
pub use level::Level;
#[cfg(unix)]
pub use logd::{Buffer, LogdAdapter, LOGDW};
pub use pipeline::{Pipeline, EMPTY_MESSAGE};

/// Error
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Timestamp error
    #[error("Timestamp error: {0}")]
    Timestamp(String),
}

lazy_static::lazy_static! {
    static ref PIPELINE: Pipeline = Pipeline::new();
}

/// The process wide pipeline.
///
/// Created enabled and without adapters on first use. Lives until the
/// process exits.
pub fn pipeline() -> &'static Pipeline {
    &*PIPELINE
}

/// Returns a default [`Builder`] for configuration and initialization of logging.
///
/// With the help of the [`Builder`] the `log` facade is routed into the
/// process wide [`pipeline`]. The tag, filter and adapters can be set.
/// Additionally it is possible to set whether the module path appears in a log message.
///
/// After a call to [`init`](Builder::init) the global logger is initialized with the configuration.
pub fn builder() -> Builder {
    Builder::default()
}

/// Builder for initializing logger
///
/// The builder is used to initialize the logging framework for later use.
pub struct Builder {
    filter: FilterBuilder,
    tag: TagMode,
    prepend_module: bool,
    adapters: Vec<Arc<dyn Adapter>>,
    enabled: bool,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            filter: FilterBuilder::default(),
            tag: TagMode::default(),
            prepend_module: false,
            adapters: Vec::new(),
            enabled: true,
        }
    }
}

impl fmt::Debug for Builder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("tag", &self.tag)
            .field("prepend_module", &self.prepend_module)
            .field("adapters", &self.adapters.len())
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl Builder {
    /// Initializes the log builder with defaults.
    ///
    /// # Examples
    ///
    /// Create a new builder and configure filters and style:
    ///
    /// ```no_run
    /// # use log::LevelFilter;
    /// # use adapter_logger::Builder;
    ///
    /// let mut builder = Builder::new();
    /// builder.filter(None, LevelFilter::Info).init();
    /// ```
    pub fn new() -> Builder {
        Builder::default()
    }

    /// Use a specific log tag. If no tag is set the root module of the
    /// record target is used as tag.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use adapter_logger::Builder;
    ///
    /// let mut builder = Builder::new();
    ///
    /// builder.tag("foo")
    ///     .init();
    /// ```
    pub fn tag(&mut self, tag: &str) -> &mut Self {
        self.tag = TagMode::Custom(tag.to_string());
        self
    }

    /// Use the target string as tag
    pub fn tag_target(&mut self) -> &mut Self {
        self.tag = TagMode::Target;
        self
    }

    /// Use the target string as tag and strip off ::.*
    pub fn tag_target_strip(&mut self) -> &mut Self {
        self.tag = TagMode::TargetStrip;
        self
    }

    /// Prepend module to log message.
    ///
    /// If set true the Rust module path is prepended to the log message.
    pub fn prepend_module(&mut self, prepend_module: bool) -> &mut Self {
        self.prepend_module = prepend_module;
        self
    }

    /// Adds a directive to the filter for a specific module.
    ///
    /// # Examples
    ///
    /// Only include messages for info and above for logs in `path::to::module`:
    ///
    /// ```no_run
    /// # use log::LevelFilter;
    /// # use adapter_logger::Builder;
    ///
    /// let mut builder = Builder::new();
    ///
    /// builder.filter_module("path::to::module", LevelFilter::Info).init();
    /// ```
    pub fn filter_module(&mut self, module: &str, level: LevelFilter) -> &mut Self {
        self.filter.filter_module(module, level);
        self
    }

    /// Adds a directive to the filter for all modules.
    pub fn filter_level(&mut self, level: LevelFilter) -> &mut Self {
        self.filter.filter_level(level);
        self
    }

    /// Adds filters to the logger.
    ///
    /// The given module (if any) will log at most the specified level provided.
    /// If no module is provided then the filter will apply to all log messages.
    pub fn filter(&mut self, module: Option<&str>, level: LevelFilter) -> &mut Self {
        self.filter.filter(module, level);
        self
    }

    /// Parses the directives string in the same form as the `RUST_LOG`
    /// environment variable.
    pub fn parse_filters(&mut self, filters: &str) -> &mut Self {
        self.filter.parse(filters);
        self
    }

    /// Parses the directives of the environment variable `var`, if set.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use adapter_logger::Builder;
    /// Builder::new().parse_env("RUST_LOG").init();
    /// ```
    pub fn parse_env(&mut self, var: &str) -> &mut Self {
        if let Ok(filters) = env::var(var) {
            self.filter.parse(&filters);
        }
        self
    }

    /// Registers an adapter at the pipeline on initialization.
    pub fn adapter<A: Adapter + 'static>(&mut self, adapter: A) -> &mut Self {
        self.adapters.push(Arc::new(adapter));
        self
    }

    /// Registers a shared adapter at the pipeline on initialization.
    pub fn shared_adapter(&mut self, adapter: Arc<dyn Adapter>) -> &mut Self {
        self.adapters.push(adapter);
        self
    }

    /// Enables or disables the pipeline on initialization. Enabled by default.
    pub fn enabled(&mut self, enabled: bool) -> &mut Self {
        self.enabled = enabled;
        self
    }

    /// Initializes the global logger and routes it into the process wide
    /// [`pipeline`].
    ///
    /// This should be called early in the execution of a Rust program. Any log
    /// events that occur before initialization will be ignored.
    ///
    /// # Errors
    ///
    /// This function will fail if it is called more than once, or if another
    /// library has already initialized a global logger.
    pub fn try_init(&mut self) -> Result<Logger, SetLoggerError> {
        let configuration = Configuration::new(self.filter.build(), self.tag.clone(), self.prepend_module);
        let max_level = configuration.filter.filter();
        let configuration = Arc::new(RwLock::new(configuration));

        let logger = Logger::new(configuration.clone());
        let bridge = bridge::LogBridge::new(configuration, pipeline());

        set_boxed_logger(Box::new(bridge))?;
        log::set_max_level(max_level);

        let pipeline = pipeline();
        pipeline.set_enabled(self.enabled);
        self.adapters
            .drain(..)
            .for_each(|adapter| pipeline.add_shared_adapter(adapter));

        Ok(logger)
    }

    /// Initializes the global logger with the built logger.
    ///
    /// This should be called early in the execution of a Rust program. Any log
    /// events that occur before initialization will be ignored.
    ///
    /// # Panics
    ///
    /// This function will panic if it is called more than once, or if another
    /// library has already initialized a global logger.
    pub fn init(&mut self) -> Logger {
        self.try_init()
            .expect("Builder::init should not be called after logger initialized")
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! __emit {
    ($level:expr, tag: $tag:expr, $($rest:tt)+) => {{
        $crate::pipeline().tag($tag);
        $crate::__emit!($level, $($rest)+)
    }};
    ($level:expr, $template:expr $(,)?) => {
        $crate::pipeline().emit($level, None, $template, &[])
    };
    ($level:expr, $template:expr, $($arg:expr),+ $(,)?) => {
        $crate::pipeline().emit($level, None, $template, &[$($crate::Value::from($arg)),+])
    };
}

/// Logs at [`Level::Verbose`] through the process wide pipeline.
///
/// Takes a template and positional arguments, optionally preceded by a
/// one-shot tag: `verbose!(tag: "net", "%d bytes", 5)`.
#[macro_export]
macro_rules! verbose {
    ($($arg:tt)+) => {
        $crate::__emit!($crate::Level::Verbose, $($arg)+)
    };
}

/// Logs at [`Level::Debug`] through the process wide pipeline.
#[macro_export]
macro_rules! debug {
    ($($arg:tt)+) => {
        $crate::__emit!($crate::Level::Debug, $($arg)+)
    };
}

/// Logs at [`Level::Info`] through the process wide pipeline.
#[macro_export]
macro_rules! info {
    ($($arg:tt)+) => {
        $crate::__emit!($crate::Level::Info, $($arg)+)
    };
}

/// Logs at [`Level::Warn`] through the process wide pipeline.
#[macro_export]
macro_rules! warn {
    ($($arg:tt)+) => {
        $crate::__emit!($crate::Level::Warn, $($arg)+)
    };
}

/// Logs at [`Level::Error`] through the process wide pipeline.
#[macro_export]
macro_rules! error {
    ($($arg:tt)+) => {
        $crate::__emit!($crate::Level::Error, $($arg)+)
    };
}

/// Logs at [`Level::Assert`] through the process wide pipeline.
#[macro_export]
macro_rules! wtf {
    ($($arg:tt)+) => {
        $crate::__emit!($crate::Level::Assert, $($arg)+)
    };
}
