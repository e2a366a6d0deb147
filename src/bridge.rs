use crate::{config::Configuration, Level, Pipeline};
use log::{Log, Metadata, Record};
use parking_lot::RwLock;
use std::sync::Arc;

/// `log` facade backend that routes records into a [`Pipeline`].
pub(crate) struct LogBridge {
    configuration: Arc<RwLock<Configuration>>,
    pipeline: &'static Pipeline,
}

impl LogBridge {
    pub fn new(configuration: Arc<RwLock<Configuration>>, pipeline: &'static Pipeline) -> LogBridge {
        LogBridge {
            configuration,
            pipeline,
        }
    }
}

impl Log for LogBridge {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.configuration.read().filter.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        // The configuration lock is released before dispatching. Adapters are
        // free to reconfigure the logger.
        let (tag, message) = {
            let configuration = self.configuration.read();
            if !configuration.filter.matches(record) {
                return;
            }

            let args = record.args().to_string();
            let message = match record.module_path() {
                Some(module_path) if configuration.prepend_module => [module_path, &args].join(": "),
                _ => args,
            };
            (configuration.tag.resolve(record.target()).to_string(), message)
        };

        let level: Level = record.level().into();
        self.pipeline.emit_message(level, Some(&tag), &message);
    }

    fn flush(&self) {
        self.pipeline.flush();
    }
}
