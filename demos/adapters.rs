use adapter_logger::{pipeline, Adapter, ConsoleAdapter, Error, FilterAdapter, Level};
use std::io;

/// Counts the chunks it receives.
struct Counter(std::sync::atomic::AtomicUsize);

impl Adapter for Counter {
    fn emit(&self, _level: Level, _tag: Option<&str>, _text: &str) -> Result<(), Error> {
        self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        Ok(())
    }
}

fn main() {
    let counter = std::sync::Arc::new(Counter(Default::default()));

    let pipeline = pipeline();
    pipeline.add_adapter(FilterAdapter::new(ConsoleAdapter::new(), "info,net=verbose"));
    pipeline.add_shared_adapter(counter.clone());

    adapter_logger::info!("hello %s", "world");
    adapter_logger::verbose!(tag: "net", "%d bytes from %s", 512, "10.0.0.1");
    adapter_logger::debug!("not shown on the console");

    // Split into chunks of 2001 characters
    adapter_logger::warn!("%s", "x".repeat(5000));

    let error = io::Error::new(io::ErrorKind::NotFound, "config.toml");
    pipeline.error_with(&error, "failed to load %s", &["config".into()]);

    pipeline.json(r#"{"user": "alice", "roles": ["admin", "dev"]}"#);
    pipeline.xml(r#"<user name="alice"><role>admin</role><role>dev</role></user>"#);

    pipeline.set_enabled(false);
    adapter_logger::wtf!("dropped");
    pipeline.set_enabled(true);

    adapter_logger::info!("%d chunks emitted", counter.0.load(std::sync::atomic::Ordering::Relaxed));
}
