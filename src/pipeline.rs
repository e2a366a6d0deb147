use crate::{
    chunk::{max_chunk_chars, CharChunkIterator},
    format::{format, Value},
    Adapter, Level,
};
use parking_lot::{ReentrantMutex, RwLock};
use quick_xml::{events::Event, Reader, Writer};
use std::{
    borrow::Cow,
    cell::RefCell,
    collections::HashMap,
    error::Error as StdError,
    fmt, mem,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
};

/// Text logged in place of an empty message.
pub const EMPTY_MESSAGE: &str = "Empty/NULL log message";

/// Separates a message from the appended error chain.
const ERROR_SEPARATOR: &str = " : ";

/// Characters of a message quoted in adapter failure reports.
const EXCERPT_CHARS: usize = 40;

type Adapters = Arc<Vec<Arc<dyn Adapter>>>;

static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

thread_local! {
    /// One-shot tags of the current thread by pipeline id. Dropped with the thread.
    static TAGS: RefCell<HashMap<usize, PendingTag>> = RefCell::new(HashMap::new());
}

/// A one-shot tag that is counted as pending until it is taken or dropped.
struct PendingTag {
    tag: String,
    pending: Arc<AtomicUsize>,
}

impl PendingTag {
    fn new(tag: &str, pending: &Arc<AtomicUsize>) -> PendingTag {
        pending.fetch_add(1, Ordering::SeqCst);
        PendingTag {
            tag: tag.to_string(),
            pending: pending.clone(),
        }
    }

    fn into_tag(mut self) -> String {
        mem::take(&mut self.tag)
    }
}

impl Drop for PendingTag {
    fn drop(&mut self) {
        self.pending.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Log message pipeline.
///
/// Formats a template with its arguments, appends an optional error, splits
/// the result into chunks of at most 2001 characters (minus the tag length)
/// and hands every chunk to each registered [`Adapter`] that accepts it.
///
/// The whole format, chunk and dispatch sequence of one call is serialized
/// against other calls, so chunks of concurrent messages never interleave.
/// The serialization lock is re-entrant: an adapter may log through the same
/// pipeline from within [`Adapter::emit`].
///
/// The process wide instance is available through [`pipeline`](crate::pipeline).
/// Independent instances can be created with [`Pipeline::new`].
pub struct Pipeline {
    /// Registered adapters. Every call dispatches to a snapshot of the list.
    adapters: RwLock<Adapters>,
    enabled: AtomicBool,
    /// Key of this instance in the thread local tag maps
    id: usize,
    pending_tags: Arc<AtomicUsize>,
    serial: ReentrantMutex<()>,
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        TAGS.try_with(|tags| tags.borrow_mut().remove(&self.id)).ok();
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("adapters", &self.adapter_count())
            .field("enabled", &self.is_enabled())
            .field("pending_tags", &self.pending_tags())
            .finish()
    }
}

impl Pipeline {
    /// Creates an enabled pipeline without adapters.
    pub fn new() -> Pipeline {
        Pipeline {
            adapters: RwLock::new(Arc::default()),
            enabled: AtomicBool::new(true),
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            pending_tags: Arc::default(),
            serial: ReentrantMutex::new(()),
        }
    }

    /// Sets a one-shot tag for the next message logged by the calling thread.
    ///
    /// `None` and empty tags are ignored.
    pub fn set_tag(&self, tag: Option<&str>) -> &Self {
        if let Some(tag) = tag.filter(|t| !t.is_empty()) {
            let pending = PendingTag::new(tag, &self.pending_tags);
            // Fails only while the thread is shutting down. The tag is dropped then.
            TAGS.try_with(|tags| tags.borrow_mut().insert(self.id, pending)).ok();
        }
        self
    }

    /// Sets a one-shot tag for the next message logged by the calling thread.
    ///
    /// # Example
    ///
    /// ```
    /// # use adapter_logger::Pipeline;
    /// let pipeline = Pipeline::new();
    /// pipeline.tag("network").info("connected to %s", &["10.0.0.1".into()]);
    /// ```
    pub fn tag(&self, tag: &str) -> &Self {
        self.set_tag(Some(tag))
    }

    fn take_tag(&self) -> Option<String> {
        TAGS.try_with(|tags| tags.borrow_mut().remove(&self.id))
            .ok()
            .flatten()
            .map(PendingTag::into_tag)
    }

    /// Number of one-shot tags that are set and not yet consumed, over all
    /// threads. Tags of threads that exit without logging are released with
    /// the thread.
    pub fn pending_tags(&self) -> usize {
        self.pending_tags.load(Ordering::SeqCst)
    }

    /// Appends an adapter. Dispatch follows registration order.
    pub fn add_adapter<A: Adapter + 'static>(&self, adapter: A) {
        self.add_shared_adapter(Arc::new(adapter));
    }

    /// Appends an adapter that is shared with the caller.
    pub fn add_shared_adapter(&self, adapter: Arc<dyn Adapter>) {
        let mut adapters = self.adapters.write();
        Arc::make_mut(&mut *adapters).push(adapter);
    }

    /// Removes all adapters.
    pub fn clear_adapters(&self) {
        *self.adapters.write() = Arc::default();
    }

    /// Number of registered adapters.
    pub fn adapter_count(&self) -> usize {
        self.adapters.read().len()
    }

    /// Enables or disables the pipeline. A disabled pipeline drops every
    /// message and leaves pending one-shot tags untouched.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Returns true if messages are dispatched.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    fn snapshot(&self) -> Adapters {
        self.adapters.read().clone()
    }

    /// Logs a message.
    ///
    /// `template` is formatted with `args` unless `args` is empty, in which
    /// case it is used verbatim. A template that fails to format is logged
    /// as is. The chain of `error` is appended to the message.
    pub fn emit(&self, level: Level, error: Option<&dyn StdError>, template: &str, args: &[Value]) {
        let _serial = self.serial.lock();
        if !self.is_enabled() {
            return;
        }

        let tag = self.take_tag();
        let message = create_message(template, args);
        self.emit_chunked(level, tag.as_deref(), &message, error);
    }

    /// Logs a preformatted message. A pending one-shot tag wins over
    /// `default_tag`.
    pub(crate) fn emit_message(&self, level: Level, default_tag: Option<&str>, message: &str) {
        let _serial = self.serial.lock();
        if !self.is_enabled() {
            return;
        }

        let tag = self.take_tag();
        let tag = tag.as_deref().or(default_tag).filter(|t| !t.is_empty());
        self.emit_chunked(level, tag, message, None);
    }

    fn emit_chunked(&self, level: Level, tag: Option<&str>, message: &str, error: Option<&dyn StdError>) {
        let text = normalize(message, error);
        let adapters = self.snapshot();
        for chunk in CharChunkIterator::new(&text, max_chunk_chars(tag)) {
            dispatch(&adapters, level, tag, chunk);
        }
    }

    /// Dispatches `message` to the adapters without chunking and without
    /// consuming the one-shot tag.
    pub fn write(&self, level: Level, tag: Option<&str>, message: &str, error: Option<&dyn StdError>) {
        let _serial = self.serial.lock();
        if !self.is_enabled() {
            return;
        }

        let text = normalize(message, error);
        dispatch(&self.snapshot(), level, tag.filter(|t| !t.is_empty()), &text);
    }

    /// Logs at [`Level::Verbose`].
    pub fn verbose(&self, template: &str, args: &[Value]) {
        self.emit(Level::Verbose, None, template, args);
    }

    /// Logs at [`Level::Debug`].
    pub fn debug(&self, template: &str, args: &[Value]) {
        self.emit(Level::Debug, None, template, args);
    }

    /// Logs at [`Level::Info`].
    pub fn info(&self, template: &str, args: &[Value]) {
        self.emit(Level::Info, None, template, args);
    }

    /// Logs at [`Level::Warn`].
    pub fn warn(&self, template: &str, args: &[Value]) {
        self.emit(Level::Warn, None, template, args);
    }

    /// Logs at [`Level::Error`].
    pub fn error(&self, template: &str, args: &[Value]) {
        self.emit(Level::Error, None, template, args);
    }

    /// Logs at [`Level::Error`] and appends the chain of `error`.
    pub fn error_with(&self, error: &dyn StdError, template: &str, args: &[Value]) {
        self.emit(Level::Error, Some(error), template, args);
    }

    /// Logs at [`Level::Assert`].
    pub fn wtf(&self, template: &str, args: &[Value]) {
        self.emit(Level::Assert, None, template, args);
    }

    /// Logs the `Debug` representation of `value` at [`Level::Debug`].
    pub fn dump(&self, value: &dyn fmt::Debug) {
        self.debug(&format!("{:?}", value), &[]);
    }

    /// Pretty prints a JSON object or array at [`Level::Debug`].
    ///
    /// Input that is neither an object nor an array is reported as invalid
    /// at [`Level::Error`].
    pub fn json(&self, json: &str) {
        if json.is_empty() {
            self.debug("Empty/Null json content", &[]);
            return;
        }

        let json = json.trim();
        if !json.starts_with('{') && !json.starts_with('[') {
            self.error("Invalid Json", &[]);
            return;
        }

        match serde_json::from_str::<serde_json::Value>(json).and_then(|value| serde_json::to_string_pretty(&value)) {
            Ok(pretty) => self.debug(&pretty, &[]),
            Err(_) => self.error("Invalid Json", &[]),
        }
    }

    /// Pretty prints an XML document with an indent of two spaces at
    /// [`Level::Debug`].
    ///
    /// Malformed input and input without a root element are reported as
    /// invalid at [`Level::Error`].
    pub fn xml(&self, xml: &str) {
        if xml.is_empty() {
            self.debug("Empty/Null xml content", &[]);
            return;
        }

        match pretty_xml(xml) {
            Some(pretty) => self.debug(&pretty, &[]),
            None => self.error("Invalid xml", &[]),
        }
    }

    /// Flushes all adapters.
    pub fn flush(&self) {
        for adapter in self.snapshot().iter() {
            if panic::catch_unwind(AssertUnwindSafe(|| adapter.flush())).is_err() {
                eprintln!("Log adapter panicked while flushing");
            }
        }
    }
}

fn pretty_xml(xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    let mut depth = 0usize;
    let mut root = false;
    loop {
        let event = reader.read_event().ok()?;
        match &event {
            Event::Eof => break,
            Event::Start(_) => {
                root = true;
                depth += 1;
            }
            Event::End(_) => depth = depth.checked_sub(1)?,
            Event::Empty(_) => root = true,
            Event::Text(_) | Event::CData(_) if depth == 0 => return None,
            _ => (),
        }
        writer.write_event(event).ok()?;
    }

    if !root || depth != 0 {
        return None;
    }
    String::from_utf8(writer.into_inner()).ok()
}

fn create_message<'a>(template: &'a str, args: &[Value]) -> Cow<'a, str> {
    if args.is_empty() {
        return Cow::Borrowed(template);
    }
    format(template, args).map(Cow::Owned).unwrap_or(Cow::Borrowed(template))
}

fn normalize<'a>(message: &'a str, error: Option<&dyn StdError>) -> Cow<'a, str> {
    let text = match error {
        Some(error) if !message.is_empty() => Cow::Owned([message, &error_chain(error)].join(ERROR_SEPARATOR)),
        Some(error) => Cow::Owned(error_chain(error)),
        None => Cow::Borrowed(message),
    };
    if text.is_empty() {
        Cow::Borrowed(EMPTY_MESSAGE)
    } else {
        text
    }
}

/// Renders an error followed by its sources, one per line.
pub(crate) fn error_chain(error: &dyn StdError) -> String {
    let mut chain = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        chain.push_str("\nCaused by: ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }
    chain
}

fn dispatch(adapters: &[Arc<dyn Adapter>], level: Level, tag: Option<&str>, text: &str) {
    for adapter in adapters {
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            if adapter.accepts(level, tag) {
                adapter.emit(level, tag, text)
            } else {
                Ok(())
            }
        }));

        match result {
            Ok(Ok(())) => (),
            Ok(Err(e)) => eprintln!("Failed to emit log message \"{}\": {}", excerpt(text), e),
            Err(_) => eprintln!("Log adapter panicked on message \"{}\"", excerpt(text)),
        }
    }
}

/// Start of `text` for failure reports, marked with `...` if cut.
fn excerpt(text: &str) -> Cow<'_, str> {
    match text.char_indices().nth(EXCERPT_CHARS) {
        Some((index, _)) => Cow::Owned(format!("{}...", &text[..index])),
        None => Cow::Borrowed(text),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{testing::Recorder, Error};
    use parking_lot::Mutex;
    use std::{io, sync::Weak, thread};

    fn pipeline_with(recorder: &Recorder) -> Pipeline {
        let pipeline = Pipeline::new();
        pipeline.add_adapter(recorder.clone());
        pipeline
    }

    #[test]
    fn formats_template() {
        let recorder = Recorder::new();
        let pipeline = pipeline_with(&recorder);

        pipeline.emit(Level::Debug, None, "hello %s", &["world".into()]);

        assert_eq!(recorder.lines(), vec![(Level::Debug, None, "hello world".to_string())]);
    }

    #[test]
    fn template_without_args_is_verbatim() {
        let recorder = Recorder::new();
        let pipeline = pipeline_with(&recorder);

        pipeline.info("100% done %s", &[]);

        assert_eq!(recorder.texts(), vec!["100% done %s"]);
    }

    #[test]
    fn format_failure_falls_back_to_template() {
        let recorder = Recorder::new();
        let pipeline = pipeline_with(&recorder);

        pipeline.info("%d apples", &["many".into()]);
        pipeline.info("%s and %s", &["one".into()]);

        assert_eq!(recorder.texts(), vec!["%d apples", "%s and %s"]);
    }

    #[test]
    fn empty_message_is_replaced() {
        let recorder = Recorder::new();
        let pipeline = pipeline_with(&recorder);

        pipeline.warn("", &[]);

        assert_eq!(recorder.texts(), vec![EMPTY_MESSAGE]);
    }

    #[test]
    fn levels() {
        let recorder = Recorder::new();
        let pipeline = pipeline_with(&recorder);

        pipeline.verbose("v", &[]);
        pipeline.debug("d", &[]);
        pipeline.info("i", &[]);
        pipeline.warn("w", &[]);
        pipeline.error("e", &[]);
        pipeline.wtf("a", &[]);

        let levels: Vec<Level> = recorder.lines().into_iter().map(|(level, _, _)| level).collect();
        assert_eq!(levels, Level::ALL.to_vec());
    }

    #[derive(Debug)]
    struct Outer(io::Error);

    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("request failed")
        }
    }

    impl StdError for Outer {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn error_is_appended() {
        let recorder = Recorder::new();
        let pipeline = pipeline_with(&recorder);
        let error = io::Error::new(io::ErrorKind::Other, "boom");

        pipeline.error_with(&error, "job %d failed", &[3.into()]);
        pipeline.error_with(&error, "", &[]);
        pipeline.emit(Level::Warn, Some(&Outer(error)), "retrying", &[]);

        assert_eq!(
            recorder.texts(),
            vec![
                "job 3 failed : boom",
                "boom",
                "retrying : request failed\nCaused by: boom"
            ]
        );
    }

    #[test]
    fn long_message_is_chunked() {
        let recorder = Recorder::new();
        let pipeline = pipeline_with(&recorder);

        pipeline.info(&"x".repeat(4100), &[]);

        let lengths: Vec<usize> = recorder.texts().iter().map(|t| t.chars().count()).collect();
        assert_eq!(lengths, vec![2001, 2001, 98]);
    }

    #[test]
    fn chunk_length_accounts_for_tag() {
        let recorder = Recorder::new();
        let pipeline = pipeline_with(&recorder);

        pipeline.tag("abc").info(&"和".repeat(2000), &[]);

        let lines = recorder.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].2.chars().count(), 1998);
        assert_eq!(lines[1].2.chars().count(), 2);
        assert!(lines.iter().all(|(_, tag, _)| tag.as_deref() == Some("abc")));
    }

    #[test]
    fn message_at_limit_is_a_single_chunk() {
        let recorder = Recorder::new();
        let pipeline = pipeline_with(&recorder);

        pipeline.info(&"y".repeat(2001), &[]);

        assert_eq!(recorder.lines().len(), 1);
    }

    #[test]
    fn one_shot_tag_is_consumed() {
        let recorder = Recorder::new();
        let pipeline = pipeline_with(&recorder);

        pipeline.tag("first");
        assert_eq!(pipeline.pending_tags(), 1);
        pipeline.info("a", &[]);
        assert_eq!(pipeline.pending_tags(), 0);
        pipeline.info("b", &[]);
        pipeline.set_tag(None).info("c", &[]);
        pipeline.tag("").info("d", &[]);

        let tags: Vec<Option<String>> = recorder.lines().into_iter().map(|(_, tag, _)| tag).collect();
        assert_eq!(tags, vec![Some("first".to_string()), None, None, None]);
    }

    #[test]
    fn one_shot_tag_is_per_thread() {
        let recorder = Recorder::new();
        let pipeline = Arc::new(pipeline_with(&recorder));

        pipeline.tag("main");
        {
            let pipeline = pipeline.clone();
            thread::spawn(move || pipeline.info("worker", &[])).join().unwrap();
        }
        pipeline.info("main", &[]);

        assert_eq!(
            recorder.lines(),
            vec![
                (Level::Info, None, "worker".to_string()),
                (Level::Info, Some("main".to_string()), "main".to_string())
            ]
        );
    }

    #[test]
    fn tags_of_exited_threads_are_released() {
        let recorder = Recorder::new();
        let pipeline = Arc::new(pipeline_with(&recorder));

        let threads: Vec<_> = (0..100)
            .map(|_| {
                let pipeline = pipeline.clone();
                thread::spawn(move || {
                    pipeline.tag("orphan");
                })
            })
            .collect();
        threads.into_iter().for_each(|t| t.join().expect("Failed to join"));
        assert_eq!(pipeline.pending_tags(), 0);

        // Later threads start without a tag
        let threads: Vec<_> = (0..10)
            .map(|_| {
                let pipeline = pipeline.clone();
                thread::spawn(move || pipeline.info("fresh", &[]))
            })
            .collect();
        threads.into_iter().for_each(|t| t.join().expect("Failed to join"));
        assert!(recorder.lines().iter().all(|(_, tag, _)| tag.is_none()));
        assert_eq!(recorder.lines().len(), 10);
    }

    #[test]
    fn tags_are_per_pipeline() {
        let recorder = Recorder::new();
        let first = pipeline_with(&recorder);
        let second = pipeline_with(&recorder);

        first.tag("first");
        second.info("untagged", &[]);
        first.info("tagged", &[]);
        assert_eq!(
            recorder.lines(),
            vec![
                (Level::Info, None, "untagged".to_string()),
                (Level::Info, Some("first".to_string()), "tagged".to_string())
            ]
        );

        second.tag("second");
        assert_eq!(second.pending_tags(), 1);
        assert_eq!(first.pending_tags(), 0);
    }

    #[test]
    fn disabled_pipeline_drops_messages() {
        let recorder = Recorder::new();
        let pipeline = pipeline_with(&recorder);

        pipeline.set_enabled(false);
        assert!(!pipeline.is_enabled());
        pipeline.tag("kept").info("dropped", &[]);
        assert_eq!(pipeline.pending_tags(), 1);
        pipeline.write(Level::Info, None, "dropped", None);
        pipeline.json("{}");
        assert!(recorder.lines().is_empty());

        pipeline.set_enabled(true);
        pipeline.info("delivered", &[]);
        assert_eq!(
            recorder.lines(),
            vec![(Level::Info, Some("kept".to_string()), "delivered".to_string())]
        );
    }

    #[test]
    fn rejecting_adapter_does_not_block_others() {
        let rejecting = Recorder::rejecting();
        let accepting = Recorder::new();
        let pipeline = Pipeline::new();
        pipeline.add_adapter(rejecting.clone());
        pipeline.add_adapter(accepting.clone());

        pipeline.info("hello", &[]);

        assert!(rejecting.lines().is_empty());
        assert_eq!(accepting.texts(), vec!["hello"]);
    }

    /// Appends its name to a log shared with other adapters.
    struct Named {
        name: &'static str,
        log: Arc<Mutex<Vec<(&'static str, usize)>>>,
    }

    impl Adapter for Named {
        fn emit(&self, _level: Level, _tag: Option<&str>, text: &str) -> Result<(), Error> {
            self.log.lock().push((self.name, text.len()));
            Ok(())
        }
    }

    #[test]
    fn adapters_are_called_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::new();
        pipeline.add_adapter(Named { name: "a", log: log.clone() });
        pipeline.add_adapter(Recorder::rejecting());
        pipeline.add_adapter(Named { name: "b", log: log.clone() });

        pipeline.info(&"o".repeat(3000), &[]);

        assert_eq!(*log.lock(), vec![("a", 2001), ("b", 2001), ("a", 999), ("b", 999)]);
    }

    #[test]
    fn failure_reports_quote_an_excerpt() {
        assert_eq!(excerpt("short"), "short");
        assert_eq!(excerpt(&"x".repeat(EXCERPT_CHARS)), "x".repeat(EXCERPT_CHARS));
        assert_eq!(excerpt(&"é".repeat(2001)), format!("{}...", "é".repeat(EXCERPT_CHARS)));
    }

    struct Failing;

    impl Adapter for Failing {
        fn emit(&self, _level: Level, _tag: Option<&str>, _text: &str) -> Result<(), Error> {
            Err(Error::Io(io::Error::new(io::ErrorKind::BrokenPipe, "gone")))
        }
    }

    struct Panicking;

    impl Adapter for Panicking {
        fn emit(&self, _level: Level, _tag: Option<&str>, _text: &str) -> Result<(), Error> {
            panic!("adapter bug")
        }

        fn flush(&self) {
            panic!("adapter bug")
        }
    }

    #[test]
    fn broken_adapters_are_contained() {
        let recorder = Recorder::new();
        let pipeline = Pipeline::new();
        pipeline.add_adapter(Failing);
        pipeline.add_adapter(Panicking);
        pipeline.add_adapter(recorder.clone());

        pipeline.info("survives", &[]);
        pipeline.flush();

        assert_eq!(recorder.texts(), vec!["survives"]);
    }

    #[test]
    fn clear_adapters() {
        let recorder = Recorder::new();
        let pipeline = pipeline_with(&recorder);
        pipeline.add_adapter(Recorder::new());
        assert_eq!(pipeline.adapter_count(), 2);

        pipeline.clear_adapters();
        pipeline.info("nobody listens", &[]);

        assert_eq!(pipeline.adapter_count(), 0);
        assert!(recorder.lines().is_empty());
    }

    #[test]
    fn write_does_not_chunk() {
        let recorder = Recorder::new();
        let pipeline = pipeline_with(&recorder);

        pipeline.tag("pending");
        pipeline.write(Level::Warn, Some("direct"), &"z".repeat(3000), None);
        pipeline.info("next", &[]);

        let lines = recorder.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].1.as_deref(), Some("direct"));
        assert_eq!(lines[0].2.len(), 3000);
        assert_eq!(lines[1].1.as_deref(), Some("pending"));
    }

    #[test]
    fn concurrent_messages_do_not_interleave() {
        let recorder = Recorder::new();
        let pipeline = Arc::new(pipeline_with(&recorder));

        let threads: Vec<_> = ('a'..='h')
            .map(|c| {
                let pipeline = pipeline.clone();
                thread::spawn(move || {
                    for _ in 0..10 {
                        pipeline.info(&c.to_string().repeat(5000), &[]);
                    }
                })
            })
            .collect();
        threads.into_iter().for_each(|t| t.join().expect("Failed to join"));

        let texts = recorder.texts();
        assert_eq!(texts.len(), 8 * 10 * 3);
        for message in texts.chunks(3) {
            let first = message[0].chars().next().unwrap();
            assert!(message.iter().all(|chunk| chunk.chars().all(|c| c == first)));
            let lengths: Vec<usize> = message.iter().map(|chunk| chunk.len()).collect();
            assert_eq!(lengths, vec![2001, 2001, 998]);
        }
    }

    /// Logs an echo of every untagged message through the pipeline it is
    /// registered at and registers a recorder on first use.
    struct Echo {
        pipeline: Weak<Pipeline>,
        late: Recorder,
        registered: AtomicBool,
    }

    impl Adapter for Echo {
        fn accepts(&self, _level: Level, tag: Option<&str>) -> bool {
            tag.is_none()
        }

        fn emit(&self, _level: Level, _tag: Option<&str>, text: &str) -> Result<(), Error> {
            if let Some(pipeline) = self.pipeline.upgrade() {
                if !self.registered.swap(true, Ordering::SeqCst) {
                    pipeline.add_adapter(self.late.clone());
                }
                pipeline.tag("echo").info("echo of %s", &[text.into()]);
            }
            Ok(())
        }
    }

    #[test]
    fn adapters_may_log_and_register_while_dispatching() {
        let late = Recorder::new();
        let pipeline = Arc::new_cyclic(|weak| {
            let pipeline = Pipeline::new();
            pipeline.add_adapter(Echo {
                pipeline: weak.clone(),
                late: late.clone(),
                registered: AtomicBool::new(false),
            });
            pipeline
        });

        pipeline.info("first", &[]);
        assert_eq!(late.texts(), vec!["echo of first"]);

        pipeline.info("second", &[]);
        assert_eq!(late.texts(), vec!["echo of first", "echo of second", "second"]);
    }

    #[test]
    fn dump_and_json() {
        let recorder = Recorder::new();
        let pipeline = pipeline_with(&recorder);

        pipeline.dump(&vec![1, 2, 3]);
        pipeline.json(r#" {"b": [1, 2], "a": "x"} "#);
        pipeline.json("");
        pipeline.json("plain text");
        pipeline.json("{broken");

        assert_eq!(
            recorder.lines(),
            vec![
                (Level::Debug, None, "[1, 2, 3]".to_string()),
                (
                    Level::Debug,
                    None,
                    "{\n  \"a\": \"x\",\n  \"b\": [\n    1,\n    2\n  ]\n}".to_string()
                ),
                (Level::Debug, None, "Empty/Null json content".to_string()),
                (Level::Error, None, "Invalid Json".to_string()),
                (Level::Error, None, "Invalid Json".to_string()),
            ]
        );
    }

    #[test]
    fn xml() {
        let recorder = Recorder::new();
        let pipeline = pipeline_with(&recorder);

        pipeline.xml("<root> <item id=\"1\">a</item><empty/>\n</root>");
        pipeline.xml("");
        pipeline.xml("<a><b></a>");
        pipeline.xml("<open>");
        pipeline.xml("plain text");

        assert_eq!(
            recorder.lines(),
            vec![
                (
                    Level::Debug,
                    None,
                    "<root>\n  <item id=\"1\">a</item>\n  <empty/>\n</root>".to_string()
                ),
                (Level::Debug, None, "Empty/Null xml content".to_string()),
                (Level::Error, None, "Invalid xml".to_string()),
                (Level::Error, None, "Invalid xml".to_string()),
                (Level::Error, None, "Invalid xml".to_string()),
            ]
        );
    }
}
