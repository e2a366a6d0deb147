use crate::{Adapter, Error, Level};
use parking_lot::Mutex;
use std::sync::Arc;

pub(crate) type Line = (Level, Option<String>, String);

/// Adapter that records every emitted chunk.
#[derive(Clone, Default)]
pub(crate) struct Recorder {
    lines: Arc<Mutex<Vec<Line>>>,
    reject: bool,
}

impl Recorder {
    pub fn new() -> Recorder {
        Recorder::default()
    }

    pub fn rejecting() -> Recorder {
        Recorder {
            reject: true,
            ..Recorder::default()
        }
    }

    pub fn lines(&self) -> Vec<Line> {
        self.lines.lock().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.lines.lock().iter().map(|(_, _, text)| text.clone()).collect()
    }
}

impl Adapter for Recorder {
    fn accepts(&self, _level: Level, _tag: Option<&str>) -> bool {
        !self.reject
    }

    fn emit(&self, level: Level, tag: Option<&str>, text: &str) -> Result<(), Error> {
        self.lines.lock().push((level, tag.map(str::to_string), text.to_string()));
        Ok(())
    }
}
