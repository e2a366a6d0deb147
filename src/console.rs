use crate::{thread, Adapter, Error, Level};
use parking_lot::Mutex;
use std::{
    fmt,
    io::{self, Write},
    process,
};
use time::{format_description::FormatItem, OffsetDateTime};

const DATE_TIME_FORMAT: &[FormatItem<'_>] =
    time::macros::format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]");

/// Adapter that prints logcat style lines.
///
/// Each line carries a UTC timestamp, the process and thread id, the level
/// letter, the tag and the text:
///
/// ```text
/// 2024-03-01 12:00:00.000 4711 4712 I net: connected
/// ```
pub struct ConsoleAdapter {
    min_level: Level,
    writer: Mutex<Box<dyn Write + Send>>,
}

impl fmt::Debug for ConsoleAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleAdapter").field("min_level", &self.min_level).finish()
    }
}

impl Default for ConsoleAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleAdapter {
    /// Prints to stderr.
    pub fn new() -> ConsoleAdapter {
        Self::with_writer(io::stderr())
    }

    /// Prints to `writer`.
    pub fn with_writer<W: Write + Send + 'static>(writer: W) -> ConsoleAdapter {
        ConsoleAdapter {
            min_level: Level::Verbose,
            writer: Mutex::new(Box::new(writer)),
        }
    }

    /// Drop messages below `level`.
    pub fn min_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }
}

impl Adapter for ConsoleAdapter {
    fn accepts(&self, level: Level, _tag: Option<&str>) -> bool {
        level >= self.min_level
    }

    fn emit(&self, level: Level, tag: Option<&str>, text: &str) -> Result<(), Error> {
        let timestamp = OffsetDateTime::now_utc()
            .format(DATE_TIME_FORMAT)
            .map_err(|e| Error::Timestamp(e.to_string()))?;

        let mut writer = self.writer.lock();
        writeln!(
            writer,
            "{} {} {} {} {}: {}",
            timestamp,
            process::id(),
            thread::id(),
            level,
            tag.unwrap_or_default(),
            text
        )?;
        Ok(())
    }

    fn flush(&self) {
        self.writer.lock().flush().ok();
    }
}
