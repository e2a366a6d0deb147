use std::fmt;

/// Log level of a message.
///
/// The discriminants match the Android log priorities so a level can be
/// written to logd without translation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Level {
    /// Verbose
    Verbose = 2,
    /// Debug
    Debug = 3,
    /// Info
    Info = 4,
    /// Warning
    Warn = 5,
    /// Error
    Error = 6,
    /// Assertion failure, "what a terrible failure"
    Assert = 7,
}

impl Level {
    /// All levels in ascending order.
    pub const ALL: [Level; 6] = [
        Level::Verbose,
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Assert,
    ];

    /// Android priority value.
    pub fn priority(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Level::Verbose => 'V',
            Level::Debug => 'D',
            Level::Info => 'I',
            Level::Warn => 'W',
            Level::Error => 'E',
            Level::Assert => 'A',
        };
        f.write_str(&c.to_string())
    }
}

impl From<log::Level> for Level {
    fn from(l: log::Level) -> Level {
        match l {
            log::Level::Error => Level::Error,
            log::Level::Warn => Level::Warn,
            log::Level::Info => Level::Info,
            log::Level::Debug => Level::Debug,
            log::Level::Trace => Level::Verbose,
        }
    }
}

// log has no assert level. It is folded into error.
impl From<Level> for log::Level {
    fn from(l: Level) -> log::Level {
        match l {
            Level::Verbose => log::Level::Trace,
            Level::Debug => log::Level::Debug,
            Level::Info => log::Level::Info,
            Level::Warn => log::Level::Warn,
            Level::Error | Level::Assert => log::Level::Error,
        }
    }
}
