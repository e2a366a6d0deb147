use crate::{thread, Adapter, Error, Level};
use bytes::{BufMut, BytesMut};
use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use std::{
    fmt,
    io::{self, ErrorKind},
    os::unix::net::UnixDatagram,
    path::{Path, PathBuf},
    time::{self, SystemTime},
};

/// Logd write socket path
pub const LOGDW: &str = "/dev/socket/logdw";

const WRITE_TIMEOUT: time::Duration = time::Duration::from_millis(500);

/// Buffer id, priority and the header fields before the tag.
const HEADER_LEN: usize = 12;

/// Log buffer ids
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Buffer {
    /// The main log buffer. This is the only log buffer available to apps.
    Main,
    /// The radio log buffer
    Radio,
    /// The system log buffer.
    System,
    /// The crash log buffer.
    Crash,
    /// The security log buffer.
    Security,
    /// User defined Buffer
    Custom(u8),
}

impl From<Buffer> for u8 {
    fn from(b: Buffer) -> u8 {
        match b {
            Buffer::Main => 0,
            Buffer::Radio => 1,
            Buffer::System => 3,
            Buffer::Crash => 4,
            Buffer::Security => 6,
            Buffer::Custom(id) => id,
        }
    }
}

/// Logd write socket abstraction. On each failed send a reconnect attempt is
/// made. Sends that time out are discarded.
struct LogdSocket {
    path: PathBuf,
    socket: RwLock<UnixDatagram>,
}

impl LogdSocket {
    fn connect(path: &Path) -> io::Result<LogdSocket> {
        let socket = UnixDatagram::unbound()?;
        // logd might not be up yet. The connection is retried on send.
        socket.connect(path).ok();
        socket.set_write_timeout(Some(WRITE_TIMEOUT))?;
        Ok(LogdSocket {
            path: path.to_owned(),
            socket: RwLock::new(socket),
        })
    }

    fn send(&self, buffer: &[u8]) -> io::Result<()> {
        let lock = self.socket.upgradable_read();
        match lock.send(buffer) {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == ErrorKind::TimedOut || e.kind() == ErrorKind::WouldBlock => Ok(()),
            Err(_) => {
                let socket = UnixDatagram::unbound()?;
                socket.set_write_timeout(Some(WRITE_TIMEOUT))?;
                socket.connect(&self.path)?;

                // Upgrade the read lock and replace the socket. In the worst case
                // one or more threads open sockets to logd that are closed again.
                let mut lock = RwLockUpgradableReadGuard::upgrade(lock);
                let result = socket.send(buffer).map(drop);
                *lock = socket;
                result
            }
        }
    }
}

/// Adapter that writes to the Android log daemon.
///
/// Messages without tag are logged with the default tag, the file stem of
/// the running executable unless configured otherwise.
///
/// # Example
///
/// ```no_run
/// # use adapter_logger::{Buffer, LogdAdapter};
/// let adapter = LogdAdapter::new()?.buffer(Buffer::Main).default_tag("app");
/// adapter_logger::pipeline().add_adapter(adapter);
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct LogdAdapter {
    socket: LogdSocket,
    buffer: Buffer,
    default_tag: String,
}

impl fmt::Debug for LogdAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogdAdapter")
            .field("path", &self.socket.path)
            .field("buffer", &self.buffer)
            .field("default_tag", &self.default_tag)
            .finish()
    }
}

impl LogdAdapter {
    /// Connects to the logd write socket.
    pub fn new() -> io::Result<LogdAdapter> {
        Self::connect(LOGDW)
    }

    /// Connects to a logd compatible socket at `path`.
    pub fn connect<P: AsRef<Path>>(path: P) -> io::Result<LogdAdapter> {
        Ok(LogdAdapter {
            socket: LogdSocket::connect(path.as_ref())?,
            buffer: Buffer::Main,
            default_tag: process_name(),
        })
    }

    /// Use a specific android log buffer. Defaults to the main buffer.
    pub fn buffer(mut self, buffer: Buffer) -> Self {
        self.buffer = buffer;
        self
    }

    /// Tag for messages without tag.
    pub fn default_tag(mut self, tag: &str) -> Self {
        self.default_tag = tag.to_string();
        self
    }
}

impl Adapter for LogdAdapter {
    fn emit(&self, level: Level, tag: Option<&str>, text: &str) -> Result<(), Error> {
        let tag = tag.unwrap_or(&self.default_tag);
        let timestamp = SystemTime::now()
            .duration_since(time::UNIX_EPOCH)
            .map_err(|e| Error::Timestamp(e.to_string()))?;

        // Tag and message with null terminator.
        let mut buffer = BytesMut::with_capacity(HEADER_LEN + tag.len() + 1 + text.len() + 1);
        buffer.put_u8(self.buffer.into());
        buffer.put_u16_le(thread::id() as u16);
        buffer.put_u32_le(timestamp.as_secs() as u32);
        buffer.put_u32_le(timestamp.subsec_nanos());
        buffer.put_u8(level.priority());
        buffer.put(tag.as_bytes());
        buffer.put_u8(0);
        buffer.put(text.as_bytes());
        buffer.put_u8(0);

        self.socket.send(&buffer)?;
        Ok(())
    }
}

fn process_name() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.file_stem().map(|stem| stem.to_string_lossy().into_owned()))
        .unwrap_or_default()
}
