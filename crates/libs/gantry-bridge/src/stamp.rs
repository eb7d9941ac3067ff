use std::path::PathBuf;
use std::sync::Mutex;

/// Persistence for the last successful connection timestamp.
///
/// The liveness check reads this across restarts, so an app reloaded within
/// the staleness window does not hammer the host with reconnects.
pub trait StampStore: Send + Sync {
    fn load(&self) -> Option<u64>;
    fn save(&self, unix_ms: u64);
}

/// In-process store; the default when the embedder provides nothing.
#[derive(Default)]
pub struct MemoryStampStore {
    stamp: Mutex<Option<u64>>,
}

impl StampStore for MemoryStampStore {
    fn load(&self) -> Option<u64> {
        *self.stamp.lock().expect("stamp mutex poisoned")
    }

    fn save(&self, unix_ms: u64) {
        *self.stamp.lock().expect("stamp mutex poisoned") = Some(unix_ms);
    }
}

/// File-backed store: a single decimal millisecond value. IO failures are
/// logged and swallowed — a missing stamp only costs one extra reconnect.
pub struct FileStampStore {
    path: PathBuf,
}

impl FileStampStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl StampStore for FileStampStore {
    fn load(&self) -> Option<u64> {
        let contents = std::fs::read_to_string(&self.path).ok()?;
        contents.trim().parse().ok()
    }

    fn save(&self, unix_ms: u64) {
        if let Err(err) = std::fs::write(&self.path, unix_ms.to_string()) {
            log::debug!("stamp: failed to persist connection stamp: {err}");
        }
    }
}
