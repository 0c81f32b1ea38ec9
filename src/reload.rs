//! Worker reload signal.
//!
//! Long-running worker processes poll the sentinel file's modification time
//! to learn that configuration changed. Touching the sentinel after every
//! successful mutation is the whole protocol; last writer wins.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::time::SystemTime;

/// Handle on the reload sentinel file.
#[derive(Debug, Clone)]
pub struct ReloadSignal {
    path: PathBuf,
}

impl ReloadSignal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Update the sentinel's modification time, creating it if absent.
    ///
    /// A failed touch degrades freshness but must never fail the
    /// configuration write that triggered it, so errors are logged and
    /// swallowed.
    pub fn touch(&self) {
        let result = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .and_then(|file| file.set_modified(SystemTime::now()));

        if let Err(err) = result {
            tracing::error!("Failed to update {}: {err}", self.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touch_creates_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let signal = ReloadSignal::new(dir.path().join("reload.txt"));

        signal.touch();
        assert!(dir.path().join("reload.txt").exists());
    }

    #[test]
    fn touch_advances_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reload.txt");
        let signal = ReloadSignal::new(&path);

        signal.touch();
        let first = std::fs::metadata(&path).unwrap().modified().unwrap();

        std::thread::sleep(std::time::Duration::from_millis(20));
        signal.touch();
        let second = std::fs::metadata(&path).unwrap().modified().unwrap();

        assert!(second > first);
    }

    #[test]
    fn touch_on_unwritable_path_is_swallowed() {
        let signal = ReloadSignal::new("/nonexistent-dir/reload.txt");
        signal.touch();
    }
}
