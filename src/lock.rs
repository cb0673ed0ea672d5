//! Cross-process locking of the state file
//!
//! The state file is rewritten in full after every change, so two processes
//! mutating it at once would silently lose updates. Every writer holds a
//! [`StateLock`] on `<state>.lock`; the lock is released when dropped.

use crate::error::ShelfError;
use anyhow::{Context, Result};
use fs4::fs_std::FileExt;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, warn};

/// What the lock holder is doing, recorded in the lock file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockPurpose {
    /// Long-running monitor loop
    Watch,
    /// One-shot command that changes state
    Edit,
}

impl LockPurpose {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Watch => "watch",
            Self::Edit => "edit",
        }
    }
}

/// Exclusive hold on a state file
#[derive(Debug)]
pub struct StateLock {
    lock_file: File,
    lock_path: PathBuf,
}

impl StateLock {
    /// Acquire the lock guarding `state_path`
    ///
    /// Retries briefly before giving up, so a command racing a finishing
    /// command still gets through.
    ///
    /// # Errors
    ///
    /// Returns [`ShelfError::Locked`] if another process keeps holding the
    /// lock, or an error if the lock file cannot be created.
    pub fn acquire(state_path: &Path, purpose: LockPurpose) -> Result<Self> {
        let lock_path = lock_path_for(state_path);
        if let Some(parent) = lock_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let timeout = if cfg!(test) {
            Duration::from_millis(100)
        } else {
            Duration::from_secs(2)
        };
        let retry_interval = Duration::from_millis(if cfg!(test) { 10 } else { 100 });
        let start = Instant::now();

        loop {
            let file = fs::OpenOptions::new()
                .create(true)
                .truncate(false)
                .read(true)
                .write(true)
                .open(&lock_path)
                .with_context(|| format!("Failed to open lock file: {}", lock_path.display()))?;

            match file.try_lock_exclusive() {
                Ok(true) => {
                    write_holder_info(&file, purpose);
                    debug!(path = %lock_path.display(), purpose = purpose.as_str(), "state lock acquired");
                    return Ok(Self {
                        lock_file: file,
                        lock_path,
                    });
                }
                Ok(false) | Err(_) if start.elapsed() < timeout => {
                    std::thread::sleep(retry_interval);
                }
                Ok(false) | Err(_) => {
                    let holder = fs::read_to_string(&lock_path)
                        .ok()
                        .and_then(|info| {
                            info.lines()
                                .find_map(|l| l.strip_prefix("pid=").map(str::to_string))
                        })
                        .unwrap_or_else(|| "unknown".to_string());
                    return Err(ShelfError::Locked(format!(
                        "{} (held by pid {holder})",
                        lock_path.display()
                    ))
                    .into());
                }
            }
        }
    }

    /// Path of the lock file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.lock_path
    }

    /// Release the lock explicitly (normally handled by Drop)
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be unlocked
    pub fn release(self) -> Result<()> {
        self.lock_file.unlock()?;
        Ok(())
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        let _ = self.lock_file.unlock();
        if let Err(e) = fs::remove_file(&self.lock_path)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!(path = %self.lock_path.display(), "failed to remove lock file: {e}");
        }
    }
}

/// `<state>.lock` next to the state file
#[must_use]
pub fn lock_path_for(state_path: &Path) -> PathBuf {
    let mut name = state_path
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(".lock");
    state_path.with_file_name(name)
}

fn write_holder_info(file: &File, purpose: LockPurpose) {
    let mut handle = file;
    let _ = handle.set_len(0);
    let _ = writeln!(
        handle,
        "purpose={}\npid={}\ntime={}",
        purpose.as_str(),
        std::process::id(),
        humantime::format_rfc3339(SystemTime::now())
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_acquire_and_release() {
        let temp = TempDir::new().unwrap();
        let state = temp.path().join("monitored.json");
        let lock = StateLock::acquire(&state, LockPurpose::Edit).unwrap();
        assert!(lock.path().exists());
        assert!(lock.path().ends_with("monitored.json.lock"));
        assert!(format!("{lock:?}").contains("monitored.json.lock"));
        lock.release().unwrap();

        // Reacquire after release
        StateLock::acquire(&state, LockPurpose::Watch).unwrap();
    }

    #[test]
    fn test_second_holder_fails_fast() {
        let temp = TempDir::new().unwrap();
        let state = temp.path().join("monitored.json");
        let _held = StateLock::acquire(&state, LockPurpose::Watch).unwrap();

        let start = Instant::now();
        let err = StateLock::acquire(&state, LockPurpose::Edit).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ShelfError>(),
            Some(ShelfError::Locked(_))
        ));
        assert!(
            start.elapsed() < Duration::from_millis(500),
            "lock should fail quickly in test mode"
        );
    }

    #[test]
    fn test_different_state_files_independent() {
        let temp = TempDir::new().unwrap();
        let _a = StateLock::acquire(&temp.path().join("a.json"), LockPurpose::Watch).unwrap();
        assert!(StateLock::acquire(&temp.path().join("b.json"), LockPurpose::Watch).is_ok());
    }
}
