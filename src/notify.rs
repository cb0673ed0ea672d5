//! Notifications about detected files and finished batches.
//!
//! Delivery is best effort: a failing sink is logged and never interrupts a
//! monitor cycle.

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};

/// A user-facing event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Headline, e.g. `New files detected: tv`
    pub title: String,
    /// Body text
    pub message: String,
    /// Number of files the event is about
    pub file_count: usize,
    /// Monitored directory the files belong to
    pub directory_path: PathBuf,
}

impl Notification {
    /// Event for files found by a scan
    #[must_use]
    pub fn new_files(description: &str, directory_path: &Path, file_count: usize, auto_process: bool) -> Self {
        let noun = if file_count == 1 { "file" } else { "files" };
        let message = if auto_process {
            format!("{file_count} new {noun}, processing automatically")
        } else {
            format!("{file_count} new {noun} queued for processing")
        };
        Self {
            title: format!("New files detected: {description}"),
            message,
            file_count,
            directory_path: directory_path.to_path_buf(),
        }
    }

    /// Event for a completed auto-processing batch
    #[must_use]
    pub fn batch_done(
        description: &str,
        directory_path: &Path,
        processed: u64,
        errors: u64,
        skipped: u64,
    ) -> Self {
        Self {
            title: format!("Processing finished: {description}"),
            message: format!("{processed} linked, {errors} failed, {skipped} skipped"),
            file_count: usize::try_from(processed + errors + skipped).unwrap_or(usize::MAX),
            directory_path: directory_path.to_path_buf(),
        }
    }
}

/// Destination for notifications
pub trait NotificationSink: Send + Sync {
    /// Delivers one notification
    ///
    /// # Errors
    ///
    /// Returns an error if delivery fails
    fn notify(&self, notification: &Notification) -> Result<()>;
}

/// Sink that writes notifications to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn notify(&self, notification: &Notification) -> Result<()> {
        info!(
            directory = %notification.directory_path.display(),
            files = notification.file_count,
            "{}: {}",
            notification.title,
            notification.message
        );
        Ok(())
    }
}

/// Sink that drops everything, used when notifications are disabled
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn notify(&self, _notification: &Notification) -> Result<()> {
        Ok(())
    }
}

/// Sink that keeps notifications in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    received: Mutex<Vec<Notification>>,
}

impl MemorySink {
    /// Copy of everything received so far
    #[must_use]
    pub fn received(&self) -> Vec<Notification> {
        self.received.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl NotificationSink for MemorySink {
    fn notify(&self, notification: &Notification) -> Result<()> {
        self.received
            .lock()
            .map_err(|_| anyhow::anyhow!("notification buffer poisoned"))?
            .push(notification.clone());
        Ok(())
    }
}

/// Delivers through `sink`, logging instead of failing
pub fn deliver(sink: &dyn NotificationSink, notification: &Notification) {
    if let Err(e) = sink.notify(notification) {
        warn!(title = %notification.title, "notification failed: {e:#}");
    }
}
