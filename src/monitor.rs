//! Directory monitoring: the per-cycle logic and the background loop.
//!
//! [`MonitorManager`] owns the shared state and implements every action the
//! CLI exposes (add, remove, pause, process pending, one scan cycle).
//! [`MonitorLoop`] runs cycles on a background thread until stopped.
//!
//! # Cycle
//!
//! For each active directory the manager scans the root, records the delta
//! against the known set (persisted before anything else happens), then
//! either processes the new files or queues them. A failure in one directory
//! is logged and counted; the cycle moves on to the next one.

use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::ShelfError;
use crate::notify::{LogSink, Notification, NotificationSink, NullSink, deliver};
use crate::pipeline::{BatchOutcome, LinkPipeline, Pipeline};
use crate::tracking::{DirectoryScanner, MonitoredDirectory, StateStore, tagged_folders};
use crate::utils::paths::make_absolute;
use anyhow::{Context, Result, anyhow};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, info_span, warn};

/// Totals for one pass over all directories
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleSummary {
    /// Directories that were scanned
    pub scanned: usize,
    /// Paused directories left alone
    pub paused: usize,
    /// Directories whose root is gone
    pub missing: usize,
    /// Directories whose scan or bookkeeping failed
    pub failed: usize,
    /// Files seen for the first time
    pub new_files: usize,
    /// Files queued for manual processing
    pub queued: usize,
    /// Counters from auto-processed batches
    pub processed: u64,
    /// Failed files in auto-processed batches
    pub errors: u64,
    /// Skipped files in auto-processed batches
    pub skipped: u64,
}

impl CycleSummary {
    fn absorb(&mut self, batch: &BatchOutcome) {
        self.processed += batch.processed;
        self.errors += batch.errors;
        self.skipped += batch.skipped;
    }
}

/// Result of adding a directory
#[derive(Debug, Clone)]
pub struct AddReport {
    /// Id of the new entry
    pub id: String,
    /// Files present at add time
    pub existing: usize,
    /// Tagged folders found at add time
    pub tagged: usize,
    /// Batch result when the existing files were processed right away
    pub batch: Option<BatchOutcome>,
}

/// Owner of the monitoring state and the actions on it
#[derive(Clone)]
pub struct MonitorManager {
    store: Arc<Mutex<StateStore>>,
    scanner: DirectoryScanner,
    pipeline: Arc<dyn Pipeline>,
    sink: Arc<dyn NotificationSink>,
}

impl MonitorManager {
    /// Creates a manager from its parts
    #[must_use]
    pub fn new(
        store: StateStore,
        scanner: DirectoryScanner,
        pipeline: Arc<dyn Pipeline>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            scanner,
            pipeline,
            sink,
        }
    }

    /// Manager wired from configuration, loading state from `core.state_path`
    #[must_use]
    pub fn from_config(config: &Config, catalog: Box<dyn Catalog>) -> Self {
        let sink: Arc<dyn NotificationSink> = if config.notifications.enabled {
            Arc::new(LogSink)
        } else {
            Arc::new(NullSink)
        };
        Self::new(
            StateStore::load(config.core.state_path.clone()),
            DirectoryScanner::from_config(&config.scan),
            Arc::new(LinkPipeline::from_config(config, catalog)),
            sink,
        )
    }

    /// Exclusive access to the state
    ///
    /// # Errors
    ///
    /// Returns an error if a previous holder panicked
    pub fn state(&self) -> Result<MutexGuard<'_, StateStore>> {
        self.store
            .lock()
            .map_err(|_| anyhow!("monitor state lock poisoned"))
    }

    /// Copy of one directory's current state
    ///
    /// # Errors
    ///
    /// Returns [`ShelfError::UnknownDirectory`] if the id is unknown
    pub fn directory(&self, id: &str) -> Result<MonitoredDirectory> {
        self.state()?.require(id).cloned()
    }

    /// Copy of every directory's state
    ///
    /// # Errors
    ///
    /// Returns an error if the state lock is poisoned
    pub fn directories(&self) -> Result<Vec<MonitoredDirectory>> {
        Ok(self.state()?.directories().cloned().collect())
    }

    /// Resolves a full id or unique prefix
    ///
    /// # Errors
    ///
    /// Returns [`ShelfError::UnknownDirectory`] if nothing or more than one entry matches
    pub fn resolve_id(&self, id_or_prefix: &str) -> Result<String> {
        self.state()?
            .resolve_id(id_or_prefix)
            .ok_or_else(|| ShelfError::UnknownDirectory(id_or_prefix.to_string()).into())
    }

    /// Starts monitoring `path`
    ///
    /// Files already present become known. With `auto_process` they are
    /// processed immediately, otherwise they are queued as pending.
    ///
    /// # Errors
    ///
    /// Returns [`ShelfError::NotFound`] if the path is not a directory,
    /// [`ShelfError::AlreadyMonitored`] if it is watched already, or an error
    /// if the state cannot be saved
    pub fn add_directory(
        &self,
        path: &Path,
        description: Option<String>,
        auto_process: bool,
    ) -> Result<AddReport> {
        let path = make_absolute(path)?;
        if !path.is_dir() {
            return Err(ShelfError::NotFound(path).into());
        }
        if self.state()?.find_by_path(&path).is_some() {
            return Err(ShelfError::AlreadyMonitored(path).into());
        }

        let existing = self.scanner.scan(&path)?;
        let tagged = tagged_folders(&path, &existing);

        let mut directory = MonitoredDirectory::new(path, description, auto_process);
        directory.known_files.clone_from(&existing);
        directory.tmdb_folders.clone_from(&tagged);
        let id = self.state()?.add(directory.clone())?;

        let files: Vec<PathBuf> = existing.iter().cloned().collect();
        let batch = if auto_process && !files.is_empty() {
            Some(self.run_batch(&directory, &files, &|| false)?)
        } else {
            self.state()?.enqueue_pending(&id, &files)?;
            None
        };

        Ok(AddReport {
            id,
            existing: existing.len(),
            tagged: tagged.len(),
            batch,
        })
    }

    /// Stops monitoring a directory
    ///
    /// # Errors
    ///
    /// Returns [`ShelfError::UnknownDirectory`] or a save error
    pub fn remove_directory(&self, id: &str) -> Result<MonitoredDirectory> {
        self.state()?.remove(id)
    }

    /// Pauses or resumes a directory
    ///
    /// # Errors
    ///
    /// Returns [`ShelfError::UnknownDirectory`] or a save error
    pub fn set_active(&self, id: &str, active: bool) -> Result<()> {
        self.state()?.set_active(id, active)
    }

    /// Drops a directory's pending queue
    ///
    /// # Errors
    ///
    /// Returns [`ShelfError::UnknownDirectory`] or a save error
    pub fn clear_pending(&self, id: &str) -> Result<usize> {
        self.state()?.clear_pending(id)
    }

    /// Runs a directory's pending files through the pipeline
    ///
    /// Linked files leave the queue; skipped and failed ones stay for the next try.
    ///
    /// # Errors
    ///
    /// Returns [`ShelfError::UnknownDirectory`] or a save error
    pub fn process_pending(&self, id: &str) -> Result<BatchOutcome> {
        let directory = self.directory(id)?;
        if directory.pending_files.is_empty() {
            return Ok(BatchOutcome::default());
        }
        let files = directory.pending_files.clone();
        self.run_batch(&directory, &files, &|| false)
    }

    /// One pass over every directory
    #[must_use]
    pub fn run_cycle(&self) -> CycleSummary {
        self.cycle(&|| false)
    }

    /// One pass that checks `stop` between directories and between files
    pub fn cycle(&self, stop: &dyn Fn() -> bool) -> CycleSummary {
        let _span = info_span!("cycle").entered();
        let started = Instant::now();
        let mut summary = CycleSummary::default();

        let ids = match self.state() {
            Ok(state) => state.ids(),
            Err(e) => {
                error!("cycle aborted: {e:#}");
                return summary;
            }
        };

        for id in ids {
            if stop() {
                debug!("cycle interrupted");
                break;
            }
            // Removed while the cycle was running
            let Ok(directory) = self.directory(&id) else {
                continue;
            };
            if !directory.active {
                summary.paused += 1;
                continue;
            }
            if !directory.is_available() {
                warn!(id = %id, path = %directory.path.display(), "monitored directory missing, skipping");
                summary.missing += 1;
                continue;
            }

            let _dir_span = info_span!("directory", id = %id).entered();
            match self.cycle_directory(&directory, stop, &mut summary) {
                Ok(()) => summary.scanned += 1,
                Err(e) => {
                    error!(path = %directory.path.display(), "directory cycle failed: {e:#}");
                    summary.failed += 1;
                }
            }
        }

        info!(
            scanned = summary.scanned,
            new = summary.new_files,
            queued = summary.queued,
            processed = summary.processed,
            errors = summary.errors,
            skipped = summary.skipped,
            failed_dirs = summary.failed,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "cycle complete"
        );
        summary
    }

    fn cycle_directory(
        &self,
        directory: &MonitoredDirectory,
        stop: &dyn Fn() -> bool,
        summary: &mut CycleSummary,
    ) -> Result<()> {
        let current = self.scanner.scan(&directory.path)?;
        let new_files = {
            let mut state = self.state()?;
            let new_files = state.delta(&directory.id, &current)?;
            if !new_files.is_empty() {
                let tagged = tagged_folders(&directory.path, &current);
                if !tagged.is_empty() {
                    state.record_tagged_folders(&directory.id, tagged)?;
                }
            }
            new_files
        };

        if new_files.is_empty() {
            debug!("no new files");
            return Ok(());
        }

        summary.new_files += new_files.len();
        info!(count = new_files.len(), "new files detected");
        deliver(
            self.sink.as_ref(),
            &Notification::new_files(
                &directory.description,
                &directory.path,
                new_files.len(),
                directory.auto_process,
            ),
        );

        if directory.auto_process {
            // Refresh so tagged folders recorded above are visible to the pipeline
            let directory = self.directory(&directory.id)?;
            let batch = self.run_batch(&directory, &new_files, stop)?;
            summary.absorb(&batch);
        } else {
            summary.queued += self.state()?.enqueue_pending(&directory.id, &new_files)?;
        }
        Ok(())
    }

    /// Processes `files` one at a time and settles the bookkeeping
    ///
    /// Consumed files leave the pending queue. Files that were skipped, failed
    /// or not reached before `stop` are queued so they are not lost.
    fn run_batch(
        &self,
        directory: &MonitoredDirectory,
        files: &[PathBuf],
        stop: &dyn Fn() -> bool,
    ) -> Result<BatchOutcome> {
        let mut batch = BatchOutcome::default();
        for file in files {
            if stop() {
                debug!("batch interrupted, remaining files stay pending");
                break;
            }
            let outcome = self.pipeline.process_file(directory, file);
            batch.record(file, &outcome);
        }

        let leftovers: Vec<PathBuf> = files
            .iter()
            .filter(|f| !batch.consumed.contains(f))
            .cloned()
            .collect();

        {
            let mut state = self.state()?;
            state
                .record_outcome(&directory.id, batch.processed, batch.errors, batch.skipped)
                .context("Failed to record batch outcome")?;
            state.remove_pending(&directory.id, &batch.consumed)?;
            state.enqueue_pending(&directory.id, &leftovers)?;
        }

        info!(
            processed = batch.processed,
            errors = batch.errors,
            skipped = batch.skipped,
            "batch complete"
        );
        if batch.total() > 0 {
            deliver(
                self.sink.as_ref(),
                &Notification::batch_done(
                    &directory.description,
                    &directory.path,
                    batch.processed,
                    batch.errors,
                    batch.skipped,
                ),
            );
        }
        Ok(batch)
    }
}

/// Lifecycle of the background loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// No thread running
    Stopped,
    /// Cycling every interval
    Running,
    /// Stop requested, waiting for the in-flight file to finish
    Stopping,
}

struct Worker {
    handle: JoinHandle<()>,
    wake: Sender<()>,
    stop: Arc<AtomicBool>,
}

/// Runs [`MonitorManager::cycle`] periodically on a background thread
pub struct MonitorLoop {
    manager: MonitorManager,
    state: LoopState,
    worker: Option<Worker>,
    cycles: Arc<AtomicU64>,
    join_timeout: Duration,
}

impl MonitorLoop {
    /// Bound on how long [`MonitorLoop::stop`] waits for the thread
    pub const JOIN_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a stopped loop
    #[must_use]
    pub fn new(manager: MonitorManager) -> Self {
        Self {
            manager,
            state: LoopState::Stopped,
            worker: None,
            cycles: Arc::new(AtomicU64::new(0)),
            join_timeout: Self::JOIN_TIMEOUT,
        }
    }

    /// Current lifecycle state
    #[must_use]
    pub const fn state(&self) -> LoopState {
        self.state
    }

    /// Completed cycles since creation
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::SeqCst)
    }

    /// Starts cycling every `interval`, beginning immediately
    ///
    /// Returns `false` without doing anything when already running.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned
    pub fn start(&mut self, interval: Duration) -> Result<bool> {
        if self.state != LoopState::Stopped {
            debug!(state = ?self.state, "monitor loop already running");
            return Ok(false);
        }

        let (wake, wake_rx) = mpsc::channel::<()>();
        let stop = Arc::new(AtomicBool::new(false));
        let manager = self.manager.clone();
        let cycles = Arc::clone(&self.cycles);
        let thread_stop = Arc::clone(&stop);

        let handle = std::thread::Builder::new()
            .name("shelf-monitor".to_string())
            .spawn(move || {
                info!(interval = %humantime::format_duration(interval), "monitor loop started");
                loop {
                    if thread_stop.load(Ordering::SeqCst) {
                        break;
                    }
                    let flag = Arc::clone(&thread_stop);
                    manager.cycle(&move || flag.load(Ordering::SeqCst));
                    cycles.fetch_add(1, Ordering::SeqCst);

                    match wake_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                info!("monitor loop stopped");
            })
            .context("Failed to spawn monitor thread")?;

        self.worker = Some(Worker { handle, wake, stop });
        self.state = LoopState::Running;
        Ok(true)
    }

    /// Signals the loop and waits a bounded time for it to finish
    ///
    /// Returns `true` if the thread exited within the timeout. Either way the
    /// loop is `Stopped` afterwards.
    pub fn stop(&mut self) -> bool {
        let Some(worker) = self.worker.take() else {
            self.state = LoopState::Stopped;
            return true;
        };

        self.state = LoopState::Stopping;
        worker.stop.store(true, Ordering::SeqCst);
        let _ = worker.wake.send(());

        let deadline = Instant::now() + self.join_timeout;
        while !worker.handle.is_finished() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(20));
        }

        let clean = worker.handle.is_finished();
        if clean {
            if worker.handle.join().is_err() {
                error!("monitor thread panicked");
            }
        } else {
            warn!(
                timeout = %humantime::format_duration(self.join_timeout),
                "monitor thread did not stop in time, detaching"
            );
        }
        self.state = LoopState::Stopped;
        clean
    }

    /// Blocks until the loop thread exits on its own
    pub fn wait(&mut self) {
        if let Some(worker) = self.worker.take() {
            if worker.handle.join().is_err() {
                error!("monitor thread panicked");
            }
        }
        self.state = LoopState::Stopped;
    }
}

impl Drop for MonitorLoop {
    fn drop(&mut self) {
        if self.worker.is_some() {
            self.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::OfflineCatalog;
    use crate::notify::MemorySink;
    use crate::test_utils::fixtures::{TestLibrary, touch};
    use std::fs;

    struct Setup {
        lib: TestLibrary,
        downloads: PathBuf,
        manager: MonitorManager,
        sink: Arc<MemorySink>,
    }

    fn setup() -> Setup {
        let lib = TestLibrary::new();
        let config = &lib.config;

        let sink = Arc::new(MemorySink::default());
        let manager = MonitorManager::new(
            StateStore::load(config.core.state_path.clone()),
            DirectoryScanner::from_config(&config.scan),
            Arc::new(LinkPipeline::from_config(config, Box::new(OfflineCatalog))),
            sink.clone(),
        );
        Setup {
            downloads: lib.downloads.clone(),
            lib,
            manager,
            sink,
        }
    }

    #[test]
    fn test_add_queues_existing_files() {
        let s = setup();
        touch(&s.downloads.join("Heat.1995.mkv"));

        let report = s.manager.add_directory(&s.downloads, None, false).unwrap();
        assert_eq!(report.existing, 1);
        assert!(report.batch.is_none());

        let dir = s.manager.directory(&report.id).unwrap();
        assert_eq!(dir.known_files.len(), 1);
        assert_eq!(dir.pending_files.len(), 1);
        assert_eq!(dir.description, "downloads");
    }

    #[test]
    fn test_add_with_auto_process_links_existing() {
        let s = setup();
        touch(&s.downloads.join("Heat.1995.mkv"));

        let report = s.manager.add_directory(&s.downloads, None, true).unwrap();
        let batch = report.batch.unwrap();
        assert_eq!(batch.processed, 1);
        assert!(s.lib.library.join("Movies/Heat (1995)/Heat.1995.mkv").is_symlink());
        assert!(s.manager.directory(&report.id).unwrap().pending_files.is_empty());
    }

    #[test]
    fn test_cycle_detects_and_queues_new_files() {
        let s = setup();
        let id = s.manager.add_directory(&s.downloads, Some("dl".into()), false).unwrap().id;

        touch(&s.downloads.join("Show.S01E01.mkv"));
        let summary = s.manager.run_cycle();
        assert_eq!(summary.new_files, 1);
        assert_eq!(summary.queued, 1);

        let again = s.manager.run_cycle();
        assert_eq!(again.new_files, 0);
        assert_eq!(s.manager.directory(&id).unwrap().pending_files.len(), 1);

        let titles: Vec<String> = s.sink.received().into_iter().map(|n| n.title).collect();
        assert_eq!(titles, vec!["New files detected: dl".to_string()]);
    }

    #[test]
    fn test_new_files_event_carries_directory_path() {
        let s = setup();
        s.manager
            .add_directory(&s.downloads, Some("my downloads".into()), false)
            .unwrap();

        touch(&s.downloads.join("Heat.1995.mkv"));
        s.manager.run_cycle();

        let received = s.sink.received();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].title, "New files detected: my downloads");
        assert_eq!(received[0].directory_path, s.downloads);
    }

    #[test]
    fn test_paused_directory_untouched() {
        let s = setup();
        let id = s.manager.add_directory(&s.downloads, None, false).unwrap().id;
        s.manager.set_active(&id, false).unwrap();

        touch(&s.downloads.join("Heat.1995.mkv"));
        let before = s.manager.directory(&id).unwrap();
        let summary = s.manager.run_cycle();
        assert_eq!(summary.paused, 1);

        let after = s.manager.directory(&id).unwrap();
        assert!(after.known_files.is_empty());
        assert_eq!(after.stats, before.stats);
        assert!(s.sink.received().is_empty());

        // Detected once the directory is active again
        s.manager.set_active(&id, true).unwrap();
        let summary = s.manager.run_cycle();
        assert_eq!(summary.new_files, 1);
        assert_eq!(s.manager.directory(&id).unwrap().known_files.len(), 1);
    }

    #[test]
    fn test_missing_directory_skipped() {
        let s = setup();
        let id = s.manager.add_directory(&s.downloads, None, false).unwrap().id;
        fs::remove_dir_all(&s.downloads).unwrap();

        let summary = s.manager.run_cycle();
        assert_eq!(summary.missing, 1);
        assert_eq!(summary.failed, 0);
        assert!(s.manager.directory(&id).is_ok());
    }

    #[test]
    fn test_process_pending_consumes_linked() {
        let s = setup();
        touch(&s.downloads.join("Heat.1995.mkv"));
        let id = s.manager.add_directory(&s.downloads, None, false).unwrap().id;

        let batch = s.manager.process_pending(&id).unwrap();
        assert_eq!(batch.processed, 1);

        let dir = s.manager.directory(&id).unwrap();
        assert!(dir.pending_files.is_empty());
        assert_eq!(dir.stats.total_processed, 1);
    }

    #[test]
    fn test_stop_before_first_file_keeps_everything_pending() {
        let s = setup();
        touch(&s.downloads.join("Heat.1995.mkv"));
        let dir = {
            let id = s.manager.add_directory(&s.downloads, None, false).unwrap().id;
            s.manager.clear_pending(&id).unwrap();
            s.manager.directory(&id).unwrap()
        };

        let files: Vec<PathBuf> = dir.known_files.iter().cloned().collect();
        let batch = s.manager.run_batch(&dir, &files, &|| true).unwrap();
        assert_eq!(batch.total(), 0);
        assert_eq!(s.manager.directory(&dir.id).unwrap().pending_files, files);
    }

    #[test]
    fn test_loop_start_is_idempotent_and_stops() {
        let s = setup();
        s.manager.add_directory(&s.downloads, None, false).unwrap();

        let mut monitor = MonitorLoop::new(s.manager.clone());
        assert!(monitor.start(Duration::from_millis(20)).unwrap());
        assert!(!monitor.start(Duration::from_millis(20)).unwrap());
        assert_eq!(monitor.state(), LoopState::Running);

        let deadline = Instant::now() + Duration::from_secs(5);
        while monitor.cycles() < 2 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        assert!(monitor.cycles() >= 2);

        assert!(monitor.stop());
        assert_eq!(monitor.state(), LoopState::Stopped);

        // Restartable after a stop
        assert!(monitor.start(Duration::from_secs(60)).unwrap());
        assert!(monitor.stop());
    }
}
