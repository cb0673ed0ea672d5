//! CLI command implementations.
//!
//! Each submodule exposes an `execute` function taking the loaded
//! [`ShelfContext`](crate::ShelfContext). Commands that change state hold the
//! state lock for their whole run.

pub mod add;
pub mod config;
pub mod list;
pub mod pending;
pub mod remove;
pub mod repair;
pub mod scan;
pub mod toggle;
pub mod watch;

use crate::monitor::MonitorManager;
use crate::output;
use crate::pipeline::BatchOutcome;
use anyhow::Result;

/// Resolves a user-supplied id or prefix against the loaded state
pub(crate) fn resolve_id(manager: &MonitorManager, id: &str) -> Result<String> {
    manager.resolve_id(id)
}

/// Prints the one-line summary of a processing batch
pub(crate) fn print_batch(batch: &BatchOutcome) {
    let line = format!(
        "{} linked, {} failed, {} skipped",
        batch.processed, batch.errors, batch.skipped
    );
    if batch.errors > 0 {
        output::warning(&line);
    } else {
        output::success(&line);
    }
    for link in &batch.linked {
        output::verbose(&format!("  {}", link.display()));
    }
}
