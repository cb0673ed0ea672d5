use crate::commands::print_batch;
use crate::lock::LockPurpose;
use crate::{ShelfContext, output};
use anyhow::Result;
use std::path::Path;

/// Start monitoring a directory
///
/// Files already present are remembered; with `auto` they are linked right
/// away, otherwise they are queued for `shelf process`.
///
/// # Errors
///
/// Returns an error if:
/// - Another process holds the state lock
/// - The path is not a directory or is already monitored
/// - The state cannot be saved
pub fn execute(ctx: &ShelfContext, path: &Path, description: Option<String>, auto: bool) -> Result<()> {
    let _lock = ctx.lock_state(LockPurpose::Edit)?;
    let manager = ctx.manager();

    let report = manager.add_directory(path, description, auto)?;
    let directory = manager.directory(&report.id)?;

    output::success(&format!(
        "Monitoring {} ({})",
        directory.path.display(),
        output::short_id(&report.id)
    ));
    if report.tagged > 0 {
        output::info(&format!("{} tagged folders detected", report.tagged));
    }

    match &report.batch {
        Some(batch) => print_batch(batch),
        None if report.existing > 0 => output::info(&format!(
            "{} existing files queued; run 'shelf process {}' to link them",
            report.existing,
            output::short_id(&report.id)
        )),
        None => output::info("No media files yet"),
    }
    Ok(())
}
