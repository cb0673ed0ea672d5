use crate::commands::resolve_id;
use crate::lock::LockPurpose;
use crate::{ShelfContext, output};
use anyhow::Result;

/// Stop monitoring a directory
///
/// Links already created in the library are left in place.
///
/// # Errors
///
/// Returns an error if the state is locked, the id is unknown or saving fails
pub fn execute(ctx: &ShelfContext, id: &str) -> Result<()> {
    let _lock = ctx.lock_state(LockPurpose::Edit)?;
    let manager = ctx.manager();
    let id = resolve_id(&manager, id)?;

    let removed = manager.remove_directory(&id)?;
    output::success(&format!("No longer monitoring {}", removed.path.display()));
    if !removed.pending_files.is_empty() {
        output::info(&format!("{} pending files dropped", removed.pending_files.len()));
    }
    Ok(())
}
