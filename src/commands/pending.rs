use crate::commands::{print_batch, resolve_id};
use crate::lock::LockPurpose;
use crate::{ShelfContext, output};
use anyhow::Result;

/// Link the pending files of a directory
///
/// # Errors
///
/// Returns an error if the state is locked, the id is unknown or saving fails
pub fn process(ctx: &ShelfContext, id: &str) -> Result<()> {
    let _lock = ctx.lock_state(LockPurpose::Edit)?;
    let manager = ctx.manager();
    let id = resolve_id(&manager, id)?;

    let pending = manager.directory(&id)?.pending_files.len();
    if pending == 0 {
        output::info("Nothing pending");
        return Ok(());
    }

    output::info(&format!("Processing {pending} pending files"));
    let batch = manager.process_pending(&id)?;
    print_batch(&batch);

    let left = manager.directory(&id)?.pending_files.len();
    if left > 0 {
        output::info(&format!("{left} files remain pending"));
    }
    Ok(())
}

/// Drop every pending file of a directory
///
/// # Errors
///
/// Returns an error if the state is locked, the id is unknown or saving fails
pub fn clear(ctx: &ShelfContext, id: &str) -> Result<()> {
    let _lock = ctx.lock_state(LockPurpose::Edit)?;
    let manager = ctx.manager();
    let id = resolve_id(&manager, id)?;

    let cleared = manager.clear_pending(&id)?;
    output::success(&format!("Cleared {cleared} pending files"));
    Ok(())
}
