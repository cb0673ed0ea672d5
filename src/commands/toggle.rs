use crate::commands::resolve_id;
use crate::lock::LockPurpose;
use crate::{ShelfContext, output};
use anyhow::Result;

/// Pause (`active = false`) or resume (`active = true`) a directory
///
/// # Errors
///
/// Returns an error if the state is locked, the id is unknown or saving fails
pub fn execute(ctx: &ShelfContext, id: &str, active: bool) -> Result<()> {
    let _lock = ctx.lock_state(LockPurpose::Edit)?;
    let manager = ctx.manager();
    let id = resolve_id(&manager, id)?;

    let directory = manager.directory(&id)?;
    if directory.active == active {
        output::info(&format!(
            "{} is already {}",
            directory.description,
            output::status_label(active)
        ));
        return Ok(());
    }

    manager.set_active(&id, active)?;
    let verb = if active { "Resumed" } else { "Paused" };
    output::success(&format!("{verb} {}", directory.description));
    Ok(())
}
