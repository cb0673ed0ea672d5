use crate::lock::LockPurpose;
use crate::monitor::CycleSummary;
use crate::{ShelfContext, output};
use anyhow::Result;

/// Run one scan cycle over every active directory
///
/// # Errors
///
/// Returns an error if the state is locked
pub fn execute(ctx: &ShelfContext) -> Result<()> {
    let _lock = ctx.lock_state(LockPurpose::Edit)?;
    let summary = ctx.manager().run_cycle();
    print_summary(&summary);
    Ok(())
}

pub(crate) fn print_summary(summary: &CycleSummary) {
    output::action(
        "scanned",
        &format!(
            "{} directories ({} paused, {} missing)",
            summary.scanned, summary.paused, summary.missing
        ),
    );
    if summary.new_files == 0 {
        output::info("No new files");
    } else {
        output::success(&format!(
            "{} new files: {} linked, {} queued, {} skipped, {} failed",
            summary.new_files, summary.processed, summary.queued, summary.skipped, summary.errors
        ));
    }
    if summary.failed > 0 {
        output::warning(&format!("{} directories failed; see log for details", summary.failed));
    }
}
