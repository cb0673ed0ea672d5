use crate::lock::LockPurpose;
use crate::repair::{LinkRepairer, RepairAction, find_broken_links};
use crate::tracking::DirectoryScanner;
use crate::{ShelfContext, output};
use anyhow::Result;
use std::path::PathBuf;

/// Find broken library symlinks and relink them to moved sources
///
/// Monitored directories are always searched; `search` adds more roots.
///
/// # Errors
///
/// Returns an error if the state is locked or the library cannot be walked
pub fn execute(ctx: &ShelfContext, search: &[PathBuf], dry_run: bool) -> Result<()> {
    let root = &ctx.config.core.destination_root;

    if dry_run {
        let broken = find_broken_links(root)?;
        for item in &broken {
            println!("{} -> {}", item.link.display(), item.target.display());
        }
        output::info(&format!("{} broken links", broken.len()));
        return Ok(());
    }

    let _lock = ctx.lock_state(LockPurpose::Edit)?;
    let mut roots: Vec<PathBuf> = ctx
        .manager()
        .directories()?
        .into_iter()
        .map(|d| d.path)
        .collect();
    roots.extend(search.iter().cloned());

    let repairer = LinkRepairer::new(
        root.clone(),
        ctx.config.links.relative,
        DirectoryScanner::from_config(&ctx.config.scan),
    );
    let report = repairer.repair(&roots)?;

    for action in &report.actions {
        match action {
            RepairAction::Relinked { link, source } => {
                output::action("relinked", &format!("{} -> {}", link.display(), source.display()));
            }
            RepairAction::NoCandidate(link) => {
                output::verbose(&format!("no source for {}", link.display()));
            }
            RepairAction::Ambiguous(link, count) => {
                output::warning(&format!("{count} candidates for {}, skipped", link.display()));
            }
            RepairAction::Failed(link, reason) => {
                output::error(&format!("{}: {reason}", link.display()));
            }
        }
    }

    output::success(&format!(
        "{} broken, {} repaired, {} failed",
        report.found, report.repaired, report.failed
    ));
    Ok(())
}
