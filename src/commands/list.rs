use crate::utils::format_timestamp;
use crate::{ShelfContext, output};
use anyhow::Result;
use colored::Colorize;

/// List monitored directories with their status and pending counts
///
/// # Errors
///
/// Returns an error if the state cannot be read
pub fn execute(ctx: &ShelfContext, long: bool) -> Result<()> {
    let manager = ctx.manager();
    let directories = manager.directories()?;

    if directories.is_empty() {
        output::info("No directories monitored. Use 'shelf add <path>' to start.");
        return Ok(());
    }

    let mut total_pending = 0;
    for dir in &directories {
        total_pending += dir.pending_files.len();
        let mode = if dir.auto_process { "auto" } else { "manual" };
        let missing = if dir.is_available() {
            String::new()
        } else {
            format!(" {}", "(missing)".red())
        };

        println!(
            "{}  {}  {:<6}  {:>4} pending  {}{}",
            output::short_id(&dir.id).yellow(),
            output::status_label(dir.active),
            mode,
            dir.pending_files.len(),
            dir.path.display(),
            missing
        );

        if long {
            println!("{}", output::field("Description", &dir.description));
            println!("{}", output::field("Known files", &dir.known_files.len().to_string()));
            println!(
                "{}",
                output::field(
                    "Processed",
                    &format!(
                        "{} ok, {} errors, {} skipped",
                        dir.stats.total_processed, dir.stats.total_errors, dir.stats.total_skipped
                    )
                )
            );
            println!("{}", output::field("Last run", &format_timestamp(dir.stats.last_processed)));
            println!("{}", output::field("Added", &format_timestamp(dir.created_at)));
            for file in dir.pending_files.iter().take(10) {
                println!("    {}", file.display().to_string().dimmed());
            }
            if dir.pending_files.len() > 10 {
                println!("    {}", format!("... and {} more", dir.pending_files.len() - 10).dimmed());
            }
        }
    }

    println!();
    println!(
        "{} directories, {} pending files",
        directories.len(),
        total_pending
    );
    Ok(())
}
