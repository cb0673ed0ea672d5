use crate::lock::LockPurpose;
use crate::monitor::MonitorLoop;
use crate::{ShelfContext, output};
use anyhow::{Context, Result};
use std::time::Duration;

/// Run the monitor loop in the foreground
///
/// Holds the state lock for the whole run so one-shot commands cannot
/// interleave their writes with the loop's.
///
/// # Errors
///
/// Returns an error if:
/// - Another process holds the state lock
/// - The interval is not a valid duration or is zero
/// - The monitor thread cannot be started
pub fn execute(ctx: &ShelfContext, interval: Option<&str>, for_secs: Option<u64>) -> Result<()> {
    let interval = match interval {
        Some(value) => humantime::parse_duration(value)
            .with_context(|| format!("Invalid interval: {value}"))?,
        None => ctx.config.core.scan_interval()?,
    };
    if interval.is_zero() {
        anyhow::bail!("Interval must be greater than zero");
    }

    let _lock = ctx.lock_state(LockPurpose::Watch)?;
    let manager = ctx.manager();
    let directories = manager.directories()?.len();

    let mut monitor = MonitorLoop::new(manager);
    monitor.start(interval)?;
    output::info(&format!(
        "Watching {directories} directories every {}",
        humantime::format_duration(interval)
    ));

    match for_secs {
        Some(secs) => {
            std::thread::sleep(Duration::from_secs(secs));
            if !monitor.stop() {
                output::warning("Monitor did not stop in time");
            }
            output::info(&format!("Stopped after {} cycles", monitor.cycles()));
        }
        None => monitor.wait(),
    }
    Ok(())
}
