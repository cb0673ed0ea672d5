mod common;

use anyhow::Result;
use common::TestShelf;
use linkshelf::error::ShelfError;
use linkshelf::lock::{LockPurpose, StateLock};
use linkshelf::monitor::{LoopState, MonitorLoop};
use std::thread;
use std::time::{Duration, Instant};

fn wait_for(mut condition: impl FnMut() -> bool, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(25));
    }
    condition()
}

#[test]
fn test_loop_picks_up_new_files() -> Result<()> {
    let shelf = TestShelf::new()?;
    let manager = shelf.ctx()?.manager();
    manager.add_directory(&shelf.downloads, None, true)?;

    let mut monitor = MonitorLoop::new(manager);
    assert!(monitor.start(Duration::from_millis(50))?);
    assert_eq!(monitor.state(), LoopState::Running);

    shelf.add_download("Heat.1995.mkv")?;
    let linked = shelf.in_library("Movies/Heat (1995)/Heat.1995.mkv");
    assert!(wait_for(|| linked.is_symlink(), Duration::from_secs(5)));

    assert!(monitor.stop());
    assert_eq!(monitor.state(), LoopState::Stopped);
    assert!(monitor.cycles() >= 1);
    Ok(())
}

#[test]
fn test_stop_interrupts_long_interval() -> Result<()> {
    let shelf = TestShelf::new()?;
    let mut monitor = MonitorLoop::new(shelf.ctx()?.manager());
    monitor.start(Duration::from_secs(3600))?;
    assert!(wait_for(|| monitor.cycles() >= 1, Duration::from_secs(5)));

    let started = Instant::now();
    assert!(monitor.stop());
    assert!(started.elapsed() < MonitorLoop::JOIN_TIMEOUT);

    // Stopping twice is harmless and the loop can be restarted
    assert!(monitor.stop());
    assert!(monitor.start(Duration::from_secs(3600))?);
    assert!(monitor.stop());
    Ok(())
}

#[test]
fn test_cycles_from_cloned_managers_share_state() -> Result<()> {
    let shelf = TestShelf::new()?;
    let manager = shelf.ctx()?.manager();
    let id = manager.add_directory(&shelf.downloads, None, false)?.id;

    for i in 0..8 {
        shelf.add_download(&format!("Show.S01E{:02}.mkv", i + 1))?;
    }

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let manager = manager.clone();
            thread::spawn(move || manager.run_cycle().new_files)
        })
        .collect();
    let detected: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

    // Each file is reported by exactly one cycle
    assert_eq!(detected, 8);
    assert_eq!(manager.directory(&id)?.pending_files.len(), 8);
    Ok(())
}

#[test]
fn test_state_lock_is_exclusive() -> Result<()> {
    let shelf = TestShelf::new()?;
    let held = StateLock::acquire(&shelf.state_path, LockPurpose::Watch)?;

    let err = StateLock::acquire(&shelf.state_path, LockPurpose::Edit).unwrap_err();
    assert!(matches!(err.downcast_ref::<ShelfError>(), Some(ShelfError::Locked(_))));

    drop(held);
    let again = StateLock::acquire(&shelf.state_path, LockPurpose::Edit)?;
    assert!(again.path().exists());
    Ok(())
}
