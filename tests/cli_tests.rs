mod common;

use anyhow::Result;
use common::TestShelf;
use linkshelf::lock::{LockPurpose, StateLock};
use predicates::prelude::*;

#[test]
fn test_help_lists_commands() -> Result<()> {
    let shelf = TestShelf::new()?;
    shelf
        .shelf()?
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("watch"))
        .stdout(predicate::str::contains("repair"));
    Ok(())
}

#[test]
fn test_add_then_list() -> Result<()> {
    let shelf = TestShelf::new()?;
    shelf.add_download("Heat.1995.mkv")?;

    shelf
        .shelf()?
        .arg("add")
        .arg(&shelf.downloads)
        .args(["-d", "Downloads"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Monitoring"))
        .stderr(predicate::str::contains("1 existing files queued"));

    shelf
        .shelf()?
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 pending"))
        .stdout(predicate::str::contains("manual"))
        .stdout(predicate::str::contains("1 directories, 1 pending files"));
    Ok(())
}

#[test]
fn test_list_when_empty() -> Result<()> {
    let shelf = TestShelf::new()?;
    shelf
        .shelf()?
        .arg("ls")
        .assert()
        .success()
        .stderr(predicate::str::contains("No directories monitored"));
    Ok(())
}

#[test]
fn test_process_links_pending_files() -> Result<()> {
    let shelf = TestShelf::new()?;
    shelf.add_download("Heat.1995.mkv")?;
    let id = shelf.ctx()?.manager().add_directory(&shelf.downloads, None, false)?.id;

    shelf
        .shelf()?
        .args(["process", &id[..8]])
        .assert()
        .success()
        .stderr(predicate::str::contains("1 linked, 0 failed, 0 skipped"));

    assert!(shelf.in_library("Movies/Heat (1995)/Heat.1995.mkv").is_symlink());

    shelf
        .shelf()?
        .args(["process", &id])
        .assert()
        .success()
        .stderr(predicate::str::contains("Nothing pending"));
    Ok(())
}

#[test]
fn test_pause_resume_and_remove() -> Result<()> {
    let shelf = TestShelf::new()?;
    let id = shelf.ctx()?.manager().add_directory(&shelf.downloads, None, false)?.id;

    shelf.shelf()?.args(["pause", &id]).assert().success();
    shelf
        .shelf()?
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("paused"));

    shelf.shelf()?.args(["resume", &id]).assert().success();
    assert!(shelf.ctx()?.manager().directory(&id)?.active);

    shelf.shelf()?.args(["rm", &id]).assert().success();
    assert!(shelf.ctx()?.manager().directories()?.is_empty());
    Ok(())
}

#[test]
fn test_clear_pending() -> Result<()> {
    let shelf = TestShelf::new()?;
    shelf.add_download("Heat.1995.mkv")?;
    shelf.add_download("Ronin.1998.mkv")?;
    let id = shelf.ctx()?.manager().add_directory(&shelf.downloads, None, false)?.id;

    shelf
        .shelf()?
        .args(["clear-pending", &id])
        .assert()
        .success()
        .stderr(predicate::str::contains("Cleared 2 pending files"));
    assert!(shelf.ctx()?.manager().directory(&id)?.pending_files.is_empty());
    Ok(())
}

#[test]
fn test_add_missing_directory_fails() -> Result<()> {
    let shelf = TestShelf::new()?;
    shelf
        .shelf()?
        .arg("add")
        .arg(shelf.path().join("does-not-exist"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("path not found"));
    Ok(())
}

#[test]
fn test_unknown_id_fails() -> Result<()> {
    let shelf = TestShelf::new()?;
    shelf
        .shelf()?
        .args(["pause", "ffffffff"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no monitored directory"));
    Ok(())
}

#[test]
fn test_config_get_and_set() -> Result<()> {
    let shelf = TestShelf::new()?;
    shelf
        .shelf()?
        .args(["config", "library.movie_folder"])
        .assert()
        .success()
        .stdout("Movies\n");

    shelf
        .shelf()?
        .args(["config", "library.movie_folder", "Films"])
        .assert()
        .success();
    assert_eq!(shelf.ctx()?.config.library.movie_folder, "Films");

    shelf
        .shelf()?
        .args(["config", "core.nonsense"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown configuration key"));

    shelf
        .shelf()?
        .args(["config", "--list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[library]"));
    Ok(())
}

#[test]
fn test_scan_reports_new_files() -> Result<()> {
    let shelf = TestShelf::new()?;
    shelf.ctx()?.manager().add_directory(&shelf.downloads, None, false)?;
    shelf.add_download("Heat.1995.mkv")?;

    shelf
        .shelf()?
        .arg("scan")
        .assert()
        .success()
        .stderr(predicate::str::contains("1 new files: 0 linked, 1 queued"));
    Ok(())
}

#[test]
fn test_commands_fail_while_locked() -> Result<()> {
    let shelf = TestShelf::new()?;
    let _held = StateLock::acquire(&shelf.state_path, LockPurpose::Watch)?;

    shelf
        .shelf()?
        .arg("scan")
        .assert()
        .failure()
        .stderr(predicate::str::contains("locked"));
    Ok(())
}

#[test]
fn test_watch_links_auto_directory() -> Result<()> {
    let shelf = TestShelf::new()?;
    shelf.ctx()?.manager().add_directory(&shelf.downloads, None, true)?;
    shelf.add_download("Heat.1995.mkv")?;

    shelf
        .shelf()?
        .args(["watch", "--interval", "1s", "--for-secs", "1"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Watching 1 directories"));

    assert!(shelf.in_library("Movies/Heat (1995)/Heat.1995.mkv").is_symlink());
    Ok(())
}

#[test]
fn test_watch_rejects_bad_interval() -> Result<()> {
    let shelf = TestShelf::new()?;
    shelf
        .shelf()?
        .args(["watch", "--interval", "soon"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid interval"));
    Ok(())
}

#[test]
fn test_repair_dry_run_on_clean_library() -> Result<()> {
    let shelf = TestShelf::new()?;
    std::fs::create_dir_all(&shelf.library)?;
    shelf
        .shelf()?
        .args(["repair", "--dry-run"])
        .assert()
        .success()
        .stderr(predicate::str::contains("0 broken links"));
    Ok(())
}

#[test]
fn test_completion_bash() -> Result<()> {
    let shelf = TestShelf::new()?;
    shelf
        .shelf()?
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("shelf"));
    Ok(())
}
