//! Full-content installation: staging, metadata recording, cancellation.

use anyhow::Result;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use patchup::commands::{AppUpdaterCommand, CommandState, InstallContentCommand};
use patchup::core::{CancellationToken, UpdaterError, VersionId, is_cancellation};
use patchup::local::InstalledState;
use patchup::status::StatusMonitor;
use patchup::test_utils::{FakeDownloader, StatusRecorder};

use super::common::{TestInstallation, serve_package};

#[tokio::test]
async fn test_install_records_every_file_and_reaches_full_progress() -> Result<()> {
    let env = TestInstallation::new()?;
    let version = VersionId::new(7);
    let fixture = env.package(
        version,
        &[("a.txt", b"0123456789".as_slice()), ("b/c.txt", b"01234567890123456789".as_slice())],
    )?;
    let (remote, downloader) = serve_package(version, &fixture)?;
    let context = env.context(remote, downloader)?;

    let monitor = StatusMonitor::new();
    let recorder = StatusRecorder::attach(&monitor);
    let mut command = InstallContentCommand::new(version, context.clone(), fixture.path.clone());

    command.prepare(&monitor).await?;
    command.execute(&CancellationToken::new()).await?;
    assert_eq!(command.state(), CommandState::Completed);

    assert_eq!(env.read_installed("a.txt")?, b"0123456789");
    assert_eq!(env.read_installed("b/c.txt")?, b"01234567890123456789");

    let local = context.local.lock().await;
    assert_eq!(local.metadata().installed_state(), InstalledState::Version(version));
    assert_eq!(local.metadata().file_names(), vec!["a.txt", "b/c.txt"]);
    drop(local);

    assert_eq!(recorder.last_progress(), Some(1.0));
    assert!(recorder.is_monotonic());
    assert!(env.staging_area_is_empty()?);
    Ok(())
}

#[tokio::test]
async fn test_missing_package_file_fails_and_keeps_earlier_files() -> Result<()> {
    let env = TestInstallation::new()?;
    let version = VersionId::new(3);
    // The summary declares a third file the archive never contained.
    let mut fixture =
        env.package(version, &[("a.txt", b"aaaa".as_slice()), ("b.txt", b"bbbb".as_slice())])?;
    fixture.summary.files.push(patchup::remote::ContentFileEntry {
        path: "phantom.txt".to_string(),
        size: 4,
        hash: None,
    });

    let (remote, downloader) = serve_package(version, &fixture)?;
    let context = env.context(remote, downloader)?;

    let monitor = StatusMonitor::new();
    let mut command = InstallContentCommand::new(version, context.clone(), fixture.path.clone());
    command.prepare(&monitor).await?;
    let err = command.execute(&CancellationToken::new()).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<UpdaterError>(),
        Some(UpdaterError::MissingPackageFile { path }) if path == "phantom.txt"
    ));
    assert_eq!(command.state(), CommandState::Failed);

    // The two real files were installed and recorded before the failure.
    let local = context.local.lock().await;
    assert_eq!(local.metadata().file_names(), vec!["a.txt", "b.txt"]);
    drop(local);
    assert!(env.is_installed("a.txt"));
    assert!(env.is_installed("b.txt"));
    assert!(!env.is_installed("phantom.txt"));

    assert!(env.staging_area_is_empty()?);
    Ok(())
}

#[tokio::test]
async fn test_empty_package_completes_with_full_progress() -> Result<()> {
    let env = TestInstallation::new()?;
    let version = VersionId::new(1);
    let fixture = env.package(version, &[])?;
    let (remote, downloader) = serve_package(version, &fixture)?;
    let context = env.context(remote, downloader)?;

    let monitor = StatusMonitor::new();
    let mut command = InstallContentCommand::new(version, context.clone(), fixture.path.clone());
    command.prepare(&monitor).await?;
    command.execute(&CancellationToken::new()).await?;

    assert_eq!(command.state(), CommandState::Completed);
    assert!(context.local.lock().await.metadata().is_empty());
    assert_eq!(monitor.overall_status().progress, 1.0);
    Ok(())
}

#[tokio::test]
async fn test_install_rejects_non_empty_installation() -> Result<()> {
    let env = TestInstallation::new()?;
    let version = VersionId::new(2);
    let fixture = env.package(version, &[("a.txt", b"aaaa".as_slice())])?;
    let (remote, downloader) = serve_package(version, &fixture)?;
    let context = env.context(remote, downloader)?;

    {
        let mut local = context.local.lock().await;
        local.enable_write_access()?;
        local.metadata_mut().add_or_update_file("stale.txt", VersionId::new(1))?;
    }

    let monitor = StatusMonitor::new();
    let mut command = InstallContentCommand::new(version, context, fixture.path.clone());
    command.prepare(&monitor).await?;
    let err = command.execute(&CancellationToken::new()).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<UpdaterError>(),
        Some(UpdaterError::InstallationNotEmpty { file_count: 1 })
    ));
    assert_eq!(command.state(), CommandState::Failed);
    Ok(())
}

#[tokio::test]
async fn test_execute_twice_is_a_lifecycle_error() -> Result<()> {
    let env = TestInstallation::new()?;
    let version = VersionId::new(4);
    let fixture = env.package(version, &[("a.txt", b"aaaa".as_slice())])?;
    let (remote, downloader) = serve_package(version, &fixture)?;
    let context = env.context(remote, downloader)?;

    let monitor = StatusMonitor::new();
    let mut command = InstallContentCommand::new(version, context, fixture.path.clone());
    command.prepare(&monitor).await?;
    command.execute(&CancellationToken::new()).await?;

    let err = command.execute(&CancellationToken::new()).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<UpdaterError>(),
        Some(UpdaterError::InvalidCommandState { operation: "execute", state: "completed" })
    ));
    Ok(())
}

#[tokio::test]
async fn test_prepare_after_execute_is_a_lifecycle_error() -> Result<()> {
    let env = TestInstallation::new()?;
    let version = VersionId::new(4);
    let fixture = env.package(version, &[("a.txt", b"aaaa".as_slice())])?;
    let (remote, downloader) = serve_package(version, &fixture)?;
    let context = env.context(remote, downloader)?;

    let monitor = StatusMonitor::new();
    let mut command = InstallContentCommand::new(version, context, fixture.path.clone());
    command.prepare(&monitor).await?;
    let err = command.prepare(&monitor).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<UpdaterError>(),
        Some(UpdaterError::InvalidCommandState { operation: "prepare", .. })
    ));
    Ok(())
}

#[tokio::test]
async fn test_cancellation_mid_copy_keeps_files_installed_so_far() -> Result<()> {
    let env = TestInstallation::new()?;
    let version = VersionId::new(9);
    let files: Vec<(&str, &[u8])> = vec![
        ("f1.bin", b"one".as_slice()),
        ("f2.bin", b"two".as_slice()),
        ("f3.bin", b"three".as_slice()),
        ("f4.bin", b"four".as_slice()),
        ("f5.bin", b"five".as_slice()),
    ];
    let fixture = env.package(version, &files)?;
    let (remote, _) = serve_package(version, &fixture)?;
    let context = env.context(remote, FakeDownloader::new())?;

    let monitor = StatusMonitor::new();
    let token = CancellationToken::new();

    // Each of the 5 archive entries publishes once during extraction, then
    // each copied file publishes once. Cancelling on the 7th publish lands
    // after file 2's copy and before file 3's cancellation check.
    let publishes = Arc::new(AtomicUsize::new(0));
    let publishes_clone = Arc::clone(&publishes);
    let cancel_token = token.clone();
    let _sub = monitor.subscribe(move |_| {
        if publishes_clone.fetch_add(1, Ordering::SeqCst) + 1 == 7 {
            cancel_token.cancel();
        }
    });

    let mut command = InstallContentCommand::new(version, context.clone(), fixture.path.clone());
    command.prepare(&monitor).await?;
    let err = command.execute(&token).await.unwrap_err();

    assert!(is_cancellation(&err));
    assert_eq!(command.state(), CommandState::Cancelled);

    let local = context.local.lock().await;
    assert_eq!(local.metadata().file_names(), vec!["f1.bin", "f2.bin"]);
    drop(local);
    assert!(env.is_installed("f2.bin"));
    assert!(!env.is_installed("f3.bin"));
    assert!(env.staging_area_is_empty()?);
    Ok(())
}
