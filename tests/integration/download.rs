//! Package download: fetching, reuse of verified packages, checksums.

use anyhow::Result;

use patchup::commands::{AppUpdaterCommand, CommandState, DownloadContentCommand};
use patchup::core::{CancellationToken, UpdaterError, VersionId, is_cancellation};
use patchup::status::StatusMonitor;
use patchup::test_utils::{FakeDownloader, StaticRemoteSource, StatusRecorder, sha256_of};

use super::common::{TestInstallation, serve_package};

fn package_url(version: VersionId) -> String {
    format!("static://versions/{version}/package.zip")
}

#[tokio::test]
async fn test_download_fetches_and_verifies_package() -> Result<()> {
    let env = TestInstallation::new()?;
    let version = VersionId::new(5);
    let fixture = env.package(version, &[("a.txt", b"payload".as_slice())])?;
    let (remote, downloader) = serve_package(version, &fixture)?;
    let calls = downloader.clone();
    let context = env.context(remote, downloader)?;

    let monitor = StatusMonitor::new();
    let recorder = StatusRecorder::attach(&monitor);
    let mut command = DownloadContentCommand::new(version, context);
    command.prepare(&monitor).await?;
    let destination = command.destination().expect("prepared").clone();

    command.execute(&CancellationToken::new()).await?;
    assert_eq!(command.state(), CommandState::Completed);
    assert_eq!(calls.call_count(), 1);

    assert_eq!(std::fs::read(&destination)?, std::fs::read(&fixture.path)?);
    assert_eq!(recorder.last_progress(), Some(1.0));
    assert!(recorder.is_monotonic());

    let status = monitor.overall_status();
    let download = status.download.expect("download counters present");
    assert_eq!(download.total_bytes, fixture.summary.size);
    Ok(())
}

#[tokio::test]
async fn test_verified_package_from_earlier_session_is_reused() -> Result<()> {
    let env = TestInstallation::new()?;
    let version = VersionId::new(5);
    let fixture = env.package(version, &[("a.txt", b"payload".as_slice())])?;
    let (remote, downloader) = serve_package(version, &fixture)?;
    let calls = downloader.clone();
    let context = env.context(remote, downloader)?;

    // Pre-place the completed package where the download would land.
    {
        let mut local = context.local.lock().await;
        local.enable_write_access()?;
        std::fs::copy(&fixture.path, local.download_path(version))?;
    }

    let monitor = StatusMonitor::new();
    let mut command = DownloadContentCommand::new(version, context);
    command.prepare(&monitor).await?;
    command.execute(&CancellationToken::new()).await?;

    assert_eq!(command.state(), CommandState::Completed);
    assert_eq!(calls.call_count(), 0);
    assert_eq!(monitor.overall_status().progress, 1.0);
    Ok(())
}

#[tokio::test]
async fn test_corrupt_leftover_package_is_downloaded_fresh() -> Result<()> {
    let env = TestInstallation::new()?;
    let version = VersionId::new(6);
    let fixture = env.package(version, &[("a.txt", b"payload".as_slice())])?;
    let (remote, downloader) = serve_package(version, &fixture)?;
    let calls = downloader.clone();
    let context = env.context(remote, downloader)?;

    {
        let mut local = context.local.lock().await;
        local.enable_write_access()?;
        std::fs::write(local.download_path(version), b"truncated garbage")?;
    }

    let monitor = StatusMonitor::new();
    let mut command = DownloadContentCommand::new(version, context);
    command.prepare(&monitor).await?;
    let destination = command.destination().expect("prepared").clone();
    command.execute(&CancellationToken::new()).await?;

    assert_eq!(calls.call_count(), 1);
    assert_eq!(std::fs::read(&destination)?, std::fs::read(&fixture.path)?);
    Ok(())
}

#[tokio::test]
async fn test_checksum_mismatch_deletes_download_and_fails() -> Result<()> {
    let env = TestInstallation::new()?;
    let version = VersionId::new(8);
    let mut fixture = env.package(version, &[("a.txt", b"payload".as_slice())])?;
    // Declare a digest the served bytes will never match.
    fixture.summary.hash = Some(sha256_of(b"a different package entirely"));

    let (remote, downloader) = serve_package(version, &fixture)?;
    let context = env.context(remote, downloader)?;

    let monitor = StatusMonitor::new();
    let mut command = DownloadContentCommand::new(version, context);
    command.prepare(&monitor).await?;
    let destination = command.destination().expect("prepared").clone();
    let err = command.execute(&CancellationToken::new()).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<UpdaterError>(),
        Some(UpdaterError::ChecksumMismatch { .. })
    ));
    assert_eq!(command.state(), CommandState::Failed);
    assert!(!destination.exists());
    Ok(())
}

#[tokio::test]
async fn test_transport_failure_is_a_typed_network_error() -> Result<()> {
    let env = TestInstallation::new()?;
    let version = VersionId::new(2);
    let fixture = env.package(version, &[("a.txt", b"0123456789012345678901234567890123456789".as_slice())])?;
    let remote = StaticRemoteSource::new(version).with_summary(version, fixture.summary.clone());
    let downloader = FakeDownloader::new()
        .with_package_file(package_url(version), &fixture.path)?
        .with_failure(package_url(version));
    let context = env.context(remote, downloader)?;

    let monitor = StatusMonitor::new();
    let mut command = DownloadContentCommand::new(version, context);
    command.prepare(&monitor).await?;
    let err = command.execute(&CancellationToken::new()).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<UpdaterError>(),
        Some(UpdaterError::NetworkError { .. })
    ));
    assert_eq!(command.state(), CommandState::Failed);
    Ok(())
}

#[tokio::test]
async fn test_already_cancelled_token_stops_download() -> Result<()> {
    let env = TestInstallation::new()?;
    let version = VersionId::new(2);
    let fixture = env.package(version, &[("a.txt", b"payload".as_slice())])?;
    let (remote, downloader) = serve_package(version, &fixture)?;
    let context = env.context(remote, downloader)?;

    let token = CancellationToken::new();
    token.cancel();

    let monitor = StatusMonitor::new();
    let mut command = DownloadContentCommand::new(version, context);
    command.prepare(&monitor).await?;
    let err = command.execute(&token).await.unwrap_err();

    assert!(is_cancellation(&err));
    assert_eq!(command.state(), CommandState::Cancelled);
    Ok(())
}
