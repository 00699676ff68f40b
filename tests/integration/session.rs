//! Update sessions: strategy selection and end-to-end runs.

use anyhow::Result;
use std::sync::Arc;

use patchup::archive::ZipUnarchiver;
use patchup::core::{UpdaterError, VersionId, is_cancellation};
use patchup::local::InstalledState;
use patchup::test_utils::{FakeDownloader, PackageFixture, StaticRemoteSource, StatusRecorder};
use patchup::updater::{AppUpdater, UpdateOutcome};

use super::common::{TestInstallation, serve_package};

fn updater(
    env: &TestInstallation,
    remote: StaticRemoteSource,
    downloader: FakeDownloader,
) -> Result<AppUpdater> {
    Ok(AppUpdater::new(
        env.open_local()?,
        Arc::new(remote),
        Arc::new(downloader),
        Arc::new(ZipUnarchiver::new()),
    ))
}

fn serve_two_versions(
    latest: VersionId,
    packages: &[(VersionId, &PackageFixture)],
) -> Result<(StaticRemoteSource, FakeDownloader)> {
    let mut remote = StaticRemoteSource::new(latest);
    let mut downloader = FakeDownloader::new();
    for (version, fixture) in packages {
        remote = remote.with_summary(*version, fixture.summary.clone());
        downloader = downloader.with_package_file(
            format!("static://versions/{version}/package.zip"),
            &fixture.path,
        )?;
    }
    Ok((remote, downloader))
}

#[tokio::test]
async fn test_fresh_root_installs_latest_version() -> Result<()> {
    let env = TestInstallation::new()?;
    let version = VersionId::new(7);
    let fixture = env.package(
        version,
        &[("a.txt", b"0123456789".as_slice()), ("b/c.txt", b"01234567890123456789".as_slice())],
    )?;
    let (remote, downloader) = serve_package(version, &fixture)?;
    let updater = updater(&env, remote, downloader)?;

    let session = updater.session(None).await?;
    assert!(!session.is_up_to_date());
    assert_eq!(session.target_version(), version);

    let recorder = StatusRecorder::attach(&session.status_monitor());
    let outcome = session.run().await?;

    assert_eq!(outcome, UpdateOutcome::Installed(version));
    assert_eq!(env.read_installed("a.txt")?, b"0123456789");
    assert_eq!(env.read_installed("b/c.txt")?, b"01234567890123456789");
    assert_eq!(
        env.open_local()?.metadata().installed_state(),
        InstalledState::Version(version)
    );
    assert_eq!(recorder.last_progress(), Some(1.0));
    assert!(recorder.is_monotonic());
    assert!(env.staging_area_is_empty()?);
    Ok(())
}

#[tokio::test]
async fn test_matching_version_is_up_to_date() -> Result<()> {
    let env = TestInstallation::new()?;
    let version = VersionId::new(3);
    let fixture = env.package(version, &[("a.txt", b"alpha".as_slice())])?;
    let (remote, downloader) = serve_package(version, &fixture)?;
    updater(&env, remote, downloader)?.session(None).await?.run().await?;

    // A new session over the same root has nothing to do.
    let (remote, downloader) = serve_package(version, &fixture)?;
    let session = updater(&env, remote, downloader)?.session(Some(version)).await?;
    assert!(session.is_up_to_date());
    assert_eq!(session.run().await?, UpdateOutcome::UpToDate(version));
    Ok(())
}

#[tokio::test]
async fn test_version_change_uninstalls_then_installs() -> Result<()> {
    let env = TestInstallation::new()?;
    let v1 = VersionId::new(1);
    let v2 = VersionId::new(2);
    let old = env.package(v1, &[("a.txt", b"old a".as_slice()), ("old.txt", b"only in v1".as_slice())])?;
    let new = env.package(v2, &[("a.txt", b"new a".as_slice()), ("b.txt", b"only in v2".as_slice())])?;

    let (remote, downloader) = serve_two_versions(v1, &[(v1, &old)])?;
    updater(&env, remote, downloader)?.session(Some(v1)).await?.run().await?;

    let (remote, downloader) = serve_two_versions(v2, &[(v2, &new)])?;
    let outcome = updater(&env, remote, downloader)?.session(None).await?.run().await?;

    assert_eq!(outcome, UpdateOutcome::Installed(v2));
    assert_eq!(env.read_installed("a.txt")?, b"new a");
    assert_eq!(env.read_installed("b.txt")?, b"only in v2");
    assert!(!env.is_installed("old.txt"));
    assert_eq!(env.open_local()?.metadata().installed_state(), InstalledState::Version(v2));
    Ok(())
}

#[tokio::test]
async fn test_mixed_versions_trigger_reinstall() -> Result<()> {
    let env = TestInstallation::new()?;
    let target = VersionId::new(5);
    let fixture = env.package(target, &[("a.txt", b"clean".as_slice())])?;

    // An interrupted earlier update left records at two different versions.
    {
        let mut local = env.open_local()?;
        local.enable_write_access()?;
        local.metadata_mut().add_or_update_file("a.txt", VersionId::new(1))?;
        local.metadata_mut().add_or_update_file("b.txt", VersionId::new(2))?;
        std::fs::write(local.install_path("a.txt")?, b"half old")?;
        std::fs::write(local.install_path("b.txt")?, b"half new")?;
    }
    assert_eq!(env.open_local()?.metadata().installed_state(), InstalledState::Mixed);

    let (remote, downloader) = serve_package(target, &fixture)?;
    let session = updater(&env, remote, downloader)?.session(Some(target)).await?;
    assert!(!session.is_up_to_date());
    session.run().await?;

    assert_eq!(env.read_installed("a.txt")?, b"clean");
    assert!(!env.is_installed("b.txt"));
    assert_eq!(env.open_local()?.metadata().installed_state(), InstalledState::Version(target));
    Ok(())
}

#[tokio::test]
async fn test_cancelled_session_fails_with_cancellation() -> Result<()> {
    let env = TestInstallation::new()?;
    let version = VersionId::new(4);
    let fixture = env.package(version, &[("a.txt", b"alpha".as_slice())])?;
    let (remote, downloader) = serve_package(version, &fixture)?;

    let session = updater(&env, remote, downloader)?.session(Some(version)).await?;
    session.cancellation_token().cancel();

    let err = session.run().await.unwrap_err();
    assert!(is_cancellation(&err));
    assert!(env.open_local()?.metadata().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_unknown_target_version_fails_during_prepare() -> Result<()> {
    let env = TestInstallation::new()?;
    let known = VersionId::new(1);
    let fixture = env.package(known, &[("a.txt", b"alpha".as_slice())])?;
    let (remote, downloader) = serve_package(known, &fixture)?;

    let session = updater(&env, remote, downloader)?.session(Some(VersionId::new(99))).await?;
    let err = session.run().await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<UpdaterError>(),
        Some(UpdaterError::VersionNotFound { version: 99 })
    ));
    assert!(env.open_local()?.metadata().is_empty());
    Ok(())
}
