//! Read-only integrity audits against a version's content summary.

use anyhow::Result;
use std::sync::Arc;

use patchup::commands::{
    AppUpdaterCommand, CommandState, FileIntegrity, InstallContentCommand,
    ValidateIntegrityCommand,
};
use patchup::core::{CancellationToken, VersionId};
use patchup::status::StatusMonitor;

use super::common::{TestInstallation, serve_package};

/// Installs a fixture so there is something to audit.
async fn install_fixture(
    env: &TestInstallation,
    version: VersionId,
    files: &[(&str, &[u8])],
) -> Result<Arc<patchup::commands::UpdateContext>> {
    let fixture = env.package(version, files)?;
    let (remote, downloader) = serve_package(version, &fixture)?;
    let context = env.context(remote, downloader)?;

    let monitor = StatusMonitor::new();
    let mut install = InstallContentCommand::new(version, context.clone(), fixture.path.clone());
    install.prepare(&monitor).await?;
    install.execute(&CancellationToken::new()).await?;
    Ok(context)
}

#[tokio::test]
async fn test_intact_installation_is_valid() -> Result<()> {
    let env = TestInstallation::new()?;
    let version = VersionId::new(7);
    let context = install_fixture(
        &env,
        version,
        &[("a.txt", b"alpha".as_slice()), ("b/c.txt", b"nested".as_slice())],
    )
    .await?;

    let monitor = StatusMonitor::new();
    let mut command = ValidateIntegrityCommand::new(version, context);
    command.prepare(&monitor).await?;
    command.execute(&CancellationToken::new()).await?;

    assert_eq!(command.state(), CommandState::Completed);
    assert!(command.report().is_valid());
    assert_eq!(command.report().entries.len(), 2);
    assert_eq!(monitor.overall_status().progress, 1.0);
    Ok(())
}

#[tokio::test]
async fn test_audit_classifies_each_kind_of_damage() -> Result<()> {
    let env = TestInstallation::new()?;
    let version = VersionId::new(7);
    let context = install_fixture(
        &env,
        version,
        &[
            ("ok.txt", b"fine!".as_slice()),
            ("tampered.txt", b"12345".as_slice()),
            ("truncated.txt", b"long content here".as_slice()),
            ("deleted.txt", b"gone".as_slice()),
            ("forgotten.txt", b"no record".as_slice()),
        ],
    )
    .await?;

    // Same size, different bytes.
    std::fs::write(env.root().join("app/tampered.txt"), b"54321")?;
    // Different size.
    std::fs::write(env.root().join("app/truncated.txt"), b"short")?;
    // Present in the summary, absent on disk.
    std::fs::remove_file(env.root().join("app/deleted.txt"))?;
    // Present on disk but dropped from the metadata record.
    context.local.lock().await.metadata_mut().remove_file("forgotten.txt")?;

    let monitor = StatusMonitor::new();
    let mut command = ValidateIntegrityCommand::new(version, context);
    command.prepare(&monitor).await?;
    command.execute(&CancellationToken::new()).await?;

    let report = command.report();
    assert!(!report.is_valid());

    let status_of = |name: &str| {
        report
            .entries
            .iter()
            .find(|(path, _)| path == name)
            .map(|(_, status)| *status)
            .expect("entry audited")
    };
    assert_eq!(status_of("ok.txt"), FileIntegrity::Ok);
    assert_eq!(status_of("tampered.txt"), FileIntegrity::InvalidHash);
    assert_eq!(status_of("truncated.txt"), FileIntegrity::InvalidSize);
    assert_eq!(status_of("deleted.txt"), FileIntegrity::MissingData);
    assert_eq!(status_of("forgotten.txt"), FileIntegrity::NotRegistered);

    assert_eq!(report.problems().count(), 4);
    Ok(())
}

#[tokio::test]
async fn test_audit_never_mutates_the_installation() -> Result<()> {
    let env = TestInstallation::new()?;
    let version = VersionId::new(2);
    let context = install_fixture(&env, version, &[("a.txt", b"alpha".as_slice())]).await?;

    std::fs::write(env.root().join("app/a.txt"), b"corrupted bytes")?;

    let monitor = StatusMonitor::new();
    let mut command = ValidateIntegrityCommand::new(version, context.clone());
    command.prepare(&monitor).await?;
    command.execute(&CancellationToken::new()).await?;

    assert!(!command.report().is_valid());
    // The damaged file and its record are untouched.
    assert_eq!(env.read_installed("a.txt")?, b"corrupted bytes");
    assert_eq!(
        context.local.lock().await.metadata().file_version("a.txt"),
        Some(version)
    );
    Ok(())
}
