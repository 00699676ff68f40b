//! Uninstall: removal of registered files, stale records, empty stores.

use anyhow::Result;

use patchup::commands::{AppUpdaterCommand, CommandState, UninstallCommand};
use patchup::core::{CancellationToken, VersionId, is_cancellation};
use patchup::status::StatusMonitor;
use patchup::test_utils::{FakeDownloader, StaticRemoteSource, StatusRecorder};

use super::common::TestInstallation;

/// Installs `files` directly into the local store, bypassing the pipeline.
async fn seed_installed(
    context: &patchup::commands::UpdateContext,
    version: VersionId,
    files: &[(&str, &[u8])],
) -> Result<()> {
    let mut local = context.local.lock().await;
    local.enable_write_access()?;
    for (path, content) in files {
        let source = local.root().join("seed.tmp");
        std::fs::write(&source, content)?;
        local.create_or_update_file(path, &source).await?;
        local.metadata_mut().add_or_update_file(path, version)?;
        std::fs::remove_file(&source)?;
    }
    Ok(())
}

fn empty_context(env: &TestInstallation) -> Result<std::sync::Arc<patchup::commands::UpdateContext>> {
    env.context(StaticRemoteSource::new(VersionId::new(1)), FakeDownloader::new())
}

#[tokio::test]
async fn test_uninstall_removes_files_records_and_empty_dirs() -> Result<()> {
    let env = TestInstallation::new()?;
    let context = empty_context(&env)?;
    seed_installed(
        &context,
        VersionId::new(3),
        &[("a.txt", b"aaaa".as_slice()), ("nested/dir/b.txt", b"bbbb".as_slice())],
    )
    .await?;

    let monitor = StatusMonitor::new();
    let recorder = StatusRecorder::attach(&monitor);
    let mut command = UninstallCommand::new(context.clone());
    command.prepare(&monitor).await?;
    command.execute(&CancellationToken::new()).await?;

    assert_eq!(command.state(), CommandState::Completed);
    assert!(!env.is_installed("a.txt"));
    assert!(!env.is_installed("nested/dir/b.txt"));
    assert!(!env.root().join("app/nested").exists());
    assert!(context.local.lock().await.metadata().is_empty());
    assert_eq!(recorder.last_progress(), Some(1.0));
    Ok(())
}

#[tokio::test]
async fn test_stale_record_without_file_is_removed_cleanly() -> Result<()> {
    let env = TestInstallation::new()?;
    let context = empty_context(&env)?;
    {
        let mut local = context.local.lock().await;
        local.enable_write_access()?;
        local.metadata_mut().add_or_update_file("vanished.bin", VersionId::new(2))?;
    }

    let monitor = StatusMonitor::new();
    let mut command = UninstallCommand::new(context.clone());
    command.prepare(&monitor).await?;
    command.execute(&CancellationToken::new()).await?;

    assert_eq!(command.state(), CommandState::Completed);
    assert!(context.local.lock().await.metadata().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_uninstall_of_empty_store_completes() -> Result<()> {
    let env = TestInstallation::new()?;
    let context = empty_context(&env)?;

    let monitor = StatusMonitor::new();
    let mut command = UninstallCommand::new(context);
    command.prepare(&monitor).await?;
    command.execute(&CancellationToken::new()).await?;
    assert_eq!(command.state(), CommandState::Completed);
    Ok(())
}

#[tokio::test]
async fn test_cancelled_uninstall_keeps_remaining_records_accurate() -> Result<()> {
    let env = TestInstallation::new()?;
    let context = empty_context(&env)?;
    seed_installed(
        &context,
        VersionId::new(3),
        &[("a.txt", b"a".as_slice()), ("b.txt", b"b".as_slice()), ("c.txt", b"c".as_slice())],
    )
    .await?;

    let monitor = StatusMonitor::new();
    let token = CancellationToken::new();

    // One publish per removed file; cancel after the first.
    let cancel_token = token.clone();
    let _sub = monitor.subscribe(move |_| cancel_token.cancel());

    let mut command = UninstallCommand::new(context.clone());
    command.prepare(&monitor).await?;
    let err = command.execute(&token).await.unwrap_err();

    assert!(is_cancellation(&err));
    assert_eq!(command.state(), CommandState::Cancelled);

    let local = context.local.lock().await;
    assert_eq!(local.metadata().file_names(), vec!["b.txt", "c.txt"]);
    drop(local);
    assert!(!env.is_installed("a.txt"));
    assert!(env.is_installed("b.txt"));
    Ok(())
}
