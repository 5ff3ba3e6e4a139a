use hotexit::api::HotExitApi;
use hotexit::config::{HotExitConfig, SharedSettings};
use hotexit::events::{DocumentSnapshot, EventEmitter, TextFileEvent, UntitledEvent};
use hotexit::hash::path_hash;
use hotexit::model::{BackupAction, Resource};
use hotexit::orchestrator::BackupOrchestrator;
use hotexit::paths::BackupPaths;
use hotexit::registry::BackupRegistry;
use hotexit::store::fs::FsBackupStore;
use hotexit::store::BackupStore;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

struct Window {
    _dir: TempDir,
    paths: BackupPaths,
    settings: SharedSettings,
    text_files: EventEmitter<TextFileEvent>,
    untitled: EventEmitter<UntitledEvent>,
    orchestrator: BackupOrchestrator,
}

fn open_window(hot_exit: bool) -> Window {
    let dir = TempDir::new().unwrap();
    let paths = BackupPaths::from_home(dir.path());
    let settings = SharedSettings::new(HotExitConfig {
        hot_exit,
        ..HotExitConfig::default()
    });
    let text_files = EventEmitter::new();
    let untitled = EventEmitter::new();
    let store = FsBackupStore::new(paths.clone(), Some("/proj".to_string()));
    let orchestrator = BackupOrchestrator::start(
        Arc::new(store),
        Arc::new(settings.clone()),
        &text_files,
        &untitled,
    );
    Window {
        _dir: dir,
        paths,
        settings,
        text_files,
        untitled,
        orchestrator,
    }
}

/// Poll until `path` reaches the expected state; listeners run on their own tasks.
async fn wait_for(path: &Path, should_exist: bool) {
    for _ in 0..200 {
        if path.exists() == should_exist {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!(
        "{} never {}",
        path.display(),
        if should_exist { "appeared" } else { "went away" }
    );
}

#[tokio::test]
async fn test_dirty_file_backed_up_then_removed_on_save() {
    let window = open_window(true);
    let doc = Resource::file("/proj/a.ts");
    let backup = window
        .paths
        .backup_home
        .join(path_hash("/proj"))
        .join("file")
        .join(path_hash("/proj/a.ts"));

    window
        .text_files
        .emit(TextFileEvent::ContentChanged(DocumentSnapshot::new(
            doc.clone(),
            "x=1",
            true,
        )));
    wait_for(&backup, true).await;
    assert_eq!(std::fs::read_to_string(&backup).unwrap(), "x=1");

    window.text_files.emit(TextFileEvent::Saved(doc));
    wait_for(&backup, false).await;
}

#[tokio::test]
async fn test_untitled_backed_up_then_removed_when_emptied() {
    let window = open_window(true);
    let doc = Resource::untitled("Untitled-1");
    let backup = window
        .paths
        .backup_home
        .join(path_hash("/proj"))
        .join("untitled")
        .join("Untitled-1");

    window
        .untitled
        .emit(UntitledEvent::ContentChanged(DocumentSnapshot::new(
            doc.clone(),
            "hello",
            true,
        )));
    wait_for(&backup, true).await;
    assert_eq!(std::fs::read_to_string(&backup).unwrap(), "hello");

    window
        .untitled
        .emit(UntitledEvent::ContentChanged(DocumentSnapshot::new(
            doc, "", false,
        )));
    wait_for(&backup, false).await;
}

#[tokio::test]
async fn test_hot_exit_off_never_creates_backups() {
    let window = open_window(false);
    let file = Resource::file("/proj/a.ts");
    let untitled = Resource::untitled("Untitled-1");

    let actions = [
        window
            .orchestrator
            .on_text_file_event(TextFileEvent::ContentChanged(DocumentSnapshot::new(
                file.clone(),
                "x=1",
                true,
            )))
            .await
            .unwrap(),
        window
            .orchestrator
            .on_untitled_event(UntitledEvent::ContentChanged(DocumentSnapshot::new(
                untitled.clone(),
                "hello",
                true,
            )))
            .await
            .unwrap(),
        window
            .orchestrator
            .on_text_file_event(TextFileEvent::Saved(file.clone()))
            .await
            .unwrap(),
        window
            .orchestrator
            .on_untitled_event(UntitledEvent::Disposed(untitled))
            .await
            .unwrap(),
    ];
    assert_eq!(
        actions,
        [
            BackupAction::Skipped,
            BackupAction::Skipped,
            BackupAction::Discarded,
            BackupAction::Discarded
        ]
    );
    assert!(!window.paths.workspace_dir("/proj").exists());
}

#[tokio::test]
async fn test_turning_hot_exit_on_takes_effect_without_restart() {
    let window = open_window(false);
    let doc = Resource::untitled("Untitled-1");
    let store = window.orchestrator.store();

    window
        .orchestrator
        .on_untitled_event(UntitledEvent::ContentChanged(DocumentSnapshot::new(
            doc.clone(),
            "a",
            true,
        )))
        .await
        .unwrap();
    assert!(!store.has_backup(&doc).await.unwrap());

    window.settings.set_hot_exit(true);
    window
        .orchestrator
        .on_untitled_event(UntitledEvent::ContentChanged(DocumentSnapshot::new(
            doc.clone(),
            "ab",
            true,
        )))
        .await
        .unwrap();
    assert_eq!(store.read_backup(&doc).await.unwrap(), Some("ab".to_string()));
}

#[tokio::test]
async fn test_close_right_after_edit_leaves_nothing() {
    let window = open_window(true);
    let doc = Resource::file("/proj/a.ts");

    for i in 0..20 {
        window
            .text_files
            .emit(TextFileEvent::ContentChanged(DocumentSnapshot::new(
                doc.clone(),
                format!("x={}", i),
                true,
            )));
    }
    window.text_files.emit(TextFileEvent::Disposed(doc.clone()));

    // Events are handled one at a time, so once this lands the dispose is done.
    let marker = Resource::file("/proj/marker.ts");
    window
        .text_files
        .emit(TextFileEvent::ContentChanged(DocumentSnapshot::new(
            marker.clone(),
            "m",
            true,
        )));
    let store = window.orchestrator.store();
    let marker_path = store.backup_location(&marker).unwrap();
    wait_for(&marker_path, true).await;

    assert!(!store.backup_location(&doc).unwrap().exists());
}

#[tokio::test]
async fn test_save_right_before_shutdown_still_discards() {
    let mut window = open_window(true);
    let doc = Resource::file("/proj/a.ts");
    let backup = window.orchestrator.store().backup_location(&doc).unwrap();

    window
        .text_files
        .emit(TextFileEvent::ContentChanged(DocumentSnapshot::new(
            doc.clone(),
            "x".repeat(256 * 1024),
            true,
        )));
    wait_for(&backup, true).await;

    window.text_files.emit(TextFileEvent::Saved(doc));
    window.orchestrator.shutdown().await;

    assert!(!backup.exists());
    assert!(!window.orchestrator.is_listening());
}

#[test]
fn test_registry_survives_restart() {
    let dir = TempDir::new().unwrap();
    let paths = BackupPaths::from_home(dir.path());

    let mut registry = BackupRegistry::load(paths.clone());
    assert!(registry.workspace_backup_paths().is_empty());

    registry.push_workspace_backup_paths(["/proj"]);
    drop(registry);

    let registry = BackupRegistry::load(paths);
    assert_eq!(registry.workspace_backup_paths(), ["/proj"]);
}

#[tokio::test]
async fn test_hot_exit_then_restore_on_next_launch() {
    let dir = TempDir::new().unwrap();
    let paths = BackupPaths::from_home(dir.path());

    {
        let mut api = HotExitApi::open(paths.clone()).unwrap();
        let store = api.open_workspace(Some("/proj"));
        let text_files = EventEmitter::new();
        let untitled = EventEmitter::new();
        let orchestrator = BackupOrchestrator::start(
            store,
            Arc::new(api.settings().clone()),
            &text_files,
            &untitled,
        );
        orchestrator
            .on_untitled_event(UntitledEvent::ContentChanged(DocumentSnapshot::new(
                Resource::untitled("Untitled-1"),
                "draft",
                true,
            )))
            .await
            .unwrap();
        api.close_workspace("/proj", false).await.unwrap();
    }

    let mut api = HotExitApi::open(paths).unwrap();
    assert_eq!(api.recoverable_workspaces(), vec!["/proj"]);
    let restored = api.restore_untitled("/proj").await;
    assert_eq!(restored.len(), 1);
    assert_eq!(restored[0].resource, Resource::untitled("Untitled-1"));
    assert_eq!(restored[0].content, "draft");

    api.close_workspace("/proj", true).await.unwrap();
    assert!(api.recoverable_workspaces().is_empty());
    assert!(api.tracked_workspaces().is_empty());
}
