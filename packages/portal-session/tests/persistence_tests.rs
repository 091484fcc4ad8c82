//! Session survival across restarts, per persistence scope.

mod common;

use crate::common::{login_data, TestPortal, LOGIN};
use portal_session::storage::{KEY_ROLE, KEY_STUDENT_ID, KEY_TOKEN, KEY_USER_ID};
use portal_session::testing::{MockTransport, RecordingNotifier};
use portal_session::{
    Credentials, FileStorage, MemoryStorage, PersistenceScope, Portal, PortalConfig, Role,
    SessionStorage,
};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

fn file_portal(path: &Path, transport: MockTransport) -> Portal {
    let config = PortalConfig::teacher().with_storage_path(path);
    let storage = Arc::new(FileStorage::open(path).unwrap());
    Portal::with_parts(
        config,
        storage,
        Arc::new(transport),
        Arc::new(RecordingNotifier::new()),
    )
}

#[tokio::test]
async fn persistent_session_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("teacher.json");

    let transport = MockTransport::new()
        .with_success(LOGIN, login_data("t2", json!(5), "bob", "TEACHER"))
        .with_success("/teacher/user/5", json!({ "avatarUrl": "/files/bob.png" }));
    let first = file_portal(&path, transport);
    assert!(first.login(&Credentials::new("bob", "pw")).await.unwrap());
    drop(first);

    let second = file_portal(&path, MockTransport::new());
    let session = second.session();
    assert_eq!(session.credential, "t2");
    assert_eq!(session.user_id, "5");
    assert_eq!(session.role, Some(Role::Teacher));
    assert_eq!(session.avatar_url.as_deref(), Some("/files/bob.png"));
    assert_eq!(second.navigate("/my-course").unwrap().location, "/my-course");
}

#[tokio::test]
async fn logout_removes_persisted_keys() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("teacher.json");

    let transport =
        MockTransport::new().with_success(LOGIN, login_data("t2", json!(5), "bob", "TEACHER"));
    let portal = file_portal(&path, transport);
    portal.login(&Credentials::new("bob", "pw")).await.unwrap();
    portal.logout().await;
    portal.logout().await;

    let reopened = FileStorage::open(&path).unwrap();
    assert_eq!(reopened.get(KEY_TOKEN), None);
    assert_eq!(reopened.get(KEY_ROLE), None);
    assert!(!file_portal(&path, MockTransport::new()).session().is_authenticated());
}

#[tokio::test]
async fn session_scoped_storage_ends_with_the_process() {
    let transport = MockTransport::new()
        .with_success(LOGIN, login_data("t1", json!(1), "alice", "STUDENT"))
        .with_success("/student/user/1", json!({ "studentId": "2024001" }));
    let t = TestPortal::new(Role::Student, transport);
    assert!(t
        .portal
        .login(&Credentials::new("alice", "pw"))
        .await
        .unwrap());
    assert_eq!(t.storage.get(KEY_STUDENT_ID).as_deref(), Some("2024001"));

    // A fresh session-scoped medium starts empty
    let restarted = TestPortal::with_storage(
        Role::Student,
        MockTransport::new(),
        Arc::new(MemoryStorage::new()),
    );
    assert!(!restarted.portal.session().is_authenticated());
    assert_eq!(restarted.storage.scope(), PersistenceScope::SessionScoped);
}

#[test]
fn storage_without_token_is_not_trusted() {
    let storage = Arc::new(MemoryStorage::with_entries([
        (KEY_USER_ID, "1"),
        (KEY_ROLE, "STUDENT"),
    ]));
    let t = TestPortal::with_storage(Role::Student, MockTransport::new(), storage);

    assert!(!t.portal.session().is_authenticated());
    assert_eq!(t.portal.session().role, None);
    assert_eq!(t.portal.navigate("/dashboard").unwrap().location, "/login");
}

#[test]
fn from_config_rehydrates_configured_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state").join("admin.json");
    {
        let storage = FileStorage::open(&path).unwrap();
        storage.set(KEY_TOKEN, "t7").unwrap();
        storage.set(KEY_USER_ID, "3").unwrap();
        storage.set(KEY_ROLE, "ADMIN").unwrap();
    }

    let config = PortalConfig::admin()
        .with_persistence(PersistenceScope::Persistent)
        .with_storage_path(&path);
    let portal = Portal::from_config(config, Arc::new(RecordingNotifier::new())).unwrap();

    let session = portal.session();
    assert_eq!(session.credential, "t7");
    assert_eq!(session.role, Some(Role::Admin));
    assert_eq!(portal.navigate("/").unwrap().location, "/dashboard");
}

#[test]
fn from_config_rejects_corrupt_storage_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("admin.json");
    std::fs::write(&path, "not json").unwrap();

    let config = PortalConfig::admin().with_storage_path(&path);
    assert!(Portal::from_config(config, Arc::new(RecordingNotifier::new())).is_err());
}
