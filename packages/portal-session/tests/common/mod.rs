#![allow(dead_code)]

use portal_session::storage::{KEY_ROLE, KEY_TOKEN, KEY_USERNAME, KEY_USER_ID};
use portal_session::testing::{MockTransport, RecordingNotifier};
use portal_session::{MemoryStorage, PersistenceScope, Portal, PortalConfig, Role, SessionStorage};
use serde_json::{json, Value};
use std::sync::Arc;

pub const LOGIN: &str = "/auth/login";

/// A portal wired to mocks, with handles to inspect them.
pub struct TestPortal {
    pub portal: Portal,
    pub transport: MockTransport,
    pub notifier: RecordingNotifier,
    pub storage: Arc<MemoryStorage>,
}

impl TestPortal {
    pub fn new(role: Role, transport: MockTransport) -> Self {
        Self::with_storage(role, transport, Arc::new(MemoryStorage::new()))
    }

    /// Portal whose storage already holds a session, as after a reload.
    pub fn signed_in(role: Role, held_role: Role, transport: MockTransport) -> Self {
        let storage = Arc::new(MemoryStorage::with_entries([
            (KEY_TOKEN, "t1"),
            (KEY_USER_ID, "1"),
            (KEY_USERNAME, "someone"),
            (KEY_ROLE, held_role.as_str()),
        ]));
        Self::with_storage(role, transport, storage)
    }

    pub fn with_storage(role: Role, transport: MockTransport, storage: Arc<MemoryStorage>) -> Self {
        let config = PortalConfig::for_role(role).with_persistence(PersistenceScope::SessionScoped);
        let notifier = RecordingNotifier::new();
        let portal = Portal::with_parts(
            config,
            storage.clone() as Arc<dyn SessionStorage>,
            Arc::new(transport.clone()),
            Arc::new(notifier.clone()),
        );

        Self {
            portal,
            transport,
            notifier,
            storage,
        }
    }
}

/// `data` of a successful login response.
pub fn login_data(token: &str, user_id: Value, username: &str, role: &str) -> Value {
    json!({
        "token": token,
        "userId": user_id,
        "username": username,
        "role": role,
    })
}

pub fn not_found() -> Value {
    json!({ "code": 404, "message": "Record not found" })
}
