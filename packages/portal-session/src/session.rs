//! The session record and the shared handle through which it is read and mutated.

use serde::{Deserialize, Deserializer, Serialize};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::resolver::SecondaryIdentity;
use crate::role::Role;
use crate::storage::{
    PersistenceScope, SessionStorage, StorageError, KEY_AVATAR, KEY_ROLE, KEY_STUDENT_ID,
    KEY_TOKEN, KEY_USERNAME, KEY_USER_ID, SESSION_KEYS,
};

/// Identity of the current browser context.
///
/// An empty `credential` means unauthenticated; no other field is meaningful then.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub credential: String,
    pub user_id: String,
    pub username: String,
    pub role: Option<Role>,
    pub avatar_url: Option<String>,
    /// Student enrollment number, resolved after login.
    pub secondary_id: Option<String>,
}

/// Guard-relevant classification of a session against a portal's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    WrongRole,
    Authorized,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        !self.credential.is_empty()
    }

    pub fn state_for(&self, required_role: Role) -> SessionState {
        if !self.is_authenticated() {
            SessionState::Unauthenticated
        } else if self.role == Some(required_role) {
            SessionState::Authorized
        } else {
            SessionState::WrongRole
        }
    }

    /// Read the record back from storage. Nothing is trusted without a token.
    fn load(storage: &dyn SessionStorage) -> Self {
        let credential = storage.get(KEY_TOKEN).unwrap_or_default();
        if credential.is_empty() {
            return Self::default();
        }

        let role = storage.get(KEY_ROLE).and_then(|r| match r.parse::<Role>() {
            Ok(role) => Some(role),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable stored role");
                None
            }
        });

        let secondary_id = if role == Some(Role::Student) {
            non_empty(storage.get(KEY_STUDENT_ID))
        } else {
            None
        };

        Self {
            credential,
            user_id: storage.get(KEY_USER_ID).unwrap_or_default(),
            username: storage.get(KEY_USERNAME).unwrap_or_default(),
            role,
            avatar_url: non_empty(storage.get(KEY_AVATAR)),
            secondary_id,
        }
    }
}

/// Login payload returned by `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub token: String,
    #[serde(deserialize_with = "string_or_number")]
    pub user_id: String,
    pub username: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Handle to the in-memory session and its storage mirror.
///
/// Cloned into the gateway and the guard instead of reaching for global state.
/// Every mutation rewrites memory and storage under one write lock, so
/// concurrent mutations never interleave their storage writes.
#[derive(Clone)]
pub struct SharedSession {
    inner: Arc<RwLock<Session>>,
    storage: Arc<dyn SessionStorage>,
}

impl SharedSession {
    /// Empty session over `storage`, ignoring anything already stored.
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Session::default())),
            storage,
        }
    }

    /// Rebuild the session from storage. Done once at start-up.
    pub fn rehydrate(storage: Arc<dyn SessionStorage>) -> Self {
        let session = Session::load(storage.as_ref());
        if session.is_authenticated() {
            tracing::info!(
                user_id = %session.user_id,
                role = ?session.role,
                scope = ?storage.scope(),
                "Rehydrated session from storage"
            );
        }
        Self {
            inner: Arc::new(RwLock::new(session)),
            storage,
        }
    }

    pub fn snapshot(&self) -> Session {
        self.read().clone()
    }

    pub fn credential(&self) -> String {
        self.read().credential.clone()
    }

    pub fn role(&self) -> Option<Role> {
        self.read().role
    }

    pub fn user_id(&self) -> Option<String> {
        let session = self.read();
        if session.is_authenticated() && !session.user_id.is_empty() {
            Some(session.user_id.clone())
        } else {
            None
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_authenticated()
    }

    pub fn state_for(&self, required_role: Role) -> SessionState {
        self.read().state_for(required_role)
    }

    pub fn storage_scope(&self) -> PersistenceScope {
        self.storage.scope()
    }

    /// Overwrite every field from a trusted login payload.
    ///
    /// Storage is written key by key; a failure part-way leaves earlier keys written.
    pub fn install(&self, info: &UserInfo) -> Result<(), StorageError> {
        let mut session = self.write();
        *session = Session {
            credential: info.token.clone(),
            user_id: info.user_id.clone(),
            username: info.username.clone(),
            role: Some(info.role),
            avatar_url: non_empty(info.avatar.clone()),
            secondary_id: None,
        };

        self.storage.set(KEY_TOKEN, &session.credential)?;
        self.storage.set(KEY_USER_ID, &session.user_id)?;
        self.storage.set(KEY_USERNAME, &session.username)?;
        self.storage.set(KEY_ROLE, info.role.as_str())?;
        match &session.avatar_url {
            Some(avatar) => self.storage.set(KEY_AVATAR, avatar)?,
            None => self.storage.remove(KEY_AVATAR)?,
        }
        self.storage.remove(KEY_STUDENT_ID)?;
        Ok(())
    }

    /// Merge the secondary identity resolved for `user_id`. Only `secondary_id`
    /// and `avatar_url` change.
    ///
    /// Returns false if the session was cleared, or now belongs to another
    /// user, while the lookup was in flight.
    pub fn apply_secondary(
        &self,
        user_id: &str,
        identity: &SecondaryIdentity,
    ) -> Result<bool, StorageError> {
        let mut session = self.write();
        if !session.is_authenticated() || session.user_id != user_id {
            tracing::debug!(
                resolved_for = user_id,
                current = %session.user_id,
                "Discarding domain record for a session that is no longer current"
            );
            return Ok(false);
        }

        if session.role == Some(Role::Student) {
            if let Some(secondary_id) = non_empty(identity.secondary_id.clone()) {
                self.storage.set(KEY_STUDENT_ID, &secondary_id)?;
                session.secondary_id = Some(secondary_id);
            }
        }
        if let Some(avatar) = non_empty(identity.avatar_url.clone()) {
            self.storage.set(KEY_AVATAR, &avatar)?;
            session.avatar_url = Some(avatar);
        }
        Ok(true)
    }

    /// Reset every field and drop every storage key. Idempotent, never fails.
    pub fn clear(&self) {
        let mut session = self.write();
        *session = Session::default();

        for key in SESSION_KEYS {
            if let Err(e) = self.storage.remove(key) {
                tracing::warn!(key, error = %e, "Failed to remove session key from storage");
            }
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Session> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Session> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    Text(String),
    Integer(i64),
}

impl From<StringOrNumber> for String {
    fn from(value: StringOrNumber) -> Self {
        match value {
            StringOrNumber::Text(s) => s,
            StringOrNumber::Integer(n) => n.to_string(),
        }
    }
}

/// Backend ids are 64-bit numbers on the wire but opaque strings here.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    StringOrNumber::deserialize(deserializer).map(String::from)
}

pub(crate) fn optional_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<StringOrNumber>::deserialize(deserializer).map(|v| v.map(String::from))
}
