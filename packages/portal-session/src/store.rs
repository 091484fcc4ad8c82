//! Session store: login, logout and secondary identity loading.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::{PortalConfig, LOGIN_ROUTE};
use crate::error::{GatewayError, Result};
use crate::gateway::GatewayClient;
use crate::resolver::{self, ResolverKind};
use crate::role::Role;
use crate::routes::Navigator;
use crate::session::{Session, SharedSession, UserInfo};

pub const LOGIN_PATH: &str = "/auth/login";

/// Credentials typed into the login form.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    #[serde(flatten)]
    credentials: &'a Credentials,
    #[serde(rename = "type")]
    role: Role,
}

pub struct SessionStore {
    config: PortalConfig,
    session: SharedSession,
    gateway: GatewayClient,
    navigator: Arc<dyn Navigator>,
    /// One login or logout at a time.
    in_flight: Mutex<()>,
}

impl SessionStore {
    pub fn new(
        config: PortalConfig,
        session: SharedSession,
        gateway: GatewayClient,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            config,
            session,
            gateway,
            navigator,
            in_flight: Mutex::new(()),
        }
    }

    pub fn session(&self) -> Session {
        self.session.snapshot()
    }

    pub fn shared(&self) -> &SharedSession {
        &self.session
    }

    /// Authenticate against the backend and install the session.
    ///
    /// Returns `Ok(false)` when the server rejects the credentials. For teacher
    /// and student portals the domain record lookup has been attempted by the
    /// time this returns.
    pub async fn login(&self, credentials: &Credentials) -> Result<bool> {
        let _guard = self.in_flight.lock().await;
        let role = self.config.required_role;

        tracing::info!(username = %credentials.username, %role, "Logging in");

        let request = LoginRequest { credentials, role };
        let response = match self.gateway.post(LOGIN_PATH, &request).await {
            Ok(response) => response,
            Err(e) if is_rejection(&e) => {
                tracing::info!(username = %credentials.username, error = %e, "Login rejected");
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        };

        let envelope = response.envelope::<UserInfo>()?;
        let info = match envelope.data {
            Some(info) if envelope.code == 200 => info,
            _ => {
                tracing::info!(
                    username = %credentials.username,
                    code = envelope.code,
                    "Login rejected"
                );
                return Ok(false);
            }
        };

        self.set_user(&info)?;

        if self.config.resolver != ResolverKind::None {
            self.refresh_identity().await;
        }

        tracing::info!(user_id = %info.user_id, role = %info.role, "Logged in");
        Ok(true)
    }

    /// Overwrite every session field from a trusted payload.
    pub fn set_user(&self, info: &UserInfo) -> Result<()> {
        self.session.install(info)?;
        Ok(())
    }

    /// Reset the session. Safe to call any number of times.
    pub fn clear_user(&self) {
        self.session.clear();
    }

    /// Clear the session and return to the login page.
    pub async fn logout(&self) {
        let _guard = self.in_flight.lock().await;
        tracing::info!(user_id = %self.session.snapshot().user_id, "Logging out");
        self.clear_user();
        self.navigator.redirect(LOGIN_ROUTE);
    }

    /// Student portal: resolve the enrollment number (and avatar).
    pub async fn load_secondary_identity(&self) -> bool {
        self.load(ResolverKind::Student).await
    }

    /// Teacher portal: resolve the profile avatar.
    pub async fn load_profile(&self) -> bool {
        self.load(ResolverKind::Teacher).await
    }

    /// Run whichever resolver this portal is configured with.
    pub async fn refresh_identity(&self) -> bool {
        self.load(self.config.resolver).await
    }

    async fn load(&self, kind: ResolverKind) -> bool {
        let Some(role) = kind.role() else {
            return false;
        };
        let session = self.session.snapshot();
        if session.role != Some(role) {
            return false;
        }
        let Some(user_id) = self.session.user_id() else {
            return false;
        };

        let identity = match resolver::resolve(&self.gateway, kind, &user_id).await {
            Ok(Some(identity)) => identity,
            Ok(None) => return false,
            Err(e) => {
                tracing::error!(user_id = %user_id, %role, error = %e, "Failed to load domain record");
                return false;
            }
        };

        match self.session.apply_secondary(&user_id, &identity) {
            Ok(applied) => {
                if applied {
                    tracing::info!(
                        user_id = %user_id,
                        secondary_id = ?identity.secondary_id,
                        "Domain record loaded"
                    );
                }
                applied
            }
            Err(e) => {
                tracing::error!(user_id = %user_id, error = %e, "Failed to persist domain record");
                false
            }
        }
    }
}

/// Server answers that mean "these credentials are not accepted".
fn is_rejection(error: &GatewayError) -> bool {
    match error {
        GatewayError::SessionExpired => true,
        GatewayError::RequestFailed { status, .. } => (400..500).contains(status),
        _ => false,
    }
}

