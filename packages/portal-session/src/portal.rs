//! One portal instance, wired from its configuration.

use std::sync::Arc;

use crate::account::AccountApi;
use crate::config::PortalConfig;
use crate::error::Result;
use crate::gateway::{GatewayClient, HttpTransport, Transport};
use crate::guard::NavigationGuard;
use crate::notice::Notifier;
use crate::routes::{Navigation, Navigator, RouteError, RouteTable, Router};
use crate::session::{Session, SharedSession};
use crate::storage::{storage_for, SessionStorage};
use crate::store::{Credentials, SessionStore};

pub struct Portal {
    config: PortalConfig,
    session: SharedSession,
    router: Arc<Router>,
    gateway: GatewayClient,
    store: SessionStore,
    account: AccountApi,
}

impl Portal {
    /// Production wiring: configured storage and HTTP transport, notices
    /// rendered by `notifier` ([`TracingNotifier`] when there is no UI).
    ///
    /// [`TracingNotifier`]: crate::notice::TracingNotifier
    pub fn from_config(config: PortalConfig, notifier: Arc<dyn Notifier>) -> Result<Self> {
        let storage = storage_for(&config)?;
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::from_config(&config));
        Ok(Self::with_parts(config, storage, transport, notifier))
    }

    /// Wire a portal around injected collaborators.
    pub fn with_parts(
        config: PortalConfig,
        storage: Arc<dyn SessionStorage>,
        transport: Arc<dyn Transport>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        if storage.scope() != config.persistence {
            tracing::warn!(
                configured = ?config.persistence,
                actual = ?storage.scope(),
                "Storage medium does not match configured persistence scope"
            );
        }

        let session = SharedSession::rehydrate(storage);
        let guard = NavigationGuard::new(
            config.required_role,
            config.landing_route.clone(),
            session.clone(),
            notifier.clone(),
        );
        let router = Arc::new(Router::new(RouteTable::for_role(config.required_role), guard));
        let navigator: Arc<dyn Navigator> = router.clone();

        let gateway = GatewayClient::new(transport, session.clone(), notifier, navigator.clone())
            .with_timeout(config.request_timeout);
        let store = SessionStore::new(config.clone(), session.clone(), gateway.clone(), navigator);
        let account = AccountApi::new(gateway.clone());

        tracing::debug!(
            role = %config.required_role,
            persistence = ?config.persistence,
            resolver = ?config.resolver,
            "Portal ready"
        );

        Self {
            config,
            session,
            router,
            gateway,
            store,
            account,
        }
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    pub fn session(&self) -> Session {
        self.session.snapshot()
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn gateway(&self) -> &GatewayClient {
        &self.gateway
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn account(&self) -> &AccountApi {
        &self.account
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<bool> {
        self.store.login(credentials).await
    }

    pub async fn logout(&self) {
        self.store.logout().await
    }

    pub fn navigate(&self, path: &str) -> std::result::Result<Navigation, RouteError> {
        self.router.navigate(path)
    }
}
