//! Client-side session, identity and access control for the course-enrollment portals.
//!
//! The administrator, teacher and student portals share one implementation,
//! parameterized by [`PortalConfig`]: the role the portal requires, whether the
//! session survives a restart, and which domain record (if any) is resolved
//! after login.
//!
//! # Example
//!
//! ```rust,ignore
//! use portal_session::{Credentials, Portal, PortalConfig, TracingNotifier};
//! use std::sync::Arc;
//!
//! let portal = Portal::from_config(PortalConfig::student(), Arc::new(TracingNotifier))?;
//!
//! if portal.login(&Credentials::new("alice", "secret")).await? {
//!     let nav = portal.navigate("/grade-query")?;
//!     println!("at {} as {:?}", nav.location, portal.session().secondary_id);
//! }
//! ```
//!
//! Every backend call goes through the [`GatewayClient`]; a 401 from any
//! endpoint clears the session and sends the router back to `/login`.

pub mod account;
pub mod config;
pub mod error;
pub mod gateway;
pub mod guard;
pub mod notice;
pub mod portal;
pub mod resolver;
pub mod role;
pub mod routes;
pub mod session;
pub mod storage;
pub mod store;
pub mod testing;

pub use account::{AccountApi, ChangePasswordForm};
pub use config::{PortalConfig, LOGIN_ROUTE};
pub use error::{FailureKind, GatewayError, Result, SessionError};
pub use gateway::{
    ApiRequest, ApiResponse, Envelope, GatewayClient, HttpTransport, RawRequest, RawResponse,
    Transport, TransportError,
};
pub use guard::{GuardDecision, NavigationGuard, RouteMeta};
pub use notice::{Notice, NoticeLevel, Notifier, TracingNotifier};
pub use portal::Portal;
pub use resolver::{ResolverKind, SecondaryIdentity};
pub use role::Role;
pub use routes::{Navigation, Navigator, Route, RouteError, RouteTable, Router};
pub use session::{Session, SessionState, SharedSession, UserInfo};
pub use storage::{FileStorage, MemoryStorage, PersistenceScope, SessionStorage, StorageError};
pub use store::{Credentials, SessionStore};
