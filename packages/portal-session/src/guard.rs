//! Navigation guard, evaluated once per route transition.
//!
//! Pure with respect to the session: it only reads fields that are already
//! resolved and never performs I/O.

use std::sync::Arc;

use crate::config::LOGIN_ROUTE;
use crate::notice::{Notice, Notifier};
use crate::role::Role;
use crate::session::{Session, SessionState, SharedSession};

/// Access requirements attached to a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RouteMeta {
    pub requires_auth: bool,
    /// Role the session must hold. `None` means any authenticated session.
    pub required_role: Option<Role>,
}

impl RouteMeta {
    pub fn public() -> Self {
        Self::default()
    }

    pub fn protected(role: Role) -> Self {
        Self {
            requires_auth: true,
            required_role: Some(role),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Proceed,
    Redirect {
        to: String,
        notice: Option<Notice>,
    },
}

impl GuardDecision {
    fn redirect(to: &str) -> Self {
        GuardDecision::Redirect {
            to: to.to_string(),
            notice: None,
        }
    }
}

#[derive(Clone)]
pub struct NavigationGuard {
    required_role: Role,
    landing_route: String,
    session: SharedSession,
    notifier: Arc<dyn Notifier>,
}

impl NavigationGuard {
    pub fn new(
        required_role: Role,
        landing_route: impl Into<String>,
        session: SharedSession,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            required_role,
            landing_route: landing_route.into(),
            session,
            notifier,
        }
    }

    pub fn required_role(&self) -> Role {
        self.required_role
    }

    /// Decide a transition to `path` with metadata `meta`.
    ///
    /// Rules apply in order: unauthenticated, wrong role, authorized, then the
    /// public-route cases.
    pub fn evaluate(&self, session: &Session, path: &str, meta: &RouteMeta) -> GuardDecision {
        if meta.requires_auth {
            let required = meta.required_role.unwrap_or(self.required_role);
            return match session.state_for(required) {
                SessionState::Unauthenticated => GuardDecision::redirect(LOGIN_ROUTE),
                // Authenticated routes without an explicit role accept any session
                SessionState::WrongRole if meta.required_role.is_none() => GuardDecision::Proceed,
                SessionState::WrongRole => GuardDecision::Redirect {
                    to: LOGIN_ROUTE.to_string(),
                    notice: Some(Notice::access_denied(required)),
                },
                SessionState::Authorized => GuardDecision::Proceed,
            };
        }

        if path == LOGIN_ROUTE
            && session.state_for(self.required_role) == SessionState::Authorized
        {
            return GuardDecision::redirect(&self.landing_route);
        }

        GuardDecision::Proceed
    }

    /// Evaluate against the live session and emit the decision's notice.
    pub fn check(&self, path: &str, meta: &RouteMeta) -> GuardDecision {
        let session = self.session.snapshot();
        let decision = self.evaluate(&session, path, meta);

        match &decision {
            GuardDecision::Proceed => {
                tracing::debug!(path, "Guard: proceed");
            }
            GuardDecision::Redirect { to, notice } => {
                tracing::debug!(path, to = %to, "Guard: redirect");
                if let Some(notice) = notice {
                    self.notifier.notify(notice.clone());
                }
            }
        }

        decision
    }
}
