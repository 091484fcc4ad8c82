use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::resolver::ResolverKind;
use crate::role::Role;
use crate::storage::PersistenceScope;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const LOGIN_ROUTE: &str = "/login";

/// Everything that differs between the three portal builds.
#[derive(Debug, Clone, PartialEq)]
pub struct PortalConfig {
    pub required_role: Role,
    pub persistence: PersistenceScope,
    pub resolver: ResolverKind,
    pub api_base_url: String,
    pub request_timeout: Duration,
    /// Where an already-authorized visitor of `/login` is sent.
    pub landing_route: String,
    /// Backing file for [`PersistenceScope::Persistent`] storage.
    pub storage_path: PathBuf,
}

impl PortalConfig {
    /// Administrator portal.
    ///
    /// The admin store has been seen backed by both persistent and session-scoped
    /// storage. Persistent is used here; set `PORTAL_PERSISTENCE=session` to
    /// override.
    pub fn admin() -> Self {
        Self::base(Role::Admin, PersistenceScope::Persistent, ResolverKind::None)
    }

    pub fn teacher() -> Self {
        Self::base(Role::Teacher, PersistenceScope::Persistent, ResolverKind::Teacher)
    }

    pub fn student() -> Self {
        Self::base(
            Role::Student,
            PersistenceScope::SessionScoped,
            ResolverKind::Student,
        )
    }

    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Admin => Self::admin(),
            Role::Teacher => Self::teacher(),
            Role::Student => Self::student(),
        }
    }

    fn base(required_role: Role, persistence: PersistenceScope, resolver: ResolverKind) -> Self {
        Self {
            required_role,
            persistence,
            resolver,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            landing_route: "/".to_string(),
            storage_path: default_storage_path(required_role),
        }
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_persistence(mut self, persistence: PersistenceScope) -> Self {
        self.persistence = persistence;
        self
    }

    pub fn with_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = path.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// `PORTAL_ROLE` selects the preset; the remaining variables override it.
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let role: Role = env::var("PORTAL_ROLE")
            .context("PORTAL_ROLE must be set")?
            .parse()
            .context("PORTAL_ROLE must be one of ADMIN, TEACHER, STUDENT")?;

        Self::for_role(role).apply_env()
    }

    /// Apply `PORTAL_*` overrides on top of an existing preset.
    pub fn apply_env(mut self) -> Result<Self> {
        if let Ok(url) = env::var("PORTAL_API_BASE_URL") {
            self.api_base_url = url;
        }
        if let Ok(scope) = env::var("PORTAL_PERSISTENCE") {
            self.persistence = scope
                .parse()
                .context("PORTAL_PERSISTENCE must be `persistent` or `session`")?;
        }
        if let Ok(path) = env::var("PORTAL_STORAGE_PATH") {
            self.storage_path = PathBuf::from(path);
        }
        if let Ok(secs) = env::var("PORTAL_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .context("PORTAL_REQUEST_TIMEOUT_SECS must be a valid number")?;
            self.request_timeout = Duration::from_secs(secs);
        }
        Ok(self)
    }
}

fn default_storage_path(role: Role) -> PathBuf {
    PathBuf::from(".portal").join(format!("{}.json", role.path_segment()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_keep_divergences_explicit() {
        let admin = PortalConfig::admin();
        assert_eq!(admin.required_role, Role::Admin);
        assert_eq!(admin.resolver, ResolverKind::None);
        assert_eq!(admin.persistence, PersistenceScope::Persistent);

        let teacher = PortalConfig::teacher();
        assert_eq!(teacher.resolver, ResolverKind::Teacher);
        assert_eq!(teacher.persistence, PersistenceScope::Persistent);

        let student = PortalConfig::student();
        assert_eq!(student.resolver, ResolverKind::Student);
        assert_eq!(student.persistence, PersistenceScope::SessionScoped);
        assert_eq!(student.request_timeout, Duration::from_secs(10));
        assert_eq!(student.storage_path, PathBuf::from(".portal/student.json"));
    }

    #[test]
    fn test_for_role_matches_presets() {
        for role in Role::variants() {
            assert_eq!(PortalConfig::for_role(*role).required_role, *role);
        }
    }
}
