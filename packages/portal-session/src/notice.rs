//! User-facing notices.
//!
//! Interceptors and the guard report outcomes the user must see (expired
//! session, access denied, network down) through a [`Notifier`]. Callers
//! should not repeat a notice for a failure the gateway already reported.

use std::fmt;

use crate::role::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn access_denied(role: Role) -> Self {
        Self::error(format!("Access denied: this account cannot use the {}", role.portal_name()))
    }

    pub fn session_expired() -> Self {
        Self::error("Session expired, please log in again")
    }

    pub fn network_unavailable() -> Self {
        Self::error("Network error, please try again later")
    }

    /// Server-provided message if there is one, otherwise a generic failure.
    pub fn request_failed(message: Option<&str>) -> Self {
        match message.map(str::trim).filter(|m| !m.is_empty()) {
            Some(message) => Self::error(message),
            None => Self::error("Request failed"),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Renders notices as log events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => tracing::info!(notice = %notice.message, "Notice"),
            NoticeLevel::Warning => tracing::warn!(notice = %notice.message, "Notice"),
            NoticeLevel::Error => tracing::error!(notice = %notice.message, "Notice"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_failed_prefers_server_message() {
        assert_eq!(
            Notice::request_failed(Some("Course is full")).message,
            "Course is full"
        );
        assert_eq!(Notice::request_failed(Some("  ")).message, "Request failed");
        assert_eq!(Notice::request_failed(None).message, "Request failed");
    }

    #[test]
    fn test_access_denied_names_portal() {
        let notice = Notice::access_denied(Role::Teacher);
        assert_eq!(notice.level, NoticeLevel::Error);
        assert!(notice.message.contains("teacher portal"));
    }
}
