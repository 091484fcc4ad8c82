//! Actor roles.
//!
//! Each portal build is fixed to exactly one role; the same tag is sent to the
//! login endpoint, echoed back in the `X-Role` header and checked by the guard.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Teacher,
    Student,
}

impl Role {
    /// Wire form used in payloads, headers and storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Teacher => "TEACHER",
            Role::Student => "STUDENT",
        }
    }

    /// Lower-case segment used by role-scoped backend routes (`/student/user/{id}`).
    pub fn path_segment(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Teacher => "teacher",
            Role::Student => "student",
        }
    }

    /// Human-readable portal name, used in notices.
    pub fn portal_name(&self) -> &'static str {
        match self {
            Role::Admin => "administrator portal",
            Role::Teacher => "teacher portal",
            Role::Student => "student portal",
        }
    }

    pub fn variants() -> &'static [Role] {
        &[Role::Admin, Role::Teacher, Role::Student]
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "TEACHER" => Ok(Role::Teacher),
            "STUDENT" => Ok(Role::Student),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}
