//! Secondary identity resolution.
//!
//! Students and teachers have a domain record separate from their account.
//! After login it is fetched by account id; a missing record is a normal
//! state for newly registered users, not a failure.

use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::gateway::{ApiRequest, GatewayClient};
use crate::role::Role;
use crate::session::optional_string_or_number;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolverKind {
    None,
    Student,
    Teacher,
}

impl ResolverKind {
    /// Role whose domain record this resolver fetches.
    pub fn role(&self) -> Option<Role> {
        match self {
            ResolverKind::None => None,
            ResolverKind::Student => Some(Role::Student),
            ResolverKind::Teacher => Some(Role::Teacher),
        }
    }
}

/// Fields of the domain record the session cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecondaryIdentity {
    #[serde(
        rename = "studentId",
        default,
        deserialize_with = "optional_string_or_number"
    )]
    pub secondary_id: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Fetch the domain record for `user_id`.
///
/// `Ok(None)` means the record does not exist yet.
pub async fn resolve(
    gateway: &GatewayClient,
    kind: ResolverKind,
    user_id: &str,
) -> Result<Option<SecondaryIdentity>, GatewayError> {
    let Some(role) = kind.role() else {
        return Ok(None);
    };

    let path = format!("/{}/user/{}", role.path_segment(), user_id);
    let response = match gateway
        .send(ApiRequest::get(path.as_str()).tolerate_not_found())
        .await
    {
        Ok(response) => response,
        Err(GatewayError::NotFound { .. }) => {
            tracing::info!(user_id, %role, "No domain record yet, profile not completed");
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    let envelope = response.envelope::<SecondaryIdentity>()?;
    if !envelope.is_success() {
        tracing::debug!(user_id, code = envelope.code, "Domain record lookup not successful");
        return Ok(None);
    }

    Ok(envelope.data)
}
