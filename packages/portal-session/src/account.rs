//! Account operations available to any signed-in user.

use serde::Serialize;
use serde_json::Value;

use crate::error::{Result, SessionError};
use crate::gateway::GatewayClient;

pub const CHANGE_PASSWORD_PATH: &str = "/auth/change-password";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordForm {
    pub old_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl ChangePasswordForm {
    fn validate(&self) -> Result<()> {
        if self.new_password.is_empty() {
            return Err(SessionError::InvalidInput("new password must not be empty".into()));
        }
        if self.new_password != self.confirm_password {
            return Err(SessionError::InvalidInput(
                "new password and confirmation do not match".into(),
            ));
        }
        Ok(())
    }
}

pub struct AccountApi {
    gateway: GatewayClient,
}

impl AccountApi {
    pub fn new(gateway: GatewayClient) -> Self {
        Self { gateway }
    }

    /// Change the signed-in user's password. `Ok(false)` if the server refused.
    pub async fn change_password(&self, form: &ChangePasswordForm) -> Result<bool> {
        form.validate()?;
        if !self.gateway.session().is_authenticated() {
            return Err(SessionError::AuthenticationRequired);
        }

        let response = self.gateway.put(CHANGE_PASSWORD_PATH, form).await?;
        let envelope = response.envelope::<Value>()?;

        if envelope.is_success() {
            tracing::info!("Password changed");
        } else {
            tracing::info!(code = envelope.code, message = ?envelope.message, "Password change refused");
        }
        Ok(envelope.is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(new: &str, confirm: &str) -> ChangePasswordForm {
        ChangePasswordForm {
            old_password: "old".to_string(),
            new_password: new.to_string(),
            confirm_password: confirm.to_string(),
        }
    }

    #[test]
    fn test_validate() {
        assert!(form("secret", "secret").validate().is_ok());
        assert!(matches!(
            form("secret", "secrte").validate(),
            Err(SessionError::InvalidInput(_))
        ));
        assert!(matches!(
            form("", "").validate(),
            Err(SessionError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_wire_shape() {
        let json = serde_json::to_value(form("a", "a")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "oldPassword": "old", "newPassword": "a", "confirmPassword": "a" })
        );
    }
}
