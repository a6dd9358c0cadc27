use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Longest accepted user name (column width)
pub const MAX_USER_NAME_LEN: usize = 255;

/// Stored user. Never serialized: the hash must not leave the service.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub user_name: String,
    pub password_hash: String,
    /// Bumped on every password change; reset tokens are bound to it
    pub password_changed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsRequest {
    pub user_name: Option<String>,
    pub password: Option<String>,
}

impl CredentialsRequest {
    /// Returns `(user_name, password)`. The password is not trimmed.
    pub fn validate(&self) -> Result<(String, String), String> {
        let user_name = non_blank(self.user_name.as_deref());
        let password = self.password.as_deref().filter(|p| !p.trim().is_empty());

        match (user_name, password) {
            (Some(user_name), Some(password)) => {
                validate_user_name(user_name)?;
                Ok((user_name.to_string(), password.to_string()))
            }
            _ => Err("userName and password are required".to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestResetRequest {
    pub user_name: Option<String>,
}

impl RequestResetRequest {
    pub fn validate(&self) -> Result<String, String> {
        non_blank(self.user_name.as_deref())
            .map(str::to_string)
            .ok_or_else(|| "userName is required".to_string())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub reset_token: Option<String>,
    pub new_password: Option<String>,
}

impl ResetPasswordRequest {
    /// Returns `(reset_token, new_password)`
    pub fn validate(&self) -> Result<(String, String), String> {
        let token = non_blank(self.reset_token.as_deref());
        let password = self.new_password.as_deref().filter(|p| !p.trim().is_empty());

        match (token, password) {
            (Some(token), Some(password)) => Ok((token.to_string(), password.to_string())),
            _ => Err("resetToken and newPassword are required".to_string()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetTokenResponse {
    pub message: String,
    pub reset_token: String,
}

fn validate_user_name(user_name: &str) -> Result<(), String> {
    if user_name.len() > MAX_USER_NAME_LEN {
        return Err(format!(
            "userName must be at most {} characters",
            MAX_USER_NAME_LEN
        ));
    }
    Ok(())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}
