//! Registration, login and password reset

use crate::db::UserStore;
use crate::error::{AppError, Result};
use crate::models::{CredentialsRequest, RequestResetRequest, ResetPasswordRequest, User};
use crate::security::{self, password_version, JwtManager, PasswordError, TokenError};
use std::sync::Arc;

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    jwt: JwtManager,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, jwt: JwtManager) -> Self {
        Self { store, jwt }
    }

    pub async fn register(&self, req: &CredentialsRequest) -> Result<User> {
        let (user_name, password) = req.validate().map_err(AppError::Validation)?;

        let password_hash = hash_blocking(password).await?;
        let user = self
            .store
            .create_if_absent(&user_name, &password_hash)
            .await?
            .ok_or(AppError::UserExists)?;

        tracing::info!(user_id = %user.id, user_name = %user.user_name, "User registered");
        Ok(user)
    }

    /// Returns a signed access token
    pub async fn login(&self, req: &CredentialsRequest) -> Result<String> {
        let (user_name, password) = req.validate().map_err(AppError::Validation)?;

        let user = match self.store.find_by_user_name(&user_name).await? {
            Some(user) => user,
            None => {
                tracing::debug!(user_name = %user_name, "Login for unknown user");
                return Err(AppError::InvalidCredentials);
            }
        };

        if !verify_blocking(password, user.password_hash.clone()).await? {
            tracing::debug!(user_id = %user.id, "Login with wrong password");
            return Err(AppError::InvalidCredentials);
        }

        let token = self.jwt.issue_access(&user).map_err(token_error)?;
        tracing::info!(user_id = %user.id, "User logged in");
        Ok(token)
    }

    /// Returns a reset token bound to the current password version
    pub async fn request_password_reset(&self, req: &RequestResetRequest) -> Result<String> {
        let user_name = req.validate().map_err(AppError::Validation)?;

        let user = self
            .store
            .find_by_user_name(&user_name)
            .await?
            .ok_or_else(AppError::user_not_found)?;

        let token = self.jwt.issue_reset(&user).map_err(token_error)?;
        tracing::info!(user_id = %user.id, "Password reset token issued");
        Ok(token)
    }

    /// Each reset token works once: the update is conditional on the password
    /// version the token was issued for.
    pub async fn reset_password(&self, req: &ResetPasswordRequest) -> Result<()> {
        let (token, new_password) = req.validate().map_err(AppError::Validation)?;

        let claims = self.jwt.verify_reset(&token).map_err(token_error)?;
        let user_id = claims.user_id().map_err(token_error)?;

        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or_else(AppError::user_not_found)?;

        if claims.pcv != Some(password_version(&user)) {
            return Err(AppError::InvalidToken(
                "password changed since the token was issued".into(),
            ));
        }

        let password_hash = hash_blocking(new_password).await?;
        self.store
            .update_password(user.id, &password_hash, user.password_changed_at)
            .await?
            .ok_or_else(|| AppError::InvalidToken("token already used".into()))?;

        tracing::info!(user_id = %user.id, "Password reset");
        Ok(())
    }

    pub async fn ready(&self) -> Result<()> {
        Ok(self.store.ping().await?)
    }
}

fn token_error(err: TokenError) -> AppError {
    match err {
        TokenError::Expired => AppError::TokenExpired,
        TokenError::Invalid(reason) => AppError::InvalidToken(reason),
        TokenError::Signing(reason) => AppError::Internal(reason),
    }
}

fn password_error(err: PasswordError) -> AppError {
    AppError::Internal(err.to_string())
}

async fn hash_blocking(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || security::hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(format!("hashing task failed: {}", e)))?
        .map_err(password_error)
}

async fn verify_blocking(password: String, password_hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || security::verify_password(&password, &password_hash))
        .await
        .map_err(|e| AppError::Internal(format!("verification task failed: {}", e)))?
        .map_err(password_error)
}
