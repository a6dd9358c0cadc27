//! Account flows against an in-memory store

mod common;

use common::{jwt, service};
use users_service::error::AppError;
use users_service::models::{CredentialsRequest, RequestResetRequest, ResetPasswordRequest};
use users_service::security::jwt::PURPOSE_ACCESS;

fn credentials(user_name: &str, password: &str) -> CredentialsRequest {
    CredentialsRequest {
        user_name: Some(user_name.to_string()),
        password: Some(password.to_string()),
    }
}

fn reset(token: &str, new_password: &str) -> ResetPasswordRequest {
    ResetPasswordRequest {
        reset_token: Some(token.to_string()),
        new_password: Some(new_password.to_string()),
    }
}

fn reset_request(user_name: &str) -> RequestResetRequest {
    RequestResetRequest {
        user_name: Some(user_name.to_string()),
    }
}

#[tokio::test]
async fn test_register_stores_hash_not_password() {
    let (store, service) = service();

    service
        .register(&credentials("alice", "monPass123"))
        .await
        .unwrap();

    let stored = store.get("alice").unwrap();
    assert_ne!(stored.password_hash, "monPass123");
    assert!(stored.password_hash.starts_with("$argon2id$"));
}

#[tokio::test]
async fn test_register_duplicate_name() {
    let (store, service) = service();

    service
        .register(&credentials("alice", "one"))
        .await
        .unwrap();
    let second = service.register(&credentials("alice", "two")).await;

    assert!(matches!(second, Err(AppError::UserExists)));
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_concurrent_registrations_create_one_user() {
    let (store, service) = service();
    let req = credentials("alice", "pw");

    let results = futures::future::join_all((0..5).map(|_| service.register(&req))).await;

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_login_issues_access_token() {
    let (store, service) = service();
    service
        .register(&credentials("alice", "monPass123"))
        .await
        .unwrap();

    let token = service
        .login(&credentials("alice", "monPass123"))
        .await
        .unwrap();

    let claims = jwt().verify(&token, PURPOSE_ACCESS).unwrap();
    assert_eq!(claims.user_id().unwrap(), store.get("alice").unwrap().id);
    assert_eq!(claims.user_name, "alice");
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let (_, service) = service();
    service
        .register(&credentials("alice", "monPass123"))
        .await
        .unwrap();

    let wrong_password = service.login(&credentials("alice", "nope")).await;
    let unknown_user = service.login(&credentials("bob", "monPass123")).await;

    assert!(matches!(wrong_password, Err(AppError::InvalidCredentials)));
    assert!(matches!(unknown_user, Err(AppError::InvalidCredentials)));
}

#[tokio::test]
async fn test_login_requires_fields() {
    let (_, service) = service();
    let result = service
        .login(&CredentialsRequest {
            user_name: Some("alice".into()),
            password: None,
        })
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_password_reset_flow() {
    let (_, service) = service();
    service
        .register(&credentials("alice", "old-password"))
        .await
        .unwrap();

    let token = service
        .request_password_reset(&reset_request("alice"))
        .await
        .unwrap();
    service
        .reset_password(&reset(&token, "new-password"))
        .await
        .unwrap();

    assert!(matches!(
        service.login(&credentials("alice", "old-password")).await,
        Err(AppError::InvalidCredentials)
    ));
    assert!(service
        .login(&credentials("alice", "new-password"))
        .await
        .is_ok());
}

#[tokio::test]
async fn test_reset_token_is_single_use() {
    let (_, service) = service();
    service
        .register(&credentials("alice", "old-password"))
        .await
        .unwrap();
    let token = service
        .request_password_reset(&reset_request("alice"))
        .await
        .unwrap();

    service
        .reset_password(&reset(&token, "second"))
        .await
        .unwrap();
    let replay = service.reset_password(&reset(&token, "third")).await;

    assert!(matches!(replay, Err(AppError::InvalidToken(_))));
    assert!(service.login(&credentials("alice", "second")).await.is_ok());
}

#[tokio::test]
async fn test_concurrent_resets_with_one_token() {
    let (_, service) = service();
    service
        .register(&credentials("alice", "old-password"))
        .await
        .unwrap();
    let token = service
        .request_password_reset(&reset_request("alice"))
        .await
        .unwrap();

    let first = reset(&token, "first");
    let second = reset(&token, "second");
    let (a, b) = futures::future::join(
        service.reset_password(&first),
        service.reset_password(&second),
    )
    .await;

    assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
}

#[tokio::test]
async fn test_older_reset_tokens_die_with_a_password_change() {
    let (_, service) = service();
    service
        .register(&credentials("alice", "old-password"))
        .await
        .unwrap();

    let stale = service
        .request_password_reset(&reset_request("alice"))
        .await
        .unwrap();
    let fresh = service
        .request_password_reset(&reset_request("alice"))
        .await
        .unwrap();
    service
        .reset_password(&reset(&fresh, "new-password"))
        .await
        .unwrap();

    assert!(matches!(
        service.reset_password(&reset(&stale, "hijack")).await,
        Err(AppError::InvalidToken(_))
    ));
}

#[tokio::test]
async fn test_access_token_cannot_reset_password() {
    let (_, service) = service();
    service
        .register(&credentials("alice", "pw"))
        .await
        .unwrap();
    let access = service.login(&credentials("alice", "pw")).await.unwrap();

    let result = service.reset_password(&reset(&access, "new")).await;
    assert!(matches!(result, Err(AppError::InvalidToken(_))));
}

#[tokio::test]
async fn test_reset_for_unknown_user() {
    let (store, service) = service();

    assert!(matches!(
        service.request_password_reset(&reset_request("ghost")).await,
        Err(AppError::NotFound(_))
    ));

    // Token issued, then the account disappears
    service
        .register(&credentials("alice", "pw"))
        .await
        .unwrap();
    let token = service
        .request_password_reset(&reset_request("alice"))
        .await
        .unwrap();
    store.remove("alice");

    assert!(matches!(
        service.reset_password(&reset(&token, "new")).await,
        Err(AppError::NotFound(_))
    ));
}
