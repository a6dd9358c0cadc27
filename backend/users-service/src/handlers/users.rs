/// Account handlers
use crate::error::Result;
use crate::models::{
    CredentialsRequest, LoginResponse, MessageResponse, RequestResetRequest,
    ResetPasswordRequest, ResetTokenResponse,
};
use crate::services::UserService;
use actix_web::{web, HttpResponse};

pub async fn register(
    service: web::Data<UserService>,
    req: web::Json<CredentialsRequest>,
) -> Result<HttpResponse> {
    service.register(&req).await?;
    Ok(HttpResponse::Created().json(MessageResponse {
        message: "User created".to_string(),
    }))
}

pub async fn login(
    service: web::Data<UserService>,
    req: web::Json<CredentialsRequest>,
) -> Result<HttpResponse> {
    let token = service.login(&req).await?;
    Ok(HttpResponse::Ok().json(LoginResponse {
        token,
        message: "Login successful".to_string(),
    }))
}

/// The token is returned directly; there is no mail delivery
pub async fn request_reset_password(
    service: web::Data<UserService>,
    req: web::Json<RequestResetRequest>,
) -> Result<HttpResponse> {
    let reset_token = service.request_password_reset(&req).await?;
    Ok(HttpResponse::Ok().json(ResetTokenResponse {
        message: "Reset token generated".to_string(),
        reset_token,
    }))
}

pub async fn reset_password(
    service: web::Data<UserService>,
    req: web::Json<ResetPasswordRequest>,
) -> Result<HttpResponse> {
    service.reset_password(&req).await?;
    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Password reset".to_string(),
    }))
}
