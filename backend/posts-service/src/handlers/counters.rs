/// Like-count adjustment endpoints, called by likes-service
use super::parse_post_id;
use crate::error::{AppError, Result};
use crate::models::Adjustment;
use crate::services::LikeCounterService;
use actix_web::{web, HttpRequest, HttpResponse};
use idempotency_ledger::IdempotencyLedger;

pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";
pub const IDEMPOTENCY_STATUS_HEADER: &str = "Idempotency-Status";

pub async fn increment_like(
    service: web::Data<LikeCounterService>,
    path: web::Path<String>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    adjust(service, &path, &req, Adjustment::Increment).await
}

pub async fn decrement_like(
    service: web::Data<LikeCounterService>,
    path: web::Path<String>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    adjust(service, &path, &req, Adjustment::Decrement).await
}

pub async fn revert_adjustment(
    service: web::Data<LikeCounterService>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let (raw_id, key) = path.into_inner();
    IdempotencyLedger::validate_key(&key)?;
    let post_id = parse_post_id(&raw_id)?;

    let post = service.revert(post_id, &key).await?;
    Ok(HttpResponse::Ok().json(post))
}

async fn adjust(
    service: web::Data<LikeCounterService>,
    raw_id: &str,
    req: &HttpRequest,
    adjustment: Adjustment,
) -> Result<HttpResponse> {
    // Key is checked before the id so a malformed call never touches storage
    let key = idempotency_key(req)?;
    let post_id = parse_post_id(raw_id)?;

    let (post, status) = service.adjust(post_id, &key, adjustment).await?;
    Ok(HttpResponse::Ok()
        .insert_header((IDEMPOTENCY_STATUS_HEADER, status.as_str()))
        .json(post))
}

fn idempotency_key(req: &HttpRequest) -> Result<String> {
    let key = req
        .headers()
        .get(IDEMPOTENCY_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .unwrap_or_default();

    if key.is_empty() {
        return Err(AppError::Validation(format!(
            "{} header is required",
            IDEMPOTENCY_KEY_HEADER
        )));
    }
    IdempotencyLedger::validate_key(key)?;
    Ok(key.to_string())
}
