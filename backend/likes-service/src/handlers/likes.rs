/// Like handlers
use crate::error::{AppError, Result};
use crate::models::{CountsQuery, CreateLikeRequest, ListLikesQuery};
use crate::services::LikeService;
use actix_web::{web, HttpResponse};
use uuid::Uuid;

pub async fn create_like(
    service: web::Data<LikeService>,
    req: web::Json<CreateLikeRequest>,
) -> Result<HttpResponse> {
    let like = service.create_like(&req).await?;
    Ok(HttpResponse::Created().json(like))
}

pub async fn delete_like(
    service: web::Data<LikeService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    // An id that is not a UUID cannot name a like
    let like_id = Uuid::parse_str(&path).map_err(|_| AppError::like_not_found())?;

    service.delete_like(like_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Like deleted" })))
}

pub async fn list_likes(
    service: web::Data<LikeService>,
    query: web::Query<ListLikesQuery>,
) -> Result<HttpResponse> {
    let filter = query.into_inner().into_filter().map_err(AppError::Validation)?;
    let likes = service.list_likes(&filter).await?;
    Ok(HttpResponse::Ok().json(likes))
}

pub async fn like_counts(
    service: web::Data<LikeService>,
    query: web::Query<CountsQuery>,
) -> Result<HttpResponse> {
    let post_ids = query.parse_ids().map_err(AppError::Validation)?;
    let counts = service.counts(&post_ids).await?;
    Ok(HttpResponse::Ok().json(counts))
}
