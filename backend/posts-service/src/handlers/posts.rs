/// Post handlers - CRUD endpoints
use super::parse_post_id;
use crate::error::Result;
use crate::models::{CreatePostRequest, UpdatePostRequest};
use crate::services::PostService;
use actix_web::{web, HttpResponse};

pub async fn create_post(
    service: web::Data<PostService>,
    req: web::Json<CreatePostRequest>,
) -> Result<HttpResponse> {
    let post = service.create(&req).await?;
    Ok(HttpResponse::Created().json(post))
}

pub async fn list_posts(service: web::Data<PostService>) -> Result<HttpResponse> {
    let posts = service.list().await?;
    Ok(HttpResponse::Ok().json(posts))
}

pub async fn get_post(
    service: web::Data<PostService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let id = parse_post_id(&path)?;
    let post = service.get(id).await?;
    Ok(HttpResponse::Ok().json(post))
}

pub async fn update_post(
    service: web::Data<PostService>,
    path: web::Path<String>,
    req: web::Json<UpdatePostRequest>,
) -> Result<HttpResponse> {
    let id = parse_post_id(&path)?;
    let post = service.update(id, &req).await?;
    Ok(HttpResponse::Ok().json(post))
}

pub async fn delete_post(
    service: web::Data<PostService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let id = parse_post_id(&path)?;
    service.delete(id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Post deleted" })))
}
