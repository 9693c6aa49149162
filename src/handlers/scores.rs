// src/handlers/scores.rs
use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;

use crate::error::ApiError;
use crate::handlers::{check_rate_limit, QueryRateLimiter};
use crate::scores::ScoreReader;

/// GET /scores — the full normalized score list.
pub async fn all_scores(
    reader: web::Data<ScoreReader>,
    rate_limiter: web::Data<QueryRateLimiter>,
    req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    check_rate_limit(&req, &rate_limiter)?;
    let scores = reader.list_scores(None, None).await?;
    Ok(HttpResponse::Ok().json(json!({ "scores": scores })))
}

/// GET /scores/{server} — scores for one server by display name. An
/// unmatched filter is a 404, not an empty list.
pub async fn server_scores(
    path: web::Path<String>,
    reader: web::Data<ScoreReader>,
    rate_limiter: web::Data<QueryRateLimiter>,
    req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    check_rate_limit(&req, &rate_limiter)?;
    let server = path.into_inner();
    let scores = reader.list_scores(Some(&server), None).await?;
    Ok(HttpResponse::Ok().json(json!({ "scores": scores })))
}

/// GET /scores/{server}/{planet} — further narrowed by truncated planet id.
pub async fn server_planet_scores(
    path: web::Path<(String, String)>,
    reader: web::Data<ScoreReader>,
    rate_limiter: web::Data<QueryRateLimiter>,
    req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    check_rate_limit(&req, &rate_limiter)?;
    let (server, planet) = path.into_inner();
    let scores = reader.list_scores(Some(&server), Some(&planet)).await?;
    Ok(HttpResponse::Ok().json(json!({ "scores": scores })))
}
