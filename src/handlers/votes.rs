// src/handlers/votes.rs
use actix_web::{web, HttpRequest, HttpResponse};

use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::ApiError;
use crate::handlers::{check_rate_limit, QueryRateLimiter};
use crate::votes::VoteService;

/// GET /votes/{game} — the current vote tally. Unknown games are a 404; a
/// known game with no vote link or a failing vote service yields a zero
/// tally, same as the broadcast stream.
pub async fn vote_info(
    path: web::Path<String>,
    config: web::Data<Config>,
    votes: web::Data<VoteService>,
    rate_limiter: web::Data<QueryRateLimiter>,
    req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    check_rate_limit(&req, &rate_limiter)?;
    let game = path.into_inner();

    let catalog = Catalog::load_or_empty(&config.catalog_path);
    if !catalog.contains(&game) {
        return Err(ApiError::NotFound);
    }

    let tally = votes.get_votes(&game).await;
    Ok(HttpResponse::Ok().json(tally))
}
