// src/handlers/servers.rs
use std::net::SocketAddr;

use actix_web::{web, HttpRequest, HttpResponse};
use log::debug;
use serde_json::json;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::ApiError;
use crate::handlers::{check_rate_limit, QueryRateLimiter};
use crate::probe;

/// GET /servers/{game} — live status for every configured endpoint of a game.
/// Reuses the same prober the broadcast loop does, so on-demand snapshots and
/// broadcast output always agree.
pub async fn server_info(
    path: web::Path<String>,
    config: web::Data<Config>,
    rate_limiter: web::Data<QueryRateLimiter>,
    req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    check_rate_limit(&req, &rate_limiter)?;
    let game = path.into_inner();

    let catalog = Catalog::load_or_empty(&config.catalog_path);
    let endpoints = catalog.endpoints(&game).ok_or(ApiError::NotFound)?;

    let statuses = probe::probe_all(endpoints, config.probe_timeout()).await;
    debug!("probed {} endpoints for {}", statuses.len(), game);
    Ok(HttpResponse::Ok().json(json!({ "servers": statuses })))
}

/// GET /online/{game} — total players across the game's servers.
pub async fn online_info(
    path: web::Path<String>,
    config: web::Data<Config>,
    rate_limiter: web::Data<QueryRateLimiter>,
    req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    check_rate_limit(&req, &rate_limiter)?;
    let game = path.into_inner();

    let catalog = Catalog::load_or_empty(&config.catalog_path);
    let endpoints = catalog.endpoints(&game).ok_or(ApiError::NotFound)?;

    let statuses = probe::probe_all(endpoints, config.probe_timeout()).await;
    let total: i64 = statuses.iter().map(|s| s.players).sum();
    Ok(HttpResponse::Ok().json(json!({ "players": total })))
}

/// GET /players/{addr} — player listing for one endpoint via A2S_PLAYER.
/// A failed query is a 404, matching the snapshot routes' treatment of an
/// unknown target.
pub async fn player_info(
    path: web::Path<String>,
    config: web::Data<Config>,
    rate_limiter: web::Data<QueryRateLimiter>,
    req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    check_rate_limit(&req, &rate_limiter)?;
    let addr = path.into_inner();

    if addr.parse::<SocketAddr>().is_err() {
        return Err(ApiError::BadRequest(format!(
            "expected ip:port, got {}",
            addr
        )));
    }

    match probe::query_players(&addr, config.probe_timeout()).await {
        Ok(players) => Ok(HttpResponse::Ok().json(json!({ "players": players }))),
        Err(e) => {
            debug!("player query for {} failed: {}", addr, e);
            Err(ApiError::NotFound)
        }
    }
}
