// src/main.rs
mod broadcast;
mod catalog;
mod config;
mod error;
mod handlers;
mod models;
mod probe;
mod scores;
mod snapshot;
mod votes;

use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use env_logger::Env;
use governor::RateLimiter;
use log::info;

use crate::broadcast::{Broadcaster, Hub};
use crate::catalog::Catalog;
use crate::config::Config;
use crate::scores::ScoreReader;
use crate::snapshot::SnapshotBuilder;
use crate::votes::VoteService;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    dotenv::dotenv().ok();
    let config = Config::from_env();

    // A bad catalog is fatal here; transient read failures during a cycle
    // degrade to an empty catalog instead.
    if let Err(e) = Catalog::load(&config.catalog_path) {
        log::error!("cannot start with catalog {}: {}", config.catalog_path, e);
        return Err(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("invalid catalog: {}", e),
        ));
    }

    // Pool construction is lazy; the score store only needs to be up when
    // the first query runs.
    let pool = scores::create_pool(&config.database_url)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    let bind_address = std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "8000".to_string());
    let bind = format!("{}:{}", bind_address, port);

    let vote_service = VoteService::new(config.clone());
    let score_reader = ScoreReader::new(pool);
    let hub = Arc::new(Hub::new());
    let builder = SnapshotBuilder::new(config.clone(), vote_service.clone(), score_reader.clone());
    let broadcaster = Broadcaster::new(Arc::clone(&hub), builder, config.clone());

    let query_rate_limiter: web::Data<handlers::QueryRateLimiter> =
        web::Data::new(RateLimiter::keyed(config.query_quota()));
    let config_data = web::Data::new(config);
    let hub_data = web::Data::from(Arc::clone(&hub));
    let broadcaster_data = web::Data::from(Arc::clone(&broadcaster));
    let votes_data = web::Data::new(vote_service);
    let scores_data = web::Data::new(score_reader);

    info!("Starting server on {}", bind);
    let result = HttpServer::new(move || {
        App::new()
            .app_data(config_data.clone())
            .app_data(hub_data.clone())
            .app_data(broadcaster_data.clone())
            .app_data(votes_data.clone())
            .app_data(scores_data.clone())
            .app_data(query_rate_limiter.clone())
            .route("/servers/{game}", web::get().to(handlers::servers::server_info))
            .route("/online/{game}", web::get().to(handlers::servers::online_info))
            .route("/players/{addr}", web::get().to(handlers::servers::player_info))
            .route("/votes/{game}", web::get().to(handlers::votes::vote_info))
            .route("/scores", web::get().to(handlers::scores::all_scores))
            .route("/scores/{server}", web::get().to(handlers::scores::server_scores))
            .route(
                "/scores/{server}/{planet}",
                web::get().to(handlers::scores::server_planet_scores),
            )
            .route("/events", web::get().to(handlers::stream::stream_events))
    })
    .bind(&bind)?
    .run()
    .await;

    broadcaster.stop();
    result
}
