// src/handlers/mod.rs
pub mod scores;
pub mod servers;
pub mod stream;
pub mod votes;

use std::net::IpAddr;

use actix_web::HttpRequest;
use governor::clock::DefaultClock;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::RateLimiter;
use log::error;

use crate::error::ApiError;

pub type QueryRateLimiter = RateLimiter<IpAddr, DefaultKeyedStateStore<IpAddr>, DefaultClock>;

pub fn check_rate_limit(req: &HttpRequest, limiter: &QueryRateLimiter) -> Result<(), ApiError> {
    let peer_ip = req
        .peer_addr()
        .map(|addr| addr.ip())
        .ok_or(ApiError::MissingPeerIP)?;
    if limiter.check_key(&peer_ip).is_err() {
        error!("rate limit exceeded for {}", peer_ip);
        return Err(ApiError::RateLimitExceeded);
    }
    Ok(())
}
