// src/error.rs
use std::fmt;

use actix_web::{HttpResponse, ResponseError};
use serde_json::json;

use crate::scores::ScoreError;

#[derive(Debug)]
pub enum ApiError {
    NotFound,
    BadRequest(String),
    StoreUnavailable(String),
    MissingPeerIP,
    RateLimitExceeded,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "Not found"),
            Self::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            Self::StoreUnavailable(msg) => write!(f, "Score store unavailable: {}", msg),
            Self::MissingPeerIP => write!(f, "Failed to extract client IP"),
            Self::RateLimitExceeded => write!(f, "Rate limit exceeded"),
        }
    }
}

impl ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        let body = json!({ "error": self.to_string() });
        match self {
            Self::NotFound => HttpResponse::NotFound().json(body),
            Self::BadRequest(_) => HttpResponse::BadRequest().json(body),
            Self::StoreUnavailable(_) => HttpResponse::ServiceUnavailable().json(body),
            Self::MissingPeerIP => HttpResponse::BadRequest().json(body),
            Self::RateLimitExceeded => HttpResponse::TooManyRequests().json(body),
        }
    }
}

impl From<ScoreError> for ApiError {
    fn from(err: ScoreError) -> Self {
        match err {
            ScoreError::NotFound => ApiError::NotFound,
            ScoreError::Unavailable(msg) => ApiError::StoreUnavailable(msg),
        }
    }
}
