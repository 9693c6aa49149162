// src/models/server.rs
use serde::{Deserialize, Serialize};

/// One catalog entry for a queryable game server. Identity is (ip, port).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerEndpoint {
    pub name: String,
    pub ip: String,
    pub port: u16,
}

impl ServerEndpoint {
    pub fn address(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerState {
    // Wire values kept as the frontend expects them.
    #[serde(rename = "ok")]
    Ok,
    Down,
}

/// Live status for one endpoint, rebuilt every cycle. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerStatus {
    pub name: String,
    pub status: ServerState,
    pub ping: f64,
    pub ip: String,
    pub players: i64,
    pub max_players: i64,
    pub version: String,
}

impl ServerStatus {
    /// Degraded status for an endpoint that could not be queried.
    pub fn down(endpoint: &ServerEndpoint) -> Self {
        Self {
            name: endpoint.name.clone(),
            status: ServerState::Down,
            ping: 0.0,
            ip: endpoint.address(),
            players: 0,
            max_players: 0,
            version: "0".to_string(),
        }
    }
}
