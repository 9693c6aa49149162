// src/models/events.rs
use serde::Serialize;

use crate::models::scores::ScoreRecord;
use crate::models::server::ServerStatus;

/// One broadcast event. Serializes with an `event` tag so subscribers can
/// dispatch on the name, e.g. {"event":"online_update","id_key":"ark_count",...}.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum UpdateEvent {
    VotesUpdate { server: String, votes: i64 },
    OnlineUpdate { id_key: String, count: i64 },
    ServerUpdate { server: ServerStatus },
    ScoresUpdate { scores: Vec<ScoreRecord> },
}

impl UpdateEvent {
    pub fn name(&self) -> &'static str {
        match self {
            UpdateEvent::VotesUpdate { .. } => "votes_update",
            UpdateEvent::OnlineUpdate { .. } => "online_update",
            UpdateEvent::ServerUpdate { .. } => "server_update",
            UpdateEvent::ScoresUpdate { .. } => "scores_update",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::server::ServerEndpoint;

    #[test]
    fn events_tag_with_their_name() {
        let endpoint = ServerEndpoint {
            name: "EU #1".to_string(),
            ip: "10.0.0.1".to_string(),
            port: 27015,
        };
        let event = UpdateEvent::ServerUpdate {
            server: ServerStatus::down(&endpoint),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "server_update");
        assert_eq!(json["server"]["status"], "Down");
        assert_eq!(json["server"]["ip"], "10.0.0.1:27015");
        assert_eq!(event.name(), "server_update");
    }

    #[test]
    fn online_update_carries_id_key_and_count() {
        let event = UpdateEvent::OnlineUpdate {
            id_key: "ark_count".to_string(),
            count: 8,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "online_update");
        assert_eq!(json["id_key"], "ark_count");
        assert_eq!(json["count"], 8);
    }
}
