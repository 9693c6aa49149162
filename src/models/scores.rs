// src/models/scores.rs
use serde::{Deserialize, Serialize};

/// One row from the kothscores table. `server` and `planet_id` arrive raw and
/// are rewritten by normalization before leaving this process; the remaining
/// fields pass through as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScoreRecord {
    pub server: String,
    pub planet_id: String,
    pub player: String,
    pub score: i64,
}
