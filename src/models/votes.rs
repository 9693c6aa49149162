// src/models/votes.rs
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Summed vote count plus the raw voter records for one game. Voter records
/// are passed through untouched; only their "votes" field is interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteTally {
    pub votes: i64,
    pub voters: Vec<Value>,
}

impl VoteTally {
    pub fn zero() -> Self {
        Self {
            votes: 0,
            voters: Vec::new(),
        }
    }
}
