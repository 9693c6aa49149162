// src/votes.rs
use std::fmt;

use log::debug;
use serde::Deserialize;
use serde_json::Value;

use crate::config::Config;
use crate::models::votes::VoteTally;

#[derive(Debug)]
enum VoteError {
    Http(reqwest::Error),
    BadStatus(reqwest::StatusCode),
}

impl fmt::Display for VoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "vote service request failed: {}", e),
            Self::BadStatus(code) => write!(f, "vote service returned {}", code),
        }
    }
}

#[derive(Debug, Deserialize)]
struct VoteResponse {
    voters: Vec<Value>,
}

/// Fetches and sums per-game vote counts. Vote-service downtime must never
/// stop status broadcasting, so the public entry point always yields a tally:
/// unconfigured games short-circuit to zero without touching the network and
/// any fetch failure degrades to zero.
#[derive(Clone)]
pub struct VoteService {
    client: reqwest::Client,
    config: Config,
}

impl VoteService {
    pub fn new(config: Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub async fn get_votes(&self, game: &str) -> VoteTally {
        let link = match self.config.vote_link(game) {
            Some(link) => link.to_string(),
            None => return VoteTally::zero(),
        };

        match self.fetch(&link).await {
            Ok(tally) => tally,
            Err(e) => {
                debug!("vote lookup for {} degraded to zero: {}", game, e);
                VoteTally::zero()
            }
        }
    }

    async fn fetch(&self, link: &str) -> Result<VoteTally, VoteError> {
        let response = self.client.get(link).send().await.map_err(VoteError::Http)?;
        if !response.status().is_success() {
            return Err(VoteError::BadStatus(response.status()));
        }
        let body: VoteResponse = response.json().await.map_err(VoteError::Http)?;
        Ok(tally_from_voters(body.voters))
    }
}

/// Sum the "votes" field over the raw voter records. The upstream service is
/// loose about types and sends both numbers and numeric strings.
fn tally_from_voters(voters: Vec<Value>) -> VoteTally {
    let votes = voters.iter().map(vote_count).sum();
    VoteTally { votes, voters }
}

fn vote_count(voter: &Value) -> i64 {
    match voter.get("votes") {
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0),
        Some(Value::String(s)) => s.parse().unwrap_or(0),
        _ => 0,
    }
}
