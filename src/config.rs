// src/config.rs
use std::collections::HashMap;
use std::env;
use std::num::NonZeroU32;
use std::time::Duration;

use governor::Quota;

const VOTE_LINK_PREFIX: &str = "VOTE_LINK_";

#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the JSON catalog of monitored games, reloaded on every read.
    pub catalog_path: String,

    /// Postgres URL for the score store.
    pub database_url: String,

    /// Per-game vote endpoint URLs, keyed by lowercased game id.
    pub vote_links: HashMap<String, String>,

    // Prober
    pub probe_timeout_ms: u64,

    // Broadcast loop pacing
    pub warmup_secs: u64,
    pub server_update_delay_ms: u64,
    pub cycle_delay_ms: u64,

    // Rate limiting for the query routes
    pub query_period_secs: u64,
    pub query_burst_limit: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_path: "servers.json".to_string(),
            database_url: "postgres://localhost/sj".to_string(),
            vote_links: HashMap::new(),
            probe_timeout_ms: 2000,
            warmup_secs: 5,
            server_update_delay_ms: 100,
            cycle_delay_ms: 1000,
            query_period_secs: 1,
            query_burst_limit: 30,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            catalog_path: env::var("CATALOG_PATH").unwrap_or_else(|_| "servers.json".to_string()),

            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost/sj".to_string()),

            vote_links: vote_links_from_env(env::vars()),

            probe_timeout_ms: env::var("PROBE_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2000),

            warmup_secs: env::var("WARMUP_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),

            server_update_delay_ms: env::var("SERVER_UPDATE_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(100),

            cycle_delay_ms: env::var("CYCLE_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1000),

            query_period_secs: env::var("QUERY_PERIOD_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1),

            query_burst_limit: env::var("QUERY_BURST_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
        }
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn warmup_delay(&self) -> Duration {
        Duration::from_secs(self.warmup_secs)
    }

    pub fn server_update_delay(&self) -> Duration {
        Duration::from_millis(self.server_update_delay_ms)
    }

    pub fn cycle_delay(&self) -> Duration {
        Duration::from_millis(self.cycle_delay_ms)
    }

    pub fn query_quota(&self) -> Quota {
        Quota::with_period(Duration::from_secs(self.query_period_secs.max(1)))
            .unwrap()
            .allow_burst(NonZeroU32::new(self.query_burst_limit.max(1)).unwrap())
    }

    /// Vote link for a game, if one is configured and non-empty.
    pub fn vote_link(&self, game: &str) -> Option<&str> {
        self.vote_links
            .get(&game.to_lowercase())
            .map(String::as_str)
            .filter(|link| !link.is_empty())
    }
}

fn vote_links_from_env(vars: impl Iterator<Item = (String, String)>) -> HashMap<String, String> {
    vars.filter_map(|(key, value)| {
        key.strip_prefix(VOTE_LINK_PREFIX)
            .map(|game| (game.to_lowercase(), value))
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vote_links_are_collected_by_prefix() {
        let vars = vec![
            ("VOTE_LINK_ARK".to_string(), "https://vote/ark".to_string()),
            ("VOTE_LINK_SE".to_string(), "https://vote/se".to_string()),
            ("DATABASE_URL".to_string(), "postgres://x".to_string()),
        ];
        let links = vote_links_from_env(vars.into_iter());
        assert_eq!(links.len(), 2);
        assert_eq!(links["ark"], "https://vote/ark");
        assert_eq!(links["se"], "https://vote/se");
    }

    #[test]
    fn empty_vote_link_counts_as_unconfigured() {
        let mut config = Config::default();
        config
            .vote_links
            .insert("ark".to_string(), String::new());
        assert_eq!(config.vote_link("ark"), None);
        assert_eq!(config.vote_link("se"), None);

        config
            .vote_links
            .insert("se".to_string(), "https://vote/se".to_string());
        assert_eq!(config.vote_link("SE"), Some("https://vote/se"));
    }
}
