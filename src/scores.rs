// src/scores.rs
use std::collections::HashMap;
use std::fmt;

use deadpool_postgres::{Pool, Runtime};
use lazy_static::lazy_static;
use tokio_postgres::NoTls;

use crate::models::scores::ScoreRecord;

lazy_static! {
    /// Fixed server-code to display-name table. Codes not listed here pass
    /// through unchanged.
    static ref SERVER_NAMES: HashMap<&'static str, &'static str> = HashMap::from([
        ("SEDS1", "Sigma"),
        ("SEDS2", "Tau"),
        ("SEDS3", "Omicron"),
        ("SEDS4", "Gamma"),
        ("SEDS5", "Delta"),
        ("SEDS6", "Epsilon"),
    ]);
}

#[derive(Debug)]
pub enum ScoreError {
    /// The score store is each request's sole source of truth; unreachable is
    /// a hard error, not a degraded result.
    Unavailable(String),
    /// A server/planet filter matched nothing. Distinct from an empty table.
    NotFound,
}

impl fmt::Display for ScoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable(msg) => write!(f, "score store unavailable: {}", msg),
            Self::NotFound => write!(f, "no matching scores"),
        }
    }
}

/// Build a lazy connection pool from a database URL. Adapted so startup does
/// not require the database to be up; the first query does.
pub fn create_pool(database_url: &str) -> Result<Pool, String> {
    let pg_config: tokio_postgres::Config = database_url
        .parse()
        .map_err(|e: tokio_postgres::Error| format!("invalid database URL: {}", e))?;

    let mut cfg = deadpool_postgres::Config::new();
    if let Some(host) = pg_config.get_hosts().first() {
        match host {
            tokio_postgres::config::Host::Tcp(h) => cfg.host = Some(h.clone()),
            #[cfg(unix)]
            tokio_postgres::config::Host::Unix(p) => {
                cfg.host = Some(p.to_string_lossy().to_string())
            }
        }
    }
    if let Some(port) = pg_config.get_ports().first() {
        cfg.port = Some(*port);
    }
    if let Some(user) = pg_config.get_user() {
        cfg.user = Some(user.to_string());
    }
    if let Some(password) = pg_config.get_password() {
        cfg.password = Some(String::from_utf8_lossy(password).to_string());
    }
    if let Some(dbname) = pg_config.get_dbname() {
        cfg.dbname = Some(dbname.to_string());
    }

    cfg.create_pool(Some(Runtime::Tokio1), NoTls)
        .map_err(|e| format!("failed to create pool: {}", e))
}

/// Read-only view over the kothscores table. Rows are mutated by the game
/// process, never here.
#[derive(Clone)]
pub struct ScoreReader {
    pool: Pool,
}

impl ScoreReader {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// All rows, normalized, optionally filtered. Filter matching is
    /// case-insensitive against the normalized fields; a filter that matches
    /// nothing is NotFound.
    pub async fn list_scores(
        &self,
        server: Option<&str>,
        planet: Option<&str>,
    ) -> Result<Vec<ScoreRecord>, ScoreError> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| ScoreError::Unavailable(e.to_string()))?;

        let rows = client
            .query(
                "SELECT server, planet_id, player, score FROM kothscores ORDER BY id",
                &[],
            )
            .await
            .map_err(|e| ScoreError::Unavailable(e.to_string()))?;

        let records = rows
            .iter()
            .map(|row| {
                normalize(ScoreRecord {
                    server: row.get("server"),
                    planet_id: row.get("planet_id"),
                    player: row.get("player"),
                    score: row.get("score"),
                })
            })
            .collect();

        filter_scores(records, server, planet)
    }
}

/// Required post-read transform: map the raw server code to its display name
/// and truncate the planet id before its first "-". Idempotent.
pub fn normalize(mut record: ScoreRecord) -> ScoreRecord {
    if let Some(name) = SERVER_NAMES.get(record.server.as_str()) {
        record.server = (*name).to_string();
    }
    if let Some(prefix) = record.planet_id.split('-').next() {
        record.planet_id = prefix.to_string();
    }
    record
}

/// Apply the optional server and planet filters to normalized records. The
/// planet filter only narrows an already-server-filtered set, matching the
/// route shape (/scores/{server}/{planet}).
pub fn filter_scores(
    records: Vec<ScoreRecord>,
    server: Option<&str>,
    planet: Option<&str>,
) -> Result<Vec<ScoreRecord>, ScoreError> {
    let server = match server {
        Some(server) => server,
        None => return Ok(records),
    };

    let matched: Vec<ScoreRecord> = records
        .into_iter()
        .filter(|r| r.server.eq_ignore_ascii_case(server))
        .collect();
    if matched.is_empty() {
        return Err(ScoreError::NotFound);
    }

    let planet = match planet {
        Some(planet) => planet,
        None => return Ok(matched),
    };

    let matched: Vec<ScoreRecord> = matched
        .into_iter()
        .filter(|r| r.planet_id.eq_ignore_ascii_case(planet))
        .collect();
    if matched.is_empty() {
        return Err(ScoreError::NotFound);
    }
    Ok(matched)
}
