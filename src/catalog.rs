// src/catalog.rs
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use log::warn;
use serde::Deserialize;

use crate::models::server::ServerEndpoint;

#[derive(Debug)]
pub enum CatalogError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read catalog: {}", e),
            Self::Parse(e) => write!(f, "malformed catalog: {}", e),
        }
    }
}

/// The static catalog of monitored games. Keyed by game id; iteration order
/// is the sorted key order and is the catalog order the broadcast contract
/// refers to. Loaded fresh on every call so edits take effect without a
/// restart.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Catalog(BTreeMap<String, Vec<ServerEndpoint>>);

impl Catalog {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path).map_err(CatalogError::Io)?;
        serde_json::from_str(&raw).map_err(CatalogError::Parse)
    }

    /// Load for a broadcast cycle: a transient read failure degrades to an
    /// empty catalog rather than failing the cycle.
    pub fn load_or_empty(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!("catalog unavailable, treating as empty this cycle: {}", e);
                Self::default()
            }
        }
    }

    pub fn games(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn endpoints(&self, game: &str) -> Option<&[ServerEndpoint]> {
        self.0.get(game).map(Vec::as_slice)
    }

    pub fn contains(&self, game: &str) -> bool {
        self.0.contains_key(game)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CATALOG_JSON: &str = r#"{
        "se": [
            {"name": "Sigma", "ip": "10.0.0.1", "port": 27016},
            {"name": "Tau", "ip": "10.0.0.2", "port": 27016}
        ],
        "ark": [
            {"name": "Island", "ip": "10.0.0.3", "port": 27015}
        ]
    }"#;

    fn write_catalog(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_games_in_sorted_order_with_endpoint_order_preserved() {
        let file = write_catalog(CATALOG_JSON);
        let catalog = Catalog::load(file.path()).unwrap();

        let games: Vec<&str> = catalog.games().collect();
        assert_eq!(games, vec!["ark", "se"]);

        let se = catalog.endpoints("se").unwrap();
        assert_eq!(se.len(), 2);
        assert_eq!(se[0].name, "Sigma");
        assert_eq!(se[1].name, "Tau");

        assert!(catalog.contains("ark"));
        assert!(!catalog.contains("rust"));
    }

    #[test]
    fn malformed_catalog_is_an_error() {
        let file = write_catalog("{not json");
        assert!(matches!(
            Catalog::load(file.path()),
            Err(CatalogError::Parse(_))
        ));
    }

    #[test]
    fn missing_catalog_degrades_to_empty_for_cycles() {
        assert!(matches!(
            Catalog::load("/nonexistent/servers.json"),
            Err(CatalogError::Io(_))
        ));
        let catalog = Catalog::load_or_empty("/nonexistent/servers.json");
        assert!(catalog.is_empty());
    }
}
