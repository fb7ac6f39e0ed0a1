//! Driver configuration from environment variables

use planet_config::{ConfigError, SculptParams};
use sculpting::NeighborSearch;
use std::path::PathBuf;
use tracing::warn;

/// JSON file with initial sculpt parameters
pub const PARAMS_ENV: &str = "PLANET_PARAMS";
/// Directory the asset paths are resolved against
pub const ASSETS_ENV: &str = "PLANET_ASSETS";
/// Number of frames to run before exiting
pub const FRAMES_ENV: &str = "PLANET_FRAMES";
/// Neighbor search strategy: `brute` or `octree`
pub const SEARCH_ENV: &str = "PLANET_SEARCH";

const DEFAULT_ASSET_ROOT: &str = "assets";
const DEFAULT_FRAMES: u64 = 600;

/// Application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub params_path: Option<PathBuf>,
    pub asset_root: PathBuf,
    pub frames: u64,
    pub neighbor_search: NeighborSearch,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            params_path: None,
            asset_root: PathBuf::from(DEFAULT_ASSET_ROOT),
            frames: DEFAULT_FRAMES,
            neighbor_search: NeighborSearch::default(),
        }
    }
}

impl AppConfig {
    /// Parse from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Parse from an arbitrary key lookup. Unparseable values fall back to
    /// their defaults with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = lookup(PARAMS_ENV).filter(|p| !p.is_empty()) {
            config.params_path = Some(PathBuf::from(path));
        }
        if let Some(root) = lookup(ASSETS_ENV).filter(|p| !p.is_empty()) {
            config.asset_root = PathBuf::from(root);
        }
        if let Some(frames) = lookup(FRAMES_ENV) {
            match frames.parse() {
                Ok(frames) => config.frames = frames,
                Err(_) => warn!("Ignoring {FRAMES_ENV}={frames:?}, not a frame count"),
            }
        }
        if let Some(search) = lookup(SEARCH_ENV) {
            match search.to_ascii_lowercase().as_str() {
                "brute" | "bruteforce" => config.neighbor_search = NeighborSearch::BruteForce,
                "octree" => config.neighbor_search = NeighborSearch::Octree,
                _ => warn!("Ignoring {SEARCH_ENV}={search:?}, expected brute or octree"),
            }
        }
        config
    }

    /// Initial sculpt parameters: the JSON file if configured, else defaults
    pub fn load_params(&self) -> Result<SculptParams, ConfigError> {
        match &self.params_path {
            Some(path) => SculptParams::load(path),
            None => Ok(SculptParams::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = AppConfig::from_lookup(lookup(&[]));
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.load_params().unwrap(), SculptParams::default());
    }

    #[test]
    fn test_reads_all_keys() {
        let config = AppConfig::from_lookup(lookup(&[
            (PARAMS_ENV, "params.json"),
            (ASSETS_ENV, "/srv/assets"),
            (FRAMES_ENV, "42"),
            (SEARCH_ENV, "Octree"),
        ]));
        assert_eq!(config.params_path, Some(PathBuf::from("params.json")));
        assert_eq!(config.asset_root, PathBuf::from("/srv/assets"));
        assert_eq!(config.frames, 42);
        assert_eq!(config.neighbor_search, NeighborSearch::Octree);
    }

    #[test]
    fn test_bad_values_fall_back() {
        let config = AppConfig::from_lookup(lookup(&[(FRAMES_ENV, "lots"), (SEARCH_ENV, "grid")]));
        assert_eq!(config.frames, DEFAULT_FRAMES);
        assert_eq!(config.neighbor_search, NeighborSearch::BruteForce);
    }

    #[test]
    fn test_missing_params_file_is_error() {
        let config = AppConfig {
            params_path: Some(PathBuf::from("/nonexistent/planet-params.json")),
            ..Default::default()
        };
        assert!(matches!(config.load_params(), Err(ConfigError::Io(_))));
    }
}
