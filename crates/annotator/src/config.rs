//! Annotator configuration from environment variables

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::engine::SearchLimit;

#[derive(Clone, Debug)]
pub struct AnnotatorConfig {
    /// Path to Stockfish binary
    pub stockfish_path: String,

    /// UCI `Threads` per engine process; the batch pool runs one process per job
    pub engine_threads: u32,

    /// UCI `Hash` in MB per engine process
    pub engine_hash_mb: u32,

    /// Search depth per analysed position
    pub analysis_depth: u32,

    /// Lines requested per analysed position
    pub analysis_multipv: u32,

    /// Directory holding the ECO `*.tsv` tables
    pub eco_dir: PathBuf,

    /// Root of the JSON output tree
    pub output_dir: PathBuf,

    /// Scan further legal moves when no alternative is bad
    pub always_find_bad_alternative: bool,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            stockfish_path: "/usr/games/stockfish".to_string(),
            engine_threads: 1,
            engine_hash_mb: 256,
            analysis_depth: 18,
            analysis_multipv: 3,
            eco_dir: PathBuf::from("data/eco"),
            output_dir: PathBuf::from("output"),
            always_find_bad_alternative: true,
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl AnnotatorConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            stockfish_path: env::var("STOCKFISH_PATH").unwrap_or(defaults.stockfish_path),
            engine_threads: env_or("ENGINE_THREADS", defaults.engine_threads),
            engine_hash_mb: env_or("ENGINE_HASH_MB", defaults.engine_hash_mb),
            analysis_depth: env_or("ANALYSIS_DEPTH", defaults.analysis_depth),
            analysis_multipv: env_or("ANALYSIS_MULTIPV", defaults.analysis_multipv),
            eco_dir: env::var("ECO_DIR").map(PathBuf::from).unwrap_or(defaults.eco_dir),
            output_dir: env::var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            always_find_bad_alternative: env_or(
                "ALWAYS_FIND_BAD_ALTERNATIVE",
                defaults.always_find_bad_alternative,
            ),
        }
    }

    pub fn search_limit(&self) -> SearchLimit {
        SearchLimit::Depth(self.analysis_depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnnotatorConfig::default();
        assert_eq!(config.analysis_multipv, 3);
        // One search thread per pooled engine
        assert_eq!(config.engine_threads, 1);
        assert_eq!(config.engine_hash_mb, 256);
        assert_eq!(config.search_limit(), SearchLimit::Depth(18));
        assert!(config.always_find_bad_alternative);
    }

    #[test]
    fn test_unparsable_value_falls_back() {
        assert_eq!(env_or("ANNOTATOR_TEST_UNSET_VARIABLE", 7u32), 7);
    }
}
