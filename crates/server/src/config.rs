use std::env;

use annotator::SearchLimit;

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub stockfish_path: String,
    pub engine_threads: u32,
    pub engine_hash_mb: u32,
    pub analysis_depth: u32,
    pub multipv: u32,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5000),
            stockfish_path: env::var("STOCKFISH_PATH")
                .unwrap_or_else(|_| "/usr/games/stockfish".to_string()),
            engine_threads: env::var("ENGINE_THREADS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(4),
            engine_hash_mb: env::var("ENGINE_HASH_MB")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2048),
            analysis_depth: env::var("ANALYSIS_DEPTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(18),
            multipv: env::var("API_MULTIPV")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2),
        }
    }

    pub fn search_limit(&self) -> SearchLimit {
        SearchLimit::Depth(self.analysis_depth)
    }
}
