//! Shared analysis state of the API.

use std::collections::HashMap;

use tokio::sync::Mutex;

use annotator::{AnalysisCache, Analyzer, PositionEvaluation, SearchLimit};

/// Engine and its analysis cache, used by one request at a time
pub struct Analysis {
    pub engine: Box<dyn Analyzer>,
    pub cache: AnalysisCache,
}

pub struct AnalysisState {
    pub analysis: Mutex<Analysis>,
    /// Responses keyed by (FEN before, FEN after) as sent by the client
    pub results: Mutex<HashMap<(String, String), PositionEvaluation>>,
    pub multipv: u32,
    pub limit: SearchLimit,
}

impl AnalysisState {
    pub fn new(engine: Box<dyn Analyzer>, multipv: u32, limit: SearchLimit) -> Self {
        Self {
            analysis: Mutex::new(Analysis {
                engine,
                cache: AnalysisCache::new(),
            }),
            results: Mutex::new(HashMap::new()),
            multipv,
            limit,
        }
    }
}
