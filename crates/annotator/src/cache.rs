//! In-memory analysis cache owned by the caller.
//!
//! Entries live as long as the cache object; there is no eviction.

use std::collections::HashMap;

use shakmaty::Chess;
use tracing::debug;

use chess_core::notation;

use crate::engine::{AnalysisLine, Analyzer, SearchLimit};
use crate::error::AnnotatorError;

type CacheKey = (String, u32, SearchLimit);

#[derive(Debug, Default)]
pub struct AnalysisCache {
    entries: HashMap<CacheKey, Vec<AnalysisLine>>,
}

impl AnalysisCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached lines for `pos`, asking `engine` on a miss.
    pub async fn get_or_analyze<A: Analyzer + ?Sized>(
        &mut self,
        engine: &mut A,
        pos: &Chess,
        multipv: u32,
        limit: SearchLimit,
    ) -> Result<Vec<AnalysisLine>, AnnotatorError> {
        let key = (notation::fen(pos), multipv, limit);
        if let Some(lines) = self.entries.get(&key) {
            debug!(fen = %key.0, "Analysis cache hit");
            return Ok(lines.clone());
        }

        let lines = engine.analyze(pos, multipv, limit).await?;
        if lines.is_empty() {
            return Err(AnnotatorError::EmptyAnalysis(key.0));
        }
        self.entries.insert(key, lines.clone());
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::{PositionScore, Score};
    use async_trait::async_trait;

    struct CountingEngine {
        calls: usize,
    }

    #[async_trait]
    impl Analyzer for CountingEngine {
        async fn analyze(
            &mut self,
            _pos: &Chess,
            _multipv: u32,
            _limit: SearchLimit,
        ) -> Result<Vec<AnalysisLine>, AnnotatorError> {
            self.calls += 1;
            Ok(vec![AnalysisLine {
                score: PositionScore::white(Score::Cp(20)),
                pv: vec![],
            }])
        }
    }

    #[tokio::test]
    async fn test_second_lookup_is_cached() {
        let mut cache = AnalysisCache::new();
        let mut engine = CountingEngine { calls: 0 };
        let pos = Chess::default();
        let limit = SearchLimit::Depth(10);

        let first = cache.get_or_analyze(&mut engine, &pos, 2, limit).await.unwrap();
        let second = cache.get_or_analyze(&mut engine, &pos, 2, limit).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(engine.calls, 1);

        // Different breadth is a different entry
        cache.get_or_analyze(&mut engine, &pos, 3, limit).await.unwrap();
        assert_eq!(engine.calls, 2);
        assert_eq!(cache.len(), 2);
    }
}
