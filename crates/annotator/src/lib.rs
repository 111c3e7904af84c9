//! Move-quality annotation for chess games.
//!
//! `score` turns engine evaluations into win expectations, `phase` decides
//! when moves are classified and `classify` labels moves and picks the
//! alternatives shown next to them. The remaining modules feed those with
//! engine analyses and write the results.

pub mod annotate;
pub mod cache;
pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod output;
pub mod phase;
pub mod pool;
pub mod score;
pub mod stockfish;

pub use cache::AnalysisCache;
pub use classify::{CandidateMove, MoveType};
pub use config::AnnotatorConfig;
pub use engine::{AnalysisLine, Analyzer, SearchLimit};
pub use error::AnnotatorError;
pub use output::{AnalyzedGame, EvaluatedMove, PositionEvaluation};
pub use phase::GamePhase;
pub use score::{win_expectation, PositionScore, Score};
pub use stockfish::StockfishEngine;
