//! Engine collaborator contract.
//!
//! The classifier never talks to a search engine directly; it receives
//! analysis lines produced through [`Analyzer`], which the UCI adapter in
//! `stockfish` implements and tests replace with scripted answers.

use async_trait::async_trait;
use shakmaty::{Chess, Move};

use crate::error::AnnotatorError;
use crate::score::PositionScore;

/// How long the engine searches a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchLimit {
    Depth(u32),
}

impl SearchLimit {
    /// Argument list for the UCI `go` command.
    pub fn go_command(&self) -> String {
        match self {
            SearchLimit::Depth(depth) => format!("go depth {depth}"),
        }
    }
}

/// One ranked line of a multi-PV analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisLine {
    /// Evaluation from White's point of view
    pub score: PositionScore,
    /// Principal variation; empty when the position is already over
    pub pv: Vec<Move>,
}

impl AnalysisLine {
    pub fn best_move(&self) -> Option<&Move> {
        self.pv.first()
    }
}

#[async_trait]
pub trait Analyzer: Send {
    /// Analyse `pos` and return up to `multipv` lines, best first.
    ///
    /// Implementations return at least one line for every legal position;
    /// terminal positions yield a single line with an empty pv.
    async fn analyze(
        &mut self,
        pos: &Chess,
        multipv: u32,
        limit: SearchLimit,
    ) -> Result<Vec<AnalysisLine>, AnnotatorError>;
}
