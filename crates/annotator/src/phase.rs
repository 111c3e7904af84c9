//! Game phase gate: opening → midgame → endgame.
//!
//! The start of the endgame is not well defined. A game counts as an endgame
//! once both sides are down to at most a queen and a rook worth of material,
//! or once the evaluation is decided (forced mate or certain result).

use serde::{Deserialize, Serialize};
use shakmaty::{Chess, Color, Position, Role};
use tracing::info;

use crate::score::PositionScore;

const PAWN_VALUE: u32 = 1;
const KNIGHT_VALUE: u32 = 3;
const BISHOP_VALUE: u32 = 3;
const ROOK_VALUE: u32 = 5;
const QUEEN_VALUE: u32 = 9;

/// Both sides at or below this much material means endgame
const ENDGAME_MATERIAL_LIMIT: u32 = QUEEN_VALUE + ROOK_VALUE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GamePhase {
    Opening,
    Midgame,
    Endgame,
}

impl GamePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            GamePhase::Opening => "opening",
            GamePhase::Midgame => "midgame",
            GamePhase::Endgame => "endgame",
        }
    }
}

/// Material of `side` without the king (P=1, N=3, B=3, R=5, Q=9).
pub fn material_value(pos: &Chess, side: Color) -> u32 {
    let board = pos.board();
    let ours = board.by_color(side);
    [
        (Role::Pawn, PAWN_VALUE),
        (Role::Knight, KNIGHT_VALUE),
        (Role::Bishop, BISHOP_VALUE),
        (Role::Rook, ROOK_VALUE),
        (Role::Queen, QUEEN_VALUE),
    ]
    .iter()
    .map(|&(role, value)| (ours & board.by_role(role)).count() as u32 * value)
    .sum()
}

/// True when the position is decided or both sides are short of material.
pub fn is_endgame(pos: &Chess, score: &PositionScore, expectation: f64) -> bool {
    if score.is_mate() || expectation == 1.0 || expectation == 0.0 {
        return true;
    }

    material_value(pos, Color::White) <= ENDGAME_MATERIAL_LIMIT
        && material_value(pos, Color::Black) <= ENDGAME_MATERIAL_LIMIT
}

/// Tracks the phase of one game. Phases only move forward and the endgame is
/// only looked for once the opening line has been left.
#[derive(Debug, Clone)]
pub struct PhaseTracker {
    phase: GamePhase,
    opening_plies: u32,
}

impl PhaseTracker {
    pub fn new(opening_plies: u32) -> Self {
        Self {
            phase: GamePhase::Opening,
            opening_plies,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Called with the ply before each move; leaves the opening at the end of the book line.
    pub fn before_move(&mut self, ply: u32) -> GamePhase {
        if self.phase == GamePhase::Opening && ply >= self.opening_plies {
            info!(ply, "Begin of midgame");
            self.phase = GamePhase::Midgame;
        }
        self.phase
    }

    /// Called with the analysed position after each move.
    pub fn after_analysis(
        &mut self,
        pos: &Chess,
        score: &PositionScore,
        expectation: f64,
    ) -> GamePhase {
        if self.phase == GamePhase::Midgame && is_endgame(pos, score, expectation) {
            info!("Begin of endgame");
            self.phase = GamePhase::Endgame;
        }
        self.phase
    }
}
