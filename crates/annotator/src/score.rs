//! Engine scores and the win-expectation model — pure functions only
//! (No Board/Cache/Engine dependencies)

use std::fmt;

use serde::{Deserialize, Serialize};
use shakmaty::Color;

/// Plies after which the win-rate model stops changing
const WIN_RATE_MAX_PLY: f64 = 240.0;

/// Centipawn clamp applied before the logistic curve
const WIN_RATE_CP_CLAMP: f64 = 2000.0;

/// Polynomial coefficients (in ply / 64) of the logistic midpoint
const WIN_RATE_A: [f64; 4] = [-3.683_893_04, 30.070_659_21, -60.528_787_23, 149.533_785_57];

/// Polynomial coefficients (in ply / 64) of the logistic spread
const WIN_RATE_B: [f64; 4] = [-2.018_185_70, 15.856_850_38, -29.834_520_23, 47.590_788_27];

/// Score of a position from one side's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Score {
    /// Centipawns, positive when this side is better.
    Cp(i32),
    /// Forced mate in `moves`; `winning` tells whether this side delivers it.
    /// `moves == 0` means the game is already over by mate.
    Mate { moves: u32, winning: bool },
}

impl Score {
    /// Build a score from UCI `mate N` (negative N: the side is getting mated).
    /// `mate 0` is reported to the side that is already checkmated.
    pub fn from_uci_mate(n: i32) -> Self {
        Score::Mate {
            moves: n.unsigned_abs(),
            winning: n > 0,
        }
    }

    pub fn is_mate(&self) -> bool {
        matches!(self, Score::Mate { .. })
    }

    /// The same score seen by the other side.
    pub fn flip(self) -> Self {
        match self {
            Score::Cp(cp) => Score::Cp(-cp),
            Score::Mate { moves, winning } => Score::Mate {
                moves,
                winning: !winning,
            },
        }
    }

    /// Signed mate distance (`-n` when being mated), `None` for centipawn scores.
    pub fn mate(&self) -> Option<i32> {
        match *self {
            Score::Cp(_) => None,
            Score::Mate { moves, winning } => {
                let moves = moves as i32;
                Some(if winning { moves } else { -moves })
            }
        }
    }
}

impl fmt::Display for Score {
    /// `M7` / `M-7` for mates, otherwise signed centipawns (`+123`, `-45`, `+0`)
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Cp(cp) => write!(f, "{cp:+}"),
            Score::Mate { .. } => write!(f, "M{}", self.mate().unwrap_or_default()),
        }
    }
}

/// Engine evaluation of a position, stored from White's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionScore {
    white: Score,
}

impl PositionScore {
    pub fn white(score: Score) -> Self {
        Self { white: score }
    }

    /// Convert a score relative to the side to move (as UCI engines report it).
    pub fn from_relative(score: Score, turn: Color) -> Self {
        match turn {
            Color::White => Self { white: score },
            Color::Black => Self { white: score.flip() },
        }
    }

    /// The score as seen by `side`.
    pub fn pov(&self, side: Color) -> Score {
        match side {
            Color::White => self.white,
            Color::Black => self.white.flip(),
        }
    }

    pub fn is_mate(&self) -> bool {
        self.white.is_mate()
    }
}

impl fmt::Display for PositionScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.white)
    }
}

/// Render a point-of-view score as `"+123"`, `"-45"`, `"M7"` or `"M-7"`.
pub fn format_score(score: Score) -> String {
    score.to_string()
}

fn polynomial(coefficients: &[f64; 4], m: f64) -> f64 {
    coefficients.iter().fold(0.0, |acc, c| acc * m + c)
}

/// Win rate in permille for `cp` at `ply` (Stockfish 15 WDL model).
fn win_rate(cp: f64, ply: u32) -> f64 {
    let m = f64::from(ply).min(WIN_RATE_MAX_PLY) / 64.0;
    let a = polynomial(&WIN_RATE_A, m);
    let b = polynomial(&WIN_RATE_B, m);
    let x = cp.clamp(-WIN_RATE_CP_CLAMP, WIN_RATE_CP_CLAMP);
    1000.0 / (1.0 + ((a - x) / b).exp())
}

/// Win expectation in [0, 1] for a point-of-view score at `ply`
/// (wins count 1, draws 0.5).
pub fn win_expectation(score: Score, ply: u32) -> f64 {
    match score {
        Score::Mate { winning: true, .. } => 1.0,
        Score::Mate { winning: false, .. } => 0.0,
        Score::Cp(cp) => {
            let cp = f64::from(cp);
            let wins = win_rate(cp, ply);
            let losses = win_rate(-cp, ply);
            (0.5 + (wins - losses) / 2000.0).clamp(0.0, 1.0)
        }
    }
}
