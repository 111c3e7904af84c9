//! Scripted engine shared by the integration tests.

use std::collections::HashMap;

use annotator::{AnalysisLine, Analyzer, AnnotatorError, PositionScore, Score, SearchLimit};
use async_trait::async_trait;
use chess_core::notation;
use shakmaty::{Chess, Position};

/// Answers with fixed lines per position (keyed by EPD). Unknown positions get
/// one line per legal move, best first, starting at `default_cp` (White's
/// point of view) and ten centipawns worse per line.
pub struct ScriptedEngine {
    lines: HashMap<String, Vec<AnalysisLine>>,
    default_cp: i32,
    /// EPDs in the order they were analysed
    pub calls: Vec<String>,
}

impl ScriptedEngine {
    pub fn new(default_cp: i32) -> Self {
        Self {
            lines: HashMap::new(),
            default_cp,
            calls: Vec::new(),
        }
    }

    pub fn script(&mut self, pos: &Chess, lines: Vec<AnalysisLine>) {
        self.lines.insert(notation::epd(pos), lines);
    }
}

#[async_trait]
impl Analyzer for ScriptedEngine {
    async fn analyze(
        &mut self,
        pos: &Chess,
        multipv: u32,
        _limit: SearchLimit,
    ) -> Result<Vec<AnalysisLine>, AnnotatorError> {
        let epd = notation::epd(pos);
        self.calls.push(epd.clone());

        if let Some(lines) = self.lines.get(&epd) {
            return Ok(lines.iter().take(multipv as usize).cloned().collect());
        }

        if pos.is_checkmate() {
            return Ok(vec![AnalysisLine {
                score: PositionScore::from_relative(Score::from_uci_mate(0), pos.turn()),
                pv: vec![],
            }]);
        }
        if pos.is_game_over() {
            return Ok(vec![AnalysisLine {
                score: PositionScore::white(Score::Cp(0)),
                pv: vec![],
            }]);
        }

        Ok(pos
            .legal_moves()
            .into_iter()
            .take(multipv as usize)
            .enumerate()
            .map(|(i, mv)| AnalysisLine {
                score: PositionScore::white(Score::Cp(self.default_cp - 10 * i as i32)),
                pv: vec![mv],
            })
            .collect())
    }
}

/// Position reached by playing UCI moves from `pos`.
pub fn play(pos: &Chess, moves: &[&str]) -> Chess {
    moves.iter().fold(pos.clone(), |pos, uci| {
        let mv = notation::parse_uci(&pos, uci).unwrap();
        notation::after_move(&pos, &mv)
    })
}

/// Analysis line with a White point-of-view score and a UCI pv from `pos`.
pub fn line(pos: &Chess, score: Score, pv: &[&str]) -> AnalysisLine {
    let mut cursor = pos.clone();
    let moves = pv
        .iter()
        .map(|uci| {
            let mv = notation::parse_uci(&cursor, uci).unwrap();
            cursor = notation::after_move(&cursor, &mv);
            mv
        })
        .collect();

    AnalysisLine {
        score: PositionScore::white(score),
        pv: moves,
    }
}
