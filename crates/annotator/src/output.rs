//! Annotated game records and their JSON files.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use shakmaty::{Chess, Color, Move};
use tracing::info;
use uuid::Uuid;

use chess_core::notation;
use chess_core::{GameData, Opening};

use crate::classify::MoveType;
use crate::error::AnnotatorError;
use crate::phase::GamePhase;
use crate::score::PositionScore;

const ADDED_DATE_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

impl From<Color> for Side {
    fn from(color: Color) -> Self {
        match color {
            Color::White => Side::White,
            Color::Black => Side::Black,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveNotation {
    pub uci: String,
    pub san: String,
}

/// A move with its classification, score and line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluatedMove {
    #[serde(rename = "move")]
    pub notation: MoveNotation,
    pub move_type: MoveType,
    /// Score after the move, White's point of view
    #[serde(rename = "signedCPScore")]
    pub signed_cp_score: String,
    /// Principal player's expectation after the move
    #[serde(rename = "gmExpectation")]
    pub principal_expectation: f64,
    /// Numbered SAN of the line starting with the move
    pub pv: String,
}

impl EvaluatedMove {
    pub fn new(
        before: &Chess,
        mv: &Move,
        move_type: MoveType,
        score: &PositionScore,
        principal_expectation: f64,
        pv: &[Move],
    ) -> Self {
        Self {
            notation: MoveNotation {
                uci: notation::uci(mv),
                san: notation::san(before, mv),
            },
            move_type,
            signed_cp_score: score.to_string(),
            principal_expectation,
            pv: notation::variation_san(before, pv),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzedMove {
    pub ply: u32,
    pub game_phase: GamePhase,
    pub turn: Side,
    pub actual_move: EvaluatedMove,
    pub alternative_moves: Vec<EvaluatedMove>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameInfo {
    pub event: String,
    pub site: String,
    pub date: String,
    pub round: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameAnalysis {
    pub grandmaster_side: Side,
    /// Not probed; always written as `null`
    pub grandmaster_depth_to_mate_in_half_moves: Option<i32>,
    pub opening: Opening,
    pub analyzed_moves: Vec<AnalyzedMove>,
}

/// One annotated game as written to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzedGame {
    pub id: Uuid,
    pub added_date: String,
    pub pgn: String,
    pub white_player: String,
    pub black_player: String,
    pub game_info: GameInfo,
    pub game_analysis: GameAnalysis,
}

impl AnalyzedGame {
    pub fn new(game: &GameData, principal: Color, opening: Opening) -> Self {
        let meta = &game.metadata;
        Self {
            id: Uuid::new_v4(),
            added_date: chrono::Local::now().format(ADDED_DATE_FORMAT).to_string(),
            pgn: game.pgn.clone(),
            white_player: meta.white.clone(),
            black_player: meta.black.clone(),
            game_info: GameInfo {
                event: meta.event.clone(),
                site: meta.site.clone(),
                date: meta.date.clone(),
                round: meta.round.clone(),
            },
            game_analysis: GameAnalysis {
                grandmaster_side: principal.into(),
                grandmaster_depth_to_mate_in_half_moves: None,
                opening,
                analyzed_moves: Vec::new(),
            },
        }
    }

    pub fn push_move(&mut self, analyzed: AnalyzedMove) {
        self.game_analysis.analyzed_moves.push(analyzed);
    }

    pub fn moves(&self) -> &[AnalyzedMove] {
        &self.game_analysis.analyzed_moves
    }

    /// `<White>_vs_<Black>_<date>_<round>.json` with unknown parts as `X`.
    pub fn file_name(&self) -> String {
        format!(
            "{}_vs_{}_{}_{}.json",
            self.white_player,
            self.black_player,
            self.game_info.date.replace('?', "X"),
            self.game_info.round.replace('?', "X"),
        )
    }

    /// Write the game to `<output_dir>/<player>/splitted/`.
    pub fn save(&self, output_dir: &Path, player: &str) -> Result<PathBuf, AnnotatorError> {
        let dir = output_dir.join(player).join("splitted");
        fs::create_dir_all(&dir)?;

        let path = dir.join(self.file_name());
        fs::write(&path, serde_json::to_string(self)?)?;
        info!(path = %path.display(), "Saved analysis output file");
        Ok(path)
    }
}

/// Classification of a single move between two given positions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionEvaluation {
    pub turn: Side,
    pub evaluated_move: EvaluatedMove,
    pub alternative_moves: Vec<EvaluatedMove>,
}

/// Write all games of one run to `<output_dir>/<player>/<stem>.json`.
pub fn save_merged(
    output_dir: &Path,
    player: &str,
    stem: &str,
    games: &[AnalyzedGame],
) -> Result<PathBuf, AnnotatorError> {
    let dir = output_dir.join(player);
    fs::create_dir_all(&dir)?;

    let path = dir.join(format!("{stem}.json"));
    fs::write(&path, serde_json::to_string(games)?)?;
    info!(path = %path.display(), games = games.len(), "Saved merged analysis output file");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::Score;
    use chess_core::game_data::GameMetadata;
    use chess_core::notation::parse_san;

    fn sample_game() -> GameData {
        GameData {
            metadata: GameMetadata {
                white: "Carlsen, Magnus".into(),
                black: "Caruana, Fabiano".into(),
                result: "1-0".into(),
                event: "Casual".into(),
                site: "Oslo".into(),
                date: "2021.??.??".into(),
                round: "?".into(),
                ..GameMetadata::default()
            },
            moves: vec!["e4".into()],
            pgn: "1. e4 1-0".into(),
        }
    }

    fn sample_opening() -> Opening {
        Opening {
            eco: "B00".into(),
            name: "King's Pawn".into(),
            fen: "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq -".into(),
            moves: "e2e4".into(),
        }
    }

    #[test]
    fn test_evaluated_move_json_shape() {
        let start = Chess::default();
        let e4 = parse_san(&start, "e4").unwrap();
        let after = notation::after_move(&start, &e4);
        let e5 = parse_san(&after, "e5").unwrap();

        let evaluated = EvaluatedMove::new(
            &start,
            &e4,
            MoveType::Best,
            &PositionScore::white(Score::Cp(31)),
            0.52,
            &[e4.clone(), e5],
        );
        let json = serde_json::to_value(&evaluated).unwrap();
        assert_eq!(json["move"]["uci"], "e2e4");
        assert_eq!(json["move"]["san"], "e4");
        assert_eq!(json["moveType"], "best");
        assert_eq!(json["signedCPScore"], "+31");
        assert_eq!(json["gmExpectation"], 0.52);
        assert_eq!(json["pv"], "1. e4 e5");
    }

    #[test]
    fn test_analyzed_game_json_shape() {
        let game = AnalyzedGame::new(&sample_game(), Color::Black, sample_opening());
        let json = serde_json::to_value(&game).unwrap();
        assert_eq!(json["whitePlayer"], "Carlsen, Magnus");
        assert_eq!(json["gameInfo"]["site"], "Oslo");
        assert_eq!(json["gameAnalysis"]["grandmasterSide"], "black");
        let analysis = json["gameAnalysis"].as_object().unwrap();
        assert!(analysis["grandmasterDepthToMateInHalfMoves"].is_null());
        assert_eq!(json["gameAnalysis"]["opening"]["eco"], "B00");
        assert!(json["gameAnalysis"]["analyzedMoves"].as_array().unwrap().is_empty());
        assert_eq!(game.added_date.len(), "01/01/2021 00:00:00".len());
    }

    #[test]
    fn test_file_name_replaces_unknowns() {
        let game = AnalyzedGame::new(&sample_game(), Color::White, sample_opening());
        assert_eq!(
            game.file_name(),
            "Carlsen, Magnus_vs_Caruana, Fabiano_2021.XX.XX_X.json"
        );
    }

    #[test]
    fn test_save_and_merge() {
        let root = std::env::temp_dir().join(format!("annotator-output-{}", Uuid::new_v4()));
        let game = AnalyzedGame::new(&sample_game(), Color::White, sample_opening());

        let path = game.save(&root, "Carlsen, Magnus").unwrap();
        assert!(path.starts_with(root.join("Carlsen, Magnus").join("splitted")));
        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["id"], game.id.to_string());

        let merged = save_merged(&root, "Carlsen, Magnus", "games", &[game]).unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&merged).unwrap()).unwrap();
        assert_eq!(written.as_array().unwrap().len(), 1);

        fs::remove_dir_all(&root).unwrap();
    }
}
