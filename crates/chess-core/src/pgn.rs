//! PGN reading on top of `pgn-reader`, plus SAN replay.

use std::io::Read;
use std::ops::ControlFlow;

use pgn_reader::{RawTag, Reader, SanPlus, Skip, Visitor};
use shakmaty::{Chess, Move, Position};

use crate::error::ChessCoreError;
use crate::game_data::{GameData, GameMetadata};
use crate::notation;

const STANDARD_START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Tags collected while reading the header of one game.
struct GameTags {
    metadata: GameMetadata,
    /// Tag pairs in file order, for re-exporting the game
    raw: Vec<(String, String)>,
}

impl Default for GameTags {
    fn default() -> Self {
        Self {
            metadata: GameMetadata {
                white: "?".to_string(),
                black: "?".to_string(),
                result: "*".to_string(),
                event: "?".to_string(),
                site: "?".to_string(),
                date: "????.??.??".to_string(),
                round: "?".to_string(),
                ..GameMetadata::default()
            },
            raw: Vec::new(),
        }
    }
}

/// Mainline moves of the game being read.
struct GameState {
    tags: GameTags,
    moves: Vec<String>,
}

/// Visitor that keeps the mainline of every game with at least one move.
#[derive(Default)]
struct GameCollector {
    games: Vec<GameData>,
}

impl Visitor for GameCollector {
    type Tags = GameTags;
    type Movetext = GameState;
    type Output = ();

    fn begin_tags(&mut self) -> ControlFlow<(), GameTags> {
        ControlFlow::Continue(GameTags::default())
    }

    fn tag(&mut self, tags: &mut GameTags, name: &[u8], value: RawTag<'_>) -> ControlFlow<()> {
        let name = String::from_utf8_lossy(name).into_owned();
        let value = value.decode_utf8_lossy().into_owned();

        let metadata = &mut tags.metadata;
        match name.as_str() {
            "White" => metadata.white = value.clone(),
            "Black" => metadata.black = value.clone(),
            "Result" => metadata.result = value.clone(),
            "Event" => metadata.event = value.clone(),
            "Site" => metadata.site = value.clone(),
            "Date" => metadata.date = value.clone(),
            "Round" => metadata.round = value.clone(),
            "Variant" => metadata.variant = Some(value.clone()),
            "SetUp" => metadata.setup = Some(value.clone()),
            "FEN" => metadata.fen = Some(value.clone()),
            _ => {}
        }
        tags.raw.push((name, value));
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, tags: GameTags) -> ControlFlow<(), GameState> {
        ControlFlow::Continue(GameState {
            tags,
            moves: Vec::new(),
        })
    }

    fn san(&mut self, state: &mut GameState, san_plus: SanPlus) -> ControlFlow<()> {
        state.moves.push(san_plus.to_string());
        ControlFlow::Continue(())
    }

    fn begin_variation(&mut self, _state: &mut GameState) -> ControlFlow<(), Skip> {
        // Mainline only
        ControlFlow::Continue(Skip(true))
    }

    fn end_game(&mut self, state: GameState) {
        if state.moves.is_empty() {
            return;
        }

        let pgn = export_pgn(&state.tags.raw, &state.moves, &state.tags.metadata.result);
        self.games.push(GameData {
            metadata: state.tags.metadata,
            moves: state.moves,
            pgn,
        });
    }
}

/// Read every game of a PGN stream, skipping games without moves.
/// Comments, NAGs and variations are dropped.
pub fn read_games<R: Read>(reader: R) -> Result<Vec<GameData>, ChessCoreError> {
    let mut reader = Reader::new(reader);
    let mut collector = GameCollector::default();
    while reader.read_game(&mut collector)?.is_some() {}
    Ok(collector.games)
}

/// Tag section followed by numbered mainline SAN and the result.
fn export_pgn(tags: &[(String, String)], moves: &[String], result: &str) -> String {
    let mut pgn = String::new();
    for (name, value) in tags {
        pgn.push_str(&format!("[{name} \"{value}\"]\n"));
    }
    pgn.push('\n');

    let mut movetext: Vec<String> = Vec::with_capacity(moves.len() + moves.len() / 2 + 1);
    for (i, san) in moves.iter().enumerate() {
        if i % 2 == 0 {
            movetext.push(format!("{}.", i / 2 + 1));
        }
        movetext.push(san.clone());
    }
    movetext.push(result.to_string());

    pgn.push_str(&movetext.join(" "));
    pgn
}

/// True when the game starts from the standard position and is plain chess.
pub fn is_standard_chess(metadata: &GameMetadata) -> bool {
    let variant_ok = metadata
        .variant
        .as_deref()
        .map(|v| v.eq_ignore_ascii_case("standard") || v.eq_ignore_ascii_case("chess"))
        .unwrap_or(true);

    let start_ok = match (metadata.setup.as_deref(), metadata.fen.as_deref()) {
        (Some("1"), Some(fen)) => fen == STANDARD_START_FEN,
        _ => true,
    };

    variant_ok && start_ok
}

/// Replay SAN moves from the standard start position, returning the legal moves.
pub fn replay(san_moves: &[String]) -> Result<Vec<Move>, ChessCoreError> {
    let mut pos = Chess::default();
    let mut moves = Vec::with_capacity(san_moves.len());

    for text in san_moves {
        let san: SanPlus = text
            .parse()
            .map_err(|_| ChessCoreError::InvalidSan(text.clone()))?;
        let mv = san.san.to_move(&pos).map_err(|_| ChessCoreError::IllegalMove {
            mv: text.clone(),
            fen: notation::fen(&pos),
        })?;
        pos.play_unchecked(mv);
        moves.push(mv);
    }

    Ok(moves)
}
