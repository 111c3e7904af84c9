//! Whole-game annotation walk with a scripted engine.

mod common;

use annotator::annotate::{annotate_game, prepare_games, AnnotateOptions};
use annotator::{AnalysisCache, GamePhase, MoveType, SearchLimit};
use chess_core::{pgn, OpeningBook};

use common::ScriptedEngine;

const PGN: &str = r#"[Event "Blitz"]
[Site "?"]
[Date "2020.??.??"]
[Round "1"]
[White "Magnus Carlsen"]
[Black "Caruana, Fabiano"]
[Result "1-0"]

1. e4 e5 2. Qh5 Nc6 3. Bc4 Nf6 4. Qxf7# 1-0

[Event "Blitz"]
[Site "?"]
[Date "2020.??.??"]
[Round "2"]
[White "Caruana, Fabiano"]
[Black "Carlsen, Magnus"]
[Result "1-0"]

1. d4 d5 2. c4 e6 1-0
"#;

const ECO: &str = "eco\tname\tfen\tmoves
C20\tKing's Pawn Game\trnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq -\te2e4 e7e5
";

fn options() -> AnnotateOptions {
    AnnotateOptions {
        multipv: 3,
        limit: SearchLimit::Depth(8),
        always_find_bad_alternative: true,
    }
}

fn book() -> OpeningBook {
    let mut book = OpeningBook::default();
    book.add_table(ECO).unwrap();
    book
}

#[test]
fn test_prepare_games_keeps_wins() {
    let games = prepare_games("Magnus Carlsen", pgn::read_games(PGN.as_bytes()).unwrap());
    assert_eq!(games.len(), 1);
    assert_eq!(games[0].metadata.white, "Carlsen, Magnus");
    assert_eq!(games[0].metadata.date, "2020.01.01");
}

#[tokio::test]
async fn test_annotate_game_walk() {
    let games = prepare_games("Magnus Carlsen", pgn::read_games(PGN.as_bytes()).unwrap());
    let mut engine = ScriptedEngine::new(40);
    let mut cache = AnalysisCache::new();

    let analyzed = annotate_game(
        &mut engine,
        &mut cache,
        &book(),
        "Magnus Carlsen",
        &games[0],
        &options(),
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(analyzed.game_analysis.opening.eco, "C20");
    let moves = analyzed.moves();
    assert_eq!(moves.len(), 7);

    // Two book plies, then the walk leaves the opening
    for (i, analyzed_move) in moves.iter().enumerate() {
        assert_eq!(analyzed_move.ply, i as u32);
    }
    assert_eq!(moves[0].game_phase, GamePhase::Opening);
    assert_eq!(moves[1].game_phase, GamePhase::Opening);
    assert_eq!(moves[0].actual_move.move_type, MoveType::Book);
    assert!(moves[1].alternative_moves.is_empty());
    assert_eq!(moves[2].game_phase, GamePhase::Midgame);
    assert_ne!(moves[2].actual_move.move_type, MoveType::Book);

    // Mate decides the game
    let last = &moves[6];
    assert_eq!(last.actual_move.notation.san, "Qxf7#");
    assert_eq!(last.game_phase, GamePhase::Endgame);
    assert_eq!(last.actual_move.principal_expectation, 1.0);
    assert_eq!(last.actual_move.pv, "4. Qxf7#");

    for analyzed_move in moves {
        assert!(analyzed_move.alternative_moves.len() <= 2);
        assert!(analyzed_move
            .alternative_moves
            .iter()
            .all(|alt| alt.notation.uci != analyzed_move.actual_move.notation.uci));
    }

    let json = serde_json::to_value(&analyzed).unwrap();
    assert_eq!(json["gameAnalysis"]["grandmasterSide"], "white");
    assert_eq!(json["gameAnalysis"]["analyzedMoves"][1]["turn"], "black");
    assert!(json["gameAnalysis"]["analyzedMoves"][0]["actualMove"]["pv"]
        .as_str()
        .unwrap()
        .starts_with("1. e4 "));
}

#[tokio::test]
async fn test_positions_analysed_once() {
    let games = prepare_games("Magnus Carlsen", pgn::read_games(PGN.as_bytes()).unwrap());
    let mut engine = ScriptedEngine::new(40);
    let mut cache = AnalysisCache::new();
    let options = AnnotateOptions {
        always_find_bad_alternative: false,
        ..options()
    };

    annotate_game(&mut engine, &mut cache, &book(), "Magnus Carlsen", &games[0], &options)
        .await
        .unwrap();

    // One analysis per position after each move, nothing else
    assert_eq!(engine.calls.len(), 7);
    assert_eq!(cache.len(), 7);
}

#[tokio::test]
async fn test_unknown_opening_is_skipped() {
    let games = prepare_games("Magnus Carlsen", pgn::read_games(PGN.as_bytes()).unwrap());
    let mut engine = ScriptedEngine::new(40);
    let mut cache = AnalysisCache::new();

    let analyzed = annotate_game(
        &mut engine,
        &mut cache,
        &OpeningBook::default(),
        "Magnus Carlsen",
        &games[0],
        &options(),
    )
    .await
    .unwrap();

    assert!(analyzed.is_none());
    assert!(engine.calls.is_empty());
}
