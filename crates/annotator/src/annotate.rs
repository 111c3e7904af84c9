//! Per-game annotation walk.
//!
//! Replays a game move by move, analysing every resulting position once,
//! tracking the game phase and classifying each move outside the opening
//! against the analysis of the position before it.

use shakmaty::{Chess, Color, Move, Position};
use tracing::{debug, info, warn};

use chess_core::{notation, pgn, sides, GameData, OpeningBook};

use crate::cache::AnalysisCache;
use crate::classify::{evaluate_move, evaluate_move_sync, BadAlternativePolicy, MoveType, PlyInput};
use crate::config::AnnotatorConfig;
use crate::engine::{AnalysisLine, Analyzer, SearchLimit};
use crate::error::AnnotatorError;
use crate::output::{AnalyzedGame, AnalyzedMove, EvaluatedMove, PositionEvaluation};
use crate::phase::{GamePhase, PhaseTracker};
use crate::score::win_expectation;

/// Principal expectation before the first move
const INITIAL_EXPECTATION: f64 = 0.5;

#[derive(Debug, Clone, Copy)]
pub struct AnnotateOptions {
    pub multipv: u32,
    pub limit: SearchLimit,
    pub always_find_bad_alternative: bool,
}

impl From<&AnnotatorConfig> for AnnotateOptions {
    fn from(config: &AnnotatorConfig) -> Self {
        Self {
            multipv: config.analysis_multipv,
            limit: config.search_limit(),
            always_find_bad_alternative: config.always_find_bad_alternative,
        }
    }
}

/// Keep the games `player` won in standard chess with legal moves, with
/// player names normalised.
pub fn prepare_games(player: &str, games: Vec<GameData>) -> Vec<GameData> {
    let total = games.len();
    let valid: Vec<GameData> = games
        .into_iter()
        .filter(|game| {
            let valid = sides::is_game_valid(player, game);
            if !valid {
                debug!(
                    white = %game.metadata.white,
                    black = %game.metadata.black,
                    "Skipping invalid game"
                );
            }
            valid
        })
        .map(|mut game| {
            sides::preprocess_game(&mut game);
            game
        })
        .collect();

    info!(total, valid = valid.len(), "Games prepared");
    valid
}

/// Annotate one game for `player`. Returns `None` when the opening cannot be
/// identified.
pub async fn annotate_game<A: Analyzer + ?Sized>(
    engine: &mut A,
    cache: &mut AnalysisCache,
    book: &OpeningBook,
    player: &str,
    game: &GameData,
    options: &AnnotateOptions,
) -> Result<Option<AnalyzedGame>, AnnotatorError> {
    let moves = pgn::replay(&game.moves)?;

    let Some(opening) = book.identify(&moves).cloned() else {
        warn!(
            white = %game.metadata.white,
            black = %game.metadata.black,
            "Game opening could not be identified"
        );
        return Ok(None);
    };

    let principal = sides::principal_side(player, game);
    info!(
        white = %game.metadata.white,
        black = %game.metadata.black,
        eco = %opening.eco,
        moves = moves.len(),
        "Starting annotation"
    );

    let policy = BadAlternativePolicy {
        enabled: options.always_find_bad_alternative,
        limit: options.limit,
    };

    let mut phase = PhaseTracker::new(opening.ply_length() as u32);
    let mut analyzed = AnalyzedGame::new(game, principal, opening);

    let mut pos = Chess::default();
    let mut last_analysis: Option<Vec<AnalysisLine>> = None;
    let mut last_expectation = INITIAL_EXPECTATION;
    let mut last_opponent_move_was_blunder = false;

    for mv in &moves {
        let before = pos.clone();
        let ply = notation::ply(&before);
        let turn = before.turn();
        pos.play_unchecked(*mv);

        phase.before_move(ply);

        let analysis = cache
            .get_or_analyze(engine, &pos, options.multipv, options.limit)
            .await?;
        let line = analysis
            .first()
            .ok_or_else(|| AnnotatorError::EmptyAnalysis(notation::fen(&pos)))?;
        let score = line.score;
        let expectation = win_expectation(score.pov(principal), notation::ply(&pos));

        let mut pv = Vec::with_capacity(line.pv.len() + 1);
        pv.push(mv.clone());
        pv.extend(line.pv.iter().cloned());

        let game_phase = phase.after_analysis(&pos, &score, expectation);

        let (move_type, alternative_moves) = if game_phase == GamePhase::Opening {
            (MoveType::Book, Vec::new())
        } else {
            let previous = match last_analysis.take() {
                Some(previous) => previous,
                None => {
                    cache
                        .get_or_analyze(engine, &before, options.multipv, options.limit)
                        .await?
                }
            };

            let input = PlyInput {
                before: &before,
                after: &pos,
                played: mv,
                last_analysis: &previous,
                principal,
                last_expectation,
                new_expectation: expectation,
                last_opponent_move_was_blunder,
            };
            let evaluation = evaluate_move(engine, &input, policy).await?;
            last_opponent_move_was_blunder = evaluation.move_type == MoveType::Blunder;
            (evaluation.move_type, evaluation.alternatives)
        };

        debug!(
            ply,
            phase = game_phase.as_str(),
            move_type = move_type.as_str(),
            expectation,
            "Move annotated"
        );

        analyzed.push_move(AnalyzedMove {
            ply,
            game_phase,
            turn: turn.into(),
            actual_move: EvaluatedMove::new(&before, mv, move_type, &score, expectation, &pv),
            alternative_moves,
        });

        last_analysis = Some(analysis);
        last_expectation = expectation;
    }

    Ok(Some(analyzed))
}

/// A single move to classify between two given positions.
#[derive(Debug, Clone)]
pub struct PositionRequest {
    pub principal: Color,
    pub before: Chess,
    pub after: Chess,
    pub played: Move,
    pub last_opponent_move_was_blunder: bool,
}

/// Classify one move from the analyses of both positions. Alternatives come
/// from the candidates of `before` only; no further moves are searched.
pub async fn evaluate_position<A: Analyzer + ?Sized>(
    engine: &mut A,
    cache: &mut AnalysisCache,
    request: &PositionRequest,
    multipv: u32,
    limit: SearchLimit,
) -> Result<PositionEvaluation, AnnotatorError> {
    let principal = request.principal;

    let before_analysis = cache
        .get_or_analyze(engine, &request.before, multipv, limit)
        .await?;
    let before_line = before_analysis
        .first()
        .ok_or_else(|| AnnotatorError::EmptyAnalysis(notation::fen(&request.before)))?;
    let last_expectation = win_expectation(
        before_line.score.pov(principal),
        notation::ply(&request.before),
    );

    let after_analysis = cache
        .get_or_analyze(engine, &request.after, multipv, limit)
        .await?;
    let after_line = after_analysis
        .first()
        .ok_or_else(|| AnnotatorError::EmptyAnalysis(notation::fen(&request.after)))?;
    let new_expectation = win_expectation(
        after_line.score.pov(principal),
        notation::ply(&request.after),
    );

    let mut pv = Vec::with_capacity(after_line.pv.len() + 1);
    pv.push(request.played.clone());
    pv.extend(after_line.pv.iter().cloned());

    let evaluation = evaluate_move_sync(&PlyInput {
        before: &request.before,
        after: &request.after,
        played: &request.played,
        last_analysis: &before_analysis,
        principal,
        last_expectation,
        new_expectation,
        last_opponent_move_was_blunder: request.last_opponent_move_was_blunder,
    });

    debug!(
        move_type = evaluation.move_type.as_str(),
        last_expectation,
        new_expectation,
        "Position evaluated"
    );

    Ok(PositionEvaluation {
        turn: request.before.turn().into(),
        evaluated_move: EvaluatedMove::new(
            &request.before,
            &request.played,
            evaluation.move_type,
            &after_line.score,
            new_expectation,
            &pv,
        ),
        alternative_moves: evaluation.alternatives,
    })
}
