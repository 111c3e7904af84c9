use std::sync::Arc;

use axum::{extract::Query, Extension, Json};
use serde::Deserialize;
use shakmaty::Color;

use annotator::annotate::{self, PositionRequest};
use annotator::PositionEvaluation;
use chess_core::notation;

use crate::error::AppError;
use crate::state::{Analysis, AnalysisState};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyseQuery {
    pub grandmaster_side: Option<String>,
    pub board_before_move_fen: Option<String>,
    pub board_after_move_fen: Option<String>,
    pub last_opponent_move_was_blunder: Option<String>,
    pub move_played_san: Option<String>,
}

fn missing() -> AppError {
    AppError::BadRequest("Missing url parameters".to_string())
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// GET /analyse?grandmasterSide=...&boardBeforeMoveFen=...&boardAfterMoveFen=...
///     &lastOpponentMoveWasBlunder=...&movePlayedSan=...
/// Classify the played move and return up to two alternatives.
/// Repeated FEN pairs are answered from the result cache.
pub async fn analyse(
    Extension(state): Extension<Arc<AnalysisState>>,
    Query(q): Query<AnalyseQuery>,
) -> Result<Json<PositionEvaluation>, AppError> {
    let side = present(q.grandmaster_side).ok_or_else(missing)?;
    let before_fen = present(q.board_before_move_fen).ok_or_else(missing)?;
    let after_fen = present(q.board_after_move_fen).ok_or_else(missing)?;

    let key = (before_fen, after_fen);
    if let Some(cached) = state.results.lock().await.get(&key) {
        return Ok(Json(cached.clone()));
    }

    let san = present(q.move_played_san).ok_or_else(missing)?;
    let last_blunder = present(q.last_opponent_move_was_blunder).ok_or_else(missing)?;

    let principal = if side.eq_ignore_ascii_case("white") {
        Color::White
    } else {
        Color::Black
    };

    let before = notation::parse_fen(&key.0)?;
    let request = PositionRequest {
        principal,
        played: notation::parse_san(&before, &san)?,
        after: notation::parse_fen(&key.1)?,
        before,
        last_opponent_move_was_blunder: last_blunder.eq_ignore_ascii_case("true"),
    };

    let evaluation = {
        let mut analysis = state.analysis.lock().await;
        let Analysis { engine, cache } = &mut *analysis;
        annotate::evaluate_position(engine.as_mut(), cache, &request, state.multipv, state.limit)
            .await?
    };

    tracing::info!(
        move_type = evaluation.evaluated_move.move_type.as_str(),
        san = %san,
        "Move analysed"
    );

    state.results.lock().await.insert(key, evaluation.clone());
    Ok(Json(evaluation))
}
