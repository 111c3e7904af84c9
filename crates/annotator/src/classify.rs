//! Move classification and alternative-move selection.
//!
//! All expectations handled here are from the point of view of the side that
//! is moving. Callers holding principal-player expectations orient them with
//! [`orient`] before building a [`MoveContext`].

use serde::{Deserialize, Serialize};
use shakmaty::{Chess, Color, Move, Position};
use tracing::debug;

use chess_core::notation;

use crate::engine::{AnalysisLine, Analyzer, SearchLimit};
use crate::error::AnnotatorError;
use crate::output::EvaluatedMove;
use crate::score::{win_expectation, PositionScore};

/// Second-best expectation at or below this leaves only one good move
const ONLY_GOOD_MOVE_EPS: f64 = 0.10;
/// ...provided the best move keeps at least this much
const ONLY_GOOD_MOVE_MIN_BEST: f64 = 0.40;
/// An okay second-best move still leaves one good move when the best is far ahead
const ONLY_GOOD_MOVE_MIN_SECOND: f64 = 0.35;
const ONLY_GOOD_MOVE_RATIO: f64 = 1.5;

/// Expectation deltas against the best candidate
const BRILLIANT_MOVE_EXPECTATION_DELTA: f64 = 0.05;
const BEST_MOVE_EXPECTATION_DELTA: f64 = 0.05;
const EXCELLENT_MOVE_EXPECTATION_DELTA: f64 = 0.085;
const GOOD_MOVE_EXPECTATION_DELTA: f64 = 0.14;

/// Expectation drops against the position before the move
const INACCURACY_MOVE_EXPECTATION_DELTA: f64 = 0.085;
const MISTAKE_MOVE_EXPECTATION_DELTA: f64 = 0.14;
const BLUNDER_MOVE_EXPECTATION_DELTA: f64 = 0.23;

pub const MAX_ALTERNATIVES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MoveType {
    Book,
    Blunder,
    Mistake,
    Inaccuracy,
    Okay,
    Good,
    Excellent,
    Best,
    Brilliant,
    Critical,
    GameChanger,
}

impl MoveType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MoveType::Book => "book",
            MoveType::Blunder => "blunder",
            MoveType::Mistake => "mistake",
            MoveType::Inaccuracy => "inaccuracy",
            MoveType::Okay => "okay",
            MoveType::Good => "good",
            MoveType::Excellent => "excellent",
            MoveType::Best => "best",
            MoveType::Brilliant => "brilliant",
            MoveType::Critical => "critical",
            MoveType::GameChanger => "gameChanger",
        }
    }

    /// Blunders, mistakes and inaccuracies.
    pub fn is_bad(&self) -> bool {
        matches!(
            self,
            MoveType::Blunder | MoveType::Mistake | MoveType::Inaccuracy
        )
    }
}

/// One ranked engine suggestion for the position before the move.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateMove {
    pub mv: Move,
    /// Evaluation after the move, White's point of view
    pub score: PositionScore,
    /// Expectation of the side to move
    pub expectation: f64,
    /// Principal variation starting with `mv`
    pub pv: Vec<Move>,
}

/// Turn analysis lines of `pos` into candidates for the side to move.
/// Lines without a move (game already over) are skipped.
pub fn candidates(lines: &[AnalysisLine], pos: &Chess) -> Vec<CandidateMove> {
    let ply = notation::ply(pos);
    let turn = pos.turn();

    lines
        .iter()
        .filter_map(|line| {
            let mv = line.best_move()?.clone();
            Some(CandidateMove {
                mv,
                score: line.score,
                expectation: win_expectation(line.score.pov(turn), ply),
                pv: line.pv.clone(),
            })
        })
        .collect()
}

/// Flip an expectation to the other side unless `same_side`.
pub fn orient(expectation: f64, same_side: bool) -> f64 {
    if same_side {
        expectation
    } else {
        1.0 - expectation
    }
}

/// What is known about the position before the move.
#[derive(Debug, Clone, Copy)]
pub struct MoveContext<'a> {
    pub before: &'a Chess,
    /// Ranked candidates, best first
    pub candidates: &'a [CandidateMove],
    /// Mover's expectation before the move
    pub last_expectation: f64,
    pub last_opponent_move_was_blunder: bool,
}

impl MoveContext<'_> {
    fn best_expectation(&self) -> Option<f64> {
        self.candidates.first().map(|c| c.expectation)
    }
}

/// A move under judgement together with its resulting expectation.
struct Subject<'a> {
    ctx: &'a MoveContext<'a>,
    mv: &'a Move,
    expectation: f64,
    trivial: bool,
}

type Rule = fn(&Subject<'_>) -> bool;

/// Decision table, first match wins. `Best` turns into `GameChanger`
/// after an opponent blunder.
const RULES: [(MoveType, Rule); 8] = [
    (MoveType::Critical, rule_critical),
    (MoveType::Brilliant, rule_brilliant),
    (MoveType::Best, rule_best),
    (MoveType::Excellent, rule_excellent),
    (MoveType::Good, rule_good),
    (MoveType::Blunder, rule_blunder),
    (MoveType::Mistake, rule_mistake),
    (MoveType::Inaccuracy, rule_inaccuracy),
];

/// Classify `mv`, leading from `ctx.before` to `after`, whose resulting
/// expectation for the mover is `expectation`.
pub fn classify_move(ctx: &MoveContext<'_>, mv: &Move, after: &Chess, expectation: f64) -> MoveType {
    let subject = Subject {
        ctx,
        mv,
        expectation,
        trivial: is_trivial_move(ctx.before, after, mv),
    };

    let label = RULES
        .iter()
        .find(|(_, rule)| rule(&subject))
        .map(|(label, _)| *label)
        .unwrap_or(MoveType::Okay);

    if label == MoveType::Best && ctx.last_opponent_move_was_blunder {
        MoveType::GameChanger
    } else {
        label
    }
}

fn rule_critical(s: &Subject<'_>) -> bool {
    !s.trivial && is_critical_move(s.ctx.candidates, s.mv, s.expectation)
}

fn rule_brilliant(s: &Subject<'_>) -> bool {
    is_brilliant_move(s.ctx.candidates, s.mv, s.expectation)
}

fn rule_best(s: &Subject<'_>) -> bool {
    is_best_move(s.ctx.candidates, s.mv, s.expectation)
}

fn rule_excellent(s: &Subject<'_>) -> bool {
    s.ctx
        .best_expectation()
        .is_some_and(|best| (best - s.expectation).abs() <= EXCELLENT_MOVE_EXPECTATION_DELTA)
}

fn rule_good(s: &Subject<'_>) -> bool {
    s.ctx
        .best_expectation()
        .is_some_and(|best| (best - s.expectation).abs() <= GOOD_MOVE_EXPECTATION_DELTA)
}

fn rule_blunder(s: &Subject<'_>) -> bool {
    s.ctx.last_expectation - s.expectation > BLUNDER_MOVE_EXPECTATION_DELTA
}

fn rule_mistake(s: &Subject<'_>) -> bool {
    s.ctx.last_expectation - s.expectation > MISTAKE_MOVE_EXPECTATION_DELTA
}

fn rule_inaccuracy(s: &Subject<'_>) -> bool {
    s.ctx.last_expectation - s.expectation > INACCURACY_MOVE_EXPECTATION_DELTA
}

/// In check before the move, a promotion, or a move that ends the game.
pub fn is_trivial_move(before: &Chess, after: &Chess, mv: &Move) -> bool {
    before.is_check() || mv.promotion().is_some() || after.is_game_over()
}

/// Best-move test.
///
/// A listed move is best when it is reached, scanning candidates in rank
/// order, before the gap to the top candidate exceeds the delta. A move
/// missing from the list is best when its own expectation is at least the
/// top candidate's or within the delta of it.
pub fn is_best_move(candidates: &[CandidateMove], mv: &Move, expectation: f64) -> bool {
    let Some(best) = candidates.first().map(|c| c.expectation) else {
        return false;
    };

    let within_gap = candidates
        .iter()
        .take_while(|c| best - c.expectation <= BEST_MOVE_EXPECTATION_DELTA);
    for candidate in within_gap {
        if &candidate.mv == mv {
            return true;
        }
    }

    if candidates.iter().any(|c| &c.mv == mv) {
        return false;
    }

    expectation >= best || best - expectation <= BEST_MOVE_EXPECTATION_DELTA
}

/// An unlisted move that beats the top candidate by at least the delta.
pub fn is_brilliant_move(candidates: &[CandidateMove], mv: &Move, expectation: f64) -> bool {
    let Some(best) = candidates.first().map(|c| c.expectation) else {
        return false;
    };
    if candidates.iter().any(|c| &c.mv == mv) {
        return false;
    }

    expectation > best && expectation - best >= BRILLIANT_MOVE_EXPECTATION_DELTA
}

/// Best move in a position that has only one good move. Triviality is checked
/// by the caller.
pub fn is_critical_move(candidates: &[CandidateMove], mv: &Move, expectation: f64) -> bool {
    if !is_best_move(candidates, mv, expectation) {
        return false;
    }

    match candidates {
        [best, second, ..] => {
            best.expectation > second.expectation && has_only_one_good_move(candidates)
        }
        _ => false,
    }
}

pub fn has_only_one_good_move(candidates: &[CandidateMove]) -> bool {
    match candidates {
        [] => false,
        [_] => true,
        [best, second, ..] => {
            let (best, second) = (best.expectation, second.expectation);

            // Second best move is very bad and the best move is quite good
            if second <= ONLY_GOOD_MOVE_EPS && best >= ONLY_GOOD_MOVE_MIN_BEST {
                return true;
            }

            // Second best move is okay but the best move is way better
            second >= ONLY_GOOD_MOVE_MIN_SECOND && best >= ONLY_GOOD_MOVE_RATIO * second
        }
    }
}

// ---- Alternative moves ----

/// Alternatives offered next to the played move.
#[derive(Debug, Clone, Default)]
pub struct AlternativeSelection {
    pub moves: Vec<Move>,
    pub evaluated: Vec<EvaluatedMove>,
    /// Some selected alternative is a blunder, mistake or inaccuracy
    pub found_bad: bool,
}

/// Take up to two candidates other than `played`, in rank order, each
/// classified on its own expectation.
pub fn select_alternatives(
    ctx: &MoveContext<'_>,
    played: &Move,
    principal_to_move: bool,
) -> AlternativeSelection {
    let mut selection = AlternativeSelection::default();

    for candidate in ctx.candidates {
        if selection.moves.len() == MAX_ALTERNATIVES {
            break;
        }
        if &candidate.mv == played {
            continue;
        }

        let after = notation::after_move(ctx.before, &candidate.mv);
        let move_type = classify_move(ctx, &candidate.mv, &after, candidate.expectation);
        selection.found_bad |= move_type.is_bad();

        selection.evaluated.push(EvaluatedMove::new(
            ctx.before,
            &candidate.mv,
            move_type,
            &candidate.score,
            orient(candidate.expectation, principal_to_move),
            &candidate.pv,
        ));
        selection.moves.push(candidate.mv.clone());
    }

    selection
}

/// Whether the fallback scan should look for a bad alternative.
pub fn needs_bad_alternative(selection: &AlternativeSelection, played_type: MoveType) -> bool {
    !selection.found_bad && !played_type.is_bad() && selection.moves.len() == MAX_ALTERNATIVES
}

/// Scan the remaining legal moves one ply deep and put the best-expectation
/// bad move found into the second alternative slot. Stops at the first
/// inaccuracy or mistake. Returns whether the slot was replaced.
pub async fn find_bad_alternative<A: Analyzer + ?Sized>(
    engine: &mut A,
    ctx: &MoveContext<'_>,
    played: &Move,
    selection: &mut AlternativeSelection,
    principal_to_move: bool,
    limit: SearchLimit,
) -> Result<bool, AnnotatorError> {
    if selection.moves.len() < MAX_ALTERNATIVES {
        return Ok(false);
    }

    let ply = notation::ply(ctx.before);
    let turn = ctx.before.turn();
    let mut best_bad_expectation: Option<f64> = None;
    let mut replaced = false;

    for mv in ctx.before.legal_moves() {
        if &mv == played || selection.moves.contains(&mv) {
            continue;
        }

        let after = notation::after_move(ctx.before, &mv);
        let line = engine
            .analyze(&after, 1, limit)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AnnotatorError::EmptyAnalysis(notation::fen(&after)))?;

        let expectation = win_expectation(line.score.pov(turn), ply);
        let move_type = classify_move(ctx, &mv, &after, expectation);

        if move_type.is_bad() && best_bad_expectation.is_none_or(|best| expectation > best) {
            let mut pv = Vec::with_capacity(line.pv.len() + 1);
            pv.push(mv.clone());
            pv.extend(line.pv);

            selection.evaluated[1] = EvaluatedMove::new(
                ctx.before,
                &mv,
                move_type,
                &line.score,
                orient(expectation, principal_to_move),
                &pv,
            );
            selection.moves[1] = mv.clone();
            selection.found_bad = true;
            best_bad_expectation = Some(expectation);
            replaced = true;
        }

        // Any inaccuracy or mistake will do
        if matches!(move_type, MoveType::Inaccuracy | MoveType::Mistake) {
            break;
        }
    }

    debug!(replaced, ?best_bad_expectation, "Bad alternative scan finished");
    Ok(replaced)
}

// ---- Per-ply evaluation ----

/// Inputs for judging one played move.
#[derive(Debug, Clone, Copy)]
pub struct PlyInput<'a> {
    pub before: &'a Chess,
    pub after: &'a Chess,
    pub played: &'a Move,
    /// Analysis of `before`, best line first
    pub last_analysis: &'a [AnalysisLine],
    pub principal: Color,
    /// Principal player's expectation before the move
    pub last_expectation: f64,
    /// Principal player's expectation after the move
    pub new_expectation: f64,
    pub last_opponent_move_was_blunder: bool,
}

/// Outcome for one played move.
#[derive(Debug, Clone)]
pub struct MoveEvaluation {
    pub move_type: MoveType,
    pub alternatives: Vec<EvaluatedMove>,
}

/// Fallback scan settings.
#[derive(Debug, Clone, Copy)]
pub struct BadAlternativePolicy {
    pub enabled: bool,
    pub limit: SearchLimit,
}

fn prepare(input: &PlyInput<'_>) -> (Vec<CandidateMove>, bool) {
    let principal_to_move = input.before.turn() == input.principal;
    (candidates(input.last_analysis, input.before), principal_to_move)
}

/// Classify the played move and pick alternatives from the candidates only.
pub fn evaluate_move_sync(input: &PlyInput<'_>) -> MoveEvaluation {
    let (candidates, principal_to_move) = prepare(input);
    let ctx = MoveContext {
        before: input.before,
        candidates: &candidates,
        last_expectation: orient(input.last_expectation, principal_to_move),
        last_opponent_move_was_blunder: input.last_opponent_move_was_blunder,
    };

    let move_type = classify_move(
        &ctx,
        input.played,
        input.after,
        orient(input.new_expectation, principal_to_move),
    );
    let selection = select_alternatives(&ctx, input.played, principal_to_move);

    MoveEvaluation {
        move_type,
        alternatives: selection.evaluated,
    }
}

/// Classify the played move and pick alternatives, scanning further legal
/// moves for a bad alternative when the policy asks for one.
pub async fn evaluate_move<A: Analyzer + ?Sized>(
    engine: &mut A,
    input: &PlyInput<'_>,
    policy: BadAlternativePolicy,
) -> Result<MoveEvaluation, AnnotatorError> {
    let (candidates, principal_to_move) = prepare(input);
    let ctx = MoveContext {
        before: input.before,
        candidates: &candidates,
        last_expectation: orient(input.last_expectation, principal_to_move),
        last_opponent_move_was_blunder: input.last_opponent_move_was_blunder,
    };

    let move_type = classify_move(
        &ctx,
        input.played,
        input.after,
        orient(input.new_expectation, principal_to_move),
    );
    let mut selection = select_alternatives(&ctx, input.played, principal_to_move);

    if policy.enabled && needs_bad_alternative(&selection, move_type) {
        find_bad_alternative(
            engine,
            &ctx,
            input.played,
            &mut selection,
            principal_to_move,
            policy.limit,
        )
        .await?;
    }

    Ok(MoveEvaluation {
        move_type,
        alternatives: selection.evaluated,
    })
}
