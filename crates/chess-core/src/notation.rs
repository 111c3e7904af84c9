//! Move and position notation helpers on top of `shakmaty`.

use shakmaty::fen::{Epd, Fen};
use shakmaty::san::SanPlus;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Move, Position};

use crate::error::ChessCoreError;

/// Number of half-moves played since the start of the game.
/// Saturates for absurd fullmove counters.
pub fn ply(pos: &Chess) -> u32 {
    let full_moves = pos.fullmoves().get();
    (full_moves - 1)
        .saturating_mul(2)
        .saturating_add(u32::from(pos.turn() == Color::Black))
}

/// Full FEN of a position.
pub fn fen(pos: &Chess) -> String {
    Fen::from_position(pos, EnPassantMode::Legal).to_string()
}

/// EPD (FEN without move counters) of a position.
pub fn epd(pos: &Chess) -> String {
    Epd::from_position(pos, EnPassantMode::Legal).to_string()
}

/// Strips move counters from FEN, keeping only position + side + castling + ep.
pub fn normalize_fen(fen: &str) -> String {
    fen.split_whitespace().take(4).collect::<Vec<_>>().join(" ")
}

pub fn parse_fen(text: &str) -> Result<Chess, ChessCoreError> {
    let fen: Fen = text.trim().parse().map_err(|e| ChessCoreError::InvalidFen {
        fen: text.to_string(),
        reason: format!("{e}"),
    })?;
    fen.into_position::<Chess>(CastlingMode::Standard)
        .map_err(|e| ChessCoreError::InvalidFen {
            fen: text.to_string(),
            reason: format!("{e}"),
        })
}

/// Move in UCI notation, e.g. `e2e4` or `e7e8q`.
pub fn uci(mv: &Move) -> String {
    mv.to_uci(CastlingMode::Standard).to_string()
}

/// Parse a UCI move and check it is legal in `pos`.
pub fn parse_uci(pos: &Chess, text: &str) -> Result<Move, ChessCoreError> {
    let uci: UciMove = text
        .parse()
        .map_err(|_| ChessCoreError::InvalidUci(text.to_string()))?;
    uci.to_move(pos).map_err(|_| ChessCoreError::IllegalMove {
        mv: text.to_string(),
        fen: fen(pos),
    })
}

/// Parse a SAN move (check suffixes allowed) and check it is legal in `pos`.
pub fn parse_san(pos: &Chess, text: &str) -> Result<Move, ChessCoreError> {
    let san: SanPlus = text
        .trim()
        .parse()
        .map_err(|_| ChessCoreError::InvalidSan(text.to_string()))?;
    san.san.to_move(pos).map_err(|_| ChessCoreError::IllegalMove {
        mv: text.to_string(),
        fen: fen(pos),
    })
}

/// SAN of `mv` in `pos`, including the `+`/`#` suffix.
pub fn san(pos: &Chess, mv: &Move) -> String {
    let mut after = pos.clone();
    SanPlus::from_move_and_play_unchecked(&mut after, *mv).to_string()
}

/// Numbered SAN of a line starting at `pos`: `"12. Nf3 Nc6 13. d4"` or
/// `"12...Nc6 13. d4"` when Black moves first.
pub fn variation_san(pos: &Chess, moves: &[Move]) -> String {
    let mut pos = pos.clone();
    let mut parts: Vec<String> = Vec::with_capacity(moves.len());

    for (i, mv) in moves.iter().enumerate() {
        let number = pos.fullmoves().get();
        let turn = pos.turn();
        let san = SanPlus::from_move_and_play_unchecked(&mut pos, *mv);
        match turn {
            Color::White => parts.push(format!("{number}. {san}")),
            Color::Black if i == 0 => parts.push(format!("{number}...{san}")),
            Color::Black => parts.push(san.to_string()),
        }
    }

    parts.join(" ")
}

/// Copy of `pos` with `mv` applied. `mv` must be legal in `pos`.
pub fn after_move(pos: &Chess, mv: &Move) -> Chess {
    let mut after = pos.clone();
    after.play_unchecked(*mv);
    after
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ply_counting() {
        let start = Chess::default();
        assert_eq!(ply(&start), 0);

        let e4 = parse_san(&start, "e4").unwrap();
        let after = after_move(&start, &e4);
        assert_eq!(ply(&after), 1);

        let e5 = parse_san(&after, "e5").unwrap();
        assert_eq!(ply(&after_move(&after, &e5)), 2);
    }

    #[test]
    fn test_ply_saturates_on_huge_move_counter() {
        let pos = parse_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 4294967295").unwrap();
        assert_eq!(ply(&pos), u32::MAX);
        let pos = parse_fen("4k3/8/8/8/8/8/8/4K3 b - - 0 4294967295").unwrap();
        assert_eq!(ply(&pos), u32::MAX);
    }

    #[test]
    fn test_uci_and_san() {
        let start = Chess::default();
        let mv = parse_uci(&start, "g1f3").unwrap();
        assert_eq!(uci(&mv), "g1f3");
        assert_eq!(san(&start, &mv), "Nf3");
    }

    #[test]
    fn test_san_with_check_suffix() {
        let pos = parse_fen("4k3/8/8/8/8/8/8/R3K3 w - - 0 1").unwrap();
        let mv = parse_uci(&pos, "a1a8").unwrap();
        assert_eq!(san(&pos, &mv), "Ra8+");
    }

    #[test]
    fn test_variation_san_white_first() {
        let start = Chess::default();
        let e4 = parse_uci(&start, "e2e4").unwrap();
        let p1 = after_move(&start, &e4);
        let e5 = parse_uci(&p1, "e7e5").unwrap();
        let p2 = after_move(&p1, &e5);
        let nf3 = parse_uci(&p2, "g1f3").unwrap();
        assert_eq!(variation_san(&start, &[e4, e5, nf3]), "1. e4 e5 2. Nf3");
    }

    #[test]
    fn test_variation_san_black_first() {
        let start = Chess::default();
        let e4 = parse_uci(&start, "e2e4").unwrap();
        let p1 = after_move(&start, &e4);
        let e5 = parse_uci(&p1, "e7e5").unwrap();
        let p2 = after_move(&p1, &e5);
        let nf3 = parse_uci(&p2, "g1f3").unwrap();
        assert_eq!(variation_san(&p1, &[e5, nf3]), "1...e5 2. Nf3");
        assert_eq!(variation_san(&p1, &[]), "");
    }

    #[test]
    fn test_illegal_uci_rejected() {
        let start = Chess::default();
        assert!(matches!(
            parse_uci(&start, "e2e5"),
            Err(ChessCoreError::IllegalMove { .. })
        ));
        assert!(matches!(
            parse_uci(&start, "zz"),
            Err(ChessCoreError::InvalidUci(_))
        ));
    }

    #[test]
    fn test_normalize_fen() {
        assert_eq!(
            normalize_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq -"
        );
    }

    #[test]
    fn test_epd_matches_normalized_fen() {
        let start = Chess::default();
        assert_eq!(epd(&start), normalize_fen(&fen(&start)));
    }
}
