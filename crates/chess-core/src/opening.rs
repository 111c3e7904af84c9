//! ECO opening identification by exact position lookup.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use shakmaty::{Chess, Move, Position};
use tracing::{debug, info};

use crate::error::ChessCoreError;
use crate::notation;

/// One row of an ECO table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opening {
    pub eco: String,
    pub name: String,
    pub fen: String,
    /// Space-separated moves of the opening line.
    pub moves: String,
}

impl Opening {
    /// Length of the opening line in half-moves.
    pub fn ply_length(&self) -> usize {
        self.moves.split_whitespace().count()
    }
}

/// Opening table indexed by EPD.
#[derive(Debug, Default)]
pub struct OpeningBook {
    by_epd: HashMap<String, Opening>,
}

impl OpeningBook {
    /// Load every `*.tsv` table in `dir`.
    pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Self, ChessCoreError> {
        let pattern = format!("{}/*.tsv", dir.as_ref().display());
        let paths = glob::glob(&pattern).map_err(|e| ChessCoreError::OpeningTable(e.to_string()))?;

        let mut book = Self::default();
        let mut files = 0;
        for path in paths {
            let path = path.map_err(|e| ChessCoreError::OpeningTable(e.to_string()))?;
            let text = fs::read_to_string(&path)?;
            let added = book.add_table(&text)?;
            debug!(path = %path.display(), openings = added, "Loaded ECO table");
            files += 1;
        }

        info!(files, positions = book.len(), "Opening book ready");
        Ok(book)
    }

    /// Add the rows of one tab-separated table. Returns the number of rows read.
    ///
    /// The header row must name `eco`, `name`, a position column (`fen` or `epd`)
    /// and a moves column (`moves` or `uci`). The first row for a position wins.
    pub fn add_table(&mut self, text: &str) -> Result<usize, ChessCoreError> {
        let mut lines = text.lines().filter(|l| !l.trim().is_empty());
        let header: Vec<&str> = lines
            .next()
            .ok_or_else(|| ChessCoreError::OpeningTable("empty table".to_string()))?
            .split('\t')
            .map(str::trim)
            .collect();

        let column = |names: &[&str]| -> Result<usize, ChessCoreError> {
            header
                .iter()
                .position(|h| names.contains(h))
                .ok_or_else(|| ChessCoreError::OpeningTable(format!("missing column {}", names.join("/"))))
        };
        let eco_col = column(&["eco"])?;
        let name_col = column(&["name"])?;
        let fen_col = column(&["fen", "epd"])?;
        let moves_col = column(&["moves", "uci"])?;

        let mut rows = 0;
        for (line_no, line) in lines.enumerate() {
            let fields: Vec<&str> = line.split('\t').collect();
            let field = |col: usize| -> Result<String, ChessCoreError> {
                fields.get(col).map(|f| f.trim().to_string()).ok_or_else(|| {
                    ChessCoreError::OpeningTable(format!("row {} has too few columns", line_no + 2))
                })
            };

            let opening = Opening {
                eco: field(eco_col)?,
                name: field(name_col)?,
                fen: field(fen_col)?,
                moves: field(moves_col)?,
            };
            self.by_epd
                .entry(notation::normalize_fen(&opening.fen))
                .or_insert(opening);
            rows += 1;
        }

        Ok(rows)
    }

    pub fn len(&self) -> usize {
        self.by_epd.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_epd.is_empty()
    }

    pub fn lookup(&self, pos: &Chess) -> Option<&Opening> {
        self.by_epd.get(&notation::epd(pos))
    }

    /// The last table opening reached while replaying `moves` from the start position.
    pub fn identify(&self, moves: &[Move]) -> Option<&Opening> {
        let mut pos = Chess::default();
        let mut opening = None;

        for mv in moves {
            pos.play_unchecked(*mv);
            if let Some(found) = self.lookup(&pos) {
                opening = Some(found);
            }
        }

        opening
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pgn;

    const TABLE: &str = "eco\tname\tfen\tmoves
C20\tKing's Pawn Game\trnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq -\te2e4 e7e5
C40\tKing's Knight Opening\trnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKBNR b KQkq -\te2e4 e7e5 g1f3
C44\tKing's Pawn Game: Tayler Opening\tr1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq -\te2e4 e7e5 g1f3 b8c6
";

    #[test]
    fn test_identify_last_matching_opening() {
        let mut book = OpeningBook::default();
        assert_eq!(book.add_table(TABLE).unwrap(), 3);

        let san: Vec<String> = ["e4", "e5", "Nf3", "Nc6", "Bc4", "Bc5"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let moves = pgn::replay(&san).unwrap();

        let opening = book.identify(&moves).unwrap();
        assert_eq!(opening.eco, "C44");
        assert_eq!(opening.ply_length(), 4);
    }

    #[test]
    fn test_unknown_opening() {
        let mut book = OpeningBook::default();
        book.add_table(TABLE).unwrap();

        let san = vec!["d4".to_string(), "d5".to_string()];
        let moves = pgn::replay(&san).unwrap();
        assert!(book.identify(&moves).is_none());
    }

    #[test]
    fn test_epd_and_uci_columns() {
        let table = "eco\tname\tpgn\tuci\tepd
B00\tKing's Pawn\t1. e4\te2e4\trnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq -
";
        let mut book = OpeningBook::default();
        book.add_table(table).unwrap();
        let moves = pgn::replay(&["e4".to_string()]).unwrap();
        assert_eq!(book.identify(&moves).map(|o| o.eco.as_str()), Some("B00"));
    }

    #[test]
    fn test_missing_column_is_error() {
        let mut book = OpeningBook::default();
        assert!(matches!(
            book.add_table("eco\tname\n"),
            Err(ChessCoreError::OpeningTable(_))
        ));
    }
}
