use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChessCoreError {
    #[error("Invalid FEN '{fen}': {reason}")]
    InvalidFen { fen: String, reason: String },

    #[error("Invalid SAN move '{0}'")]
    InvalidSan(String),

    #[error("Illegal move '{mv}' in position {fen}")]
    IllegalMove { mv: String, fen: String },

    #[error("Invalid UCI move '{0}'")]
    InvalidUci(String),

    #[error("Opening table error: {0}")]
    OpeningTable(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
