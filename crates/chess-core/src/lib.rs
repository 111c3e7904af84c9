//! Chess rules helpers shared by the annotator and the API server.
//!
//! Everything here delegates legality and notation to `shakmaty`; this crate
//! only adapts game records, names and opening tables to the shapes the
//! annotator needs.

pub mod error;
pub mod game_data;
pub mod notation;
pub mod opening;
pub mod pgn;
pub mod sides;

pub use error::ChessCoreError;
pub use game_data::{GameData, GameMetadata};
pub use opening::{Opening, OpeningBook};
