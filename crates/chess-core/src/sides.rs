//! Player names, sides and the game intake filter.

use shakmaty::Color;

use crate::game_data::GameData;
use crate::pgn;

/// Normalise a player name to `"Last, First"`.
///
/// `"Magnus Carlsen"` and `"Carlsen,Magnus."` both become `"Carlsen, Magnus"`.
/// A missing first name is rendered as `?`.
pub fn normalize_player_name(name: &str) -> String {
    let name = name.trim();

    let (last, first) = if name.contains(',') {
        let compact = name.replace(", ", ",");
        let compact = compact.strip_suffix('.').unwrap_or(&compact);
        let mut parts = compact.splitn(2, ',');
        let last = parts.next().unwrap_or_default().trim().to_string();
        let first = parts.next().unwrap_or_default().trim().to_string();
        (last, first)
    } else {
        match name.rsplit_once(' ') {
            Some((first, last)) => (last.to_string(), first.trim().to_string()),
            None => (name.to_string(), String::new()),
        }
    };

    let first = if first.is_empty() { "?".to_string() } else { first };
    format!("{last}, {first}")
}

/// Side played by `player` in `game`: Black when the normalised Black name matches,
/// White otherwise.
pub fn principal_side(player: &str, game: &GameData) -> Color {
    if normalize_player_name(&game.metadata.black) == normalize_player_name(player) {
        Color::Black
    } else {
        Color::White
    }
}

/// Winner of a game from its PGN result tag; `None` for draws and unfinished games.
pub fn winner_side(result: &str) -> Option<Color> {
    match result.trim() {
        "1-0" => Some(Color::White),
        "0-1" => Some(Color::Black),
        _ => None,
    }
}

pub fn did_player_win(player: &str, game: &GameData) -> bool {
    winner_side(&game.metadata.result) == Some(principal_side(player, game))
}

/// A game is usable when its moves replay legally, it is standard chess
/// and `player` won it.
pub fn is_game_valid(player: &str, game: &GameData) -> bool {
    if pgn::replay(&game.moves).is_err() {
        return false;
    }
    pgn::is_standard_chess(&game.metadata) && did_player_win(player, game)
}

/// Normalise both player names and replace unknown date parts.
pub fn preprocess_game(game: &mut GameData) {
    game.metadata.white = normalize_player_name(&game.metadata.white);
    game.metadata.black = normalize_player_name(&game.metadata.black);
    game.metadata.date = game.metadata.date.replace("??", "01");
}
