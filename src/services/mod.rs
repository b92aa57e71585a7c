/// Career statistics across a player's games.
pub mod career_service;
/// Game lifecycle, roster, lineup and substitutions.
pub mod game_service;
/// Player action recording, undo and per-game statistics.
pub mod stats_service;
