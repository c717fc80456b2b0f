//! Move selection for meta tic-tac-toe: nine tic-tac-toe boards laid out as a
//! larger one. The cell a player picks decides which board the opponent must
//! play in next, and three boards won in a line win the game.
//!
//! The engine searches the game tree with negamax and alpha-beta pruning,
//! scoring leaf positions with a small hand-tuned evaluation.

pub mod config;
pub mod depth;
pub mod error;
pub mod eval;
pub mod game;
pub mod player;
pub mod search;

pub use config::EngineConfig;
pub use error::{ConfigError, EngineError, MoveError, PlayerError, PositionError};
pub use game::{GameResult, GameState, MetaMove, PlayerMarker};
pub use search::{compute_next_move, Engine, SearchResult};
