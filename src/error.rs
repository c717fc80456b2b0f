use std::path::PathBuf;

/// Reasons the validated move operation rejects a move.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("the game is already over")]
    GameOver,

    #[error("index out of range: board {board}, cell {cell}")]
    OutOfRange { board: usize, cell: usize },

    #[error("must play in board {expected}, not board {got}")]
    WrongBoard { expected: usize, got: usize },

    #[error("board {0} is already decided")]
    BoardDecided(usize),

    #[error("cell {cell} of board {board} is already taken")]
    Occupied { board: usize, cell: usize },
}

/// Errors raised by the search engine.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The engine was asked to move in a finished or move-less position.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// No candidate improved the initial bound although legal moves exist.
    #[error("search produced no move from {legal_moves} legal moves")]
    SearchInvariant { legal_moves: usize },
}

/// Errors raised while a player picks a move.
#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("input closed before a move was entered")]
    InputClosed,

    #[error("no legal moves to choose from")]
    NoMoves,
}

/// Errors that can occur while parsing a textual position.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PositionError {
    #[error("expected 3 fields (cells, side to move, forced board), found {0}")]
    FieldCount(usize),

    #[error("expected 81 cells, found {0}")]
    CellCount(usize),

    #[error("unexpected cell character '{0}'")]
    BadCell(char),

    #[error("unexpected side to move '{0}'")]
    BadSide(String),

    #[error("unexpected forced board '{0}'")]
    BadForcedBoard(String),

    #[error("board {0} has three in a row for both players")]
    DoubleWin(usize),

    #[error("both players hold a line of won boards")]
    DoubleMetaWin,

    #[error("forced board {0} is already decided")]
    ForcedBoardDecided(usize),
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_error_display() {
        let err = MoveError::WrongBoard { expected: 4, got: 2 };
        assert_eq!(err.to_string(), "must play in board 4, not board 2");
    }

    #[test]
    fn test_engine_error_display() {
        let err = EngineError::InvalidState("game already won by X".to_string());
        assert_eq!(err.to_string(), "invalid state: game already won by X");
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Validation("depth.slope must be <= 0".to_string());
        assert_eq!(
            err.to_string(),
            "config validation error: depth.slope must be <= 0"
        );
    }
}
