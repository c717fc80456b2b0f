//! Static evaluation of meta tic-tac-toe positions.
//!
//! Scores are built from X's point of view and then turned towards the side
//! to move, which is what negamax expects.

use crate::game::{GameResult, GameState, PlayerMarker, BOARD_SIZE_SQUARED};

/// Relative weights of the evaluation terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EvalWeights {
    /// Magnitude of a won game.
    pub win: i32,
    /// Per open line on an undecided mini-board.
    pub mini_line: i32,
    /// Per mini-board won.
    pub mini_win: i32,
    /// Per open line of won mini-boards on the meta-board.
    pub meta_line: i32,
}

impl Default for EvalWeights {
    fn default() -> Self {
        EvalWeights {
            win: 1000,
            mini_line: 1,
            mini_win: 10,
            meta_line: 15,
        }
    }
}

/// Open lines (X minus O) summed over all mini-boards that are still undecided.
pub fn mini_line_balance(state: &GameState) -> i32 {
    let meta = state.meta();
    (0..BOARD_SIZE_SQUARED)
        .filter(|&index| !meta.is_decided(index))
        .map(|index| {
            let board = &meta.sub_boards[index];
            board.open_lines(PlayerMarker::X) - board.open_lines(PlayerMarker::O)
        })
        .sum()
}

/// Mini-boards won by X minus mini-boards won by O.
pub fn mini_win_balance(state: &GameState) -> i32 {
    let meta = state.meta();
    (0..BOARD_SIZE_SQUARED)
        .map(|index| match meta.mini_win(index) {
            Some(GameResult::Won(player)) => player.sign(),
            _ => 0,
        })
        .sum()
}

/// Open lines (X minus O) on the board of mini-win markers.
pub fn meta_line_balance(state: &GameState) -> i32 {
    let markers = &state.meta().board;
    markers.open_lines(PlayerMarker::X) - markers.open_lines(PlayerMarker::O)
}

/// Score of `state` relative to the side to move: positive is good for the
/// player about to play.
pub fn evaluate(state: &GameState, weights: &EvalWeights) -> i32 {
    let score = match state.winner() {
        Some(GameResult::Won(player)) => weights.win * player.sign(),
        Some(GameResult::Drawn) => 0,
        None => {
            mini_line_balance(state) * weights.mini_line
                + mini_win_balance(state) * weights.mini_win
                + meta_line_balance(state) * weights.meta_line
        }
    };
    score * state.side_to_move().sign()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::MetaMove;

    fn empty_with(cells: &str, side: char) -> GameState {
        format!("{cells}{} {side} -", ".".repeat(81 - cells.len()))
            .parse()
            .unwrap()
    }

    #[test]
    fn test_empty_board_is_even() {
        let state = GameState::new();
        assert_eq!(evaluate(&state, &EvalWeights::default()), 0);
    }

    #[test]
    fn test_two_in_a_row_counts_once() {
        let state = empty_with("XX.......", 'o');
        let board = &state.meta().sub_boards[0];
        assert_eq!(board.open_lines(PlayerMarker::X), 1);
        assert_eq!(board.open_lines(PlayerMarker::O), 0);
        assert_eq!(mini_line_balance(&state), 1);
        // O to move sees X's threat as a negative.
        assert_eq!(evaluate(&state, &EvalWeights::default()), -1);
    }

    #[test]
    fn test_decided_boards_have_no_potential() {
        // X won board 0 on the middle row while also holding 0 and 1.
        let state = empty_with("XX.XXX...", 'o');
        assert!(state.meta().is_decided(0));
        assert_eq!(mini_line_balance(&state), 0);
        assert_eq!(mini_win_balance(&state), 1);
    }

    #[test]
    fn test_meta_open_line() {
        let state = empty_with("XXX......XXX......", 'o');
        assert_eq!(state.meta().board.open_lines(PlayerMarker::X), 1);
        assert_eq!(meta_line_balance(&state), 1);
        assert_eq!(mini_win_balance(&state), 2);
        assert_eq!(mini_line_balance(&state), 0);
        assert_eq!(evaluate(&state, &EvalWeights::default()), -(2 * 10 + 15));
    }

    #[test]
    fn test_score_flips_with_side_to_move() {
        let x_to_move = empty_with("OO.......", 'x');
        let o_to_move = empty_with("OO.......", 'o');
        let weights = EvalWeights::default();
        assert_eq!(evaluate(&x_to_move, &weights), -1);
        assert_eq!(evaluate(&o_to_move, &weights), 1);
    }

    #[test]
    fn test_drawn_game_scores_zero() {
        let mut state: GameState = "\
            XXX....../XXX....../OOO....../\
            OOO....../OOO....../XXX....../\
            XXX....../XOXXOOOXX/XOXXOOOX. x 8"
            .parse()
            .unwrap();
        state.play(MetaMove::new(8, 8)).unwrap();
        assert_eq!(state.winner(), Some(GameResult::Drawn));
        // X still holds more boards, but a finished draw is worth nothing.
        assert_ne!(mini_win_balance(&state), 0);
        assert_eq!(evaluate(&state, &EvalWeights::default()), 0);
    }

    #[test]
    fn test_won_game_scores_against_side_to_move() {
        let state = empty_with("XXX......XXX......XXX......", 'o');
        assert_eq!(state.winner(), Some(GameResult::Won(PlayerMarker::X)));
        assert_eq!(evaluate(&state, &EvalWeights::default()), -1000);
    }

    #[test]
    fn test_custom_weights() {
        let state = empty_with("XXX......XX.......", 'x');
        let weights = EvalWeights {
            mini_line: 2,
            mini_win: 100,
            ..EvalWeights::default()
        };
        assert_eq!(evaluate(&state, &weights), 2 + 100);
    }
}
