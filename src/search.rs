//! Negamax search with alpha-beta pruning.
//!
//! The engine works on a single scratch copy of the caller's position: every
//! move is applied in place and taken back before the next sibling is tried,
//! so the search leaves no trace on the position it was given.
//!
//! With a time limit configured, the engine deepens iteratively from depth 1
//! to the depth bound and answers with the deepest iteration that finished.
//! The first iteration always runs to completion.

use std::time::Instant;

use log::{debug, trace};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::eval::evaluate;
use crate::game::{GameState, MetaMove, PossibleMoves};

/// Bound for alpha-beta windows. Negating it stays in range.
pub const INF: i32 = i32::MAX;

/// Outcome of a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchResult {
    pub best_move: MetaMove,
    /// Score of `best_move` for the side to move.
    pub score: i32,
    /// Depth of the deepest completed iteration.
    pub depth: u8,
    /// Nodes visited, including interrupted iterations.
    pub nodes: u64,
}

/// The deadline passed in the middle of an iteration.
#[derive(Debug)]
struct Timeout;

pub struct Engine {
    config: EngineConfig,
    nodes: u64,
    deadline: Option<Instant>,
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Engine {
            config,
            nodes: 0,
            deadline: None,
        }
    }

    /// Best move for the side to move in `state`.
    pub fn compute_next_move(&mut self, state: &GameState) -> Result<MetaMove, EngineError> {
        self.search(state).map(|result| result.best_move)
    }

    pub fn search(&mut self, state: &GameState) -> Result<SearchResult, EngineError> {
        if let Some(result) = state.winner() {
            return Err(EngineError::InvalidState(format!(
                "game is already decided: {result:?}"
            )));
        }
        let legal_moves = state.legal_moves().len();
        if legal_moves == 0 {
            return Err(EngineError::InvalidState("no legal moves".to_string()));
        }

        let max_depth = self.config.depth_for(state.empty_cells()).max(1);
        let time_limit = self.config.time_limit();
        let first_depth = if time_limit.is_some() { 1 } else { max_depth };
        let start = Instant::now();

        let mut scratch = state.clone();
        let mut completed: Option<SearchResult> = None;
        self.nodes = 0;

        for depth in first_depth..=max_depth {
            self.deadline = match (&completed, time_limit) {
                (Some(_), Some(limit)) => Some(start + limit),
                _ => None,
            };

            let (score, best_move) = match self.negamax(&mut scratch, depth, -INF, INF) {
                Ok(outcome) => outcome,
                Err(Timeout) => {
                    trace!(
                        "depth {depth} interrupted after {} nodes, {:.2?}",
                        self.nodes,
                        start.elapsed()
                    );
                    break;
                }
            };
            let best_move = best_move.ok_or(EngineError::SearchInvariant { legal_moves })?;

            debug!(
                "depth {depth}: best move {best_move}, score {score}, {} nodes, {:.2?}",
                self.nodes,
                start.elapsed()
            );
            completed = Some(SearchResult {
                best_move,
                score,
                depth,
                nodes: self.nodes,
            });

            if score >= self.config.weights.win {
                break;
            }
        }
        self.deadline = None;

        debug_assert_eq!(&scratch, state);
        completed
            .map(|result| SearchResult {
                nodes: self.nodes,
                ..result
            })
            .ok_or(EngineError::SearchInvariant { legal_moves })
    }

    /// Score of `state` for the side to move, and the move achieving it.
    /// Among equally scored moves the first one generated wins.
    fn negamax(
        &mut self,
        state: &mut GameState,
        depth: u8,
        mut alpha: i32,
        beta: i32,
    ) -> Result<(i32, Option<MetaMove>), Timeout> {
        self.nodes += 1;
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(Timeout);
            }
        }

        if depth == 0 || state.is_terminal() {
            return Ok((evaluate(state, &self.config.weights), None));
        }

        let mut possible_moves = PossibleMoves::new();
        state.get_possible_moves(&mut possible_moves);
        if possible_moves.is_empty() {
            return Ok((evaluate(state, &self.config.weights), None));
        }

        let mut best_score = -INF;
        let mut best_move = None;
        for mv in possible_moves {
            let undo = state.apply(mv);
            let child = self.negamax(state, depth - 1, -beta, -alpha);
            state.undo(undo);

            let score = -child?.0;
            if score > best_score {
                best_score = score;
                best_move = Some(mv);
            }
            alpha = alpha.max(score);
            if alpha >= beta {
                break;
            }
        }
        Ok((best_score, best_move))
    }
}

/// Best move for the side to move, with the default configuration.
pub fn compute_next_move(state: &GameState) -> Result<MetaMove, EngineError> {
    Engine::default().compute_next_move(state)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::eval::EvalWeights;
    use crate::game::{GameResult, PlayerMarker};

    /// Plain negamax without pruning, copying the position at every node.
    fn minimax(state: &GameState, depth: u8, weights: &EvalWeights) -> (i32, Option<MetaMove>) {
        let moves = state.legal_moves();
        if depth == 0 || state.is_terminal() || moves.is_empty() {
            return (evaluate(state, weights), None);
        }
        let mut best = (-INF, None);
        for mv in moves {
            let mut child = state.clone();
            child.play(mv).unwrap();
            let score = -minimax(&child, depth - 1, weights).0;
            if score > best.0 {
                best = (score, Some(mv));
            }
        }
        best
    }

    fn random_position(rng: &mut StdRng) -> GameState {
        loop {
            let mut state = GameState::new();
            let plies = rng.gen_range(8..40);
            for _ in 0..plies {
                let moves = state.legal_moves();
                match moves.choose(rng) {
                    Some(&mv) => {
                        state.play(mv).unwrap();
                    }
                    None => break,
                }
            }
            if !state.is_terminal() {
                return state;
            }
        }
    }

    fn engine_at_depth(depth: u8) -> Engine {
        Engine::new(EngineConfig::default().with_fixed_depth(depth))
    }

    #[test]
    fn test_pruning_matches_minimax() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let weights = EvalWeights::default();
        for _ in 0..25 {
            let state = random_position(&mut rng);
            for depth in 1..=3 {
                let result = engine_at_depth(depth).search(&state).unwrap();
                let (score, best_move) = minimax(&state, depth, &weights);
                assert_eq!(
                    (result.score, Some(result.best_move)),
                    (score, best_move),
                    "position {} at depth {depth}",
                    state.to_notation()
                );
            }
        }
    }

    #[test]
    fn test_pruning_saves_nodes() {
        let state: GameState = "\
            XX......./OO.O...../........./\
            ........./X...O..../........./\
            ........./........./......... x 4"
            .parse()
            .unwrap();
        let result = engine_at_depth(4).search(&state).unwrap();

        fn count(state: &GameState, depth: u8) -> u64 {
            if depth == 0 || state.is_terminal() {
                return 1;
            }
            1 + state
                .legal_moves()
                .iter()
                .map(|&mv| {
                    let mut child = state.clone();
                    child.play(mv).unwrap();
                    count(&child, depth - 1)
                })
                .sum::<u64>()
        }
        assert!(result.nodes < count(&state, 4));
    }

    #[test]
    fn test_empty_board_depth_two() {
        let state = GameState::new();
        let result = engine_at_depth(2).search(&state).unwrap();
        assert!(state.check_move(result.best_move).is_ok());
        assert!(result.best_move.board < 9 && result.best_move.cell < 9);
        assert_eq!(result.depth, 2);

        let (score, best_move) = minimax(&state, 2, &EvalWeights::default());
        assert_eq!(Some(result.best_move), best_move);
        assert_eq!(result.score, score);
    }

    #[test]
    fn test_finds_winning_move() {
        // X holds boards 0 and 1 and needs one more X on board 2.
        let state: GameState = "\
            XXX....../XXX....../XX.OO..../\
            OO......./OO......./........./\
            ........./........./......... x 2"
            .parse()
            .unwrap();
        for depth in 1..=3 {
            let result = engine_at_depth(depth).search(&state).unwrap();
            assert_eq!(result.best_move, MetaMove::new(2, 2));
            assert_eq!(result.score, EvalWeights::default().win);
        }
    }

    #[test]
    fn test_avoids_handing_over_free_choice() {
        // O holds boards 0 and 1 and threatens cell 2 of board 2. Playing on
        // cell 0 or 1 sends O to a decided board, which frees O to take it.
        let state: GameState = "\
            OOO....../OOO....../....O.O.X/\
            XX......./XX......./XX......./\
            ........./........./......... x 2"
            .parse()
            .unwrap();
        let win = EvalWeights::default().win;

        let mut losing = state.clone();
        losing.play(MetaMove::new(2, 0)).unwrap();
        assert_eq!(losing.forced_board(), None);
        assert_eq!(engine_at_depth(1).search(&losing).unwrap().score, win);

        let result = engine_at_depth(2).search(&state).unwrap();
        assert!(result.score > -win);
        assert!(![0, 1].contains(&result.best_move.cell));
    }

    #[test]
    fn test_is_deterministic() {
        let mut rng = StdRng::seed_from_u64(7);
        let state = random_position(&mut rng);
        let before = state.clone();
        let mut engine = engine_at_depth(3);
        let first = engine.compute_next_move(&state).unwrap();
        let second = engine.compute_next_move(&state).unwrap();
        assert_eq!(first, second);
        assert_eq!(state, before);
    }

    #[test]
    fn test_rejects_finished_game() {
        let state: GameState = format!("XXX......XXX......XXX......{} o -", ".".repeat(54))
            .parse()
            .unwrap();
        assert_eq!(state.winner(), Some(GameResult::Won(PlayerMarker::X)));
        assert!(matches!(
            compute_next_move(&state),
            Err(EngineError::InvalidState(_))
        ));
    }

    #[test]
    fn test_rejects_drawn_game() {
        let mut state: GameState = "\
            XXX....../XXX....../OOO....../\
            OOO....../OOO....../XXX....../\
            XXX....../XOXXOOOXX/XOXXOOOX. x 8"
            .parse()
            .unwrap();
        let result = engine_at_depth(3).search(&state).unwrap();
        assert_eq!(result.best_move, MetaMove::new(8, 8));
        assert_eq!(result.score, 0);

        state.play(result.best_move).unwrap();
        assert_eq!(state.winner(), Some(GameResult::Drawn));
        assert!(matches!(
            compute_next_move(&state),
            Err(EngineError::InvalidState(_))
        ));
    }

    #[test]
    fn test_time_limit_returns_completed_iteration() {
        let config = EngineConfig::default()
            .with_fixed_depth(12)
            .with_time_limit(Duration::from_millis(30));
        let state = GameState::new();
        let result = Engine::new(config).search(&state).unwrap();
        assert!(result.depth >= 1 && result.depth <= 12);
        assert!(state.check_move(result.best_move).is_ok());
    }

    #[test]
    fn test_iterative_deepening_matches_fixed_depth() {
        let mut rng = StdRng::seed_from_u64(11);
        let state = random_position(&mut rng);
        let config = EngineConfig::default()
            .with_fixed_depth(3)
            .with_time_limit(Duration::from_secs(600));
        let deepened = Engine::new(config).search(&state).unwrap();
        let direct = engine_at_depth(3).search(&state).unwrap();
        if deepened.depth == 3 {
            assert_eq!(deepened.best_move, direct.best_move);
            assert_eq!(deepened.score, direct.score);
        } else {
            // Stopped early on a forced win.
            assert!(deepened.score >= EvalWeights::default().win);
        }
    }
}
