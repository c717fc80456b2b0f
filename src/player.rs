use std::io::{self, BufRead};

use log::info;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::config::EngineConfig;
use crate::error::PlayerError;
use crate::game::{GameState, MetaMove};
use crate::search::Engine;

pub trait Player {
    fn get_move(&mut self, state: &GameState) -> Result<MetaMove, PlayerError>;
}

// ##############################
// # RandomPlayer
// ##############################

/// Plays a uniformly random legal move.
pub struct RandomPlayer {
    rng: StdRng,
}

impl RandomPlayer {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        RandomPlayer { rng }
    }
}

impl Player for RandomPlayer {
    fn get_move(&mut self, state: &GameState) -> Result<MetaMove, PlayerError> {
        state
            .legal_moves()
            .choose(&mut self.rng)
            .copied()
            .ok_or(PlayerError::NoMoves)
    }
}

// ##############################
// # EnginePlayer
// ##############################

pub struct EnginePlayer {
    engine: Engine,
}

impl EnginePlayer {
    pub fn new(config: EngineConfig) -> Self {
        EnginePlayer {
            engine: Engine::new(config),
        }
    }
}

impl Player for EnginePlayer {
    fn get_move(&mut self, state: &GameState) -> Result<MetaMove, PlayerError> {
        let result = self.engine.search(state)?;
        info!(
            "engine plays {} (score {}, depth {}, {} nodes)",
            result.best_move, result.score, result.depth, result.nodes
        );
        Ok(result.best_move)
    }
}

// ##############################
// # HumanPlayer
// ##############################

enum Input {
    /// Locked per line, so two players can share the terminal.
    Stdin(io::Stdin),
    Reader(Box<dyn BufRead>),
}

impl Input {
    fn read_line(&mut self, buf: &mut String) -> io::Result<usize> {
        match self {
            Input::Stdin(stdin) => stdin.read_line(buf),
            Input::Reader(reader) => reader.read_line(buf),
        }
    }
}

/// Reads moves from a line-based input. A line is either the number of an
/// entry in the printed move list, or a board and a cell separated by
/// whitespace.
pub struct HumanPlayer {
    input: Input,
}

impl HumanPlayer {
    pub fn stdin() -> Self {
        HumanPlayer {
            input: Input::Stdin(io::stdin()),
        }
    }

    pub fn new(reader: impl BufRead + 'static) -> Self {
        HumanPlayer {
            input: Input::Reader(Box::new(reader)),
        }
    }

    fn parse_line(line: &str, possible_moves: &[MetaMove]) -> Option<MetaMove> {
        let numbers: Vec<usize> = line
            .split_whitespace()
            .map(str::parse::<usize>)
            .collect::<Result<_, _>>()
            .ok()?;
        let chosen = match numbers.as_slice() {
            [index] => *possible_moves.get(*index)?,
            [board, cell] => MetaMove::new(*board, *cell),
            _ => return None,
        };
        possible_moves.contains(&chosen).then_some(chosen)
    }
}

impl Player for HumanPlayer {
    fn get_move(&mut self, state: &GameState) -> Result<MetaMove, PlayerError> {
        let possible_moves = state.legal_moves();
        if possible_moves.is_empty() {
            return Err(PlayerError::NoMoves);
        }

        let mut line = String::new();
        loop {
            for (i, mv) in possible_moves.iter().enumerate() {
                println!("{i}: {mv}");
            }
            println!("Enter your move: ");

            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                return Err(PlayerError::InputClosed);
            }
            if let Some(mv) = Self::parse_line(line.trim(), &possible_moves) {
                return Ok(mv);
            }
            println!("Invalid move!");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn test_random_player_is_legal_and_seeded() {
        let state = GameState::new();
        let mut first = RandomPlayer::new(Some(3));
        let mut second = RandomPlayer::new(Some(3));
        for _ in 0..10 {
            let mv = first.get_move(&state).unwrap();
            assert!(state.check_move(mv).is_ok());
            assert_eq!(second.get_move(&state).unwrap(), mv);
        }
    }

    #[test]
    fn test_human_player_reads_index_and_pair() {
        let mut state = GameState::new();
        state.play(MetaMove::new(0, 5)).unwrap();

        let mut player = HumanPlayer::new(Cursor::new("2\n"));
        assert_eq!(player.get_move(&state).unwrap(), MetaMove::new(5, 2));

        let mut player = HumanPlayer::new(Cursor::new("5 7\n"));
        assert_eq!(player.get_move(&state).unwrap(), MetaMove::new(5, 7));
    }

    #[test]
    fn test_human_player_retries_illegal_input() {
        let mut state = GameState::new();
        state.play(MetaMove::new(0, 5)).unwrap();

        let mut player = HumanPlayer::new(Cursor::new("1 1\nbanana\n99\n5 0\n"));
        assert_eq!(player.get_move(&state).unwrap(), MetaMove::new(5, 0));

        let mut player = HumanPlayer::new(Cursor::new("1 1\n"));
        assert!(matches!(
            player.get_move(&state),
            Err(PlayerError::InputClosed)
        ));
    }

    #[test]
    fn test_engine_player_moves_legally() {
        let state = GameState::new();
        let mut player = EnginePlayer::new(EngineConfig::default().with_fixed_depth(2));
        let mv = player.get_move(&state).unwrap();
        assert!(state.check_move(mv).is_ok());
    }
}
