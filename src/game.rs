use std::{fmt, str::FromStr};

use arrayvec::ArrayVec;

use crate::error::{MoveError, PositionError};

// #############################
// #                           #
// #      Fixed Constants      #
// #                           #
// #############################
pub const BOARD_SIZE: usize = 3;
pub const BOARD_SIZE_SQUARED: usize = BOARD_SIZE * BOARD_SIZE;
pub const META_SIZE: usize = BOARD_SIZE_SQUARED * BOARD_SIZE_SQUARED;
const FULL_BOARD: u16 = 0b111_111_111;

/// Bit `i` of a mask is cell `i` of the board, counted row by row.
#[rustfmt::skip]
pub const WINNING_POSITIONS: [u16; 8] = [
    0b000_000_111, 0b000_111_000, 0b111_000_000, // rows
    0b001_001_001, 0b010_010_010, 0b100_100_100, // columns
    0b100_010_001, 0b001_010_100, // diagonals
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlayerMarker {
    X,
    O,
    Empty,
}

impl PlayerMarker {
    pub fn to_char(&self) -> char {
        match self {
            PlayerMarker::X => 'X',
            PlayerMarker::O => 'O',
            PlayerMarker::Empty => '.',
        }
    }

    pub fn other(&self) -> Self {
        match self {
            PlayerMarker::X => PlayerMarker::O,
            PlayerMarker::O => PlayerMarker::X,
            PlayerMarker::Empty => PlayerMarker::Empty,
        }
    }

    /// `1` for X, `-1` for O. Scores are kept from X's point of view.
    pub fn sign(&self) -> i32 {
        match self {
            PlayerMarker::X => 1,
            PlayerMarker::O => -1,
            PlayerMarker::Empty => 0,
        }
    }
}

impl fmt::Display for PlayerMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// Outcome of a mini-board or of the whole game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameResult {
    Won(PlayerMarker),
    Drawn,
}

// #############################
// #                           #
// #         MetaMove          #
// #                           #
// #############################

/// A move: the mini-board to play in and the cell within it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct MetaMove {
    pub board: usize,
    pub cell: usize,
}

impl MetaMove {
    pub fn new(board: usize, cell: usize) -> Self {
        MetaMove { board, cell }
    }
}

impl fmt::Display for MetaMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.board, self.cell)
    }
}

/// Buffer for move generation, large enough for a fully open meta-board.
pub type PossibleMoves = ArrayVec<MetaMove, META_SIZE>;

// #############################
// #                           #
// #         BitBoard          #
// #                           #
// #############################

/// Any 3x3 board: the cells of a mini-board, or the mini-win markers of the
/// meta-board. `drawn` marks squares that belong to neither player and are no
/// longer empty; it stays zero on mini-boards.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct BitBoard {
    x: u16,
    o: u16,
    drawn: u16,
}

impl BitBoard {
    pub fn new() -> Self {
        BitBoard::default()
    }

    fn mask(&self, player: PlayerMarker) -> u16 {
        match player {
            PlayerMarker::X => self.x,
            PlayerMarker::O => self.o,
            PlayerMarker::Empty => 0,
        }
    }

    fn occupied(&self) -> u16 {
        self.x | self.o | self.drawn
    }

    pub fn get(&self, index: usize) -> PlayerMarker {
        let mask = 1 << index;
        if self.x & mask != 0 {
            PlayerMarker::X
        } else if self.o & mask != 0 {
            PlayerMarker::O
        } else {
            PlayerMarker::Empty
        }
    }

    pub fn is_drawn(&self, index: usize) -> bool {
        self.drawn & (1 << index) != 0
    }

    pub fn is_occupied(&self, index: usize) -> bool {
        self.occupied() & (1 << index) != 0
    }

    pub fn set(&mut self, index: usize, player: PlayerMarker) {
        debug_assert!(!self.is_occupied(index), "square {index} already set");
        let mask = 1 << index;
        match player {
            PlayerMarker::X => self.x |= mask,
            PlayerMarker::O => self.o |= mask,
            PlayerMarker::Empty => {}
        }
    }

    pub fn set_drawn(&mut self, index: usize) {
        self.drawn |= 1 << index;
    }

    pub fn unset(&mut self, index: usize) {
        let mask = !(1 << index);
        self.x &= mask;
        self.o &= mask;
        self.drawn &= mask;
    }

    pub fn is_full(&self) -> bool {
        self.occupied() == FULL_BOARD
    }

    pub fn empty_cells(&self) -> usize {
        BOARD_SIZE_SQUARED - self.occupied().count_ones() as usize
    }

    pub fn has_won(&self, player: PlayerMarker) -> bool {
        let own = self.mask(player);
        own != 0 && WINNING_POSITIONS.iter().any(|&line| own & line == line)
    }

    /// The player holding three in a row, or `Empty`.
    pub fn winner(&self) -> PlayerMarker {
        if self.has_won(PlayerMarker::X) {
            PlayerMarker::X
        } else if self.has_won(PlayerMarker::O) {
            PlayerMarker::O
        } else {
            PlayerMarker::Empty
        }
    }

    /// Number of lines where `player` holds two squares and the third is empty.
    /// A square may count towards several lines.
    pub fn open_lines(&self, player: PlayerMarker) -> i32 {
        let own = self.mask(player);
        let occupied = self.occupied();
        WINNING_POSITIONS
            .iter()
            .filter(|&&line| {
                (own & line).count_ones() == 2 && (occupied & line).count_ones() == 2
            })
            .count() as i32
    }
}

// #############################
// #                           #
// #         MetaBoard         #
// #                           #
// #############################

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct MetaBoard {
    /// Mini-win markers, one square per mini-board.
    pub board: BitBoard,
    pub sub_boards: [BitBoard; BOARD_SIZE_SQUARED],
}

impl MetaBoard {
    pub fn new() -> Self {
        MetaBoard::default()
    }

    pub fn mini_win(&self, index: usize) -> Option<GameResult> {
        if self.board.is_drawn(index) {
            return Some(GameResult::Drawn);
        }
        match self.board.get(index) {
            PlayerMarker::Empty => None,
            player => Some(GameResult::Won(player)),
        }
    }

    pub fn is_decided(&self, index: usize) -> bool {
        self.board.is_occupied(index)
    }

    /// A mini-board accepts moves while it is neither decided nor full.
    pub fn is_open(&self, index: usize) -> bool {
        !self.is_decided(index) && !self.sub_boards[index].is_full()
    }

    pub fn empty_cells(&self) -> usize {
        self.sub_boards.iter().map(BitBoard::empty_cells).sum()
    }
}

// #############################
// #                           #
// #        GameState          #
// #                           #
// #############################

/// Everything needed to take back one move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UndoMove {
    mv: MetaMove,
    forced_board: Option<usize>,
    winner: Option<GameResult>,
    decided_board: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameState {
    meta: MetaBoard,
    current_player: PlayerMarker,
    forced_board: Option<usize>,
    winner: Option<GameResult>,
}

impl Default for GameState {
    fn default() -> Self {
        GameState::new()
    }
}

impl GameState {
    pub fn new() -> Self {
        GameState {
            meta: MetaBoard::new(),
            current_player: PlayerMarker::X,
            forced_board: None,
            winner: None,
        }
    }

    pub fn meta(&self) -> &MetaBoard {
        &self.meta
    }

    pub fn side_to_move(&self) -> PlayerMarker {
        self.current_player
    }

    /// The mini-board the side to move must play in, `None` for free choice.
    pub fn forced_board(&self) -> Option<usize> {
        self.forced_board
    }

    pub fn winner(&self) -> Option<GameResult> {
        self.winner
    }

    pub fn is_terminal(&self) -> bool {
        self.winner.is_some()
    }

    pub fn empty_cells(&self) -> usize {
        self.meta.empty_cells()
    }

    pub fn check_move(&self, mv: MetaMove) -> Result<(), MoveError> {
        if self.winner.is_some() {
            return Err(MoveError::GameOver);
        }
        if mv.board >= BOARD_SIZE_SQUARED || mv.cell >= BOARD_SIZE_SQUARED {
            return Err(MoveError::OutOfRange {
                board: mv.board,
                cell: mv.cell,
            });
        }
        if let Some(expected) = self.forced_board {
            if expected != mv.board {
                return Err(MoveError::WrongBoard {
                    expected,
                    got: mv.board,
                });
            }
        }
        if self.meta.is_decided(mv.board) {
            return Err(MoveError::BoardDecided(mv.board));
        }
        if self.meta.sub_boards[mv.board].is_occupied(mv.cell) {
            return Err(MoveError::Occupied {
                board: mv.board,
                cell: mv.cell,
            });
        }
        Ok(())
    }

    /// Validate and play a move for the side to move.
    pub fn play(&mut self, mv: MetaMove) -> Result<UndoMove, MoveError> {
        self.check_move(mv)?;
        Ok(self.apply(mv))
    }

    /// Play a move already known to be legal.
    pub(crate) fn apply(&mut self, mv: MetaMove) -> UndoMove {
        let mut undo = UndoMove {
            mv,
            forced_board: self.forced_board,
            winner: self.winner,
            decided_board: false,
        };
        let player = self.current_player;

        let sub_board = &mut self.meta.sub_boards[mv.board];
        sub_board.set(mv.cell, player);
        let won = sub_board.has_won(player);
        let full = sub_board.is_full();

        if won {
            self.meta.board.set(mv.board, player);
            undo.decided_board = true;
        } else if full {
            self.meta.board.set_drawn(mv.board);
            undo.decided_board = true;
        }

        if undo.decided_board {
            if self.meta.board.has_won(player) {
                self.winner = Some(GameResult::Won(player));
            } else if self.meta.board.is_full() {
                self.winner = Some(GameResult::Drawn);
            }
        }

        self.forced_board = if self.meta.is_open(mv.cell) {
            Some(mv.cell)
        } else {
            None
        };
        self.current_player = player.other();
        undo
    }

    /// Take back the move recorded in `undo`. Must be the last move applied.
    pub fn undo(&mut self, undo: UndoMove) {
        let UndoMove {
            mv,
            forced_board,
            winner,
            decided_board,
        } = undo;
        self.meta.sub_boards[mv.board].unset(mv.cell);
        if decided_board {
            self.meta.board.unset(mv.board);
        }
        self.forced_board = forced_board;
        self.winner = winner;
        self.current_player = self.current_player.other();
    }

    /// Fill `possible_moves` with the legal moves, ordered by board, then cell.
    pub fn get_possible_moves(&self, possible_moves: &mut PossibleMoves) {
        possible_moves.clear();
        if self.winner.is_some() {
            return;
        }

        let boards = match self.forced_board {
            Some(board) => board..board + 1,
            None => 0..BOARD_SIZE_SQUARED,
        };

        for board in boards {
            if !self.meta.is_open(board) {
                continue;
            }
            let sub_board = &self.meta.sub_boards[board];
            for cell in 0..BOARD_SIZE_SQUARED {
                if !sub_board.is_occupied(cell) {
                    possible_moves.push(MetaMove::new(board, cell));
                }
            }
        }
    }

    pub fn legal_moves(&self) -> PossibleMoves {
        let mut possible_moves = PossibleMoves::new();
        self.get_possible_moves(&mut possible_moves);
        possible_moves
    }

    /// Compact notation accepted by `FromStr`.
    pub fn to_notation(&self) -> String {
        let mut cells = String::with_capacity(META_SIZE + 8);
        for (i, sub_board) in self.meta.sub_boards.iter().enumerate() {
            if i > 0 {
                cells.push('/');
            }
            cells.extend((0..BOARD_SIZE_SQUARED).map(|cell| sub_board.get(cell).to_char()));
        }
        let side = match self.current_player {
            PlayerMarker::O => 'o',
            _ => 'x',
        };
        let forced = self
            .forced_board
            .map_or_else(|| "-".to_string(), |board| board.to_string());
        format!("{cells} {side} {forced}")
    }
}

// #############################
// #                           #
// #         Notation          #
// #                           #
// #############################

impl FromStr for GameState {
    type Err = PositionError;

    /// Reads `<81 cells> <x|o> <forced board|->`. Cells are given mini-board by
    /// mini-board using `X`, `O` and `.`; `/` separators are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split_whitespace().collect();
        if fields.len() != 3 {
            return Err(PositionError::FieldCount(fields.len()));
        }

        let cells: Vec<char> = fields[0].chars().filter(|&c| c != '/').collect();
        if cells.len() != META_SIZE {
            return Err(PositionError::CellCount(cells.len()));
        }

        let mut meta = MetaBoard::new();
        for (i, &c) in cells.iter().enumerate() {
            let player = match c {
                'X' | 'x' => PlayerMarker::X,
                'O' | 'o' => PlayerMarker::O,
                '.' | '_' | '-' => continue,
                other => return Err(PositionError::BadCell(other)),
            };
            meta.sub_boards[i / BOARD_SIZE_SQUARED].set(i % BOARD_SIZE_SQUARED, player);
        }

        for (index, sub_board) in meta.sub_boards.iter().enumerate() {
            match (
                sub_board.has_won(PlayerMarker::X),
                sub_board.has_won(PlayerMarker::O),
            ) {
                (true, true) => return Err(PositionError::DoubleWin(index)),
                (true, false) => meta.board.set(index, PlayerMarker::X),
                (false, true) => meta.board.set(index, PlayerMarker::O),
                (false, false) if sub_board.is_full() => meta.board.set_drawn(index),
                (false, false) => {}
            }
        }

        let winner = match (
            meta.board.has_won(PlayerMarker::X),
            meta.board.has_won(PlayerMarker::O),
        ) {
            (true, true) => return Err(PositionError::DoubleMetaWin),
            (true, false) => Some(GameResult::Won(PlayerMarker::X)),
            (false, true) => Some(GameResult::Won(PlayerMarker::O)),
            (false, false) if meta.board.is_full() => Some(GameResult::Drawn),
            (false, false) => None,
        };

        let current_player = match fields[1] {
            "x" | "X" => PlayerMarker::X,
            "o" | "O" => PlayerMarker::O,
            other => return Err(PositionError::BadSide(other.to_string())),
        };

        let forced_board = match fields[2] {
            "-" => None,
            other => {
                let board = other
                    .parse::<usize>()
                    .ok()
                    .filter(|&board| board < BOARD_SIZE_SQUARED)
                    .ok_or_else(|| PositionError::BadForcedBoard(other.to_string()))?;
                if winner.is_none() && !meta.is_open(board) {
                    return Err(PositionError::ForcedBoardDecided(board));
                }
                Some(board)
            }
        };

        Ok(GameState {
            meta,
            current_player,
            forced_board,
            winner,
        })
    }
}

// #############################
// #                           #
// #           Display         #
// #                           #
// #############################

impl MetaBoard {
    /// Character shown at `(row, col)` of the 9x9 grid. Boards won by a player
    /// are drawn as a large marker instead of their cells.
    fn display_char(&self, row: usize, col: usize) -> char {
        let board = (row / BOARD_SIZE) * BOARD_SIZE + col / BOARD_SIZE;
        let cell = (row % BOARD_SIZE) * BOARD_SIZE + col % BOARD_SIZE;
        match self.mini_win(board) {
            Some(GameResult::Won(player)) => {
                if matches!(cell, 0 | 2 | 4 | 6 | 8) {
                    player.to_char()
                } else {
                    ' '
                }
            }
            _ => self.sub_boards[board].get(cell).to_char(),
        }
    }
}

impl fmt::Display for MetaBoard {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for row in 0..BOARD_SIZE_SQUARED {
            if row > 0 && row % BOARD_SIZE == 0 {
                writeln!(f, "------+-------+------")?;
            }
            for col in 0..BOARD_SIZE_SQUARED {
                if col > 0 && col % BOARD_SIZE == 0 {
                    write!(f, "| ")?;
                }
                write!(f, "{} ", self.display_char(row, col))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.meta)
    }
}
