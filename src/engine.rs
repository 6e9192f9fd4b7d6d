use rand::Rng;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::moveset::MoveSet;

/// A direction to move/merge tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Move {
    Left,
    Right,
    Up,
    Down,
}

impl Move {
    /// Every direction in flag order (left, right, up, down).
    pub const ALL: [Move; 4] = [Move::Left, Move::Right, Move::Up, Move::Down];

    /// The bit this direction occupies in a [`MoveSet`].
    #[inline]
    pub const fn flag(self) -> u8 {
        match self {
            Move::Left => 0b0001,
            Move::Right => 0b0010,
            Move::Up => 0b0100,
            Move::Down => 0b1000,
        }
    }

    /// Map a keypress to a direction. `L`, `R`, `U`, `D` in either case;
    /// anything else is `None`.
    ///
    /// ```
    /// use expectimax_2048::engine::Move;
    /// assert_eq!(Move::from_key('u'), Some(Move::Up));
    /// assert_eq!(Move::from_key('q'), None);
    /// ```
    pub fn from_key(key: char) -> Option<Move> {
        match key.to_ascii_lowercase() {
            'l' => Some(Move::Left),
            'r' => Some(Move::Right),
            'u' => Some(Move::Up),
            'd' => Some(Move::Down),
            _ => None,
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Move::Left => "left",
            Move::Right => "right",
            Move::Up => "up",
            Move::Down => "down",
        };
        f.write_str(name)
    }
}

type BoardRaw = u64;
type Line = u64;
type Tile = u64;
type Score = u64;

/// Packed 4x4 2048 board as 16 4-bit nibbles in a `u64`, plus the merge score
/// accumulated on the way to it.
///
/// Cell `(row, col)` lives at bits `(3 - row) * 16 + (3 - col) * 4`, so the
/// top-left cell is the most significant nibble. A nibble `v` is the tile
/// `2^v`; `0` is empty. Exponents are limited to 15 (the 32768 tile): writes
/// are truncated to 4 bits and merging two 15s wraps to an empty cell.
///
/// Equality and hashing only look at the packed cells, never at the score.
#[derive(Clone, Copy, Default)]
pub struct Board {
    raw: BoardRaw,
    score: Score,
}

impl PartialEq for Board {
    fn eq(&self, other: &Self) -> bool { self.raw == other.raw }
}

impl Eq for Board {}

impl Hash for Board {
    fn hash<H: Hasher>(&self, state: &mut H) { self.raw.hash(state) }
}

impl Board {
    /// A constant empty board (all zeros, zero score).
    pub const EMPTY: Board = Board { raw: 0, score: 0 };

    /// Construct a `Board` from its raw packed representation with zero score.
    #[inline]
    pub const fn from_raw(raw: BoardRaw) -> Self { Board { raw, score: 0 } }

    /// Same cells, different accumulated score.
    #[inline]
    pub const fn with_score(self, score: Score) -> Self { Board { raw: self.raw, score } }

    /// A board with every nibble drawn uniformly. Mostly useful for tests.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self { Board::from_raw(rng.gen()) }

    /// Consume this `Board`, returning the raw packed `u64`.
    #[inline]
    pub fn into_raw(self) -> BoardRaw { self.raw }

    /// Borrow the raw packed `u64` for this `Board`.
    #[inline]
    pub fn raw(&self) -> BoardRaw { self.raw }

    /// Points scored by merges so far.
    #[inline]
    pub fn score(&self) -> Score { self.score }

    /// Exponent stored at `(row, col)`.
    ///
    /// # Panics
    /// If `row` or `col` is outside `0..4`.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u8 {
        ((self.raw >> cell_shift(row, col)) & 0xf) as u8
    }

    /// Overwrite the exponent at `(row, col)`. Only the low 4 bits of
    /// `value` are kept.
    ///
    /// # Panics
    /// If `row` or `col` is outside `0..4`.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: u8) {
        let shift = cell_shift(row, col);
        let mask: BoardRaw = 0xf << shift;
        self.raw = (self.raw & !mask) | ((value as BoardRaw & 0xf) << shift);
    }

    /// Value-returning form of [`Board::set`].
    #[inline]
    pub fn with_tile(mut self, row: usize, col: usize, value: u8) -> Self {
        self.set(row, col, value);
        self
    }

    /// Rotate the grid a quarter turn clockwise.
    ///
    /// ```
    /// use expectimax_2048::engine::Board;
    /// let b = Board::from_raw(0x37BF_26AE_159D_048C).rotate_clockwise();
    /// assert_eq!(b, Board::from_raw(0x0123_4567_89AB_CDEF));
    /// ```
    #[inline]
    pub fn rotate_clockwise(self) -> Self {
        Board { raw: mirror_rows(transpose(self.raw)), score: self.score }
    }

    /// Rotate the grid a quarter turn counter-clockwise.
    #[inline]
    pub fn rotate_counter_clockwise(self) -> Self {
        Board { raw: flip_rows(transpose(self.raw)), score: self.score }
    }

    /// Mirror the grid horizontally (column `c` becomes column `3 - c`).
    #[inline]
    pub fn invert(self) -> Self {
        Board { raw: mirror_rows(self.raw), score: self.score }
    }

    /// Slide and merge every row to the right. All other directions are
    /// built from this one.
    ///
    /// Each row is scanned from its rightmost cell. Non-empty tiles are pushed
    /// into a 4-slot buffer; a tile equal to the last pushed one merges with
    /// it unless that slot already absorbed a merge this move, so `[2,2,2,_]`
    /// becomes `[_,_,2,4]`.
    pub fn slide_right(self) -> Self {
        let mut raw: BoardRaw = 0;
        let mut score = self.score;
        for row in 0..4 {
            let line = (self.raw >> (row * 16)) & 0xffff;
            let mut buffer = [0 as Tile; 4];
            let mut len = 0;
            let mut can_merge = false;
            for cell in 0..4 {
                let tile = (line >> (cell * 4)) & 0xf;
                if tile == 0 {
                    continue;
                }
                if can_merge && buffer[len - 1] == tile {
                    buffer[len - 1] += 1;
                    score += 1 << buffer[len - 1];
                    can_merge = false;
                } else {
                    buffer[len] = tile;
                    len += 1;
                    can_merge = true;
                }
            }
            let packed = buffer
                .iter()
                .enumerate()
                .fold(0, |acc, (idx, &tile)| acc | ((tile & 0xf) << (idx * 4)));
            raw |= packed << (row * 16);
        }
        Board { raw, score }
    }

    #[inline]
    pub fn left(self) -> Self { self.invert().slide_right().invert() }

    #[inline]
    pub fn right(self) -> Self { self.slide_right() }

    #[inline]
    pub fn up(self) -> Self { self.rotate_clockwise().slide_right().rotate_counter_clockwise() }

    #[inline]
    pub fn down(self) -> Self { self.rotate_counter_clockwise().slide_right().rotate_clockwise() }

    /// Return the board resulting from sliding/merging tiles in `dir` (no random insert).
    ///
    /// Does not check that the move changes anything.
    ///
    /// ```
    /// use expectimax_2048::engine::{Board, Move};
    /// let b = Board::from_raw(0x1100_0000_0000_0000).shift(Move::Right);
    /// assert_eq!(b, Board::from_raw(0x0002_0000_0000_0000));
    /// assert_eq!(b.score(), 4);
    /// ```
    #[inline]
    pub fn shift(self, dir: Move) -> Self {
        match dir {
            Move::Left => self.left(),
            Move::Right => self.right(),
            Move::Up => self.up(),
            Move::Down => self.down(),
        }
    }

    /// Directions that change the board.
    ///
    /// Walks the board around the clock and slides right at each quarter
    /// turn. Costs up to four slides; search code should prefer comparing
    /// `shift` results it needs anyway.
    pub fn available_moves(self) -> MoveSet {
        let mut moves = MoveSet::NONE;
        // right, then clockwise turns expose up, left, down to slide_right
        let mut turned = self;
        for dir in [Move::Right, Move::Up, Move::Left, Move::Down] {
            if turned.slide_right() != turned {
                moves.insert(dir);
            }
            turned = turned.rotate_clockwise();
        }
        moves
    }

    /// Return true if no legal moves remain.
    ///
    /// ```
    /// use expectimax_2048::engine::Board;
    /// assert!(Board::EMPTY.is_game_over());
    /// assert!(Board::from_raw(0x1212_2121_1212_2121).is_game_over());
    /// ```
    #[inline]
    pub fn is_game_over(self) -> bool { self.available_moves().is_empty() }

    /// Sum of the stored exponents (not tile values).
    pub fn sum(self) -> u32 {
        (0..16).map(|idx| extract_tile(self.raw, idx) as u32).sum()
    }

    /// Row-major indices (`row * 4 + col`) of the empty cells.
    pub fn empty_cells(self) -> impl Iterator<Item = usize> {
        (0..16).filter(move |&idx| extract_tile(self.raw, idx) == 0)
    }

    /// Count the number of empty cells on the board.
    #[inline]
    pub fn count_empty(self) -> u32 { count_empty(self.raw) }

    /// Largest exponent on the board.
    pub fn max_exponent(self) -> u8 {
        (0..16).map(|idx| extract_tile(self.raw, idx) as u8).max().unwrap_or(0)
    }

    /// Return the highest tile value (e.g., 2048) present on the board, 0 if empty.
    pub fn highest_tile(self) -> u32 {
        match self.max_exponent() {
            0 => 0,
            exp => 1 << exp,
        }
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board({:#018x}, score: {})", self.raw, self.score)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..4 {
            if row > 0 {
                writeln!(f, "{}", "-".repeat(27))?;
            }
            let cells: Vec<String> = (0..4).map(|col| format_val(self.get(row, col))).collect();
            writeln!(f, "{}", cells.join("|"))?;
        }
        Ok(())
    }
}

impl From<BoardRaw> for Board { fn from(v: BoardRaw) -> Self { Board::from_raw(v) } }
impl From<Board> for BoardRaw { fn from(b: Board) -> Self { b.into_raw() } }

#[inline]
fn cell_shift(row: usize, col: usize) -> u32 {
    assert!(row < 4 && col < 4, "cell ({row}, {col}) is outside the 4x4 board");
    (((3 - row) << 4) + ((3 - col) << 2)) as u32
}

// Credit to Nneonneo
pub(crate) fn transpose(x: BoardRaw) -> BoardRaw {
    let a1 = x & 0xF0F00F0FF0F00F0F;
    let a2 = x & 0x0000F0F00000F0F0;
    let a3 = x & 0x0F0F00000F0F0000;
    let a = a1 | (a2 << 12) | (a3 >> 12);
    let b1 = a & 0xFF00FF0000FF00FF;
    let b2 = a & 0x00FF00FF00000000;
    let b3 = a & 0x00000000FF00FF00;
    b1 | (b2 >> 24) | (b3 << 24)
}

/// Reverse the nibble order inside every 16-bit row.
fn mirror_rows(x: BoardRaw) -> BoardRaw {
    let x = ((x & 0xF0F0F0F0F0F0F0F0) >> 4) | ((x & 0x0F0F0F0F0F0F0F0F) << 4);
    ((x & 0xFF00FF00FF00FF00) >> 8) | ((x & 0x00FF00FF00FF00FF) << 8)
}

/// Reverse the order of the four 16-bit rows.
fn flip_rows(x: BoardRaw) -> BoardRaw {
    let x = x.rotate_left(32);
    ((x & 0xFFFF0000FFFF0000) >> 16) | ((x & 0x0000FFFF0000FFFF) << 16)
}

pub(crate) fn extract_line(board: BoardRaw, line_idx: u64) -> Line {
    (board >> ((3 - line_idx) * 16)) & 0xffff
}

pub(crate) fn line_to_vec(line: Line) -> [Tile; 4] {
    [(line >> 12) & 0xf, (line >> 8) & 0xf, (line >> 4) & 0xf, line & 0xf]
}

// https://stackoverflow.com/questions/38225571/count-number-of-zero-nibbles-in-an-unsigned-64-bit-integer
fn count_empty(board: BoardRaw) -> u32 {
    let mut x = board;
    x |= (x >> 2) & 0x3333333333333333;
    x |= x >> 1;
    (!x & 0x1111111111111111).count_ones()
}

fn extract_tile(board: BoardRaw, idx: usize) -> Tile {
    (board >> ((15 - idx) * 4)) & 0xf
}

fn format_val(exp: u8) -> String {
    match exp {
        0 => " ".repeat(6),
        x => format!("{:^6}", 1u32 << x),
    }
}
