//! Human coordinates such as `A1` or `K10`.
//!
//! Letters label rows and skip `J`; numbers label columns. Internally both
//! are zero-based, and the compact cell code is `row * 10 + col`.

use core::fmt;
use core::str::FromStr;

use crate::config::PLAYABLE_SIZE;
use crate::ModelError;

/// Row labels in order.
pub const ROW_LETTERS: [u8; PLAYABLE_SIZE] = *b"ABCDEFGHIK";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coord {
    row: u8,
    col: u8,
}

impl Coord {
    pub fn new(row: usize, col: usize) -> Option<Self> {
        if row < PLAYABLE_SIZE && col < PLAYABLE_SIZE {
            Some(Coord {
                row: row as u8,
                col: col as u8,
            })
        } else {
            None
        }
    }

    pub fn row(&self) -> usize {
        self.row as usize
    }

    pub fn col(&self) -> usize {
        self.col as usize
    }

    /// Compact cell code used for ship segments.
    pub fn index(&self) -> usize {
        self.row() * PLAYABLE_SIZE + self.col()
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Coord::new(index / PLAYABLE_SIZE, index % PLAYABLE_SIZE)
    }

    /// Position in the bordered storage grid.
    pub(crate) fn grid(&self) -> (usize, usize) {
        (self.row() + 1, self.col() + 1)
    }

    pub fn parse(text: &str) -> Result<Self, ModelError> {
        let bytes = text.as_bytes();
        if bytes.len() < 2 || bytes.len() > 3 {
            return Err(ModelError::InvalidCoordinate);
        }
        let letter = bytes[0].to_ascii_uppercase();
        let row = ROW_LETTERS
            .iter()
            .position(|&l| l == letter)
            .ok_or(ModelError::InvalidCoordinate)?;
        let col = match &bytes[1..] {
            [d @ b'1'..=b'9'] => (d - b'1') as usize,
            [b'1', b'0'] => 9,
            _ => return Err(ModelError::InvalidCoordinate),
        };
        Ok(Coord {
            row: row as u8,
            col: col as u8,
        })
    }

    /// Every playable coordinate in row-major order.
    pub fn all() -> impl Iterator<Item = Coord> {
        (0..PLAYABLE_SIZE * PLAYABLE_SIZE).filter_map(Coord::from_index)
    }
}

impl FromStr for Coord {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Coord::parse(s)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", ROW_LETTERS[self.row()] as char, self.col() + 1)
    }
}
