//! The 12x12 cell grid with its unused border, plus its 100-digit wire form.

use alloc::string::String;
use core::fmt;

use crate::config::{BOARD_CELLS, FIELD_SIZE, PLAYABLE_SIZE};
use crate::{CellState, Coord, ModelError};

#[derive(Clone, PartialEq, Eq)]
pub struct Field {
    cells: [[CellState; FIELD_SIZE]; FIELD_SIZE],
}

impl Default for Field {
    fn default() -> Self {
        Self::new()
    }
}

impl Field {
    /// An all-empty field.
    pub fn new() -> Self {
        Field {
            cells: [[CellState::Empty; FIELD_SIZE]; FIELD_SIZE],
        }
    }

    pub fn get(&self, coord: Coord) -> CellState {
        let (r, c) = coord.grid();
        self.cells[r][c]
    }

    pub fn set(&mut self, coord: Coord, state: CellState) {
        let (r, c) = coord.grid();
        self.cells[r][c] = state;
    }

    /// Raw access to the bordered grid. Out-of-range reads are empty.
    pub(crate) fn grid_cell(&self, r: usize, c: usize) -> CellState {
        if r < FIELD_SIZE && c < FIELD_SIZE {
            self.cells[r][c]
        } else {
            CellState::Empty
        }
    }

    /// Copy with every ship cell masked as empty.
    pub fn fog_view(&self) -> Field {
        let mut fog = self.clone();
        for row in fog.cells.iter_mut() {
            for cell in row.iter_mut() {
                if *cell == CellState::Ship {
                    *cell = CellState::Empty;
                }
            }
        }
        fog
    }

    pub fn count(&self, state: CellState) -> usize {
        Coord::all().filter(|c| self.get(*c) == state).count()
    }

    /// Neighbours of `coord` in its 8-neighbourhood, clipped to the playable area.
    pub fn neighbors(coord: Coord) -> impl Iterator<Item = Coord> {
        let (r, c) = (coord.row() as isize, coord.col() as isize);
        (-1isize..=1)
            .flat_map(move |dr| (-1isize..=1).map(move |dc| (dr, dc)))
            .filter(|&(dr, dc)| dr != 0 || dc != 0)
            .filter_map(move |(dr, dc)| {
                let (nr, nc) = (r + dr, c + dc);
                if nr < 0 || nc < 0 {
                    None
                } else {
                    Coord::new(nr as usize, nc as usize)
                }
            })
    }

    /// True when the cell and all of its neighbours are empty.
    pub fn is_clear_around(&self, coord: Coord) -> bool {
        self.get(coord) == CellState::Empty
            && Field::neighbors(coord).all(|n| self.get(n) == CellState::Empty)
    }

    /// Serialize the playable area as 100 digits, row-major.
    pub fn encode(&self) -> String {
        let mut out = String::with_capacity(BOARD_CELLS);
        for coord in Coord::all() {
            out.push(self.get(coord).as_digit() as char);
        }
        out
    }

    /// Parse the 100-digit form. Trailing bytes beyond the first 100 are ignored.
    pub fn decode(text: &str) -> Result<Field, ModelError> {
        let bytes = text.as_bytes();
        if bytes.len() < BOARD_CELLS {
            return Err(ModelError::InvalidLayout("field data is too short"));
        }
        let mut field = Field::new();
        for (i, &b) in bytes[..BOARD_CELLS].iter().enumerate() {
            let state = CellState::from_digit(b).ok_or(ModelError::InvalidLayout("unknown cell state"))?;
            field.cells[i / PLAYABLE_SIZE + 1][i % PLAYABLE_SIZE + 1] = state;
        }
        Ok(field)
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 1..=PLAYABLE_SIZE {
            for c in 1..=PLAYABLE_SIZE {
                write!(f, "{}", self.cells[r][c].as_digit() as char)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
