//! A player's board: the cell grid together with the fleet placed on it.

use alloc::vec::Vec;
use rand::Rng;

use crate::config::{FIELD_SIZE, FLEET, MAX_SHIP_LEN};
use crate::{CellState, Coord, Field, ModelError, PlacementStatus, ShipSet, ShotOutcome};

/// Failed box draws for a single ship before auto placement starts over.
const AUTO_RESTART_AFTER: usize = 1_000;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Board {
    field: Field,
    ships: ShipSet,
}

impl Board {
    pub fn new() -> Self {
        Board {
            field: Field::new(),
            ships: ShipSet::new(),
        }
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn ships(&self) -> &ShipSet {
        &self.ships
    }

    pub fn reset(&mut self) {
        *self = Board::new();
    }

    pub fn fog_view(&self) -> Field {
        self.field.fog_view()
    }

    pub fn all_sunk(&self) -> bool {
        self.ships.all_sunk()
    }

    /// Replace any existing layout with a random legal fleet.
    ///
    /// Each ship is dropped into a random empty square box of side `len + 2`
    /// along one of the four inner edges, so no two ships ever touch.
    pub fn place_auto<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        loop {
            self.reset();
            if self.try_place_auto(rng) {
                return;
            }
            log::debug!("auto placement hit a dead end, starting over");
        }
    }

    fn try_place_auto<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        for &len in FLEET.iter() {
            let mut placed = false;
            for _ in 0..AUTO_RESTART_AFTER {
                let outer_r = rng.random_range(0..FIELD_SIZE - len - 1);
                let outer_c = rng.random_range(0..FIELD_SIZE - len - 1);
                if !self.box_is_empty(outer_r, outer_c, len + 2) {
                    continue;
                }
                let (r, c) = (outer_r + 1, outer_c + 1);
                let side = rng.random_range(0..4);
                let cells: Option<Vec<Coord>> = (0..len)
                    .map(|i| match side {
                        0 => (r, c + i),
                        1 => (r + i, c + len - 1),
                        2 => (r + len - 1, c + i),
                        _ => (r + i, c),
                    })
                    .map(|(gr, gc)| Coord::new(gr - 1, gc - 1))
                    .collect();
                let Some(cells) = cells else { continue };
                if self.ships.assign(&cells).is_err() {
                    return false;
                }
                for &cell in &cells {
                    self.field.set(cell, CellState::Ship);
                }
                placed = true;
                break;
            }
            if !placed {
                return false;
            }
        }
        true
    }

    fn box_is_empty(&self, top: usize, left: usize, side: usize) -> bool {
        (top..top + side).all(|r| (left..left + side).all(|c| self.field.grid_cell(r, c) == CellState::Empty))
    }

    /// Place one ship from text such as `A1-A4` or a single cell `D7`.
    ///
    /// Quota is checked before geometry, so a spare length is rejected even
    /// when the cells themselves would be legal.
    pub fn place_manual(&mut self, text: &str) -> Result<PlacementStatus, ModelError> {
        let text = text.trim();
        let (a, b) = match text.split_once('-') {
            Some((a, b)) => (a.trim(), b.trim()),
            None => (text, text),
        };
        let start = Coord::parse(a)?;
        let end = Coord::parse(b)?;
        if start.row() != end.row() && start.col() != end.col() {
            return Err(ModelError::InvalidPlacement);
        }
        let (r0, r1) = (start.row().min(end.row()), start.row().max(end.row()));
        let (c0, c1) = (start.col().min(end.col()), start.col().max(end.col()));
        let len = (r1 - r0).max(c1 - c0) + 1;
        if len > MAX_SHIP_LEN {
            return Err(ModelError::InvalidPlacement);
        }
        if self.ships.remaining(len) == 0 {
            return Err(ModelError::QuotaExceeded);
        }
        let cells: Vec<Coord> = (r0..=r1)
            .flat_map(|r| (c0..=c1).filter_map(move |c| Coord::new(r, c)))
            .collect();
        if !cells.iter().all(|&c| self.field.is_clear_around(c)) {
            return Err(ModelError::InvalidPlacement);
        }
        self.ships.assign(&cells)?;
        for &cell in &cells {
            self.field.set(cell, CellState::Ship);
        }
        if self.ships.is_complete() {
            Ok(PlacementStatus::Complete)
        } else {
            Ok(PlacementStatus::Placed)
        }
    }

    /// Resolve a shot given as coordinate text. Malformed text is `Invalid`.
    pub fn resolve_shot(&mut self, text: &str) -> ShotOutcome {
        match Coord::parse(text.trim()) {
            Ok(coord) => self.resolve_shot_at(coord),
            Err(_) => ShotOutcome::Invalid,
        }
    }

    /// Resolve a shot. Sinking a ship marks every empty cell around it as a miss.
    pub fn resolve_shot_at(&mut self, coord: Coord) -> ShotOutcome {
        match self.field.get(coord) {
            CellState::Ship => {
                self.field.set(coord, CellState::Hit);
                let mut sunk_cells = Vec::new();
                if let Some(ship) = self.ships.ship_at_mut(coord) {
                    ship.register_hit(coord);
                    if ship.is_sunk() {
                        sunk_cells.extend(ship.cells());
                    }
                }
                for cell in sunk_cells {
                    for n in Field::neighbors(cell) {
                        if self.field.get(n) == CellState::Empty {
                            self.field.set(n, CellState::Miss);
                        }
                    }
                }
                ShotOutcome::Hit
            }
            CellState::Empty => {
                self.field.set(coord, CellState::Miss);
                ShotOutcome::Miss
            }
            CellState::Miss | CellState::Hit => ShotOutcome::Invalid,
        }
    }

    /// Rebuild a board from an uploaded field, deriving the fleet from it.
    ///
    /// The field must hold only empty and ship cells forming exactly the
    /// standard fleet: straight ships of 1..4 cells that never touch,
    /// not even diagonally.
    pub fn from_layout(field: &Field) -> Result<Board, ModelError> {
        if Coord::all().any(|c| !matches!(field.get(c), CellState::Empty | CellState::Ship)) {
            return Err(ModelError::InvalidLayout("layout contains shot marks"));
        }
        let mut board = Board::new();
        let mut seen = [false; crate::config::BOARD_CELLS];
        for origin in Coord::all() {
            if field.get(origin) != CellState::Ship || seen[origin.index()] {
                continue;
            }
            seen[origin.index()] = true;
            let mut component = Vec::new();
            let mut stack = alloc::vec![origin];
            while let Some(cell) = stack.pop() {
                component.push(cell);
                for n in Field::neighbors(cell) {
                    let orthogonal = n.row() == cell.row() || n.col() == cell.col();
                    if orthogonal && field.get(n) == CellState::Ship && !seen[n.index()] {
                        seen[n.index()] = true;
                        stack.push(n);
                    }
                }
            }
            if component.len() > MAX_SHIP_LEN {
                return Err(ModelError::InvalidLayout("ship is too long"));
            }
            component.sort();
            let first = component[0];
            if !component.iter().all(|c| c.row() == first.row()) && !component.iter().all(|c| c.col() == first.col()) {
                return Err(ModelError::InvalidLayout("ship is not straight"));
            }
            for &cell in &component {
                if Field::neighbors(cell).any(|n| field.get(n) == CellState::Ship && !component.contains(&n)) {
                    return Err(ModelError::InvalidLayout("ships touch"));
                }
            }
            board
                .ships
                .assign(&component)
                .map_err(|_| ModelError::InvalidLayout("too many ships of one length"))?;
        }
        if !board.ships.is_complete() {
            return Err(ModelError::InvalidLayout("fleet is incomplete"));
        }
        board.field = field.clone();
        Ok(board)
    }
}
