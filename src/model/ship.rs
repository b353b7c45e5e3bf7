//! Ship records and the fixed ten-ship fleet.

use crate::config::{fleet_quota, FLEET, MAX_SHIP_LEN, NUM_SHIPS};
use crate::{Coord, ModelError};

/// One segment of a ship: its cell and whether it has been hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Segment {
    coord: Coord,
    hit: bool,
}

/// A ship of a fixed length class. Segments are only meaningful once placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ship {
    length: usize,
    segments: [Option<Segment>; MAX_SHIP_LEN],
    placed: bool,
}

impl Ship {
    const fn unplaced(length: usize) -> Self {
        Ship {
            length,
            segments: [None; MAX_SHIP_LEN],
            placed: false,
        }
    }

    /// Ship's length class.
    pub fn length(&self) -> usize {
        self.length
    }

    pub fn is_placed(&self) -> bool {
        self.placed
    }

    /// Cells covered by the ship, in placement order.
    pub fn cells(&self) -> impl Iterator<Item = Coord> + '_ {
        self.segments.iter().flatten().map(|s| s.coord)
    }

    pub fn covers(&self, coord: Coord) -> bool {
        self.cells().any(|c| c == coord)
    }

    /// A placed ship with every segment hit.
    pub fn is_sunk(&self) -> bool {
        self.placed && self.segments[..self.length].iter().all(|s| matches!(s, Some(seg) if seg.hit))
    }

    /// Mark the segment at `coord` as hit. Returns false if the ship does not cover it.
    pub(crate) fn register_hit(&mut self, coord: Coord) -> bool {
        for seg in self.segments.iter_mut().flatten() {
            if seg.coord == coord {
                seg.hit = true;
                return true;
            }
        }
        false
    }

    fn place(&mut self, cells: &[Coord]) {
        for (slot, &coord) in self.segments.iter_mut().zip(cells) {
            *slot = Some(Segment { coord, hit: false });
        }
        self.placed = true;
    }
}

/// The fleet: four length classes with quotas 1, 2, 3 and 4.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipSet {
    ships: [Ship; NUM_SHIPS],
}

impl Default for ShipSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ShipSet {
    /// A fleet with every ship unplaced.
    pub fn new() -> Self {
        let mut ships = [Ship::unplaced(0); NUM_SHIPS];
        for (ship, &len) in ships.iter_mut().zip(FLEET.iter()) {
            *ship = Ship::unplaced(len);
        }
        ShipSet { ships }
    }

    pub fn ships(&self) -> &[Ship] {
        &self.ships
    }

    /// Ships of `length` still waiting to be placed.
    pub fn remaining(&self, length: usize) -> usize {
        self.ships
            .iter()
            .filter(|s| s.length == length && !s.placed)
            .count()
    }

    pub fn placed_count(&self) -> usize {
        self.ships.iter().filter(|s| s.placed).count()
    }

    pub fn is_complete(&self) -> bool {
        self.placed_count() == NUM_SHIPS
    }

    /// True only when at least one ship is placed and every placed ship is sunk.
    pub fn all_sunk(&self) -> bool {
        self.placed_count() > 0 && self.ships.iter().filter(|s| s.placed).all(Ship::is_sunk)
    }

    pub fn ship_at(&self, coord: Coord) -> Option<&Ship> {
        self.ships.iter().find(|s| s.placed && s.covers(coord))
    }

    pub(crate) fn ship_at_mut(&mut self, coord: Coord) -> Option<&mut Ship> {
        self.ships.iter_mut().find(|s| s.placed && s.covers(coord))
    }

    /// Record `cells` as the next unplaced ship of that length.
    pub(crate) fn assign(&mut self, cells: &[Coord]) -> Result<(), ModelError> {
        let len = cells.len();
        if fleet_quota(len) == 0 {
            return Err(ModelError::InvalidPlacement);
        }
        let ship = self
            .ships
            .iter_mut()
            .find(|s| s.length == len && !s.placed)
            .ok_or(ModelError::QuotaExceeded)?;
        ship.place(cells);
        Ok(())
    }
}
