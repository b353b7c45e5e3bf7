//! Pure game model: coordinates, fields, fleets and boards.
//!
//! Everything here is synchronous and usable without `std`.

pub mod board;
pub mod common;
pub mod config;
pub mod coord;
pub mod field;
pub mod ship;

pub use board::Board;
pub use common::{CellState, ModelError, PlacementStatus, PlayerNumber, ShotOutcome};
pub use coord::Coord;
pub use field::Field;
pub use ship::{Ship, ShipSet};
