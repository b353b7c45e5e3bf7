//! Common model types: cell states, shot outcomes and model errors.

use core::fmt;

/// State of a single grid cell. The discriminant is the wire digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum CellState {
    #[default]
    Empty = 0,
    Ship = 1,
    Miss = 2,
    Hit = 3,
}

impl CellState {
    pub fn as_digit(self) -> u8 {
        b'0' + self as u8
    }

    pub fn from_digit(digit: u8) -> Option<Self> {
        match digit {
            b'0' => Some(CellState::Empty),
            b'1' => Some(CellState::Ship),
            b'2' => Some(CellState::Miss),
            b'3' => Some(CellState::Hit),
            _ => None,
        }
    }
}

/// Result of resolving a shot against a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShotOutcome {
    Hit,
    Miss,
    /// Malformed coordinate or a cell that was already shot.
    Invalid,
}

impl ShotOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            ShotOutcome::Hit => "HIT",
            ShotOutcome::Miss => "MISS",
            ShotOutcome::Invalid => "INVALID",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "HIT" => Some(ShotOutcome::Hit),
            "MISS" => Some(ShotOutcome::Miss),
            "INVALID" => Some(ShotOutcome::Invalid),
            _ => None,
        }
    }
}

impl fmt::Display for ShotOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Successful outcomes of a manual placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementStatus {
    /// Ship placed, fleet still incomplete.
    Placed,
    /// Ship placed and the fleet is now complete.
    Complete,
}

/// Seat of a player within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerNumber {
    One,
    Two,
}

impl PlayerNumber {
    pub fn other(self) -> Self {
        match self {
            PlayerNumber::One => PlayerNumber::Two,
            PlayerNumber::Two => PlayerNumber::One,
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            PlayerNumber::One => 1,
            PlayerNumber::Two => 2,
        }
    }

    pub fn from_u8(n: u8) -> Option<Self> {
        match n {
            1 => Some(PlayerNumber::One),
            2 => Some(PlayerNumber::Two),
            _ => None,
        }
    }

    pub fn slot(self) -> usize {
        self.as_u8() as usize - 1
    }
}

impl fmt::Display for PlayerNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// Errors returned by coordinate parsing, placement and layout validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// Coordinate text is not a letter A..K (no J) followed by 1..10.
    InvalidCoordinate,
    /// Placement is not a straight run of 1..4 cells, overlaps or touches another ship.
    InvalidPlacement,
    /// No ship of this length is left to place.
    QuotaExceeded,
    /// An uploaded layout is not a legal complete fleet.
    InvalidLayout(&'static str),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::InvalidCoordinate => write!(f, "Invalid coordinate"),
            ModelError::InvalidPlacement => write!(f, "Invalid ship placement"),
            ModelError::QuotaExceeded => write!(f, "No ships of that length left to place"),
            ModelError::InvalidLayout(why) => write!(f, "Invalid layout: {}", why),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ModelError {}
