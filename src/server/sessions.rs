//! Session table: up to `MAX_SESSIONS` two-seat games, addressed by id.

use std::fmt;

use serde::Serialize;

use crate::arena::Handle;
use crate::config::PACKET_ARG1_SIZE;
use crate::protocol::JoinTarget;
use crate::PlayerNumber;

pub type PlayerId = Handle;
pub type SessionId = usize;

/// Listing text when the table has no slots at all.
pub const NO_SESSIONS: &str = "No sessions available. New sessions will be created automatically.\n";

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for a second player.
    Forming,
    /// Both seated, fleets being placed.
    Placement,
    /// Shots being exchanged.
    Active,
    /// A fleet was sunk.
    Over,
}

#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    seats: [Option<PlayerId>; 2],
    pub phase: Phase,
    pub turn: PlayerNumber,
}

impl Session {
    fn new(id: SessionId) -> Self {
        Session {
            id,
            seats: [None, None],
            phase: Phase::Forming,
            turn: PlayerNumber::One,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn occupant(&self, number: PlayerNumber) -> Option<PlayerId> {
        self.seats[number.slot()]
    }

    pub fn occupants(&self) -> impl Iterator<Item = (PlayerNumber, PlayerId)> + '_ {
        [PlayerNumber::One, PlayerNumber::Two]
            .into_iter()
            .filter_map(move |n| self.occupant(n).map(|p| (n, p)))
    }

    pub fn occupancy(&self) -> usize {
        self.seats.iter().flatten().count()
    }

    pub fn is_full(&self) -> bool {
        self.occupancy() == 2
    }

    pub fn number_of(&self, player: PlayerId) -> Option<PlayerNumber> {
        self.occupants().find(|&(_, p)| p == player).map(|(n, _)| n)
    }

    fn seat(&mut self, player: PlayerId) -> Option<PlayerNumber> {
        let slot = self.seats.iter().position(Option::is_none)?;
        self.seats[slot] = Some(player);
        Some(if slot == 0 { PlayerNumber::One } else { PlayerNumber::Two })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinError {
    /// Explicit id outside `0..capacity`.
    OutOfRange,
    /// The requested session already has two players.
    Full,
    /// Auto join found no session with room.
    NoCapacity,
}

impl fmt::Display for JoinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinError::OutOfRange => write!(f, "Invalid session number"),
            JoinError::Full | JoinError::NoCapacity => write!(f, "Session is full or unavailable"),
        }
    }
}

impl std::error::Error for JoinError {}

/// What a release left behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Released {
    pub opponent: Option<PlayerId>,
    pub freed: bool,
}

/// Snapshot of one session for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub id: SessionId,
    pub players: [Option<String>; 2],
}

impl SessionSummary {
    pub fn occupancy(&self) -> usize {
        self.players.iter().flatten().count()
    }
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.occupancy() == 0 {
            return write!(f, "Session {}: EMPTY (0/2 players)", self.id);
        }
        let name = |i: usize| self.players[i].as_deref().unwrap_or("Waiting...");
        write!(
            f,
            "Session {}: {} vs {} ({}/2 players)",
            self.id,
            name(0),
            name(1),
            self.occupancy()
        )
    }
}

pub struct SessionTable {
    sessions: Vec<Option<Session>>,
}

impl SessionTable {
    pub fn new(capacity: usize) -> Self {
        SessionTable {
            sessions: (0..capacity).map(|_| None).collect(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.sessions.len()
    }

    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(id)?.as_ref()
    }

    pub fn get_mut(&mut self, id: SessionId) -> Option<&mut Session> {
        self.sessions.get_mut(id)?.as_mut()
    }

    /// Seat `player`, allocating the session on first use. With
    /// [`JoinTarget::Auto`] the first session, in id order, that is
    /// unallocated or has exactly one occupant is chosen.
    pub fn assign(&mut self, player: PlayerId, target: JoinTarget) -> Result<(SessionId, PlayerNumber), JoinError> {
        let id = match target {
            JoinTarget::Auto => self
                .sessions
                .iter()
                .position(|s| s.as_ref().map_or(true, |s| s.occupancy() == 1 && s.phase == Phase::Forming))
                .ok_or(JoinError::NoCapacity)?,
            JoinTarget::Id(id) => {
                if id < 0 || id as usize >= self.sessions.len() {
                    return Err(JoinError::OutOfRange);
                }
                id as usize
            }
        };
        let session = self.sessions[id].get_or_insert_with(|| Session::new(id));
        if session.phase != Phase::Forming {
            return Err(JoinError::Full);
        }
        let number = session.seat(player).ok_or(JoinError::Full)?;
        Ok((id, number))
    }

    /// Remove `player` from session `id`. A session left with no occupants
    /// is freed and its id becomes available again.
    pub fn release(&mut self, id: SessionId, player: PlayerId) -> Released {
        let Some(session) = self.get_mut(id) else {
            return Released {
                opponent: None,
                freed: false,
            };
        };
        for seat in session.seats.iter_mut() {
            if *seat == Some(player) {
                *seat = None;
            }
        }
        let opponent = session.seats.iter().flatten().next().copied();
        let freed = opponent.is_none();
        if freed {
            self.sessions[id] = None;
        }
        Released { opponent, freed }
    }

    pub fn summaries<'a>(&self, name_of: impl Fn(PlayerId) -> Option<&'a str>) -> Vec<SessionSummary> {
        (0..self.sessions.len())
            .map(|id| {
                let players = match self.get(id) {
                    Some(s) => [
                        s.occupant(PlayerNumber::One).and_then(&name_of).map(str::to_string),
                        s.occupant(PlayerNumber::Two).and_then(&name_of).map(str::to_string),
                    ],
                    None => [None, None],
                };
                SessionSummary { id, players }
            })
            .collect()
    }
}

/// Session listing as sent in `SESSION_LIST`: occupied sessions first, then
/// free slots. Lines that would overflow a packet field are left out.
pub fn format_session_list(summaries: &[SessionSummary]) -> String {
    let (occupied, free): (Vec<_>, Vec<_>) = summaries.iter().partition(|s| s.occupancy() > 0);
    let mut out = String::new();
    for summary in occupied.into_iter().chain(free) {
        let line = format!("{}\n", summary);
        if out.len() + line.len() < PACKET_ARG1_SIZE {
            out.push_str(&line);
        }
    }
    if out.is_empty() {
        out.push_str(NO_SESSIONS);
    }
    out
}
