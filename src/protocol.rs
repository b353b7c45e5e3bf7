//! Wire protocol: the fixed 512-byte frame and the typed messages it carries.
//!
//! A frame is three NUL-padded text fields (command, arg1, arg2) of 32, 384
//! and 96 bytes. Text longer than a field is truncated so that at least one
//! NUL always terminates it.

use alloc::string::{String, ToString};
use core::fmt;

use crate::config::{
    DEFAULT_NICKNAME, MAX_NICKNAME_LEN, PACKET_ARG1_SIZE, PACKET_ARG2_SIZE, PACKET_COMMAND_SIZE, PACKET_SIZE,
};
use crate::{PlayerNumber, ShotOutcome};

pub const SET_NICK: &str = "SET_NICK";
pub const JOIN_SESSION: &str = "JOIN_SESSION";
pub const PLACEMENT_CHOICE: &str = "PLACEMENT_CHOICE";
pub const FIELD_UPLOAD: &str = "FIELD_UPLOAD";
pub const SHIP_PLACED: &str = "SHIP_PLACED";
pub const SHOT: &str = "SHOT";
pub const REQUEST_FIELD: &str = "REQUEST_FIELD";
pub const QUIT: &str = "QUIT";
pub const DISCONNECT: &str = "DISCONNECT";

pub const WELCOME: &str = "WELCOME";
pub const SESSION_LIST: &str = "SESSION_LIST";
pub const SESSION_CREATED: &str = "SESSION_CREATED";
pub const PLAYER_ASSIGNED: &str = "PLAYER_ASSIGNED";
pub const WAIT: &str = "WAIT";
pub const PLACEMENT_START: &str = "PLACEMENT_START";
pub const MANUAL_PLACEMENT: &str = "MANUAL_PLACEMENT";
pub const PLACEMENT_DONE: &str = "PLACEMENT_DONE";
pub const GAME_START: &str = "GAME_START";
pub const FIELD_UPDATE: &str = "FIELD_UPDATE";
pub const ENEMY_FOG_UPDATE: &str = "ENEMY_FOG_UPDATE";
pub const YOUR_TURN: &str = "YOUR_TURN";
pub const OPPONENT_TURN: &str = "OPPONENT_TURN";
pub const NOT_YOUR_TURN: &str = "NOT_YOUR_TURN";
pub const SHOT_RESULT: &str = "SHOT_RESULT";
pub const OPPONENT_SHOT: &str = "OPPONENT_SHOT";
pub const OPPONENT_DISCONNECTED: &str = "OPPONENT_DISCONNECTED";
pub const GAME_OVER: &str = "GAME_OVER";
pub const LEADERBOARD: &str = "LEADERBOARD";
pub const ERROR: &str = "ERROR";
pub const BYE: &str = "BYE";
pub const RAW: &str = "RAW";

/// Leaderboard payload sent when no scores are recorded.
pub const LEADERBOARD_EMPTY: &str = "EMPTY";

// Reasons carried by `ERROR`.
pub const NOT_IN_SESSION: &str = "NOT_IN_SESSION";
pub const ALREADY_IN_SESSION: &str = "ALREADY_IN_SESSION";
pub const WAITING_FOR_OPPONENT: &str = "WAITING_FOR_OPPONENT";
pub const GAME_NOT_STARTED: &str = "GAME_NOT_STARTED";
pub const GAME_ALREADY_STARTED: &str = "GAME_ALREADY_STARTED";
pub const GAME_IS_OVER: &str = "GAME_OVER";
pub const ALREADY_READY: &str = "ALREADY_READY";
pub const FIELD_UPLOAD_INVALID: &str = "FIELD_UPLOAD_INVALID";
pub const NO_FIELD_UPLOADED: &str = "NO_FIELD_UPLOADED";
pub const UNKNOWN_COMMAND: &str = "UNKNOWN_COMMAND";

/// One decoded frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Packet {
    command: String,
    arg1: String,
    arg2: String,
}

impl Packet {
    pub fn new(command: impl Into<String>, arg1: impl Into<String>, arg2: impl Into<String>) -> Self {
        Packet {
            command: command.into(),
            arg1: arg1.into(),
            arg2: arg2.into(),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn arg1(&self) -> &str {
        &self.arg1
    }

    pub fn arg2(&self) -> &str {
        &self.arg2
    }

    /// Lay the packet out as a zero-padded frame.
    pub fn encode(&self) -> [u8; PACKET_SIZE] {
        let mut frame = [0u8; PACKET_SIZE];
        let (command, rest) = frame.split_at_mut(PACKET_COMMAND_SIZE);
        let (arg1, arg2) = rest.split_at_mut(PACKET_ARG1_SIZE);
        put_field(command, &self.command);
        put_field(arg1, &self.arg1);
        put_field(arg2, &self.arg2);
        frame
    }

    /// Read each field up to its first NUL, never past the field's last byte.
    pub fn decode(frame: &[u8; PACKET_SIZE]) -> Packet {
        let (command, rest) = frame.split_at(PACKET_COMMAND_SIZE);
        let (arg1, arg2) = rest.split_at(PACKET_ARG1_SIZE);
        debug_assert_eq!(arg2.len(), PACKET_ARG2_SIZE);
        Packet {
            command: take_field(command),
            arg1: take_field(arg1),
            arg2: take_field(arg2),
        }
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.command, self.arg1, self.arg2)
    }
}

fn put_field(dst: &mut [u8], text: &str) {
    let mut n = text.len().min(dst.len() - 1);
    while !text.is_char_boundary(n) {
        n -= 1;
    }
    dst[..n].copy_from_slice(&text.as_bytes()[..n]);
}

fn take_field(src: &[u8]) -> String {
    let src = &src[..src.len() - 1];
    let end = src.iter().position(|&b| b == 0).unwrap_or(src.len());
    String::from_utf8_lossy(&src[..end]).into_owned()
}

/// Clean a requested nickname: trimmed, no whitespace, at most
/// `MAX_NICKNAME_LEN` bytes, never empty.
pub fn sanitize_nickname(raw: &str) -> String {
    let mut name: String = raw
        .trim()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    if name.len() > MAX_NICKNAME_LEN {
        let mut cut = MAX_NICKNAME_LEN;
        while !name.is_char_boundary(cut) {
            cut -= 1;
        }
        name.truncate(cut);
    }
    if name.is_empty() {
        DEFAULT_NICKNAME.to_string()
    } else {
        name
    }
}

/// Errors from turning a packet into a typed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    UnknownCommand(String),
    MissingArgument(&'static str),
    InvalidArgument(&'static str),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::UnknownCommand(cmd) => write!(f, "Unknown command: {}", cmd),
            ProtocolError::MissingArgument(cmd) => write!(f, "Missing argument for {}", cmd),
            ProtocolError::InvalidArgument(cmd) => write!(f, "Invalid argument for {}", cmd),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ProtocolError {}

/// Session selection in `JOIN_SESSION`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinTarget {
    /// `-1`: first session with room.
    Auto,
    /// Explicit id. Range is checked by the session table.
    Id(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementMode {
    Auto,
    Manual,
}

/// Client to server messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    SetNick(String),
    JoinSession(JoinTarget),
    PlacementChoice(PlacementMode),
    FieldUpload(String),
    ShipPlaced,
    Shot(String),
    RequestField,
    Quit,
    Disconnect,
}

impl Request {
    pub fn to_packet(&self) -> Packet {
        match self {
            Request::SetNick(name) => Packet::new(SET_NICK, name.as_str(), ""),
            Request::JoinSession(JoinTarget::Auto) => Packet::new(JOIN_SESSION, "-1", ""),
            Request::JoinSession(JoinTarget::Id(id)) => Packet::new(JOIN_SESSION, id.to_string(), ""),
            Request::PlacementChoice(PlacementMode::Auto) => Packet::new(PLACEMENT_CHOICE, "auto", ""),
            Request::PlacementChoice(PlacementMode::Manual) => Packet::new(PLACEMENT_CHOICE, "manual", ""),
            Request::FieldUpload(cells) => Packet::new(FIELD_UPLOAD, cells.as_str(), ""),
            Request::ShipPlaced => Packet::new(SHIP_PLACED, "manual", ""),
            Request::Shot(coord) => Packet::new(SHOT, coord.as_str(), ""),
            Request::RequestField => Packet::new(REQUEST_FIELD, "", ""),
            Request::Quit => Packet::new(QUIT, "", ""),
            Request::Disconnect => Packet::new(DISCONNECT, "", ""),
        }
    }

    pub fn from_packet(packet: &Packet) -> Result<Self, ProtocolError> {
        let arg1 = packet.arg1().trim();
        match packet.command() {
            SET_NICK => Ok(Request::SetNick(packet.arg1().to_string())),
            JOIN_SESSION => {
                if arg1.is_empty() {
                    return Err(ProtocolError::MissingArgument(JOIN_SESSION));
                }
                match arg1.parse::<i64>() {
                    Ok(-1) => Ok(Request::JoinSession(JoinTarget::Auto)),
                    Ok(id) => Ok(Request::JoinSession(JoinTarget::Id(id))),
                    Err(_) => Err(ProtocolError::InvalidArgument(JOIN_SESSION)),
                }
            }
            PLACEMENT_CHOICE => match arg1 {
                "auto" => Ok(Request::PlacementChoice(PlacementMode::Auto)),
                "manual" => Ok(Request::PlacementChoice(PlacementMode::Manual)),
                "" => Err(ProtocolError::MissingArgument(PLACEMENT_CHOICE)),
                _ => Err(ProtocolError::InvalidArgument(PLACEMENT_CHOICE)),
            },
            FIELD_UPLOAD => Ok(Request::FieldUpload(arg1.to_string())),
            SHIP_PLACED => Ok(Request::ShipPlaced),
            SHOT => Ok(Request::Shot(arg1.to_string())),
            REQUEST_FIELD => Ok(Request::RequestField),
            QUIT => Ok(Request::Quit),
            DISCONNECT => Ok(Request::Disconnect),
            other => Err(ProtocolError::UnknownCommand(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOverReason {
    Win,
    Lose,
    ServerShutdown,
}

impl GameOverReason {
    pub fn as_str(self) -> &'static str {
        match self {
            GameOverReason::Win => "WIN",
            GameOverReason::Lose => "LOSE",
            GameOverReason::ServerShutdown => "SERVER_SHUTDOWN",
        }
    }
}

/// Server to client messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Welcome(String),
    SessionList(String),
    SessionCreated(usize),
    PlayerAssigned(PlayerNumber),
    Wait(String),
    PlacementStart(PlayerNumber),
    ManualPlacement,
    PlacementDone,
    GameStart(PlayerNumber),
    FieldUpdate(String),
    EnemyFogUpdate(String),
    YourTurn,
    OpponentTurn,
    NotYourTurn,
    ShotResult { coord: String, outcome: ShotOutcome },
    OpponentShot { coord: String, outcome: ShotOutcome },
    OpponentDisconnected,
    GameOver(GameOverReason),
    /// `None` when nobody has won yet.
    Leaderboard(Option<String>),
    Error(String),
    Bye,
    Raw(String),
}

impl Reply {
    pub fn to_packet(&self) -> Packet {
        match self {
            Reply::Welcome(text) => Packet::new(WELCOME, text.as_str(), ""),
            Reply::SessionList(text) => Packet::new(SESSION_LIST, text.as_str(), ""),
            Reply::SessionCreated(id) => Packet::new(SESSION_CREATED, id.to_string(), ""),
            Reply::PlayerAssigned(n) => Packet::new(PLAYER_ASSIGNED, n.to_string(), ""),
            Reply::Wait(text) => Packet::new(WAIT, text.as_str(), ""),
            Reply::PlacementStart(n) => Packet::new(PLACEMENT_START, n.to_string(), ""),
            Reply::ManualPlacement => Packet::new(MANUAL_PLACEMENT, "", ""),
            Reply::PlacementDone => Packet::new(PLACEMENT_DONE, "", ""),
            Reply::GameStart(n) => Packet::new(GAME_START, n.to_string(), ""),
            Reply::FieldUpdate(cells) => Packet::new(FIELD_UPDATE, cells.as_str(), ""),
            Reply::EnemyFogUpdate(cells) => Packet::new(ENEMY_FOG_UPDATE, cells.as_str(), ""),
            Reply::YourTurn => Packet::new(YOUR_TURN, "", ""),
            Reply::OpponentTurn => Packet::new(OPPONENT_TURN, "", ""),
            Reply::NotYourTurn => Packet::new(NOT_YOUR_TURN, "", ""),
            Reply::ShotResult { coord, outcome } => Packet::new(SHOT_RESULT, coord.as_str(), outcome.as_str()),
            Reply::OpponentShot { coord, outcome } => Packet::new(OPPONENT_SHOT, coord.as_str(), outcome.as_str()),
            Reply::OpponentDisconnected => Packet::new(OPPONENT_DISCONNECTED, "", ""),
            Reply::GameOver(reason) => Packet::new(GAME_OVER, reason.as_str(), ""),
            Reply::Leaderboard(Some(text)) => Packet::new(LEADERBOARD, text.as_str(), ""),
            Reply::Leaderboard(None) => Packet::new(LEADERBOARD, LEADERBOARD_EMPTY, ""),
            Reply::Error(reason) => Packet::new(ERROR, reason.as_str(), ""),
            Reply::Bye => Packet::new(BYE, "", ""),
            Reply::Raw(text) => Packet::new(RAW, text.as_str(), ""),
        }
    }

    pub fn from_packet(packet: &Packet) -> Result<Self, ProtocolError> {
        let arg1 = packet.arg1();
        let player = |cmd: &'static str| {
            arg1.trim()
                .parse::<u8>()
                .ok()
                .and_then(PlayerNumber::from_u8)
                .ok_or(ProtocolError::InvalidArgument(cmd))
        };
        let shot = |cmd: &'static str| {
            ShotOutcome::parse(packet.arg2().trim()).ok_or(ProtocolError::InvalidArgument(cmd))
        };
        Ok(match packet.command() {
            WELCOME => Reply::Welcome(arg1.to_string()),
            SESSION_LIST => Reply::SessionList(arg1.to_string()),
            SESSION_CREATED => Reply::SessionCreated(
                arg1.trim()
                    .parse()
                    .map_err(|_| ProtocolError::InvalidArgument(SESSION_CREATED))?,
            ),
            PLAYER_ASSIGNED => Reply::PlayerAssigned(player(PLAYER_ASSIGNED)?),
            WAIT => Reply::Wait(arg1.to_string()),
            PLACEMENT_START => Reply::PlacementStart(player(PLACEMENT_START)?),
            MANUAL_PLACEMENT => Reply::ManualPlacement,
            PLACEMENT_DONE => Reply::PlacementDone,
            GAME_START => Reply::GameStart(player(GAME_START)?),
            FIELD_UPDATE => Reply::FieldUpdate(arg1.to_string()),
            ENEMY_FOG_UPDATE => Reply::EnemyFogUpdate(arg1.to_string()),
            YOUR_TURN => Reply::YourTurn,
            OPPONENT_TURN => Reply::OpponentTurn,
            NOT_YOUR_TURN => Reply::NotYourTurn,
            SHOT_RESULT => Reply::ShotResult {
                coord: arg1.to_string(),
                outcome: shot(SHOT_RESULT)?,
            },
            OPPONENT_SHOT => Reply::OpponentShot {
                coord: arg1.to_string(),
                outcome: shot(OPPONENT_SHOT)?,
            },
            OPPONENT_DISCONNECTED => Reply::OpponentDisconnected,
            GAME_OVER => Reply::GameOver(match arg1.trim() {
                "WIN" => GameOverReason::Win,
                "LOSE" => GameOverReason::Lose,
                "SERVER_SHUTDOWN" => GameOverReason::ServerShutdown,
                _ => return Err(ProtocolError::InvalidArgument(GAME_OVER)),
            }),
            LEADERBOARD if arg1 == LEADERBOARD_EMPTY || arg1.is_empty() => Reply::Leaderboard(None),
            LEADERBOARD => Reply::Leaderboard(Some(arg1.to_string())),
            ERROR => Reply::Error(arg1.to_string()),
            BYE => Reply::Bye,
            RAW => Reply::Raw(arg1.to_string()),
            other => return Err(ProtocolError::UnknownCommand(other.to_string())),
        })
    }
}
