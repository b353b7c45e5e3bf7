/// Side of the stored grid, including the unused one-cell border.
pub const FIELD_SIZE: usize = 12;
/// Side of the playable area (rows A..K without J, columns 1..10).
pub const PLAYABLE_SIZE: usize = 10;
/// Number of playable cells; also the length of a serialized field.
pub const BOARD_CELLS: usize = PLAYABLE_SIZE * PLAYABLE_SIZE;

pub const NUM_SHIPS: usize = 10;
pub const MAX_SHIP_LEN: usize = 4;
/// Ship lengths in the order they are placed automatically.
pub const FLEET: [usize; NUM_SHIPS] = [4, 3, 3, 2, 2, 2, 1, 1, 1, 1];
pub const TOTAL_SHIP_CELLS: usize = 20;

pub const PACKET_COMMAND_SIZE: usize = 32;
pub const PACKET_ARG1_SIZE: usize = 384;
pub const PACKET_ARG2_SIZE: usize = 96;
pub const PACKET_SIZE: usize = PACKET_COMMAND_SIZE + PACKET_ARG1_SIZE + PACKET_ARG2_SIZE;

pub const MAX_SESSIONS: usize = 10;
pub const MAX_CLIENTS: usize = 20;
pub const MAX_NICKNAME_LEN: usize = 63;
pub const DEFAULT_NICKNAME: &str = "player";

pub const LEADERBOARD_FILE: &str = "leaderboard.txt";
pub const DEFAULT_BIND: &str = "0.0.0.0:8080";

/// How many ships of `length` a complete fleet holds.
pub const fn fleet_quota(length: usize) -> usize {
    if length >= 1 && length <= MAX_SHIP_LEN {
        MAX_SHIP_LEN + 1 - length
    } else {
        0
    }
}
