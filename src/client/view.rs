//! Client-side view of the game, updated from server packets.

use log::{debug, warn};

use crate::client::input::{Flow, PacketHandler};
use crate::client::render::{render_side_by_side, LineSink};
use crate::protocol::{GameOverReason, Packet, Reply, FIELD_UPLOAD_INVALID, NO_FIELD_UPLOADED};
use crate::{Field, PlayerNumber, ShotOutcome};

/// What the user is currently being asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    /// Nothing to ask; waiting on the server.
    Waiting,
    SelectSession,
    PlacementChoice,
    ManualPlacement,
    Shot,
}

/// How a client session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Won,
    Lost,
    OpponentLeft,
    ServerShutdown,
    /// The user asked to leave.
    Quit,
    /// The connection or input went away.
    Disconnected,
}

pub struct ClientView<K> {
    out: K,
    prompt: Prompt,
    finished: Option<SessionEnd>,
    session: Option<usize>,
    number: Option<PlayerNumber>,
    own: Field,
    enemy: Field,
    my_turn: bool,
    join_pending: bool,
}

impl<K: LineSink> ClientView<K> {
    pub fn new(out: K) -> Self {
        ClientView {
            out,
            prompt: Prompt::Waiting,
            finished: None,
            session: None,
            number: None,
            own: Field::new(),
            enemy: Field::new(),
            my_turn: false,
            join_pending: false,
        }
    }

    pub fn prompt(&self) -> Prompt {
        self.prompt
    }

    pub fn set_prompt(&mut self, prompt: Prompt) {
        self.prompt = prompt;
    }

    /// A join request is in flight; hold the session prompt until it is answered.
    pub fn join_requested(&mut self) {
        self.join_pending = true;
        self.prompt = Prompt::Waiting;
    }

    pub fn finished(&self) -> Option<SessionEnd> {
        self.finished
    }

    pub fn finish(&mut self, end: SessionEnd) {
        self.finished.get_or_insert(end);
    }

    pub fn session(&self) -> Option<usize> {
        self.session
    }

    pub fn number(&self) -> Option<PlayerNumber> {
        self.number
    }

    pub fn own_field(&self) -> &Field {
        &self.own
    }

    pub fn enemy_field(&self) -> &Field {
        &self.enemy
    }

    pub fn is_my_turn(&self) -> bool {
        self.my_turn
    }

    pub fn out(&mut self) -> &mut K {
        &mut self.out
    }

    pub fn into_output(self) -> K {
        self.out
    }

    pub fn say(&mut self, text: &str) {
        self.out.line(text);
    }

    pub fn show_boards(&mut self) {
        for line in render_side_by_side(&self.own, &self.enemy) {
            self.out.line(&line);
        }
    }

    fn on_reply(&mut self, reply: Reply) {
        match reply {
            Reply::Welcome(text) | Reply::Wait(text) | Reply::Raw(text) => self.say(&text),
            Reply::SessionList(list) => {
                self.say("=== AVAILABLE SESSIONS ===");
                for line in list.lines() {
                    self.out.line(line);
                }
                if self.session.is_none() && !self.join_pending {
                    self.prompt = Prompt::SelectSession;
                }
            }
            Reply::Leaderboard(board) => {
                self.say("=== LEADERBOARD ===");
                match board {
                    Some(text) => text.lines().for_each(|l| self.out.line(l)),
                    None => self.say("No wins recorded yet."),
                }
            }
            Reply::SessionCreated(id) => {
                self.session = Some(id);
                self.join_pending = false;
                self.say(&format!("Joined game session {}", id));
            }
            Reply::PlayerAssigned(number) => {
                self.number = Some(number);
                self.own = Field::new();
                self.enemy = Field::new();
                self.prompt = Prompt::Waiting;
                self.say(&format!("You are Player {}", number));
            }
            Reply::PlacementStart(_) => {
                self.say("=== SHIP PLACEMENT ===");
                self.prompt = Prompt::PlacementChoice;
            }
            Reply::ManualPlacement => self.prompt = Prompt::ManualPlacement,
            Reply::PlacementDone => {
                self.say("Ships placed. Waiting for the game to start...");
                self.prompt = Prompt::Waiting;
            }
            Reply::GameStart(number) => {
                self.number = Some(number);
                self.say("=== GAME STARTED! ===");
            }
            Reply::FieldUpdate(cells) => match Field::decode(&cells) {
                Ok(field) => self.own = field,
                Err(e) => warn!("ignoring bad field update: {}", e),
            },
            Reply::EnemyFogUpdate(cells) => match Field::decode(&cells) {
                Ok(field) => self.enemy = field,
                Err(e) => warn!("ignoring bad fog update: {}", e),
            },
            Reply::YourTurn => {
                self.my_turn = true;
                self.prompt = Prompt::Shot;
            }
            Reply::OpponentTurn => {
                self.my_turn = false;
                if self.prompt != Prompt::Waiting {
                    self.say("Opponent's turn. Waiting...");
                }
                self.prompt = Prompt::Waiting;
            }
            Reply::NotYourTurn => {
                self.my_turn = false;
                self.say("Wait for your turn!");
                self.prompt = Prompt::Waiting;
            }
            Reply::ShotResult { coord, outcome } => {
                let text = match outcome {
                    ShotOutcome::Hit => format!("{} -> HIT! Shoot again.", coord),
                    ShotOutcome::Miss => format!("{} -> miss.", coord),
                    ShotOutcome::Invalid => format!("{} -> invalid shot, try another cell.", coord),
                };
                self.say(&text);
            }
            Reply::OpponentShot { coord, outcome } => {
                let text = match outcome {
                    ShotOutcome::Hit => format!("Opponent shot at {} and hit your ship!", coord),
                    _ => format!("Opponent shot at {} and missed.", coord),
                };
                self.say(&text);
            }
            Reply::OpponentDisconnected => {
                self.say("Opponent disconnected. You win!");
                self.finish(SessionEnd::OpponentLeft);
            }
            Reply::GameOver(reason) => {
                self.say("=== GAME OVER ===");
                if matches!(reason, GameOverReason::Win | GameOverReason::Lose) {
                    self.show_boards();
                }
                let (text, end) = match reason {
                    GameOverReason::Win => ("You won!", SessionEnd::Won),
                    GameOverReason::Lose => ("You lost.", SessionEnd::Lost),
                    GameOverReason::ServerShutdown => ("The server is shutting down.", SessionEnd::ServerShutdown),
                };
                self.say(text);
                self.finish(end);
            }
            Reply::Error(reason) => {
                self.say(&format!("Server error: {}", reason));
                if self.session.is_none() {
                    self.join_pending = false;
                    self.prompt = Prompt::SelectSession;
                } else if reason == FIELD_UPLOAD_INVALID || reason == NO_FIELD_UPLOADED {
                    self.prompt = Prompt::PlacementChoice;
                }
            }
            Reply::Bye => {
                self.say("Goodbye.");
                self.finish(SessionEnd::Quit);
            }
        }
    }
}

impl<K: LineSink> PacketHandler for ClientView<K> {
    fn apply(&mut self, packet: Packet) -> Flow {
        let before = self.prompt;
        match Reply::from_packet(&packet) {
            Ok(reply) => {
                debug!("<- {}", packet.command());
                self.on_reply(reply);
            }
            Err(e) => {
                debug!("unrecognised packet: {}", e);
                self.say(&format!("SERVER: {}", packet));
            }
        }
        if self.prompt != before || self.finished.is_some() {
            Flow::Interrupt
        } else {
            Flow::Continue
        }
    }
}
