//! Interactive client flows: picking a session, placing ships and shooting.

use log::warn;

use crate::client::input::{Input, InputMux};
use crate::client::render::{render_field, LineSink, LEGEND};
use crate::client::view::{ClientView, Prompt, SessionEnd};
use crate::config::{FLEET, MAX_SESSIONS, MAX_SHIP_LEN};
use crate::protocol::{JoinTarget, PlacementMode, Request};
use crate::transport::FrameSink;
use crate::{Board, Coord, ModelError, PlacementStatus};

enum Step {
    Continue,
    End(SessionEnd),
}

pub struct ClientApp<W, K> {
    view: ClientView<K>,
    input: InputMux,
    writer: W,
    nickname: String,
    draft: Option<Board>,
}

impl<W: FrameSink, K: LineSink> ClientApp<W, K> {
    pub fn new(nickname: impl Into<String>, input: InputMux, writer: W, out: K) -> Self {
        ClientApp {
            view: ClientView::new(out),
            input,
            writer,
            nickname: nickname.into(),
            draft: None,
        }
    }

    pub fn view(&self) -> &ClientView<K> {
        &self.view
    }

    pub fn into_view(self) -> ClientView<K> {
        self.view
    }

    /// Play until the game ends, the user quits or the connection drops.
    /// A failed send counts as a dropped connection.
    pub async fn run(&mut self) -> SessionEnd {
        if let Err(Step::End(end)) = self.send(Request::SetNick(self.nickname.clone())).await {
            self.view.finish(end);
        }
        loop {
            if let Some(end) = self.view.finished() {
                return end;
            }
            let step = match self.view.prompt() {
                Prompt::SelectSession => self.select_session().await,
                Prompt::PlacementChoice => self.choose_placement().await,
                Prompt::ManualPlacement => self.manual_placement().await,
                Prompt::Shot => self.take_shot().await,
                Prompt::Waiting => self.wait().await,
            };
            if let Step::End(end) = step {
                self.view.finish(end);
            }
        }
    }

    async fn send(&mut self, request: Request) -> Result<(), Step> {
        self.writer.send(&request.to_packet()).await.map_err(|e| {
            warn!("failed to send to server: {}", e);
            Step::End(SessionEnd::Disconnected)
        })
    }

    /// Next trimmed line, or the step to take instead.
    async fn read(&mut self) -> Result<String, Step> {
        match self.input.next_input(&mut self.view).await {
            Input::Line(line) => {
                let line = line.trim().to_string();
                if line.eq_ignore_ascii_case("quit") {
                    let _ = self.send(Request::Disconnect).await;
                    return Err(Step::End(SessionEnd::Quit));
                }
                Ok(line)
            }
            Input::Interrupted => Err(Step::Continue),
            Input::Closed => Err(Step::End(SessionEnd::Disconnected)),
        }
    }

    async fn select_session(&mut self) -> Step {
        self.view
            .out()
            .prompt(&format!("Type session number (0-{}) or 'auto': ", MAX_SESSIONS - 1));
        let line = match self.read().await {
            Ok(line) => line,
            Err(step) => return step,
        };
        let target = if line.eq_ignore_ascii_case("auto") {
            JoinTarget::Auto
        } else {
            match line.parse::<usize>() {
                Ok(id) if id < MAX_SESSIONS => JoinTarget::Id(id as i64),
                _ => {
                    self.view.say("Please enter a session number or 'auto'.");
                    return Step::Continue;
                }
            }
        };
        if let Err(step) = self.send(Request::JoinSession(target)).await {
            return step;
        }
        self.view.join_requested();
        Step::Continue
    }

    async fn choose_placement(&mut self) -> Step {
        self.view.say("1) Place ships automatically");
        self.view.say("2) Place ships manually");
        self.view.out().prompt("Choose placement (1 or 2): ");
        let line = match self.read().await {
            Ok(line) => line,
            Err(step) => return step,
        };
        let mode = match line.as_str() {
            "1" | "auto" => PlacementMode::Auto,
            "2" | "manual" => PlacementMode::Manual,
            _ => {
                self.view.say("Please enter 1 or 2.");
                return Step::Continue;
            }
        };
        if let Err(step) = self.send(Request::PlacementChoice(mode)).await {
            return step;
        }
        self.view.set_prompt(Prompt::Waiting);
        Step::Continue
    }

    fn show_draft(&mut self) {
        let draft = self.draft.get_or_insert_with(Board::new);
        let mut lines = render_field(draft.field());
        let remaining: Vec<String> = (1..=MAX_SHIP_LEN)
            .rev()
            .map(|len| format!("{}-cell: {}", len, draft.ships().remaining(len)))
            .collect();
        lines.push(format!("Remaining ships: {}", remaining.join(", ")));
        for line in lines {
            self.view.say(&line);
        }
    }

    async fn manual_placement(&mut self) -> Step {
        self.show_draft();
        self.view
            .out()
            .prompt("Enter ship placement (e.g. A1-A4, D7 for one cell, 'reset'): ");
        let line = match self.read().await {
            Ok(line) => line,
            Err(step) => return step,
        };
        if line.is_empty() {
            return Step::Continue;
        }
        if line.eq_ignore_ascii_case("reset") {
            self.draft = Some(Board::new());
            return Step::Continue;
        }
        let draft = self.draft.get_or_insert_with(Board::new);
        if line.eq_ignore_ascii_case("done") {
            if !draft.ships().is_complete() {
                self.view.say(&format!("Place all {} ships first.", FLEET.len()));
                return Step::Continue;
            }
            return self.upload_draft().await;
        }
        match draft.place_manual(&line) {
            Ok(PlacementStatus::Placed) => self.view.say("Ship placed."),
            Ok(PlacementStatus::Complete) => {
                self.view.say("All ships placed!");
                return self.upload_draft().await;
            }
            Err(ModelError::QuotaExceeded) => self.view.say("No ships of that length left."),
            Err(e) => self.view.say(&format!("Error: {}", e)),
        }
        Step::Continue
    }

    async fn upload_draft(&mut self) -> Step {
        let Some(draft) = self.draft.take() else {
            return Step::Continue;
        };
        if let Err(step) = self.send(Request::FieldUpload(draft.field().encode())).await {
            return step;
        }
        if let Err(step) = self.send(Request::ShipPlaced).await {
            return step;
        }
        self.view.set_prompt(Prompt::Waiting);
        Step::Continue
    }

    async fn take_shot(&mut self) -> Step {
        self.view.show_boards();
        self.view.say(LEGEND);
        self.view.say("=== YOUR TURN ===");
        self.view.out().prompt("Enter shot coordinates (e.g. B4): ");
        let line = match self.read().await {
            Ok(line) => line,
            Err(step) => return step,
        };
        if let Err(e) = Coord::parse(&line) {
            self.view.say(&format!("{}: use a letter A-K (no J) and a number 1-10.", e));
            return Step::Continue;
        }
        if let Err(step) = self.send(Request::Shot(line)).await {
            return step;
        }
        self.view.set_prompt(Prompt::Waiting);
        Step::Continue
    }

    /// Nothing to ask. Lines typed now get a hint, or refresh the boards.
    async fn wait(&mut self) -> Step {
        let line = match self.read().await {
            Ok(line) => line,
            Err(step) => return step,
        };
        if line.eq_ignore_ascii_case("field") {
            if let Err(step) = self.send(Request::RequestField).await {
                return step;
            }
            self.view.show_boards();
        } else if !line.is_empty() {
            self.view.say("Please wait, it is not your move. Type 'quit' to leave.");
        }
        Step::Continue
    }
}
