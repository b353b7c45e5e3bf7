//! Text rendering of fields and the output sink the client writes to.

use std::io::{self, Write};

use crate::config::PLAYABLE_SIZE;
use crate::coord::ROW_LETTERS;
use crate::{CellState, Coord, Field};

/// Where the client writes user-facing text.
pub trait LineSink: Send {
    fn line(&mut self, text: &str);
    /// Text that expects an answer on the same line.
    fn prompt(&mut self, text: &str);
}

/// Terminal output.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl LineSink for StdoutSink {
    fn line(&mut self, text: &str) {
        println!("{}", text);
    }

    fn prompt(&mut self, text: &str) {
        print!("{}", text);
        let _ = io::stdout().flush();
    }
}

/// Captures output, prompts included, one entry per call.
impl LineSink for Vec<String> {
    fn line(&mut self, text: &str) {
        self.push(text.to_string());
    }

    fn prompt(&mut self, text: &str) {
        self.push(text.to_string());
    }
}

fn symbol(state: CellState) -> char {
    match state {
        CellState::Empty => '.',
        CellState::Ship => 'S',
        CellState::Miss => 'o',
        CellState::Hit => 'X',
    }
}

fn header() -> String {
    let mut out = String::from("   ");
    for c in 1..=PLAYABLE_SIZE {
        out.push_str(&format!("{:>2}", c));
    }
    out
}

fn row_text(field: &Field, row: usize) -> String {
    let mut out = format!(" {} ", ROW_LETTERS[row] as char);
    for col in 0..PLAYABLE_SIZE {
        let state = Coord::new(row, col).map(|c| field.get(c)).unwrap_or_default();
        out.push(' ');
        out.push(symbol(state));
    }
    out
}

/// One field with row letters and column numbers.
pub fn render_field(field: &Field) -> Vec<String> {
    let mut lines = vec![header()];
    lines.extend((0..PLAYABLE_SIZE).map(|r| row_text(field, r)));
    lines
}

/// Own field and the fogged enemy view next to each other.
pub fn render_side_by_side(own: &Field, enemy: &Field) -> Vec<String> {
    let width = header().len();
    let mut lines = vec![
        format!("{:<width$}    {}", "YOUR FIELD", "ENEMY FIELD", width = width),
        format!("{:<width$}    {}", header(), header(), width = width),
    ];
    for r in 0..PLAYABLE_SIZE {
        lines.push(format!(
            "{:<width$}    {}",
            row_text(own, r),
            row_text(enemy, r),
            width = width
        ));
    }
    lines
}

/// Legend printed under boards.
pub const LEGEND: &str = "Legend: S ship, X hit, o miss, . unknown";
