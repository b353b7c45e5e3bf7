//! Persistent win counts.
//!
//! The file holds one `name score` pair per line. It is re-read on every
//! access and rewritten whole on every win.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::PACKET_ARG1_SIZE;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreEntry {
    pub name: String,
    pub score: u32,
}

/// Where wins are recorded.
pub trait ScoreStore: Send {
    fn record_win(&mut self, name: &str) -> io::Result<()>;
    fn entries(&self) -> io::Result<Vec<ScoreEntry>>;
}

/// Leaderboard backed by a text file.
pub struct FileLeaderboard {
    path: PathBuf,
}

impl FileLeaderboard {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileLeaderboard { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ScoreStore for FileLeaderboard {
    fn record_win(&mut self, name: &str) -> io::Result<()> {
        let mut entries = self.entries()?;
        bump(&mut entries, name);
        let mut out = Vec::new();
        for e in &entries {
            writeln!(out, "{} {}", e.name, e.score)?;
        }
        fs::write(&self.path, out)
    }

    fn entries(&self) -> io::Result<Vec<ScoreEntry>> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(parse_entries(&text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }
}

/// In-process leaderboard, used by the self-play harness and tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryLeaderboard {
    entries: Vec<ScoreEntry>,
}

impl MemoryLeaderboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScoreStore for MemoryLeaderboard {
    fn record_win(&mut self, name: &str) -> io::Result<()> {
        bump(&mut self.entries, name);
        Ok(())
    }

    fn entries(&self) -> io::Result<Vec<ScoreEntry>> {
        Ok(self.entries.clone())
    }
}

fn bump(entries: &mut Vec<ScoreEntry>, name: &str) {
    match entries.iter_mut().find(|e| e.name == name) {
        Some(e) => e.score += 1,
        None => entries.push(ScoreEntry {
            name: name.to_string(),
            score: 1,
        }),
    }
}

/// Parse `name score` lines, skipping anything malformed.
pub fn parse_entries(text: &str) -> Vec<ScoreEntry> {
    text.lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let name = parts.next()?;
            let score = parts.next()?.parse().ok()?;
            Some(ScoreEntry {
                name: name.to_string(),
                score,
            })
        })
        .collect()
}

/// Render entries as a leaderboard payload, dropping lines that would not
/// fit in a packet field. `None` when there is nothing to show.
pub fn format_leaderboard(entries: &[ScoreEntry]) -> Option<String> {
    let mut out = String::new();
    for e in entries {
        let line = format!("{} {}\n", e.name, e.score);
        if out.len() + line.len() >= PACKET_ARG1_SIZE {
            break;
        }
        out.push_str(&line);
    }
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}
