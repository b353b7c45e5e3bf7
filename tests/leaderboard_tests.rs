use std::path::PathBuf;

use seabattle::leaderboard::{format_leaderboard, parse_entries};
use seabattle::{FileLeaderboard, MemoryLeaderboard, ScoreEntry, ScoreStore};

fn temp_path(tag: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("seabattle-{}-{}.txt", tag, std::process::id()));
    let _ = std::fs::remove_file(&path);
    path
}

#[test]
fn missing_file_is_empty() {
    let board = FileLeaderboard::new(temp_path("missing"));
    assert!(board.entries().unwrap().is_empty());
}

#[test]
fn wins_accumulate_in_file() -> anyhow::Result<()> {
    let path = temp_path("wins");
    let mut board = FileLeaderboard::new(&path);
    board.record_win("ann")?;
    board.record_win("bob")?;
    board.record_win("ann")?;

    let text = std::fs::read_to_string(&path)?;
    assert_eq!(text, "ann 2\nbob 1\n");

    // a fresh handle sees the same data
    let again = FileLeaderboard::new(&path);
    assert_eq!(again.entries()?.len(), 2);
    std::fs::remove_file(&path)?;
    Ok(())
}

#[test]
fn malformed_lines_are_skipped() {
    let entries = parse_entries("ann 3\ngarbage\nbob x\n\ncid 1\n");
    assert_eq!(
        entries,
        vec![
            ScoreEntry { name: "ann".into(), score: 3 },
            ScoreEntry { name: "cid".into(), score: 1 },
        ]
    );
}

#[test]
fn payload_formatting() {
    assert_eq!(format_leaderboard(&[]), None);
    let mut memory = MemoryLeaderboard::new();
    memory.record_win("ann").unwrap();
    let text = format_leaderboard(&memory.entries().unwrap()).unwrap();
    assert_eq!(text, "ann 1\n");

    let many: Vec<ScoreEntry> = (0..100)
        .map(|i| ScoreEntry { name: format!("player{:03}", i), score: i })
        .collect();
    let text = format_leaderboard(&many).unwrap();
    assert!(text.len() < 384);
    assert!(text.ends_with('\n'));
}
