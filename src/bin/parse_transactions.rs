use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use mlb_player_features::injuries::{extract_injuries, NameMatch};

// Runs the injury matcher against a saved transactions page, no network involved.
// Usage: parse_transactions <page.html> [--word] <player name>...
fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .map(PathBuf::from)
        .context("usage: parse_transactions <page.html> [--word] <player name>...")?;

    let mut mode = NameMatch::Substring;
    let mut names = Vec::new();
    for arg in args {
        if arg == "--word" {
            mode = NameMatch::WordBoundary;
        } else {
            names.push(arg);
        }
    }
    if names.is_empty() {
        return Err(anyhow::anyhow!("no player names given"));
    }

    let html = fs::read_to_string(&path)
        .with_context(|| format!("failed reading {}", path.display()))?;
    let counts = extract_injuries(&html, &names, mode);

    for name in &names {
        println!("{name}: {}", counts.get(name));
    }
    println!("{} of {} players placed at least once", counts.injured_players(), names.len());
    Ok(())
}
