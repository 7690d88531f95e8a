use std::collections::HashMap;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use scraper::{Html, Selector};
use tracing::{debug, info};

use crate::http_client::fetch_page;

// ESPN renders every transaction as one of these cells.
const TRANSACTION_CELL: &str = "td.Table__TD";
const IL_MARKER: &str = "(IL)";
const PLACED: &str = "Placed";
const DAY_IL: &str = "-day IL";
// "Placed " in front of the names, "on the 10" behind them.
const PLACED_TRIM: isize = 7;
const DAY_IL_TRIM: isize = 9;

/// How a roster name is looked up inside a transaction's name span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameMatch {
    /// Plain containment. "Luis Garcia" also hits "Luis Garcia Jr.".
    Substring,
    /// Containment with no letter or digit directly on either side.
    WordBoundary,
}

impl NameMatch {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "substring" | "sub" => Some(NameMatch::Substring),
            "word" | "word-boundary" | "token" => Some(NameMatch::WordBoundary),
            _ => None,
        }
    }

    fn matches(self, haystack: &str, name: &str) -> bool {
        match self {
            NameMatch::Substring => haystack.contains(name),
            NameMatch::WordBoundary => contains_word(haystack, name),
        }
    }
}

/// Injured-list placements per roster name. Unknown names read as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InjuryCounts {
    counts: HashMap<String, u32>,
}

impl InjuryCounts {
    pub fn for_players<S: AsRef<str>>(names: &[S]) -> Self {
        Self {
            counts: names
                .iter()
                .map(|name| (name.as_ref().to_string(), 0))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> u32 {
        self.counts.get(name).copied().unwrap_or(0)
    }

    pub fn injured_players(&self) -> usize {
        self.counts.values().filter(|n| **n > 0).count()
    }

    fn credit(&mut self, name: &str) {
        *self.counts.entry(name.to_string()).or_insert(0) += 1;
    }
}

pub fn transactions_url(base: &str, abbreviation: &str) -> String {
    format!("{base}/{}/", abbreviation.trim().to_lowercase())
}

pub fn fetch_transactions_page(client: &Client, base: &str, abbreviation: &str) -> Result<String> {
    let url = transactions_url(base, abbreviation);
    info!(%url, "fetching transactions");
    fetch_page(client, &url).context("transactions request failed")
}

/// Counts "Placed ... on the N-day IL" transactions per known player.
/// A page that doesn't look like ESPN's just yields zeros.
pub fn extract_injuries<S: AsRef<str>>(html: &str, players: &[S], mode: NameMatch) -> InjuryCounts {
    let mut counts = InjuryCounts::for_players(players);
    let Ok(selector) = Selector::parse(TRANSACTION_CELL) else {
        return counts;
    };
    let document = Html::parse_document(html);

    let mut placements = 0usize;
    for cell in document.select(&selector) {
        let text: String = cell.text().collect();
        if !is_placement(&text, players) {
            continue;
        }
        placements += 1;

        let span = name_span(&text);
        for name in players {
            let name = name.as_ref();
            if mode.matches(span, name) {
                counts.credit(name);
            }
        }
    }

    debug!(placements, injured = counts.injured_players(), "scanned transactions");
    counts
}

fn is_placement<S: AsRef<str>>(text: &str, players: &[S]) -> bool {
    text.contains(IL_MARKER)
        && text.contains(PLACED)
        && players.iter().any(|name| text.contains(name.as_ref()))
}

/// The stretch between the last "Placed" and the last "-day IL", minus the filler words.
pub fn name_span(text: &str) -> &str {
    let placed = text.rfind(PLACED).map_or(-1, |idx| idx as isize);
    let day_il = text.rfind(DAY_IL).map_or(-1, |idx| idx as isize);
    slice_clamped(text, placed + PLACED_TRIM, day_il - DAY_IL_TRIM)
}

/// Slice with negative indices counted from the end and out-of-range bounds clamped.
fn slice_clamped(text: &str, start: isize, end: isize) -> &str {
    let len = text.len() as isize;
    let resolve = |idx: isize| -> usize {
        let idx = if idx < 0 { idx + len } else { idx };
        idx.clamp(0, len) as usize
    };
    let start = floor_char_boundary(text, resolve(start));
    let end = floor_char_boundary(text, resolve(end));
    if start >= end {
        return "";
    }
    &text[start..end]
}

fn floor_char_boundary(text: &str, mut idx: usize) -> usize {
    while idx > 0 && !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn contains_word(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.match_indices(needle).any(|(idx, _)| {
        let before = haystack[..idx].chars().next_back();
        let after = haystack[idx + needle.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}
