use std::collections::HashSet;

use anyhow::{Context, Result};
use rayon::prelude::*;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::http_client::fetch_text;
use crate::stat_value::StatValue;

/// Season totals in the order the stats feed lists them.
pub type StatLine = Vec<(String, StatValue)>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub id: u32,
    pub full_name: String,
    pub link: String,
}

#[derive(Debug, Clone)]
pub struct Player {
    pub full_name: String,
    pub link: String,
    pub stats: StatLine,
}

#[derive(Debug, Deserialize)]
struct RosterResponse {
    #[serde(default)]
    roster: Vec<RosterSlot>,
}

#[derive(Debug, Deserialize)]
struct RosterSlot {
    person: Person,
}

#[derive(Debug, Deserialize)]
struct Person {
    id: u32,
    #[serde(rename = "fullName")]
    full_name: String,
    link: String,
}

#[derive(Debug, Deserialize)]
struct StatsResponse {
    #[serde(default)]
    stats: Vec<StatGroup>,
}

#[derive(Debug, Deserialize)]
struct StatGroup {
    #[serde(default)]
    splits: Vec<StatSplit>,
}

#[derive(Debug, Deserialize)]
struct StatSplit {
    #[serde(default)]
    stat: Map<String, Value>,
}

/// Roster in feed order. A name seen twice keeps its first slot.
pub fn parse_roster_json(raw: &str) -> Result<Vec<RosterEntry>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Err(anyhow::anyhow!("empty roster response"));
    }
    let parsed: RosterResponse = serde_json::from_str(trimmed).context("invalid roster json")?;

    let mut seen = HashSet::new();
    let mut entries = Vec::with_capacity(parsed.roster.len());
    for slot in parsed.roster {
        let person = slot.person;
        if !seen.insert(person.full_name.clone()) {
            warn!(player = %person.full_name, "duplicate roster name, keeping first entry");
            continue;
        }
        entries.push(RosterEntry {
            id: person.id,
            full_name: person.full_name,
            link: person.link,
        });
    }
    Ok(entries)
}

/// First split of the first stat group; players without one get an empty line.
pub fn parse_season_stats_json(raw: &str) -> Result<StatLine> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Err(anyhow::anyhow!("empty stats response"));
    }
    let parsed: StatsResponse = serde_json::from_str(trimmed).context("invalid stats json")?;

    let stat = parsed
        .stats
        .into_iter()
        .next()
        .and_then(|group| group.splits.into_iter().next())
        .map(|split| split.stat)
        .unwrap_or_default();

    Ok(stat
        .into_iter()
        .map(|(name, value)| (name, StatValue::coerce(value)))
        .collect())
}

pub fn roster_url(api_base: &str, team_id: u32) -> String {
    format!("{api_base}/api/v1/teams/{team_id}/roster")
}

pub fn season_stats_url(api_base: &str, link: &str) -> String {
    format!("{api_base}/{}/stats?stats=season", link.trim_start_matches('/'))
}

pub fn fetch_roster(client: &Client, api_base: &str, team_id: u32) -> Result<Vec<RosterEntry>> {
    let url = roster_url(api_base, team_id);
    let body = fetch_text(client, &url, &[]).context("roster request failed")?;
    parse_roster_json(&body)
}

pub fn fetch_player_stats(client: &Client, api_base: &str, entry: &RosterEntry) -> Result<Player> {
    let url = season_stats_url(api_base, &entry.link);
    let body = fetch_text(client, &url, &[])
        .with_context(|| format!("stats request failed for {}", entry.full_name))?;
    let stats = parse_season_stats_json(&body)
        .with_context(|| format!("bad stats payload for {}", entry.full_name))?;
    let player = Player {
        full_name: entry.full_name.clone(),
        link: entry.link.clone(),
        stats,
    };
    debug!(
        player = %player.full_name,
        link = %player.link,
        fields = player.stats.len(),
        "loaded season stats"
    );
    Ok(player)
}

/// Roster plus every player's season stats, in roster order. One failed player fails the lot.
pub fn fetch_roster_stats(
    client: &Client,
    api_base: &str,
    team_id: u32,
    parallelism: usize,
) -> Result<Vec<Player>> {
    let roster = fetch_roster(client, api_base, team_id)?;
    info!(team_id, players = roster.len(), "fetched roster");

    let players = with_fetch_pool(parallelism, || {
        roster
            .par_iter()
            .map(|entry| fetch_player_stats(client, api_base, entry))
            .collect::<Result<Vec<_>>>()
    })?;
    Ok(players)
}

fn with_fetch_pool<T>(threads: usize, action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    match rayon::ThreadPoolBuilder::new().num_threads(threads.max(1)).build() {
        Ok(pool) => pool.install(action),
        Err(_) => action(),
    }
}
