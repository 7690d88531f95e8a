use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::http_client::fetch_text;

pub const AMERICAN_LEAGUE_ID: u32 = 103;
pub const NATIONAL_LEAGUE_ID: u32 = 104;
const QUALIFYING_LEAGUES: [u32; 2] = [AMERICAN_LEAGUE_ID, NATIONAL_LEAGUE_ID];

pub const TEAM_PROMPT: &str = "What is your favorite MLB team? ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    pub id: u32,
    pub name: String,
    pub club_name: String,
    pub abbreviation: String,
    pub league_id: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(Team),
    NotFound,
    Ambiguous(Vec<Team>),
}

#[derive(Debug, Deserialize)]
struct TeamsResponse {
    #[serde(default)]
    teams: Vec<TeamListing>,
}

#[derive(Debug, Deserialize)]
struct TeamListing {
    id: u32,
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "clubName")]
    club_name: Option<String>,
    #[serde(default)]
    abbreviation: Option<String>,
    league: Option<LeagueRef>,
    sport: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct LeagueRef {
    id: Option<u32>,
}

pub fn fetch_teams(client: &Client, api_base: &str) -> Result<Vec<Team>> {
    let url = format!("{api_base}/api/v1/teams");
    let body = fetch_text(client, &url, &[]).context("teams request failed")?;
    let teams = parse_teams_json(&body)?;
    debug!(count = teams.len(), "loaded team listing");
    Ok(teams)
}

/// Keeps listings that carry a league id, a sport and a club name; the rest can never match.
pub fn parse_teams_json(raw: &str) -> Result<Vec<Team>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Err(anyhow::anyhow!("empty teams response"));
    }
    let parsed: TeamsResponse = serde_json::from_str(trimmed).context("invalid teams json")?;

    let teams = parsed
        .teams
        .into_iter()
        .filter(|listing| listing.sport.is_some())
        .filter_map(|listing| {
            let league_id = listing.league.as_ref().and_then(|l| l.id)?;
            let club_name = listing.club_name?;
            Some(Team {
                id: listing.id,
                name: listing.name.unwrap_or_else(|| club_name.clone()),
                club_name,
                abbreviation: listing.abbreviation.unwrap_or_default(),
                league_id,
            })
        })
        .collect();
    Ok(teams)
}

pub fn resolve_team(teams: &[Team], input: &str) -> Resolution {
    let wanted = input.trim().to_lowercase();
    if wanted.is_empty() {
        return Resolution::NotFound;
    }

    let mut matches: Vec<Team> = teams
        .iter()
        .filter(|team| QUALIFYING_LEAGUES.contains(&team.league_id))
        .filter(|team| team.club_name.to_lowercase() == wanted)
        .cloned()
        .collect();

    match matches.len() {
        0 => Resolution::NotFound,
        1 => Resolution::Found(matches.remove(0)),
        _ => Resolution::Ambiguous(matches),
    }
}

/// What the user typed alongside the team it resolved to; the raw text names the output file.
#[derive(Debug, Clone)]
pub struct TeamChoice {
    pub input: String,
    pub team: Team,
}

/// Asks until a club name matches. `max_attempts` of `None` means no limit;
/// running out of input always stops the loop.
pub fn prompt_for_team(
    teams: &[Team],
    input: &mut impl BufRead,
    output: &mut impl Write,
    max_attempts: Option<u32>,
) -> Result<TeamChoice> {
    let mut attempts = 0u32;
    loop {
        if let Some(limit) = max_attempts {
            if attempts >= limit {
                return Err(anyhow::anyhow!(
                    "no team matched after {limit} attempt(s)"
                ));
            }
        }
        attempts = attempts.saturating_add(1);

        write!(output, "{TEAM_PROMPT}").context("failed writing prompt")?;
        output.flush().context("failed flushing prompt")?;

        let mut line = String::new();
        let read = input.read_line(&mut line).context("failed reading team name")?;
        if read == 0 {
            return Err(anyhow::anyhow!("input closed before a team was chosen"));
        }
        let typed = line.trim_end_matches(['\r', '\n']).to_string();

        match resolve_team(teams, &typed) {
            Resolution::Found(team) => {
                info!(team_id = team.id, team = %team.name, "resolved team");
                return Ok(TeamChoice { input: typed, team });
            }
            Resolution::NotFound => {
                debug!(input = %typed, "no team matched");
            }
            Resolution::Ambiguous(found) => return Err(ambiguous_error(&typed, &found)),
        }
    }
}

/// Single non-interactive attempt, used when the team is passed on the command line.
pub fn choose_team(teams: &[Team], typed: &str) -> Result<TeamChoice> {
    match resolve_team(teams, typed) {
        Resolution::Found(team) => {
            info!(team_id = team.id, team = %team.name, "resolved team");
            Ok(TeamChoice {
                input: typed.to_string(),
                team,
            })
        }
        Resolution::NotFound => Err(anyhow::anyhow!("no MLB club named {typed:?}")),
        Resolution::Ambiguous(found) => Err(ambiguous_error(typed, &found)),
    }
}

fn ambiguous_error(typed: &str, found: &[Team]) -> anyhow::Error {
    let ids = found
        .iter()
        .map(|team| format!("{} ({})", team.name, team.id))
        .collect::<Vec<_>>()
        .join(", ");
    warn!(input = %typed, candidates = found.len(), "club name is ambiguous");
    anyhow::anyhow!("club name {typed:?} matches more than one team: {ids}")
}
