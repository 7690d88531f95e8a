use std::path::PathBuf;

use anyhow::Result;
use reqwest::blocking::Client;
use tracing::info;

use crate::config::RunConfig;
use crate::export::{build_records, output_path, FeatureTable};
use crate::injuries::{extract_injuries, fetch_transactions_page};
use crate::roster::fetch_roster_stats;
use crate::teams::TeamChoice;

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub team_name: String,
    pub path: PathBuf,
    pub players: usize,
    pub injured_players: usize,
}

/// Roster stats, then injuries, then the CSV. Nothing is written unless every fetch succeeds.
pub fn run_export(client: &Client, config: &RunConfig, choice: &TeamChoice) -> Result<ExportSummary> {
    let team = &choice.team;

    let players = fetch_roster_stats(
        client,
        &config.stats_api_base,
        team.id,
        config.fetch_parallelism,
    )?;
    let names: Vec<&str> = players.iter().map(|p| p.full_name.as_str()).collect();

    let page = fetch_transactions_page(client, &config.transactions_base, &team.abbreviation)?;
    let injuries = extract_injuries(&page, &names, config.name_match);
    info!(
        injured = injuries.injured_players(),
        players = names.len(),
        "matched injury transactions"
    );

    let table = FeatureTable::from_records(&build_records(&players, &injuries));
    let path = output_path(&config.output_dir, &choice.input);
    table.write_csv(&path)?;
    info!(path = %path.display(), rows = table.rows.len(), "export complete");

    Ok(ExportSummary {
        team_name: team.name.clone(),
        path,
        players: table.rows.len(),
        injured_players: injuries.injured_players(),
    })
}
