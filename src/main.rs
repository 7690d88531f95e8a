use std::io;
use std::process::ExitCode;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use mlb_player_features::config::RunConfig;
use mlb_player_features::http_client::http_client;
use mlb_player_features::pipeline::run_export;
use mlb_player_features::teams::{choose_team, fetch_teams, prompt_for_team};

fn main() -> ExitCode {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    init_tracing();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let config = RunConfig::from_env();
    let client = http_client()?;

    let teams = fetch_teams(client, &config.stats_api_base)?;
    let choice = match parse_team_arg() {
        Some(name) => choose_team(&teams, &name)?,
        None => {
            let stdin = io::stdin();
            let mut stdout = io::stdout();
            prompt_for_team(
                &teams,
                &mut stdin.lock(),
                &mut stdout,
                config.prompt_max_attempts,
            )?
        }
    };

    let summary = run_export(client, &config, &choice)?;
    println!(
        "Wrote {} players ({} with injured-list stints) for {} to {}",
        summary.players,
        summary.injured_players,
        summary.team_name,
        summary.path.display()
    );
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn parse_team_arg() -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(name) = arg.strip_prefix("--team=") {
            if !name.trim().is_empty() {
                return Some(name.to_string());
            }
        }
        if arg == "--team" {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.clone());
            }
        }
    }
    args.into_iter()
        .find(|arg| !arg.starts_with("--") && !arg.trim().is_empty())
}
