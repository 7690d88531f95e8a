use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;

use mlb_player_features::config::RunConfig;
use mlb_player_features::export::output_path;
use mlb_player_features::pipeline::run_export;
use mlb_player_features::roster::fetch_roster_stats;
use mlb_player_features::teams::{Team, TeamChoice, NATIONAL_LEAGUE_ID};

const PLAYERS: u32 = 12;
const TEAM_ID: u32 = 120;

/// Local stand-in for both the stats API and the transactions page.
fn spawn_server(failing_player: Option<u32>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind local listener");
    let addr = listener.local_addr().expect("listener address");
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else {
                continue;
            };
            thread::spawn(move || serve(stream, failing_player));
        }
    });
    format!("http://{addr}")
}

fn serve(mut stream: TcpStream, failing_player: Option<u32>) {
    let Ok(read_half) = stream.try_clone() else {
        return;
    };
    let mut reader = BufReader::new(read_half);
    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }
    loop {
        let mut header = String::new();
        match reader.read_line(&mut header) {
            Ok(0) => break,
            Ok(_) if header == "\r\n" => break,
            Ok(_) => continue,
            Err(_) => return,
        }
    }

    let path = request_line.split_whitespace().nth(1).unwrap_or("/").to_string();
    let (status, body) = route(&path, failing_player);
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

fn route(path: &str, failing_player: Option<u32>) -> (&'static str, String) {
    if path == format!("/api/v1/teams/{TEAM_ID}/roster") {
        return ("200 OK", roster_json());
    }
    if let Some(rest) = path.strip_prefix("/api/v1/people/") {
        let id: u32 = rest
            .split('/')
            .next()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(0);
        // Later roster slots answer first.
        let delay = u64::from(PLAYERS + 1 - id.clamp(1, PLAYERS)) * 25;
        thread::sleep(Duration::from_millis(delay));
        if failing_player == Some(id) {
            return ("500 Internal Server Error", "boom".to_string());
        }
        return ("200 OK", stats_json(id));
    }
    if path == "/transactions/wsh/" {
        return ("200 OK", transactions_html());
    }
    ("404 Not Found", "missing".to_string())
}

fn player_name(id: u32) -> String {
    format!("P{id} Name")
}

fn roster_json() -> String {
    let slots = (1..=PLAYERS)
        .map(|id| {
            format!(
                r#"{{"person":{{"id":{id},"fullName":"{}","link":"/api/v1/people/{id}"}}}}"#,
                player_name(id)
            )
        })
        .collect::<Vec<_>>()
        .join(",");
    format!(r#"{{"roster":[{slots}]}}"#)
}

fn stats_json(id: u32) -> String {
    format!(r#"{{"stats":[{{"splits":[{{"stat":{{"gamesPlayed":{id},"avg":".250"}}}}]}}]}}"#)
}

fn transactions_html() -> String {
    format!(
        r#"<html><body><table><tr><td class="Table__TD">Placed RHP {} on the 15-day IL (IL).</td></tr></table></body></html>"#,
        player_name(3)
    )
}

fn local_client() -> Client {
    Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(10))
        .build()
        .expect("client should build")
}

fn scratch_dir(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("mlb_pipeline_{label}_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    dir
}

fn config_for(base: &str, output_dir: PathBuf) -> RunConfig {
    RunConfig {
        stats_api_base: base.to_string(),
        transactions_base: format!("{base}/transactions"),
        fetch_parallelism: 4,
        output_dir,
        ..RunConfig::default()
    }
}

fn nationals() -> TeamChoice {
    TeamChoice {
        input: "Nationals".to_string(),
        team: Team {
            id: TEAM_ID,
            name: "Washington Nationals".to_string(),
            club_name: "Nationals".to_string(),
            abbreviation: "WSH".to_string(),
            league_id: NATIONAL_LEAGUE_ID,
        },
    }
}

#[test]
fn parallel_stats_keep_roster_order() {
    let base = spawn_server(None);
    let client = local_client();
    let players = fetch_roster_stats(&client, &base, TEAM_ID, 4).expect("stats should load");

    let names: Vec<&str> = players.iter().map(|p| p.full_name.as_str()).collect();
    let expected: Vec<String> = (1..=PLAYERS).map(player_name).collect();
    assert_eq!(names, expected);
    assert_eq!(players[6].link, "/api/v1/people/7");
    assert_eq!(players[6].stats.len(), 2);
}

#[test]
fn export_writes_one_row_per_player_in_roster_order() {
    let base = spawn_server(None);
    let dir = scratch_dir("ok");
    let config = config_for(&base, dir.clone());

    let summary = run_export(&local_client(), &config, &nationals()).expect("export should succeed");
    assert_eq!(summary.players, PLAYERS as usize);
    assert_eq!(summary.injured_players, 1);
    assert_eq!(summary.path, output_path(&dir, "Nationals"));

    let mut reader = csv::Reader::from_path(&summary.path).expect("csv should open");
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.expect("row")).collect();
    let names: Vec<&str> = rows.iter().map(|r| r.get(0).unwrap_or_default()).collect();
    let expected: Vec<String> = (1..=PLAYERS).map(player_name).collect();
    assert_eq!(names, expected);

    let injured_idx = reader
        .headers()
        .expect("header row")
        .iter()
        .position(|h| h == "numtimesinjured")
        .expect("injury column");
    for (idx, row) in rows.iter().enumerate() {
        let want = if idx == 2 { "1" } else { "0" };
        assert_eq!(row.get(injured_idx), Some(want));
    }

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn one_failed_player_fails_the_run_and_writes_nothing() {
    let base = spawn_server(Some(7));
    let dir = scratch_dir("fail");
    let config = config_for(&base, dir.clone());

    let err = run_export(&local_client(), &config, &nationals()).expect_err("export should fail");
    let message = format!("{err:#}");
    assert!(message.contains("P7 Name"), "unexpected error: {message}");
    assert!(message.contains("500"), "unexpected error: {message}");

    let path = output_path(&dir, "Nationals");
    assert!(!path.exists());
    assert!(!path.with_extension("csv.tmp").exists());
    if let Ok(entries) = fs::read_dir(&dir) {
        assert_eq!(entries.count(), 0);
    }

    let _ = fs::remove_dir_all(&dir);
}
