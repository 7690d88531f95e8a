use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;
use tracing::debug;

const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// ESPN rejects the default reqwest agent, so page requests pose as a desktop browser.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3";

static CLIENT: OnceCell<Client> = OnceCell::new();

pub fn http_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(request_timeout_secs()))
            .build()
            .context("failed to build http client")
    })
}

/// GET `url` and return the body, failing on transport errors and non-2xx statuses.
pub fn fetch_text(client: &Client, url: &str, extra_headers: &[(&str, &str)]) -> Result<String> {
    let mut req = client.get(url);
    for (name, value) in extra_headers {
        req = req.header(*name, *value);
    }

    debug!(url, "GET");
    let resp = req.send().context("request failed")?;
    let status = resp.status();
    let body = resp.text().context("failed reading body")?;
    if !status.is_success() {
        return Err(anyhow::anyhow!("http {} from {}: {}", status, url, snippet(&body)));
    }
    Ok(body)
}

pub fn fetch_page(client: &Client, url: &str) -> Result<String> {
    fetch_text(client, url, &[(USER_AGENT.as_str(), BROWSER_USER_AGENT)])
}

fn request_timeout_secs() -> u64 {
    env::var("REQUEST_TIMEOUT_SECS")
        .ok()
        .and_then(|val| val.parse::<u64>().ok())
        .unwrap_or(DEFAULT_TIMEOUT_SECS)
        .clamp(1, 120)
}

fn snippet(body: &str) -> &str {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(200) {
        Some((idx, _)) => &trimmed[..idx],
        None => trimmed,
    }
}
