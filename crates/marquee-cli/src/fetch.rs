//! Blocking dump download with a fixed timeout and linear back-off.

use std::thread;
use std::time::Duration;

use anyhow::anyhow;
use reqwest::blocking::Client;
use serde_json::Value;

const TIMEOUT: Duration = Duration::from_secs(30);
const BACKOFF_STEP: Duration = Duration::from_secs(1);

pub fn http_client() -> reqwest::Result<Client> {
    Client::builder()
        .timeout(TIMEOUT)
        .user_agent(concat!("marquee/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// GET `url` and decode the body as JSON, trying up to `attempts` times.
pub fn fetch_dump(client: &Client, url: &str, attempts: u32) -> anyhow::Result<Value> {
    let attempts = attempts.max(1);
    tracing::info!("Fetching RevivalHub data from {url}");

    let mut last_error = None;
    for attempt in 1..=attempts {
        match get_json(client, url) {
            Ok(value) => return Ok(value),
            Err(error) => {
                tracing::warn!(attempt, attempts, %error, "dump fetch failed");
                last_error = Some(error);
                if attempt < attempts {
                    thread::sleep(BACKOFF_STEP * attempt);
                }
            }
        }
    }

    Err(match last_error {
        Some(error) => anyhow::Error::new(error),
        None => anyhow!("no fetch attempt was made"),
    }
    .context(format!("failed to fetch {url} after {attempts} attempt(s)")))
}

fn get_json(client: &Client, url: &str) -> reqwest::Result<Value> {
    client.get(url).send()?.error_for_status()?.json()
}
