use std::fs;
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use marquee_core::{list_venues, resolve_payload, MarqueeError, ResolveOptions};
use serde_json::Value;

mod cache;
mod cli;
mod deliver;
mod fetch;

use cache::DumpCache;
use cli::Cli;
use deliver::DeliveryTarget;

/// Exit status for strict mode when nothing qualifies.
const EXIT_NOT_FOUND: u8 = 2;

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(error) => {
            eprintln!("marquee error: {error:#}");
            if matches!(error.downcast_ref::<MarqueeError>(), Some(MarqueeError::NotFound(_))) {
                ExitCode::from(EXIT_NOT_FOUND)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn run() -> anyhow::Result<ExitCode> {
    load_env_file()?;
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let source = load_dump(&cli)?;

    if cli.list_venues {
        let venues = list_venues(&source);
        if venues.is_empty() {
            eprintln!("No venues found in dump.");
            return Ok(ExitCode::FAILURE);
        }
        for venue in venues {
            println!("{}\t{}", venue.id, venue.name);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let theatre = cli
        .theatre
        .as_deref()
        .context("--theatre (or REVIVALHUB_THEATRE) is required")?;
    let options = ResolveOptions::new(theatre)
        .with_timezone(&cli.timezone)?
        .with_lookahead_hours(cli.lookahead_hours)
        .with_show_qr(cli.show_qr())
        .with_fail_on_missing(cli.fail_on_missing)
        .with_poster_base(cli.poster_base.as_str());

    let payload = resolve_payload(&source, &options, Utc::now())?;
    let rendered = serde_json::to_string_pretty(&payload)?;

    if let Some(path) = &cli.payload_path {
        fs::write(path, &rendered)
            .with_context(|| format!("failed to write payload to {}", path.display()))?;
        tracing::info!("Wrote payload to {}", path.display());
    }

    if cli.dry_run {
        tracing::info!("Dry run enabled, skipping TRMNL API upload.");
        println!("{rendered}");
        return Ok(ExitCode::SUCCESS);
    }

    let target = DeliveryTarget::from_cli(&cli)?;
    let client = fetch::http_client()?;
    deliver::send_payload(&client, &payload, &target)?;
    Ok(ExitCode::SUCCESS)
}

/// Load `REVIVALHUB_ENV_FILE` (default `.env`) without overriding the process environment.
fn load_env_file() -> anyhow::Result<()> {
    let path = std::env::var("REVIVALHUB_ENV_FILE").unwrap_or_else(|_| ".env".to_string());
    let path = Path::new(&path);
    if !path.exists() {
        return Ok(());
    }
    dotenvy::from_path(path)
        .with_context(|| format!("failed to load env file {}", path.display()))?;
    Ok(())
}

fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    let level = if verbose { "debug" } else { "info" };

    let filter = tracing_subscriber::EnvFilter::try_from_env("MARQUEE_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

fn load_dump(cli: &Cli) -> anyhow::Result<Value> {
    if let Some(path) = &cli.dump_file {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read dump file {}", path.display()))?;
        return serde_json::from_str(&text)
            .with_context(|| format!("dump file {} is not valid JSON", path.display()));
    }

    let url = cli
        .revivalhub_url
        .as_deref()
        .context("--revivalhub-url (or REVIVALHUB_URL) is required")?;
    let client = fetch::http_client()?;

    if cli.no_cache {
        return fetch::fetch_dump(&client, url, cli.fetch_retries);
    }

    let dir = cli.cache_dir.clone().unwrap_or_else(DumpCache::default_dir);
    let ttl = Duration::from_secs(cli.cache_ttl_minutes.saturating_mul(60));
    let cache = DumpCache::for_url(&dir, url, ttl);
    if let Some(dump) = cache.load_fresh() {
        return Ok(dump);
    }

    let dump = fetch::fetch_dump(&client, url, cli.fetch_retries)?;
    if let Err(error) = cache.store(&dump) {
        tracing::warn!("{error:#}");
    }
    Ok(dump)
}
