//! Outbound delivery of the payload to the TRMNL API.

use anyhow::{bail, Context};
use marquee_core::Payload;
use reqwest::blocking::Client;
use serde_json::{json, Value};

use crate::cli::{Cli, DeliveryMode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Plugin { plugin_id: String },
    Display { display_id: String, scene_id: String },
}

/// A validated delivery destination.
#[derive(Debug, Clone)]
pub struct DeliveryTarget {
    base_url: String,
    api_key: String,
    endpoint: Endpoint,
}

impl DeliveryTarget {
    /// Check that the credentials and ids required by the selected mode are present.
    pub fn from_cli(cli: &Cli) -> anyhow::Result<Self> {
        let Some(api_key) = cli.trmnl_api_key.clone().filter(|k| !k.is_empty()) else {
            bail!("Missing TRMNL API key (set --trmnl-api-key or TRMNL_API_KEY).");
        };

        let endpoint = match cli.trmnl_mode {
            DeliveryMode::Plugin => match &cli.trmnl_plugin_id {
                Some(plugin_id) => Endpoint::Plugin {
                    plugin_id: plugin_id.clone(),
                },
                None => bail!("Plugin mode selected but --trmnl-plugin-id is missing."),
            },
            DeliveryMode::Display => match (&cli.trmnl_display_id, &cli.trmnl_scene_id) {
                (Some(display_id), Some(scene_id)) => Endpoint::Display {
                    display_id: display_id.clone(),
                    scene_id: scene_id.clone(),
                },
                _ => bail!("Display mode requires both --trmnl-display-id and --trmnl-scene-id."),
            },
        };

        Ok(Self {
            base_url: cli.trmnl_base_url.trim_end_matches('/').to_string(),
            api_key,
            endpoint,
        })
    }

    pub fn url(&self) -> String {
        match &self.endpoint {
            Endpoint::Plugin { plugin_id } => format!("{}/v1/plugins/{plugin_id}/data", self.base_url),
            Endpoint::Display {
                display_id,
                scene_id,
            } => format!(
                "{}/v1/displays/{display_id}/scenes/{scene_id}",
                self.base_url
            ),
        }
    }

    /// Request body: plugin mode wraps in `data`, display mode in `payload`.
    pub fn body(&self, payload: &Payload) -> Value {
        match self.endpoint {
            Endpoint::Plugin { .. } => json!({ "data": payload }),
            Endpoint::Display { .. } => json!({ "payload": payload }),
        }
    }
}

pub fn send_payload(client: &Client, payload: &Payload, target: &DeliveryTarget) -> anyhow::Result<()> {
    let url = target.url();
    tracing::info!("Posting payload to {url}");

    let response = client
        .post(&url)
        .bearer_auth(&target.api_key)
        .json(&target.body(payload))
        .send()
        .with_context(|| format!("failed to reach TRMNL API at {url}"))?;

    let status = response.status();
    if status.is_client_error() || status.is_server_error() {
        let text = response.text().unwrap_or_default();
        tracing::error!("TRMNL API error: {} {}", status.as_u16(), text);
        bail!("TRMNL API rejected payload with status {status}: {text}");
    }

    tracing::info!("TRMNL API accepted payload (status {}).", status.as_u16());
    Ok(())
}
