//! On-disk cache for the fetched dump.
//!
//! One file per source URL. A file younger than the TTL is served as-is; an
//! older, missing or unreadable one is a miss.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::Context;
use serde_json::Value;
use sha2::{Digest, Sha256};

#[derive(Debug, Clone)]
pub struct DumpCache {
    path: PathBuf,
    ttl: Duration,
}

impl DumpCache {
    pub fn new(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            path: path.into(),
            ttl,
        }
    }

    /// Cache file for `url` inside `dir`, named after a SHA-256 of the URL so
    /// the name survives toolchain upgrades.
    pub fn for_url(dir: &Path, url: &str, ttl: Duration) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        let hex = format!("{:x}", hasher.finalize());
        Self::new(dir.join(format!("dump-{}.json", &hex[..16])), ttl)
    }

    /// `<tmp>/marquee`
    pub fn default_dir() -> PathBuf {
        std::env::temp_dir().join("marquee")
    }

    /// The cached dump, if present and no older than the TTL.
    pub fn load_fresh(&self) -> Option<Value> {
        let modified = fs::metadata(&self.path).and_then(|m| m.modified()).ok()?;
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);
        if age > self.ttl {
            tracing::debug!(
                path = %self.path.display(),
                age_secs = age.as_secs(),
                "cached dump is stale"
            );
            return None;
        }

        let text = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&text) {
            Ok(value) => {
                tracing::info!("Using cached RevivalHub dump {}", self.path.display());
                Some(value)
            }
            Err(error) => {
                tracing::warn!(path = %self.path.display(), %error, "ignoring unreadable cached dump");
                None
            }
        }
    }

    pub fn store(&self, dump: &Value) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create cache dir {}", parent.display()))?;
        }
        let bytes = serde_json::to_vec(dump)?;
        fs::write(&self.path, bytes)
            .with_context(|| format!("failed to write cache file {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), "cached RevivalHub dump");
        Ok(())
    }
}
