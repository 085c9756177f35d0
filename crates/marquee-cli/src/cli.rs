use std::path::PathBuf;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, ValueEnum};
use marquee_core::resolve::{DEFAULT_LOOKAHEAD_HOURS, DEFAULT_TIMEZONE};
use marquee_core::POSTER_BASE;

/// Which TRMNL API receives the payload.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum DeliveryMode {
    /// Private plugin Data API.
    Plugin,
    /// Display/scene API.
    Display,
}

/// Bridge RevivalHub screening data into a TRMNL private plugin payload.
#[derive(Debug, Parser)]
#[command(name = "marquee", version, about)]
pub struct Cli {
    /// JSON endpoint that exposes RevivalHub screening data.
    #[arg(long, env = "REVIVALHUB_URL", required_unless_present = "dump_file")]
    pub revivalhub_url: Option<String>,

    /// Read the dump from a local JSON file instead of fetching it.
    #[arg(long, value_name = "PATH")]
    pub dump_file: Option<PathBuf>,

    /// List venues from the RevivalHub dump and exit.
    #[arg(long)]
    pub list_venues: bool,

    /// Venue id or name of the theatre to track (case-insensitive substring).
    #[arg(long, env = "REVIVALHUB_THEATRE", required_unless_present = "list_venues")]
    pub theatre: Option<String>,

    /// Only consider shows starting within this many hours from now.
    #[arg(long, env = "REVIVALHUB_LOOKAHEAD_HOURS", default_value_t = DEFAULT_LOOKAHEAD_HOURS)]
    pub lookahead_hours: i64,

    /// IANA timezone used for formatting showtimes.
    #[arg(long, env = "REVIVALHUB_TIMEZONE", default_value = DEFAULT_TIMEZONE.name())]
    pub timezone: String,

    /// Request a QR block on the TRMNL template.
    #[arg(
        long,
        env = "REVIVALHUB_SHOW_QR",
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new(),
        overrides_with = "no_show_qr"
    )]
    pub show_qr: bool,

    /// Disable the QR block even if the environment enables it.
    #[arg(long, overrides_with = "show_qr")]
    pub no_show_qr: bool,

    /// Base URL that poster slugs are resolved against.
    #[arg(long, env = "REVIVALHUB_POSTER_BASE", default_value = POSTER_BASE)]
    pub poster_base: String,

    /// Print payload locally without calling the TRMNL API.
    #[arg(long)]
    pub dry_run: bool,

    /// Exit with code 2 when no matching screening is found.
    #[arg(long)]
    pub fail_on_missing: bool,

    /// Optional path to write the computed payload as JSON.
    #[arg(long, value_name = "PATH")]
    pub payload_path: Option<PathBuf>,

    /// Directory for the cached dump [default: <tmp>/marquee].
    #[arg(long, env = "REVIVALHUB_CACHE_DIR", value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// How long a cached dump stays fresh.
    #[arg(long, env = "REVIVALHUB_CACHE_TTL_MINUTES", default_value_t = 10)]
    pub cache_ttl_minutes: u64,

    /// Always fetch; neither read nor write the dump cache.
    #[arg(long)]
    pub no_cache: bool,

    /// Fetch attempts before giving up.
    #[arg(
        long,
        env = "REVIVALHUB_FETCH_RETRIES",
        default_value_t = 3,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub fetch_retries: u32,

    /// Select Plugin Data API ('plugin') or Display API ('display') delivery.
    #[arg(long, env = "TRMNL_MODE", value_enum, default_value_t = DeliveryMode::Plugin)]
    pub trmnl_mode: DeliveryMode,

    /// Override the TRMNL API base URL.
    #[arg(long, env = "TRMNL_BASE_URL", default_value = "https://api.usetrmnl.com")]
    pub trmnl_base_url: String,

    /// TRMNL API key.
    #[arg(long, env = "TRMNL_API_KEY", hide_env_values = true)]
    pub trmnl_api_key: Option<String>,

    /// Target plugin ID when using plugin mode.
    #[arg(long, env = "TRMNL_PLUGIN_ID")]
    pub trmnl_plugin_id: Option<String>,

    /// Target display ID when using display mode.
    #[arg(long, env = "TRMNL_DISPLAY_ID")]
    pub trmnl_display_id: Option<String>,

    /// Scene/screen identifier needed for the Display API.
    #[arg(long, env = "TRMNL_SCENE_ID")]
    pub trmnl_scene_id: Option<String>,

    /// Enable debug logging.
    #[arg(long)]
    pub verbose: bool,
}

impl Cli {
    /// Effective QR request after `--no-show-qr`.
    pub fn show_qr(&self) -> bool {
        self.show_qr && !self.no_show_qr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("marquee").chain(args.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["--revivalhub-url", "https://dump", "--theatre", "vista"]).unwrap();
        assert_eq!(cli.lookahead_hours, 96);
        assert_eq!(cli.timezone, "America/Los_Angeles");
        assert_eq!(cli.trmnl_mode, DeliveryMode::Plugin);
        assert_eq!(cli.trmnl_base_url, "https://api.usetrmnl.com");
        assert_eq!(cli.poster_base, POSTER_BASE);
        assert_eq!(cli.fetch_retries, 3);
        assert!(!cli.show_qr());
    }

    #[test]
    fn test_theatre_optional_when_listing_venues() {
        assert!(parse(&["--dump-file", "dump.json", "--list-venues"]).is_ok());
    }

    #[test]
    fn test_no_show_qr_wins() {
        let cli = parse(&["--dump-file", "d.json", "--theatre", "v", "--show-qr", "--no-show-qr"]).unwrap();
        assert!(!cli.show_qr());
        let cli = parse(&["--dump-file", "d.json", "--theatre", "v", "--show-qr"]).unwrap();
        assert!(cli.show_qr());
    }

    #[test]
    fn test_display_mode() {
        let cli = parse(&["--dump-file", "d.json", "--theatre", "v", "--trmnl-mode", "display"]).unwrap();
        assert_eq!(cli.trmnl_mode, DeliveryMode::Display);
        assert!(parse(&["--dump-file", "d.json", "--theatre", "v", "--trmnl-mode", "email"]).is_err());
    }

    #[test]
    fn test_zero_fetch_retries_rejected() {
        assert!(parse(&["--dump-file", "d.json", "--theatre", "v", "--fetch-retries", "0"]).is_err());
    }
}
