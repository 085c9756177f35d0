//! End-to-end resolution: dump in, [`Payload`] out.
//!
//! Each call builds its own venue index, walks the dump afresh and works from
//! the caller's "now". Nothing is cached between calls.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde_json::Value;

use crate::error::{MarqueeError, Result};
use crate::fields::POSTER_BASE;
use crate::payload::{build_payload, build_placeholder_payload, Payload};
use crate::selector::{select, ResolutionWindow, Screening, TheatreQuery};
use crate::temporal::parse_timezone;
use crate::venues::{VenueIndex, VenueRecord};
use crate::walker::{SourceWalker, WalkOptions};

pub const DEFAULT_LOOKAHEAD_HOURS: i64 = 96;
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::Los_Angeles;

/// Knobs for a single resolution.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Venue id, or a case-insensitive fragment of the venue name.
    pub theatre: String,
    /// Display zone, also attached to showtimes that carry no offset.
    pub timezone: Tz,
    pub lookahead_hours: i64,
    pub show_qr: bool,
    /// Turn "nothing found" into [`MarqueeError::NotFound`] instead of a placeholder.
    pub fail_on_missing: bool,
    pub poster_base: String,
    pub walk: WalkOptions,
}

impl ResolveOptions {
    pub fn new(theatre: impl Into<String>) -> Self {
        Self {
            theatre: theatre.into(),
            timezone: DEFAULT_TIMEZONE,
            lookahead_hours: DEFAULT_LOOKAHEAD_HOURS,
            show_qr: false,
            fail_on_missing: false,
            poster_base: POSTER_BASE.to_string(),
            walk: WalkOptions::default(),
        }
    }

    /// # Errors
    ///
    /// Returns [`MarqueeError::InvalidTimezone`] if `name` is not an IANA zone.
    pub fn with_timezone(mut self, name: &str) -> Result<Self> {
        self.timezone = parse_timezone(name)?;
        Ok(self)
    }

    pub fn with_lookahead_hours(mut self, hours: i64) -> Self {
        self.lookahead_hours = hours;
        self
    }

    pub fn with_show_qr(mut self, show_qr: bool) -> Self {
        self.show_qr = show_qr;
        self
    }

    pub fn with_fail_on_missing(mut self, fail_on_missing: bool) -> Self {
        self.fail_on_missing = fail_on_missing;
        self
    }

    pub fn with_poster_base(mut self, poster_base: impl Into<String>) -> Self {
        self.poster_base = poster_base.into();
        self
    }

    pub fn with_walk_options(mut self, walk: WalkOptions) -> Self {
        self.walk = walk;
        self
    }
}

/// The earliest screening at `options.theatre` within the lookahead window.
///
/// # Errors
///
/// Returns [`MarqueeError::InvalidLookahead`] for a negative lookahead.
/// Not finding anything is `Ok(None)`.
pub fn find_next_screening<'a>(
    source: &'a Value,
    options: &ResolveOptions,
    now: DateTime<Utc>,
) -> Result<Option<Screening<'a>>> {
    let window = ResolutionWindow::from_hours(now, options.lookahead_hours)?;
    let index = VenueIndex::build_with(source, &options.walk);
    let query = TheatreQuery::new(&options.theatre, &index);
    let candidates = SourceWalker::with_options(source, options.walk);
    Ok(select(candidates, &query, &index, &window, options))
}

/// Resolve the dump to the payload for `options.theatre`.
///
/// # Errors
///
/// Returns [`MarqueeError::NotFound`] when nothing qualifies and
/// `options.fail_on_missing` is set, plus anything [`find_next_screening`] returns.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use marquee_core::{resolve_payload, ResolveOptions};
/// use serde_json::json;
///
/// let dump = json!({
///     "venues": [{"id": "vista", "name": "Vista Theater"}],
///     "screenings": [
///         {"venueId": "vista", "title": "Ran", "showtime": "2026-06-12 19:30"}
///     ]
/// });
/// let now = Utc.with_ymd_and_hms(2026, 6, 12, 18, 0, 0).unwrap();
/// let payload = resolve_payload(&dump, &ResolveOptions::new("vista"), now).unwrap();
/// assert_eq!(payload.title, "Ran");
/// assert_eq!(payload.theatre, "Vista Theater");
/// ```
pub fn resolve_payload(
    source: &Value,
    options: &ResolveOptions,
    now: DateTime<Utc>,
) -> Result<Payload> {
    match find_next_screening(source, options, now)? {
        Some(screening) => {
            tracing::info!(
                "Next screening: {} at {} ({})",
                screening.title,
                screening.when.to_rfc3339(),
                screening.ticket_url.as_deref().unwrap_or("no ticket URL")
            );
            Ok(build_payload(&screening, options.show_qr, now))
        }
        None if options.fail_on_missing => Err(MarqueeError::NotFound(options.theatre.clone())),
        None => {
            tracing::warn!(
                "No screening found for theatre '{}'; generating placeholder payload.",
                options.theatre
            );
            Ok(build_placeholder_payload(
                &options.theatre,
                &options.timezone,
                now,
            ))
        }
    }
}

/// Every venue in the dump, sorted case-insensitively by name.
pub fn list_venues(source: &Value) -> Vec<VenueRecord> {
    VenueIndex::build(source).sorted_by_name()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    use crate::payload::PLACEHOLDER_TITLE;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 12, 18, 0, 0).unwrap()
    }

    fn at(hours: i64) -> String {
        (now() + Duration::hours(hours)).to_rfc3339()
    }

    fn dump() -> Value {
        json!({
            "venues": [
                {"id": "vista", "name": "Vista Theater"},
                {"id": "egyptian", "name": "Egyptian Theatre"}
            ],
            "screenings": [
                {
                    "venueId": "vista",
                    "title": "Ran",
                    "showtime": at(30),
                    "poster": "https://cdn/ran.jpg",
                    "poster-image-path": "ignored.png",
                    "ticket_url": "https://tix/ran"
                },
                {
                    "venueId": "vista",
                    "title": "Kagemusha",
                    "showtime": at(3),
                    "poster-image-path": "kagemusha.png"
                },
                {
                    "venueId": "egyptian",
                    "title": "Playtime",
                    "showtime": at(1)
                }
            ]
        })
    }

    #[test]
    fn test_find_next_screening_picks_earliest_for_venue() {
        let source = dump();
        let screening = find_next_screening(&source, &ResolveOptions::new("vista"), now())
            .unwrap()
            .unwrap();
        assert_eq!(screening.title, "Kagemusha");
        assert_eq!(screening.theatre, "Vista Theater");
        assert_eq!(screening.ticket_url, None);
    }

    #[test]
    fn test_lookahead_narrows_the_window() {
        let options = ResolveOptions::new("vista").with_lookahead_hours(2);
        assert!(find_next_screening(&dump(), &options, now()).unwrap().is_none());
    }

    #[test]
    fn test_negative_lookahead_is_an_error() {
        let options = ResolveOptions::new("vista").with_lookahead_hours(-5);
        assert!(matches!(
            find_next_screening(&dump(), &options, now()),
            Err(MarqueeError::InvalidLookahead(_))
        ));
    }

    #[test]
    fn test_direct_poster_wins_and_qr_follows_ticket() {
        let mut source = dump();
        source["screenings"][1]["showtime"] = json!(at(50));
        let options = ResolveOptions::new("vista").with_show_qr(true);
        let payload = resolve_payload(&source, &options, now()).unwrap();
        assert_eq!(payload.title, "Ran");
        assert_eq!(payload.poster_url.as_deref(), Some("https://cdn/ran.jpg"));
        assert_eq!(payload.ticket_url.as_deref(), Some("https://tix/ran"));
        assert!(payload.show_qr);
    }

    #[test]
    fn test_poster_base_override() {
        let options = ResolveOptions::new("vista").with_poster_base("https://img.local/p");
        let payload = resolve_payload(&dump(), &options, now()).unwrap();
        assert_eq!(
            payload.poster_url.as_deref(),
            Some("https://img.local/p/kagemusha_400x600.jpg")
        );
        assert!(!payload.show_qr);
    }

    #[test]
    fn test_placeholder_when_venue_has_no_screenings() {
        let source = json!({
            "venues": [{"id": "nuart", "name": "Nuart"}],
            "screenings": []
        });
        let payload = resolve_payload(&source, &ResolveOptions::new("nuart"), now()).unwrap();
        assert_eq!(payload.title, PLACEHOLDER_TITLE);
        assert_eq!(payload.theatre, "nuart");
        assert_eq!(payload.poster_url, None);
        assert_eq!(payload.ticket_url, None);
        assert!(!payload.show_qr);
        assert_eq!(payload.refreshed_at, now().to_rfc3339());
    }

    #[test]
    fn test_strict_mode_reports_not_found() {
        let options = ResolveOptions::new("nowhere").with_fail_on_missing(true);
        let err = resolve_payload(&dump(), &options, now()).unwrap_err();
        assert!(matches!(err, MarqueeError::NotFound(ref t) if t == "nowhere"));
        assert_eq!(err.to_string(), "No screening found for theatre 'nowhere'");
    }

    #[test]
    fn test_scalar_root_resolves_to_placeholder() {
        let payload = resolve_payload(&json!(17), &ResolveOptions::new("vista"), now()).unwrap();
        assert_eq!(payload.title, PLACEHOLDER_TITLE);
    }

    #[test]
    fn test_with_timezone_rejects_unknown_zone() {
        assert!(matches!(
            ResolveOptions::new("vista").with_timezone("Nowhere/Land"),
            Err(MarqueeError::InvalidTimezone(_))
        ));
    }

    #[test]
    fn test_list_venues_sorted_by_name() {
        let names: Vec<_> = list_venues(&dump()).into_iter().map(|v| v.id).collect();
        assert_eq!(names, ["egyptian", "vista"]);
    }
}
