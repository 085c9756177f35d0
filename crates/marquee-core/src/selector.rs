//! Venue matching, window filtering and earliest-wins selection.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;

use crate::error::MarqueeError;
use crate::fields::{
    as_text, first_showtime, first_ticket_url, first_title, poster_url, resolve, resolve_text,
    Field,
};
use crate::resolve::ResolveOptions;
use crate::temporal::{format_when_text, parse_instant};
use crate::venues::VenueIndex;
use crate::walker::CandidateEntry;

/// Title used when a record names no film.
pub const DEFAULT_TITLE: &str = "Untitled";

/// The `[now, cutoff]` interval a screening must fall in. Both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionWindow {
    pub now: DateTime<Utc>,
    pub cutoff: DateTime<Utc>,
}

impl ResolutionWindow {
    pub fn new(now: DateTime<Utc>, lookahead: Duration) -> Self {
        Self {
            now,
            cutoff: now + lookahead,
        }
    }

    /// Window of `hours` hours starting at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`MarqueeError::InvalidLookahead`] for negative or overflowing lengths.
    pub fn from_hours(now: DateTime<Utc>, hours: i64) -> Result<Self, MarqueeError> {
        if hours < 0 {
            return Err(MarqueeError::InvalidLookahead(format!(
                "lookahead must be non-negative, got {hours}h"
            )));
        }
        let lookahead = Duration::try_hours(hours)
            .ok_or_else(|| MarqueeError::InvalidLookahead(format!("{hours}h is out of range")))?;
        let cutoff = now
            .checked_add_signed(lookahead)
            .ok_or_else(|| MarqueeError::InvalidLookahead(format!("{hours}h is out of range")))?;
        Ok(Self { now, cutoff })
    }

    pub fn contains(&self, when: &DateTime<Utc>) -> bool {
        self.now <= *when && *when <= self.cutoff
    }
}

/// The theatre being asked about: a venue id or a name fragment.
#[derive(Debug, Clone)]
pub struct TheatreQuery {
    raw: String,
    lowered: String,
    is_venue_id: bool,
}

impl TheatreQuery {
    pub fn new(query: &str, index: &VenueIndex) -> Self {
        Self {
            raw: query.to_string(),
            lowered: query.to_lowercase(),
            is_venue_id: index.contains(query),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether the query names a known venue id.
    pub fn is_venue_id(&self) -> bool {
        self.is_venue_id
    }

    /// Exact id match first, then a case-insensitive substring of the label.
    pub fn matches(&self, venue_id: Option<&str>, label: Option<&str>) -> bool {
        if self.is_venue_id && venue_id == Some(self.raw.as_str()) {
            return true;
        }
        label.is_some_and(|label| label.to_lowercase().contains(&self.lowered))
    }
}

/// A normalized screening.
#[derive(Debug, Clone, PartialEq)]
pub struct Screening<'a> {
    /// Venue label, else the raw venue id, else empty.
    pub theatre: String,
    pub title: String,
    pub when: DateTime<Utc>,
    /// Display zone only; `when` is always UTC.
    pub timezone: Tz,
    pub poster_url: Option<String>,
    pub ticket_url: Option<String>,
    /// Source record, kept for diagnostics.
    pub raw: CandidateEntry<'a>,
}

impl Screening<'_> {
    pub fn when_local(&self) -> DateTime<Tz> {
        self.when.with_timezone(&self.timezone)
    }

    /// e.g. `Fri • Jun 12 • 7:30 PM`
    pub fn when_text(&self) -> String {
        format_when_text(&self.when, &self.timezone)
    }
}

/// Every qualifying screening, earliest first. Ties keep discovery order.
pub fn rank<'a, I>(
    candidates: I,
    query: &TheatreQuery,
    index: &VenueIndex,
    window: &ResolutionWindow,
    options: &ResolveOptions,
) -> Vec<Screening<'a>>
where
    I: IntoIterator<Item = CandidateEntry<'a>>,
{
    let mut seen = 0usize;
    let mut qualifying: Vec<Screening> = candidates
        .into_iter()
        .inspect(|_| seen += 1)
        .filter_map(|entry| qualify(entry, query, index, window, options))
        .collect();
    qualifying.sort_by_key(|screening| screening.when);

    tracing::debug!(
        candidates = seen,
        qualifying = qualifying.len(),
        theatre = query.as_str(),
        "ranked screenings"
    );
    qualifying
}

/// The earliest qualifying screening, if any.
pub fn select<'a, I>(
    candidates: I,
    query: &TheatreQuery,
    index: &VenueIndex,
    window: &ResolutionWindow,
    options: &ResolveOptions,
) -> Option<Screening<'a>>
where
    I: IntoIterator<Item = CandidateEntry<'a>>,
{
    rank(candidates, query, index, window, options)
        .into_iter()
        .next()
}

fn qualify<'a>(
    entry: CandidateEntry<'a>,
    query: &TheatreQuery,
    index: &VenueIndex,
    window: &ResolutionWindow,
    options: &ResolveOptions,
) -> Option<Screening<'a>> {
    let venue_id = resolve(&entry, Field::VenueId).and_then(as_text);
    let label = venue_id
        .as_deref()
        .and_then(|id| index.get(id))
        .map(str::to_string)
        .or_else(|| resolve_text(&entry, Field::VenueLabel));

    if !query.matches(venue_id.as_deref(), label.as_deref()) {
        return None;
    }

    let Some(when) = first_showtime(&entry).and_then(|raw| parse_instant(raw, &options.timezone))
    else {
        tracing::debug!(
            title = first_title(&entry).as_deref().unwrap_or(DEFAULT_TITLE),
            "skipping entry with unparseable time"
        );
        return None;
    };
    if !window.contains(&when) {
        tracing::debug!(%when, "skipping entry outside the lookahead window");
        return None;
    }

    Some(Screening {
        theatre: label.or(venue_id).unwrap_or_default(),
        title: first_title(&entry).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        when,
        timezone: options.timezone,
        poster_url: poster_url(&entry, &options.poster_base),
        ticket_url: first_ticket_url(&entry),
        raw: entry,
    })
}
