//! The normalized output record.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::selector::Screening;
use crate::temporal::format_updated_text;

/// Title of the record emitted when nothing qualifies.
pub const PLACEHOLDER_TITLE: &str = "No screening scheduled";

/// What gets handed to the delivery layer. Field order is the wire order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Payload {
    pub title: String,
    /// Human display string, e.g. `Fri • Jun 12 • 7:30 PM`.
    pub subtitle: String,
    pub theatre: String,
    pub poster_url: Option<String>,
    pub ticket_url: Option<String>,
    pub show_qr: bool,
    /// RFC 3339 UTC instant of the resolution.
    pub refreshed_at: String,
}

/// Payload for a resolved screening. A QR block is only requested when there
/// is a ticket URL to encode.
pub fn build_payload(screening: &Screening<'_>, show_qr: bool, now: DateTime<Utc>) -> Payload {
    Payload {
        title: screening.title.clone(),
        subtitle: screening.when_text(),
        theatre: screening.theatre.clone(),
        poster_url: screening.poster_url.clone(),
        ticket_url: screening.ticket_url.clone(),
        show_qr: show_qr && screening.ticket_url.is_some(),
        refreshed_at: now.to_rfc3339(),
    }
}

/// Payload for the "nothing scheduled" case, echoing the queried theatre.
pub fn build_placeholder_payload(theatre: &str, timezone: &Tz, now: DateTime<Utc>) -> Payload {
    Payload {
        title: PLACEHOLDER_TITLE.to_string(),
        subtitle: format_updated_text(&now, timezone),
        theatre: theatre.to_string(),
        poster_url: None,
        ticket_url: None,
        show_qr: false,
        refreshed_at: now.to_rfc3339(),
    }
}
