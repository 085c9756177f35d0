//! Showtime normalization.
//!
//! Raw showtimes arrive as Unix epoch numbers or as strings in one of several
//! shapes (offset-qualified, trailing `Z`, bare local date-time). Everything
//! is normalized to a `DateTime<Utc>`. Values without an offset are read as
//! wall-clock time in a caller-supplied fallback zone.
//!
//! Parsing never fails loudly: an unreadable value yields `None` and the
//! caller drops the candidate.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde_json::Value;

use crate::error::MarqueeError;

/// One entry in an ordered list of string layouts.
#[derive(Debug, Clone, Copy)]
enum Layout {
    /// Carries its own UTC offset.
    Offset(&'static str),
    /// Wall-clock time; the fallback zone is attached.
    Naive(&'static str),
    /// Calendar date only; midnight in the fallback zone.
    Date(&'static str),
}

/// Tried first, in order. First layout that parses wins.
const PRIMARY_LAYOUTS: &[Layout] = &[
    Layout::Offset("%Y-%m-%dT%H:%M:%S%z"),
    Layout::Naive("%Y-%m-%d %H:%M"),
    Layout::Naive("%Y-%m-%dT%H:%M:%S"),
];

/// Flexible ISO 8601 fallback: fractional seconds, space separators, minute
/// precision, bare dates.
const ISO_LAYOUTS: &[Layout] = &[
    Layout::Offset("%Y-%m-%dT%H:%M:%S%.f%z"),
    Layout::Offset("%Y-%m-%d %H:%M:%S%.f%z"),
    Layout::Offset("%Y-%m-%dT%H:%M%z"),
    Layout::Offset("%Y-%m-%d %H:%M%z"),
    Layout::Naive("%Y-%m-%dT%H:%M:%S%.f"),
    Layout::Naive("%Y-%m-%d %H:%M:%S%.f"),
    Layout::Naive("%Y-%m-%dT%H:%M"),
    Layout::Date("%Y-%m-%d"),
];

/// Parse an IANA timezone name.
///
/// # Errors
///
/// Returns [`MarqueeError::InvalidTimezone`] for names unknown to the tz database.
pub fn parse_timezone(name: &str) -> Result<Tz, MarqueeError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| MarqueeError::InvalidTimezone(format!("'{name}'")))
}

/// Normalize a raw showtime value to a UTC instant.
///
/// * numbers are Unix epoch seconds (fractions allowed)
/// * strings are trimmed, a trailing `Z` becomes `+00:00`, then the primary
///   layouts and the ISO fallbacks are tried in order
/// * anything else is `None`
///
/// # Examples
///
/// ```
/// use marquee_core::temporal::{parse_instant, parse_timezone};
/// use serde_json::json;
///
/// let tz = parse_timezone("America/Los_Angeles").unwrap();
/// let a = parse_instant(&json!("2026-06-12 19:30"), &tz).unwrap();
/// let b = parse_instant(&json!("2026-06-13T02:30:00Z"), &tz).unwrap();
/// assert_eq!(a, b);
/// ```
pub fn parse_instant(raw: &Value, fallback: &Tz) -> Option<DateTime<Utc>> {
    match raw {
        Value::Number(n) => match n.as_i64() {
            Some(secs) => DateTime::from_timestamp(secs, 0),
            None => n.as_f64().and_then(from_epoch_float),
        },
        Value::String(s) => parse_instant_str(s, fallback),
        _ => None,
    }
}

/// String half of [`parse_instant`].
pub fn parse_instant_str(raw: &str, fallback: &Tz) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let normalized = match trimmed.strip_suffix('Z') {
        Some(head) => format!("{head}+00:00"),
        None => trimmed.to_string(),
    };

    PRIMARY_LAYOUTS
        .iter()
        .find_map(|layout| apply_layout(*layout, &normalized, fallback))
        .or_else(|| {
            DateTime::parse_from_rfc3339(&normalized)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        })
        .or_else(|| {
            ISO_LAYOUTS
                .iter()
                .find_map(|layout| apply_layout(*layout, &normalized, fallback))
        })
}

/// Subtitle for a screening, e.g. `Fri • Jun 12 • 7:30 PM`.
pub fn format_when_text(when: &DateTime<Utc>, tz: &Tz) -> String {
    when.with_timezone(tz)
        .format("%a • %b %-d • %-I:%M %p")
        .to_string()
}

/// Subtitle for the placeholder payload, e.g. `Updated Jun 02 • 09:05 AM`.
pub fn format_updated_text(now: &DateTime<Utc>, tz: &Tz) -> String {
    now.with_timezone(tz)
        .format("Updated %b %d • %I:%M %p")
        .to_string()
}

// ── Internal helpers ────────────────────────────────────────────────────────

fn apply_layout(layout: Layout, s: &str, fallback: &Tz) -> Option<DateTime<Utc>> {
    match layout {
        Layout::Offset(fmt) => DateTime::parse_from_str(s, fmt)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Layout::Naive(fmt) => NaiveDateTime::parse_from_str(s, fmt)
            .ok()
            .and_then(|naive| localize(naive, fallback)),
        Layout::Date(fmt) => NaiveDate::parse_from_str(s, fmt)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .and_then(|naive| localize(naive, fallback)),
    }
}

/// Attach `tz` to a wall-clock time.
///
/// Ambiguous times (DST fall-back) take the earlier instant. Times inside a
/// spring-forward gap keep the pre-transition offset, so `02:30` on the
/// transition night lands at `03:30` local.
fn localize(naive: NaiveDateTime, tz: &Tz) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| {
            tz.from_local_datetime(&(naive - Duration::hours(1)))
                .earliest()
                .map(|dt| dt + Duration::hours(1))
        })
        .map(|dt| dt.with_timezone(&Utc))
}

fn from_epoch_float(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::from_timestamp(whole as i64, nanos)
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn la() -> Tz {
        parse_timezone("America/Los_Angeles").unwrap()
    }

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    // ── parse_instant tests ─────────────────────────────────────────────

    #[test]
    fn test_equivalent_encodings_agree() {
        // 7:30 PM PDT on June 12 2026 == 02:30 UTC June 13
        let expected = utc(2026, 6, 13, 2, 30, 0);
        let tz = la();
        let inputs = [
            json!(1_781_317_800),
            json!("2026-06-13T02:30:00Z"),
            json!("2026-06-12T19:30:00-07:00"),
            json!("2026-06-12T19:30:00"),
            json!("2026-06-12 19:30"),
        ];
        for input in inputs {
            assert_eq!(parse_instant(&input, &tz), Some(expected), "input: {input}");
        }
    }

    #[test]
    fn test_offset_without_colon() {
        let result = parse_instant(&json!("2026-06-12T19:30:00-0700"), &la());
        assert_eq!(result, Some(utc(2026, 6, 13, 2, 30, 0)));
    }

    #[test]
    fn test_epoch_float() {
        let result = parse_instant(&json!(1_781_317_800.5), &la()).unwrap();
        assert_eq!(result.timestamp(), 1_781_317_800);
        assert_eq!(result.timestamp_subsec_millis(), 500);
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        let result = parse_instant(&json!("  2026-06-13T02:30:00Z \n"), &la());
        assert_eq!(result, Some(utc(2026, 6, 13, 2, 30, 0)));
    }

    #[test]
    fn test_iso_fallback_fractional_seconds() {
        let result = parse_instant(&json!("2026-06-13T02:30:00.250Z"), &la()).unwrap();
        assert_eq!(result.timestamp(), 1_781_317_800);
        assert_eq!(result.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn test_iso_fallback_minute_precision_with_t() {
        let result = parse_instant(&json!("2026-06-12T19:30"), &la());
        assert_eq!(result, Some(utc(2026, 6, 13, 2, 30, 0)));
    }

    #[test]
    fn test_iso_fallback_bare_date_is_local_midnight() {
        let result = parse_instant(&json!("2026-06-12"), &la());
        assert_eq!(result, Some(utc(2026, 6, 12, 7, 0, 0)));
    }

    #[test]
    fn test_fallback_zone_applies_winter_offset() {
        let result = parse_instant(&json!("2026-01-15 20:00"), &la());
        assert_eq!(result, Some(utc(2026, 1, 16, 4, 0, 0)));
    }

    #[test]
    fn test_fallback_zone_ignored_when_offset_present() {
        let tokyo = parse_timezone("Asia/Tokyo").unwrap();
        let result = parse_instant(&json!("2026-06-13T02:30:00+00:00"), &tokyo);
        assert_eq!(result, Some(utc(2026, 6, 13, 2, 30, 0)));
    }

    #[test]
    fn test_spring_forward_gap_keeps_standard_offset() {
        // March 8 2026, 02:30 does not exist in Los Angeles.
        let result = parse_instant(&json!("2026-03-08 02:30"), &la());
        assert_eq!(result, Some(utc(2026, 3, 8, 10, 30, 0)));
    }

    #[test]
    fn test_fall_back_ambiguity_takes_earlier_instant() {
        // November 1 2026, 01:30 happens twice; the PDT reading comes first.
        let result = parse_instant(&json!("2026-11-01 01:30"), &la());
        assert_eq!(result, Some(utc(2026, 11, 1, 8, 30, 0)));
    }

    #[test]
    fn test_unparseable_values_are_none() {
        let tz = la();
        for input in [
            json!("next tuesday"),
            json!(""),
            json!("   "),
            json!(null),
            json!(true),
            json!(["2026-06-12 19:30"]),
            json!({"at": "2026-06-12 19:30"}),
            json!("2026-13-40 25:00"),
        ] {
            assert!(parse_instant(&input, &tz).is_none(), "input: {input}");
        }
    }

    // ── parse_timezone tests ────────────────────────────────────────────

    #[test]
    fn test_invalid_timezone_returns_error() {
        let err = parse_timezone("Mars/Olympus_Mons").unwrap_err().to_string();
        assert!(err.contains("Invalid timezone"), "got: {err}");
    }

    // ── formatting tests ────────────────────────────────────────────────

    #[test]
    fn test_format_when_text_strips_leading_zeros() {
        let when = utc(2026, 6, 13, 2, 30, 0);
        assert_eq!(format_when_text(&when, &la()), "Fri • Jun 12 • 7:30 PM");
    }

    #[test]
    fn test_format_when_text_noon_and_midnight() {
        let tz = parse_timezone("UTC").unwrap();
        assert_eq!(
            format_when_text(&utc(2026, 6, 5, 12, 0, 0), &tz),
            "Fri • Jun 5 • 12:00 PM"
        );
        assert_eq!(
            format_when_text(&utc(2026, 6, 5, 0, 5, 0), &tz),
            "Fri • Jun 5 • 12:05 AM"
        );
    }

    #[test]
    fn test_format_updated_text_is_zero_padded() {
        let tz = parse_timezone("UTC").unwrap();
        assert_eq!(
            format_updated_text(&utc(2026, 6, 2, 9, 5, 0), &tz),
            "Updated Jun 02 • 09:05 AM"
        );
    }
}
