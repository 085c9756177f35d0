//! Field coalescing over alias-inconsistent records.
//!
//! The dump spells the same semantic field many ways (`venueId`, `venue_id`,
//! `venue`, ...). Each [`Field`] owns an ordered alias list; lookups walk that
//! list and return the first *truthy* value. Adding an alias is a one-line
//! change to the table below.

use serde_json::{Map, Value};

/// Public base for RevivalHub's resized poster uploads.
pub const POSTER_BASE: &str =
    "https://storage.googleapis.com/revival-hub-ab2a8.firebasestorage.app/screening-posters/resized";

/// Suffix RevivalHub appends to the resized 400×600 poster variant.
const POSTER_SUFFIX: &str = "_400x600.jpg";

/// List-valued showtime keys, consulted in order when no scalar alias is set.
const SHOWTIME_LISTS: &[&str] = &["showtimes", "screening_times"];

/// A semantic field that can be pulled out of a raw record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// Venue reference on a screening record.
    VenueId,
    /// Human-readable venue label on a screening record.
    VenueLabel,
    Title,
    /// Scalar showtime value (list-valued keys are handled by [`first_showtime`]).
    Showtime,
    /// Direct poster URL.
    PosterUrl,
    /// RevivalHub poster slug or path, turned into a URL by [`poster_url_from_slug`].
    PosterSlug,
    TicketUrl,
    /// Identifier of an entry inside a `venues` list.
    VenueKey,
    /// Name of an entry inside a `venues` list.
    VenueName,
}

impl Field {
    /// Candidate key names, highest priority first.
    pub const fn aliases(self) -> &'static [&'static str] {
        match self {
            Field::VenueId => &["venueId", "venue_id", "venueID", "venue"],
            Field::VenueLabel => &[
                "venue_name",
                "theatre_name",
                "theatre",
                "theater",
                "cinema",
                "location",
            ],
            Field::Title => &["title", "film", "movie", "name", "filmTitle"],
            Field::Showtime => &["showtime", "show_time", "when", "datetime", "start_at"],
            Field::PosterUrl => &["poster", "poster_url", "image", "artwork"],
            Field::PosterSlug => &[
                "poster-image-path",
                "poster_image_path",
                "posterImagePath",
                "posterSlug",
                "poster_slug",
            ],
            Field::TicketUrl => &["ticket_url", "tickets", "link", "url"],
            Field::VenueKey => &["id", "venueId", "key"],
            Field::VenueName => &["name", "label", "title"],
        }
    }
}

/// Keyed access to a record, whether a plain JSON object or a walker
/// [`CandidateEntry`](crate::walker::CandidateEntry).
pub trait Record {
    fn lookup(&self, key: &str) -> Option<&Value>;
}

impl Record for Map<String, Value> {
    fn lookup(&self, key: &str) -> Option<&Value> {
        self.get(key)
    }
}

/// Presence check used by every lookup: null, `false`, `0`, `""`, `[]` and
/// `{}` all count as absent.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Return the first truthy value among `field`'s aliases.
pub fn resolve<R: Record + ?Sized>(entry: &R, field: Field) -> Option<&Value> {
    field
        .aliases()
        .iter()
        .find_map(|key| entry.lookup(key).filter(|v| is_truthy(v)))
}

/// Like [`resolve`], but only accepts values that read as text (strings and
/// numbers). Aliases holding objects or lists are skipped.
pub fn resolve_text<R: Record + ?Sized>(entry: &R, field: Field) -> Option<String> {
    field
        .aliases()
        .iter()
        .filter_map(|key| entry.lookup(key))
        .find_map(as_text)
}

/// Render a scalar as text; `None` for empty strings and non-scalars.
pub fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if is_truthy(value) => Some(n.to_string()),
        _ => None,
    }
}

/// The raw showtime of an entry: a scalar alias first, then the head of
/// `showtimes` / `screening_times`. A scalar `showtimes` (as synthesized by the
/// walker for bare list elements) is used directly.
pub fn first_showtime<R: Record + ?Sized>(entry: &R) -> Option<&Value> {
    resolve(entry, Field::Showtime).or_else(|| {
        SHOWTIME_LISTS
            .iter()
            .filter_map(|key| entry.lookup(key))
            .find_map(|value| match value {
                Value::Array(items) => items.first().filter(|v| is_truthy(v)),
                other => Some(other).filter(|v| is_truthy(v)),
            })
    })
}

/// Ticket link: a single URL alias, else the first of `ticket_urls`.
pub fn first_ticket_url<R: Record + ?Sized>(entry: &R) -> Option<String> {
    resolve_text(entry, Field::TicketUrl).or_else(|| match entry.lookup("ticket_urls") {
        Some(Value::Array(urls)) => urls.first().and_then(as_text),
        _ => None,
    })
}

/// Film title: an explicit title alias, else the name of the first `films` item.
pub fn first_title<R: Record + ?Sized>(entry: &R) -> Option<String> {
    resolve_text(entry, Field::Title).or_else(|| match entry.lookup("films") {
        Some(Value::Array(films)) => match films.first()? {
            Value::Object(film) => ["name", "title"]
                .iter()
                .filter_map(|key| film.get(*key))
                .find_map(as_text),
            other => as_text(other),
        },
        _ => None,
    })
}

/// Poster link: a direct URL alias wins over slug synthesis.
pub fn poster_url<R: Record + ?Sized>(entry: &R, poster_base: &str) -> Option<String> {
    resolve_text(entry, Field::PosterUrl).or_else(|| {
        resolve_text(entry, Field::PosterSlug)
            .and_then(|slug| poster_url_from_slug(&slug, poster_base))
    })
}

/// Build `{base}/{stem}_400x600.jpg` from a slug such as `uploads/abc123.jpg`.
///
/// Leading folders and the extension are dropped. Returns `None` when nothing
/// usable is left.
pub fn poster_url_from_slug(slug: &str, poster_base: &str) -> Option<String> {
    let trimmed = slug.trim().trim_matches('/');
    let file_name = trimmed.rsplit('/').next().unwrap_or(trimmed);
    let stem = match file_name.rfind('.') {
        Some(idx) if !file_name[..idx].trim_start_matches('.').is_empty() => &file_name[..idx],
        _ => file_name,
    };
    if stem.is_empty() {
        return None;
    }
    Some(format!(
        "{}/{stem}{POSTER_SUFFIX}",
        poster_base.trim_end_matches('/')
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("fixture must be an object, got {other}"),
        }
    }

    #[test]
    fn test_resolve_respects_alias_order() {
        let e = entry(json!({"venue": "fallback", "venue_id": "second", "venueId": "first"}));
        assert_eq!(resolve(&e, Field::VenueId), Some(&json!("first")));
    }

    #[test]
    fn test_resolve_skips_falsy_values() {
        let e = entry(json!({"title": "", "film": null, "movie": "Vertigo"}));
        assert_eq!(resolve_text(&e, Field::Title).as_deref(), Some("Vertigo"));
    }

    #[test]
    fn test_resolve_absent_when_nothing_matches() {
        let e = entry(json!({"unrelated": "x"}));
        assert!(resolve(&e, Field::TicketUrl).is_none());
    }

    #[test]
    fn test_resolve_text_skips_structured_values() {
        let e = entry(json!({"title": {"en": "Alien"}, "film": "Aliens"}));
        assert_eq!(resolve_text(&e, Field::Title).as_deref(), Some("Aliens"));
    }

    #[test]
    fn test_resolve_text_renders_numbers() {
        let e = entry(json!({"venueId": 42}));
        assert_eq!(resolve_text(&e, Field::VenueId).as_deref(), Some("42"));
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!([])));
        assert!(!is_truthy(&json!({})));
        assert!(is_truthy(&json!("x")));
        assert!(is_truthy(&json!(1.5)));
        assert!(is_truthy(&json!([0])));
    }

    #[test]
    fn test_first_showtime_prefers_scalar_alias() {
        let e = entry(json!({"showtimes": ["2026-01-01T10:00:00Z"], "when": "2026-02-02T10:00:00Z"}));
        assert_eq!(first_showtime(&e), Some(&json!("2026-02-02T10:00:00Z")));
    }

    #[test]
    fn test_first_showtime_falls_back_to_lists() {
        let e = entry(json!({"showtimes": [], "screening_times": ["a", "b"]}));
        assert_eq!(first_showtime(&e), Some(&json!("a")));
    }

    #[test]
    fn test_first_showtime_accepts_scalar_showtimes() {
        let e = entry(json!({"showtimes": 1_780_000_000}));
        assert_eq!(first_showtime(&e), Some(&json!(1_780_000_000)));
    }

    #[test]
    fn test_first_ticket_url_from_list() {
        let e = entry(json!({"ticket_urls": ["https://t/1", "https://t/2"]}));
        assert_eq!(first_ticket_url(&e).as_deref(), Some("https://t/1"));
    }

    #[test]
    fn test_first_title_from_films() {
        let e = entry(json!({"films": [{"title": "Stalker"}, {"name": "Solaris"}]}));
        assert_eq!(first_title(&e).as_deref(), Some("Stalker"));

        let e = entry(json!({"films": [{"name": "Mirror", "title": "Zerkalo"}]}));
        assert_eq!(first_title(&e).as_deref(), Some("Mirror"));
    }

    #[test]
    fn test_poster_direct_url_wins_over_slug() {
        let e = entry(json!({
            "poster": "https://cdn/direct.jpg",
            "poster-image-path": "abc123.png"
        }));
        assert_eq!(
            poster_url(&e, POSTER_BASE).as_deref(),
            Some("https://cdn/direct.jpg")
        );
    }

    #[test]
    fn test_poster_from_slug() {
        let e = entry(json!({"poster-image-path": "uploads/2026/abc123.png"}));
        assert_eq!(
            poster_url(&e, "https://img.example/resized/").as_deref(),
            Some("https://img.example/resized/abc123_400x600.jpg")
        );
    }

    #[test]
    fn test_poster_slug_edge_cases() {
        assert_eq!(
            poster_url_from_slug(" /abc.def.jpg/ ", "https://b").as_deref(),
            Some("https://b/abc.def_400x600.jpg")
        );
        assert_eq!(
            poster_url_from_slug("noext", "https://b").as_deref(),
            Some("https://b/noext_400x600.jpg")
        );
        assert!(poster_url_from_slug("  ", "https://b").is_none());
        assert!(poster_url_from_slug("folder/", "https://b").is_some());
    }
}
