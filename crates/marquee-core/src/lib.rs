//! # marquee-core
//!
//! Resolve "what's showing next" for a single venue out of a loosely-shaped
//! RevivalHub event dump.
//!
//! The dump has no fixed schema: key names vary between records, screenings
//! may sit in a `screenings` list under a shared parent or float anywhere in
//! the tree, and showtimes arrive as epoch numbers or one of several string
//! encodings. This crate turns that into one normalized [`Payload`].
//!
//! Every function is clock-free. The caller supplies the "now" anchor, which
//! keeps resolution deterministic under test.
//!
//! ## Modules
//!
//! - [`fields`] — Ordered alias tables and field coalescing over raw records
//! - [`temporal`] — Heterogeneous showtime parsing to a UTC instant, display formatting
//! - [`venues`] — Venue id → name index built from every `venues` list in the dump
//! - [`walker`] — Lazy discovery of screening-shaped records with inherited context
//! - [`selector`] — Venue matching, lookahead window filtering, earliest-wins selection
//! - [`payload`] — Output record assembly, including the placeholder case
//! - [`resolve`] — The end-to-end pipeline and venue listing
//! - [`error`] — Error types

pub mod error;
pub mod fields;
pub mod payload;
pub mod resolve;
pub mod selector;
pub mod temporal;
pub mod venues;
pub mod walker;

pub use error::{MarqueeError, Result};
pub use fields::{Field, Record, POSTER_BASE};
pub use payload::{build_payload, build_placeholder_payload, Payload, PLACEHOLDER_TITLE};
pub use resolve::{find_next_screening, list_venues, resolve_payload, ResolveOptions};
pub use selector::{rank, select, ResolutionWindow, Screening, TheatreQuery};
pub use temporal::{format_updated_text, format_when_text, parse_instant, parse_timezone};
pub use venues::{VenueIndex, VenueRecord};
pub use walker::{CandidateEntry, Context, SourceWalker, WalkOptions, DEFAULT_MAX_DEPTH};
