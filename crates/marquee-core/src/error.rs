//! Error types for marquee-core operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarqueeError {
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid lookahead: {0}")]
    InvalidLookahead(String),

    #[error("No screening found for theatre '{0}'")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, MarqueeError>;
