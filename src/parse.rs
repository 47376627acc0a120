//! Validation of free-text answers
//!
//! Every parser takes the user's text and either produces a typed value or a
//! [`ParseError`] whose [`ParseError::reply`] is safe to send back verbatim.

use crate::activity::Sentiment;
use chrono_tz::Tz;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid duration: {0:?}")]
    InvalidDuration(String),
    #[error("invalid count: {0:?}")]
    InvalidCount(String),
    #[error("unknown sentiment: {0:?}")]
    UnknownSentiment(String),
    #[error("unknown timezone: {0:?}")]
    UnknownTimezone(String),
}

impl ParseError {
    /// Guidance text for the user
    pub fn reply(&self) -> &'static str {
        match self {
            ParseError::InvalidDuration(_) => "Sorry, I can't understand that duration value.",
            ParseError::InvalidCount(_) => "Sorry, I can't understand that number.",
            ParseError::UnknownSentiment(_) => {
                "Sorry, I don't understand what that means, try saying something like \"ok\" or \"great\"!"
            }
            ParseError::UnknownTimezone(_) => {
                "Sorry, I don't know what timezone that is. Please try again."
            }
        }
    }
}

static DURATION_FULL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?:\d+(?:\.\d*)?|\.\d+)(?:ns|us|µs|μs|ms|s|m|h))+$").expect("valid regex")
});

static DURATION_PART: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d*)?|\.\d+)(ns|us|µs|μs|ms|s|m|h)").expect("valid regex")
});

/// Longest storable duration: nanoseconds must fit in an `i64`
#[allow(clippy::cast_precision_loss)]
const MAX_NANOS: f64 = i64::MAX as f64;

/// Parse a compact duration such as `2h`, `30m`, `1h30m`, `1.5h` or `90s`.
///
/// A bare `0` is accepted. Negative durations and anything past
/// `i64::MAX` nanoseconds (about 2562047h) are rejected.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn parse_duration(input: &str) -> Result<Duration, ParseError> {
    let s = input.trim();
    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if !DURATION_FULL.is_match(s) {
        return Err(ParseError::InvalidDuration(input.to_string()));
    }

    let mut nanos = 0f64;
    for caps in DURATION_PART.captures_iter(s) {
        let number: f64 = caps[1]
            .parse()
            .map_err(|_| ParseError::InvalidDuration(input.to_string()))?;
        let unit = match &caps[2] {
            "ns" => 1.0,
            "us" | "µs" | "μs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            _ => 3600e9,
        };
        nanos += number * unit;
    }

    if !nanos.is_finite() || nanos >= MAX_NANOS {
        return Err(ParseError::InvalidDuration(input.to_string()));
    }
    Ok(Duration::from_nanos(nanos.round() as u64))
}

/// Parse a base-10 integer count
pub fn parse_count(input: &str) -> Result<i64, ParseError> {
    input
        .trim()
        .parse::<i64>()
        .map_err(|_| ParseError::InvalidCount(input.to_string()))
}

/// Map the closed synonym vocabulary onto a [`Sentiment`]
pub fn parse_sentiment(input: &str) -> Result<Sentiment, ParseError> {
    let sentiment = match input.trim() {
        "terrible" | "awful" => Sentiment::Terrible,
        "bad" | "not good" => Sentiment::Bad,
        "neutral" | "fine" | "ok" | "alright" | "meh" => Sentiment::Neutral,
        "good" => Sentiment::Good,
        "great" | "awesome" | "fantastic" => Sentiment::Great,
        _ => return Err(ParseError::UnknownSentiment(input.to_string())),
    };
    Ok(sentiment)
}

/// Validate an IANA timezone identifier such as `America/Los_Angeles`
pub fn parse_timezone(input: &str) -> Result<Tz, ParseError> {
    input
        .trim()
        .parse::<Tz>()
        .map_err(|_| ParseError::UnknownTimezone(input.to_string()))
}
