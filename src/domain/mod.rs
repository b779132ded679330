//! Domain types for accounts, one-time codes and the team roster.
//!
//! The roster is partitioned by academic year. A year range is stored as the
//! string `"YYYY-YYYY"` and used as a coarse partition key, not a true date span.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
});

static YEAR_RANGE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{4}$").expect("year range pattern is valid"));

/// An academic year range such as `2023-2024`.
///
/// Only values matching two four-digit years joined by a hyphen can be
/// constructed. Ordering puts the most recent year first: descending by end
/// year, then descending by start year.
///
/// # Examples
///
/// ```rust
/// use clubdesk::domain::YearRange;
///
/// let range: YearRange = "2023-2024".parse().unwrap();
/// assert_eq!(range.start(), 2023);
/// assert_eq!(range.end(), 2024);
/// assert!("2023".parse::<YearRange>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct YearRange {
    raw: String,
    start: u16,
    end: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid academic year format '{0}'. Use 'YYYY-YYYY'")]
pub struct InvalidYearRange(pub String);

impl YearRange {
    #[must_use]
    pub const fn start(&self) -> u16 {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> u16 {
        self.end
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns true if `value` is a well-formed year range.
    #[must_use]
    pub fn is_valid(value: &str) -> bool {
        YEAR_RANGE_PATTERN.is_match(value)
    }

    /// Ordering used for the year selector: newest first.
    #[must_use]
    pub fn recency_cmp(&self, other: &Self) -> Ordering {
        other
            .end
            .cmp(&self.end)
            .then_with(|| other.start.cmp(&self.start))
    }
}

impl FromStr for YearRange {
    type Err = InvalidYearRange;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !Self::is_valid(s) {
            return Err(InvalidYearRange(s.to_string()));
        }

        let (start, end) = s
            .split_once('-')
            .ok_or_else(|| InvalidYearRange(s.to_string()))?;

        Ok(Self {
            raw: s.to_string(),
            start: start.parse().map_err(|_| InvalidYearRange(s.to_string()))?,
            end: end.parse().map_err(|_| InvalidYearRange(s.to_string()))?,
        })
    }
}

impl fmt::Display for YearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for YearRange {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for YearRange {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Sorts raw year-range strings newest first.
///
/// Values that do not parse keep their relative order and sort after all
/// well-formed ranges.
#[must_use]
pub fn sort_year_ranges(ranges: Vec<String>) -> Vec<String> {
    let mut keyed: Vec<(Option<YearRange>, String)> = ranges
        .into_iter()
        .map(|raw| (raw.parse::<YearRange>().ok(), raw))
        .collect();

    keyed.sort_by(|(a, _), (b, _)| match (a, b) {
        (Some(a), Some(b)) => a.recency_cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    keyed.into_iter().map(|(_, raw)| raw).collect()
}

/// Trims and lowercases an email address so it can be used as a lookup key.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Loose shape check: one `@`, no whitespace, a dot in the domain part.
#[must_use]
pub fn is_plausible_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// What a one-time code unlocks once verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    #[default]
    Signup,
    PasswordReset,
}

impl OtpPurpose {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Signup => "signup",
            Self::PasswordReset => "password_reset",
        }
    }

    #[must_use]
    pub const fn email_subject(&self) -> &'static str {
        match self {
            Self::Signup => "Your OTP for Signup",
            Self::PasswordReset => "Your Password Reset OTP",
        }
    }
}

impl fmt::Display for OtpPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
