//! Trimming applied to decoded fields.

use std::fmt;
use std::str::FromStr;

use crate::error::FixedLengthError;

/// Which ends of a decoded field are trimmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TrimMode {
    /// Leave the field unmodified.
    #[default]
    None,
    /// Trim both ends.
    Trim,
    /// Trim leading characters only.
    TrimStart,
    /// Trim trailing characters only.
    TrimEnd,
}

impl TrimMode {
    /// Label used in column layout documents.
    pub fn label(self) -> &'static str {
        match self {
            TrimMode::None => "None",
            TrimMode::Trim => "Trim",
            TrimMode::TrimStart => "TrimStart",
            TrimMode::TrimEnd => "TrimEnd",
        }
    }

    /// Trim `field`, removing characters in `trim_chars`.
    ///
    /// With no characters given (or an empty set), whitespace is trimmed.
    pub fn apply(self, field: &str, trim_chars: Option<&[char]>) -> String {
        let trimmed = match trim_chars {
            Some(chars) if !chars.is_empty() => match self {
                TrimMode::None => field,
                TrimMode::Trim => field.trim_matches(chars),
                TrimMode::TrimStart => field.trim_start_matches(chars),
                TrimMode::TrimEnd => field.trim_end_matches(chars),
            },
            _ => match self {
                TrimMode::None => field,
                TrimMode::Trim => field.trim(),
                TrimMode::TrimStart => field.trim_start(),
                TrimMode::TrimEnd => field.trim_end(),
            },
        };
        trimmed.to_string()
    }
}

impl FromStr for TrimMode {
    type Err = FixedLengthError;

    /// Labels must match exactly, including case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "None" => Ok(TrimMode::None),
            "Trim" => Ok(TrimMode::Trim),
            "TrimStart" => Ok(TrimMode::TrimStart),
            "TrimEnd" => Ok(TrimMode::TrimEnd),
            other => Err(FixedLengthError::InvalidTrimMode(other.to_string())),
        }
    }
}

impl fmt::Display for TrimMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
