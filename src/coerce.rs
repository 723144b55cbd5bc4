//! Text to typed value conversion.
//!
//! Environment variables and flags are purely text based, and config files
//! sometimes carry a typed value as a quoted string (`timeout: "10s"`). This
//! module turns that text into the exact static type of a setting.
//!
//! Dispatch is static: every supported leaf type implements [`FromText`], and
//! [`coerce`] only has to special-case the empty string (reset to the zero
//! value) and nested structs (which have no text form).

use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Utc};
use num_complex::Complex;
use thiserror::Error;

use crate::setting::{Kind, Setting};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoerceError {
    #[error("cannot parse '{value}' as {kind}: {reason}")]
    Invalid {
        kind: Kind,
        value: String,
        reason: String,
    },

    #[error("value does not fit {kind}: {reason}")]
    Mismatch { kind: Kind, reason: String },

    #[error("{kind} values cannot be set from text")]
    Unsupported { kind: Kind },
}

impl CoerceError {
    pub(crate) fn invalid(kind: Kind, value: &str, reason: impl Display) -> Self {
        CoerceError::Invalid {
            kind,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Write `text` into `slot`.
///
/// An empty string is an explicit "unset": the slot is reset to its zero
/// value instead of being parsed.
pub fn coerce(slot: &mut dyn Setting, text: &str) -> Result<(), CoerceError> {
    if text.is_empty() {
        slot.reset();
        return Ok(());
    }
    match slot.kind() {
        Kind::Struct => Err(CoerceError::Unsupported { kind: Kind::Struct }),
        _ => slot.set_text(text),
    }
}

/// Parse a setting value from its text form.
pub trait FromText: Sized {
    fn from_text(text: &str) -> Result<Self, CoerceError>;
}

macro_rules! from_text_via_parse {
    ($kind:expr => $($ty:ty),+ $(,)?) => {
        $(
            impl FromText for $ty {
                fn from_text(text: &str) -> Result<Self, CoerceError> {
                    text.parse::<$ty>()
                        .map_err(|e| CoerceError::invalid($kind, text, e))
                }
            }
        )+
    };
}

from_text_via_parse!(Kind::Signed => i8, i16, i32, i64, isize);
from_text_via_parse!(Kind::Unsigned => u8, u16, u32, u64, usize);
from_text_via_parse!(Kind::Float => f32, f64);

impl FromText for bool {
    fn from_text(text: &str) -> Result<Self, CoerceError> {
        match text {
            "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
            "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
            _ => Err(CoerceError::invalid(
                Kind::Bool,
                text,
                "expected one of 1, t, true, 0, f, false",
            )),
        }
    }
}

macro_rules! from_text_complex {
    ($($float:ty),+) => {
        $(
            impl FromText for Complex<$float> {
                fn from_text(text: &str) -> Result<Self, CoerceError> {
                    let trimmed = text
                        .strip_prefix('(')
                        .and_then(|t| t.strip_suffix(')'))
                        .unwrap_or(text);
                    trimmed
                        .parse::<Complex<$float>>()
                        .map_err(|e| CoerceError::invalid(Kind::Complex, text, e))
                }
            }
        )+
    };
}

from_text_complex!(f32, f64);

impl FromText for Duration {
    fn from_text(text: &str) -> Result<Self, CoerceError> {
        humantime::parse_duration(text).map_err(|e| CoerceError::invalid(Kind::Duration, text, e))
    }
}

impl FromText for DateTime<FixedOffset> {
    fn from_text(text: &str) -> Result<Self, CoerceError> {
        DateTime::parse_from_rfc3339(text)
            .map_err(|e| CoerceError::invalid(Kind::Timestamp, text, e))
    }
}

impl FromText for DateTime<Utc> {
    fn from_text(text: &str) -> Result<Self, CoerceError> {
        DateTime::<FixedOffset>::from_text(text).map(|t| t.with_timezone(&Utc))
    }
}

impl FromText for String {
    fn from_text(text: &str) -> Result<Self, CoerceError> {
        Ok(text.to_string())
    }
}

impl FromText for PathBuf {
    fn from_text(text: &str) -> Result<Self, CoerceError> {
        Ok(PathBuf::from(text))
    }
}

impl FromText for Vec<String> {
    fn from_text(text: &str) -> Result<Self, CoerceError> {
        Ok(split_list(text).map(str::to_string).collect())
    }
}

impl FromText for HashMap<String, String> {
    fn from_text(text: &str) -> Result<Self, CoerceError> {
        Ok(split_pairs(text).collect())
    }
}

impl FromText for BTreeMap<String, String> {
    fn from_text(text: &str) -> Result<Self, CoerceError> {
        Ok(split_pairs(text).collect())
    }
}

/// `a, b ,c` -> `["a", "b", "c"]`. Empty elements are kept.
fn split_list(text: &str) -> impl Iterator<Item = &str> {
    text.split(',').map(str::trim)
}

/// `k1=v1, k2 = v2` -> `[("k1", "v1"), ("k2", "v2")]`.
///
/// Elements without `=` are skipped; only the first `=` splits.
fn split_pairs(text: &str) -> impl Iterator<Item = (String, String)> {
    split_list(text).filter_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        Some((key.trim().to_string(), value.trim().to_string()))
    })
}
