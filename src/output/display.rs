//! Canonical display and JSON forms of cell values

use std::borrow::Cow;
use std::fmt::Write as _;

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde_json::Number;
use tracing::warn;

use crate::model::Value;

/// Date used by spreadsheets for values that only carry a time of day
const TIME_ONLY_DATE: (i32, u32, u32) = (1900, 1, 1);

/// Converts values into their display and JSON-safe forms. Never fails:
/// anything that cannot be canonicalised falls back to the generic
/// string conversion.
pub struct ValueFormatter;

impl ValueFormatter {
    /// Compact display string used by previews, exports and group keys
    pub fn display(value: &Value) -> Cow<'_, str> {
        match value {
            Value::Null => Cow::Borrowed(""),
            Value::Text(s) => Cow::Borrowed(s.as_str()),
            Value::DateTime(dt) => match format_datetime(dt) {
                Ok(s) => Cow::Owned(s),
                Err(_) => {
                    warn!(value = %dt, "date/time formatting failed, using generic form");
                    Cow::Owned(value.to_string())
                }
            },
            other => Cow::Owned(other.to_string()),
        }
    }

    /// JSON primitive used by API-style responses. Null maps to `""`.
    pub fn json(value: &Value) -> serde_json::Value {
        match value {
            Value::Null => serde_json::Value::String(String::new()),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::Number((*i).into()),
            Value::Float(f) => match Number::from_f64(*f) {
                Some(n) => serde_json::Value::Number(n),
                None => serde_json::Value::String(value.to_string()),
            },
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::DateTime(_) => serde_json::Value::String(Self::display(value).into_owned()),
        }
    }
}

fn is_time_only(dt: &NaiveDateTime) -> bool {
    (dt.year(), dt.month(), dt.day()) == TIME_ONLY_DATE
}

fn format_datetime(dt: &NaiveDateTime) -> Result<String, std::fmt::Error> {
    let has_subsec = dt.nanosecond() != 0;
    let pattern = if is_time_only(dt) {
        if has_subsec {
            "%H:%M:%S%.3f"
        } else if dt.second() != 0 {
            "%H:%M:%S"
        } else {
            "%H:%M"
        }
    } else if dt.num_seconds_from_midnight() == 0 && !has_subsec {
        "%Y-%m-%d"
    } else if has_subsec {
        "%Y-%m-%d %H:%M:%S%.3f"
    } else {
        "%Y-%m-%d %H:%M:%S"
    };

    let mut out = String::new();
    write!(out, "{}", dt.format(pattern))?;
    Ok(out)
}
