/// Validation helpers for user-entered quick times and settings
use crate::domain::{ANY_DESTINATION, KEY_LEN};
use crate::errors::{ApiError, ApiResult};
use crate::lookup::Lookup;
use chrono::NaiveTime;
use serde::Deserialize;

pub const DAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// A weekday given either as its number (0 = Sunday) or short name
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DayInput {
    Number(i64),
    Name(String),
}

/// "HH:MM", 24 hour clock
pub fn validate_time(s: &str) -> ApiResult<()> {
    if s.len() != 5 {
        return Err(ApiError::InvalidInput(format!(
            "{:?}: incorrect length, should be 5 characters",
            s
        )));
    }
    NaiveTime::parse_from_str(s, "%H:%M")
        .map(|_| ())
        .map_err(|_| ApiError::InvalidInput(format!("{:?}: not in HH:MM format", s)))
}

/// Three uppercase letters naming a station in the bundled list
pub fn validate_crs(s: &str, lookup: &Lookup) -> ApiResult<()> {
    if s.len() != 3 {
        return Err(ApiError::InvalidInput(format!(
            "{:?}: incorrect length, should be 3 letters",
            s
        )));
    }
    if !s.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(ApiError::InvalidInput(format!(
            "{:?}: should be 3 uppercase English letters",
            s
        )));
    }
    if lookup.stations().get(s).is_none() {
        return Err(ApiError::InvalidInput(format!(
            "{}: station not found in list, ver {}",
            s,
            lookup.stations().version()
        )));
    }
    Ok(())
}

/// Like `validate_crs`, also accepting the "any destination" wildcard
pub fn validate_dest(s: &str, lookup: &Lookup) -> ApiResult<()> {
    if s == ANY_DESTINATION {
        return Ok(());
    }
    validate_crs(s, lookup)
}

/// Sorted, de-duplicated weekday numbers
pub fn normalize_days(days: &[DayInput]) -> ApiResult<Vec<u8>> {
    let mut out = Vec::with_capacity(days.len());
    for day in days {
        let n = match day {
            DayInput::Number(n) if (0..7).contains(n) => *n as u8,
            DayInput::Number(n) => {
                return Err(ApiError::InvalidInput(format!("day {} out of range 0-6", n)))
            }
            DayInput::Name(name) => DAY_NAMES
                .iter()
                .position(|d| d.eq_ignore_ascii_case(name))
                .map(|p| p as u8)
                .ok_or_else(|| ApiError::InvalidInput(format!("unknown day {:?}", name)))?,
        };
        out.push(n);
    }
    out.sort_unstable();
    out.dedup();
    Ok(out)
}

/// Checks the shape of an API key, not its validity upstream
pub fn validate_key(key: &str) -> ApiResult<()> {
    if key.len() != KEY_LEN || !key.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ApiError::InvalidInput(format!(
            "API key should be {} letters or digits",
            KEY_LEN
        )));
    }
    Ok(())
}
