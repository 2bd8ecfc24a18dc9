use chrono::{NaiveDate, NaiveTime};

use crate::server::response::ApiError;
use crate::types::ShiftColor;

pub fn parse_date(value: &str, field: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ApiError::bad_request(format!("{field} must be a date in YYYY-MM-DD format")))
}

/// Accepts `HH:MM:SS` or `HH:MM`.
pub fn parse_time(value: &str, field: &str) -> Result<NaiveTime, ApiError> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .map_err(|_| ApiError::bad_request(format!("{field} must be a time in HH:MM format")))
}

pub fn parse_color(value: &str) -> Result<ShiftColor, ApiError> {
    ShiftColor::parse(value).ok_or_else(|| {
        let allowed: Vec<&str> = ShiftColor::ALL.iter().map(|c| c.as_str()).collect();
        ApiError::bad_request(format!("color must be one of: {}", allowed.join(", ")))
    })
}
