//! Affine encoding of clock times used by schedule displays.
//!
//! A value of `0` is 8:00, every hour adds `6` and every minute `0.1`.
//! Missing times encode to [`NULL_TIME`].

use crate::utils::error::{CatalogError, Result};
use chrono::{NaiveTime, Timelike};

pub const ZERO_ADJUST: f64 = 48.0;
pub const HOUR_FACTOR: f64 = 6.0;
pub const MINUTE_FACTOR: f64 = 0.1;
pub const NULL_TIME: f64 = -42.0;

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn encode(time: NaiveTime) -> f64 {
    let value = time.hour() as f64 * HOUR_FACTOR + time.minute() as f64 * MINUTE_FACTOR
        - ZERO_ADJUST;
    round_tenth(value)
}

fn parse_error(time: &str, format: &str) -> CatalogError {
    CatalogError::ValidationError {
        message: format!("time '{}' does not match {}", time, format),
    }
}

/// `"H:MM am"` / `"HH:MM PM"` to a value.
pub fn time_to_value(time: Option<&str>) -> Result<f64> {
    let Some(time) = time else {
        return Ok(NULL_TIME);
    };
    let parsed = NaiveTime::parse_from_str(&time.trim().to_uppercase(), "%I:%M %p")
        .map_err(|_| parse_error(time, "'H:MM am/pm'"))?;
    Ok(encode(parsed))
}

/// `"HH:MM"` (24 hour) to a value.
pub fn military_to_value(time: Option<&str>) -> Result<f64> {
    let Some(time) = time else {
        return Ok(NULL_TIME);
    };
    let parsed = NaiveTime::parse_from_str(time.trim(), "%H:%M")
        .map_err(|_| parse_error(time, "'HH:MM'"))?;
    Ok(encode(parsed))
}

/// Value back to `"HH:MM"` (24 hour).
pub fn value_to_military(value: f64) -> String {
    if value == NULL_TIME {
        return "00:00".to_string();
    }

    let mut hour = (value / HOUR_FACTOR).floor() as i64 + 8;
    let mut minute = (value.rem_euclid(HOUR_FACTOR) / MINUTE_FACTOR).round() as i64;
    if minute >= 60 {
        hour += 1;
        minute -= 60;
    }

    format!("{:02}:{:02}", hour, minute)
}

fn to_twelve_hour(military: &str) -> String {
    let (hour, minute) = military.split_once(':').unwrap_or((military, "00"));
    let hour: i64 = hour.parse().unwrap_or(0);
    let hour = if hour > 12 { hour - 12 } else { hour };
    format!("{}:{}", hour, minute)
}

/// Display label such as `"8:30 - 1:20"`.
pub fn values_to_time_label(start: f64, end: f64) -> String {
    format!(
        "{} - {}",
        to_twelve_hour(&value_to_military(start)),
        to_twelve_hour(&value_to_military(end))
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_to_value_cases() {
        let cases = [
            ("1:00 am", -42.0),
            ("01:00 am", -42.0),
            ("7:30 am", -3.0),
            ("8:00 am", 0.0),
            ("8:30 am", 3.0),
            ("10:00 am", 12.0),
            ("12:00 pm", 24.0),
            ("12:10 pm", 25.0),
            ("12:31 pm", 27.1),
            ("1:00 pm", 30.0),
            ("10:37 pm", 87.7),
            ("11:50 pm", 95.0),
            ("12:00 am", -48.0),
        ];

        for (time, expected) in cases {
            let value = time_to_value(Some(time)).unwrap();
            assert!((value - expected).abs() < 1e-9, "{} -> {} (expected {})", time, value, expected);
        }
    }

    #[test]
    fn test_missing_and_invalid_times() {
        assert_eq!(time_to_value(None).unwrap(), NULL_TIME);
        assert_eq!(military_to_value(None).unwrap(), NULL_TIME);
        assert!(time_to_value(Some("noon")).is_err());
        assert!(military_to_value(Some("25:00")).is_err());
    }

    #[test]
    fn test_military_round_trip() {
        for time in ["08:00", "07:30", "13:20", "22:37"] {
            let value = military_to_value(Some(time)).unwrap();
            assert_eq!(value_to_military(value), time);
        }
        assert_eq!(value_to_military(NULL_TIME), "00:00");
    }

    #[test]
    fn test_time_label() {
        assert_eq!(values_to_time_label(0.0, 8.0), "8:00 - 9:20");
        assert_eq!(values_to_time_label(27.0, 37.0), "12:30 - 2:10");
    }
}
