use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

use super::domain::{is_truthy, VehicleFeatures};

/// Odometer reading in kilometres; `0.0` whenever nothing usable is present.
pub fn normalize_mileage(vehicle: &VehicleFeatures) -> f64 {
    let raw = match &vehicle.mileage_km {
        Some(value) if is_truthy(value) => Some(value),
        _ => vehicle.odometer.as_ref(),
    };
    raw.map(coerce_float).unwrap_or(0.0)
}

fn coerce_float(value: &Value) -> f64 {
    match value {
        Value::Number(number) => number.as_f64().unwrap_or(0.0),
        Value::String(text) => text.trim().parse::<f64>().unwrap_or(0.0),
        Value::Bool(flag) => f64::from(u8::from(*flag)),
        _ => 0.0,
    }
}

/// Parse a loosely typed service date.
///
/// Formats are tried in order: `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS±HH:MM`, and
/// `YYYY-MM-DDTHH:MM:SS.fffZ`. Forms without an explicit offset are pinned to UTC.
pub fn normalize_date(value: &Value) -> Option<DateTime<FixedOffset>> {
    if !is_truthy(value) {
        return None;
    }

    let text = match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    };

    parse_timestamp(&text)
}

fn parse_timestamp(text: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(pin_to_utc);
    }

    if let Ok(stamp) = DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(stamp);
    }

    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.fZ")
        .ok()
        .map(pin_to_utc)
}

fn pin_to_utc(naive: NaiveDateTime) -> DateTime<FixedOffset> {
    Utc.from_utc_datetime(&naive).fixed_offset()
}
