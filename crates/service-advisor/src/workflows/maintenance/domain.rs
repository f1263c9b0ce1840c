use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::urgency::UrgencyBand;

/// Top-level input for a single recommendation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestPayload {
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub vin: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub history: Vec<ServiceRecord>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vehicle_features: VehicleFeatures,
}

/// One historical service event as reported by the dealership.
///
/// Fields are kept loosely typed here; [`super::normalizer`] coerces them once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub issues_reported: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_date: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<Value>,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl ServiceRecord {
    pub fn new<I, S>(service_date: Option<&str>, issues: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            issues_reported: issues
                .into_iter()
                .map(|issue| Value::String(issue.into()))
                .collect(),
            service_date: service_date.map(|raw| Value::String(raw.to_string())),
            date: None,
            details: Map::new(),
        }
    }

    /// `service_date` wins unless it is falsy, in which case `date` is consulted.
    pub fn raw_date(&self) -> Option<&Value> {
        match &self.service_date {
            Some(value) if is_truthy(value) => Some(value),
            _ => self.date.as_ref(),
        }
    }
}

/// Snapshot of the vehicle at request time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleFeatures {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mileage_km: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub odometer: Option<Value>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl VehicleFeatures {
    pub fn with_mileage(mileage_km: f64) -> Self {
        Self {
            mileage_km: serde_json::Number::from_f64(mileage_km).map(Value::Number),
            ..Self::default()
        }
    }
}

/// Fixed vocabulary of maintenance actions the engine can recommend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ServiceCode {
    #[serde(rename = "PERIODIC_10K")]
    Periodic10k,
    #[serde(rename = "PERIODIC_20K")]
    Periodic20k,
    #[serde(rename = "PERIODIC_30K")]
    Periodic30k,
    #[serde(rename = "BRAKE_CHECK")]
    BrakeCheck,
    #[serde(rename = "CLUTCH_ADJUST")]
    ClutchAdjust,
    #[serde(rename = "AC_CHECK")]
    AcCheck,
}

impl ServiceCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceCode::Periodic10k => "PERIODIC_10K",
            ServiceCode::Periodic20k => "PERIODIC_20K",
            ServiceCode::Periodic30k => "PERIODIC_30K",
            ServiceCode::BrakeCheck => "BRAKE_CHECK",
            ServiceCode::ClutchAdjust => "CLUTCH_ADJUST",
            ServiceCode::AcCheck => "AC_CHECK",
        }
    }
}

impl fmt::Display for ServiceCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single recommended service action with its justification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub service_code: ServiceCode,
    pub priority: u8,
    pub urgency_label: UrgencyBand,
    pub recommended_window: String,
    pub reason: String,
}

impl Recommendation {
    /// Priority, label and window are all taken from `band` so they never disagree.
    pub fn new(service_code: ServiceCode, band: UrgencyBand, reason: impl Into<String>) -> Self {
        Self {
            service_code,
            priority: band.priority(),
            urgency_label: band,
            recommended_window: band.recommended_window().to_string(),
            reason: reason.into(),
        }
    }
}

/// Python-style truthiness for loosely typed JSON input.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map(|n| n != 0.0).unwrap_or(true),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_defaults_missing_sections() {
        let payload: RequestPayload =
            serde_json::from_value(json!({ "customer_id": "C1" })).expect("payload parses");
        assert!(payload.history.is_empty());
        assert_eq!(payload.vehicle_features, VehicleFeatures::default());
    }

    #[test]
    fn payload_treats_null_sections_as_empty() {
        let payload: RequestPayload = serde_json::from_value(json!({
            "history": null,
            "vehicle_features": null,
        }))
        .expect("payload parses");
        assert!(payload.history.is_empty());
        assert!(payload.vehicle_features.mileage_km.is_none());
    }

    #[test]
    fn record_prefers_service_date_over_date() {
        let record: ServiceRecord = serde_json::from_value(json!({
            "service_date": "2025-01-10",
            "date": "2024-06-01",
        }))
        .expect("record parses");
        assert_eq!(record.raw_date(), Some(&json!("2025-01-10")));

        let record: ServiceRecord = serde_json::from_value(json!({
            "service_date": "",
            "date": "2024-06-01",
        }))
        .expect("record parses");
        assert_eq!(record.raw_date(), Some(&json!("2024-06-01")));
    }

    #[test]
    fn record_keeps_unknown_fields() {
        let record: ServiceRecord = serde_json::from_value(json!({
            "record_id": "R-1",
            "mileage_km": 12000,
            "issues_reported": ["Noise"],
        }))
        .expect("record parses");
        assert_eq!(record.details.get("record_id"), Some(&json!("R-1")));
        assert_eq!(record.issues_reported.len(), 1);
    }

    #[test]
    fn recommendation_serializes_wire_names() {
        let rec = Recommendation::new(ServiceCode::AcCheck, UrgencyBand::CanWait, "ac");
        let value = serde_json::to_value(&rec).expect("serializes");
        assert_eq!(value["service_code"], "AC_CHECK");
        assert_eq!(value["priority"], 3);
        assert_eq!(value["urgency_label"], "can_wait");
        assert_eq!(value["recommended_window"], "within 1 month");
    }
}
