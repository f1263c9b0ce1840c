use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use super::domain::{null_as_default, ServiceRecord};

pub const HISTORY_FILE: &str = "service_history.json";
pub const CUSTOMERS_FILE: &str = "customers.json";

/// Dealership record of a completed service visit.
///
/// Only the owner ids are required; loosely typed optional fields are coerced
/// or dropped rather than failing the whole document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredServiceRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub record_id: String,
    pub customer_id: String,
    pub vin: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub service_codes_performed: Vec<String>,
    #[serde(default, deserialize_with = "lenient_mileage")]
    pub mileage_km: Option<f64>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub issues_reported: Vec<String>,
}

impl StoredServiceRecord {
    pub fn belongs_to(&self, customer_id: &str, vin: &str) -> bool {
        self.customer_id == customer_id && self.vin == vin
    }

    pub fn to_service_record(&self) -> ServiceRecord {
        let mut record = ServiceRecord::new(self.date.as_deref(), self.issues_reported.clone());
        record
            .details
            .insert("record_id".to_string(), Value::String(self.record_id.clone()));
        if let Some(mileage) = self.mileage_km.and_then(serde_json::Number::from_f64) {
            record
                .details
                .insert("mileage_km".to_string(), Value::Number(mileage));
        }
        record
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub customer_id: String,
    #[serde(default)]
    pub vehicles: Vec<CustomerVehicle>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerVehicle {
    pub vin: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub year: Option<u16>,
}

/// Read-only access to stored service history.
pub trait ServiceHistoryRepository: Send + Sync {
    /// Matching records in stored order.
    fn history_for(
        &self,
        customer_id: &str,
        vin: &str,
    ) -> Result<Vec<StoredServiceRecord>, RepositoryError>;
    fn vehicle_for(
        &self,
        customer_id: &str,
        vin: &str,
    ) -> Result<Option<CustomerVehicle>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// JSON documents in a data directory, re-read on every lookup.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    data_dir: PathBuf,
}

impl JsonFileRepository {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// The document must be a JSON array; rows that do not fit `T` are skipped.
    fn read_collection<T: DeserializeOwned>(&self, file: &str) -> Result<Vec<T>, RepositoryError> {
        let path = self.data_dir.join(file);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(RepositoryError::Io { path, source }),
        };
        let rows: Vec<Value> = serde_json::from_str(&raw)
            .map_err(|source| RepositoryError::Parse { path: path.clone(), source })?;

        Ok(rows
            .into_iter()
            .enumerate()
            .filter_map(|(index, row)| match serde_json::from_value(row) {
                Ok(item) => Some(item),
                Err(error) => {
                    warn!(path = %path.display(), index, %error, "skipping unreadable row");
                    None
                }
            })
            .collect())
    }
}

impl ServiceHistoryRepository for JsonFileRepository {
    fn history_for(
        &self,
        customer_id: &str,
        vin: &str,
    ) -> Result<Vec<StoredServiceRecord>, RepositoryError> {
        let records: Vec<StoredServiceRecord> = self.read_collection(HISTORY_FILE)?;
        Ok(records
            .into_iter()
            .filter(|record| record.belongs_to(customer_id, vin))
            .collect())
    }

    fn vehicle_for(
        &self,
        customer_id: &str,
        vin: &str,
    ) -> Result<Option<CustomerVehicle>, RepositoryError> {
        let customers: Vec<CustomerProfile> = self.read_collection(CUSTOMERS_FILE)?;
        Ok(customers
            .into_iter()
            .find(|customer| customer.customer_id == customer_id)
            .and_then(|customer| customer.vehicles.into_iter().find(|v| v.vin == vin)))
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) if !text.trim().is_empty() => Some(text),
        Some(Value::Null) | Some(Value::String(_)) | None => None,
        Some(other) => Some(other.to_string()),
    })
}

/// Non-string entries are stringified; `null` reads as empty.
fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items: Vec<Value> = null_as_default(deserializer)?;
    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::Null => None,
            Value::String(text) => Some(text),
            other => Some(other.to_string()),
        })
        .collect())
}

/// Numbers or numeric strings (thousands separators allowed); anything else is absent.
fn lenient_mileage<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    })
}
