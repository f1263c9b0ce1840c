use std::io::Read;

use serde::{Deserialize, Deserializer};

use super::repository::StoredServiceRecord;

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to read service history export: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: mileage `{value}` is not a number")]
    InvalidMileage { row: usize, value: String },
}

/// Parse a dealer service-history CSV export.
///
/// Multi-valued columns are `;`-separated; blank cells are treated as absent.
pub fn parse_history_csv<R: Read>(reader: R) -> Result<Vec<StoredServiceRecord>, ImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut records = Vec::new();

    for (index, row) in csv_reader.deserialize::<HistoryRow>().enumerate() {
        let row = row?;
        let mileage_km = row
            .mileage_km
            .map(|raw| {
                raw.replace(',', "")
                    .parse::<f64>()
                    .map_err(|_| ImportError::InvalidMileage {
                        row: index + 1,
                        value: raw,
                    })
            })
            .transpose()?;

        records.push(StoredServiceRecord {
            record_id: row.record_id,
            customer_id: row.customer_id,
            vin: row.vin,
            date: row.date,
            service_codes_performed: split_list(row.service_codes.as_deref()),
            mileage_km,
            issues_reported: split_list(row.issues_reported.as_deref()),
        });
    }

    Ok(records)
}

#[derive(Debug, Deserialize)]
struct HistoryRow {
    #[serde(rename = "Record ID")]
    record_id: String,
    #[serde(rename = "Customer ID")]
    customer_id: String,
    #[serde(rename = "VIN")]
    vin: String,
    #[serde(rename = "Date", default, deserialize_with = "empty_string_as_none")]
    date: Option<String>,
    #[serde(
        rename = "Mileage KM",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    mileage_km: Option<String>,
    #[serde(
        rename = "Service Codes",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    service_codes: Option<String>,
    #[serde(
        rename = "Issues Reported",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    issues_reported: Option<String>,
}

fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|value| {
        value
            .split(';')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.and_then(|raw| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }))
}
