use chrono::{DateTime, NaiveDate, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use service_advisor::workflows::maintenance::{
    CustomerVehicle, RepositoryError, ServiceHistoryRepository, StoredServiceRecord,
};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Fixed history used by the demo command.
#[derive(Default, Clone)]
pub(crate) struct InMemoryHistoryRepository {
    records: Vec<StoredServiceRecord>,
    vehicles: Vec<(String, CustomerVehicle)>,
}

impl InMemoryHistoryRepository {
    pub(crate) fn with_records(records: Vec<StoredServiceRecord>) -> Self {
        Self {
            records,
            vehicles: Vec::new(),
        }
    }

    pub(crate) fn register_vehicle(&mut self, customer_id: &str, vehicle: CustomerVehicle) {
        self.vehicles.push((customer_id.to_string(), vehicle));
    }
}

impl ServiceHistoryRepository for InMemoryHistoryRepository {
    fn history_for(
        &self,
        customer_id: &str,
        vin: &str,
    ) -> Result<Vec<StoredServiceRecord>, RepositoryError> {
        Ok(self
            .records
            .iter()
            .filter(|record| record.belongs_to(customer_id, vin))
            .cloned()
            .collect())
    }

    fn vehicle_for(
        &self,
        customer_id: &str,
        vin: &str,
    ) -> Result<Option<CustomerVehicle>, RepositoryError> {
        Ok(self
            .vehicles
            .iter()
            .find(|(owner, vehicle)| owner == customer_id && vehicle.vin == vin)
            .map(|(_, vehicle)| vehicle.clone()))
    }
}

/// Accepts RFC 3339 timestamps or bare `YYYY-MM-DD` dates (midnight UTC).
pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("failed to parse '{raw}' as RFC 3339 or YYYY-MM-DD"))
}
