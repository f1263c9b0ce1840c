use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use super::domain::{Recommendation, RequestPayload, VehicleFeatures};
use super::engine::RecommendationEngine;
use super::repository::{RepositoryError, ServiceHistoryRepository};

/// Lookup request issued by dealership front-ends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionRequest {
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub vin: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionReply {
    pub customer_id: String,
    pub vin: String,
    pub recommendations: Vec<Recommendation>,
}

/// Service composing the history repository and the recommendation engine.
pub struct PredictiveMaintenanceService<R> {
    repository: Arc<R>,
    engine: RecommendationEngine,
}

impl<R> PredictiveMaintenanceService<R>
where
    R: ServiceHistoryRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            engine: RecommendationEngine::new(),
        }
    }

    /// Assemble the stored history for a vehicle and run the engine on it.
    pub fn predict(
        &self,
        request: &PredictionRequest,
        now: DateTime<Utc>,
    ) -> Result<PredictionReply, PredictiveServiceError> {
        let customer_id = non_blank(&request.customer_id);
        let vin = non_blank(&request.vin);
        let (Some(customer_id), Some(vin)) = (customer_id, vin) else {
            return Err(PredictiveServiceError::MissingIdentifiers);
        };

        let payload = self.build_payload(customer_id, vin)?;
        let report = self.engine.recommend(&payload, now);

        info!(
            customer_id,
            vin,
            records = payload.history.len(),
            risk_score = report.risk_score.value(),
            recommendations = report.recommendations.len(),
            "predictive maintenance computed"
        );

        Ok(PredictionReply {
            customer_id: customer_id.to_string(),
            vin: vin.to_string(),
            recommendations: report.recommendations,
        })
    }

    /// The latest stored record supplies the current odometer reading.
    pub fn build_payload(
        &self,
        customer_id: &str,
        vin: &str,
    ) -> Result<RequestPayload, PredictiveServiceError> {
        let stored = self.repository.history_for(customer_id, vin)?;
        let vehicle = self.repository.vehicle_for(customer_id, vin)?;

        let mut attributes = Map::new();
        if let Some(vehicle) = vehicle {
            if let Some(model) = vehicle.model {
                attributes.insert("model".to_string(), Value::String(model));
            }
            if let Some(year) = vehicle.year {
                attributes.insert("year".to_string(), Value::from(year));
            }
        }

        let mileage_km = stored
            .last()
            .and_then(|record| record.mileage_km)
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number);

        Ok(RequestPayload {
            customer_id: Some(customer_id.to_string()),
            vin: Some(vin.to_string()),
            history: stored.iter().map(|record| record.to_service_record()).collect(),
            vehicle_features: VehicleFeatures {
                mileage_km,
                odometer: None,
                attributes,
            },
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Error raised by the predictive maintenance service.
#[derive(Debug, thiserror::Error)]
pub enum PredictiveServiceError {
    #[error("customer_id and vin are required")]
    MissingIdentifiers,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::maintenance::domain::ServiceCode;
    use crate::workflows::maintenance::repository::{CustomerVehicle, StoredServiceRecord};
    use chrono::TimeZone;

    struct FixedRepository {
        records: Vec<StoredServiceRecord>,
    }

    impl ServiceHistoryRepository for FixedRepository {
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
            _customer_id: &str,
            vin: &str,
        ) -> Result<Option<CustomerVehicle>, RepositoryError> {
            Ok(Some(CustomerVehicle {
                vin: vin.to_string(),
                model: Some("Creta".to_string()),
                year: Some(2020),
            }))
        }
    }

    struct DownRepository;

    fn offline() -> RepositoryError {
        RepositoryError::Io {
            path: std::path::PathBuf::from("data/service_history.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "disk offline"),
        }
    }

    impl ServiceHistoryRepository for DownRepository {
        fn history_for(
            &self,
            _customer_id: &str,
            _vin: &str,
        ) -> Result<Vec<StoredServiceRecord>, RepositoryError> {
            Err(offline())
        }

        fn vehicle_for(
            &self,
            _customer_id: &str,
            _vin: &str,
        ) -> Result<Option<CustomerVehicle>, RepositoryError> {
            Err(offline())
        }
    }

    fn record(id: &str, date: &str, mileage_km: f64, issues: &[&str]) -> StoredServiceRecord {
        StoredServiceRecord {
            record_id: id.to_string(),
            customer_id: "C1".to_string(),
            vin: "VIN1".to_string(),
            date: Some(date.to_string()),
            service_codes_performed: Vec::new(),
            mileage_km: Some(mileage_km),
            issues_reported: issues.iter().map(|issue| issue.to_string()).collect(),
        }
    }

    fn request(customer_id: &str, vin: &str) -> PredictionRequest {
        PredictionRequest {
            customer_id: Some(customer_id.to_string()),
            vin: Some(vin.to_string()),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn uses_latest_record_mileage() {
        let repository = FixedRepository {
            records: vec![
                record("R1", "2024-02-01", 9_800.0, &[]),
                record("R2", "2025-07-15", 29_400.0, &["Clutch pedal hard"]),
            ],
        };
        let service = PredictiveMaintenanceService::new(Arc::new(repository));

        let payload = service.build_payload("C1", "VIN1").expect("payload builds");
        assert_eq!(payload.vehicle_features.mileage_km, Some(Value::from(29_400.0)));
        assert_eq!(
            payload.vehicle_features.attributes.get("model"),
            Some(&Value::String("Creta".to_string()))
        );

        let reply = service
            .predict(&request("C1", "VIN1"), now())
            .expect("prediction succeeds");
        assert_eq!(reply.customer_id, "C1");
        let codes: Vec<_> = reply.recommendations.iter().map(|r| r.service_code).collect();
        assert!(codes.contains(&ServiceCode::Periodic30k));
        assert!(codes.contains(&ServiceCode::ClutchAdjust));
    }

    #[test]
    fn unknown_vehicle_gets_default_recommendation() {
        let service = PredictiveMaintenanceService::new(Arc::new(FixedRepository {
            records: Vec::new(),
        }));

        let reply = service
            .predict(&request("C9", "VIN9"), now())
            .expect("prediction succeeds");
        assert_eq!(reply.recommendations.len(), 1);
        assert_eq!(reply.recommendations[0].service_code, ServiceCode::Periodic10k);
    }

    #[test]
    fn rejects_missing_identifiers() {
        let service = PredictiveMaintenanceService::new(Arc::new(FixedRepository {
            records: Vec::new(),
        }));

        let result = service.predict(
            &PredictionRequest {
                customer_id: Some("C1".to_string()),
                vin: Some("   ".to_string()),
            },
            now(),
        );
        assert!(matches!(
            result,
            Err(PredictiveServiceError::MissingIdentifiers)
        ));
    }

    #[test]
    fn surfaces_repository_failures() {
        let service = PredictiveMaintenanceService::new(Arc::new(DownRepository));
        let result = service.predict(&request("C1", "VIN1"), now());
        assert!(matches!(
            result,
            Err(PredictiveServiceError::Repository(RepositoryError::Io { .. }))
        ));
    }
}
