//! Predictive maintenance: scores a vehicle's service history and turns it into
//! a ranked, deduplicated list of recommended service actions.
//!
//! Data flows strictly downstream: normalizer, history aggregation, risk scoring,
//! urgency banding, rule evaluation, then ranking.

pub mod boundary;
pub mod domain;
mod engine;
pub mod history;
pub mod import;
pub mod normalizer;
pub mod ranking;
pub mod repository;
pub mod router;
mod rules;
pub mod scoring;
pub mod service;
pub mod urgency;

pub use boundary::{
    predict_from_reader, predict_from_str, resolve, PredictionError, PredictionOutcome,
    PredictionResponse,
};
pub use domain::{Recommendation, RequestPayload, ServiceCode, ServiceRecord, VehicleFeatures};
pub use engine::{RecommendationEngine, RecommendationReport};
pub use history::HistorySummary;
pub use import::{parse_history_csv, ImportError};
pub use repository::{
    CustomerProfile, CustomerVehicle, JsonFileRepository, RepositoryError,
    ServiceHistoryRepository, StoredServiceRecord,
};
pub use router::predictive_router;
pub use scoring::{RiskAssessment, RiskComponent, RiskFactor, RiskScore};
pub use service::{
    PredictionReply, PredictionRequest, PredictiveMaintenanceService, PredictiveServiceError,
};
pub use urgency::UrgencyBand;
