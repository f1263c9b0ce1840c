//! Raw JSON in, recommendation JSON out.
//!
//! The engine itself cannot fail; anything that goes wrong before it runs is
//! folded into a single fallback recommendation so callers always receive a
//! well-formed response.

use std::io::Read;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::domain::{Recommendation, RequestPayload, ServiceCode};
use super::engine::{RecommendationEngine, RecommendationReport};
use super::import::ImportError;
use super::urgency::UrgencyBand;

/// Reasons a raw payload never reached the engine.
#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    #[error("empty input for predictive model")]
    EmptyInput,
    #[error("malformed request payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Import(#[from] ImportError),
}

#[derive(Debug)]
pub enum PredictionOutcome {
    Computed(RecommendationReport),
    Fallback { error: PredictionError },
}

impl PredictionOutcome {
    pub fn is_fallback(&self) -> bool {
        matches!(self, PredictionOutcome::Fallback { .. })
    }

    pub fn into_response(self) -> PredictionResponse {
        let recommendations = match self {
            PredictionOutcome::Computed(report) => report.recommendations,
            PredictionOutcome::Fallback { error } => vec![fallback_recommendation(&error)],
        };
        PredictionResponse { recommendations }
    }
}

/// Wire shape written back to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub recommendations: Vec<Recommendation>,
}

pub fn predict_from_str(raw: &str, now: DateTime<Utc>) -> PredictionOutcome {
    resolve(parse_payload(raw), now)
}

pub fn predict_from_reader<R: Read>(mut reader: R, now: DateTime<Utc>) -> PredictionOutcome {
    let mut raw = String::new();
    match reader.read_to_string(&mut raw) {
        Ok(_) => predict_from_str(&raw, now),
        Err(err) => resolve(Err(err.into()), now),
    }
}

/// Run the engine on a payload, or fold the error into the fallback outcome.
pub fn resolve(
    payload: Result<RequestPayload, PredictionError>,
    now: DateTime<Utc>,
) -> PredictionOutcome {
    match payload {
        Ok(payload) => {
            PredictionOutcome::Computed(RecommendationEngine::new().recommend(&payload, now))
        }
        Err(error) => {
            warn!(%error, "falling back to default recommendation");
            PredictionOutcome::Fallback { error }
        }
    }
}

fn parse_payload(raw: &str) -> Result<RequestPayload, PredictionError> {
    if raw.trim().is_empty() {
        return Err(PredictionError::EmptyInput);
    }
    Ok(serde_json::from_str(raw)?)
}

fn fallback_recommendation(error: &PredictionError) -> Recommendation {
    Recommendation::new(
        ServiceCode::Periodic10k,
        UrgencyBand::CanWait,
        format!("Fallback recommendation due to model error: {error}"),
    )
}
