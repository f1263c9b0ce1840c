use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::{Recommendation, RequestPayload};
use super::history::HistorySummary;
use super::normalizer::normalize_mileage;
use super::ranking::dedupe_and_rank;
use super::rules::{evaluate_rules, RuleContext};
use super::scoring::{assess_risk, RiskComponent, RiskScore};
use super::urgency::UrgencyBand;

/// Stateless engine turning service history into ranked recommendations.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecommendationEngine;

impl RecommendationEngine {
    pub fn new() -> Self {
        Self
    }

    /// `now` anchors recency and seasonality so runs are reproducible.
    pub fn recommend(&self, payload: &RequestPayload, now: DateTime<Utc>) -> RecommendationReport {
        let mileage_km = normalize_mileage(&payload.vehicle_features);
        let history = HistorySummary::from_records(&payload.history);
        let assessment = assess_risk(mileage_km, &history, now);
        let urgency = UrgencyBand::from_score(assessment.score);

        debug!(
            mileage_km,
            services = history.service_count(),
            issues = history.issue_count(),
            risk_score = assessment.score.value(),
            urgency = urgency.label(),
            "risk assessed"
        );

        let context = RuleContext {
            mileage_km,
            history: &history,
            risk_score: assessment.score,
            urgency,
        };
        let recommendations = dedupe_and_rank(evaluate_rules(&context));

        RecommendationReport {
            risk_score: assessment.score,
            urgency,
            components: assessment.components,
            recommendations,
        }
    }
}

/// Full audit trail for a single recommendation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationReport {
    pub risk_score: RiskScore,
    pub urgency: UrgencyBand,
    pub components: Vec<RiskComponent>,
    pub recommendations: Vec<Recommendation>,
}
