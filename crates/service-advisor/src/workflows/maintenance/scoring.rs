use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use super::history::HistorySummary;

/// Additive composite risk; every contribution is non-negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RiskScore(f64);

impl RiskScore {
    pub fn new(value: f64) -> Self {
        Self(value.max(0.0))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for RiskScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactor {
    Mileage,
    ServiceCount,
    IssueCount,
    Recency,
    Seasonality,
}

/// Discrete contribution to the risk score, kept for audits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskComponent {
    pub factor: RiskFactor,
    pub contribution: f64,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub score: RiskScore,
    pub components: Vec<RiskComponent>,
}

impl RiskAssessment {
    #[cfg(test)]
    pub(crate) fn contribution(&self, factor: RiskFactor) -> f64 {
        self.components
            .iter()
            .filter(|component| component.factor == factor)
            .map(|component| component.contribution)
            .sum()
    }
}

pub(crate) fn assess_risk(
    mileage_km: f64,
    history: &HistorySummary,
    now: DateTime<Utc>,
) -> RiskAssessment {
    let days_since_service = history.days_since_last_service(now);
    let peak_months = history.peak_months();

    let components = vec![
        RiskComponent {
            factor: RiskFactor::Mileage,
            contribution: mileage_contribution(mileage_km),
            notes: format!("odometer at {mileage_km:.0} km"),
        },
        RiskComponent {
            factor: RiskFactor::ServiceCount,
            contribution: service_count_contribution(history.service_count()),
            notes: format!("{} recorded service visit(s)", history.service_count()),
        },
        RiskComponent {
            factor: RiskFactor::IssueCount,
            contribution: issue_count_contribution(history.issue_count()),
            notes: format!("{} reported issue(s)", history.issue_count()),
        },
        RiskComponent {
            factor: RiskFactor::Recency,
            contribution: days_since_service.map_or(0.0, recency_contribution),
            notes: match days_since_service {
                Some(days) => format!("{days} day(s) since last service"),
                None => "no dated service on record".to_string(),
            },
        },
        RiskComponent {
            factor: RiskFactor::Seasonality,
            contribution: seasonal_contribution(&peak_months, now.month()),
            notes: if peak_months.is_empty() {
                "no seasonal pattern on record".to_string()
            } else {
                format!("peak service months {peak_months:?}")
            },
        },
    ];

    let total: f64 = components
        .iter()
        .map(|component| component.contribution)
        .sum();

    RiskAssessment {
        score: RiskScore::new(total),
        components,
    }
}

fn mileage_contribution(mileage_km: f64) -> f64 {
    if mileage_km >= 60_000.0 {
        2.0
    } else if mileage_km >= 40_000.0 {
        1.5
    } else if mileage_km >= 20_000.0 {
        1.0
    } else if mileage_km >= 10_000.0 {
        0.5
    } else {
        0.0
    }
}

fn service_count_contribution(services: usize) -> f64 {
    if services >= 8 {
        1.0
    } else if services >= 5 {
        0.5
    } else {
        0.0
    }
}

fn issue_count_contribution(issues: usize) -> f64 {
    match issues {
        0 => 0.0,
        1 => 0.5,
        2 | 3 => 1.0,
        _ => 1.5,
    }
}

fn recency_contribution(days_since_service: i64) -> f64 {
    if days_since_service >= 365 {
        1.5
    } else if days_since_service >= 180 {
        1.0
    } else if days_since_service >= 90 {
        0.5
    } else {
        0.0
    }
}

fn seasonal_contribution(peak_months: &BTreeSet<u32>, month: u32) -> f64 {
    if peak_months.contains(&month) {
        return 0.5;
    }

    let previous = if month == 1 { 12 } else { month - 1 };
    let next = if month == 12 { 1 } else { month + 1 };
    if peak_months.contains(&previous) || peak_months.contains(&next) {
        0.25
    } else {
        0.0
    }
}
