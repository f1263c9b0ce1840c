use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Datelike, FixedOffset, Utc};
use serde_json::Value;

use super::domain::ServiceRecord;
use super::normalizer::normalize_date;

/// Months at or above this share of the busiest month count as peak months.
const PEAK_MONTH_RATIO: f64 = 0.7;

/// Flattened view of a vehicle's service history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistorySummary {
    issues: Vec<String>,
    issues_text: String,
    service_count: usize,
    last_service: Option<DateTime<FixedOffset>>,
    month_counts: BTreeMap<u32, usize>,
}

impl HistorySummary {
    pub fn from_records(records: &[ServiceRecord]) -> Self {
        let mut issues = Vec::new();
        let mut last_service: Option<DateTime<FixedOffset>> = None;
        let mut month_counts = BTreeMap::new();

        for record in records {
            issues.extend(record.issues_reported.iter().map(lowercase_issue));

            let Some(serviced_at) = record.raw_date().and_then(normalize_date) else {
                continue;
            };

            if last_service.map_or(true, |latest| serviced_at > latest) {
                last_service = Some(serviced_at);
            }
            *month_counts.entry(serviced_at.month()).or_insert(0) += 1;
        }

        let issues_text = issues.join(" ");

        Self {
            issues,
            issues_text,
            service_count: records.len(),
            last_service,
            month_counts,
        }
    }

    /// Lowercased, space-joined issue corpus used for keyword triggers.
    #[cfg(test)]
    pub(crate) fn issues_text(&self) -> &str {
        &self.issues_text
    }

    /// Plain substring containment against the lowercased corpus.
    pub fn mentions_any(&self, keywords: &[&str]) -> bool {
        keywords
            .iter()
            .any(|keyword| self.issues_text.contains(keyword))
    }

    pub fn service_count(&self) -> usize {
        self.service_count
    }

    pub fn issue_count(&self) -> usize {
        self.issues.len()
    }

    #[cfg(test)]
    pub(crate) fn last_service(&self) -> Option<DateTime<FixedOffset>> {
        self.last_service
    }

    #[cfg(test)]
    pub(crate) fn month_counts(&self) -> &BTreeMap<u32, usize> {
        &self.month_counts
    }

    pub fn days_since_last_service(&self, now: DateTime<Utc>) -> Option<i64> {
        self.last_service
            .map(|serviced_at| (now - serviced_at.with_timezone(&Utc)).num_days())
    }

    pub fn peak_months(&self) -> BTreeSet<u32> {
        let Some(&busiest) = self.month_counts.values().max() else {
            return BTreeSet::new();
        };
        let threshold = busiest as f64 * PEAK_MONTH_RATIO;

        self.month_counts
            .iter()
            .filter(|(_, count)| **count as f64 >= threshold)
            .map(|(&month, _)| month)
            .collect()
    }
}

fn lowercase_issue(issue: &Value) -> String {
    match issue {
        Value::String(text) => text.to_lowercase(),
        other => other.to_string().to_lowercase(),
    }
}
