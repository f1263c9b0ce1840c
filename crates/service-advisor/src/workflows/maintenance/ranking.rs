use std::collections::HashMap;

use super::domain::{Recommendation, ServiceCode};

/// Keep the most urgent recommendation per service code, then order by priority.
///
/// Codes keep the slot of their first appearance, so equal priorities stay in
/// rule-evaluation order after the stable sort.
pub fn dedupe_and_rank(recommendations: Vec<Recommendation>) -> Vec<Recommendation> {
    let mut slots: HashMap<ServiceCode, usize> = HashMap::new();
    let mut retained: Vec<Recommendation> = Vec::with_capacity(recommendations.len());

    for recommendation in recommendations {
        match slots.get(&recommendation.service_code) {
            Some(&slot) => {
                if recommendation.priority < retained[slot].priority {
                    retained[slot] = recommendation;
                }
            }
            None => {
                slots.insert(recommendation.service_code, retained.len());
                retained.push(recommendation);
            }
        }
    }

    retained.sort_by_key(|recommendation| recommendation.priority);
    retained
}
