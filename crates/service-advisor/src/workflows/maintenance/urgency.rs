use serde::{Deserialize, Serialize};

use super::scoring::RiskScore;

/// Discrete urgency tiers derived from the composite risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyBand {
    Urgent,
    Soon,
    CanWait,
}

impl UrgencyBand {
    pub fn from_score(score: RiskScore) -> Self {
        let value = score.value();
        if value >= 3.0 {
            UrgencyBand::Urgent
        } else if value >= 2.0 {
            UrgencyBand::Soon
        } else {
            UrgencyBand::CanWait
        }
    }

    /// Priorities outside 1..=3 clamp to the nearest band.
    pub fn from_priority(priority: u8) -> Self {
        match priority {
            0 | 1 => UrgencyBand::Urgent,
            2 => UrgencyBand::Soon,
            _ => UrgencyBand::CanWait,
        }
    }

    pub fn priority(self) -> u8 {
        match self {
            UrgencyBand::Urgent => 1,
            UrgencyBand::Soon => 2,
            UrgencyBand::CanWait => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            UrgencyBand::Urgent => "urgent",
            UrgencyBand::Soon => "soon",
            UrgencyBand::CanWait => "can_wait",
        }
    }

    pub fn wait_window(self) -> &'static str {
        match self {
            UrgencyBand::Urgent => "within the next few days",
            UrgencyBand::Soon => "within 2 weeks",
            UrgencyBand::CanWait => "within the next month",
        }
    }

    pub fn recommended_window(self) -> &'static str {
        match self {
            UrgencyBand::Urgent => "0-3 days",
            UrgencyBand::Soon => "1-2 weeks",
            UrgencyBand::CanWait => "within 1 month",
        }
    }

    /// One tier less urgent, stopping at `CanWait`.
    pub fn relaxed(self) -> Self {
        Self::from_priority(self.priority() + 1)
    }

    /// The less urgent of `self` and `floor`.
    pub fn no_more_urgent_than(self, floor: UrgencyBand) -> Self {
        Self::from_priority(self.priority().max(floor.priority()))
    }
}
