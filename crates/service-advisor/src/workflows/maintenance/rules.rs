use super::domain::{Recommendation, ServiceCode};
use super::history::HistorySummary;
use super::scoring::RiskScore;
use super::urgency::UrgencyBand;

const BRAKE_KEYWORDS: &[&str] = &["brake", "spongy"];
const POWER_KEYWORDS: &[&str] = &["pickup", "power"];
const CLUTCH_KEYWORDS: &[&str] = &["clutch", "hard"];
const AC_KEYWORDS: &[&str] = &["ac", "a/c", "air conditioning", "aircon"];

/// Inputs shared by every rule.
pub(crate) struct RuleContext<'a> {
    pub mileage_km: f64,
    pub history: &'a HistorySummary,
    pub risk_score: RiskScore,
    pub urgency: UrgencyBand,
}

type Rule = fn(&RuleContext<'_>) -> Option<Recommendation>;

/// Evaluation order matters: it breaks priority ties during ranking.
const RULES: [Rule; 5] = [
    periodic_mileage_rule,
    brake_issue_rule,
    power_issue_rule,
    clutch_issue_rule,
    ac_issue_rule,
];

/// Runs every rule in order; emits the default preventive service if none fire.
pub(crate) fn evaluate_rules(context: &RuleContext<'_>) -> Vec<Recommendation> {
    let mut recommendations: Vec<Recommendation> =
        RULES.iter().filter_map(|rule| rule(context)).collect();

    if recommendations.is_empty() {
        recommendations.push(default_recommendation(context.risk_score));
    }

    recommendations
}

/// Lower tiers are capped below the base urgency. Label and window follow the
/// capped band, so a capped 10K service reads `can_wait` even when the score is urgent.
fn periodic_mileage_rule(context: &RuleContext<'_>) -> Option<Recommendation> {
    let mileage = context.mileage_km;
    let score = context.risk_score;

    if mileage >= 28_000.0 {
        let band = context.urgency;
        Some(Recommendation::new(
            ServiceCode::Periodic30k,
            band,
            format!(
                "Odometer near or above 30,000 km with a composite risk score of {score}; \
                 periodic 30K service is recommended {}.",
                band.wait_window()
            ),
        ))
    } else if mileage >= 18_000.0 {
        let band = context.urgency.no_more_urgent_than(UrgencyBand::Soon);
        Some(Recommendation::new(
            ServiceCode::Periodic20k,
            band,
            format!(
                "Odometer near or above 20,000 km with risk score {score}; \
                 20K periodic maintenance is advisable {}.",
                band.wait_window()
            ),
        ))
    } else if mileage >= 8_000.0 {
        let band = context.urgency.no_more_urgent_than(UrgencyBand::CanWait);
        Some(Recommendation::new(
            ServiceCode::Periodic10k,
            band,
            format!(
                "Odometer near or above 10,000 km with risk score {score}; \
                 a basic 10K periodic service is recommended {}.",
                band.wait_window()
            ),
        ))
    } else {
        None
    }
}

/// Brakes are safety critical and always urgent, whatever the score says.
fn brake_issue_rule(context: &RuleContext<'_>) -> Option<Recommendation> {
    context.history.mentions_any(BRAKE_KEYWORDS).then(|| {
        Recommendation::new(
            ServiceCode::BrakeCheck,
            UrgencyBand::Urgent,
            "Reported brake-related issues (e.g. spongy pedal or longer stopping distance); \
             brake inspection is critical and should not be delayed.",
        )
    })
}

fn power_issue_rule(context: &RuleContext<'_>) -> Option<Recommendation> {
    context.history.mentions_any(POWER_KEYWORDS).then(|| {
        Recommendation::new(
            ServiceCode::Periodic20k,
            context.urgency.relaxed(),
            "Reported pickup/power drop; periodic service with inspection of filters, \
             fluids and ignition components is recommended.",
        )
    })
}

fn clutch_issue_rule(context: &RuleContext<'_>) -> Option<Recommendation> {
    context.history.mentions_any(CLUTCH_KEYWORDS).then(|| {
        Recommendation::new(
            ServiceCode::ClutchAdjust,
            context.urgency.relaxed(),
            "Reported clutch hardness; clutch adjustment is advised for stop-go city traffic.",
        )
    })
}

fn ac_issue_rule(context: &RuleContext<'_>) -> Option<Recommendation> {
    context.history.mentions_any(AC_KEYWORDS).then(|| {
        Recommendation::new(
            ServiceCode::AcCheck,
            context.urgency.relaxed(),
            "Reported AC cooling issues; inspect refrigerant, condenser and cabin filter \
             before the next long drive.",
        )
    })
}

fn default_recommendation(score: RiskScore) -> Recommendation {
    Recommendation::new(
        ServiceCode::Periodic10k,
        UrgencyBand::CanWait,
        format!(
            "Default preventive 10K service recommendation for city driving with \
             risk score {score}."
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::maintenance::domain::ServiceRecord;

    fn history(issues: &[&str]) -> HistorySummary {
        HistorySummary::from_records(&[ServiceRecord::new(None, issues.iter().copied())])
    }

    fn context(mileage_km: f64, history: &HistorySummary, urgency: UrgencyBand) -> RuleContext<'_> {
        RuleContext {
            mileage_km,
            history,
            risk_score: RiskScore::new(1.5),
            urgency,
        }
    }

    fn codes(recommendations: &[Recommendation]) -> Vec<ServiceCode> {
        recommendations.iter().map(|rec| rec.service_code).collect()
    }

    #[test]
    fn picks_highest_mileage_tier_only() {
        let empty = HistorySummary::default();

        let recs = evaluate_rules(&context(31_000.0, &empty, UrgencyBand::Urgent));
        assert_eq!(codes(&recs), vec![ServiceCode::Periodic30k]);
        assert_eq!(recs[0].priority, 1);
        assert!(recs[0].reason.contains("30,000 km"));
        assert!(recs[0].reason.contains("1.5"));

        let recs = evaluate_rules(&context(18_000.0, &empty, UrgencyBand::Urgent));
        assert_eq!(codes(&recs), vec![ServiceCode::Periodic20k]);
        assert_eq!(recs[0].priority, 2);
        assert_eq!(recs[0].urgency_label, UrgencyBand::Soon);

        let recs = evaluate_rules(&context(8_000.0, &empty, UrgencyBand::Urgent));
        assert_eq!(codes(&recs), vec![ServiceCode::Periodic10k]);
        assert_eq!(recs[0].priority, 3);
        assert_eq!(recs[0].urgency_label, UrgencyBand::CanWait);
        assert_eq!(recs[0].recommended_window, "within 1 month");
    }

    #[test]
    fn brake_rule_ignores_computed_urgency() {
        let issues = history(&["Spongy pedal"]);
        let recs = evaluate_rules(&context(0.0, &issues, UrgencyBand::CanWait));

        assert_eq!(codes(&recs), vec![ServiceCode::BrakeCheck]);
        assert_eq!(recs[0].priority, 1);
        assert_eq!(recs[0].urgency_label, UrgencyBand::Urgent);
        assert_eq!(recs[0].recommended_window, "0-3 days");
    }

    #[test]
    fn issue_rules_relax_one_tier() {
        let issues = history(&["low power on climbs", "clutch feels hard", "a/c weak"]);
        let recs = evaluate_rules(&context(0.0, &issues, UrgencyBand::Urgent));

        assert_eq!(
            codes(&recs),
            vec![
                ServiceCode::Periodic20k,
                ServiceCode::ClutchAdjust,
                ServiceCode::AcCheck
            ]
        );
        assert!(recs.iter().all(|rec| rec.priority == 2));
    }

    #[test]
    fn keyword_matching_is_plain_substring() {
        let issues = history(&["new hardware fitted"]);
        let recs = evaluate_rules(&context(0.0, &issues, UrgencyBand::CanWait));
        assert_eq!(codes(&recs), vec![ServiceCode::ClutchAdjust]);

        // "ac" hides inside many words
        let issues = history(&["rattle near the back seat"]);
        let recs = evaluate_rules(&context(0.0, &issues, UrgencyBand::CanWait));
        assert_eq!(codes(&recs), vec![ServiceCode::AcCheck]);
        assert_eq!(recs[0].priority, 3);
    }

    #[test]
    fn falls_back_when_nothing_fires() {
        let empty = HistorySummary::default();
        let recs = evaluate_rules(&context(500.0, &empty, UrgencyBand::CanWait));

        assert_eq!(codes(&recs), vec![ServiceCode::Periodic10k]);
        assert_eq!(recs[0].priority, 3);
        assert_eq!(recs[0].urgency_label, UrgencyBand::CanWait);
        assert!(recs[0].reason.starts_with("Default preventive"));
        assert!(recs[0].reason.contains("1.5"));
    }
}
