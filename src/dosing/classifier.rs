use serde::Serialize;

use crate::intelligence::messages::MessageTemplates;
use crate::models::{DoseComparison, Route, Severity};
use crate::monograph::DosageProfile;

/// Outcome of comparing a proposed amount against the route's evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Compared(DoseComparison),
    ConcentrationBased,
    NoRange,
}

/// One dose-summary record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationRecord {
    pub outcome: Classification,
    pub level: Severity,
    pub text: String,
    /// (min, max) in mg when a fixed range was compared.
    pub range: Option<(f64, f64)>,
}

/// Where `proposed` falls relative to the inclusive range `[min, max]`.
pub fn compare(proposed: f64, min: f64, max: f64) -> DoseComparison {
    if proposed < min {
        DoseComparison::Below
    } else if proposed > max {
        DoseComparison::Above
    } else {
        DoseComparison::Within
    }
}

/// Compare a proposed mg amount against the fixed-dose range of `route`.
pub fn classify_dose(proposed_mg: f64, profile: &DosageProfile, route: Route) -> ClassificationRecord {
    if let Some((min, max)) = profile.fixed_range(route) {
        let comparison = compare(proposed_mg, min, max);
        let (level, text) = match comparison {
            DoseComparison::Below => (
                Severity::Caution,
                MessageTemplates::classification_below(proposed_mg, min, max),
            ),
            DoseComparison::Above => (
                Severity::Caution,
                MessageTemplates::classification_above(proposed_mg, min, max),
            ),
            DoseComparison::Within => (
                Severity::Info,
                MessageTemplates::classification_within(proposed_mg, min, max),
            ),
        };
        return ClassificationRecord {
            outcome: Classification::Compared(comparison),
            level,
            text,
            range: Some((min, max)),
        };
    }

    if profile.is_concentration_based(route) {
        return ClassificationRecord {
            outcome: Classification::ConcentrationBased,
            level: Severity::Info,
            text: MessageTemplates::classification_concentration(route, proposed_mg),
            range: None,
        };
    }

    ClassificationRecord {
        outcome: Classification::NoRange,
        level: Severity::Info,
        text: MessageTemplates::classification_no_range(route),
        range: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monograph::RouteEvidence;

    fn oral_profile() -> DosageProfile {
        let mut profile = DosageProfile::default();
        let mut oral = RouteEvidence::new(Route::Oral);
        oral.doses_mg = vec![250.0, 500.0];
        profile.routes.insert(Route::Oral, oral);
        profile
    }

    #[test]
    fn compare_is_inclusive() {
        assert_eq!(compare(249.9, 250.0, 500.0), DoseComparison::Below);
        assert_eq!(compare(250.0, 250.0, 500.0), DoseComparison::Within);
        assert_eq!(compare(500.0, 250.0, 500.0), DoseComparison::Within);
        assert_eq!(compare(500.1, 250.0, 500.0), DoseComparison::Above);
    }

    #[test]
    fn above_range_is_caution() {
        let record = classify_dose(750.0, &oral_profile(), Route::Oral);
        assert_eq!(record.outcome, Classification::Compared(DoseComparison::Above));
        assert_eq!(record.level, Severity::Caution);
        assert_eq!(record.range, Some((250.0, 500.0)));
        assert!(record.text.contains("above recommended fixed range 250–500 mg"));
    }

    #[test]
    fn within_range_is_info() {
        let record = classify_dose(500.0, &oral_profile(), Route::Oral);
        assert_eq!(record.outcome, Classification::Compared(DoseComparison::Within));
        assert_eq!(record.level, Severity::Info);
    }

    #[test]
    fn concentration_route_cannot_compare() {
        let mut profile = oral_profile();
        let mut iv = RouteEvidence::new(Route::Intravenous);
        iv.concentration = true;
        profile.routes.insert(Route::Intravenous, iv);
        profile.mg_per_ml.push(50.0);

        let record = classify_dose(100.0, &profile, Route::Intravenous);
        assert_eq!(record.outcome, Classification::ConcentrationBased);
        assert_eq!(record.level, Severity::Info);
        assert!(record.text.contains("concentration-based"));
    }

    #[test]
    fn missing_route_has_no_range() {
        let record = classify_dose(100.0, &oral_profile(), Route::Rectal);
        assert_eq!(record.outcome, Classification::NoRange);
        assert_eq!(
            record.text,
            "No dosage range could be extracted for the selected route (Rectal)."
        );
    }
}
