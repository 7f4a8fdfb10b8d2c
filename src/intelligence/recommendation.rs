use serde::Serialize;

use crate::dosing::{compare, ProposedDose};
use crate::models::{AlertCategory, DoseComparison, ParsedDose, RecommendationStatus, Route, Severity};
use crate::monograph::{AllergenMention, DosageProfile};

use super::allergy::AllergyAssessment;
use super::messages::{amount, MessageTemplates};
use super::status::{classify_status, filter_bullets, require_comparison, StatusSource};
use super::types::Alert;

/// Everything the recommendation reads. Nothing here is recomputed.
pub struct RecommendationInput<'a> {
    pub drug: &'a str,
    pub route: Route,
    pub profile: &'a DosageProfile,
    pub proposed: &'a ProposedDose,
    /// Regimen parsed from the best monograph dosing sentence.
    pub regimen: Option<ParsedDose>,
    pub alerts: &'a [Alert],
    pub allergy: &'a AllergyAssessment,
    pub allergen_mentions: &'a [AllergenMention],
    /// Day count the duration rule found in the monograph.
    pub monograph_days: Option<u32>,
    pub has_weight: bool,
}

/// Fixed-dose range the recommendation refers to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RangeReference {
    pub route: Route,
    pub min_mg: f64,
    pub max_mg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationResult {
    pub status: RecommendationStatus,
    pub status_source: StatusSource,
    pub primary: String,
    pub bullets: Vec<String>,
    /// Bullets that survived the missing-data filter, without trailing periods.
    pub filtered_bullets: Vec<String>,
    pub range: Option<RangeReference>,
    pub reasons: Vec<String>,
    /// The monograph regimen that was compared, if any.
    pub regimen: Option<ParsedDose>,
    /// Highest of the comparison outcome and every alert severity.
    pub level: Severity,
}

fn comparison_level(comparison: DoseComparison) -> Severity {
    match comparison {
        DoseComparison::Within => Severity::Info,
        DoseComparison::Below | DoseComparison::Above => Severity::Caution,
    }
}

/// "lo–hi mg/mL", "x mg/mL" or just "mg/mL".
fn concentration_snippet(profile: &DosageProfile) -> String {
    match profile.concentration_range() {
        Some((lo, hi)) if lo != hi => format!("{}–{} mg/mL", amount(lo), amount(hi)),
        Some((lo, _)) => format!("{} mg/mL", amount(lo)),
        None => "mg/mL".to_string(),
    }
}

/// Primary statement and its comparison severity, in decision order:
/// monograph daily range, route fixed range, weight-based rule, then the
/// no-range statements. `None` means no proposed amount was compared.
fn primary_statement(input: &RecommendationInput) -> (String, Option<Severity>) {
    let proposed = input.proposed;
    let route = input.route;

    if let Some((min, max)) = input.regimen.and_then(|r| r.daily_range()) {
        return match proposed.daily_total() {
            None => (MessageTemplates::daily_use_range(min, max), None),
            Some(total) => {
                let comparison = compare(total, min, max);
                let text = match comparison {
                    DoseComparison::Below => MessageTemplates::daily_below(total, min, max),
                    DoseComparison::Above => MessageTemplates::daily_above(total, min, max),
                    DoseComparison::Within => MessageTemplates::daily_within(total, min, max),
                };
                (text, Some(comparison_level(comparison)))
            }
        };
    }

    if let Some((min, max)) = input.profile.fixed_range(route) {
        if let (true, Some(per_admin)) = (proposed.frequency_stated, proposed.dose.per_admin) {
            let comparison = compare(per_admin, min, max);
            let text = match comparison {
                DoseComparison::Below => MessageTemplates::per_admin_below(per_admin, min, max),
                DoseComparison::Above => MessageTemplates::per_admin_above(per_admin, min, max),
                DoseComparison::Within => MessageTemplates::per_admin_within(per_admin, min, max),
            };
            return (text, Some(comparison_level(comparison)));
        }
        return match proposed.mg() {
            None => (MessageTemplates::route_use_range(route, min, max), None),
            Some(mg) => {
                let comparison = compare(mg, min, max);
                let text = match comparison {
                    DoseComparison::Below => MessageTemplates::route_increase(route, min, max, mg),
                    DoseComparison::Above => MessageTemplates::route_reduce(route, min, max, mg),
                    DoseComparison::Within => MessageTemplates::route_within(route, min, max, mg),
                };
                (text, Some(comparison_level(comparison)))
            }
        };
    }

    if let Some((min, max)) = input.profile.weight_range() {
        return (MessageTemplates::weight_based_rule(min, max), None);
    }

    if input.profile.is_concentration_based(route) {
        let snippet = concentration_snippet(input.profile);
        return (
            MessageTemplates::concentration_based(route, &snippet, input.drug),
            None,
        );
    }

    (
        MessageTemplates::no_range(&input.profile.formats_label()),
        None,
    )
}

fn has_alert(alerts: &[Alert], category: AlertCategory) -> bool {
    alerts.iter().any(|a| a.category == category)
}

fn supporting_bullets(input: &RecommendationInput) -> Vec<String> {
    let mut bullets = Vec::new();
    if let Some((min, max)) = input.profile.weight_range() {
        bullets.push(MessageTemplates::bullet_weight_rule(min, max));
    }
    if has_alert(input.alerts, AlertCategory::MaximumDose) {
        bullets.push(MessageTemplates::bullet_maximum());
    }
    if let (true, Some(days)) = (
        has_alert(input.alerts, AlertCategory::Duration),
        input.monograph_days,
    ) {
        bullets.push(MessageTemplates::bullet_duration(days));
    }
    if let Some(weight_alert) = input
        .alerts
        .iter()
        .find(|a| a.category == AlertCategory::WeightBasedDose)
    {
        bullets.push(weight_alert.text());
    }
    if !input.allergen_mentions.is_empty() {
        bullets.push(MessageTemplates::bullet_allergen_mentions());
    }
    bullets
}

/// Derive the recommendation. A danger-level allergy finding replaces the
/// whole pathway with a fixed contraindication statement.
pub fn derive_recommendation(input: &RecommendationInput) -> RecommendationResult {
    if input.allergy.is_danger() {
        return RecommendationResult {
            status: RecommendationStatus::Danger,
            status_source: StatusSource::Primary,
            primary: MessageTemplates::contraindicated_by_allergy(),
            bullets: Vec::new(),
            filtered_bullets: Vec::new(),
            range: None,
            reasons: vec!["Allergy conflict with the prescribed drug.".to_string()],
            regimen: None,
            level: Severity::Danger,
        };
    }

    let (primary, comparison) = primary_statement(input);
    let bullets = supporting_bullets(input);
    let filtered_bullets = filter_bullets(
        &bullets,
        input.has_weight,
        input.profile.weight_range().is_some(),
    );
    let mut decision = classify_status(&primary, &filtered_bullets, input.alerts);
    if comparison.is_none() {
        decision = require_comparison(decision);
    }

    let level = input
        .alerts
        .iter()
        .map(|a| a.severity)
        .fold(comparison.unwrap_or(Severity::Info), Severity::combine);

    let range = input
        .profile
        .fixed_range(input.route)
        .map(|(min_mg, max_mg)| RangeReference {
            route: input.route,
            min_mg,
            max_mg,
        });

    RecommendationResult {
        status: decision.status,
        status_source: decision.source,
        primary,
        bullets,
        filtered_bullets,
        range,
        reasons: decision.reasons,
        regimen: input.regimen,
        level,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dosing::parse_proposed_dose;
    use crate::monograph::RouteEvidence;

    fn oral_profile() -> DosageProfile {
        let mut profile = DosageProfile::default();
        let mut oral = RouteEvidence::new(Route::Oral);
        oral.doses_mg = vec![250.0, 500.0];
        profile.routes.insert(Route::Oral, oral);
        profile.unit_formats.insert("mg".into());
        profile
    }

    struct Case {
        profile: DosageProfile,
        proposed: ProposedDose,
        regimen: Option<ParsedDose>,
        alerts: Vec<Alert>,
        allergy: AllergyAssessment,
        route: Route,
    }

    impl Case {
        fn new(profile: DosageProfile, dose: &str) -> Self {
            Self {
                profile,
                proposed: parse_proposed_dose(dose),
                regimen: None,
                alerts: Vec::new(),
                allergy: AllergyAssessment::default(),
                route: Route::Oral,
            }
        }

        fn run(&self) -> RecommendationResult {
            derive_recommendation(&RecommendationInput {
                drug: "Amoxicillin",
                route: self.route,
                profile: &self.profile,
                proposed: &self.proposed,
                regimen: self.regimen,
                alerts: &self.alerts,
                allergy: &self.allergy,
                allergen_mentions: &[],
                monograph_days: None,
                has_weight: false,
            })
        }
    }

    fn daily_regimen(min: f64, max: f64) -> Option<ParsedDose> {
        Some(ParsedDose {
            total_min: Some(min),
            total_max: Some(max),
            range_is_daily: true,
            ..Default::default()
        })
    }

    #[test]
    fn allergy_danger_short_circuits() {
        let mut case = Case::new(oral_profile(), "500 mg every 8 hours");
        case.allergy.severity = Severity::Danger;
        let result = case.run();
        assert_eq!(result.status, RecommendationStatus::Danger);
        assert_eq!(result.primary, "Contraindicated due to allergy.");
        assert!(result.bullets.is_empty());
        assert_eq!(result.range, None);
    }

    #[test]
    fn daily_total_above_range_is_danger() {
        let mut case = Case::new(oral_profile(), "750 mg every 8 hours");
        case.regimen = daily_regimen(750.0, 1500.0);
        let result = case.run();
        assert!(result.primary.starts_with("Proposed daily total 2250 mg exceeds"));
        assert_eq!(result.status, RecommendationStatus::Danger);
        assert_eq!(result.level, Severity::Caution);
        assert_eq!(
            result.range,
            Some(RangeReference {
                route: Route::Oral,
                min_mg: 250.0,
                max_mg: 500.0
            })
        );
    }

    #[test]
    fn daily_total_below_range_is_caution() {
        let mut case = Case::new(oral_profile(), "100 mg twice daily");
        case.regimen = daily_regimen(750.0, 1500.0);
        let result = case.run();
        assert_eq!(result.status, RecommendationStatus::Caution);
    }

    #[test]
    fn daily_total_within_range_is_safe() {
        let mut case = Case::new(oral_profile(), "500 mg three times a day");
        case.regimen = daily_regimen(750.0, 1500.0);
        let result = case.run();
        assert!(result.primary.contains("falls within"));
        assert_eq!(result.status, RecommendationStatus::Safe);
        assert_eq!(result.status_source, StatusSource::Primary);
    }

    #[test]
    fn no_proposal_states_the_daily_range() {
        let mut case = Case::new(oral_profile(), "");
        case.regimen = daily_regimen(750.0, 1500.0);
        let result = case.run();
        assert_eq!(
            result.primary,
            "Use a daily total within the extracted monograph range: 750–1500 mg/day."
        );
        assert_eq!(result.status, RecommendationStatus::Caution);
        assert_eq!(result.status_source, StatusSource::Fallback);
    }

    #[test]
    fn amount_without_mg_is_not_safe_against_a_route_range() {
        let result = Case::new(oral_profile(), "1 tablet twice daily").run();
        assert_eq!(
            result.primary,
            "Use a fixed dose within the extracted Oral range: 250–500 mg."
        );
        assert_eq!(result.status, RecommendationStatus::Caution);
        assert_eq!(result.level, Severity::Info);
    }

    #[test]
    fn per_admin_comparison_when_frequency_stated() {
        let result = Case::new(oral_profile(), "1000 mg every 12 hours").run();
        assert!(result.primary.starts_with("Proposed per-administration dose 1000 mg exceeds"));
        assert_eq!(result.status, RecommendationStatus::Danger);
    }

    #[test]
    fn bare_amount_uses_route_wording() {
        let result = Case::new(oral_profile(), "100 mg").run();
        assert!(result.primary.starts_with("Increase dose toward the extracted Oral range"));
        assert_eq!(result.status, RecommendationStatus::Caution);

        let within = Case::new(oral_profile(), "250 mg").run();
        assert_eq!(within.status, RecommendationStatus::Safe);
    }

    #[test]
    fn weight_rule_when_no_fixed_range() {
        let mut profile = DosageProfile::default();
        profile.mg_per_kg = vec![20.0, 40.0];
        let result = Case::new(profile, "250 mg").run();
        assert_eq!(
            result.primary,
            "Use a weight-based daily dose of 20–40 mg/kg/day (split per monograph)."
        );
        assert_eq!(result.bullets, vec!["Weight-based rule extracted: 20–40 mg/kg/day."]);
        // The weight bullet is hidden without a known weight.
        assert!(result.filtered_bullets.is_empty());
    }

    #[test]
    fn concentration_route_statement() {
        let mut profile = oral_profile();
        profile.mg_per_ml = vec![25.0, 50.0];
        let mut case = Case::new(profile, "100 mg");
        case.route = Route::Intravenous;
        let result = case.run();
        assert!(result.primary.contains("concentration-based (25–50 mg/mL)"));
        assert_eq!(result.range, None);
    }

    #[test]
    fn no_range_lists_formats() {
        let mut profile = DosageProfile::default();
        profile.unit_formats.insert("% w/w".into());
        let result = Case::new(profile, "").run();
        assert_eq!(
            result.primary,
            "No fixed or weight-based range extracted. Formats present in monograph: % w/w."
        );
        assert_eq!(result.status_source, StatusSource::Fallback);
        assert_eq!(result.status, RecommendationStatus::Caution);
    }

    #[test]
    fn level_takes_the_highest_alert() {
        let mut case = Case::new(oral_profile(), "250 mg");
        case.alerts = vec![Alert::new(AlertCategory::Pregnancy, Severity::Caution, "x")];
        let result = case.run();
        assert_eq!(result.level, Severity::Caution);
    }

    #[test]
    fn maximum_alert_adds_bullet() {
        let mut case = Case::new(oral_profile(), "250 mg");
        case.alerts = vec![Alert::new(AlertCategory::MaximumDose, Severity::Caution, "x")];
        let result = case.run();
        assert_eq!(result.bullets, vec![MessageTemplates::bullet_maximum()]);
    }
}
