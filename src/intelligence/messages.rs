use crate::models::Route;

/// Message template builder for alert, classification and recommendation text.
/// Amounts go through [`amount`], so sub-milligram doses keep their decimals.
pub struct MessageTemplates;

impl MessageTemplates {
    // ------------------------------------------------------------------
    // Dose classification
    // ------------------------------------------------------------------

    pub fn classification_below(proposed: f64, min: f64, max: f64) -> String {
        format!(
            "Proposed dose {} mg is below recommended fixed range {}–{} mg.",
            amount(proposed), amount(min), amount(max),
        )
    }

    pub fn classification_above(proposed: f64, min: f64, max: f64) -> String {
        format!(
            "Proposed dose {} mg is above recommended fixed range {}–{} mg.",
            amount(proposed), amount(min), amount(max),
        )
    }

    pub fn classification_within(proposed: f64, min: f64, max: f64) -> String {
        format!(
            "Proposed dose {} mg is within recommended fixed range {}–{} mg.",
            amount(proposed), amount(min), amount(max),
        )
    }

    pub fn classification_concentration(route: Route, proposed: f64) -> String {
        format!(
            "No fixed-mg range found for {}; dosing appears concentration-based (mg/mL). \
             Cannot compare {} mg to a fixed range for this route.",
            route, amount(proposed),
        )
    }

    pub fn classification_no_range(route: Route) -> String {
        format!(
            "No dosage range could be extracted for the selected route ({}).",
            route,
        )
    }

    // ------------------------------------------------------------------
    // Alerts
    // ------------------------------------------------------------------

    pub fn weight_not_provided(drug: &str, min: f64, max: f64) -> String {
        format!(
            "Weight not provided and dose not in mg/kg. Pediatric dosing for {} commonly uses \
             a mg/kg/day rule (e.g., {}–{} mg/kg/day). Unable to validate the prescribed dose.",
            drug, amount(min), amount(max),
        )
    }

    pub fn weight_prescribed_below(drug: &str, mg_per_kg: f64, min: f64, max: f64) -> String {
        format!(
            "Prescribed pediatric dose is {} {} mg/kg/day. The recommended range is \
             {}–{} mg/kg/day. This is below the effective range.",
            drug, amount(mg_per_kg), amount(min), amount(max),
        )
    }

    pub fn weight_prescribed_above(drug: &str, mg_per_kg: f64, max: f64) -> String {
        format!(
            "Prescribed pediatric dose is {} {} mg/kg/day. The recommended maximum is \
             {} mg/kg/day. Risk of overdose; consider reducing.",
            drug, amount(mg_per_kg), amount(max),
        )
    }

    pub fn weight_calculated_below(
        drug: &str,
        mg_per_kg: f64,
        weight: f64,
        per_admin: f64,
        freq: u32,
        min: f64,
        max: f64,
    ) -> String {
        format!(
            "Calculated pediatric dose is {} {} mg/kg/day (weight {} kg, {} mg {} times a day). \
             Recommended {}–{} mg/kg/day. This is below range.",
            drug, amount(mg_per_kg), weight, amount(per_admin), freq, amount(min), amount(max),
        )
    }

    pub fn weight_calculated_above(
        drug: &str,
        mg_per_kg: f64,
        weight: f64,
        per_admin: f64,
        freq: u32,
        max: f64,
    ) -> String {
        format!(
            "Calculated pediatric dose is {} {} mg/kg/day (weight {} kg, {} mg {} times a day). \
             Exceeds recommended maximum {} mg/kg/day.",
            drug, amount(mg_per_kg), weight, amount(per_admin), freq, amount(max),
        )
    }

    pub fn weight_unvalidated(drug: &str, weight: f64, min: f64, max: f64) -> String {
        format!(
            "Weight provided ({} kg) but dose not given in mg/kg/day and frequency not specified. \
             {} pediatric dosing typically {}–{} mg/kg/day; unable to validate.",
            weight, drug, amount(min), amount(max),
        )
    }

    pub fn absolute_dose(mg: f64) -> String {
        format!("Proposed absolute dose parsed: {} mg.", amount(mg))
    }

    pub fn maximum_exceeded(drug: &str, mg: f64, maximum: f64) -> String {
        format!(
            "Prescribed {} {} mg exceeds a labeled maximum near {} mg found in monograph. \
             Please do not exceed.",
            drug, amount(mg), amount(maximum),
        )
    }

    pub fn duration_mismatch(days: u32, indication: Option<&str>, monograph_days: u32) -> String {
        let for_indication = indication
            .map(|i| format!(" for {}", i))
            .unwrap_or_default();
        format!(
            "Prescribed duration is {} days{}. Recommended duration in monograph appears to be \
             {} days. Please align to reduce failure/relapse.",
            days, for_indication, monograph_days,
        )
    }

    pub fn age_missing(drug: &str) -> String {
        format!(
            "Age not provided. Dose recommendations for {} can differ for neonates, pediatrics, \
             adults, and geriatrics. Provide age to validate appropriately.",
            drug,
        )
    }

    pub fn renal_labs_missing(drug: &str) -> String {
        format!(
            "Patient has renal impairment history, but no eGFR/CrCl provided. Dosing of {} may \
             require adjustment per monograph. Provide eGFR or CrCl.",
            drug,
        )
    }

    pub fn renal_low_clearance(drug: &str, metric: f64, mg: f64) -> String {
        format!(
            "(eGFR/CrCl {:.0} mL/min): Prescribed {} {} mg may need extended interval \
             (e.g., every 12–24 h) or reduced dose per monograph renal guidance.",
            metric, drug, amount(mg),
        )
    }

    pub fn hepatic(drug: &str) -> String {
        format!(
            "{} prescribed in hepatic impairment. Monograph recommends monitoring liver enzymes \
             and assessing for hepatic side effects during prolonged use.",
            drug,
        )
    }

    pub fn pregnancy(drug: &str) -> String {
        format!(
            "{} during pregnancy should use the lowest effective dose when benefits outweigh \
             risks, per monograph wording. Monitor as clinically indicated.",
            drug,
        )
    }

    pub fn interaction(medication: &str, line: &str) -> String {
        format!(
            "Patient is taking {}, which the monograph names in an interaction statement: \"{}\". \
             Review the combination before prescribing.",
            medication, line,
        )
    }

    // ------------------------------------------------------------------
    // Allergy
    // ------------------------------------------------------------------

    pub fn allergy_direct_match(drug: &str) -> String {
        format!(
            "This patient has a documented allergy to {}, which is the medication currently \
             being prescribed.",
            drug,
        )
    }

    pub fn allergy_direct_action(drug: &str) -> String {
        format!(
            "{} is contraindicated for this patient. Do not initiate therapy; select an \
             alternative agent to avoid a serious hypersensitivity reaction.",
            drug,
        )
    }

    pub fn allergy_nsaid_cross() -> String {
        "The patient reports aspirin/NSAID hypersensitivity, and cross-reactivity among NSAIDs \
         is well-described."
            .to_string()
    }

    pub fn allergy_nsaid_action() -> String {
        "Avoid this NSAID; consider a non-NSAID alternative and ensure the allergy is documented."
            .to_string()
    }

    pub fn allergy_class_context(class_label: &str) -> String {
        format!(
            "{} allergy noted in the context of monograph references.",
            class_label,
        )
    }

    pub fn allergy_excipient(label: &str) -> String {
        format!("Excipient caution: {} is mentioned in the monograph.", label)
    }

    pub fn allergy_generic_annotation() -> String {
        "Allergy/hypersensitivity language present in the monograph; review patient history."
            .to_string()
    }

    pub fn allergy_reported_prefix(allergies_csv: &str) -> String {
        format!("Patient-reported allergies: {}. ", allergies_csv)
    }

    pub fn allergy_no_conflict_unmatched(drug: &str, unmatched_csv: &str, tail: &str) -> String {
        format!(
            "The monograph for {} does not explicitly cite these allergens or a specific \
             cross-reactivity with {} in the extracted text; no direct conflict was detected \
             for: {}.{} Please verify allergy history and monitor as appropriate.",
            drug, drug, unmatched_csv, tail,
        )
    }

    pub fn allergy_no_conflict_generic(drug: &str, tail: &str) -> String {
        format!(
            "The monograph for {} does not explicitly document a direct conflict with these \
             inputs in the extracted text; no specific contraindication was detected.{} Please \
             verify allergy history and monitor as appropriate.",
            drug, tail,
        )
    }

    // ------------------------------------------------------------------
    // Recommendation
    // ------------------------------------------------------------------

    pub fn contraindicated_by_allergy() -> String {
        "Contraindicated due to allergy.".to_string()
    }

    pub fn daily_below(total: f64, min: f64, max: f64) -> String {
        format!(
            "Proposed daily total {} mg is below extracted monograph daily range \
             ({}–{} mg/day).",
            amount(total), amount(min), amount(max),
        )
    }

    pub fn daily_above(total: f64, min: f64, max: f64) -> String {
        format!(
            "Proposed daily total {} mg exceeds extracted monograph daily range \
             ({}–{} mg/day); reduce dose.",
            amount(total), amount(min), amount(max),
        )
    }

    pub fn daily_within(total: f64, min: f64, max: f64) -> String {
        format!(
            "Proposed daily total {} mg falls within extracted monograph daily range \
             ({}–{} mg/day).",
            amount(total), amount(min), amount(max),
        )
    }

    pub fn daily_use_range(min: f64, max: f64) -> String {
        format!(
            "Use a daily total within the extracted monograph range: {}–{} mg/day.",
            amount(min), amount(max),
        )
    }

    pub fn per_admin_below(dose: f64, min: f64, max: f64) -> String {
        format!(
            "Proposed per-administration dose {} mg is below recommended per-administration \
             range ({}–{} mg).",
            amount(dose), amount(min), amount(max),
        )
    }

    pub fn per_admin_above(dose: f64, min: f64, max: f64) -> String {
        format!(
            "Proposed per-administration dose {} mg exceeds recommended per-administration \
             range ({}–{} mg).",
            amount(dose), amount(min), amount(max),
        )
    }

    pub fn per_admin_within(dose: f64, min: f64, max: f64) -> String {
        format!(
            "Proposed per-administration dose {} mg is within the extracted \
             per-administration range ({}–{} mg).",
            amount(dose), amount(min), amount(max),
        )
    }

    pub fn route_use_range(route: Route, min: f64, max: f64) -> String {
        format!(
            "Use a fixed dose within the extracted {} range: {}–{} mg.",
            route, amount(min), amount(max),
        )
    }

    pub fn route_increase(route: Route, min: f64, max: f64, proposed: f64) -> String {
        format!(
            "Increase dose toward the extracted {} range ({}–{} mg); current proposal \
             {} mg is below range.",
            route, amount(min), amount(max), amount(proposed),
        )
    }

    pub fn route_reduce(route: Route, min: f64, max: f64, proposed: f64) -> String {
        format!(
            "Reduce dose to stay within the extracted {} range ({}–{} mg); current \
             proposal {} mg exceeds range.",
            route, amount(min), amount(max), amount(proposed),
        )
    }

    pub fn route_within(route: Route, min: f64, max: f64, proposed: f64) -> String {
        format!(
            "The proposed {} mg is within the extracted {} range ({}–{} mg).",
            amount(proposed), route, amount(min), amount(max),
        )
    }

    pub fn weight_based_rule(min: f64, max: f64) -> String {
        format!(
            "Use a weight-based daily dose of {}–{} mg/kg/day (split per monograph).",
            amount(min), amount(max),
        )
    }

    pub fn concentration_based(route: Route, snippet: &str, drug: &str) -> String {
        format!(
            "No fixed-mg range extracted for the selected route ({}). This route appears \
             concentration-based ({}). Use label-directed volume/frequency for {}; absolute mg \
             comparison is not applicable.",
            route, snippet, drug,
        )
    }

    pub fn no_range(formats: &str) -> String {
        format!(
            "No fixed or weight-based range extracted. Formats present in monograph: {}.",
            formats,
        )
    }

    pub fn bullet_weight_rule(min: f64, max: f64) -> String {
        format!("Weight-based rule extracted: {}–{} mg/kg/day.", amount(min), amount(max))
    }

    pub fn bullet_maximum() -> String {
        "A maximum-dose statement was detected; ensure the regimen does not exceed the labeled \
         maximum."
            .to_string()
    }

    pub fn bullet_duration(days: u32) -> String {
        format!("Align duration to ~{} days per monograph for this indication.", days)
    }

    pub fn bullet_allergen_mentions() -> String {
        "Allergy warnings present in monograph; verify agent selection and consider alternatives."
            .to_string()
    }
}

/// Milligram figure for display: whole numbers from 10 up, otherwise up to
/// three decimals without trailing zeros ("0.125", "2.5", "5").
pub fn amount(value: f64) -> String {
    if value.abs() >= 10.0 {
        return format!("{:.0}", value);
    }
    let text = format!("{:.3}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_are_rounded() {
        assert_eq!(
            MessageTemplates::classification_above(750.4, 250.0, 500.0),
            "Proposed dose 750 mg is above recommended fixed range 250–500 mg."
        );
        assert_eq!(
            MessageTemplates::absolute_dose(1000.0),
            "Proposed absolute dose parsed: 1000 mg."
        );
    }

    #[test]
    fn small_amounts_keep_their_decimals() {
        assert_eq!(
            MessageTemplates::classification_below(0.125, 0.25, 0.5),
            "Proposed dose 0.125 mg is below recommended fixed range 0.25–0.5 mg."
        );
        assert_eq!(amount(2.5), "2.5");
        assert_eq!(amount(5.0), "5");
        assert_eq!(amount(12.6), "13");
        assert_eq!(amount(0.0004), "0");
    }

    #[test]
    fn duration_mentions_indication_when_given() {
        let with = MessageTemplates::duration_mismatch(5, Some("otitis media"), 10);
        assert!(with.starts_with("Prescribed duration is 5 days for otitis media."));
        let without = MessageTemplates::duration_mismatch(5, None, 10);
        assert!(without.starts_with("Prescribed duration is 5 days."));
        assert!(without.contains("appears to be 10 days"));
    }

    #[test]
    fn route_templates_use_canonical_names() {
        let text = MessageTemplates::route_reduce(Route::Oral, 250.0, 500.0, 750.0);
        assert_eq!(
            text,
            "Reduce dose to stay within the extracted Oral range (250–500 mg); current \
             proposal 750 mg exceeds range."
        );
    }

    #[test]
    fn no_template_is_empty() {
        let all = [
            MessageTemplates::age_missing("Ibuprofen"),
            MessageTemplates::hepatic("Ibuprofen"),
            MessageTemplates::pregnancy("Ibuprofen"),
            MessageTemplates::renal_labs_missing("Ibuprofen"),
            MessageTemplates::allergy_nsaid_cross(),
            MessageTemplates::bullet_maximum(),
            MessageTemplates::contraindicated_by_allergy(),
        ];
        for text in all {
            assert!(!text.is_empty());
            assert!(!text.contains("  "));
        }
    }
}
