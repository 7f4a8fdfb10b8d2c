//! Plain-text patient summary and case narrative.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{PatientProfile, Route};
use crate::monograph::RouteCatalog;
use crate::polish::{polish_or_raw, UnitSpacingPolisher};

static RE_SENTENCE_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]\s+").unwrap());
static RE_SPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}").unwrap());

/// Sentences that only restate missing or negative facts.
static RE_UNINFORMATIVE_SENTENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:not specified|unable to validate|not given|frequency not specified|no known drug allergies|no other regular medicines|not pregnant or breastfeeding)\b",
    )
    .unwrap()
});

const FIELD_SEPARATOR: &str = "   |   ";

fn dash(value: Option<String>) -> String {
    value.filter(|v| !v.trim().is_empty()).unwrap_or_else(|| "-".to_string())
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

fn list_or_dash(items: &[&str]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Dose string with the route removed and one space before each unit.
fn display_dose(dose: &str, route: Route, catalog: &RouteCatalog) -> String {
    let stripped = catalog.strip_route_from_text(dose.trim(), route);
    polish_or_raw(&UnitSpacingPolisher, &stripped)
}

fn pregnancy_sentence(patient: &PatientProfile) -> Option<&'static str> {
    match (patient.pregnant, patient.breastfeeding) {
        (true, true) => Some("The patient is pregnant and breastfeeding."),
        (true, false) => Some("The patient is pregnant."),
        (false, true) => Some("The patient is breastfeeding."),
        (false, false) => None,
    }
}

/// Opening sentence(s): who the patient is and what was prescribed.
fn identity_sentence(
    patient: &PatientProfile,
    drug: &str,
    dose: &str,
    route: Route,
    catalog: &RouteCatalog,
) -> String {
    let mut identity = Vec::new();
    if let Some(age) = patient.age {
        identity.push(format!("{}-year-old", age));
    }
    if let Some(sex) = patient.sex() {
        identity.push(sex.to_lowercase());
    }

    let mut subject = if identity.is_empty() {
        "The patient".to_string()
    } else {
        format!("The patient is a {}", identity.join(" "))
    };
    if let (false, Some(weight)) = (identity.is_empty(), patient.weight()) {
        subject.push_str(&format!(" weighing {:.1} kg", weight));
    }

    let phrase = catalog.to_adverbial_phrase(route);
    let duration = patient
        .duration_days
        .map(|d| format!("{} days", d))
        .unwrap_or_else(|| "-".to_string());

    let mut sentence = format!(
        "{}, currently prescribed {} {}{} for {} to treat {}.",
        subject,
        dash(Some(drug.trim().to_string())),
        dash(Some(display_dose(dose, route, catalog))),
        if phrase.is_empty() {
            String::new()
        } else {
            format!(" {}", phrase)
        },
        duration,
        patient.indication().unwrap_or("-"),
    );
    sentence = RE_SPACE_RUN.replace_all(&sentence, " ").trim().to_string();

    if let Some(extra) = pregnancy_sentence(patient) {
        sentence.push(' ');
        sentence.push_str(extra);
    }
    sentence
}

/// Narrative sentence followed by the Core Prescription, Key Patient
/// Factors and Safety Modifiers blocks.
pub fn patient_summary(
    patient: &PatientProfile,
    drug: &str,
    dose: &str,
    route: Route,
    catalog: &RouteCatalog,
) -> String {
    let narrative = identity_sentence(patient, drug, dose, route, catalog);

    let core = [
        format!("Drug: {}", dash(Some(drug.trim().to_string()))),
        format!("Dose: {}", dash(Some(display_dose(dose, route, catalog)))),
        format!("Route: {}", route),
        format!(
            "Duration: {}",
            dash(patient.duration_days.map(|d| format!("{} days", d)))
        ),
        format!("Indication: {}", patient.indication().unwrap_or("-")),
    ]
    .join(FIELD_SEPARATOR);

    let fmt_lab = |v: Option<f64>| dash(v.map(|x| format!("{}", x)));
    let key = [
        format!("Age: {}", dash(patient.age.map(|a| a.to_string()))),
        format!("Sex: {}", dash(patient.sex().map(title_case))),
        format!(
            "Weight: {}",
            dash(patient.weight().map(|w| format!("{:.1} kg", w)))
        ),
        format!(
            "Renal: {} (eGFR: {}, CrCl: {}, Scr: {})",
            yes_no(patient.renal_impairment),
            fmt_lab(patient.egfr),
            fmt_lab(patient.crcl),
            fmt_lab(patient.scr),
        ),
        format!("Hepatic: {}", yes_no(patient.hepatic_impairment)),
    ]
    .join(FIELD_SEPARATOR);

    let safety = [
        format!("Pregnant: {}", yes_no(patient.pregnant)),
        format!("Breastfeeding: {}", yes_no(patient.breastfeeding)),
        format!("Allergies: {}", list_or_dash(&patient.reported_allergies())),
        format!("Current Meds: {}", list_or_dash(&patient.medications())),
    ]
    .join(FIELD_SEPARATOR);

    format!(
        "{}\n\nCore Prescription:\n{}\nKey Patient Factors:\n{}\nSafety Modifiers:\n{}",
        narrative, core, key, safety
    )
}

/// Split after sentence-ending punctuation, keeping the punctuation.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for m in RE_SENTENCE_END.find_iter(text) {
        sentences.push(text[start..m.start() + 1].trim());
        start = m.end();
    }
    sentences.push(text[start..].trim());
    sentences.into_iter().filter(|s| !s.is_empty()).collect()
}

/// One paragraph: the informative patient sentences, then the primary
/// statement, then the supporting bullets joined with "; ".
pub fn narrative_paragraph(patient_summary: &str, primary: &str, filtered_bullets: &[String]) -> String {
    let opening = patient_summary.split("\n\n").next().unwrap_or_default();
    let mut parts: Vec<String> = split_sentences(opening)
        .into_iter()
        .filter(|s| !RE_UNINFORMATIVE_SENTENCE.is_match(s))
        .map(str::to_string)
        .collect();

    let primary = primary.trim();
    if !primary.is_empty() {
        parts.push(primary.to_string());
    }
    let bullets: Vec<&str> = filtered_bullets
        .iter()
        .map(|b| b.trim())
        .filter(|b| !b.is_empty())
        .collect();
    if !bullets.is_empty() {
        parts.push(format!("{}.", bullets.join("; ")));
    }

    RE_SPACE_RUN.replace_all(&parts.join(" "), " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patient() -> PatientProfile {
        PatientProfile {
            age: Some(7),
            sex: Some("Female".into()),
            weight_kg: Some(22.0),
            indication: Some("otitis media".into()),
            duration_days: Some(10),
            allergies: vec!["sulfa".into()],
            ..Default::default()
        }
    }

    #[test]
    fn identity_sentence_reads_naturally() {
        let summary = patient_summary(
            &patient(),
            "Amoxicillin",
            "250mg orally every 8 hours",
            Route::Oral,
            &RouteCatalog::standard(),
        );
        let first = summary.lines().next().unwrap();
        assert!(first.starts_with("The patient is a 7-year-old female weighing 22.0 kg, currently prescribed Amoxicillin 250 mg"));
        assert!(first.ends_with("for 10 days to treat otitis media."));
        assert_eq!(first.matches("orally").count(), 1);
    }

    #[test]
    fn blocks_use_dashes_for_missing_values() {
        let summary = patient_summary(
            &PatientProfile::default(),
            "Ibuprofen",
            "",
            Route::Oral,
            &RouteCatalog::standard(),
        );
        assert!(summary.contains("Core Prescription:\nDrug: Ibuprofen   |   Dose: -"));
        assert!(summary.contains("Age: -   |   Sex: -   |   Weight: -"));
        assert!(summary.contains("Allergies: -   |   Current Meds: -"));
        assert!(summary.starts_with("The patient, currently prescribed Ibuprofen -"));
    }

    #[test]
    fn pregnancy_only_mentioned_when_true() {
        let mut p = patient();
        let catalog = RouteCatalog::standard();
        let summary = patient_summary(&p, "Drug", "10 mg", Route::Oral, &catalog);
        assert!(!summary.contains("pregnant."));

        p.pregnant = true;
        let summary = patient_summary(&p, "Drug", "10 mg", Route::Oral, &catalog);
        assert!(summary.lines().next().unwrap().ends_with("The patient is pregnant."));
        assert!(summary.contains("Pregnant: Yes"));
    }

    #[test]
    fn narrative_joins_primary_and_bullets() {
        let paragraph = narrative_paragraph(
            "The patient is a 40-year-old male. Frequency not specified.\n\nCore Prescription:\n...",
            "The proposed 500 mg is within the extracted Oral range (250–500 mg).",
            &["Weight-based rule extracted: 20–40 mg/kg/day".to_string(), "Monitor closely".to_string()],
        );
        assert_eq!(
            paragraph,
            "The patient is a 40-year-old male. The proposed 500 mg is within the extracted Oral range (250–500 mg). \
             Weight-based rule extracted: 20–40 mg/kg/day; Monitor closely."
        );
    }

    #[test]
    fn sentence_split_keeps_punctuation() {
        assert_eq!(split_sentences("One. Two!  Three"), vec!["One.", "Two!", "Three"]);
    }
}
