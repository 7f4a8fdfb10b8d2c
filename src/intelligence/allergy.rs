//! Allergy cross-reactivity evaluation against one monograph.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::models::{AlertCategory, Severity};
use crate::polish::{polish_all, polish_or_raw, TextPolisher};

use super::lexicon::AllergyLexicon;
use super::messages::MessageTemplates;
use super::types::Alert;

static RE_CONTRA_LANGUAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)contraindicat(?:ed|ion)|do\s+not\s+use|history\s+of\s+severe\s+hypersensitivity|anaphylaxi(?:s|es)",
    )
    .unwrap()
});
static RE_HYPERSENSITIVITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)hypersensitivit(?:y|ies)|allergy|allergies|allergic\s+reactions?|bronchospasm|urticaria|angioedema",
    )
    .unwrap()
});
static RE_NSAID_CROSS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)aspirin[-\s]sensitive|aspirin\s+triad|cross[-\s]?react(?:ion|ive|ivity)\s+with\s+other\s+nsaids?|patients?\s+with\s+asthma,\s*urticaria,\s*or\s+other\s+allergic\s+type\s+reactions\s+after\s+taking\s+aspirin\s+or\s+other\s+nsaids?",
    )
    .unwrap()
});
static RE_NSAID_MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bnsaids?\b|nonsteroidal").unwrap());
static RE_ASPIRIN_MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\baspirin\b|\basa\b").unwrap());
static RE_NSAID_NAMES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:diclofenac|ibuprofen|naproxen|cox-?2|celecoxib)\b").unwrap());

/// (lexicon key, finding label, monograph pattern) for class-level cautions.
static CLASS_CHECKS: LazyLock<Vec<(&'static str, &'static str, Regex)>> = LazyLock::new(|| {
    vec![
        ("penicillin", "Penicillin", Regex::new(r"(?i)\bpenicillin").unwrap()),
        ("cephalosporin", "Cephalosporin", Regex::new(r"(?i)\bcephalosporin").unwrap()),
        ("sulfa", "Sulfonamide", Regex::new(r"(?i)\bsulfonamid").unwrap()),
    ]
});

static EXCIPIENT_CHECKS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    vec![
        ("peanut", Regex::new(r"(?i)peanut|arachis").unwrap()),
        ("soy", Regex::new(r"(?i)soy|soya|soybean").unwrap()),
        ("lactose", Regex::new(r"(?i)lactose").unwrap()),
    ]
});

/// Coarse allergy signals in the monograph text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AllergySignals {
    pub mentions_contra: bool,
    pub mentions_hypersens: bool,
    pub mentions_nsaid_cross: bool,
    pub mentions_nsaid: bool,
    pub mentions_aspirin: bool,
}

impl AllergySignals {
    pub fn scan(text: &str) -> Self {
        Self {
            mentions_contra: RE_CONTRA_LANGUAGE.is_match(text),
            mentions_hypersens: RE_HYPERSENSITIVITY.is_match(text),
            mentions_nsaid_cross: RE_NSAID_CROSS.is_match(text),
            mentions_nsaid: RE_NSAID_MENTION.is_match(text),
            mentions_aspirin: RE_ASPIRIN_MENTION.is_match(text),
        }
    }
}

/// Result of comparing reported allergies with the monograph and drug.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AllergyAssessment {
    pub severity: Severity,
    pub matches: Vec<String>,
    pub actions: Vec<String>,
    pub matches_polished: Vec<String>,
    pub actions_polished: Vec<String>,
    pub signals: AllergySignals,
    /// The patient is allergic to the prescribed drug itself.
    pub direct_drug_allergy: bool,
    /// Reported allergies neither seen in the monograph nor overlapping the drug.
    pub unmatched_allergies: Vec<String>,
    pub allergies_csv: String,
    /// "No explicit conflict" advisory body, when allergies matched nothing.
    pub no_conflict_body: Option<String>,
    /// The advisory with the reported-allergy prefix.
    pub no_conflict_note: Option<String>,
    pub no_conflict_note_polished: Option<String>,
    pub alert: Option<Alert>,
}

impl AllergyAssessment {
    pub fn is_danger(&self) -> bool {
        self.severity == Severity::Danger
    }

    pub fn unmatched_csv(&self) -> String {
        self.unmatched_allergies.join(", ")
    }
}

/// Evaluate reported allergies against the monograph text and drug name.
///
/// Severity only escalates: a direct drug match or NSAID cross-reactivity is
/// danger, class and excipient mentions are caution, and generic
/// hypersensitivity wording lifts an otherwise quiet result to caution.
pub fn evaluate_allergies(
    allergies: &[&str],
    monograph_text: &str,
    drug_name: &str,
    lexicon: &AllergyLexicon,
    polisher: &dyn TextPolisher,
) -> AllergyAssessment {
    let allergies: Vec<&str> = allergies
        .iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .collect();
    let drug_name = drug_name.trim();
    let patient_tokens = lexicon.allergy_tokens(&allergies);
    let signals = AllergySignals::scan(monograph_text);

    let mut matches: Vec<String> = Vec::new();
    let mut actions: Vec<String> = Vec::new();
    let mut severity = Severity::Info;

    let drug_tokens: BTreeSet<String> = if drug_name.is_empty() {
        BTreeSet::new()
    } else {
        lexicon.drug_tokens(drug_name)
    };

    let direct_drug_allergy = !patient_tokens.is_disjoint(&drug_tokens);
    if direct_drug_allergy {
        matches.push(MessageTemplates::allergy_direct_match(drug_name));
        actions.push(MessageTemplates::allergy_direct_action(drug_name));
        severity = Severity::Danger;
    }

    let nsaid_context = signals.mentions_nsaid
        || RE_NSAID_NAMES.is_match(monograph_text)
        || RE_NSAID_NAMES.is_match(drug_name);
    if nsaid_context
        && !direct_drug_allergy
        && (patient_tokens.contains("aspirin") || patient_tokens.contains("nsaid"))
    {
        matches.push(MessageTemplates::allergy_nsaid_cross());
        actions.push(MessageTemplates::allergy_nsaid_action());
        severity = severity.combine(Severity::Danger);
    }

    for (key, label, pattern) in CLASS_CHECKS.iter() {
        if patient_tokens.contains(*key) && pattern.is_match(monograph_text) {
            matches.push(MessageTemplates::allergy_class_context(label));
            severity = severity.combine(Severity::Caution);
        }
    }

    for (key, pattern) in EXCIPIENT_CHECKS.iter() {
        let reported = lexicon
            .terms(key)
            .map_or(patient_tokens.contains(*key), |terms| {
                terms.iter().any(|t| patient_tokens.contains(t))
            });
        if reported && pattern.is_match(monograph_text) {
            matches.push(MessageTemplates::allergy_excipient(key));
            severity = severity.combine(Severity::Caution);
        }
    }

    if signals.mentions_hypersens && !allergies.is_empty() && severity == Severity::Info {
        severity = Severity::Caution;
    }

    let haystack = monograph_text.to_lowercase();
    let unmatched_allergies: Vec<String> = allergies
        .iter()
        .filter(|allergy| {
            let tokens = lexicon.allergy_tokens(&[**allergy]);
            let seen_in_monograph = tokens.iter().any(|t| !t.is_empty() && haystack.contains(t.as_str()));
            let overlaps_drug = !tokens.is_disjoint(&drug_tokens);
            !seen_in_monograph && !overlaps_drug
        })
        .map(|a| a.to_string())
        .collect();

    let allergies_csv = allergies.join(", ");
    let (no_conflict_body, no_conflict_note, no_conflict_note_polished) =
        if matches.is_empty() && !allergies.is_empty() {
            let body = advisory_body(drug_name, &unmatched_allergies, &signals);
            let prefix = MessageTemplates::allergy_reported_prefix(&allergies_csv);
            let note = format!("{}{}", prefix, body);
            let polished = format!("{}{}", prefix, polish_or_raw(polisher, &body));
            (Some(body), Some(note), Some(polished))
        } else {
            (None, None, None)
        };

    let matches_polished = polish_all(polisher, &matches);
    let actions_polished = polish_all(polisher, &actions);

    let alert = if !matches_polished.is_empty()
        || !actions_polished.is_empty()
        || severity >= Severity::Caution
    {
        let mut annotations: Vec<String> = Vec::new();
        if !matches_polished.is_empty() {
            annotations.push(format!("Findings: {}", sentence_run(&matches_polished)));
        }
        if !actions_polished.is_empty() {
            annotations.push(format!("Action: {}", sentence_run(&actions_polished)));
        }
        if annotations.is_empty() {
            annotations.push(MessageTemplates::allergy_generic_annotation());
        }
        Alert::with_annotations(AlertCategory::Allergy, severity, annotations)
    } else {
        None
    };

    tracing::debug!(
        severity = %severity,
        matches = matches.len(),
        unmatched = unmatched_allergies.len(),
        direct = direct_drug_allergy,
        "Allergy evaluation complete"
    );

    AllergyAssessment {
        severity,
        matches,
        actions,
        matches_polished,
        actions_polished,
        signals,
        direct_drug_allergy,
        unmatched_allergies,
        allergies_csv,
        no_conflict_body,
        no_conflict_note,
        no_conflict_note_polished,
        alert,
    }
}

fn advisory_body(drug_name: &str, unmatched: &[String], signals: &AllergySignals) -> String {
    let drug = if drug_name.is_empty() {
        "this medication"
    } else {
        drug_name
    };

    let mut tail_bits: Vec<&str> = Vec::new();
    if signals.mentions_hypersens {
        tail_bits.push("the monograph contains general hypersensitivity warnings");
    }
    if signals.mentions_nsaid_cross {
        tail_bits.push("class-level NSAID cross-reactivity is discussed");
    }
    let tail = if tail_bits.is_empty() {
        String::new()
    } else {
        format!(" However, {}.", tail_bits.join(", and "))
    };

    if unmatched.is_empty() {
        MessageTemplates::allergy_no_conflict_generic(drug, &tail)
    } else {
        MessageTemplates::allergy_no_conflict_unmatched(drug, &unmatched.join(", "), &tail)
    }
}

/// Statements joined into one run, each ending in exactly one period.
fn sentence_run(lines: &[String]) -> String {
    lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| format!("{}.", l.trim().trim_end_matches('.')))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClassLinking;
    use crate::polish::PassThroughPolisher;

    const AMOXICILLIN: &str = "\
Amoxicillin is a semisynthetic penicillin.
Serious and occasionally fatal hypersensitivity (anaphylactic) reactions have been reported in patients on penicillin therapy.
Contraindicated in patients with a history of allergic reaction to any of the penicillins.";

    const DICLOFENAC: &str = "\
Diclofenac is a nonsteroidal anti-inflammatory drug (NSAID).
Do not use in patients with asthma, urticaria, or other allergic type reactions after taking aspirin or other NSAIDs.";

    fn evaluate(allergies: &[&str], text: &str, drug: &str, linking: ClassLinking) -> AllergyAssessment {
        let lexicon = AllergyLexicon::standard(linking);
        evaluate_allergies(allergies, text, drug, &lexicon, &PassThroughPolisher)
    }

    #[test]
    fn direct_drug_allergy_is_danger() {
        let result = evaluate(&["amoxicillin"], AMOXICILLIN, "Amoxicillin", ClassLinking::Disabled);
        assert!(result.direct_drug_allergy);
        assert!(result.is_danger());
        assert!(result.actions[0].starts_with("Amoxicillin is contraindicated"));
        let alert = result.alert.unwrap();
        assert_eq!(alert.severity, Severity::Danger);
        assert!(alert.annotations[0].starts_with("Findings: This patient has a documented allergy"));
        assert!(alert.annotations[1].starts_with("Action: "));
    }

    #[test]
    fn brand_allergy_matches_generic_drug() {
        let result = evaluate(&["Motrin"], "Ibuprofen tablets.", "Ibuprofen", ClassLinking::Disabled);
        assert!(result.direct_drug_allergy);
        assert_eq!(result.severity, Severity::Danger);
    }

    #[test]
    fn aspirin_allergy_matches_chemical_name() {
        let text = "Acetylsalicylic acid tablets.";
        let result = evaluate(&["aspirin"], text, "Acetylsalicylic Acid", ClassLinking::Disabled);
        assert!(result.direct_drug_allergy);
        assert_eq!(result.severity, Severity::Danger);

        let reversed = evaluate(&["acetylsalicylic acid"], "Aspirin tablets.", "Aspirin", ClassLinking::Disabled);
        assert!(reversed.direct_drug_allergy);
    }

    #[test]
    fn shared_salt_word_is_not_a_drug_match() {
        let text = "Naproxen sodium tablets.";
        let result = evaluate(&["sodium lauryl sulfate"], text, "Naproxen sodium", ClassLinking::Disabled);
        assert!(!result.direct_drug_allergy);
        assert_ne!(result.severity, Severity::Danger);
        assert_eq!(result.unmatched_allergies, vec!["sodium lauryl sulfate"]);
    }

    #[test]
    fn penicillin_allergy_without_class_linking_is_caution() {
        let result = evaluate(&["penicillin"], AMOXICILLIN, "Amoxicillin", ClassLinking::Disabled);
        assert!(!result.direct_drug_allergy);
        assert_eq!(result.severity, Severity::Caution);
        assert_eq!(
            result.matches,
            vec!["Penicillin allergy noted in the context of monograph references."]
        );
        assert!(result.unmatched_allergies.is_empty());
        assert!(result.no_conflict_note.is_none());
    }

    #[test]
    fn penicillin_allergy_with_class_linking_is_direct() {
        let result = evaluate(&["penicillin"], AMOXICILLIN, "Amoxicillin", ClassLinking::Enabled);
        assert!(result.direct_drug_allergy);
        assert_eq!(result.severity, Severity::Danger);
    }

    #[test]
    fn aspirin_allergy_on_nsaid_is_cross_reactive() {
        let result = evaluate(&["Aspirin"], DICLOFENAC, "Diclofenac", ClassLinking::Disabled);
        assert!(!result.direct_drug_allergy);
        assert_eq!(result.severity, Severity::Danger);
        assert!(result.matches[0].contains("cross-reactivity among NSAIDs"));
        assert!(result.signals.mentions_nsaid_cross);
        assert!(result.signals.mentions_nsaid);
    }

    #[test]
    fn excipient_mention_is_caution() {
        let text = "Inactive ingredients: lactose monohydrate, magnesium stearate.";
        let result = evaluate(&["Lactose"], text, "Cetirizine", ClassLinking::Disabled);
        assert_eq!(result.severity, Severity::Caution);
        assert_eq!(
            result.matches,
            vec!["Excipient caution: lactose is mentioned in the monograph."]
        );
    }

    #[test]
    fn hypersensitivity_language_lifts_to_caution() {
        let text = "Hypersensitivity reactions including angioedema have been reported.";
        let result = evaluate(&["shellfish"], text, "Metformin", ClassLinking::Disabled);
        assert_eq!(result.severity, Severity::Caution);
        assert!(result.matches.is_empty());
        assert_eq!(result.unmatched_allergies, vec!["shellfish"]);
        let note = result.no_conflict_note.unwrap();
        assert!(note.starts_with("Patient-reported allergies: shellfish. The monograph for Metformin"));
        assert!(note.contains("However, the monograph contains general hypersensitivity warnings."));
        let alert = result.alert.unwrap();
        assert_eq!(alert.annotations, vec![MessageTemplates::allergy_generic_annotation()]);
    }

    #[test]
    fn unmatched_allergy_gets_advisory_but_no_alert() {
        let result = evaluate(&["latex"], "Take with food.", "", ClassLinking::Disabled);
        assert_eq!(result.severity, Severity::Info);
        assert!(result.alert.is_none());
        let body = result.no_conflict_body.unwrap();
        assert!(body.starts_with("The monograph for this medication does not explicitly cite"));
        assert!(body.contains("no direct conflict was detected for: latex. Please verify"));
    }

    #[test]
    fn no_allergies_no_findings() {
        let result = evaluate(&[], AMOXICILLIN, "Amoxicillin", ClassLinking::Enabled);
        assert_eq!(result.severity, Severity::Info);
        assert!(result.alert.is_none());
        assert!(result.no_conflict_note.is_none());
        assert_eq!(result.allergies_csv, "");
    }

    #[test]
    fn sentence_run_normalizes_periods() {
        let lines = vec!["First.".to_string(), "Second".to_string(), " ".to_string()];
        assert_eq!(sentence_run(&lines), "First. Second.");
    }
}
