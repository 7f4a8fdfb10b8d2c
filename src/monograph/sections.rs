//! Line finders for the safety sections of a monograph: contraindications,
//! interactions, monitoring advice and allergen mentions.

use serde::Serialize;

use super::document::MonographDocument;
use super::patterns::{CONTRA_KEY_TERMS, INTERACT_DRUGS, RE_CONTRA, RE_INTERACT, RE_MONITOR};

/// Safety-relevant monograph lines. Contraindication and interaction lines
/// are lowercased; monitoring lines keep their original case.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonographSections {
    pub contraindications: Vec<String>,
    pub interactions: Vec<String>,
    pub monitoring: Vec<String>,
}

impl MonographSections {
    pub fn scan(doc: &MonographDocument) -> Self {
        Self {
            contraindications: find_contraindications(doc),
            interactions: find_interactions(doc),
            monitoring: find_monitoring(doc),
        }
    }

    /// Copy keeping at most `limit` lines per section.
    pub fn limited(&self, limit: usize) -> Self {
        let cut = |lines: &[String]| lines.iter().take(limit).cloned().collect();
        Self {
            contraindications: cut(&self.contraindications),
            interactions: cut(&self.interactions),
            monitoring: cut(&self.monitoring),
        }
    }
}

fn collect_unique<F>(doc: &MonographDocument, keep: F) -> Vec<String>
where
    F: Fn(&str) -> bool,
{
    let mut out: Vec<String> = Vec::new();
    for line in doc.lines().map(str::to_lowercase) {
        if keep(&line) && !out.contains(&line) {
            out.push(line);
        }
    }
    out
}

pub fn find_contraindications(doc: &MonographDocument) -> Vec<String> {
    collect_unique(doc, |line| {
        RE_CONTRA.is_match(line) || CONTRA_KEY_TERMS.iter().any(|k| line.contains(k))
    })
}

pub fn find_interactions(doc: &MonographDocument) -> Vec<String> {
    collect_unique(doc, |line| {
        RE_INTERACT.is_match(line) || INTERACT_DRUGS.iter().any(|d| line.contains(d))
    })
}

pub fn find_monitoring(doc: &MonographDocument) -> Vec<String> {
    doc.lines()
        .filter(|line| RE_MONITOR.is_match(line))
        .map(str::to_string)
        .collect()
}

/// Monograph lines that mention one reported allergy verbatim.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllergenMention {
    pub allergy: String,
    pub lines: Vec<String>,
}

impl AllergenMention {
    pub fn summary(&self) -> String {
        format!(
            "Patient is allergic to {}. Relevant monograph warnings: {}",
            self.allergy,
            self.lines.join("; ")
        )
    }
}

/// Plain substring scan of every line for each reported allergy.
pub fn find_allergen_mentions(doc: &MonographDocument, allergies: &[String]) -> Vec<AllergenMention> {
    allergies
        .iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .filter_map(|allergy| {
            let needle = allergy.to_lowercase();
            let lines: Vec<String> = doc
                .lines()
                .map(str::to_lowercase)
                .filter(|line| line.contains(&needle))
                .collect();
            (!lines.is_empty()).then(|| AllergenMention {
                allergy: allergy.to_string(),
                lines,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MONOGRAPH: &str = "\
CONTRAINDICATIONS
Contraindicated in patients with a history of anaphylaxis to penicillins.
Use in the third trimester of pregnancy is not recommended.
DRUG INTERACTIONS
Concomitant use with warfarin may prolong bleeding time.
Probenecid decreases renal tubular secretion.
Monitor renal and hepatic function during prolonged therapy.
Check blood counts at baseline.";

    fn doc() -> MonographDocument {
        MonographDocument::new(MONOGRAPH)
    }

    #[test]
    fn contraindication_lines_match_terms_and_keywords() {
        let lines = find_contraindications(&doc());
        assert!(lines[0].starts_with("contraindications"));
        assert!(lines.iter().any(|l| l.contains("third trimester")));
        assert!(lines.iter().all(|l| l == &l.to_lowercase()));
    }

    #[test]
    fn interaction_lines_match_drugs_and_stems() {
        let lines = find_interactions(&doc());
        assert!(lines.iter().any(|l| l.starts_with("drug interactions")));
        assert!(lines.iter().any(|l| l.contains("warfarin")));
        assert!(lines.iter().any(|l| l.starts_with("probenecid")));
    }

    #[test]
    fn monitoring_lines_keep_case() {
        let lines = find_monitoring(&doc());
        assert_eq!(
            lines,
            vec![
                "Monitor renal and hepatic function during prolonged therapy.",
                "Check blood counts at baseline."
            ]
        );
    }

    #[test]
    fn limited_caps_each_section() {
        let sections = MonographSections::scan(&doc()).limited(1);
        assert_eq!(sections.contraindications.len(), 1);
        assert_eq!(sections.interactions.len(), 1);
        assert_eq!(sections.monitoring.len(), 1);
    }

    #[test]
    fn allergen_mentions_are_verbatim_substrings() {
        let allergies = vec!["Penicillin".to_string(), "latex".to_string(), " ".to_string()];
        let mentions = find_allergen_mentions(&doc(), &allergies);
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].allergy, "Penicillin");
        assert!(mentions[0].summary().starts_with("Patient is allergic to Penicillin."));
    }
}
