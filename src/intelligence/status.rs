//! Recommendation status from the wording of the recommendation itself.
//!
//! The primary statement decides first, then the filtered bullets. Only if
//! both are silent does the broader fallback scan run over primary, bullets
//! and alert text.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::models::RecommendationStatus;

use super::types::Alert;

static RE_DANGER_WORDING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:above|exceed(?:s|ed|ing)?|too\s+high|decreas(?:e|ing)|reduc(?:e|ing))\b").unwrap()
});
static RE_CAUTION_WORDING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:below|increase(?:s|d|ing)?|too\s+low|insufficient)\b").unwrap()
});
static SAFE_WORDING: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)\bwithin\b.*\brange\b").unwrap(),
        Regex::new(r"(?i)\bwithin\s+(?:the\s+)?(?:label(?:led|ed)?|extracted)\s+range\b").unwrap(),
        Regex::new(r"(?i)\b(?:falls?\s+within|in\s+range|inside\s+range)\b").unwrap(),
        Regex::new(r"(?i)\b(?:appropriate|acceptable|ok|compatible|no\s+adjustment)\b").unwrap(),
    ]
});

/// Bullets that only report missing data carry no status signal.
static RE_UNINFORMATIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:not specified|unable to validate|not given|frequency not specified)\b").unwrap()
});
static RE_DIGIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d").unwrap());
static RE_SPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}").unwrap());

const FALLBACK_DANGER_TERMS: &[&str] = &[
    "contraindicated",
    "do not use",
    "avoid use",
    "stop therapy",
    "discontinue",
    "black box",
    "boxed warning",
    "life-threatening",
    "severe hypersensitivity",
    "pregnancy category x",
    "absolute contraindication",
];

const FALLBACK_CAUTION_TERMS: &[&str] = &[
    "reduce",
    "decrease",
    "increase",
    "adjust",
    "use with caution",
    "monitor closely",
    "renal impairment",
    "hepatic impairment",
    "elderly",
    "geriatr",
    "pediatric",
    "risk increased",
    "use lowest effective dose",
    "temporarily withhold",
    "hold dose",
];

const FALLBACK_SAFE_TERMS: &[&str] = &[
    "within range",
    "within the range",
    "within the extracted",
    "within labeled range",
    "falls within",
    "appropriate",
    "acceptable",
    "no adjustment",
    "compatible",
    "ok to continue",
    "dose is appropriate",
];

/// Which stage settled the status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusSource {
    Primary,
    Bullets,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusDecision {
    pub status: RecommendationStatus,
    pub source: StatusSource,
    pub reasons: Vec<String>,
}

/// Three-bucket keyword reading of one text. Danger wording wins over
/// caution wording, which wins over safe wording.
pub fn keyword_status(text: &str) -> Option<RecommendationStatus> {
    if RE_DANGER_WORDING.is_match(text) {
        Some(RecommendationStatus::Danger)
    } else if RE_CAUTION_WORDING.is_match(text) {
        Some(RecommendationStatus::Caution)
    } else if SAFE_WORDING.iter().any(|re| re.is_match(text)) {
        Some(RecommendationStatus::Safe)
    } else {
        None
    }
}

pub fn is_informative(text: &str) -> bool {
    !RE_UNINFORMATIVE.is_match(text)
}

/// Bullets worth showing and scanning. mg/kg/day bullets need a known
/// weight plus either a weight-based range or concrete numbers. Trailing
/// periods are removed.
pub fn filter_bullets(bullets: &[String], has_weight: bool, has_weight_range: bool) -> Vec<String> {
    bullets
        .iter()
        .map(|b| RE_SPACE_RUN.replace_all(b, " ").trim().to_string())
        .filter(|b| !b.is_empty() && is_informative(b))
        .filter(|b| {
            !b.to_lowercase().contains("mg/kg/day")
                || (has_weight && (has_weight_range || RE_DIGIT.is_match(b)))
        })
        .map(|b| b.trim_end_matches('.').to_string())
        .collect()
}

fn contains_any(haystack: &str, terms: &[&str]) -> bool {
    terms.iter().any(|t| haystack.contains(t))
}

/// Broad term scan over everything the report says. Defaults to caution.
pub fn fallback_status(primary: &str, bullets: &[String], alerts: &[Alert]) -> StatusDecision {
    let mut corpus: Vec<String> = vec![primary.to_string(), bullets.join(" ")];
    for alert in alerts {
        corpus.extend(alert.annotations.iter().cloned());
        corpus.push(alert.label().to_string());
    }
    let corpus = corpus.join(" ").to_lowercase();

    let (status, reason) = if contains_any(&corpus, FALLBACK_DANGER_TERMS) {
        (RecommendationStatus::Danger, "Danger terms detected (fallback).")
    } else if contains_any(&corpus, FALLBACK_CAUTION_TERMS) {
        (RecommendationStatus::Caution, "Caution terms detected (fallback).")
    } else if contains_any(&corpus, FALLBACK_SAFE_TERMS) {
        (RecommendationStatus::Safe, "Safe terms detected (fallback).")
    } else {
        (RecommendationStatus::Caution, "Insufficient signal (fallback).")
    };

    StatusDecision {
        status,
        source: StatusSource::Fallback,
        reasons: vec![reason.to_string()],
    }
}

/// Settle the recommendation status from the primary statement, then the
/// filtered bullets, then the fallback scan.
pub fn classify_status(primary: &str, filtered_bullets: &[String], alerts: &[Alert]) -> StatusDecision {
    if let Some(status) = keyword_status(primary) {
        return StatusDecision {
            status,
            source: StatusSource::Primary,
            reasons: vec![format!("Derived from primary statement ('{}').", primary)],
        };
    }

    if !filtered_bullets.is_empty() {
        if let Some(status) = keyword_status(&filtered_bullets.join(" ")) {
            return StatusDecision {
                status,
                source: StatusSource::Bullets,
                reasons: vec!["Derived from supporting bullets.".to_string()],
            };
        }
    }

    fallback_status(primary, filtered_bullets, alerts)
}

/// A statement that compared no proposed amount cannot settle on safe,
/// however its range wording reads. Danger and caution pass through.
pub fn require_comparison(decision: StatusDecision) -> StatusDecision {
    if decision.status != RecommendationStatus::Safe {
        return decision;
    }
    StatusDecision {
        status: RecommendationStatus::Caution,
        source: StatusSource::Fallback,
        reasons: vec!["No proposed amount was compared (caution).".to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AlertCategory, Severity};

    #[test]
    fn primary_wording_buckets() {
        assert_eq!(
            keyword_status("Reduce dose to stay within the extracted Oral range"),
            Some(RecommendationStatus::Danger)
        );
        assert_eq!(
            keyword_status("Proposed daily total 300 mg is below extracted monograph daily range"),
            Some(RecommendationStatus::Caution)
        );
        assert_eq!(
            keyword_status("The proposed 500 mg is within the extracted Oral range (250–500 mg)."),
            Some(RecommendationStatus::Safe)
        );
        assert_eq!(keyword_status("Use label-directed volume."), None);
    }

    #[test]
    fn uncompared_safe_wording_becomes_caution() {
        let primary = "Use a daily total within the extracted monograph range: 750–1500 mg/day.";
        let decision = require_comparison(classify_status(primary, &[], &[]));
        assert_eq!(decision.status, RecommendationStatus::Caution);
        assert_eq!(decision.source, StatusSource::Fallback);

        let danger = StatusDecision {
            status: RecommendationStatus::Danger,
            source: StatusSource::Primary,
            reasons: Vec::new(),
        };
        assert_eq!(require_comparison(danger.clone()), danger);
    }

    #[test]
    fn exceeds_is_danger_even_with_range_wording() {
        let text = "Proposed daily total 2250 mg exceeds extracted monograph daily range (750–1500 mg/day); reduce dose.";
        assert_eq!(keyword_status(text), Some(RecommendationStatus::Danger));
    }

    #[test]
    fn uninformative_bullets_are_dropped() {
        let bullets = vec![
            "Weight provided (20 kg) but frequency not specified.".to_string(),
            "Align duration to ~10 days per monograph for this indication.".to_string(),
            "  ".to_string(),
        ];
        assert_eq!(
            filter_bullets(&bullets, true, true),
            vec!["Align duration to ~10 days per monograph for this indication"]
        );
    }

    #[test]
    fn weight_bullets_need_weight() {
        let bullets = vec!["Weight-based rule extracted: 20–40 mg/kg/day.".to_string()];
        assert!(filter_bullets(&bullets, false, true).is_empty());
        assert_eq!(filter_bullets(&bullets, true, false).len(), 1);
    }

    #[test]
    fn bullets_decide_when_primary_is_silent() {
        let bullets = vec!["A maximum-dose statement was detected; ensure the regimen does not exceed the labeled maximum".to_string()];
        let decision = classify_status("Use label-directed volume.", &bullets, &[]);
        assert_eq!(decision.status, RecommendationStatus::Danger);
        assert_eq!(decision.source, StatusSource::Bullets);
    }

    #[test]
    fn fallback_reads_alert_text() {
        let alerts = vec![Alert::new(
            AlertCategory::HepaticCondition,
            Severity::Caution,
            "Use with caution in hepatic impairment.",
        )];
        let decision = classify_status("No fixed or weight-based range extracted.", &[], &alerts);
        assert_eq!(decision.source, StatusSource::Fallback);
        assert_eq!(decision.status, RecommendationStatus::Caution);
    }

    #[test]
    fn fallback_danger_terms_win() {
        let decision = fallback_status("Contraindicated due to allergy.", &[], &[]);
        assert_eq!(decision.status, RecommendationStatus::Danger);
    }

    #[test]
    fn silence_defaults_to_caution() {
        let decision = classify_status("", &[], &[]);
        assert_eq!(decision.status, RecommendationStatus::Caution);
        assert_eq!(decision.reasons, vec!["Insufficient signal (fallback)."]);
    }
}
