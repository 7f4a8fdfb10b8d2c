//! The assessment report: everything one request produced, immutable once
//! built and shared from the result cache behind an `Arc`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::dosing::{ClassificationRecord, ProposedDose};
use crate::intelligence::allergy::AllergyAssessment;
use crate::intelligence::messages::amount;
use crate::intelligence::recommendation::RecommendationResult;
use crate::intelligence::types::{Alert, AlertCounts};
use crate::models::{ParsedDose, Route, Severity};
use crate::monograph::{AllergenMention, DosageProfile, MonographSections, RouteEvidence, RouteSource};

/// Per-route evidence as shown in the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteCase {
    pub route: Route,
    pub doses_mg: Vec<f64>,
    pub range: Option<(f64, f64)>,
    pub sentences: Vec<String>,
    /// Display wording of `sentences`; identical when no polisher is set.
    pub sentences_polished: Vec<String>,
    pub concentration: bool,
}

impl RouteCase {
    pub fn from_evidence(evidence: &RouteEvidence, sentences_polished: Vec<String>) -> Self {
        Self {
            route: evidence.route,
            doses_mg: evidence.doses_mg.clone(),
            range: evidence.range(),
            sentences: evidence.sentences.clone(),
            sentences_polished,
            concentration: evidence.concentration,
        }
    }
}

/// Monograph dosing sentence and the regimen read from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonographRegimen {
    pub sentence: String,
    pub dose: ParsedDose,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentReport {
    /// UUID v5 of the fingerprint; equal inputs give equal ids.
    pub id: Uuid,
    pub fingerprint: String,
    pub monograph_fingerprint: String,
    pub generated_at: DateTime<Utc>,
    pub drug: String,
    pub route: Route,
    pub route_source: RouteSource,
    pub route_cases: Vec<RouteCase>,
    pub profile: DosageProfile,
    pub classification: Option<ClassificationRecord>,
    /// Leading dose-bearing sentences of the monograph.
    pub dose_summary: Vec<String>,
    pub alerts: Vec<Alert>,
    pub alert_counts: AlertCounts,
    pub allergy: AllergyAssessment,
    pub allergen_mentions: Vec<AllergenMention>,
    pub recommendation: RecommendationResult,
    /// Display wording of the primary statement.
    pub primary_polished: String,
    pub sections: MonographSections,
    pub proposed: ProposedDose,
    pub regimen: Option<MonographRegimen>,
    pub ranges_summary: String,
    pub patient_summary: String,
    pub narrative: String,
    /// Highest severity across alerts, classification and recommendation.
    pub overall_severity: Severity,
    /// The monograph was cut to the configured character cap.
    pub truncated: bool,
}

impl AssessmentReport {
    pub fn id_for(fingerprint: &str) -> Uuid {
        Uuid::new_v5(&Uuid::NAMESPACE_OID, fingerprint.as_bytes())
    }

    pub fn alerts_of(&self, severity: Severity) -> impl Iterator<Item = &Alert> {
        self.alerts.iter().filter(move |a| a.severity == severity)
    }
}

// ---------------------------------------------------------------------------
// Range summary
// ---------------------------------------------------------------------------

/// Route whose range the summary shows: the selected route when it has
/// fixed doses, else Unspecified, else the first route with doses.
fn summary_route(profile: &DosageProfile, selected: Route) -> Option<Route> {
    let dosed = |route: Route| profile.evidence(route).is_some_and(|e| e.has_fixed_doses());
    if dosed(selected) {
        return Some(selected);
    }
    if dosed(Route::Unspecified) {
        return Some(Route::Unspecified);
    }
    profile
        .routes
        .values()
        .find(|e| e.has_fixed_doses())
        .map(|e| e.route)
}

/// One-line summary of every range the monograph supplied.
pub fn ranges_summary(profile: &DosageProfile, selected: Route) -> String {
    let mut parts = Vec::new();

    if let Some(route) = summary_route(profile, selected) {
        if let Some((min, max)) = profile.fixed_range(route) {
            parts.push(format!(
                "Route: {}  |  Min: {:.2} mg  |  Max: {:.2} mg",
                route, min, max
            ));
        }
    }
    if let Some((min, max)) = profile.weight_range() {
        parts.push(format!("Weight-based: {}–{} mg/kg/day", amount(min), amount(max)));
    }
    match profile.concentration_range() {
        Some((lo, hi)) if lo != hi => {
            parts.push(format!("Concentration noted: {}–{} mg/mL", amount(lo), amount(hi)))
        }
        Some((lo, _)) => parts.push(format!("Concentration noted: {} mg/mL", amount(lo))),
        None => {}
    }
    if !profile.unit_formats.is_empty() {
        parts.push(format!("Formats in monograph: {}", profile.formats_label()));
    }

    if parts.is_empty() {
        "No dosage ranges extracted.".to_string()
    } else {
        parts.join("  |  ")
    }
}
