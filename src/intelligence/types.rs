use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::models::{AlertCategory, PatientProfile, Route, Severity};
use crate::monograph::DosageExtraction;
use crate::report::AssessmentReport;

// ---------------------------------------------------------------------------
// Alert
// ---------------------------------------------------------------------------

/// A categorized clinical finding with one or more annotation lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub category: AlertCategory,
    pub severity: Severity,
    pub annotations: Vec<String>,
}

impl Alert {
    pub fn new(category: AlertCategory, severity: Severity, annotation: impl Into<String>) -> Self {
        Self {
            category,
            severity,
            annotations: vec![annotation.into()],
        }
    }

    /// Alert over several lines. Blank lines are dropped; `None` if nothing is left.
    pub fn with_annotations(
        category: AlertCategory,
        severity: Severity,
        annotations: impl IntoIterator<Item = String>,
    ) -> Option<Self> {
        let annotations: Vec<String> = annotations
            .into_iter()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect();
        (!annotations.is_empty()).then_some(Self {
            category,
            severity,
            annotations,
        })
    }

    pub fn label(&self) -> &'static str {
        self.category.label()
    }

    /// Annotation lines joined with a space.
    pub fn text(&self) -> String {
        self.annotations.join(" ")
    }
}

// ---------------------------------------------------------------------------
// AlertCounts
// ---------------------------------------------------------------------------

/// Alert counts by severity for one assessment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AlertCounts {
    pub info: usize,
    pub caution: usize,
    pub danger: usize,
}

impl AlertCounts {
    pub fn tally(alerts: &[Alert]) -> Self {
        alerts.iter().fold(Self::default(), |mut counts, alert| {
            match alert.severity {
                Severity::Info => counts.info += 1,
                Severity::Caution => counts.caution += 1,
                Severity::Danger => counts.danger += 1,
            }
            counts
        })
    }

    pub fn total(&self) -> usize {
        self.info + self.caution + self.danger
    }
}

// ---------------------------------------------------------------------------
// AssessmentRequest
// ---------------------------------------------------------------------------

/// Everything one assessment needs. Text fields are taken as given; the
/// engine normalizes them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssessmentRequest {
    pub monograph_text: String,
    /// Flattened table rows, appended to the monograph body.
    pub table_rows: Vec<String>,
    pub drug_name: String,
    pub proposed_dose: String,
    /// Explicit route chosen by the caller, if any.
    pub route: Option<Route>,
    pub patient: PatientProfile,
}

// ---------------------------------------------------------------------------
// SafetyAssessor trait
// ---------------------------------------------------------------------------

/// Dosage safety assessment over a monograph and a patient profile.
pub trait SafetyAssessor {
    /// Run (or recall) the full assessment for one request. Never fails:
    /// sparse or malformed input yields informational findings instead.
    fn assess(&self, request: &AssessmentRequest) -> Arc<AssessmentReport>;

    /// Dosage evidence for a monograph, memoized by content.
    fn extract(&self, monograph_text: &str, table_rows: &[String]) -> Arc<DosageExtraction>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_annotations_produce_no_alert() {
        let alert = Alert::with_annotations(
            AlertCategory::DrugDose,
            Severity::Info,
            vec![" ".to_string(), String::new()],
        );
        assert!(alert.is_none());
    }

    #[test]
    fn annotations_are_trimmed() {
        let alert = Alert::with_annotations(
            AlertCategory::DrugDose,
            Severity::Info,
            vec![" first ".to_string(), "second".to_string()],
        )
        .unwrap();
        assert_eq!(alert.annotations, vec!["first", "second"]);
        assert_eq!(alert.text(), "first second");
    }

    #[test]
    fn counts_by_severity() {
        let alerts = vec![
            Alert::new(AlertCategory::AgeGroup, Severity::Info, "a"),
            Alert::new(AlertCategory::Pregnancy, Severity::Caution, "b"),
            Alert::new(AlertCategory::HepaticCondition, Severity::Caution, "c"),
        ];
        let counts = AlertCounts::tally(&alerts);
        assert_eq!(counts.caution, 2);
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn request_deserializes_with_defaults() {
        let request: AssessmentRequest =
            serde_json::from_str(r#"{"drug_name":"Ibuprofen","route":"Oral"}"#).unwrap();
        assert_eq!(request.route, Some(Route::Oral));
        assert!(request.patient.allergies.is_empty());
    }
}
