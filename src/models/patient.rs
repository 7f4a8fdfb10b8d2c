use serde::{Deserialize, Serialize};

/// Patient and prescription context for one assessment.
///
/// Every field is optional on the wire; missing values are treated as
/// "not provided" by the alert rules rather than as errors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientProfile {
    pub age: Option<u32>,
    pub sex: Option<String>,
    pub weight_kg: Option<f64>,
    pub pregnant: bool,
    pub breastfeeding: bool,
    pub renal_impairment: bool,
    pub hepatic_impairment: bool,
    pub egfr: Option<f64>,
    pub crcl: Option<f64>,
    pub scr: Option<f64>,
    pub allergies: Vec<String>,
    pub current_medications: Vec<String>,
    pub conditions: Vec<String>,
    pub indication: Option<String>,
    pub duration_days: Option<u32>,
}

impl PatientProfile {
    /// Body weight, ignoring non-positive or non-finite entries.
    pub fn weight(&self) -> Option<f64> {
        self.weight_kg.filter(|w| w.is_finite() && *w > 0.0)
    }

    /// eGFR when present, otherwise CrCl.
    pub fn kidney_metric(&self) -> Option<f64> {
        self.egfr.or(self.crcl)
    }

    pub fn indication(&self) -> Option<&str> {
        self.indication
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn sex(&self) -> Option<&str> {
        self.sex.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Reported allergies with blanks removed.
    pub fn reported_allergies(&self) -> Vec<&str> {
        non_blank(&self.allergies)
    }

    pub fn medications(&self) -> Vec<&str> {
        non_blank(&self.current_medications)
    }
}

fn non_blank(items: &[String]) -> Vec<&str> {
    items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_partial_json() {
        let json = r#"{"age": 7, "weight_kg": 22.5, "allergies": ["Penicillin", " "]}"#;
        let patient: PatientProfile = serde_json::from_str(json).unwrap();
        assert_eq!(patient.age, Some(7));
        assert_eq!(patient.weight(), Some(22.5));
        assert!(!patient.pregnant);
        assert_eq!(patient.reported_allergies(), vec!["Penicillin"]);
    }

    #[test]
    fn kidney_metric_prefers_egfr() {
        let patient = PatientProfile {
            egfr: Some(25.0),
            crcl: Some(40.0),
            ..Default::default()
        };
        assert_eq!(patient.kidney_metric(), Some(25.0));

        let crcl_only = PatientProfile {
            crcl: Some(40.0),
            ..Default::default()
        };
        assert_eq!(crcl_only.kidney_metric(), Some(40.0));
    }

    #[test]
    fn zero_weight_counts_as_missing() {
        let patient = PatientProfile {
            weight_kg: Some(0.0),
            ..Default::default()
        };
        assert_eq!(patient.weight(), None);
    }

    #[test]
    fn blank_indication_is_none() {
        let patient = PatientProfile {
            indication: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(patient.indication(), None);
    }
}
