use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::models::Route;

/// Dosing evidence attributed to one route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteEvidence {
    pub route: Route,
    /// Absolute doses in mg, ascending, distinct, outliers trimmed.
    pub doses_mg: Vec<f64>,
    /// Supporting sentences in first-seen order, without repeats.
    pub sentences: Vec<String>,
    /// A mg/mL concentration was attributed to this route.
    pub concentration: bool,
}

impl RouteEvidence {
    pub fn new(route: Route) -> Self {
        Self {
            route,
            doses_mg: Vec::new(),
            sentences: Vec::new(),
            concentration: false,
        }
    }

    pub fn has_fixed_doses(&self) -> bool {
        !self.doses_mg.is_empty()
    }

    /// (min, max) of the fixed doses.
    pub fn range(&self) -> Option<(f64, f64)> {
        Some((*self.doses_mg.first()?, *self.doses_mg.last()?))
    }

    pub(crate) fn add_sentence(&mut self, sentence: &str) {
        if !self.sentences.iter().any(|s| s == sentence) {
            self.sentences.push(sentence.to_string());
        }
    }
}

/// Everything the extractor learned about dosing from one monograph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DosageProfile {
    pub routes: BTreeMap<Route, RouteEvidence>,
    /// Weight-based figures (mg/kg or mg/kg/day), ascending and distinct.
    pub mg_per_kg: Vec<f64>,
    /// Concentrations (mg/mL), ascending and distinct.
    pub mg_per_ml: Vec<f64>,
    /// Unit formats seen: "mg", "mg/kg", "mg/mL", "% w/v", "% w/w".
    pub unit_formats: BTreeSet<String>,
}

impl DosageProfile {
    pub fn evidence(&self, route: Route) -> Option<&RouteEvidence> {
        self.routes.get(&route)
    }

    /// Fixed-dose range for a route, if it has any fixed doses.
    pub fn fixed_range(&self, route: Route) -> Option<(f64, f64)> {
        self.evidence(route)?.range()
    }

    pub fn weight_range(&self) -> Option<(f64, f64)> {
        Some((*self.mg_per_kg.first()?, *self.mg_per_kg.last()?))
    }

    pub fn concentration_range(&self) -> Option<(f64, f64)> {
        Some((*self.mg_per_ml.first()?, *self.mg_per_ml.last()?))
    }

    /// The route is dosed by concentration rather than fixed amounts.
    pub fn is_concentration_based(&self, route: Route) -> bool {
        self.evidence(route).is_some_and(|e| e.concentration) || !self.mg_per_ml.is_empty()
    }

    /// No route evidence at all.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn formats_label(&self) -> String {
        if self.unit_formats.is_empty() {
            "—".to_string()
        } else {
            self.unit_formats
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        }
    }
}

/// Extractor output: the profile plus the sentence lists it was built from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DosageExtraction {
    pub profile: DosageProfile,
    /// Dose-bearing sentences in document order, without repeats.
    pub dose_sentences: Vec<String>,
    /// Dose-bearing sentences under a "Dosage Forms" / "Strengths" heading.
    pub dosage_forms: Vec<String>,
    /// Dose-bearing sentences under a "Dosage and Administration" heading.
    pub dosage_admin: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_spans_first_and_last_dose() {
        let mut evidence = RouteEvidence::new(Route::Oral);
        assert_eq!(evidence.range(), None);
        evidence.doses_mg = vec![250.0, 500.0, 1000.0];
        assert_eq!(evidence.range(), Some((250.0, 1000.0)));
    }

    #[test]
    fn sentences_are_deduplicated_in_order() {
        let mut evidence = RouteEvidence::new(Route::Oral);
        evidence.add_sentence("b");
        evidence.add_sentence("a");
        evidence.add_sentence("b");
        assert_eq!(evidence.sentences, vec!["b", "a"]);
    }

    #[test]
    fn formats_label_lists_sorted_formats() {
        let mut profile = DosageProfile::default();
        assert_eq!(profile.formats_label(), "—");
        profile.unit_formats.insert("mg/kg".into());
        profile.unit_formats.insert("% w/v".into());
        profile.unit_formats.insert("mg".into());
        assert_eq!(profile.formats_label(), "% w/v, mg, mg/kg");
    }

    #[test]
    fn concentration_flag_or_values_mark_route() {
        let mut profile = DosageProfile::default();
        assert!(!profile.is_concentration_based(Route::Intravenous));
        profile.mg_per_ml.push(50.0);
        assert!(profile.is_concentration_based(Route::Intravenous));
    }

    #[test]
    fn serializes_routes_by_name() {
        let mut profile = DosageProfile::default();
        profile
            .routes
            .insert(Route::Oral, RouteEvidence::new(Route::Oral));
        let json = serde_json::to_value(&profile).unwrap();
        assert!(json["routes"].get("Oral").is_some());
    }
}
