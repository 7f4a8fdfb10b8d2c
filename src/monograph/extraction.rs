use std::collections::BTreeMap;

use crate::models::Route;

use super::document::MonographDocument;
use super::patterns::{
    is_dose_bearing, mass_doses, sort_dedup, weight_rates, RE_MG_PER_ML, RE_PERCENT_WV,
    RE_PERCENT_WW,
};
use super::profile::{DosageExtraction, RouteEvidence};
use super::routes::RouteCatalog;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Forms,
    Administration,
}

fn section_heading(sentence: &str) -> Option<Section> {
    let lower = sentence.to_lowercase();
    if lower.contains("dosage forms") || lower.contains("strengths") {
        Some(Section::Forms)
    } else if lower.contains("dosage and administration")
        || lower.contains("dosage & administration")
    {
        Some(Section::Administration)
    } else {
        None
    }
}

fn push_unique(list: &mut Vec<String>, sentence: &str) {
    if !list.iter().any(|s| s == sentence) {
        list.push(sentence.to_string());
    }
}

/// Keep the values between the 10th and 90th percentile (inclusive) of the
/// distinct values, ascending.
pub fn trim_outliers(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sort_dedup(&mut sorted);
    if sorted.is_empty() {
        return sorted;
    }
    let n = sorted.len();
    let lower = n / 10;
    let upper = (n * 9 / 10).min(n - 1);
    sorted[lower..=upper].to_vec()
}

fn evidence_for(routes: &mut BTreeMap<Route, RouteEvidence>, route: Route) -> &mut RouteEvidence {
    routes
        .entry(route)
        .or_insert_with(|| RouteEvidence::new(route))
}

/// Scan a monograph for dosing evidence and attribute each amount to a route.
pub fn extract_dosage(doc: &MonographDocument, catalog: &RouteCatalog) -> DosageExtraction {
    let mut out = DosageExtraction::default();
    let mut routes: BTreeMap<Route, RouteEvidence> = BTreeMap::new();
    let mut mg_per_kg: Vec<f64> = Vec::new();
    let mut mg_per_ml: Vec<f64> = Vec::new();
    let mut section: Option<Section> = None;

    for sentence in doc.sentences() {
        if let Some(heading) = section_heading(sentence) {
            section = Some(heading);
        }
        if !is_dose_bearing(sentence) {
            continue;
        }

        push_unique(&mut out.dose_sentences, sentence);
        match section {
            Some(Section::Forms) => push_unique(&mut out.dosage_forms, sentence),
            Some(Section::Administration) => push_unique(&mut out.dosage_admin, sentence),
            None => {}
        }

        let first_route = catalog
            .detect_route_in_text(sentence)
            .unwrap_or(Route::Unspecified);
        for dose in mass_doses(sentence) {
            let route = catalog
                .detect_route_near(sentence, dose.start)
                .unwrap_or(Route::Unspecified);
            let evidence = evidence_for(&mut routes, route);
            evidence.doses_mg.push(dose.mg);
            evidence.add_sentence(sentence);
            out.profile.unit_formats.insert("mg".into());
        }

        let per_kg = weight_rates(sentence);
        if !per_kg.is_empty() {
            mg_per_kg.extend(per_kg);
            evidence_for(&mut routes, first_route).add_sentence(sentence);
            out.profile.unit_formats.insert("mg/kg".into());
        }

        for caps in RE_MG_PER_ML.captures_iter(sentence) {
            let Some(number) = caps.get(1) else { continue };
            let Ok(value) = number.as_str().parse::<f64>() else {
                continue;
            };
            mg_per_ml.push(value);
            out.profile.unit_formats.insert("mg/mL".into());
            match catalog.detect_route_near(sentence, number.start()) {
                Some(route) => {
                    let evidence = evidence_for(&mut routes, route);
                    evidence.concentration = true;
                    evidence.add_sentence(sentence);
                }
                None => evidence_for(&mut routes, Route::Unspecified).add_sentence(sentence),
            }
        }

        for (re, label) in [(&*RE_PERCENT_WV, "% w/v"), (&*RE_PERCENT_WW, "% w/w")] {
            if re.is_match(sentence) {
                out.profile.unit_formats.insert(label.into());
                evidence_for(&mut routes, first_route).add_sentence(sentence);
            }
        }
    }

    for evidence in routes.values_mut() {
        evidence.doses_mg = trim_outliers(&evidence.doses_mg);
    }
    sort_dedup(&mut mg_per_kg);
    sort_dedup(&mut mg_per_ml);

    out.profile.routes = routes;
    out.profile.mg_per_kg = mg_per_kg;
    out.profile.mg_per_ml = mg_per_ml;

    tracing::debug!(
        routes = out.profile.routes.len(),
        dose_sentences = out.dose_sentences.len(),
        weight_based = out.profile.mg_per_kg.len(),
        concentrations = out.profile.mg_per_ml.len(),
        "Dosage evidence extracted"
    );

    out
}
