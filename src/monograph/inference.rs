use crate::models::Route;

use super::profile::{DosageProfile, RouteEvidence};
use super::routes::RouteCatalog;

fn evidence_score(evidence: &RouteEvidence) -> i64 {
    let score = 2 * evidence.doses_mg.len() as i64 + evidence.sentences.len() as i64;
    if evidence.route == Route::Unspecified {
        score - 2
    } else {
        score
    }
}

/// Pick the route with the densest evidence.
///
/// Ties go to the route listed first in the catalog's priority order. When
/// only "Unspecified" carries evidence it is returned as is.
pub fn infer_route(profile: &DosageProfile, catalog: &RouteCatalog) -> Option<Route> {
    let named: Vec<&RouteEvidence> = profile
        .routes
        .values()
        .filter(|e| e.route != Route::Unspecified)
        .collect();
    if named.is_empty() {
        return profile
            .evidence(Route::Unspecified)
            .map(|_| Route::Unspecified);
    }

    let rank = |route: Route| {
        catalog
            .priority()
            .iter()
            .position(|r| *r == route)
            .unwrap_or(usize::MAX)
    };

    profile
        .routes
        .values()
        .max_by(|a, b| {
            evidence_score(a)
                .cmp(&evidence_score(b))
                .then_with(|| rank(b.route).cmp(&rank(a.route)))
        })
        .map(|e| e.route)
}

/// How the assessed route was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteSource {
    Explicit,
    ProposedDose,
    Inferred,
    Default,
}

/// Resolve the route for one assessment: the caller's explicit route, else a
/// route named in the proposed dose, else inference over the evidence, else
/// Unspecified.
pub fn select_route(
    explicit: Option<Route>,
    proposed_dose: &str,
    profile: &DosageProfile,
    catalog: &RouteCatalog,
) -> (Route, RouteSource) {
    if let Some(route) = explicit {
        return (route, RouteSource::Explicit);
    }
    if let Some(route) = catalog.detect_route_in_text(proposed_dose) {
        return (route, RouteSource::ProposedDose);
    }
    match infer_route(profile, catalog) {
        Some(route) => (route, RouteSource::Inferred),
        None => (Route::Unspecified, RouteSource::Default),
    }
}
