use std::sync::LazyLock;

use regex::Regex;

use crate::models::Route;

/// One canonical route with its synonyms and compiled matchers.
struct RouteEntry {
    route: Route,
    phrase: &'static str,
    synonyms: Vec<&'static str>,
    matchers: Vec<Regex>,
}

/// Canonical route taxonomy plus synonym lookup.
///
/// Constructed once and shared read-only; every operation is a pure lookup.
pub struct RouteCatalog {
    entries: Vec<RouteEntry>,
    priority: Vec<Route>,
}

/// (route, synonyms, adverbial phrase). Catalog order decides ties between
/// mentions at the same position.
const STANDARD_ROUTES: &[(Route, &[&str], &str)] = &[
    (
        Route::Oral,
        &["PO", "P.O.", "By Mouth", "Per Os", "Swallow", "Orally", "Peroral"],
        "orally",
    ),
    (
        Route::Rectal,
        &["PR", "P.R.", "Per Rectum", "Rectally"],
        "rectally",
    ),
    (
        Route::Topical,
        &["Cutaneous", "Dermal", "Skin", "External", "Topically", "Dermatological"],
        "topically",
    ),
    (
        Route::Ophthalmic,
        &["Ocular", "Eye", "Ophth", "Ophthalmological", "Conjunctival"],
        "as eye drops",
    ),
    (
        Route::Otic,
        &["Aural", "Ear", "Otological", "Auricular"],
        "as ear drops",
    ),
    (
        Route::Nasal,
        &["Intranasal", "Nose", "Nasally", "Rhinal"],
        "as a nasal preparation",
    ),
    (
        Route::Inhalation,
        &["Inhaled", "Pulmonary", "Respiratory", "Nebulized", "Inhalational", "Aerosol"],
        "by inhalation",
    ),
    (
        Route::Intravenous,
        &["IV", "I.V.", "Intravenous Injection", "IV Push", "IV Infusion", "Intravenously"],
        "intravenously",
    ),
    (
        Route::Intramuscular,
        &["IM", "I.M.", "Intramuscular Injection", "Intramuscularly"],
        "by intramuscular injection",
    ),
    (
        Route::Subcutaneous,
        &["SC", "S.C.", "SubQ", "Subcut", "Subcutaneous Injection", "Subcutaneously"],
        "by subcutaneous injection",
    ),
    (
        Route::Intradermal,
        &["ID", "I.D.", "Intracutaneous", "Intradermally"],
        "by intradermal injection",
    ),
    (
        Route::Sublingual,
        &["SL", "S.L.", "Under Tongue", "Sublingually"],
        "sublingually",
    ),
    (
        Route::Buccal,
        &["Bucc", "Between Cheek and Gum", "Buccally"],
        "buccally",
    ),
    (
        Route::Vaginal,
        &["PV", "P.V.", "Per Vagina", "Intravaginal", "Vaginally"],
        "as a vaginal preparation",
    ),
    (
        Route::Transdermal,
        &["TD", "T.D.", "Patch", "Dermal Patch", "Transdermally"],
        "as a transdermal patch",
    ),
    (
        Route::Intrathecal,
        &["IT", "I.T.", "Spinal", "Intraspinal", "Intrathecally"],
        "by intrathecal injection",
    ),
    (
        Route::Epidural,
        &["ED", "E.D.", "Peridural", "Epidurally"],
        "by epidural injection",
    ),
];

const STANDARD_PRIORITY: &[Route] = &[
    Route::Oral,
    Route::Intravenous,
    Route::Intramuscular,
    Route::Subcutaneous,
    Route::Rectal,
    Route::Topical,
    Route::Transdermal,
    Route::Sublingual,
    Route::Buccal,
    Route::Vaginal,
    Route::Inhalation,
    Route::Nasal,
    Route::Ophthalmic,
    Route::Otic,
    Route::Intradermal,
    Route::Intrathecal,
    Route::Epidural,
];

/// Connectives left behind once a route word is removed from a dose string.
static RE_ROUTE_FILLER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:by|via|per|route)\b|\b(?:po|iv|im|sc)\b|\b(?:p\.o\.|i\.v\.|i\.m\.|s\.c\.)")
        .unwrap()
});
static RE_MULTI_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}").unwrap());

/// Word-bounded pattern source for one synonym.
fn bounded_pattern(synonym: &str, ignore_case: bool) -> String {
    let starts_word = synonym.chars().next().is_some_and(|c| c.is_alphanumeric());
    let ends_word = synonym.chars().last().is_some_and(|c| c.is_alphanumeric());

    let mut pattern = String::new();
    if ignore_case {
        pattern.push_str("(?i)");
    }
    if starts_word {
        pattern.push_str(r"\b");
    }
    pattern.push_str(&regex::escape(synonym));
    if ends_word {
        pattern.push_str(r"\b");
    }
    pattern
}

/// Abbreviations that are also ordinary lowercase words ("it", "id") or
/// common clinical shorthand for something else ("pr" as per request).
const AMBIGUOUS_ABBREVIATIONS: &[&str] = &["IT", "ID", "ED", "PR", "TD", "SL", "PV"];

/// Matcher for one synonym. Ambiguous abbreviations match only in capitals;
/// everything else ("po", "iv", "Orally") ignores case.
fn synonym_matcher(synonym: &str) -> Regex {
    let case_sensitive = AMBIGUOUS_ABBREVIATIONS.contains(&synonym);
    // An escaped literal between word anchors always compiles.
    Regex::new(&bounded_pattern(synonym, !case_sensitive)).unwrap()
}

impl RouteCatalog {
    /// The built-in taxonomy of seventeen administration routes.
    pub fn standard() -> Self {
        let entries = STANDARD_ROUTES
            .iter()
            .map(|&(route, synonyms, phrase)| {
                let mut all: Vec<&'static str> = vec![route.as_str()];
                all.extend(synonyms.iter().copied());
                RouteEntry {
                    route,
                    phrase,
                    matchers: all.iter().map(|s| synonym_matcher(s)).collect(),
                    synonyms: all,
                }
            })
            .collect();

        Self {
            entries,
            priority: STANDARD_PRIORITY.to_vec(),
        }
    }

    /// Tie-break order used by route inference.
    pub fn priority(&self) -> &[Route] {
        &self.priority
    }

    /// Route whose earliest mention in `line` comes first, if any.
    pub fn detect_route_in_text(&self, line: &str) -> Option<Route> {
        let mut best: Option<(usize, Route)> = None;
        for entry in &self.entries {
            for matcher in &entry.matchers {
                if let Some(m) = matcher.find(line) {
                    if best.map_or(true, |(pos, _)| m.start() < pos) {
                        best = Some((m.start(), entry.route));
                    }
                }
            }
        }
        best.map(|(_, route)| route)
    }

    /// Route mentioned closest before `position` (a byte offset into `line`),
    /// falling back to the first mention anywhere in the line.
    pub fn detect_route_near(&self, line: &str, position: usize) -> Option<Route> {
        let mut before: Option<(usize, Route)> = None;
        let mut first: Option<(usize, Route)> = None;

        for entry in &self.entries {
            for matcher in &entry.matchers {
                for m in matcher.find_iter(line) {
                    let pos = m.start();
                    if first.map_or(true, |(p, _)| pos < p) {
                        first = Some((pos, entry.route));
                    }
                    if pos <= position && before.map_or(true, |(p, _)| pos > p) {
                        before = Some((pos, entry.route));
                    }
                }
            }
        }

        before.or(first).map(|(_, route)| route)
    }

    /// Map a route name, synonym or abbreviation (any case) to its canonical route.
    pub fn canonicalize(&self, name: &str) -> Option<Route> {
        let wanted = name.trim();
        if wanted.is_empty() {
            return None;
        }
        if wanted.eq_ignore_ascii_case(Route::Unspecified.as_str()) {
            return Some(Route::Unspecified);
        }
        self.entries
            .iter()
            .find(|e| e.route.as_str().eq_ignore_ascii_case(wanted))
            .or_else(|| {
                self.entries.iter().find(|e| {
                    e.synonyms
                        .iter()
                        .any(|s| s.eq_ignore_ascii_case(wanted))
                })
            })
            .map(|e| e.route)
    }

    /// Narrative phrase for a route ("orally", "by intramuscular injection").
    pub fn to_adverbial_phrase(&self, route: Route) -> &'static str {
        self.entries
            .iter()
            .find(|e| e.route == route)
            .map(|e| e.phrase)
            .unwrap_or("")
    }

    /// Remove every mention of `route` from a dose string so it can be
    /// followed by the route phrase without repeating it.
    pub fn strip_route_from_text(&self, text: &str, route: Route) -> String {
        let Some(entry) = self.entries.iter().find(|e| e.route == route) else {
            return text.to_string();
        };

        let mut synonyms = entry.synonyms.clone();
        synonyms.sort_by_key(|s| std::cmp::Reverse(s.len()));

        let mut stripped = text.to_string();
        for synonym in synonyms {
            if let Ok(matcher) = Regex::new(&bounded_pattern(synonym, true)) {
                stripped = matcher.replace_all(&stripped, " ").into_owned();
            }
        }
        let stripped = RE_ROUTE_FILLER.replace_all(&stripped, " ");
        let stripped = RE_MULTI_SPACE.replace_all(&stripped, " ");
        stripped
            .trim_matches(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '/'))
            .to_string()
    }
}

impl Default for RouteCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
