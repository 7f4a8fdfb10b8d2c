//! Shared unit and keyword patterns for monograph text.
//!
//! Every pattern is compiled once. Amount patterns are case-insensitive and
//! report their byte span so callers can attribute a value to the route
//! mentioned nearest to it.

use std::sync::LazyLock;

use regex::Regex;

pub(crate) static RE_DOSE_MG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*mg\b").unwrap());
pub(crate) static RE_DOSE_G: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*g\b").unwrap());
pub(crate) static RE_DOSE_MCG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(?:mcg|µg)\b").unwrap());
/// Lower bound of "250–500 mg" style ranges; the upper bound is caught by the unit patterns.
static RE_DOSE_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(?:-|–|—|to)\s*\d+(?:\.\d+)?\s*(mg|g|mcg|µg)\b").unwrap()
});
pub(crate) static RE_MG_PER_KG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*mg\s*/\s*kg(?:\s*/\s*day)?\b").unwrap()
});
/// Lower bound of "20 to 40 mg/kg/day" style ranges.
static RE_MG_PER_KG_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(?:-|–|—|to)\s*\d+(?:\.\d+)?\s*mg\s*/\s*kg\b").unwrap()
});
pub(crate) static RE_MG_PER_ML: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*mg\s*/\s*ml\b").unwrap());
pub(crate) static RE_PERCENT_WV: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)%\s*w\s*/\s*v\b").unwrap());
pub(crate) static RE_PERCENT_WW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)%\s*w\s*/\s*w\b").unwrap());
static RE_PER_WEIGHT_TAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*/\s*(?:kg|ml)\b").unwrap());

/// Any unit token that makes a sentence dose-bearing.
static RE_UNIT_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\d\s*(?:mg|mcg|µg|g)\b|\bmg\b|\bmcg\b|%\s*w\s*/\s*[vw]\b|\bevery\s+\d+(?:\.\d+)?\s*(?:hours?|hrs?|h)\b",
    )
    .unwrap()
});

pub(crate) static RE_DURATION_DAYS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*days?\b").unwrap());
pub(crate) static RE_MAX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:max(?:imum)?|do not exceed)\b").unwrap());
pub(crate) static RE_CONTRA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)contraindicat").unwrap());
pub(crate) static RE_INTERACT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:interact\w*|concomit\w*|co-?administ\w*|synerg\w*|potentiat\w*)").unwrap()
});
pub(crate) static RE_MONITOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:monitor\w*|baseline|check\w*)\b").unwrap());

/// Substrings that mark a line as a contraindication or special-population warning.
pub(crate) const CONTRA_KEY_TERMS: &[&str] = &[
    "pregnan",
    "third trimester",
    "breast",
    "lactat",
    "renal",
    "hepatic",
    "cabg",
    "asthma",
    "ulcer",
    "bleed",
];

/// Drugs and classes whose mention marks a line as an interaction statement.
pub(crate) const INTERACT_DRUGS: &[&str] = &[
    "warfarin",
    "aspirin",
    "lithium",
    "digoxin",
    "methotrexate",
    "cyclosporine",
    "tacrolimus",
    "diuretic",
    "ace inhibitor",
    "metformin",
    "ssri",
    "snri",
    "pemetrexed",
    "probenecid",
    "quinolone",
    "voriconazole",
    "rifampin",
];

/// An absolute amount found in text, normalized to mg.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassDose {
    pub mg: f64,
    /// Byte offset of the number.
    pub start: usize,
}

/// Extract every mg/g/mcg amount from `text`, normalized to mg and ordered
/// by position. Amounts followed by "/kg" or "/mL" are rates, not absolute
/// doses, and are skipped.
pub fn mass_doses(text: &str) -> Vec<MassDose> {
    let mut out: Vec<MassDose> = Vec::new();

    let units: [(&Regex, f64); 3] = [
        (&*RE_DOSE_MG, 1.0),
        (&*RE_DOSE_G, 1000.0),
        (&*RE_DOSE_MCG, 0.001),
    ];
    for (re, factor) in units {
        for caps in re.captures_iter(text) {
            let (Some(whole), Some(number)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if RE_PER_WEIGHT_TAIL.is_match(&text[whole.end()..]) {
                continue;
            }
            if let Ok(value) = number.as_str().parse::<f64>() {
                out.push(MassDose {
                    mg: value * factor,
                    start: number.start(),
                });
            }
        }
    }

    for caps in RE_DOSE_RANGE.captures_iter(text) {
        let (Some(whole), Some(low), Some(unit)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        if RE_PER_WEIGHT_TAIL.is_match(&text[whole.end()..]) {
            continue;
        }
        let factor = unit_factor(unit.as_str());
        if let Ok(value) = low.as_str().parse::<f64>() {
            out.push(MassDose {
                mg: value * factor,
                start: low.start(),
            });
        }
    }

    out.sort_by_key(|d| d.start);
    out.dedup_by_key(|d| d.start);
    out
}

fn unit_factor(unit: &str) -> f64 {
    match unit.to_lowercase().as_str() {
        "g" => 1000.0,
        "mcg" | "µg" => 0.001,
        _ => 1.0,
    }
}

/// First captured number of every match of `re`.
pub(crate) fn captured_numbers(re: &Regex, text: &str) -> Vec<f64> {
    re.captures_iter(text)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<f64>().ok())
        .collect()
}

/// Every mg/kg figure in `text`, including the lower bound of ranges.
pub(crate) fn weight_rates(text: &str) -> Vec<f64> {
    let mut rates = captured_numbers(&RE_MG_PER_KG, text);
    rates.extend(captured_numbers(&RE_MG_PER_KG_RANGE, text));
    rates
}

/// A sentence is dose-bearing when it carries a recognized unit token.
pub fn is_dose_bearing(sentence: &str) -> bool {
    RE_UNIT_TOKEN.is_match(sentence)
        || RE_MG_PER_KG.is_match(sentence)
        || RE_MG_PER_ML.is_match(sentence)
}

/// Sort ascending and drop exact duplicates.
pub(crate) fn sort_dedup(values: &mut Vec<f64>) {
    values.retain(|v| v.is_finite());
    values.sort_by(f64::total_cmp);
    values.dedup();
}
