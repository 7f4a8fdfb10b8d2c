//! The monograph's own recommended regimen, read from its best dosing sentence.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::ParsedDose;
use crate::monograph::document::split_sentences;
use crate::monograph::patterns::RE_DOSE_MG;

use super::parser::{normalize_number_words, parse_dose_numbers};

static RE_RECOMMEND: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)recommend").unwrap());
static RE_FREQUENCY_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\btimes?\b|\bdaily\b|\bper\s+day\b|\bevery\b|\bqd\b|\bq\d+h\b|\bonce\b|\btwice\b|\bq\.d\b|\bbid\b|\btid\b|\bqid\b",
    )
    .unwrap()
});
static RE_DAILY_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(\d+(?:\.\d+)?)\s*(?:-|–|—|to)\s*(\d+(?:\.\d+)?)\s*mg\s*(?:/|per)?\s*day\b",
    )
    .unwrap()
});
static RE_DAILY_SINGLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*mg\s*(?:/|per)\s*day\b").unwrap()
});
static RE_DIVIDED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bdivid").unwrap());
static RE_PARENTHETICAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(([^)]+)\)").unwrap());
static RE_PER_ADMIN_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(?:-|–|—|to)\s*(\d+(?:\.\d+)?)\s*(mg|g)\b").unwrap()
});
static RE_RATE_TAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(?:/|per\b)").unwrap());

/// Pick the monograph sentence most likely to state the recommended regimen:
/// one with an mg dose that says "recommend", else one with an mg dose and a
/// frequency word, else the first with an mg dose.
pub fn select_regimen_sentence(text: &str) -> Option<&str> {
    let dosed: Vec<&str> = split_sentences(text)
        .into_iter()
        .filter(|s| RE_DOSE_MG.is_match(s))
        .collect();

    dosed
        .iter()
        .find(|s| RE_RECOMMEND.is_match(s))
        .or_else(|| dosed.iter().find(|s| RE_FREQUENCY_TOKEN.is_match(s)))
        .or_else(|| dosed.first())
        .copied()
}

fn number(caps: &regex::Captures, group: usize) -> Option<f64> {
    caps.get(group)?.as_str().parse::<f64>().ok()
}

/// Per-administration "a–b mg" range not followed by "/day", "/kg" or "/mL".
fn per_admin_range(text: &str) -> Option<(f64, f64)> {
    RE_PER_ADMIN_RANGE.captures_iter(text).find_map(|caps| {
        let whole = caps.get(0)?;
        if RE_RATE_TAIL.is_match(&text[whole.end()..]) {
            return None;
        }
        let factor = if caps[3].eq_ignore_ascii_case("g") {
            1000.0
        } else {
            1.0
        };
        Some((number(&caps, 1)? * factor, number(&caps, 2)? * factor))
    })
}

/// Read a regimen from one monograph sentence.
///
/// Daily totals are only reported when the sentence states them or states
/// a frequency; a bare per-administration amount yields no daily range.
pub fn parse_monograph_regimen(sentence: &str) -> ParsedDose {
    let text = normalize_number_words(sentence);
    let mut dose = ParsedDose::default();

    if let Some(caps) = RE_DAILY_RANGE.captures(&text) {
        if let (Some(lo), Some(hi)) = (number(&caps, 1), number(&caps, 2)) {
            dose.total_min = Some(lo);
            dose.total_max = Some(hi);
            dose.range_is_daily = true;
        }
    }
    if dose.total_min.is_none() {
        if let Some(total) = RE_DAILY_SINGLE.captures(&text).and_then(|c| number(&c, 1)) {
            dose.total = Some(total);
            dose.range_is_daily = true;
        }
    }

    if RE_DIVIDED.is_match(&text) {
        if let Some(inner) = RE_PARENTHETICAL.captures(&text).and_then(|c| c.get(1)) {
            let (example, _) = parse_dose_numbers(inner.as_str());
            dose.per_admin = example.per_admin.or(dose.per_admin);
            dose.freq = example.freq.or(dose.freq);
            if dose.total.is_none() {
                dose.total = example.total;
            }
        }
    }

    if dose.total_min.is_none() && dose.total.is_none() {
        let (generic, frequency_stated) = parse_dose_numbers(&text);
        dose.per_admin = generic.per_admin;
        if frequency_stated {
            dose.freq = generic.freq;
            dose.total = generic.total;
            dose.range_is_daily = generic.total.is_some();
            if let (Some((lo, hi)), Some(freq)) = (per_admin_range(&text), generic.freq) {
                dose.total_min = Some(lo * f64::from(freq));
                dose.total_max = Some(hi * f64::from(freq));
            }
        }
    }

    dose
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_recommended_sentence() {
        let text = "Tablets contain 250 mg. Give 100 mg twice daily for mild cases. \
                    The recommended dose is 500 mg every 12 hours.";
        assert_eq!(
            select_regimen_sentence(text),
            Some("The recommended dose is 500 mg every 12 hours.")
        );
    }

    #[test]
    fn falls_back_to_frequency_then_first() {
        let text = "Tablets contain 250 mg. Give 100 mg twice daily.";
        assert_eq!(select_regimen_sentence(text), Some("Give 100 mg twice daily."));
        assert_eq!(
            select_regimen_sentence("Tablets contain 250 mg. Store cool."),
            Some("Tablets contain 250 mg.")
        );
        assert_eq!(select_regimen_sentence("No amounts here."), None);
    }

    #[test]
    fn explicit_daily_range() {
        let dose = parse_monograph_regimen("Usual dose is 150 to 200 mg/day in divided doses.");
        assert_eq!(dose.daily_range(), Some((150.0, 200.0)));
        assert!(dose.range_is_daily);
    }

    #[test]
    fn single_daily_total() {
        let dose = parse_monograph_regimen("Adults: 1200 mg per day.");
        assert_eq!(dose.total, Some(1200.0));
        assert_eq!(dose.daily_range(), Some((1200.0, 1200.0)));
    }

    #[test]
    fn divided_dose_reads_parenthetical() {
        let dose = parse_monograph_regimen(
            "The usual dose is 150 mg/day divided (50 mg three times a day).",
        );
        assert_eq!(dose.total, Some(150.0));
        assert_eq!(dose.per_admin, Some(50.0));
        assert_eq!(dose.freq, Some(3));
    }

    #[test]
    fn per_admin_range_with_frequency_scales_to_daily() {
        let dose = parse_monograph_regimen("Recommended dose: 250–500 mg orally every 8 hours.");
        assert_eq!(dose.freq, Some(3));
        assert_eq!(dose.daily_range(), Some((750.0, 1500.0)));
    }

    #[test]
    fn bare_amount_gives_no_daily_range() {
        let dose = parse_monograph_regimen("Tablets contain 250 mg.");
        assert_eq!(dose.per_admin, Some(250.0));
        assert_eq!(dose.daily_range(), None);
    }
}
