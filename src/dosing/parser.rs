use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Serialize;

use crate::models::ParsedDose;
use crate::monograph::patterns::{mass_doses, RE_MG_PER_KG};

static RE_NUMBER_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(zero|one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve)\b")
        .unwrap()
});
static RE_TOTAL_PER_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(mg|g|mcg)\s*(?:/|per)\s*(?:day|d)\b").unwrap()
});

/// How a frequency rule turns its match into administrations per day.
#[derive(Clone, Copy)]
enum Reading {
    Fixed(u32),
    /// "N times a day": the captured count.
    Count,
    /// "every N hours": 24 / N, rounded, at least one.
    EveryHours,
}

struct FrequencyRule {
    regex: Regex,
    reading: Reading,
}

impl FrequencyRule {
    fn read(&self, text: &str) -> Option<u32> {
        let caps = self.regex.captures(text)?;
        match self.reading {
            Reading::Fixed(n) => Some(n),
            Reading::Count => caps[1].parse::<u32>().ok().filter(|n| *n > 0),
            Reading::EveryHours => {
                let hours = caps[1].parse::<f64>().ok().filter(|h| *h > 0.0)?;
                Some(((24.0 / hours).round() as u32).max(1))
            }
        }
    }
}

fn rule(pattern: &str, reading: Reading) -> FrequencyRule {
    FrequencyRule {
        regex: Regex::new(pattern).unwrap(),
        reading,
    }
}

/// Applied in order; a later match overrides an earlier one.
static FREQUENCY_RULES: LazyLock<Vec<FrequencyRule>> = LazyLock::new(|| {
    vec![
        rule(
            r"(?i)\bonce\b|\bdaily\b|\bper\s+day\b|\bevery\s+day\b|\bqd\b|\bq\.d\b",
            Reading::Fixed(1),
        ),
        rule(r"(?i)\btwice\b|\bbid\b|\bb\.i\.d\b", Reading::Fixed(2)),
        rule(r"(?i)\btid\b|\bt\.i\.d\b", Reading::Fixed(3)),
        rule(r"(?i)\bqid\b|\bq\.i\.d\b", Reading::Fixed(4)),
        rule(r"(?i)\b(\d+)\s*(?:x|times?)\b", Reading::Count),
        rule(
            r"(?i)\bevery\s*(\d+(?:\.\d+)?)\s*-?\s*(?:hours?|hrs?|h)\b",
            Reading::EveryHours,
        ),
        rule(r"(?i)\bq\s*(\d{1,2})\s*h\b", Reading::EveryHours),
    ]
});

/// The prescriber's dose string and what could be read from it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProposedDose {
    pub raw: String,
    pub dose: ParsedDose,
    /// Explicit "N mg/kg" figure, if the text states one.
    pub mg_per_kg: Option<f64>,
    /// The text itself states a frequency.
    pub frequency_stated: bool,
}

impl ProposedDose {
    /// The figure compared against per-route ranges.
    pub fn mg(&self) -> Option<f64> {
        self.dose.per_admin.or(self.dose.total)
    }

    pub fn daily_total(&self) -> Option<f64> {
        self.dose.total
    }

    pub fn is_empty(&self) -> bool {
        self.dose.is_empty() && self.mg_per_kg.is_none()
    }
}

/// Replace "zero".."twelve" with digits.
pub fn normalize_number_words(text: &str) -> String {
    RE_NUMBER_WORD
        .replace_all(text, |caps: &Captures| {
            let word = caps[1].to_lowercase();
            let digit = match word.as_str() {
                "zero" => "0",
                "one" => "1",
                "two" => "2",
                "three" => "3",
                "four" => "4",
                "five" => "5",
                "six" => "6",
                "seven" => "7",
                "eight" => "8",
                "nine" => "9",
                "ten" => "10",
                "eleven" => "11",
                _ => "12",
            };
            digit.to_string()
        })
        .into_owned()
}

/// Administrations per day stated in `text`, if any.
pub fn parse_frequency(text: &str) -> Option<u32> {
    FREQUENCY_RULES
        .iter()
        .filter_map(|rule| rule.read(text))
        .last()
}

/// First "N mg/kg[/day]" figure in `text`.
pub fn parse_mg_per_kg(text: &str) -> Option<f64> {
    RE_MG_PER_KG
        .captures(text)
        .and_then(|caps| caps.get(1)?.as_str().parse::<f64>().ok())
}

fn unit_factor(unit: &str) -> f64 {
    match unit.to_ascii_lowercase().as_str() {
        "g" => 1000.0,
        "mcg" => 0.001,
        _ => 1.0,
    }
}

/// Numbers only, plus whether the frequency came from the text.
pub(crate) fn parse_dose_numbers(text: &str) -> (ParsedDose, bool) {
    let text = normalize_number_words(text);

    let total_match = RE_TOTAL_PER_DAY.captures(&text).and_then(|caps| {
        let whole = caps.get(0)?;
        let number = caps.get(1)?;
        let value = number.as_str().parse::<f64>().ok()? * unit_factor(&caps[2]);
        Some((whole.range(), number.start(), value))
    });

    // The "per day" inside a stated total is not itself a frequency.
    let freq_text = match &total_match {
        Some((range, _, _)) => {
            let mut stripped = text.clone();
            stripped.replace_range(range.clone(), " ");
            stripped
        }
        None => text.clone(),
    };
    let stated_freq = parse_frequency(&freq_text);

    let total_start = total_match.as_ref().map(|(_, start, _)| *start);
    let per_admin = mass_doses(&text)
        .into_iter()
        .filter(|d| Some(d.start) != total_start)
        .map(|d| d.mg)
        .reduce(f64::max);
    let total_explicit = total_match.map(|(_, _, value)| value);

    let mut dose = ParsedDose::default();
    match (per_admin, stated_freq, total_explicit) {
        (None, _, Some(total)) => {
            dose.per_admin = Some(total);
            dose.freq = Some(1);
            dose.total = Some(total);
        }
        (Some(per_admin), Some(freq), _) => {
            dose.per_admin = Some(per_admin);
            dose.freq = Some(freq);
            dose.total = Some(per_admin * f64::from(freq));
        }
        (Some(per_admin), None, Some(total)) => {
            dose.per_admin = Some(per_admin);
            dose.total = Some(total);
        }
        (Some(per_admin), None, None) => {
            dose.per_admin = Some(per_admin);
            dose.freq = Some(1);
            dose.total = Some(per_admin);
        }
        (None, freq, None) => {
            dose.freq = freq;
        }
    }
    (dose, stated_freq.is_some())
}

/// Parse a free-text prescription. Never fails; unreadable parts stay `None`.
pub fn parse_proposed_dose(text: &str) -> ProposedDose {
    let raw = text.trim();
    if raw.is_empty() {
        return ProposedDose::default();
    }
    let (dose, frequency_stated) = parse_dose_numbers(raw);
    ProposedDose {
        raw: raw.to_string(),
        dose,
        mg_per_kg: parse_mg_per_kg(raw),
        frequency_stated,
    }
}
