use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::ClassLinking;

static RE_TOKEN_NOISE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9\s\-]+").unwrap());
static RE_TOKEN_SPLIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s,;/]+").unwrap());
static RE_NON_ALNUM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

#[derive(Error, Debug)]
pub enum LexiconError {
    #[error("Lexicon read failed ({0}): {1}")]
    Read(String, String),

    #[error("Lexicon parse failed ({0}): {1}")]
    Parse(String, String),

    #[error("Lexicon has no synonym groups: {0}")]
    Empty(String),
}

/// On-disk lexicon layout: `{"synonyms": {key: [terms]}, "classes": {key: [members]}}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct LexiconFile {
    synonyms: BTreeMap<String, Vec<String>>,
    classes: BTreeMap<String, Vec<String>>,
}

/// Allergy synonym groups and drug-class membership.
///
/// Immutable once built. Synonym groups expand a token to its whole group;
/// class membership links a drug to its class key only when class linking
/// is enabled.
#[derive(Debug, Clone, PartialEq)]
pub struct AllergyLexicon {
    synonyms: BTreeMap<String, BTreeSet<String>>,
    classes: BTreeMap<String, BTreeSet<String>>,
    linking: ClassLinking,
}

const STANDARD_SYNONYMS: &[(&str, &[&str])] = &[
    (
        "nsaid",
        &["nsaid", "nsaids", "nonsteroidal anti-inflammatory", "nonsteroidal anti inflammatory"],
    ),
    ("aspirin", &["aspirin", "asa", "acetylsalicylic acid"]),
    ("diclofenac", &["diclofenac", "voltaren"]),
    ("ibuprofen", &["ibuprofen", "motrin", "advil"]),
    ("naproxen", &["naproxen", "aleve"]),
    ("cox-2", &["cox-2", "cox2", "celecoxib"]),
    ("celecoxib", &["celecoxib", "celebrex", "cox-2", "cox2"]),
    ("penicillin", &["penicillin", "penicillins", "pcn"]),
    ("cephalosporin", &["cephalosporin", "cephalosporins", "cef-"]),
    ("sulfa", &["sulfa", "sulfonamide", "sulfonamides"]),
    ("peanut", &["peanut", "arachis"]),
    ("soy", &["soy", "soya", "soybean"]),
    ("lactose", &["lactose"]),
    ("shellfish", &["shellfish"]),
];

const STANDARD_CLASSES: &[(&str, &[&str])] = &[
    (
        "penicillin",
        &[
            "amoxicillin",
            "ampicillin",
            "piperacillin",
            "oxacillin",
            "nafcillin",
            "dicloxacillin",
            "flucloxacillin",
        ],
    ),
    (
        "cephalosporin",
        &[
            "cephalexin",
            "cefazolin",
            "ceftriaxone",
            "cefuroxime",
            "cefixime",
            "cefpodoxime",
            "ceftazidime",
        ],
    ),
    (
        "sulfa",
        &[
            "sulfamethoxazole",
            "sulfasalazine",
            "sulfadiazine",
            "trimethoprim-sulfamethoxazole",
            "sulfisoxazole",
        ],
    ),
    (
        "nsaid",
        &[
            "ibuprofen",
            "naproxen",
            "diclofenac",
            "indomethacin",
            "piroxicam",
            "meloxicam",
            "celecoxib",
            "aspirin",
        ],
    ),
];

fn to_table(entries: &[(&str, &[&str])]) -> BTreeMap<String, BTreeSet<String>> {
    entries
        .iter()
        .map(|(key, terms)| {
            (
                key.to_string(),
                terms.iter().map(|t| t.to_string()).collect(),
            )
        })
        .collect()
}

fn lowercase_table(table: BTreeMap<String, Vec<String>>) -> BTreeMap<String, BTreeSet<String>> {
    table
        .into_iter()
        .map(|(key, terms)| {
            (
                key.trim().to_lowercase(),
                terms.iter().map(|t| t.trim().to_lowercase()).filter(|t| !t.is_empty()).collect(),
            )
        })
        .filter(|(key, _)| !key.is_empty())
        .collect()
}

impl AllergyLexicon {
    /// Built-in table: NSAIDs, aspirin, named NSAIDs, beta-lactams,
    /// sulfonamides and common excipients.
    pub fn standard(linking: ClassLinking) -> Self {
        Self {
            synonyms: to_table(STANDARD_SYNONYMS),
            classes: to_table(STANDARD_CLASSES),
            linking,
        }
    }

    /// Load a lexicon from a JSON file.
    pub fn load(path: &Path, linking: ClassLinking) -> Result<Self, LexiconError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| LexiconError::Read(path.display().to_string(), e.to_string()))?;
        let file: LexiconFile = serde_json::from_str(&raw)
            .map_err(|e| LexiconError::Parse(path.display().to_string(), e.to_string()))?;
        if file.synonyms.is_empty() {
            return Err(LexiconError::Empty(path.display().to_string()));
        }
        Ok(Self {
            synonyms: lowercase_table(file.synonyms),
            classes: lowercase_table(file.classes),
            linking,
        })
    }

    /// Load from `path` when it exists, otherwise (or on any error) use the
    /// standard table.
    pub fn load_or_default(path: &Path, linking: ClassLinking) -> Self {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No lexicon file, using standard table");
            return Self::standard(linking);
        }
        match Self::load(path, linking) {
            Ok(lexicon) => {
                tracing::info!(
                    path = %path.display(),
                    groups = lexicon.synonyms.len(),
                    classes = lexicon.classes.len(),
                    "Allergy lexicon loaded"
                );
                lexicon
            }
            Err(e) => {
                tracing::warn!(error = %e, "Falling back to standard allergy lexicon");
                Self::standard(linking)
            }
        }
    }

    pub fn linking(&self) -> ClassLinking {
        self.linking
    }

    /// Terms of one synonym group.
    pub fn terms(&self, key: &str) -> Option<&BTreeSet<String>> {
        self.synonyms.get(key)
    }

    /// Add class keys (when linking is enabled), then every synonym group
    /// that overlaps the tokens.
    pub fn expand(&self, tokens: &BTreeSet<String>) -> BTreeSet<String> {
        self.expand_with(tokens, &[])
    }

    /// Like `expand`, but multi-word terms ("acetylsalicylic acid") also
    /// match when they appear as whole words inside one of `phrases`.
    fn expand_with(&self, tokens: &BTreeSet<String>, phrases: &[String]) -> BTreeSet<String> {
        let mentions = |term: &str, set: &BTreeSet<String>| {
            set.contains(term)
                || (term.contains(' ') && phrases.iter().any(|p| contains_phrase(p, term)))
        };

        let mut seed = tokens.clone();
        if self.linking == ClassLinking::Enabled {
            for (class, members) in &self.classes {
                if members.iter().any(|m| mentions(m.as_str(), tokens)) {
                    seed.insert(class.clone());
                }
            }
        }

        let mut out = seed.clone();
        for (key, terms) in &self.synonyms {
            if seed.contains(key) || terms.iter().any(|t| mentions(t.as_str(), &seed)) {
                out.insert(key.clone());
                out.extend(terms.iter().filter(|t| !t.contains(' ')).cloned());
            }
        }
        out
    }

    /// Expanded tokens of one or more allergy strings.
    pub fn allergy_tokens<S: AsRef<str>>(&self, allergies: &[S]) -> BTreeSet<String> {
        self.expand_with(&tokenize(allergies), &phrases(allergies))
    }

    /// Expanded tokens of a drug name, plus its compact alphanumeric form
    /// ("acetylsalicylic acid" also yields "acetylsalicylicacid").
    pub fn drug_tokens(&self, drug_name: &str) -> BTreeSet<String> {
        let mut tokens = self.expand_with(&tokenize(&[drug_name]), &phrases(&[drug_name]));
        let compact = RE_NON_ALNUM.replace_all(&drug_name.to_lowercase(), "").into_owned();
        if !compact.is_empty() {
            tokens.insert(compact);
        }
        tokens
    }
}

/// Salt, counter-ion and form words. They never identify a drug or an
/// allergen on their own.
const NON_IDENTIFYING_WORDS: &[&str] = &[
    "acid",
    "sodium",
    "potassium",
    "calcium",
    "magnesium",
    "hydrochloride",
    "hcl",
    "sulfate",
    "phosphate",
    "citrate",
    "acetate",
    "maleate",
    "mesylate",
    "succinate",
    "tartrate",
    "monohydrate",
    "trihydrate",
];

/// Lowercased words of one item, punctuation other than hyphens removed.
fn words(item: &str) -> Vec<String> {
    let cleaned = RE_TOKEN_NOISE.replace_all(&item.to_lowercase(), " ").into_owned();
    RE_TOKEN_SPLIT
        .split(cleaned.trim())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Single-word tokens of every item, without salt and form words.
pub fn tokenize<S: AsRef<str>>(items: &[S]) -> BTreeSet<String> {
    items
        .iter()
        .flat_map(|item| words(item.as_ref()))
        .filter(|t| !NON_IDENTIFYING_WORDS.contains(&t.as_str()))
        .collect()
}

/// Each item as one space-joined phrase.
fn phrases<S: AsRef<str>>(items: &[S]) -> Vec<String> {
    items
        .iter()
        .map(|item| words(item.as_ref()).join(" "))
        .filter(|p| !p.is_empty())
        .collect()
}

/// `term` occurs in `phrase` on word boundaries.
fn contains_phrase(phrase: &str, term: &str) -> bool {
    let term = words(term).join(" ");
    !term.is_empty() && format!(" {} ", phrase).contains(&format!(" {} ", term))
}
