//! Optional wording pass over finished statements.
//!
//! A polisher only rewrites text for presentation. Alerts and status are
//! always computed from the raw text; a failed or empty rewrite falls back
//! to the raw statement.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Prompt echoes some rewriters prepend to their output.
static RE_ECHO_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(?:rewrite|statement|text)[:\-–]\s*").unwrap());
static RE_UNIT_SPACING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d)\s*(mg|mcg|g|mL)\b").unwrap());
static RE_MULTI_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" {2,}").unwrap());

#[derive(Error, Debug)]
pub enum PolishError {
    #[error("Polisher unavailable: {0}")]
    Unavailable(String),

    #[error("Polisher failed: {0}")]
    Failed(String),
}

/// Rewrites one statement for clinician-facing display.
pub trait TextPolisher: Send + Sync {
    fn polish(&self, text: &str) -> Result<String, PolishError>;
}

/// Returns the text unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThroughPolisher;

impl TextPolisher for PassThroughPolisher {
    fn polish(&self, text: &str) -> Result<String, PolishError> {
        Ok(text.to_string())
    }
}

/// Deterministic tidy-up: one space between amount and unit, no double spaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitSpacingPolisher;

impl TextPolisher for UnitSpacingPolisher {
    fn polish(&self, text: &str) -> Result<String, PolishError> {
        let spaced = RE_UNIT_SPACING.replace_all(text, "$1 $2");
        Ok(RE_MULTI_SPACE.replace_all(spaced.trim(), " ").into_owned())
    }
}

/// Polish `text`, keeping the raw statement when the polisher fails or
/// returns nothing usable.
pub fn polish_or_raw(polisher: &dyn TextPolisher, text: &str) -> String {
    if text.trim().is_empty() {
        return text.to_string();
    }
    match polisher.polish(text) {
        Ok(out) => {
            let cleaned = RE_ECHO_PREFIX.replace(out.trim(), "");
            if cleaned.trim().is_empty() {
                text.to_string()
            } else {
                cleaned.trim().to_string()
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Polish failed, keeping raw text");
            text.to_string()
        }
    }
}

/// Polish every non-empty line. Falls back to the raw list when nothing
/// survives.
pub fn polish_all(polisher: &dyn TextPolisher, lines: &[String]) -> Vec<String> {
    let polished: Vec<String> = lines
        .iter()
        .filter(|l| !l.is_empty())
        .map(|l| polish_or_raw(polisher, l))
        .collect();
    if polished.iter().all(|l| l.is_empty()) {
        lines.to_vec()
    } else {
        polished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedPolisher(&'static str);

    impl TextPolisher for FixedPolisher {
        fn polish(&self, _text: &str) -> Result<String, PolishError> {
            Ok(self.0.to_string())
        }
    }

    struct FailingPolisher;

    impl TextPolisher for FailingPolisher {
        fn polish(&self, _text: &str) -> Result<String, PolishError> {
            Err(PolishError::Unavailable("model not loaded".into()))
        }
    }

    #[test]
    fn pass_through_keeps_text() {
        assert_eq!(polish_or_raw(&PassThroughPolisher, "Give 500 mg."), "Give 500 mg.");
    }

    #[test]
    fn unit_spacing_is_normalized() {
        assert_eq!(
            polish_or_raw(&UnitSpacingPolisher, "Give 500mg  then 2g or 5 mL."),
            "Give 500 mg then 2 g or 5 mL."
        );
    }

    #[test]
    fn echoed_prefix_is_stripped() {
        let polisher = FixedPolisher("Rewrite: Reduce the dose.");
        assert_eq!(polish_or_raw(&polisher, "reduce dose"), "Reduce the dose.");
    }

    #[test]
    fn empty_output_falls_back_to_raw() {
        let polisher = FixedPolisher("TEXT:   ");
        assert_eq!(polish_or_raw(&polisher, "Keep me."), "Keep me.");
    }

    #[test]
    fn failure_falls_back_to_raw() {
        assert_eq!(polish_or_raw(&FailingPolisher, "Keep me."), "Keep me.");
        assert_eq!(
            polish_all(&FailingPolisher, &["a".to_string(), String::new()]),
            vec!["a".to_string()]
        );
    }
}
