use std::path::PathBuf;
use std::str::FromStr;

use crate::models::ClassLinking;

/// Application-level constants
pub const APP_NAME: &str = "dosewise";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prefix of every environment override.
pub const ENV_PREFIX: &str = "DOSEWISE_";

/// Log filter used when `RUST_LOG` is unset or invalid.
pub fn default_log_filter() -> &'static str {
    "dosewise=info"
}

/// Application data directory: ~/.dosewise/
/// Falls back to the working directory when no home directory is known.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(format!(".{}", APP_NAME))
}

/// Optional allergy lexicon override.
pub fn lexicon_path() -> PathBuf {
    app_data_dir().join("allergy_lexicon.json")
}

/// Engine tuning. Every field can be overridden from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub result_cache_capacity: usize,
    pub extraction_cache_capacity: usize,
    /// Longer monographs are truncated before extraction.
    pub max_monograph_chars: usize,
    /// Dose sentences quoted in the evidence digest alert.
    pub digest_size: usize,
    /// Dose sentences listed in the report's dose summary.
    pub dose_summary_size: usize,
    /// Lines kept per monograph section in the report.
    pub section_line_limit: usize,
    pub class_linking: ClassLinking,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            result_cache_capacity: 64,
            extraction_cache_capacity: 16,
            max_monograph_chars: 200_000,
            digest_size: 3,
            dose_summary_size: 5,
            section_line_limit: 6,
            class_linking: ClassLinking::Disabled,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `DOSEWISE_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each
    /// `DOSEWISE_*` key. Unparseable values are logged and ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        override_with(&lookup, "RESULT_CACHE_CAPACITY", &mut config.result_cache_capacity);
        override_with(&lookup, "EXTRACTION_CACHE_CAPACITY", &mut config.extraction_cache_capacity);
        override_with(&lookup, "MAX_MONOGRAPH_CHARS", &mut config.max_monograph_chars);
        override_with(&lookup, "DIGEST_SIZE", &mut config.digest_size);
        override_with(&lookup, "DOSE_SUMMARY_SIZE", &mut config.dose_summary_size);
        override_with(&lookup, "SECTION_LINE_LIMIT", &mut config.section_line_limit);
        override_with(&lookup, "CLASS_LINKING", &mut config.class_linking);
        config
    }
}

fn override_with<F, T>(lookup: &F, name: &str, slot: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let key = format!("{}{}", ENV_PREFIX, name);
    let Some(raw) = lookup(&key) else {
        return;
    };
    match raw.trim().parse::<T>() {
        Ok(value) => *slot = value,
        Err(_) => tracing::warn!(key = %key, value = %raw, "Ignoring unparseable setting"),
    }
}
