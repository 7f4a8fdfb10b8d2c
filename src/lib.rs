pub mod cache;
pub mod config;
pub mod dosing;
pub mod fingerprint;
pub mod intelligence;
pub mod models;
pub mod monograph;
pub mod narrative;
pub mod polish;
pub mod report;

use tracing_subscriber::EnvFilter;

pub use config::EngineConfig;
pub use intelligence::{AssessmentRequest, DefaultSafetyAssessor, SafetyAssessor};
pub use models::{PatientProfile, RecommendationStatus, Route, Severity};
pub use report::AssessmentReport;

/// Install the fmt subscriber. `RUST_LOG` wins over the default filter.
/// A second call is a no-op.
pub fn init_tracing() {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("{} v{} logging initialized", config::APP_NAME, config::APP_VERSION);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_tracing_twice_is_harmless() {
        init_tracing();
        init_tracing();
    }
}
