pub mod allergy;
pub mod engine;
pub mod lexicon;
pub mod messages;
pub mod recommendation;
pub mod rules;
pub mod status;
pub mod types;

pub use allergy::{evaluate_allergies, AllergyAssessment, AllergySignals};
pub use engine::DefaultSafetyAssessor;
pub use lexicon::{AllergyLexicon, LexiconError};
pub use messages::MessageTemplates;
pub use recommendation::{derive_recommendation, RangeReference, RecommendationInput, RecommendationResult};
pub use rules::{run_rules, RuleContext};
pub use status::{classify_status, StatusDecision, StatusSource};
pub use types::{Alert, AlertCounts, AssessmentRequest, SafetyAssessor};
