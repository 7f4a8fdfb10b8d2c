pub mod document;
pub mod extraction;
pub mod inference;
pub mod patterns;
pub mod profile;
pub mod routes;
pub mod sections;

pub use document::MonographDocument;
pub use extraction::{extract_dosage, trim_outliers};
pub use inference::{infer_route, select_route, RouteSource};
pub use patterns::{is_dose_bearing, mass_doses, MassDose};
pub use profile::{DosageExtraction, DosageProfile, RouteEvidence};
pub use routes::RouteCatalog;
pub use sections::{find_allergen_mentions, AllergenMention, MonographSections};
