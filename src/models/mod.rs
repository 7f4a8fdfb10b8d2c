pub mod dose;
pub mod enums;
pub mod patient;

pub use dose::ParsedDose;
pub use enums::{
    AlertCategory, ClassLinking, DoseComparison, ParseEnumError, RecommendationStatus, Route,
    Severity,
};
pub use patient::PatientProfile;
