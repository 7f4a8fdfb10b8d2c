pub mod classifier;
pub mod parser;
pub mod regimen;

pub use classifier::{classify_dose, compare, Classification, ClassificationRecord};
pub use parser::{normalize_number_words, parse_frequency, parse_mg_per_kg, parse_proposed_dose, ProposedDose};
pub use regimen::{parse_monograph_regimen, select_regimen_sentence};
