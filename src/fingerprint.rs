use base64::Engine;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::models::{PatientProfile, Route};

/// SHA-256 of `content`, base64 encoded.
pub fn content_hash(content: &[u8]) -> String {
    let hash = Sha256::digest(content);
    base64::engine::general_purpose::STANDARD.encode(hash)
}

/// Every input that can change an assessment's outcome.
#[derive(Serialize)]
struct FingerprintKey<'a> {
    monograph_sha256: &'a str,
    patient: &'a PatientProfile,
    drug_name: &'a str,
    proposed_dose: &'a str,
    route: Option<Route>,
}

/// Deterministic cache key for one assessment request.
///
/// Field order in the serialized key is fixed by the struct, so identical
/// inputs always hash identically.
pub fn assessment_fingerprint(
    monograph_sha256: &str,
    patient: &PatientProfile,
    drug_name: &str,
    proposed_dose: &str,
    route: Option<Route>,
) -> String {
    let key = FingerprintKey {
        monograph_sha256,
        patient,
        drug_name: drug_name.trim(),
        proposed_dose: proposed_dose.trim(),
        route,
    };
    // Plain data with string keys; serialization cannot fail.
    let canonical = serde_json::to_vec(&key).unwrap_or_default();
    content_hash(&canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_is_stable() {
        let a = content_hash(b"Recommended dose: 500 mg");
        let b = content_hash(b"Recommended dose: 500 mg");
        assert_eq!(a, b);
        assert_eq!(a.len(), 44);
        assert_ne!(a, content_hash(b"Recommended dose: 250 mg"));
    }

    #[test]
    fn identical_requests_fingerprint_identically() {
        let patient = PatientProfile {
            age: Some(40),
            allergies: vec!["sulfa".into()],
            ..Default::default()
        };
        let a = assessment_fingerprint("abc", &patient, "Ibuprofen", "400 mg", None);
        let b = assessment_fingerprint("abc", &patient.clone(), "Ibuprofen", "400 mg", None);
        assert_eq!(a, b);
    }

    #[test]
    fn any_field_changes_the_fingerprint() {
        let patient = PatientProfile::default();
        let base = assessment_fingerprint("abc", &patient, "Ibuprofen", "400 mg", None);

        let older = PatientProfile {
            age: Some(80),
            ..Default::default()
        };
        assert_ne!(
            base,
            assessment_fingerprint("abc", &older, "Ibuprofen", "400 mg", None)
        );
        assert_ne!(
            base,
            assessment_fingerprint("abd", &patient, "Ibuprofen", "400 mg", None)
        );
        assert_ne!(
            base,
            assessment_fingerprint("abc", &patient, "Naproxen", "400 mg", None)
        );
        assert_ne!(
            base,
            assessment_fingerprint("abc", &patient, "Ibuprofen", "600 mg", None)
        );
        assert_ne!(
            base,
            assessment_fingerprint("abc", &patient, "Ibuprofen", "400 mg", Some(Route::Oral))
        );
    }
}
