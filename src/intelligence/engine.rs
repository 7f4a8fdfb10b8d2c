use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;

use crate::cache::{ExtractionCache, ResultCache};
use crate::config::{lexicon_path, EngineConfig};
use crate::dosing::{classify_dose, parse_monograph_regimen, parse_proposed_dose, select_regimen_sentence};
use crate::fingerprint::assessment_fingerprint;
use crate::models::Severity;
use crate::monograph::{
    extract_dosage, find_allergen_mentions, select_route, DosageExtraction, MonographDocument,
    MonographSections, RouteCatalog,
};
use crate::narrative::{narrative_paragraph, patient_summary};
use crate::polish::{polish_all, polish_or_raw, PassThroughPolisher, TextPolisher};
use crate::report::{ranges_summary, AssessmentReport, MonographRegimen, RouteCase};

use super::allergy::evaluate_allergies;
use super::lexicon::AllergyLexicon;
use super::recommendation::{derive_recommendation, RecommendationInput};
use super::rules::{monograph_duration_days, run_rules, RuleContext};
use super::types::{AlertCounts, AssessmentRequest, SafetyAssessor};

/// Default implementation of the safety assessor.
/// Owns the route catalog, the allergy lexicon, the polisher and both caches.
pub struct DefaultSafetyAssessor {
    pub(crate) catalog: RouteCatalog,
    pub(crate) lexicon: AllergyLexicon,
    pub(crate) polisher: Arc<dyn TextPolisher>,
    pub(crate) results: ResultCache,
    pub(crate) extractions: ExtractionCache,
    pub(crate) config: EngineConfig,
}

impl DefaultSafetyAssessor {
    /// Standard catalog and lexicon, pass-through polishing.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            catalog: RouteCatalog::standard(),
            lexicon: AllergyLexicon::standard(config.class_linking),
            polisher: Arc::new(PassThroughPolisher),
            results: ResultCache::new("results", config.result_cache_capacity),
            extractions: ExtractionCache::new("extractions", config.extraction_cache_capacity),
            config,
        }
    }

    /// Configuration from `DOSEWISE_*` variables and the user's lexicon file
    /// when one exists.
    pub fn from_env() -> Self {
        let config = EngineConfig::from_env();
        let lexicon = AllergyLexicon::load_or_default(&lexicon_path(), config.class_linking);
        Self::new(config).with_lexicon(lexicon)
    }

    pub fn with_polisher(mut self, polisher: Arc<dyn TextPolisher>) -> Self {
        self.polisher = polisher;
        self
    }

    pub fn with_lexicon(mut self, lexicon: AllergyLexicon) -> Self {
        self.lexicon = lexicon;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Normalized monograph, cut to the configured character cap.
    fn document(&self, monograph_text: &str, table_rows: &[String]) -> (MonographDocument, bool) {
        let document = MonographDocument::with_table_rows(monograph_text, table_rows);
        let chars = document.char_count();
        if chars <= self.config.max_monograph_chars {
            return (document, false);
        }
        tracing::warn!(
            chars,
            limit = self.config.max_monograph_chars,
            "Monograph exceeds character cap, truncating"
        );
        (document.truncated(self.config.max_monograph_chars), true)
    }

    /// Dosage evidence for one document, memoized by its fingerprint.
    fn extraction_for(&self, document: &MonographDocument) -> Arc<DosageExtraction> {
        if let Some(hit) = self.extractions.get(document.fingerprint()) {
            tracing::debug!(monograph = %document.fingerprint(), "Extraction cache hit");
            return hit;
        }

        let extraction = Arc::new(extract_dosage(document, &self.catalog));
        tracing::debug!(
            monograph = %document.fingerprint(),
            routes = extraction.profile.routes.len(),
            dose_sentences = extraction.dose_sentences.len(),
            "Dosage evidence extracted"
        );
        if let Err(e) = self
            .extractions
            .insert(document.fingerprint().to_string(), Arc::clone(&extraction))
        {
            tracing::warn!(error = %e, "Could not cache extraction");
        }
        extraction
    }

    /// Full assessment pipeline, uncached.
    fn build_report(
        &self,
        request: &AssessmentRequest,
        document: &MonographDocument,
        truncated: bool,
        fingerprint: String,
    ) -> AssessmentReport {
        let patient = &request.patient;
        let drug = request.drug_name.trim();
        let polisher: &dyn TextPolisher = self.polisher.as_ref();

        let extraction = self.extraction_for(document);
        let profile = &extraction.profile;

        let (route, route_source) =
            select_route(request.route, &request.proposed_dose, profile, &self.catalog);
        let proposed = parse_proposed_dose(&request.proposed_dose);
        let classification = proposed.mg().map(|mg| classify_dose(mg, profile, route));

        let scanned = MonographSections::scan(document);
        let mut alerts = run_rules(&RuleContext {
            drug,
            document,
            profile,
            dose_sentences: &extraction.dose_sentences,
            interaction_lines: &scanned.interactions,
            patient,
            proposed: &proposed,
            digest_size: self.config.digest_size,
        });

        let allergy = evaluate_allergies(
            &patient.reported_allergies(),
            document.text(),
            drug,
            &self.lexicon,
            polisher,
        );
        if let Some(alert) = &allergy.alert {
            alerts.push(alert.clone());
        }
        let allergen_mentions = find_allergen_mentions(document, &patient.allergies);

        let regimen = select_regimen_sentence(document.text()).map(|sentence| MonographRegimen {
            sentence: sentence.to_string(),
            dose: parse_monograph_regimen(sentence),
        });

        let recommendation = derive_recommendation(&RecommendationInput {
            drug,
            route,
            profile,
            proposed: &proposed,
            regimen: regimen.as_ref().map(|r| r.dose).filter(|d| !d.is_empty()),
            alerts: &alerts,
            allergy: &allergy,
            allergen_mentions: &allergen_mentions,
            monograph_days: monograph_duration_days(document, patient.indication()),
            has_weight: patient.weight().is_some(),
        });

        let route_cases = profile
            .routes
            .values()
            .map(|evidence| RouteCase::from_evidence(evidence, polish_all(polisher, &evidence.sentences)))
            .collect();

        let summary = patient_summary(patient, drug, &request.proposed_dose, route, &self.catalog);
        let narrative = narrative_paragraph(
            &summary,
            &recommendation.primary,
            &recommendation.filtered_bullets,
        );
        let primary_polished = polish_or_raw(polisher, &recommendation.primary);

        let overall_severity = alerts
            .iter()
            .map(|a| a.severity)
            .chain(classification.as_ref().map(|c| c.level))
            .fold(recommendation.status.as_severity(), Severity::combine);

        AssessmentReport {
            id: AssessmentReport::id_for(&fingerprint),
            fingerprint,
            monograph_fingerprint: document.fingerprint().to_string(),
            generated_at: Utc::now(),
            drug: drug.to_string(),
            route,
            route_source,
            route_cases,
            profile: profile.clone(),
            classification,
            dose_summary: extraction
                .dose_sentences
                .iter()
                .take(self.config.dose_summary_size)
                .cloned()
                .collect(),
            alert_counts: AlertCounts::tally(&alerts),
            alerts,
            allergy,
            allergen_mentions,
            primary_polished,
            recommendation,
            sections: scanned.limited(self.config.section_line_limit),
            proposed,
            regimen,
            ranges_summary: ranges_summary(profile, route),
            patient_summary: summary,
            narrative,
            overall_severity,
            truncated,
        }
    }
}

impl Default for DefaultSafetyAssessor {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl SafetyAssessor for DefaultSafetyAssessor {
    fn assess(&self, request: &AssessmentRequest) -> Arc<AssessmentReport> {
        let start = Instant::now();
        let (document, truncated) = self.document(&request.monograph_text, &request.table_rows);
        let fingerprint = assessment_fingerprint(
            document.fingerprint(),
            &request.patient,
            &request.drug_name,
            &request.proposed_dose,
            request.route,
        );

        if let Some(hit) = self.results.get(&fingerprint) {
            tracing::debug!(fingerprint = %fingerprint, "Assessment cache hit");
            return hit;
        }
        tracing::debug!(fingerprint = %fingerprint, "Assessment cache miss");

        let report = Arc::new(self.build_report(request, &document, truncated, fingerprint.clone()));
        match self.results.insert(fingerprint.clone(), Arc::clone(&report)) {
            Ok(Some(evicted)) => tracing::debug!(evicted = %evicted, "Evicted least recently used assessment"),
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Could not cache assessment"),
        }

        let processing_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            fingerprint = %fingerprint,
            route = %report.route,
            status = %report.recommendation.status,
            alerts = report.alert_counts.total(),
            processing_ms,
            "Dosage assessment complete"
        );
        report
    }

    fn extract(&self, monograph_text: &str, table_rows: &[String]) -> Arc<DosageExtraction> {
        let (document, _) = self.document(monograph_text, table_rows);
        self.extraction_for(&document)
    }
}
