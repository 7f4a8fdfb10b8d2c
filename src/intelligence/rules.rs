//! Independent alert rules. Each rule reads the shared context and returns
//! zero or more alerts; rules never see each other's output.

use crate::dosing::ProposedDose;
use crate::models::{AlertCategory, PatientProfile, Severity};
use crate::monograph::patterns::{mass_doses, RE_DURATION_DAYS, RE_MAX};
use crate::monograph::{DosageProfile, MonographDocument};

use super::messages::MessageTemplates;
use super::types::Alert;

/// Inputs shared by every rule.
pub struct RuleContext<'a> {
    pub drug: &'a str,
    pub document: &'a MonographDocument,
    pub profile: &'a DosageProfile,
    pub dose_sentences: &'a [String],
    /// Lowercased monograph interaction lines.
    pub interaction_lines: &'a [String],
    pub patient: &'a PatientProfile,
    pub proposed: &'a ProposedDose,
    /// How many dose sentences the evidence digest carries.
    pub digest_size: usize,
}

/// Kidney function below this (mL/min) calls for interval or dose adjustment.
const LOW_CLEARANCE_ML_MIN: f64 = 30.0;

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Compare a mg/kg/day proposal (stated, or derived from the regimen and
/// the patient's weight) against the monograph's weight-based range.
pub fn detect_weight_based(ctx: &RuleContext) -> Vec<Alert> {
    let Some((min, max)) = ctx.profile.weight_range() else {
        return Vec::new();
    };
    let caution = |text: String| vec![Alert::new(AlertCategory::WeightBasedDose, Severity::Caution, text)];
    let info = |text: String| vec![Alert::new(AlertCategory::WeightBasedDose, Severity::Info, text)];

    if let Some(stated) = ctx.proposed.mg_per_kg {
        return if stated < min {
            caution(MessageTemplates::weight_prescribed_below(ctx.drug, stated, min, max))
        } else if stated > max {
            caution(MessageTemplates::weight_prescribed_above(ctx.drug, stated, max))
        } else {
            Vec::new()
        };
    }

    let Some(weight) = ctx.patient.weight() else {
        return info(MessageTemplates::weight_not_provided(ctx.drug, min, max));
    };

    let dose = &ctx.proposed.dose;
    match (ctx.proposed.frequency_stated, dose.per_admin, dose.freq) {
        (true, Some(per_admin), Some(freq)) => {
            let derived = per_admin * f64::from(freq) / weight;
            if derived < min {
                caution(MessageTemplates::weight_calculated_below(
                    ctx.drug, derived, weight, per_admin, freq, min, max,
                ))
            } else if derived > max {
                caution(MessageTemplates::weight_calculated_above(
                    ctx.drug, derived, weight, per_admin, freq, max,
                ))
            } else {
                Vec::new()
            }
        }
        _ => info(MessageTemplates::weight_unvalidated(ctx.drug, weight, min, max)),
    }
}

pub fn detect_absolute_dose(ctx: &RuleContext) -> Vec<Alert> {
    ctx.proposed
        .mg()
        .map(|mg| Alert::new(AlertCategory::DrugDose, Severity::Info, MessageTemplates::absolute_dose(mg)))
        .into_iter()
        .collect()
}

/// Largest amount stated on any "maximum" / "do not exceed" line.
pub fn labeled_maximum(document: &MonographDocument) -> Option<f64> {
    document
        .lines()
        .filter(|line| RE_MAX.is_match(line))
        .flat_map(mass_doses)
        .map(|d| d.mg)
        .reduce(f64::max)
}

pub fn detect_maximum_dose(ctx: &RuleContext) -> Vec<Alert> {
    let (Some(mg), Some(maximum)) = (ctx.proposed.mg(), labeled_maximum(ctx.document)) else {
        return Vec::new();
    };
    if mg > maximum {
        vec![Alert::new(
            AlertCategory::MaximumDose,
            Severity::Caution,
            MessageTemplates::maximum_exceeded(ctx.drug, mg, maximum),
        )]
    } else {
        Vec::new()
    }
}

/// Day count from the first monograph line that mentions days (and the
/// indication, when one is given).
pub fn monograph_duration_days(document: &MonographDocument, indication: Option<&str>) -> Option<u32> {
    let indication = indication.map(str::to_lowercase);
    document
        .lines()
        .map(str::to_lowercase)
        .filter(|line| line.contains("day"))
        .filter(|line| indication.as_deref().map_or(true, |i| line.contains(i)))
        .find_map(|line| {
            RE_DURATION_DAYS
                .captures(&line)
                .and_then(|caps| caps[1].parse::<u32>().ok())
        })
        .filter(|days| *days > 0)
}

pub fn detect_duration(ctx: &RuleContext) -> Vec<Alert> {
    let Some(days) = ctx.patient.duration_days else {
        return Vec::new();
    };
    let indication = ctx.patient.indication();
    match monograph_duration_days(ctx.document, indication) {
        Some(monograph_days) if monograph_days != days => vec![Alert::new(
            AlertCategory::Duration,
            Severity::Caution,
            MessageTemplates::duration_mismatch(days, indication, monograph_days),
        )],
        _ => Vec::new(),
    }
}

pub fn detect_age_missing(ctx: &RuleContext) -> Vec<Alert> {
    if ctx.patient.age.is_some() {
        return Vec::new();
    }
    vec![Alert::new(
        AlertCategory::AgeGroup,
        Severity::Info,
        MessageTemplates::age_missing(ctx.drug),
    )]
}

/// eGFR is preferred over CrCl when both are present.
pub fn detect_renal(ctx: &RuleContext) -> Vec<Alert> {
    let patient = ctx.patient;
    match patient.kidney_metric() {
        None if patient.renal_impairment => vec![Alert::new(
            AlertCategory::RenalCondition,
            Severity::Info,
            MessageTemplates::renal_labs_missing(ctx.drug),
        )],
        Some(metric) if metric < LOW_CLEARANCE_ML_MIN => match ctx.proposed.mg() {
            Some(mg) => vec![Alert::new(
                AlertCategory::RenalLabs,
                Severity::Caution,
                MessageTemplates::renal_low_clearance(ctx.drug, metric, mg),
            )],
            None => Vec::new(),
        },
        _ => Vec::new(),
    }
}

pub fn detect_hepatic(ctx: &RuleContext) -> Vec<Alert> {
    if !ctx.patient.hepatic_impairment {
        return Vec::new();
    }
    vec![Alert::new(
        AlertCategory::HepaticCondition,
        Severity::Caution,
        MessageTemplates::hepatic(ctx.drug),
    )]
}

pub fn detect_pregnancy(ctx: &RuleContext) -> Vec<Alert> {
    if !ctx.patient.pregnant {
        return Vec::new();
    }
    vec![Alert::new(
        AlertCategory::Pregnancy,
        Severity::Caution,
        MessageTemplates::pregnancy(ctx.drug),
    )]
}

/// One alert per current medication named in an interaction line.
pub fn detect_interactions(ctx: &RuleContext) -> Vec<Alert> {
    ctx.patient
        .medications()
        .into_iter()
        .filter_map(|medication| {
            let needle = medication.to_lowercase();
            let line = ctx.interaction_lines.iter().find(|l| l.contains(&needle))?;
            Some(Alert::new(
                AlertCategory::Interaction,
                Severity::Caution,
                MessageTemplates::interaction(medication, line),
            ))
        })
        .collect()
}

/// The first few dose-bearing sentences, verbatim.
pub fn evidence_digest(ctx: &RuleContext) -> Vec<Alert> {
    Alert::with_annotations(
        AlertCategory::DrugDose,
        Severity::Info,
        ctx.dose_sentences.iter().take(ctx.digest_size).cloned(),
    )
    .into_iter()
    .collect()
}

/// Run every rule and collect the alerts in a fixed order.
pub fn run_rules(ctx: &RuleContext) -> Vec<Alert> {
    detect_weight_based(ctx)
        .into_iter()
        .chain(detect_absolute_dose(ctx))
        .chain(detect_maximum_dose(ctx))
        .chain(detect_duration(ctx))
        .chain(detect_age_missing(ctx))
        .chain(detect_renal(ctx))
        .chain(detect_hepatic(ctx))
        .chain(detect_pregnancy(ctx))
        .chain(detect_interactions(ctx))
        .chain(evidence_digest(ctx))
        .collect()
}
