use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Unknown string for a string-keyed enum.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid {field} value: {value}")]
pub struct ParseEnumError {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// Serde goes through the same string keys.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ParseEnumError {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

// Declaration order is the tie-break priority used by route inference.
str_enum!(Route {
    Oral => "Oral",
    Intravenous => "Intravenous",
    Intramuscular => "Intramuscular",
    Subcutaneous => "Subcutaneous",
    Rectal => "Rectal",
    Topical => "Topical",
    Transdermal => "Transdermal",
    Sublingual => "Sublingual",
    Buccal => "Buccal",
    Vaginal => "Vaginal",
    Inhalation => "Inhalation",
    Nasal => "Nasal",
    Ophthalmic => "Ophthalmic",
    Otic => "Otic",
    Intradermal => "Intradermal",
    Intrathecal => "Intrathecal",
    Epidural => "Epidural",
    Unspecified => "Unspecified",
});

str_enum!(Severity {
    Info => "info",
    Caution => "caution",
    Danger => "danger",
});

impl Default for Severity {
    fn default() -> Self {
        Severity::Info
    }
}

impl Severity {
    /// Escalate to the higher of two findings. Never downgrades.
    pub fn combine(self, other: Severity) -> Severity {
        self.max(other)
    }
}

str_enum!(RecommendationStatus {
    Safe => "safe",
    Caution => "caution",
    Danger => "danger",
});

impl RecommendationStatus {
    pub fn as_severity(&self) -> Severity {
        match self {
            Self::Safe => Severity::Info,
            Self::Caution => Severity::Caution,
            Self::Danger => Severity::Danger,
        }
    }
}

str_enum!(AlertCategory {
    WeightBasedDose => "weight_based_dose",
    DrugDose => "drug_dose",
    MaximumDose => "maximum_dose",
    Duration => "duration",
    AgeGroup => "age_group",
    RenalCondition => "renal_condition",
    RenalLabs => "renal_labs",
    HepaticCondition => "hepatic_condition",
    Pregnancy => "pregnancy",
    Allergy => "allergy",
    Interaction => "interaction",
});

impl AlertCategory {
    /// Human-facing heading for the alert table.
    pub fn label(&self) -> &'static str {
        match self {
            Self::WeightBasedDose => "Low dose/high dose based on dose range",
            Self::DrugDose => "Dose alert based on drug",
            Self::MaximumDose => "Maximum dose alert",
            Self::Duration => "Duration alert",
            Self::AgeGroup => "Age group dose alert (pediatrics, adults, geriatrics)",
            Self::RenalCondition => "Renal dose alert based on health condition",
            Self::RenalLabs => "Renal dose alert based on lab values (eGFR, CrCl, serum creatinine)",
            Self::HepaticCondition => "Hepatic dose alert based on health condition",
            Self::Pregnancy => "Pregnancy dose alert",
            Self::Allergy => "Allergy alert",
            Self::Interaction => "Drug interaction alert",
        }
    }
}

str_enum!(DoseComparison {
    Below => "below",
    Within => "within",
    Above => "above",
});

str_enum!(ClassLinking {
    Enabled => "enabled",
    Disabled => "disabled",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_orders_info_caution_danger() {
        assert!(Severity::Info < Severity::Caution);
        assert!(Severity::Caution < Severity::Danger);
    }

    #[test]
    fn combine_never_downgrades() {
        let all = [Severity::Info, Severity::Caution, Severity::Danger];
        for a in all {
            for b in all {
                let c = a.combine(b);
                assert!(c >= a && c >= b);
                assert!(c == a || c == b);
            }
        }
    }

    #[test]
    fn route_round_trips_through_str() {
        for route in [Route::Oral, Route::Intrathecal, Route::Unspecified] {
            assert_eq!(route.as_str().parse::<Route>().unwrap(), route);
        }
    }

    #[test]
    fn unknown_value_reports_field() {
        let err = "sometimes".parse::<Severity>().unwrap_err();
        assert_eq!(err.field, "Severity");
        assert_eq!(err.value, "sometimes");
    }

    #[test]
    fn serde_uses_string_keys() {
        let json = serde_json::to_string(&AlertCategory::RenalLabs).unwrap();
        assert_eq!(json, "\"renal_labs\"");
        let back: RecommendationStatus = serde_json::from_str("\"danger\"").unwrap();
        assert_eq!(back, RecommendationStatus::Danger);
    }

    #[test]
    fn status_maps_to_severity() {
        assert_eq!(RecommendationStatus::Safe.as_severity(), Severity::Info);
        assert_eq!(RecommendationStatus::Danger.as_severity(), Severity::Danger);
    }
}
