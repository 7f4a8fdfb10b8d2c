use serde::{Deserialize, Serialize};

/// A dosing statement reduced to numbers.
///
/// Used both for the prescriber's proposed dose and for the regimen parsed
/// out of a monograph sentence. All amounts are in mg.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsedDose {
    /// Amount given per administration.
    pub per_admin: Option<f64>,
    /// Administrations per day.
    pub freq: Option<u32>,
    /// Total per day.
    pub total: Option<f64>,
    pub total_min: Option<f64>,
    pub total_max: Option<f64>,
    /// The totals above are daily amounts stated by the text itself.
    pub range_is_daily: bool,
}

impl ParsedDose {
    pub fn is_empty(&self) -> bool {
        self.per_admin.is_none()
            && self.freq.is_none()
            && self.total.is_none()
            && self.total_min.is_none()
            && self.total_max.is_none()
    }

    /// Daily range in mg/day: an explicit min–max first, then a stated
    /// daily total, then per-administration × frequency.
    pub fn daily_range(&self) -> Option<(f64, f64)> {
        if let (Some(lo), Some(hi)) = (self.total_min, self.total_max) {
            return Some((lo.min(hi), lo.max(hi)));
        }
        if self.range_is_daily {
            if let Some(total) = self.total {
                return Some((total, total));
            }
        }
        match (self.per_admin, self.freq) {
            (Some(per_admin), Some(freq)) => {
                let total = per_admin * f64::from(freq);
                Some((total, total))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_by_default() {
        assert!(ParsedDose::default().is_empty());
        assert_eq!(ParsedDose::default().daily_range(), None);
    }

    #[test]
    fn explicit_range_wins() {
        let dose = ParsedDose {
            total: Some(300.0),
            total_min: Some(150.0),
            total_max: Some(200.0),
            range_is_daily: true,
            ..Default::default()
        };
        assert_eq!(dose.daily_range(), Some((150.0, 200.0)));
    }

    #[test]
    fn daily_total_used_when_flagged() {
        let dose = ParsedDose {
            total: Some(450.0),
            range_is_daily: true,
            ..Default::default()
        };
        assert_eq!(dose.daily_range(), Some((450.0, 450.0)));
    }

    #[test]
    fn per_admin_times_frequency_as_last_resort() {
        let dose = ParsedDose {
            per_admin: Some(50.0),
            freq: Some(3),
            ..Default::default()
        };
        assert_eq!(dose.daily_range(), Some((150.0, 150.0)));
    }

    #[test]
    fn unflagged_total_is_not_a_daily_range() {
        let dose = ParsedDose {
            per_admin: Some(500.0),
            total: Some(500.0),
            ..Default::default()
        };
        assert_eq!(dose.daily_range(), None);
    }
}
