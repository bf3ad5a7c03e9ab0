//! Best-effort parsing of free-text plan durations ("30 jours", "4 semaines", "2 mois").
//!
//! Anything not recognised yields `None`, and callers show no validity date.

use chrono::{DateTime, Days, Months, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationUnit {
    Day,
    Week,
    Month,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanDuration {
    pub amount: u32,
    pub unit: DurationUnit,
}

impl PlanDuration {
    pub fn parse(text: &str) -> Option<Self> {
        let lower = text.to_lowercase();

        let digits: String = lower
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(|c| c.is_ascii_digit())
            .collect();
        let amount = digits.parse::<u32>().ok()?;

        let unit = if lower.contains("jour") {
            DurationUnit::Day
        } else if lower.contains("semaine") {
            DurationUnit::Week
        } else if lower.contains("mois") {
            DurationUnit::Month
        } else {
            return None;
        };

        Some(Self { amount, unit })
    }

    pub fn add_to(&self, start: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self.unit {
            DurationUnit::Day => start.checked_add_days(Days::new(u64::from(self.amount))),
            DurationUnit::Week => start.checked_add_days(Days::new(u64::from(self.amount) * 7)),
            DurationUnit::Month => start.checked_add_months(Months::new(self.amount)),
        }
    }
}

/// End of validity for a plan bought at `start`, if the duration text is understood.
pub fn valid_until(duration: &str, start: DateTime<Utc>) -> Option<DateTime<Utc>> {
    PlanDuration::parse(duration)?.add_to(start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_known_units() {
        assert_eq!(
            PlanDuration::parse("30 jours"),
            Some(PlanDuration {
                amount: 30,
                unit: DurationUnit::Day
            })
        );
        assert_eq!(
            PlanDuration::parse("4 Semaines"),
            Some(PlanDuration {
                amount: 4,
                unit: DurationUnit::Week
            })
        );
        assert_eq!(
            PlanDuration::parse("2 mois"),
            Some(PlanDuration {
                amount: 2,
                unit: DurationUnit::Month
            })
        );
        assert_eq!(
            PlanDuration::parse("Forfait 1 jour").map(|d| d.amount),
            Some(1)
        );
    }

    #[test]
    fn test_unrecognised_formats_give_no_offset() {
        assert_eq!(PlanDuration::parse("illimité"), None);
        assert_eq!(PlanDuration::parse("30 days"), None);
        assert_eq!(PlanDuration::parse("jours"), None);
        assert_eq!(valid_until("3 heures", Utc::now()), None);
    }

    #[test]
    fn test_valid_until() {
        let start = Utc.with_ymd_and_hms(2025, 1, 31, 10, 0, 0).unwrap();
        assert_eq!(
            valid_until("30 jours", start),
            Some(Utc.with_ymd_and_hms(2025, 3, 2, 10, 0, 0).unwrap())
        );
        assert_eq!(
            valid_until("1 semaine", start),
            Some(Utc.with_ymd_and_hms(2025, 2, 7, 10, 0, 0).unwrap())
        );
        // Month arithmetic clamps to the last day
        assert_eq!(
            valid_until("1 mois", start),
            Some(Utc.with_ymd_and_hms(2025, 2, 28, 10, 0, 0).unwrap())
        );
    }
}
