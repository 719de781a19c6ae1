use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Hour of the local day at which a "fitness day" rolls over.
///
/// Activity before this hour counts toward the previous calendar day, so a
/// late-night session at 01:30 still extends that evening's streak.
pub const DEFAULT_ROLLOVER_HOUR: u32 = 4;

/// Running streak/minutes aggregate for one identity.
///
/// This is a redundant aggregate over the completion log, kept so the home
/// screen can read it synchronously. It is only ever rebuilt by the sync
/// merge, never recomputed from the log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressState {
    pub streak: u32,
    pub daily_minutes: u32,
    pub total_minutes: u32,
    pub last_activity: Option<DateTime<Utc>>,
}

/// Calendar date of the fitness day containing `at`.
///
/// Shifts the timestamp back by the rollover hour before taking the date, so
/// any time before `rollover_hour` belongs to the previous calendar day.
pub fn fitness_day(at: DateTime<Local>, rollover_hour: u32) -> NaiveDate {
    (at - Duration::hours(rollover_hour as i64)).date_naive()
}

/// Fitness day of a stored UTC timestamp, in the device's local zone.
pub fn fitness_day_utc(at: DateTime<Utc>, rollover_hour: u32) -> NaiveDate {
    fitness_day(at.with_timezone(&Local), rollover_hour)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_fitness_day_after_rollover() {
        let at = Local.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
        assert_eq!(
            fitness_day(at, DEFAULT_ROLLOVER_HOUR),
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
        );
    }

    #[test]
    fn test_fitness_day_before_rollover_belongs_to_previous_day() {
        let at = Local.with_ymd_and_hms(2025, 3, 10, 1, 30, 0).unwrap();
        assert_eq!(
            fitness_day(at, DEFAULT_ROLLOVER_HOUR),
            NaiveDate::from_ymd_opt(2025, 3, 9).unwrap()
        );
    }

    #[test]
    fn test_fitness_day_exact_rollover_hour_is_new_day() {
        let at = Local.with_ymd_and_hms(2025, 3, 10, 4, 0, 0).unwrap();
        assert_eq!(
            fitness_day(at, DEFAULT_ROLLOVER_HOUR),
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
        );
    }
}
