use chrono::{DateTime, Duration, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

/// The submission window of a deployed form.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    /// When the form opens for submissions.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub start_date: DateTime<Utc>,
    /// When the form closes.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub end_date: DateTime<Utc>,
}

impl Schedule {
    /// Fill in a partially-specified schedule: a missing start date means
    /// "now", a missing end date means start plus the default window.
    pub fn normalise(
        start_date: Option<DateTime<Utc>>,
        end_date: Option<DateTime<Utc>>,
        default_window: Duration,
    ) -> Self {
        let start_date = start_date.unwrap_or_else(Utc::now);
        let end_date = end_date.unwrap_or(start_date + default_window);
        Self {
            start_date,
            end_date,
        }
    }

    /// Is the given instant inside the window?
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start_date <= at && at <= self.end_date
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_end_date_defaults_to_window_after_start() {
        let start = Utc::now();
        let schedule = Schedule::normalise(Some(start), None, Duration::days(30));
        assert_eq!(schedule.start_date, start);
        assert_eq!(schedule.end_date, start + Duration::days(30));
    }

    #[test]
    fn missing_start_date_defaults_to_now() {
        let before = Utc::now();
        let schedule = Schedule::normalise(None, None, Duration::days(30));
        let after = Utc::now();
        assert!(schedule.start_date >= before && schedule.start_date <= after);
        assert_eq!(schedule.end_date, schedule.start_date + Duration::days(30));
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let start = Utc::now();
        let schedule = Schedule::normalise(Some(start), None, Duration::days(1));
        assert!(schedule.contains(start));
        assert!(schedule.contains(schedule.end_date));
        assert!(!schedule.contains(start - Duration::seconds(1)));
        assert!(!schedule.contains(schedule.end_date + Duration::seconds(1)));
    }
}
