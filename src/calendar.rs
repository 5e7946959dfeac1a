//! Restricted-day classification for the usage-record write gate.
//!
//! A day is restricted when it falls on a working weekday (Monday-Friday) or
//! matches a date in the `holidays` reference table. Classification itself is
//! a pure function of the date and the holiday set; the database lookup is
//! kept separate so callers can evaluate the rule against any date.

use crate::db::models::Holiday;
use crate::schema;
use chrono::{Datelike, NaiveDate, Weekday};
use diesel::prelude::*;
use diesel::PgConnection;

/// Why a date counts as restricted.
///
/// When a holiday falls on a working weekday both rules apply; the holiday
/// reason wins so the caller sees the more specific message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Restriction {
    Holiday { name: String },
    Weekday(Weekday),
}

fn is_working_weekday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// True when writes to usage records are disallowed on `date`.
///
/// Missing holiday data simply means the holiday half of the rule
/// contributes false.
pub fn is_restricted_day(date: NaiveDate, holiday_dates: &[NaiveDate]) -> bool {
    is_working_weekday(date) || holiday_dates.contains(&date)
}

/// Classify `date` against the restriction rule, reporting the reason.
/// Returns `None` for an unrestricted day (weekend, no holiday match).
pub fn classify(date: NaiveDate, holidays: &[Holiday]) -> Option<Restriction> {
    if let Some(holiday) = holidays.iter().find(|h| h.holiday_date == date) {
        return Some(Restriction::Holiday {
            name: holiday.name.clone(),
        });
    }
    if is_working_weekday(date) {
        return Some(Restriction::Weekday(date.weekday()));
    }
    None
}

/// Fetch the holiday rows whose calendar date matches `date`.
///
/// Evaluated per mutation attempt rather than cached: the answer cannot be
/// assumed stable across a long-running session.
pub fn holidays_on(conn: &mut PgConnection, date: NaiveDate) -> Result<Vec<Holiday>, String> {
    use schema::holidays::dsl as H;

    H::holidays
        .filter(H::holiday_date.eq(date))
        .select(Holiday::as_select())
        .load(conn)
        .map_err(|e| format!("fetch holidays for {} failed: {}", date, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn holiday(name: &str, date: NaiveDate) -> Holiday {
        Holiday {
            id: 1,
            name: name.to_string(),
            holiday_date: date,
            description: None,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn weekdays_are_restricted_regardless_of_holidays() {
        // 2025-05-05 through 2025-05-09 are Monday..Friday
        for day in 5..=9 {
            let d = date(2025, 5, day);
            assert!(is_restricted_day(d, &[]));
            assert!(matches!(classify(d, &[]), Some(Restriction::Weekday(_))));
        }
    }

    #[test]
    fn weekend_without_holiday_is_unrestricted() {
        let saturday = date(2025, 5, 3);
        let sunday = date(2025, 5, 4);
        assert!(!is_restricted_day(saturday, &[]));
        assert!(!is_restricted_day(sunday, &[]));
        assert_eq!(classify(saturday, &[]), None);
        assert_eq!(classify(sunday, &[]), None);
    }

    #[test]
    fn holiday_on_weekend_is_restricted() {
        // 2025-12-27 is a Saturday
        let d = date(2025, 12, 27);
        let holidays = [holiday("Company Day", d)];
        assert!(is_restricted_day(d, &[d]));
        assert_eq!(
            classify(d, &holidays),
            Some(Restriction::Holiday {
                name: "Company Day".to_string()
            })
        );
    }

    #[test]
    fn holiday_reason_wins_on_weekday() {
        // 2025-05-01 is a Thursday and a listed holiday
        let d = date(2025, 5, 1);
        let holidays = [holiday("Labour Day", d)];
        assert!(is_restricted_day(d, &[d]));
        assert_eq!(
            classify(d, &holidays),
            Some(Restriction::Holiday {
                name: "Labour Day".to_string()
            })
        );
    }

    #[test]
    fn holiday_match_ignores_time_of_day() {
        let d = date(2025, 5, 1);
        let late_in_day: DateTime<Utc> = d.and_hms_opt(23, 59, 59).expect("valid time").and_utc();
        assert!(is_restricted_day(late_in_day.date_naive(), &[d]));
    }

    #[test]
    fn non_matching_holiday_does_not_restrict_weekend() {
        let saturday = date(2025, 5, 3);
        let holidays = [holiday("Labour Day", date(2025, 5, 1))];
        assert!(!is_restricted_day(saturday, &[date(2025, 5, 1)]));
        assert_eq!(classify(saturday, &holidays), None);
    }
}
