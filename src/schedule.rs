use crate::errors::{AppError, AppResult};
use crate::models::{Assignment, Person, WeekRow, WeekView};
use chrono::{Datelike, Days, Duration, NaiveDate};

pub const WEEK_DAYS: usize = 7;
pub const EMPTY_CELL: &str = "-";

pub fn parse_date(raw: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("Invalid date: {raw}")))
}

pub fn days_inclusive(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    let mut current = start;
    while current <= end {
        days.push(current);
        match current.succ_opt() {
            Some(next) => current = next,
            None => break,
        }
    }
    days
}

pub fn monday_of(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.weekday().num_days_from_monday()))
}

pub fn week_start(today: NaiveDate, offset_weeks: i64) -> AppResult<NaiveDate> {
    Duration::try_weeks(offset_weeks)
        .and_then(|shift| monday_of(today).checked_add_signed(shift))
        .ok_or_else(|| AppError::Validation(format!("Week offset out of range: {offset_weeks}")))
}

pub fn week_dates(start: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(WEEK_DAYS);
    let mut current = start;
    for _ in 0..WEEK_DAYS {
        dates.push(current);
        match current.succ_opt() {
            Some(next) => current = next,
            None => break,
        }
    }
    dates
}

pub fn build_week_view(start: NaiveDate, persons: &[Person], assignments: &[Assignment]) -> WeekView {
    let dates = week_dates(start);
    let rows = persons
        .iter()
        .map(|person| {
            let locations = dates
                .iter()
                .map(|date| {
                    let location = assignments
                        .iter()
                        .find(|entry| entry.person_id == person.id && entry.date == *date)
                        .map_or_else(|| EMPTY_CELL.to_string(), |entry| entry.location.clone());
                    (date.to_string(), location)
                })
                .collect();
            WeekRow {
                person_id: person.id,
                person_name: person.name.clone(),
                locations,
            }
        })
        .collect();
    WeekView {
        week_start: start,
        dates,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::{build_week_view, days_inclusive, monday_of, parse_date, week_dates, week_start, EMPTY_CELL};
    use crate::models::{Assignment, Person};
    use chrono::NaiveDate;

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("test date")
    }

    #[test]
    fn monday_is_computed_for_every_weekday() {
        let monday = date("2025-11-10");
        for offset in 0..7 {
            let day = monday + chrono::Days::new(offset);
            assert_eq!(monday_of(day), monday, "day offset {offset}");
        }
    }

    #[test]
    fn sunday_maps_back_six_days() {
        assert_eq!(monday_of(date("2025-11-16")), date("2025-11-10"));
    }

    #[test]
    fn week_start_navigates_by_signed_offset() {
        let today = date("2025-11-12");
        assert_eq!(week_start(today, 0).expect("current"), date("2025-11-10"));
        assert_eq!(week_start(today, 1).expect("next"), date("2025-11-17"));
        assert_eq!(week_start(today, -1).expect("previous"), date("2025-11-03"));
    }

    #[test]
    fn week_start_rejects_absurd_offsets() {
        let today = date("2025-11-12");
        assert!(week_start(today, i64::MAX).is_err());
        assert!(week_start(today, i64::MIN).is_err());
    }

    #[test]
    fn week_dates_cross_year_boundary() {
        let dates = week_dates(date("2024-12-30"));
        assert_eq!(dates.len(), 7);
        assert_eq!(dates[0], date("2024-12-30"));
        assert_eq!(dates[2], date("2025-01-01"));
        assert_eq!(dates[6], date("2025-01-05"));
    }

    #[test]
    fn days_inclusive_spans_month_boundary() {
        let days = days_inclusive(date("2025-01-30"), date("2025-02-02"));
        assert_eq!(
            days,
            vec![
                date("2025-01-30"),
                date("2025-01-31"),
                date("2025-02-01"),
                date("2025-02-02"),
            ]
        );
    }

    #[test]
    fn days_inclusive_is_empty_when_start_after_end() {
        assert!(days_inclusive(date("2025-02-02"), date("2025-01-30")).is_empty());
    }

    #[test]
    fn days_inclusive_handles_leap_day() {
        let days = days_inclusive(date("2024-02-28"), date("2024-03-01"));
        assert_eq!(days.len(), 3);
        assert_eq!(days[1], date("2024-02-29"));
    }

    #[test]
    fn parse_date_rejects_garbage() {
        assert!(parse_date("2025-13-40").is_err());
        assert!(parse_date("not-a-date").is_err());
        assert_eq!(parse_date(" 2025-11-10 ").expect("trimmed"), date("2025-11-10"));
    }

    #[test]
    fn week_view_fills_placeholder_cells() {
        let persons = vec![
            Person {
                id: 1,
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
            },
            Person {
                id: 2,
                name: "Grace".to_string(),
                email: "grace@example.com".to_string(),
            },
        ];
        let assignments = vec![Assignment {
            id: 1,
            person_id: 1,
            date: date("2025-11-11"),
            location: "Stockholm Office".to_string(),
        }];

        let view = build_week_view(date("2025-11-10"), &persons, &assignments);
        assert_eq!(view.dates.len(), 7);
        assert_eq!(view.rows.len(), 2);
        assert_eq!(view.rows[0].locations["2025-11-11"], "Stockholm Office");
        assert_eq!(view.rows[0].locations["2025-11-10"], EMPTY_CELL);
        assert_eq!(view.rows[1].locations["2025-11-11"], EMPTY_CELL);
        assert!(view.rows.iter().all(|row| row.locations.len() == 7));
    }
}
