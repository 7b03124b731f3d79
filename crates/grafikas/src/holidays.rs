//! Lithuanian public holidays and working-day arithmetic.

use atsiuntimas::dataset::days_in_month;
use chrono::{Datelike, NaiveDate, Weekday};

/// Holidays falling on the same date every year: (month, days).
const FIXED_HOLIDAYS: &[(u32, &[u32])] = &[
    (1, &[1]),          // Naujieji metai
    (2, &[16]),         // Valstybės atkūrimo diena
    (3, &[11]),         // Nepriklausomybės atkūrimo diena
    (5, &[1]),          // Darbo diena
    (6, &[24]),         // Joninės
    (7, &[6]),          // Valstybės diena
    (8, &[15]),         // Žolinė
    (11, &[1, 2]),      // Visų šventųjų, Vėlinės
    (12, &[24, 25, 26]), // Kūčios, Kalėdos
];

/// Easter Sunday and Monday per year: (year, month, days).
///
/// A year appears twice when the pair straddles March and April. Years not
/// listed simply have no movable holidays.
const MOVABLE_HOLIDAYS: &[(i32, u32, &[u32])] = &[
    (2024, 3, &[31]),
    (2024, 4, &[1]),
    (2025, 4, &[20, 21]),
    (2026, 4, &[5, 6]),
    (2027, 3, &[28, 29]),
    (2028, 4, &[16, 17]),
    (2029, 4, &[1, 2]),
    (2030, 4, &[21, 22]),
    (2031, 4, &[13, 14]),
    (2032, 3, &[28, 29]),
    (2033, 4, &[17, 18]),
    (2034, 4, &[9, 10]),
    (2035, 3, &[25, 26]),
];

/// Whether a date is a public holiday. Fixed dates are checked first, then the
/// Easter table for `year`. Out-of-range input just returns false.
pub fn is_holiday(year: i32, month: u32, day: u32) -> bool {
    let fixed = FIXED_HOLIDAYS
        .iter()
        .any(|(m, days)| *m == month && days.contains(&day));
    if fixed {
        return true;
    }

    MOVABLE_HOLIDAYS
        .iter()
        .any(|(y, m, days)| *y == year && *m == month && days.contains(&day))
}

pub fn weekday(year: i32, month: u32, day: u32) -> Option<Weekday> {
    NaiveDate::from_ymd_opt(year, month, day).map(|d| d.weekday())
}

pub fn is_weekend(year: i32, month: u32, day: u32) -> bool {
    matches!(weekday(year, month, day), Some(Weekday::Sat | Weekday::Sun))
}

/// Neither a weekend nor a holiday.
pub fn is_working_day(year: i32, month: u32, day: u32) -> bool {
    weekday(year, month, day).is_some()
        && !is_weekend(year, month, day)
        && !is_holiday(year, month, day)
}

/// Working days of a month in calendar order.
pub fn working_days(year: i32, month: u32) -> Vec<u32> {
    (1..=days_in_month(year, month))
        .filter(|day| is_working_day(year, month, *day))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_easter_2025() {
        assert!(is_holiday(2025, 4, 20));
        assert!(is_holiday(2025, 4, 21));
        assert!(!is_holiday(2025, 4, 19));
        assert!(!is_holiday(2025, 4, 22));
    }

    #[test]
    fn test_new_year() {
        assert!(is_holiday(2025, 1, 1));
        assert!(!is_holiday(2025, 1, 2));
    }

    #[test]
    fn test_fixed_holidays_recur_every_year() {
        for year in [1999, 2025, 2100] {
            assert!(is_holiday(year, 2, 16));
            assert!(is_holiday(year, 3, 11));
            assert!(is_holiday(year, 6, 24));
            assert!(is_holiday(year, 11, 2));
            assert!(is_holiday(year, 12, 26));
        }
    }

    #[test]
    fn test_easter_crossing_month_boundary() {
        assert!(is_holiday(2024, 3, 31));
        assert!(is_holiday(2024, 4, 1));
        assert!(!is_holiday(2024, 4, 2));
    }

    #[test]
    fn test_year_outside_movable_table() {
        // Easter 2040 is April 1st, but the table stops earlier
        assert!(!is_holiday(2040, 4, 1));
        assert!(!is_holiday(2040, 4, 2));
    }

    #[test]
    fn test_easter_only_in_its_year() {
        assert!(!is_holiday(2026, 4, 20));
        assert!(!is_holiday(2025, 4, 5));
    }

    #[test]
    fn test_is_holiday_is_total() {
        for month in 0..=13 {
            for day in 0..=32 {
                let first = is_holiday(2025, month, day);
                assert_eq!(first, is_holiday(2025, month, day));
            }
        }
    }

    #[test]
    fn test_weekend() {
        // 2025-04-05 is a Saturday, 2025-04-06 a Sunday
        assert!(is_weekend(2025, 4, 5));
        assert!(is_weekend(2025, 4, 6));
        assert!(!is_weekend(2025, 4, 7));
        assert!(!is_weekend(2025, 2, 30));
    }

    #[test]
    fn test_working_days_april_2025() {
        let days = working_days(2025, 4);

        // 22 weekdays minus Easter Monday
        assert_eq!(days.len(), 21);
        assert!(!days.contains(&21));
        assert!(!days.contains(&5));
        assert!(days.contains(&22));
        assert_eq!(days.first(), Some(&1));
        assert_eq!(days.last(), Some(&30));
    }

    #[test]
    fn test_working_days_december_2025() {
        let days = working_days(2025, 12);

        assert!(!days.contains(&24));
        assert!(!days.contains(&25));
        assert!(!days.contains(&26));
        assert!(days.contains(&23));
    }

    #[test]
    fn test_working_days_invalid_month() {
        assert!(working_days(2025, 13).is_empty());
    }
}
