//! Cover date helpers.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

const KO_WEEK_NAMES: [&str; 6] = ["첫째주", "둘째주", "셋째주", "넷째주", "다섯째주", "여섯째주"];

const EN_MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// The Sunday an event date belongs to: the date itself when it is a Sunday,
/// otherwise the following Sunday.
pub fn cover_sunday(date: NaiveDate) -> NaiveDate {
    let days_until_sunday = 6 - date.weekday().num_days_from_monday();
    date + Duration::days(i64::from(days_until_sunday))
}

/// Calendar week row of `date` within its month, Monday-first, starting at 1.
pub fn week_of_month(date: NaiveDate) -> u32 {
    let first_weekday = date
        .with_day(1)
        .map(|first| first.weekday())
        .unwrap_or(Weekday::Mon)
        .num_days_from_monday();
    (date.day() + first_weekday - 1) / 7 + 1
}

/// Cover label for the Sunday of `date`.
///
/// `ko` renders "2026년 10월 셋째주", any other language renders
/// "October 2026 · Week 3".
pub fn cover_label(date: NaiveDate, language: &str) -> String {
    let sunday = cover_sunday(date);
    let week = week_of_month(sunday);

    if language.eq_ignore_ascii_case("ko") {
        let week_text = KO_WEEK_NAMES
            .get(week as usize - 1)
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("{week}째주"));
        format!("{}년 {}월 {}", sunday.year(), sunday.month(), week_text)
    } else {
        let month = EN_MONTH_NAMES[sunday.month0() as usize];
        format!("{} {} · Week {}", month, sunday.year(), week)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_cover_sunday() {
        // 2026-10-18 is a Sunday.
        assert_eq!(cover_sunday(date(2026, 10, 18)), date(2026, 10, 18));
        assert_eq!(cover_sunday(date(2026, 10, 17)), date(2026, 10, 18));
        assert_eq!(cover_sunday(date(2026, 10, 12)), date(2026, 10, 18));
        assert_eq!(cover_sunday(date(2026, 12, 28)), date(2027, 1, 3));
    }

    #[test]
    fn test_week_of_month() {
        // October 2026 starts on a Thursday.
        assert_eq!(week_of_month(date(2026, 10, 4)), 1);
        assert_eq!(week_of_month(date(2026, 10, 5)), 2);
        assert_eq!(week_of_month(date(2026, 10, 18)), 3);
        // June 2026 starts on a Monday.
        assert_eq!(week_of_month(date(2026, 6, 7)), 1);
        assert_eq!(week_of_month(date(2026, 6, 28)), 4);
    }

    #[test]
    fn test_cover_label_languages() {
        assert_eq!(cover_label(date(2026, 10, 15), "ko"), "2026년 10월 셋째주");
        assert_eq!(cover_label(date(2026, 10, 15), "en"), "October 2026 · Week 3");
    }

    #[test]
    fn test_week_rows_late_in_month() {
        // August 2026 starts on a Saturday; the 31st falls in week row 6.
        assert_eq!(week_of_month(date(2026, 8, 31)), 6);
        // 2026-03-01 is a Sunday, so every Sunday of March sits one row late.
        assert_eq!(cover_label(date(2026, 3, 29), "ko"), "2026년 3월 다섯째주");
    }
}
