use chrono::{Datelike, Duration, NaiveDate};

/// A Monday-start calendar week: `start` is the Monday, `end` the Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Monday of the week containing `date`.
pub fn monday_of(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// The Monday..Sunday window containing `date`.
pub fn week_of(date: NaiveDate) -> WeekWindow {
    let start = monday_of(date);
    WeekWindow {
        start,
        end: start + Duration::days(6),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn monday_of_a_monday_is_itself() {
        assert_eq!(monday_of(date(2024, 1, 1)), date(2024, 1, 1));
    }

    #[test]
    fn monday_of_mid_week_rolls_back() {
        // 2024-01-03 is a Wednesday
        assert_eq!(monday_of(date(2024, 1, 3)), date(2024, 1, 1));
        // 2024-01-07 is a Sunday
        assert_eq!(monday_of(date(2024, 1, 7)), date(2024, 1, 1));
    }

    #[test]
    fn week_window_spans_monday_to_sunday() {
        let window = week_of(date(2024, 1, 5));

        assert_eq!(
            window,
            WeekWindow {
                start: date(2024, 1, 1),
                end: date(2024, 1, 7),
            }
        );
    }

    #[test]
    fn week_window_crosses_month_boundary() {
        // 2024-01-31 is a Wednesday; its week ends in February
        let window = week_of(date(2024, 1, 31));

        assert_eq!(window.start, date(2024, 1, 29));
        assert_eq!(window.end, date(2024, 2, 4));
    }
}
