//! Date range helpers for the analytics page.

use serde::Deserialize;
use time::{Date, Month, format_description::BorrowedFormatItem, macros::format_description};

use crate::{Error, backend::DateRange, transaction::parse_date};

/// How many months before the current one the default range reaches back.
pub const DEFAULT_MONTHS_BACK: u8 = 11;

/// The first day of the month `months` months before the month of `date`.
pub fn first_of_month_months_before(date: Date, months: u8) -> Date {
    let mut year = date.year();
    let mut month = date.month();

    for _ in 0..months {
        if month == Month::January {
            year -= 1;
        }
        month = month.previous();
    }

    // The first of a month always exists.
    Date::from_calendar_date(year, month, 1).unwrap_or(date)
}

/// The twelve calendar months ending with the month of `today`.
pub fn default_range(today: Date) -> DateRange {
    DateRange::new(first_of_month_months_before(today, DEFAULT_MONTHS_BACK), today)
}

const MONTH_KEY_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]");

/// The "YYYY-MM" key of the month `date` falls in.
pub fn month_key(date: Date) -> String {
    date.format(MONTH_KEY_FORMAT).unwrap_or_else(|error| {
        tracing::error!("Could not format month of {date}: {error}");
        date.to_string()
    })
}

/// The query parameters for the analytics page.
#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    /// The first day, `YYYY-MM-DD`.
    pub start: Option<String>,
    /// The last day, `YYYY-MM-DD`.
    pub end: Option<String>,
}

impl RangeQuery {
    /// Resolve the requested range, filling in missing ends from the default range.
    ///
    /// # Errors
    /// Returns [Error::InvalidDate] if a date is given but cannot be parsed.
    pub fn resolve(&self, today: Date) -> Result<DateRange, Error> {
        let default = default_range(today);

        let start = parse_optional(self.start.as_deref())?.unwrap_or(default.start);
        let end = parse_optional(self.end.as_deref())?.unwrap_or(default.end);

        Ok(DateRange::new(start, end))
    }
}

fn parse_optional(text: Option<&str>) -> Result<Option<Date>, Error> {
    match text.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => parse_date(text)
            .map(Some)
            .ok_or_else(|| Error::InvalidDate(text.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::Error;

    use super::{RangeQuery, default_range, first_of_month_months_before, month_key};

    #[test]
    fn steps_back_across_years() {
        assert_eq!(
            first_of_month_months_before(date!(2025 - 10 - 19), 11),
            date!(2024 - 11 - 01)
        );
        assert_eq!(
            first_of_month_months_before(date!(2025 - 01 - 31), 1),
            date!(2024 - 12 - 01)
        );
        assert_eq!(
            first_of_month_months_before(date!(2025 - 03 - 15), 0),
            date!(2025 - 03 - 01)
        );
    }

    #[test]
    fn default_range_covers_twelve_months() {
        let range = default_range(date!(2025 - 10 - 19));

        assert_eq!(range.start, date!(2024 - 11 - 01));
        assert_eq!(range.end, date!(2025 - 10 - 19));
    }

    #[test]
    fn formats_month_keys() {
        assert_eq!(month_key(date!(2025 - 02 - 14)), "2025-02");
        assert_eq!(month_key(date!(2024 - 12 - 01)), "2024-12");
    }

    #[test]
    fn resolves_partial_query() {
        let query = RangeQuery {
            start: Some("2025-01-01".to_owned()),
            end: None,
        };

        let range = query.resolve(date!(2025 - 10 - 19)).unwrap();

        assert_eq!(range.start, date!(2025 - 01 - 01));
        assert_eq!(range.end, date!(2025 - 10 - 19));
    }

    #[test]
    fn empty_strings_use_defaults() {
        let query = RangeQuery {
            start: Some(String::new()),
            end: Some(" ".to_owned()),
        };

        let range = query.resolve(date!(2025 - 10 - 19)).unwrap();

        assert_eq!(range, default_range(date!(2025 - 10 - 19)));
    }

    #[test]
    fn rejects_malformed_dates() {
        let query = RangeQuery {
            start: Some("last tuesday".to_owned()),
            end: None,
        };

        assert_eq!(
            query.resolve(date!(2025 - 10 - 19)),
            Err(Error::InvalidDate("last tuesday".to_owned()))
        );
    }
}
