use std::fmt::{Display, Formatter};
use std::sync::OnceLock;

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::{self, FormatItem};
use time::{Date, Month, OffsetDateTime};

use crate::ValidationError;

const SECONDS_PER_DAY: i64 = 86_400;

fn iso_date_format() -> &'static [FormatItem<'static>] {
    static FORMAT: OnceLock<Vec<FormatItem<'static>>> = OnceLock::new();
    FORMAT.get_or_init(|| {
        format_description::parse("[year]-[month]-[day]")
            .expect("ISO date format description is valid")
    })
}

/// Calendar date in UTC, the single timestamp representation every source
/// normalizes to.
///
/// Yahoo hands back epoch seconds, FRED hands back `YYYY-MM-DD` strings;
/// both become an `ObservationDate` so downstream charting never sees two
/// calendar semantics. No time-of-day is retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObservationDate(Date);

impl ObservationDate {
    /// Parse an ISO `YYYY-MM-DD` string.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        Date::parse(trimmed, iso_date_format())
            .map(Self)
            .map_err(|_| ValidationError::InvalidDate {
                value: input.to_owned(),
            })
    }

    pub fn from_ymd(year: i32, month: u8, day: u8) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidDate {
            value: format!("{year:04}-{month:02}-{day:02}"),
        };
        let month = Month::try_from(month).map_err(|_| invalid())?;
        Date::from_calendar_date(year, month, day)
            .map(Self)
            .map_err(|_| invalid())
    }

    /// UTC calendar date of an epoch-seconds timestamp.
    pub fn from_unix_seconds(seconds: i64) -> Result<Self, ValidationError> {
        OffsetDateTime::from_unix_timestamp(seconds)
            .map(|ts| Self(ts.date()))
            .map_err(|_| ValidationError::InvalidDate {
                value: seconds.to_string(),
            })
    }

    pub fn today_utc() -> Self {
        Self(OffsetDateTime::now_utc().date())
    }

    /// Epoch seconds at UTC midnight of this date.
    pub fn unix_midnight(self) -> i64 {
        self.0.midnight().assume_utc().unix_timestamp()
    }

    /// Epoch seconds at UTC midnight of the following date. Used for
    /// exclusive upper bounds in provider queries.
    pub fn unix_next_midnight(self) -> i64 {
        self.unix_midnight() + SECONDS_PER_DAY
    }

    pub fn into_inner(self) -> Date {
        self.0
    }

    pub fn format_iso(self) -> String {
        self.0
            .format(iso_date_format())
            .expect("ObservationDate must be ISO formattable")
    }
}

impl Display for ObservationDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format_iso())
    }
}

impl Serialize for ObservationDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.format_iso())
    }
}

impl<'de> Deserialize<'de> for ObservationDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(D::Error::custom)
    }
}

/// Inclusive calendar range, `start <= end` enforced at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DateRange {
    start: ObservationDate,
    end: ObservationDate,
}

impl DateRange {
    pub fn new(start: ObservationDate, end: ObservationDate) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvertedRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub const fn start(self) -> ObservationDate {
        self.start
    }

    pub const fn end(self) -> ObservationDate {
        self.end
    }

    pub fn contains(self, date: ObservationDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Whether the range reaches `today` or beyond. Such a range can keep
    /// growing as the provider publishes new data within the same run.
    pub fn is_open_ended(self, today: ObservationDate) -> bool {
        self.end >= today
    }
}

impl Display for DateRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iso_date() {
        let date = ObservationDate::parse("2024-01-05").expect("must parse");
        assert_eq!(date.format_iso(), "2024-01-05");
    }

    #[test]
    fn rejects_malformed_date() {
        let err = ObservationDate::parse("01/05/2024").expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidDate { .. }));
    }

    #[test]
    fn truncates_epoch_seconds_to_utc_date() {
        // 2024-01-02T14:30:00Z, a regular US market open.
        let date = ObservationDate::from_unix_seconds(1_704_205_800).expect("must convert");
        assert_eq!(date.format_iso(), "2024-01-02");
    }

    #[test]
    fn unix_midnight_round_trips() {
        let date = ObservationDate::parse("2024-01-01").expect("must parse");
        assert_eq!(date.unix_midnight(), 1_704_067_200);
        assert_eq!(date.unix_next_midnight(), 1_704_153_600);
        assert_eq!(
            ObservationDate::from_unix_seconds(date.unix_midnight()).expect("must convert"),
            date
        );
    }

    #[test]
    fn range_rejects_inverted_bounds() {
        let start = ObservationDate::parse("2024-02-01").expect("must parse");
        let end = ObservationDate::parse("2024-01-01").expect("must parse");
        let err = DateRange::new(start, end).expect_err("must fail");
        assert!(matches!(err, ValidationError::InvertedRange { .. }));
    }

    #[test]
    fn range_contains_is_inclusive() {
        let start = ObservationDate::parse("2024-01-01").expect("must parse");
        let end = ObservationDate::parse("2024-01-31").expect("must parse");
        let range = DateRange::new(start, end).expect("valid range");

        assert!(range.contains(start));
        assert!(range.contains(end));
        assert!(!range.contains(ObservationDate::parse("2024-02-01").expect("must parse")));
    }

    #[test]
    fn open_ended_when_end_reaches_today() {
        let start = ObservationDate::parse("2024-01-01").expect("must parse");
        let today = ObservationDate::parse("2024-06-01").expect("must parse");

        let closed = DateRange::new(start, ObservationDate::parse("2024-05-31").expect("must parse"))
            .expect("valid range");
        assert!(!closed.is_open_ended(today));

        let open = DateRange::new(start, today).expect("valid range");
        assert!(open.is_open_ended(today));
    }
}
