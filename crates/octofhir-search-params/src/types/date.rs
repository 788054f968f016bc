//! Date search values.
//!
//! A date value carries the precision it was written with, and the precision
//! decides the implicit match range:
//! - Year: 2013 -> [2013-01-01, 2014-01-01)
//! - Month: 2013-01 -> [2013-01-01, 2013-02-01)
//! - Day: 2013-01-02 -> [2013-01-02, 2013-01-03)
//! - Minute / Second / Millisecond: one unit wide
//!
//! Hours without minutes are not a valid FHIR dateTime, so `2013-01-02T12`
//! falls back to day precision. A zone suffix is only honoured when a time of
//! day is present; `2013-01-02Z` is a plain local date. Any other trailing
//! text is an error.
//!
//! Ranges are computed on the civil (wall clock) timestamp, so month lengths
//! and leap years come from the calendar rather than a fixed day count.

use std::fmt;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use time::{Date, Duration, Month, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

use crate::error::ParseError;
use crate::parameters::SearchPrefix;

static DATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^([0-9]{4})(-(0[1-9]|1[0-2])(-(0[0-9]|[1-2][0-9]|3[0-1])(T([01][0-9]|2[0-3]):([0-5][0-9])(:([0-5][0-9])(\.([0-9]+))?)?((Z)|(\+|-)((0[0-9]|1[0-3]):([0-5][0-9])|(14):(00)))?)?)?)?",
    )
    .expect("Invalid date regex")
});

/// What may follow a literal without a time of day: a bare hour and a zone,
/// both ignored.
static DATE_ONLY_TAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(T([01][0-9]|2[0-3])?)?(Z|(\+|-)((0[0-9]|1[0-3]):[0-5][0-9]|14:00))?$")
        .expect("Invalid date tail regex")
});

// Capture groups of DATE_PATTERN
const YEAR: usize = 1;
const MONTH: usize = 3;
const DAY: usize = 5;
const HOUR: usize = 7;
const MINUTE: usize = 8;
const SECOND: usize = 10;
const FRACTION: usize = 12;
const ZULU: usize = 14;
const OFFSET_SIGN: usize = 15;
const OFFSET_HOUR: usize = 17;
const OFFSET_MINUTE: usize = 18;
const OFFSET_MAX_HOUR: usize = 19;

/// The finest unit written in a date literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DatePrecision {
    Year,
    Month,
    Day,
    Minute,
    Second,
    Millisecond,
}

/// The zone a date literal was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateZone {
    /// No zone given (or no time of day); resolved with the configured local offset.
    Local,
    /// `Z`
    Utc,
    /// `±hh:mm`
    Fixed(UtcOffset),
}

impl DateZone {
    /// The concrete offset, using `local` for unspecified zones.
    pub fn resolve(&self, local: UtcOffset) -> UtcOffset {
        match self {
            DateZone::Local => local,
            DateZone::Utc => UtcOffset::UTC,
            DateZone::Fixed(offset) => *offset,
        }
    }
}

impl fmt::Display for DateZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateZone::Local => Ok(()),
            DateZone::Utc => f.write_str("Z"),
            DateZone::Fixed(offset) => {
                let (hours, minutes, _) = offset.as_hms();
                let sign = if offset.is_negative() { '-' } else { '+' };
                write!(
                    f,
                    "{sign}{:02}:{:02}",
                    hours.unsigned_abs(),
                    minutes.unsigned_abs()
                )
            }
        }
    }
}

/// Represents a date range based on precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
}

impl DateRange {
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// A parsed date search value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateValue {
    pub prefix: SearchPrefix,
    pub precision: DatePrecision,
    pub zone: DateZone,
    low: PrimitiveDateTime,
    high: PrimitiveDateTime,
}

impl DateValue {
    /// Parse a date value, including its optional comparison prefix.
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let (prefix, value) = SearchPrefix::extract(raw);
        let caps = DATE_PATTERN
            .captures(value)
            .ok_or_else(|| ParseError::invalid_date(value, "expected YYYY[-MM[-DD[Thh:mm[:ss[.sss]][Z|±hh:mm]]]]"))?;

        let year: i32 = number_group(&caps, YEAR)
            .ok_or_else(|| ParseError::invalid_date(value, "missing year"))?;
        let month = number_group::<u8>(&caps, MONTH);
        let day = number_group::<u8>(&caps, DAY);
        let hour = number_group::<u8>(&caps, HOUR);
        let minute = number_group::<u8>(&caps, MINUTE);
        let second = number_group::<u8>(&caps, SECOND);
        let millis = caps.get(FRACTION).map(|m| fraction_to_millis(m.as_str()));

        let tail = caps.get(0).map_or(value, |m| &value[m.end()..]);
        let tail_ok = if hour.is_some() {
            tail.is_empty()
        } else {
            DATE_ONLY_TAIL.is_match(tail)
        };
        if !tail_ok {
            return Err(ParseError::invalid_date(
                value,
                format!("unexpected trailing text '{tail}'"),
            ));
        }

        let precision = if millis.is_some() {
            DatePrecision::Millisecond
        } else if second.is_some() {
            DatePrecision::Second
        } else if minute.is_some() {
            DatePrecision::Minute
        } else if day.is_some() {
            DatePrecision::Day
        } else if month.is_some() {
            DatePrecision::Month
        } else {
            DatePrecision::Year
        };

        let zone = if hour.is_some() {
            parse_zone(&caps)
        } else {
            DateZone::Local
        };

        let month = Month::try_from(month.unwrap_or(1))
            .map_err(|e| ParseError::invalid_date(value, e.to_string()))?;
        let date = Date::from_calendar_date(year, month, day.unwrap_or(1))
            .map_err(|e| ParseError::invalid_date(value, e.to_string()))?;
        let time = Time::from_hms_milli(
            hour.unwrap_or(0),
            minute.unwrap_or(0),
            second.unwrap_or(0),
            millis.unwrap_or(0),
        )
        .map_err(|e| ParseError::invalid_date(value, e.to_string()))?;

        let low = PrimitiveDateTime::new(date, time);
        let high = add_one_unit(low, precision).ok_or_else(|| ParseError::DateOutOfRange(value.to_string()))?;

        Ok(Self {
            prefix,
            precision,
            zone,
            low,
            high,
        })
    }

    /// The civil timestamp the literal denotes.
    pub fn instant(&self) -> PrimitiveDateTime {
        self.low
    }

    /// Inclusive lower bound of the implied range (the instant itself).
    pub fn range_low_incl(&self) -> PrimitiveDateTime {
        self.low
    }

    /// Exclusive upper bound: the instant plus one unit of its precision.
    pub fn range_high_excl(&self) -> PrimitiveDateTime {
        self.high
    }

    /// Resolve the range to absolute instants.
    ///
    /// `local` is used for values written without a zone.
    pub fn to_range(&self, local: UtcOffset) -> DateRange {
        let offset = self.zone.resolve(local);
        DateRange {
            start: self.low.assume_offset(offset),
            end: self.high.assume_offset(offset),
        }
    }

    /// Canonical text of the value without its prefix.
    pub fn canonical(&self) -> String {
        let dt = self.low;
        let (year, month, day) = (dt.year(), u8::from(dt.month()), dt.day());
        match self.precision {
            DatePrecision::Year => format!("{year:04}"),
            DatePrecision::Month => format!("{year:04}-{month:02}"),
            DatePrecision::Day => format!("{year:04}-{month:02}-{day:02}"),
            DatePrecision::Minute => format!(
                "{year:04}-{month:02}-{day:02}T{:02}:{:02}{}",
                dt.hour(),
                dt.minute(),
                self.zone
            ),
            DatePrecision::Second => format!(
                "{year:04}-{month:02}-{day:02}T{:02}:{:02}:{:02}{}",
                dt.hour(),
                dt.minute(),
                dt.second(),
                self.zone
            ),
            DatePrecision::Millisecond => format!(
                "{year:04}-{month:02}-{day:02}T{:02}:{:02}:{:02}.{:03}{}",
                dt.hour(),
                dt.minute(),
                dt.second(),
                dt.millisecond(),
                self.zone
            ),
        }
    }
}

impl fmt::Display for DateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.prefix != SearchPrefix::Eq {
            write!(f, "{}", self.prefix)?;
        }
        f.write_str(&self.canonical())
    }
}

fn number_group<T: std::str::FromStr>(caps: &Captures<'_>, index: usize) -> Option<T> {
    caps.get(index).and_then(|m| m.as_str().parse().ok())
}

/// `.9` -> 900, `.09` -> 90, `.987654` -> 987 (truncated, not rounded)
fn fraction_to_millis(fraction: &str) -> u16 {
    fraction
        .bytes()
        .chain(std::iter::repeat(b'0'))
        .take(3)
        .fold(0u16, |acc, b| acc * 10 + u16::from(b - b'0'))
}

fn parse_zone(caps: &Captures<'_>) -> DateZone {
    if caps.get(ZULU).is_some() {
        return DateZone::Utc;
    }
    let Some(sign) = caps.get(OFFSET_SIGN) else {
        return DateZone::Local;
    };
    let (hours, minutes) = match number_group::<i8>(caps, OFFSET_HOUR) {
        Some(hours) => (hours, number_group::<i8>(caps, OFFSET_MINUTE).unwrap_or(0)),
        // the only other alternative is exactly 14:00
        None => (number_group::<i8>(caps, OFFSET_MAX_HOUR).unwrap_or(14), 0),
    };
    let (hours, minutes) = if sign.as_str() == "-" {
        (-hours, -minutes)
    } else {
        (hours, minutes)
    };
    UtcOffset::from_hms(hours, minutes, 0)
        .map(DateZone::Fixed)
        .unwrap_or(DateZone::Local)
}

fn add_one_unit(dt: PrimitiveDateTime, precision: DatePrecision) -> Option<PrimitiveDateTime> {
    match precision {
        DatePrecision::Year => add_months(dt, 12),
        DatePrecision::Month => add_months(dt, 1),
        DatePrecision::Day => dt.date().next_day().map(|d| d.with_time(dt.time())),
        DatePrecision::Minute => dt.checked_add(Duration::MINUTE),
        DatePrecision::Second => dt.checked_add(Duration::SECOND),
        DatePrecision::Millisecond => dt.checked_add(Duration::MILLISECOND),
    }
}

/// Calendar month addition; the day of month is clamped to the target month.
fn add_months(dt: PrimitiveDateTime, months: i32) -> Option<PrimitiveDateTime> {
    let zero_based = dt.year() * 12 + i32::from(u8::from(dt.month())) - 1 + months;
    let year = zero_based.div_euclid(12);
    let month = Month::try_from(u8::try_from(zero_based.rem_euclid(12) + 1).ok()?).ok()?;
    let day = dt.day().min(month.length(year));
    let date = Date::from_calendar_date(year, month, day).ok()?;
    Some(date.with_time(dt.time()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{datetime, offset};

    fn mdt() -> UtcOffset {
        offset!(-7)
    }

    #[test]
    fn test_dates_to_milliseconds() {
        let d = DateValue::parse("2013-01-02T12:13:14.999-07:00").unwrap();
        assert_eq!(d.prefix, SearchPrefix::Eq);
        assert_eq!(d.precision, DatePrecision::Millisecond);
        assert_eq!(d.to_string(), "2013-01-02T12:13:14.999-07:00");
        let range = d.to_range(UtcOffset::UTC);
        assert_eq!(range.start, datetime!(2013-01-02 12:13:14.999 -7));
        assert_eq!(range.end, datetime!(2013-01-02 12:13:15 -7));

        let d = DateValue::parse("2013-01-02T12:13:14.999Z").unwrap();
        assert_eq!(d.zone, DateZone::Utc);
        assert_eq!(d.to_string(), "2013-01-02T12:13:14.999Z");
        assert_eq!(d.to_range(mdt()).start, datetime!(2013-01-02 12:13:14.999 UTC));

        let d = DateValue::parse("2013-01-02T12:13:14.999").unwrap();
        assert_eq!(d.zone, DateZone::Local);
        assert_eq!(d.to_string(), "2013-01-02T12:13:14.999");
        assert_eq!(d.to_range(mdt()).start, datetime!(2013-01-02 12:13:14.999 -7));
    }

    #[test]
    fn test_millisecond_padding_and_truncation() {
        let cases = [
            ("2013-01-02T12:13:14.9", "2013-01-02T12:13:14.900", datetime!(2013-01-02 12:13:14.900), datetime!(2013-01-02 12:13:14.901)),
            ("2013-01-02T12:13:14.09", "2013-01-02T12:13:14.090", datetime!(2013-01-02 12:13:14.090), datetime!(2013-01-02 12:13:14.091)),
            ("2013-01-02T12:13:14.009", "2013-01-02T12:13:14.009", datetime!(2013-01-02 12:13:14.009), datetime!(2013-01-02 12:13:14.010)),
            ("2013-01-02T12:13:14.987654321", "2013-01-02T12:13:14.987", datetime!(2013-01-02 12:13:14.987), datetime!(2013-01-02 12:13:14.988)),
        ];
        for (raw, text, low, high) in cases {
            let d = DateValue::parse(raw).unwrap();
            assert_eq!(d.to_string(), text);
            assert_eq!(d.range_low_incl(), low);
            assert_eq!(d.range_high_excl(), high);
        }
    }

    #[test]
    fn test_dates_to_seconds() {
        let d = DateValue::parse("2013-01-02T12:13:14-07:00").unwrap();
        assert_eq!(d.precision, DatePrecision::Second);
        assert_eq!(d.to_string(), "2013-01-02T12:13:14-07:00");
        assert_eq!(d.range_high_excl(), datetime!(2013-01-02 12:13:15));

        let d = DateValue::parse("2013-01-02T12:13:14Z").unwrap();
        assert_eq!(d.to_string(), "2013-01-02T12:13:14Z");

        let d = DateValue::parse("2013-01-02T12:13:14").unwrap();
        assert_eq!(d.to_string(), "2013-01-02T12:13:14");
        assert_eq!(d.zone, DateZone::Local);
    }

    #[test]
    fn test_dates_to_minutes() {
        let d = DateValue::parse("2013-01-02T12:13-07:00").unwrap();
        assert_eq!(d.precision, DatePrecision::Minute);
        assert_eq!(d.to_string(), "2013-01-02T12:13-07:00");
        let range = d.to_range(UtcOffset::UTC);
        assert_eq!(range.start, datetime!(2013-01-02 12:13 -7));
        assert_eq!(range.end, datetime!(2013-01-02 12:14 -7));

        let d = DateValue::parse("2013-01-02T12:13Z").unwrap();
        assert_eq!(d.to_string(), "2013-01-02T12:13Z");
    }

    #[test]
    fn test_hour_without_minutes_falls_back_to_day() {
        let d = DateValue::parse("2013-01-02T12").unwrap();
        assert_eq!(d.precision, DatePrecision::Day);
        assert_eq!(d.to_string(), "2013-01-02");
    }

    #[test]
    fn test_zone_ignored_without_time() {
        for raw in ["2013-01-02T-07:00", "2013-01-02Z", "2013-01-02"] {
            let d = DateValue::parse(raw).unwrap();
            assert_eq!(d.precision, DatePrecision::Day);
            assert_eq!(d.zone, DateZone::Local);
            assert_eq!(d.to_string(), "2013-01-02");
            assert_eq!(d.range_low_incl(), datetime!(2013-01-02 0:00));
            assert_eq!(d.range_high_excl(), datetime!(2013-01-03 0:00));
        }
        for raw in ["2013-01T-07:00", "2013-01Z", "2013-01"] {
            let d = DateValue::parse(raw).unwrap();
            assert_eq!(d.precision, DatePrecision::Month);
            assert_eq!(d.to_string(), "2013-01");
            assert_eq!(d.range_high_excl(), datetime!(2013-02-01 0:00));
        }
        for raw in ["2013T-07:00", "2013Z", "2013"] {
            let d = DateValue::parse(raw).unwrap();
            assert_eq!(d.precision, DatePrecision::Year);
            assert_eq!(d.to_string(), "2013");
            assert_eq!(d.range_high_excl(), datetime!(2014-01-01 0:00));
        }
    }

    #[test]
    fn test_leap_and_non_leap_years() {
        let d = DateValue::parse("1995-02-28").unwrap();
        assert_eq!(d.range_high_excl(), datetime!(1995-03-01 0:00));

        let d = DateValue::parse("1996-02-28").unwrap();
        assert_eq!(d.range_high_excl(), datetime!(1996-02-29 0:00));

        // centuries are only leap years when divisible by 400
        let d = DateValue::parse("1900-02-28").unwrap();
        assert_eq!(d.range_high_excl(), datetime!(1900-03-01 0:00));

        let d = DateValue::parse("2000-02-28").unwrap();
        assert_eq!(d.range_high_excl(), datetime!(2000-02-29 0:00));
    }

    #[test]
    fn test_range_width_is_one_calendar_unit() {
        let cases = [
            ("2000", Duration::days(366)),
            ("1900", Duration::days(365)),
            ("2000-02", Duration::days(29)),
            ("1900-02", Duration::days(28)),
            ("2013-12", Duration::days(31)),
            ("2000-02-29", Duration::DAY),
            ("2013-12-31T23:59Z", Duration::MINUTE),
            ("2013-12-31T23:59:59Z", Duration::SECOND),
            ("2013-12-31T23:59:59.999Z", Duration::MILLISECOND),
        ];
        for (raw, width) in cases {
            let d = DateValue::parse(raw).unwrap();
            assert!(d.range_low_incl() <= d.instant());
            assert!(d.instant() < d.range_high_excl());
            assert_eq!(d.range_high_excl() - d.range_low_incl(), width, "{raw}");
        }
    }

    #[test]
    fn test_year_end_rolls_over() {
        let d = DateValue::parse("2013-12-31T23:59:59.999").unwrap();
        assert_eq!(d.range_high_excl(), datetime!(2014-01-01 0:00));
    }

    #[test]
    fn test_date_prefixes() {
        let d = DateValue::parse("gt2013-01-02T12:13").unwrap();
        assert_eq!(d.prefix, SearchPrefix::Gt);
        assert_eq!(d.to_string(), "gt2013-01-02T12:13");

        let d = DateValue::parse("eq2013").unwrap();
        assert_eq!(d.prefix, SearchPrefix::Eq);
        assert_eq!(d.to_string(), "2013");

        let d = DateValue::parse("ap2013-06").unwrap();
        assert_eq!(d.prefix, SearchPrefix::Ap);
    }

    #[test]
    fn test_positive_and_extreme_offsets() {
        let d = DateValue::parse("2013-01-02T12:13+05:30").unwrap();
        assert_eq!(d.zone, DateZone::Fixed(offset!(+5:30)));
        assert_eq!(d.to_string(), "2013-01-02T12:13+05:30");

        let d = DateValue::parse("2013-01-02T12:13+14:00").unwrap();
        assert_eq!(d.zone, DateZone::Fixed(offset!(+14)));
    }

    #[test]
    fn test_invalid_dates_are_errors() {
        assert!(matches!(
            DateValue::parse("not-a-date"),
            Err(ParseError::InvalidDate { .. })
        ));
        assert!(DateValue::parse("").is_err());
        assert!(DateValue::parse("13-01-02").is_err());
        // passes the grammar but not the calendar
        assert!(DateValue::parse("2013-02-30").is_err());
        assert!(DateValue::parse("2013-01-00").is_err());
    }

    #[test]
    fn test_trailing_text_is_error() {
        // an unencoded `+` arrives as a space after form decoding
        for raw in [
            "2013-01-02T12:13 05:30",
            "2013-01-02T12:13+05",
            "2013-01-02T12:1",
            "2013-01-02T12:13:14Zjunk",
            "1974-13",
            "2013-01-02 ",
            "2013-01-02T12Z5",
            "2013Zx",
        ] {
            assert!(
                matches!(DateValue::parse(raw), Err(ParseError::InvalidDate { .. })),
                "{raw}"
            );
        }
    }

    #[test]
    fn test_range_past_calendar_end_is_error() {
        assert!(matches!(
            DateValue::parse("9999"),
            Err(ParseError::DateOutOfRange(_))
        ));
    }
}
