//! Parsing of sensor timestamps.
//!
//! The sensor node stamps every sample with a local date-time string such as
//! `15-Mar-2024 12:34:56`, and keys the record by the same value with
//! separators swapped (`15-Mar-2024_12-34-56`). Older records use full month
//! names or month numbers. [`SensorTimestamp`] accepts all of these.

use core::fmt;
use core::str::FromStr;

use time::{Month, Time};

use crate::error::{ParseError, ParseResult};

const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// A parsed `day-month-year[ time]` sensor timestamp.
///
/// No time zone is attached: the node writes wall-clock time and the
/// dashboard displays it as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SensorTimestamp {
    day: u8,
    month: Month,
    year: i32,
    time: Option<Time>,
}

impl SensorTimestamp {
    /// Parse a sensor timestamp.
    ///
    /// Date components may be separated by `-` or `_`; the optional time of
    /// day may follow a space or underscore as `HH:MM:SS` or `HH-MM-SS`. A
    /// time component that cannot be read is ignored rather than rejected.
    ///
    /// # Examples
    ///
    /// ```
    /// use sensordash_types::SensorTimestamp;
    /// use time::Month;
    ///
    /// let ts = SensorTimestamp::parse("15-March-2024").unwrap();
    /// assert_eq!(ts.month(), Month::March);
    ///
    /// let ts = SensorTimestamp::parse("3_Jan_2025_07-05-09").unwrap();
    /// assert_eq!(ts.day(), 3);
    /// assert!(ts.time().is_some());
    /// ```
    pub fn parse(raw: &str) -> ParseResult<Self> {
        let tokens: Vec<&str> = raw
            .trim()
            .split(['-', '_', ' '])
            .filter(|t| !t.is_empty())
            .collect();

        if tokens.len() < 3 {
            return Err(ParseError::InvalidTimestamp(raw.to_string()));
        }

        let day: u8 = tokens[0]
            .parse()
            .ok()
            .filter(|d| (1..=31).contains(d))
            .ok_or_else(|| ParseError::InvalidTimestamp(raw.to_string()))?;
        let month = parse_month(tokens[1])?;
        let year: i32 = tokens[2]
            .parse()
            .map_err(|_| ParseError::InvalidTimestamp(raw.to_string()))?;

        let time = parse_time(&tokens[3..]);

        Ok(Self {
            day,
            month,
            year,
            time,
        })
    }

    /// Day of the month (1-31).
    #[must_use]
    pub fn day(&self) -> u8 {
        self.day
    }

    /// Calendar month.
    #[must_use]
    pub fn month(&self) -> Month {
        self.month
    }

    /// Calendar month as a number in 1..=12.
    #[must_use]
    pub fn month_number(&self) -> u8 {
        self.month as u8
    }

    /// Year.
    #[must_use]
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Time of day, if the timestamp carried one.
    #[must_use]
    pub fn time(&self) -> Option<Time> {
        self.time
    }

    /// Key ordering timestamps chronologically. A missing time sorts as
    /// midnight.
    #[must_use]
    pub fn sort_key(&self) -> (i32, u8, u8, u8, u8, u8) {
        let (h, m, s) = self
            .time
            .map(|t| (t.hour(), t.minute(), t.second()))
            .unwrap_or((0, 0, 0));
        (self.year, self.month as u8, self.day, h, m, s)
    }

    /// Compact label used on chart axes, e.g. `15 Mar 12:34`.
    #[must_use]
    pub fn short_label(&self) -> String {
        let month = &MONTH_NAMES[self.month as usize - 1][..3];
        let mut label = format!("{} {}{}", self.day, month[..1].to_uppercase(), &month[1..]);
        if let Some(t) = self.time {
            label.push_str(&format!(" {:02}:{:02}", t.hour(), t.minute()));
        }
        label
    }
}

impl fmt::Display for SensorTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let month = &MONTH_NAMES[self.month as usize - 1][..3];
        write!(
            f,
            "{}-{}{}-{}",
            self.day,
            month[..1].to_uppercase(),
            &month[1..],
            self.year
        )?;
        if let Some(t) = self.time {
            write!(f, " {:02}:{:02}:{:02}", t.hour(), t.minute(), t.second())?;
        }
        Ok(())
    }
}

impl FromStr for SensorTimestamp {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Parse a month given as a number (`3`, `03`), a full name (`March`) or an
/// abbreviation of at least three letters (`Mar`, `Sept`). Case-insensitive.
pub fn parse_month(token: &str) -> ParseResult<Month> {
    let token = token.trim();

    if let Ok(n) = token.parse::<u8>() {
        return Month::try_from(n).map_err(|_| ParseError::InvalidMonth(token.to_string()));
    }

    let lower = token.to_lowercase();
    if lower.len() >= 3 {
        for (idx, name) in MONTH_NAMES.iter().enumerate() {
            if name.starts_with(&lower) {
                // idx is in 0..12
                return Month::try_from(idx as u8 + 1)
                    .map_err(|_| ParseError::InvalidMonth(token.to_string()));
            }
        }
    }

    Err(ParseError::InvalidMonth(token.to_string()))
}

/// English name of a month number, or `None` outside 1..=12.
#[must_use]
pub fn month_name(month: u8) -> Option<&'static str> {
    const DISPLAY: [&str; 12] = [
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
    DISPLAY.get(usize::from(month).checked_sub(1)?).copied()
}

fn parse_time(tokens: &[&str]) -> Option<Time> {
    let parts: Vec<&str> = match tokens {
        [] => return None,
        [single] => single.split(':').collect(),
        many => many.to_vec(),
    };

    let mut nums = parts.iter().map(|p| p.parse::<u8>().ok());
    let hour = nums.next()??;
    let minute = nums.next().flatten().unwrap_or(0);
    let second = nums.next().flatten().unwrap_or(0);
    Time::from_hms(hour, minute, second).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_firmware_format() {
        let ts = SensorTimestamp::parse("15-Mar-2024 12:34:56").unwrap();
        assert_eq!(ts.day(), 15);
        assert_eq!(ts.month(), Month::March);
        assert_eq!(ts.year(), 2024);
        assert_eq!(ts.time(), Time::from_hms(12, 34, 56).ok());
    }

    #[test]
    fn test_parse_key_format() {
        let ts = SensorTimestamp::parse("15-Mar-2024_12-34-56").unwrap();
        assert_eq!(ts.month_number(), 3);
        assert_eq!(ts.time(), Time::from_hms(12, 34, 56).ok());
    }

    #[test]
    fn test_parse_underscore_date() {
        let ts = SensorTimestamp::parse("1_December_2023").unwrap();
        assert_eq!(ts.day(), 1);
        assert_eq!(ts.month(), Month::December);
        assert!(ts.time().is_none());
    }

    #[test]
    fn test_parse_full_month_name() {
        let ts = SensorTimestamp::parse("15-March-2024").unwrap();
        assert_eq!(ts.month_number(), 3);
    }

    #[test]
    fn test_parse_numeric_month() {
        let ts = SensorTimestamp::parse("07-11-2024").unwrap();
        assert_eq!(ts.month(), Month::November);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(SensorTimestamp::parse("").is_err());
        assert!(SensorTimestamp::parse("yesterday").is_err());
        assert!(SensorTimestamp::parse("15-Foo-2024").is_err());
        assert!(SensorTimestamp::parse("0-Mar-2024").is_err());
        assert!(SensorTimestamp::parse("15-13-2024").is_err());
    }

    #[test]
    fn test_bad_time_is_ignored() {
        let ts = SensorTimestamp::parse("15-Mar-2024 xx:yy").unwrap();
        assert!(ts.time().is_none());
    }

    #[test]
    fn test_parse_month_abbreviations() {
        assert_eq!(parse_month("Sept").unwrap(), Month::September);
        assert_eq!(parse_month("jun").unwrap(), Month::June);
        assert_eq!(parse_month("DEC").unwrap(), Month::December);
        assert!(parse_month("ma").is_err());
        assert!(parse_month("0").is_err());
    }

    #[test]
    fn test_sort_key_orders_chronologically() {
        let a = SensorTimestamp::parse("31-Jan-2024 23:59:59").unwrap();
        let b = SensorTimestamp::parse("1-Feb-2024 00:00:00").unwrap();
        let c = SensorTimestamp::parse("1-Feb-2024 00:00:01").unwrap();
        assert!(a.sort_key() < b.sort_key());
        assert!(b.sort_key() < c.sort_key());
    }

    #[test]
    fn test_display_round_trips_firmware_format() {
        let ts = SensorTimestamp::parse("5_Aug_2024_09-03-07").unwrap();
        assert_eq!(ts.to_string(), "5-Aug-2024 09:03:07");
        assert_eq!(ts.short_label(), "5 Aug 09:03");
    }

    #[test]
    fn test_month_name() {
        assert_eq!(month_name(3), Some("March"));
        assert_eq!(month_name(0), None);
        assert_eq!(month_name(13), None);
    }

    proptest! {
        #[test]
        fn prop_numeric_and_named_months_agree(month in 1u8..=12, day in 1u8..=28, year in 2000i32..2100) {
            let name = month_name(month).unwrap();
            let named = SensorTimestamp::parse(&format!("{day}-{name}-{year}")).unwrap();
            let short = SensorTimestamp::parse(&format!("{day}_{}_{year}", &name[..3])).unwrap();
            let numeric = SensorTimestamp::parse(&format!("{day}-{month}-{year}")).unwrap();
            prop_assert_eq!(named.month_number(), month);
            prop_assert_eq!(short.month_number(), month);
            prop_assert_eq!(numeric.month_number(), month);
        }
    }
}
