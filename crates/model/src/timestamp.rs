use crate::error::{Error, ErrorKind};
use exn::ResultExt;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

/// A logical version marker.
///
/// Derived once from a real instant (see [`from_datetime`](Self::from_datetime))
/// and afterwards only ever compared. The encoding is the decimal number
/// `yyyyMMddHHmmss` in UTC, so ordering the integers orders the instants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The timestamp of anything that never declared one.
    pub const ZERO: Self = Self(0);

    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    /// Encode a real instant as a logical timestamp.
    ///
    /// ```
    /// use time::macros::datetime;
    /// use upsite_model::Timestamp;
    ///
    /// let ts = Timestamp::from_datetime(datetime!(2024-01-31 23:59:59 +01:00));
    /// assert_eq!(ts.get(), 20240131225959);
    /// ```
    pub fn from_datetime(instant: OffsetDateTime) -> Self {
        let utc = instant.to_offset(UtcOffset::UTC);
        // Years before the common era don't occur in last-modified headers.
        let year = u64::try_from(utc.year()).unwrap_or(0);
        Self(
            year * 10_000_000_000
                + u64::from(u8::from(utc.month())) * 100_000_000
                + u64::from(utc.day()) * 1_000_000
                + u64::from(utc.hour()) * 10_000
                + u64::from(utc.minute()) * 100
                + u64::from(utc.second()),
        )
    }

    /// The logical timestamp of the current instant.
    pub fn now() -> Self {
        Self::from_datetime(OffsetDateTime::now_utc())
    }

    /// Decode back into the UTC instant it was derived from, if it was
    /// derived from one at all (hand-written indexes use small integers).
    pub fn to_datetime(self) -> Option<OffsetDateTime> {
        let value = self.0;
        let year = i32::try_from(value / 10_000_000_000).ok()?;
        let month = Month::try_from(u8::try_from(value / 100_000_000 % 100).ok()?).ok()?;
        let day = u8::try_from(value / 1_000_000 % 100).ok()?;
        let hour = u8::try_from(value / 10_000 % 100).ok()?;
        let minute = u8::try_from(value / 100 % 100).ok()?;
        let second = u8::try_from(value % 100).ok()?;
        let date = Date::from_calendar_date(year, month, day).ok()?;
        let time = Time::from_hms(hour, minute, second).ok()?;
        Some(PrimitiveDateTime::new(date, time).assume_utc())
    }
}

impl From<u64> for Timestamp {
    fn from(value: u64) -> Self {
        Self(value)
    }
}
impl From<OffsetDateTime> for Timestamp {
    fn from(instant: OffsetDateTime) -> Self {
        Self::from_datetime(instant)
    }
}
impl FromStr for Timestamp {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(Self).or_raise(|| ErrorKind::ParseError {
            field: "timestamp",
            value: s.to_string(),
        })
    }
}
impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}
