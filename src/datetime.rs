//! Calendar values and their DATETIME wire representation.
//!
//! [`Tm`] follows the C `struct tm` layout: years count from 1900 and months
//! from 0. [`MysqlTime`] is what travels over the wire: calendar year, 1-based
//! month. Conversions between them are plain field offsets; the wire-to-native
//! direction additionally normalizes the value the way `mktime` does.

use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeDelta, Timelike};

use crate::error::{Error, Result};

/// A broken-down calendar time.
///
/// Equality only compares the calendar fields (`year`, `mon`, `mday`, `hour`,
/// `min`, `sec`); `wday`, `yday` and `isdst` are derived data.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tm {
    /// Seconds after the minute.
    pub sec: i32,
    /// Minutes after the hour.
    pub min: i32,
    /// Hours since midnight.
    pub hour: i32,
    /// Day of the month, from 1.
    pub mday: i32,
    /// Months since January, from 0.
    pub mon: i32,
    /// Years since 1900.
    pub year: i32,
    /// Days since Sunday.
    pub wday: i32,
    /// Days since January 1st.
    pub yday: i32,
    /// Daylight saving flag: positive, zero, or -1 when unknown.
    pub isdst: i32,
}

impl Tm {
    /// Builds a calendar time from a calendar year and a 1-based month.
    ///
    /// Out-of-range arguments saturate; converting the result then fails
    /// with [`Error::InvalidDateTime`].
    pub fn new(year: i32, month: i32, day: i32, hour: i32, min: i32, sec: i32) -> Self {
        Self {
            sec,
            min,
            hour,
            mday: day,
            mon: month.saturating_sub(1),
            year: year.saturating_sub(1900),
            ..Self::default()
        }
    }

    /// Converts to the wire representation.
    pub fn to_mysql_time(&self) -> MysqlTime {
        MysqlTime {
            year: i64::from(self.year) + 1900,
            month: i64::from(self.mon) + 1,
            day: i64::from(self.mday),
            hour: i64::from(self.hour),
            minute: i64::from(self.min),
            second: i64::from(self.sec),
        }
    }

    /// Converts from the wire representation, then normalizes.
    pub fn from_mysql_time(time: &MysqlTime) -> Result<Self> {
        let field = |value: Option<i64>| {
            value
                .and_then(|value| i32::try_from(value).ok())
                .ok_or_else(|| Error::InvalidDateTime(format!("{time:?}")))
        };
        let mut tm = Self {
            sec: field(Some(time.second))?,
            min: field(Some(time.minute))?,
            hour: field(Some(time.hour))?,
            mday: field(Some(time.day))?,
            mon: field(time.month.checked_sub(1))?,
            year: field(time.year.checked_sub(1900))?,
            wday: 0,
            yday: 0,
            isdst: -1,
        };
        tm.normalize()?;
        Ok(tm)
    }

    /// Brings every field back into its range, carrying overflow into the
    /// larger units, and recomputes `wday` and `yday`. `isdst` becomes -1.
    pub fn normalize(&mut self) -> Result<()> {
        let invalid = || Error::InvalidDateTime(format!("{self:?}"));

        let year = i64::from(self.year) + 1900 + i64::from(self.mon.div_euclid(12));
        let year = i32::try_from(year).map_err(|_| invalid())?;
        let month = self.mon.rem_euclid(12) as u32 + 1;
        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .ok_or_else(invalid)?;

        let offset = (i64::from(self.mday) - 1) * 86_400
            + i64::from(self.hour) * 3_600
            + i64::from(self.min) * 60
            + i64::from(self.sec);
        let datetime = TimeDelta::try_seconds(offset)
            .and_then(|delta| first.checked_add_signed(delta))
            .ok_or_else(invalid)?;

        *self = Self::from_naive(&datetime);
        Ok(())
    }

    /// Converts to a chrono value, failing on out-of-range fields.
    pub fn to_naive(&self) -> Result<NaiveDateTime> {
        self.to_mysql_time().to_naive()
    }

    /// Converts from a chrono value.
    pub fn from_naive(datetime: &NaiveDateTime) -> Self {
        Self {
            sec: datetime.second() as i32,
            min: datetime.minute() as i32,
            hour: datetime.hour() as i32,
            mday: datetime.day() as i32,
            mon: datetime.month0() as i32,
            year: datetime.year() - 1900,
            wday: datetime.weekday().num_days_from_sunday() as i32,
            yday: datetime.ordinal0() as i32,
            isdst: -1,
        }
    }
}

impl PartialEq for Tm {
    fn eq(&self, other: &Self) -> bool {
        self.sec == other.sec
            && self.min == other.min
            && self.hour == other.hour
            && self.mday == other.mday
            && self.mon == other.mon
            && self.year == other.year
    }
}

impl Eq for Tm {}

/// DATETIME value as exchanged with the server.
///
/// Fields are wide enough to hold any [`Tm`] after the year and month offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MysqlTime {
    pub year: i64,
    pub month: i64,
    pub day: i64,
    pub hour: i64,
    pub minute: i64,
    pub second: i64,
}

impl MysqlTime {
    pub fn to_naive(&self) -> Result<NaiveDateTime> {
        let unsigned = |v: i64| u32::try_from(v).ok();
        i32::try_from(self.year)
            .ok()
            .zip(unsigned(self.month))
            .zip(unsigned(self.day))
            .and_then(|((year, month), day)| NaiveDate::from_ymd_opt(year, month, day))
            .and_then(|date| {
                date.and_hms_opt(
                    unsigned(self.hour)?,
                    unsigned(self.minute)?,
                    unsigned(self.second)?,
                )
            })
            .ok_or_else(|| Error::InvalidDateTime(format!("{self:?}")))
    }

    pub fn from_naive(datetime: &NaiveDateTime) -> Self {
        Self {
            year: i64::from(datetime.year()),
            month: i64::from(datetime.month()),
            day: i64::from(datetime.day()),
            hour: i64::from(datetime.hour()),
            minute: i64::from(datetime.minute()),
            second: i64::from(datetime.second()),
        }
    }
}
