use chrono::{Datelike, Duration, Local, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;
use thiserror::Error;

pub const MIN_YEAR: i32 = 1;
pub const MAX_YEAR: i32 = 9999;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeekError {
    #[error("invalid week index: week {week} of year {year}")]
    InvalidWeekIndex { week: i64, year: i64 },
    #[error("cannot parse week index from {0:?} (expected \"<week> <year>\")")]
    Unparseable(String),
}

/// An ISO-8601 week (`week` 1..=52/53 of ISO `year`).
///
/// Ordering is calendar order: `year` is compared before `week`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawWeekIndex", into = "RawWeekIndex")]
pub struct WeekIndex {
    year: i32,
    week: u32,
}

#[derive(Serialize, Deserialize)]
struct RawWeekIndex {
    week: u32,
    year: i32,
}

impl TryFrom<RawWeekIndex> for WeekIndex {
    type Error = WeekError;

    fn try_from(raw: RawWeekIndex) -> Result<Self, Self::Error> {
        WeekIndex::new(raw.week, raw.year)
    }
}

impl From<WeekIndex> for RawWeekIndex {
    fn from(value: WeekIndex) -> Self {
        Self {
            week: value.week,
            year: value.year,
        }
    }
}

/// Number of ISO weeks in `year` (52 or 53).
///
/// Dec 28 always falls in the final ISO week of its year. Years chrono
/// cannot represent report 52.
pub fn weeks_in_year(year: i32) -> u32 {
    NaiveDate::from_ymd_opt(year, 12, 28)
        .map(|date| date.iso_week().week())
        .unwrap_or(52)
}

impl WeekIndex {
    pub fn new(week: u32, year: i32) -> Result<Self, WeekError> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) || week < 1 || week > weeks_in_year(year) {
            return Err(WeekError::InvalidWeekIndex {
                week: week.into(),
                year: year.into(),
            });
        }
        Ok(Self { year, week })
    }

    pub fn from_date(date: NaiveDate) -> Result<Self, WeekError> {
        let iso = date.iso_week();
        Self::new(iso.week(), iso.year())
    }

    pub fn today() -> Self {
        // Local dates are always inside the supported year range.
        Self::from_date(Local::now().date_naive()).expect("current date has a valid ISO week")
    }

    pub fn week(&self) -> u32 {
        self.week
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn monday(&self) -> NaiveDate {
        self.date_on(Weekday::Mon)
    }

    pub fn date_on(&self, weekday: Weekday) -> NaiveDate {
        NaiveDate::from_isoywd_opt(self.year, self.week, weekday)
            .expect("validated week index always maps to a date")
    }

    /// Whole weeks between 0001-01-01 (day 1) and this week's Monday,
    /// i.e. `floor(ordinal(monday) / 7)`.
    pub fn weeks_since_epoch(&self) -> i64 {
        i64::from(self.monday().num_days_from_ce()) / 7
    }

    pub fn checked_add_weeks(&self, weeks: i64) -> Result<Self, WeekError> {
        let out_of_range = || WeekError::InvalidWeekIndex {
            week: i64::from(self.week) + weeks,
            year: self.year.into(),
        };
        let delta = Duration::try_weeks(weeks).ok_or_else(out_of_range)?;
        let date = self
            .monday()
            .checked_add_signed(delta)
            .ok_or_else(out_of_range)?;
        Self::from_date(date).map_err(|_| out_of_range())
    }

    pub fn checked_sub_weeks(&self, weeks: i64) -> Result<Self, WeekError> {
        self.checked_add_weeks(-weeks)
    }

    pub fn next(&self) -> Self {
        *self + 1
    }

    pub fn prev(&self) -> Self {
        *self - 1
    }

    /// Signed number of weeks from `other` to `self`.
    pub fn weeks_since(&self, other: WeekIndex) -> i64 {
        (self.monday() - other.monday()).num_days() / 7
    }
}

impl Add<i64> for WeekIndex {
    type Output = WeekIndex;

    /// Panics when the result leaves years 1..=9999; use
    /// [`WeekIndex::checked_add_weeks`] to handle that case.
    fn add(self, weeks: i64) -> Self::Output {
        match self.checked_add_weeks(weeks) {
            Ok(week) => week,
            Err(err) => panic!("week arithmetic overflow: {err}"),
        }
    }
}

impl Sub<i64> for WeekIndex {
    type Output = WeekIndex;

    fn sub(self, weeks: i64) -> Self::Output {
        self + weeks.saturating_neg()
    }
}

impl Sub<WeekIndex> for WeekIndex {
    type Output = i64;

    fn sub(self, other: WeekIndex) -> Self::Output {
        self.weeks_since(other)
    }
}

impl fmt::Display for WeekIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.week, self.year)
    }
}

impl FromStr for WeekIndex {
    type Err = WeekError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split_whitespace().collect();
        let unparseable = || WeekError::Unparseable(s.to_string());
        let [week, year] = parts.as_slice() else {
            return Err(unparseable());
        };
        let week: u32 = week.parse().map_err(|_| unparseable())?;
        let year: i32 = year.parse().map_err(|_| unparseable())?;
        Self::new(week, year)
    }
}
