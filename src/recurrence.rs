//! Recurrence rules deciding which weeks a chore is due in.
//!
//! Rules have a stable text form that is persisted with chore configuration:
//!
//! ```text
//! Once per 2 weeks on Monday with offset 1.
//! Once per week.
//! Weeks on Friday in 2025: 3 7 11.
//! Weeks in 2025: 51 52; in 2026: 1.
//! ```

use crate::week::{WeekError, WeekIndex};
use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Display names indexed by the rule's weekday number; 0 is "any day".
const DAY_NAMES: [&str; 8] = [
    "Week",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

const ALL_WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("unrecognized recurrence rule syntax: {0:?}")]
    UnrecognizedRuleSyntax(String),
    #[error("unsupported recurrence rule: {0:?}")]
    Unsupported(String),
    #[error("invalid weekday {0:?} (expected Monday..Sunday or 0..=7)")]
    InvalidWeekday(String),
    #[error("interval must be at least 1 (got {0})")]
    InvalidInterval(u32),
    #[error("offset {offset} must be smaller than interval {interval}")]
    InvalidOffset { offset: u32, interval: u32 },
    #[error("explicit week rule needs at least one week")]
    EmptyWeekSet,
    #[error(transparent)]
    Week(#[from] WeekError),
}

pub fn weekday_name(weekday: u8) -> Option<&'static str> {
    match weekday {
        1..=7 => Some(DAY_NAMES[weekday as usize]),
        _ => None,
    }
}

/// Parses a weekday name ("monday", "SUNDAY") into 1..=7. "week" maps to 0.
pub fn parse_weekday(name: &str) -> Result<u8, RuleError> {
    let needle = name.trim();
    DAY_NAMES
        .iter()
        .position(|candidate| candidate.eq_ignore_ascii_case(needle))
        .map(|idx| idx as u8)
        .ok_or_else(|| RuleError::InvalidWeekday(name.to_string()))
}

fn validate_weekday(weekday: u8) -> Result<u8, RuleError> {
    if weekday > 7 {
        return Err(RuleError::InvalidWeekday(weekday.to_string()));
    }
    Ok(weekday)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Periodic {
    weekday: u8,
    interval: u32,
    offset: u32,
}

impl Periodic {
    pub fn weekday(&self) -> u8 {
        self.weekday
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    fn is_due(&self, week: WeekIndex) -> bool {
        let shifted = week.weeks_since_epoch() + i64::from(self.offset);
        shifted.rem_euclid(i64::from(self.interval)) == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplicitWeeks {
    weekday: u8,
    weeks: BTreeSet<WeekIndex>,
}

impl ExplicitWeeks {
    pub fn weekday(&self) -> u8 {
        self.weekday
    }

    pub fn weeks(&self) -> &BTreeSet<WeekIndex> {
        &self.weeks
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RecurrenceRule {
    Periodic(Periodic),
    ExplicitWeeks(ExplicitWeeks),
}

impl RecurrenceRule {
    pub fn periodic(weekday: u8, interval: u32, offset: u32) -> Result<Self, RuleError> {
        let weekday = validate_weekday(weekday)?;
        if interval == 0 {
            return Err(RuleError::InvalidInterval(interval));
        }
        if offset >= interval {
            return Err(RuleError::InvalidOffset { offset, interval });
        }
        Ok(Self::Periodic(Periodic {
            weekday,
            interval,
            offset,
        }))
    }

    pub fn weekly() -> Self {
        Self::Periodic(Periodic {
            weekday: 0,
            interval: 1,
            offset: 0,
        })
    }

    pub fn explicit<I>(weekday: u8, weeks: I) -> Result<Self, RuleError>
    where
        I: IntoIterator<Item = WeekIndex>,
    {
        let weekday = validate_weekday(weekday)?;
        let weeks: BTreeSet<WeekIndex> = weeks.into_iter().collect();
        if weeks.is_empty() {
            return Err(RuleError::EmptyWeekSet);
        }
        Ok(Self::ExplicitWeeks(ExplicitWeeks { weekday, weeks }))
    }

    pub fn weekday(&self) -> u8 {
        match self {
            RecurrenceRule::Periodic(rule) => rule.weekday,
            RecurrenceRule::ExplicitWeeks(rule) => rule.weekday,
        }
    }

    pub fn is_due(&self, week: WeekIndex) -> bool {
        match self {
            RecurrenceRule::Periodic(rule) => rule.is_due(week),
            RecurrenceRule::ExplicitWeeks(rule) => rule.weeks.contains(&week),
        }
    }

    /// First due week in `from..=from + horizon`.
    pub fn next_due_on_or_after(&self, from: WeekIndex, horizon: u32) -> Option<WeekIndex> {
        (0..=i64::from(horizon))
            .map_while(|n| from.checked_add_weeks(n).ok())
            .find(|week| self.is_due(*week))
    }

    pub fn due_weekday(&self) -> Option<Weekday> {
        match self.weekday() {
            0 => None,
            n => Some(ALL_WEEKDAYS[usize::from(n - 1)]),
        }
    }

    /// Text shown next to an assignment, e.g. `"Due Monday on 06/01"`.
    pub fn due_description(&self, week: WeekIndex) -> String {
        match self.due_weekday() {
            Some(weekday) => {
                let date = week.date_on(weekday);
                let name = weekday_name(self.weekday()).unwrap_or_default();
                format!("Due {} on {}", name, date.format("%d/%m"))
            }
            None => "Any day this week".to_string(),
        }
    }
}

impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let on_day = weekday_name(self.weekday())
            .map(|name| format!(" on {name}"))
            .unwrap_or_default();
        match self {
            RecurrenceRule::Periodic(rule) => {
                if rule.interval == 1 {
                    write!(f, "Once per week{on_day}")?;
                } else {
                    write!(f, "Once per {} weeks{on_day}", rule.interval)?;
                }
                if rule.offset > 0 {
                    write!(f, " with offset {}", rule.offset)?;
                }
                write!(f, ".")
            }
            RecurrenceRule::ExplicitWeeks(rule) => {
                write!(f, "Weeks{on_day}")?;
                let mut current_year = None;
                for week in &rule.weeks {
                    if current_year != Some(week.year()) {
                        if current_year.is_some() {
                            write!(f, ";")?;
                        }
                        write!(f, " in {}:", week.year())?;
                        current_year = Some(week.year());
                    }
                    write!(f, " {}", week.week())?;
                }
                write!(f, ".")
            }
        }
    }
}

impl From<RecurrenceRule> for String {
    fn from(rule: RecurrenceRule) -> Self {
        rule.to_string()
    }
}

impl TryFrom<String> for RecurrenceRule {
    type Error = RuleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for RecurrenceRule {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().trim_end_matches('.').to_ascii_lowercase();
        let spaced = normalized.replace(':', " : ").replace(';', " ; ");
        let tokens: Vec<&str> = spaced.split_whitespace().collect();
        let unrecognized = || RuleError::UnrecognizedRuleSyntax(s.to_string());

        match tokens.first().copied() {
            Some("once") => parse_periodic(&tokens).ok_or_else(unrecognized)?,
            Some("weeks") => parse_explicit(&tokens).ok_or_else(unrecognized)?,
            Some("the") if normalized.ends_with("of every month") => {
                Err(RuleError::Unsupported(s.to_string()))
            }
            _ => Err(unrecognized()),
        }
    }
}

struct Cursor<'a> {
    tokens: &'a [&'a str],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(tokens: &'a [&'a str]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<&'a str> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &str) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn number<T: FromStr>(&mut self) -> Option<T> {
        let value = self.peek()?.parse().ok()?;
        self.pos += 1;
        Some(value)
    }

    fn done(&self) -> bool {
        self.pos == self.tokens.len()
    }
}

// The outer Option signals a grammar mismatch; the inner Result carries
// semantic errors for text that matched the grammar.
fn parse_periodic(tokens: &[&str]) -> Option<Result<RecurrenceRule, RuleError>> {
    let mut cursor = Cursor::new(tokens);
    if !(cursor.eat("once") && cursor.eat("per")) {
        return None;
    }
    let interval = match cursor.number::<u32>() {
        Some(n) => n,
        None => 1,
    };
    if !(cursor.eat("week") || cursor.eat("weeks")) {
        return None;
    }
    let mut weekday = 0;
    if cursor.eat("on") {
        match parse_weekday(cursor.next()?) {
            Ok(day) => weekday = day,
            Err(err) => return Some(Err(err)),
        }
    }
    let mut offset = 0;
    if cursor.eat("with") {
        if !cursor.eat("offset") {
            return None;
        }
        offset = cursor.number::<u32>()?;
    }
    if !cursor.done() {
        return None;
    }
    Some(RecurrenceRule::periodic(weekday, interval, offset))
}

fn parse_explicit(tokens: &[&str]) -> Option<Result<RecurrenceRule, RuleError>> {
    let mut cursor = Cursor::new(tokens);
    if !cursor.eat("weeks") {
        return None;
    }
    let mut weekday = 0;
    if cursor.eat("on") {
        match parse_weekday(cursor.next()?) {
            Ok(day) => weekday = day,
            Err(err) => return Some(Err(err)),
        }
    }
    let mut weeks = Vec::new();
    loop {
        if !cursor.eat("in") {
            return None;
        }
        let year = cursor.number::<i32>()?;
        if !cursor.eat(":") {
            return None;
        }
        let mut clause_len = 0;
        while let Some(week) = cursor.number::<u32>() {
            match WeekIndex::new(week, year) {
                Ok(week) => weeks.push(week),
                Err(err) => return Some(Err(err.into())),
            }
            clause_len += 1;
        }
        if clause_len == 0 {
            return None;
        }
        if cursor.done() {
            break;
        }
        if !cursor.eat(";") {
            return None;
        }
    }
    Some(RecurrenceRule::explicit(weekday, weeks))
}
