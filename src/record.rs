//! Diary records and their typed column values.
//!
//! One [`Record`] holds one day of the archive. Columns are a closed set
//! ([`Column`]); reading a column out of a record yields an owned [`Value`]
//! or `None` when the day has nothing recorded for it.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, TimeDelta};

use crate::error::QueryError;

/// Display format for dates, matching the archive file.
pub const DATE_FORMAT: &str = "%m/%d/%Y";

/// Separator between names in the `people` column of the archive file.
pub const PEOPLE_SEPARATOR: &str = ", ";

/// A column of the diary archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Date,
    Year,
    Month,
    Weekday,
    Summary,
    Happiness,
    Recording,
    People,
}

impl Column {
    /// Every column, in archive order.
    pub const ALL: [Column; 8] = [
        Column::Date,
        Column::Year,
        Column::Month,
        Column::Weekday,
        Column::Summary,
        Column::Happiness,
        Column::Recording,
        Column::People,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Column::Date => "date",
            Column::Year => "year",
            Column::Month => "month",
            Column::Weekday => "weekday",
            Column::Summary => "summary",
            Column::Happiness => "happiness",
            Column::Recording => "recording",
            Column::People => "people",
        }
    }

    /// Whether the column holds numbers and can scale a plot axis.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Column::Year | Column::Happiness)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Column {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Column::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| QueryError::UnknownColumn(s.to_string()))
    }
}

/// A single cell value read out of a record.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Date(NaiveDate),
    Int(i64),
    Number(f64),
    Text(String),
}

impl Value {
    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Number(x) => Some(*x),
            Value::Date(_) | Value::Text(_) => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.as_f64().is_some()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            Value::Int(n) => write!(f, "{n}"),
            Value::Number(x) => write!(f, "{x:.1}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

/// One day of the diary.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub date: NaiveDate,
    pub year: i32,
    pub month: String,
    pub weekday: String,
    pub summary: Option<String>,
    pub happiness: Option<f64>,
    pub recording: Option<String>,
    pub people: Vec<String>,
}

impl Record {
    /// Create an empty entry for `date`, deriving year, month and weekday.
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            year: date.year(),
            month: date.format("%B").to_string(),
            weekday: date.format("%A").to_string(),
            summary: None,
            happiness: None,
            recording: None,
            people: Vec::new(),
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_happiness(mut self, happiness: f64) -> Self {
        self.happiness = Some(happiness);
        self
    }

    pub fn with_recording(mut self, recording: impl Into<String>) -> Self {
        self.recording = Some(recording.into());
        self
    }

    pub fn with_people<I, S>(mut self, people: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.people = people.into_iter().map(Into::into).collect();
        self
    }

    /// Read one column. Blank text and an empty people list count as absent.
    pub fn value(&self, column: Column) -> Option<Value> {
        match column {
            Column::Date => Some(Value::Date(self.date)),
            Column::Year => Some(Value::Int(i64::from(self.year))),
            Column::Month => non_blank(&self.month),
            Column::Weekday => non_blank(&self.weekday),
            Column::Summary => self.summary.as_deref().and_then(non_blank),
            Column::Happiness => self.happiness.map(Value::Number),
            Column::Recording => self.recording.as_deref().and_then(non_blank),
            Column::People => {
                if self.people.is_empty() {
                    None
                } else {
                    Some(Value::Text(self.people.join(PEOPLE_SEPARATOR)))
                }
            }
        }
    }
}

fn non_blank(s: &str) -> Option<Value> {
    let s = s.trim();
    if s.is_empty() {
        None
    } else {
        Some(Value::Text(s.to_string()))
    }
}

/// Whether `value` is one of the half-step ratings 1.0, 1.5, ... 5.0.
pub fn is_valid_happiness(value: f64) -> bool {
    (1.0..=5.0).contains(&value) && (value * 2.0).fract() == 0.0
}

/// Parse an `hours:minutes:seconds` duration.
///
/// Returns `None` for anything that is not three non-negative integers.
pub fn parse_hms(s: &str) -> Option<TimeDelta> {
    let mut parts = s.trim().split(':');
    let hours: i64 = parts.next()?.trim().parse().ok()?;
    let minutes: i64 = parts.next()?.trim().parse().ok()?;
    let seconds: i64 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() || hours < 0 || minutes < 0 || seconds < 0 {
        return None;
    }
    Some(TimeDelta::seconds(hours * 3600 + minutes * 60 + seconds))
}

/// Format a duration as `H:MM:SS`, with hours unbounded.
pub fn format_hms(duration: TimeDelta) -> String {
    let total = duration.num_seconds().max(0);
    format!("{}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}
