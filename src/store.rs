//! Loading the diary archive from its CSV file.
//!
//! The file has a header row and one row per day:
//! ```text
//! date,year,month,weekday,summary,happiness,recording,people
//! 01/01/2021,2021,January,Friday,Went skating,4.5,0:12:40,"Alice Smith, Bob Jones"
//! ```
//!
//! Year, month and weekday are recomputed from the date. Older files name
//! the recording column `duration`; both are accepted.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::LoadError;
use crate::record::{Record, is_valid_happiness};
use crate::table::Archive;
use crate::validate::parse_date;

#[derive(Debug, Deserialize)]
struct Row {
    date: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    happiness: Option<String>,
    #[serde(default, alias = "duration")]
    recording: Option<String>,
    #[serde(default)]
    people: Option<String>,
}

/// Load the archive at `path`.
pub fn load_archive(path: &Path) -> Result<Archive, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let archive = read_archive(file)?;
    info!(path = %path.display(), entries = archive.len(), "archive loaded");
    Ok(archive)
}

/// Read an archive from CSV text.
///
/// Rows must be in strictly increasing date order.
pub fn read_archive<R: Read>(reader: R) -> Result<Archive, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = reader.headers()?.clone();

    let mut records: Vec<Record> = Vec::new();
    for result in reader.records() {
        let raw = result?;
        let line = raw.position().map_or(0, |p| p.line());
        let row: Row = raw.deserialize(Some(&headers))?;

        let date = parse_date(&row.date).map_err(|_| LoadError::InvalidDate {
            line,
            value: row.date.clone(),
        })?;
        if let Some(previous) = records.last()
            && previous.date >= date
        {
            return Err(LoadError::OutOfOrder {
                line,
                date: row.date,
            });
        }

        let mut record = Record::new(date);
        record.summary = row.summary.filter(|s| !s.is_empty());
        record.happiness = row.happiness.and_then(|h| parse_happiness(&h, line));
        record.recording = row.recording.filter(|s| !s.is_empty());
        record.people = row.people.as_deref().map(parse_people).unwrap_or_default();
        records.push(record);
    }

    Ok(Archive::new(records))
}

fn parse_happiness(text: &str, line: u64) -> Option<f64> {
    if text.is_empty() {
        return None;
    }
    match text.parse::<f64>() {
        Ok(value) if is_valid_happiness(value) => Some(value),
        _ => {
            warn!(line, value = text, "ignoring happiness outside the 1.0-5.0 half-step scale");
            None
        }
    }
}

/// Split a people cell into names.
///
/// Accepts `Alice, Bob` as well as the bracketed list form
/// `['Alice', 'Bob']` found in older files.
fn parse_people(text: &str) -> Vec<String> {
    let text = text.trim();
    let text = text
        .strip_prefix('[')
        .and_then(|t| t.strip_suffix(']'))
        .unwrap_or(text);
    text.split(',')
        .map(|name| name.trim().trim_matches(|c| c == '\'' || c == '"').trim())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
