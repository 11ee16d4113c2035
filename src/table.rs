//! The loaded archive and the views a pipeline threads through its stages.
//!
//! [`Archive`] owns the records and is never mutated after load. Every
//! command works on a [`Table`], a borrowed view holding a sub-sequence of
//! the archive's rows and an ordered list of active columns. Stages that
//! aggregate turn the table into a [`GroupedTable`] or a [`Scalar`]; the
//! three shapes travel together as a [`Frame`].

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use chrono::{NaiveDate, TimeDelta};
use tracing::debug;

use crate::error::QueryError;
use crate::record::{Column, Record, Value, format_hms, parse_hms};

/// The read-only archive snapshot loaded at session start.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Archive {
    records: Vec<Record>,
}

impl Archive {
    /// Wrap records that are already in strictly increasing date order.
    pub fn new(records: Vec<Record>) -> Self {
        debug_assert!(records.windows(2).all(|w| w[0].date < w[1].date));
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// A view over every row and every column.
    pub fn view(&self) -> Table<'_> {
        Table::new(self.records.iter().collect(), Column::ALL.to_vec())
    }
}

/// A view of archive rows restricted to a set of active columns.
///
/// Rows are always a sub-sequence of the archive in load order.
#[derive(Debug, Clone, PartialEq)]
pub struct Table<'a> {
    rows: Vec<&'a Record>,
    columns: Vec<Column>,
}

impl<'a> Table<'a> {
    pub fn new(rows: Vec<&'a Record>, columns: Vec<Column>) -> Self {
        Self { rows, columns }
    }

    pub fn rows(&self) -> &[&'a Record] {
        &self.rows
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    /// Keep rows matching `pred`, preserving order.
    pub fn filter<F>(&self, pred: F) -> Table<'a>
    where
        F: Fn(&Record) -> bool,
    {
        Table::new(
            self.rows.iter().copied().filter(|&r| pred(r)).collect(),
            self.columns.clone(),
        )
    }

    /// Restrict the view to `columns`, in the given order.
    pub fn project(&self, columns: &[Column]) -> Table<'a> {
        Table::new(self.rows.clone(), columns.to_vec())
    }

    /// Rows `start..=end` by position.
    pub fn slice(&self, start: usize, end: usize) -> Table<'a> {
        Table::new(self.rows[start..=end].to_vec(), self.columns.clone())
    }

    /// Rows whose positions are in `positions`.
    pub fn select(&self, positions: &BTreeSet<usize>) -> Table<'a> {
        Table::new(
            positions
                .iter()
                .filter_map(|&i| self.rows.get(i).copied())
                .collect(),
            self.columns.clone(),
        )
    }

    /// Position of the row for `date`.
    ///
    /// Rows are in chronological order, so this is a binary search.
    pub fn position_of(&self, date: NaiveDate) -> Option<usize> {
        self.rows.binary_search_by_key(&date, |r| r.date).ok()
    }

    /// Positions of rows whose `column` contains `term`, ignoring case.
    /// Rows with nothing recorded in `column` never match.
    pub fn search(&self, column: Column, term: &str) -> BTreeSet<usize> {
        let term = term.to_lowercase();
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, r)| {
                r.value(column)
                    .is_some_and(|v| v.to_string().to_lowercase().contains(&term))
            })
            .map(|(i, _)| i)
            .collect()
    }

    /// Values of `column` across all rows, `None` where absent.
    pub fn values(&self, column: Column) -> impl Iterator<Item = Option<Value>> + '_ {
        self.rows.iter().map(move |r| r.value(column))
    }

    /// Drop columns that have no value in any row.
    pub fn without_empty_columns(&self) -> Table<'a> {
        let columns = self
            .columns
            .iter()
            .copied()
            .filter(|&c| self.rows.iter().any(|r| r.value(c).is_some()))
            .collect();
        Table::new(self.rows.clone(), columns)
    }

    /// Mean or sum of a numeric column, ignoring absent values.
    pub fn aggregate(&self, target: Column, aggregate: Aggregate) -> Result<f64, QueryError> {
        let values: Vec<f64> = self
            .values(target)
            .filter_map(|v| v.and_then(|v| v.as_f64()))
            .collect();
        aggregate
            .apply(&values)
            .ok_or_else(|| QueryError::EmptyAggregate(target.to_string()))
    }

    /// Total of a column of `H:M:S` durations. Malformed values are skipped.
    pub fn total_duration(&self, target: Column) -> TimeDelta {
        self.values(target)
            .flatten()
            .filter_map(|v| {
                let text = v.to_string();
                let parsed = parse_hms(&text);
                if parsed.is_none() {
                    debug!(value = %text, "skipping malformed duration");
                }
                parsed
            })
            .fold(TimeDelta::zero(), |acc, d| acc + d)
    }

    /// Partition rows by `key` and aggregate `target` within each partition.
    ///
    /// The result is sorted by aggregate value, highest first; equal values
    /// keep the order in which their keys were first seen. Grouping by
    /// `people` files a row under each person it names.
    pub fn group_by(
        &self,
        target: Column,
        key: Column,
        aggregate: Aggregate,
    ) -> Result<GroupedTable, QueryError> {
        if !self.has_column(key) {
            return Err(QueryError::UnknownColumn(key.to_string()));
        }

        let mut index: HashMap<String, usize> = HashMap::new();
        let mut groups: Vec<(Value, Vec<f64>)> = Vec::new();

        for row in &self.rows {
            let Some(x) = row.value(target).and_then(|v| v.as_f64()) else {
                continue;
            };
            let keys: Vec<Value> = match key {
                Column::People => row.people.iter().cloned().map(Value::Text).collect(),
                _ => row.value(key).into_iter().collect(),
            };
            for k in keys {
                let slot = *index.entry(k.to_string()).or_insert_with(|| {
                    groups.push((k.clone(), Vec::new()));
                    groups.len() - 1
                });
                groups[slot].1.push(x);
            }
        }

        let mut rows: Vec<(Value, f64)> = groups
            .into_iter()
            .filter_map(|(k, xs)| aggregate.apply(&xs).map(|x| (k, x)))
            .collect();
        // Stable, so ties stay in encounter order.
        rows.sort_by(|a, b| b.1.total_cmp(&a.1));

        Ok(GroupedTable {
            key,
            value: target,
            rows,
        })
    }
}

/// How a numeric column is reduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Mean,
    Sum,
}

impl Aggregate {
    /// `None` for the mean of nothing.
    pub fn apply(&self, values: &[f64]) -> Option<f64> {
        let sum: f64 = values.iter().sum();
        match self {
            Aggregate::Sum => Some(sum),
            Aggregate::Mean if values.is_empty() => None,
            Aggregate::Mean => Some(sum / values.len() as f64),
        }
    }
}

/// A two-column (key, aggregate) result, sorted by aggregate descending.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedTable {
    pub key: Column,
    pub value: Column,
    pub rows: Vec<(Value, f64)>,
}

/// A single aggregate value. Terminal in a pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Number(f64),
    Duration(TimeDelta),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Number(x) => write!(f, "{x}"),
            Scalar::Duration(d) => f.write_str(&format_hms(*d)),
        }
    }
}

/// The intermediate result threaded through the argument pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame<'a> {
    Table(Table<'a>),
    Grouped(GroupedTable),
    Scalar(Scalar),
    /// A plot was shown; nothing is left to print.
    Plotted,
}

impl Frame<'_> {
    /// No further argument may follow a terminal frame.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Frame::Scalar(_) | Frame::Plotted)
    }

    pub fn shape(&self) -> &'static str {
        match self {
            Frame::Table(_) => "table",
            Frame::Grouped(_) => "grouped",
            Frame::Scalar(_) => "scalar",
            Frame::Plotted => "plotted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample() -> Archive {
        Archive::new(vec![
            Record::new(day(2021, 1, 1))
                .with_happiness(4.0)
                .with_recording("0:30:00")
                .with_people(["Alice"]),
            Record::new(day(2021, 1, 2))
                .with_happiness(2.0)
                .with_recording("bad"),
            Record::new(day(2021, 1, 3)).with_people(["Bob", "Alice"]),
            Record::new(day(2021, 1, 4))
                .with_happiness(3.0)
                .with_recording("1:00:15")
                .with_people(["bob"]),
        ])
    }

    #[test]
    fn test_view_has_all_columns() {
        let archive = sample();
        let table = archive.view();
        assert_eq!(table.len(), 4);
        assert_eq!(table.columns(), &Column::ALL);
    }

    #[test]
    fn test_project_keeps_rows_and_orders_columns() {
        let archive = sample();
        let table = archive.view().project(&[Column::Happiness, Column::Date]);
        assert_eq!(table.columns(), &[Column::Happiness, Column::Date]);
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn test_slice_is_inclusive() {
        let archive = sample();
        let table = archive.view().slice(1, 2);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0].date, day(2021, 1, 2));
        assert_eq!(table.rows()[1].date, day(2021, 1, 3));
    }

    #[test]
    fn test_position_of() {
        let archive = sample();
        let table = archive.view();
        assert_eq!(table.position_of(day(2021, 1, 3)), Some(2));
        assert_eq!(table.position_of(day(2021, 2, 3)), None);
    }

    #[test]
    fn test_search_is_case_insensitive_and_skips_absent() {
        let archive = sample();
        let hits = archive.view().search(Column::People, "BOB");
        assert_eq!(hits.into_iter().collect::<Vec<_>>(), vec![2, 3]);
    }

    #[test]
    fn test_without_empty_columns() {
        let archive = sample();
        let table = archive.view().without_empty_columns();
        assert!(!table.has_column(Column::Summary));
        assert!(table.has_column(Column::Happiness));
    }

    #[test]
    fn test_aggregate_ignores_absent() {
        let archive = sample();
        let table = archive.view();
        assert_eq!(table.aggregate(Column::Happiness, Aggregate::Mean), Ok(3.0));
        assert_eq!(table.aggregate(Column::Happiness, Aggregate::Sum), Ok(9.0));
    }

    #[test]
    fn test_mean_of_nothing_is_an_error() {
        let archive = sample();
        let table = archive.view().slice(2, 2);
        assert_eq!(
            table.aggregate(Column::Happiness, Aggregate::Mean),
            Err(QueryError::EmptyAggregate("happiness".to_string()))
        );
    }

    #[test]
    fn test_total_duration_skips_malformed() {
        let archive = sample();
        let total = archive.view().total_duration(Column::Recording);
        assert_eq!(total, TimeDelta::seconds(30 * 60 + 3615));
    }

    #[test]
    fn test_group_by_people_explodes_names() {
        let archive = sample();
        let grouped = archive
            .view()
            .group_by(Column::Happiness, Column::People, Aggregate::Mean)
            .unwrap();
        // Row 3 has no happiness, so only Alice (4.0) and bob (3.0) remain.
        assert_eq!(
            grouped.rows,
            vec![
                (Value::Text("Alice".to_string()), 4.0),
                (Value::Text("bob".to_string()), 3.0),
            ]
        );
    }

    #[test]
    fn test_group_by_ties_keep_encounter_order() {
        let archive = Archive::new(vec![
            Record::new(day(2020, 12, 31)).with_happiness(3.0),
            Record::new(day(2021, 1, 1)).with_happiness(3.0),
        ]);
        let grouped = archive
            .view()
            .group_by(Column::Happiness, Column::Year, Aggregate::Sum)
            .unwrap();
        assert_eq!(grouped.rows[0].0, Value::Int(2020));
        assert_eq!(grouped.rows[1].0, Value::Int(2021));
    }

    #[test]
    fn test_group_by_requires_active_key() {
        let archive = sample();
        let table = archive.view().project(&[Column::Happiness]);
        assert_eq!(
            table.group_by(Column::Happiness, Column::Weekday, Aggregate::Mean),
            Err(QueryError::UnknownColumn("weekday".to_string()))
        );
    }

    #[test]
    fn test_frame_terminal() {
        assert!(Frame::Scalar(Scalar::Number(1.0)).is_terminal());
        assert!(Frame::Plotted.is_terminal());
        let archive = sample();
        assert!(!Frame::Table(archive.view()).is_terminal());
    }
}
