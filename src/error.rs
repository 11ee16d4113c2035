//! Error types for archive loading and query execution.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while evaluating a single shell command.
///
/// None of these are fatal to the session: the shell prints the message,
/// discards any partial result, and returns to the prompt.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum QueryError {
    #[error("no command input")]
    NoCommand,

    #[error("argument nonexistent: [{0}]")]
    UnknownCommand(String),

    #[error("unknown argument [{0}]: please try again")]
    UnknownArgument(String),

    #[error("no argument error: {0}")]
    MissingArgument(String),

    #[error("excess argument error: [{0}] is not allowed here")]
    ExcessArgument(String),

    #[error("invalid date [{0}]: dates must be in the form M/D/YYYY")]
    InvalidDateFormat(String),

    #[error("invalid year [{0}]: years must be in the form YYYY")]
    InvalidYear(String),

    #[error("date out of range: {0} is not in the current selection")]
    DateOutOfRange(String),

    #[error("unordered date range: {start} must come before {end}")]
    UnorderedDateRange { start: String, end: String },

    #[error("unknown column [{0}]")]
    UnknownColumn(String),

    #[error("bad operator: expected [{expected}], found [{found}]")]
    BadOperator { expected: String, found: String },

    #[error("column [{column}] cannot be used with {operator}")]
    UnsupportedAggregationColumn { operator: String, column: String },

    #[error("column [{0}] cannot be grouped")]
    UngroupableColumn(String),

    #[error("no {0} values to aggregate")]
    EmptyAggregate(String),

    #[error("{0} must be last argument")]
    TrailingArgumentAfterScalar(String),

    #[error("{0} requires a table, not an aggregate result")]
    NotATable(String),

    #[error("plot requires exactly two columns, found {0} (use -o first)")]
    TooManyColumnsForPlot(usize),

    #[error("plot requires two columns, found {0} (use -o to name both)")]
    TooFewColumnsForPlot(usize),

    #[error("no rows have values in both plot columns")]
    NothingToPlot,

    #[error("plot requires at least one numeric column")]
    NonNumericPlotColumns,

    #[error("unknown plot type [{0}]: use bar or line")]
    UnknownPlotType(String),

    #[error("the archive is empty")]
    EmptyArchive,

    #[error("plot failed: {0}")]
    Plot(String),
}

/// Errors raised while loading the archive snapshot at startup.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read archive {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed archive: {0}")]
    Csv(#[from] csv::Error),

    #[error("line {line}: invalid date [{value}]")]
    InvalidDate { line: u64, value: String },

    #[error("line {line}: date {date} is not after the previous entry")]
    OutOfOrder { line: u64, date: String },
}
