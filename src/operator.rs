//! Argument handlers: one per operator token.
//!
//! Every handler takes the token list, the cursor of its first argument and
//! the current [`Frame`], and returns the cursor just past what it consumed
//! together with the new frame. Handlers never touch the archive itself,
//! only the borrowed view inside the frame.

use std::collections::BTreeSet;

use tracing::debug;

use crate::dsl::Operator;
use crate::error::QueryError;
use crate::plot::{PlotKind, PlotRenderer, PlotRequest};
use crate::record::{Column, Value};
use crate::table::{Aggregate, Frame, Scalar, Table};
use crate::validate::{
    LIST_DELIMITER, expect_literal, parse_active_column, parse_column_list, parse_date,
    require_column, require_date_in_view, require_ordered, require_tokens,
};

/// Literal separating a search term from its column in `-w`.
pub const SEARCH_SEPARATOR: &str = ">";
/// Literal introducing a grouping column in `-a` and `-s`.
pub const GROUP_SEPARATOR: &str = "*";
/// Combines two `-w` clauses: rows matching both.
pub const AND: &str = "&";
/// Combines two `-w` clauses: rows matching either.
pub const OR: &str = "|";

/// Run the handler for `op` with its arguments starting at `cursor`.
pub fn apply<'a>(
    op: Operator,
    tokens: &[&str],
    cursor: usize,
    frame: Frame<'a>,
    plotter: &mut dyn PlotRenderer,
) -> Result<(usize, Frame<'a>), QueryError> {
    match op {
        Operator::Reduce => reduce(tokens, cursor, expect_table(op, frame)?),
        Operator::Output => output(tokens, cursor, expect_table(op, frame)?),
        Operator::With => with(tokens, cursor, expect_table(op, frame)?),
        Operator::Average => average(tokens, cursor, expect_table(op, frame)?),
        Operator::Sum => sum(tokens, cursor, expect_table(op, frame)?),
        Operator::Plot => plot(tokens, cursor, frame, plotter),
    }
}

fn expect_table(op: Operator, frame: Frame<'_>) -> Result<Table<'_>, QueryError> {
    match frame {
        Frame::Table(table) => Ok(table),
        _ => Err(QueryError::NotATable(op.token().to_string())),
    }
}

/// `-r d1 d2`: the rows from d1 through d2 inclusive.
fn reduce<'a>(
    tokens: &[&str],
    cursor: usize,
    table: Table<'a>,
) -> Result<(usize, Frame<'a>), QueryError> {
    require_tokens(tokens, cursor, 2, "two dates in the form M/D/YYYY")?;
    let start = parse_date(tokens[cursor])?;
    let end = parse_date(tokens[cursor + 1])?;
    require_ordered(start, end)?;
    require_column(&table, Column::Date)?;
    let first = require_date_in_view(&table, start)?;
    let last = require_date_in_view(&table, end)?;
    Ok((cursor + 2, Frame::Table(table.slice(first, last))))
}

/// `-o c1+c2+...`: project to the named columns.
fn output<'a>(
    tokens: &[&str],
    cursor: usize,
    table: Table<'a>,
) -> Result<(usize, Frame<'a>), QueryError> {
    require_tokens(tokens, cursor, 1, "column names joined by +")?;
    let columns = parse_column_list(&table, tokens[cursor])?;
    Ok((cursor + 1, Frame::Table(table.project(&columns))))
}

/// `-w term > col [& term > col | ...]`: rows whose column contains the term.
///
/// Extra clauses joined by `&` intersect the matched rows, `|` unites them,
/// evaluated left to right.
fn with<'a>(
    tokens: &[&str],
    cursor: usize,
    table: Table<'a>,
) -> Result<(usize, Frame<'a>), QueryError> {
    let (mut cursor, mut hits) = search_clause(tokens, cursor, &table)?;
    loop {
        let combine = match tokens.get(cursor) {
            Some(&AND) => Combine::And,
            Some(&OR) => Combine::Or,
            _ => break,
        };
        let (next, more) = search_clause(tokens, cursor + 1, &table)?;
        hits = match combine {
            Combine::And => hits.intersection(&more).copied().collect(),
            Combine::Or => hits.union(&more).copied().collect(),
        };
        cursor = next;
    }
    debug!(matches = hits.len(), "search complete");
    Ok((cursor, Frame::Table(table.select(&hits))))
}

#[derive(Debug, Clone, Copy)]
enum Combine {
    And,
    Or,
}

fn search_clause(
    tokens: &[&str],
    cursor: usize,
    table: &Table<'_>,
) -> Result<(usize, BTreeSet<usize>), QueryError> {
    require_tokens(tokens, cursor, 1, "a search term")?;
    let term = tokens[cursor].replace(LIST_DELIMITER, " ");
    expect_literal(tokens, cursor + 1, SEARCH_SEPARATOR)?;
    require_tokens(tokens, cursor + 2, 1, "a column to search")?;
    let column = parse_active_column(table, tokens[cursor + 2])?;
    Ok((cursor + 3, table.search(column, &term)))
}

/// `-a col [* key]`: mean happiness, optionally per group.
fn average<'a>(
    tokens: &[&str],
    cursor: usize,
    table: Table<'a>,
) -> Result<(usize, Frame<'a>), QueryError> {
    require_tokens(tokens, cursor, 1, "a column to average")?;
    let column: Column = tokens[cursor].parse()?;
    if column != Column::Happiness {
        return Err(unsupported(Operator::Average, column));
    }
    aggregate_numeric(tokens, cursor, &table, column, Aggregate::Mean)
}

/// `-s col [* key]`: total happiness (optionally per group), or total
/// recording time.
fn sum<'a>(
    tokens: &[&str],
    cursor: usize,
    table: Table<'a>,
) -> Result<(usize, Frame<'a>), QueryError> {
    require_tokens(tokens, cursor, 1, "a column to sum")?;
    let column: Column = tokens[cursor].parse()?;
    match column {
        Column::Happiness => aggregate_numeric(tokens, cursor, &table, column, Aggregate::Sum),
        Column::Recording => {
            if tokens.get(cursor + 1) == Some(&GROUP_SEPARATOR) {
                return Err(QueryError::UngroupableColumn(column.to_string()));
            }
            require_column(&table, column)?;
            let total = table.total_duration(column);
            Ok((cursor + 1, Frame::Scalar(Scalar::Duration(total))))
        }
        _ => Err(unsupported(Operator::Sum, column)),
    }
}

fn aggregate_numeric<'a>(
    tokens: &[&str],
    cursor: usize,
    table: &Table<'_>,
    column: Column,
    aggregate: Aggregate,
) -> Result<(usize, Frame<'a>), QueryError> {
    require_column(table, column)?;
    if tokens.get(cursor + 1) == Some(&GROUP_SEPARATOR) {
        require_tokens(tokens, cursor + 2, 1, "a column to group by")?;
        let key: Column = tokens[cursor + 2].parse()?;
        let grouped = table.group_by(column, key, aggregate)?;
        return Ok((cursor + 3, Frame::Grouped(grouped)));
    }
    let value = table.aggregate(column, aggregate)?;
    Ok((cursor + 1, Frame::Scalar(Scalar::Number(value))))
}

fn unsupported(op: Operator, column: Column) -> QueryError {
    QueryError::UnsupportedAggregationColumn {
        operator: op.token().to_string(),
        column: column.to_string(),
    }
}

/// `-p bar|line`: hand a two-column result to the plot renderer.
///
/// Blocks until the plot is dismissed. Nothing may follow it.
fn plot<'a>(
    tokens: &[&str],
    cursor: usize,
    frame: Frame<'a>,
    plotter: &mut dyn PlotRenderer,
) -> Result<(usize, Frame<'a>), QueryError> {
    require_tokens(tokens, cursor, 1, "a plot type (bar or line)")?;
    let kind: PlotKind = tokens[cursor].parse()?;
    let next = cursor + 1;
    if next < tokens.len() {
        return Err(QueryError::TrailingArgumentAfterScalar(
            Operator::Plot.token().to_string(),
        ));
    }

    let request = match frame {
        Frame::Table(table) => {
            let count = table.columns().len();
            let (x, y) = match table.columns()[..] {
                [x, y] => (x, y),
                [] | [_] => return Err(QueryError::TooFewColumnsForPlot(count)),
                _ => return Err(QueryError::TooManyColumnsForPlot(count)),
            };
            if !x.is_numeric() && !y.is_numeric() {
                return Err(QueryError::NonNumericPlotColumns);
            }
            let points: Vec<(Value, Value)> = table
                .rows()
                .iter()
                .filter_map(|r| Some((r.value(x)?, r.value(y)?)))
                .collect();
            if points.is_empty() {
                return Err(QueryError::NothingToPlot);
            }
            PlotRequest::new(kind, x.name(), y.name(), points)?
        }
        Frame::Grouped(grouped) => {
            if grouped.rows.is_empty() {
                return Err(QueryError::NothingToPlot);
            }
            let points = grouped
                .rows
                .iter()
                .map(|(key, value)| (key.clone(), Value::Number(*value)))
                .collect();
            PlotRequest::new(kind, grouped.key.name(), grouped.value.name(), points)?
        }
        Frame::Scalar(_) | Frame::Plotted => {
            return Err(QueryError::NotATable(Operator::Plot.token().to_string()));
        }
    };

    debug!(?kind, points = request.x.values.len(), "rendering plot");
    plotter.render(&request)?;
    Ok((next, Frame::Plotted))
}
