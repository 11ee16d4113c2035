//! Text rendering of pipeline results.

use crate::record::Column;
use crate::table::{Frame, GroupedTable, Table};

/// Shown in place of a table with no rows.
pub const EMPTY_TABLE: &str = "No entries found";

const ELLIPSIS: &str = "...";

/// Display limits for rendered tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderConfig {
    /// Longer tables show their head and tail only. Zero means no limit.
    pub max_rows: usize,
    /// Wider cells are cut short. Zero means no limit.
    pub max_width: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_rows: 60,
            max_width: 50,
        }
    }
}

/// Render a final result, or `None` when there is nothing to print.
pub fn render_frame(frame: &Frame<'_>, config: &RenderConfig) -> Option<String> {
    match frame {
        Frame::Table(table) => Some(render_table(table, config)),
        Frame::Grouped(grouped) => Some(render_grouped(grouped, config)),
        Frame::Scalar(scalar) => Some(scalar.to_string()),
        Frame::Plotted => None,
    }
}

/// Render a table, leaving out columns that are empty in every row.
pub fn render_table(table: &Table<'_>, config: &RenderConfig) -> String {
    let table = table.without_empty_columns();
    if table.is_empty() || table.columns().is_empty() {
        return EMPTY_TABLE.to_string();
    }
    let headers: Vec<String> = table.columns().iter().map(Column::to_string).collect();
    let rows: Vec<Vec<String>> = table
        .rows()
        .iter()
        .map(|r| {
            table
                .columns()
                .iter()
                .map(|&c| r.value(c).map(|v| v.to_string()).unwrap_or_default())
                .collect()
        })
        .collect();
    format_grid(headers, rows, config)
}

pub fn render_grouped(grouped: &GroupedTable, config: &RenderConfig) -> String {
    if grouped.rows.is_empty() {
        return EMPTY_TABLE.to_string();
    }
    let headers = vec![grouped.key.to_string(), grouped.value.to_string()];
    let rows = grouped
        .rows
        .iter()
        .map(|(key, value)| vec![key.to_string(), format!("{value:.2}")])
        .collect();
    format_grid(headers, rows, config)
}

fn format_grid(headers: Vec<String>, rows: Vec<Vec<String>>, config: &RenderConfig) -> String {
    let total = rows.len();
    let columns = headers.len();
    let truncated = config.max_rows > 0 && total > config.max_rows;

    let mut body: Vec<Vec<String>> = if truncated {
        let head = config.max_rows.div_ceil(2);
        let tail = config.max_rows - head;
        let mut kept: Vec<Vec<String>> = rows[..head].to_vec();
        kept.push(vec![ELLIPSIS.to_string(); columns]);
        kept.extend_from_slice(&rows[total - tail..]);
        kept
    } else {
        rows
    };
    for cell in body.iter_mut().flatten() {
        *cell = clip(cell, config.max_width);
    }

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &body {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, &w)| format!("{c:<w$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = vec![line(&headers)];
    out.push(
        widths
            .iter()
            .map(|&w| "-".repeat(w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    out.extend(body.iter().map(|row| line(row)));
    if truncated {
        out.push(format!("[{total} rows x {columns} columns]"));
    }
    out.join("\n")
}

fn clip(cell: &str, max_width: usize) -> String {
    if max_width == 0 || cell.chars().count() <= max_width {
        return cell.to_string();
    }
    let keep = max_width.saturating_sub(ELLIPSIS.len());
    let mut clipped: String = cell.chars().take(keep).collect();
    clipped.push_str(ELLIPSIS);
    clipped
}
