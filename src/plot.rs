//! Plot requests and the renderer they are handed to.
//!
//! The `-p` argument builds a [`PlotRequest`] from a two-column result and
//! passes it to a [`PlotRenderer`]. Rendering blocks until the viewer is
//! dismissed; [`TerminalPlotter`] draws an ASCII chart and waits for Enter.

use std::io::{self, BufRead, BufReader, Write};
use std::str::FromStr;

use crate::error::QueryError;
use crate::record::Value;

/// Chart style requested by `-p`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotKind {
    Bar,
    Line,
}

impl FromStr for PlotKind {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bar" => Ok(PlotKind::Bar),
            "line" => Ok(PlotKind::Line),
            _ => Err(QueryError::UnknownPlotType(s.to_string())),
        }
    }
}

/// One axis of a plot. Numeric axes carry their (min, max) bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub label: String,
    pub values: Vec<Value>,
    pub bounds: Option<(f64, f64)>,
}

impl Axis {
    fn new(label: &str, values: Vec<Value>) -> Self {
        let numbers: Option<Vec<f64>> = values.iter().map(Value::as_f64).collect();
        let bounds = numbers.filter(|xs| !xs.is_empty()).map(|xs| {
            xs.iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
                    (lo.min(x), hi.max(x))
                })
        });
        Self {
            label: label.to_string(),
            values,
            bounds,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.bounds.is_some()
    }
}

/// Everything a renderer needs to draw one chart.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotRequest {
    pub kind: PlotKind,
    pub x: Axis,
    pub y: Axis,
}

impl PlotRequest {
    /// Build a request from (x, y) points, classifying each axis.
    ///
    /// At least one axis must be numeric.
    pub fn new(
        kind: PlotKind,
        x_label: &str,
        y_label: &str,
        points: Vec<(Value, Value)>,
    ) -> Result<Self, QueryError> {
        let (xs, ys): (Vec<Value>, Vec<Value>) = points.into_iter().unzip();
        let x = Axis::new(x_label, xs);
        let y = Axis::new(y_label, ys);
        if !x.is_numeric() && !y.is_numeric() {
            return Err(QueryError::NonNumericPlotColumns);
        }
        Ok(Self { kind, x, y })
    }

    /// The (labels, magnitudes, bounds) view: the numeric axis supplies
    /// magnitudes, preferring y.
    fn oriented(&self) -> Option<(&Axis, &Axis, (f64, f64))> {
        match (self.x.bounds, self.y.bounds) {
            (_, Some(bounds)) => Some((&self.x, &self.y, bounds)),
            (Some(bounds), None) => Some((&self.y, &self.x, bounds)),
            (None, None) => None,
        }
    }
}

/// The external viewer a plot is forwarded to.
pub trait PlotRenderer {
    /// Show the chart, returning once the user has dismissed it.
    fn render(&mut self, request: &PlotRequest) -> Result<(), QueryError>;
}

/// Draws charts as text and waits for a line of input before returning.
pub struct TerminalPlotter {
    pub width: usize,
    pub height: usize,
    input: Box<dyn BufRead>,
    output: Box<dyn Write>,
}

impl TerminalPlotter {
    /// Draw to `output` and wait on `input` for the dismissing line.
    pub fn new(input: impl BufRead + 'static, output: impl Write + 'static) -> Self {
        Self {
            width: 60,
            height: 15,
            input: Box::new(input),
            output: Box::new(output),
        }
    }

    fn show_and_wait(&mut self, chart: &str) -> io::Result<()> {
        writeln!(self.output, "{chart}")?;
        write!(self.output, "(press Enter to close the plot)")?;
        self.output.flush()?;

        let mut line = Vec::new();
        self.input.read_until(b'\n', &mut line)?;
        Ok(())
    }
}

impl Default for TerminalPlotter {
    /// Stdout, and stdin read one byte at a time. Stdin is only locked for
    /// the duration of each read, and no line past the dismissal is buffered.
    fn default() -> Self {
        Self::new(BufReader::with_capacity(1, io::stdin()), io::stdout())
    }
}

impl PlotRenderer for TerminalPlotter {
    fn render(&mut self, request: &PlotRequest) -> Result<(), QueryError> {
        let chart = draw(request, self.width, self.height);
        self.show_and_wait(&chart)
            .map_err(|e| QueryError::Plot(e.to_string()))
    }
}

/// Render a chart as text, `width` columns wide and (for line charts)
/// `height` rows tall.
pub fn draw(request: &PlotRequest, width: usize, height: usize) -> String {
    let Some((labels, magnitudes, bounds)) = request.oriented() else {
        return String::new();
    };
    let numbers: Vec<f64> = magnitudes.values.iter().filter_map(Value::as_f64).collect();
    let title = format!("{} by {}", magnitudes.label, labels.label);
    match request.kind {
        PlotKind::Bar => draw_bar(&title, &labels.values, &numbers, bounds, width.max(1)),
        PlotKind::Line => draw_line(
            &title,
            &labels.values,
            &numbers,
            bounds,
            width.max(1),
            height.max(2),
        ),
    }
}

fn draw_bar(
    title: &str,
    labels: &[Value],
    numbers: &[f64],
    bounds: (f64, f64),
    width: usize,
) -> String {
    let floor = bounds.0.min(0.0);
    let span = bounds.1 - floor;
    let texts: Vec<String> = labels.iter().map(Value::to_string).collect();
    let label_width = texts.iter().map(|t| t.chars().count()).max().unwrap_or(0);

    let mut out = vec![title.to_string()];
    for (text, &n) in texts.iter().zip(numbers) {
        let len = if span > 0.0 {
            ((n - floor) / span * width as f64).round() as usize
        } else {
            width
        };
        out.push(format!("{text:<label_width$} | {} {n}", "#".repeat(len)));
    }
    out.join("\n")
}

fn draw_line(
    title: &str,
    labels: &[Value],
    numbers: &[f64],
    bounds: (f64, f64),
    width: usize,
    height: usize,
) -> String {
    let (lo, hi) = bounds;
    let cols = numbers.len().min(width);
    let mut grid = vec![vec![' '; cols]; height];
    for (c, column) in (0..cols).map(|c| (c, c * numbers.len() / cols)) {
        let level = if hi > lo {
            ((numbers[column] - lo) / (hi - lo) * (height - 1) as f64).round() as usize
        } else {
            0
        };
        grid[height - 1 - level.min(height - 1)][c] = '*';
    }

    let top = hi.to_string();
    let bottom = lo.to_string();
    let gutter = top.len().max(bottom.len());

    let mut out = vec![title.to_string()];
    for (r, row) in grid.iter().enumerate() {
        let tick = match r {
            0 => top.as_str(),
            r if r == height - 1 => bottom.as_str(),
            _ => "",
        };
        let line: String = row.iter().collect();
        out.push(format!("{tick:>gutter$} |{}", line.trim_end()));
    }
    out.push(format!("{:>gutter$} +{}", "", "-".repeat(cols)));
    if let (Some(first), Some(last)) = (labels.first(), labels.last()) {
        out.push(format!("{:>gutter$}  {first} .. {last}", ""));
    }
    out.join("\n")
}
