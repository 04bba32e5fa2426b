/// Chart selection: which chart kinds exist, which columns they accept and
/// how a user's choice is validated before anything is drawn.
///
/// ```text
///  filtered Table + ChartSpec
///        │
///        ▼
///   ┌──────────┐
///   │ validate  │  kind / column-type rules → ChartWarning
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  data     │  bins, quartiles, sums, correlations → Chart
///   └──────────┘
/// ```
pub mod data;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::model::{ColumnKind, Table};

pub use data::Chart;

// ---------------------------------------------------------------------------
// Chart kinds and their column requirements
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    #[default]
    Line,
    Scatter,
    Histogram,
    Box,
    Pie,
    Heatmap,
    Bar,
}

impl ChartKind {
    /// Order shown in the chart-type selector.
    pub const ALL: [ChartKind; 7] = [
        ChartKind::Line,
        ChartKind::Scatter,
        ChartKind::Histogram,
        ChartKind::Box,
        ChartKind::Pie,
        ChartKind::Heatmap,
        ChartKind::Bar,
    ];

    /// Column type accepted on the x axis (`None` when the kind has no x).
    pub fn x_requirement(self) -> Option<AxisRequirement> {
        match self {
            ChartKind::Histogram | ChartKind::Scatter => Some(AxisRequirement::Numeric),
            ChartKind::Box | ChartKind::Bar | ChartKind::Pie => {
                Some(AxisRequirement::Categorical)
            }
            ChartKind::Line => Some(AxisRequirement::Any),
            ChartKind::Heatmap => None,
        }
    }

    /// Column type accepted on the y axis (`None` when the kind has no y).
    pub fn y_requirement(self) -> Option<AxisRequirement> {
        match self {
            ChartKind::Histogram | ChartKind::Heatmap => None,
            _ => Some(AxisRequirement::Numeric),
        }
    }

    /// Widget labels for the x and y selectors.
    pub fn axis_labels(self) -> (&'static str, &'static str) {
        match self {
            ChartKind::Histogram => ("Select column for histogram", ""),
            ChartKind::Box => ("Group by (categorical column)", "Select numeric column"),
            ChartKind::Scatter => ("X-axis", "Y-axis"),
            ChartKind::Line => ("X-axis (usually date/time or ID)", "Y-axis (numeric)"),
            ChartKind::Bar => ("X-axis (categorical)", "Y-axis (numeric)"),
            ChartKind::Pie => ("Names (categorical)", "Values (numeric)"),
            ChartKind::Heatmap => ("", ""),
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChartKind::Line => "Line Chart",
            ChartKind::Scatter => "Scatter Plot",
            ChartKind::Histogram => "Histogram",
            ChartKind::Box => "Box Plot",
            ChartKind::Pie => "Pie Chart",
            ChartKind::Heatmap => "Correlation Heatmap",
            ChartKind::Bar => "Bar Chart",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisRequirement {
    Any,
    Numeric,
    Categorical,
}

impl AxisRequirement {
    pub fn accepts(self, kind: ColumnKind) -> bool {
        match self {
            AxisRequirement::Any => true,
            AxisRequirement::Numeric => kind == ColumnKind::Numeric,
            AxisRequirement::Categorical => kind == ColumnKind::Categorical,
        }
    }

    fn candidates(self, table: &Table) -> Vec<String> {
        match self {
            AxisRequirement::Any => table.column_names(),
            AxisRequirement::Numeric => table.numeric_columns(),
            AxisRequirement::Categorical => table.categorical_columns(),
        }
    }
}

impl fmt::Display for AxisRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisRequirement::Any => write!(f, "any"),
            AxisRequirement::Numeric => write!(f, "numeric"),
            AxisRequirement::Categorical => write!(f, "categorical"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
        }
    }
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

/// Why a chart request cannot be drawn.  Always shown as a warning, never
/// fatal.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ChartWarning {
    #[error("{kind} needs a numeric column, but the data has none")]
    NoNumericColumns { kind: ChartKind },
    #[error("{kind} needs a categorical column, but the data has none")]
    NoCategoricalColumns { kind: ChartKind },
    #[error("insufficient numeric columns: {kind} needs {required}, found {found}")]
    InsufficientNumericColumns {
        kind: ChartKind,
        required: usize,
        found: usize,
    },
    #[error("select a column for the {axis} axis")]
    MissingColumn { axis: Axis },
    #[error("column '{0}' does not exist")]
    UnknownColumn(String),
    #[error("column '{column}' is {found}, the {axis} axis needs a {expected} column")]
    WrongKind {
        column: String,
        axis: Axis,
        expected: AxisRequirement,
        found: ColumnKind,
    },
    #[error("x and y must be different columns (both are '{0}')")]
    SameColumn(String),
    #[error("Pie Chart cannot show negative total {value} for '{label}'")]
    NegativePieValue { label: String, value: f64 },
}

// ---------------------------------------------------------------------------
// Chart spec
// ---------------------------------------------------------------------------

/// Candidate columns for each axis selector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AxisOptions {
    pub x: Vec<String>,
    pub y: Vec<String>,
}

/// The user's chart choice: a kind plus up to two column bindings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub x: Option<String>,
    pub y: Option<String>,
}

/// Selector contents for a kind.  Scatter's y list leaves out the chosen x.
pub fn axis_options(table: &Table, kind: ChartKind, x: Option<&str>) -> AxisOptions {
    let xs = kind
        .x_requirement()
        .map(|r| r.candidates(table))
        .unwrap_or_default();
    let mut ys = kind
        .y_requirement()
        .map(|r| r.candidates(table))
        .unwrap_or_default();
    if kind == ChartKind::Scatter {
        let x = x.or(xs.first().map(String::as_str));
        ys.retain(|c| Some(c.as_str()) != x);
    }
    AxisOptions { x: xs, y: ys }
}

impl ChartSpec {
    /// First candidate of each selector, as a fresh selector would show.
    pub fn with_defaults(table: &Table, kind: ChartKind) -> ChartSpec {
        let x = axis_options(table, kind, None).x.into_iter().next();
        let y = axis_options(table, kind, x.as_deref()).y.into_iter().next();
        ChartSpec { kind, x, y }
    }

    /// Keep the current bindings where they are still valid for the new x,
    /// otherwise fall back to the first candidate.
    pub fn reselect(table: &Table, kind: ChartKind, x: Option<String>, y: Option<String>) -> ChartSpec {
        let defaults = ChartSpec::with_defaults(table, kind);
        let x_opts = axis_options(table, kind, None).x;
        let x = x.filter(|c| x_opts.contains(c)).or(defaults.x);
        let y_opts = axis_options(table, kind, x.as_deref()).y;
        let y = y.filter(|c| y_opts.contains(c)).or_else(|| y_opts.into_iter().next());
        ChartSpec { kind, x, y }
    }
}

/// Check the spec against the table's column types.
pub fn validate(table: &Table, spec: &ChartSpec) -> Result<(), ChartWarning> {
    let kind = spec.kind;
    let numeric = table.numeric_columns().len();
    let categorical = table.categorical_columns().len();

    match kind {
        ChartKind::Histogram | ChartKind::Line if numeric == 0 => {
            return Err(ChartWarning::NoNumericColumns { kind });
        }
        ChartKind::Box | ChartKind::Bar | ChartKind::Pie if categorical == 0 => {
            return Err(ChartWarning::NoCategoricalColumns { kind });
        }
        ChartKind::Box | ChartKind::Bar | ChartKind::Pie if numeric == 0 => {
            return Err(ChartWarning::NoNumericColumns { kind });
        }
        ChartKind::Scatter | ChartKind::Heatmap if numeric < 2 => {
            return Err(ChartWarning::InsufficientNumericColumns {
                kind,
                required: 2,
                found: numeric,
            });
        }
        _ => {}
    }

    if let Some(req) = kind.x_requirement() {
        check_axis(table, Axis::X, spec.x.as_deref(), req)?;
    }
    if let Some(req) = kind.y_requirement() {
        check_axis(table, Axis::Y, spec.y.as_deref(), req)?;
    }
    if kind == ChartKind::Scatter && spec.x == spec.y {
        return Err(ChartWarning::SameColumn(spec.x.clone().unwrap_or_default()));
    }
    Ok(())
}

fn check_axis(
    table: &Table,
    axis: Axis,
    name: Option<&str>,
    req: AxisRequirement,
) -> Result<(), ChartWarning> {
    let name = name.ok_or(ChartWarning::MissingColumn { axis })?;
    let col = table
        .column(name)
        .ok_or_else(|| ChartWarning::UnknownColumn(name.to_string()))?;
    if !req.accepts(col.kind) {
        return Err(ChartWarning::WrongKind {
            column: name.to_string(),
            axis,
            expected: req,
            found: col.kind,
        });
    }
    Ok(())
}

/// Validate and compute the chart for the filtered table.
pub fn build_chart(table: &Table, spec: &ChartSpec, bins: usize) -> Result<Chart, ChartWarning> {
    validate(table, spec)?;
    let chart = data::compute(table, spec, bins)?;
    log::debug!("built {} over {} rows", spec.kind, table.len());
    Ok(chart)
}
