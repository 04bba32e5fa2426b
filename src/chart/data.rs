use crate::data::model::{CellValue, Column, Table};
use crate::data::stats::quantile_sorted;

use super::{ChartKind, ChartSpec, ChartWarning};

// ---------------------------------------------------------------------------
// Renderable chart descriptions
// ---------------------------------------------------------------------------

/// A validated chart, reduced to the numbers the plot widgets need.
#[derive(Debug, Clone, PartialEq)]
pub enum Chart {
    Histogram(Histogram),
    Box(BoxChart),
    Scatter(XyChart),
    Line(XyChart),
    Bar(CategoryChart),
    Pie(CategoryChart),
    Heatmap(Correlation),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub column: String,
    pub bins: Vec<Bin>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxGroup {
    pub label: String,
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxChart {
    pub x: String,
    pub y: String,
    pub groups: Vec<BoxGroup>,
}

/// Points in row order.  When x is categorical, `x_labels[i]` names the
/// position `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct XyChart {
    pub x: String,
    pub y: String,
    pub points: Vec<[f64; 2]>,
    pub x_labels: Vec<String>,
}

/// Values summed per category, categories in first-seen order.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryChart {
    pub x: String,
    pub y: String,
    pub entries: Vec<(String, f64)>,
}

/// Pearson correlation of every numeric column pair.  `None` where fewer
/// than two complete pairs exist or a column is constant.
#[derive(Debug, Clone, PartialEq)]
pub struct Correlation {
    pub columns: Vec<String>,
    pub matrix: Vec<Vec<Option<f64>>>,
}

// ---------------------------------------------------------------------------
// Computation
// ---------------------------------------------------------------------------

/// Compute chart data for an already validated spec.
pub(super) fn compute(table: &Table, spec: &ChartSpec, bins: usize) -> Result<Chart, ChartWarning> {
    let x = spec.x.as_deref().and_then(|n| table.column(n));
    let y = spec.y.as_deref().and_then(|n| table.column(n));

    let chart = match (spec.kind, x, y) {
        (ChartKind::Heatmap, _, _) => Chart::Heatmap(correlation(table)),
        (ChartKind::Histogram, Some(x), _) => Chart::Histogram(histogram(x, bins)),
        (ChartKind::Box, Some(x), Some(y)) => Chart::Box(box_chart(x, y)),
        (ChartKind::Scatter, Some(x), Some(y)) => Chart::Scatter(xy_chart(x, y)),
        (ChartKind::Line, Some(x), Some(y)) => Chart::Line(xy_chart(x, y)),
        (ChartKind::Bar, Some(x), Some(y)) => Chart::Bar(category_sums(x, y)),
        (ChartKind::Pie, Some(x), Some(y)) => {
            let pie = category_sums(x, y);
            if let Some((label, value)) = pie.entries.iter().find(|(_, v)| *v < 0.0) {
                return Err(ChartWarning::NegativePieValue {
                    label: label.clone(),
                    value: *value,
                });
            }
            Chart::Pie(pie)
        }
        (_, None, _) => {
            return Err(ChartWarning::MissingColumn { axis: super::Axis::X });
        }
        (_, _, None) => {
            return Err(ChartWarning::MissingColumn { axis: super::Axis::Y });
        }
    };
    Ok(chart)
}

/// `bins` equal-width bins spanning the data.  A constant column gets one
/// unit-wide bin centred on the value.
pub fn histogram(column: &Column, bins: usize) -> Histogram {
    let xs = column.numbers();
    let bins = bins.max(1);
    let Some((min, max)) = xs.iter().fold(None, |acc: Option<(f64, f64)>, &x| match acc {
        None => Some((x, x)),
        Some((lo, hi)) => Some((lo.min(x), hi.max(x))),
    }) else {
        return Histogram {
            column: column.name.clone(),
            bins: Vec::new(),
        };
    };

    if max == min {
        return Histogram {
            column: column.name.clone(),
            bins: vec![Bin {
                start: min - 0.5,
                end: min + 0.5,
                count: xs.len(),
            }],
        };
    }

    let width = (max - min) / bins as f64;
    let mut out: Vec<Bin> = (0..bins)
        .map(|i| Bin {
            start: min + width * i as f64,
            end: min + width * (i + 1) as f64,
            count: 0,
        })
        .collect();
    for x in xs {
        let idx = (((x - min) / width).floor() as usize).min(bins - 1);
        out[idx].count += 1;
    }
    Histogram {
        column: column.name.clone(),
        bins: out,
    }
}

/// Category labels in first-seen order, and each row's position in it.
fn category_positions(column: &Column) -> (Vec<String>, Vec<Option<usize>>) {
    let mut labels: Vec<String> = Vec::new();
    let positions = column
        .values
        .iter()
        .map(|v| {
            let label = v.label()?;
            Some(match labels.iter().position(|l| *l == label) {
                Some(i) => i,
                None => {
                    labels.push(label);
                    labels.len() - 1
                }
            })
        })
        .collect();
    (labels, positions)
}

/// Numeric values grouped by the categories of `x`, first-seen order.
fn grouped(x: &Column, y: &Column) -> Vec<(String, Vec<f64>)> {
    let (labels, positions) = category_positions(x);
    let mut groups: Vec<(String, Vec<f64>)> =
        labels.into_iter().map(|l| (l, Vec::new())).collect();
    for (pos, value) in positions.iter().zip(&y.values) {
        if let (Some(p), Some(v)) = (pos, value.as_f64()) {
            groups[*p].1.push(v);
        }
    }
    groups
}

pub fn box_chart(x: &Column, y: &Column) -> BoxChart {
    let groups = grouped(x, y)
        .into_iter()
        .filter(|(_, values)| !values.is_empty())
        .filter_map(|(label, mut values)| {
            values.sort_by(f64::total_cmp);
            let q1 = quantile_sorted(&values, 0.25)?;
            let median = quantile_sorted(&values, 0.5)?;
            let q3 = quantile_sorted(&values, 0.75)?;
            let iqr = q3 - q1;
            let (lo_fence, hi_fence) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);
            let inside: Vec<f64> = values
                .iter()
                .copied()
                .filter(|v| *v >= lo_fence && *v <= hi_fence)
                .collect();
            let outliers = values
                .iter()
                .copied()
                .filter(|v| *v < lo_fence || *v > hi_fence)
                .collect();
            Some(BoxGroup {
                label,
                lower_whisker: inside.first().copied().unwrap_or(q1),
                q1,
                median,
                q3,
                upper_whisker: inside.last().copied().unwrap_or(q3),
                outliers,
            })
        })
        .collect();
    BoxChart {
        x: x.name.clone(),
        y: y.name.clone(),
        groups,
    }
}

/// Row-ordered points; rows with a missing coordinate are skipped.
pub fn xy_chart(x: &Column, y: &Column) -> XyChart {
    let (x_labels, xs): (Vec<String>, Vec<Option<f64>>) = if x.is_numeric() {
        (Vec::new(), x.values.iter().map(CellValue::as_f64).collect())
    } else {
        let (labels, positions) = category_positions(x);
        (labels, positions.into_iter().map(|p| p.map(|i| i as f64)).collect())
    };
    let points = xs
        .into_iter()
        .zip(&y.values)
        .filter_map(|(px, py)| Some([px?, py.as_f64()?]))
        .collect();
    XyChart {
        x: x.name.clone(),
        y: y.name.clone(),
        points,
        x_labels,
    }
}

pub fn category_sums(x: &Column, y: &Column) -> CategoryChart {
    let entries = grouped(x, y)
        .into_iter()
        .filter(|(_, values)| !values.is_empty())
        .map(|(label, values)| (label, values.iter().sum()))
        .collect();
    CategoryChart {
        x: x.name.clone(),
        y: y.name.clone(),
        entries,
    }
}

/// Pearson correlation over pairwise-complete observations.
pub fn correlation(table: &Table) -> Correlation {
    let cols: Vec<&Column> = table.columns().iter().filter(|c| c.is_numeric()).collect();
    let matrix = cols
        .iter()
        .map(|a| cols.iter().map(|b| pearson(a, b)).collect())
        .collect();
    Correlation {
        columns: cols.iter().map(|c| c.name.clone()).collect(),
        matrix,
    }
}

fn pearson(a: &Column, b: &Column) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = a
        .values
        .iter()
        .zip(&b.values)
        .filter_map(|(x, y)| Some((x.as_f64()?, y.as_f64()?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        sxy += (x - mx) * (y - my);
        sxx += (x - mx).powi(2);
        syy += (y - my).powi(2);
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    if a.name == b.name {
        return Some(1.0);
    }
    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}
