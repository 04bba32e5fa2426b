use super::filter::distinct_values;
use super::model::{CellValue, Column, Table};

/// Descriptive statistics of one numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericSummary {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

impl NumericSummary {
    /// Row labels and values in display order.
    pub fn rows(&self) -> [(&'static str, Option<f64>); 8] {
        [
            ("count", Some(self.count as f64)),
            ("mean", self.mean),
            ("std", self.std),
            ("min", self.min),
            ("25%", self.q25),
            ("50%", self.median),
            ("75%", self.q75),
            ("max", self.max),
        ]
    }
}

/// Frequency statistics of one categorical column.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoricalSummary {
    pub column: String,
    pub count: usize,
    pub unique: usize,
    pub top: Option<CellValue>,
    pub freq: usize,
}

/// Output of [`describe`].  Numeric columns are summarised when any exist;
/// otherwise the categorical columns are.
#[derive(Debug, Clone, PartialEq)]
pub enum Summary {
    Numeric(Vec<NumericSummary>),
    Categorical(Vec<CategoricalSummary>),
}

pub fn describe(table: &Table) -> Summary {
    let numeric: Vec<&Column> = table.columns().iter().filter(|c| c.is_numeric()).collect();
    if !numeric.is_empty() || table.width() == 0 {
        return Summary::Numeric(numeric.into_iter().map(describe_numeric).collect());
    }
    Summary::Categorical(table.columns().iter().map(describe_categorical).collect())
}

pub fn describe_numeric(column: &Column) -> NumericSummary {
    let mut xs = column.numbers();
    xs.sort_by(f64::total_cmp);
    NumericSummary {
        column: column.name.clone(),
        count: xs.len(),
        mean: mean(&xs),
        std: sample_std(&xs),
        min: xs.first().copied(),
        q25: quantile_sorted(&xs, 0.25),
        median: quantile_sorted(&xs, 0.5),
        q75: quantile_sorted(&xs, 0.75),
        max: xs.last().copied(),
    }
}

pub fn describe_categorical(column: &Column) -> CategoricalSummary {
    let distinct = distinct_values(column);
    let mut top: Option<(CellValue, usize)> = None;
    for v in &distinct {
        let n = column.values.iter().filter(|c| *c == v).count();
        if top.as_ref().map_or(true, |(_, best)| n > *best) {
            top = Some((v.clone(), n));
        }
    }
    let (top, freq) = match top {
        Some((v, n)) => (Some(v), n),
        None => (None, 0),
    };
    CategoricalSummary {
        column: column.name.clone(),
        count: column.count(),
        unique: distinct.len(),
        top,
        freq,
    }
}

pub fn mean(xs: &[f64]) -> Option<f64> {
    if xs.is_empty() {
        None
    } else {
        Some(xs.iter().sum::<f64>() / xs.len() as f64)
    }
}

/// Sample standard deviation (ddof = 1).
pub fn sample_std(xs: &[f64]) -> Option<f64> {
    if xs.len() < 2 {
        return None;
    }
    let m = mean(xs)?;
    let ss: f64 = xs.iter().map(|x| (x - m).powi(2)).sum();
    Some((ss / (xs.len() - 1) as f64).sqrt())
}

/// Linear-interpolated quantile of ascending data.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(name: &str, xs: &[f64]) -> Column {
        Column::inferred(name, xs.iter().map(|&x| CellValue::Float(x)).collect())
    }

    #[test]
    fn numeric_summary_matches_reference_values() {
        let col = numbers("v", &[1.0, 2.0, 3.0, 4.0]);
        let s = describe_numeric(&col);
        assert_eq!(s.count, 4);
        assert_eq!(s.mean, Some(2.5));
        assert!((s.std.unwrap() - 1.2909944487358056).abs() < 1e-12);
        assert_eq!(s.min, Some(1.0));
        assert_eq!(s.q25, Some(1.75));
        assert_eq!(s.median, Some(2.5));
        assert_eq!(s.q75, Some(3.25));
        assert_eq!(s.max, Some(4.0));
    }

    #[test]
    fn missing_values_are_ignored() {
        let col = Column::inferred(
            "v",
            vec![CellValue::Integer(5), CellValue::Null, CellValue::Integer(7)],
        );
        let s = describe_numeric(&col);
        assert_eq!(s.count, 2);
        assert_eq!(s.mean, Some(6.0));
    }

    #[test]
    fn single_value_has_no_std() {
        let s = describe_numeric(&numbers("v", &[3.0]));
        assert_eq!(s.std, None);
        assert_eq!(s.median, Some(3.0));
    }

    #[test]
    fn describe_prefers_numeric_columns() {
        let t = Table::new(vec![
            Column::inferred("c", vec![CellValue::Text("a".into())]),
            numbers("v", &[1.0]),
        ])
        .unwrap();
        match describe(&t) {
            Summary::Numeric(cols) => {
                assert_eq!(cols.len(), 1);
                assert_eq!(cols[0].column, "v");
            }
            other => panic!("unexpected summary {other:?}"),
        }
    }

    #[test]
    fn describe_falls_back_to_categorical() {
        let t = Table::new(vec![Column::inferred(
            "c",
            vec![
                CellValue::Text("a".into()),
                CellValue::Text("b".into()),
                CellValue::Text("b".into()),
                CellValue::Null,
            ],
        )])
        .unwrap();
        let Summary::Categorical(cols) = describe(&t) else {
            panic!("expected categorical summary");
        };
        assert_eq!(cols[0].count, 3);
        assert_eq!(cols[0].unique, 2);
        assert_eq!(cols[0].top, Some(CellValue::Text("b".into())));
        assert_eq!(cols[0].freq, 2);
    }
}
