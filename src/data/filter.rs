use super::model::{CellValue, Column, ColumnKind, Table};

// ---------------------------------------------------------------------------
// Filter predicate on a single column
// ---------------------------------------------------------------------------

/// How rows are kept for the selected column.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Exact match against one of the column's distinct values.
    Equals(CellValue),
    /// Inclusive `min <= x <= max`.
    Range { min: f64, max: f64 },
}

/// A column plus the predicate applied to it.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSpec {
    pub column: String,
    pub predicate: Predicate,
}

impl FilterSpec {
    /// The initial filter for a column: its first distinct value when
    /// categorical, its full `[min, max]` when numeric.  `None` when the
    /// column is missing, empty or all missing.
    pub fn default_for(table: &Table, column: &str) -> Option<FilterSpec> {
        let col = table.column(column)?;
        let predicate = match col.kind {
            ColumnKind::Categorical => {
                Predicate::Equals(distinct_values(col).into_iter().next()?)
            }
            ColumnKind::Numeric => {
                let (min, max) = numeric_bounds(col)?;
                Predicate::Range { min, max }
            }
        };
        Some(FilterSpec {
            column: column.to_string(),
            predicate,
        })
    }

    /// A range filter narrowed by the user, clamped into the column's bounds.
    pub fn narrowed(table: &Table, column: &str, lo: f64, hi: f64) -> Option<FilterSpec> {
        let (min, max) = numeric_bounds(table.column(column)?)?;
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        Some(FilterSpec {
            column: column.to_string(),
            predicate: Predicate::Range {
                min: lo.clamp(min, max),
                max: hi.clamp(min, max),
            },
        })
    }
}

/// Distinct non-missing values in first-seen order.
pub fn distinct_values(column: &Column) -> Vec<CellValue> {
    let mut out: Vec<CellValue> = Vec::new();
    for v in &column.values {
        if !v.is_null() && !out.contains(v) {
            out.push(v.clone());
        }
    }
    out
}

/// `(min, max)` over non-missing numbers.
pub fn numeric_bounds(column: &Column) -> Option<(f64, f64)> {
    column.numbers().into_iter().fold(None, |acc, x| match acc {
        None => Some((x, x)),
        Some((lo, hi)) => Some((lo.min(x), hi.max(x))),
    })
}

/// Whether a cell passes the predicate.  Missing cells never pass.
pub fn matches(value: &CellValue, predicate: &Predicate) -> bool {
    if value.is_null() {
        return false;
    }
    match predicate {
        Predicate::Equals(target) => value == target,
        Predicate::Range { min, max } => value
            .as_f64()
            .is_some_and(|x| *min <= x && x <= *max),
    }
}

/// Return indices of rows that pass the filter, in table order.
pub fn filtered_indices(table: &Table, spec: &FilterSpec) -> Vec<usize> {
    let Some(col) = table.column(&spec.column) else {
        return Vec::new();
    };
    col.values
        .iter()
        .enumerate()
        .filter(|(_, v)| matches(v, &spec.predicate))
        .map(|(i, _)| i)
        .collect()
}

/// The subset of rows that pass the filter, with every column kept.
pub fn apply_filter(table: &Table, spec: &FilterSpec) -> Table {
    table.take_rows(&filtered_indices(table, spec))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn sample() -> Table {
        Table::new(vec![
            Column::inferred("category", vec![text("A"), text("A"), text("B")]),
            Column::inferred(
                "value",
                vec![
                    CellValue::Integer(10),
                    CellValue::Integer(20),
                    CellValue::Integer(30),
                ],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn categorical_filter_keeps_matching_rows() {
        let t = sample();
        let spec = FilterSpec {
            column: "category".into(),
            predicate: Predicate::Equals(text("A")),
        };
        let out = apply_filter(&t, &spec);
        assert_eq!(out.len(), 2);
        assert_eq!(
            out.column("value").unwrap().values,
            vec![CellValue::Integer(10), CellValue::Integer(20)]
        );
        assert_eq!(out.column_names(), t.column_names());
    }

    #[test]
    fn categorical_filter_is_sound_and_complete() {
        let t = Table::new(vec![Column::inferred(
            "c",
            vec![text("x"), text("y"), text("x"), CellValue::Null, text("x")],
        )])
        .unwrap();
        for v in distinct_values(t.column("c").unwrap()) {
            let spec = FilterSpec {
                column: "c".into(),
                predicate: Predicate::Equals(v.clone()),
            };
            let idx = filtered_indices(&t, &spec);
            let expected: Vec<usize> = t.column("c").unwrap().values
                .iter()
                .enumerate()
                .filter(|(_, cell)| **cell == v)
                .map(|(i, _)| i)
                .collect();
            assert_eq!(idx, expected);
        }
    }

    #[test]
    fn range_filter_includes_bounds() {
        let t = sample();
        let spec = FilterSpec {
            column: "value".into(),
            predicate: Predicate::Range { min: 10.0, max: 20.0 },
        };
        let out = apply_filter(&t, &spec);
        assert_eq!(
            out.column("category").unwrap().values,
            vec![text("A"), text("A")]
        );

        let spec = FilterSpec {
            column: "value".into(),
            predicate: Predicate::Range { min: 15.0, max: 30.0 },
        };
        assert_eq!(filtered_indices(&t, &spec), vec![1, 2]);
    }

    #[test]
    fn range_filter_skips_missing() {
        let t = Table::new(vec![Column::inferred(
            "v",
            vec![CellValue::Float(1.0), CellValue::Null, CellValue::Float(f64::NAN)],
        )])
        .unwrap();
        let spec = FilterSpec::default_for(&t, "v").unwrap();
        assert_eq!(spec.predicate, Predicate::Range { min: 1.0, max: 1.0 });
        assert_eq!(filtered_indices(&t, &spec), vec![0]);
    }

    #[test]
    fn defaults_follow_column_kind() {
        let t = sample();
        assert_eq!(
            FilterSpec::default_for(&t, "category").unwrap().predicate,
            Predicate::Equals(text("A"))
        );
        assert_eq!(
            FilterSpec::default_for(&t, "value").unwrap().predicate,
            Predicate::Range { min: 10.0, max: 30.0 }
        );
        assert!(FilterSpec::default_for(&t, "missing").is_none());
    }

    #[test]
    fn all_missing_column_has_no_default() {
        let t = Table::new(vec![Column::inferred(
            "v",
            vec![CellValue::Null, CellValue::Null],
        )])
        .unwrap();
        assert!(FilterSpec::default_for(&t, "v").is_none());
    }

    #[test]
    fn empty_table_filters_to_empty_table() {
        let t = sample().empty_like();
        let spec = FilterSpec {
            column: "value".into(),
            predicate: Predicate::Range { min: 0.0, max: 100.0 },
        };
        let out = apply_filter(&t, &spec);
        assert!(out.is_empty());
        assert_eq!(out.column_names(), vec!["category", "value"]);
    }

    #[test]
    fn narrowed_range_is_clamped_and_ordered() {
        let t = sample();
        let spec = FilterSpec::narrowed(&t, "value", 50.0, 15.0).unwrap();
        assert_eq!(spec.predicate, Predicate::Range { min: 15.0, max: 30.0 });
    }

    #[test]
    fn filtering_does_not_mutate_source() {
        let t = sample();
        let before = t.clone();
        let spec = FilterSpec::default_for(&t, "category").unwrap();
        let _ = apply_filter(&t, &spec);
        assert_eq!(t, before);
    }
}
