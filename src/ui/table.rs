use eframe::egui::{self, Ui};
use egui_extras::{Column as TableColumn, TableBuilder};

use crate::data::model::Table;
use crate::data::stats::{NumericSummary, Summary};

// ---------------------------------------------------------------------------
// Data tables (central panel)
// ---------------------------------------------------------------------------

/// Scrollable grid of every row of `table`.
pub fn data_table(ui: &mut Ui, id: &str, table: &Table, row_height: f32) {
    if table.width() == 0 {
        ui.label("No columns.");
        return;
    }
    ui.push_id(id, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .columns(TableColumn::auto().at_least(60.0), table.width())
            .max_scroll_height(260.0)
            .header(row_height + 2.0, |mut header| {
                for col in table.columns() {
                    header.col(|ui: &mut Ui| {
                        ui.strong(&col.name);
                    });
                }
            })
            .body(|body| {
                body.rows(row_height, table.len(), |mut row| {
                    let r = row.index();
                    for col in table.columns() {
                        row.col(|ui: &mut Ui| {
                            ui.label(col.values[r].to_string());
                        });
                    }
                });
            });
    });
}

fn fmt_stat(value: Option<f64>) -> String {
    value.map_or_else(|| "NaN".to_string(), |v| format!("{v:.4}"))
}

/// Column names and `(label, cells)` rows of a summary, statistics as rows.
fn summary_grid(summary: &Summary) -> (Vec<String>, Vec<(String, Vec<String>)>) {
    match summary {
        Summary::Numeric(cols) => {
            let names = cols.iter().map(|c| c.column.clone()).collect();
            let per_column: Vec<_> = cols.iter().map(NumericSummary::rows).collect();
            let rows = per_column
                .first()
                .map(|first| {
                    first
                        .iter()
                        .enumerate()
                        .map(|(i, (label, _))| {
                            let cells = per_column.iter().map(|r| fmt_stat(r[i].1)).collect();
                            (label.to_string(), cells)
                        })
                        .collect()
                })
                .unwrap_or_default();
            (names, rows)
        }
        Summary::Categorical(cols) => {
            let names = cols.iter().map(|c| c.column.clone()).collect();
            let rows = vec![
                ("count".to_string(), cols.iter().map(|c| c.count.to_string()).collect()),
                ("unique".to_string(), cols.iter().map(|c| c.unique.to_string()).collect()),
                (
                    "top".to_string(),
                    cols.iter()
                        .map(|c| c.top.as_ref().map_or_else(String::new, |v| v.to_string()))
                        .collect(),
                ),
                ("freq".to_string(), cols.iter().map(|c| c.freq.to_string()).collect()),
            ];
            (names, rows)
        }
    }
}

/// `describe()`-style table: statistics as rows, columns as columns.
pub fn summary_table(ui: &mut Ui, summary: &Summary, row_height: f32) {
    let (names, rows) = summary_grid(summary);

    if names.is_empty() {
        ui.label("Nothing to summarise.");
        return;
    }

    ui.push_id("summary_table", |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .column(TableColumn::auto().at_least(50.0))
            .columns(TableColumn::auto().at_least(70.0), names.len())
            .header(row_height + 2.0, |mut header| {
                header.col(|_ui: &mut Ui| {});
                for name in &names {
                    header.col(|ui: &mut Ui| {
                        ui.strong(name);
                    });
                }
            })
            .body(|mut body| {
                for (label, cells) in &rows {
                    body.row(row_height, |mut row| {
                        row.col(|ui: &mut Ui| {
                            ui.strong(label);
                        });
                        for cell in cells {
                            row.col(|ui: &mut Ui| {
                                ui.label(cell);
                            });
                        }
                    });
                }
            });
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{CellValue, Column};
    use crate::data::stats::describe;

    #[test]
    fn numeric_grid_follows_summary_rows() {
        let t = Table::new(vec![
            Column::inferred("a", vec![CellValue::Integer(1), CellValue::Integer(3)]),
            Column::inferred("b", vec![CellValue::Float(2.0), CellValue::Null]),
        ])
        .unwrap();
        let summary = describe(&t);
        let (names, rows) = summary_grid(&summary);
        assert_eq!(names, vec!["a", "b"]);

        let Summary::Numeric(cols) = &summary else {
            panic!("expected a numeric summary");
        };
        let labels: Vec<&str> = cols[0].rows().iter().map(|(l, _)| *l).collect();
        let grid_labels: Vec<&str> = rows.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(grid_labels, labels);
        assert_eq!(rows[0].1, vec!["2.0000", "1.0000"]);
        // one value has no sample standard deviation
        assert_eq!(rows[2].1[1], "NaN");
    }
}
