use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook};
use serde::{Deserialize, Serialize};

use super::model::{CellValue, Table};

/// Sheet name used for spreadsheet downloads.
pub const SHEET_NAME: &str = "Filtered Data";

/// Download format chosen by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Excel,
}

impl ExportFormat {
    pub fn file_name(self) -> &'static str {
        match self {
            ExportFormat::Csv => "filtered.csv",
            ExportFormat::Excel => "filtered.xlsx",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Excel => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Excel => "xlsx",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Csv => write!(f, "CSV"),
            ExportFormat::Excel => write!(f, "Excel"),
        }
    }
}

/// A serialized table ready to be saved by the download button.
#[derive(Debug, Clone)]
pub struct Export {
    pub file_name: &'static str,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl Export {
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, &self.bytes).with_context(|| format!("writing {}", path.display()))
    }
}

pub fn export(table: &Table, format: ExportFormat) -> Result<Export> {
    let bytes = match format {
        ExportFormat::Csv => to_csv(table)?,
        ExportFormat::Excel => to_xlsx(table)?,
    };
    Ok(Export {
        file_name: format.file_name(),
        mime: format.mime(),
        bytes,
    })
}

/// CSV text of a cell.  Floats keep a decimal point so they re-parse as
/// floats; missing values are empty fields.
fn csv_field(value: &CellValue) -> String {
    match value {
        CellValue::Text(s) => s.clone(),
        CellValue::Integer(i) => i.to_string(),
        CellValue::Float(v) if v.is_nan() => String::new(),
        CellValue::Float(v) => format!("{v:?}"),
        CellValue::Bool(b) => if *b { "True" } else { "False" }.to_string(),
        CellValue::Null => String::new(),
    }
}

pub fn to_csv(table: &Table) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(table.columns().iter().map(|c| c.name.as_str()))
        .context("writing CSV header")?;
    for row in 0..table.len() {
        writer
            .write_record(table.columns().iter().map(|c| csv_field(&c.values[row])))
            .with_context(|| format!("writing CSV row {row}"))?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("flushing CSV output: {}", e.error()))
}

pub fn to_xlsx(table: &Table) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME).context("naming worksheet")?;

    for (col_idx, col) in table.columns().iter().enumerate() {
        let c = u16::try_from(col_idx).context("too many columns for a worksheet")?;
        sheet
            .write_string_with_format(0, c, &col.name, &header)
            .context("writing header cell")?;

        for (row_idx, value) in col.values.iter().enumerate() {
            let r = u32::try_from(row_idx + 1).context("too many rows for a worksheet")?;
            match value {
                CellValue::Text(s) => sheet.write_string(r, c, s).map(|_| ()),
                CellValue::Integer(i) => sheet.write_number(r, c, *i as f64).map(|_| ()),
                CellValue::Float(v) if v.is_finite() => sheet.write_number(r, c, *v).map(|_| ()),
                // Sheets have no infinity; keep the value visible as text.
                CellValue::Float(v) if v.is_infinite() => {
                    log::warn!("Writing infinite value in column {} as text", col.name);
                    let text = if *v > 0.0 { "inf" } else { "-inf" };
                    sheet.write_string(r, c, text).map(|_| ())
                }
                CellValue::Bool(b) => sheet.write_boolean(r, c, *b).map(|_| ()),
                CellValue::Float(_) | CellValue::Null => Ok(()),
            }
            .with_context(|| format!("writing cell ({r}, {c})"))?;
        }
    }

    workbook.save_to_buffer().context("building workbook")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{FilterSpec, Predicate, apply_filter};
    use crate::data::loader::{FileFormat, load_bytes};
    use crate::data::model::{Column, ColumnKind};

    fn sample() -> Table {
        Table::new(vec![
            Column::inferred(
                "category",
                vec![
                    CellValue::Text("A".into()),
                    CellValue::Text("A, quoted \"x\"".into()),
                    CellValue::Text("B".into()),
                ],
            ),
            Column::inferred(
                "value",
                vec![
                    CellValue::Integer(10),
                    CellValue::Integer(20),
                    CellValue::Integer(30),
                ],
            ),
            Column::inferred(
                "ratio",
                vec![
                    CellValue::Float(0.1),
                    CellValue::Float(2.0),
                    CellValue::Float(1e-7),
                ],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn names_and_mime_types() {
        assert_eq!(ExportFormat::Csv.file_name(), "filtered.csv");
        assert_eq!(ExportFormat::Csv.mime(), "text/csv");
        assert_eq!(ExportFormat::Excel.file_name(), "filtered.xlsx");
        assert!(ExportFormat::Excel.mime().ends_with("spreadsheetml.sheet"));
    }

    #[test]
    fn csv_round_trip() {
        let t = sample();
        let spec = FilterSpec {
            column: "value".into(),
            predicate: Predicate::Range { min: 15.0, max: 30.0 },
        };
        let filtered = apply_filter(&t, &spec);
        let out = export(&filtered, ExportFormat::Csv).unwrap();
        let back = load_bytes(&out.bytes, FileFormat::Csv).unwrap();
        assert_eq!(back, filtered);
    }

    #[test]
    fn csv_missing_values_are_empty_fields() {
        let t = Table::new(vec![
            Column::inferred("a", vec![CellValue::Integer(1), CellValue::Integer(2)]),
            Column::inferred("b", vec![CellValue::Null, CellValue::Float(1.5)]),
        ])
        .unwrap();
        let text = String::from_utf8(to_csv(&t).unwrap()).unwrap();
        assert_eq!(text, "a,b\n1,\n2,1.5\n");
    }

    #[test]
    fn xlsx_round_trip() {
        let t = sample();
        let out = export(&t, ExportFormat::Excel).unwrap();
        let back = load_bytes(&out.bytes, FileFormat::Excel).unwrap();

        assert_eq!(back.column_names(), t.column_names());
        assert_eq!(back.len(), t.len());
        for (orig, read) in t.columns().iter().zip(back.columns()) {
            assert_eq!(orig.kind, read.kind);
            for (a, b) in orig.values.iter().zip(&read.values) {
                match orig.kind {
                    ColumnKind::Numeric => {
                        let (a, b) = (a.as_f64().unwrap(), b.as_f64().unwrap());
                        assert!((a - b).abs() < 1e-9, "{a} != {b}");
                    }
                    ColumnKind::Categorical => assert_eq!(a, b),
                }
            }
        }
    }

    fn code_table() -> Table {
        Table::new(vec![
            Column::inferred(
                "code",
                vec![
                    CellValue::Text("1".into()),
                    CellValue::Text("x".into()),
                    CellValue::Text("1".into()),
                ],
            ),
            Column::inferred(
                "label",
                vec![
                    CellValue::Text("NA".into()),
                    CellValue::Text("B".into()),
                    CellValue::Text("C".into()),
                ],
            ),
        ])
        .unwrap()
    }

    fn code_filter() -> FilterSpec {
        FilterSpec {
            column: "code".into(),
            predicate: Predicate::Equals(CellValue::Text("1".into())),
        }
    }

    #[test]
    fn xlsx_keeps_numeric_looking_and_marker_text() {
        let filtered = apply_filter(&code_table(), &code_filter());
        let out = export(&filtered, ExportFormat::Excel).unwrap();
        let back = load_bytes(&out.bytes, FileFormat::Excel).unwrap();
        assert_eq!(back, filtered);
    }

    #[test]
    fn csv_text_is_reinferred_on_reload() {
        // CSV carries no types: text that reads as a number or a missing
        // marker is re-inferred when the file is loaded again.
        let filtered = apply_filter(&code_table(), &code_filter());
        let out = export(&filtered, ExportFormat::Csv).unwrap();
        let back = load_bytes(&out.bytes, FileFormat::Csv).unwrap();

        let code = back.column("code").unwrap();
        assert_eq!(code.kind, ColumnKind::Numeric);
        assert_eq!(code.values, vec![CellValue::Integer(1), CellValue::Integer(1)]);
        let label = back.column("label").unwrap();
        assert_eq!(label.values, vec![CellValue::Null, CellValue::Text("C".into())]);
    }

    #[test]
    fn xlsx_writes_infinity_as_text() {
        let t = load_bytes(b"v\n1.5\ninf\n", FileFormat::Csv).unwrap();
        assert_eq!(t.column("v").unwrap().values[1], CellValue::Float(f64::INFINITY));

        let out = export(&t, ExportFormat::Excel).unwrap();
        let back = load_bytes(&out.bytes, FileFormat::Excel).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(
            back.column("v").unwrap().values,
            vec![CellValue::Float(1.5), CellValue::Text("inf".into())]
        );
    }

    #[test]
    fn csv_keeps_infinity() {
        let t = load_bytes(b"v\n1.5\n-inf\n", FileFormat::Csv).unwrap();
        let out = export(&t, ExportFormat::Csv).unwrap();
        assert_eq!(load_bytes(&out.bytes, FileFormat::Csv).unwrap(), t);
    }

    #[test]
    fn saves_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filtered.csv");
        let out = export(&sample(), ExportFormat::Csv).unwrap();
        out.save(&path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), out.bytes);
    }
}
