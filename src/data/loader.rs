use std::collections::BTreeSet;
use std::fmt;
use std::io::Cursor;
use std::path::Path;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{
    DataType, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type, UInt16Type,
    UInt32Type, UInt64Type, UInt8Type,
};
use arrow::util::display::array_value_to_string;
use calamine::{Data, DataType as _, Reader, Xlsx, open_workbook_from_rs};
use chrono::{NaiveDateTime, Timelike};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::model::{CellValue, Column, ColumnKind, Table};

// ---------------------------------------------------------------------------
// Declared file format
// ---------------------------------------------------------------------------

/// The format the user declares before uploading. It always selects the
/// parser, whatever the file is called.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    #[default]
    Csv,
    Excel,
    Parquet,
    Json,
}

impl FileFormat {
    pub const ALL: [FileFormat; 4] = [
        FileFormat::Csv,
        FileFormat::Excel,
        FileFormat::Parquet,
        FileFormat::Json,
    ];

    /// Extensions accepted by the upload dialog for this format.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            FileFormat::Csv => &["csv"],
            FileFormat::Excel => &["xlsx"],
            FileFormat::Parquet => &["parquet", "pq"],
            FileFormat::Json => &["json"],
        }
    }

    pub fn from_extension(ext: &str) -> Option<FileFormat> {
        let ext = ext.to_ascii_lowercase();
        FileFormat::ALL
            .into_iter()
            .find(|f| f.extensions().contains(&ext.as_str()))
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileFormat::Csv => write!(f, "CSV File"),
            FileFormat::Excel => write!(f, "Excel File"),
            FileFormat::Parquet => write!(f, "Parquet File"),
            FileFormat::Json => write!(f, "JSON File"),
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Parse uploaded bytes as the declared format.
pub fn load_bytes(bytes: &[u8], format: FileFormat) -> Result<Table> {
    match format {
        FileFormat::Csv => load_csv(bytes),
        FileFormat::Excel => load_excel(bytes),
        FileFormat::Parquet => load_parquet(bytes),
        FileFormat::Json => load_json(bytes),
    }
}

/// Load a table from disk.  Dispatch by extension.
pub fn load_file(path: &Path) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");
    let Some(format) = FileFormat::from_extension(ext) else {
        bail!("Unsupported file extension: .{ext}");
    };
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    load_bytes(&bytes, format)
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Spellings treated as a missing value in text input.
const MISSING_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

fn is_missing(s: &str) -> bool {
    MISSING_TOKENS.contains(&s)
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

/// Make header names unique: blanks become `Unnamed: i`, repeats get a
/// `.1`, `.2`, ... suffix.
fn unique_names<I>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let raw: Vec<String> = raw
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            if name.trim().is_empty() {
                format!("Unnamed: {i}")
            } else {
                name
            }
        })
        .collect();

    let mut used: BTreeSet<String> = BTreeSet::new();
    let mut names = Vec::with_capacity(raw.len());
    for name in &raw {
        let mut candidate = name.clone();
        let mut k = 1;
        while used.contains(&candidate) || (candidate != *name && raw.contains(&candidate)) {
            candidate = format!("{name}.{k}");
            k += 1;
        }
        used.insert(candidate.clone());
        names.push(candidate);
    }
    names
}

/// Infer the type of a column of raw text cells.
fn infer_text_column(name: String, raw: Vec<String>) -> Column {
    let present: Vec<&str> = raw
        .iter()
        .map(String::as_str)
        .filter(|s| !is_missing(s))
        .collect();
    let has_missing = present.len() != raw.len();

    if !has_missing && present.iter().all(|s| s.trim().parse::<i64>().is_ok()) {
        let values = raw
            .iter()
            .map(|s| s.trim().parse::<i64>().map_or(CellValue::Null, CellValue::Integer))
            .collect();
        return Column::new(name, ColumnKind::Numeric, values);
    }

    if present.iter().all(|s| s.trim().parse::<f64>().is_ok()) {
        let values = raw
            .iter()
            .map(|s| {
                if is_missing(s) {
                    CellValue::Null
                } else {
                    s.trim().parse::<f64>().map_or(CellValue::Null, CellValue::Float)
                }
            })
            .collect();
        return Column::new(name, ColumnKind::Numeric, values);
    }

    let boolean = present.iter().all(|s| parse_bool(s).is_some());
    let values = raw
        .iter()
        .map(|s| {
            if is_missing(s) {
                CellValue::Null
            } else if boolean {
                parse_bool(s).map_or(CellValue::Null, CellValue::Bool)
            } else {
                CellValue::Text(s.clone())
            }
        })
        .collect();
    Column::new(name, ColumnKind::Categorical, values)
}

/// Numeric columns holding only whole floats and no gaps become integer
/// columns.
fn normalize_integers(mut col: Column) -> Column {
    if !col.is_numeric() || col.is_empty() {
        return col;
    }
    let whole = col.values.iter().all(|v| match v {
        CellValue::Integer(_) => true,
        CellValue::Float(f) => f.fract() == 0.0 && f.abs() < 9.0e15,
        _ => false,
    });
    if whole {
        for v in &mut col.values {
            if let CellValue::Float(f) = *v {
                *v = CellValue::Integer(f as i64);
            }
        }
    }
    col
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Header row with column names, one record per row.  Short records are
/// padded with missing values; long records are an error.
fn load_csv(bytes: &[u8]) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();
    let names = unique_names(headers);

    let mut raw: Vec<Vec<String>> = vec![Vec::new(); names.len()];
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        if record.len() > names.len() {
            bail!(
                "CSV row {row_no}: expected {} fields, saw {}",
                names.len(),
                record.len()
            );
        }
        for (col_idx, cells) in raw.iter_mut().enumerate() {
            cells.push(record.get(col_idx).unwrap_or("").to_string());
        }
    }

    let columns = names
        .into_iter()
        .zip(raw)
        .map(|(name, cells)| infer_text_column(name, cells))
        .collect();
    Ok(Table::new(columns)?)
}

// ---------------------------------------------------------------------------
// Excel loader
// ---------------------------------------------------------------------------

/// First worksheet of an `.xlsx` workbook; the first row is the header.
fn load_excel(bytes: &[u8]) -> Result<Table> {
    let mut workbook: Xlsx<_> =
        open_workbook_from_rs(Cursor::new(bytes)).context("opening Excel workbook")?;
    let range = workbook
        .worksheet_range_at(0)
        .context("workbook has no worksheets")?
        .context("reading first worksheet")?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(Table::default());
    };
    let names = unique_names(header.iter().map(|cell| match cell {
        Data::String(s) => s.clone(),
        Data::Empty => String::new(),
        other => other.to_string(),
    }));

    let mut cells: Vec<Vec<CellValue>> = vec![Vec::new(); names.len()];
    for row in rows {
        for (col_idx, column) in cells.iter_mut().enumerate() {
            column.push(row.get(col_idx).map_or(CellValue::Null, excel_cell));
        }
    }

    let columns = names
        .into_iter()
        .zip(cells)
        .map(|(name, values)| normalize_integers(Column::inferred(name, values)))
        .collect();
    Ok(Table::new(columns)?)
}

/// Sheet cells carry their own type, so only empty strings count as missing;
/// a text cell reading `NA` stays text.
fn excel_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::String(s) if s.is_empty() => CellValue::Null,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::DateTime(_) | Data::DateTimeIso(_) => match cell.as_datetime() {
            Some(dt) => CellValue::Text(iso_datetime(&dt)),
            None => CellValue::Text(cell.to_string()),
        },
        Data::Empty | Data::Error(_) => CellValue::Null,
        other => CellValue::Text(other.to_string()),
    }
}

/// `YYYY-MM-DD`, with ` HH:MM:SS` only when the time is not midnight.
fn iso_datetime(dt: &NaiveDateTime) -> String {
    if dt.num_seconds_from_midnight() == 0 {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON:
///
/// ```json
/// [
///   { "region": "North", "units": 12, "price": 3.5 },
///   ...
/// ]
/// ```
fn load_json(bytes: &[u8]) -> Result<Table> {
    let root: JsonValue = serde_json::from_slice(bytes).context("parsing JSON")?;
    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut names: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !names.contains(key) {
                names.push(key.clone());
            }
        }
    }

    let columns = names
        .into_iter()
        .map(|name| {
            let values = records
                .iter()
                .map(|rec| rec.get(&name).map_or(CellValue::Null, json_to_cell))
                .collect();
            Column::inferred(name, values)
        })
        .collect();
    Ok(Table::new(columns)?)
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::Text(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Flat Parquet columns (strings, integers, floats, booleans).  Works with
/// files written by common dataframe libraries.
fn load_parquet(bytes: &[u8]) -> Result<Table> {
    let data = bytes::Bytes::copy_from_slice(bytes);
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(data).context("reading parquet metadata")?;
    let schema = builder.schema().clone();
    let reader = builder.build().context("building parquet reader")?;

    let mut cells: Vec<Vec<CellValue>> = vec![Vec::new(); schema.fields().len()];
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for (col_idx, column) in cells.iter_mut().enumerate() {
            let array = batch.column(col_idx);
            for row in 0..batch.num_rows() {
                column.push(arrow_cell(array, row)?);
            }
        }
    }

    let columns = schema
        .fields()
        .iter()
        .zip(cells)
        .map(|(field, values)| {
            let kind = if field.data_type().is_numeric() {
                ColumnKind::Numeric
            } else {
                ColumnKind::Categorical
            };
            Column::new(field.name().clone(), kind, values)
        })
        .collect();
    Ok(Table::new(columns)?)
}

/// Extract a single cell from an Arrow column at a given row.
fn arrow_cell(col: &ArrayRef, row: usize) -> Result<CellValue> {
    if col.is_null(row) {
        return Ok(CellValue::Null);
    }
    let value = match col.data_type() {
        DataType::Utf8 => CellValue::Text(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => CellValue::Text(col.as_string::<i64>().value(row).to_string()),
        DataType::Int8 => CellValue::Integer(col.as_primitive::<Int8Type>().value(row).into()),
        DataType::Int16 => CellValue::Integer(col.as_primitive::<Int16Type>().value(row).into()),
        DataType::Int32 => CellValue::Integer(col.as_primitive::<Int32Type>().value(row).into()),
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::UInt8 => CellValue::Integer(col.as_primitive::<UInt8Type>().value(row).into()),
        DataType::UInt16 => CellValue::Integer(col.as_primitive::<UInt16Type>().value(row).into()),
        DataType::UInt32 => CellValue::Integer(col.as_primitive::<UInt32Type>().value(row).into()),
        DataType::UInt64 => {
            let v = col.as_primitive::<UInt64Type>().value(row);
            i64::try_from(v).map_or(CellValue::Float(v as f64), CellValue::Integer)
        }
        DataType::Float32 => {
            CellValue::Float(col.as_primitive::<Float32Type>().value(row).into())
        }
        DataType::Float64 => CellValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => CellValue::Bool(col.as_boolean().value(row)),
        _ => CellValue::Text(
            array_value_to_string(col, row).context("formatting parquet value")?,
        ),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_infers_types() {
        let csv = "category,value,price,flag\nA,10,1.5,true\nA,20,,false\nB,30,2.5,true\n";
        let t = load_bytes(csv.as_bytes(), FileFormat::Csv).unwrap();
        assert_eq!(t.len(), 3);
        let value = t.column("value").unwrap();
        assert_eq!(value.kind, ColumnKind::Numeric);
        assert_eq!(value.values[1], CellValue::Integer(20));
        let price = t.column("price").unwrap();
        assert_eq!(price.kind, ColumnKind::Numeric);
        assert_eq!(price.values[1], CellValue::Null);
        assert_eq!(price.values[2], CellValue::Float(2.5));
        assert_eq!(t.column("category").unwrap().kind, ColumnKind::Categorical);
        let flag = t.column("flag").unwrap();
        assert_eq!(flag.kind, ColumnKind::Categorical);
        assert_eq!(flag.values[0], CellValue::Bool(true));
    }

    #[test]
    fn csv_mixed_column_is_text() {
        let csv = "code\n1\nx\n3\n";
        let t = load_bytes(csv.as_bytes(), FileFormat::Csv).unwrap();
        let col = t.column("code").unwrap();
        assert_eq!(col.kind, ColumnKind::Categorical);
        assert_eq!(col.values[0], CellValue::Text("1".into()));
    }

    #[test]
    fn csv_pads_short_rows_and_rejects_long_rows() {
        let t = load_bytes(b"a,b\n1\n2,3\n", FileFormat::Csv).unwrap();
        assert_eq!(t.column("b").unwrap().values[0], CellValue::Null);

        let err = load_bytes(b"a,b\n1,2,3\n", FileFormat::Csv).unwrap_err();
        assert!(err.to_string().contains("expected 2 fields"));
    }

    #[test]
    fn duplicate_and_blank_headers_are_renamed() {
        let names = unique_names(vec!["a".into(), "a".into(), "".into(), "a".into()]);
        assert_eq!(names, vec!["a", "a.1", "Unnamed: 2", "a.2"]);
    }

    #[test]
    fn header_only_csv_gives_empty_table() {
        let t = load_bytes(b"x,y\n", FileFormat::Csv).unwrap();
        assert!(t.is_empty());
        assert_eq!(t.column_names(), vec!["x", "y"]);
    }

    #[test]
    fn declared_excel_does_not_parse_csv() {
        let err = load_bytes(b"a,b\n1,2\n", FileFormat::Excel);
        assert!(err.is_err());
    }

    #[test]
    fn json_records() {
        let json = r#"[{"name":"A","v":1},{"name":"B","v":2.5},{"name":"C"}]"#;
        let t = load_bytes(json.as_bytes(), FileFormat::Json).unwrap();
        assert_eq!(t.len(), 3);
        let v = t.column("v").unwrap();
        assert!(v.is_numeric());
        assert_eq!(v.values[2], CellValue::Null);
        assert_eq!(t.column("name").unwrap().kind, ColumnKind::Categorical);
    }

    #[test]
    fn json_rejects_non_array() {
        assert!(load_bytes(br#"{"a":1}"#, FileFormat::Json).is_err());
    }

    #[test]
    fn parquet_flat_columns() {
        use std::sync::Arc;

        use arrow::array::{Float64Array, Int64Array, StringArray};
        use arrow::datatypes::{Field, Schema};
        use arrow::record_batch::RecordBatch;
        use parquet::arrow::ArrowWriter;

        let schema = Arc::new(Schema::new(vec![
            Field::new("region", DataType::Utf8, true),
            Field::new("units", DataType::Int64, false),
            Field::new("price", DataType::Float64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec![Some("North"), None])),
                Arc::new(Int64Array::from(vec![3, 4])),
                Arc::new(Float64Array::from(vec![Some(1.25), None])),
            ],
        )
        .unwrap();
        let mut buf = Vec::new();
        let mut writer = ArrowWriter::try_new(&mut buf, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let t = load_bytes(&buf, FileFormat::Parquet).unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t.numeric_columns(), vec!["units", "price"]);
        assert_eq!(t.column("region").unwrap().values[1], CellValue::Null);
        assert_eq!(t.column("units").unwrap().values[1], CellValue::Integer(4));
    }

    fn workbook_bytes(fill: impl FnOnce(&mut rust_xlsxwriter::Worksheet)) -> Vec<u8> {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        fill(workbook.add_worksheet());
        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn excel_dates_become_iso_text() {
        let bytes = workbook_bytes(|sheet| {
            let date_fmt = rust_xlsxwriter::Format::new().set_num_format("yyyy-mm-dd");
            let stamp_fmt = rust_xlsxwriter::Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");
            let day = rust_xlsxwriter::ExcelDateTime::from_ymd(2024, 1, 15).unwrap();
            let stamp = rust_xlsxwriter::ExcelDateTime::from_ymd(2024, 1, 16)
                .unwrap()
                .and_hms(9, 30, 0)
                .unwrap();
            sheet.write_string(0, 0, "day").unwrap();
            sheet.write_datetime_with_format(1, 0, &day, &date_fmt).unwrap();
            sheet.write_datetime_with_format(2, 0, &stamp, &stamp_fmt).unwrap();
        });
        let t = load_bytes(&bytes, FileFormat::Excel).unwrap();
        let day = t.column("day").unwrap();
        assert_eq!(day.kind, ColumnKind::Categorical);
        assert_eq!(
            day.values,
            vec![
                CellValue::Text("2024-01-15".into()),
                CellValue::Text("2024-01-16 09:30:00".into()),
            ]
        );
    }

    #[test]
    fn excel_text_cells_keep_their_type() {
        let bytes = workbook_bytes(|sheet| {
            sheet.write_string(0, 0, "code").unwrap();
            sheet.write_string(1, 0, "NA").unwrap();
            sheet.write_string(2, 0, "1").unwrap();
            sheet.write_string(0, 1, "n").unwrap();
            sheet.write_number(1, 1, 2.0).unwrap();
            sheet.write_string(2, 1, "").unwrap();
        });
        let t = load_bytes(&bytes, FileFormat::Excel).unwrap();
        let code = t.column("code").unwrap();
        assert_eq!(code.kind, ColumnKind::Categorical);
        assert_eq!(
            code.values,
            vec![CellValue::Text("NA".into()), CellValue::Text("1".into())]
        );
        let n = t.column("n").unwrap();
        assert_eq!(n.kind, ColumnKind::Numeric);
        assert_eq!(n.values[1], CellValue::Null);
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(FileFormat::from_extension("XLSX"), Some(FileFormat::Excel));
        assert_eq!(FileFormat::from_extension("pq"), Some(FileFormat::Parquet));
        assert_eq!(FileFormat::from_extension("txt"), None);
    }
}
