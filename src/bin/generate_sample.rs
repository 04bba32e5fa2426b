//! Writes `sample_data.csv` and `sample_data.parquet`: a small sales table
//! with categorical and numeric columns for trying out the dashboard.

use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Deterministic splitmix64 generator.
struct SplitMix(u64);

impl SplitMix {
    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in `[0, 1)`.
    fn unit(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn range(&mut self, lo: i64, hi: i64) -> i64 {
        lo + (self.unit() * (hi - lo + 1) as f64) as i64
    }
}

struct Sale {
    region: &'static str,
    product: &'static str,
    month: String,
    units: i64,
    unit_price: f64,
    revenue: f64,
}

fn generate(rng: &mut SplitMix) -> Vec<Sale> {
    let regions = ["North", "South", "East", "West"];
    let products = [("Widget", 4.5), ("Gadget", 12.0), ("Gizmo", 27.5)];

    let mut sales = Vec::new();
    for month in 1..=12 {
        for region in regions {
            for (product, base_price) in products {
                let units = rng.range(5, 120);
                // ±10 % price jitter, rounded to cents.
                let unit_price = (base_price * (0.9 + 0.2 * rng.unit()) * 100.0).round() / 100.0;
                sales.push(Sale {
                    region,
                    product,
                    month: format!("2024-{month:02}"),
                    units,
                    unit_price,
                    revenue: (units as f64 * unit_price * 100.0).round() / 100.0,
                });
            }
        }
    }
    sales
}

fn write_csv(sales: &[Sale], path: &str) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    writer.write_record(["region", "product", "month", "units", "unit_price", "revenue"])?;
    for s in sales {
        writer.write_record([
            s.region.to_string(),
            s.product.to_string(),
            s.month.clone(),
            s.units.to_string(),
            format!("{:?}", s.unit_price),
            format!("{:?}", s.revenue),
        ])?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

fn write_parquet(sales: &[Sale], path: &str) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("region", DataType::Utf8, false),
        Field::new("product", DataType::Utf8, false),
        Field::new("month", DataType::Utf8, false),
        Field::new("units", DataType::Int64, false),
        Field::new("unit_price", DataType::Float64, false),
        Field::new("revenue", DataType::Float64, false),
    ]));

    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(sales.iter().map(|s| s.region))),
        Arc::new(StringArray::from_iter_values(sales.iter().map(|s| s.product))),
        Arc::new(StringArray::from_iter_values(sales.iter().map(|s| s.month.as_str()))),
        Arc::new(Int64Array::from_iter_values(sales.iter().map(|s| s.units))),
        Arc::new(Float64Array::from_iter_values(sales.iter().map(|s| s.unit_price))),
        Arc::new(Float64Array::from_iter_values(sales.iter().map(|s| s.revenue))),
    ];
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SplitMix(42);
    let sales = generate(&mut rng);

    write_csv(&sales, "sample_data.csv")?;
    write_parquet(&sales, "sample_data.parquet")?;

    println!(
        "Wrote {} rows to sample_data.csv and sample_data.parquet",
        sales.len()
    );
    Ok(())
}
