/// Data layer: table model, loading, filtering, statistics and export.
///
/// Architecture:
/// ```text
///  .csv / .xlsx / .parquet / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse bytes as the declared format → Table
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐        ┌──────────┐
///   │  Table    │ ─────▶ │  stats    │  describe()
///   └──────────┘        └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  one column, one predicate → filtered Table
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  export   │  filtered Table → CSV / XLSX bytes
///   └──────────┘
/// ```

pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
pub mod stats;
