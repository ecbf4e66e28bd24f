/// Data layer: core types, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///  day_cleaned.csv   hour_cleaned.csv   (.csv / .json / .parquet)
///        │                 │
///        ▼                 ▼
///   ┌──────────────────────────┐
///   │  loader                  │  parse files → BikeShareData (cached)
///   └──────────────────────────┘
///        │
///        ▼
///   ┌──────────────────────────┐
///   │  filter                  │  date range + years → FilteredView × 2
///   └──────────────────────────┘
///        │
///        ▼
///   ┌──────────────────────────┐
///   │  aggregate               │  yearly / seasonal / day-type / hourly
///   └──────────────────────────┘
///        │
///        ▼
///   pipeline::Report  (or a Halt for the UI to show)
/// ```

pub mod aggregate;
pub mod filter;
pub mod loader;
pub mod model;
pub mod pipeline;
