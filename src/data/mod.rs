/// Data layer: core types, loading, province tagging, filtering.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet        worldcities.csv
///        │                              │
///        ▼                              ▼
///   ┌──────────┐                 ┌────────────┐
///   │  loader   │                 │  province   │  k-d tree over cities
///   └──────────┘                 └────────────┘
///        │   Vec<EarthquakeRecord>      │
///        └──────────────┬───────────────┘
///                       ▼  classify_all (once)
///              ┌──────────────────┐
///              │ EarthquakeCatalog │  records, provinces, bounds, years
///              └──────────────────┘
///                       │
///                       ▼
///                 ┌──────────┐
///                 │  filter   │  resolve criteria → FilteredView
///                 └──────────┘
///                       │
///             ┌─────────┴─────────┐
///             ▼                   ▼
///        ┌─────────┐         ┌─────────┐
///        │  stats   │         │ export  │
///        └─────────┘         └─────────┘
/// ```

pub mod export;
pub mod filter;
pub mod geo;
pub mod loader;
pub mod model;
pub mod province;
pub mod spatial;
pub mod stats;
