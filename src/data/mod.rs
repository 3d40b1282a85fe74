/// Data layer: raw cells, validated records, loading, and scoping.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader  │  parse file → RawSource (Vec<RawRow>, fingerprint)
///   └──────────┘
///        │
///        ▼  analysis::normalize
///   ┌─────────────────┐
///   │ ExpeditionBatch │  Vec<ExpeditionRecord>, peak / year indices
///   └─────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter  │  year range / peak → record indices
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
