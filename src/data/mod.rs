/// Data layer: core types and loading.
///
/// Architecture:
/// ```text
///  .parquet / .json / .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset (dtype inference per column)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ Dataset   │  Vec<Column>, each with a Dtype and Vec<Value>
///   └──────────┘
/// ```

pub mod loader;
pub mod model;

pub use model::{Column, Dataset, Dtype, DtypeKind, TimeUnit, Value};
