//! Automatic chart suggestions for tabular datasets.
//!
//! ```text
//!  Dataset ──► classify ──► DtypeGroups ──► select ──► candidates
//!                                                          │
//!              Vec<ChartSection> ◄── ChartBuilder ◄── orchestrator
//! ```
//!
//! [`classify::classify`] assigns every column a primary dtype group and tags
//! time-axis candidates, the [`select`] functions turn those groups into
//! bounded column tuples per chart family, and [`orchestrator`] drives both and
//! hands the tuples to an injected [`charts::ChartBuilder`].

pub mod charts;
pub mod classify;
pub mod color;
pub mod data;
pub mod error;
pub mod orchestrator;
pub mod select;

pub use charts::{
    Chart, ChartBuilder, ChartFamily, ChartSection, DataframeRegistry, FixedDataframeRegistry,
    Namespace, SpecChartBuilder, VarnameRegistry,
};
pub use classify::{ClassifierConfig, DtypeGroups, PrimaryGroup, classify};
pub use data::{Column, Dataset, Dtype, DtypeKind, Value};
pub use error::QuickchartError;
pub use orchestrator::{NO_CHARTS_NOTICE, QuickChart, determine_charts, find_charts_json};
