//! Chart orchestration: classify once, select candidates per family, hand
//! them to the chart builder and keep the non-empty sections in display order.

use std::sync::Arc;

use log::{debug, info};
use serde_json::Value as JsonValue;

use crate::charts::{
    ChartBuilder, ChartFamily, ChartSection, DataframeRegistry, FixedDataframeRegistry, Namespace,
    VarnameRegistry,
};
use crate::classify::{ClassifierConfig, classify};
use crate::data::Dataset;
use crate::error::QuickchartError;
use crate::select::{
    first_k, select_faceted_numeric_cols, select_first_k_pairs, select_time_series_cols,
};

/// Informational notice emitted when a dataset yields no charts.
pub const NO_CHARTS_NOTICE: &str = "No charts were generated by quickchart";

/// Find charts compatible with the dtypes of `df`.
///
/// Families are evaluated in a fixed order (histogram, categorical histogram,
/// scatter, time series, value plot, heatmap, faceted distribution) and a
/// family without enough columns is skipped silently. At most
/// `max_chart_instances` candidates are generated per family.
pub fn determine_charts(
    df: &Arc<Dataset>,
    builder: &dyn ChartBuilder,
    registry: &mut dyn DataframeRegistry,
    config: &ClassifierConfig,
    max_chart_instances: Option<usize>,
) -> Vec<ChartSection> {
    let groups = classify(df, config);
    let numeric = groups.numeric.as_slice();
    let categorical = groups.categorical.as_slice();
    let time_cols = groups.time_columns();
    let k = max_chart_instances;

    let mut sections = Vec::new();
    let mut keep = |section: ChartSection| {
        if section.is_empty() {
            debug!("dropping empty {:?} section", section.family);
        } else {
            sections.push(section);
        }
    };

    if !numeric.is_empty() {
        keep(builder.histograms_section(df, Box::new(first_k(numeric, k)), registry));
    }

    if !categorical.is_empty() {
        keep(builder.categorical_histograms_section(df, Box::new(first_k(categorical, k)), registry));
    }

    if numeric.len() >= 2 {
        keep(builder.scatter_section(df, Box::new(select_first_k_pairs(numeric, k)), registry));
    }

    if !time_cols.is_empty() {
        let candidates = select_time_series_cols(&time_cols, numeric, categorical, k);
        keep(builder.time_series_line_plots_section(df, Box::new(candidates), registry));
    }

    if !numeric.is_empty() {
        keep(builder.value_plots_section(df, Box::new(first_k(numeric, k)), registry));
    }

    if categorical.len() >= 2 {
        keep(builder.heatmaps_section(df, Box::new(select_first_k_pairs(categorical, k)), registry));
    }

    if !categorical.is_empty() && !numeric.is_empty() {
        let pairs = select_faceted_numeric_cols(numeric, categorical, k);
        keep(builder.faceted_distributions_section(df, Box::new(pairs), registry));
    }

    debug!(
        "generated sections: {:?}",
        sections.iter().map(|s| s.family).collect::<Vec<ChartFamily>>()
    );
    sections
}

// ---------------------------------------------------------------------------
// QuickChart – caller-facing entry point
// ---------------------------------------------------------------------------

/// Caller-facing wrapper owning the chart builder and a dataframe registry.
///
/// The registry is created on first use and reused for every later call.
pub struct QuickChart<B> {
    builder: B,
    config: ClassifierConfig,
    registry: Option<VarnameRegistry>,
    notices: Vec<String>,
}

impl<B: ChartBuilder> QuickChart<B> {
    pub fn new(builder: B) -> Self {
        Self {
            builder,
            config: ClassifierConfig::default(),
            registry: None,
            notices: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: ClassifierConfig) -> Self {
        self.config = config;
        self
    }

    /// Use `registry` instead of creating an empty one on first use.
    pub fn with_registry(mut self, registry: VarnameRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// The registry, if any call has needed it yet.
    pub fn registry(&self) -> Option<&VarnameRegistry> {
        self.registry.as_ref()
    }

    /// Notices emitted so far, oldest first.
    pub fn notices(&self) -> &[String] {
        &self.notices
    }

    /// Find charts for `df`; an empty result is reported as a notice, not an error.
    pub fn find_charts(
        &mut self,
        df: &Arc<Dataset>,
        max_chart_instances: Option<usize>,
    ) -> Vec<ChartSection> {
        let registry = self.registry.get_or_insert_with(|| {
            debug!("creating dataframe registry");
            VarnameRegistry::default()
        });
        let sections = determine_charts(df, &self.builder, registry, &self.config, max_chart_instances);
        if sections.is_empty() {
            info!("{NO_CHARTS_NOTICE}");
            self.notices.push(NO_CHARTS_NOTICE.to_string());
        }
        sections
    }
}

/// Like [`QuickChart::find_charts`], for a dataset looked up by name, with the
/// sections rendered as a JSON array.
///
/// Charts are labelled with `df_name` itself. A name missing from `namespace`
/// is returned as [`QuickchartError::NameNotFound`].
pub fn find_charts_json(
    df_name: &str,
    namespace: &dyn Namespace,
    builder: &dyn ChartBuilder,
    config: &ClassifierConfig,
    max_chart_instances: Option<usize>,
) -> Result<JsonValue, QuickchartError> {
    let df = namespace
        .get(df_name)
        .ok_or_else(|| QuickchartError::NameNotFound(df_name.to_string()))?;
    let mut registry = FixedDataframeRegistry::new(df_name);
    let sections = determine_charts(&df, builder, &mut registry, config, max_chart_instances);
    Ok(JsonValue::Array(sections.iter().map(ChartSection::to_json).collect()))
}
