/// Chart collaborators: sections, the builder seam and dataset naming.
///
/// ```text
///   candidates (select)            registry
///          │                          │
///          ▼                          ▼
///   ┌──────────────┐  names   ┌──────────────────┐
///   │ ChartBuilder │◄─────────│ DataframeRegistry│
///   └──────────────┘          └──────────────────┘
///          │
///          ▼
///     ChartSection  (family + charts, `to_json()`)
/// ```

pub mod axis;
pub mod builder;
pub mod registry;

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Value as JsonValue, json};

use crate::data::Dataset;
use crate::select::TimeSeriesCandidate;

pub use builder::SpecChartBuilder;
pub use registry::{DataframeRegistry, FixedDataframeRegistry, Namespace, VarnameRegistry};

// ---------------------------------------------------------------------------
// Chart families and sections
// ---------------------------------------------------------------------------

/// A fixed chart archetype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartFamily {
    Histogram,
    CategoricalHistogram,
    Scatter,
    TimeSeries,
    ValuePlot,
    Heatmap,
    FacetedDistribution,
}

impl ChartFamily {
    /// Display order of the sections.
    pub const ALL: [ChartFamily; 7] = [
        ChartFamily::Histogram,
        ChartFamily::CategoricalHistogram,
        ChartFamily::Scatter,
        ChartFamily::TimeSeries,
        ChartFamily::ValuePlot,
        ChartFamily::Heatmap,
        ChartFamily::FacetedDistribution,
    ];

    /// Section heading shown to users.
    pub fn title(self) -> &'static str {
        match self {
            ChartFamily::Histogram => "Distributions",
            ChartFamily::CategoricalHistogram => "Categorical distributions",
            ChartFamily::Scatter => "2-d distributions",
            ChartFamily::TimeSeries => "Time series",
            ChartFamily::ValuePlot => "Values",
            ChartFamily::Heatmap => "2-d categorical distributions",
            ChartFamily::FacetedDistribution => "Faceted distributions",
        }
    }
}

/// One constructed chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub title: String,
    pub spec: JsonValue,
}

/// The charts of one family, in candidate order.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSection {
    pub family: ChartFamily,
    pub charts: Vec<Chart>,
}

impl ChartSection {
    pub fn new(family: ChartFamily) -> Self {
        Self {
            family,
            charts: Vec::new(),
        }
    }

    pub fn push(&mut self, chart: Chart) {
        self.charts.push(chart);
    }

    pub fn len(&self) -> usize {
        self.charts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }

    pub fn to_json(&self) -> JsonValue {
        json!({
            "family": self.family,
            "title": self.family.title(),
            "charts": self.charts,
        })
    }
}

// ---------------------------------------------------------------------------
// ChartBuilder – the rendering seam
// ---------------------------------------------------------------------------

/// A lazily produced, bounded sequence of candidates.
pub type Candidates<'a, T> = Box<dyn Iterator<Item = T> + 'a>;

/// Builds concrete charts for each family from selected column tuples.
///
/// Implementations label charts through `registry`, which may register the
/// dataset under a fresh name the first time it is seen.
pub trait ChartBuilder {
    fn histograms_section<'a>(
        &self,
        df: &Arc<Dataset>,
        cols: Candidates<'a, &'a str>,
        registry: &mut dyn DataframeRegistry,
    ) -> ChartSection;

    fn categorical_histograms_section<'a>(
        &self,
        df: &Arc<Dataset>,
        cols: Candidates<'a, &'a str>,
        registry: &mut dyn DataframeRegistry,
    ) -> ChartSection;

    fn scatter_section<'a>(
        &self,
        df: &Arc<Dataset>,
        pairs: Candidates<'a, (&'a str, &'a str)>,
        registry: &mut dyn DataframeRegistry,
    ) -> ChartSection;

    fn time_series_line_plots_section<'a>(
        &self,
        df: &Arc<Dataset>,
        candidates: Candidates<'a, TimeSeriesCandidate<'a>>,
        registry: &mut dyn DataframeRegistry,
    ) -> ChartSection;

    fn value_plots_section<'a>(
        &self,
        df: &Arc<Dataset>,
        cols: Candidates<'a, &'a str>,
        registry: &mut dyn DataframeRegistry,
    ) -> ChartSection;

    fn heatmaps_section<'a>(
        &self,
        df: &Arc<Dataset>,
        pairs: Candidates<'a, (&'a str, &'a str)>,
        registry: &mut dyn DataframeRegistry,
    ) -> ChartSection;

    fn faceted_distributions_section<'a>(
        &self,
        df: &Arc<Dataset>,
        pairs: Candidates<'a, (&'a str, &'a str)>,
        registry: &mut dyn DataframeRegistry,
    ) -> ChartSection;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_json_carries_family_and_title() {
        let mut section = ChartSection::new(ChartFamily::TimeSeries);
        section.push(Chart {
            title: "df: sales".into(),
            spec: json!({"mark": "line"}),
        });
        let value = section.to_json();
        assert_eq!(value["family"], "time_series");
        assert_eq!(value["title"], "Time series");
        assert_eq!(value["charts"][0]["title"], "df: sales");
        assert_eq!(value["charts"][0]["spec"]["mark"], "line");
    }
}
