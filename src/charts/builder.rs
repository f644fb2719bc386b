use std::sync::Arc;

use log::debug;
use serde_json::{Map, Value as JsonValue, json};

use super::axis::{PADDING_PERCENT, ZERO_RTOL, axis_bounds};
use super::{
    Candidates, Chart, ChartBuilder, ChartFamily, ChartSection, DataframeRegistry,
};
use crate::color::ColorMap;
use crate::data::{Column, Dataset, DtypeKind};
use crate::select::{TimeSeriesCandidate, ValueField};

pub const VEGA_LITE_SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v5.json";

// ---------------------------------------------------------------------------
// SpecChartBuilder – Vega-Lite flavoured JSON specs
// ---------------------------------------------------------------------------

/// Builds one Vega-Lite style JSON spec per candidate.
///
/// Specs reference the dataset by its registry name (`"data": {"name": ..}`)
/// instead of inlining rows; the renderer binds the data.
#[derive(Debug, Clone)]
pub struct SpecChartBuilder {
    pub width: u32,
    pub height: u32,
    pub max_bins: u32,
}

impl Default for SpecChartBuilder {
    fn default() -> Self {
        Self {
            width: 300,
            height: 200,
            max_bins: 20,
        }
    }
}

impl SpecChartBuilder {
    fn spec(&self, df_name: &str, title: &str, mark: JsonValue, encoding: JsonValue) -> JsonValue {
        json!({
            "$schema": VEGA_LITE_SCHEMA,
            "title": title,
            "data": { "name": df_name },
            "width": self.width,
            "height": self.height,
            "mark": mark,
            "encoding": encoding,
        })
    }

    /// Section skeleton plus the dataset label, shared by every family.
    fn start(
        family: ChartFamily,
        df: &Arc<Dataset>,
        registry: &mut dyn DataframeRegistry,
    ) -> (ChartSection, String) {
        (ChartSection::new(family), registry.get_or_register_varname(df))
    }
}

/// Look up every named column, logging the first one that is missing.
fn columns<'d, const N: usize>(df: &'d Dataset, names: [&str; N]) -> Option<[&'d Column; N]> {
    let mut found = Vec::with_capacity(N);
    for name in names {
        match df.column(name) {
            Some(col) => found.push(col),
            None => {
                debug!("skipping chart: no column '{name}'");
                return None;
            }
        }
    }
    found.try_into().ok()
}

fn quantitative_scale(col: &Column) -> JsonValue {
    match axis_bounds(&col.finite_f64(), PADDING_PERCENT, ZERO_RTOL) {
        Some((lo, hi)) => json!({ "domain": [lo, hi], "zero": false }),
        None => json!({ "zero": false }),
    }
}

/// Nominal colour encoding with one palette entry per distinct value.
fn color_encoding(col: &Column) -> JsonValue {
    let map = ColorMap::new(&col.name, &col.unique_values());
    let (domain, range): (Vec<String>, Vec<String>) = map.legend_entries().into_iter().unzip();
    json!({
        "field": map.column,
        "type": "nominal",
        "scale": { "domain": domain, "range": range },
    })
}

/// Encoding type for a column used as a time axis.
fn time_type(col: &Column) -> &'static str {
    match col.dtype.kind() {
        DtypeKind::Datetime => "temporal",
        _ if col.dtype.is_numeric() || col.dtype.is_number() => "quantitative",
        _ => "ordinal",
    }
}

impl ChartBuilder for SpecChartBuilder {
    fn histograms_section<'a>(
        &self,
        df: &Arc<Dataset>,
        cols: Candidates<'a, &'a str>,
        registry: &mut dyn DataframeRegistry,
    ) -> ChartSection {
        let (mut section, df_name) = Self::start(ChartFamily::Histogram, df, registry);
        for name in cols {
            let Some([col]) = columns(df, [name]) else { continue };
            let title = format!("{df_name}: {}", col.name);
            let encoding = json!({
                "x": { "field": col.name, "type": "quantitative", "bin": { "maxbins": self.max_bins } },
                "y": { "aggregate": "count", "type": "quantitative" },
            });
            let spec = self.spec(&df_name, &title, json!("bar"), encoding);
            section.push(Chart { title, spec });
        }
        section
    }

    fn categorical_histograms_section<'a>(
        &self,
        df: &Arc<Dataset>,
        cols: Candidates<'a, &'a str>,
        registry: &mut dyn DataframeRegistry,
    ) -> ChartSection {
        let (mut section, df_name) = Self::start(ChartFamily::CategoricalHistogram, df, registry);
        for name in cols {
            let Some([col]) = columns(df, [name]) else { continue };
            let title = format!("{df_name}: {}", col.name);
            let mut color = color_encoding(col);
            color["legend"] = JsonValue::Null;
            let encoding = json!({
                "y": { "field": col.name, "type": "nominal", "sort": "-x" },
                "x": { "aggregate": "count", "type": "quantitative" },
                "color": color,
            });
            let spec = self.spec(&df_name, &title, json!("bar"), encoding);
            section.push(Chart { title, spec });
        }
        section
    }

    fn scatter_section<'a>(
        &self,
        df: &Arc<Dataset>,
        pairs: Candidates<'a, (&'a str, &'a str)>,
        registry: &mut dyn DataframeRegistry,
    ) -> ChartSection {
        let (mut section, df_name) = Self::start(ChartFamily::Scatter, df, registry);
        for (x, y) in pairs {
            let Some([x, y]) = columns(df, [x, y]) else { continue };
            let title = format!("{df_name}: {} vs {}", x.name, y.name);
            let encoding = json!({
                "x": { "field": x.name, "type": "quantitative", "scale": quantitative_scale(x) },
                "y": { "field": y.name, "type": "quantitative", "scale": quantitative_scale(y) },
            });
            let spec = self.spec(&df_name, &title, json!({ "type": "point", "filled": true }), encoding);
            section.push(Chart { title, spec });
        }
        section
    }

    fn time_series_line_plots_section<'a>(
        &self,
        df: &Arc<Dataset>,
        candidates: Candidates<'a, TimeSeriesCandidate<'a>>,
        registry: &mut dyn DataframeRegistry,
    ) -> ChartSection {
        let (mut section, df_name) = Self::start(ChartFamily::TimeSeries, df, registry);
        for candidate in candidates {
            let Some([time]) = columns(df, [candidate.time]) else { continue };
            let mut encoding = Map::new();
            encoding.insert(
                "x".into(),
                json!({ "field": time.name, "type": time_type(time), "sort": "ascending" }),
            );
            let y = match candidate.value {
                ValueField::Column(name) => {
                    let Some([value]) = columns(df, [name]) else { continue };
                    json!({ "field": value.name, "type": "quantitative" })
                }
                ValueField::Count => json!({ "aggregate": "count", "type": "quantitative" }),
            };
            encoding.insert("y".into(), y);

            let mut title = format!("{df_name}: {} over {}", candidate.value, time.name);
            if let Some(series) = candidate.series {
                let Some([series]) = columns(df, [series]) else { continue };
                encoding.insert("color".into(), color_encoding(series));
                title.push_str(&format!(" by {}", series.name));
            }
            let spec = self.spec(&df_name, &title, json!("line"), JsonValue::Object(encoding));
            section.push(Chart { title, spec });
        }
        section
    }

    fn value_plots_section<'a>(
        &self,
        df: &Arc<Dataset>,
        cols: Candidates<'a, &'a str>,
        registry: &mut dyn DataframeRegistry,
    ) -> ChartSection {
        let (mut section, df_name) = Self::start(ChartFamily::ValuePlot, df, registry);
        for name in cols {
            let Some([col]) = columns(df, [name]) else { continue };
            let title = format!("{df_name}: {}", col.name);
            let encoding = json!({
                "x": { "field": "index", "type": "quantitative" },
                "y": { "field": col.name, "type": "quantitative", "scale": quantitative_scale(col) },
            });
            let mut spec = self.spec(&df_name, &title, json!("line"), encoding);
            spec["transform"] = json!([{ "window": [{ "op": "row_number", "as": "index" }] }]);
            section.push(Chart { title, spec });
        }
        section
    }

    fn heatmaps_section<'a>(
        &self,
        df: &Arc<Dataset>,
        pairs: Candidates<'a, (&'a str, &'a str)>,
        registry: &mut dyn DataframeRegistry,
    ) -> ChartSection {
        let (mut section, df_name) = Self::start(ChartFamily::Heatmap, df, registry);
        for (x, y) in pairs {
            let Some([x, y]) = columns(df, [x, y]) else { continue };
            let title = format!("{df_name}: {} vs {}", x.name, y.name);
            let encoding = json!({
                "x": { "field": x.name, "type": "nominal" },
                "y": { "field": y.name, "type": "nominal" },
                "color": { "aggregate": "count", "type": "quantitative" },
            });
            let spec = self.spec(&df_name, &title, json!("rect"), encoding);
            section.push(Chart { title, spec });
        }
        section
    }

    fn faceted_distributions_section<'a>(
        &self,
        df: &Arc<Dataset>,
        pairs: Candidates<'a, (&'a str, &'a str)>,
        registry: &mut dyn DataframeRegistry,
    ) -> ChartSection {
        let (mut section, df_name) = Self::start(ChartFamily::FacetedDistribution, df, registry);
        for (value, facet) in pairs {
            let Some([value, facet]) = columns(df, [value, facet]) else { continue };
            let title = format!("{df_name}: {} by {}", value.name, facet.name);
            let encoding = json!({
                "x": { "field": "value", "type": "quantitative", "title": value.name },
                "y": { "field": "density", "type": "quantitative" },
                "color": color_encoding(facet),
            });
            let mark = json!({ "type": "area", "opacity": 0.5 });
            let mut spec = self.spec(&df_name, &title, mark, encoding);
            spec["transform"] = json!([{ "density": value.name, "groupby": [facet.name] }]);
            section.push(Chart { title, spec });
        }
        section
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::FixedDataframeRegistry;
    use crate::data::{Dtype, Value};

    fn dataset() -> Arc<Dataset> {
        let columns = vec![
            Column::new(
                "when",
                Dtype::datetime_ns(),
                vec![Value::Timestamp(1), Value::Timestamp(2), Value::Timestamp(3)],
            ),
            Column::new(
                "price",
                Dtype::Float64,
                vec![Value::Float(10.0), Value::Float(20.0), Value::Float(30.0)],
            ),
            Column::new(
                "store",
                Dtype::Object,
                vec![
                    Value::String("a".into()),
                    Value::String("b".into()),
                    Value::String("a".into()),
                ],
            ),
        ];
        Arc::new(Dataset::try_new(columns).expect("valid dataset"))
    }

    #[test]
    fn histogram_titles_use_the_registry_name() {
        let df = dataset();
        let mut registry = FixedDataframeRegistry::new("sales");
        let section = SpecChartBuilder::default().histograms_section(
            &df,
            Box::new(["price"].into_iter()),
            &mut registry,
        );
        assert_eq!(section.family, ChartFamily::Histogram);
        assert_eq!(section.charts[0].title, "sales: price");
        assert_eq!(section.charts[0].spec["data"]["name"], "sales");
        assert_eq!(section.charts[0].spec["encoding"]["x"]["bin"]["maxbins"], 20);
    }

    #[test]
    fn missing_columns_are_skipped() {
        let df = dataset();
        let mut registry = FixedDataframeRegistry::new("df");
        let section = SpecChartBuilder::default().scatter_section(
            &df,
            Box::new([("price", "gone"), ("price", "price")].into_iter()),
            &mut registry,
        );
        assert_eq!(section.len(), 1);
    }

    #[test]
    fn time_series_colours_by_series_and_counts() {
        let df = dataset();
        let mut registry = FixedDataframeRegistry::new("df");
        let candidates = vec![
            TimeSeriesCandidate { time: "when", value: ValueField::Column("price"), series: None },
            TimeSeriesCandidate { time: "when", value: ValueField::Count, series: Some("store") },
        ];
        let section = SpecChartBuilder::default().time_series_line_plots_section(
            &df,
            Box::new(candidates.into_iter()),
            &mut registry,
        );
        assert_eq!(section.len(), 2);
        assert_eq!(section.charts[0].title, "df: price over when");
        assert_eq!(section.charts[0].spec["encoding"]["x"]["type"], "temporal");
        assert!(section.charts[0].spec["encoding"].get("color").is_none());
        assert_eq!(section.charts[1].title, "df: count() over when by store");
        assert_eq!(section.charts[1].spec["encoding"]["y"]["aggregate"], "count");
        let domain = &section.charts[1].spec["encoding"]["color"]["scale"]["domain"];
        assert_eq!(domain, &json!(["a", "b"]));
    }

    #[test]
    fn scatter_domains_are_padded() {
        let df = dataset();
        let mut registry = FixedDataframeRegistry::new("df");
        let section = SpecChartBuilder::default().scatter_section(
            &df,
            Box::new([("price", "price")].into_iter()),
            &mut registry,
        );
        let domain = &section.charts[0].spec["encoding"]["x"]["scale"]["domain"];
        let lo = domain[0].as_f64().expect("lower bound");
        let hi = domain[1].as_f64().expect("upper bound");
        assert!((lo - 9.0).abs() < 1e-9);
        assert!((hi - 31.0).abs() < 1e-9);
    }
}
