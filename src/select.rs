//! Candidate selection: bounded, ordered column tuples per chart family.
//!
//! Every selector borrows its inputs, never sorts or scores, and returns a
//! lazy iterator that can be cloned to restart it. `k = None` means no cap.

use std::fmt;

/// The aggregate offered as a time-series value next to the numeric columns.
pub const COUNT_AGGREGATE: &str = "count()";

fn cap(k: Option<usize>) -> usize {
    k.unwrap_or(usize::MAX)
}

/// The first `k` column names.
pub fn first_k<'a>(
    colnames: &'a [String],
    k: Option<usize>,
) -> impl Iterator<Item = &'a str> + Clone + 'a {
    colnames.iter().map(String::as_str).take(cap(k))
}

/// The first `k` sequential pairs: `[a, b, c]` gives `(a, b), (b, c)`.
pub fn select_first_k_pairs<'a>(
    colnames: &'a [String],
    k: Option<usize>,
) -> impl Iterator<Item = (&'a str, &'a str)> + Clone + 'a {
    colnames
        .windows(2)
        .map(|pair| (pair[0].as_str(), pair[1].as_str()))
        .take(cap(k))
}

/// The first `k` `(numeric, categorical)` pairs of the cross product,
/// numeric columns outermost.
pub fn select_faceted_numeric_cols<'a>(
    numeric_cols: &'a [String],
    categorical_cols: &'a [String],
    k: Option<usize>,
) -> impl Iterator<Item = (&'a str, &'a str)> + Clone + 'a {
    numeric_cols
        .iter()
        .flat_map(move |n| categorical_cols.iter().map(move |c| (n.as_str(), c.as_str())))
        .take(cap(k))
}

// ---------------------------------------------------------------------------
// Time series
// ---------------------------------------------------------------------------

/// What a time-series chart plots on its value axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueField<'a> {
    Column(&'a str),
    /// Row count per time step.
    Count,
}

impl ValueField<'_> {
    pub fn as_str(&self) -> &str {
        match self {
            ValueField::Column(name) => name,
            ValueField::Count => COUNT_AGGREGATE,
        }
    }
}

impl fmt::Display for ValueField<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `(time, value, series)` combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeSeriesCandidate<'a> {
    pub time: &'a str,
    pub value: ValueField<'a>,
    /// Categorical column splitting the line into series, if any exist.
    pub series: Option<&'a str>,
}

/// Lazy cross product `time × value × series`, truncated to a cap.
#[derive(Debug, Clone)]
pub struct TimeSeriesCandidates<'a> {
    time_cols: &'a [String],
    values: Vec<ValueField<'a>>,
    series: Vec<Option<&'a str>>,
    position: usize,
    remaining: usize,
}

impl<'a> Iterator for TimeSeriesCandidates<'a> {
    type Item = TimeSeriesCandidate<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let total = self.time_cols.len() * self.values.len() * self.series.len();
        if self.remaining == 0 || self.position >= total {
            return None;
        }
        let per_time = self.values.len() * self.series.len();
        let time = &self.time_cols[self.position / per_time];
        let rest = self.position % per_time;
        let candidate = TimeSeriesCandidate {
            time: time.as_str(),
            value: self.values[rest / self.series.len()],
            series: self.series[rest % self.series.len()],
        };
        self.position += 1;
        self.remaining -= 1;
        Some(candidate)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let total = self.time_cols.len() * self.values.len() * self.series.len();
        let left = total.saturating_sub(self.position).min(self.remaining);
        (left, Some(left))
    }
}

/// Combinations of columns that can be plotted as time series, in priority
/// order.
///
/// Numeric columns that are themselves time columns are dropped so a time
/// axis is never plotted against itself; `count()` always follows the numeric
/// columns. Without categorical columns the series slot is `None`.
pub fn select_time_series_cols<'a>(
    time_cols: &'a [String],
    numeric_cols: &'a [String],
    categorical_cols: &'a [String],
    k: Option<usize>,
) -> TimeSeriesCandidates<'a> {
    let values = numeric_cols
        .iter()
        .filter(|c| !time_cols.contains(c))
        .map(|c| ValueField::Column(c.as_str()))
        .chain(std::iter::once(ValueField::Count))
        .collect();
    let series = if categorical_cols.is_empty() {
        vec![None]
    } else {
        categorical_cols.iter().map(|c| Some(c.as_str())).collect()
    };
    TimeSeriesCandidates {
        time_cols,
        values,
        series,
        position: 0,
        remaining: cap(k),
    }
}
