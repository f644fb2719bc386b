//! Column classification.
//!
//! Every column lands in exactly one primary group (numeric, small or large
//! categorical, datetime, singleton, filtered). Timelike is a separate tag
//! evaluated for every column on its own, and may overlap any primary group.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::data::{Column, Dataset, Dtype, DtypeKind};

/// Name prefixes/suffixes that mark a column as a time axis.
pub const DATETIME_COLNAME_PATTERNS: [&str; 4] = ["date", "datetime", "time", "timestamp"];

/// Exact column names that mark a column as a time axis.
pub const DATETIME_COLNAMES: [&str; 4] = ["dt", "t", "ts", "year"];

/// Facet-friendly size limit.
pub const CATEGORICAL_LARGE_SIZE_THRESHOLD: usize = 8;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Dtype sets and thresholds driving classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub categorical_dtypes: Vec<Dtype>,
    pub datetime_dtypes: Vec<Dtype>,
    pub datetime_dtype_kinds: Vec<DtypeKind>,
    /// Max distinct values for a categorical to count as "small".
    pub categorical_size_threshold: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            categorical_dtypes: vec![Dtype::Object, Dtype::Bool],
            datetime_dtypes: vec![Dtype::datetime_ns()],
            datetime_dtype_kinds: vec![DtypeKind::Datetime],
            categorical_size_threshold: CATEGORICAL_LARGE_SIZE_THRESHOLD,
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// The primary group a column was assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryGroup {
    Numeric,
    Categorical,
    LargeCategorical,
    Datetime,
    Singleton,
    Filtered,
}

/// Column names per dtype group, each list in dataset column order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DtypeGroups {
    pub numeric: Vec<String>,
    /// Small categoricals only.
    pub categorical: Vec<String>,
    pub large_categorical: Vec<String>,
    pub datetime: Vec<String>,
    pub timelike: Vec<String>,
    pub singleton: Vec<String>,
    pub filtered: Vec<String>,
}

impl DtypeGroups {
    /// Primary group holding `name`; `None` if the column is unknown.
    pub fn primary_group_of(&self, name: &str) -> Option<PrimaryGroup> {
        let groups = [
            (&self.numeric, PrimaryGroup::Numeric),
            (&self.categorical, PrimaryGroup::Categorical),
            (&self.large_categorical, PrimaryGroup::LargeCategorical),
            (&self.datetime, PrimaryGroup::Datetime),
            (&self.singleton, PrimaryGroup::Singleton),
            (&self.filtered, PrimaryGroup::Filtered),
        ];
        groups
            .into_iter()
            .find(|(cols, _)| cols.iter().any(|c| c == name))
            .map(|(_, group)| group)
    }

    /// Columns usable as a time axis: datetime columns, then timelike ones,
    /// each listed once. Unlike a plain concatenation, a datetime column that
    /// is also timelike yields its candidates a single time, so it does not
    /// use up the per-family cap twice.
    pub fn time_columns(&self) -> Vec<String> {
        let mut cols: Vec<String> = Vec::with_capacity(self.datetime.len() + self.timelike.len());
        for name in self.datetime.iter().chain(&self.timelike) {
            if !cols.contains(name) {
                cols.push(name.clone());
            }
        }
        cols
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Classify each column of `df` into a dtype group.
///
/// Rule precedence per column: unhashable values → filtered, ≤ 1 distinct
/// value → singleton, categorical dtype, datetime dtype or kind, numeric
/// dtype, otherwise filtered. Filtered columns are reported once with
/// `warn!`; classification itself never fails.
pub fn classify(df: &Dataset, config: &ClassifierConfig) -> DtypeGroups {
    let mut groups = DtypeGroups::default();
    let mut categorical: Vec<(&Column, usize)> = Vec::new();

    for col in df.columns() {
        if !col.is_hashable() {
            groups.filtered.push(col.name.clone());
            continue;
        }
        let n_unique = col.n_unique();
        if n_unique <= 1 {
            groups.singleton.push(col.name.clone());
        } else if config.categorical_dtypes.contains(&col.dtype) {
            categorical.push((col, n_unique));
        } else if config.datetime_dtypes.contains(&col.dtype)
            || config.datetime_dtype_kinds.contains(&col.dtype.kind())
        {
            groups.datetime.push(col.name.clone());
        } else if col.dtype.is_numeric() {
            groups.numeric.push(col.name.clone());
        } else {
            groups.filtered.push(col.name.clone());
        }
    }
    if !groups.filtered.is_empty() {
        warn!(
            "Quickchart encountered unexpected dtypes in columns: {:?}",
            groups.filtered
        );
    }

    for (col, n_unique) in categorical {
        if n_unique <= config.categorical_size_threshold {
            groups.categorical.push(col.name.clone());
        } else {
            groups.large_categorical.push(col.name.clone());
        }
    }

    groups.timelike = df
        .columns()
        .iter()
        .filter(|col| is_timelike(col))
        .map(|col| col.name.clone())
        .collect();

    debug!("classified {} columns: {groups:?}", df.columns().len());
    groups
}

/// Usable as a time axis: named like one or sorted numerically, and scalar.
pub fn is_timelike(col: &Column) -> bool {
    (matches_datetime_pattern(&col.name) || is_monotonically_increasing_numeric(col))
        && col.all_scalar()
}

/// Lower-cased name starts/ends with a datetime affix or equals a datetime token.
pub fn matches_datetime_pattern(name: &str) -> bool {
    let name = name.to_lowercase();
    DATETIME_COLNAME_PATTERNS
        .iter()
        .any(|p| name.starts_with(p) || name.ends_with(p))
        || DATETIME_COLNAMES.contains(&name.as_str())
}

/// Native number storage with values non-decreasing end-to-end.
pub fn is_monotonically_increasing_numeric(col: &Column) -> bool {
    col.dtype.is_native() && col.dtype.is_number() && col.is_non_decreasing()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Value;

    fn ints(name: &str, values: &[i64]) -> Column {
        Column::new(name, Dtype::Int64, values.iter().map(|&v| Value::Integer(v)).collect())
    }

    fn strs(name: &str, values: &[&str]) -> Column {
        Column::new(
            name,
            Dtype::Object,
            values.iter().map(|v| Value::String(v.to_string())).collect(),
        )
    }

    fn dataset(columns: Vec<Column>) -> Dataset {
        Dataset::try_new(columns).expect("valid dataset")
    }

    #[test]
    fn singleton_wins_over_dtype() {
        let df = dataset(vec![
            ints("a", &[4, 4, 4]),
            strs("b", &["x", "x", "x"]),
            Column::new("c", Dtype::datetime_ns(), vec![Value::Timestamp(0); 3]),
        ]);
        let groups = classify(&df, &ClassifierConfig::default());
        assert_eq!(groups.singleton, vec!["a", "b", "c"]);
        assert!(groups.numeric.is_empty());
        assert!(groups.categorical.is_empty());
        assert!(groups.datetime.is_empty());
    }

    #[test]
    fn unhashable_values_are_filtered_before_singleton() {
        let lists = Column::new("l", Dtype::Object, vec![Value::List(vec![]), Value::List(vec![])]);
        let df = dataset(vec![lists, ints("n", &[1, 2])]);
        let groups = classify(&df, &ClassifierConfig::default());
        assert_eq!(groups.filtered, vec!["l"]);
        assert!(groups.singleton.is_empty());
    }

    #[test]
    fn timedelta_columns_are_filtered_not_numeric() {
        let wait = Column::new(
            "wait",
            Dtype::Timedelta,
            vec![Value::Integer(5), Value::Integer(1), Value::Integer(3)],
        );
        let df = dataset(vec![wait, ints("n", &[3, 1, 2])]);
        let groups = classify(&df, &ClassifierConfig::default());
        assert_eq!(groups.filtered, vec!["wait"]);
        assert_eq!(groups.numeric, vec!["n"]);
    }

    #[test]
    fn sorted_timedeltas_are_still_timelike() {
        let elapsed = Column::new(
            "elapsed",
            Dtype::Timedelta,
            vec![Value::Integer(1), Value::Integer(2), Value::Integer(4)],
        );
        let groups = classify(&dataset(vec![elapsed]), &ClassifierConfig::default());
        assert_eq!(groups.filtered, vec!["elapsed"]);
        assert_eq!(groups.timelike, vec!["elapsed"]);
    }

    #[test]
    fn equal_numbers_of_mixed_types_are_one_value() {
        let code = Column::new(
            "code",
            Dtype::Object,
            vec![Value::Integer(1), Value::Float(1.0), Value::Bool(true)],
        );
        let groups = classify(&dataset(vec![code]), &ClassifierConfig::default());
        assert_eq!(groups.singleton, vec!["code"]);
        assert!(groups.categorical.is_empty());
    }

    #[test]
    fn extension_dtypes_are_filtered() {
        let cat = Column::new(
            "kind",
            Dtype::Extension("category".into()),
            vec![Value::String("a".into()), Value::String("b".into())],
        );
        let groups = classify(&dataset(vec![cat]), &ClassifierConfig::default());
        assert_eq!(groups.filtered, vec!["kind"]);
    }

    #[test]
    fn categoricals_split_on_threshold() {
        let small: Vec<String> = (0..8).map(|i| format!("s{i}")).collect();
        let large: Vec<String> = (0..9).map(|i| format!("l{i}")).collect();
        let pad = |v: &[String]| -> Vec<Value> {
            (0..9).map(|i| Value::String(v[i % v.len()].clone())).collect()
        };
        let df = dataset(vec![
            Column::new("small", Dtype::Object, pad(&small)),
            Column::new("large", Dtype::Object, pad(&large)),
            Column::new(
                "flag",
                Dtype::Bool,
                (0..9).map(|i| Value::Bool(i % 2 == 0)).collect(),
            ),
        ]);
        let groups = classify(&df, &ClassifierConfig::default());
        assert_eq!(groups.categorical, vec!["small", "flag"]);
        assert_eq!(groups.large_categorical, vec!["large"]);

        let strict = ClassifierConfig {
            categorical_size_threshold: 2,
            ..ClassifierConfig::default()
        };
        let groups = classify(&df, &strict);
        assert_eq!(groups.categorical, vec!["flag"]);
        assert_eq!(groups.large_categorical, vec!["small", "large"]);
    }

    #[test]
    fn datetime_matches_by_kind_as_well_as_exact_dtype() {
        let aware = Dtype::Datetime {
            unit: crate::data::TimeUnit::Ms,
            tz: Some("UTC".into()),
        };
        let df = dataset(vec![Column::new(
            "when",
            aware,
            vec![Value::Timestamp(1), Value::Timestamp(2)],
        )]);
        let groups = classify(&df, &ClassifierConfig::default());
        assert_eq!(groups.datetime, vec!["when"]);
    }

    #[test]
    fn categorical_dtype_set_takes_precedence_over_numeric() {
        let config = ClassifierConfig {
            categorical_dtypes: vec![Dtype::Int64],
            ..ClassifierConfig::default()
        };
        let groups = classify(&dataset(vec![ints("code", &[3, 1, 2])]), &config);
        assert_eq!(groups.categorical, vec!["code"]);
        assert!(groups.numeric.is_empty());
    }

    #[test]
    fn timelike_by_name_ignores_order() {
        for name in ["timestamp", "event_date", "ts", "Year", "DateOfBirth"] {
            assert!(is_timelike(&ints(name, &[3, 1, 2])), "{name}");
        }
        assert!(!is_timelike(&ints("value", &[3, 1, 2])));
    }

    #[test]
    fn timelike_by_monotonic_numeric_values() {
        assert!(is_timelike(&ints("x", &[1, 2, 2, 5, 9])));
        assert!(!is_timelike(&ints("x", &[3, 1, 2])));
        let floats = Column::new("y", Dtype::Float64, vec![Value::Float(0.5), Value::Float(0.75)]);
        assert!(is_timelike(&floats));
        let flags = Column::new("flag", Dtype::Bool, vec![Value::Bool(false), Value::Bool(true)]);
        assert!(!is_timelike(&flags));
        let ext = Column::new(
            "z",
            Dtype::Extension("Int64".into()),
            vec![Value::Integer(1), Value::Integer(2)],
        );
        assert!(!is_timelike(&ext));
    }

    #[test]
    fn timelike_requires_scalar_values() {
        let tuples = Column::new(
            "date",
            Dtype::Object,
            vec![
                Value::Tuple(vec![Value::Integer(1)]),
                Value::Tuple(vec![Value::Integer(2)]),
            ],
        );
        assert!(!is_timelike(&tuples));
        let texts = strs("date", &["b", "a"]);
        assert!(is_timelike(&texts));
    }

    #[test]
    fn timelike_overlaps_primary_groups() {
        let df = dataset(vec![
            ints("id", &[1, 2, 3]),
            strs("time_of_day", &["am", "pm", "am"]),
        ]);
        let groups = classify(&df, &ClassifierConfig::default());
        assert_eq!(groups.numeric, vec!["id"]);
        assert_eq!(groups.categorical, vec!["time_of_day"]);
        assert_eq!(groups.timelike, vec!["id", "time_of_day"]);
    }

    #[test]
    fn every_column_has_one_primary_group() {
        let df = dataset(vec![
            ints("n", &[1, 5, 2]),
            strs("c", &["a", "b", "a"]),
            ints("s", &[0, 0, 0]),
            Column::new("d", Dtype::datetime_ns(), vec![
                Value::Timestamp(1),
                Value::Timestamp(2),
                Value::Null,
            ]),
            Column::new("l", Dtype::Object, vec![Value::List(vec![]); 3]),
        ]);
        let groups = classify(&df, &ClassifierConfig::default());
        let total = groups.numeric.len()
            + groups.categorical.len()
            + groups.large_categorical.len()
            + groups.datetime.len()
            + groups.singleton.len()
            + groups.filtered.len();
        assert_eq!(total, df.columns().len());
        for name in df.column_names() {
            assert!(groups.primary_group_of(name).is_some(), "{name}");
        }
        assert_eq!(groups.primary_group_of("d"), Some(PrimaryGroup::Datetime));
    }

    #[test]
    fn time_columns_list_datetime_first_without_duplicates() {
        let groups = DtypeGroups {
            datetime: vec!["date".into()],
            timelike: vec!["id".into(), "date".into()],
            ..DtypeGroups::default()
        };
        assert_eq!(groups.time_columns(), vec!["date", "id"]);
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: ClassifierConfig =
            serde_json::from_str(r#"{"categorical_size_threshold": 3}"#).expect("config");
        assert_eq!(config.categorical_size_threshold, 3);
        assert_eq!(config.categorical_dtypes, vec![Dtype::Object, Dtype::Bool]);
    }
}
