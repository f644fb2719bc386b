use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::QuickchartError;

// ---------------------------------------------------------------------------
// Value – a single cell of a column
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring what a Pandas object column can hold.
///
/// `Tuple` is hashable but iterable, `List` is neither hashable nor scalar.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    /// Nanoseconds since the Unix epoch.
    Timestamp(i64),
    Tuple(Vec<Value>),
    List(Vec<Value>),
}

// -- Manual Eq/Ord/Hash so distinct values can be counted like `Series.unique()` --

/// All NaNs collapse to one value and `-0.0 == 0.0`.
fn canonical_float(v: f64) -> f64 {
    if v.is_nan() {
        f64::NAN
    } else if v == 0.0 {
        0.0
    } else {
        v
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Bools, integers and floats share one numeric key so that `1`, `1.0` and
/// `true` are the same distinct value. Integral floats inside the `i64` range
/// become `Int`.
#[derive(Clone, Copy)]
enum NumericKey {
    Int(i64),
    Float(f64),
}

const I64_BOUND: f64 = 9_223_372_036_854_775_808.0; // 2^63

impl NumericKey {
    fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(NumericKey::Int(i64::from(*b))),
            Value::Integer(i) => Some(NumericKey::Int(*i)),
            Value::Float(f) => {
                let f = canonical_float(*f);
                if f.fract() == 0.0 && (-I64_BOUND..I64_BOUND).contains(&f) {
                    Some(NumericKey::Int(f as i64))
                } else {
                    Some(NumericKey::Float(f))
                }
            }
            _ => None,
        }
    }

    fn cmp(self, other: Self) -> Ordering {
        match (self, other) {
            (NumericKey::Int(a), NumericKey::Int(b)) => a.cmp(&b),
            (NumericKey::Float(a), NumericKey::Float(b)) => a.total_cmp(&b),
            (NumericKey::Int(a), NumericKey::Float(b)) => int_float_cmp(a, b),
            (NumericKey::Float(a), NumericKey::Int(b)) => int_float_cmp(b, a).reverse(),
        }
    }
}

/// `b` is never integral within the `i64` range here, so the two are never equal.
fn int_float_cmp(a: i64, b: f64) -> Ordering {
    if b.is_nan() {
        return Ordering::Less;
    }
    match (a as f64).partial_cmp(&b) {
        Some(Ordering::Greater) => Ordering::Greater,
        _ => Ordering::Less,
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        use Value::*;
        fn rank(v: &Value) -> u8 {
            match v {
                Null => 0,
                Bool(_) | Integer(_) | Float(_) => 1,
                String(_) => 2,
                Bytes(_) => 3,
                Timestamp(_) => 4,
                Tuple(_) => 5,
                List(_) => 6,
            }
        }
        let ra = rank(self);
        let rb = rank(other);
        if ra != rb {
            return ra.cmp(&rb);
        }
        if let (Some(a), Some(b)) = (NumericKey::of(self), NumericKey::of(other)) {
            return a.cmp(b);
        }
        match (self, other) {
            (Timestamp(a), Timestamp(b)) => a.cmp(b),
            (String(a), String(b)) => a.cmp(b),
            (Bytes(a), Bytes(b)) => a.cmp(b),
            (Tuple(a), Tuple(b)) | (List(a), List(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        if let Some(key) = NumericKey::of(self) {
            match key {
                NumericKey::Int(i) => {
                    0u8.hash(state);
                    i.hash(state);
                }
                NumericKey::Float(f) => {
                    1u8.hash(state);
                    f.to_bits().hash(state);
                }
            }
            return;
        }
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Timestamp(i) => i.hash(state),
            Value::String(s) => s.hash(state),
            Value::Bytes(b) => b.hash(state),
            Value::Tuple(items) | Value::List(items) => items.hash(state),
            _ => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "<null>"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(s) => write!(f, "{s}"),
            Value::Bytes(b) => write!(f, "{}", String::from_utf8_lossy(b)),
            Value::Timestamp(ns) => {
                let dt = chrono::DateTime::from_timestamp_nanos(*ns);
                write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.f"))
            }
            Value::Tuple(items) | Value::List(items) => {
                let (open, close) = if matches!(self, Value::Tuple(_)) {
                    ('(', ')')
                } else {
                    ('[', ']')
                };
                write!(f, "{open}")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "{close}")
            }
        }
    }
}

impl Value {
    /// Whether the value could serve as a dictionary key.
    pub fn is_hashable(&self) -> bool {
        match self {
            Value::List(_) => false,
            Value::Tuple(items) => items.iter().all(Value::is_hashable),
            _ => true,
        }
    }

    /// Containers are not scalar; strings and bytes are.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Value::Tuple(_) | Value::List(_))
    }

    /// Try to interpret the value as an `f64` for numeric axes.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Integer(i) | Value::Timestamp(i) => Some(*i as f64),
            Value::Bool(b) => Some(f64::from(u8::from(*b))),
            _ => None,
        }
    }

    /// Numeric `<=` with NumPy semantics: anything involving NaN or a
    /// non-number compares false.
    fn le_numeric(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a <= b,
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a <= b,
                _ => false,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Dtype – the declared storage type of a column
// ---------------------------------------------------------------------------

/// Resolution of a datetime/timedelta column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    S,
    Ms,
    Us,
    Ns,
}

impl TimeUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            TimeUnit::S => "s",
            TimeUnit::Ms => "ms",
            TimeUnit::Us => "us",
            TimeUnit::Ns => "ns",
        }
    }

    /// Multiplier that converts a count of this unit to nanoseconds.
    pub fn nanos(self) -> i64 {
        match self {
            TimeUnit::S => 1_000_000_000,
            TimeUnit::Ms => 1_000_000,
            TimeUnit::Us => 1_000,
            TimeUnit::Ns => 1,
        }
    }
}

/// Coarse storage family of a dtype, the analogue of NumPy's `dtype.kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DtypeKind {
    Bool,
    SignedInt,
    UnsignedInt,
    Float,
    Timedelta,
    Datetime,
    Object,
    Extension,
}

/// Declared storage type of a column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dtype {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Timedelta,
    Datetime { unit: TimeUnit, tz: Option<String> },
    Object,
    /// A type outside the native set (e.g. `category`), named for diagnostics.
    Extension(String),
}

impl Dtype {
    /// The `datetime64[ns]` dtype.
    pub fn datetime_ns() -> Self {
        Dtype::Datetime {
            unit: TimeUnit::Ns,
            tz: None,
        }
    }

    pub fn kind(&self) -> DtypeKind {
        match self {
            Dtype::Bool => DtypeKind::Bool,
            Dtype::Int8 | Dtype::Int16 | Dtype::Int32 | Dtype::Int64 => DtypeKind::SignedInt,
            Dtype::UInt8 | Dtype::UInt16 | Dtype::UInt32 | Dtype::UInt64 => {
                DtypeKind::UnsignedInt
            }
            Dtype::Float32 | Dtype::Float64 => DtypeKind::Float,
            Dtype::Timedelta => DtypeKind::Timedelta,
            Dtype::Datetime { .. } => DtypeKind::Datetime,
            Dtype::Object => DtypeKind::Object,
            Dtype::Extension(_) => DtypeKind::Extension,
        }
    }

    /// Pandas' `is_numeric_dtype`: booleans, integers and floats.
    /// Datetime-like dtypes, timedelta included, are not numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self.kind(),
            DtypeKind::Bool | DtypeKind::SignedInt | DtypeKind::UnsignedInt | DtypeKind::Float
        )
    }

    /// A NumPy number type: integers, floats and timedeltas, but not booleans.
    pub fn is_number(&self) -> bool {
        matches!(
            self.kind(),
            DtypeKind::SignedInt | DtypeKind::UnsignedInt | DtypeKind::Float | DtypeKind::Timedelta
        )
    }

    /// Stored in a native array rather than through an extension type.
    pub fn is_native(&self) -> bool {
        !matches!(self, Dtype::Extension(_))
    }

    pub fn is_integer(&self) -> bool {
        matches!(self.kind(), DtypeKind::SignedInt | DtypeKind::UnsignedInt)
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dtype::Bool => write!(f, "bool"),
            Dtype::Int8 => write!(f, "int8"),
            Dtype::Int16 => write!(f, "int16"),
            Dtype::Int32 => write!(f, "int32"),
            Dtype::Int64 => write!(f, "int64"),
            Dtype::UInt8 => write!(f, "uint8"),
            Dtype::UInt16 => write!(f, "uint16"),
            Dtype::UInt32 => write!(f, "uint32"),
            Dtype::UInt64 => write!(f, "uint64"),
            Dtype::Float32 => write!(f, "float32"),
            Dtype::Float64 => write!(f, "float64"),
            Dtype::Timedelta => write!(f, "timedelta64[ns]"),
            Dtype::Datetime { unit, tz: None } => write!(f, "datetime64[{}]", unit.as_str()),
            Dtype::Datetime { unit, tz: Some(tz) } => {
                write!(f, "datetime64[{}, {tz}]", unit.as_str())
            }
            Dtype::Object => write!(f, "object"),
            Dtype::Extension(name) => write!(f, "{name}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Column – one named, typed sequence of values
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub dtype: Dtype,
    pub values: Vec<Value>,
}

impl Column {
    /// Build a column, applying the nullable promotions a dataframe would:
    /// integers with nulls become `float64` NaNs, booleans with nulls become
    /// `object`.
    pub fn new(name: impl Into<String>, dtype: Dtype, values: Vec<Value>) -> Self {
        let has_null = values.iter().any(|v| matches!(v, Value::Null));
        let (dtype, values) = if has_null && dtype.is_integer() {
            let values = values
                .into_iter()
                .map(|v| match v {
                    Value::Integer(i) => Value::Float(i as f64),
                    _ => Value::Float(f64::NAN),
                })
                .collect();
            (Dtype::Float64, values)
        } else if has_null && dtype == Dtype::Bool {
            (Dtype::Object, values)
        } else {
            (dtype, values)
        };
        Column {
            name: name.into(),
            dtype,
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Every value can serve as a distinct-value key.
    pub fn is_hashable(&self) -> bool {
        self.values.iter().all(Value::is_hashable)
    }

    /// No value is a container. Strings and bytes count as scalar.
    pub fn all_scalar(&self) -> bool {
        self.values.iter().all(Value::is_scalar)
    }

    /// Number of distinct values; nulls count once, NaNs count once.
    pub fn n_unique(&self) -> usize {
        self.values.iter().collect::<HashSet<_>>().len()
    }

    /// Sorted distinct values.
    pub fn unique_values(&self) -> BTreeSet<&Value> {
        self.values.iter().collect()
    }

    /// Values are non-decreasing end-to-end under numeric comparison.
    pub fn is_non_decreasing(&self) -> bool {
        self.values.windows(2).all(|w| w[0].le_numeric(&w[1]))
    }

    /// Finite numeric values, in order.
    pub fn finite_f64(&self) -> Vec<f64> {
        self.values
            .iter()
            .filter_map(Value::as_f64)
            .filter(|v| v.is_finite())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Dataset – an ordered collection of equal-length columns
// ---------------------------------------------------------------------------

/// A read-only table of named columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
}

impl Dataset {
    /// Build a dataset; all columns must have the same length and distinct names.
    pub fn try_new(columns: Vec<Column>) -> Result<Self, QuickchartError> {
        let mut seen = HashSet::new();
        for col in &columns {
            if !seen.insert(col.name.as_str()) {
                return Err(QuickchartError::DuplicateColumn(col.name.clone()));
            }
        }
        if let Some(first) = columns.first() {
            let expected = first.len();
            if let Some(bad) = columns.iter().find(|c| c.len() != expected) {
                return Err(QuickchartError::LengthMismatch {
                    column: bad.name.clone(),
                    expected,
                    found: bad.len(),
                });
            }
        }
        Ok(Dataset { columns })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
