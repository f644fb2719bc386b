use std::path::Path;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, AsArray};
use arrow::datatypes::{
    DataType, Date32Type, Date64Type, DurationMicrosecondType, DurationMillisecondType,
    DurationNanosecondType, DurationSecondType, Float32Type, Float64Type, Int16Type, Int32Type,
    Int64Type, Int8Type, TimeUnit as ArrowTimeUnit, TimestampMicrosecondType,
    TimestampMillisecondType, TimestampNanosecondType, TimestampSecondType, UInt16Type,
    UInt32Type, UInt64Type, UInt8Type,
};
use arrow::util::display::array_value_to_string;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Column, Dataset, Dtype, TimeUnit, Value};

const NANOS_PER_DAY: i64 = 86_400 * 1_000_000_000;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a tabular dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – any flat or nested Arrow schema
/// * `.json`    – `[{ "col": value, ... }, ...]` (records orientation)
/// * `.csv`     – header row, one column per field
pub fn load_file(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "date": "2024-01-01", "sales": 12.5, "region": "north" },
///   ...
/// ]
/// ```
///
/// Columns appear in first-seen key order; a key missing from a record is null.
fn load_json(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut names: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !names.contains(key) {
                names.push(key.clone());
            }
        }
    }

    let columns = names
        .into_iter()
        .map(|name| {
            let cells: Vec<&JsonValue> = records
                .iter()
                .map(|rec| rec.get(&name).unwrap_or(&JsonValue::Null))
                .collect();
            infer_json_column(name, &cells)
        })
        .collect();

    Dataset::try_new(columns).context("assembling JSON dataset")
}

fn infer_json_column(name: String, cells: &[&JsonValue]) -> Column {
    let present: Vec<&JsonValue> = cells.iter().copied().filter(|v| !v.is_null()).collect();

    if present.is_empty() {
        return Column::new(name, Dtype::Object, vec![Value::Null; cells.len()]);
    }
    if present.iter().all(|v| v.is_i64()) {
        let values = cells.iter().map(|v| json_to_value(v)).collect();
        return Column::new(name, Dtype::Int64, values);
    }
    if present.iter().all(|v| v.is_number()) {
        let values = cells
            .iter()
            .map(|v| Value::Float(v.as_f64().unwrap_or(f64::NAN)))
            .collect();
        return Column::new(name, Dtype::Float64, values);
    }
    if present.iter().all(|v| v.is_boolean()) {
        let values = cells.iter().map(|v| json_to_value(v)).collect();
        return Column::new(name, Dtype::Bool, values);
    }
    if present.iter().all(|v| v.is_string()) {
        let texts: Vec<Option<&str>> = cells.iter().map(|v| v.as_str()).collect();
        if let Some(column) = infer_datetime_column(&name, &texts) {
            return column;
        }
    }
    let values = cells.iter().map(|v| json_to_value(v)).collect();
    Column::new(name, Dtype::Object, values)
}

/// Arrays become unhashable lists; objects become lists of `(key, value)` tuples.
fn json_to_value(val: &JsonValue) -> Value {
    match val {
        JsonValue::String(s) => Value::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                Value::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Null => Value::Null,
        JsonValue::Array(items) => Value::List(items.iter().map(json_to_value).collect()),
        JsonValue::Object(map) => Value::List(
            map.iter()
                .map(|(k, v)| Value::Tuple(vec![Value::String(k.clone()), json_to_value(v)]))
                .collect(),
        ),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one typed column per field.
/// Empty cells are nulls.
fn load_csv(path: &Path) -> Result<Dataset> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        for (col_idx, column) in cells.iter_mut().enumerate() {
            column.push(record.get(col_idx).unwrap_or("").to_string());
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, column)| infer_text_column(name, &column))
        .collect();

    Dataset::try_new(columns).context("assembling CSV dataset")
}

/// Guess the narrowest dtype that fits every non-empty cell.
fn infer_text_column(name: String, cells: &[String]) -> Column {
    let texts: Vec<Option<&str>> = cells
        .iter()
        .map(|s| if s.is_empty() { None } else { Some(s.as_str()) })
        .collect();
    let present: Vec<&str> = texts.iter().flatten().copied().collect();

    if present.is_empty() {
        return Column::new(name, Dtype::Float64, vec![Value::Float(f64::NAN); cells.len()]);
    }
    if present.iter().all(|s| s.parse::<i64>().is_ok()) {
        let values = texts
            .iter()
            .map(|t| match t.and_then(|s| s.parse::<i64>().ok()) {
                Some(i) => Value::Integer(i),
                None => Value::Null,
            })
            .collect();
        return Column::new(name, Dtype::Int64, values);
    }
    if present.iter().all(|s| s.parse::<f64>().is_ok()) {
        let values = texts
            .iter()
            .map(|t| Value::Float(t.and_then(|s| s.parse::<f64>().ok()).unwrap_or(f64::NAN)))
            .collect();
        return Column::new(name, Dtype::Float64, values);
    }
    if present.iter().all(|s| parse_bool(s).is_some()) {
        let values = texts
            .iter()
            .map(|t| t.and_then(parse_bool).map_or(Value::Null, Value::Bool))
            .collect();
        return Column::new(name, Dtype::Bool, values);
    }
    if let Some(column) = infer_datetime_column(&name, &texts) {
        return column;
    }
    let values = texts
        .iter()
        .map(|t| t.map_or(Value::Null, |s| Value::String(s.to_string())))
        .collect();
    Column::new(name, Dtype::Object, values)
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

// -- Datetime inference shared by the text loaders --

/// A column is datetime when every present cell parses as ISO-8601 and all
/// cells agree on whether they carry an offset.
fn infer_datetime_column(name: &str, texts: &[Option<&str>]) -> Option<Column> {
    let mut aware = None;
    let mut values = Vec::with_capacity(texts.len());
    for text in texts {
        match text {
            None => values.push(Value::Null),
            Some(s) => {
                let (nanos, has_offset) = parse_datetime(s)?;
                if *aware.get_or_insert(has_offset) != has_offset {
                    return None;
                }
                values.push(Value::Timestamp(nanos));
            }
        }
    }
    let tz = aware?.then(|| "UTC".to_string());
    let dtype = Dtype::Datetime {
        unit: TimeUnit::Ns,
        tz,
    };
    Some(Column::new(name, dtype, values))
}

/// Returns nanoseconds since the epoch and whether the text carried an offset.
fn parse_datetime(s: &str) -> Option<(i64, bool)> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some((dt.timestamp_nanos_opt()?, true));
    }
    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    for fmt in FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some((ndt.and_utc().timestamp_nanos_opt()?, false));
        }
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    let midnight = date.and_hms_opt(0, 0, 0)?;
    Some((midnight.and_utc().timestamp_nanos_opt()?, false))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file, one column per top-level field.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).  Nested list/struct fields become
/// `object` columns of container values; dictionary-encoded fields become the
/// `category` extension type.
fn load_parquet(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let schema = builder.schema().clone();
    let reader = builder.build().context("building parquet reader")?;

    let mut values: Vec<Vec<Value>> = vec![Vec::new(); schema.fields().len()];

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for (col_idx, column_values) in values.iter_mut().enumerate() {
            let array = batch.column(col_idx);
            let cells = array_values(array.as_ref())
                .with_context(|| format!("reading column '{}'", schema.field(col_idx).name()))?;
            column_values.extend(cells);
        }
    }

    let columns = schema
        .fields()
        .iter()
        .zip(values)
        .map(|(field, cells)| Column::new(field.name().clone(), arrow_dtype(field.data_type()), cells))
        .collect();

    Dataset::try_new(columns).context("assembling parquet dataset")
}

// -- Parquet / Arrow helpers --

/// Map an Arrow type to the dtype a dataframe would report for it.
fn arrow_dtype(data_type: &DataType) -> Dtype {
    match data_type {
        DataType::Boolean => Dtype::Bool,
        DataType::Int8 => Dtype::Int8,
        DataType::Int16 => Dtype::Int16,
        DataType::Int32 => Dtype::Int32,
        DataType::Int64 => Dtype::Int64,
        DataType::UInt8 => Dtype::UInt8,
        DataType::UInt16 => Dtype::UInt16,
        DataType::UInt32 => Dtype::UInt32,
        DataType::UInt64 => Dtype::UInt64,
        DataType::Float32 => Dtype::Float32,
        DataType::Float64 => Dtype::Float64,
        DataType::Utf8
        | DataType::LargeUtf8
        | DataType::Utf8View
        | DataType::Binary
        | DataType::LargeBinary
        | DataType::List(_)
        | DataType::LargeList(_)
        | DataType::FixedSizeList(_, _)
        | DataType::Struct(_) => Dtype::Object,
        DataType::Timestamp(unit, tz) => Dtype::Datetime {
            unit: time_unit(unit),
            tz: tz.as_ref().map(|t| t.to_string()),
        },
        // Calendar dates are read as midnight timestamps so they stay on a time axis.
        DataType::Date32 | DataType::Date64 => Dtype::datetime_ns(),
        DataType::Duration(_) => Dtype::Timedelta,
        DataType::Dictionary(_, _) => Dtype::Extension("category".to_string()),
        other => Dtype::Extension(other.to_string()),
    }
}

fn time_unit(unit: &ArrowTimeUnit) -> TimeUnit {
    match unit {
        ArrowTimeUnit::Second => TimeUnit::S,
        ArrowTimeUnit::Millisecond => TimeUnit::Ms,
        ArrowTimeUnit::Microsecond => TimeUnit::Us,
        ArrowTimeUnit::Nanosecond => TimeUnit::Ns,
    }
}

fn array_values(array: &dyn Array) -> Result<Vec<Value>> {
    (0..array.len()).map(|row| cell_value(array, row)).collect()
}

/// Extract a single value from an Arrow array at a given row.
fn cell_value(array: &dyn Array, row: usize) -> Result<Value> {
    if array.is_null(row) {
        return Ok(Value::Null);
    }
    let value = match array.data_type() {
        DataType::Boolean => Value::Bool(array.as_boolean().value(row)),
        DataType::Int8 => Value::Integer(i64::from(array.as_primitive::<Int8Type>().value(row))),
        DataType::Int16 => Value::Integer(i64::from(array.as_primitive::<Int16Type>().value(row))),
        DataType::Int32 => Value::Integer(i64::from(array.as_primitive::<Int32Type>().value(row))),
        DataType::Int64 => Value::Integer(array.as_primitive::<Int64Type>().value(row)),
        DataType::UInt8 => Value::Integer(i64::from(array.as_primitive::<UInt8Type>().value(row))),
        DataType::UInt16 => {
            Value::Integer(i64::from(array.as_primitive::<UInt16Type>().value(row)))
        }
        DataType::UInt32 => {
            Value::Integer(i64::from(array.as_primitive::<UInt32Type>().value(row)))
        }
        DataType::UInt64 => {
            let v = array.as_primitive::<UInt64Type>().value(row);
            i64::try_from(v).map_or(Value::Float(v as f64), Value::Integer)
        }
        DataType::Float32 => {
            Value::Float(f64::from(array.as_primitive::<Float32Type>().value(row)))
        }
        DataType::Float64 => Value::Float(array.as_primitive::<Float64Type>().value(row)),
        DataType::Utf8 => Value::String(array.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => Value::String(array.as_string::<i64>().value(row).to_string()),
        DataType::Utf8View => Value::String(array.as_string_view().value(row).to_string()),
        DataType::Binary => Value::Bytes(array.as_binary::<i32>().value(row).to_vec()),
        DataType::LargeBinary => Value::Bytes(array.as_binary::<i64>().value(row).to_vec()),
        DataType::Timestamp(unit, _) => Value::Timestamp(timestamp_nanos(array, unit, row)),
        DataType::Date32 => Value::Timestamp(
            i64::from(array.as_primitive::<Date32Type>().value(row)) * NANOS_PER_DAY,
        ),
        DataType::Date64 => Value::Timestamp(
            array
                .as_primitive::<Date64Type>()
                .value(row)
                .saturating_mul(TimeUnit::Ms.nanos()),
        ),
        DataType::Duration(unit) => Value::Integer(duration_nanos(array, unit, row)),
        DataType::List(_) => {
            Value::List(array_values(array.as_list::<i32>().value(row).as_ref())?)
        }
        DataType::LargeList(_) => {
            Value::List(array_values(array.as_list::<i64>().value(row).as_ref())?)
        }
        DataType::FixedSizeList(_, _) => {
            Value::List(array_values(array.as_fixed_size_list().value(row).as_ref())?)
        }
        DataType::Struct(_) => {
            let strukt = array.as_struct();
            let entries = strukt
                .column_names()
                .into_iter()
                .zip(strukt.columns())
                .map(|(name, child)| {
                    Ok(Value::Tuple(vec![
                        Value::String(name.to_string()),
                        cell_value(child.as_ref(), row)?,
                    ]))
                })
                .collect::<Result<Vec<_>>>()?;
            Value::List(entries)
        }
        _ => Value::String(
            array_value_to_string(array, row)
                .with_context(|| format!("formatting {} value", array.data_type()))?,
        ),
    };
    Ok(value)
}

fn timestamp_nanos(array: &dyn Array, unit: &ArrowTimeUnit, row: usize) -> i64 {
    let (raw, unit) = match unit {
        ArrowTimeUnit::Second => (array.as_primitive::<TimestampSecondType>().value(row), TimeUnit::S),
        ArrowTimeUnit::Millisecond => {
            (array.as_primitive::<TimestampMillisecondType>().value(row), TimeUnit::Ms)
        }
        ArrowTimeUnit::Microsecond => {
            (array.as_primitive::<TimestampMicrosecondType>().value(row), TimeUnit::Us)
        }
        ArrowTimeUnit::Nanosecond => {
            (array.as_primitive::<TimestampNanosecondType>().value(row), TimeUnit::Ns)
        }
    };
    raw.saturating_mul(unit.nanos())
}

fn duration_nanos(array: &dyn Array, unit: &ArrowTimeUnit, row: usize) -> i64 {
    let (raw, unit) = match unit {
        ArrowTimeUnit::Second => (array.as_primitive::<DurationSecondType>().value(row), TimeUnit::S),
        ArrowTimeUnit::Millisecond => {
            (array.as_primitive::<DurationMillisecondType>().value(row), TimeUnit::Ms)
        }
        ArrowTimeUnit::Microsecond => {
            (array.as_primitive::<DurationMicrosecondType>().value(row), TimeUnit::Us)
        }
        ArrowTimeUnit::Nanosecond => {
            (array.as_primitive::<DurationNanosecondType>().value(row), TimeUnit::Ns)
        }
    };
    raw.saturating_mul(unit.nanos())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn text_inference_picks_narrowest_dtype() {
        assert_eq!(infer_text_column("a".into(), &strings(&["1", "2"])).dtype, Dtype::Int64);
        assert_eq!(infer_text_column("a".into(), &strings(&["1", "2.5"])).dtype, Dtype::Float64);
        assert_eq!(infer_text_column("a".into(), &strings(&["True", "false"])).dtype, Dtype::Bool);
        assert_eq!(
            infer_text_column("a".into(), &strings(&["2024-01-01", "2024-01-02 10:30:00"])).dtype,
            Dtype::datetime_ns()
        );
        assert_eq!(infer_text_column("a".into(), &strings(&["x", "1"])).dtype, Dtype::Object);
    }

    #[test]
    fn arrow_dates_and_durations_map_to_time_dtypes() {
        assert_eq!(arrow_dtype(&DataType::Date32), Dtype::datetime_ns());
        assert_eq!(arrow_dtype(&DataType::Date64), Dtype::datetime_ns());
        assert_eq!(
            arrow_dtype(&DataType::Duration(ArrowTimeUnit::Millisecond)),
            Dtype::Timedelta
        );
        assert!(!arrow_dtype(&DataType::Duration(ArrowTimeUnit::Second)).is_numeric());
    }

    #[test]
    fn empty_cells_in_integer_text_become_nan() {
        let col = infer_text_column("a".into(), &strings(&["1", "", "3"]));
        assert_eq!(col.dtype, Dtype::Float64);
        assert!(matches!(col.values[1], Value::Float(v) if v.is_nan()));
    }

    #[test]
    fn offset_datetimes_are_utc() {
        let texts = [Some("2024-01-01T00:00:00Z"), None, Some("2024-01-01T01:00:00+01:00")];
        let col = infer_datetime_column("ts", &texts).expect("datetime column");
        assert_eq!(
            col.dtype,
            Dtype::Datetime {
                unit: TimeUnit::Ns,
                tz: Some("UTC".into())
            }
        );
        assert_eq!(col.values[0], col.values[2]);
        assert_eq!(col.values[1], Value::Null);
    }

    #[test]
    fn mixed_offset_awareness_is_not_datetime() {
        let texts = [Some("2024-01-01T00:00:00Z"), Some("2024-01-02")];
        assert!(infer_datetime_column("ts", &texts).is_none());
    }

    #[test]
    fn json_containers_map_to_unhashable_lists() {
        let value: JsonValue = serde_json::json!({"a": [1, 2]});
        match json_to_value(&value) {
            Value::List(entries) => {
                assert_eq!(entries.len(), 1);
                assert!(matches!(&entries[0], Value::Tuple(pair) if pair.len() == 2));
            }
            other => panic!("unexpected value {other:?}"),
        }
    }
}
