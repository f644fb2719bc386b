use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{
    BooleanArray, Float64Array, Float64Builder, Int64Array, ListBuilder, StringArray,
    TimestampNanosecondArray,
};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const HOUR_NANOS: i64 = 3_600 * 1_000_000_000;
/// 2024-01-01T00:00:00Z
const START_NANOS: i64 = 1_704_067_200 * 1_000_000_000;

/// SplitMix64 stream; reproducible across runs for a given seed.
struct SampleRng(u64);

impl SampleRng {
    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in `[0, 1)`.
    fn uniform(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Normal sample via the Marsaglia polar method.
    fn normal(&mut self, mean: f64, sd: f64) -> f64 {
        loop {
            let u = 2.0 * self.uniform() - 1.0;
            let v = 2.0 * self.uniform() - 1.0;
            let s = u * u + v * v;
            if s > 0.0 && s < 1.0 {
                return mean + sd * u * (-2.0 * s.ln() / s).sqrt();
            }
        }
    }
}

/// Writes `sample_data.parquet`, a weather-station log touching every dtype
/// group: a datetime axis, sorted ids, numeric readings, small and large
/// categoricals, a constant column and a nested list column.
fn main() -> Result<()> {
    let mut rng = SampleRng(42);

    let stations = [("north", 4.0), ("harbor", 9.0), ("summit", -2.0)];
    let hours = 48;

    let mut timestamp: Vec<i64> = Vec::new();
    let mut reading_id: Vec<i64> = Vec::new();
    let mut station: Vec<&str> = Vec::new();
    let mut temperature: Vec<f64> = Vec::new();
    let mut humidity: Vec<f64> = Vec::new();
    let mut calibrated: Vec<bool> = Vec::new();
    let mut note: Vec<String> = Vec::new();
    let mut samples = ListBuilder::new(Float64Builder::new());

    let mut row_id: i64 = 0;
    for hour in 0..hours {
        // Diurnal cycle peaking mid-afternoon.
        let phase = ((hour % 24) as f64 - 15.0) / 24.0 * 2.0 * std::f64::consts::PI;
        for &(name, base_temp) in &stations {
            let temp = base_temp + 5.0 * phase.cos() + rng.normal(0.0, 0.8);
            timestamp.push(START_NANOS + hour as i64 * HOUR_NANOS);
            reading_id.push(row_id);
            station.push(name);
            temperature.push(temp);
            humidity.push((70.0 - 2.0 * temp + rng.normal(0.0, 4.0)).clamp(5.0, 100.0));
            calibrated.push(rng.uniform() > 0.2);
            note.push(format!("{name}-{hour:02}"));

            let values = samples.values();
            for _ in 0..3 {
                values.append_value(temp + rng.normal(0.0, 0.3));
            }
            samples.append(true);
            row_id += 1;
        }
    }
    let n_rows = reading_id.len();

    let schema = Arc::new(Schema::new(vec![
        Field::new("timestamp", DataType::Timestamp(TimeUnit::Nanosecond, None), false),
        Field::new("reading_id", DataType::Int64, false),
        Field::new("station", DataType::Utf8, false),
        Field::new("temperature", DataType::Float64, false),
        Field::new("humidity", DataType::Float64, false),
        Field::new("calibrated", DataType::Boolean, false),
        Field::new("note", DataType::Utf8, false),
        Field::new("site", DataType::Utf8, false),
        Field::new(
            "samples",
            DataType::List(Arc::new(Field::new("item", DataType::Float64, true))),
            false,
        ),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(TimestampNanosecondArray::from(timestamp)),
            Arc::new(Int64Array::from(reading_id)),
            Arc::new(StringArray::from(station)),
            Arc::new(Float64Array::from(temperature)),
            Arc::new(Float64Array::from(humidity)),
            Arc::new(BooleanArray::from(calibrated)),
            Arc::new(StringArray::from(note)),
            Arc::new(StringArray::from(vec!["field-lab"; n_rows])),
            Arc::new(samples.finish()),
        ],
    )
    .context("assembling record batch")?;

    let output_path = "sample_data.parquet";
    let file = std::fs::File::create(output_path).context("creating output file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing record batch")?;
    writer.close().context("closing parquet writer")?;

    println!("Wrote {n_rows} readings from {} stations to {output_path}", stations.len());
    Ok(())
}
