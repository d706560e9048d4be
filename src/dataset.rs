//! The synthetic analytics dataset and its Parquet file.
//!
//! The schema is fixed: one sequential timestamp, two integer identifiers,
//! a categorical event type and four floating-point measurements.

use std::{
    fs::File,
    path::{Path, PathBuf},
    sync::Arc,
};

use arrow::{
    array::{ArrayRef, Float64Array, Int32Array, Int64Array, StringArray},
    datatypes::{DataType, Field, Schema, SchemaRef},
    error::ArrowError,
    record_batch::RecordBatch,
};
use parquet::{
    arrow::{arrow_reader::ParquetRecordBatchReaderBuilder, ArrowWriter},
    basic::Compression,
    file::properties::WriterProperties,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{debug, info};

use crate::{
    common::{DEFAULT_BATCH_SIZE, DEFAULT_DATA_FILE, DEFAULT_ROWS},
    error::DatasetError,
};

/// The categories of the `event_type` column.
pub const EVENT_TYPES: [&str; 4] = ["click", "view", "purchase", "scroll"];

/// Number of columns in the dataset.
pub const NUM_COLUMNS: usize = 8;

/// The fixed schema of the dataset.
pub fn dataset_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("timestamp", DataType::Int64, false),
        Field::new("user_id", DataType::Int32, false),
        Field::new("session_id", DataType::Int32, false),
        Field::new("event_type", DataType::Utf8, false),
        Field::new("value", DataType::Float64, false),
        Field::new("duration", DataType::Float64, false),
        Field::new("x_coord", DataType::Float64, false),
        Field::new("y_coord", DataType::Float64, false),
    ]))
}

/// Options of the data generator.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Total number of rows to write.
    pub rows: usize,
    /// Output Parquet file.
    pub output: PathBuf,
    /// Rows generated and written per record batch.
    pub batch_size: usize,
    /// Seed for reproducible output, random when unset.
    pub seed: Option<u64>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            output: PathBuf::from(DEFAULT_DATA_FILE),
            batch_size: DEFAULT_BATCH_SIZE,
            seed: None,
        }
    }
}

/// What the generator wrote.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateSummary {
    pub rows: usize,
    pub columns: usize,
    /// In-memory size of the generated Arrow arrays.
    pub uncompressed_bytes: u64,
    /// Size of the Parquet file on disk.
    pub file_bytes: u64,
}

impl GenerateSummary {
    pub fn compression_ratio(&self) -> f64 {
        if self.file_bytes == 0 {
            return 0.0;
        }
        self.uncompressed_bytes as f64 / self.file_bytes as f64
    }
}

/// Row count and schema read back from a Parquet file footer.
#[derive(Debug, Clone)]
pub struct DatasetMetadata {
    pub rows: i64,
    pub schema: SchemaRef,
}

/// Generate the dataset and write it as a Snappy-compressed Parquet file.
pub fn generate(options: &GenerateOptions) -> Result<GenerateSummary, DatasetError> {
    let schema = dataset_schema();
    let mut rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let batch_size = options.batch_size.max(1);

    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let file = File::create(&options.output)?;
    let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;

    let mut uncompressed_bytes = 0u64;
    let mut offset = 0usize;
    while offset < options.rows {
        let len = batch_size.min(options.rows - offset);
        let batch = random_batch(&mut rng, schema.clone(), offset as i64, len)?;
        uncompressed_bytes += batch.get_array_memory_size() as u64;
        writer.write(&batch)?;
        debug!("Wrote batch of {} rows at offset {}", len, offset);
        offset += len;
    }
    writer.close()?;

    let file_bytes = std::fs::metadata(&options.output)?.len();
    info!(
        "Wrote {} rows to {} ({} bytes)",
        options.rows,
        options.output.display(),
        file_bytes
    );

    Ok(GenerateSummary {
        rows: options.rows,
        columns: schema.fields().len(),
        uncompressed_bytes,
        file_bytes,
    })
}

/// Build one batch of `len` random rows whose timestamps start at `offset`.
fn random_batch<R: Rng>(
    rng: &mut R,
    schema: SchemaRef,
    offset: i64,
    len: usize,
) -> Result<RecordBatch, ArrowError> {
    let timestamp = Int64Array::from_iter_values(offset..offset + len as i64);
    let user_id = Int32Array::from_iter_values((0..len).map(|_| rng.gen_range(1..10_000)));
    let session_id = Int32Array::from_iter_values((0..len).map(|_| rng.gen_range(1..100_000)));
    let event_type = StringArray::from_iter_values(
        (0..len).map(|_| EVENT_TYPES[rng.gen_range(0..EVENT_TYPES.len())]),
    );
    let value = Float64Array::from_iter_values((0..len).map(|_| rng.gen_range(0.0..1000.0)));
    let duration = Float64Array::from_iter_values((0..len).map(|_| rng.gen_range(0.0..60.0)));
    let x_coord = Float64Array::from_iter_values((0..len).map(|_| rng.gen_range(0.0..1920.0)));
    let y_coord = Float64Array::from_iter_values((0..len).map(|_| rng.gen_range(0.0..1080.0)));

    let columns: Vec<ArrayRef> = vec![
        Arc::new(timestamp),
        Arc::new(user_id),
        Arc::new(session_id),
        Arc::new(event_type),
        Arc::new(value),
        Arc::new(duration),
        Arc::new(x_coord),
        Arc::new(y_coord),
    ];
    RecordBatch::try_new(schema, columns)
}

/// Read the row count and Arrow schema from the file footer.
pub fn read_metadata(path: &Path) -> Result<DatasetMetadata, DatasetError> {
    if !path.exists() {
        return Err(DatasetError::NotFound(path.to_path_buf()));
    }
    let builder = ParquetRecordBatchReaderBuilder::try_new(File::open(path)?)?;
    Ok(DatasetMetadata {
        rows: builder.metadata().file_metadata().num_rows(),
        schema: builder.schema().clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(dir: &Path, rows: usize, batch_size: usize) -> GenerateOptions {
        GenerateOptions {
            rows,
            output: dir.join("data.parquet"),
            batch_size,
            seed: Some(7),
        }
    }

    #[test]
    fn test_generate_row_and_column_count() {
        let dir = tempfile::tempdir().unwrap();
        for rows in [0, 1, 1_234] {
            let opts = options(dir.path(), rows, 500);
            let summary = generate(&opts).unwrap();
            assert_eq!(summary.rows, rows);
            assert_eq!(summary.columns, NUM_COLUMNS);

            let meta = read_metadata(&opts.output).unwrap();
            assert_eq!(meta.rows, rows as i64);
            assert_eq!(meta.schema.fields().len(), NUM_COLUMNS);
        }
    }

    #[test]
    fn test_generate_value_ranges() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(dir.path(), 2_000, 700);
        generate(&opts).unwrap();

        let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(&opts.output).unwrap())
            .unwrap()
            .build()
            .unwrap();
        let mut expected_ts = 0i64;
        for batch in reader {
            let batch = batch.unwrap();
            let ts = batch
                .column(0)
                .as_any()
                .downcast_ref::<Int64Array>()
                .unwrap();
            for v in ts.values().iter() {
                assert_eq!(*v, expected_ts);
                expected_ts += 1;
            }
            let users = batch
                .column(1)
                .as_any()
                .downcast_ref::<Int32Array>()
                .unwrap();
            assert!(users.values().iter().all(|v| (1..10_000).contains(v)));
            let events = batch
                .column(3)
                .as_any()
                .downcast_ref::<StringArray>()
                .unwrap();
            assert!(events.iter().all(|e| EVENT_TYPES.contains(&e.unwrap())));
            let y = batch
                .column(7)
                .as_any()
                .downcast_ref::<Float64Array>()
                .unwrap();
            assert!(y.values().iter().all(|v| (0.0..1080.0).contains(v)));
        }
        assert_eq!(expected_ts, 2_000);
    }

    #[test]
    fn test_schema_matches_dataset_schema() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(dir.path(), 10, 4);
        generate(&opts).unwrap();
        let meta = read_metadata(&opts.output).unwrap();
        assert_eq!(meta.schema.fields(), dataset_schema().fields());
    }

    #[test]
    fn test_read_metadata_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_metadata(&dir.path().join("missing.parquet")).unwrap_err();
        assert!(matches!(err, DatasetError::NotFound(_)));
    }

    #[test]
    fn test_compression_ratio() {
        let summary = GenerateSummary {
            rows: 1,
            columns: NUM_COLUMNS,
            uncompressed_bytes: 300,
            file_bytes: 100,
        };
        assert_eq!(summary.compression_ratio(), 3.0);
    }
}
