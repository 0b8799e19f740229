//! Profiler orchestration: drains a row stream into per-column collectors
//! and assembles the structured report the renderer consumes.

use std::time::Instant;

use anyhow::{Context, Result, ensure};
use log::info;
use serde::Serialize;

use crate::{
    data::ColumnType,
    stats::Collector,
    stream::RowStream,
};

/// Profiling options, resolved from the command line.
#[derive(Debug, Clone, Copy)]
pub struct ProfileOptions {
    /// Sort report columns alphabetically instead of file order.
    pub sort_columns: bool,
    /// Number of sample values per categorical column.
    pub sample_size: usize,
    /// Report the least frequent values instead of the most frequent.
    pub least_frequent: bool,
}

impl Default for ProfileOptions {
    fn default() -> Self {
        Self {
            sort_columns: true,
            sample_size: 5,
            least_frequent: false,
        }
    }
}

/// Aggregate profile of one file. Counts, percentages, type names, summary
/// strings, and frequency pairs are all precomputed; layout is entirely the
/// renderer's business.
#[derive(Debug, Serialize)]
pub struct Report {
    pub file_name: String,
    pub file_info: String,
    pub row_count: usize,
    pub elapsed_seconds: f64,
    /// Empty when the stream held no rows ("no data").
    pub coverage: Vec<CoverageEntry>,
    /// Present only when at least one column is categorical.
    pub frequency: Option<FrequencySection>,
}

impl Report {
    pub fn has_data(&self) -> bool {
        self.row_count > 0
    }
}

#[derive(Debug, Serialize)]
pub struct CoverageEntry {
    pub name: String,
    pub datatype: ColumnType,
    /// Non-null (for categorical: non-empty) values observed.
    pub count: usize,
    /// `100 * count / row_count`.
    pub percent: f64,
    pub summary: String,
}

#[derive(Debug, Serialize)]
pub struct FrequencySection {
    pub sample_size: usize,
    pub least_frequent: bool,
    pub columns: Vec<ColumnFrequency>,
}

#[derive(Debug, Serialize)]
pub struct ColumnFrequency {
    pub name: String,
    /// `None` when the column held no non-empty values.
    pub entries: Option<Vec<FrequencyEntry>>,
}

#[derive(Debug, Serialize)]
pub struct FrequencyEntry {
    pub value: String,
    pub count: usize,
    pub percent: f64,
}

/// Profiles one file end to end: initializes the stream, allocates one
/// collector per column, drains every row, and assembles the report.
///
/// Any failure is fatal: stream initialization, a mid-stream decode error,
/// or a value whose kind disagrees with its declared column type. There is
/// no partial report.
pub fn profile(mut stream: Box<dyn RowStream>, options: &ProfileOptions) -> Result<Report> {
    stream
        .initialize()
        .with_context(|| format!("Initializing reader for '{}'", stream.file_name()))?;
    let columns = stream.columns().to_vec();
    let file_name = stream.file_name().to_string();
    let file_info = stream.describe();
    info!("Profiling '{file_name}' ({file_info})");

    let mut collectors: Vec<Collector> = columns
        .iter()
        .map(|column| Collector::for_type(column.datatype))
        .collect();

    let start = Instant::now();
    let mut row_count = 0usize;
    for row in stream.into_rows()? {
        let row = row.with_context(|| format!("Streaming rows from '{file_name}'"))?;
        ensure!(
            row.len() == columns.len(),
            "Row {} has {} value(s), expected {}",
            row_count + 1,
            row.len(),
            columns.len()
        );
        for (value, collector) in row.iter().zip(collectors.iter_mut()) {
            collector
                .push(value.as_ref())
                .with_context(|| format!("Aggregating row {}", row_count + 1))?;
        }
        row_count += 1;
    }
    let elapsed_seconds = start.elapsed().as_secs_f64();
    info!("Profiled {row_count} row(s) in {elapsed_seconds:.3}s");

    if row_count == 0 {
        return Ok(Report {
            file_name,
            file_info,
            row_count: 0,
            elapsed_seconds,
            coverage: Vec::new(),
            frequency: None,
        });
    }

    // Column order for both report sections.
    let mut order: Vec<usize> = (0..columns.len()).collect();
    if options.sort_columns {
        order.sort_by(|a, b| columns[*a].name.cmp(&columns[*b].name));
    }

    let coverage = order
        .iter()
        .map(|&i| CoverageEntry {
            name: columns[i].name.clone(),
            datatype: columns[i].datatype,
            count: collectors[i].count(),
            percent: 100.0 * collectors[i].count() as f64 / row_count as f64,
            summary: collectors[i].summary(),
        })
        .collect();

    let any_categorical = order
        .iter()
        .any(|&i| matches!(collectors[i], Collector::Categorical(_)));
    let frequency = any_categorical.then(|| FrequencySection {
        sample_size: options.sample_size,
        least_frequent: options.least_frequent,
        columns: order
            .iter()
            .filter_map(|&i| match &collectors[i] {
                Collector::Categorical(freq) => Some(column_frequency(
                    &columns[i].name,
                    freq,
                    row_count,
                    options,
                )),
                Collector::Numeric(_) => None,
            })
            .collect(),
    });

    Ok(Report {
        file_name,
        file_info,
        row_count,
        elapsed_seconds,
        coverage,
        frequency,
    })
}

fn column_frequency(
    name: &str,
    freq: &crate::stats::CategoricalFreq,
    row_count: usize,
    options: &ProfileOptions,
) -> ColumnFrequency {
    let entries = (freq.count() > 0).then(|| {
        freq.top_n(options.sample_size, options.least_frequent)
            .into_iter()
            .map(|(value, count)| FrequencyEntry {
                value,
                count,
                percent: 100.0 * count as f64 / row_count as f64,
            })
            .collect()
    });
    ColumnFrequency {
        name: name.to_string(),
        entries,
    }
}
