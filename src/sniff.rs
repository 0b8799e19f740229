//! Column sniffing: infers header presence, field names, and per-column data
//! types from a small sample of raw string rows.
//!
//! The heuristic is deterministic and performs no I/O. Readers collect their
//! own sample (the delimited reader takes the first ten records) and hand it
//! over as a matrix of raw tokens.

use std::sync::LazyLock;

use anyhow::{Result, ensure};
use regex::Regex;

use crate::data::ColumnType;

static FLOAT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-+]?\d+\.\d*([eE][-+]?\d+)?$").expect("float pattern"));
static INT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-+]?\d+$").expect("int pattern"));

/// Outcome of sniffing a sample: whether row 0 is a header, the resolved
/// field names, and the per-column types (one entry per column, in order).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sniffed {
    pub has_header: bool,
    pub fields: Vec<String>,
    pub types: Vec<ColumnType>,
}

/// Classifies a single raw token in isolation.
///
/// Empty tokens are `Unknown`; tokens matching the decimal pattern and
/// parsing as a finite `f64` are `Float`; tokens matching the signed-digit
/// pattern and parsing as an `i64` are `Integer`; everything else is
/// `String`. A pattern match whose parse overflows falls through to
/// `String`, so e.g. a 40-digit "integer" is treated as text.
pub fn classify_token(token: &str) -> ColumnType {
    if token.is_empty() {
        return ColumnType::Unknown;
    }
    if FLOAT_PATTERN.is_match(token) {
        if let Ok(value) = token.parse::<f64>()
            && value.is_finite()
        {
            return ColumnType::Float;
        }
    } else if INT_PATTERN.is_match(token) && token.parse::<i64>().is_ok() {
        return ColumnType::Integer;
    }
    ColumnType::String
}

/// Infers header presence, field names, and column types from a sample.
///
/// The sample must hold at least two rows: a candidate header row plus at
/// least one data row. Rows 1.. are reduced per column: empty cells are
/// skipped, mixed Integer/Float widens to Float, and any other mix absorbs
/// to String. A column that saw only empty cells defaults to String.
///
/// Header detection: an empty cell in row 0 provisionally rules a header
/// out, and any column whose row-0 cell classifies as the same non-String
/// type as the reduced data rows vetoes the header for the whole row. The
/// veto is authoritative in either direction.
pub fn sniff_sample(sample: &[Vec<String>]) -> Result<Sniffed> {
    ensure!(
        sample.len() >= 2,
        "Sample must contain at least 2 rows to separate a header candidate from data (got {})",
        sample.len()
    );
    let n_fields = sample[0].len();

    let classified: Vec<Vec<ColumnType>> = sample
        .iter()
        .map(|row| row.iter().map(|cell| classify_token(cell)).collect())
        .collect();

    // A header row is assumed fully populated.
    let mut has_header = !sample[0].iter().any(|cell| cell.is_empty());

    let mut types = Vec::with_capacity(n_fields);
    for col in 0..n_fields {
        let header_type = classified[0].get(col).copied().unwrap_or(ColumnType::Unknown);
        let mut running = ColumnType::Unknown;
        for row in classified.iter().skip(1) {
            let this = row.get(col).copied().unwrap_or(ColumnType::Unknown);
            if this == ColumnType::Unknown {
                continue;
            }
            running = match running {
                ColumnType::Unknown => this,
                current if current == this => current,
                current if current.is_numeric() && this.is_numeric() => ColumnType::Float,
                _ => ColumnType::String,
            };
            if running == ColumnType::String {
                // String is absorbing; no later cell can narrow it again.
                break;
            }
        }
        if running == ColumnType::Unknown {
            running = ColumnType::String;
        }
        // A header cell that looks like typed data suggests row 0 is data.
        if running != ColumnType::String && running == header_type {
            has_header = false;
        }
        types.push(running);
    }

    let fields = if has_header {
        sample[0].clone()
    } else {
        (0..n_fields).map(|i| format!("c_{i}")).collect()
    };

    Ok(Sniffed {
        has_header,
        fields,
        types,
    })
}
