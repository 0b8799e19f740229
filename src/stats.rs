//! Per-column online stat collectors.
//!
//! Two aggregators cover the report: [`NumericStats`] maintains running
//! min/max/mean/variance via Welford's update, and [`CategoricalFreq`] keeps
//! an exact value-frequency table with length bounds. Both consume one value
//! at a time and never retain the full dataset, so they stay correct for
//! inputs that do not fit in memory.

use std::collections::HashMap;

use anyhow::{Result, bail};
use itertools::Itertools;

use crate::data::{ColumnType, Value};

/// Running numeric summary based on Welford's online algorithm
/// (https://www.johndcook.com/blog/standard_deviation/). The incremental
/// formulation avoids the catastrophic cancellation a naive sum-of-squares
/// accumulator suffers from.
#[derive(Debug, Default)]
pub struct NumericStats {
    n: f64,
    mean: f64,
    // Sum of squared deviations from the running mean.
    s: f64,
    min: f64,
    max: f64,
    total: usize,
    nulls: usize,
}

impl NumericStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one value. Nulls bump the null/total counters only. A non-null
    /// value whose kind is not numeric means the reader and the inferred
    /// schema disagree; that is an internal contract violation and the run
    /// must abort rather than silently coerce.
    pub fn push(&mut self, value: Option<&Value>) -> Result<()> {
        self.total += 1;
        let x = match value {
            None => {
                self.nulls += 1;
                return Ok(());
            }
            Some(Value::Integer(i)) => *i as f64,
            Some(Value::Float(f)) => *f,
            Some(other) => bail!(
                "Numeric collector received non-numeric value {other:?}; \
                 reader output disagrees with the inferred column type"
            ),
        };
        self.n += 1.0;
        if self.n == 1.0 {
            self.mean = x;
            self.min = x;
            self.max = x;
        } else {
            let next_mean = self.mean + (x - self.mean) / self.n;
            self.s += (x - self.mean) * (x - next_mean);
            self.mean = next_mean;
            if x < self.min {
                self.min = x;
            }
            if x > self.max {
                self.max = x;
            }
        }
        Ok(())
    }

    /// Number of non-null values seen.
    pub fn count(&self) -> usize {
        self.n as usize
    }

    pub fn null_count(&self) -> usize {
        self.nulls
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Sample variance with Bessel's correction; 0 for fewer than two values.
    pub fn variance(&self) -> f64 {
        if self.n <= 1.0 {
            0.0
        } else {
            self.s / (self.n - 1.0)
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// One-line summary for the coverage report.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        if self.nulls > 0 {
            if self.nulls == self.total {
                return "ALL NULL".to_string();
            }
            out.push_str(&format!("{} NULL ", self.nulls));
        }
        out.push_str(&format!(
            "min: {}, max: {}, mean: {}, std: {}",
            format_number(self.min),
            format_number(self.max),
            format_number(self.mean),
            format_number(self.std_dev())
        ));
        out
    }
}

/// Exact frequency table for categorical values, plus length bounds over the
/// non-empty observed strings. Not a sketch: every distinct value is kept.
#[derive(Debug, Default)]
pub struct CategoricalFreq {
    counts: HashMap<String, usize>,
    non_empty: usize,
    min_len: Option<usize>,
    max_len: Option<usize>,
    total: usize,
    nulls: usize,
}

impl CategoricalFreq {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one value. Nulls bump the null/total counters; non-string
    /// values are stringified canonically; empty strings count toward the
    /// total but not toward the frequency table or length bounds.
    pub fn push(&mut self, value: Option<&Value>) {
        self.total += 1;
        let Some(value) = value else {
            self.nulls += 1;
            return;
        };
        let text = value.as_display();
        if text.is_empty() {
            return;
        }
        let len = text.len();
        self.min_len = Some(self.min_len.map_or(len, |current| current.min(len)));
        self.max_len = Some(self.max_len.map_or(len, |current| current.max(len)));
        *self.counts.entry(text).or_insert(0) += 1;
        self.non_empty += 1;
    }

    /// Number of non-null, non-empty values seen.
    pub fn count(&self) -> usize {
        self.non_empty
    }

    pub fn null_count(&self) -> usize {
        self.nulls
    }

    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    /// The `n` most (or least) frequent values with their counts. Ordering
    /// is by descending count with a lexicographic secondary key, so equal
    /// counts resolve deterministically. `n` is clamped to the number of
    /// distinct values.
    pub fn top_n(&self, n: usize, want_least: bool) -> Vec<(String, usize)> {
        let ordered = self
            .counts
            .iter()
            .sorted_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)))
            .map(|(value, count)| (value.clone(), *count));
        let distinct = self.counts.len();
        let n = n.min(distinct);
        if want_least {
            ordered.skip(distinct - n).collect()
        } else {
            ordered.take(n).collect()
        }
    }

    /// One-line summary for the coverage report.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        if self.nulls > 0 {
            if self.nulls == self.total {
                return "ALL NULL".to_string();
            }
            out.push_str(&format!("{} NULL ", self.nulls));
        }
        match (self.min_len, self.max_len) {
            (Some(min), Some(max)) => {
                out.push_str(&format!("length min: {min}, max: {max}"));
            }
            _ => out.push_str("EMPTY"),
        }
        out
    }
}

/// Collector dispatch: one per column, chosen from the inferred type.
#[derive(Debug)]
pub enum Collector {
    Numeric(NumericStats),
    Categorical(CategoricalFreq),
}

impl Collector {
    pub fn for_type(datatype: ColumnType) -> Self {
        if datatype.is_numeric() {
            Collector::Numeric(NumericStats::new())
        } else {
            Collector::Categorical(CategoricalFreq::new())
        }
    }

    pub fn push(&mut self, value: Option<&Value>) -> Result<()> {
        match self {
            Collector::Numeric(stats) => stats.push(value),
            Collector::Categorical(freq) => {
                freq.push(value);
                Ok(())
            }
        }
    }

    pub fn count(&self) -> usize {
        match self {
            Collector::Numeric(stats) => stats.count(),
            Collector::Categorical(freq) => freq.count(),
        }
    }

    pub fn summary(&self) -> String {
        match self {
            Collector::Numeric(stats) => stats.summary(),
            Collector::Categorical(freq) => freq.summary(),
        }
    }
}

/// Whole numbers render without a fraction, everything else with four
/// decimal places.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.4}")
    }
}
