use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Generate coverage and data-validity reports for tabular files",
    long_about = None
)]
pub struct Cli {
    /// Input file to profile (CSV, TSV, or Avro; detected by magic bytes and extension)
    pub input: PathBuf,
    /// Keep report columns in original file order instead of sorting alphabetically
    #[arg(long = "no-sort")]
    pub no_sort: bool,
    /// Number of sample values to include per categorical column
    #[arg(short = 'm', long = "samples", default_value_t = 5)]
    pub samples: usize,
    /// Report the least frequent values instead of the most frequent
    #[arg(long = "least-frequent")]
    pub least_frequent: bool,
    /// Field delimiter for delimited text input (supports ',', 'tab', ';', '|')
    #[arg(short = 'd', long = "delimiter", value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of delimited text input (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Emit the report as JSON instead of formatted tables
    #[arg(long)]
    pub json: bool,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
