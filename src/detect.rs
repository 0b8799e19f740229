//! File-format detection and reader construction.
//!
//! Detection itself is pure: magic bytes win over extensions, and an explicit
//! delimiter forces delimited-text handling. `open_stream` performs the one
//! header-bytes read and hands back the matching reader.

use std::{fmt, fs::File, io::Read, path::Path};

use anyhow::{Context, Result, bail};
use encoding_rs::Encoding;

use crate::{avro::AvroStream, delimited::DelimitedStream, stream::RowStream};

pub const MAGIC_PARQUET: &[u8] = b"PAR1";
pub const MAGIC_AVRO: &[u8] = &[b'O', b'b', b'j', 1];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Unknown,
    Avro,
    Delimited,
    Json,
    Parquet,
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileFormat::Unknown => "unknown",
            FileFormat::Avro => "avro",
            FileFormat::Delimited => "delimited text",
            FileFormat::Json => "json",
            FileFormat::Parquet => "parquet",
        };
        write!(f, "{name}")
    }
}

/// Classifies a file from its first bytes and name. Binary magics take
/// precedence; an explicit delimiter assumes delimited text.
pub fn detect_format(header: &[u8], file_name: &str, delimiter_given: bool) -> FileFormat {
    if header.starts_with(MAGIC_PARQUET) {
        return FileFormat::Parquet;
    }
    if header.starts_with(MAGIC_AVRO) {
        return FileFormat::Avro;
    }
    let lowered = file_name.to_ascii_lowercase();
    if delimiter_given || lowered.ends_with(".csv") || lowered.ends_with(".tsv") {
        return FileFormat::Delimited;
    }
    if lowered.ends_with(".json") {
        return FileFormat::Json;
    }
    FileFormat::Unknown
}

/// Detects the format of `path` and constructs the matching row stream.
/// Unsupported and unrecognized formats are configuration errors.
pub fn open_stream(
    path: &Path,
    delimiter: Option<u8>,
    encoding: &'static Encoding,
) -> Result<Box<dyn RowStream>> {
    let header = read_header_bytes(path)?;
    let file_name = path.to_str().unwrap_or_default();
    match detect_format(&header, file_name, delimiter.is_some()) {
        FileFormat::Delimited => {
            let delimiter = crate::io_utils::resolve_input_delimiter(path, delimiter);
            Ok(Box::new(DelimitedStream::new(path, delimiter, encoding)))
        }
        FileFormat::Avro => Ok(Box::new(AvroStream::new(path))),
        FileFormat::Unknown => bail!("Unknown file format for {path:?}"),
        unsupported => bail!("Unsupported file format '{unsupported}' for {path:?}"),
    }
}

fn read_header_bytes(path: &Path) -> Result<[u8; 4]> {
    let mut file = File::open(path).with_context(|| format!("Opening input file {path:?}"))?;
    let mut header = [0u8; 4];
    file.read_exact(&mut header)
        .with_context(|| format!("Reading file header of {path:?}"))?;
    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_bytes_override_extensions() {
        assert_eq!(detect_format(b"PAR1", "data.csv", false), FileFormat::Parquet);
        assert_eq!(
            detect_format(&[b'O', b'b', b'j', 1], "data.csv", false),
            FileFormat::Avro
        );
    }

    #[test]
    fn extension_and_delimiter_select_delimited() {
        assert_eq!(detect_format(b"id,n", "data.csv", false), FileFormat::Delimited);
        assert_eq!(detect_format(b"id\tn", "data.TSV", false), FileFormat::Delimited);
        assert_eq!(detect_format(b"id;n", "data.dat", true), FileFormat::Delimited);
    }

    #[test]
    fn remaining_formats_fall_through() {
        assert_eq!(detect_format(b"{\"a\"", "data.json", false), FileFormat::Json);
        assert_eq!(detect_format(b"abcd", "data.bin", false), FileFormat::Unknown);
    }
}
