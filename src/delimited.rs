//! Delimited-text (CSV/TSV) implementation of the row-stream contract.
//!
//! Initialization samples the first few raw records and delegates header and
//! type detection to the sniffer; streaming re-opens the file and decodes
//! every record into a typed row on a producer thread.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, ensure};
use encoding_rs::Encoding;
use log::debug;

use crate::{
    data::{Column, ColumnType, Row, Value},
    io_utils, sniff,
    stream::{RowChannel, RowSender, RowStream},
};

/// Number of raw records sampled for sniffing. Shorter files are allowed
/// down to the sniffer's minimum of two rows.
pub const SAMPLE_ROWS: usize = 10;

pub struct DelimitedStream {
    path: PathBuf,
    delimiter: u8,
    encoding: &'static Encoding,
    has_header: bool,
    columns: Vec<Column>,
}

impl DelimitedStream {
    pub fn new(path: &Path, delimiter: u8, encoding: &'static Encoding) -> Self {
        Self {
            path: path.to_path_buf(),
            delimiter,
            encoding,
            has_header: false,
            columns: Vec::new(),
        }
    }

    fn read_sample(&self) -> Result<Vec<Vec<String>>> {
        let mut reader = io_utils::open_csv_reader_from_path(&self.path, self.delimiter)?;
        let mut sample = Vec::with_capacity(SAMPLE_ROWS);
        for (idx, record) in reader.byte_records().take(SAMPLE_ROWS).enumerate() {
            let record = record.with_context(|| format!("Sampling row {}", idx + 1))?;
            sample.push(io_utils::decode_record(&record, self.encoding)?);
        }
        ensure!(
            sample.len() >= 2,
            "{:?} has only {} row(s); at least 2 are required to infer a schema",
            self.path,
            sample.len()
        );
        Ok(sample)
    }
}

impl RowStream for DelimitedStream {
    fn file_name(&self) -> &str {
        self.path.to_str().unwrap_or("<non-utf8 path>")
    }

    fn initialize(&mut self) -> Result<()> {
        let sample = self
            .read_sample()
            .with_context(|| format!("Sampling {:?}", self.path))?;
        let sniffed = sniff::sniff_sample(&sample)
            .with_context(|| format!("Inferring schema from {:?}", self.path))?;
        debug!(
            "Sniffed {:?}: header={}, types={:?}",
            self.path, sniffed.has_header, sniffed.types
        );
        self.has_header = sniffed.has_header;
        self.columns = sniffed
            .fields
            .into_iter()
            .zip(sniffed.types)
            .map(|(name, datatype)| Column::new(name, datatype))
            .collect();
        Ok(())
    }

    fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn describe(&self) -> String {
        format!(
            "CSV, {} columns, delimited with '{}'",
            self.columns.len(),
            io_utils::printable_delimiter(self.delimiter)
        )
    }

    fn into_rows(self: Box<Self>) -> Result<RowChannel> {
        let reader = io_utils::open_csv_reader_from_path(&self.path, self.delimiter)?;
        let types: Vec<ColumnType> = self.columns.iter().map(|c| c.datatype).collect();
        let has_header = self.has_header;
        let encoding = self.encoding;
        Ok(RowChannel::spawn(move |sender| {
            decode_records(reader, &types, has_header, encoding, &sender);
        }))
    }
}

fn decode_records<R: std::io::Read>(
    mut reader: csv::Reader<R>,
    types: &[ColumnType],
    has_header: bool,
    encoding: &'static Encoding,
    sender: &RowSender,
) {
    let skip = usize::from(has_header);
    for (idx, record) in reader.byte_records().skip(skip).enumerate() {
        let line = idx + skip + 1;
        let row = record
            .map_err(anyhow::Error::from)
            .and_then(|record| io_utils::decode_record(&record, encoding))
            .and_then(|decoded| parse_typed_row(types, &decoded))
            .with_context(|| format!("Reading row {line}"));
        let failed = row.is_err();
        if sender.send(row).is_err() || failed {
            // Consumer hung up, or the error above ends the stream.
            return;
        }
    }
}

/// Converts one decoded record into a typed row. Empty cells become nulls;
/// a non-empty cell that does not parse under its column's inferred type is
/// a decode error and terminates the stream.
fn parse_typed_row(types: &[ColumnType], record: &[String]) -> Result<Row> {
    ensure!(
        record.len() == types.len(),
        "Record has {} field(s), expected {}",
        record.len(),
        types.len()
    );
    record
        .iter()
        .zip(types)
        .map(|(cell, datatype)| parse_cell(cell, *datatype))
        .collect()
}

fn parse_cell(cell: &str, datatype: ColumnType) -> Result<Option<Value>> {
    if cell.is_empty() {
        return Ok(None);
    }
    let value = match datatype {
        ColumnType::Integer => Value::Integer(
            cell.parse()
                .map_err(|_| anyhow!("Failed to parse '{cell}' as integer"))?,
        ),
        ColumnType::Float => Value::Float(
            cell.parse()
                .map_err(|_| anyhow!("Failed to parse '{cell}' as float"))?,
        ),
        _ => Value::String(cell.to_string()),
    };
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::UTF_8;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write");
        file
    }

    fn open(file: &NamedTempFile) -> Box<DelimitedStream> {
        let mut stream = Box::new(DelimitedStream::new(file.path(), b',', UTF_8));
        stream.initialize().expect("initialize");
        stream
    }

    #[test]
    fn initialize_infers_columns_from_sample() {
        let file = write_file("id,name,score\n1,alice,9.5\n2,bob,7.0\n");
        let stream = open(&file);
        let columns = stream.columns();
        assert_eq!(columns.len(), 3);
        assert_eq!(columns[0], Column::new("id", ColumnType::Integer));
        assert_eq!(columns[1], Column::new("name", ColumnType::String));
        assert_eq!(columns[2], Column::new("score", ColumnType::Float));
        assert!(stream.describe().starts_with("CSV, 3 columns"));
    }

    #[test]
    fn rows_are_typed_and_header_is_skipped() {
        let file = write_file("id,name\n1,alice\n2,bob\n");
        let rows: Vec<Row> = open(&file)
            .into_rows()
            .expect("rows")
            .map(|r| r.expect("row"))
            .collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], Some(Value::Integer(1)));
        assert_eq!(rows[1][1], Some(Value::String("bob".into())));
    }

    #[test]
    fn headerless_file_keeps_first_row_as_data() {
        let file = write_file("1,alice\n2,bob\n");
        let stream = open(&file);
        assert_eq!(stream.columns()[0].name, "c_0");
        let rows: Vec<Row> = stream
            .into_rows()
            .expect("rows")
            .map(|r| r.expect("row"))
            .collect();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn empty_cells_become_nulls() {
        let file = write_file("id,score\n1,2.5\n2,\n3,4.5\n");
        let rows: Vec<Row> = open(&file)
            .into_rows()
            .expect("rows")
            .map(|r| r.expect("row"))
            .collect();
        assert_eq!(rows[1][1], None);
    }

    #[test]
    fn unparsable_typed_cell_is_a_fatal_decode_error() {
        // The bad cell sits past the sample window, so the column is still
        // inferred as integer.
        let mut contents = String::from("id\n");
        for i in 1..=12 {
            contents.push_str(&format!("{i}\n"));
        }
        contents.push_str("not-a-number\n");
        let file = write_file(&contents);
        let result: Result<Vec<Row>> = open(&file).into_rows().expect("rows").collect();
        let err = result.expect_err("decode error");
        assert!(format!("{err:#}").contains("as integer"), "got: {err:#}");
    }

    #[test]
    fn single_row_file_is_rejected_at_initialize() {
        let file = write_file("only,one,row\n");
        let mut stream = DelimitedStream::new(file.path(), b',', UTF_8);
        assert!(stream.initialize().is_err());
    }

    #[test]
    fn tab_delimited_input_is_supported() {
        let file = write_file("id\tname\n1\talice\n2\tbob\n");
        let mut stream = Box::new(DelimitedStream::new(file.path(), b'\t', UTF_8));
        stream.initialize().expect("initialize");
        assert_eq!(stream.columns().len(), 2);
        let rows: Vec<Row> = stream
            .into_rows()
            .expect("rows")
            .map(|r| r.expect("row"))
            .collect();
        assert_eq!(rows[0][0], Some(Value::Integer(1)));
    }
}
