//! Avro object-container implementation of the row-stream contract.
//!
//! Schema and rows come straight from the container via `apache-avro`; only
//! top-level record schemas are supported. Avro int/long fields map to the
//! integer column type, float/double to float, and everything else profiles
//! as a string column.

use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use apache_avro::{Reader, Schema, types::Value as AvroValue};
use log::debug;

use crate::{
    data::{Column, ColumnType, Value},
    stream::{RowChannel, RowSender, RowStream},
};

pub struct AvroStream {
    path: PathBuf,
    columns: Vec<Column>,
}

impl AvroStream {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            columns: Vec::new(),
        }
    }

    fn open_reader(&self) -> Result<Reader<'static, BufReader<File>>> {
        let file =
            File::open(&self.path).with_context(|| format!("Opening input file {:?}", self.path))?;
        Reader::new(BufReader::new(file))
            .with_context(|| format!("Reading Avro container {:?}", self.path))
    }
}

impl RowStream for AvroStream {
    fn file_name(&self) -> &str {
        self.path.to_str().unwrap_or("<non-utf8 path>")
    }

    fn initialize(&mut self) -> Result<()> {
        let reader = self.open_reader()?;
        let record = match reader.writer_schema() {
            Schema::Record(record) => record,
            other => bail!(
                "Unsupported Avro schema in {:?}: expected a record, got {:?}",
                self.path,
                other
            ),
        };
        self.columns = record
            .fields
            .iter()
            .map(|field| Column::new(field.name.clone(), field_type(&field.schema)))
            .collect();
        debug!("Avro schema for {:?}: {} field(s)", self.path, self.columns.len());
        Ok(())
    }

    fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn describe(&self) -> String {
        format!("Avro, {} fields", self.columns.len())
    }

    fn into_rows(self: Box<Self>) -> Result<RowChannel> {
        let reader = self.open_reader()?;
        let names: Vec<String> = self.columns.iter().map(|c| c.name.clone()).collect();
        Ok(RowChannel::spawn(move |sender| {
            decode_records(reader, &names, &sender);
        }))
    }
}

/// Maps an Avro field schema to a column type, unwrapping nullable unions to
/// their non-null branch first.
fn field_type(schema: &Schema) -> ColumnType {
    let schema = match schema {
        Schema::Union(union) => union
            .variants()
            .iter()
            .find(|variant| !matches!(variant, Schema::Null))
            .unwrap_or(schema),
        other => other,
    };
    match schema {
        Schema::Int | Schema::Long => ColumnType::Integer,
        Schema::Float | Schema::Double => ColumnType::Float,
        _ => ColumnType::String,
    }
}

fn decode_records(
    reader: Reader<'static, BufReader<File>>,
    names: &[String],
    sender: &RowSender,
) {
    for (idx, record) in reader.enumerate() {
        let row = record
            .map_err(anyhow::Error::from)
            .and_then(|value| record_to_row(value, names))
            .with_context(|| format!("Decoding Avro record {}", idx + 1));
        let failed = row.is_err();
        if sender.send(row).is_err() || failed {
            return;
        }
    }
}

fn record_to_row(value: AvroValue, names: &[String]) -> Result<crate::data::Row> {
    let AvroValue::Record(pairs) = value else {
        bail!("Expected an Avro record value, got {value:?}");
    };
    let mut row = vec![None; names.len()];
    for (name, field_value) in pairs {
        if let Some(position) = names.iter().position(|n| *n == name) {
            row[position] = to_cell(field_value);
        }
    }
    Ok(row)
}

/// Converts one Avro field value into a typed cell. Avro nulls become nulls,
/// scalars keep their kind, and anything else is stringified.
fn to_cell(value: AvroValue) -> Option<Value> {
    match value {
        AvroValue::Null => None,
        AvroValue::Union(_, inner) => to_cell(*inner),
        AvroValue::Int(i) => Some(Value::Integer(i64::from(i))),
        AvroValue::Long(l) => Some(Value::Integer(l)),
        AvroValue::Float(f) => Some(Value::Float(f64::from(f))),
        AvroValue::Double(d) => Some(Value::Float(d)),
        AvroValue::String(s) => Some(Value::String(s)),
        AvroValue::Boolean(b) => Some(Value::String(b.to_string())),
        AvroValue::Enum(_, symbol) => Some(Value::String(symbol)),
        other => Some(Value::String(format!("{other:?}"))),
    }
}
