//! Delimited-text ingestion with per-column type inference.
//!
//! Ingestion runs in two passes over the records:
//!
//! 1. infer each column's [`DataType`] from the first data row only (`Number`, then `Date`, then
//!    `Bool`, falling back to `String`);
//! 2. build one [`Field`] per header with contiguous cell indices.
//!
//! Short rows are accepted; a column simply has no cell for that row.

use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::error::{IngestionError, IngestionResult};
use crate::processing::compare::{parse_bool, parse_date, parse_float};
use crate::types::{Cell, DataSet, DataType, Field, Header};

/// Default field delimiter.
pub const DEFAULT_DELIMITER: u8 = b',';

/// Validates a user-supplied delimiter character.
///
/// The delimiter must be a single ASCII byte other than a quote or a line break.
pub fn delimiter_from_char(c: char) -> IngestionResult<u8> {
    let invalid = |message: &str| IngestionError::InvalidDelimiter {
        delimiter: c.to_string(),
        message: message.to_string(),
    };
    if !c.is_ascii() {
        return Err(invalid("delimiter must be a single ASCII character"));
    }
    let byte = c as u8;
    check_delimiter(byte).map_err(|_| invalid("quotes and line breaks cannot delimit fields"))?;
    Ok(byte)
}

fn check_delimiter(byte: u8) -> IngestionResult<()> {
    match byte {
        b'"' | b'\n' | b'\r' => Err(IngestionError::InvalidDelimiter {
            delimiter: (byte as char).to_string(),
            message: "quotes and line breaks cannot delimit fields".to_string(),
        }),
        _ => Ok(()),
    }
}

fn reader_builder(delimiter: u8) -> IngestionResult<csv::ReaderBuilder> {
    check_delimiter(delimiter)?;
    let mut builder = csv::ReaderBuilder::new();
    builder.has_headers(true).flexible(true).delimiter(delimiter);
    Ok(builder)
}

/// Ingest a delimited file into an in-memory [`DataSet`].
pub fn ingest_csv_from_path(path: impl AsRef<Path>, delimiter: u8) -> IngestionResult<DataSet> {
    let mut rdr = reader_builder(delimiter)?.from_path(path)?;
    ingest_csv_from_reader(&mut rdr)
}

/// Ingest delimited text held in memory.
pub fn ingest_csv_from_str(text: &str, delimiter: u8) -> IngestionResult<DataSet> {
    let mut rdr = reader_builder(delimiter)?.from_reader(text.as_bytes());
    ingest_csv_from_reader(&mut rdr)
}

/// Ingest from an existing CSV reader. The reader must be configured with headers.
pub fn ingest_csv_from_reader<R: Read>(rdr: &mut csv::Reader<R>) -> IngestionResult<DataSet> {
    let names: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    if names.is_empty() || names.iter().all(|n| n.is_empty()) {
        return Err(IngestionError::MissingHeader);
    }

    let records = rdr.records().collect::<Result<Vec<_>, _>>()?;

    // Pass 1: types from the first data row.
    let first = records.first();
    let headers: Vec<Header> = names
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            let data_type = first
                .and_then(|r| r.get(i))
                .map(infer_type)
                .unwrap_or(DataType::String);
            Header::new(name, data_type, i)
        })
        .collect();

    // Pass 2: columns.
    let fields: Vec<Field> = headers
        .into_iter()
        .map(|header| {
            let col = header.index;
            let data = records
                .iter()
                .filter_map(|r| r.get(col))
                .enumerate()
                .map(|(row, raw)| Cell::new(raw, row))
                .collect();
            Field { header, data }
        })
        .collect();

    let ds = DataSet::new(fields);
    debug!(
        columns = ds.field_count(),
        rows = ds.row_count(),
        "ingested delimited text"
    );
    Ok(ds)
}

/// Infers a column type from one raw value.
pub fn infer_type(raw: &str) -> DataType {
    if parse_float(raw).is_some() {
        DataType::Number
    } else if parse_date(raw).is_some() {
        DataType::Date
    } else if parse_bool(raw).is_some() {
        DataType::Bool
    } else {
        DataType::String
    }
}

#[cfg(test)]
mod tests {
    use super::{delimiter_from_char, infer_type, ingest_csv_from_str};
    use crate::error::IngestionError;
    use crate::types::DataType;

    #[test]
    fn infers_types_from_first_row() {
        assert_eq!(infer_type("42"), DataType::Number);
        assert_eq!(infer_type("4.5"), DataType::Number);
        assert_eq!(infer_type("2024-03-01"), DataType::Date);
        assert_eq!(infer_type("True"), DataType::Bool);
        assert_eq!(infer_type("hello"), DataType::String);
        assert_eq!(infer_type(""), DataType::String);
    }

    #[test]
    fn later_rows_do_not_change_the_type() {
        let ds = ingest_csv_from_str("a,b\n1,x\nnope,2\n", b',').unwrap();
        assert_eq!(ds.fields[0].data_type(), DataType::Number);
        assert_eq!(ds.fields[1].data_type(), DataType::String);
        assert_eq!(ds.fields[0].contents().collect::<Vec<_>>(), vec!["1", "nope"]);
    }

    #[test]
    fn header_only_input_is_string_typed_and_empty() {
        let ds = ingest_csv_from_str("a;b\n", b';').unwrap();
        assert_eq!(ds.header_names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(ds.row_count(), 0);
        assert_eq!(ds.fields[1].data_type(), DataType::String);
    }

    #[test]
    fn short_rows_leave_columns_ragged() {
        let ds = ingest_csv_from_str("a,b\n1,2\n3\n", b',').unwrap();
        assert_eq!(ds.fields[0].len(), 2);
        assert_eq!(ds.fields[1].len(), 1);
        assert_eq!(ds.fields[0].data[1].index, 1);
    }

    #[test]
    fn empty_input_has_no_header() {
        assert!(matches!(
            ingest_csv_from_str("", b',').unwrap_err(),
            IngestionError::MissingHeader
        ));
    }

    #[test]
    fn rejects_bad_delimiters() {
        assert_eq!(delimiter_from_char('\t').unwrap(), b'\t');
        assert!(delimiter_from_char('"').is_err());
        assert!(delimiter_from_char('§').is_err());
        assert!(ingest_csv_from_str("a\n1\n", b'\n').is_err());
    }
}
