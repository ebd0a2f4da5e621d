//! Dataset → delimited text.
//!
//! The header row holds the column names. Data rows are produced by walking row indices
//! `0, 1, 2, ...` and emitting, for each field, its cell at that index when present; output stops
//! at the first index where no field has a cell. Lines end with `\n`.

use std::io::{self, Write};
use std::path::Path;

use crate::error::{IngestionError, IngestionResult};
use crate::types::DataSet;

use super::csv::DEFAULT_DELIMITER;

fn writer_builder(delimiter: u8) -> csv::WriterBuilder {
    let mut builder = csv::WriterBuilder::new();
    builder
        .flexible(true)
        .delimiter(delimiter)
        .terminator(csv::Terminator::Any(b'\n'));
    builder
}

/// Write `dataset` to `writer`.
pub fn write_csv<W: Write>(dataset: &DataSet, writer: W, delimiter: u8) -> IngestionResult<()> {
    if dataset.fields.is_empty() {
        return Ok(());
    }

    let mut wtr = writer_builder(delimiter).from_writer(writer);
    wtr.write_record(dataset.header_names())?;

    for row in 0.. {
        let record: Vec<&str> = dataset
            .fields
            .iter()
            .filter_map(|f| f.data.get(row))
            .map(|c| c.content.as_str())
            .collect();
        if record.is_empty() {
            break;
        }
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Write `dataset` to a file at `path`, creating or truncating it.
pub fn write_csv_to_path(dataset: &DataSet, path: impl AsRef<Path>, delimiter: u8) -> IngestionResult<()> {
    let file = std::fs::File::create(path)?;
    write_csv(dataset, io::BufWriter::new(file), delimiter)
}

/// Render `dataset` as comma-separated text.
pub fn to_csv_string(dataset: &DataSet) -> IngestionResult<String> {
    let mut buf = Vec::new();
    write_csv(dataset, &mut buf, DEFAULT_DELIMITER)?;
    String::from_utf8(buf).map_err(|e| IngestionError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}

#[cfg(test)]
mod tests {
    use super::to_csv_string;
    use crate::types::{DataSet, DataType, Field, Header};

    #[test]
    fn writes_header_then_rows() {
        let ds = DataSet::new(vec![
            Field::from_values(Header::new("Name", DataType::String, 0), ["Alice", "Bob"]),
            Field::from_values(Header::new("Age", DataType::Number, 1), ["30", "25"]),
        ]);
        assert_eq!(to_csv_string(&ds).unwrap(), "Name,Age\nAlice,30\nBob,25\n");
    }

    #[test]
    fn ragged_columns_emit_only_present_cells() {
        let ds = DataSet::new(vec![
            Field::from_values(Header::new("a", DataType::Number, 0), ["1", "2", "3"]),
            Field::from_values(Header::new("b", DataType::Number, 1), ["4"]),
        ]);
        assert_eq!(to_csv_string(&ds).unwrap(), "a,b\n1,4\n2\n3\n");
    }

    #[test]
    fn no_fields_is_empty_text() {
        assert_eq!(to_csv_string(&DataSet::default()).unwrap(), "");
    }
}
