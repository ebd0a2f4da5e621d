//! Core columnar data model.
//!
//! A [`DataSet`] is an ordered list of [`Field`]s (columns). Each field owns its [`Cell`]s and
//! shares a [`Header`] describing the column name and [`DataType`]. Cell contents are kept as
//! raw text; parsing happens only when a transformation needs to compare values.
//!
//! [`SchemaField`] is a field without data. A `Vec<SchemaField>` describes the shape of a
//! dataset and is what the query builder threads through its preview path.

use std::fmt;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Logical column type, inferred once from the first data row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Bool,
    String,
    Number,
    Date,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DataType::Bool => "Bool",
            DataType::String => "String",
            DataType::Number => "Number",
            DataType::Date => "Date",
        };
        f.write_str(s)
    }
}

/// Column identity shared by every cell of a [`Field`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Header {
    /// Column name, usually the first CSV row.
    pub name: String,
    /// Column type.
    pub data_type: DataType,
    /// Column position in the source file.
    pub index: usize,
}

impl Header {
    pub fn new(name: impl Into<String>, data_type: DataType, index: usize) -> Self {
        Self {
            name: name.into(),
            data_type,
            index,
        }
    }
}

/// Raw cell content plus its current row position within the column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub content: String,
    pub index: usize,
}

impl Cell {
    pub fn new(content: impl Into<String>, index: usize) -> Self {
        Self {
            content: content.into(),
            index,
        }
    }
}

/// A column without data. Used to preview what a transformation does to the dataset shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    pub header: Header,
}

impl SchemaField {
    pub fn new(header: Header) -> Self {
        Self { header }
    }

    pub fn name(&self) -> &str {
        &self.header.name
    }
}

/// A full column: header plus its cells in row order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub header: Header,
    pub data: Vec<Cell>,
}

impl Field {
    /// Build a field from raw values, numbering cells `0..n`.
    pub fn from_values<I, S>(header: Header, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let data = values
            .into_iter()
            .enumerate()
            .map(|(i, v)| Cell::new(v, i))
            .collect();
        Self { header, data }
    }

    pub fn name(&self) -> &str {
        &self.header.name
    }

    pub fn data_type(&self) -> DataType {
        self.header.data_type
    }

    /// Number of cells in the column.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterate raw cell contents in row order.
    pub fn contents(&self) -> impl Iterator<Item = &str> {
        self.data.iter().map(|c| c.content.as_str())
    }

    /// Header-only projection of this field.
    pub fn schema_field(&self) -> SchemaField {
        SchemaField::new(self.header.clone())
    }

    /// New field holding the cells at `rows` (in that order), renumbered contiguously.
    ///
    /// Rows this field has no cell for are skipped, so a short column stays short.
    pub fn take_rows(&self, rows: &[usize]) -> Field {
        let data = rows
            .iter()
            .filter_map(|&row| self.data.get(row))
            .enumerate()
            .map(|(new_index, cell)| Cell::new(cell.content.clone(), new_index))
            .collect();
        Field {
            header: self.header.clone(),
            data,
        }
    }
}

/// In-memory columnar dataset.
///
/// Datasets are never mutated by transformations; every transformation returns a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSet {
    pub fields: Vec<Field>,
}

impl DataSet {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Number of rows (the longest column; all columns agree after a transformation).
    pub fn row_count(&self) -> usize {
        self.fields.iter().map(Field::len).max().unwrap_or(0)
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Returns the index of a field by name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.header.name == name)
    }

    /// Returns the field with the given name, if present.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.header.name == name)
    }

    /// Iterate column names in order.
    pub fn header_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.header.name.as_str())
    }

    /// Header-only projection of every field.
    pub fn schema(&self) -> Vec<SchemaField> {
        self.fields.iter().map(Field::schema_field).collect()
    }

    /// Re-slice every field by the row permutation/selection `rows`.
    ///
    /// For a rectangular dataset the result has `rows.len()` rows, each column renumbered
    /// `0..rows.len()`.
    pub fn take_rows(&self, rows: &[usize]) -> DataSet {
        let fields = self.fields.par_iter().map(|f| f.take_rows(rows)).collect();
        DataSet { fields }
    }

    /// Raw contents of row `row`, one entry per field (`None` where a column is shorter).
    pub fn row(&self, row: usize) -> Vec<Option<&str>> {
        self.fields
            .iter()
            .map(|f| f.data.get(row).map(|c| c.content.as_str()))
            .collect()
    }
}

/// Sort order for [`crate::transform::Transformation::SortBy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Comparison relation of a [`FilterCondition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relation {
    Equals,
    NotEquals,
    LessThan,
    GreaterThan,
    /// Declared for completeness; evaluating it fails.
    InRange,
}

/// Per-group aggregation applied to non-key columns by group-by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Aggregation {
    /// Reserved; never offered as a choice and not executable.
    GroupKey,
    CountAll,
    CountDistinct,
    ConcatValues,
    Sum,
    Mean,
}

impl Aggregation {
    /// Whether the aggregated columns become numeric.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Aggregation::CountAll | Aggregation::CountDistinct | Aggregation::Sum | Aggregation::Mean
        )
    }
}

/// `source_header_name <relation> condition`, evaluated with the column's type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCondition {
    pub source_header_name: String,
    pub relation: Relation,
    pub condition: String,
}

impl FilterCondition {
    pub fn new(
        source_header_name: impl Into<String>,
        relation: Relation,
        condition: impl Into<String>,
    ) -> Self {
        Self {
            source_header_name: source_header_name.into(),
            relation,
            condition: condition.into(),
        }
    }
}
