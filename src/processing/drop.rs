//! Column removal for [`crate::types::DataSet`].

use std::collections::BTreeSet;

use crate::error::{TransformError, TransformResult};
use crate::types::{DataSet, SchemaField};

/// Returns a new [`DataSet`] without the fields named in `columns`.
///
/// Row order and count are unchanged. Every name must exist in the dataset; an empty set is the
/// identity.
pub fn drop_columns(dataset: &DataSet, columns: &BTreeSet<String>) -> TransformResult<DataSet> {
    if let Some(missing) = columns.iter().find(|c| dataset.index_of(c).is_none()) {
        return Err(TransformError::ColumnNotFound(missing.clone()));
    }

    let fields = dataset
        .fields
        .iter()
        .filter(|f| !columns.contains(&f.header.name))
        .cloned()
        .collect();
    Ok(DataSet::new(fields))
}

/// Schema-only counterpart of [`drop_columns`]. Unknown names are ignored.
pub fn drop_schema_columns(schema: Vec<SchemaField>, columns: &BTreeSet<String>) -> Vec<SchemaField> {
    schema
        .into_iter()
        .filter(|f| !columns.contains(&f.header.name))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::{drop_columns, drop_schema_columns};
    use crate::error::TransformError;
    use crate::types::{DataSet, DataType, Field, Header};

    fn sample_dataset() -> DataSet {
        DataSet::new(vec![
            Field::from_values(Header::new("id", DataType::Number, 0), ["1", "2"]),
            Field::from_values(Header::new("name", DataType::String, 1), ["a", "b"]),
            Field::from_values(Header::new("active", DataType::Bool, 2), ["true", "false"]),
        ])
    }

    #[test]
    fn drops_named_columns_only() {
        let ds = sample_dataset();
        let cols: BTreeSet<String> = ["name".to_string()].into();

        let out = drop_columns(&ds, &cols).unwrap();
        assert_eq!(out.header_names().collect::<Vec<_>>(), vec!["id", "active"]);
        assert_eq!(out.row_count(), 2);
        assert_eq!(out.fields[0], ds.fields[0]);
    }

    #[test]
    fn empty_set_is_identity() {
        let ds = sample_dataset();
        let out = drop_columns(&ds, &BTreeSet::new()).unwrap();
        assert_eq!(out, ds);
    }

    #[test]
    fn missing_column_is_an_error() {
        let ds = sample_dataset();
        let cols: BTreeSet<String> = ["nope".to_string()].into();
        assert_eq!(
            drop_columns(&ds, &cols).unwrap_err(),
            TransformError::ColumnNotFound("nope".to_string())
        );
    }

    #[test]
    fn schema_drop_ignores_unknown_names() {
        let ds = sample_dataset();
        let cols: BTreeSet<String> = ["id".to_string(), "nope".to_string()].into();
        let out = drop_schema_columns(ds.schema(), &cols);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].name(), "name");
    }
}
