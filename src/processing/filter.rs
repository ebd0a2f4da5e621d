//! Row filtering for [`crate::types::DataSet`].

use std::cmp::Ordering;

use crate::error::{TransformError, TransformResult};
use crate::types::{DataSet, FilterCondition, Relation};

use super::compare::compare_typed;

/// Returns a new [`DataSet`] containing only rows whose `condition.source_header_name` cell
/// satisfies the relation against `condition.condition`.
///
/// Cells are compared with the column's type (see [`compare_typed`]); the kept rows are
/// renumbered `0..k` across all fields.
pub fn filter_by(dataset: &DataSet, condition: &FilterCondition) -> TransformResult<DataSet> {
    let field = dataset
        .field(&condition.source_header_name)
        .ok_or_else(|| TransformError::ColumnNotFound(condition.source_header_name.clone()))?;

    let keep: fn(Ordering) -> bool = match condition.relation {
        Relation::Equals => Ordering::is_eq,
        Relation::NotEquals => Ordering::is_ne,
        Relation::LessThan => Ordering::is_lt,
        Relation::GreaterThan => Ordering::is_gt,
        Relation::InRange => {
            return Err(TransformError::UnsupportedRelation("InRange".to_string()));
        }
    };

    let data_type = field.data_type();
    let rows: Vec<usize> = field
        .data
        .iter()
        .enumerate()
        .filter(|(_, cell)| keep(compare_typed(data_type, &cell.content, &condition.condition)))
        .map(|(row, _)| row)
        .collect();

    Ok(dataset.take_rows(&rows))
}
