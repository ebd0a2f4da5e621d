//! Stable, type-aware row sorting.

use crate::error::{TransformError, TransformResult};
use crate::types::{DataSet, SortDirection};

use super::compare::sort_key;

/// Row permutation that sorts `column` in `direction`.
///
/// The sort is stable in both directions: rows with equal keys keep their original order.
pub fn sort_permutation(
    dataset: &DataSet,
    column: &str,
    direction: SortDirection,
) -> TransformResult<Vec<usize>> {
    let field = dataset
        .field(column)
        .ok_or_else(|| TransformError::ColumnNotFound(column.to_string()))?;

    let data_type = field.data_type();
    let keys: Vec<_> = field.contents().map(|raw| sort_key(data_type, raw)).collect();

    let mut perm: Vec<usize> = (0..keys.len()).collect();
    match direction {
        SortDirection::Ascending => perm.sort_by(|&a, &b| keys[a].cmp(&keys[b])),
        SortDirection::Descending => perm.sort_by(|&a, &b| keys[b].cmp(&keys[a])),
    }
    Ok(perm)
}

/// Returns a new [`DataSet`] with every field reordered by the sort of `column`.
pub fn sort_by(dataset: &DataSet, column: &str, direction: SortDirection) -> TransformResult<DataSet> {
    let perm = sort_permutation(dataset, column, direction)?;
    Ok(dataset.take_rows(&perm))
}
