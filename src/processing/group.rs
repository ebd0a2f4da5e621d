//! Group-by with per-group aggregation.

use std::collections::{HashMap, HashSet};

use crate::error::{TransformError, TransformResult};
use crate::types::{Aggregation, Cell, DataSet, DataType, Field, SchemaField};

use super::compare::parse_float;

/// Groups rows by the raw content of `target`, in first-seen order.
///
/// - The `target` column becomes one row per distinct key.
/// - Every other column becomes one aggregated value per group (see [`aggregate`]).
///
/// Headers are carried over unchanged.
pub fn group_by(dataset: &DataSet, target: &str, aggregation: Aggregation) -> TransformResult<DataSet> {
    if aggregation == Aggregation::GroupKey {
        return Err(TransformError::UnsupportedAggregation("GroupKey".to_string()));
    }

    let key_field = dataset
        .field(target)
        .ok_or_else(|| TransformError::ColumnNotFound(target.to_string()))?;

    let groups = group_rows(key_field);

    let fields = dataset
        .fields
        .iter()
        .map(|field| {
            let values: Vec<String> = if field.header.name == target {
                groups.iter().map(|(key, _)| key.to_string()).collect()
            } else {
                groups
                    .iter()
                    .map(|(_, rows)| {
                        let cells = rows.iter().filter_map(|&r| field.data.get(r));
                        aggregate(aggregation, cells)
                    })
                    .collect()
            };
            Field::from_values(field.header.clone(), values)
        })
        .collect();

    Ok(DataSet::new(fields))
}

/// Distinct keys of `field` with the rows holding each key, in first-seen order.
fn group_rows(field: &Field) -> Vec<(&str, Vec<usize>)> {
    let mut order: Vec<(&str, Vec<usize>)> = Vec::new();
    let mut slot: HashMap<&str, usize> = HashMap::new();
    for (row, content) in field.contents().enumerate() {
        match slot.get(content) {
            Some(&i) => order[i].1.push(row),
            None => {
                slot.insert(content, order.len());
                order.push((content, vec![row]));
            }
        }
    }
    order
}

/// Aggregate one group's cells to a single raw value.
///
/// - `CountAll`: number of cells.
/// - `CountDistinct`: number of distinct raw contents.
/// - `ConcatValues`: contents joined with `", "`, in row order.
/// - `Sum`: sum of cells that parse as numbers; others are skipped.
/// - `Mean`: mean of cells that parse as numbers, two decimals (`0.00` when none parse).
///
/// `GroupKey` has no aggregate value and yields an empty string.
pub fn aggregate<'a, I>(aggregation: Aggregation, cells: I) -> String
where
    I: IntoIterator<Item = &'a Cell>,
{
    let contents = cells.into_iter().map(|c| c.content.as_str());
    match aggregation {
        Aggregation::CountAll => contents.count().to_string(),
        Aggregation::CountDistinct => contents.collect::<HashSet<_>>().len().to_string(),
        Aggregation::ConcatValues => contents.collect::<Vec<_>>().join(", "),
        Aggregation::Sum => {
            let sum = contents.filter_map(parse_float).fold(0.0, |acc, v| acc + v);
            format!("{sum}")
        }
        Aggregation::Mean => {
            let nums: Vec<f64> = contents.filter_map(parse_float).collect();
            let mean = if nums.is_empty() {
                0.0
            } else {
                nums.iter().fold(0.0, |acc, v| acc + v) / nums.len() as f64
            };
            format!("{mean:.2}")
        }
        Aggregation::GroupKey => String::new(),
    }
}

/// Schema-only counterpart of [`group_by`].
///
/// Numeric aggregations retype every non-key column to `Number`; `ConcatValues` retypes them to
/// `String`. The key column keeps its type.
pub fn group_schema(
    schema: Vec<SchemaField>,
    target: &str,
    aggregation: Aggregation,
) -> TransformResult<Vec<SchemaField>> {
    if aggregation == Aggregation::GroupKey {
        return Err(TransformError::UnsupportedAggregation("GroupKey".to_string()));
    }
    let retype = if aggregation.is_numeric() {
        DataType::Number
    } else {
        DataType::String
    };

    Ok(schema
        .into_iter()
        .map(|mut f| {
            if f.header.name != target {
                f.header.data_type = retype;
            }
            f
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::{aggregate, group_by, group_schema};
    use crate::error::TransformError;
    use crate::types::{Aggregation, Cell, DataSet, DataType, Field, Header};

    fn sales() -> DataSet {
        DataSet::new(vec![
            Field::from_values(
                Header::new("city", DataType::String, 0),
                ["Prague", "Brno", "Prague", "Ostrava", "Brno", "Prague"],
            ),
            Field::from_values(
                Header::new("amount", DataType::Number, 1),
                ["10", "5", "x", "7", "5", "2.5"],
            ),
        ])
    }

    fn column(ds: &DataSet, name: &str) -> Vec<String> {
        ds.field(name).unwrap().contents().map(str::to_string).collect()
    }

    #[test]
    fn keys_are_first_seen_order() {
        let out = group_by(&sales(), "city", Aggregation::CountAll).unwrap();
        assert_eq!(column(&out, "city"), vec!["Prague", "Brno", "Ostrava"]);
        assert_eq!(column(&out, "amount"), vec!["3", "2", "1"]);
    }

    #[test]
    fn count_all_totals_match_row_count() {
        let ds = sales();
        let out = group_by(&ds, "amount", Aggregation::CountAll).unwrap();
        let total: usize = column(&out, "city").iter().map(|v| v.parse::<usize>().unwrap()).sum();
        assert_eq!(total, ds.row_count());
    }

    #[test]
    fn count_distinct_sum_mean_concat() {
        let ds = sales();
        let distinct = group_by(&ds, "city", Aggregation::CountDistinct).unwrap();
        assert_eq!(column(&distinct, "amount"), vec!["3", "1", "1"]);

        let sum = group_by(&ds, "city", Aggregation::Sum).unwrap();
        assert_eq!(column(&sum, "amount"), vec!["12.5", "10", "7"]);

        let mean = group_by(&ds, "city", Aggregation::Mean).unwrap();
        assert_eq!(column(&mean, "amount"), vec!["6.25", "5.00", "7.00"]);

        let concat = group_by(&ds, "city", Aggregation::ConcatValues).unwrap();
        assert_eq!(column(&concat, "amount"), vec!["10, x, 2.5", "5, 5", "7"]);
    }

    #[test]
    fn mean_of_nothing_parseable_is_zero() {
        let cells = [Cell::new("a", 0), Cell::new("b", 1)];
        assert_eq!(aggregate(Aggregation::Mean, &cells), "0.00");
        assert_eq!(aggregate(Aggregation::Sum, &cells), "0");
    }

    #[test]
    fn result_is_reindexed_and_rectangular() {
        let out = group_by(&sales(), "city", Aggregation::Sum).unwrap();
        assert_eq!(out.fields[0].len(), out.fields[1].len());
        let idx: Vec<usize> = out.fields[1].data.iter().map(|c| c.index).collect();
        assert_eq!(idx, vec![0, 1, 2]);
    }

    #[test]
    fn missing_target_and_group_key_error() {
        assert_eq!(
            group_by(&sales(), "nope", Aggregation::Sum).unwrap_err(),
            TransformError::ColumnNotFound("nope".to_string())
        );
        assert!(matches!(
            group_by(&sales(), "city", Aggregation::GroupKey).unwrap_err(),
            TransformError::UnsupportedAggregation(_)
        ));
    }

    #[test]
    fn schema_retypes_non_key_columns() {
        let ds = sales();
        let numeric = group_schema(ds.schema(), "city", Aggregation::CountAll).unwrap();
        assert_eq!(numeric[0].header.data_type, DataType::String);
        assert_eq!(numeric[1].header.data_type, DataType::Number);

        let concat = group_schema(ds.schema(), "amount", Aggregation::ConcatValues).unwrap();
        assert_eq!(concat[0].header.data_type, DataType::String);
        assert_eq!(concat[1].header.data_type, DataType::Number);

        assert!(Aggregation::Mean.is_numeric());
        assert!(!Aggregation::ConcatValues.is_numeric());
    }
}
