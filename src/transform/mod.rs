//! Transformations: the catalog of kinds and fully parameterised pipeline steps.
//!
//! A [`Transformation`] is built from a catalog name plus the answers collected for it, then
//! applied either to a schema (a side-effect-free preview used while a query is being built) or to
//! a real [`DataSet`].
//!
//! ## Example
//!
//! ```rust
//! use query_whisperer::transform::{apply_pipeline, Transformation};
//! use query_whisperer::types::{DataSet, DataType, Field, Header};
//!
//! let ds = DataSet::new(vec![
//!     Field::from_values(Header::new("Name", DataType::String, 0), ["Alice", "Bob"]),
//!     Field::from_values(Header::new("Age", DataType::Number, 1), ["30", "25"]),
//! ]);
//!
//! let sort = Transformation::build("SortBy", &["Age", "Ascending"]).unwrap();
//! let out = apply_pipeline(&ds, &[sort]).unwrap();
//! assert_eq!(out.row(0), vec![Some("Bob"), Some("25")]);
//! ```

pub mod catalog;

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{TransformError, TransformResult};
use crate::processing::drop::drop_schema_columns;
use crate::processing::group::group_schema;
use crate::processing::{drop_columns, filter_by, group_by, sort_by};
use crate::types::{Aggregation, DataSet, FilterCondition, Relation, SchemaField, SortDirection};

pub use catalog::TransformationKind;

/// One parameterised step of a query pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transformation {
    Empty,
    DropColumn {
        columns: BTreeSet<String>,
    },
    SortBy {
        column: String,
        direction: SortDirection,
    },
    GroupBy {
        /// Carried for callers; grouping always uses `target`.
        group_columns: Vec<String>,
        aggregation: Aggregation,
        target: String,
    },
    FilterBy(FilterCondition),
}

impl Transformation {
    /// Builds a transformation from its catalog name (or catalog index as a string) and the
    /// resolved answers `[target column, argument word, free-text value]`.
    ///
    /// Only the first `steps_needed` arguments are read, except for `DropColumn`, which drops
    /// every non-empty argument.
    pub fn build<S: AsRef<str>>(name: &str, args: &[S]) -> TransformResult<Self> {
        let kind = TransformationKind::parse(name)?;
        let expected = kind.steps_needed();
        if args.len() < expected {
            return Err(TransformError::InsufficientArguments {
                transformation: kind.name(),
                expected,
                actual: args.len(),
            });
        }
        let arg = |i: usize| args[i].as_ref();

        Ok(match kind {
            TransformationKind::Empty => Transformation::Empty,
            TransformationKind::DropColumn => Transformation::DropColumn {
                columns: args
                    .iter()
                    .map(|a| a.as_ref())
                    .filter(|a| !a.is_empty())
                    .map(str::to_string)
                    .collect(),
            },
            TransformationKind::SortBy => Transformation::SortBy {
                column: arg(0).to_string(),
                direction: catalog::parse_direction(arg(1))?,
            },
            TransformationKind::GroupBy => Transformation::GroupBy {
                group_columns: vec![arg(0).to_string()],
                aggregation: catalog::parse_aggregation(arg(1))?,
                target: arg(0).to_string(),
            },
            TransformationKind::FilterBy => Transformation::FilterBy(FilterCondition::new(
                arg(0),
                catalog::parse_relation(arg(1))?,
                arg(2),
            )),
        })
    }

    pub fn kind(&self) -> TransformationKind {
        match self {
            Transformation::Empty => TransformationKind::Empty,
            Transformation::DropColumn { .. } => TransformationKind::DropColumn,
            Transformation::SortBy { .. } => TransformationKind::SortBy,
            Transformation::GroupBy { .. } => TransformationKind::GroupBy,
            Transformation::FilterBy(_) => TransformationKind::FilterBy,
        }
    }

    /// Schema preview: the shape the data would have after [`Transformation::apply_to_data`].
    ///
    /// Column names are not checked here; only relations and aggregations that could never be
    /// applied fail.
    pub fn apply_to_schema(&self, schema: Vec<SchemaField>) -> TransformResult<Vec<SchemaField>> {
        match self {
            Transformation::Empty | Transformation::SortBy { .. } => Ok(schema),
            Transformation::DropColumn { columns } => Ok(drop_schema_columns(schema, columns)),
            Transformation::GroupBy {
                aggregation, target, ..
            } => group_schema(schema, target, *aggregation),
            Transformation::FilterBy(condition) => match condition.relation {
                Relation::InRange => Err(TransformError::UnsupportedRelation(
                    catalog::IN_RANGE.to_string(),
                )),
                _ => Ok(schema),
            },
        }
    }

    /// Applies the transformation to real data, returning a new dataset.
    pub fn apply_to_data(&self, dataset: &DataSet) -> TransformResult<DataSet> {
        match self {
            Transformation::Empty => Ok(dataset.clone()),
            Transformation::DropColumn { columns } => drop_columns(dataset, columns),
            Transformation::SortBy { column, direction } => sort_by(dataset, column, *direction),
            Transformation::GroupBy {
                aggregation, target, ..
            } => group_by(dataset, target, *aggregation),
            Transformation::FilterBy(condition) => filter_by(dataset, condition),
        }
    }

    /// Canonical tokens that rebuild this transformation when replayed.
    ///
    /// A multi-column drop renders as one `DropColumn` segment per column; an empty drop renders
    /// as nothing.
    pub fn tokens(&self) -> Vec<String> {
        let kind = self.kind().name().to_string();
        match self {
            Transformation::Empty => vec![kind],
            Transformation::DropColumn { columns } => columns
                .iter()
                .flat_map(|c| [kind.clone(), c.clone()])
                .collect(),
            Transformation::SortBy { column, direction } => vec![
                kind,
                column.clone(),
                catalog::direction_name(*direction).to_string(),
            ],
            Transformation::GroupBy {
                aggregation, target, ..
            } => vec![
                kind,
                target.clone(),
                catalog::aggregation_name(*aggregation).to_string(),
            ],
            Transformation::FilterBy(condition) => vec![
                kind,
                condition.source_header_name.clone(),
                catalog::relation_name(condition.relation).to_string(),
                condition.condition.clone(),
            ],
        }
    }
}

impl fmt::Display for Transformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tokens().join(" "))
    }
}

/// Applies `pipeline` to `dataset` in order.
pub fn apply_pipeline(dataset: &DataSet, pipeline: &[Transformation]) -> TransformResult<DataSet> {
    pipeline
        .iter()
        .try_fold(dataset.clone(), |ds, t| t.apply_to_data(&ds))
}

/// Schema preview of a whole pipeline.
pub fn preview_pipeline(
    schema: Vec<SchemaField>,
    pipeline: &[Transformation],
) -> TransformResult<Vec<SchemaField>> {
    pipeline
        .iter()
        .try_fold(schema, |schema, t| t.apply_to_schema(schema))
}

/// Joins the tokens of every step with `separator`, producing a replayable query string.
pub fn to_query_string(pipeline: &[Transformation], separator: char) -> String {
    pipeline
        .iter()
        .flat_map(Transformation::tokens)
        .collect::<Vec<_>>()
        .join(&separator.to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::{apply_pipeline, preview_pipeline, to_query_string, Transformation};
    use crate::error::TransformError;
    use crate::types::{
        Aggregation, DataSet, DataType, Field, FilterCondition, Header, Relation, SortDirection,
    };

    fn people() -> DataSet {
        DataSet::new(vec![
            Field::from_values(Header::new("Name", DataType::String, 0), ["Alice", "Bob", "Cid"]),
            Field::from_values(Header::new("Age", DataType::Number, 1), ["30", "25", "41"]),
            Field::from_values(Header::new("Team", DataType::String, 2), ["a", "b", "a"]),
        ])
    }

    #[test]
    fn build_accepts_names_and_index_strings() {
        let by_name = Transformation::build("SortBy", &["Age", "Descending"]).unwrap();
        let by_index = Transformation::build("2", &["Age", "Descending"]).unwrap();
        assert_eq!(by_name, by_index);
        assert_eq!(
            by_name,
            Transformation::SortBy {
                column: "Age".to_string(),
                direction: SortDirection::Descending
            }
        );
        assert_eq!(Transformation::build::<&str>("Empty", &[]).unwrap(), Transformation::Empty);
    }

    #[test]
    fn build_errors() {
        assert_eq!(
            Transformation::build::<&str>("Pivot", &[]).unwrap_err(),
            TransformError::UnknownTransformation("Pivot".to_string())
        );
        assert_eq!(
            Transformation::build("FilterBy", &["Age", "Equals"]).unwrap_err(),
            TransformError::InsufficientArguments {
                transformation: "FilterBy",
                expected: 3,
                actual: 2
            }
        );
        assert!(matches!(
            Transformation::build("SortBy", &["Age", "Sideways"]).unwrap_err(),
            TransformError::InvalidArgument { .. }
        ));
        assert!(matches!(
            Transformation::build("GroupBy", &["Age", "Median"]).unwrap_err(),
            TransformError::UnsupportedAggregation(_)
        ));
        assert!(matches!(
            Transformation::build("FilterBy", &["Age", "InRange", "1"]).unwrap_err(),
            TransformError::UnsupportedRelation(_)
        ));
    }

    #[test]
    fn drop_column_collects_non_empty_arguments() {
        let t = Transformation::build("DropColumn", &["Age", "", "Team"]).unwrap();
        let expected: BTreeSet<String> = ["Age".to_string(), "Team".to_string()].into();
        assert_eq!(t, Transformation::DropColumn { columns: expected });
    }

    #[test]
    fn group_by_maps_vocabulary_words() {
        let t = Transformation::build("GroupBy", &["Team", "Average"]).unwrap();
        assert_eq!(
            t,
            Transformation::GroupBy {
                group_columns: vec!["Team".to_string()],
                aggregation: Aggregation::Mean,
                target: "Team".to_string()
            }
        );
    }

    #[test]
    fn schema_preview_matches_data_shape() {
        let ds = people();
        let pipeline = vec![
            Transformation::build("DropColumn", &["Name"]).unwrap(),
            Transformation::build("GroupBy", &["Team", "CountAll"]).unwrap(),
        ];
        let data = apply_pipeline(&ds, &pipeline).unwrap();
        let schema = preview_pipeline(ds.schema(), &pipeline).unwrap();

        let names: Vec<&str> = schema.iter().map(|f| f.name()).collect();
        assert_eq!(names, data.header_names().collect::<Vec<_>>());
        assert_eq!(schema[0].header.data_type, DataType::Number);
        assert_eq!(schema[1].header.data_type, DataType::String);
        assert_eq!(data.row(0), vec![Some("2"), Some("a")]);
    }

    #[test]
    fn in_range_preview_is_a_hard_failure() {
        let t = Transformation::FilterBy(FilterCondition::new("Age", Relation::InRange, "1..9"));
        let err = t.apply_to_schema(people().schema()).unwrap_err();
        assert!(!err.is_recoverable());
    }

    #[test]
    fn apply_reports_missing_columns() {
        let t = Transformation::build("SortBy", &["Height", "Ascending"]).unwrap();
        assert_eq!(
            apply_pipeline(&people(), &[t]).unwrap_err(),
            TransformError::ColumnNotFound("Height".to_string())
        );
    }

    #[test]
    fn tokens_replay_to_the_same_transformation() {
        let pipeline = vec![
            Transformation::build("FilterBy", &["Age", "GreaterThan", "26"]).unwrap(),
            Transformation::build("GroupBy", &["Team", "Concat"]).unwrap(),
            Transformation::build("DropColumn", &["Name"]).unwrap(),
        ];
        assert_eq!(
            to_query_string(&pipeline, '.'),
            "FilterBy.Age.GreaterThan.26.GroupBy.Team.Concat.DropColumn.Name"
        );
        for t in &pipeline {
            let tokens = t.tokens();
            let rebuilt = Transformation::build(&tokens[0], &tokens[1..]).unwrap();
            assert_eq!(&rebuilt, t);
        }
    }
}
