//! The fixed, ordered catalog of transformation kinds.
//!
//! A [`TransformationKind`] is a transformation without parameters. The query builder uses it to
//! learn how many rounds a transformation needs and which choices to offer in each round.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{TransformError, TransformResult};
use crate::types::{Aggregation, Relation, SchemaField, SortDirection};

pub const EMPTY: &str = "Empty";
pub const DROP_COLUMN: &str = "DropColumn";
pub const SORT_BY: &str = "SortBy";
pub const GROUP_BY: &str = "GroupBy";
pub const FILTER_BY: &str = "FilterBy";

pub const ASCENDING: &str = "Ascending";
pub const DESCENDING: &str = "Descending";

pub const SUM: &str = "Sum";
pub const AVERAGE: &str = "Average";
pub const CONCAT: &str = "Concat";
pub const COUNT_DISTINCT: &str = "CountDistinct";
pub const COUNT_ALL: &str = "CountAll";
pub const GROUP_KEY: &str = "GroupKey";

pub const EQUALS: &str = "Equals";
pub const NOT_EQUALS: &str = "NotEquals";
pub const LESS_THAN: &str = "LessThan";
pub const GREATER_THAN: &str = "GreaterThan";
pub const IN_RANGE: &str = "InRange";

const SORT_ARGUMENTS: &[&str] = &[ASCENDING, DESCENDING];
// GroupKey is reserved and never offered.
const GROUP_ARGUMENTS: &[&str] = &[SUM, AVERAGE, CONCAT, COUNT_DISTINCT, COUNT_ALL];
const FILTER_ARGUMENTS: &[&str] = &[EQUALS, NOT_EQUALS, LESS_THAN, GREATER_THAN];

/// Transformation kinds in catalog order. The position is the kind's choice index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransformationKind {
    /// Terminates the query.
    Empty,
    DropColumn,
    SortBy,
    GroupBy,
    FilterBy,
}

impl TransformationKind {
    pub const CATALOG: [TransformationKind; 5] = [
        TransformationKind::Empty,
        TransformationKind::DropColumn,
        TransformationKind::SortBy,
        TransformationKind::GroupBy,
        TransformationKind::FilterBy,
    ];

    /// Bare kind at catalog position `index`.
    pub fn from_index(index: usize) -> TransformResult<Self> {
        Self::CATALOG
            .get(index)
            .copied()
            .ok_or_else(|| TransformError::UnknownTransformation(index.to_string()))
    }

    /// Kind from its canonical name or its catalog index written as a string.
    pub fn parse(name: &str) -> TransformResult<Self> {
        if let Some(kind) = Self::CATALOG.iter().find(|k| k.name() == name) {
            return Ok(*kind);
        }
        match name.parse::<usize>() {
            Ok(index) => Self::from_index(index),
            Err(_) => Err(TransformError::UnknownTransformation(name.to_string())),
        }
    }

    /// Catalog names, in catalog order. This is the choice list of a transformation round.
    pub fn names() -> Vec<String> {
        Self::CATALOG.iter().map(|k| k.name().to_string()).collect()
    }

    pub fn index(self) -> usize {
        match self {
            TransformationKind::Empty => 0,
            TransformationKind::DropColumn => 1,
            TransformationKind::SortBy => 2,
            TransformationKind::GroupBy => 3,
            TransformationKind::FilterBy => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TransformationKind::Empty => EMPTY,
            TransformationKind::DropColumn => DROP_COLUMN,
            TransformationKind::SortBy => SORT_BY,
            TransformationKind::GroupBy => GROUP_BY,
            TransformationKind::FilterBy => FILTER_BY,
        }
    }

    /// Answers needed after the kind itself has been chosen.
    pub fn steps_needed(self) -> usize {
        match self {
            TransformationKind::Empty => 0,
            TransformationKind::DropColumn => 1,
            TransformationKind::SortBy | TransformationKind::GroupBy => 2,
            TransformationKind::FilterBy => 3,
        }
    }

    /// Whether an argument round follows the target-column round.
    pub fn has_arguments(self) -> bool {
        !self.argument_choices().is_empty()
    }

    /// Whether a free-text value round follows the argument round.
    pub fn has_following_free_text_argument(self) -> bool {
        matches!(self, TransformationKind::FilterBy)
    }

    /// Choices of the target-column round: the current column names.
    pub fn next_move_choices(self, schema: &[SchemaField]) -> Vec<String> {
        match self {
            TransformationKind::Empty => Vec::new(),
            _ => schema.iter().map(|f| f.header.name.clone()).collect(),
        }
    }

    /// Fixed vocabulary of the argument round.
    pub fn argument_choices(self) -> &'static [&'static str] {
        match self {
            TransformationKind::SortBy => SORT_ARGUMENTS,
            TransformationKind::GroupBy => GROUP_ARGUMENTS,
            TransformationKind::FilterBy => FILTER_ARGUMENTS,
            TransformationKind::Empty | TransformationKind::DropColumn => &[],
        }
    }

    pub fn argument_at(self, index: usize) -> TransformResult<&'static str> {
        let choices = self.argument_choices();
        choices
            .get(index)
            .copied()
            .ok_or(TransformError::ArgumentOutOfRange {
                transformation: self.name(),
                index,
                len: choices.len(),
            })
    }

    /// Operator-facing instruction for the target-column round.
    pub fn next_moves_instructions(self) -> &'static str {
        match self {
            TransformationKind::Empty => "Empty transformation has no next moves",
            TransformationKind::DropColumn => "Select the column to drop",
            TransformationKind::SortBy => {
                "Choose one column from the list below, by which you want to sort the dataset"
            }
            TransformationKind::GroupBy => {
                "Choose one column from the dataset, by which you want to group the dataset"
            }
            TransformationKind::FilterBy => {
                "Choose one column from the dataset, by which you want to filter the dataset"
            }
        }
    }

    /// Operator-facing instruction for the argument round.
    pub fn arguments_instructions(self) -> &'static str {
        match self {
            TransformationKind::SortBy => "Choose whether the sorting should be ascending or descending",
            TransformationKind::GroupBy => {
                "Choose one of the following aggregations you want to apply on the grouped dataset"
            }
            TransformationKind::FilterBy => {
                "Choose one of the following relations you want to apply on the filtered dataset"
            }
            TransformationKind::Empty | TransformationKind::DropColumn => "",
        }
    }

    /// Operator-facing instruction for the free-text round.
    pub fn free_text_instructions(self) -> &'static str {
        match self {
            TransformationKind::FilterBy => "Write down the right side of the relation.",
            _ => "",
        }
    }
}

impl fmt::Display for TransformationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub(crate) fn parse_direction(word: &str) -> TransformResult<SortDirection> {
    match word {
        ASCENDING => Ok(SortDirection::Ascending),
        DESCENDING => Ok(SortDirection::Descending),
        other => Err(TransformError::InvalidArgument {
            transformation: SORT_BY,
            argument: other.to_string(),
        }),
    }
}

pub(crate) fn direction_name(direction: SortDirection) -> &'static str {
    match direction {
        SortDirection::Ascending => ASCENDING,
        SortDirection::Descending => DESCENDING,
    }
}

pub(crate) fn parse_aggregation(word: &str) -> TransformResult<Aggregation> {
    match word {
        SUM => Ok(Aggregation::Sum),
        AVERAGE => Ok(Aggregation::Mean),
        CONCAT => Ok(Aggregation::ConcatValues),
        COUNT_DISTINCT => Ok(Aggregation::CountDistinct),
        COUNT_ALL => Ok(Aggregation::CountAll),
        GROUP_KEY => Ok(Aggregation::GroupKey),
        other => Err(TransformError::UnsupportedAggregation(other.to_string())),
    }
}

pub(crate) fn aggregation_name(aggregation: Aggregation) -> &'static str {
    match aggregation {
        Aggregation::Sum => SUM,
        Aggregation::Mean => AVERAGE,
        Aggregation::ConcatValues => CONCAT,
        Aggregation::CountDistinct => COUNT_DISTINCT,
        Aggregation::CountAll => COUNT_ALL,
        Aggregation::GroupKey => GROUP_KEY,
    }
}

pub(crate) fn parse_relation(word: &str) -> TransformResult<Relation> {
    match word {
        EQUALS => Ok(Relation::Equals),
        NOT_EQUALS => Ok(Relation::NotEquals),
        LESS_THAN => Ok(Relation::LessThan),
        GREATER_THAN => Ok(Relation::GreaterThan),
        other => Err(TransformError::UnsupportedRelation(other.to_string())),
    }
}

pub(crate) fn relation_name(relation: Relation) -> &'static str {
    match relation {
        Relation::Equals => EQUALS,
        Relation::NotEquals => NOT_EQUALS,
        Relation::LessThan => LESS_THAN,
        Relation::GreaterThan => GREATER_THAN,
        Relation::InRange => IN_RANGE,
    }
}
