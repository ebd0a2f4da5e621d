//! In-memory column/row algorithms.
//!
//! The processing layer operates on [`crate::types::DataSet`] values produced by ingestion and
//! always returns a new dataset; inputs are never modified.
//!
//! Currently implemented:
//!
//! - [`drop_columns()`]: remove named fields
//! - [`sort_by()`]: stable, type-aware sort of every field by one column
//! - [`filter_by()`]: keep rows whose cell satisfies a relation against a literal
//! - [`group_by()`]: group rows by one column and aggregate the rest
//!
//! Comparisons go through [`compare::compare_typed`], which parses raw cell text according to
//! the column's [`crate::types::DataType`].
//!
//! ## Example: filter → sort → group
//!
//! ```rust
//! use query_whisperer::processing::{filter_by, group_by, sort_by};
//! use query_whisperer::types::{
//!     Aggregation, DataSet, DataType, Field, FilterCondition, Header, Relation, SortDirection,
//! };
//!
//! let ds = DataSet::new(vec![
//!     Field::from_values(Header::new("team", DataType::String, 0), ["red", "blue", "red"]),
//!     Field::from_values(Header::new("score", DataType::Number, 1), ["10", "20", "5"]),
//! ]);
//!
//! let kept = filter_by(&ds, &FilterCondition::new("score", Relation::GreaterThan, "6")).unwrap();
//! let sorted = sort_by(&kept, "score", SortDirection::Descending).unwrap();
//! assert_eq!(sorted.row(0), vec![Some("blue"), Some("20")]);
//!
//! let totals = group_by(&ds, "team", Aggregation::Sum).unwrap();
//! assert_eq!(totals.row(0), vec![Some("red"), Some("15")]);
//! ```

pub mod compare;
pub mod drop;
pub mod filter;
pub mod group;
pub mod sort;

pub use compare::compare_typed;
pub use drop::drop_columns;
pub use filter::filter_by;
pub use group::{aggregate, group_by};
pub use sort::sort_by;
