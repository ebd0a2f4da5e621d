//! `query-whisperer` builds tabular queries one choice at a time.
//!
//! A query is a dot-separated token string such as `SortBy.Age.Ascending.FilterBy.Age.GreaterThan.26`.
//! Each token answers one round of a fixed question sequence: which transformation, which column,
//! which argument, which value. The [`query::QueryBuilder`] replays the tokens a caller already
//! typed and asks a [`conversation::ConversationPort`] (a human on a terminal, or a chat model) for
//! the next one. The answer comes back as a suggestion, alongside the choices that are valid next.
//!
//! ## Transformations
//!
//! | name         | rounds after the name             |
//! |--------------|-----------------------------------|
//! | `Empty`      | none; ends the query              |
//! | `DropColumn` | column                            |
//! | `SortBy`     | column, `Ascending`/`Descending`  |
//! | `GroupBy`    | column, aggregation               |
//! | `FilterBy`   | column, relation, free-text value |
//!
//! Cells are kept as raw text and compared according to the column's inferred
//! [`types::DataType`] (`Number`, `Date`, `Bool` or `String`).
//!
//! ## Quick example: replay a query and apply it
//!
//! ```rust
//! use query_whisperer::conversation::ScriptedResponder;
//! use query_whisperer::ingestion::{csv::ingest_csv_from_str, to_csv_string};
//! use query_whisperer::query::QueryBuilder;
//! use query_whisperer::transform::apply_pipeline;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let ds = ingest_csv_from_str("Name,Age\nAlice,30\nBob,25\n", b',')?;
//!
//! // The responder is only asked for the round after the last typed token.
//! let mut builder = QueryBuilder::new(ScriptedResponder::new(["0"]));
//! let outcome = builder.process_query(ds.schema(), "SortBy.Age.Ascending")?;
//!
//! let sorted = apply_pipeline(&ds, &outcome.pipeline)?;
//! assert_eq!(to_csv_string(&sorted)?, "Name,Age\nBob,25\nAlice,30\n");
//! assert_eq!(outcome.suggestion.unwrap().text, "Empty");
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`types`]: columnar dataset, headers, cells and schema projection
//! - [`processing`]: drop/sort/filter/group algorithms and typed comparison
//! - [`transform`]: the transformation catalog and pipeline application
//! - [`conversation`]: the conversation port and its responders
//! - [`query`]: the query builder, its metrics and the session layer
//! - [`ingestion`]: delimited text in and out
//! - [`error`]: error types used across the crate

pub mod conversation;
pub mod error;
pub mod ingestion;
pub mod processing;
pub mod query;
pub mod transform;
pub mod types;

pub use error::{
    ConversationError, ConversationResult, IngestionError, IngestionResult, InvalidAnswer, QueryError,
    QueryResult, TransformError, TransformResult,
};
