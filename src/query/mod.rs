//! The iterative query builder.
//!
//! A pass replays the caller's tokens against the transformation catalog, one round per token:
//!
//! 1. choose a transformation (`Empty` ends the query)
//! 2. choose its target column, if it needs one
//! 3. choose its argument, if it has any
//! 4. write a free-text value, if it takes one
//!
//! Every round's question goes through the [`ConversationPort`]. While tokens remain they are
//! fed to the port as precomputed answers; the first round without a token is asked live and
//! ends the pass. That live answer is returned as a suggestion, never committed. Completed
//! transformations are previewed on the running schema and appended to the pipeline.
//!
//! ## Example
//!
//! ```rust
//! use query_whisperer::conversation::ScriptedResponder;
//! use query_whisperer::ingestion::csv::ingest_csv_from_str;
//! use query_whisperer::query::QueryBuilder;
//!
//! let ds = ingest_csv_from_str("Name,Age\nAlice,30\nBob,25\n", b',').unwrap();
//! let mut builder = QueryBuilder::new(ScriptedResponder::new(["1"]));
//!
//! let outcome = builder.process_query(ds.schema(), "SortBy.Age").unwrap();
//! assert!(outcome.pipeline.is_empty());
//! assert_eq!(outcome.next_moves, vec!["Ascending", "Descending"]);
//! assert_eq!(outcome.suggestion.unwrap().text, "Descending");
//! ```

mod observer;
pub mod session;

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::conversation::{AnswerRequest, ConversationPort, Precomputed, Question};
use crate::error::{InvalidAnswer, QueryError, QueryResult, TransformError};
use crate::transform::{Transformation, TransformationKind};
use crate::types::SchemaField;

pub use observer::{
    QueryEvent, QueryMetrics, QueryMetricsSnapshot, QueryObserver, RoundStage, TracingQueryObserver,
};
pub use session::{SessionStore, WhisperSession};

const CHOOSE_TRANSFORMATION: &str = "---> Choose next transformation: ";

/// Configuration for the [`QueryBuilder`].
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// Invalid answers accepted for one round before the pass is aborted.
    pub max_attempts: usize,
    /// Separator between tokens of a query string.
    pub token_separator: char,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            token_separator: '.',
        }
    }
}

/// The responder's answer to the live round of a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub stage: RoundStage,
    /// Choice index, for choice rounds.
    pub index: Option<usize>,
    /// The chosen choice, or the free-text value.
    pub text: String,
}

/// Result of one pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryOutcome {
    /// Transformations completed entirely from typed tokens.
    pub pipeline: Vec<Transformation>,
    /// Choices of the last round played; empty for a free-text round.
    pub next_moves: Vec<String>,
    pub suggestion: Option<Suggestion>,
    /// Schema after previewing the pipeline.
    pub schema: Vec<SchemaField>,
    /// The tokens chose `Empty`.
    pub finished: bool,
    pub metrics: QueryMetricsSnapshot,
}

enum RoundResult {
    /// A typed token produced a valid answer: the choice index, or the free-text value.
    Typed(Answer),
    /// The round was answered live; the pass ends.
    Live,
}

enum Answer {
    Choice(usize),
    Text(String),
}

struct Pass<'a> {
    tokens: &'a [String],
    pos: usize,
    query_so_far: String,
    round: usize,
    next_moves: Vec<String>,
    suggestion: Option<Suggestion>,
}

impl Pass<'_> {
    fn next_token(&mut self) -> Option<&str> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token.as_str())
    }
}

/// Drives passes against a [`ConversationPort`].
pub struct QueryBuilder<P> {
    port: P,
    options: QueryOptions,
    observer: Option<Arc<dyn QueryObserver>>,
    metrics: Arc<QueryMetrics>,
}

impl<P: ConversationPort> QueryBuilder<P> {
    pub fn new(port: P) -> Self {
        Self {
            port,
            options: QueryOptions::default(),
            observer: None,
            metrics: Arc::new(QueryMetrics::new()),
        }
    }

    pub fn with_options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }

    /// Attach an observer for query events.
    pub fn with_observer(mut self, observer: Arc<dyn QueryObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    /// Get a handle to real-time pass metrics.
    pub fn metrics(&self) -> Arc<QueryMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    pub fn into_port(self) -> P {
        self.port
    }

    /// Splits a query string on the separator, dropping empty tokens.
    pub fn split_query(&self, query: &str) -> Vec<String> {
        query
            .split(self.options.token_separator)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Runs one pass over a query string.
    pub fn process_query(&mut self, schema: Vec<SchemaField>, query: &str) -> QueryResult<QueryOutcome> {
        let tokens = self.split_query(query);
        self.process_tokens(schema, &tokens)
    }

    /// Runs one pass over already split tokens, starting from `schema`.
    pub fn process_tokens(&mut self, schema: Vec<SchemaField>, tokens: &[String]) -> QueryResult<QueryOutcome> {
        let start = Instant::now();
        self.metrics.begin_pass();
        self.port.start_new_exchange();
        self.emit(QueryEvent::PassStarted { tokens: tokens.len() });

        let mut pass = Pass {
            tokens,
            pos: 0,
            query_so_far: tokens.join(&self.options.token_separator.to_string()),
            round: 0,
            next_moves: Vec::new(),
            suggestion: None,
        };
        debug!(query = %pass.query_so_far, "processing query");

        let mut schema = schema;
        let mut pipeline = Vec::new();
        let mut finished = false;

        loop {
            let question = Question::new(CHOOSE_TRANSFORMATION, TransformationKind::names());
            let kind = match self.play_round(&mut pass, RoundStage::Transformation, question)? {
                RoundResult::Live => break,
                RoundResult::Typed(answer) => match TransformationKind::from_index(answer.index()) {
                    Ok(TransformationKind::Empty) => {
                        finished = true;
                        break;
                    }
                    Ok(kind) => kind,
                    Err(e) => {
                        self.reject(e)?;
                        continue;
                    }
                },
            };

            let Some(args) = self.collect_arguments(&mut pass, kind, &schema)? else {
                break;
            };

            let built = Transformation::build(kind.name(), &args)
                .and_then(|t| t.apply_to_schema(schema.clone()).map(|preview| (t, preview)));
            match built {
                Ok((transformation, preview)) => {
                    schema = preview;
                    self.metrics.on_commit();
                    self.emit(QueryEvent::TransformationCommitted {
                        transformation: transformation.clone(),
                    });
                    pipeline.push(transformation);
                }
                Err(e) => self.reject(e)?,
            }
        }

        let elapsed = start.elapsed();
        self.metrics.end_pass(elapsed);
        let metrics = self.metrics.snapshot();
        self.emit(QueryEvent::PassFinished {
            elapsed,
            metrics: metrics.clone(),
        });

        Ok(QueryOutcome {
            pipeline,
            next_moves: pass.next_moves,
            suggestion: pass.suggestion,
            schema,
            finished,
            metrics,
        })
    }

    /// Plays the column, argument and free-text rounds of `kind`.
    ///
    /// Returns `None` when one of them was answered live.
    fn collect_arguments(
        &mut self,
        pass: &mut Pass<'_>,
        kind: TransformationKind,
        schema: &[SchemaField],
    ) -> QueryResult<Option<Vec<String>>> {
        let mut args = Vec::with_capacity(kind.steps_needed());

        if kind.steps_needed() >= 1 {
            let choices = kind.next_move_choices(schema);
            let question = Question::new(format!("---> {}", kind.next_moves_instructions()), choices.clone());
            match self.play_round(pass, RoundStage::TargetColumn, question)? {
                RoundResult::Live => return Ok(None),
                RoundResult::Typed(answer) => args.push(choices[answer.index()].clone()),
            }
        }

        if kind.has_arguments() {
            let choices: Vec<String> = kind.argument_choices().iter().map(|c| c.to_string()).collect();
            let question = Question::new(format!("---> {}", kind.arguments_instructions()), choices);
            match self.play_round(pass, RoundStage::Argument, question)? {
                RoundResult::Live => return Ok(None),
                RoundResult::Typed(answer) => args.push(kind.argument_at(answer.index())?.to_string()),
            }
        }

        if kind.has_following_free_text_argument() {
            let question = Question::free_text(kind.free_text_instructions());
            match self.play_round(pass, RoundStage::FreeText, question)? {
                RoundResult::Live => return Ok(None),
                RoundResult::Typed(answer) => args.push(answer.into_text()),
            }
        }

        Ok(Some(args))
    }

    /// Asks one round until it gets a valid answer.
    ///
    /// Each attempt consumes the next typed token, or asks live once tokens run out.
    fn play_round(&mut self, pass: &mut Pass<'_>, stage: RoundStage, question: Question) -> QueryResult<RoundResult> {
        let round = pass.round;
        pass.round += 1;

        let free_text = stage == RoundStage::FreeText;
        let choices = question.choices.clone();
        pass.next_moves = if free_text { Vec::new() } else { choices.clone() };

        let mut attempts = 0;
        loop {
            let token = pass.next_token().map(str::to_string);
            let live = token.is_none();
            let precomputed = token.map(|token| Precomputed {
                index: if free_text {
                    None
                } else {
                    choices.iter().position(|c| *c == token)
                },
                token,
            });

            self.metrics.on_round(live);
            self.emit(QueryEvent::RoundAsked {
                round,
                stage,
                choices: choices.len(),
                live,
            });

            self.port.ask(question.clone());
            let reply = self.port.answer(AnswerRequest {
                query_so_far: &pass.query_so_far,
                precomputed,
                expect_free_text: free_text,
            })?;

            match validate(&reply, free_text, choices.len()) {
                Ok(answer) if live => {
                    pass.suggestion = Some(match answer {
                        Answer::Choice(index) => Suggestion {
                            stage,
                            index: Some(index),
                            text: choices[index].clone(),
                        },
                        Answer::Text(text) => Suggestion {
                            stage,
                            index: None,
                            text,
                        },
                    });
                    return Ok(RoundResult::Live);
                }
                Ok(answer) => return Ok(RoundResult::Typed(answer)),
                Err(reason) => {
                    attempts += 1;
                    self.metrics.on_diagnostic();
                    self.port.report_error(&reason.to_string())?;
                    self.emit(QueryEvent::AnswerRejected { round, stage, reason });
                    if attempts >= self.options.max_attempts {
                        return Err(QueryError::PassAborted {
                            round,
                            attempts,
                            last: reply,
                        });
                    }
                }
            }
        }
    }

    /// Reports a recoverable build/preview error through the port; hard errors end the pass.
    fn reject(&mut self, error: TransformError) -> QueryResult<()> {
        self.emit(QueryEvent::TransformationRejected { error: error.clone() });
        if !error.is_recoverable() {
            return Err(error.into());
        }
        self.metrics.on_diagnostic();
        self.port.report_error(&format!("{error}. Please try again."))?;
        Ok(())
    }

    fn emit(&self, event: QueryEvent) {
        if let Some(obs) = &self.observer {
            obs.on_event(&event);
        }
    }
}

impl Answer {
    fn index(&self) -> usize {
        match self {
            Answer::Choice(index) => *index,
            Answer::Text(_) => 0,
        }
    }

    fn into_text(self) -> String {
        match self {
            Answer::Choice(index) => index.to_string(),
            Answer::Text(text) => text,
        }
    }
}

/// Checks a reply against the round: free-text rounds need a non-empty value, choice rounds an
/// integer in `0..len`.
fn validate(reply: &str, free_text: bool, len: usize) -> Result<Answer, InvalidAnswer> {
    let trimmed = reply.trim();
    if trimmed.is_empty() {
        return Err(InvalidAnswer::Empty);
    }
    if free_text {
        return Ok(Answer::Text(reply.to_string()));
    }
    let index: i64 = trimmed
        .parse()
        .map_err(|_| InvalidAnswer::NotAnInteger(reply.to_string()))?;
    match usize::try_from(index) {
        Ok(i) if i < len => Ok(Answer::Choice(i)),
        _ => Err(InvalidAnswer::OutOfRange { index, len }),
    }
}

#[cfg(test)]
mod tests {
    use super::{validate, Answer, QueryBuilder, QueryOptions, RoundStage};
    use crate::conversation::ScriptedResponder;
    use crate::error::{InvalidAnswer, QueryError};
    use crate::types::{DataType, Header, SchemaField};

    fn schema() -> Vec<SchemaField> {
        vec![
            SchemaField::new(Header::new("Name", DataType::String, 0)),
            SchemaField::new(Header::new("Age", DataType::Number, 1)),
        ]
    }

    #[test]
    fn validate_classifies_answers() {
        assert!(matches!(validate("1", false, 2), Ok(Answer::Choice(1))));
        assert!(matches!(validate(" 0 ", false, 2), Ok(Answer::Choice(0))));
        assert_eq!(validate("", false, 2).err(), Some(InvalidAnswer::Empty));
        assert_eq!(
            validate("Age", false, 2).err(),
            Some(InvalidAnswer::NotAnInteger("Age".into()))
        );
        assert_eq!(
            validate("7", false, 2).err(),
            Some(InvalidAnswer::OutOfRange { index: 7, len: 2 })
        );
        assert_eq!(
            validate("-1", false, 2).err(),
            Some(InvalidAnswer::OutOfRange { index: -1, len: 2 })
        );
        assert!(matches!(validate("Prague", true, 0), Ok(Answer::Text(t)) if t == "Prague"));
    }

    #[test]
    fn empty_query_asks_for_the_first_transformation() {
        let mut b = QueryBuilder::new(ScriptedResponder::new(["2"]));
        let out = b.process_query(schema(), "").unwrap();
        assert!(out.pipeline.is_empty());
        assert_eq!(out.next_moves, vec!["Empty", "DropColumn", "SortBy", "GroupBy", "FilterBy"]);
        let s = out.suggestion.unwrap();
        assert_eq!((s.stage, s.index, s.text.as_str()), (RoundStage::Transformation, Some(2), "SortBy"));
        assert_eq!(b.port().live_calls(), 1);
    }

    #[test]
    fn typed_tokens_commit_and_next_round_is_live() {
        let mut b = QueryBuilder::new(ScriptedResponder::new(["0"]));
        let out = b.process_query(schema(), "DropColumn.Name").unwrap();
        assert_eq!(out.pipeline.len(), 1);
        assert_eq!(out.schema.len(), 1);
        assert_eq!(out.metrics.committed, 1);
        assert_eq!(out.metrics.live_rounds, 1);
        assert_eq!(out.suggestion.unwrap().text, "Empty");
    }

    #[test]
    fn free_text_round_has_no_next_moves() {
        let mut b = QueryBuilder::new(ScriptedResponder::new(["26"]));
        let out = b.process_query(schema(), "FilterBy.Age.GreaterThan").unwrap();
        assert!(out.pipeline.is_empty());
        assert!(out.next_moves.is_empty());
        let s = out.suggestion.unwrap();
        assert_eq!((s.stage, s.index, s.text.as_str()), (RoundStage::FreeText, None, "26"));
    }

    #[test]
    fn unknown_token_is_rejected_then_the_next_token_is_used() {
        let mut b = QueryBuilder::new(ScriptedResponder::new(["0"]));
        let out = b.process_query(schema(), "SortBy.Height.Age.Descending").unwrap();
        assert_eq!(out.pipeline.len(), 1);
        assert_eq!(b.port().diagnostics.len(), 1);
        assert!(b.port().diagnostics[0].contains("Non-integer"));
    }

    #[test]
    fn empty_token_finishes_without_live_round() {
        let mut b = QueryBuilder::new(ScriptedResponder::new(Vec::<String>::new()));
        let out = b.process_query(schema(), "SortBy.Age.Ascending.Empty").unwrap();
        assert!(out.finished);
        assert_eq!(out.pipeline.len(), 1);
        assert!(out.suggestion.is_none());
        assert_eq!(b.port().live_calls(), 0);
    }

    #[test]
    fn repeated_invalid_answers_abort_the_pass() {
        let mut b = QueryBuilder::new(ScriptedResponder::new(["x", "9", ""]))
            .with_options(QueryOptions {
                max_attempts: 3,
                ..Default::default()
            });
        let err = b.process_query(schema(), "").unwrap_err();
        assert!(matches!(err, QueryError::PassAborted { round: 0, attempts: 3, .. }));
        assert_eq!(b.port().diagnostics.len(), 3);
    }

    #[test]
    fn every_pass_starts_a_new_exchange() {
        let mut b = QueryBuilder::new(ScriptedResponder::new(["0", "0"]));
        b.process_query(schema(), "").unwrap();
        b.process_query(schema(), "").unwrap();
        assert_eq!(b.port().exchanges, 2);
        assert_eq!(b.metrics().snapshot().pass_id, 2);
    }
}
