//! Per-user session state and the session-keyed store.
//!
//! A [`WhisperSession`] holds everything one user builds a query against: the loaded dataset,
//! the free-form request, the current query string and the last committed pipeline. A
//! [`SessionStore`] keeps many sessions apart, each behind its own lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info};
use uuid::Uuid;

use crate::conversation::ConversationPort;
use crate::error::{QueryError, QueryResult};
use crate::ingestion::to_csv_string;
use crate::transform::{apply_pipeline, Transformation};
use crate::types::DataSet;

use super::{QueryBuilder, QueryOutcome, RoundStage, Suggestion};

/// One user's query-building state.
pub struct WhisperSession<P> {
    id: Uuid,
    builder: QueryBuilder<P>,
    dataset: Option<DataSet>,
    user_request: String,
    query: String,
    pipeline: Vec<Transformation>,
    last_outcome: Option<QueryOutcome>,
}

impl<P: ConversationPort> WhisperSession<P> {
    pub fn new(builder: QueryBuilder<P>) -> Self {
        Self {
            id: Uuid::new_v4(),
            builder,
            dataset: None,
            user_request: String::new(),
            query: String::new(),
            pipeline: Vec::new(),
            last_outcome: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn load_dataset(&mut self, dataset: DataSet) {
        debug!(session = %self.id, columns = dataset.field_count(), rows = dataset.row_count(), "dataset loaded");
        self.dataset = Some(dataset);
    }

    pub fn is_dataset_loaded(&self) -> bool {
        self.dataset.is_some()
    }

    pub fn dataset(&self) -> Option<&DataSet> {
        self.dataset.as_ref()
    }

    /// Stores a new request for the responder and clears the current query string.
    pub fn load_user_request(&mut self, request: &str) {
        self.user_request = request.to_string();
        self.builder.port_mut().set_user_request(request);
        self.query.clear();
        info!(session = %self.id, request, "user request loaded");
    }

    pub fn user_request(&self) -> &str {
        &self.user_request
    }

    /// Clears the query string and pipeline and starts a new exchange with the responder.
    pub fn start_new_conversation(&mut self) {
        self.query.clear();
        self.pipeline.clear();
        self.last_outcome = None;
        self.builder.port_mut().start_new_exchange();
    }

    /// Runs a pass over `query` and returns the next moves, the responder's suggestion first.
    ///
    /// The committed pipeline replaces the previous one, so editing earlier tokens edits earlier
    /// steps. On error the session keeps its previous query and pipeline.
    pub fn process_input(&mut self, query: &str) -> QueryResult<Vec<String>> {
        let outcome = self.run_pass(query)?;
        Ok(suggestion_first(&outcome.next_moves, outcome.suggestion.as_ref()))
    }

    fn run_pass(&mut self, query: &str) -> QueryResult<QueryOutcome> {
        let schema = self.dataset.as_ref().ok_or(QueryError::NoDataset)?.schema();

        // A failed pass leaves the previous query and pipeline in place.
        let outcome = self.builder.process_query(schema, query)?;
        self.query = query.to_string();
        self.pipeline = outcome.pipeline.clone();
        self.last_outcome = Some(outcome.clone());
        Ok(outcome)
    }

    /// The loaded dataset with the committed pipeline applied, as comma-separated text.
    ///
    /// `None` while the pipeline is empty.
    pub fn current_table(&self) -> QueryResult<Option<String>> {
        if self.pipeline.is_empty() {
            return Ok(None);
        }
        let dataset = self.dataset.as_ref().ok_or(QueryError::NoDataset)?;
        let table = apply_pipeline(dataset, &self.pipeline)?;
        Ok(Some(to_csv_string(&table)?))
    }

    /// Lets the responder extend the current query one suggestion at a time.
    ///
    /// Runs at least one pass. Stops when the query is finished, the responder suggests `Empty`
    /// or nothing, or after `max_passes` passes.
    pub fn auto_complete(&mut self, max_passes: usize) -> QueryResult<QueryOutcome> {
        let separator = self.builder.options().token_separator;
        let mut query = self.query.clone();
        let mut outcome = self.run_pass(&query)?;

        for _ in 1..max_passes {
            if outcome.finished {
                break;
            }
            let next = match &outcome.suggestion {
                Some(s) if !(s.stage == RoundStage::Transformation && s.index == Some(0)) => s.text.clone(),
                _ => break,
            };
            debug!(session = %self.id, token = %next, "auto-completing");
            if !query.is_empty() {
                query.push(separator);
            }
            query.push_str(&next);
            outcome = self.run_pass(&query)?;
        }

        Ok(outcome)
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn pipeline(&self) -> &[Transformation] {
        &self.pipeline
    }

    pub fn last_outcome(&self) -> Option<&QueryOutcome> {
        self.last_outcome.as_ref()
    }

    pub fn builder(&self) -> &QueryBuilder<P> {
        &self.builder
    }

    pub fn builder_mut(&mut self) -> &mut QueryBuilder<P> {
        &mut self.builder
    }
}

/// Moves the suggested choice to the front; a free-text suggestion becomes the only entry.
fn suggestion_first(next_moves: &[String], suggestion: Option<&Suggestion>) -> Vec<String> {
    let mut moves = next_moves.to_vec();
    match suggestion {
        Some(Suggestion { index: Some(i), .. }) if *i > 0 && *i < moves.len() => {
            let chosen = moves.remove(*i);
            moves.insert(0, chosen);
        }
        Some(Suggestion { index: None, text, .. }) if moves.is_empty() => moves.push(text.clone()),
        _ => {}
    }
    moves
}

type SharedSession<P> = Arc<Mutex<WhisperSession<P>>>;
type BuilderFactory<P> = Box<dyn Fn() -> QueryBuilder<P> + Send + Sync>;

/// Sessions keyed by id. Each session is locked independently of the map.
pub struct SessionStore<P> {
    sessions: Mutex<HashMap<Uuid, SharedSession<P>>>,
    factory: BuilderFactory<P>,
}

impl<P: ConversationPort> SessionStore<P> {
    /// `factory` builds the query builder (and its port) of every new session.
    pub fn new(factory: impl Fn() -> QueryBuilder<P> + Send + Sync + 'static) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            factory: Box::new(factory),
        }
    }

    /// Creates an empty session and returns its id.
    pub fn create(&self) -> Uuid {
        let session = WhisperSession::new((self.factory)());
        let id = session.id();
        self.lock_map().insert(id, Arc::new(Mutex::new(session)));
        info!(session = %id, "session created");
        id
    }

    pub fn get(&self, id: Uuid) -> QueryResult<SharedSession<P>> {
        self.lock_map()
            .get(&id)
            .cloned()
            .ok_or(QueryError::SessionNotFound(id))
    }

    /// Runs `f` on the session while holding only that session's lock.
    pub fn with_session<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut WhisperSession<P>) -> QueryResult<T>,
    ) -> QueryResult<T> {
        let session = self.get(id)?;
        let mut guard = session.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    pub fn remove(&self, id: Uuid) -> bool {
        self.lock_map().remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock_map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_map(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, SharedSession<P>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::{suggestion_first, WhisperSession};
    use crate::conversation::ScriptedResponder;
    use crate::error::QueryError;
    use crate::ingestion::csv::ingest_csv_from_str;
    use crate::query::{QueryBuilder, RoundStage, Suggestion};

    fn moves() -> Vec<String> {
        ["Empty", "DropColumn", "SortBy"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn suggestion_moves_to_front() {
        let s = Suggestion {
            stage: RoundStage::Transformation,
            index: Some(2),
            text: "SortBy".into(),
        };
        assert_eq!(suggestion_first(&moves(), Some(&s)), vec!["SortBy", "Empty", "DropColumn"]);

        let first = Suggestion { index: Some(0), ..s };
        assert_eq!(suggestion_first(&moves(), Some(&first)), moves());
        assert_eq!(suggestion_first(&moves(), None), moves());

        let text = Suggestion {
            stage: RoundStage::FreeText,
            index: None,
            text: "26".into(),
        };
        assert_eq!(suggestion_first(&[], Some(&text)), vec!["26"]);
    }

    #[test]
    fn process_input_requires_a_dataset() {
        let mut session = WhisperSession::new(QueryBuilder::new(ScriptedResponder::default()));
        assert!(matches!(session.process_input("SortBy"), Err(QueryError::NoDataset)));
    }

    #[test]
    fn request_and_conversation_reset_state() {
        let mut session = WhisperSession::new(QueryBuilder::new(ScriptedResponder::new(["0"])));
        session.load_dataset(ingest_csv_from_str("Name,Age\nAlice,30\n", b',').unwrap());
        session.process_input("DropColumn.Age").unwrap();
        assert_eq!(session.pipeline().len(), 1);
        assert_eq!(session.current_table().unwrap().as_deref(), Some("Name\nAlice\n"));

        session.load_user_request("drop the age");
        assert_eq!(session.query(), "");
        assert_eq!(session.builder().port().user_request(), "drop the age");

        session.start_new_conversation();
        assert!(session.pipeline().is_empty());
        assert_eq!(session.current_table().unwrap(), None);
    }
}
