//! Automated responder backed by a chat-completion model.
//!
//! Every exchange starts from a fixed role script and a worked example. Precomputed answers are
//! appended to the history so the model sees the whole query as it is replayed; a live round adds
//! the user's request, the query so far and the numbered question before calling the backend.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ConversationError, ConversationResult};

use super::{AnswerRequest, ConversationPort, Question};

const ROLE_SCRIPT: &str = "Build a trasformation query sequentially from left to right. \
You always get all next possible actions and you must always choose one.";

const WORKED_EXAMPLE: &str = "Let me show you an example: \n\
Sort the people by their names and filter out those born outside Prague. \n\
First step would be built like: \n\
> [0] SortBy, \n\
> [1] FilterBy, \n\
> [2] GroupBy, \n\
> [3] DropColumn \n\
Your answer: \n\
0";

const ANSWER_RULE: &str = "Only answer with a number from the brackets. \
If the answer should not be a number, write the whole appropriate word.";

const ANSWER_WITH_NUMBER: &str = "Answer the apropriate number!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One message of a chat history, in the wire shape of chat-completion APIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// A chat-completion endpoint: full history in, one reply out.
pub trait ChatBackend {
    fn complete(&self, messages: &[ChatMessage]) -> ConversationResult<String>;
}

impl<B: ChatBackend + ?Sized> ChatBackend for &B {
    fn complete(&self, messages: &[ChatMessage]) -> ConversationResult<String> {
        (**self).complete(messages)
    }
}

/// Conversation port answered by a [`ChatBackend`].
pub struct ChatAgent<B> {
    backend: B,
    history: Vec<ChatMessage>,
    user_request: String,
    pending: Option<Question>,
}

impl<B: ChatBackend> ChatAgent<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            history: seed(),
            user_request: String::new(),
            pending: None,
        }
    }

    /// Messages of the current exchange, oldest first.
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn user_request(&self) -> &str {
        &self.user_request
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

fn seed() -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(ROLE_SCRIPT),
        ChatMessage::system(WORKED_EXAMPLE),
        ChatMessage::system(ANSWER_RULE),
    ]
}

impl<B: ChatBackend> ConversationPort for ChatAgent<B> {
    fn start_new_exchange(&mut self) {
        self.history = seed();
        self.pending = None;
    }

    fn set_user_request(&mut self, request: &str) {
        self.start_new_exchange();
        self.user_request = request.to_string();
        info!(request, "user request set");
    }

    fn ask(&mut self, question: Question) {
        self.pending = Some(question);
    }

    fn answer(&mut self, request: AnswerRequest<'_>) -> ConversationResult<String> {
        let question = self.pending.take();

        if let Some(echo) = request.echo() {
            if let Some(q) = question {
                self.history.push(ChatMessage::user(q.render()));
            }
            self.history.push(ChatMessage::user(echo.clone()));
            return Ok(echo);
        }

        let question = question.ok_or(ConversationError::NoPendingQuestion)?;
        self.history
            .push(ChatMessage::user(format!("User initial input is: {}", self.user_request)));
        self.history
            .push(ChatMessage::user(format!("The query build so far: {}", request.query_so_far)));
        self.history.push(ChatMessage::user(question.render()));
        if !request.expect_free_text {
            self.history.push(ChatMessage::user(ANSWER_WITH_NUMBER));
        }

        let reply = self.backend.complete(&self.history)?;
        self.history.push(ChatMessage::assistant(reply.clone()));

        let reply = reply.trim().to_string();
        debug!(reply = %reply, messages = self.history.len(), "model answered");
        Ok(reply)
    }

    fn report_error(&mut self, message: &str) -> ConversationResult<()> {
        self.history.push(ChatMessage::user(format!("ERROR: {message}")));
        Ok(())
    }
}
