//! Conversation port: who answers the next question of a query-building pass.
//!
//! The query builder talks to a [`ConversationPort`] only. Three responders implement it:
//!
//! - [`interactive::ConsoleResponder`]: a human on a terminal (any `BufRead` + `Write` pair)
//! - [`automated::ChatAgent`]: a chat-completion model steered by the user's request
//! - [`scripted::ScriptedResponder`]: canned answers, for tests and demos
//!
//! Answers are plain text. For choice rounds the expected answer is a choice index; for free-text
//! rounds it is the value itself.

pub mod automated;
pub mod interactive;
pub mod openai;
pub mod scripted;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConversationResult;

pub use automated::{ChatAgent, ChatBackend, ChatMessage, ChatRole};
pub use interactive::ConsoleResponder;
pub use openai::{ChatOptions, OpenAiBackend};
pub use scripted::ScriptedResponder;

/// A prompt with an optional numbered choice list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub prompt: String,
    /// Empty for free-text rounds.
    pub choices: Vec<String>,
}

impl Question {
    pub fn new(prompt: impl Into<String>, choices: Vec<String>) -> Self {
        Self {
            prompt: prompt.into(),
            choices,
        }
    }

    pub fn free_text(prompt: impl Into<String>) -> Self {
        Self::new(prompt, Vec::new())
    }

    /// Renders the prompt followed by one `> [i] choice` line per choice and a blank line.
    pub fn render(&self) -> String {
        let mut out = format!("{}\n", self.prompt);
        for (i, choice) in self.choices.iter().enumerate() {
            out.push_str(&format!("> [{i}] {choice}\n"));
        }
        out.push('\n');
        out
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Echoed for a typed token that matches none of the round's choices.
pub const NO_MATCH: &str = "-1";

/// A typed token the caller already supplied for the current round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Precomputed {
    pub token: String,
    /// Position of `token` in the round's choices, if it is one of them.
    pub index: Option<usize>,
}

/// Parameters of [`ConversationPort::answer`].
#[derive(Debug, Clone)]
pub struct AnswerRequest<'a> {
    /// The full token string of the pass, for context.
    pub query_so_far: &'a str,
    pub precomputed: Option<Precomputed>,
    pub expect_free_text: bool,
}

impl AnswerRequest<'_> {
    /// What a precomputed answer echoes back, or `None` when the round must be asked live.
    ///
    /// Choice rounds echo the choice index, or [`NO_MATCH`] when the token is not one of the
    /// choices, so validation rejects it even when the token itself looks like an index.
    /// Free-text rounds echo the token.
    pub fn echo(&self) -> Option<String> {
        self.precomputed.as_ref().map(|p| match (self.expect_free_text, p.index) {
            (true, _) => p.token.clone(),
            (false, Some(index)) => index.to_string(),
            (false, None) => NO_MATCH.to_string(),
        })
    }
}

/// Abstraction over the party answering a pass's questions.
pub trait ConversationPort {
    /// Discards prior conversation context. Called once at the start of every pass.
    fn start_new_exchange(&mut self);

    /// Stores the user's free-form request and resets the exchange.
    fn set_user_request(&mut self, request: &str);

    /// Stores the question for the next [`ConversationPort::answer`].
    fn ask(&mut self, question: Question);

    /// Answers the pending question: echoes a precomputed answer, or asks the responder.
    fn answer(&mut self, request: AnswerRequest<'_>) -> ConversationResult<String>;

    /// Surfaces a diagnostic about the previous answer.
    fn report_error(&mut self, message: &str) -> ConversationResult<()>;
}

impl<P: ConversationPort + ?Sized> ConversationPort for Box<P> {
    fn start_new_exchange(&mut self) {
        (**self).start_new_exchange()
    }

    fn set_user_request(&mut self, request: &str) {
        (**self).set_user_request(request)
    }

    fn ask(&mut self, question: Question) {
        (**self).ask(question)
    }

    fn answer(&mut self, request: AnswerRequest<'_>) -> ConversationResult<String> {
        (**self).answer(request)
    }

    fn report_error(&mut self, message: &str) -> ConversationResult<()> {
        (**self).report_error(message)
    }
}
