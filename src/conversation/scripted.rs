//! Canned responder that records what it was asked.

use std::collections::VecDeque;

use crate::error::{ConversationError, ConversationResult};

use super::{AnswerRequest, ConversationPort, Question};

/// Replays a fixed list of live answers in order.
///
/// Precomputed answers are echoed like every other responder does. Each live round consumes one
/// scripted answer; an exhausted script answers with [`ConversationError::Closed`].
#[derive(Debug, Default, Clone)]
pub struct ScriptedResponder {
    answers: VecDeque<String>,
    pending: Option<Question>,
    user_request: String,
    /// Questions that were put to the responder live, in order.
    pub live_questions: Vec<Question>,
    /// Diagnostics received through `report_error`, in order.
    pub diagnostics: Vec<String>,
    /// Number of times `start_new_exchange` ran (directly or via `set_user_request`).
    pub exchanges: usize,
}

impl ScriptedResponder {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Appends more live answers to the script.
    pub fn push_answer(&mut self, answer: impl Into<String>) {
        self.answers.push_back(answer.into());
    }

    pub fn live_calls(&self) -> usize {
        self.live_questions.len()
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }

    pub fn user_request(&self) -> &str {
        &self.user_request
    }
}

impl ConversationPort for ScriptedResponder {
    fn start_new_exchange(&mut self) {
        self.pending = None;
        self.exchanges += 1;
    }

    fn set_user_request(&mut self, request: &str) {
        self.start_new_exchange();
        self.user_request = request.to_string();
    }

    fn ask(&mut self, question: Question) {
        self.pending = Some(question);
    }

    fn answer(&mut self, request: AnswerRequest<'_>) -> ConversationResult<String> {
        let question = self.pending.take();
        if let Some(echo) = request.echo() {
            return Ok(echo);
        }

        let question = question.ok_or(ConversationError::NoPendingQuestion)?;
        self.live_questions.push(question);
        self.answers.pop_front().ok_or(ConversationError::Closed)
    }

    fn report_error(&mut self, message: &str) -> ConversationResult<()> {
        self.diagnostics.push(message.to_string());
        Ok(())
    }
}
