//! Human responder on a line-oriented terminal.

use std::io::{BufRead, Write};

use tracing::debug;

use crate::error::{ConversationError, ConversationResult};

use super::{AnswerRequest, ConversationPort, Question};

/// Prints questions to `output` and reads one answer per line from `input`.
///
/// Precomputed answers are echoed without reading; diagnostics are printed as `ERROR: ...`.
pub struct ConsoleResponder<R, W> {
    input: R,
    output: W,
    pending: Option<Question>,
    user_request: String,
}

impl<R: BufRead, W: Write> ConsoleResponder<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            pending: None,
            user_request: String::new(),
        }
    }

    pub fn user_request(&self) -> &str {
        &self.user_request
    }

    /// Consumes the responder, returning its output sink.
    pub fn into_output(self) -> W {
        self.output
    }

    fn read_answer(&mut self) -> ConversationResult<String> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(ConversationError::Closed);
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

impl<R: BufRead, W: Write> ConversationPort for ConsoleResponder<R, W> {
    fn start_new_exchange(&mut self) {
        self.pending = None;
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
        write!(self.output, "{question}")?;
        self.output.flush()?;

        let answer = self.read_answer()?;
        debug!(answer = %answer, "operator answered");
        Ok(answer)
    }

    fn report_error(&mut self, message: &str) -> ConversationResult<()> {
        writeln!(self.output, "ERROR: {message}")?;
        Ok(())
    }
}
