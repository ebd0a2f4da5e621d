//! OpenAI-compatible chat-completions backend over blocking HTTP.

use std::env;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConversationError, ConversationResult};

use super::automated::{ChatBackend, ChatMessage};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Connection and sampling settings for [`OpenAiBackend`].
#[derive(Clone)]
pub struct ChatOptions {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub top_p: f32,
    pub timeout: Duration,
}

impl fmt::Debug for ChatOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatOptions")
            .field("api_key_set", &!self.api_key.is_empty())
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("top_p", &self.top_p)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            top_p: 0.0,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ChatOptions {
    /// Reads `OPENAI_API_KEY` (required), `WHISPER_MODEL`, `WHISPER_BASE_URL` and
    /// `WHISPER_TIMEOUT_SECS` from the process environment.
    ///
    /// Callers that use a `.env` file load it first.
    pub fn from_env() -> ConversationResult<Self> {
        Self::from_env_with_key(None)
    }

    /// Like [`ChatOptions::from_env`], but an explicit `api_key` takes precedence over
    /// `OPENAI_API_KEY`.
    pub fn from_env_with_key(api_key: Option<String>) -> ConversationResult<Self> {
        let api_key = api_key
            .or_else(|| env::var("OPENAI_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConversationError::Backend("OPENAI_API_KEY is not set".to_string()))?;

        let mut options = Self {
            api_key,
            ..Self::default()
        };
        if let Ok(model) = env::var("WHISPER_MODEL") {
            options.model = model;
        }
        if let Ok(url) = env::var("WHISPER_BASE_URL") {
            options.base_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(secs) = env::var("WHISPER_TIMEOUT_SECS") {
            let secs = secs.trim().parse::<u64>().map_err(|e| {
                ConversationError::Backend(format!("WHISPER_TIMEOUT_SECS {secs:?}: {e}"))
            })?;
            options.timeout = Duration::from_secs(secs);
        }
        Ok(options)
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    top_p: f32,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Posts the whole history to `{base_url}/chat/completions` and returns the first choice.
pub struct OpenAiBackend {
    client: reqwest::blocking::Client,
    options: ChatOptions,
}

impl OpenAiBackend {
    pub fn new(options: ChatOptions) -> ConversationResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(options.timeout)
            .build()?;
        Ok(Self { client, options })
    }

    pub fn options(&self) -> &ChatOptions {
        &self.options
    }
}

impl ChatBackend for OpenAiBackend {
    fn complete(&self, messages: &[ChatMessage]) -> ConversationResult<String> {
        let body = CompletionRequest {
            model: &self.options.model,
            top_p: self.options.top_p,
            messages,
        };
        debug!(model = %self.options.model, messages = messages.len(), "chat completion request");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.options.base_url))
            .bearer_auth(&self.options.api_key)
            .json(&body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(ConversationError::Backend(format!("{status}: {text}")));
        }

        let text = response.text()?;
        parse_completion(&text)
    }
}

fn parse_completion(body: &str) -> ConversationResult<String> {
    let parsed: CompletionResponse = serde_json::from_str(body)?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| ConversationError::Backend("no content in completion response".to_string()))
}

#[cfg(test)]
mod tests {
    use super::{parse_completion, ChatOptions, CompletionRequest};
    use crate::conversation::ChatMessage;
    use crate::error::ConversationError;

    #[test]
    fn request_body_has_wire_shape() {
        let messages = vec![ChatMessage::system("s"), ChatMessage::user("u")];
        let body = CompletionRequest {
            model: "m",
            top_p: 0.0,
            messages: &messages,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "model": "m",
                "top_p": 0.0,
                "messages": [
                    {"role": "system", "content": "s"},
                    {"role": "user", "content": "u"}
                ]
            })
        );
    }

    #[test]
    fn first_choice_content_is_the_reply() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"2"}},{"message":{"content":"9"}}]}"#;
        assert_eq!(parse_completion(body).unwrap(), "2");
    }

    #[test]
    fn missing_content_is_a_backend_error() {
        assert!(matches!(
            parse_completion(r#"{"choices":[]}"#).unwrap_err(),
            ConversationError::Backend(_)
        ));
        assert!(matches!(parse_completion("nope").unwrap_err(), ConversationError::Json(_)));
    }

    #[test]
    fn defaults_use_zero_top_p() {
        let opts = ChatOptions::default();
        assert_eq!(opts.top_p, 0.0);
        assert!(format!("{opts:?}").contains("api_key_set: false"));
    }
}
