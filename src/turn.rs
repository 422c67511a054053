//! One conversational turn: record the user message, ask the model, record the
//! reply.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::config::Settings;
use crate::constants::ANSWER_PREFIX;
use crate::error::InferenceError;
use crate::inference::InferenceClient;
use crate::prompt::{PromptRequest, PromptTemplate, MARKETING_CHATBOT};
use crate::transcript::{Message, Transcript};

/// Turns `(history, query)` into an answer through the model. Holds no
/// per-session state and is shared by every session.
pub struct TurnProcessor {
    client: Arc<dyn InferenceClient>,
    template: &'static PromptTemplate,
    max_retries: u32,
    retry_backoff: Duration,
}

impl TurnProcessor {
    pub fn new(client: Arc<dyn InferenceClient>, settings: &Settings) -> Self {
        Self {
            client,
            template: &MARKETING_CHATBOT,
            max_retries: settings.max_retries,
            retry_backoff: settings.retry_backoff,
        }
    }

    pub fn with_retries(mut self, max_retries: u32, retry_backoff: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_backoff = retry_backoff;
        self
    }

    #[instrument(skip(self, history), fields(history_len = history.len()))]
    pub async fn answer(&self, history: &str, query: &str) -> Result<String, InferenceError> {
        let request = PromptRequest { history: history.to_string(), query: query.to_string() };
        let prompt = self.template.render(&request);

        let mut attempt = 0;
        let completion = loop {
            match self.client.complete(&prompt).await {
                Ok(completion) => break completion,
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(error = %e, attempt, "Model request failed, retrying");
                    tokio::time::sleep(self.retry_backoff).await;
                }
                Err(e) => return Err(e),
            }
        };

        Ok(self.template.extract_answer(&completion).answer)
    }
}

/// One user's conversation: a transcript plus the shared processor.
pub struct ChatSession {
    processor: Arc<TurnProcessor>,
    transcript: Transcript,
}

impl ChatSession {
    pub fn new(processor: Arc<TurnProcessor>) -> Self {
        Self { processor, transcript: Transcript::new() }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Runs one turn and returns the assistant reply, already prefixed.
    ///
    /// The user message is appended before the model is called, so the
    /// history sent along includes the query itself. When the model call
    /// fails the user message is removed again and the error is returned.
    /// The assistant message is recorded here, before the shell replays it.
    pub async fn submit(&mut self, query: &str) -> Result<String, InferenceError> {
        self.transcript.append(Message::user(query));
        let history = self.transcript.serialize();

        match self.processor.answer(&history, query).await {
            Ok(answer) => {
                let reply = format!("{}{}", ANSWER_PREFIX, answer);
                self.transcript.append(Message::assistant(reply.clone()));
                info!(messages = self.transcript.len(), "Turn completed");
                debug!(transcript = %self.transcript.serialize(), "Message history");
                Ok(reply)
            }
            Err(e) => {
                self.transcript.rollback_user_turn();
                warn!(error = %e, "Turn failed, user message rolled back");
                Err(e)
            }
        }
    }
}
