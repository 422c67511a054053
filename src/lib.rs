//! Zestofy: a marketing-only chat bot in front of a hosted Gemini model.
//!
//! A turn appends the user's message to the session [`transcript`], sends the
//! serialized transcript and the query through the fixed [`prompt`] to the
//! model ([`inference`]), records the prefixed reply, and replays it word by
//! word ([`streaming`]). [`web_server`] and [`chat`] are the two front-ends.

pub mod chat;
pub mod config;
pub mod constants;
pub mod error;
pub mod inference;
pub mod prompt;
pub mod streaming;
pub mod transcript;
pub mod turn;
pub mod web_server;

pub use config::Settings;
pub use error::{ConfigError, InferenceError};
pub use inference::{GeminiClient, InferenceClient};
pub use transcript::{Message, Role, Transcript};
pub use turn::{ChatSession, TurnProcessor};
