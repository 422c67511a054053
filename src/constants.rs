// Defaults for the chat service. Every value here can be overridden from the
// command line or the environment, see `config.rs`.

use std::time::Duration;

pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_TEMPERATURE: f64 = 0.3;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 2048;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_RETRIES: u32 = 1;
pub const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Pause between two streamed words.
pub const DEFAULT_STREAM_DELAY_MS: u64 = 100;

/// Prefix put in front of every assistant reply.
pub const ANSWER_PREFIX: &str = "Zestofy: \t ";

pub const DEFAULT_PORT: u16 = 8501;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_STATIC_DIR: &str = "static";

// Matches the sidebar uploader limit of the hosted UI (200MB).
pub const UPLOAD_BODY_LIMIT: usize = 200 * 1024 * 1024;
