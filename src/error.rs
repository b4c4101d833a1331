//! Error types for Linkle.
//!
//! Everything below the CLI layer reports failures through these enums; the
//! binary wraps them in `eyre` reports.

use std::path::PathBuf;
use std::time::Duration;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Could not determine a data directory; set LINKLE_DATA_DIR")]
    NoDataDir,
}

/// Failures talking to the text-generation service.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error: {status} {status_text} - {body}")]
    Status {
        status: u16,
        status_text: String,
        body: String,
    },

    #[error("response contained no text")]
    EmptyResponse,

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Attempts to break the alternating question/answer log.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("no question is waiting for an answer")]
    NoPendingQuestion,

    #[error("the previous question has not been answered yet")]
    QuestionPending,

    #[error("all {0} questions have already been asked")]
    Exhausted(usize),
}

/// Completion could not produce suggestions.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("please answer all {expected} questions first ({actual} answered)")]
    IncompleteAnswers { expected: usize, actual: usize },

    #[error(transparent)]
    Request(#[from] GenerationError),
}

/// Errors surfaced by the conversation controller.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("no subject selected")]
    NoSubject,

    #[error("answer cannot be empty")]
    EmptyAnswer,

    #[error("cannot {action} while {state}")]
    InvalidState { action: &'static str, state: String },

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Completion(#[from] CompletionError),
}

/// Local key-value persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt data under {key}: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
