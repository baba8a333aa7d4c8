use thiserror::Error;

/// Contract violations raised by the engine.
///
/// Missing tables, links or club identifiers are not errors; they surface as
/// empty results or `None` fields.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("empty document: expected match report or performance page markup")]
    EmptyDocument,
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status} for {url}")]
    HttpStatus { url: String, status: u16 },
    #[error("empty response body from {url}")]
    EmptyBody { url: String },
    #[error("invalid requests_per_second value: {0}")]
    InvalidRateLimit(u32),
    #[error("invalid document: {0}")]
    Document(#[from] EngineError),
    #[error("match report {match_id} failed earlier in this run: {reason}")]
    PreviouslyFailed { match_id: String, reason: String },
}
