//! Error types for the word provider.

/// Why a secret word could not be obtained.
///
/// Every variant means the same thing to the caller: no room gets created.
/// They are kept apart for logging.
#[derive(Debug, thiserror::Error)]
pub enum WordError {
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The request never produced a response (connect error, timeout,
    /// unreadable body).
    #[error("word request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// The provider answered with a non-2xx status.
    #[error("word provider returned status {0}")]
    Status(u16),

    /// The response had no usable `word` field.
    #[error("word provider response has no word")]
    MissingWord,

    /// The word was present but not a usable secret word.
    #[error("word provider returned an invalid word: {0:?}")]
    InvalidWord(String),
}
