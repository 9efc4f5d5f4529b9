//! The [`WordProvider`] trait and an in-process implementation.

use crate::WordError;

/// Supplies the secret word for a new room.
///
/// # Trait bounds
///
/// - `Send + Sync + 'static` → one provider is shared by every connection
///   task for the lifetime of the server.
/// - The returned future is `Send` so callers can await it inside
///   `tokio::spawn`ed tasks.
///
/// # Example
///
/// ```rust
/// use wordduel_words::{WordError, WordProvider, normalize_word};
///
/// /// Cycles through a fixed list.
/// struct ListProvider(Vec<&'static str>);
///
/// impl WordProvider for ListProvider {
///     async fn fetch_word(&self, length: usize) -> Result<String, WordError> {
///         let raw = self.0.first().ok_or(WordError::MissingWord)?;
///         normalize_word(raw, length)
///     }
/// }
/// ```
pub trait WordProvider: Send + Sync + 'static {
    /// Returns one uppercase secret word of exactly `length` letters.
    ///
    /// Never panics; every failure mode is a [`WordError`].
    fn fetch_word(
        &self,
        length: usize,
    ) -> impl std::future::Future<Output = Result<String, WordError>> + Send;
}

/// Always answers with the same word. Useful for local play and tests.
#[derive(Debug, Clone)]
pub struct StaticWordProvider {
    word: String,
}

impl StaticWordProvider {
    /// Creates a provider that always returns `word`.
    pub fn new(word: impl Into<String>) -> Self {
        Self { word: word.into() }
    }
}

impl WordProvider for StaticWordProvider {
    async fn fetch_word(&self, length: usize) -> Result<String, WordError> {
        normalize_word(&self.word, length)
    }
}

/// Trims and uppercases a raw word, rejecting anything that is not exactly
/// `length` ASCII letters.
pub fn normalize_word(raw: &str, length: usize) -> Result<String, WordError> {
    let word = raw.trim();
    if word.is_empty() {
        return Err(WordError::MissingWord);
    }
    if word.chars().count() != length || !word.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(WordError::InvalidWord(word.to_string()));
    }
    Ok(word.to_ascii_uppercase())
}
