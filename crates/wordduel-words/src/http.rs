//! HTTP word provider backed by `reqwest`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{WordError, WordProvider, normalize_word};

/// Path of the word endpoint, relative to the provider origin.
pub const WORD_ENDPOINT: &str = "/api/word";

#[derive(Serialize)]
struct WordRequest {
    length: usize,
}

#[derive(Deserialize)]
struct WordResponse {
    word: Option<String>,
}

/// Fetches secret words with `POST {origin}/api/word`.
///
/// The request body is `{"length": N}` and the response must be a JSON
/// object with a `word` string. Anything else is a [`WordError`].
#[derive(Debug, Clone)]
pub struct HttpWordProvider {
    client: reqwest::Client,
    url: String,
}

impl HttpWordProvider {
    /// Creates a provider for the given origin, e.g. `http://localhost:3000`.
    ///
    /// `timeout` bounds the whole request so a hung provider cannot stall
    /// the requesting connection indefinitely.
    pub fn new(origin: &str, timeout: Duration) -> Result<Self, WordError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(WordError::Client)?;
        let url = format!("{}{}", origin.trim_end_matches('/'), WORD_ENDPOINT);
        tracing::info!(%url, "word provider configured");
        Ok(Self { client, url })
    }

    /// The full URL requests are sent to.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl WordProvider for HttpWordProvider {
    async fn fetch_word(&self, length: usize) -> Result<String, WordError> {
        tracing::debug!(url = %self.url, length, "fetching word");

        let resp = self
            .client
            .post(&self.url)
            .json(&WordRequest { length })
            .send()
            .await
            .map_err(WordError::Request)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(WordError::Status(status.as_u16()));
        }

        let body: WordResponse = resp.json().await.map_err(WordError::Request)?;
        let raw = body.word.ok_or(WordError::MissingWord)?;
        normalize_word(&raw, length)
    }
}
