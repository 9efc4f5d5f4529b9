//! Secret word provider for Wordduel.
//!
//! The relay never picks words itself. It asks a [`WordProvider`] for one
//! word of a given length and treats any failure as "cannot create a room".
//!
//! - [`HttpWordProvider`]: calls the word API over HTTP (production)
//! - [`StaticWordProvider`]: always returns the same word (dev and tests)

mod error;
mod http;
mod provider;

pub use error::WordError;
pub use http::{HttpWordProvider, WORD_ENDPOINT};
pub use provider::{StaticWordProvider, WordProvider, normalize_word};
