//! # Wordduel
//!
//! Relay server for head-to-head Wordle matches.
//!
//! A host creates a room and gets a secret word; a guest joins by room id
//! and gets the same word. Guesses are forwarded between the two, and the
//! room is torn down after both finish, after an idle deadline, or when
//! either side disconnects.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use wordduel::WordDuelServerBuilder;
//! use wordduel_words::HttpWordProvider;
//!
//! # async fn demo() -> Result<(), wordduel::WordDuelError> {
//! let words = HttpWordProvider::new("http://localhost:3000", Duration::from_secs(10))?;
//! let server = WordDuelServerBuilder::new()
//!     .bind("0.0.0.0:3005")
//!     .build(words)
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod logger;
mod server;

pub use config::ServerConfig;
pub use error::WordDuelError;
pub use logger::setup_logger;
pub use server::{DEFAULT_HANDSHAKE_TIMEOUT, WordDuelServer, WordDuelServerBuilder};
