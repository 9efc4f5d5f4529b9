//! Wordduel relay server.
//!
//! ```sh
//! WORDLE_API_URL=http://localhost:3000 PORT=3005 cargo run --bin wordduel-server
//! ```

use clap::Parser;
use wordduel::{ServerConfig, WordDuelError, WordDuelServerBuilder, setup_logger};
use wordduel_words::HttpWordProvider;

#[tokio::main]
async fn main() -> Result<(), WordDuelError> {
    let config = ServerConfig::parse();
    setup_logger(env!("CARGO_BIN_NAME"), &config.log_level);

    let words = HttpWordProvider::new(&config.word_api_url, config.word_api_timeout())?;
    tracing::info!(word_api = words.url(), "using word provider");

    let server = WordDuelServerBuilder::new()
        .bind(&config.bind_addr())
        .room_config(config.room_config())
        .handshake_timeout(config.handshake_timeout())
        .build(words)
        .await?;

    server.run().await
}
