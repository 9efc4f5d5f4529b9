//! Process configuration, read from command-line flags with environment
//! variable fallbacks.

use std::time::Duration;

use clap::Parser;
use wordduel_room::RoomConfig;

/// Runtime settings for the relay server.
#[derive(Debug, Clone, Parser)]
#[command(name = "wordduel-server", version, about = "WebSocket relay for Wordle duels")]
pub struct ServerConfig {
    /// Interface to listen on.
    #[arg(short = 'H', long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// TCP port to listen on.
    #[arg(short = 'p', long, env = "PORT", default_value_t = 3005)]
    pub port: u16,

    /// Origin of the word API; `/api/word` is appended.
    #[arg(long, env = "WORDLE_API_URL", default_value = "http://localhost:3000")]
    pub word_api_url: String,

    /// Seconds a room may live before both players finish.
    #[arg(long, env = "ROOM_IDLE_EXPIRY_SECS", default_value_t = 600)]
    pub idle_expiry_secs: u64,

    /// Seconds between both players finishing and teardown.
    #[arg(long, env = "ROOM_COOLDOWN_SECS", default_value_t = 30)]
    pub cooldown_secs: u64,

    /// Length of the secret word requested from the word API.
    #[arg(long, env = "WORD_LENGTH", default_value_t = 5)]
    pub word_length: usize,

    /// Word API request timeout in seconds.
    #[arg(long, env = "WORD_API_TIMEOUT_SECS", default_value_t = 10)]
    pub word_api_timeout_secs: u64,

    /// Seconds an accepted socket may take to finish its WebSocket upgrade.
    #[arg(long, env = "HANDSHAKE_TIMEOUT_SECS", default_value_t = 10)]
    pub handshake_timeout_secs: u64,

    /// Default log level when `RUST_LOG` is unset.
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl ServerConfig {
    /// `host:port`, ready for [`WordDuelServerBuilder::bind`](crate::WordDuelServerBuilder::bind).
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn word_api_timeout(&self) -> Duration {
        Duration::from_secs(self.word_api_timeout_secs)
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.handshake_timeout_secs)
    }

    /// The room-layer settings derived from this configuration.
    pub fn room_config(&self) -> RoomConfig {
        RoomConfig {
            idle_expiry: Duration::from_secs(self.idle_expiry_secs),
            cooldown: Duration::from_secs(self.cooldown_secs),
            word_length: self.word_length,
        }
    }
}
