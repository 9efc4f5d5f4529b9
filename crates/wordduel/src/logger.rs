//! Tracing subscriber setup for the server binary.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Crates whose spans and events are shown at the default level.
const CRATES: [&str; 5] = [
    "wordduel",
    "wordduel_transport",
    "wordduel_protocol",
    "wordduel_words",
    "wordduel_room",
];

/// Installs the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise every Wordduel crate and the binary
/// log at `default_level`.
pub fn setup_logger(binary_name: &str, default_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directives(binary_name, default_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn default_directives(binary_name: &str, level: &str) -> String {
    CRATES
        .iter()
        .copied()
        .chain(std::iter::once(binary_name))
        .map(|target| format!("{}={level}", target.replace('-', "_")))
        .collect::<Vec<_>>()
        .join(",")
}
