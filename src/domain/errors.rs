//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    /// Network failure or non-success HTTP status from an upstream source.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Upstream payload was malformed or not shaped as expected.
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Counter store error: {0}")]
    CounterStore(String),

    /// Chat transport failure (polling updates or sending a reply).
    #[error("Chat channel error: {0}")]
    Channel(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
