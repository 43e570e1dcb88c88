//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::{DomainError, InboundMessage, OutboundReply, Sender};

/// Upstream JSON source. One GET per call, no retries.
#[async_trait::async_trait]
pub trait SourcePort: Send + Sync {
    /// Fetch the raw response body. Network failures and non-success statuses
    /// are reported as `DomainError::Transport`.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, DomainError>;
}

/// Chat transport, sending side.
#[async_trait::async_trait]
pub trait ChatPort: Send + Sync {
    async fn send(&self, reply: &OutboundReply) -> Result<(), DomainError>;
}

/// Chat transport, receiving side.
#[async_trait::async_trait]
pub trait UpdatesPort: Send + Sync {
    /// Wait for the next batch of text messages. May return an empty batch
    /// when the long poll times out.
    async fn poll(&self) -> Result<Vec<InboundMessage>, DomainError>;
}

/// Per-user request tally.
#[async_trait::async_trait]
pub trait UsageCounterPort: Send + Sync {
    /// Create the user's record with a count of 1, or add 1 to the existing count.
    async fn ensure_user_and_increment(&self, sender: &Sender) -> Result<(), DomainError>;
}
