//! Inbound port. The intake loop calls into the application.

use crate::domain::InboundMessage;

/// Handles one inbound message end to end. Never fails: every error is
/// either turned into a reply or logged.
#[async_trait::async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, message: InboundMessage);
}
