//! Port traits. API boundaries for the hexagon.
//!
//! - Inbound: Called by the intake loop into the application
//! - Outbound: Called by application into infrastructure

pub mod inbound;
pub mod outbound;

pub use inbound::MessageHandler;
pub use outbound::{ChatPort, SourcePort, UpdatesPort, UsageCounterPort};
