//! Application use cases. Orchestrate domain logic via ports.

pub mod decoder;
pub mod dispatcher;
pub mod formatter;
pub mod intake_service;

pub use dispatcher::{Dispatcher, Endpoints};
pub use intake_service::IntakeService;
