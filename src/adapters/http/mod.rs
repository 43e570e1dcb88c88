//! Upstream JSON sources over HTTP.

pub mod source_client;

pub use source_client::HttpSourceClient;
