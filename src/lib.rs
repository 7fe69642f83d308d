pub mod annotate;
pub mod auditor;
pub mod cli;
pub mod config;
pub mod error;
pub mod group;
pub mod model;
pub mod pipeline;
pub mod remedy;
pub mod retry;
pub mod site;
pub mod store;
pub mod viewer;

// Re-exports so integration tests and main.rs read naturally.
pub use error::AuditError;
pub use site::SiteId;
