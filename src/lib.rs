// Library root: exposes the sections, session model and providers for the
// binary and for integration tests. The binary entry point is src/main.rs.

pub mod agents;
pub mod commands;
pub mod comms;
pub mod config;
pub mod error;
pub mod llm;
pub mod logger;
pub mod prompts;
pub mod session;

#[cfg(feature = "section-data")]
pub mod dataset;
#[cfg(feature = "section-docs")]
pub mod extract;
