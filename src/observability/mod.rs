//! Observability subsystem.
//!
//! Structured log events from every subsystem flow through `tracing`;
//! `logging.rs` installs the subscriber. Request spans carry the request ID.

pub mod logging;
