//! Docgate - a small HTTP gateway in front of a document search backend
//!
//! Three read-only routes are exposed under `/data`:
//! - fetch a document by identifier, blocking a worker for the round trip
//! - fetch a document by identifier, completing asynchronously
//! - search documents by `first_name`, completing asynchronously
//!
//! Documents are returned as the raw JSON source stored in the backend.

pub mod api;
pub mod backend;
pub mod completion;
pub mod config;
pub mod error;
pub mod gateway;
pub mod query;
pub mod types;

pub use error::{Error, Result};
