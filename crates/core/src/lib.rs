//! Core types and shared functionality for waystation.
//!
//! This crate provides:
//! - Request/response model with buffered bodies
//! - Named response stores with a SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod request;
pub mod response;

pub use cache::{CacheDb, Store, StoreSummary};
pub use config::{AppConfig, ConfigError, Policy};
pub use error::Error;
pub use request::Request;
pub use response::Response;

pub use bytes::Bytes;
pub use http::{HeaderMap, Method, StatusCode, header};
