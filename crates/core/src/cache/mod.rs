//! SQLite-backed named response stores.
//!
//! This module provides durable, independently named stores using SQLite
//! with async access via tokio-rusqlite. It supports:
//!
//! - Request keys derived from the SHA-256 of the canonical target
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Whole-store deletion for generation sweeps

pub mod connection;
pub mod hash;
pub mod migrations;
pub mod store;

pub use crate::Error;

pub use connection::CacheDb;
pub use store::{Store, StoreSummary};
