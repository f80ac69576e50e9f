//! Client side of waystation.
//!
//! This crate provides the upstream fetch pipeline and the intercept engine
//! (classification, caching strategies, generation lifecycle) shared by the
//! server binary.

pub mod fetch;
pub mod intercept;

pub use fetch::{FetchClient, FetchConfig, FetchError, Fetcher};
pub use intercept::{
    InstallReport, Interceptor, Phase, Route, Strategy, SweepFailure, SweepReport, classify, sweep,
};
