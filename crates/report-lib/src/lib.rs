//! Cluster capacity report library
//!
//! This crate provides the core functionality for:
//! - Querying Prism Central inventory and grouped metrics
//! - Decoding interleaved group results into per-cluster series
//! - Computing RF2-adjusted usable storage utilization
//! - Joining everything into one report row per cluster
//! - Fail-stop coordination across many Prism Central instances

pub mod assembler;
pub mod client;
pub mod coordinator;
pub mod decoder;
pub mod directory;
pub mod error;
pub mod fetcher;
pub mod models;
pub mod observability;
pub mod storage;

pub use client::{ClientConfig, PrismApi, PrismClient};
pub use coordinator::{PollerConfig, ReportSink, RunCoordinator, RunFailure, RunStage};
pub use error::{ReportError, ReportResult};
pub use models::*;
pub use observability::StructuredLogger;
