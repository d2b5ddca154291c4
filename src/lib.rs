//! domain_trace library: bulk DNS resolution and CNAME chain tracing
//!
//! This library reads domain lists in any common text encoding, resolves them
//! with bounded concurrency and retries, and follows CNAME chains to their
//! canonical targets while detecting loops and excessive depth.
//!
//! # Example
//!
//! ```no_run
//! use domain_trace::{run_resolution, Config, RunMode};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     file: std::path::PathBuf::from("domains.csv"),
//!     mode: RunMode::Trace,
//!     ..Default::default()
//! };
//!
//! let report = run_resolution(config).await?;
//! println!("Traced {} domains: {} clean, {} failed",
//!          report.total_domains, report.successful, report.failed);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

pub mod batch;
pub mod cname;
pub mod config;
pub mod dns;
pub mod error_handling;
pub mod ingest;
pub mod initialization;
mod run;

// Re-export public API
pub use config::{Config, LogFormat, LogLevel, Opt, RunMode};
pub use run::{run_resolution, run_resolution_with, RunReport};
