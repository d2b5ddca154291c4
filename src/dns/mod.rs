//! DNS resolution and record querying.
//!
//! This module provides async DNS operations behind a pluggable backend:
//! - [`DnsResolver`]: single, named, reverse and bulk lookups with timeouts
//! - [`DnsBackend`]: the seam between resolution logic and the wire
//! - [`HickoryBackend`]: `hickory-resolver`, system or custom name servers
//! - [`StaticBackend`]: a fixed in-memory zone
//!
//! Resolution never fails outright; every outcome is a [`ResolutionResult`].

mod backend;
mod memory;
mod resolver;
mod types;

// Re-export public API
pub use backend::{DnsBackend, HickoryBackend};
pub use memory::StaticBackend;
pub use resolver::{DnsResolver, ResolverOptions};
pub use types::{DnsQuery, DnsRecord, RecordType, ResolutionResult, ResolutionStatus};
