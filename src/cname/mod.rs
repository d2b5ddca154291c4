//! CNAME chain tracing and chain health analysis.

mod analysis;
mod tracer;

pub use analysis::{get_cname_chain_stats, validate_cname_chain, ChainStats, ChainValidation};
pub use tracer::{
    normalize_name, ChainTermination, CnameChainResult, CnameChainTracer, MultiTraceOptions,
    TraceOptions,
};

#[cfg(test)]
mod tests;
