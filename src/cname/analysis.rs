//! Chain validation and aggregate health.

use serde::Serialize;

use super::tracer::{ChainTermination, CnameChainResult};
use crate::config::{
    HEALTH_LONG_CHAIN_PENALTY, HEALTH_LOOP_PENALTY, HEALTH_MAX_DEPTH_PENALTY,
    LONG_CHAIN_THRESHOLD, SLOW_TRACE_THRESHOLD_MS,
};

/// Findings for a single chain. `is_valid` is true exactly when `issues` is
/// empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainValidation {
    pub is_valid: bool,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Aggregate figures over many chains.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainStats {
    pub total_chains: usize,
    pub average_depth: f64,
    pub max_depth: usize,
    pub loop_count: usize,
    pub depth_limited_count: usize,
    pub long_chain_count: usize,
    pub average_resolution_time_ms: f64,
    /// 0 to 100, higher is healthier.
    pub health_score: f64,
}

fn is_long(result: &CnameChainResult) -> bool {
    result.chain.len() > LONG_CHAIN_THRESHOLD
}

pub fn validate_cname_chain(result: &CnameChainResult) -> ChainValidation {
    let mut issues = Vec::new();
    let mut recommendations = Vec::new();

    if result.has_loop {
        issues.push(format!(
            "CNAME loop detected: {}",
            result.chain.join(" -> ")
        ));
        recommendations.push("Break the loop so that the chain ends at an address record".to_string());
    }

    if result.max_depth_reached {
        issues.push(format!(
            "Chain was cut off after {} names",
            result.chain.len()
        ));
        recommendations.push("Point the alias closer to its canonical target".to_string());
    } else if is_long(result) {
        issues.push(format!(
            "Long CNAME chain ({} names) adds a lookup per hop",
            result.chain.len()
        ));
        recommendations.push("Flatten the chain to reduce resolution latency".to_string());
    }

    if let ChainTermination::LookupFailed { message } = &result.termination {
        if result.chain.len() > 1 {
            if let Some(last) = result.chain.last() {
                issues.push(format!("Dangling CNAME: {last} does not resolve ({message})"));
                recommendations.push(format!("Remove or update the CNAME pointing to {last}"));
            }
        }
    }

    if result.resolution_time_ms > SLOW_TRACE_THRESHOLD_MS {
        issues.push(format!(
            "Slow resolution: {:.0}ms",
            result.resolution_time_ms
        ));
        recommendations.push("Check the responsiveness of the authoritative servers".to_string());
    }

    ChainValidation {
        is_valid: issues.is_empty(),
        issues,
        recommendations,
    }
}

/// Aggregates chain results.
///
/// `health_score = 100 - 50*loop_rate - 30*depth_limited_rate - 20*long_rate`,
/// clamped to `0..=100`. An empty slice scores 100.
pub fn get_cname_chain_stats(results: &[CnameChainResult]) -> ChainStats {
    let total = results.len();
    if total == 0 {
        return ChainStats {
            total_chains: 0,
            average_depth: 0.0,
            max_depth: 0,
            loop_count: 0,
            depth_limited_count: 0,
            long_chain_count: 0,
            average_resolution_time_ms: 0.0,
            health_score: 100.0,
        };
    }

    let loop_count = results.iter().filter(|r| r.has_loop).count();
    let depth_limited_count = results.iter().filter(|r| r.max_depth_reached).count();
    let long_chain_count = results.iter().filter(|r| is_long(r)).count();
    let total_depth: usize = results.iter().map(|r| r.chain.len()).sum();
    let total_time: f64 = results.iter().map(|r| r.resolution_time_ms).sum();

    let n = total as f64;
    let health_score = (100.0
        - HEALTH_LOOP_PENALTY * (loop_count as f64 / n)
        - HEALTH_MAX_DEPTH_PENALTY * (depth_limited_count as f64 / n)
        - HEALTH_LONG_CHAIN_PENALTY * (long_chain_count as f64 / n))
        .clamp(0.0, 100.0);

    ChainStats {
        total_chains: total,
        average_depth: total_depth as f64 / n,
        max_depth: results.iter().map(|r| r.chain.len()).max().unwrap_or(0),
        loop_count,
        depth_limited_count,
        long_chain_count,
        average_resolution_time_ms: total_time / n,
        health_score,
    }
}
