//! DNS resolver initialization.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;

use crate::config::{DNS_RESOLVER_ATTEMPTS, DNS_SERVER_PORT};
use crate::error_handling::InitializationError;

/// Builds the shared hickory resolver.
///
/// With an empty `servers` list the system configuration (`/etc/resolv.conf`)
/// is used, falling back to hickory's defaults when it cannot be read.
/// Otherwise every query goes to `servers` on port 53.
///
/// Search-domain expansion is disabled (`ndots = 0`) so that a bare label is
/// never rewritten into a different name.
///
/// # Errors
///
/// Returns `InitializationError::DnsResolverError` when `timeout` is zero.
pub fn init_resolver(
    timeout: Duration,
    servers: &[IpAddr],
) -> Result<Arc<TokioAsyncResolver>, InitializationError> {
    if timeout.is_zero() {
        return Err(InitializationError::DnsResolverError(
            "resolver timeout must be greater than zero".to_string(),
        ));
    }

    let (config, mut opts) = if servers.is_empty() {
        match hickory_resolver::system_conf::read_system_conf() {
            Ok(system) => system,
            Err(e) => {
                log::warn!("Could not read system DNS configuration, using defaults: {e}");
                (ResolverConfig::default(), ResolverOpts::default())
            }
        }
    } else {
        log::info!("Using custom DNS servers: {servers:?}");
        let group = NameServerConfigGroup::from_ips_clear(servers, DNS_SERVER_PORT, true);
        (
            ResolverConfig::from_parts(None, vec![], group),
            ResolverOpts::default(),
        )
    };

    opts.timeout = timeout;
    opts.attempts = DNS_RESOLVER_ATTEMPTS;
    opts.ndots = 0;

    Ok(Arc::new(TokioAsyncResolver::tokio(config, opts)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_resolver_with_custom_servers() {
        let servers: Vec<IpAddr> = vec!["1.1.1.1".parse().unwrap(), "8.8.8.8".parse().unwrap()];
        assert!(init_resolver(Duration::from_secs(2), &servers).is_ok());
    }

    #[tokio::test]
    async fn test_init_resolver_rejects_zero_timeout() {
        let result = init_resolver(Duration::ZERO, &[]);
        assert!(matches!(
            result,
            Err(InitializationError::DnsResolverError(_))
        ));
    }

    #[tokio::test]
    async fn test_init_resolver_system_defaults() {
        assert!(init_resolver(Duration::from_secs(1), &[]).is_ok());
    }
}
