//! Outbound-URL policy.
//!
//! Every URL the pipeline touches comes straight from a caller's
//! request, so before any fetch — remote scrape or legacy fallback —
//! the target must look like a plain public http(s) job posting.
//! Loopback, private-range and link-local addresses, cloud metadata
//! endpoints, and non-web schemes are refused, and hostnames are
//! re-checked after DNS resolution so a posting URL cannot be pointed
//! at an internal service.

use std::net::IpAddr;
use std::sync::OnceLock;

use crate::error::{SecurityError, SecurityResult};

/// Hostnames that are never fetchable, whatever they resolve to.
const DENIED_HOSTS: &[&str] = &[
    "localhost",
    "127.0.0.1",
    "::1",
    "[::1]",
    "0.0.0.0",
    "metadata.google.internal",
    "instance-data",
];

/// Address ranges an extraction target must not live in: RFC 1918
/// private space, loopback, and link-local (which covers the cloud
/// metadata endpoint), for both address families.
const DENIED_RANGES: &[&str] = &[
    "10.0.0.0/8",
    "172.16.0.0/12",
    "192.168.0.0/16",
    "169.254.0.0/16",
    "127.0.0.0/8",
    "::1/128",
    "fc00::/7",
    "fe80::/10",
];

fn denied_ranges() -> &'static [ipnet::IpNet] {
    static RANGES: OnceLock<Vec<ipnet::IpNet>> = OnceLock::new();
    RANGES.get_or_init(|| {
        DENIED_RANGES
            .iter()
            .map(|cidr| cidr.parse().expect("static CIDR literal"))
            .collect()
    })
}

fn screen_ip(ip: IpAddr) -> SecurityResult<()> {
    if let Some(range) = denied_ranges().iter().find(|r| r.contains(&ip)) {
        return Err(SecurityError::BlockedCidr(format!("{ip} in {range}")));
    }
    Ok(())
}

/// Per-pipeline fetch policy. The static deny tables above always
/// apply; an instance only adds a trust list (fixture servers, internal
/// mirrors) and extra denied hosts on top of them.
#[derive(Debug, Clone, Default)]
pub struct UrlPolicy {
    trusted_hosts: Vec<String>,
    denied_hosts: Vec<String>,
}

impl UrlPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trust a host, exempting it from the deny tables and the DNS
    /// re-check. Meant for tests and trusted internal mirrors.
    pub fn trust_host(mut self, host: impl Into<String>) -> Self {
        self.trusted_hosts.push(host.into());
        self
    }

    /// Deny an additional host.
    pub fn deny_host(mut self, host: impl Into<String>) -> Self {
        self.denied_hosts.push(host.into());
        self
    }

    fn is_trusted(&self, host: &str) -> bool {
        self.trusted_hosts.iter().any(|h| h == host)
    }

    /// Check a URL without touching the network. Returns the parsed URL
    /// so callers fetch exactly what was screened.
    pub fn check(&self, raw: &str) -> SecurityResult<url::Url> {
        let url = url::Url::parse(raw)?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(SecurityError::DisallowedScheme(url.scheme().to_string()));
        }

        let host = url.host_str().ok_or(SecurityError::NoHost)?;
        if !self.is_trusted(host) {
            if DENIED_HOSTS.contains(&host) || self.denied_hosts.iter().any(|h| h == host) {
                return Err(SecurityError::BlockedHost(host.to_string()));
            }
            if let Ok(ip) = host.parse::<IpAddr>() {
                screen_ip(ip)?;
            }
        }

        Ok(url)
    }

    /// Check a URL, then resolve its hostname and screen every address
    /// it points at. Catches DNS rebinding to internal services.
    pub async fn check_resolved(&self, raw: &str) -> SecurityResult<url::Url> {
        let url = self.check(raw)?;

        let host = url.host_str().ok_or(SecurityError::NoHost)?.to_owned();
        // IP literals were screened already; trusted hosts skip the
        // resolution pass entirely.
        if self.is_trusted(&host) || host.parse::<IpAddr>().is_ok() {
            return Ok(url);
        }

        let port = url.port_or_known_default().unwrap_or(443);
        let addrs = tokio::net::lookup_host((host.as_str(), port))
            .await
            .map_err(|e| SecurityError::DnsResolution(e.to_string()))?;

        for addr in addrs {
            screen_ip(addr.ip())?;
        }

        Ok(url)
    }
}
