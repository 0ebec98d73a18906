//! SSRF guard for user-supplied URLs.
//!
//! Every URL is resolved before it is fetched and every resolved address is
//! checked. The scraper pins the connection to the checked addresses so a
//! second lookup cannot rebind the host to an internal address.

use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};

use ipnet::IpNet;
use url::Url;

use crate::error::{ExtractError, ExtractResult};

const BLOCKED_NETWORKS: &[&str] = &[
    "10.0.0.0/8",
    "172.16.0.0/12",
    "192.168.0.0/16",
    "127.0.0.0/8",
    "169.254.0.0/16", // link-local, cloud metadata
    "100.64.0.0/10",  // carrier-grade NAT
    "0.0.0.0/8",
    "::1/128",
    "fc00::/7",
    "fe80::/10",
];

/// Special-purpose ranges the std predicates do not cover.
const NON_GLOBAL_NETWORKS: &[&str] = &[
    "192.0.0.0/24",   // IETF protocol assignments
    "198.18.0.0/15",  // benchmarking
    "240.0.0.0/4",    // reserved, includes 255.255.255.254
    "100::/64",       // discard-only
    "2001::/23",      // IETF protocol assignments
    "64:ff9b:1::/48", // local-use translation
];

const BLOCKED_HOSTS: &[&str] = &[
    "localhost",
    "metadata.google.internal",
    "metadata.gke.internal",
    "instance-data",
];

/// A URL that passed validation, with the addresses it resolved to.
#[derive(Debug, Clone)]
pub struct ValidatedUrl {
    pub url: Url,
    /// Empty for hosts on the allow list.
    pub addrs: Vec<SocketAddr>,
}

/// Validates URLs before any network request is made.
#[derive(Debug, Clone)]
pub struct UrlValidator {
    allowed_schemes: HashSet<String>,
    blocked_cidrs: Vec<IpNet>,
    non_global: Vec<IpNet>,
    /// Bypass address checks (test servers, internal mirrors)
    allowed_hosts: HashSet<String>,
}

impl Default for UrlValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl UrlValidator {
    /// HTTPS only, with the default blocked networks.
    pub fn new() -> Self {
        Self {
            allowed_schemes: HashSet::from(["https".to_string()]),
            blocked_cidrs: BLOCKED_NETWORKS.iter().filter_map(|c| c.parse().ok()).collect(),
            non_global: NON_GLOBAL_NETWORKS.iter().filter_map(|c| c.parse().ok()).collect(),
            allowed_hosts: HashSet::new(),
        }
    }

    pub fn allow_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.allowed_schemes.insert(scheme.into());
        self
    }

    pub fn allow_host(mut self, host: impl Into<String>) -> Self {
        self.allowed_hosts.insert(host.into());
        self
    }

    pub fn block_cidr(mut self, cidr: IpNet) -> Self {
        self.blocked_cidrs.push(cidr);
        self
    }

    /// Parse, resolve and check a URL.
    pub async fn validate(&self, raw: &str) -> ExtractResult<ValidatedUrl> {
        let url = Url::parse(raw.trim())
            .map_err(|_| ExtractError::invalid_url("Could not parse hostname from URL"))?;

        if !self.allowed_schemes.contains(url.scheme()) {
            return Err(ExtractError::invalid_url("Only HTTPS URLs are accepted"));
        }

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| ExtractError::invalid_url("Could not parse hostname from URL"))?
            .to_string();

        if self.allowed_hosts.contains(&host) {
            return Ok(ValidatedUrl { url, addrs: Vec::new() });
        }

        if BLOCKED_HOSTS.contains(&host.to_ascii_lowercase().as_str()) {
            return Err(ExtractError::invalid_url("URL resolves to a blocked address"));
        }

        let port = url.port_or_known_default().unwrap_or(443);
        let addrs: Vec<SocketAddr> = match host.trim_matches(|c| c == '[' || c == ']').parse::<IpAddr>() {
            Ok(ip) => vec![SocketAddr::new(ip, port)],
            Err(_) => tokio::net::lookup_host((host.as_str(), port))
                .await
                .map_err(|_| ExtractError::invalid_url("Could not resolve hostname"))?
                .collect(),
        };

        if addrs.is_empty() {
            return Err(ExtractError::invalid_url("Could not resolve hostname"));
        }

        for addr in &addrs {
            self.check_ip(addr.ip())?;
        }

        Ok(ValidatedUrl { url, addrs })
    }

    /// Reject blocked networks and anything that is not globally routable.
    pub fn check_ip(&self, ip: IpAddr) -> ExtractResult<()> {
        let ip = match ip {
            IpAddr::V6(v6) => v6.to_ipv4_mapped().map(IpAddr::V4).unwrap_or(ip),
            v4 => v4,
        };

        if self.blocked_cidrs.iter().any(|cidr| cidr.contains(&ip)) {
            tracing::warn!(%ip, "Blocked URL resolving to private network");
            return Err(ExtractError::invalid_url("URL resolves to a blocked address"));
        }

        if !is_global(&ip) || self.non_global.iter().any(|net| net.contains(&ip)) {
            tracing::warn!(%ip, "Blocked URL resolving to non-public address");
            return Err(ExtractError::invalid_url("URL resolves to a non-public address"));
        }

        Ok(())
    }
}

fn is_global(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            !(v4.is_unspecified()
                || v4.is_broadcast()
                || v4.is_documentation()
                || v4.is_multicast()
                || v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local())
        }
        IpAddr::V6(v6) => {
            let documentation = v6.segments()[0] == 0x2001 && v6.segments()[1] == 0x0db8;
            !(v6.is_unspecified() || v6.is_loopback() || v6.is_multicast() || documentation)
        }
    }
}
