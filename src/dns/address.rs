//! Parsing and resolution of the configured resolver address.

use hickory_resolver::{config::ResolverConfig, system_conf};
use std::{
    fmt,
    net::{IpAddr, SocketAddr},
    str::FromStr,
};
use thiserror::Error;
use tracing::{debug, warn};

/// Port used when the resolver address names only a host.
pub const DEFAULT_DNS_PORT: u16 = 53;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("resolver address is empty")]
    Empty,

    #[error("invalid resolver address '{0}'")]
    Invalid(String),

    #[error("could not resolve resolver host '{host}': {reason}")]
    Lookup { host: String, reason: String },

    #[error("could not read system resolver configuration: {0}")]
    SystemConfig(String),
}

/// Where DNS queries are sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolverAddress {
    /// The first nameserver from the host's resolver configuration.
    System,
    /// A literal socket address.
    Socket(SocketAddr),
    /// A hostname, looked up once before any query is sent.
    Host { host: String, port: u16 },
}

impl FromStr for ResolverAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AddressError::Empty);
        }
        if s.eq_ignore_ascii_case("system") {
            return Ok(Self::System);
        }
        if let Ok(addr) = s.parse::<SocketAddr>() {
            return Ok(Self::Socket(addr));
        }
        // A bare IPv6 address has colons of its own, so try IPs before host:port.
        let unbracketed = s
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .unwrap_or(s);
        if let Ok(ip) = unbracketed.parse::<IpAddr>() {
            return Ok(Self::Socket(SocketAddr::new(ip, DEFAULT_DNS_PORT)));
        }

        match s.rsplit_once(':') {
            None => Ok(Self::Host {
                host: s.to_string(),
                port: DEFAULT_DNS_PORT,
            }),
            Some((host, port)) if !host.is_empty() && !host.contains(':') => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| AddressError::Invalid(s.to_string()))?;
                Ok(Self::Host {
                    host: host.to_string(),
                    port,
                })
            }
            Some(_) => Err(AddressError::Invalid(s.to_string())),
        }
    }
}

impl fmt::Display for ResolverAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System => f.write_str("system"),
            Self::Socket(addr) => write!(f, "{}", addr),
            Self::Host { host, port } => write!(f, "{}:{}", host, port),
        }
    }
}

impl ResolverAddress {
    /// Turns the address into the socket every worker will query.
    pub async fn resolve(&self) -> Result<SocketAddr, AddressError> {
        match self {
            Self::Socket(addr) => Ok(*addr),
            Self::Host { host, port } => {
                let mut addrs = tokio::net::lookup_host((host.as_str(), *port))
                    .await
                    .map_err(|e| AddressError::Lookup {
                        host: host.clone(),
                        reason: e.to_string(),
                    })?;
                let addr = addrs.next().ok_or_else(|| AddressError::Lookup {
                    host: host.clone(),
                    reason: "no addresses returned".to_string(),
                })?;
                debug!(%host, %addr, "Resolved resolver hostname");
                Ok(addr)
            }
            Self::System => {
                let (system_config, _) = system_conf::read_system_conf()
                    .map_err(|e| AddressError::SystemConfig(e.to_string()))?;
                match system_config.name_servers().first() {
                    Some(ns) => Ok(ns.socket_addr),
                    None => {
                        warn!("No system DNS servers found, falling back to Cloudflare DNS.");
                        ResolverConfig::cloudflare()
                            .name_servers()
                            .first()
                            .map(|ns| ns.socket_addr)
                            .ok_or_else(|| {
                                AddressError::SystemConfig("no nameservers available".to_string())
                            })
                    }
                }
            }
        }
    }
}
