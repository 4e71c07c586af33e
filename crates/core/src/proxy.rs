//! Proxy Configuration Types
//!
//! Data types for routing model requests through an HTTP or SOCKS proxy.
//! The actual HTTP client factory is in the `gem-eye-llm` crate.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Proxy protocol type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProxyProtocol {
    Http,
    Https,
    Socks5,
}

impl ProxyProtocol {
    /// Return the URL scheme string for this protocol.
    pub fn scheme(&self) -> &'static str {
        match self {
            ProxyProtocol::Http => "http",
            ProxyProtocol::Https => "https",
            ProxyProtocol::Socks5 => "socks5",
        }
    }

    fn from_scheme(scheme: &str) -> Option<Self> {
        match scheme.to_ascii_lowercase().as_str() {
            "http" => Some(ProxyProtocol::Http),
            "https" => Some(ProxyProtocol::Https),
            "socks5" | "socks5h" => Some(ProxyProtocol::Socks5),
            _ => None,
        }
    }
}

/// Proxy configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProxyConfig {
    pub protocol: ProxyProtocol,
    pub host: String,
    pub port: u16,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub username: Option<String>,
    /// Only held in memory; never written to the config file.
    #[serde(skip_serializing, default)]
    pub password: Option<String>,
}

impl ProxyConfig {
    /// Parse a proxy URL such as `socks5://user:pw@127.0.0.1:1080`.
    ///
    /// HTTP(S) proxies fall back to the scheme's well-known port; SOCKS5
    /// proxies must name a port explicitly.
    pub fn parse(raw: &str) -> CoreResult<Self> {
        let parsed = url::Url::parse(raw.trim())
            .map_err(|e| CoreError::invalid_proxy(format!("'{}': {}", raw, e)))?;

        let protocol = ProxyProtocol::from_scheme(parsed.scheme()).ok_or_else(|| {
            CoreError::invalid_proxy(format!("unsupported scheme {}", parsed.scheme()))
        })?;

        let host = parsed
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| CoreError::invalid_proxy(format!("no host in {}", raw)))?
            .to_string();

        let port = parsed
            .port_or_known_default()
            .ok_or_else(|| CoreError::invalid_proxy(format!("no port in {}", raw)))?;

        let username = Some(parsed.username())
            .filter(|u| !u.is_empty())
            .map(|u| u.to_string());
        let password = parsed.password().map(|p| p.to_string());

        Ok(Self {
            protocol,
            host,
            port,
            username,
            password,
        })
    }

    /// Build the proxy URL string (without auth).
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.protocol.scheme(), self.host, self.port)
    }
}
