//! Web origin of a response URL.

use std::fmt;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// Canonical `(scheme, host, port)` triple identifying a web security
/// boundary. Scheme and host are always lowercase; the port is only kept
/// when it appears explicitly in the URL.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Hash)]
pub struct Origin {
    pub scheme: String,
    pub host: String,
    pub port: Option<u16>,
}

impl Origin {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>, port: Option<u16>) -> Self {
        Self {
            scheme: scheme.into().to_ascii_lowercase(),
            host: host.into().to_ascii_lowercase(),
            port,
        }
    }

    /// Extracts the origin of a response URL.
    pub fn from_url(raw: &str) -> Result<Self> {
        let url = Url::parse(raw)?;
        let host = url.host_str().ok_or_else(|| anyhow!("URL has no host: {raw}"))?;
        Ok(Self::new(url.scheme(), host, url.port()))
    }

    /// `host` or `host:port` when an explicit port is present.
    pub fn host_port(&self) -> String {
        match self.port {
            Some(port) => format!("{}:{}", self.host, port),
            None => self.host.clone(),
        }
    }

    /// The https-upgraded form of this origin, keeping the explicit port.
    pub fn secure(&self) -> String {
        format!("https://{}", self.host_port())
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.host_port())
    }
}
