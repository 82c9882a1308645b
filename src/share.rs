//! Share links: the app's own address plus campaign tags.

use anyhow::{anyhow, Result};
use url::Url;

/// Where the app is reachable, as seen by the client.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShareOrigin {
    /// `X-Forwarded-Proto`; may be a comma list, first entry wins.
    pub forwarded_proto: Option<String>,
    /// `Host` header.
    pub host: Option<String>,
    /// `X-Forwarded-Path`.
    pub forwarded_path: Option<String>,
    /// Fallback server address and port when no `Host` is known.
    pub server_address: String,
    pub server_port: Option<u16>,
}

impl ShareOrigin {
    /// Origin derived from a configured base URL such as `http://localhost:8501/`.
    pub fn from_base(base: &str) -> Result<Self> {
        let url = Url::parse(base).map_err(|e| anyhow!("invalid share base {:?}: {}", base, e))?;
        let host = url.host_str().ok_or_else(|| anyhow!("share base {:?} has no host", base))?;
        Ok(Self {
            forwarded_proto: Some(url.scheme().to_string()),
            host: None,
            forwarded_path: Some(url.path().to_string()),
            server_address: host.to_string(),
            server_port: url.port_or_known_default(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareTags {
    pub utm_source: String,
    pub utm_campaign: String,
}

impl Default for ShareTags {
    fn default() -> Self {
        Self {
            utm_source: "linkedin".to_string(),
            utm_campaign: "mvp_post".to_string(),
        }
    }
}

pub fn build_share_url(origin: &ShareOrigin, tags: &ShareTags) -> Result<String> {
    let mut scheme = "http".to_string();
    if let Some(proto) = origin.forwarded_proto.as_deref() {
        if let Some(first) = proto.split(',').next().map(str::trim).filter(|p| !p.is_empty()) {
            scheme = first.to_string();
        }
    }

    let netloc = match origin.host.as_deref().filter(|h| !h.is_empty()) {
        Some(host) => host.to_string(),
        None => match origin.server_port {
            Some(443) => {
                scheme = "https".to_string();
                origin.server_address.clone()
            }
            Some(80) | None => origin.server_address.clone(),
            Some(port) => format!("{}:{}", origin.server_address, port),
        },
    };

    let mut path = origin.forwarded_path.clone().unwrap_or_default();
    if !path.starts_with('/') {
        path.insert(0, '/');
    }

    let mut url = Url::parse(&format!("{}://{}{}", scheme, netloc, path))
        .map_err(|e| anyhow!("cannot build share url for {}: {}", netloc, e))?;
    url.query_pairs_mut()
        .append_pair("utm_source", &tags.utm_source)
        .append_pair("utm_campaign", &tags.utm_campaign);
    Ok(url.to_string())
}
