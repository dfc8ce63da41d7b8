//! Origin allow-list for WebSocket upgrades.
//!
//! Entries are full origins (`https://portal.example:8443`) or a wildcard
//! subdomain pattern (`https://*.portal.example`). Scheme, host and port must
//! all match; a wildcard never matches the bare parent domain.

use actix_web::http::header::HeaderValue;
use tracing::{error, warn};
use url::Url;

/// Invalid allow-list entry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid allowed origin '{entry}': {reason}")]
pub struct OriginPatternError {
    entry: String,
    reason: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum HostPattern {
    Exact(String),
    Subdomain(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct OriginPattern {
    scheme: String,
    host: HostPattern,
    port: Option<u16>,
}

impl OriginPattern {
    fn parse(entry: &str) -> Result<Self, OriginPatternError> {
        let invalid = |reason| OriginPatternError {
            entry: entry.to_owned(),
            reason,
        };
        let (wildcard, candidate) = match entry.split_once("://*.") {
            Some((scheme, rest)) => (true, format!("{scheme}://{rest}")),
            None => (false, entry.to_owned()),
        };
        let url = Url::parse(&candidate).map_err(|_| invalid("not a URL"))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }
        if url.path() != "/" || url.query().is_some() {
            return Err(invalid("origins carry no path or query"));
        }
        let host = url
            .host_str()
            .ok_or_else(|| invalid("missing host"))?
            .to_ascii_lowercase();
        Ok(Self {
            scheme: url.scheme().to_owned(),
            host: if wildcard {
                HostPattern::Subdomain(host)
            } else {
                HostPattern::Exact(host)
            },
            port: url.port(),
        })
    }

    fn matches(&self, origin: &Url) -> bool {
        let Some(host) = origin.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        let host_ok = match &self.host {
            HostPattern::Exact(expected) => host == *expected,
            HostPattern::Subdomain(parent) => host
                .strip_suffix(parent.as_str())
                .is_some_and(|prefix| prefix.len() > 1 && prefix.ends_with('.')),
        };
        host_ok && origin.scheme() == self.scheme && origin.port() == self.port
    }
}

/// Origins permitted to open live-update sockets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OriginAllowList {
    patterns: Vec<OriginPattern>,
}

/// Why an upgrade's `Origin` header was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginRejection {
    /// Header absent or not on the list.
    NotAllowed,
    /// Header present but unreadable.
    Malformed,
}

impl OriginAllowList {
    /// Parse allow-list entries, skipping blanks.
    ///
    /// # Errors
    ///
    /// Returns the first entry that is not a valid origin pattern.
    pub fn parse<I, S>(entries: I) -> Result<Self, OriginPatternError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = entries
            .into_iter()
            .map(|entry| entry.as_ref().trim().to_owned())
            .filter(|entry| !entry.is_empty())
            .map(|entry| OriginPattern::parse(&entry))
            .collect::<Result<_, _>>()?;
        Ok(Self { patterns })
    }

    /// Local development origins on the usual front-end ports.
    pub fn development() -> Self {
        let patterns = ["http://localhost:3000", "http://localhost:5173"]
            .into_iter()
            .filter_map(|entry| OriginPattern::parse(entry).ok())
            .collect();
        Self { patterns }
    }

    /// Number of configured patterns.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether nothing is allowed.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Whether a parsed origin is permitted.
    pub fn allows(&self, origin: &Url) -> bool {
        self.patterns.iter().any(|pattern| pattern.matches(origin))
    }

    /// Check the raw `Origin` header of an upgrade request.
    pub fn check(&self, header: Option<&HeaderValue>) -> Result<(), OriginRejection> {
        let Some(header) = header else {
            warn!("WebSocket upgrade without an Origin header");
            return Err(OriginRejection::NotAllowed);
        };
        let raw = header.to_str().map_err(|error| {
            error!(%error, "Origin header is not valid ASCII");
            OriginRejection::Malformed
        })?;
        let origin = Url::parse(raw).map_err(|error| {
            error!(%error, origin = raw, "Origin header is not a URL");
            OriginRejection::Malformed
        })?;
        if self.allows(&origin) {
            Ok(())
        } else {
            warn!(origin = raw, "rejected WebSocket upgrade from disallowed origin");
            Err(OriginRejection::NotAllowed)
        }
    }
}
