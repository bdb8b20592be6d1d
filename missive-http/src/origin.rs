//! Cross-origin admission.
//!
//! Every request is classified by its `Origin` header, first match wins:
//!
//! 1. no `Origin` at all: a same-origin or non-browser caller, allowed
//!    without CORS headers
//! 2. a trusted pattern (by default any port on `http://localhost` and
//!    `http://127.0.0.1`): allowed, origin echoed
//! 3. an exact entry of the configured allow-list: allowed, origin echoed
//! 4. anything else: denied
//!
//! Patterns match on the parsed scheme, host and port, never on string
//! prefixes, so `http://localhost.evil.com` is not `localhost`.

use std::{fmt, ops::RangeInclusive, str::FromStr};

use axum::http::{
    HeaderMap, HeaderValue,
    header::{
        ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS,
        ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, VARY,
    },
};
use thiserror::Error;
use url::Url;

use crate::{CorsConfig, HttpError};

const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OriginPatternError {
    #[error("Empty origin pattern")]
    Empty,

    #[error("Invalid port range in origin pattern {0}")]
    InvalidPortRange(String),
}

/// One entry of the trusted set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginPattern {
    /// Byte-for-byte match.
    Exact(String),

    /// Scheme and host match exactly, port within the range. The port is the
    /// scheme default when the origin omits it.
    Host {
        scheme: String,
        host: String,
        ports: RangeInclusive<u16>,
    },
}

impl OriginPattern {
    /// `http://localhost:*` and `http://127.0.0.1:*`.
    #[must_use]
    pub fn loopback() -> Vec<Self> {
        ["localhost", "127.0.0.1"]
            .into_iter()
            .map(|host| Self::Host {
                scheme: "http".to_string(),
                host: host.to_string(),
                ports: 0..=u16::MAX,
            })
            .collect()
    }

    #[must_use]
    pub fn matches(&self, origin: &str) -> bool {
        match self {
            Self::Exact(expected) => expected == origin,
            Self::Host {
                scheme,
                host,
                ports,
            } => parse_origin(origin).is_some_and(|parsed| {
                parsed.scheme == *scheme && parsed.host == *host && ports.contains(&parsed.port)
            }),
        }
    }
}

/// Parses `scheme://host:*`, `scheme://host:low-high`, or any other string as
/// an exact origin.
impl FromStr for OriginPattern {
    type Err = OriginPatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(OriginPatternError::Empty);
        }

        let Some((scheme, authority)) = s.split_once("://") else {
            return Ok(Self::Exact(s.to_string()));
        };

        let ports = match authority.rsplit_once(':') {
            Some((_, "*")) => 0..=u16::MAX,
            Some((_, range)) if range.contains('-') => {
                let invalid = || OriginPatternError::InvalidPortRange(s.to_string());
                let (low, high) = range.split_once('-').ok_or_else(invalid)?;
                let low = low.parse::<u16>().map_err(|_| invalid())?;
                let high = high.parse::<u16>().map_err(|_| invalid())?;
                if low > high {
                    return Err(invalid());
                }
                low..=high
            }
            _ => return Ok(Self::Exact(s.to_string())),
        };

        let host = authority
            .rsplit_once(':')
            .map_or(authority, |(host, _)| host)
            .to_ascii_lowercase();

        if host.is_empty() {
            return Err(OriginPatternError::Empty);
        }

        Ok(Self::Host {
            scheme: scheme.to_ascii_lowercase(),
            host,
            ports,
        })
    }
}

impl fmt::Display for OriginPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(origin) => f.write_str(origin),
            Self::Host {
                scheme,
                host,
                ports,
            } if *ports == (0..=u16::MAX) => write!(f, "{scheme}://{host}:*"),
            Self::Host {
                scheme,
                host,
                ports,
            } => write!(f, "{scheme}://{host}:{}-{}", ports.start(), ports.end()),
        }
    }
}

struct ParsedOrigin {
    scheme: String,
    host: String,
    port: u16,
}

/// A browser origin is `scheme://host[:port]` and nothing else.
fn parse_origin(origin: &str) -> Option<ParsedOrigin> {
    if origin.ends_with('/') {
        return None;
    }

    let url = Url::parse(origin).ok()?;
    if url.path() != "/"
        || url.query().is_some()
        || url.fragment().is_some()
        || !url.username().is_empty()
        || url.password().is_some()
    {
        return None;
    }

    Some(ParsedOrigin {
        scheme: url.scheme().to_string(),
        host: url.host_str()?.to_string(),
        port: url.port_or_known_default()?,
    })
}

/// Which rule admitted (or refused) a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    NoOrigin,
    Trusted,
    Listed,
    Denied,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginDecision {
    pub admission: Admission,
    /// The origin to place in `Access-Control-Allow-Origin`, if any.
    pub echoed_origin: Option<String>,
}

impl OriginDecision {
    #[must_use]
    pub const fn allowed(&self) -> bool {
        !matches!(self.admission, Admission::Denied)
    }
}

/// The trusted patterns plus the operator-supplied exact origins.
///
/// Built once at startup and never mutated.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    trusted: Vec<OriginPattern>,
    listed: Vec<String>,
}

impl AllowList {
    pub fn new(trusted: Vec<OriginPattern>, listed: impl IntoIterator<Item = String>) -> Self {
        Self {
            trusted,
            listed: listed
                .into_iter()
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
        }
    }

    /// # Errors
    ///
    /// Returns an error if a trusted pattern cannot be parsed.
    pub fn from_config(config: &CorsConfig) -> Result<Self, OriginPatternError> {
        let trusted = config
            .trusted_origins
            .iter()
            .map(|pattern| pattern.parse())
            .collect::<Result<Vec<OriginPattern>, _>>()?;

        Ok(Self::new(trusted, config.extra_origins.iter().cloned()))
    }

    #[must_use]
    pub fn admit(&self, origin: Option<&str>) -> OriginDecision {
        let Some(origin) = origin else {
            return OriginDecision {
                admission: Admission::NoOrigin,
                echoed_origin: None,
            };
        };

        let admission = if self.trusted.iter().any(|pattern| pattern.matches(origin)) {
            Admission::Trusted
        } else if self.listed.iter().any(|listed| listed == origin) {
            Admission::Listed
        } else {
            return OriginDecision {
                admission: Admission::Denied,
                echoed_origin: None,
            };
        };

        OriginDecision {
            admission,
            echoed_origin: Some(origin.to_string()),
        }
    }
}

/// An [`AllowList`] together with the headers emitted for admitted origins.
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    allow_list: AllowList,
    allow_headers: HeaderValue,
    max_age: HeaderValue,
}

impl OriginPolicy {
    /// # Errors
    ///
    /// Returns an error if a trusted pattern or an allowed header name is
    /// not usable.
    pub fn from_config(config: &CorsConfig) -> Result<Self, HttpError> {
        let allow_headers = HeaderValue::from_str(&config.allow_headers.join(", "))
            .map_err(|e| HttpError::InvalidHeader(e.to_string()))?;

        Ok(Self {
            allow_list: AllowList::from_config(config)?,
            allow_headers,
            max_age: HeaderValue::from(config.max_age_secs),
        })
    }

    #[must_use]
    pub fn decide(&self, origin: Option<&str>) -> OriginDecision {
        self.allow_list.admit(origin)
    }

    /// Attach CORS headers for an admitted origin. Denied and origin-less
    /// requests only get `Vary: Origin`.
    pub fn apply(&self, decision: &OriginDecision, preflight: bool, headers: &mut HeaderMap) {
        headers.append(VARY, HeaderValue::from_static("Origin"));

        let Some(origin) = decision
            .echoed_origin
            .as_deref()
            .and_then(|origin| HeaderValue::from_str(origin).ok())
        else {
            return;
        };

        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        );
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, self.allow_headers.clone());
        headers.insert(
            ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );

        if preflight {
            headers.insert(ACCESS_CONTROL_MAX_AGE, self.max_age.clone());
        }
    }
}
