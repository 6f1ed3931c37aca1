use std::{borrow::Cow, fmt, str::FromStr};

use hyper::Uri;
use url::Url;

use crate::error::ConfigError;

/// Transport implied by a target's scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved upstream destination.
///
/// Built once when the proxy is configured and shared read-only between
/// every request that flows through it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetDescriptor {
    scheme: Scheme,
    host: String,
    port: u16,
}

impl TargetDescriptor {
    /// Resolve a destination specification.
    ///
    /// Accepts a bare hostname (`httpbin.org`, scheme http, port 80), a
    /// `host:port` pair, or a full URL with an `http`/`https` scheme and an
    /// optional port. Any path component is ignored.
    ///
    /// # Arguments
    /// * `spec` - The destination as written in configuration
    ///
    /// # Returns
    /// The canonical descriptor, or a [`ConfigError`] when no host can be parsed
    pub fn resolve(spec: &str) -> Result<Self, ConfigError> {
        let trimmed = spec.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::EmptyTarget);
        }

        let candidate = if trimmed.contains("://") {
            Cow::Borrowed(trimmed)
        } else {
            Cow::Owned(format!("http://{trimmed}"))
        };

        let url = Url::parse(&candidate).map_err(|e| ConfigError::InvalidTarget {
            spec: spec.to_string(),
            reason: e.to_string(),
        })?;

        let scheme = match url.scheme() {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            other => {
                return Err(ConfigError::UnsupportedScheme {
                    spec: spec.to_string(),
                    scheme: other.to_string(),
                });
            }
        };

        let host = url
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| ConfigError::InvalidTarget {
                spec: spec.to_string(),
                reason: "missing host".to_string(),
            })?;

        Ok(Self {
            scheme,
            host: host.to_ascii_lowercase(),
            // `Url::port` reports None when the port is the scheme default
            port: url.port().unwrap_or_else(|| scheme.default_port()),
        })
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Check if requests to this target travel over TLS
    pub fn is_secure(&self) -> bool {
        self.scheme == Scheme::Https
    }

    /// Host plus port, with the port omitted when it is the scheme default.
    /// This is the value sent as the outbound `Host` header.
    pub fn authority(&self) -> String {
        if self.port == self.scheme.default_port() {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Build the absolute upstream URI for a path (and query).
    pub fn uri_for(&self, path_and_query: &str) -> Result<Uri, hyper::http::uri::InvalidUri> {
        let separator = if path_and_query.starts_with('/') {
            ""
        } else {
            "/"
        };
        format!("{self}{separator}{path_and_query}").parse()
    }
}

impl FromStr for TargetDescriptor {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TargetDescriptor::resolve(s)
    }
}

impl fmt::Display for TargetDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.authority())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_hostname_defaults_to_http() {
        let target = TargetDescriptor::resolve("httpbin.org").unwrap();
        assert_eq!(target.scheme(), Scheme::Http);
        assert_eq!(target.host(), "httpbin.org");
        assert_eq!(target.port(), 80);
        assert!(!target.is_secure());
        assert_eq!(target.to_string(), "http://httpbin.org");
    }

    #[test]
    fn test_host_and_port() {
        let target = TargetDescriptor::resolve("127.0.0.1:8081").unwrap();
        assert_eq!(target.scheme(), Scheme::Http);
        assert_eq!(target.host(), "127.0.0.1");
        assert_eq!(target.port(), 8081);
        assert_eq!(target.authority(), "127.0.0.1:8081");
    }

    #[test]
    fn test_https_url() {
        let target = TargetDescriptor::resolve("https://api.github.com").unwrap();
        assert_eq!(target.scheme(), Scheme::Https);
        assert_eq!(target.port(), 443);
        assert!(target.is_secure());
        assert_eq!(target.authority(), "api.github.com");

        let target = TargetDescriptor::resolve("https://Example.COM:8443/base/").unwrap();
        assert_eq!(target.host(), "example.com");
        assert_eq!(target.port(), 8443);
        assert_eq!(target.to_string(), "https://example.com:8443");
    }

    #[test]
    fn test_explicit_default_port_is_canonical() {
        let explicit = TargetDescriptor::resolve("http://httpbin.org:80").unwrap();
        let implicit = TargetDescriptor::resolve("httpbin.org").unwrap();
        assert_eq!(explicit, implicit);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        for spec in [
            "httpbin.org",
            "https://httpbin.org",
            "localhost:3000",
            "http://[::1]:9000",
        ] {
            let first = TargetDescriptor::resolve(spec).unwrap();
            let second = TargetDescriptor::resolve(spec).unwrap();
            assert_eq!(first, second);

            let reparsed: TargetDescriptor = first.to_string().parse().unwrap();
            assert_eq!(first, reparsed);
        }
    }

    #[test]
    fn test_invalid_specs() {
        assert!(matches!(
            TargetDescriptor::resolve(""),
            Err(ConfigError::EmptyTarget)
        ));
        assert!(matches!(
            TargetDescriptor::resolve("   "),
            Err(ConfigError::EmptyTarget)
        ));
        assert!(matches!(
            TargetDescriptor::resolve("ftp://example.com"),
            Err(ConfigError::UnsupportedScheme { .. })
        ));
        assert!(matches!(
            TargetDescriptor::resolve("http://"),
            Err(ConfigError::InvalidTarget { .. })
        ));
        assert!(TargetDescriptor::resolve("http://host:notaport").is_err());
    }

    #[test]
    fn test_uri_for() {
        let target = TargetDescriptor::resolve("httpbin.org").unwrap();
        assert_eq!(
            target.uri_for("/get?x=1").unwrap().to_string(),
            "http://httpbin.org/get?x=1"
        );
        assert_eq!(
            target.uri_for("ip").unwrap().to_string(),
            "http://httpbin.org/ip"
        );
    }
}
