//! Per-invocation session parameters.

use std::fmt;
use std::str::FromStr;

/// Protocol scheme of the local service being exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
    #[default]
    Http,
    Https,
    Ssh,
}

impl Scheme {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
            Self::Ssh => "ssh",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            "ssh" => Ok(Self::Ssh),
            other => Err(format!("unknown scheme '{other}' (expected http, https, or ssh)")),
        }
    }
}

/// Everything one `expose` invocation needs. Scoped to that invocation and
/// never shared across sessions.
#[derive(Debug, Clone)]
pub struct ExposeRequest {
    /// Local port to expose.
    pub port: u16,
    /// Full public hostname. Mandatory with an identity, ignored without.
    pub subdomain: Option<String>,
    /// Local host traffic is forwarded to.
    pub local_host: String,
    pub scheme: Scheme,
    /// Skip TLS verification against the local origin.
    pub no_tls_verify: bool,
    /// Pin the session to a specific identity alias.
    pub identity_alias: Option<String>,
}

impl ExposeRequest {
    /// The local origin URL the tunnel forwards traffic to.
    pub fn local_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.local_host, self.port)
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn scheme_parses_case_insensitively() {
        assert_eq!("HTTP".parse::<Scheme>().unwrap(), Scheme::Http);
        assert_eq!("https".parse::<Scheme>().unwrap(), Scheme::Https);
        assert_eq!("Ssh".parse::<Scheme>().unwrap(), Scheme::Ssh);
        assert!("ftp".parse::<Scheme>().is_err());
    }

    #[test]
    fn local_url_includes_scheme_host_and_port() {
        let request = ExposeRequest {
            port: 3000,
            subdomain: None,
            local_host: "127.0.0.1".into(),
            scheme: Scheme::Http,
            no_tls_verify: false,
            identity_alias: None,
        };
        assert_eq!(request.local_url(), "http://127.0.0.1:3000");
    }
}
