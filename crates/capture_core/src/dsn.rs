use std::{fmt, str::FromStr};

use thiserror::Error;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum DsnParseError {
    #[error("DSN is missing a scheme separator (`://`)")]
    MissingScheme,
    #[error("unsupported DSN scheme `{0}` (expected http or https)")]
    InvalidScheme(String),
    #[error("DSN is missing a public key")]
    MissingPublicKey,
    #[error("DSN is missing a host")]
    MissingHost,
    #[error("invalid DSN port `{0}`")]
    InvalidPort(String),
    #[error("DSN is missing a project id")]
    MissingProjectId,
}

/// Destination descriptor: where events go and which credentials authorize them.
///
/// Format: `{scheme}://{public_key}[:{secret_key}]@{host}[:{port}]{path}/{project_id}`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Dsn {
    scheme: Scheme,
    public_key: String,
    secret_key: Option<String>,
    host: String,
    port: Option<u16>,
    path: String,
    project_id: String,
}

impl Dsn {
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub fn secret_key(&self) -> Option<&str> {
        self.secret_key.as_deref()
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Path prefix in front of the project id, without a trailing slash (often empty).
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Endpoint that accepts a single JSON event per request.
    pub fn store_url(&self) -> String {
        format!(
            "{}://{}{}/api/{}/store/",
            self.scheme.as_str(),
            self.authority(),
            self.path,
            self.project_id
        )
    }

    /// Value for the `X-Sentry-Auth` request header.
    pub fn auth_header(&self, client: &str, timestamp: i64) -> String {
        let mut header = format!(
            "Sentry sentry_version=7, sentry_client={client}, sentry_timestamp={timestamp}, sentry_key={}",
            self.public_key
        );
        if let Some(secret) = self.secret_key.as_deref() {
            header.push_str(", sentry_secret=");
            header.push_str(secret);
        }
        header
    }

    fn authority(&self) -> String {
        match self.port {
            Some(port) => format!("{}:{port}", self.host),
            None => self.host.clone(),
        }
    }
}

impl FromStr for Dsn {
    type Err = DsnParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        let (scheme, rest) = raw
            .split_once("://")
            .ok_or(DsnParseError::MissingScheme)?;
        let scheme = match scheme {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            other => return Err(DsnParseError::InvalidScheme(other.to_string())),
        };

        let (credentials, location) = rest
            .rsplit_once('@')
            .ok_or(DsnParseError::MissingPublicKey)?;
        let (public_key, secret_key) = match credentials.split_once(':') {
            Some((public, secret)) => (public, Some(secret).filter(|s| !s.is_empty())),
            None => (credentials, None),
        };
        if public_key.is_empty() {
            return Err(DsnParseError::MissingPublicKey);
        }

        let (authority, path) = match location.find('/') {
            Some(idx) => location.split_at(idx),
            None => (location, ""),
        };
        let (host, port) = split_port(authority)?;
        if host.is_empty() {
            return Err(DsnParseError::MissingHost);
        }

        let path = path.trim_end_matches('/');
        let (prefix, project_id) = path
            .rsplit_once('/')
            .ok_or(DsnParseError::MissingProjectId)?;
        if project_id.is_empty() {
            return Err(DsnParseError::MissingProjectId);
        }

        Ok(Self {
            scheme,
            public_key: public_key.to_string(),
            secret_key: secret_key.map(str::to_string),
            host: host.to_string(),
            port,
            path: prefix.to_string(),
            project_id: project_id.to_string(),
        })
    }
}

// Bracketed IPv6 literals carry colons of their own.
fn split_port(authority: &str) -> Result<(&str, Option<u16>), DsnParseError> {
    if authority.ends_with(']') {
        return Ok((authority, None));
    }
    match authority.rsplit_once(':') {
        Some((host, port)) => {
            let port = port
                .parse::<u16>()
                .map_err(|_| DsnParseError::InvalidPort(port.to_string()))?;
            Ok((host, Some(port)))
        }
        None => Ok((authority, None)),
    }
}

impl fmt::Display for Dsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme.as_str(), self.public_key)?;
        if let Some(secret) = self.secret_key.as_deref() {
            write!(f, ":{secret}")?;
        }
        write!(f, "@{}{}/{}", self.authority(), self.path, self.project_id)
    }
}
