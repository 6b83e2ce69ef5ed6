use std::time::Duration;

use crate::dsn::{Dsn, DsnParseError};

const ENV_DSN: &str = "CAPTURE_DSN";
const ENV_RELEASE: &str = "CAPTURE_RELEASE";
const ENV_ENVIRONMENT: &str = "CAPTURE_ENVIRONMENT";
const ENV_SERVER_NAME: &str = "CAPTURE_SERVER_NAME";

/// SDK-wide configuration owned by the frontend and handed to the capture client on install.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    pub dsn: Option<String>,
    pub release: Option<String>,
    pub environment: Option<String>,
    pub server_name: Option<String>,
    /// Upper bound for breadcrumbs the capture client buffers on its own.
    pub max_breadcrumbs: usize,
    /// Transport timeout; `None` waits indefinitely.
    pub send_timeout: Option<Duration>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            dsn: None,
            release: None,
            environment: None,
            server_name: None,
            max_breadcrumbs: 100,
            send_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl Options {
    /// Defaults overlaid with `CAPTURE_DSN`, `CAPTURE_RELEASE`, `CAPTURE_ENVIRONMENT` and
    /// `CAPTURE_SERVER_NAME`. Blank values are ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        Self {
            dsn: read(ENV_DSN),
            release: read(ENV_RELEASE),
            environment: read(ENV_ENVIRONMENT),
            server_name: read(ENV_SERVER_NAME),
            ..Self::default()
        }
    }

    /// Parses the configured DSN; `Ok(None)` when no DSN is set.
    pub fn parsed_dsn(&self) -> Result<Option<Dsn>, DsnParseError> {
        self.dsn.as_deref().map(str::parse).transpose()
    }
}

impl AsRef<Options> for Options {
    fn as_ref(&self) -> &Options {
        self
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults_leave_every_destination_field_unset() {
        assert_eq!(
            Options::default(),
            Options {
                dsn: None,
                release: None,
                environment: None,
                server_name: None,
                max_breadcrumbs: 100,
                send_timeout: Some(Duration::from_secs(30)),
            }
        );
    }

    #[test]
    fn lookup_ignores_blank_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("CAPTURE_DSN", "https://key@example.com/1"),
            ("CAPTURE_RELEASE", "   "),
            ("CAPTURE_ENVIRONMENT", "staging"),
        ]);
        let options = Options::from_lookup(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(options.dsn.as_deref(), Some("https://key@example.com/1"));
        assert_eq!(options.release, None);
        assert_eq!(options.environment.as_deref(), Some("staging"));
        assert_eq!(options.max_breadcrumbs, 100);
    }

    #[test]
    fn parsed_dsn_handles_absent_and_invalid() {
        assert_eq!(Options::default().parsed_dsn(), Ok(None));
        let options = Options {
            dsn: Some("ftp://key@example.com/1".to_string()),
            ..Options::default()
        };
        assert_eq!(
            options.parsed_dsn(),
            Err(DsnParseError::InvalidScheme("ftp".to_string()))
        );
    }
}
