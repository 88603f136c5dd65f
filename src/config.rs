//! Sentinel connection configuration
//!
//! The two required values come from the process environment. Everything
//! else has a default matching a stock Sentinel deployment and can be
//! overridden through the `with_*` setters.

use std::fmt;
use std::time::Duration;

use crate::error::ConfigError;

/// Environment variable holding the Sentinel `host:port`.
pub const ADDRESS_VAR: &str = "SENTINEL_ADDRESS";
/// Environment variable holding the password shared by Sentinel and data nodes.
pub const PASSWORD_VAR: &str = "SENTINEL_PASSWORD";
/// Name under which Sentinel monitors the primary.
pub const DEFAULT_MASTER_NAME: &str = "mymaster";

/// Configuration for reaching the primary through Sentinel.
#[derive(Clone, PartialEq, Eq)]
pub struct SentinelConfig {
    /// Sentinel address as `host:port`
    pub address: String,
    /// Password for both the Sentinel tier and the data tier
    pub password: String,
    /// Monitored primary name
    pub master_name: String,
    /// Logical database index
    pub database: i64,
    /// Upper bound for each store command, client defaults when `None`
    pub command_timeout: Option<Duration>,
}

impl SentinelConfig {
    /// Build a config from explicit values, rejecting empty ones.
    pub fn new(
        address: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let address = address.into();
        if address.is_empty() {
            return Err(ConfigError::Missing { var: ADDRESS_VAR });
        }
        let password = password.into();
        if password.is_empty() {
            return Err(ConfigError::Missing { var: PASSWORD_VAR });
        }

        Ok(Self {
            address,
            password,
            master_name: DEFAULT_MASTER_NAME.to_string(),
            database: 0,
            command_timeout: None,
        })
    }

    /// Read `SENTINEL_ADDRESS` and `SENTINEL_PASSWORD` from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    ///
    /// The address is checked before the password, so when both are absent
    /// the error names `SENTINEL_ADDRESS`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let address = lookup(ADDRESS_VAR)
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing { var: ADDRESS_VAR })?;
        let password = lookup(PASSWORD_VAR)
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing { var: PASSWORD_VAR })?;

        Self::new(address, password)
    }

    pub fn with_master_name(mut self, name: impl Into<String>) -> Self {
        self.master_name = name.into();
        self
    }

    pub fn with_database(mut self, database: i64) -> Self {
        self.database = database;
        self
    }

    pub fn with_command_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Split the address into host and port.
    ///
    /// IPv6 hosts may be written in brackets, e.g. `[::1]:26379`.
    pub fn endpoint(&self) -> Result<(String, u16), ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidAddress {
            address: self.address.clone(),
            reason: reason.to_string(),
        };

        let (host, port) = self
            .address
            .rsplit_once(':')
            .ok_or_else(|| invalid("expected host:port"))?;

        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);
        if host.is_empty() {
            return Err(invalid("host is empty"));
        }

        let port = port
            .parse::<u16>()
            .map_err(|e| invalid(&format!("bad port: {}", e)))?;

        Ok((host.to_string(), port))
    }
}

impl fmt::Debug for SentinelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SentinelConfig")
            .field("address", &self.address)
            .field("password", &"<redacted>")
            .field("master_name", &self.master_name)
            .field("database", &self.database)
            .field("command_timeout", &self.command_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn lookup_from<'a>(
        vars: &'a HashMap<&'static str, &'static str>,
    ) -> impl Fn(&str) -> Option<String> + 'a {
        move |name| vars.get(name).map(|v| v.to_string())
    }

    #[test]
    fn loads_both_required_values_with_defaults() {
        let vars = HashMap::from([
            (ADDRESS_VAR, "localhost:26379"),
            (PASSWORD_VAR, "secret"),
        ]);
        let config = SentinelConfig::from_lookup(lookup_from(&vars)).unwrap();

        assert_eq!(config.address, "localhost:26379");
        assert_eq!(config.password, "secret");
        assert_eq!(config.master_name, "mymaster");
        assert_eq!(config.database, 0);
        assert_eq!(config.command_timeout, None);
    }

    #[rstest]
    #[case::no_address(None, Some("secret"), ADDRESS_VAR)]
    #[case::empty_address(Some(""), Some("secret"), ADDRESS_VAR)]
    #[case::no_password(Some("localhost:26379"), None, PASSWORD_VAR)]
    #[case::empty_password(Some("localhost:26379"), Some(""), PASSWORD_VAR)]
    #[case::nothing_set(None, None, ADDRESS_VAR)]
    fn missing_values_name_the_variable(
        #[case] address: Option<&'static str>,
        #[case] password: Option<&'static str>,
        #[case] expected: &'static str,
    ) {
        let mut vars = HashMap::new();
        if let Some(a) = address {
            vars.insert(ADDRESS_VAR, a);
        }
        if let Some(p) = password {
            vars.insert(PASSWORD_VAR, p);
        }

        let err = SentinelConfig::from_lookup(lookup_from(&vars)).unwrap_err();
        assert_eq!(err, ConfigError::Missing { var: expected });
        assert!(err.to_string().contains(expected));
    }

    #[rstest]
    #[case("localhost:26379", "localhost", 26379)]
    #[case("10.0.0.7:5000", "10.0.0.7", 5000)]
    #[case("[::1]:26379", "::1", 26379)]
    fn endpoint_splits_host_and_port(#[case] address: &str, #[case] host: &str, #[case] port: u16) {
        let config = SentinelConfig::new(address, "secret").unwrap();
        assert_eq!(config.endpoint().unwrap(), (host.to_string(), port));
    }

    #[rstest]
    #[case::no_port("localhost")]
    #[case::port_not_numeric("localhost:abc")]
    #[case::port_out_of_range("localhost:70000")]
    #[case::no_host(":26379")]
    fn endpoint_rejects_malformed_addresses(#[case] address: &str) {
        let config = SentinelConfig::new(address, "secret").unwrap();
        assert!(matches!(
            config.endpoint(),
            Err(ConfigError::InvalidAddress { .. })
        ));
    }

    #[test]
    fn setters_override_defaults() {
        let config = SentinelConfig::new("localhost:26379", "secret")
            .unwrap()
            .with_master_name("primary")
            .with_database(3)
            .with_command_timeout(Some(Duration::from_secs(2)));

        assert_eq!(config.master_name, "primary");
        assert_eq!(config.database, 3);
        assert_eq!(config.command_timeout, Some(Duration::from_secs(2)));
    }

    #[test]
    fn debug_output_hides_password() {
        let config = SentinelConfig::new("localhost:26379", "hunter2").unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
