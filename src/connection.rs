//! Database connection resolution.
//!
//! Produces a [`ConnectionDescriptor`] from an ordered list of
//! [`ConfigProvider`]s: the first provider holding a non-empty value wins and
//! its origin is recorded. The resolved URL is validated against the
//! supported Postgres schemes and forced onto TLS. An optional IPv4 pin is
//! recorded beside the URL; the URL handed to the driver keeps the hostname
//! so certificate checks and SNI still see it.

use config::{Config, File, FileFormat};
use secrecy::{ExposeSecret, Secret};
use serde::Serialize;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::AppConfig;

/// Configuration key holding the connection string
pub const DATABASE_URL_KEY: &str = "DATABASE_URL";

const DEFAULT_POSTGRES_PORT: u16 = 5432;
const TLS_PARAM: &str = "sslmode";
const TLS_REQUIRED: &str = "require";
const HOSTADDR_PARAM: &str = "hostaddr";
const CANONICAL_SCHEME: &str = "postgresql";

/// Query parameters that may carry credentials and are never reported
const SENSITIVE_PARAMS: [&str; 3] = ["password", "user", "passfile"];

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("{DATABASE_URL_KEY} is missing: set it in the secrets file or the environment")]
    Missing,

    #[error("{DATABASE_URL_KEY} is invalid: {0}")]
    Invalid(String),

    #[error("{DATABASE_URL_KEY} uses unsupported scheme `{0}`; expected postgres:// or postgresql://")]
    UnsupportedScheme(String),
}

/// Where the connection string was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfigOrigin {
    SecretStore,
    Environment,
    None,
}

impl fmt::Display for ConfigOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConfigOrigin::SecretStore => "secret-store",
            ConfigOrigin::Environment => "environment",
            ConfigOrigin::None => "none",
        };
        f.write_str(label)
    }
}

/// A source of configuration values.
///
/// Providers never fail: an unavailable source answers `None`.
pub trait ConfigProvider: Send + Sync {
    fn origin(&self) -> ConfigOrigin;

    fn lookup(&self, key: &str) -> Option<String>;
}

/// Reads keys from a TOML secrets file
#[derive(Debug, Clone)]
pub struct SecretStoreProvider {
    path: PathBuf,
}

impl SecretStoreProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigProvider for SecretStoreProvider {
    fn origin(&self) -> ConfigOrigin {
        ConfigOrigin::SecretStore
    }

    fn lookup(&self, key: &str) -> Option<String> {
        if !self.path.is_file() {
            debug!(path = %self.path.display(), "secrets file not present");
            return None;
        }

        let secrets = match Config::builder()
            .add_source(File::from(self.path.as_path()).format(FileFormat::Toml))
            .build()
        {
            Ok(secrets) => secrets,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "secrets file unreadable; ignoring it");
                return None;
            }
        };

        // config lowercases keys on load
        secrets
            .get_string(key)
            .or_else(|_| secrets.get_string(&key.to_ascii_lowercase()))
            .ok()
    }
}

/// Reads keys from the process environment
#[derive(Debug, Clone, Default)]
pub struct EnvironmentProvider;

impl ConfigProvider for EnvironmentProvider {
    fn origin(&self) -> ConfigOrigin {
        ConfigOrigin::Environment
    }

    fn lookup(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Resolves the database connection from an ordered provider chain
pub struct ConnectionResolver {
    providers: Vec<Box<dyn ConfigProvider>>,
    key: String,
    pin_ipv4: bool,
}

impl ConnectionResolver {
    pub fn new(providers: Vec<Box<dyn ConfigProvider>>) -> Self {
        Self {
            providers,
            key: DATABASE_URL_KEY.to_string(),
            pin_ipv4: false,
        }
    }

    /// Secret store first, then the environment
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self::new(vec![
            Box::new(SecretStoreProvider::new(&cfg.secrets_path)),
            Box::new(EnvironmentProvider),
        ])
        .with_ipv4_pinning(cfg.pin_ipv4)
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn with_ipv4_pinning(mut self, enabled: bool) -> Self {
        self.pin_ipv4 = enabled;
        self
    }

    /// First non-empty value across providers, with its origin
    pub fn lookup(&self) -> (Option<String>, ConfigOrigin) {
        for provider in &self.providers {
            match provider.lookup(&self.key) {
                Some(value) if !value.trim().is_empty() => {
                    debug!(origin = %provider.origin(), key = %self.key, "configuration value found");
                    return (Some(value.trim().to_string()), provider.origin());
                }
                _ => continue,
            }
        }
        (None, ConfigOrigin::None)
    }

    /// Resolve, validate and normalize the connection descriptor
    pub async fn resolve(&self) -> Result<ConnectionDescriptor, ConnectionError> {
        let (raw, origin) = match self.lookup() {
            (Some(raw), origin) => (raw, origin),
            (None, _) => return Err(ConnectionError::Missing),
        };

        let mut url = parse_database_url(&raw)?;
        ensure_tls(&mut url);

        let pinned = if self.pin_ipv4 {
            pin_ipv4(&url).await
        } else {
            None
        };

        let descriptor = ConnectionDescriptor::from_url(url, origin).with_pinned_ipv4(pinned);
        info!(
            origin = %descriptor.origin(),
            host = %descriptor.host(),
            port = descriptor.port(),
            pinned_ipv4 = ?descriptor.pinned_ipv4(),
            "database connection resolved"
        );
        Ok(descriptor)
    }
}

/// Parse a connection string and canonicalize its scheme.
///
/// Accepts `postgres`, `postgresql` and driver-qualified forms such as
/// `postgresql+psycopg`; the driver qualifier is dropped.
pub fn parse_database_url(raw: &str) -> Result<Url, ConnectionError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConnectionError::Missing);
    }

    let mut url = Url::parse(trimmed).map_err(|e| ConnectionError::Invalid(e.to_string()))?;

    let scheme = url.scheme().to_ascii_lowercase();
    let base = scheme.split('+').next().unwrap_or_default();
    if base != "postgres" && base != "postgresql" {
        return Err(ConnectionError::UnsupportedScheme(scheme));
    }
    if scheme != CANONICAL_SCHEME && url.set_scheme(CANONICAL_SCHEME).is_err() {
        return Err(ConnectionError::Invalid(format!(
            "cannot rewrite scheme `{scheme}`"
        )));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(ConnectionError::Invalid("host is missing".to_string())),
    }
}

/// Add `sslmode=require` unless a TLS mode is already present
pub fn ensure_tls(url: &mut Url) {
    let has_tls_mode = url
        .query_pairs()
        .any(|(key, _)| key.eq_ignore_ascii_case(TLS_PARAM));
    if !has_tls_mode {
        url.query_pairs_mut().append_pair(TLS_PARAM, TLS_REQUIRED);
    }
}

/// Parse, canonicalize and apply [`ensure_tls`] to a raw connection string
pub fn normalize(raw: &str) -> Result<String, ConnectionError> {
    let mut url = parse_database_url(raw)?;
    ensure_tls(&mut url);
    Ok(url.to_string())
}

/// Best-effort IPv4 pinning.
///
/// Resolves the host and returns its first IPv4 address. The URL is not
/// rewritten: sqlx treats `hostaddr` as a replacement host, which would put
/// the IP literal into the TLS handshake. Any failure yields `None`.
pub async fn pin_ipv4(url: &Url) -> Option<Ipv4Addr> {
    if url
        .query_pairs()
        .any(|(key, _)| key.eq_ignore_ascii_case(HOSTADDR_PARAM))
    {
        return None;
    }

    let host = url.host_str()?.trim_matches(|c| c == '[' || c == ']').to_string();
    if host.parse::<IpAddr>().is_ok() {
        return None;
    }
    let port = url.port().unwrap_or(DEFAULT_POSTGRES_PORT);

    let addrs = match tokio::net::lookup_host((host.as_str(), port)).await {
        Ok(addrs) => addrs,
        Err(err) => {
            debug!(host = %host, error = %err, "IPv4 lookup failed; connecting without hostaddr");
            return None;
        }
    };

    let ipv4 = addrs.into_iter().find_map(|addr| match addr.ip() {
        IpAddr::V4(ip) => Some(ip),
        IpAddr::V6(_) => None,
    });

    match ipv4 {
        Some(ip) => {
            debug!(host = %host, hostaddr = %ip, "pinned database host to IPv4");
            Some(ip)
        }
        None => {
            debug!(host = %host, "no IPv4 address for database host");
            None
        }
    }
}

/// Non-sensitive view of a connection, safe to log or return to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionDebugInfo {
    pub host: String,
    pub port: u16,
    pub origin: ConfigOrigin,
    pub params: Vec<(String, String)>,
    pub pinned_ipv4: Option<Ipv4Addr>,
}

/// Validated connection string plus provenance.
///
/// The full URL, credentials included, is only reachable through
/// [`ConnectionDescriptor::expose_url`].
#[derive(Debug, Clone)]
pub struct ConnectionDescriptor {
    url: Secret<String>,
    host: String,
    port: u16,
    params: Vec<(String, String)>,
    origin: ConfigOrigin,
    pinned_ipv4: Option<Ipv4Addr>,
}

impl ConnectionDescriptor {
    pub fn from_url(url: Url, origin: ConfigOrigin) -> Self {
        let host = url.host_str().unwrap_or_default().to_string();
        let port = url.port().unwrap_or(DEFAULT_POSTGRES_PORT);
        let params = url
            .query_pairs()
            .filter(|(key, _)| {
                !SENSITIVE_PARAMS
                    .iter()
                    .any(|sensitive| key.eq_ignore_ascii_case(sensitive))
            })
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();

        Self {
            url: Secret::new(url.to_string()),
            host,
            port,
            params,
            origin,
            pinned_ipv4: None,
        }
    }

    pub fn with_pinned_ipv4(mut self, pinned: Option<Ipv4Addr>) -> Self {
        self.pinned_ipv4 = pinned;
        self
    }

    /// Parse and normalize a raw string without consulting any provider
    pub fn parse(raw: &str, origin: ConfigOrigin) -> Result<Self, ConnectionError> {
        let mut url = parse_database_url(raw)?;
        ensure_tls(&mut url);
        Ok(Self::from_url(url, origin))
    }

    pub fn expose_url(&self) -> &str {
        self.url.expose_secret()
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn origin(&self) -> ConfigOrigin {
        self.origin
    }

    /// Address the host resolved to when pinning was enabled
    pub fn pinned_ipv4(&self) -> Option<Ipv4Addr> {
        self.pinned_ipv4
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn debug_info(&self) -> ConnectionDebugInfo {
        ConnectionDebugInfo {
            host: self.host.clone(),
            port: self.port,
            origin: self.origin,
            params: self.params.clone(),
            pinned_ipv4: self.pinned_ipv4,
        }
    }
}
