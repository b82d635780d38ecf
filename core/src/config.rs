//! Client configuration.
//!
//! # Design
//! `ClientConfig` is built once, either with the `with_*` builder methods or
//! by deserializing a JSON document, and then handed to `ScaffoldClient` by
//! value. Defaults follow the remote appliance's conventions: JSON, a five
//! second timeout, credentials in headers, certificate verification off
//! (appliances usually ship self-signed certificates), and a base URI of
//! `admin/scaffolds` under the hostname.

use std::fmt;
use std::io::Write;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ClientError, Result};

pub const DEFAULT_BASE_URI: &str = "admin/scaffolds";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Wire format used for the `Accept` header, request bodies and response
/// decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum RequestFormat {
    #[default]
    Json,
    Xml,
}

impl RequestFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestFormat::Json => "json",
            RequestFormat::Xml => "xml",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            RequestFormat::Json => "application/json",
            RequestFormat::Xml => "application/xml",
        }
    }
}

impl FromStr for RequestFormat {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(RequestFormat::Json),
            "xml" => Ok(RequestFormat::Xml),
            _ => Err(ClientError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl TryFrom<String> for RequestFormat {
    type Error = ClientError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl fmt::Display for RequestFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a non-fleet credential travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    #[default]
    Headers,
    Query,
}

/// Shared, write-only diagnostic target.
///
/// Receives one line per request, per response and per rescued failure.
/// Cloning shares the underlying writer.
#[derive(Clone)]
pub struct DebugSink(Arc<Mutex<dyn Write + Send>>);

impl DebugSink {
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self(Arc::new(Mutex::new(writer)))
    }

    pub fn stderr() -> Self {
        Self::new(std::io::stderr())
    }

    /// Write a line, ignoring I/O errors: diagnostics must never turn a
    /// successful call into a failed one.
    pub fn write_line(&self, line: &str) {
        let mut writer = match self.0.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let _ = writeln!(writer, "{line}");
        let _ = writer.flush();
    }
}

impl fmt::Debug for DebugSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DebugSink(..)")
    }
}

/// Configuration for a `ScaffoldClient`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub hostname: String,
    pub api_key: String,
    #[serde(default)]
    pub request_format: RequestFormat,
    #[serde(default = "default_timeout", rename = "default_timeout_secs", with = "secs")]
    pub default_timeout: Duration,
    #[serde(default)]
    pub raise_exceptions: bool,
    #[serde(default)]
    pub verify_ssl: bool,
    #[serde(default)]
    pub fleet: bool,
    #[serde(default)]
    pub auth_method: AuthMethod,
    /// Absolute URL, or a path resolved against `https://{hostname}/`.
    #[serde(default = "default_base_uri")]
    pub base_uri: String,
    #[serde(skip)]
    pub debug_sink: Option<DebugSink>,
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

fn default_base_uri() -> String {
    DEFAULT_BASE_URI.to_string()
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

impl ClientConfig {
    pub fn new(hostname: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            api_key: api_key.into(),
            request_format: RequestFormat::default(),
            default_timeout: DEFAULT_TIMEOUT,
            raise_exceptions: false,
            verify_ssl: false,
            fleet: false,
            auth_method: AuthMethod::default(),
            base_uri: default_base_uri(),
            debug_sink: None,
        }
    }

    /// Load a configuration from a JSON document.
    ///
    /// An unknown `request_format` is reported as `UnsupportedFormat`, every
    /// other problem as `InvalidConfig`.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| ClientError::InvalidConfig(e.to_string()))?;
        if let Some(format) = value.get("request_format").and_then(|f| f.as_str()) {
            format.parse::<RequestFormat>()?;
        }
        let config: ClientConfig =
            serde_json::from_value(value).map_err(|e| ClientError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Accepts `"json"`/`"xml"` in any case; anything else is
    /// `UnsupportedFormat`.
    pub fn with_format(mut self, format: &str) -> Result<Self> {
        self.request_format = format.parse()?;
        Ok(self)
    }

    pub fn with_request_format(mut self, format: RequestFormat) -> Self {
        self.request_format = format;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn with_raise_exceptions(mut self, raise: bool) -> Self {
        self.raise_exceptions = raise;
        self
    }

    pub fn with_verify_ssl(mut self, verify: bool) -> Self {
        self.verify_ssl = verify;
        self
    }

    pub fn with_fleet(mut self, fleet: bool) -> Self {
        self.fleet = fleet;
        self
    }

    pub fn with_auth_method(mut self, method: AuthMethod) -> Self {
        self.auth_method = method;
        self
    }

    pub fn with_base_uri(mut self, base_uri: impl Into<String>) -> Self {
        self.base_uri = base_uri.into();
        self
    }

    pub fn with_debug_sink(mut self, sink: DebugSink) -> Self {
        self.debug_sink = Some(sink);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.hostname.trim().is_empty() {
            return Err(ClientError::InvalidConfig("hostname must not be empty".into()));
        }
        if self.default_timeout.is_zero() {
            return Err(ClientError::InvalidConfig("default timeout must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_appliance_conventions() {
        let config = ClientConfig::new("x.example.com", "k1");
        assert_eq!(config.request_format, RequestFormat::Json);
        assert_eq!(config.default_timeout, Duration::from_secs(5));
        assert!(!config.raise_exceptions);
        assert!(!config.verify_ssl);
        assert!(!config.fleet);
        assert_eq!(config.auth_method, AuthMethod::Headers);
        assert_eq!(config.base_uri, "admin/scaffolds");
        assert!(config.debug_sink.is_none());
    }

    #[test]
    fn format_parsing_is_case_insensitive() {
        assert_eq!("JSON".parse::<RequestFormat>().unwrap(), RequestFormat::Json);
        assert_eq!("xml".parse::<RequestFormat>().unwrap(), RequestFormat::Xml);
    }

    #[test]
    fn unknown_format_is_rejected() {
        let err = ClientConfig::new("h", "k").with_format("yaml").unwrap_err();
        assert!(matches!(err, ClientError::UnsupportedFormat(ref f) if f == "yaml"));
    }

    #[test]
    fn from_json_applies_defaults() {
        let config = ClientConfig::from_json(r#"{"hostname":"x.example.com","api_key":"k1"}"#).unwrap();
        assert_eq!(config.hostname, "x.example.com");
        assert_eq!(config.default_timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.base_uri, DEFAULT_BASE_URI);
    }

    #[test]
    fn from_json_reads_every_field() {
        let config = ClientConfig::from_json(
            r#"{
                "hostname": "x.example.com",
                "api_key": "k1",
                "request_format": "xml",
                "default_timeout_secs": 2.5,
                "raise_exceptions": true,
                "verify_ssl": true,
                "fleet": true,
                "auth_method": "query",
                "base_uri": "https://other.example.com/api"
            }"#,
        )
        .unwrap();
        assert_eq!(config.request_format, RequestFormat::Xml);
        assert_eq!(config.default_timeout, Duration::from_millis(2500));
        assert!(config.raise_exceptions);
        assert!(config.verify_ssl);
        assert!(config.fleet);
        assert_eq!(config.auth_method, AuthMethod::Query);
        assert_eq!(config.base_uri, "https://other.example.com/api");
    }

    #[test]
    fn from_json_rejects_unknown_format() {
        let err = ClientConfig::from_json(r#"{"hostname":"h","api_key":"k","request_format":"csv"}"#)
            .unwrap_err();
        assert!(matches!(err, ClientError::UnsupportedFormat(_)));
    }

    #[test]
    fn from_json_rejects_missing_hostname() {
        let err = ClientConfig::from_json(r#"{"api_key":"k"}"#).unwrap_err();
        assert!(matches!(err, ClientError::InvalidConfig(_)));
    }

    #[test]
    fn validate_rejects_blank_hostname() {
        let err = ClientConfig::new("  ", "k").validate().unwrap_err();
        assert!(matches!(err, ClientError::InvalidConfig(_)));
    }

    #[test]
    fn debug_sink_receives_lines() {
        #[derive(Clone, Default)]
        struct Buf(Arc<Mutex<Vec<u8>>>);
        impl Write for Buf {
            fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(data);
                Ok(data.len())
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let buf = Buf::default();
        let sink = DebugSink::new(buf.clone());
        sink.write_line("first");
        sink.clone().write_line("second");
        let written = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert_eq!(written, "first\nsecond\n");
    }
}
