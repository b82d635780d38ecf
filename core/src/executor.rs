//! One HTTP verb call: defaults merged with per-call overrides, body encoded,
//! transport invoked, response classified and parsed.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::auth::AuthStrategy;
use crate::config::{AuthMethod, ClientConfig, DebugSink, RequestFormat};
use crate::error::{ClientError, Result};
use crate::http::{HttpMethod, HttpRequest, Transport};
use crate::parse::{parse, NormalizedResponse};
use crate::uri::UriResolver;
use crate::xml;

/// Root element used when a request body is encoded as XML.
pub const XML_BODY_ROOT: &str = "hash";

/// Per-call overrides. Anything left unset falls back to the client's
/// configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub timeout: Option<Duration>,
    pub format: Option<RequestFormat>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serialize `body` up front; fails with `Serialization`.
    pub fn serialized_body<B: Serialize + ?Sized>(self, body: &B) -> Result<Self> {
        let value = serde_json::to_value(body).map_err(|e| ClientError::Serialization(e.to_string()))?;
        Ok(self.body(value))
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn format(mut self, format: RequestFormat) -> Self {
        self.format = Some(format);
        self
    }
}

/// Merge `overrides` into `base`; an override replaces every base entry with
/// the same key.
fn merge_pairs(
    base: &[(String, String)],
    overrides: &[(String, String)],
    ignore_case: bool,
) -> Vec<(String, String)> {
    let same = |a: &str, b: &str| {
        if ignore_case {
            a.eq_ignore_ascii_case(b)
        } else {
            a == b
        }
    };
    let mut merged: Vec<(String, String)> = base
        .iter()
        .filter(|(k, _)| !overrides.iter().any(|(o, _)| same(k, o)))
        .cloned()
        .collect();
    merged.extend(overrides.iter().cloned());
    merged
}

fn encode_body(body: &Value, format: RequestFormat) -> Result<String> {
    match format {
        RequestFormat::Json => {
            serde_json::to_string(body).map_err(|e| ClientError::Serialization(e.to_string()))
        }
        RequestFormat::Xml => xml::to_xml(XML_BODY_ROOT, body)
            .map_err(|e| ClientError::Serialization(e.to_string())),
    }
}

/// Issues verb calls against the active base URI.
#[derive(Debug)]
pub struct RequestExecutor<T> {
    transport: T,
    uri: UriResolver,
    api_key: String,
    auth_method: AuthMethod,
    fleet: bool,
    format: RequestFormat,
    auth: AuthStrategy,
    timeout: Duration,
    verify_tls: bool,
    debug_sink: Option<DebugSink>,
}

impl<T: Transport> RequestExecutor<T> {
    pub fn new(config: &ClientConfig, transport: T) -> Self {
        Self {
            transport,
            uri: UriResolver::new(&config.hostname, &config.base_uri),
            api_key: config.api_key.clone(),
            auth_method: config.auth_method,
            fleet: config.fleet,
            format: config.request_format,
            auth: AuthStrategy::from_config(config),
            timeout: config.default_timeout,
            verify_tls: config.verify_ssl,
            debug_sink: config.debug_sink.clone(),
        }
    }

    pub fn uri(&self) -> &UriResolver {
        &self.uri
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn format(&self) -> RequestFormat {
        self.format
    }

    pub fn auth(&self) -> &AuthStrategy {
        &self.auth
    }

    pub fn set_format(&mut self, format: RequestFormat) {
        self.format = format;
        self.auth = self.auth_for(format);
    }

    fn auth_for(&self, format: RequestFormat) -> AuthStrategy {
        if format == self.format {
            return self.auth.clone();
        }
        AuthStrategy::new(self.auth_method, self.fleet, &self.api_key, format)
    }

    /// Describe the request without sending it.
    pub fn build_request(
        &self,
        method: HttpMethod,
        action_path: &str,
        options: &RequestOptions,
    ) -> Result<HttpRequest> {
        let format = options.format.unwrap_or(self.format);
        let auth = self.auth_for(format);

        let body = options
            .body
            .as_ref()
            .map(|b| encode_body(b, format))
            .transpose()?;

        let mut defaults = auth.headers;
        if body.is_some() {
            defaults.push(("Content-Type".to_string(), format.mime_type().to_string()));
        }

        Ok(HttpRequest {
            method,
            url: self.uri.join(action_path),
            headers: merge_pairs(&defaults, &options.headers, true),
            query: merge_pairs(&auth.query, &options.query, false),
            body,
            timeout: options.timeout.unwrap_or(self.timeout),
            verify_tls: self.verify_tls,
        })
    }

    /// Send one request. 2xx bodies are parsed; any other status is
    /// `RequestFailed`.
    pub fn call(
        &self,
        method: HttpMethod,
        action_path: &str,
        options: &RequestOptions,
    ) -> Result<NormalizedResponse> {
        let request = self.build_request(method, action_path, options)?;
        let format = options.format.unwrap_or(self.format);

        debug!(method = %request.method, url = %request.url, "scaffold request");
        if let Some(sink) = &self.debug_sink {
            sink.write_line(&format!("-> {} {}", request.method, request.full_url()));
        }

        let mut response = self.transport.execute(&request)?;
        if response.message.is_empty() {
            response.message = format!("HTTP {}", response.status);
        }

        debug!(status = response.status, bytes = response.body.len(), "scaffold response");
        if let Some(sink) = &self.debug_sink {
            sink.write_line(&format!("<- {} {}", response.status, response.message));
        }

        if !response.is_success() {
            return Err(ClientError::RequestFailed {
                status: response.status,
                message: response.message,
                body: response.body,
            });
        }
        Ok(parse(&response.body, format))
    }

    pub fn get(&self, path: &str, options: &RequestOptions) -> Result<NormalizedResponse> {
        self.call(HttpMethod::Get, path, options)
    }

    pub fn post(&self, path: &str, options: &RequestOptions) -> Result<NormalizedResponse> {
        self.call(HttpMethod::Post, path, options)
    }

    pub fn put(&self, path: &str, options: &RequestOptions) -> Result<NormalizedResponse> {
        self.call(HttpMethod::Put, path, options)
    }

    pub fn patch(&self, path: &str, options: &RequestOptions) -> Result<NormalizedResponse> {
        self.call(HttpMethod::Patch, path, options)
    }

    pub fn delete(&self, path: &str, options: &RequestOptions) -> Result<NormalizedResponse> {
        self.call(HttpMethod::Delete, path, options)
    }
}
