//! Blocking `Transport` backed by ureq.

use std::io;

use tracing::debug;
use ureq::tls::TlsConfig;
use ureq::{Agent, RequestBuilder};

use crate::error::ClientError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};

/// Sends requests with a ureq agent built per call, so each request gets its
/// own timeout and TLS verification setting.
///
/// Status codes are never treated as errors here; interpreting them is the
/// executor's job.
#[derive(Debug, Clone, Default)]
pub struct UreqTransport;

impl UreqTransport {
    pub fn new() -> Self {
        Self
    }

    fn agent(request: &HttpRequest) -> Agent {
        Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(request.timeout))
            .tls_config(
                TlsConfig::builder()
                    .disable_verification(!request.verify_tls)
                    .build(),
            )
            .build()
            .new_agent()
    }
}

fn decorate<B>(mut builder: RequestBuilder<B>, request: &HttpRequest) -> RequestBuilder<B> {
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    for (key, value) in &request.query {
        builder = builder.query(key.as_str(), value.as_str());
    }
    builder
}

fn map_error(err: ureq::Error, request: &HttpRequest) -> ClientError {
    match err {
        ureq::Error::Timeout(_) => ClientError::Timeout(request.timeout),
        other => ClientError::Transport(Box::new(other)),
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ClientError> {
        let agent = Self::agent(request);
        let url = request.url.as_str();

        debug!(method = %request.method, url, "sending request");

        let result = match (request.method, request.body.as_deref()) {
            (HttpMethod::Get, _) => decorate(agent.get(url), request).call(),
            (HttpMethod::Delete, _) => decorate(agent.delete(url), request).call(),
            (HttpMethod::Post, Some(body)) => decorate(agent.post(url), request).send(body),
            (HttpMethod::Post, None) => decorate(agent.post(url), request).send_empty(),
            (HttpMethod::Put, Some(body)) => decorate(agent.put(url), request).send(body),
            (HttpMethod::Put, None) => decorate(agent.put(url), request).send_empty(),
            (HttpMethod::Patch, Some(body)) => decorate(agent.patch(url), request).send(body),
            (HttpMethod::Patch, None) => decorate(agent.patch(url), request).send_empty(),
        };
        let mut response = result.map_err(|e| map_error(e, request))?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| match e {
                ureq::Error::Timeout(_) => ClientError::Timeout(request.timeout),
                ureq::Error::Io(err) if err.kind() == io::ErrorKind::TimedOut => {
                    ClientError::Timeout(request.timeout)
                }
                other => ClientError::Transport(Box::new(other)),
            })?;

        Ok(HttpResponse {
            status: status.as_u16(),
            message: status.canonical_reason().unwrap_or("").to_string(),
            headers,
            body,
        })
    }
}
