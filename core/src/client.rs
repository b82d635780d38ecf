//! Blocking client for a scaffold API.
//!
//! # Design
//! `ScaffoldClient` owns its configuration, a `RequestExecutor` (transport,
//! credentials, base URI) and an `ErrorPolicy`. Each of the seven scaffold
//! operations builds an `Operation` and runs it through the same policy, so
//! rescue behavior is identical across operations. The raw verb helpers
//! (`get`, `post`, ...) skip the policy and always return errors.
//!
//! Operations return `Result<Option<NormalizedResponse>, ClientError>`:
//! `Ok(Some(_))` on success, `Ok(None)` when a failure was logged and
//! swallowed, and `Err(_)` for configuration errors or, with
//! `raise_exceptions`, any failure.

use std::fmt;

use serde::Serialize;

use crate::config::{ClientConfig, RequestFormat};
use crate::error::Result;
use crate::executor::{RequestExecutor, RequestOptions};
use crate::http::{HttpMethod, HttpRequest, Transport};
use crate::operation::{Operation, OperationKind};
use crate::parse::NormalizedResponse;
use crate::policy::ErrorPolicy;
use crate::transport::UreqTransport;
use crate::types::ExecuteRequest;

/// Outcome of a policy-wrapped scaffold operation.
pub type OperationResult = Result<Option<NormalizedResponse>>;

#[derive(Debug)]
pub struct ScaffoldClient<T = UreqTransport> {
    config: ClientConfig,
    executor: RequestExecutor<T>,
    policy: ErrorPolicy,
}

impl ScaffoldClient<UreqTransport> {
    /// Client that talks to the network through ureq.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::with_transport(config, UreqTransport::new())
    }
}

impl<T: Transport> ScaffoldClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            executor: RequestExecutor::new(&config, transport),
            policy: ErrorPolicy::from_config(&config),
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn executor(&self) -> &RequestExecutor<T> {
        &self.executor
    }

    pub fn request_format(&self) -> RequestFormat {
        self.executor.format()
    }

    /// Switch the wire format. Anything but `json`/`xml` is
    /// `UnsupportedFormat` and leaves the client unchanged.
    pub fn set_request_format(&mut self, format: &str) -> Result<()> {
        let format: RequestFormat = format.parse()?;
        self.config.request_format = format;
        self.executor.set_format(format);
        Ok(())
    }

    /// The active absolute base URI.
    pub fn base_uri(&self) -> String {
        self.executor.uri().base_uri()
    }

    /// Run `body` against `base_uri` (absolute, or a path under the
    /// hostname). The previous base URI is restored afterwards, even if
    /// `body` returns an error or panics.
    pub fn with_base_uri<R>(&self, base_uri: &str, body: impl FnOnce(&Self) -> R) -> R {
        self.executor.uri().scoped(base_uri, || body(self))
    }

    /// Send `operation` without the rescue policy.
    pub fn send(&self, operation: &Operation) -> Result<NormalizedResponse> {
        self.executor
            .call(operation.method(), &operation.path(), &operation.options())
    }

    /// Send `operation` under the rescue policy.
    pub fn dispatch(&self, operation: &Operation) -> OperationResult {
        self.policy
            .guard(operation.kind, &operation.table, || self.send(operation))
    }

    fn guarded(
        &self,
        kind: OperationKind,
        table: &str,
        build: impl FnOnce() -> Result<Operation>,
    ) -> OperationResult {
        self.policy.guard(kind, table, || self.send(&build()?))
    }

    /// Describe the request an operation would send, without sending it.
    pub fn preview(&self, operation: &Operation) -> Result<HttpRequest> {
        self.executor
            .build_request(operation.method(), &operation.path(), &operation.options())
    }

    /// POST `/{table}/create` with `{record: ...}`.
    pub fn create<R: Serialize + ?Sized>(&self, table: &str, record: &R) -> OperationResult {
        self.guarded(OperationKind::Create, table, || Operation::create(table, record))
    }

    /// GET `/{table}`.
    pub fn list(&self, table: &str) -> OperationResult {
        self.guarded(OperationKind::List, table, || Ok(Operation::list(table)))
    }

    /// POST `/{table}/index` with the search parameters as the body.
    pub fn search<P: Serialize + ?Sized>(&self, table: &str, params: &P) -> OperationResult {
        self.guarded(OperationKind::Search, table, || Operation::search(table, params))
    }

    /// GET `/{table}/show/{id}`.
    pub fn show(&self, table: &str, id: impl fmt::Display) -> OperationResult {
        self.guarded(OperationKind::Show, table, || Ok(Operation::show(table, id)))
    }

    /// POST `/{table}/update/{id}` with `{record: ...}`.
    pub fn update<R: Serialize + ?Sized>(
        &self,
        table: &str,
        id: impl fmt::Display,
        record: &R,
    ) -> OperationResult {
        self.guarded(OperationKind::Update, table, || Operation::update(table, id, record))
    }

    /// POST `/{table}/destroy/{id}`.
    pub fn destroy(&self, table: &str, id: impl fmt::Display) -> OperationResult {
        self.guarded(OperationKind::Destroy, table, || Ok(Operation::destroy(table, id)))
    }

    /// POST `/{table}/execute` with `{request: ...}`.
    ///
    /// Runs `method_name` on the record picked by `record_id` or
    /// `record_name`, or on the model class when neither is set:
    ///
    /// ```no_run
    /// # use scaffold_core::{ClientConfig, ExecuteRequest, ScaffoldClient};
    /// # use serde_json::json;
    /// let client = ScaffoldClient::new(ClientConfig::new("rxg.example.com", "key"))?;
    /// let request = ExecuteRequest::new("make_login_session")
    ///     .on_record_id(7)
    ///     .args(json!(["192.168.20.111", "00:00:00:00:00:05", "test", 1]));
    /// client.execute("shared_credential_groups", &request)?;
    /// # Ok::<(), scaffold_core::ClientError>(())
    /// ```
    pub fn execute(&self, table: &str, request: &ExecuteRequest) -> OperationResult {
        self.guarded(OperationKind::Execute, table, || Operation::execute(table, request))
    }

    pub fn get(&self, path: &str, options: &RequestOptions) -> Result<NormalizedResponse> {
        self.executor.call(HttpMethod::Get, path, options)
    }

    pub fn post(&self, path: &str, options: &RequestOptions) -> Result<NormalizedResponse> {
        self.executor.call(HttpMethod::Post, path, options)
    }

    pub fn put(&self, path: &str, options: &RequestOptions) -> Result<NormalizedResponse> {
        self.executor.call(HttpMethod::Put, path, options)
    }

    pub fn patch(&self, path: &str, options: &RequestOptions) -> Result<NormalizedResponse> {
        self.executor.call(HttpMethod::Patch, path, options)
    }

    pub fn delete(&self, path: &str, options: &RequestOptions) -> Result<NormalizedResponse> {
        self.executor.call(HttpMethod::Delete, path, options)
    }
}
