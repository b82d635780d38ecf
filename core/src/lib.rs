//! Blocking client for "scaffold" REST APIs.
//!
//! # Overview
//! A scaffold API exposes the same endpoints for every resource table:
//! create, list, search, show, update, destroy, and `execute`, which calls an
//! arbitrary model method remotely. `ScaffoldClient` drives those endpoints
//! over HTTPS with either JSON or XML bodies.
//!
//! # Design
//! - `RequestExecutor` turns one verb call into a plain-data `HttpRequest`
//!   (credentials from `AuthStrategy`, URL from `UriResolver`) and hands it
//!   to a `Transport`. `UreqTransport` is the default; tests plug in fakes.
//! - `parse` decodes bodies into a `NormalizedResponse`. Undecodable bodies
//!   come back as raw text rather than errors.
//! - Every scaffold operation is an `Operation` run through one
//!   `ErrorPolicy`, which logs failures and either swallows them or returns
//!   them depending on `raise_exceptions`.
//! - The base URI is the only mutable state and can only be changed for the
//!   extent of a `with_base_uri` closure.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod http;
pub mod operation;
pub mod parse;
pub mod policy;
pub mod transport;
pub mod types;
pub mod uri;
pub mod xml;

#[cfg(test)]
mod testing;

pub use auth::AuthStrategy;
pub use client::{OperationResult, ScaffoldClient};
pub use config::{AuthMethod, ClientConfig, DebugSink, RequestFormat};
pub use error::ClientError;
pub use executor::{RequestExecutor, RequestOptions};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use operation::{Operation, OperationKind};
pub use parse::NormalizedResponse;
pub use policy::ErrorPolicy;
pub use transport::UreqTransport;
pub use types::ExecuteRequest;
pub use uri::{resolve_uri, UriResolver};
