//! The seven scaffold operations as data.
//!
//! # Design
//! Each public client operation is described once as an `Operation`: its
//! `OperationKind` picks the verb and path template, and the payload is
//! serialized up front. The client sends every `Operation` through the same
//! rescue policy, so no operation carries its own error handling.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{ClientError, Result};
use crate::executor::RequestOptions;
use crate::http::HttpMethod;
use crate::types::ExecuteRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Create,
    List,
    Search,
    Show,
    Update,
    Destroy,
    Execute,
}

impl OperationKind {
    pub const ALL: [OperationKind; 7] = [
        OperationKind::Create,
        OperationKind::List,
        OperationKind::Search,
        OperationKind::Show,
        OperationKind::Update,
        OperationKind::Destroy,
        OperationKind::Execute,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            OperationKind::Create => "create",
            OperationKind::List => "list",
            OperationKind::Search => "search",
            OperationKind::Show => "show",
            OperationKind::Update => "update",
            OperationKind::Destroy => "destroy",
            OperationKind::Execute => "execute",
        }
    }

    pub fn method(&self) -> HttpMethod {
        match self {
            OperationKind::List | OperationKind::Show => HttpMethod::Get,
            _ => HttpMethod::Post,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One fully described scaffold call.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub kind: OperationKind,
    pub table: String,
    pub id: Option<String>,
    pub body: Option<Value>,
}

fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| ClientError::Serialization(e.to_string()))
}

fn wrap(key: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    Value::Object(map)
}

impl Operation {
    fn new(kind: OperationKind, table: &str) -> Self {
        Self {
            kind,
            table: table.trim_matches('/').to_string(),
            id: None,
            body: None,
        }
    }

    fn with_id(mut self, id: impl fmt::Display) -> Self {
        self.id = Some(id.to_string());
        self
    }

    fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn create<R: Serialize + ?Sized>(table: &str, record: &R) -> Result<Self> {
        Ok(Self::new(OperationKind::Create, table).with_body(wrap("record", to_value(record)?)))
    }

    pub fn list(table: &str) -> Self {
        Self::new(OperationKind::List, table)
    }

    pub fn search<P: Serialize + ?Sized>(table: &str, params: &P) -> Result<Self> {
        Ok(Self::new(OperationKind::Search, table).with_body(to_value(params)?))
    }

    pub fn show(table: &str, id: impl fmt::Display) -> Self {
        Self::new(OperationKind::Show, table).with_id(id)
    }

    pub fn update<R: Serialize + ?Sized>(table: &str, id: impl fmt::Display, record: &R) -> Result<Self> {
        Ok(Self::new(OperationKind::Update, table)
            .with_id(id)
            .with_body(wrap("record", to_value(record)?)))
    }

    pub fn destroy(table: &str, id: impl fmt::Display) -> Self {
        Self::new(OperationKind::Destroy, table).with_id(id)
    }

    pub fn execute(table: &str, request: &ExecuteRequest) -> Result<Self> {
        Ok(Self::new(OperationKind::Execute, table).with_body(wrap("request", to_value(request)?)))
    }

    pub fn method(&self) -> HttpMethod {
        self.kind.method()
    }

    /// Action path relative to the base URI.
    pub fn path(&self) -> String {
        let table = &self.table;
        let id = self.id.as_deref().unwrap_or_default();
        match self.kind {
            OperationKind::Create => format!("/{table}/create"),
            OperationKind::List => format!("/{table}"),
            OperationKind::Search => format!("/{table}/index"),
            OperationKind::Show => format!("/{table}/show/{id}"),
            OperationKind::Update => format!("/{table}/update/{id}"),
            OperationKind::Destroy => format!("/{table}/destroy/{id}"),
            OperationKind::Execute => format!("/{table}/execute"),
        }
    }

    pub fn options(&self) -> RequestOptions {
        RequestOptions {
            body: self.body.clone(),
            ..RequestOptions::default()
        }
    }
}
