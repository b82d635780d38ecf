use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};

pub const BASE_PATH: &str = "/admin/scaffolds";

pub type Record = Map<String, Value>;

#[derive(Default)]
pub struct Store {
    tables: HashMap<String, Vec<Record>>,
    next_id: u64,
}

impl Store {
    fn insert(&mut self, table: &str, mut record: Record) -> Record {
        self.next_id += 1;
        record.insert("id".to_string(), json!(self.next_id));
        self.tables
            .entry(table.to_string())
            .or_default()
            .push(record.clone());
        record
    }

    fn find_mut(&mut self, table: &str, id: u64) -> Option<&mut Record> {
        self.tables
            .get_mut(table)?
            .iter_mut()
            .find(|r| r.get("id").and_then(Value::as_u64) == Some(id))
    }
}

pub type Db = Arc<RwLock<Store>>;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub api_key: String,
}

#[derive(Deserialize)]
pub struct RecordBody {
    pub record: Record,
}

#[derive(Deserialize)]
pub struct ExecuteBody {
    pub request: ExecuteCall,
}

#[derive(Deserialize)]
pub struct ExecuteCall {
    pub record_id: Option<u64>,
    pub record_name: Option<String>,
    pub method_name: String,
    #[serde(default)]
    pub method_args: Value,
}

/// Scaffold routes under `BASE_PATH`, accepting `api_key` as the credential.
pub fn app(api_key: &str) -> Router {
    let state = AppState {
        db: Arc::new(RwLock::new(Store::default())),
        api_key: api_key.to_string(),
    };
    let scaffolds = Router::new()
        .route("/{table}", get(list_records))
        .route("/{table}/index", post(search_records))
        .route("/{table}/create", post(create_record))
        .route("/{table}/show/{id}", get(show_record))
        .route("/{table}/update/{id}", post(update_record))
        .route("/{table}/destroy/{id}", post(destroy_record))
        .route("/{table}/execute", post(execute_method))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .with_state(state);
    Router::new().nest(BASE_PATH, scaffolds)
}

pub async fn run(listener: TcpListener, api_key: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app(api_key)).await
}

/// Accepts the key from the `apikey` or `fleetkey` header or the `api_key`
/// query parameter.
async fn require_api_key(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let presented = ["apikey", "fleetkey"]
        .iter()
        .filter_map(|name| headers.get(*name).and_then(|v| v.to_str().ok()))
        .chain(params.get("api_key").map(String::as_str))
        .any(|key| key == state.api_key);
    if !presented {
        tracing::debug!(uri = %request.uri(), "rejected request without a valid key");
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(next.run(request).await)
}

fn matches(record: &Record, filter: &Record) -> bool {
    filter.iter().all(|(k, v)| record.get(k) == Some(v))
}

async fn list_records(State(state): State<AppState>, Path(table): Path<String>) -> Json<Vec<Record>> {
    let store = state.db.read().await;
    Json(store.tables.get(&table).cloned().unwrap_or_default())
}

/// Filters by equality on every field of the body, or of its `search` member
/// when present.
async fn search_records(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Json(params): Json<Record>,
) -> Json<Vec<Record>> {
    let filter = match params.get("search") {
        Some(Value::Object(inner)) => inner.clone(),
        _ => params,
    };
    let store = state.db.read().await;
    let found = store
        .tables
        .get(&table)
        .map(|records| records.iter().filter(|r| matches(r, &filter)).cloned().collect())
        .unwrap_or_default();
    Json(found)
}

async fn create_record(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Json(body): Json<RecordBody>,
) -> (StatusCode, Json<Record>) {
    let record = state.db.write().await.insert(&table, body.record);
    (StatusCode::CREATED, Json(record))
}

async fn show_record(
    State(state): State<AppState>,
    Path((table, id)): Path<(String, u64)>,
) -> Result<Json<Record>, StatusCode> {
    let mut store = state.db.write().await;
    store.find_mut(&table, id).map(|r| Json(r.clone())).ok_or(StatusCode::NOT_FOUND)
}

async fn update_record(
    State(state): State<AppState>,
    Path((table, id)): Path<(String, u64)>,
    Json(body): Json<RecordBody>,
) -> Result<Json<Record>, StatusCode> {
    let mut store = state.db.write().await;
    let record = store.find_mut(&table, id).ok_or(StatusCode::NOT_FOUND)?;
    for (key, value) in body.record {
        if key != "id" {
            record.insert(key, value);
        }
    }
    Ok(Json(record.clone()))
}

/// Answers with an empty body on success.
async fn destroy_record(
    State(state): State<AppState>,
    Path((table, id)): Path<(String, u64)>,
) -> StatusCode {
    let mut store = state.db.write().await;
    let Some(records) = store.tables.get_mut(&table) else {
        return StatusCode::NOT_FOUND;
    };
    let before = records.len();
    records.retain(|r| r.get("id").and_then(Value::as_u64) != Some(id));
    if records.len() == before {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::OK
    }
}

/// Supported methods: `count` (class), `rename` (record, one string
/// argument), `banner` (class, answers HTML).
async fn execute_method(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Json(body): Json<ExecuteBody>,
) -> Response {
    let call = body.request;
    let mut store = state.db.write().await;

    match call.method_name.as_str() {
        "count" => {
            let count = store.tables.get(&table).map(Vec::len).unwrap_or(0);
            Json(json!(count)).into_response()
        }
        "banner" => (
            [(header::CONTENT_TYPE, "text/html")],
            format!("<h1>{table}</h1>"),
        )
            .into_response(),
        "rename" => {
            let Some(new_name) = call.method_args.get(0).and_then(Value::as_str) else {
                return unprocessable("rename expects one string argument");
            };
            let Some(records) = store.tables.get_mut(&table) else {
                return StatusCode::NOT_FOUND.into_response();
            };
            let target = records.iter_mut().find(|r| match (&call.record_id, &call.record_name) {
                (Some(id), _) => r.get("id").and_then(Value::as_u64) == Some(*id),
                (None, Some(name)) => r.get("name").and_then(Value::as_str) == Some(name.as_str()),
                (None, None) => false,
            });
            match target {
                Some(record) => {
                    record.insert("name".to_string(), json!(new_name));
                    Json(record.clone()).into_response()
                }
                None => StatusCode::NOT_FOUND.into_response(),
            }
        }
        other => unprocessable(&format!("undefined method {other}")),
    }
}

fn unprocessable(message: &str) -> Response {
    (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "error": message }))).into_response()
}
