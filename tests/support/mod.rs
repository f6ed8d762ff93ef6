//! In-memory fake of the Canvas module API, served over HTTP with axum.
//!
//! Items and modules are kept in display order. Inserting at a position
//! shifts later entries down and positions are clamped to the valid range,
//! matching how Canvas treats `position` on create and move.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use welcome_migrator::canvas::CanvasClient;
use welcome_migrator::config::CanvasConfig;

pub const TOKEN: &str = "test-token";

#[derive(Debug, Clone)]
pub struct FakeItem {
    pub id: u64,
    pub title: String,
    pub kind: String,
    pub indent: u32,
    pub published: bool,
}

#[derive(Debug, Clone)]
pub struct FakeModule {
    pub id: u64,
    pub name: String,
    pub published: bool,
    pub items: Vec<FakeItem>,
}

/// Requests the fake answers with a 500.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    ListModules,
    CreateModule,
    MoveItem(u64),
    CreateItem(String),
    DeleteModule(u64),
    DeleteItem(u64),
}

/// A mutating request the fake received.
#[derive(Debug, Clone)]
pub struct Call {
    pub method: Method,
    pub path: String,
    pub body: Value,
}

#[derive(Debug, Default)]
pub struct FakeCanvas {
    next_id: u64,
    pub base_url: String,
    pub modules: Vec<FakeModule>,
    pub faults: Vec<Fault>,
    pub calls: Vec<Call>,
    /// Force list endpoints to page at this size.
    pub page_size: Option<usize>,
}

impl FakeCanvas {
    pub fn new() -> Self {
        Self {
            next_id: 100,
            ..Self::default()
        }
    }

    fn alloc_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Add a module with page items titled `titles`, returning its id.
    pub fn add_module(&mut self, name: &str, titles: &[&str]) -> u64 {
        let id = self.alloc_id();
        let items = titles
            .iter()
            .map(|title| FakeItem {
                id: self.alloc_id(),
                title: title.to_string(),
                kind: "Page".to_string(),
                indent: 0,
                published: true,
            })
            .collect();
        self.modules.push(FakeModule {
            id,
            name: name.to_string(),
            published: true,
            items,
        });
        id
    }

    pub fn with_module(mut self, name: &str, titles: &[&str]) -> Self {
        self.add_module(name, titles);
        self
    }

    pub fn with_fault(mut self, fault: Fault) -> Self {
        self.faults.push(fault);
        self
    }

    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = Some(size);
        self
    }

    pub fn module(&self, name: &str) -> Option<&FakeModule> {
        self.modules.iter().find(|m| m.name == name)
    }

    pub fn item_id(&self, module: &str, title: &str) -> Option<u64> {
        self.module(module)?
            .items
            .iter()
            .find(|i| i.title == title)
            .map(|i| i.id)
    }

    fn module_mut(&mut self, id: u64) -> Option<&mut FakeModule> {
        self.modules.iter_mut().find(|m| m.id == id)
    }

    fn has_fault(&self, fault: &Fault) -> bool {
        self.faults.contains(fault)
    }

    fn record(&mut self, method: Method, path: String, body: Value) {
        self.calls.push(Call { method, path, body });
    }
}

type Shared = Arc<Mutex<FakeCanvas>>;

/// A running fake server.
pub struct TestCanvas {
    pub state: Shared,
    pub base_url: String,
}

impl TestCanvas {
    pub async fn start(fake: FakeCanvas) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake Canvas");
        let base_url = format!("http://{}", listener.local_addr().expect("local addr"));

        let state = Arc::new(Mutex::new(fake));
        state.lock().unwrap().base_url = base_url.clone();

        let app = router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake Canvas server");
        });

        Self { state, base_url }
    }

    pub fn client(&self) -> CanvasClient {
        self.client_with_token(TOKEN)
    }

    pub fn client_with_token(&self, token: &str) -> CanvasClient {
        CanvasClient::new(CanvasConfig::new(&self.base_url).with_token(token))
            .expect("Failed to build client")
    }

    pub fn module_names(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.modules.iter().map(|m| m.name.clone()).collect()
    }

    /// Item titles of the named module, top to bottom.
    pub fn titles(&self, module: &str) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .module(module)
            .map(|m| m.items.iter().map(|i| i.title.clone()).collect())
            .unwrap_or_default()
    }

    /// Item ids of the named module, top to bottom.
    pub fn item_ids(&self, module: &str) -> Vec<u64> {
        let state = self.state.lock().unwrap();
        state
            .module(module)
            .map(|m| m.items.iter().map(|i| i.id).collect())
            .unwrap_or_default()
    }

    pub fn item(&self, module: &str, title: &str) -> Option<FakeItem> {
        let state = self.state.lock().unwrap();
        state
            .module(module)?
            .items
            .iter()
            .find(|i| i.title == title)
            .cloned()
    }

    pub fn item_id(&self, module: &str, title: &str) -> u64 {
        self.state
            .lock()
            .unwrap()
            .item_id(module, title)
            .expect("item not found")
    }

    pub fn module_id(&self, name: &str) -> u64 {
        self.state
            .lock()
            .unwrap()
            .module(name)
            .map(|m| m.id)
            .expect("module not found")
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn calls_with(&self, method: Method) -> Vec<Call> {
        self.calls().into_iter().filter(|c| c.method == method).collect()
    }

    pub fn add_module(&self, name: &str, titles: &[&str]) -> u64 {
        self.state.lock().unwrap().add_module(name, titles)
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }
}

fn router(state: Shared) -> Router {
    Router::new()
        .route(
            "/api/v1/courses/{course}/modules",
            get(list_modules).post(create_module),
        )
        .route(
            "/api/v1/courses/{course}/modules/{module}",
            put(update_module).delete(delete_module),
        )
        .route(
            "/api/v1/courses/{course}/modules/{module}/items",
            get(list_items).post(create_item),
        )
        .route(
            "/api/v1/courses/{course}/modules/{module}/items/{item}",
            put(update_item).delete(delete_item),
        )
        .with_state(state)
}

// ============================================================
// Helpers
// ============================================================

#[derive(Debug, Deserialize)]
struct PageQuery {
    page: Option<usize>,
    per_page: Option<usize>,
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TOKEN}"))
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, "Invalid access token").into_response()
}

fn fault() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "Injected fault").into_response()
}

fn not_found(what: &str) -> Response {
    (StatusCode::NOT_FOUND, format!("{what} not found")).into_response()
}

/// Insert at a 1-based position, clamped to the list bounds.
fn insert_at<T>(list: &mut Vec<T>, position: Option<u64>, value: T) -> usize {
    let index = match position {
        Some(p) => (p.max(1) as usize - 1).min(list.len()),
        None => list.len(),
    };
    list.insert(index, value);
    index + 1
}

fn module_json(module: &FakeModule, position: usize) -> Value {
    json!({
        "id": module.id,
        "name": module.name,
        "position": position,
        "published": module.published,
        "items_count": module.items.len(),
    })
}

fn item_json(module_id: u64, item: &FakeItem, position: usize) -> Value {
    json!({
        "id": item.id,
        "module_id": module_id,
        "title": item.title,
        "type": item.kind,
        "position": position,
        "indent": item.indent,
        "published": item.published,
    })
}

/// Slice `values` into the requested page, adding a `Link` header when more remain.
fn paged(state: &FakeCanvas, path: &str, query: &PageQuery, values: Vec<Value>) -> Response {
    let per_page = state
        .page_size
        .or(query.per_page)
        .unwrap_or(10)
        .max(1);
    let page = query.page.unwrap_or(1).max(1);
    let start = (page - 1) * per_page;
    let chunk: Vec<Value> = values.iter().skip(start).take(per_page).cloned().collect();

    let mut response = Json(chunk).into_response();
    if start + per_page < values.len() {
        let next = format!(
            "<{}{}?page={}&per_page={}>; rel=\"next\"",
            state.base_url,
            path,
            page + 1,
            per_page
        );
        response
            .headers_mut()
            .insert(header::LINK, next.parse().expect("link header"));
    }
    response
}

// ============================================================
// Modules
// ============================================================

async fn list_modules(
    State(state): State<Shared>,
    Path(course): Path<String>,
    Query(query): Query<PageQuery>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let state = state.lock().unwrap();
    if state.has_fault(&Fault::ListModules) {
        return fault();
    }
    let values = state
        .modules
        .iter()
        .enumerate()
        .map(|(i, m)| module_json(m, i + 1))
        .collect();
    paged(
        &state,
        &format!("/api/v1/courses/{course}/modules"),
        &query,
        values,
    )
}

async fn create_module(
    State(state): State<Shared>,
    Path(course): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut state = state.lock().unwrap();
    state.record(
        Method::POST,
        format!("/api/v1/courses/{course}/modules"),
        body.clone(),
    );
    if state.has_fault(&Fault::CreateModule) {
        return fault();
    }
    let Some(name) = body["module"]["name"].as_str() else {
        return (StatusCode::BAD_REQUEST, "module[name] is required").into_response();
    };
    let module = FakeModule {
        id: state.alloc_id(),
        name: name.to_string(),
        published: false,
        items: Vec::new(),
    };
    let json = module_json(&module, state.modules.len() + 1);
    state.modules.push(module);
    Json(json).into_response()
}

async fn update_module(
    State(state): State<Shared>,
    Path((course, module_id)): Path<(String, u64)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut state = state.lock().unwrap();
    state.record(
        Method::PUT,
        format!("/api/v1/courses/{course}/modules/{module_id}"),
        body.clone(),
    );
    let Some(index) = state.modules.iter().position(|m| m.id == module_id) else {
        return not_found("Module");
    };
    let mut module = state.modules.remove(index);
    if let Some(published) = body["module"]["published"].as_bool() {
        module.published = published;
    }
    let position = body["module"]["position"].as_u64().or(Some(index as u64 + 1));
    let json_module = module.clone();
    let at = insert_at(&mut state.modules, position, module);
    Json(module_json(&json_module, at)).into_response()
}

async fn delete_module(
    State(state): State<Shared>,
    Path((course, module_id)): Path<(String, u64)>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut state = state.lock().unwrap();
    state.record(
        Method::DELETE,
        format!("/api/v1/courses/{course}/modules/{module_id}"),
        Value::Null,
    );
    if state.has_fault(&Fault::DeleteModule(module_id)) {
        return fault();
    }
    let Some(index) = state.modules.iter().position(|m| m.id == module_id) else {
        return not_found("Module");
    };
    let module = state.modules.remove(index);
    Json(module_json(&module, index + 1)).into_response()
}

// ============================================================
// Module items
// ============================================================

async fn list_items(
    State(state): State<Shared>,
    Path((course, module_id)): Path<(String, u64)>,
    Query(query): Query<PageQuery>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let state = state.lock().unwrap();
    let Some(module) = state.modules.iter().find(|m| m.id == module_id) else {
        return not_found("Module");
    };
    let values = module
        .items
        .iter()
        .enumerate()
        .map(|(i, item)| item_json(module_id, item, i + 1))
        .collect();
    paged(
        &state,
        &format!("/api/v1/courses/{course}/modules/{module_id}/items"),
        &query,
        values,
    )
}

async fn create_item(
    State(state): State<Shared>,
    Path((course, module_id)): Path<(String, u64)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut state = state.lock().unwrap();
    state.record(
        Method::POST,
        format!("/api/v1/courses/{course}/modules/{module_id}/items"),
        body.clone(),
    );
    let title = body["module_item"]["title"].as_str().unwrap_or_default().to_string();
    if state.has_fault(&Fault::CreateItem(title.clone())) {
        return fault();
    }
    let item = FakeItem {
        id: state.alloc_id(),
        title,
        kind: body["module_item"]["type"]
            .as_str()
            .unwrap_or("Page")
            .to_string(),
        indent: 0,
        published: false,
    };
    let position = body["module_item"]["position"].as_u64();
    let Some(module) = state.module_mut(module_id) else {
        return not_found("Module");
    };
    let json_item = item.clone();
    let at = insert_at(&mut module.items, position, item);
    Json(item_json(module_id, &json_item, at)).into_response()
}

async fn update_item(
    State(state): State<Shared>,
    Path((course, module_id, item_id)): Path<(String, u64, u64)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut state = state.lock().unwrap();
    state.record(
        Method::PUT,
        format!("/api/v1/courses/{course}/modules/{module_id}/items/{item_id}"),
        body.clone(),
    );
    if state.has_fault(&Fault::MoveItem(item_id)) {
        return fault();
    }
    let target_id = body["module_item"]["module_id"]
        .as_u64()
        .unwrap_or(module_id);
    if !state.modules.iter().any(|m| m.id == target_id) {
        return not_found("Target module");
    }

    let Some(source) = state.module_mut(module_id) else {
        return not_found("Module");
    };
    let Some(index) = source.items.iter().position(|i| i.id == item_id) else {
        return not_found("Module item");
    };
    let mut item = source.items.remove(index);
    if let Some(indent) = body["module_item"]["indent"].as_u64() {
        item.indent = indent as u32;
    }
    if let Some(published) = body["module_item"]["published"].as_bool() {
        item.published = published;
    }

    let position = body["module_item"]["position"].as_u64();
    let Some(target) = state.module_mut(target_id) else {
        return not_found("Target module");
    };
    let json_item = item.clone();
    let at = insert_at(&mut target.items, position, item);
    Json(item_json(target_id, &json_item, at)).into_response()
}

async fn delete_item(
    State(state): State<Shared>,
    Path((course, module_id, item_id)): Path<(String, u64, u64)>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut state = state.lock().unwrap();
    state.record(
        Method::DELETE,
        format!("/api/v1/courses/{course}/modules/{module_id}/items/{item_id}"),
        Value::Null,
    );
    if state.has_fault(&Fault::DeleteItem(item_id)) {
        return fault();
    }
    let Some(module) = state.module_mut(module_id) else {
        return not_found("Module");
    };
    let Some(index) = module.items.iter().position(|i| i.id == item_id) else {
        return not_found("Module item");
    };
    let item = module.items.remove(index);
    Json(item_json(module_id, &item, index + 1)).into_response()
}
