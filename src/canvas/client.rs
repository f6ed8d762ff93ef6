//! HTTP client for the Canvas REST API.
//!
//! List endpoints are paginated by Canvas; the client follows `Link: rel="next"`
//! headers until the last page. Nothing is retried.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, LINK};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use super::CanvasApi;
use crate::config::{CanvasConfig, ConfigError};
use crate::models::*;

/// Page size requested from list endpoints (Canvas caps it at 100).
const PER_PAGE: &str = "100";

/// HTTP client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: API token missing, invalid, or lacking permission")]
    Unauthorized,

    #[error("Server error: {0}")]
    Server(String),
}

/// HTTP client for the Canvas module API.
#[derive(Debug, Clone)]
pub struct CanvasClient {
    config: CanvasConfig,
    client: Client,
}

impl CanvasClient {
    /// Build a client, validating the configuration first.
    pub fn new(config: CanvasConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let client = Client::builder()
            .connect_timeout(std::time::Duration::from_secs(5))
            .timeout(config.timeout())
            .build()
            .map_err(|e| ConfigError::Invalid(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    /// Build a request against an absolute URL with the bearer token attached.
    fn request_url(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        let mut req = self.client.request(method, url);
        if let Some(token) = self.config.token() {
            req = req.bearer_auth(token);
        }
        req
    }

    /// Build a request for an API path.
    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.request_url(method, &self.config.url(path))
    }

    /// Map a non-success status to a ClientError.
    async fn error_for(response: reqwest::Response) -> ClientError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::NOT_FOUND => ClientError::NotFound(body),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                ClientError::BadRequest(body)
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::Unauthorized,
            _ => ClientError::Server(format!("{}: {}", status, body)),
        }
    }

    /// Handle response, converting HTTP errors to ClientError.
    async fn handle_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(Self::error_for(response).await)
        }
    }

    /// Handle response whose body is irrelevant (deletes).
    async fn handle_empty_response(response: reqwest::Response) -> Result<(), ClientError> {
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_for(response).await)
        }
    }

    /// GET every page of a list endpoint.
    async fn get_all<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ClientError> {
        let mut results = Vec::new();
        let mut response = self
            .request(reqwest::Method::GET, path)
            .query(&[("per_page", PER_PAGE)])
            .send()
            .await?;

        loop {
            let next = next_page_url(response.headers());
            let page: Vec<T> = Self::handle_response(response).await?;
            results.extend(page);

            let Some(url) = next else { break };
            tracing::trace!("Following pagination link {}", url);
            response = self
                .request_url(reqwest::Method::GET, &url)
                .send()
                .await?;
        }

        Ok(results)
    }
}

/// Extract the `rel="next"` target from a `Link` header, if any.
fn next_page_url(headers: &HeaderMap) -> Option<String> {
    let link = headers.get(LINK)?.to_str().ok()?;
    link.split(',').find_map(|part| {
        let mut segments = part.split(';');
        let target = segments.next()?.trim();
        let is_next = segments.any(|param| {
            let param = param.trim();
            param == "rel=\"next\"" || param == "rel=next"
        });
        if !is_next {
            return None;
        }
        target
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .map(str::to_string)
    })
}

fn modules_path(course: &CourseId) -> String {
    format!("/api/v1/courses/{}/modules", course)
}

fn module_path(course: &CourseId, module: ModuleId) -> String {
    format!("/api/v1/courses/{}/modules/{}", course, module)
}

fn items_path(course: &CourseId, module: ModuleId) -> String {
    format!("/api/v1/courses/{}/modules/{}/items", course, module)
}

fn item_path(course: &CourseId, module: ModuleId, item: ItemId) -> String {
    format!("/api/v1/courses/{}/modules/{}/items/{}", course, module, item)
}

#[async_trait]
impl CanvasApi for CanvasClient {
    // ============================================================
    // Module Operations
    // ============================================================

    async fn list_modules(&self, course: &CourseId) -> Result<Vec<Module>, ClientError> {
        self.get_all(&modules_path(course)).await
    }

    async fn create_module(
        &self,
        course: &CourseId,
        input: &CreateModuleInput,
    ) -> Result<Module, ClientError> {
        let response = self
            .request(reqwest::Method::POST, &modules_path(course))
            .json(&serde_json::json!({ "module": input }))
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn update_module(
        &self,
        course: &CourseId,
        module: ModuleId,
        input: &UpdateModuleInput,
    ) -> Result<Module, ClientError> {
        let response = self
            .request(reqwest::Method::PUT, &module_path(course, module))
            .json(&serde_json::json!({ "module": input }))
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn delete_module(&self, course: &CourseId, module: ModuleId) -> Result<(), ClientError> {
        let response = self
            .request(reqwest::Method::DELETE, &module_path(course, module))
            .send()
            .await?;
        Self::handle_empty_response(response).await
    }

    // ============================================================
    // Module Item Operations
    // ============================================================

    async fn list_module_items(
        &self,
        course: &CourseId,
        module: ModuleId,
    ) -> Result<Vec<ModuleItem>, ClientError> {
        self.get_all(&items_path(course, module)).await
    }

    async fn create_module_item(
        &self,
        course: &CourseId,
        module: ModuleId,
        input: &CreateModuleItemInput,
    ) -> Result<ModuleItem, ClientError> {
        let response = self
            .request(reqwest::Method::POST, &items_path(course, module))
            .json(&serde_json::json!({ "module_item": input }))
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn update_module_item(
        &self,
        course: &CourseId,
        module: ModuleId,
        item: ItemId,
        input: &UpdateModuleItemInput,
    ) -> Result<ModuleItem, ClientError> {
        let response = self
            .request(reqwest::Method::PUT, &item_path(course, module, item))
            .json(&serde_json::json!({ "module_item": input }))
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn delete_module_item(
        &self,
        course: &CourseId,
        module: ModuleId,
        item: ItemId,
    ) -> Result<(), ClientError> {
        let response = self
            .request(reqwest::Method::DELETE, &item_path(course, module, item))
            .send()
            .await?;
        Self::handle_empty_response(response).await
    }
}
