//! Access to the Canvas LMS module API.
//!
//! [`CanvasApi`] is the seam the reorganization pipeline talks through. Each
//! call is a single request/response; implementations own timeouts.

mod client;

pub use client::{CanvasClient, ClientError};

use async_trait::async_trait;

use crate::models::*;

/// The module and module-item operations the pipeline needs.
#[async_trait]
pub trait CanvasApi: Send + Sync {
    /// List every module in the course, in course order.
    async fn list_modules(&self, course: &CourseId) -> Result<Vec<Module>, ClientError>;

    async fn create_module(
        &self,
        course: &CourseId,
        input: &CreateModuleInput,
    ) -> Result<Module, ClientError>;

    async fn update_module(
        &self,
        course: &CourseId,
        module: ModuleId,
        input: &UpdateModuleInput,
    ) -> Result<Module, ClientError>;

    async fn delete_module(&self, course: &CourseId, module: ModuleId) -> Result<(), ClientError>;

    /// List the items of one module, in module order.
    async fn list_module_items(
        &self,
        course: &CourseId,
        module: ModuleId,
    ) -> Result<Vec<ModuleItem>, ClientError>;

    async fn create_module_item(
        &self,
        course: &CourseId,
        module: ModuleId,
        input: &CreateModuleItemInput,
    ) -> Result<ModuleItem, ClientError>;

    /// Update an item addressed through its current module. Passing a
    /// different `module_id` in `input` moves the item.
    async fn update_module_item(
        &self,
        course: &CourseId,
        module: ModuleId,
        item: ItemId,
        input: &UpdateModuleItemInput,
    ) -> Result<ModuleItem, ClientError>;

    async fn delete_module_item(
        &self,
        course: &CourseId,
        module: ModuleId,
        item: ItemId,
    ) -> Result<(), ClientError>;
}
