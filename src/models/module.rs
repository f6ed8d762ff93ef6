use std::fmt;

use serde::{Deserialize, Serialize};

/// Canvas-assigned module id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(pub u64);

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named container of content items, ordered among its sibling modules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub id: ModuleId,
    pub name: String,
    /// 1-based position among the course's modules.
    #[serde(default)]
    pub position: Option<u32>,
    #[serde(default)]
    pub published: Option<bool>,
    #[serde(default)]
    pub items_count: Option<u32>,
}

/// Input for creating a module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateModuleInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
}

impl CreateModuleInput {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: None,
        }
    }
}

/// Input for updating a module. Unset fields are left untouched remotely.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateModuleInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
}
