use std::fmt;

use serde::{Deserialize, Serialize};

use super::ModuleId;

/// Canvas-assigned module item id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kind of content a module item points at.
///
/// `SubHeader` carries no content; it is a visual divider inside a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleItemType {
    File,
    Page,
    Discussion,
    Assignment,
    Quiz,
    SubHeader,
    ExternalUrl,
    ExternalTool,
    /// Any type this tool does not need to distinguish.
    #[serde(untagged)]
    Other(String),
}

impl ModuleItemType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::File => "File",
            Self::Page => "Page",
            Self::Discussion => "Discussion",
            Self::Assignment => "Assignment",
            Self::Quiz => "Quiz",
            Self::SubHeader => "SubHeader",
            Self::ExternalUrl => "ExternalUrl",
            Self::ExternalTool => "ExternalTool",
            Self::Other(s) => s,
        }
    }
}

/// A single entry inside a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleItem {
    /// Canvas omits the id on some placeholder entries.
    #[serde(default)]
    pub id: Option<ItemId>,
    #[serde(default)]
    pub module_id: Option<ModuleId>,
    pub title: String,
    #[serde(rename = "type")]
    pub item_type: ModuleItemType,
    /// 1-based position within the owning module.
    #[serde(default)]
    pub position: Option<u32>,
    #[serde(default)]
    pub indent: u32,
    #[serde(default)]
    pub published: Option<bool>,
}

/// Input for creating a module item. Only sub-headers are ever created here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateModuleItemInput {
    pub title: String,
    #[serde(rename = "type")]
    pub item_type: ModuleItemType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
}

impl CreateModuleItemInput {
    pub fn sub_header(title: impl Into<String>, position: u32) -> Self {
        Self {
            title: title.into(),
            item_type: ModuleItemType::SubHeader,
            position: Some(position),
        }
    }
}

/// Input for updating a module item.
///
/// Setting `module_id` to a different module re-parents the item; Canvas then
/// inserts it at `position` in the destination, shifting later items down.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateModuleItemInput {
    pub module_id: ModuleId,
    pub indent: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    pub new_tab: bool,
    pub published: bool,
}

impl UpdateModuleItemInput {
    /// Re-parent into `target` at `position`, indented once, opening in a new tab.
    pub fn relocate(target: ModuleId, position: u32) -> Self {
        Self {
            module_id: target,
            indent: 1,
            position: Some(position),
            new_tab: true,
            published: true,
        }
    }
}
