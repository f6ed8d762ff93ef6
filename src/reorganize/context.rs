use serde::{Deserialize, Serialize};

use crate::models::{CourseId, ItemId, ModuleId};

/// What a completed run changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub target_module: Option<ModuleId>,
    /// The target module did not exist and was created by this run.
    pub target_created: bool,
    pub resources_relocated: usize,
    pub supplemental_relocated: usize,
    pub standard_relocated: usize,
    pub pages_deleted: usize,
    pub headers_created: usize,
    pub modules_deleted: usize,
    /// Non-fatal failures that were reported and skipped.
    pub warnings: usize,
}

/// Bookkeeping owned by a single run and threaded through every stage.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub course: CourseId,
    /// Module count at discovery time; the target ends up after all of them.
    pub module_count: usize,
    pub welcome: Option<ModuleId>,
    /// Only set when Resources is a separate module from the Welcome source.
    pub resources: Option<ModuleId>,
    pub target: Option<ModuleId>,
    /// Canonical Resources items held back until the standard block is placed.
    pub resources_standard: Vec<(usize, ItemId)>,
    /// Items placed above the standard block so far.
    pub supplemental_count: usize,
    pub summary: RunSummary,
}

impl RunContext {
    pub fn new(course: CourseId) -> Self {
        Self {
            course,
            module_count: 0,
            welcome: None,
            resources: None,
            target: None,
            resources_standard: Vec::new(),
            supplemental_count: 0,
            summary: RunSummary::default(),
        }
    }
}

/// Convert a count into a 1-based Canvas position.
pub(crate) fn position(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
