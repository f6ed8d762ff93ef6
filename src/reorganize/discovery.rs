use crate::models::{Module, ModuleId};

use super::titles::{classify_module_name, ModuleRole};

/// Which modules a course listing offers to the migration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    /// Number of modules listed, before anything is created or deleted.
    pub module_count: usize,
    pub welcome: Option<ModuleId>,
    pub resources: Option<ModuleId>,
    pub student_resources: Option<ModuleId>,
    /// True when no Welcome module existed and Resources stands in for it.
    pub resources_as_welcome: bool,
    /// Roles matched by more than one module. The last match is used.
    pub duplicates: Vec<ModuleRole>,
}

impl Discovery {
    /// Scan a module listing once and apply the Resources-as-Welcome fallback.
    pub fn from_modules(modules: &[Module]) -> Self {
        let mut found = Self {
            module_count: modules.len(),
            ..Self::default()
        };

        for module in modules {
            let Some(role) = classify_module_name(&module.name) else {
                continue;
            };
            let slot = match role {
                ModuleRole::Welcome => &mut found.welcome,
                ModuleRole::StudentResources => &mut found.student_resources,
                ModuleRole::Resources => &mut found.resources,
            };
            if slot.replace(module.id).is_some() && !found.duplicates.contains(&role) {
                found.duplicates.push(role);
            }
        }

        if found.welcome.is_none() {
            if let Some(resources) = found.resources.take() {
                found.welcome = Some(resources);
                found.resources_as_welcome = true;
            }
        }

        found
    }

    /// Nothing to migrate: neither Welcome nor Resources exists.
    pub fn is_empty(&self) -> bool {
        self.welcome.is_none() && self.resources.is_none()
    }
}
