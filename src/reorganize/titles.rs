//! Recognizing modules and module items by their titles.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::ReorgPolicy;
use crate::models::{ItemId, ModuleItem};

// "Welcome" may carry one trailing character ("Welcome!", "Welcome 1").
static WELCOME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*welcome(\s|\S)?\s*$").expect("welcome pattern"));
static STUDENT_RESOURCES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*student\s*resources\s*$").expect("student resources pattern")
});
static RESOURCES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*resources\s*$").expect("resources pattern"));

/// The part a module plays in the migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleRole {
    /// Source whose items are sorted into the target.
    Welcome,
    /// The target module.
    StudentResources,
    /// Secondary source moved wholesale into the target.
    Resources,
}

impl ModuleRole {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Welcome => "Welcome",
            Self::StudentResources => "Student Resources",
            Self::Resources => "Resources",
        }
    }
}

/// Classify a module by name. Checked in order: Welcome, Student Resources, Resources.
pub fn classify_module_name(name: &str) -> Option<ModuleRole> {
    if WELCOME.is_match(name) {
        Some(ModuleRole::Welcome)
    } else if STUDENT_RESOURCES.is_match(name) {
        Some(ModuleRole::StudentResources)
    } else if RESOURCES.is_match(name) {
        Some(ModuleRole::Resources)
    } else {
        None
    }
}

/// Lowercase and collapse runs of whitespace.
pub fn normalize_title(title: &str) -> String {
    title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Handling for a recognized title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleRule {
    /// Goes under the standard header at this rank of the canonical order.
    Standard { rank: usize },
    /// Deleted from the Welcome module.
    Delete,
}

/// What happens to an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Standard { rank: usize },
    Delete,
    Supplemental,
}

impl Disposition {
    pub fn label(&self) -> String {
        match self {
            Self::Standard { rank } => format!("standard-resource@{}", rank),
            Self::Delete => "delete".to_string(),
            Self::Supplemental => "supplemental".to_string(),
        }
    }
}

/// Normalized title -> rule, built once per run.
#[derive(Debug, Clone, Default)]
pub struct TitleTable {
    rules: HashMap<String, TitleRule>,
}

impl TitleTable {
    pub fn from_policy(policy: &ReorgPolicy) -> Self {
        let mut rules = HashMap::new();
        for (rank, title) in policy.canonical_order.iter().enumerate() {
            rules
                .entry(normalize_title(title))
                .or_insert(TitleRule::Standard { rank });
        }
        // An explicit cleanup entry beats a canonical one.
        for title in &policy.cleanup_titles {
            rules.insert(normalize_title(title), TitleRule::Delete);
        }
        Self { rules }
    }

    pub fn classify(&self, title: &str) -> Disposition {
        match self.rules.get(&normalize_title(title)) {
            Some(TitleRule::Standard { rank }) => Disposition::Standard { rank: *rank },
            Some(TitleRule::Delete) => Disposition::Delete,
            None => Disposition::Supplemental,
        }
    }
}

/// Relocation order for the Welcome module's items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WelcomePlan {
    /// Moved first, each to position 1, in this order.
    pub supplemental: Vec<ItemId>,
    /// Canonical rank and item, moved after the supplemental items in rank order.
    pub standard: Vec<(usize, ItemId)>,
    /// Titles of items left where they are (no id, or marked for deletion).
    pub skipped: Vec<String>,
}

/// Sort items (already in processing order) into supplemental and standard runs.
///
/// Only the first item holding a canonical title takes that slot; later
/// items with the same title are treated as supplemental.
pub fn plan_welcome(items: &[ModuleItem], titles: &TitleTable) -> WelcomePlan {
    let mut plan = WelcomePlan::default();
    let mut slots: Vec<(usize, ItemId)> = Vec::new();

    for item in items {
        let Some(id) = item.id else {
            plan.skipped.push(item.title.clone());
            continue;
        };
        match titles.classify(&item.title) {
            Disposition::Standard { rank } if !slots.iter().any(|(r, _)| *r == rank) => {
                slots.push((rank, id));
            }
            Disposition::Delete => plan.skipped.push(item.title.clone()),
            _ => plan.supplemental.push(id),
        }
    }

    slots.sort_by_key(|(rank, _)| *rank);
    plan.standard = slots;
    plan
}
