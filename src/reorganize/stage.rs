//! The pipeline stages, in the order they run.
//!
//! Each stage reads and updates the run's [`RunContext`] and either lets the
//! pipeline continue, stops it early, or fails with the remote error that
//! aborted it.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::context::{position, RunContext};
use super::discovery::Discovery;
use super::titles::{plan_welcome, Disposition};
use super::Reorganizer;
use crate::canvas::ClientError;
use crate::config::HeaderFailure;
use crate::models::*;

/// One step of the reorganization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Discover,
    EnsureTarget,
    MigrateResources,
    CleanupPages,
    MigrateWelcome,
    InsertHeaders,
    DeleteObsolete,
    Reposition,
}

impl Stage {
    /// Every stage, in execution order.
    pub const PIPELINE: [Stage; 8] = [
        Stage::Discover,
        Stage::EnsureTarget,
        Stage::MigrateResources,
        Stage::CleanupPages,
        Stage::MigrateWelcome,
        Stage::InsertHeaders,
        Stage::DeleteObsolete,
        Stage::Reposition,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Discover => "discover",
            Self::EnsureTarget => "ensure-target",
            Self::MigrateResources => "migrate-resources",
            Self::CleanupPages => "cleanup-pages",
            Self::MigrateWelcome => "migrate-welcome",
            Self::InsertHeaders => "insert-headers",
            Self::DeleteObsolete => "delete-obsolete",
            Self::Reposition => "reposition",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What the runner does after a stage succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Nothing to migrate; end the run without error.
    Stop,
}

impl Reorganizer<'_> {
    pub(super) async fn run_stage(
        &self,
        stage: Stage,
        ctx: &mut RunContext,
    ) -> Result<Flow, ClientError> {
        match stage {
            Stage::Discover => self.discover(ctx).await,
            Stage::EnsureTarget => self.ensure_target(ctx).await,
            Stage::MigrateResources => self.migrate_resources(ctx).await,
            Stage::CleanupPages => self.cleanup_pages(ctx).await,
            Stage::MigrateWelcome => self.migrate_welcome(ctx).await,
            Stage::InsertHeaders => self.insert_headers(ctx).await,
            Stage::DeleteObsolete => self.delete_obsolete(ctx).await,
            Stage::Reposition => self.reposition(ctx).await,
        }
    }

    async fn discover(&self, ctx: &mut RunContext) -> Result<Flow, ClientError> {
        let modules = self.api.list_modules(&ctx.course).await?;
        self.reporter
            .message(&format!("Successfully retrieved {} modules.", modules.len()));

        let found = Discovery::from_modules(&modules);
        for role in &found.duplicates {
            self.reporter.warning(&format!(
                "More than one {} module found; using the last one listed.",
                role.label()
            ));
        }
        if found.resources_as_welcome {
            self.reporter
                .message("No Welcome module found; treating the Resources module as the Welcome module.");
        }
        if found.is_empty() {
            self.reporter
                .warning("The Welcome module and Resources module don't exist.");
            return Ok(Flow::Stop);
        }

        ctx.module_count = found.module_count;
        ctx.welcome = found.welcome;
        ctx.resources = found.resources;
        ctx.target = found.student_resources;
        Ok(Flow::Continue)
    }

    async fn ensure_target(&self, ctx: &mut RunContext) -> Result<Flow, ClientError> {
        if ctx.target.is_some() {
            ctx.summary.target_module = ctx.target;
            return Ok(Flow::Continue);
        }

        let module = self
            .api
            .create_module(
                &ctx.course,
                &CreateModuleInput::named(&self.policy.target_module_name),
            )
            .await?;
        self.reporter.message(&format!(
            "Successfully created {} module. Id: {}",
            self.policy.target_module_name, module.id
        ));

        ctx.target = Some(module.id);
        ctx.summary.target_module = Some(module.id);
        ctx.summary.target_created = true;
        Ok(Flow::Continue)
    }

    async fn migrate_resources(&self, ctx: &mut RunContext) -> Result<Flow, ClientError> {
        let (Some(resources), Some(target)) = (ctx.resources, ctx.target) else {
            return Ok(Flow::Continue);
        };

        let mut items = self.api.list_module_items(&ctx.course, resources).await?;
        if items.is_empty() {
            self.reporter
                .message("The Resources module is empty. No need to move its contents.");
            return Ok(Flow::Continue);
        }

        // Each move lands at position 1, so replaying last-to-first keeps the listed order.
        items.reverse();
        for item in &items {
            let Some(id) = item.id else {
                tracing::debug!("Skipping Resources item without id: {}", item.title);
                continue;
            };
            if let Disposition::Standard { rank } = self.titles.classify(&item.title) {
                if !ctx.resources_standard.iter().any(|(r, _)| *r == rank) {
                    tracing::debug!("Holding {} for the standard block", item.title);
                    ctx.resources_standard.push((rank, id));
                    continue;
                }
            }
            let moved = self
                .api
                .update_module_item(
                    &ctx.course,
                    resources,
                    id,
                    &UpdateModuleItemInput::relocate(target, 1),
                )
                .await?;
            ctx.supplemental_count += 1;
            ctx.summary.resources_relocated += 1;
            self.reporter.message(&format!(
                "Successfully moved {} into the {} module from the Resources module",
                moved.title, self.policy.target_module_name
            ));
        }
        Ok(Flow::Continue)
    }

    async fn cleanup_pages(&self, ctx: &mut RunContext) -> Result<Flow, ClientError> {
        let Some(welcome) = ctx.welcome else {
            return Ok(Flow::Continue);
        };

        let items = self.api.list_module_items(&ctx.course, welcome).await?;
        for item in &items {
            if self.titles.classify(&item.title) != Disposition::Delete {
                continue;
            }
            let Some(id) = item.id else { continue };
            self.api
                .delete_module_item(&ctx.course, welcome, id)
                .await?;
            ctx.summary.pages_deleted += 1;
            self.reporter
                .message(&format!("Successfully deleted {} from the Welcome module", item.title));
        }
        Ok(Flow::Continue)
    }

    async fn migrate_welcome(&self, ctx: &mut RunContext) -> Result<Flow, ClientError> {
        let Some(target) = ctx.target else {
            return Ok(Flow::Continue);
        };

        let mut items = match ctx.welcome {
            Some(welcome) => self.api.list_module_items(&ctx.course, welcome).await?,
            None => Vec::new(),
        };
        items.reverse();
        let plan = plan_welcome(&items, &self.titles);
        for title in &plan.skipped {
            tracing::debug!("Leaving {} in the Welcome module", title);
        }

        let mut supplemental: Vec<(ModuleId, ItemId)> = Vec::new();
        let mut standard: Vec<(usize, ModuleId, ItemId)> = Vec::new();
        if let Some(welcome) = ctx.welcome {
            supplemental.extend(plan.supplemental.iter().map(|&id| (welcome, id)));
            standard.extend(plan.standard.iter().map(|&(rank, id)| (rank, welcome, id)));
        }
        // A Welcome item keeps its canonical slot over a Resources item with the same title.
        if let Some(resources) = ctx.resources {
            for (rank, id) in std::mem::take(&mut ctx.resources_standard) {
                if standard.iter().any(|(r, _, _)| *r == rank) {
                    supplemental.insert(0, (resources, id));
                } else {
                    standard.push((rank, resources, id));
                }
            }
        }
        standard.sort_by_key(|(rank, _, _)| *rank);

        for (source, id) in supplemental {
            let moved = self
                .api
                .update_module_item(
                    &ctx.course,
                    source,
                    id,
                    &UpdateModuleItemInput::relocate(target, 1),
                )
                .await?;
            ctx.supplemental_count += 1;
            if Some(source) == ctx.resources {
                ctx.summary.resources_relocated += 1;
            } else {
                ctx.summary.supplemental_relocated += 1;
            }
            self.reporter.message(&format!(
                "Successfully moved {} into the {} module",
                moved.title, self.policy.target_module_name
            ));
        }

        for (index, (_, source, id)) in standard.into_iter().enumerate() {
            let slot = position(index + ctx.supplemental_count + 1);
            let moved = self
                .api
                .update_module_item(
                    &ctx.course,
                    source,
                    id,
                    &UpdateModuleItemInput::relocate(target, slot),
                )
                .await?;
            if Some(source) == ctx.resources {
                ctx.summary.resources_relocated += 1;
            } else {
                ctx.summary.standard_relocated += 1;
            }
            self.reporter.message(&format!(
                "Successfully moved {} into the {} module at position {}",
                moved.title, self.policy.target_module_name, slot
            ));
        }
        Ok(Flow::Continue)
    }

    async fn insert_headers(&self, ctx: &mut RunContext) -> Result<Flow, ClientError> {
        let Some(target) = ctx.target else {
            return Ok(Flow::Continue);
        };

        let headers = [
            (
                &self.policy.standard_header,
                position(ctx.supplemental_count + 1),
                self.policy.standard_header_failure,
            ),
            (
                &self.policy.supplemental_header,
                1,
                self.policy.supplemental_header_failure,
            ),
        ];

        for (title, slot, on_failure) in headers {
            let input = CreateModuleItemInput::sub_header(title.as_str(), slot);
            match self
                .api
                .create_module_item(&ctx.course, target, &input)
                .await
            {
                Ok(_) => {
                    ctx.summary.headers_created += 1;
                    self.reporter
                        .message(&format!("Successfully created {} text header", title));
                }
                Err(e) if on_failure == HeaderFailure::Fatal => return Err(e),
                Err(e) => {
                    self.reporter.error(&e);
                    ctx.summary.warnings += 1;
                }
            }
        }
        Ok(Flow::Continue)
    }

    async fn delete_obsolete(&self, ctx: &mut RunContext) -> Result<Flow, ClientError> {
        if let Some(resources) = ctx.resources {
            match self.api.delete_module(&ctx.course, resources).await {
                Ok(()) => {
                    ctx.summary.modules_deleted += 1;
                    self.reporter
                        .message("Successfully deleted the Resources module");
                }
                Err(e) => {
                    self.reporter.error(&e);
                    ctx.summary.warnings += 1;
                }
            }
        }

        if let Some(welcome) = ctx.welcome {
            self.api.delete_module(&ctx.course, welcome).await?;
            ctx.summary.modules_deleted += 1;
            self.reporter.message("Successfully deleted the Welcome module");
        }
        Ok(Flow::Continue)
    }

    async fn reposition(&self, ctx: &mut RunContext) -> Result<Flow, ClientError> {
        let Some(target) = ctx.target else {
            return Ok(Flow::Continue);
        };

        let input = UpdateModuleInput {
            position: Some(position(ctx.module_count + 1)),
            published: Some(true),
            ..UpdateModuleInput::default()
        };
        self.api
            .update_module(&ctx.course, target, &input)
            .await?;
        self.reporter.message(&format!(
            "Successfully made {} the last module",
            self.policy.target_module_name
        ));
        Ok(Flow::Continue)
    }
}
