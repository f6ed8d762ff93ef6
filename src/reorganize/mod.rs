//! Folding a course's Welcome (and Resources) module into Student Resources.
//!
//! A run walks [`Stage::PIPELINE`] in order against one course:
//!
//! 1. **Discover** the Welcome, Resources and Student Resources modules.
//!    With no Welcome and no Resources module the run ends as
//!    [`Outcome::NothingToDo`].
//! 2. **Ensure** the Student Resources target exists, creating it if needed.
//! 3. **Migrate Resources**: move a separate Resources module's items into the target.
//!    Items with canonical titles wait for step 5.
//! 4. **Clean up** denylisted pages (due-date explainers) from Welcome.
//! 5. **Migrate Welcome**: move unrecognized items to the top of the target,
//!    then the canonical items from both sources below them in canonical order.
//! 6. **Insert** the "Standard Resources" and "Supplemental Resources" sub-headers.
//! 7. **Delete** the emptied Resources and Welcome modules.
//! 8. **Reposition** the target after every original module and publish it.
//!
//! The first fatal remote failure ends the run. Nothing is rolled back: items
//! already moved stay moved. Running twice is not idempotent.

mod context;
mod discovery;
mod stage;
mod titles;

pub use context::{RunContext, RunSummary};
pub use discovery::Discovery;
pub use stage::{Flow, Stage};
pub use titles::{
    classify_module_name, normalize_title, plan_welcome, Disposition, ModuleRole, TitleRule,
    TitleTable, WelcomePlan,
};

use serde::Serialize;
use thiserror::Error;
use tracing::Instrument;

use crate::canvas::{CanvasApi, ClientError};
use crate::config::ReorgPolicy;
use crate::models::*;
use crate::report::CourseReporter;

/// A fatal failure that ended a run.
#[derive(Debug, Error)]
pub enum ReorgError {
    #[error("{stage} failed: {source}")]
    RemoteCall {
        stage: Stage,
        #[source]
        source: ClientError,
    },
}

impl ReorgError {
    pub fn stage(&self) -> Stage {
        match self {
            Self::RemoteCall { stage, .. } => *stage,
        }
    }
}

/// How a run that did not fail ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// No Welcome or Resources module; nothing was changed.
    NothingToDo,
    Reorganized(RunSummary),
}

/// Runs the pipeline for one course at a time.
pub struct Reorganizer<'a> {
    api: &'a dyn CanvasApi,
    policy: &'a ReorgPolicy,
    reporter: &'a dyn CourseReporter,
    titles: TitleTable,
}

impl<'a> Reorganizer<'a> {
    pub fn new(
        api: &'a dyn CanvasApi,
        policy: &'a ReorgPolicy,
        reporter: &'a dyn CourseReporter,
    ) -> Self {
        Self {
            api,
            policy,
            reporter,
            titles: TitleTable::from_policy(policy),
        }
    }

    /// Run every stage against `course`, stopping at the first fatal error.
    ///
    /// Fatal errors are also sent to the reporter's error sink.
    pub async fn run(&self, course: &Course) -> Result<Outcome, ReorgError> {
        let span = tracing::info_span!("course", id = %course.id);
        async {
            let mut ctx = RunContext::new(course.id.clone());
            for stage in Stage::PIPELINE {
                tracing::debug!("Entering stage {}", stage);
                let flow = match self.run_stage(stage, &mut ctx).await {
                    Ok(flow) => flow,
                    Err(source) => {
                        let err = ReorgError::RemoteCall { stage, source };
                        self.reporter.error(&err);
                        return Err(err);
                    }
                };
                if flow == Flow::Stop {
                    tracing::info!("Nothing to migrate");
                    return Ok(Outcome::NothingToDo);
                }
            }
            tracing::info!(summary = ?ctx.summary, "Reorganization complete");
            Ok(Outcome::Reorganized(ctx.summary))
        }
        .instrument(span)
        .await
    }

    /// Read-only look at what a run would work with.
    pub async fn inspect(&self, course: &Course) -> Result<Inspection, ClientError> {
        let modules = self.api.list_modules(&course.id).await?;
        let discovery = Discovery::from_modules(&modules);

        let mut welcome_items = Vec::new();
        if let Some(welcome) = discovery.welcome {
            for item in self.api.list_module_items(&course.id, welcome).await? {
                let disposition = self.titles.classify(&item.title);
                welcome_items.push((item, disposition));
            }
        }

        Ok(Inspection {
            modules,
            discovery,
            welcome_items,
        })
    }
}

/// Result of [`Reorganizer::inspect`].
#[derive(Debug, Clone)]
pub struct Inspection {
    pub modules: Vec<Module>,
    pub discovery: Discovery,
    /// Items of the Welcome source, in listed order, with their disposition.
    pub welcome_items: Vec<(ModuleItem, Disposition)>,
}

/// Run the pipeline and report completion through `on_complete`.
///
/// `on_complete` is called exactly once, with the error when the run failed,
/// and always with the course it was given.
pub async fn reorganize_course<F>(
    api: &dyn CanvasApi,
    policy: &ReorgPolicy,
    reporter: &dyn CourseReporter,
    course: &Course,
    on_complete: F,
) -> Result<Outcome, ReorgError>
where
    F: FnOnce(Option<&ReorgError>, &Course),
{
    let result = Reorganizer::new(api, policy, reporter).run(course).await;
    on_complete(result.as_ref().err(), course);
    result
}
