use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use welcome_migrator::canvas::CanvasClient;
use welcome_migrator::config::{default_policy_path, CanvasConfig, ReorgPolicy};
use welcome_migrator::models::Course;
use welcome_migrator::reorganize::{reorganize_course, Reorganizer};
use welcome_migrator::report::{CourseLog, CourseReport, TracingReporter};

#[derive(Parser)]
#[command(name = "welcome-migrate")]
#[command(about = "Fold a course's Welcome module into an ordered Student Resources module")]
struct Cli {
    /// Canvas base URL (overrides CANVAS_API_URL)
    #[arg(long, global = true)]
    url: Option<String>,

    /// Canvas API token (overrides CANVAS_API_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,

    /// Per-request timeout in seconds (overrides CANVAS_TIMEOUT_SECS)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reorganize one or more courses, one after another
    Migrate {
        /// Canvas course ids
        #[arg(required = true)]
        courses: Vec<String>,

        /// Policy file (defaults to the user config directory)
        #[arg(short, long)]
        policy: Option<PathBuf>,

        /// Write a JSON run report here
        #[arg(short, long)]
        report: Option<PathBuf>,
    },
    /// Show how a course would be reorganized without changing it
    Inspect {
        /// Canvas course id
        course: String,

        /// Policy file (defaults to the user config directory)
        #[arg(short, long)]
        policy: Option<PathBuf>,
    },
    /// Write the default policy to a file for editing
    InitPolicy {
        /// Destination (defaults to the user config directory)
        path: Option<PathBuf>,
    },
}

/// Initialize tracing on stderr so stdout stays usable for output
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "welcome_migrator=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Connection settings from the environment, with any flags layered on top.
fn build_client(cli: &Cli) -> anyhow::Result<CanvasClient> {
    let mut config = CanvasConfig::from_env()?;
    if let Some(url) = &cli.url {
        config = config.with_base_url(url);
    }
    if let Some(token) = &cli.token {
        config = config.with_token(token);
    }
    if let Some(secs) = cli.timeout {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    Ok(CanvasClient::new(config)?)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing();

    match &cli.command {
        Commands::Migrate {
            courses,
            policy,
            report,
        } => {
            let client = build_client(&cli)?;
            let policy = ReorgPolicy::load(policy.as_deref())?;

            let mut reports = Vec::new();
            let mut failures = 0;
            for course_id in courses {
                let course = Course::new(course_id);
                let log = CourseLog::new(course.id.clone());
                let result = reorganize_course(&client, &policy, &log, &course, |err, course| {
                    match err {
                        Some(e) => println!("{}: failed ({})", course.id, e),
                        None => println!("{}: done", course.id),
                    }
                })
                .await;
                if result.is_err() {
                    failures += 1;
                }
                reports.push(CourseReport::from_run(course.id.clone(), &result, &log));
            }

            if let Some(path) = report {
                let json = serde_json::to_string_pretty(&reports)?;
                std::fs::write(&path, json)
                    .with_context(|| format!("Failed to write report to {}", path.display()))?;
                tracing::info!("Wrote run report to {}", path.display());
            }

            if failures > 0 {
                tracing::error!("{} course(s) failed", failures);
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Inspect { course, policy } => {
            let client = build_client(&cli)?;
            let policy = ReorgPolicy::load(policy.as_deref())?;
            let course = Course::new(course);
            let reporter = TracingReporter::new(course.id.clone());

            let inspection = Reorganizer::new(&client, &policy, &reporter)
                .inspect(&course)
                .await?;
            let found = &inspection.discovery;

            println!("Course {} ({} modules)", course.id, found.module_count);
            for module in &inspection.modules {
                println!("  [{}] {}", module.id, module.name);
            }
            println!("Welcome source:    {:?}", found.welcome);
            println!("Resources:         {:?}", found.resources);
            println!("Student Resources: {:?}", found.student_resources);
            if found.resources_as_welcome {
                println!("(Resources is used as the Welcome source)");
            }
            if found.is_empty() {
                println!("Nothing to migrate.");
                return Ok(ExitCode::SUCCESS);
            }
            for (item, disposition) in &inspection.welcome_items {
                println!("  {:<40} {}", item.title, disposition.label());
            }
        }
        Commands::InitPolicy { path } => {
            let path = path
                .clone()
                .or_else(default_policy_path)
                .context("Could not determine config directory")?;
            ReorgPolicy::default().save(&path)?;
            println!("Wrote default policy to {}", path.display());
        }
    }

    Ok(ExitCode::SUCCESS)
}
