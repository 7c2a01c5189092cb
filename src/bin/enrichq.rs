//! enrichq CLI, the operator interface to the enrichment pipeline.

use clap::{Parser, Subcommand};
use enrichq::config::Config;
use enrichq::db::Db;
use enrichq::export;
use enrichq::pipeline::{Dispatch, Populator, Stage, WorkerConfig, WorkerPool};
use enrichq::telemetry::{TelemetryConfig, init_telemetry};
use secrecy::ExposeSecret;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "enrichq", about = "Person enrichment pipeline manager")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
    /// Task queue operations
    Tasks {
        #[command(subcommand)]
        action: TaskAction,
    },
    /// Run the worker pool
    Run {
        /// Number of concurrent workers (overrides WORKERS)
        #[arg(long)]
        workers: Option<usize>,
        /// Restrict workers to these stages (comma-separated)
        #[arg(long, value_delimiter = ',')]
        stages: Vec<String>,
        /// Fill the queue before starting
        #[arg(long)]
        fill: bool,
    },
    /// Show pipeline statistics
    Stats,
    /// Export finished persons
    Export {
        #[command(subcommand)]
        format: ExportFormat,
    },
}

#[derive(Subcommand)]
enum DbAction {
    /// Run migrations
    Create,
}

#[derive(Subcommand)]
enum TaskAction {
    /// Fill the queue with all eligible (person, stage) tasks
    Fill,
    /// Enqueue one stage for one person
    Add { person_id: i64, stage: String },
    /// Re-enqueue a failed task (manual retry)
    Requeue { task_id: i64 },
}

#[derive(Subcommand)]
enum ExportFormat {
    Json {
        #[arg(long, default_value = "people_analysis.json")]
        out: PathBuf,
    },
    Html {
        #[arg(long, default_value = "people_analysis.html")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env()?;

    let _guard = init_telemetry(TelemetryConfig {
        endpoint: config.otel_endpoint.clone(),
        log_level: config.log_level.clone(),
    })?;

    let db = Arc::new(
        Db::connect(config.database_url.expose_secret(), config.max_connections).await?,
    );

    match cli.command {
        Command::Db {
            action: DbAction::Create,
        } => {
            db.migrate().await?;
            println!("migrations applied");
        }
        Command::Tasks { action } => {
            let populator = Populator::new(Arc::clone(&db));
            match action {
                TaskAction::Fill => {
                    let inserted = populator.fill_all().await?;
                    println!("{inserted} task(s) enqueued");
                }
                TaskAction::Add { person_id, stage } => {
                    let stage: Stage = stage.parse()?;
                    let inserted = populator.add_for_person(person_id, stage).await?;
                    if inserted {
                        println!("enqueued ({person_id}, {stage})");
                    } else {
                        println!("skipped: person not eligible or task exists");
                    }
                }
                TaskAction::Requeue { task_id } => {
                    if db.requeue_failed(task_id).await? {
                        println!("task {task_id} re-enqueued");
                    } else {
                        println!("task {task_id} is not in failed state");
                    }
                }
            }
        }
        Command::Run {
            workers,
            stages,
            fill,
        } => cmd_run(db, &config, workers, stages, fill).await?,
        Command::Stats => cmd_stats(&db).await?,
        Command::Export { format } => match format {
            ExportFormat::Json { out } => {
                let count = export::export_json(&db, &out).await?;
                println!("{count} person(s) exported to {}", out.display());
            }
            ExportFormat::Html { out } => {
                let count = export::export_html(&db, &out).await?;
                println!("{count} person(s) exported to {}", out.display());
            }
        },
    }

    Ok(())
}

async fn cmd_run(
    db: Arc<Db>,
    config: &Config,
    workers: Option<usize>,
    stages: Vec<String>,
    fill: bool,
) -> anyhow::Result<()> {
    let populator = Arc::new(Populator::new(Arc::clone(&db)));

    if fill {
        populator.fill_all().await?;
    }

    let claim_stages = if stages.is_empty() {
        Stage::ACTIVE.to_vec()
    } else {
        stages
            .iter()
            .map(|s| s.parse())
            .collect::<Result<Vec<Stage>, _>>()?
    };

    let dispatch = Arc::new(Dispatch::standard(Arc::clone(&db), config)?);

    let pool = Arc::new(WorkerPool::new(
        db,
        dispatch,
        populator,
        WorkerConfig {
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            stages: claim_stages,
        },
        workers.unwrap_or(config.workers),
    ));

    let ctrl = Arc::clone(&pool);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        ctrl.shutdown();
    });

    pool.run().await?;
    Ok(())
}

async fn cmd_stats(db: &Db) -> anyhow::Result<()> {
    let stats = export::pipeline_stats(db).await?;
    let p = &stats.persons;

    println!("----- Pipeline Stats -----");
    println!("{:<18} {}", "persons", p.persons);
    println!("{:<18} {}", "prellm done", p.prellm_done);
    println!("{:<18} {}", "llm done", p.llm_done);
    println!("{:<18} {}", "valid", p.valid);
    println!("{:<18} {}", "perp done", p.perp_done);
    println!("{:<18} {}", "postcheck1 done", p.postcheck1_done);
    println!("{:<18} {}", "postcheck2 done", p.postcheck2_done);
    println!("{:<18} {}", "photos done", p.photos_done);
    println!("{:<18} {}", "done", p.done);
    println!("--------------------------");
    if stats.tasks.is_empty() {
        println!("task queue is empty");
    } else {
        for (status, count) in &stats.tasks {
            println!("{status:<18} {count}");
        }
    }

    Ok(())
}
