//! Error types for enrichq.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown stage: {0}")]
    UnknownStage(String),

    #[error("task {0} is not in progress")]
    TaskNotActive(i64),

    #[error("task not found: {0}")]
    TaskNotFound(i64),

    #[error("person not found: {0}")]
    PersonNotFound(i64),

    /// A stage collaborator reported failure or panicked.
    #[error("stage failed: {0}")]
    Stage(String),

    #[error("llm error: {0}")]
    Llm(#[from] rig::completion::PromptError),

    #[error("bad llm reply: {0}")]
    BadReply(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("config error: {0}")]
    Config(String),

    #[error("template error: {0}")]
    Template(#[from] handlebars::RenderError),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
