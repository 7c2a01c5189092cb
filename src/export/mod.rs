//! Export of finished person records and pipeline statistics.
//!
//! Thin reporting surface over the person table: JSON for downstream
//! consumers, an HTML report for humans, and flag/status counts for
//! the CLI.

use crate::db::Db;
use crate::db::person::PersonStats;
use crate::error::Result;
use crate::model::PersonRecord;
use crate::stages::cleaner;
use handlebars::Handlebars;
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

const REPORT_TEMPLATE: &str = include_str!("../../templates/report.hbs");

/// A person as it appears in exports: derived fields only, summary
/// cleaned of citation markers.
#[derive(Debug, Serialize)]
struct ExportPerson {
    person_id: i64,
    first_name: Option<String>,
    last_name: Option<String>,
    about: Option<String>,
    links: Vec<String>,
    valid: bool,
    summary: Option<String>,
    confidence: Option<String>,
    urls: Vec<String>,
    photos: Vec<String>,
}

impl From<PersonRecord> for ExportPerson {
    fn from(p: PersonRecord) -> Self {
        Self {
            person_id: p.person_id,
            first_name: p.meaningful_first_name,
            last_name: p.meaningful_last_name,
            about: p.meaningful_about,
            links: p.extracted_links,
            valid: p.valid,
            summary: p.summary.map(|s| cleaner::clean_summary(&s)),
            confidence: p.confidence,
            urls: p.urls,
            photos: p.photos,
        }
    }
}

/// Combined statistics for the stats report.
#[derive(Debug)]
pub struct PipelineStats {
    pub persons: PersonStats,
    pub tasks: Vec<(String, i64)>,
}

/// Write all done persons to a JSON file.
pub async fn export_json(db: &Db, path: &Path) -> Result<usize> {
    let persons: Vec<ExportPerson> = db
        .list_done_persons()
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    if persons.is_empty() {
        warn!("no finished persons to export");
    }

    let json = serde_json::to_string_pretty(&persons)?;
    std::fs::write(path, json)?;
    info!(count = persons.len(), path = %path.display(), "JSON export written");
    Ok(persons.len())
}

/// Render all done persons into an HTML report.
pub async fn export_html(db: &Db, path: &Path) -> Result<usize> {
    let persons: Vec<ExportPerson> = db
        .list_done_persons()
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    if persons.is_empty() {
        warn!("no finished persons to export");
    }

    let mut registry = Handlebars::new();
    registry.register_escape_fn(handlebars::html_escape);
    let html = registry.render_template(
        REPORT_TEMPLATE,
        &serde_json::json!({ "people": persons, "count": persons.len() }),
    )?;

    std::fs::write(path, html)?;
    info!(count = persons.len(), path = %path.display(), "HTML report written");
    Ok(persons.len())
}

/// Collect per-flag person counts and task status counts.
pub async fn pipeline_stats(db: &Db) -> Result<PipelineStats> {
    Ok(PipelineStats {
        persons: db.person_stats().await?,
        tasks: db.task_status_counts().await?,
    })
}
