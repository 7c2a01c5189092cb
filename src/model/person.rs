//! Person record model.
//!
//! One row per person, created at ingestion and mutated one stage at a
//! time: raw source fields stay untouched, derived fields and the
//! per-stage completion flags are written only by the owning stage.

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PersonRecord {
    pub person_id: i64,
    pub fetch_date: Option<DateTime<Utc>>,

    // Raw source fields
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub about: Option<String>,
    pub username: Option<String>,
    pub personal_channel_title: Option<String>,
    pub personal_channel_about: Option<String>,

    // Derived content, written incrementally by the stages
    pub meaningful_first_name: Option<String>,
    pub meaningful_last_name: Option<String>,
    pub meaningful_about: Option<String>,
    pub extracted_links: Vec<String>,
    pub valid: bool,
    pub summary: Option<String>,
    pub confidence: Option<String>,
    pub urls: Vec<String>,
    pub photos: Vec<String>,

    // Pipeline completion flags, one per stage
    pub flag_prellm: bool,
    pub flag_llm: bool,
    pub flag_perp: bool,
    pub flag_postcheck1: bool,
    pub flag_postcheck2: bool,
    pub flag_photos: bool,
    pub done: bool,
}

/// Raw fields for ingesting a person. Derived fields and flags start
/// at their defaults and are filled in stage by stage.
#[derive(Debug, Clone, Default)]
pub struct NewPerson {
    pub person_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub about: Option<String>,
    pub username: Option<String>,
    pub personal_channel_title: Option<String>,
    pub personal_channel_about: Option<String>,
}
