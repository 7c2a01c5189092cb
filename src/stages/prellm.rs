//! Pre-LLM cleanup stage.
//!
//! Normalizes the raw name/about fields with the regex cleaner,
//! extracts profile links, splits a two-word first name when the last
//! name is empty, and merges the about-like fields into one. Writes the
//! meaningful fields and sets `flag_prellm`.

use crate::db::Db;
use crate::error::Result;
use crate::pipeline::Stage;
use std::sync::Arc;
use tracing::debug;

use super::{StageHandler, cleaner};

pub struct PrellmStage {
    db: Arc<Db>,
}

impl PrellmStage {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl StageHandler for PrellmStage {
    async fn process(&self, worker_id: usize, person_id: i64) -> Result<bool> {
        debug!(worker_id, person_id, "prellm start");

        let person = self.db.get_person(person_id).await?;

        let mut first_name = cleaner::clean_name_field(person.first_name.as_deref());
        let mut last_name = cleaner::clean_second_name_field(person.last_name.as_deref());
        let about = cleaner::normalize_empty(person.about.as_deref());
        let channel_title = cleaner::normalize_empty(person.personal_channel_title.as_deref());
        let channel_about = cleaner::normalize_empty(person.personal_channel_about.as_deref());

        let links = cleaner::extract_links(&[
            last_name.as_deref(),
            about.as_deref(),
            channel_about.as_deref(),
        ]);

        // "Jane Doe" crammed into the first-name field
        if last_name.is_none()
            && let Some(full) = first_name.take()
        {
            match full.split_once(' ') {
                Some((first, last)) => {
                    first_name = Some(first.to_string());
                    last_name = Some(last.to_string());
                }
                None => first_name = Some(full),
            }
        }

        let merged_about = cleaner::merge_about_fields(&[
            about.as_deref(),
            channel_title.as_deref(),
            channel_about.as_deref(),
        ]);

        self.db
            .update_meaningful_fields(
                person_id,
                first_name.as_deref(),
                last_name.as_deref(),
                merged_about.as_deref(),
                &links,
            )
            .await?;
        self.db.set_completion_flag(person_id, Stage::Prellm).await?;

        debug!(worker_id, person_id, links = links.len(), "prellm done");
        Ok(true)
    }
}
