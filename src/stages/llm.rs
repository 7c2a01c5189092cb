//! LLM extraction stage.
//!
//! Sends the cleaned fields to the extraction model and stores what
//! comes back, plus the validity verdict that gates the rest of the
//! chain: a person is valid when a first and last name were recovered
//! and there is either an about text or at least one extracted link.
//! Malformed replies are retried internally up to [`MAX_ATTEMPTS`];
//! the queue engine only sees the final outcome.

use crate::db::Db;
use crate::error::{Error, Result};
use crate::llm::{parse_json_reply, stage_agent};
use crate::pipeline::Stage;
use rig::agent::Agent;
use rig::completion::Prompt;
use rig::providers::openai;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::{MAX_ATTEMPTS, StageHandler, cleaner};

const PREAMBLE: &str = include_str!("../../prompts/extract.md");

#[derive(Debug, Deserialize)]
struct Extraction {
    meaningful_first_name: Option<String>,
    meaningful_last_name: Option<String>,
    meaningful_about: Option<String>,
}

impl Extraction {
    /// Collapse empty-string fields to None and judge validity: the
    /// model sometimes returns `""` for a field it could not recover,
    /// and an empty name must not count as a recovered one.
    fn normalize(self, has_links: bool) -> (Option<String>, Option<String>, Option<String>, bool) {
        let first = cleaner::normalize_empty(self.meaningful_first_name.as_deref());
        let last = cleaner::normalize_empty(self.meaningful_last_name.as_deref());
        let about = cleaner::normalize_empty(self.meaningful_about.as_deref());
        let valid = first.is_some() && last.is_some() && (about.is_some() || has_links);
        (first, last, about, valid)
    }
}

pub struct LlmStage {
    db: Arc<Db>,
    agent: Agent<openai::CompletionModel>,
}

impl LlmStage {
    pub fn new(db: Arc<Db>, client: &openai::CompletionsClient, model: &str) -> Self {
        Self {
            db,
            agent: stage_agent(client, model, PREAMBLE),
        }
    }
}

#[async_trait::async_trait]
impl StageHandler for LlmStage {
    async fn process(&self, worker_id: usize, person_id: i64) -> Result<bool> {
        debug!(worker_id, person_id, "llm extraction start");

        let person = self.db.get_person(person_id).await?;

        let input = serde_json::json!({
            "first_name": person.meaningful_first_name,
            "last_name": person.meaningful_last_name,
            "about": person.meaningful_about,
        })
        .to_string();

        let mut last_err = None;
        for attempt in 1..=MAX_ATTEMPTS {
            let reply = self.agent.prompt(input.as_str()).await?;

            match parse_json_reply::<Extraction>(&reply) {
                Ok(extracted) => {
                    let (first_name, last_name, about, valid) =
                        extracted.normalize(!person.extracted_links.is_empty());

                    self.db
                        .update_llm_results(
                            person_id,
                            first_name.as_deref(),
                            last_name.as_deref(),
                            about.as_deref(),
                            valid,
                        )
                        .await?;
                    self.db.set_completion_flag(person_id, Stage::Llm).await?;

                    debug!(worker_id, person_id, valid, "llm extraction done");
                    return Ok(true);
                }
                Err(e) => {
                    warn!(
                        worker_id,
                        person_id,
                        attempt,
                        error = %e,
                        "malformed extraction reply"
                    );
                    last_err = Some(e);
                    tokio::time::sleep(Duration::from_millis(500)).await;
                }
            }
        }

        Err(last_err
            .unwrap_or_else(|| Error::BadReply("extraction retries exhausted".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extraction(first: &str, last: &str, about: &str) -> Extraction {
        Extraction {
            meaningful_first_name: Some(first.to_string()),
            meaningful_last_name: Some(last.to_string()),
            meaningful_about: Some(about.to_string()),
        }
    }

    #[test]
    fn empty_string_fields_do_not_make_a_person_valid() {
        let (first, last, about, valid) = extraction("", "", "").normalize(true);
        assert_eq!(first, None);
        assert_eq!(last, None);
        assert_eq!(about, None);
        assert!(!valid);
    }

    #[test]
    fn whitespace_only_fields_count_as_missing() {
        let (_, _, _, valid) = extraction("Jane", "   ", "dev").normalize(false);
        assert!(!valid);
    }

    #[test]
    fn names_with_about_are_valid() {
        let (first, last, about, valid) = extraction("Jane", "Doe", "Rust dev").normalize(false);
        assert_eq!(first.as_deref(), Some("Jane"));
        assert_eq!(last.as_deref(), Some("Doe"));
        assert_eq!(about.as_deref(), Some("Rust dev"));
        assert!(valid);
    }

    #[test]
    fn names_with_links_but_no_about_are_valid() {
        let (_, _, about, valid) = extraction("Jane", "Doe", "").normalize(true);
        assert_eq!(about, None);
        assert!(valid);
    }

    #[test]
    fn names_alone_are_not_valid() {
        let (_, _, _, valid) = extraction("Jane", "Doe", "").normalize(false);
        assert!(!valid);
    }
}
