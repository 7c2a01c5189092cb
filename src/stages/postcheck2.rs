//! Second summary check, with person context.
//!
//! Verifies the summary is about this person, not a namesake. A failed
//! verdict clears the summary and records `second_check_failed`; the
//! completion flag and the overall `done` flag are set either way, so
//! the chain terminates here for every person that gets this far.

use crate::db::Db;
use crate::error::Result;
use crate::llm::{parse_json_reply, stage_agent};
use crate::pipeline::Stage;
use rig::agent::Agent;
use rig::completion::Prompt;
use rig::providers::openai;
use std::sync::Arc;
use tracing::{debug, info};

use super::StageHandler;
use super::postcheck1::CheckVerdict;

const PREAMBLE: &str = include_str!("../../prompts/postcheck2.md");

pub struct Postcheck2Stage {
    db: Arc<Db>,
    agent: Agent<openai::CompletionModel>,
}

impl Postcheck2Stage {
    pub fn new(db: Arc<Db>, client: &openai::CompletionsClient, model: &str) -> Self {
        Self {
            db,
            agent: stage_agent(client, model, PREAMBLE),
        }
    }
}

#[async_trait::async_trait]
impl StageHandler for Postcheck2Stage {
    async fn process(&self, worker_id: usize, person_id: i64) -> Result<bool> {
        debug!(worker_id, person_id, "postcheck2 start");

        let person = self.db.get_person(person_id).await?;

        let input = serde_json::json!({
            "person": {
                "first_name": person.meaningful_first_name,
                "last_name": person.meaningful_last_name,
                "about": person.meaningful_about,
                "links": person.extracted_links,
            },
            "summary": person.summary,
            "urls": person.urls,
        })
        .to_string();

        let reply = self.agent.prompt(input.as_str()).await?;
        let verdict: CheckVerdict = parse_json_reply(&reply)?;

        if !verdict.valid {
            info!(
                worker_id,
                person_id,
                reason = %verdict.reason,
                "summary rejected by second check"
            );
            self.db.clear_rejected_summary(person_id).await?;
        }

        self.db
            .set_completion_flag(person_id, Stage::Postcheck2)
            .await?;

        debug!(worker_id, person_id, valid = verdict.valid, "postcheck2 done");
        Ok(true)
    }
}
