//! First summary check.
//!
//! A cheap model judges whether the search summary is plausible at
//! all. The verdict is logged and the completion flag set either way;
//! the second check is the one with teeth.

use crate::db::Db;
use crate::error::Result;
use crate::llm::{parse_json_reply, stage_agent};
use crate::pipeline::Stage;
use rig::agent::Agent;
use rig::completion::Prompt;
use rig::providers::openai;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

use super::StageHandler;

const PREAMBLE: &str = include_str!("../../prompts/postcheck1.md");

#[derive(Debug, Deserialize)]
pub(crate) struct CheckVerdict {
    pub valid: bool,
    #[serde(default)]
    pub reason: String,
}

pub struct Postcheck1Stage {
    db: Arc<Db>,
    agent: Agent<openai::CompletionModel>,
}

impl Postcheck1Stage {
    pub fn new(db: Arc<Db>, client: &openai::CompletionsClient, model: &str) -> Self {
        Self {
            db,
            agent: stage_agent(client, model, PREAMBLE),
        }
    }
}

#[async_trait::async_trait]
impl StageHandler for Postcheck1Stage {
    async fn process(&self, worker_id: usize, person_id: i64) -> Result<bool> {
        debug!(worker_id, person_id, "postcheck1 start");

        let person = self.db.get_person(person_id).await?;

        // Nothing to judge without a summary; skip the model call.
        let Some(summary) = person.summary else {
            warn!(worker_id, person_id, "no summary to check, skipping");
            self.db
                .set_completion_flag(person_id, Stage::Postcheck1)
                .await?;
            return Ok(true);
        };

        let reply = self.agent.prompt(summary.as_str()).await?;
        let verdict: CheckVerdict = parse_json_reply(&reply)?;

        self.db
            .set_completion_flag(person_id, Stage::Postcheck1)
            .await?;

        debug!(
            worker_id,
            person_id,
            valid = verdict.valid,
            reason = %verdict.reason,
            "postcheck1 done"
        );
        Ok(true)
    }
}
