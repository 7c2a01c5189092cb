//! Web-search stage.
//!
//! Asks a search-capable model (perplexity/sonar through OpenRouter)
//! for public information about the person and stores the summary,
//! source URLs, and the model's confidence. Only valid persons reach
//! this stage; the eligibility predicate requires `valid = TRUE`.

use crate::db::Db;
use crate::error::Result;
use crate::llm::{parse_json_reply, stage_agent};
use crate::pipeline::Stage;
use rig::agent::Agent;
use rig::completion::Prompt;
use rig::providers::openai;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use super::StageHandler;

const PREAMBLE: &str = include_str!("../../prompts/search.md");

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    urls: Vec<String>,
    #[serde(default = "default_confidence")]
    confidence: String,
}

fn default_confidence() -> String {
    "low".to_string()
}

pub struct PerpStage {
    db: Arc<Db>,
    agent: Agent<openai::CompletionModel>,
}

impl PerpStage {
    pub fn new(db: Arc<Db>, client: &openai::CompletionsClient, model: &str) -> Self {
        Self {
            db,
            agent: stage_agent(client, model, PREAMBLE),
        }
    }
}

#[async_trait::async_trait]
impl StageHandler for PerpStage {
    async fn process(&self, worker_id: usize, person_id: i64) -> Result<bool> {
        debug!(worker_id, person_id, "web search start");

        let person = self.db.get_person(person_id).await?;

        let query = serde_json::json!({
            "first_name": person.meaningful_first_name,
            "last_name": person.meaningful_last_name,
            "about": person.meaningful_about,
            "links": person.extracted_links,
        })
        .to_string();

        let reply = self.agent.prompt(query.as_str()).await?;
        let result: SearchResult = parse_json_reply(&reply)?;

        self.db
            .update_summary(person_id, &result.summary, &result.urls, &result.confidence)
            .await?;
        self.db.set_completion_flag(person_id, Stage::Perp).await?;

        debug!(
            worker_id,
            person_id,
            confidence = %result.confidence,
            urls = result.urls.len(),
            "web search done"
        );
        Ok(true)
    }
}
