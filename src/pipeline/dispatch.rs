//! Dispatch table: stage name → handler.
//!
//! Handlers are constructed once at startup and injected here; the
//! worker never builds clients of its own. `invoke` runs the handler on
//! a separate task so a panicking collaborator surfaces as a failed
//! result instead of taking the worker loop down with it.

use crate::config::Config;
use crate::db::Db;
use crate::error::{Error, Result};
use crate::llm::openrouter_client;
use crate::stages::StageHandler;
use crate::stages::llm::LlmStage;
use crate::stages::perp::PerpStage;
use crate::stages::postcheck1::Postcheck1Stage;
use crate::stages::postcheck2::Postcheck2Stage;
use crate::stages::prellm::PrellmStage;
use std::collections::HashMap;
use std::sync::Arc;

use super::registry::Stage;

pub struct Dispatch {
    handlers: HashMap<Stage, Arc<dyn StageHandler>>,
}

impl Dispatch {
    /// Build an empty table. Used by tests to wire stub handlers.
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for a stage.
    pub fn register(mut self, stage: Stage, handler: Arc<dyn StageHandler>) -> Self {
        self.handlers.insert(stage, handler);
        self
    }

    /// The production wiring: every active stage gets its collaborator.
    /// Photos stays unregistered while the stage is disabled.
    pub fn standard(db: Arc<Db>, config: &Config) -> Result<Self> {
        let client = openrouter_client(&config.openrouter_api_key, &config.llm_base_url)?;

        Ok(Self::empty()
            .register(Stage::Prellm, Arc::new(PrellmStage::new(Arc::clone(&db))))
            .register(
                Stage::Llm,
                Arc::new(LlmStage::new(Arc::clone(&db), &client, &config.extract_model)),
            )
            .register(
                Stage::Perp,
                Arc::new(PerpStage::new(Arc::clone(&db), &client, &config.search_model)),
            )
            .register(
                Stage::Postcheck1,
                Arc::new(Postcheck1Stage::new(
                    Arc::clone(&db),
                    &client,
                    &config.check_model,
                )),
            )
            .register(
                Stage::Postcheck2,
                Arc::new(Postcheck2Stage::new(db, &client, &config.check_model)),
            ))
    }

    pub fn get(&self, stage: Stage) -> Option<&Arc<dyn StageHandler>> {
        self.handlers.get(&stage)
    }

    /// Invoke the handler for a stage, isolating panics.
    ///
    /// The handler runs on a spawned task; a panic becomes a JoinError
    /// and is converted into a stage failure.
    pub async fn invoke(&self, stage: Stage, worker_id: usize, person_id: i64) -> Result<bool> {
        let handler = self
            .get(stage)
            .ok_or_else(|| Error::UnknownStage(stage.as_str().to_string()))?;
        let handler = Arc::clone(handler);

        let joined =
            tokio::spawn(async move { handler.process(worker_id, person_id).await }).await;

        match joined {
            Ok(result) => result,
            Err(join_err) => Err(Error::Stage(format!("stage {stage} panicked: {join_err}"))),
        }
    }
}
