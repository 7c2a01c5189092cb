//! Stage registry: the fixed linear enrichment chain.
//!
//! Pure data. Each stage carries an eligibility predicate over the
//! person table, the flag that marks its completion, and its successor.
//! Queue population is driven entirely by this mapping; correctness of
//! the chain depends on the predicates matching the stage order.

use crate::error::Error;
use serde::{Deserialize, Serialize};

/// One step of the enrichment chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Regex cleaning of raw name/about fields.
    Prellm,
    /// LLM extraction of meaningful fields + validity verdict.
    Llm,
    /// Web search for a summary of the person.
    Perp,
    /// First LLM check of the summary.
    Postcheck1,
    /// Second LLM check with full person context; marks `done`.
    Postcheck2,
    /// Photo clustering. Registered but currently disabled: never
    /// auto-advanced to and no handler is wired.
    Photos,
}

impl Stage {
    /// All registered stages, in chain order.
    pub const ALL: [Stage; 6] = [
        Stage::Prellm,
        Stage::Llm,
        Stage::Perp,
        Stage::Postcheck1,
        Stage::Postcheck2,
        Stage::Photos,
    ];

    /// Stages the populator fills in bulk and workers claim by default.
    pub const ACTIVE: [Stage; 5] = [
        Stage::Prellm,
        Stage::Llm,
        Stage::Perp,
        Stage::Postcheck1,
        Stage::Postcheck2,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Prellm => "prellm",
            Stage::Llm => "llm",
            Stage::Perp => "perp",
            Stage::Postcheck1 => "postcheck1",
            Stage::Postcheck2 => "postcheck2",
            Stage::Photos => "photos",
        }
    }

    /// SQL predicate over the person table (alias `p`) deciding whether
    /// a person is eligible for this stage. Static fragments only;
    /// these are interpolated, never bound.
    pub fn eligibility_sql(self) -> &'static str {
        match self {
            Stage::Prellm => "p.about IS NOT NULL",
            Stage::Llm => "p.flag_prellm = TRUE",
            Stage::Perp => "p.flag_llm = TRUE AND p.valid = TRUE",
            Stage::Postcheck1 => "p.flag_perp = TRUE",
            Stage::Postcheck2 => "p.flag_postcheck1 = TRUE",
            Stage::Photos => "p.flag_postcheck2 = TRUE",
        }
    }

    /// Column on the person table that marks this stage completed.
    pub fn completion_flag(self) -> &'static str {
        match self {
            Stage::Prellm => "flag_prellm",
            Stage::Llm => "flag_llm",
            Stage::Perp => "flag_perp",
            Stage::Postcheck1 => "flag_postcheck1",
            Stage::Postcheck2 => "flag_postcheck2",
            Stage::Photos => "flag_photos",
        }
    }

    /// Next stage in the chain, or None if terminal. The chain ends at
    /// postcheck2; photos is reachable only by explicit enqueue.
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Prellm => Some(Stage::Llm),
            Stage::Llm => Some(Stage::Perp),
            Stage::Perp => Some(Stage::Postcheck1),
            Stage::Postcheck1 => Some(Stage::Postcheck2),
            Stage::Postcheck2 => None,
            Stage::Photos => None,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Stage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prellm" => Ok(Stage::Prellm),
            "llm" => Ok(Stage::Llm),
            "perp" => Ok(Stage::Perp),
            "postcheck1" => Ok(Stage::Postcheck1),
            "postcheck2" => Ok(Stage::Postcheck2),
            "photos" => Ok(Stage::Photos),
            other => Err(Error::UnknownStage(other.to_string())),
        }
    }
}
