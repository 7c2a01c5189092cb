//! LLM provider setup via rig-core.
//!
//! All models are reached through one OpenAI-compatible client pointed
//! at OpenRouter; the extraction, search, and check stages differ only
//! in model name and preamble. Also hosts the reply-parsing helper the
//! JSON-emitting stages share.

use crate::error::{Error, Result};
use rig::agent::Agent;
use rig::client::CompletionClient;
use rig::providers::openai;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;

/// Create an OpenAI-compatible Chat Completions client from a secret
/// API key and a base URL (OpenRouter in production).
///
/// # Errors
/// Returns an error if the underlying HTTP client cannot be constructed.
pub fn openrouter_client(
    api_key: &SecretString,
    base_url: &str,
) -> Result<openai::CompletionsClient> {
    openai::CompletionsClient::builder()
        .api_key(api_key.expose_secret())
        .base_url(base_url)
        .build()
        .map_err(|e| Error::Config(format!("cannot build llm client: {e}")))
}

/// Build an agent for one stage: a model plus a fixed preamble.
pub fn stage_agent(
    client: &openai::CompletionsClient,
    model: &str,
    preamble: &str,
) -> Agent<openai::CompletionModel> {
    client.agent(model).preamble(preamble).build()
}

/// Parse a JSON object out of a model reply.
///
/// Models wrap JSON in code fences or surround it with prose often
/// enough that a bare `from_str` is not good enough: strip fences
/// first, then fall back to the outermost brace span.
pub fn parse_json_reply<T: DeserializeOwned>(reply: &str) -> Result<T> {
    let trimmed = reply.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|rest| rest.strip_suffix("```").unwrap_or(rest))
        .unwrap_or(trimmed)
        .trim();

    if let Ok(value) = serde_json::from_str(unfenced) {
        return Ok(value);
    }

    let start = unfenced.find('{');
    let end = unfenced.rfind('}');
    if let (Some(start), Some(end)) = (start, end)
        && start < end
    {
        if let Ok(value) = serde_json::from_str(&unfenced[start..=end]) {
            return Ok(value);
        }
    }

    Err(Error::BadReply(format!(
        "no parseable JSON object in reply: {}",
        truncate(reply, 200)
    )))
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Reply {
        summary: String,
    }

    #[test]
    fn parses_bare_json() {
        let reply: Reply = parse_json_reply(r#"{"summary": "ok"}"#).unwrap();
        assert_eq!(reply.summary, "ok");
    }

    #[test]
    fn parses_fenced_json() {
        let reply: Reply = parse_json_reply("```json\n{\"summary\": \"ok\"}\n```").unwrap();
        assert_eq!(reply.summary, "ok");
    }

    #[test]
    fn parses_json_surrounded_by_prose() {
        let reply: Reply =
            parse_json_reply("Here is the result:\n{\"summary\": \"ok\"}\nHope this helps!")
                .unwrap();
        assert_eq!(reply.summary, "ok");
    }

    #[test]
    fn rejects_reply_without_json() {
        let result: Result<Reply> = parse_json_reply("I cannot answer that.");
        assert!(result.is_err());
    }
}
