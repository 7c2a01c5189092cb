//! Person record operations used by the stage collaborators.
//!
//! Each stage reads whatever fields it needs, writes its own result
//! columns, and sets its own completion flag. The queue engine itself
//! never touches stage-specific content.

use crate::error::{Error, Result};
use crate::model::PersonRecord;
use crate::model::person::NewPerson;
use crate::pipeline::Stage;

/// Per-flag person counts for the stats report.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PersonStats {
    pub persons: i64,
    pub prellm_done: i64,
    pub llm_done: i64,
    pub valid: i64,
    pub perp_done: i64,
    pub postcheck1_done: i64,
    pub postcheck2_done: i64,
    pub photos_done: i64,
    pub done: i64,
}

impl super::Db {
    /// Ingest one person with raw source fields only.
    pub async fn insert_person(&self, new: &NewPerson) -> Result<()> {
        sqlx::query(
            "INSERT INTO person_result_data
                 (person_id, fetch_date, first_name, last_name, about,
                  username, personal_channel_title, personal_channel_about)
             VALUES ($1, now(), $2, $3, $4, $5, $6, $7)
             ON CONFLICT (person_id) DO NOTHING",
        )
        .bind(new.person_id)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.about)
        .bind(&new.username)
        .bind(&new.personal_channel_title)
        .bind(&new.personal_channel_about)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Fetch one person record.
    pub async fn get_person(&self, person_id: i64) -> Result<PersonRecord> {
        let row: Option<PersonRecord> =
            sqlx::query_as("SELECT * FROM person_result_data WHERE person_id = $1")
                .bind(person_id)
                .fetch_optional(self.pool())
                .await?;
        row.ok_or(Error::PersonNotFound(person_id))
    }

    /// All fully-processed persons, for export.
    pub async fn list_done_persons(&self) -> Result<Vec<PersonRecord>> {
        let rows = sqlx::query_as(
            "SELECT * FROM person_result_data WHERE done = TRUE ORDER BY person_id",
        )
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    /// Write the cleaned fields produced by the prellm stage.
    pub async fn update_meaningful_fields(
        &self,
        person_id: i64,
        first_name: Option<&str>,
        last_name: Option<&str>,
        about: Option<&str>,
        extracted_links: &[String],
    ) -> Result<()> {
        sqlx::query(
            "UPDATE person_result_data
             SET meaningful_first_name = $1,
                 meaningful_last_name = $2,
                 meaningful_about = $3,
                 extracted_links = $4
             WHERE person_id = $5",
        )
        .bind(first_name)
        .bind(last_name)
        .bind(about)
        .bind(extracted_links)
        .bind(person_id)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Write the extraction results and validity verdict from the llm stage.
    pub async fn update_llm_results(
        &self,
        person_id: i64,
        first_name: Option<&str>,
        last_name: Option<&str>,
        about: Option<&str>,
        valid: bool,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE person_result_data
             SET meaningful_first_name = $1,
                 meaningful_last_name = $2,
                 meaningful_about = $3,
                 valid = $4
             WHERE person_id = $5",
        )
        .bind(first_name)
        .bind(last_name)
        .bind(about)
        .bind(valid)
        .bind(person_id)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Write the search summary produced by the perp stage.
    pub async fn update_summary(
        &self,
        person_id: i64,
        summary: &str,
        urls: &[String],
        confidence: &str,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE person_result_data
             SET summary = $1, urls = $2, confidence = $3
             WHERE person_id = $4",
        )
        .bind(summary)
        .bind(urls)
        .bind(confidence)
        .bind(person_id)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Drop a summary that failed the second check.
    pub async fn clear_rejected_summary(&self, person_id: i64) -> Result<()> {
        sqlx::query(
            "UPDATE person_result_data
             SET summary = NULL, urls = '{}', confidence = 'second_check_failed'
             WHERE person_id = $1",
        )
        .bind(person_id)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Set the completion flag for a stage. The final stage also marks
    /// the person done.
    pub async fn set_completion_flag(&self, person_id: i64, stage: Stage) -> Result<()> {
        // Flag names come from the closed registry enum, never from input.
        let sql = if stage == Stage::Postcheck2 {
            format!(
                "UPDATE person_result_data SET {} = TRUE, done = TRUE WHERE person_id = $1",
                stage.completion_flag()
            )
        } else {
            format!(
                "UPDATE person_result_data SET {} = TRUE WHERE person_id = $1",
                stage.completion_flag()
            )
        };
        sqlx::query(&sql).bind(person_id).execute(self.pool()).await?;
        Ok(())
    }

    /// Per-flag counts over the person table.
    pub async fn person_stats(&self) -> Result<PersonStats> {
        let stats = sqlx::query_as(
            "SELECT COUNT(*) AS persons,
                    COUNT(*) FILTER (WHERE flag_prellm) AS prellm_done,
                    COUNT(*) FILTER (WHERE flag_llm) AS llm_done,
                    COUNT(*) FILTER (WHERE valid) AS valid,
                    COUNT(*) FILTER (WHERE flag_perp) AS perp_done,
                    COUNT(*) FILTER (WHERE flag_postcheck1) AS postcheck1_done,
                    COUNT(*) FILTER (WHERE flag_postcheck2) AS postcheck2_done,
                    COUNT(*) FILTER (WHERE flag_photos) AS photos_done,
                    COUNT(*) FILTER (WHERE done) AS done
             FROM person_result_data",
        )
        .fetch_one(self.pool())
        .await?;
        Ok(stats)
    }
}
