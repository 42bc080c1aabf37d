//! Background jobs
//!
//! Long-running work runs on `tokio::spawn` with its lifecycle persisted in
//! the `background_tasks` table; clients poll `/api/tasks/:task_id`.

use rayo_common::db::models::{Project, TaskStatus};
use serde_json::{json, Value};
use tracing::{error, info};
use uuid::Uuid;

use crate::db::tasks;
use crate::prompts;
use crate::AppState;

/// Task kind for the keyword-suggestions chain
pub const KIND_KEYWORD_SUGGESTIONS: &str = "keyword_suggestions";

/// Spawn the keyword-suggestions chain for a project.
///
/// Generate candidates with OpenAI, enrich the batch with SEMrush metrics
/// for the given country database, clean and sort, then record the result
/// on the task row.
pub fn spawn_keyword_suggestions(state: AppState, task_id: Uuid, project: Project, country: String) {
    tokio::spawn(async move {
        if let Err(err) = tasks::update_task_status(
            &state.db,
            task_id,
            TaskStatus::Running,
            None,
            None,
        )
        .await
        {
            error!(task_id = %task_id, error = %err, "Failed to mark task running");
            return;
        }

        match run_keyword_suggestions(&state, &project, &country).await {
            Ok(result) => {
                info!(
                    task_id = %task_id,
                    project_id = %project.id,
                    count = result.as_array().map(|a| a.len()).unwrap_or(0),
                    "Keyword suggestions completed"
                );
                if let Err(err) = tasks::update_task_status(
                    &state.db,
                    task_id,
                    TaskStatus::Completed,
                    Some(&result),
                    None,
                )
                .await
                {
                    error!(task_id = %task_id, error = %err, "Failed to record task result");
                }
            }
            Err(err) => {
                error!(
                    task_id = %task_id,
                    project_id = %project.id,
                    error = %err,
                    "Keyword suggestions failed"
                );
                if let Err(err) = tasks::update_task_status(
                    &state.db,
                    task_id,
                    TaskStatus::Failed,
                    None,
                    Some(&err.to_string()),
                )
                .await
                {
                    error!(task_id = %task_id, error = %err, "Failed to record task failure");
                }
            }
        }
    });
}

async fn run_keyword_suggestions(
    state: &AppState,
    project: &Project,
    country: &str,
) -> anyhow::Result<Value> {
    let openai = state
        .openai
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("OpenAI API key not configured"))?;
    let semrush = state
        .semrush
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("SEMrush API key not configured"))?;

    let (system, user) = prompts::keyword_suggestions(project, None);
    let answer = openai.complete(&system, &user).await?;
    let candidates = prompts::parse_keyword_list(&answer);

    if candidates.is_empty() {
        return Ok(json!([]));
    }

    let metrics = semrush.fetch_metrics(&candidates, country).await?;

    let mut suggestions: Vec<Value> = candidates
        .iter()
        .map(|candidate| {
            let found = metrics
                .iter()
                .find(|m| m.phrase.eq_ignore_ascii_case(candidate));
            match found {
                Some(m) => json!({
                    "keyword": candidate,
                    "search_volume": m.search_volume,
                    "difficulty": m.difficulty,
                    "intent": m.intent,
                    "cpc": m.cpc,
                    "competition": m.competition,
                }),
                None => json!({
                    "keyword": candidate,
                    "search_volume": 0,
                    "difficulty": 0,
                    "intent": "unknown",
                    "cpc": 0.0,
                    "competition": 0.0,
                }),
            }
        })
        .collect();

    // Volume descending, keyword ascending as tiebreak
    suggestions.sort_by(|a, b| {
        let volume_a = a["search_volume"].as_i64().unwrap_or(0);
        let volume_b = b["search_volume"].as_i64().unwrap_or(0);
        volume_b.cmp(&volume_a).then_with(|| {
            a["keyword"]
                .as_str()
                .unwrap_or("")
                .cmp(b["keyword"].as_str().unwrap_or(""))
        })
    });

    Ok(Value::Array(suggestions))
}
