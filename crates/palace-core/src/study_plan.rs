//! Study-plan generation through an OpenAI-compatible chat-completions endpoint.
//!
//! Failures never reach the palace view as crashes: a reply that does not parse
//! becomes the empty plan, and [`generate_missing_plans`] degrades per-module
//! endpoint errors to the empty plan as well.

use crate::config::PalaceConfig;
use crate::error::{PalaceError, PalaceResult};
use crate::prompts::{study_plan_user_prompt, STUDY_PLAN_SYSTEM};
use crate::record_store::RecordStore;
use crate::records::{StudyPlanContent, StudyPlanRecord};
use crate::vark::VarkCategory;
use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Outermost `{ ... }` span of a model reply (greedy, across lines).
static JSON_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("static regex"));

/// One generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
    pub module_title: String,
    pub module_content: String,
    pub learning_style: VarkCategory,
}

#[async_trait]
pub trait StudyPlanGenerator: Send + Sync {
    /// Generate a plan. Endpoint failures are errors; unparsable replies are the empty plan.
    async fn generate(&self, request: &PlanRequest) -> PalaceResult<StudyPlanContent>;
}

/// Parse a model reply into plan content; anything unparsable is the empty plan.
pub fn parse_plan_reply(content: &str) -> StudyPlanContent {
    let candidate = JSON_SPAN
        .find(content)
        .map(|m| m.as_str())
        .unwrap_or(content);
    match serde_json::from_str::<StudyPlanContent>(candidate) {
        Ok(plan) => plan,
        Err(e) => {
            tracing::warn!(target: "palace::plan", error = %e, "Failed to parse model reply; using empty plan");
            StudyPlanContent::empty()
        }
    }
}

// OpenAI-compatible request/response
#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    #[serde(default)]
    content: Option<String>,
}

/// Generator backed by a remote chat-completions endpoint.
pub struct LlmPlanGenerator {
    api_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl LlmPlanGenerator {
    pub fn new(api_url: &str, api_key: String, model: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key: api_key.trim().to_string(),
            model: model.to_string(),
            client,
        }
    }

    /// Generator from config + environment key. `None` when no key is configured.
    pub fn from_config(config: &PalaceConfig) -> Option<Self> {
        let key = PalaceConfig::llm_api_key()?;
        Some(Self::new(&config.llm_api_url, key, &config.llm_model))
    }
}

#[async_trait]
impl StudyPlanGenerator for LlmPlanGenerator {
    async fn generate(&self, request: &PlanRequest) -> PalaceResult<StudyPlanContent> {
        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: STUDY_PLAN_SYSTEM.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: study_plan_user_prompt(
                        &request.module_title,
                        &request.module_content,
                        request.learning_style.as_str(),
                    ),
                },
            ],
        };

        let res = self
            .client
            .post(format!("{}/chat/completions", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = res.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!(target: "palace::plan", "Model endpoint rate limit exceeded");
            return Err(PalaceError::RateLimited);
        }
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            tracing::error!(target: "palace::plan", status = status.as_u16(), "Model endpoint error");
            return Err(PalaceError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = res.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        Ok(parse_plan_reply(&content))
    }
}

/// Used when no model key is configured: every request yields the empty plan.
pub struct EmptyPlanGenerator;

#[async_trait]
impl StudyPlanGenerator for EmptyPlanGenerator {
    async fn generate(&self, request: &PlanRequest) -> PalaceResult<StudyPlanContent> {
        tracing::warn!(
            target: "palace::plan",
            module = %request.module_title,
            "No model endpoint configured; returning empty plan"
        );
        Ok(StudyPlanContent::empty())
    }
}

/// Generate, degrading any error to the empty plan.
pub async fn generate_or_empty(generator: &dyn StudyPlanGenerator, request: &PlanRequest) -> StudyPlanContent {
    match generator.generate(request).await {
        Ok(plan) => plan,
        Err(e) => {
            tracing::warn!(
                target: "palace::plan",
                module = %request.module_title,
                error = %e,
                "Study plan generation failed; using empty plan"
            );
            StudyPlanContent::empty()
        }
    }
}

/// Ensure every module of `course_id` has a study plan in the student's palace.
///
/// Existing plans are kept; missing ones are generated in module order and
/// persisted. Requires a completed questionnaire and an enrollment. Returns all
/// plans, in module order.
///
/// An endpoint failure (rate limit, upstream status, transport) stops the batch and
/// is returned without storing anything for that module; plans generated before it
/// stay stored, so a later call resumes with the remaining modules. A reply that
/// arrives but does not parse is stored as the empty plan.
pub async fn generate_missing_plans(
    store: &RecordStore,
    generator: &dyn StudyPlanGenerator,
    student_id: &str,
    course_id: &str,
) -> PalaceResult<Vec<StudyPlanRecord>> {
    let profile = store
        .get_profile(student_id)?
        .ok_or_else(|| PalaceError::NotFound(format!("profile {}", student_id)))?;
    let learning_style = profile.learning_style.ok_or_else(|| {
        PalaceError::Validation(
            "No se puede generar el plan de estudio. Verifica que hayas completado el test VARK.".into(),
        )
    })?;
    let modules = store.list_modules(course_id)?;
    if modules.is_empty() {
        return Err(PalaceError::Validation(format!("course {} has no modules", course_id)));
    }
    if !store.is_enrolled(student_id, course_id)? {
        return Err(PalaceError::Forbidden(format!(
            "student {} is not enrolled in course {}",
            student_id, course_id
        )));
    }

    let palace = store.find_or_create_palace(student_id, course_id)?;
    let existing = store.study_plans(&palace.id)?;

    let mut plans = Vec::with_capacity(modules.len());
    for module in &modules {
        if let Some(plan) = existing.iter().find(|p| p.module_id == module.id) {
            plans.push(plan.clone());
            continue;
        }
        let request = PlanRequest {
            module_title: module.title.clone(),
            module_content: module.plan_source_text().to_string(),
            learning_style,
        };
        let content = match generator.generate(&request).await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(
                    target: "palace::plan",
                    module = %module.title,
                    stored = plans.len(),
                    error = %e,
                    "Study plan generation failed; module left without a plan"
                );
                return Err(e);
            }
        };
        let record = StudyPlanRecord {
            id: uuid::Uuid::new_v4().to_string(),
            palace_id: palace.id.clone(),
            module_id: module.id.clone(),
            learning_style: Some(learning_style),
            techniques: content.techniques,
            tasks: content.tasks,
            generated_at: Utc::now(),
        };
        store.insert_study_plan(&record)?;
        plans.push(record);
    }

    tracing::info!(
        target: "palace::plan",
        palace_id = %palace.id,
        plans = plans.len(),
        "Study plans ready"
    );
    Ok(plans)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_with_prose_around_json_is_parsed() {
        let reply = "Claro, aquí tienes:\n```json\n{\"techniques\":[{\"name\":\"Mapa\",\"steps\":[]}],\"tasks\":[]}\n```\n¡Suerte!";
        let plan = parse_plan_reply(reply);
        assert_eq!(plan.techniques.len(), 1);
        assert_eq!(plan.techniques[0].name, "Mapa");
    }

    #[test]
    fn malformed_reply_is_empty_plan() {
        assert!(parse_plan_reply("no JSON here").is_empty());
        assert!(parse_plan_reply("{\"techniques\": [ oops }").is_empty());
        assert!(parse_plan_reply("").is_empty());
    }

    #[tokio::test]
    async fn empty_generator_yields_empty_plan() {
        let request = PlanRequest {
            module_title: "m".into(),
            module_content: "c".into(),
            learning_style: VarkCategory::Auditory,
        };
        assert!(generate_or_empty(&EmptyPlanGenerator, &request).await.is_empty());
    }
}
