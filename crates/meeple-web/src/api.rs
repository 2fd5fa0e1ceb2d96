//! JSON endpoint handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use meeple::{Assistant, DEFAULT_SESSION_ID, DEFAULT_TOP_K, RagError};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;

/// Shared application state passed to all handlers via axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub assistant: Arc<Assistant>,
}

/// Response envelope shared by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiResponse {
    pub status: String,
    pub data: Option<Value>,
    pub message: Option<String>,
    /// Set when the task failed; `data` then carries the failure text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

impl ApiResponse {
    fn success(data: Value, message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            data: Some(data),
            message: Some(message.into()),
            error_kind: None,
        }
    }

    /// Wrap a task result under `key`, rendering failures as user text.
    fn task(key: &str, result: Result<String, RagError>, done: &str) -> Self {
        match result {
            Ok(text) => Self::success(json!({ key: text }), done),
            Err(e) => Self {
                error_kind: Some(e.kind().to_string()),
                ..Self::success(json!({ key: e.user_message() }), done)
            },
        }
    }
}

fn session_or_default(session_id: Option<String>) -> String {
    session_id
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_SESSION_ID.to_string())
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

/// GET / — Service name, version, and endpoint map.
pub async fn get_root() -> Json<ApiResponse> {
    Json(ApiResponse::success(
        json!({
            "service": "meeple",
            "version": env!("CARGO_PKG_VERSION"),
            "status": "running",
            "endpoints": {
                "health": "/health",
                "recommend": "/recommend",
                "explain_rules": "/explain-rules",
                "rule_summary": "/rule-summary",
                "games": "/games",
            },
        }),
        "보드게임 AI 백엔드 서버",
    ))
}

/// GET /health — Whether the recommendation corpus is loaded.
pub async fn get_health(State(app): State<AppState>) -> Json<ApiResponse> {
    let loaded = app.assistant.is_ready();
    Json(ApiResponse::success(
        json!({
            "status": if loaded { "healthy" } else { "degraded" },
            "services_loaded": loaded,
            "backend": app.assistant.generator_name(),
        }),
        "보드게임 AI 백엔드가 정상 작동 중입니다!",
    ))
}

/// Request body for POST /recommend.
#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    pub query: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// POST /recommend — Recommend games for a free-text query.
pub async fn post_recommend(
    State(app): State<AppState>,
    Json(body): Json<RecommendRequest>,
) -> Json<ApiResponse> {
    info!("Recommendation request: {}", body.query);
    let session = session_or_default(body.session_id);
    let result = app.assistant.recommend(&body.query, body.top_k, &session).await;
    Json(ApiResponse::task(
        "recommendation",
        result,
        "게임 추천이 완료되었습니다.",
    ))
}

/// Request body for POST /explain-rules.
#[derive(Debug, Deserialize)]
pub struct RuleQuestionRequest {
    pub game_name: String,
    pub question: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// POST /explain-rules — Answer a rule question about one game.
pub async fn post_explain_rules(
    State(app): State<AppState>,
    Json(body): Json<RuleQuestionRequest>,
) -> Json<ApiResponse> {
    info!("Rule question: {} - {}", body.game_name, body.question);
    let session = session_or_default(body.session_id);
    let result = app
        .assistant
        .answer_rule_question(&body.game_name, &body.question, &session)
        .await;
    Json(ApiResponse::task("answer", result, "룰 설명이 완료되었습니다."))
}

/// Request body for POST /rule-summary.
#[derive(Debug, Deserialize)]
pub struct RuleSummaryRequest {
    pub game_name: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// POST /rule-summary — Summarize one game's rules.
pub async fn post_rule_summary(
    State(app): State<AppState>,
    Json(body): Json<RuleSummaryRequest>,
) -> Json<ApiResponse> {
    info!("Rule summary request: {}", body.game_name);
    let session = session_or_default(body.session_id);
    let result = app.assistant.summarize_rules(&body.game_name, &session).await;
    Json(ApiResponse::task("summary", result, "룰 요약이 완료되었습니다."))
}

/// GET /games — Known game names.
pub async fn get_games(State(app): State<AppState>) -> Json<ApiResponse> {
    let games = app.assistant.list_entities();
    let message = format!("총 {}개의 게임을 지원합니다.", games.len());
    Json(ApiResponse::success(json!({ "games": games }), message))
}

#[cfg(test)]
mod tests {
    use meeple::error::EntityStoreKind;

    use super::*;

    #[test]
    fn recommend_request_defaults() {
        let req: RecommendRequest = serde_json::from_str(r#"{"query":"파티 게임"}"#).unwrap();
        assert_eq!(req.top_k, 3);
        assert!(req.session_id.is_none());
        assert_eq!(session_or_default(req.session_id), "default_session");
        assert_eq!(session_or_default(Some(String::new())), "default_session");
    }

    #[test]
    fn legacy_chat_type_field_is_ignored() {
        let req: RuleQuestionRequest = serde_json::from_str(
            r#"{"game_name":"뱅","question":"몇 명?","chat_type":"finetuning"}"#,
        )
        .unwrap();
        assert_eq!(req.game_name, "뱅");
    }

    #[test]
    fn failed_task_keeps_success_envelope() {
        let err = RagError::EntityNotFound {
            entity: "뱅".into(),
            store: EntityStoreKind::FullRecords,
        };
        let resp = ApiResponse::task("summary", Err(err), "done");
        assert_eq!(resp.status, "success");
        assert_eq!(resp.error_kind.as_deref(), Some("entity_not_found"));
        assert!(resp.data.unwrap()["summary"].as_str().unwrap().contains("game.json"));
    }

    #[test]
    fn successful_task_omits_error_kind() {
        let resp = ApiResponse::task("answer", Ok("네".into()), "done");
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["data"]["answer"], "네");
        assert!(json.get("error_kind").is_none());
    }
}
