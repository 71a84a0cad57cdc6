//! HTTP client for the AI link suggestion service.
//!
//! Responses are validated at the boundary by `parse_suggestion_payload`;
//! 429 and 503 become [`SuggestionError::Unavailable`] carrying the
//! `retry_after` hint and the manual-search fallback.

use std::sync::Arc;
use std::time::Duration;

use linkage_config::SuggestionsConfig;
use linkage_core::entities::LinkSuggestion;
use linkage_core::enums::EntityType;
use linkage_core::requests::{AcceptSuggestionRequest, SuggestionRequest};
use linkage_core::suggestions::{
    Fallback, SuggestionMetadata, SuggestionPayload, parse_suggestion_payload,
};
use thiserror::Error;
use tokio::task::{AbortHandle, JoinHandle};

use crate::session::Session;

#[derive(Debug, Error)]
pub enum SuggestionError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Rate limited or the AI backend is down.
    #[error("suggestions unavailable ({code}): {message}")]
    Unavailable {
        code: String,
        message: String,
        retry_after: Option<u64>,
        fallback: Fallback,
    },

    #[error("invalid response shape: {0}")]
    InvalidResponseShape(String),

    #[error("suggestion service is not configured (suggestions.base_url)")]
    NotConfigured,

    #[error("not authenticated: {0}")]
    Unauthenticated(String),

    #[error("suggestion request cancelled")]
    Cancelled,
}

/// Ranked suggestions plus optional service metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestions {
    pub suggestions: Vec<LinkSuggestion>,
    pub metadata: Option<SuggestionMetadata>,
}

pub struct SuggestionClient {
    http: reqwest::Client,
    base_url: String,
    max_suggestions: u32,
}

impl SuggestionClient {
    /// # Errors
    ///
    /// `NotConfigured` without a base URL; `Http` if the client cannot be built.
    pub fn new(config: &SuggestionsConfig) -> Result<Self, SuggestionError> {
        if !config.is_configured() {
            return Err(SuggestionError::NotConfigured);
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_suggestions: config.max_suggestions,
        })
    }

    fn suggestions_url(&self, intake_id: &str) -> String {
        format!(
            "{}/intake/{}/links/suggestions",
            self.base_url,
            urlencoding::encode(intake_id)
        )
    }

    /// Ask for ranked link candidates for one intake.
    ///
    /// # Errors
    ///
    /// - `Unauthenticated` before any request when the session is not valid.
    /// - `Unavailable` for 429/503 or a `success: false` body.
    /// - `InvalidResponseShape` for a body that is neither shape.
    pub async fn generate(
        &self,
        session: &Session,
        intake_id: &str,
        entity_types: &[EntityType],
    ) -> Result<Suggestions, SuggestionError> {
        let token = session
            .bearer()
            .map_err(|e| SuggestionError::Unauthenticated(e.to_string()))?;
        let body = SuggestionRequest {
            entity_types: entity_types.to_vec(),
            max_suggestions: self.max_suggestions,
        };
        tracing::debug!(intake_id, types = entity_types.len(), "requesting suggestions");
        let resp = self
            .http
            .post(self.suggestions_url(intake_id))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        read_suggestions(resp).await
    }

    /// Report an accepted suggestion back to the service.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::generate`], minus shape validation.
    pub async fn accept(
        &self,
        session: &Session,
        intake_id: &str,
        request: &AcceptSuggestionRequest,
    ) -> Result<(), SuggestionError> {
        let token = session
            .bearer()
            .map_err(|e| SuggestionError::Unauthenticated(e.to_string()))?;
        let resp = self
            .http
            .post(format!("{}/accept", self.suggestions_url(intake_id)))
            .bearer_auth(token)
            .json(request)
            .send()
            .await?;
        check_response(resp).await?;
        tracing::debug!(intake_id, suggestion_id = %request.suggestion_id, "suggestion accepted");
        Ok(())
    }

    /// Run [`Self::generate`] on the runtime. The returned task can be
    /// aborted when its result is no longer wanted.
    pub fn spawn_generate(
        self: &Arc<Self>,
        session: Session,
        intake_id: String,
        entity_types: Vec<EntityType>,
    ) -> SuggestionTask {
        let client = Arc::clone(self);
        let handle = tokio::spawn(async move {
            client.generate(&session, &intake_id, &entity_types).await
        });
        SuggestionTask { handle }
    }
}

/// In-flight suggestion generation.
#[derive(Debug)]
pub struct SuggestionTask {
    handle: JoinHandle<Result<Suggestions, SuggestionError>>,
}

impl SuggestionTask {
    pub fn abort(&self) {
        self.handle.abort();
    }

    /// Handle that aborts the task after [`Self::join`] has taken it.
    #[must_use]
    pub fn abort_handle(&self) -> AbortHandle {
        self.handle.abort_handle()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// # Errors
    ///
    /// `Cancelled` when the task was aborted, otherwise the request's error.
    pub async fn join(self) -> Result<Suggestions, SuggestionError> {
        match self.handle.await {
            Ok(result) => result,
            Err(err) if err.is_cancelled() => Err(SuggestionError::Cancelled),
            Err(err) => Err(SuggestionError::Api {
                status: 0,
                message: format!("suggestion task failed: {err}"),
            }),
        }
    }
}

fn unavailable(
    code: String,
    message: String,
    retry_after: Option<u64>,
    fallback: Option<Fallback>,
) -> SuggestionError {
    SuggestionError::Unavailable {
        code,
        message,
        retry_after,
        fallback: fallback.unwrap_or(Fallback::ManualSearch),
    }
}

/// Map 429/503 to `Unavailable` and other failures to `Api`.
pub(crate) async fn check_response(
    resp: reqwest::Response,
) -> Result<reqwest::Response, SuggestionError> {
    let status = resp.status().as_u16();
    if status == 429 || status == 503 {
        let header_retry = parse_retry_after(&resp);
        let body: Option<serde_json::Value> = resp.json().await.ok();
        let parsed = body.as_ref().and_then(|b| parse_suggestion_payload(b).ok());
        return Err(match parsed {
            Some(SuggestionPayload::Unavailable {
                code,
                message,
                retry_after,
                fallback,
            }) => unavailable(code, message, retry_after.or(header_retry), fallback),
            _ => unavailable(
                if status == 429 { "RATE_LIMITED" } else { "SERVICE_UNAVAILABLE" }.to_string(),
                format!("suggestion service answered {status}"),
                header_retry,
                None,
            ),
        });
    }
    if !resp.status().is_success() {
        return Err(SuggestionError::Api {
            status,
            message: resp.text().await.unwrap_or_default(),
        });
    }
    Ok(resp)
}

fn parse_retry_after(resp: &reqwest::Response) -> Option<u64> {
    resp.headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
}

pub(crate) async fn read_suggestions(
    resp: reqwest::Response,
) -> Result<Suggestions, SuggestionError> {
    let resp = check_response(resp).await?;
    let body: serde_json::Value = resp
        .json()
        .await
        .map_err(|e| SuggestionError::InvalidResponseShape(e.to_string()))?;
    match parse_suggestion_payload(&body)
        .map_err(|e| SuggestionError::InvalidResponseShape(e.to_string()))?
    {
        SuggestionPayload::Suggestions {
            suggestions,
            metadata,
        } => Ok(Suggestions {
            suggestions,
            metadata,
        }),
        SuggestionPayload::Unavailable {
            code,
            message,
            retry_after,
            fallback,
        } => Err(unavailable(code, message, retry_after, fallback)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn mock(status: u16, body: &serde_json::Value) -> reqwest::Response {
        reqwest::Response::from(
            ::http::Response::builder()
                .status(status)
                .body(body.to_string())
                .unwrap(),
        )
    }

    fn mock_with_retry_after(status: u16, value: &str) -> reqwest::Response {
        reqwest::Response::from(
            ::http::Response::builder()
                .status(status)
                .header("Retry-After", value)
                .body("")
                .unwrap(),
        )
    }

    fn suggestion(rank: u32) -> serde_json::Value {
        json!({
            "suggestion_id": format!("sug-{rank}"),
            "entity_id": format!("d{rank}"),
            "entity_type": "dossier",
            "suggested_link_type": "related",
            "confidence_score": 0.9,
            "reasoning": "same counterpart",
            "rank": rank
        })
    }

    #[tokio::test]
    async fn success_body_is_ranked() {
        let body = json!({"success": true, "suggestions": [suggestion(2), suggestion(1)]});
        let parsed = read_suggestions(mock(200, &body)).await.unwrap();
        let ranks: Vec<u32> = parsed.suggestions.iter().map(|s| s.rank).collect();
        assert_eq!(ranks, vec![1, 2]);
    }

    #[tokio::test]
    async fn rate_limit_uses_header_and_manual_fallback() {
        let err = read_suggestions(mock_with_retry_after(429, "45"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SuggestionError::Unavailable {
                retry_after: Some(45),
                fallback: Fallback::ManualSearch,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn unavailable_body_wins_over_status_defaults() {
        let body = json!({
            "success": false,
            "error": {"code": "AI_DOWN", "message": "model offline", "retry_after": 120, "fallback": "manual_search"}
        });
        let err = read_suggestions(mock(503, &body)).await.unwrap_err();
        match err {
            SuggestionError::Unavailable {
                code, retry_after, ..
            } => {
                assert_eq!(code, "AI_DOWN");
                assert_eq!(retry_after, Some(120));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn success_false_with_200_is_unavailable() {
        let body = json!({"success": false, "error": {"code": "QUOTA", "message": "quota exceeded"}});
        let err = read_suggestions(mock(200, &body)).await.unwrap_err();
        assert!(matches!(err, SuggestionError::Unavailable { retry_after: None, .. }));
    }

    #[tokio::test]
    async fn malformed_body_is_rejected() {
        let body = json!({"items": []});
        let err = read_suggestions(mock(200, &body)).await.unwrap_err();
        assert!(matches!(err, SuggestionError::InvalidResponseShape(_)));
    }

    #[tokio::test]
    async fn server_error_is_api_error() {
        let err = read_suggestions(mock(500, &json!({"oops": true})))
            .await
            .unwrap_err();
        assert!(matches!(err, SuggestionError::Api { status: 500, .. }));
    }

    #[test]
    fn unconfigured_client_is_refused() {
        assert!(matches!(
            SuggestionClient::new(&SuggestionsConfig::default()),
            Err(SuggestionError::NotConfigured)
        ));
    }

    #[test]
    fn urls_encode_intake_id() {
        let client = SuggestionClient::new(&SuggestionsConfig {
            base_url: "https://api.example.org/v1/".into(),
            ..SuggestionsConfig::default()
        })
        .unwrap();
        assert_eq!(
            client.suggestions_url("int 1"),
            "https://api.example.org/v1/intake/int%201/links/suggestions"
        );
    }

    #[tokio::test]
    async fn aborted_task_reports_cancelled() {
        let task = SuggestionTask {
            handle: tokio::spawn(async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Err(SuggestionError::NotConfigured)
            }),
        };
        task.abort();
        assert!(matches!(task.join().await, Err(SuggestionError::Cancelled)));
    }

    #[tokio::test]
    async fn expired_session_fails_before_request() {
        use chrono::Utc;
        use linkage_core::identity::AuthIdentity;

        let client = SuggestionClient::new(&SuggestionsConfig {
            base_url: "http://127.0.0.1:9".into(),
            ..SuggestionsConfig::default()
        })
        .unwrap();
        let session = Session::new(
            AuthIdentity {
                user_id: "u".into(),
                org_id: None,
                clearance_level: 0,
            },
            "tok",
            Some(Utc::now() - chrono::Duration::seconds(5)),
        );
        let err = client.generate(&session, "int-1", &[]).await.unwrap_err();
        assert!(matches!(err, SuggestionError::Unauthenticated(_)));
    }
}
