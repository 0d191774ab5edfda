//! Webhook server for ghia.
//!
//! - `GET /` shows the loaded rules
//! - `POST /` receives GitHub `ping` and `issues` events and assigns the
//!   issue with the `append` strategy
//!
//! Configuration is loaded once by the caller and shared read-only between
//! requests.

mod html;

use anyhow::Result;
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse},
    routing::get,
};
use ghia_config::ServerConfig;
use ghia_core::{CoreError, Strategy, WebhookEvent, process_issue};
use ghia_github::{GitHubError, IssuePatch, IssueTracker, IssuesEvent, RemoteIssue};
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub use html::render_status;

pub const SIGNATURE_HEADER: &str = "X-Hub-Signature";
pub const SIGNATURE_256_HEADER: &str = "X-Hub-Signature-256";
pub const EVENT_HEADER: &str = "X-GitHub-Event";

/// Server state shared across handlers.
struct AppState<T> {
    config: ServerConfig,
    tracker: T,
}

/// Build the router.
pub fn router<T: IssueTracker + 'static>(config: ServerConfig, tracker: T) -> Router {
    let state = Arc::new(AppState { config, tracker });

    Router::new()
        .route("/", get(status::<T>).post(webhook::<T>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the webhook server.
///
/// # Errors
/// Returns error if binding fails or server encounters an error.
pub async fn serve<T: IssueTracker + 'static>(
    config: ServerConfig,
    tracker: T,
    host: &str,
    port: u16,
) -> Result<()> {
    let app = router(config, tracker);

    let addr = format!("{host}:{port}");
    info!(address = %addr, "Starting webhook server");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

async fn status<T: IssueTracker>(State(state): State<Arc<AppState<T>>>) -> Html<String> {
    Html(render_status(&state.config))
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

async fn webhook<T: IssueTracker>(
    State(state): State<Arc<AppState<T>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<String, AppError> {
    let signature = header(&headers, SIGNATURE_256_HEADER)
        .or_else(|| header(&headers, SIGNATURE_HEADER))
        .map(str::to_string);

    WebhookEvent::new(body.to_vec(), signature)
        .authenticate(state.config.auth.secret.as_deref())
        .map_err(AppError::Unauthorized)?;

    let event = header(&headers, EVENT_HEADER)
        .ok_or_else(|| AppError::BadRequest(format!("missing {EVENT_HEADER} header")))?;

    match event {
        "ping" => {
            info!("Received PING event");
            Ok("Ping successful".to_string())
        }
        "issues" => {
            info!("Received ISSUES event");
            let event: IssuesEvent = serde_json::from_slice(&body)
                .map_err(|e| AppError::BadRequest(format!("invalid issues payload: {e}")))?;
            if !event.is_processed() {
                return Err(AppError::NotImplemented(format!(
                    "issues action '{}'",
                    event.action
                )));
            }
            handle_issue(&state, event.issue.into()).await
        }
        other => Err(AppError::NotImplemented(format!("event '{other}'"))),
    }
}

async fn handle_issue<T: IssueTracker>(
    state: &AppState<T>,
    remote: RemoteIssue,
) -> Result<String, AppError> {
    let desired = process_issue(&remote.issue, Strategy::Append, &state.config.rules);

    if let Some(patch) = IssuePatch::from_desired(&remote.issue, &desired) {
        state
            .tracker
            .update_issue(&remote, &patch)
            .await
            .map_err(AppError::Upstream)?;
        info!(number = remote.number, "Issue sent successfully");
    }

    Ok(format!(
        "Issue {} ({}) was successfully updated.",
        remote.number, remote.issue.title
    ))
}

// --- Error handling ---

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
}

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(CoreError),
    #[error("unsupported {0}")]
    NotImplemented(String),
    #[error("could not update issue: {0}")]
    Upstream(GitHubError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
        };
        let reason = match &self {
            Self::Upstream(e) => e.reason(),
            _ => None,
        };
        warn!(status = %status, reason = ?reason, error = %self, "Rejected webhook");

        let body = Json(ErrorResponse {
            error: self.to_string(),
            reason,
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use ghia_config::AuthConfig;
    use ghia_core::{Digest, Reposlug, compile_rules, sign};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Mutex;
    use tower::ServiceExt;

    const SECRET: &str = "tajneheslo";

    #[derive(Default)]
    struct MockTracker {
        updates: Mutex<Vec<(u64, IssuePatch)>>,
        fail_status: Option<u16>,
    }

    impl IssueTracker for MockTracker {
        async fn list_issues(&self, _reposlug: &Reposlug) -> ghia_github::Result<Vec<RemoteIssue>> {
            Ok(Vec::new())
        }

        async fn update_issue(
            &self,
            issue: &RemoteIssue,
            patch: &IssuePatch,
        ) -> ghia_github::Result<()> {
            if let Some(status) = self.fail_status {
                return Err(GitHubError::Status {
                    status,
                    url: issue.url.clone(),
                });
            }
            self.updates
                .lock()
                .unwrap()
                .push((issue.number, patch.clone()));
            Ok(())
        }
    }

    fn config(secret: Option<&str>) -> ServerConfig {
        let mut auth = AuthConfig::new("ffff");
        auth.secret = secret.map(str::to_string);
        ServerConfig {
            user: "ghia-bot".to_string(),
            auth,
            rules: compile_rules(
                "[patterns]\nghia-anna=\n    text:requests\nghia-jane=\n    title:<README>\n[fallback]\nlabel=Need assignment\n",
            )
            .unwrap(),
        }
    }

    fn issues_payload(action: &str) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "action": action,
            "issue": {
                "number": 7,
                "url": "https://api.github.com/repos/o/r/issues/7",
                "html_url": "https://github.com/o/r/issues/7",
                "title": "Use requests",
                "body": "Switch to the requests library",
                "labels": [],
                "assignees": [{"login": "Codertocat"}]
            }
        }))
        .unwrap()
    }

    fn post(event: Option<&str>, body: Vec<u8>, signature: Option<(&str, String)>) -> Request<Body> {
        let mut builder = Request::post("/").header("content-type", "application/json");
        if let Some(event) = event {
            builder = builder.header(EVENT_HEADER, event);
        }
        if let Some((name, value)) = signature {
            builder = builder.header(name, value);
        }
        builder.body(Body::from(body)).unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_status_page() {
        let app = router(config(Some(SECRET)), Arc::new(MockTracker::default()));
        let (status, body) = send(app, Request::get("/").body(Body::empty()).unwrap()).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("ghia-bot"));
        assert!(body.contains("ghia-anna"));
        assert!(body.contains("text:requests"));
        assert!(body.contains("title:&lt;README&gt;"));
        assert!(body.contains("Need assignment"));
        assert!(!body.contains(SECRET));
        assert!(!body.contains("ffff"));
    }

    #[tokio::test]
    async fn test_ping_with_valid_signature() {
        let app = router(config(Some(SECRET)), Arc::new(MockTracker::default()));
        let payload = br#"{"zen":"Design for failure.","hook_id":1}"#.to_vec();
        let signature = sign(&payload, SECRET, Digest::Sha1);

        let (status, body) = send(
            app,
            post(Some("ping"), payload, Some((SIGNATURE_HEADER, signature))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Ping successful");
    }

    #[tokio::test]
    async fn test_bad_signature_rejected() {
        let app = router(config(Some(SECRET)), Arc::new(MockTracker::default()));
        let payload = br#"{"zen":"x"}"#.to_vec();
        let signature = sign(&payload, "wrong", Digest::Sha256);

        let (status, _) = send(
            app,
            post(Some("ping"), payload, Some((SIGNATURE_256_HEADER, signature))),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_missing_signature_rejected_when_secret_set() {
        let app = router(config(Some(SECRET)), Arc::new(MockTracker::default()));
        let (status, _) = send(app, post(Some("ping"), b"{}".to_vec(), None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_no_secret_skips_verification() {
        let app = router(config(None), Arc::new(MockTracker::default()));
        let (status, _) = send(app, post(Some("ping"), b"{}".to_vec(), None)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_or_missing_event() {
        let app = router(config(None), Arc::new(MockTracker::default()));
        let (status, _) = send(app.clone(), post(Some("pong"), b"{}".to_vec(), None)).await;
        assert_eq!(status, StatusCode::NOT_IMPLEMENTED);

        let (status, _) = send(app, post(None, b"{}".to_vec(), None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_issues_event_updates_issue() {
        let tracker = Arc::new(MockTracker::default());
        let app = router(config(Some(SECRET)), tracker.clone());
        let payload = issues_payload("opened");
        let signature = sign(&payload, SECRET, Digest::Sha256);

        let (status, body) = send(
            app,
            post(Some("issues"), payload, Some((SIGNATURE_256_HEADER, signature))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Issue 7 (Use requests) was successfully updated.");

        let updates = tracker.updates.lock().unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].0, 7);
        assert_eq!(
            updates[0].1.assignees,
            Some(vec!["Codertocat".to_string(), "ghia-anna".to_string()])
        );
        assert_eq!(updates[0].1.labels, None);
    }

    #[tokio::test]
    async fn test_issues_event_with_ignored_action() {
        let tracker = Arc::new(MockTracker::default());
        let app = router(config(None), tracker.clone());

        let (status, _) = send(app, post(Some("issues"), issues_payload("closed"), None)).await;
        assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
        assert!(tracker.updates.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_issues_payload() {
        let app = router(config(None), Arc::new(MockTracker::default()));
        let payload = serde_json::to_vec(&json!({"action": "opened", "issue": {"number": 1}})).unwrap();
        let (status, _) = send(app, post(Some("issues"), payload, None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    fn failing(status: Option<u16>) -> Arc<MockTracker> {
        Arc::new(MockTracker {
            fail_status: status,
            ..MockTracker::default()
        })
    }

    #[tokio::test]
    async fn test_tracker_failure_is_bad_gateway() {
        let app = router(config(None), failing(Some(404)));
        let (status, body) = send(app, post(Some("issues"), issues_payload("edited"), None)).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);

        let body: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert!(body["error"].as_str().unwrap().starts_with("could not update issue"));
        assert_eq!(body["reason"], "not_found");
    }

    #[tokio::test]
    async fn test_rate_limited_tracker_reports_reason() {
        let app = router(config(None), failing(Some(429)));
        let (status, body) = send(app, post(Some("issues"), issues_payload("edited"), None)).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);

        let body: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["reason"], "rate_limited");
    }

    #[tokio::test]
    async fn test_unclassified_tracker_failure_has_no_reason() {
        let app = router(config(None), failing(Some(500)));
        let (_, body) = send(app, post(Some("issues"), issues_payload("edited"), None)).await;

        let body: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert!(body.get("reason").is_none());
    }

    fn post_both(payload: Vec<u8>, sha256: String, sha1: String) -> Request<Body> {
        Request::post("/")
            .header(EVENT_HEADER, "ping")
            .header(SIGNATURE_256_HEADER, sha256)
            .header(SIGNATURE_HEADER, sha1)
            .body(Body::from(payload))
            .unwrap()
    }

    #[tokio::test]
    async fn test_sha256_header_wins_over_sha1() {
        let app = router(config(Some(SECRET)), Arc::new(MockTracker::default()));
        let payload = br#"{"zen":"Keep it logically awesome."}"#.to_vec();
        let good = sign(&payload, SECRET, Digest::Sha256);
        let bad = sign(&payload, "wrong", Digest::Sha1);

        let (status, body) = send(app, post_both(payload, good, bad)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Ping successful");
    }

    #[tokio::test]
    async fn test_bad_sha256_not_rescued_by_good_sha1() {
        let app = router(config(Some(SECRET)), Arc::new(MockTracker::default()));
        let payload = br#"{"zen":"Keep it logically awesome."}"#.to_vec();
        let bad = sign(&payload, "wrong", Digest::Sha256);
        let good = sign(&payload, SECRET, Digest::Sha1);

        let (status, _) = send(app, post_both(payload, bad, good)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
