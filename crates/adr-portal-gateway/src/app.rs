//! Router assembly and shared state.

use std::any::Any;
use std::sync::Arc;
use std::time::Instant;

use adr_portal_core::{
    AiAssistant, ChatRouter, CompletionService, DeadlineCalendar, OpenRouterCompletion,
    PortalConfig, PortalStore,
};
use axum::body::Body;
use axum::http::{Method, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{self, CorsLayer};

use crate::error::ApiError;
use crate::handlers::{self, adr, calendar, chat};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<PortalConfig>,
    pub store: Arc<PortalStore>,
    pub calendar: Arc<DeadlineCalendar>,
    pub router: Arc<ChatRouter>,
    /// Absent when no completion-service key is configured.
    pub assistant: Option<Arc<AiAssistant>>,
}

impl AppState {
    /// Fresh store and services; the assistant talks to OpenRouter when a key is configured.
    pub fn new(config: PortalConfig) -> Self {
        let service = config.ai_api_key.as_deref().map(|key| {
            let client = OpenRouterCompletion::new(key, &config.ai);
            tracing::info!(
                endpoint = client.endpoint(),
                model = client.model(),
                "[gateway] AI assistant enabled"
            );
            Arc::new(client) as Arc<dyn CompletionService>
        });
        if service.is_none() {
            tracing::warn!("[gateway] no OPENROUTER_API_KEY set; /api/ai-chat will answer 503");
        }
        Self::with_completion(config, service)
    }

    pub fn with_completion(config: PortalConfig, service: Option<Arc<dyn CompletionService>>) -> Self {
        let store = Arc::new(PortalStore::new());
        let calendar = Arc::new(DeadlineCalendar::new(Arc::clone(&store), config.seed.clone()));
        let router = Arc::new(ChatRouter::new(
            Arc::clone(&calendar),
            Arc::clone(&store),
            config.deadline_preview,
        ));
        let assistant = service
            .map(|service| Arc::new(AiAssistant::new(service, Arc::clone(&router), &config.ai)));
        Self {
            config: Arc::new(config),
            store,
            calendar,
            router,
            assistant,
        }
    }
}

pub fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(cors::Any);

    let api = Router::new()
        .route("/health", get(handlers::health))
        .route("/api/adr", get(adr::list_reports).post(adr::submit_report))
        .route("/api/adr/statistics", get(adr::report_statistics))
        .route("/api/adr/:id", get(adr::get_report))
        .route("/api/chat", post(chat::chat))
        .route("/api/chat/history", get(chat::chat_history))
        .route("/api/ai-chat", post(chat::ai_chat))
        .route("/api/calendar", get(calendar::list_events).post(calendar::create_event))
        .route("/api/calendar/upcoming", get(calendar::upcoming_events))
        .route(
            "/api/calendar/:id",
            get(calendar::get_event).delete(calendar::delete_event),
        )
        .with_state(state);

    with_layers(api).layer(cors)
}

/// Panics become 500 responses before the request log sees them.
fn with_layers(router: Router) -> Router {
    router
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(axum::middleware::from_fn(log_request))
}

async fn log_request(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();
    let response = next.run(request).await;
    tracing::info!(
        "[gateway] {} {} -> {} ({} ms)",
        method,
        path,
        response.status().as_u16(),
        started.elapsed().as_millis()
    );
    response
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| err.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "handler panicked".to_string());
    ApiError::Internal(detail).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use adr_portal_core::{CompletionError, SeedConfig};
    use adr_portal_core::models::ConversationTurn;
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_config(seed: bool) -> PortalConfig {
        PortalConfig {
            seed: SeedConfig { enabled: seed, ..SeedConfig::default() },
            ..PortalConfig::default()
        }
    }

    fn test_state() -> AppState {
        AppState::with_completion(test_config(false), None)
    }

    struct FixedCompletion(Result<&'static str, ()>);

    #[async_trait]
    impl CompletionService for FixedCompletion {
        async fn complete(&self, _messages: &[ConversationTurn]) -> Result<String, CompletionError> {
            match self.0 {
                Ok(text) => Ok(text.to_string()),
                Err(()) => Err(CompletionError::Status { status: 503, body: "overloaded".into() }),
            }
        }
    }

    fn ai_state(result: Result<&'static str, ()>) -> AppState {
        AppState::with_completion(test_config(false), Some(Arc::new(FixedCompletion(result))))
    }

    async fn send(state: &AppState, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(v) => builder
                .header("content-type", "application/json")
                .body(Body::from(v.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let res = build_app(state.clone()).oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
        };
        (status, json)
    }

    fn report_body() -> Value {
        json!({
            "patientInitials": "M.D.",
            "ageAtEvent": 42,
            "gender": "female",
            "reactionStartDate": "2026-10-01",
            "reactionDescription": "Angioedema within an hour of the second dose",
            "seriousness": ["life-threatening"],
            "outcome": "recovered",
            "suspectedMedications": [{ "name": "Lisinopril", "doseUsed": "10 mg" }],
            "reporterName": "Dr. P. Shah",
            "reporterEmail": "p.shah@example.org",
            "reporterOccupation": "physician",
            "reportDate": "2026-10-02"
        })
    }

    #[derive(Clone, Default)]
    struct CapturedLog(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn panicking_handler_is_logged_as_500() {
        use tracing_subscriber::layer::SubscriberExt;

        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::registry().with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(move || writer.clone()),
        );
        let _guard = tracing::subscriber::set_default(subscriber);

        async fn boom() -> &'static str {
            panic!("store exploded")
        }
        let app = with_layers(Router::new().route("/boom", get(boom)));
        let req = Request::builder().uri("/boom").body(Body::empty()).unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["message"], "An internal error occurred");

        let lines = String::from_utf8(log.0.lock().unwrap().clone()).unwrap();
        assert!(lines.contains("GET /boom -> 500"), "request log: {}", lines);
        assert!(!lines.contains("An internal error occurred"));
    }

    #[tokio::test]
    async fn health_is_ok() {
        let state = test_state();
        let (status, body) = send(&state, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::String("OK".into()));
    }

    #[tokio::test]
    async fn report_ids_increase_across_submissions() {
        let state = test_state();
        let (s1, b1) = send(&state, "POST", "/api/adr", Some(report_body())).await;
        let (s2, b2) = send(&state, "POST", "/api/adr", Some(report_body())).await;
        assert_eq!(s1, StatusCode::CREATED);
        assert_eq!(s2, StatusCode::CREATED);
        assert_eq!(b1["success"], true);
        assert_eq!(b1["message"], "ADR report submitted successfully");
        assert!(b2["reportId"].as_u64().unwrap() > b1["reportId"].as_u64().unwrap());

        let (_, one) = send(&state, "GET", "/api/adr/1", None).await;
        assert_eq!(one["patientInitials"], "M.D.");
        assert_eq!(one["ageAtEvent"], "42");
        assert_eq!(one["suspectedMedicationName"], "Lisinopril");
    }

    #[tokio::test]
    async fn invalid_report_is_rejected_and_not_stored() {
        let state = test_state();
        let mut body = report_body();
        body["reporterEmail"] = json!("");
        let (status, json) = send(&state, "POST", "/api/adr", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);
        assert_eq!(json["errors"][0]["field"], "reporterEmail");

        let (_, list) = send(&state, "GET", "/api/adr", None).await;
        assert_eq!(list, json!([]));
    }

    #[tokio::test]
    async fn malformed_json_is_a_400_not_a_422() {
        let state = test_state();
        let req = Request::builder()
            .method("POST")
            .uri("/api/adr")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let res = build_app(state.clone()).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let mut wrong_type = report_body();
        wrong_type["seriousness"] = json!("death");
        let (status, json) = send(&state, "POST", "/api/adr", Some(wrong_type)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["errors"][0]["field"], "body");
    }

    #[tokio::test]
    async fn report_lookup_by_id() {
        let state = test_state();
        let (status, json) = send(&state, "GET", "/api/adr/77", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["message"], "Report not found");
        let (status, _) = send(&state, "GET", "/api/adr/abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn statistics_group_by_drug() {
        let state = test_state();
        send(&state, "POST", "/api/adr", Some(report_body())).await;
        let mut other = report_body();
        other["suspectedMedications"] = json!([{ "name": "Warfarin" }]);
        other["seriousness"] = json!([]);
        send(&state, "POST", "/api/adr", Some(other)).await;
        send(&state, "POST", "/api/adr", Some(report_body())).await;

        let (status, stats) = send(&state, "GET", "/api/adr/statistics", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats[0]["drugName"], "Lisinopril");
        assert_eq!(stats[0]["totalReports"], 2);
        assert_eq!(stats[0]["seriousCount"], 2);
        assert_eq!(stats[1]["drugName"], "Warfarin");
        assert_eq!(stats[1]["nonSeriousCount"], 1);
    }

    #[tokio::test]
    async fn chat_answers_adr_definition_and_logs_it() {
        let state = test_state();
        let (status, json) = send(&state, "POST", "/api/chat", Some(json!({ "message": "what is adr" }))).await;
        assert_eq!(status, StatusCode::OK);
        let text = json["message"].as_str().unwrap();
        assert!(text.contains("Adverse Drug Reaction"));
        assert!(!json["options"].as_array().unwrap().is_empty());

        let (_, history) = send(&state, "GET", "/api/chat/history", None).await;
        let history = history.as_array().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0]["message"], "what is adr");
        assert_eq!(history[0]["response"], text);
    }

    #[tokio::test]
    async fn chat_without_events_reports_no_deadlines() {
        let state = test_state();
        let (status, json) =
            send(&state, "POST", "/api/chat", Some(json!({ "message": "upcoming deadlines" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["message"].as_str().unwrap().contains("don't have any upcoming deadlines"));
    }

    #[tokio::test]
    async fn chat_rejects_bad_message() {
        let state = test_state();
        for body in [json!({ "message": "" }), json!({ "message": 5 }), json!({})] {
            let (status, json) = send(&state, "POST", "/api/chat", Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(json["message"], "Invalid message format");
        }
        let (_, history) = send(&state, "GET", "/api/chat/history", None).await;
        assert_eq!(history, json!([]));
    }

    #[tokio::test]
    async fn calendar_round_trip_and_delete() {
        let state = test_state();
        let (status, created) = send(
            &state,
            "POST",
            "/api/calendar",
            Some(json!({
                "title": "Signal review board",
                "eventDate": "2030-03-01T09:30:00+05:30",
                "eventType": "primary",
                "description": "Quarterly signal review"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["message"], "Calendar event created successfully");
        let id = created["eventId"].as_u64().unwrap();

        let (status, event) = send(&state, "GET", &format!("/api/calendar/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(event["title"], "Signal review board");
        assert_eq!(event["eventType"], "primary");
        assert_eq!(event["description"], "Quarterly signal review");
        let at: chrono::DateTime<chrono::Utc> = event["eventDate"].as_str().unwrap().parse().unwrap();
        let expected: chrono::DateTime<chrono::Utc> = "2030-03-01T04:00:00Z".parse().unwrap();
        assert_eq!(at, expected);

        let (status, deleted) = send(&state, "DELETE", &format!("/api/calendar/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(deleted["message"], "Event deleted successfully");
        let (status, _) = send(&state, "GET", &format!("/api/calendar/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, json) = send(&state, "DELETE", &format!("/api/calendar/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["message"], "Event not found");
    }

    #[tokio::test]
    async fn calendar_rejects_bad_input() {
        let state = test_state();
        let (status, json) = send(
            &state,
            "POST",
            "/api/calendar",
            Some(json!({ "title": "", "eventDate": "soon", "eventType": "urgent" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["errors"].as_array().unwrap().len(), 3);

        let (status, json) = send(&state, "GET", "/api/calendar/xyz", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Invalid event ID");
        let (status, _) = send(&state, "DELETE", "/api/calendar/-1", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn upcoming_is_capped_sorted_and_future_only() {
        let state = AppState::with_completion(test_config(true), None);
        state.calendar.seed(chrono::Utc::now());
        send(
            &state,
            "POST",
            "/api/calendar",
            Some(json!({ "title": "Past audit", "eventDate": "2020-01-01", "eventType": "muted" })),
        )
        .await;

        let (status, events) = send(&state, "GET", "/api/calendar/upcoming?limit=2", None).await;
        assert_eq!(status, StatusCode::OK);
        let events = events.as_array().unwrap();
        assert_eq!(events.len(), 2);
        let now = chrono::Utc::now();
        let dates: Vec<chrono::DateTime<chrono::Utc>> = events
            .iter()
            .map(|e| e["eventDate"].as_str().unwrap().parse().unwrap())
            .collect();
        assert!(dates.iter().all(|d| *d >= now - chrono::Duration::seconds(5)));
        assert!(dates[0] <= dates[1]);

        let (_, all) = send(&state, "GET", "/api/calendar/upcoming", None).await;
        assert_eq!(all.as_array().unwrap().len(), 3);
        let (_, every) = send(&state, "GET", "/api/calendar", None).await;
        assert_eq!(every.as_array().unwrap().len(), 4);

        let (status, _) = send(&state, "GET", "/api/calendar/upcoming?limit=two", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn repeated_limit_gets_json_error_body() {
        let state = test_state();
        let (status, json) =
            send(&state, "GET", "/api/calendar/upcoming?limit=1&limit=2", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Invalid limit");
    }

    #[tokio::test]
    async fn ai_chat_without_key_is_unavailable() {
        let state = test_state();
        let (status, json) = send(&state, "POST", "/api/ai-chat", Some(json!({ "message": "hi" }))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn ai_chat_returns_service_text_with_conversation_id() {
        let state = ai_state(Ok("Use MedDRA preferred terms."));
        let (status, json) = send(
            &state,
            "POST",
            "/api/ai-chat",
            Some(json!({
                "message": "How do I code this reaction?",
                "conversationHistory": [{ "role": "user", "content": "hello" }, { "role": "assistant", "content": "hi" }]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["response"], "Use MedDRA preferred terms.");
        assert_eq!(json["degraded"], false);
        assert!(json.get("warning").is_none());
        let id = json["conversationId"].as_str().unwrap();
        assert!(uuid::Uuid::parse_str(id).is_ok());
    }

    #[tokio::test]
    async fn ai_chat_degrades_on_service_failure() {
        let state = ai_state(Err(()));
        let (status, json) = send(
            &state,
            "POST",
            "/api/ai-chat",
            Some(json!({ "message": "signal detection methods?" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["degraded"], true);
        assert_eq!(json["warning"], "connection_error");
        assert!(json["response"].as_str().unwrap().contains("Proportional Reporting Ratio"));
    }

    #[tokio::test]
    async fn ai_chat_accepts_null_history() {
        let state = ai_state(Ok("Use disproportionality analysis."));
        let (status, json) = send(
            &state,
            "POST",
            "/api/ai-chat",
            Some(json!({ "message": "signal detection?", "conversationHistory": null })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["response"], "Use disproportionality analysis.");
    }

    #[tokio::test]
    async fn ai_chat_reports_malformed_history_under_its_own_field() {
        let state = ai_state(Ok("unused"));
        let (status, json) = send(
            &state,
            "POST",
            "/api/ai-chat",
            Some(json!({
                "message": "signal detection?",
                "conversationHistory": [{ "role": "moderator", "content": "hi" }]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["errors"][0]["field"], "conversationHistory");
        assert_ne!(json["message"], "Message is required");
    }

    #[tokio::test]
    async fn ai_chat_requires_message() {
        let state = ai_state(Ok("unused"));
        for body in [json!({}), json!({ "message": 12 }), json!({ "message": "  " })] {
            let (status, json) = send(&state, "POST", "/api/ai-chat", Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(json["message"], "Message is required");
        }
    }
}
