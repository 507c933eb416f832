//! Ingestion endpoint: `POST {gateway.events_path}`.
//!
//! One route receives three payload families. JSON bodies are Events API
//! envelopes; form bodies carry either an interaction (`payload=<json>`) or a
//! slash command (`command=/x`). Everything the platform sends gets a fast
//! 200 so it does not redeliver; the outcome travels in the
//! `x-switchboard-disposition` header and in metrics. Only a bad signature
//! (401) and an unsupported media type (415) are refused.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{RawQuery, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use switchboard_core::{Activity, TurnState};
use switchboard_ingest::{
    translate_command, translate_event, translate_interaction, Classifier, DedupKey, TranslateError,
};
use switchboard_protocol::{
    decode_envelope, decode_form, EventCallback, EventEnvelope, InboundForm, ProtocolError,
};
use tracing::{debug, error, info, warn};

use crate::app::AppState;
use crate::metrics::ReceivedLabels;
use crate::queue::{EnqueueError, Job};

pub const DISPOSITION_HEADER: &str = "x-switchboard-disposition";
const INTEGRATION_HEADER: &str = "x-switchboard-integration";
const DEBUG_HEADER: &str = "x-switchboard-debug";
const RETRY_NUM_HEADER: &str = "x-slack-retry-num";
const RETRY_REASON_HEADER: &str = "x-slack-retry-reason";

/// Disposition labels that are not classifier outcomes.
mod label {
    pub const ALLOWED: &str = "allowed";
    pub const CHALLENGE: &str = "challenge";
    pub const RATE_LIMITED: &str = "rate_limited";
    pub const DECODE_ERROR: &str = "decode_error";
    pub const TRANSLATION_FAILED: &str = "translation_failed";
    pub const UNRECOGNIZED: &str = "unrecognized";
    pub const SIGNATURE_INVALID: &str = "signature_invalid";
    pub const UNSUPPORTED_MEDIA: &str = "unsupported_media_type";
    pub const QUEUE_FULL: &str = "queue_full";
    pub const QUEUE_CLOSED: &str = "queue_closed";
}

// ── Request metadata ─────────────────────────────────────────────────────────

/// Per-request metadata that rides into `TurnState` and metrics labels.
#[derive(Debug, Default, Clone, PartialEq)]
struct RequestMeta {
    integration_id: Option<String>,
    retry_num: Option<u32>,
    retry_reason: Option<String>,
    debug: bool,
}

impl RequestMeta {
    fn from_parts(headers: &HeaderMap, query: Option<&str>) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let mut meta = RequestMeta {
            integration_id: header(INTEGRATION_HEADER).map(String::from),
            retry_num: header(RETRY_NUM_HEADER).and_then(|v| v.parse().ok()),
            retry_reason: header(RETRY_REASON_HEADER).map(String::from),
            debug: header(DEBUG_HEADER).is_some_and(is_truthy),
        };

        // The query string wins over headers for the integration id.
        for (key, value) in url::form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
            match key.as_ref() {
                "integration_id" if !value.is_empty() => {
                    meta.integration_id = Some(value.into_owned())
                }
                "debug" => meta.debug = meta.debug || is_truthy(&value),
                _ => {}
            }
        }
        meta
    }

    fn turn_state(&self) -> TurnState {
        TurnState {
            debug: self.debug,
            integration_id: self.integration_id.clone(),
            retry_num: self.retry_num,
            retry_reason: self.retry_reason.clone(),
            ..TurnState::default()
        }
    }

    fn record(&self, state: &AppState, category: &str, event_type: &str, team_id: &str, disposition: &str) {
        state.metrics.webhook_received(ReceivedLabels {
            category,
            event_type,
            team_id,
            disposition,
            integration: self.integration_id.as_deref().unwrap_or("-"),
            retry: self.retry_num.is_some(),
        });
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContentKind {
    Json,
    Form,
}

fn content_kind(headers: &HeaderMap) -> Option<ContentKind> {
    let value = headers.get(CONTENT_TYPE)?.to_str().ok()?;
    let mime = value.split(';').next()?.trim().to_ascii_lowercase();
    match mime.as_str() {
        "application/json" => Some(ContentKind::Json),
        "application/x-www-form-urlencoded" => Some(ContentKind::Form),
        _ => None,
    }
}

// ── Handler ──────────────────────────────────────────────────────────────────

/// POST {events_path}
pub async fn events_handler(
    State(state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let meta = RequestMeta::from_parts(&headers, query.as_deref());

    if let Some(verifier) = &state.verifier {
        if let Err(e) = verifier.verify(&headers, &body, chrono::Utc::now().timestamp()) {
            warn!(reason = %e, bytes = body.len(), "rejected webhook with invalid signature");
            meta.record(&state, "unknown", "-", "-", label::SIGNATURE_INVALID);
            return (StatusCode::UNAUTHORIZED, [(DISPOSITION_HEADER, label::SIGNATURE_INVALID)])
                .into_response();
        }
    }

    match content_kind(&headers) {
        Some(ContentKind::Json) => ingest_json(&state, &meta, &body),
        Some(ContentKind::Form) => ingest_form(&state, &meta, &body),
        None => {
            let content_type = headers
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-");
            warn!(content_type, "unsupported webhook content type");
            meta.record(&state, "unknown", "-", "-", label::UNSUPPORTED_MEDIA);
            (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                [(DISPOSITION_HEADER, label::UNSUPPORTED_MEDIA)],
            )
                .into_response()
        }
    }
}

fn ingest_json(state: &AppState, meta: &RequestMeta, body: &[u8]) -> Response {
    let decoded = match decode_envelope(body) {
        Ok(decoded) => decoded,
        Err(e) => return decode_failed(state, meta, "event", &e, body),
    };

    match decoded.envelope {
        EventEnvelope::UrlVerification(verification) => {
            info!("answering url_verification challenge");
            meta.record(state, "url_verification", "url_verification", "-", label::CHALLENGE);
            ack(label::CHALLENGE, verification.challenge)
        }
        EventEnvelope::AppRateLimited(limited) => {
            warn!(
                team_id = limited.team_id.as_deref().unwrap_or("-"),
                minute_rate_limited = limited.minute_rate_limited,
                "platform is rate limiting event delivery"
            );
            meta.record(
                state,
                "rate_limited",
                "app_rate_limited",
                limited.team_id.as_deref().unwrap_or("-"),
                label::RATE_LIMITED,
            );
            ack(label::RATE_LIMITED, "")
        }
        EventEnvelope::EventCallback(callback) => ingest_event(state, meta, &callback, &decoded.raw, body),
    }
}

fn ingest_event(
    state: &AppState,
    meta: &RequestMeta,
    callback: &EventCallback,
    raw: &serde_json::Value,
    body: &[u8],
) -> Response {
    let event_type = callback.event.event_type();
    let team_id = callback.team_id.as_deref().unwrap_or("-");

    let key = Classifier::dedup_key(callback, body);
    let disposition = state.classifier.classify_event(&callback.event, &key);
    if !disposition.is_allowed() {
        debug!(
            event_type,
            team_id,
            event_id = callback.event_id.as_deref().unwrap_or("-"),
            retry_num = meta.retry_num,
            %disposition,
            "event acknowledged without processing"
        );
        meta.record(state, "event", event_type, team_id, disposition.label());
        return ack(disposition.label(), "");
    }

    accept(
        state,
        meta,
        "event",
        event_type,
        team_id,
        translate_event(callback, raw),
        Some(&key),
    )
}

fn ingest_form(state: &AppState, meta: &RequestMeta, body: &[u8]) -> Response {
    match decode_form(body) {
        Err(e) => decode_failed(state, meta, "form", &e, body),
        Ok(InboundForm::Interaction { payload, raw }) => {
            let kind = payload.kind.as_str();
            let team_id = payload.team_id().unwrap_or("-");
            accept(
                state,
                meta,
                "interaction",
                kind,
                team_id,
                translate_interaction(&payload, &raw),
                None,
            )
        }
        Ok(InboundForm::Command { command, raw }) => {
            let team_id = command.team_id.as_deref().unwrap_or("-");
            accept(
                state,
                meta,
                "command",
                &command.command,
                team_id,
                translate_command(&command, &raw),
                None,
            )
        }
        Ok(InboundForm::Unrecognized { keys }) => {
            warn!(?keys, "form body carries neither payload nor command");
            meta.record(state, "form", "-", "-", label::UNRECOGNIZED);
            ack(
                label::UNRECOGNIZED,
                "unrecognized form body: expected a `payload` or `command` field",
            )
        }
    }
}

/// Hand a translated activity to the workers, or log why there is none.
///
/// `dedup_key` is the key the classifier recorded for this delivery. If the
/// job cannot be queued the key is released, so the platform's redelivery is
/// processed instead of being reported as a duplicate.
fn accept(
    state: &AppState,
    meta: &RequestMeta,
    category: &'static str,
    event_type: &str,
    team_id: &str,
    translated: Result<Activity, TranslateError>,
    dedup_key: Option<&DedupKey>,
) -> Response {
    let activity = match translated {
        Ok(activity) => activity,
        Err(e) => {
            warn!(category, event_type, team_id, error = %e, "payload could not be translated");
            meta.record(state, category, event_type, team_id, label::TRANSLATION_FAILED);
            return ack(label::TRANSLATION_FAILED, "");
        }
    };

    let conversation = activity.conversation.clone();
    let job = Job {
        activity,
        state: meta.turn_state(),
        category,
    };
    let disposition = match state.queue.enqueue(job) {
        Ok(shard) => {
            debug!(category, event_type, %conversation, shard, "activity queued");
            label::ALLOWED
        }
        Err(e) => {
            if let Some(key) = dedup_key {
                state.classifier.deduplicator().forget(key);
            }
            error!(category, event_type, %conversation, error = %e, "dropping activity");
            state.metrics.queue_rejected(category, e.reason());
            match e {
                EnqueueError::Full { .. } => label::QUEUE_FULL,
                EnqueueError::Closed { .. } => label::QUEUE_CLOSED,
            }
        }
    };

    meta.record(state, category, event_type, team_id, disposition);
    ack(disposition, "")
}

/// Log an undecodable body without exposing its content, then acknowledge.
fn decode_failed(
    state: &AppState,
    meta: &RequestMeta,
    category: &str,
    error: &ProtocolError,
    body: &[u8],
) -> Response {
    let protected = state.redactor.protect(body);
    warn!(
        category,
        error = %describe(error),
        payload_sha256 = %protected.sha256,
        payload_len = protected.len,
        payload_sealed = protected.sealed.as_deref().unwrap_or("-"),
        "undecodable webhook payload"
    );
    meta.record(state, category, "-", "-", label::DECODE_ERROR);
    ack(label::DECODE_ERROR, "")
}

/// serde messages can quote payload values; keep only the position.
fn describe(error: &ProtocolError) -> String {
    match error {
        ProtocolError::Json(e) => format!("{:?} error at line {} column {}", e.classify(), e.line(), e.column()),
        other => other.to_string(),
    }
}

fn ack(disposition: &'static str, body: impl Into<String>) -> Response {
    (
        StatusCode::OK,
        [
            ("content-type", "text/plain; charset=utf-8"),
            (DISPOSITION_HEADER, disposition),
        ],
        body.into(),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{build_router, AppState};
    use crate::metrics::Metrics;
    use crate::redact::Redactor;
    use crate::signature::{tests::sign, SignatureVerifier};
    use axum::body::Body;
    use axum::http::Request;
    use axum::Router;
    use serde_json::json;
    use switchboard_core::config::SwitchboardConfig;
    use switchboard_core::ActivityType;
    use tokio::sync::mpsc;
    use tower::ServiceExt;

    struct Harness {
        app: Router,
        state: Arc<AppState>,
        jobs: mpsc::Receiver<Job>,
    }

    fn harness(configure: impl FnOnce(&mut SwitchboardConfig)) -> Harness {
        let mut config = SwitchboardConfig::default();
        config.worker.shards = 1;
        configure(&mut config);
        let metrics = Arc::new(Metrics::new().expect("metrics"));
        let (state, mut receivers) = AppState::new(config, metrics, Redactor::digest_only(), true);
        let state = Arc::new(state);
        Harness {
            app: build_router(Arc::clone(&state)),
            state,
            jobs: receivers.remove(0),
        }
    }

    async fn post(
        app: &Router,
        content_type: &str,
        extra: &[(&str, &str)],
        body: impl Into<Body>,
    ) -> (StatusCode, String, String) {
        let mut request = Request::builder()
            .method("POST")
            .uri("/slack/events")
            .header("content-type", content_type);
        for (name, value) in extra {
            request = request.header(*name, *value);
        }
        let response = app
            .clone()
            .oneshot(request.body(body.into()).expect("request"))
            .await
            .expect("response");

        let status = response.status();
        let disposition = response
            .headers()
            .get(DISPOSITION_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        (status, disposition, String::from_utf8_lossy(&bytes).into_owned())
    }

    fn message_event(event_id: &str) -> String {
        json!({
            "type": "event_callback", "team_id": "T1", "api_app_id": "A1", "event_id": event_id,
            "event_time": 1700000000,
            "event": {"type": "message", "channel": "C1", "user": "U1", "text": "hello",
                      "ts": "1700000001.000200", "thread_ts": "1700000000.000100"}
        })
        .to_string()
    }

    #[tokio::test]
    async fn url_verification_echoes_challenge() {
        let h = harness(|_| {});
        let body = r#"{"type":"url_verification","challenge":"3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P","token":"t"}"#;
        let (status, disposition, text) = post(&h.app, "application/json", &[], body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(disposition, "challenge");
        assert_eq!(text, "3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P");
    }

    #[tokio::test]
    async fn threaded_message_is_translated_and_queued() {
        let mut h = harness(|_| {});
        let (status, disposition, _) = post(&h.app, "application/json", &[], message_event("Ev1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(disposition, "allowed");

        let job = h.jobs.try_recv().expect("queued job");
        assert_eq!(job.category, "event");
        assert_eq!(job.activity.activity_type, ActivityType::Message);
        assert_eq!(job.activity.conversation.as_str(), "C1:1700000000.000100");
        assert_eq!(job.activity.text.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn redelivery_is_acknowledged_but_not_processed() {
        let mut h = harness(|_| {});
        let body = message_event("Ev2");
        let (_, first, _) = post(&h.app, "application/json", &[], body.clone()).await;
        let (status, second, _) = post(
            &h.app,
            "application/json",
            &[("x-slack-retry-num", "1"), ("x-slack-retry-reason", "http_timeout")],
            body,
        )
        .await;

        assert_eq!(first, "allowed");
        assert_eq!(status, StatusCode::OK);
        assert_eq!(second, "duplicate_payload");
        assert!(h.jobs.try_recv().is_ok());
        assert!(h.jobs.try_recv().is_err());
        assert_eq!(h.state.metrics.received_count("event", "duplicate_payload"), 1.0);
    }

    #[tokio::test]
    async fn bot_echo_is_ignored_by_design() {
        let mut h = harness(|_| {});
        let body = json!({
            "type": "event_callback", "team_id": "T1", "event_id": "Ev3",
            "event": {"type": "message", "channel": "C1", "bot_id": "B1", "text": "my own reply", "ts": "2.0"}
        })
        .to_string();
        let (status, disposition, _) = post(&h.app, "application/json", &[], body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(disposition, "ignored_by_design");
        assert!(h.jobs.try_recv().is_err());
        // The echo did not take the dedup slot.
        assert_eq!(h.state.classifier.deduplicator().len(), 0);
    }

    #[tokio::test]
    async fn disabled_event_type_is_ignored_by_config() {
        let h = harness(|c| c.events.disabled_types = vec!["reaction_added".into()]);
        let body = json!({
            "type": "event_callback", "team_id": "T1", "event_id": "Ev4",
            "event": {"type": "reaction_added", "user": "U1", "reaction": "eyes",
                      "item": {"type": "message", "channel": "C1", "ts": "1.0"}}
        })
        .to_string();
        let (_, disposition, _) = post(&h.app, "application/json", &[], body).await;
        assert_eq!(disposition, "ignored_by_config");
    }

    #[tokio::test]
    async fn request_metadata_reaches_turn_state() {
        let mut h = harness(|_| {});
        let request = Request::builder()
            .method("POST")
            .uri("/slack/events?integration_id=bot-7&debug=true")
            .header("content-type", "application/json; charset=utf-8")
            .header("x-slack-retry-num", "2")
            .header("x-slack-retry-reason", "http_error")
            .body(Body::from(message_event("Ev5")))
            .expect("request");
        let response = h.app.clone().oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let job = h.jobs.try_recv().expect("queued job");
        assert_eq!(job.state.integration_id.as_deref(), Some("bot-7"));
        assert_eq!(job.state.retry_num, Some(2));
        assert_eq!(job.state.retry_reason.as_deref(), Some("http_error"));
        assert!(job.state.debug);
    }

    #[tokio::test]
    async fn malformed_json_is_acknowledged() {
        let mut h = harness(|_| {});
        let (status, disposition, _) = post(&h.app, "application/json", &[], "{not json").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(disposition, "decode_error");
        assert!(h.jobs.try_recv().is_err());
    }

    #[tokio::test]
    async fn untranslatable_event_is_acknowledged() {
        let h = harness(|_| {});
        let body = json!({
            "type": "event_callback", "event_id": "Ev6",
            "event": {"type": "pin_added"}
        })
        .to_string();
        let (status, disposition, _) = post(&h.app, "application/json", &[], body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(disposition, "translation_failed");
    }

    #[tokio::test]
    async fn rate_limited_notice_is_acknowledged() {
        let h = harness(|_| {});
        let body = r#"{"type":"app_rate_limited","team_id":"T1","minute_rate_limited":1518467820,"api_app_id":"A1"}"#;
        let (status, disposition, _) = post(&h.app, "application/json", &[], body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(disposition, "rate_limited");
    }

    #[tokio::test]
    async fn interaction_form_is_queued() {
        let mut h = harness(|_| {});
        let payload = json!({
            "type": "block_actions",
            "team": {"id": "T1"},
            "user": {"id": "U1"},
            "channel": {"id": "C1"},
            "container": {"type": "message", "message_ts": "5.0", "channel_id": "C1"},
            "response_url": "https://hooks.example.com/actions/1",
            "actions": [{"action_id": "approve", "type": "button", "value": "approve"}]
        })
        .to_string();
        let body: String = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("payload", &payload)
            .finish();

        let (status, disposition, _) =
            post(&h.app, "application/x-www-form-urlencoded", &[], body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(disposition, "allowed");

        let job = h.jobs.try_recv().expect("queued job");
        assert_eq!(job.category, "interaction");
        assert_eq!(job.activity.activity_type, ActivityType::Message);
        assert_eq!(job.activity.text.as_deref(), Some("approve"));
        assert_eq!(job.activity.response_url(), Some("https://hooks.example.com/actions/1"));
    }

    #[tokio::test]
    async fn slash_command_form_is_queued() {
        let mut h = harness(|_| {});
        let body = "command=%2Fdeploy&text=prod&team_id=T1&channel_id=C9&user_id=U1";
        let (_, disposition, _) = post(&h.app, "application/x-www-form-urlencoded", &[], body).await;
        assert_eq!(disposition, "allowed");

        let job = h.jobs.try_recv().expect("queued job");
        assert_eq!(job.category, "command");
        assert_eq!(job.activity.activity_type, ActivityType::Event);
        assert_eq!(job.activity.name.as_deref(), Some("/deploy"));
        assert_eq!(job.activity.conversation.as_str(), "C9");
    }

    #[tokio::test]
    async fn unrecognized_form_explains_itself() {
        let h = harness(|_| {});
        let (status, disposition, text) =
            post(&h.app, "application/x-www-form-urlencoded", &[], "foo=bar").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(disposition, "unrecognized");
        assert!(text.contains("payload"));
    }

    #[tokio::test]
    async fn other_content_types_are_refused() {
        let h = harness(|_| {});
        let (status, disposition, _) = post(&h.app, "text/plain", &[], "hello").await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(disposition, "unsupported_media_type");
    }

    #[tokio::test]
    async fn signature_is_enforced_when_configured() {
        let mut h = harness(|c| c.slack.signing_secret = Some("shh".into()));
        let body = message_event("Ev7");

        let (status, _, _) = post(&h.app, "application/json", &[], body.clone()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(h.jobs.try_recv().is_err());

        let ts = chrono::Utc::now().timestamp().to_string();
        let signature = sign(&SignatureVerifier::new("shh"), &ts, body.as_bytes());
        let (status, disposition, _) = post(
            &h.app,
            "application/json",
            &[("x-slack-request-timestamp", ts.as_str()), ("x-slack-signature", signature.as_str())],
            body,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(disposition, "allowed");
        assert!(h.jobs.try_recv().is_ok());
    }

    #[tokio::test]
    async fn full_shard_releases_dedup_slot() {
        let mut h = harness(|c| c.worker.queue_capacity = 1);

        let (_, first, _) = post(&h.app, "application/json", &[], message_event("EvA")).await;
        let (status, second, _) = post(&h.app, "application/json", &[], message_event("EvB")).await;
        assert_eq!(first, "allowed");
        assert_eq!(status, StatusCode::OK);
        assert_eq!(second, "queue_full");
        assert_eq!(h.state.metrics.received_count("event", "queue_full"), 1.0);

        // the worker catches up, then the platform redelivers EvB
        let drained = h.jobs.try_recv().expect("EvA job");
        assert_eq!(drained.activity.text.as_deref(), Some("hello"));
        let (_, redelivered, _) = post(
            &h.app,
            "application/json",
            &[("x-slack-retry-num", "1"), ("x-slack-retry-reason", "http_timeout")],
            message_event("EvB"),
        )
        .await;
        assert_eq!(redelivered, "allowed");
        assert!(h.jobs.try_recv().is_ok());
    }

    #[tokio::test]
    async fn closed_shard_is_reported_and_releases_dedup_slot() {
        let mut h = harness(|_| {});
        h.jobs.close();

        let (status, disposition, _) =
            post(&h.app, "application/json", &[], message_event("EvC")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(disposition, "queue_closed");
        assert_eq!(h.state.classifier.deduplicator().len(), 0);
    }

    #[test]
    fn content_kind_ignores_parameters_and_case() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, "Application/JSON; charset=utf-8".parse().expect("value"));
        assert_eq!(content_kind(&headers), Some(ContentKind::Json));
        headers.insert(CONTENT_TYPE, "multipart/form-data".parse().expect("value"));
        assert_eq!(content_kind(&headers), None);
        assert_eq!(content_kind(&HeaderMap::new()), None);
    }

    #[test]
    fn integration_header_and_query() {
        let mut headers = HeaderMap::new();
        headers.insert(INTEGRATION_HEADER, "from-header".parse().expect("value"));
        let meta = RequestMeta::from_parts(&headers, None);
        assert_eq!(meta.integration_id.as_deref(), Some("from-header"));

        let meta = RequestMeta::from_parts(&headers, Some("integration_id=from-query"));
        assert_eq!(meta.integration_id.as_deref(), Some("from-query"));
        assert!(!meta.debug);
    }
}
