use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::Json;
use futures::stream::{self, Stream};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::model::{FlowDefinition, FlowEvent, FlowStep, RegistrationSummary};

use super::state::AppState;

const TUNNEL_HEADER: &str = "x-tunnel-authorization";

fn tunnel_auth(headers: &HeaderMap) -> Option<String> {
    headers
        .get(TUNNEL_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("tunnel ").or(Some(v)))
        .map(|v| v.to_string())
}

/// `POST /invoke` — always 200; errors are encoded in `status.error`.
pub async fn invoke(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(flow): Json<FlowDefinition>,
) -> impl IntoResponse {
    let result = state.executor.run(flow, tunnel_auth(&headers)).await;
    Json(result)
}

#[derive(Debug, Deserialize)]
pub struct InvokeComponentQuery {
    component_key: String,
}

/// `POST /invoke_component?component_key=<k>`.
pub async fn invoke_component(
    State(state): State<AppState>,
    Query(query): Query<InvokeComponentQuery>,
    headers: HeaderMap,
    Json(flow): Json<FlowDefinition>,
) -> impl IntoResponse {
    let step: FlowStep = state
        .executor
        .run_one(flow, &query.component_key, tunnel_auth(&headers))
        .await;
    Json(step)
}

/// `GET /registry` — sorted by key (the registry already sorts).
pub async fn list_registry(State(state): State<AppState>) -> impl IntoResponse {
    match state.registry.list_components() {
        Ok(entries) => {
            let summaries: Vec<RegistrationSummary> =
                entries.iter().map(RegistrationSummary::from).collect();
            Json(summaries).into_response()
        }
        Err(err) => {
            (axum::http::StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SseQuery {
    session_id: String,
    connection_id: Option<String>,
}

/// `GET /sse?session_id=<s>&connection_id=<c>?`.
pub async fn sse(
    State(state): State<AppState>,
    Query(query): Query<SseQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let handle = state
        .event_bus
        .add_subscriber(query.session_id, query.connection_id);
    let event_bus = Arc::clone(&state.event_bus);
    let subscriber_id = handle.id;

    let stream = stream::unfold(Some(handle.receiver), move |receiver| {
        let event_bus = Arc::clone(&event_bus);
        async move {
            let mut receiver = receiver?;
            match receiver.recv().await {
                Some(event) => {
                    let sse_event = Event::default().event(event.event).data(event.data);
                    Some((Ok(sse_event), Some(receiver)))
                }
                None => {
                    event_bus.remove_subscriber(subscriber_id);
                    None
                }
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[derive(Debug, Deserialize)]
pub struct EmitSseQuery {
    connection_id: Option<String>,
}

/// `POST /emit_sse_message?connection_id=<c>?` — the open question on
/// precedence is resolved as "connection wins": a query `connection_id`
/// takes priority over the body's `session_id`-implied broadcast.
pub async fn emit_sse_message(
    State(state): State<AppState>,
    Query(query): Query<EmitSseQuery>,
    Json(event): Json<FlowEvent>,
) -> impl IntoResponse {
    state
        .event_bus
        .emit(event, query.connection_id.as_deref());
    Json(json!({ "status": "ok" })) as Json<Value>
}
