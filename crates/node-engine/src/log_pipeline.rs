use serde_json::{json, Value};

use crate::event_bus::EventBus;
use crate::model::{FlowDefinition, FlowEvent, LogItem, LogLevel};

/// Fans a single log record out to three sinks: the flow's own status
/// log, the event bus (gated on `context["stream_log"]`), and the
/// process console via `tracing`.
pub struct FlowLogger {
    /// Mirrors "or when the handler is running at debug": whether to
    /// include the full flow snapshot on every event-sink record, not
    /// just on error/critical.
    verbose_event_sink: bool,
}

impl FlowLogger {
    pub fn new(verbose_event_sink: bool) -> Self {
        Self { verbose_event_sink }
    }

    pub fn log(
        &self,
        flow: &mut FlowDefinition,
        event_bus: &EventBus,
        level: LogLevel,
        message: impl Into<String>,
    ) {
        let message = message.into();
        let namespace = format!(
            "{}:{}",
            flow.session_id().unwrap_or("-"),
            flow.key
        );

        let item = LogItem::new(namespace.clone(), level, message.clone());
        flow.status.log.push(item);

        match level {
            LogLevel::Debug => tracing::debug!(namespace = %namespace, "{message}"),
            LogLevel::Info => tracing::info!(namespace = %namespace, "{message}"),
            LogLevel::Warning => tracing::warn!(namespace = %namespace, "{message}"),
            LogLevel::Error | LogLevel::Critical => {
                tracing::error!(namespace = %namespace, "{message}")
            }
        }

        self.emit_to_bus(flow, event_bus, level, &namespace, &message);
    }

    fn emit_to_bus(
        &self,
        flow: &FlowDefinition,
        event_bus: &EventBus,
        level: LogLevel,
        namespace: &str,
        message: &str,
    ) {
        let Some(session_id) = flow.session_id() else {
            return;
        };
        if !flow.context.get("stream_log").map(is_truthy).unwrap_or(false) {
            return;
        }

        let include_flow =
            matches!(level, LogLevel::Error | LogLevel::Critical) || self.verbose_event_sink;

        let payload = if include_flow {
            json!({
                "namespace": namespace,
                "level": level.as_str(),
                "message": message,
                "flow_definition": flow,
            })
        } else {
            json!({
                "namespace": namespace,
                "level": level.as_str(),
                "message": message,
            })
        };

        let data = serde_json::to_string(&payload).unwrap_or_default();
        event_bus.emit(
            FlowEvent {
                session_id: session_id.to_string(),
                event: "log".to_string(),
                data,
            },
            None,
        );
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Null => false,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty() && s != "false",
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
