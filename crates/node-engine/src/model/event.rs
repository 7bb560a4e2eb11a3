use serde::{Deserialize, Serialize};

use super::flow::FlowDefinition;

/// An event produced inside a flow and routed through the event bus to
/// HTTP streaming subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowEvent {
    pub session_id: String,
    /// Short name, e.g. `"log"` or `"messages:changed"`.
    pub event: String,
    /// String payload, JSON-encoded by convention for structured data.
    pub data: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
            LogLevel::Critical => "critical",
        }
    }
}

/// One record appended to `FlowStatus.log`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogItem {
    pub namespace: String,
    pub level: LogLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_definition: Option<Box<FlowDefinition>>,
}

impl LogItem {
    pub fn new(namespace: impl Into<String>, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            level,
            message: message.into(),
            flow_definition: None,
        }
    }

    pub fn with_flow_definition(mut self, flow_definition: FlowDefinition) -> Self {
        self.flow_definition = Some(Box::new(flow_definition));
        self
    }
}
