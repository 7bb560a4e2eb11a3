use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::event::LogItem;

/// A mutable JSON-shaped blackboard shared by every component in a flow.
pub type Context = Map<String, Value>;

/// The unit of work submitted by a caller and driven to completion by the
/// executor. Mutated in place across component steps and returned whole
/// on termination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowDefinition {
    /// Caller-supplied identifier, free-form.
    pub key: String,
    /// Identifies an end-user session; routes events and scopes storage.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Ordered sequence of components. Order defines fallthrough.
    #[serde(default)]
    pub flow: Vec<FlowComponent>,
    /// The blackboard shared by all components in this flow.
    #[serde(default)]
    pub context: Context,
    /// Optional per-flow component registration overrides.
    #[serde(default)]
    pub registry: Vec<crate::model::ComponentRegistration>,
    #[serde(default)]
    pub status: FlowStatus,
}

impl FlowDefinition {
    /// Fills in `session_id` if the caller left it unset, mirroring the
    /// "generated if absent" requirement. Idempotent.
    pub fn ensure_session_id(&mut self) -> &str {
        if self.session_id.is_none() {
            self.session_id = Some(uuid::Uuid::new_v4().to_string());
        }
        self.session_id.as_deref().unwrap()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn find_component(&self, key: &str) -> Option<&FlowComponent> {
        // First match wins when duplicate keys are present.
        self.flow.iter().find(|c| c.key == key)
    }

    pub fn component_index(&self, key: &str) -> Option<usize> {
        self.flow.iter().position(|c| c.key == key)
    }
}

/// One node in the flow graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowComponent {
    /// Unique within its flow.
    pub key: String,
    /// Registry key of the component to load.
    pub name: String,
    /// Free-form config; string values are template-resolved at load time.
    #[serde(default)]
    pub config: Value,
}

/// Carries the executor's progress and failure state through a flow.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FlowStatus {
    #[serde(default)]
    pub current_component: Option<FlowComponent>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub log: Vec<LogItem>,
    #[serde(default)]
    pub trace: Vec<TraceEntry>,
}

/// One `invoke_execute` trace record, appended even on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    pub elapsed_time_ms: u128,
    pub component: TraceComponentRef,
    pub config: Value,
    pub context: Context,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceComponentRef {
    pub key: String,
    pub name: String,
}

/// Result of one executor step: where to go next, and the flow carried
/// forward (mutated in place by the component that produced this step).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowStep {
    /// `None` means "continue positionally"; `Some("exit")` terminates;
    /// anything else names the next component by key.
    pub next: Option<String>,
    pub flow_definition: FlowDefinition,
}

impl FlowStep {
    pub fn continuing(flow_definition: FlowDefinition, next: Option<String>) -> Self {
        Self {
            next,
            flow_definition,
        }
    }

    pub fn exit(flow_definition: FlowDefinition) -> Self {
        Self {
            next: Some("exit".to_string()),
            flow_definition,
        }
    }
}

/// Reserved key that terminates a flow when used as `next`.
pub const EXIT_KEY: &str = "exit";
