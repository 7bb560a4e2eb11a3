//! The flow executor: a single-writer-per-flow, key-driven step loop.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use serde_json::Value;

use crate::component::{FlowRunner, Harness};
use crate::config_facade::ConfigFacade;
use crate::debug::build_debug_record;
use crate::event_bus::EventBus;
use crate::log_pipeline::FlowLogger;
use crate::model::{
    FlowComponent, FlowDefinition, FlowStep, LogLevel, TraceComponentRef, TraceEntry, EXIT_KEY,
};
use crate::registry::ComponentRegistry;

/// Cycle backstop: a flow that never reaches `"exit"` fails cleanly
/// instead of running forever. See the bounded-termination property in
/// the spec's testable properties.
const DEFAULT_MAX_STEPS: usize = 10_000;

pub struct FlowExecutor {
    registry: Arc<ComponentRegistry>,
    event_bus: Arc<EventBus>,
    logger: Arc<FlowLogger>,
    max_steps: usize,
    self_weak: Weak<FlowExecutor>,
}

impl FlowExecutor {
    pub fn new(
        registry: Arc<ComponentRegistry>,
        event_bus: Arc<EventBus>,
        logger: Arc<FlowLogger>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            registry,
            event_bus,
            logger,
            max_steps: DEFAULT_MAX_STEPS,
            self_weak: weak.clone(),
        })
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    fn self_runner(&self) -> Arc<dyn FlowRunner> {
        self.self_weak
            .upgrade()
            .expect("executor outlives its own handle")
    }

    fn fail(&self, flow: &mut FlowDefinition, current: Option<&FlowComponent>, message: String) {
        flow.status.error = Some(message.clone());
        flow.context
            .insert("error".to_string(), Value::String(message.clone()));
        let debug = build_debug_record(&message, flow, current, None, None);
        flow.context.insert("debug".to_string(), debug);
        self.logger
            .log(flow, &self.event_bus, LogLevel::Error, message);
    }

    /// Loads, executes, and traces exactly one component. On any load or
    /// execution failure the returned step is terminal (`next = "exit"`)
    /// with `status.error` populated.
    async fn execute_one(
        &self,
        mut flow: FlowDefinition,
        component_key: &str,
        tunnel_auth: Option<String>,
    ) -> FlowStep {
        let Some(idx) = flow.component_index(component_key) else {
            let message = format!("No component found with key: {component_key}");
            self.fail(&mut flow, None, message);
            return FlowStep::exit(flow);
        };
        let current = flow.flow[idx].clone();
        flow.status.current_component = Some(current.clone());

        let loaded = self.registry.load(
            &current.name,
            &flow.registry,
            self.self_runner(),
            Arc::clone(&self.event_bus),
            tunnel_auth.clone(),
        );
        let (component, info) = match loaded {
            Ok(Some(pair)) => pair,
            Ok(None) => {
                let message = format!(
                    "Error loading component: [{}] unknown registration",
                    current.name
                );
                self.fail(&mut flow, Some(&current), message);
                return FlowStep::exit(flow);
            }
            Err(err) => {
                let message = format!("Error loading component: [{}] {err}", current.name);
                self.fail(&mut flow, Some(&current), message);
                return FlowStep::exit(flow);
            }
        };

        let config = ConfigFacade::build(
            &current.config,
            &info.default_config,
            &Value::Object(flow.context.clone()),
        );
        let mut harness = Harness::new(
            flow,
            current.key.clone(),
            config,
            self.self_runner(),
            Arc::clone(&self.event_bus),
            Arc::clone(&self.logger),
            tunnel_auth,
        );

        let started = std::time::Instant::now();
        let step = component.execute(&mut harness).await;
        let elapsed = started.elapsed().as_millis();
        let config_snapshot = harness.config().as_value().clone();

        let mut flow = step.flow_definition;
        flow.status.trace.push(TraceEntry {
            elapsed_time_ms: elapsed,
            component: TraceComponentRef {
                key: current.key.clone(),
                name: current.name.clone(),
            },
            config: config_snapshot,
            context: flow.context.clone(),
        });

        if flow.status.error.is_some() && !flow.context.contains_key("debug") {
            let debug = build_debug_record(
                flow.status.error.as_deref().unwrap_or(""),
                &flow,
                flow.status.current_component.as_ref(),
                Some(&info),
                None,
            );
            flow.context.insert("debug".to_string(), debug);
        }

        FlowStep {
            next: step.next,
            flow_definition: flow,
        }
    }

    /// Drives `flow` to termination. Never fails: every failure mode is
    /// captured into `status.error` before returning.
    pub async fn run(&self, mut flow: FlowDefinition, tunnel_auth: Option<String>) -> FlowDefinition {
        flow.ensure_session_id();

        if flow.flow.is_empty() {
            let message = "No components found in flow".to_string();
            flow.status.error = Some(message.clone());
            flow.context.insert("error".to_string(), Value::String(message));
            return flow;
        }

        let mut next = flow.flow[0].key.clone();
        let mut steps = 0usize;

        while next != EXIT_KEY {
            steps += 1;
            if steps > self.max_steps {
                let message = format!("exceeded maximum step count ({})", self.max_steps);
                let current = flow.status.current_component.clone();
                self.fail(&mut flow, current.as_ref(), message);
                break;
            }

            let step = self.execute_one(flow, &next, tunnel_auth.clone()).await;
            flow = step.flow_definition;

            if flow.status.error.is_some() {
                break;
            }

            next = match step.next {
                Some(n) => n,
                None => {
                    let current_key = flow
                        .status
                        .current_component
                        .as_ref()
                        .map(|c| c.key.clone())
                        .unwrap_or_default();
                    match flow.component_index(&current_key) {
                        Some(idx) if idx + 1 < flow.flow.len() => flow.flow[idx + 1].key.clone(),
                        _ => EXIT_KEY.to_string(),
                    }
                }
            };
        }

        let session_id = flow.session_id().unwrap_or_default().to_string();
        flow.context
            .insert("session_id".to_string(), Value::String(session_id));
        flow
    }

    /// Executes exactly one component and returns its step result.
    pub async fn run_one(
        &self,
        flow: FlowDefinition,
        component_key: &str,
        tunnel_auth: Option<String>,
    ) -> FlowStep {
        self.execute_one(flow, component_key, tunnel_auth).await
    }
}

#[async_trait]
impl FlowRunner for FlowExecutor {
    async fn invoke(&self, flow_definition: FlowDefinition, tunnel_auth: Option<String>) -> FlowDefinition {
        self.run(flow_definition, tunnel_auth).await
    }

    async fn invoke_component(
        &self,
        flow_definition: FlowDefinition,
        component_key: &str,
        tunnel_auth: Option<String>,
    ) -> FlowStep {
        self.run_one(flow_definition, component_key, tunnel_auth).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FlowComponent;
    use serde_json::json;

    fn fixture_executor() -> Arc<FlowExecutor> {
        let dir = std::env::temp_dir().join(format!("node-engine-exec-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let registry = Arc::new(ComponentRegistry::new(dir).unwrap());
        let event_bus = Arc::new(EventBus::new());
        let logger = Arc::new(FlowLogger::new(false));
        FlowExecutor::new(registry, event_bus, logger)
    }

    fn component(key: &str, name: &str, config: Value) -> FlowComponent {
        FlowComponent {
            key: key.to_string(),
            name: name.to_string(),
            config,
        }
    }

    #[tokio::test]
    async fn linear_fallthrough_runs_every_component_in_order() {
        let executor = fixture_executor();
        let flow = FlowDefinition {
            key: "flow".to_string(),
            session_id: None,
            flow: vec![component("a", "Noop", json!({})), component("b", "Noop", json!({}))],
            context: Default::default(),
            registry: vec![],
            status: Default::default(),
        };

        let result = executor.run(flow, None).await;
        assert_eq!(result.status.trace.len(), 2);
        assert!(result.status.error.is_none());
        assert_eq!(
            result.status.current_component.as_ref().unwrap().key,
            "b"
        );
    }

    #[tokio::test]
    async fn explicit_next_skips_positional_fallthrough() {
        let executor = fixture_executor();
        let flow = FlowDefinition {
            key: "flow".to_string(),
            session_id: None,
            flow: vec![
                component("a", "Branch", json!({ "next": "c" })),
                component("b", "Noop", json!({})),
                component("c", "Noop", json!({})),
            ],
            context: Default::default(),
            registry: vec![],
            status: Default::default(),
        };

        let result = executor.run(flow, None).await;
        let trace_keys: Vec<_> = result
            .status
            .trace
            .iter()
            .map(|t| t.component.key.clone())
            .collect();
        assert_eq!(trace_keys, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn unknown_next_key_sets_status_and_context_error() {
        let executor = fixture_executor();
        let flow = FlowDefinition {
            key: "flow".to_string(),
            session_id: None,
            flow: vec![component("a", "Branch", json!({ "next": "z" }))],
            context: Default::default(),
            registry: vec![],
            status: Default::default(),
        };

        let result = executor.run(flow, None).await;
        let error = result.status.error.expect("expected error");
        assert!(error.starts_with("No component found with key: z"));
        assert_eq!(result.context.get("error"), Some(&Value::String(error)));
    }

    #[tokio::test]
    async fn template_in_config_resolves_before_component_sees_it() {
        let executor = fixture_executor();
        let mut context = serde_json::Map::new();
        context.insert("who".to_string(), json!("world"));
        let flow = FlowDefinition {
            key: "flow".to_string(),
            session_id: None,
            flow: vec![component(
                "a",
                "ExitWithError",
                json!({ "message": "hello {{who}}" }),
            )],
            context,
            registry: vec![],
            status: Default::default(),
        };

        let result = executor.run(flow, None).await;
        assert_eq!(result.status.error.as_deref(), Some("hello world"));
    }
}
