//! The per-component execution harness: the context, configuration,
//! logging, and event-emission facilities exposed to component authors.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::context::ContextView;
use crate::config_facade::ConfigFacade;
use crate::event_bus::EventBus;
use crate::log_pipeline::FlowLogger;
use crate::model::{FlowComponent, FlowDefinition, FlowEvent, FlowStep, LogLevel};

/// Class-level documentation a component exposes through `get_info`.
#[derive(Debug, Clone, Default)]
pub struct ComponentInfo {
    pub name: String,
    pub description: String,
    pub default_config: Value,
    pub reads_from: Vec<String>,
    pub writes_to: Vec<String>,
    pub sample_input: Value,
    pub sample_output: Value,
}

/// Breaks the cyclic parent/child executor reference: components hold
/// this narrow interface rather than a concrete executor, and the
/// concrete executor is the only implementer.
#[async_trait]
pub trait FlowRunner: Send + Sync {
    async fn invoke(&self, flow_definition: FlowDefinition, tunnel_auth: Option<String>) -> FlowDefinition;

    async fn invoke_component(
        &self,
        flow_definition: FlowDefinition,
        component_key: &str,
        tunnel_auth: Option<String>,
    ) -> FlowStep;
}

/// The author-supplied unit of work. `execute` is the only method a
/// component implementation must provide; everything else (tracing,
/// sub-flow invocation, emit, logging) is furnished by `Harness`.
#[async_trait]
pub trait Component: Send + Sync {
    async fn execute(&self, harness: &mut Harness) -> FlowStep;
}

/// Instantiates a `Component` for a given registration and exposes its
/// static metadata.
pub trait ComponentFactory: Send + Sync {
    fn info(&self) -> ComponentInfo;
    fn create(&self) -> Box<dyn Component>;
}

/// Everything a running component body needs: context, resolved config,
/// logging, emission, and the ability to recurse into sub-flows.
pub struct Harness {
    pub flow_definition: FlowDefinition,
    pub component_key: String,
    config: ConfigFacade,
    runner: Arc<dyn FlowRunner>,
    event_bus: Arc<EventBus>,
    logger: Arc<FlowLogger>,
    tunnel_auth: Option<String>,
}

impl Harness {
    pub fn new(
        flow_definition: FlowDefinition,
        component_key: String,
        config: ConfigFacade,
        runner: Arc<dyn FlowRunner>,
        event_bus: Arc<EventBus>,
        logger: Arc<FlowLogger>,
        tunnel_auth: Option<String>,
    ) -> Self {
        Self {
            flow_definition,
            component_key,
            config,
            runner,
            event_bus,
            logger,
            tunnel_auth,
        }
    }

    pub fn current_component(&self) -> Option<&FlowComponent> {
        self.flow_definition.find_component(&self.component_key)
    }

    pub fn context(&mut self) -> ContextView<'_> {
        ContextView::new(&mut self.flow_definition.context)
    }

    pub fn config(&self) -> &ConfigFacade {
        &self.config
    }

    /// Produces a FlowEvent into the event bus. Fire-and-forget: never
    /// awaits, never fails visibly.
    pub fn emit(&self, event_name: impl Into<String>, data: impl Into<String>) {
        let Some(session_id) = self.flow_definition.session_id() else {
            return;
        };
        self.event_bus.emit(
            FlowEvent {
                session_id: session_id.to_string(),
                event: event_name.into(),
                data: data.into(),
            },
            None,
        );
    }

    pub fn log(&mut self, level: LogLevel, message: impl Into<String>) {
        let logger = Arc::clone(&self.logger);
        let bus = Arc::clone(&self.event_bus);
        logger.log(&mut self.flow_definition, &bus, level, message);
    }

    /// Runs `sub_flow` to termination through the same executor. Shares
    /// session_id and registry from the parent unless the caller has
    /// already set its own.
    pub async fn invoke(&self, mut sub_flow: FlowDefinition) -> FlowDefinition {
        if sub_flow.session_id.is_none() {
            sub_flow.session_id = self.flow_definition.session_id.clone();
        }
        if sub_flow.registry.is_empty() {
            sub_flow.registry = self.flow_definition.registry.clone();
        }
        self.runner.invoke(sub_flow, self.tunnel_auth.clone()).await
    }

    pub async fn invoke_component(&self, flow: FlowDefinition, key: &str) -> FlowStep {
        self.runner
            .invoke_component(flow, key, self.tunnel_auth.clone())
            .await
    }

    /// `{next, flow_definition: self.flow_definition}`.
    pub fn continue_flow(&self, next: Option<String>) -> FlowStep {
        FlowStep::continuing(self.flow_definition.clone(), next)
    }

    /// Sets `status.error`, mirrors it into `context["error"]`, logs at
    /// error, and returns a terminal step.
    pub fn exit_flow_with_error(&mut self, message: impl Into<String>) -> FlowStep {
        let message = message.into();
        self.flow_definition.status.error = Some(message.clone());
        self.flow_definition
            .context
            .insert("error".to_string(), Value::String(message.clone()));
        self.log(LogLevel::Error, message);
        FlowStep::exit(self.flow_definition.clone())
    }
}
