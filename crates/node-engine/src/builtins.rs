//! Compile-time module registry: the `module` loader resolves a
//! registration's `class` name to a constructor registered here instead
//! of importing a by-name Python-style module at runtime. See
//! DESIGN.md for why `code` (caller-supplied source) is not carried.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::component::{Component, ComponentFactory, ComponentInfo, Harness};

/// Maps a registration's `class` to a factory. Populated once at
/// startup from `builtins::all()`; read-only afterward.
#[derive(Default)]
pub struct ModuleRegistry {
    factories: HashMap<String, Box<dyn ComponentFactory>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        let mut registry = Self::default();
        registry.register("Noop", Box::new(NoopFactory));
        registry.register("Branch", Box::new(BranchFactory));
        registry.register("ExitWithError", Box::new(ExitWithErrorFactory));
        registry
    }

    pub fn register(&mut self, class: &str, factory: Box<dyn ComponentFactory>) {
        self.factories.insert(class.to_string(), factory);
    }

    pub fn get(&self, class: &str) -> Option<&dyn ComponentFactory> {
        self.factories.get(class).map(|f| f.as_ref())
    }
}

/// Always continues positionally. Used throughout the executor's own
/// test scenarios for linear fallthrough.
struct Noop;

#[async_trait]
impl Component for Noop {
    async fn execute(&self, harness: &mut Harness) -> crate::model::FlowStep {
        harness.continue_flow(None)
    }
}

struct NoopFactory;

impl ComponentFactory for NoopFactory {
    fn info(&self) -> ComponentInfo {
        ComponentInfo {
            name: "Noop".to_string(),
            description: "Continues to the next component positionally.".to_string(),
            default_config: json!({}),
            reads_from: vec![],
            writes_to: vec![],
            sample_input: json!({}),
            sample_output: json!({}),
        }
    }

    fn create(&self) -> Box<dyn Component> {
        Box::new(Noop)
    }
}

/// Reads `config.get("next")` and jumps there, or continues positionally
/// if unset.
struct Branch;

#[async_trait]
impl Component for Branch {
    async fn execute(&self, harness: &mut Harness) -> crate::model::FlowStep {
        let next = match harness.config().get("next", None) {
            Value::String(s) => Some(s),
            _ => None,
        };
        harness.continue_flow(next)
    }
}

struct BranchFactory;

impl ComponentFactory for BranchFactory {
    fn info(&self) -> ComponentInfo {
        ComponentInfo {
            name: "Branch".to_string(),
            description: "Jumps to config.next, or continues positionally if unset.".to_string(),
            default_config: json!({ "next": Value::Null }),
            reads_from: vec!["next".to_string()],
            writes_to: vec![],
            sample_input: json!({ "next": "c" }),
            sample_output: json!({}),
        }
    }

    fn create(&self) -> Box<dyn Component> {
        Box::new(Branch)
    }
}

/// Always terminates the flow with `config.get("message")` as the error.
struct ExitWithError;

#[async_trait]
impl Component for ExitWithError {
    async fn execute(&self, harness: &mut Harness) -> crate::model::FlowStep {
        let message = match harness.config().get("message", None) {
            Value::String(s) => s,
            _ => "component requested exit".to_string(),
        };
        harness.exit_flow_with_error(message)
    }
}

struct ExitWithErrorFactory;

impl ComponentFactory for ExitWithErrorFactory {
    fn info(&self) -> ComponentInfo {
        ComponentInfo {
            name: "ExitWithError".to_string(),
            description: "Always exits the flow with a configured error message.".to_string(),
            default_config: json!({ "message": "component requested exit" }),
            reads_from: vec!["message".to_string()],
            writes_to: vec!["error".to_string()],
            sample_input: json!({ "message": "boom" }),
            sample_output: json!({}),
        }
    }

    fn create(&self) -> Box<dyn Component> {
        Box::new(ExitWithError)
    }
}
