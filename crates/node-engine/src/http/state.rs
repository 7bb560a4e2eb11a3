use std::sync::Arc;

use crate::event_bus::EventBus;
use crate::executor::FlowExecutor;
use crate::registry::ComponentRegistry;

#[derive(Clone)]
pub struct AppState {
    pub executor: Arc<FlowExecutor>,
    pub registry: Arc<ComponentRegistry>,
    pub event_bus: Arc<EventBus>,
}

impl AppState {
    pub fn new(registry: Arc<ComponentRegistry>, event_bus: Arc<EventBus>) -> Self {
        let executor = FlowExecutor::new(
            Arc::clone(&registry),
            Arc::clone(&event_bus),
            Arc::new(crate::log_pipeline::FlowLogger::new(false)),
        );
        Self {
            executor,
            registry,
            event_bus,
        }
    }
}
