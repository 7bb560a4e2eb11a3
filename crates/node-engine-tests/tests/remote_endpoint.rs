use std::sync::Arc;

use node_engine::event_bus::EventBus;
use node_engine::executor::FlowExecutor;
use node_engine::log_pipeline::FlowLogger;
use node_engine::model::{
    ComponentRegistration, FlowComponent, FlowDefinition, RegistrationConfig, RegistrationType,
};
use node_engine::registry::ComponentRegistry;
use serde_json::json;

fn executor_with_empty_registry() -> Arc<FlowExecutor> {
    let dir = std::env::temp_dir().join(format!(
        "node-engine-remote-test-{}",
        uuid_like_suffix()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    let registry = Arc::new(ComponentRegistry::new(dir).unwrap());
    let event_bus = Arc::new(EventBus::new());
    let logger = Arc::new(FlowLogger::new(false));
    FlowExecutor::new(registry, event_bus, logger)
}

fn uuid_like_suffix() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos()
}

/// Registration resolves and the loader succeeds; the non-local http
/// endpoint is rejected only once execute runs, without issuing a
/// request.
#[tokio::test]
async fn non_local_http_endpoint_fails_at_execute_not_at_load() {
    let executor = executor_with_empty_registry();

    let flow = FlowDefinition {
        key: "flow".to_string(),
        session_id: None,
        flow: vec![FlowComponent {
            key: "a".to_string(),
            name: "remote-chat".to_string(),
            config: json!({}),
        }],
        context: Default::default(),
        registry: vec![ComponentRegistration {
            key: "remote-chat".to_string(),
            label: "Remote Chat".to_string(),
            description: "".to_string(),
            kind: RegistrationType::Endpoint,
            config: RegistrationConfig::Endpoint {
                endpoint: "http://example.com".to_string(),
                component_name: "chat".to_string(),
                class_name: "Chat".to_string(),
            },
        }],
        status: Default::default(),
    };

    let result = executor.run(flow, None).await;
    let error = result.status.error.expect("expected a terminal error");
    assert!(
        error.to_lowercase().contains("https"),
        "expected an https-required error, got: {error}"
    );
}
