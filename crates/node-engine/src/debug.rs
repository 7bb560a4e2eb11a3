//! Debug record assembly (§4.2): on any executor- or harness-reported
//! error, a snapshot is captured for diagnosis and placed under
//! `context["debug"]`.

use serde_json::{json, Value};

use crate::component::ComponentInfo;
use crate::model::{FlowComponent, FlowDefinition};

const MAX_LOG_ENTRIES: usize = 4;

pub fn build_debug_record(
    error_message: &str,
    flow: &FlowDefinition,
    current: Option<&FlowComponent>,
    info: Option<&ComponentInfo>,
    source_text: Option<&str>,
) -> Value {
    let last_logs: Vec<Value> = flow
        .status
        .log
        .iter()
        .rev()
        .take(MAX_LOG_ENTRIES)
        .rev()
        .map(|item| {
            json!({
                "namespace": item.namespace,
                "level": item.level.as_str(),
                "message": item.message,
            })
        })
        .collect();

    json!({
        "error": error_message,
        "component": current.map(|c| json!({ "key": c.key, "name": c.name })),
        "component_info": info.map(|i| json!({
            "description": i.description,
            "reads_from": i.reads_from,
            "writes_to": i.writes_to,
            "sample_input": i.sample_input,
            "sample_output": i.sample_output,
        })),
        "flow": redact_service_keys(&serde_json::to_value(flow).unwrap_or(Value::Null)),
        "context": flow.context,
        "log": last_logs,
        "source": source_text,
    })
}

/// Recursively replaces the value of any object key whose name contains
/// "service" (case-insensitive) with a redaction marker.
fn redact_service_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| {
                    if k.to_lowercase().contains("service") {
                        (k.clone(), Value::String("[redacted]".to_string()))
                    } else {
                        (k.clone(), redact_service_keys(v))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact_service_keys).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FlowStatus;

    #[test]
    fn redacts_keys_containing_service_anywhere_in_the_tree() {
        let value = json!({
            "service_token": "secret",
            "nested": { "my_service_url": "http://x", "keep": "me" },
            "list": [{ "service": "y" }],
        });
        let redacted = redact_service_keys(&value);
        assert_eq!(redacted["service_token"], json!("[redacted]"));
        assert_eq!(redacted["nested"]["my_service_url"], json!("[redacted]"));
        assert_eq!(redacted["nested"]["keep"], json!("me"));
        assert_eq!(redacted["list"][0]["service"], json!("[redacted]"));
    }

    #[test]
    fn keeps_only_the_last_four_log_entries() {
        let mut flow = FlowDefinition {
            key: "k".to_string(),
            session_id: None,
            flow: vec![],
            context: Default::default(),
            registry: vec![],
            status: FlowStatus::default(),
        };
        for i in 0..6 {
            flow.status.log.push(crate::model::LogItem::new(
                "ns",
                crate::model::LogLevel::Info,
                format!("msg {i}"),
            ));
        }
        let record = build_debug_record("boom", &flow, None, None, None);
        let log = record["log"].as_array().unwrap();
        assert_eq!(log.len(), 4);
        assert_eq!(log[0]["message"], json!("msg 2"));
        assert_eq!(log[3]["message"], json!("msg 5"));
    }
}
