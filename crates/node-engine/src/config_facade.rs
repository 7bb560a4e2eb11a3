use serde_json::{Map, Value};

use crate::template;

/// A component's resolved configuration: its `FlowComponent.config`
/// merged under the component class's `default_config`, with every
/// string value (recursively) run through the template evaluator
/// against the flow's current context.
pub struct ConfigFacade {
    evaluated: Value,
}

impl ConfigFacade {
    pub fn build(component_config: &Value, default_config: &Value, context: &Value) -> Self {
        let merged = merge_over_defaults(component_config, default_config);
        let evaluated = template::eval_value(&merged, context);
        Self { evaluated }
    }

    /// Returns, in order: the evaluated config value, `call_site_default`,
    /// or `Value::Null`. The class default is already folded into the
    /// evaluated config at construction time.
    pub fn get(&self, key: &str, call_site_default: Option<Value>) -> Value {
        self.evaluated
            .get(key)
            .cloned()
            .or(call_site_default)
            .unwrap_or(Value::Null)
    }

    pub fn as_value(&self) -> &Value {
        &self.evaluated
    }
}

/// Overlays `config` on top of `defaults`: keys present in `config` win,
/// everything else falls through to `defaults`. Non-object inputs are
/// treated as empty objects.
fn merge_over_defaults(config: &Value, defaults: &Value) -> Value {
    let mut merged = defaults.as_object().cloned().unwrap_or_default();
    if let Some(overrides) = config.as_object() {
        for (key, value) in overrides {
            merged.insert(key.clone(), value.clone());
        }
    }
    Value::Object(merged as Map<String, Value>)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn component_config_overrides_class_default() {
        let facade = ConfigFacade::build(
            &json!({ "greet": "hello {{who}}" }),
            &json!({ "greet": "hi", "retries": 3 }),
            &json!({ "who": "world" }),
        );
        assert_eq!(facade.get("greet", None), json!("hello world"));
        assert_eq!(facade.get("retries", None), json!(3));
    }

    #[test]
    fn missing_key_falls_back_to_call_site_default_then_null() {
        let facade = ConfigFacade::build(&json!({}), &json!({}), &json!({}));
        assert_eq!(facade.get("absent", Some(json!("fallback"))), json!("fallback"));
        assert_eq!(facade.get("absent", None), Value::Null);
    }
}
