use serde_json::Value;

use crate::model::Context as ContextMap;

/// Thin wrapper over `FlowDefinition.context`. Mutations are in-place and
/// visible to every subsequent component in the same flow.
pub struct ContextView<'a> {
    inner: &'a mut ContextMap,
}

impl<'a> ContextView<'a> {
    pub fn new(inner: &'a mut ContextMap) -> Self {
        Self { inner }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.inner.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.inner.insert(key.into(), value);
    }

    pub fn delete(&mut self, key: &str) -> Option<Value> {
        self.inner.remove(key)
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    /// The whole context as a single JSON value.
    pub fn json(&self) -> Value {
        Value::Object(self.inner.clone())
    }
}
