use serde::{Deserialize, Serialize};

/// An entry in `registry.json`: how to materialize a named component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentRegistration {
    pub key: String,
    pub label: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: RegistrationType,
    pub config: RegistrationConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationType {
    Module,
    Endpoint,
}

/// Type-specific materialization config.
///
/// `spec.md` also describes a `code` registration type (a literal
/// source-code blob evaluated in-process). This runtime does not carry
/// an embedded scripting sub-runtime, so `code` entries are rejected at
/// load time with a clear error rather than silently accepted; see
/// DESIGN.md for the rationale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RegistrationConfig {
    Module { module: String, class: String },
    Endpoint {
        endpoint: String,
        component_name: String,
        class_name: String,
    },
}

/// The subset of a registration returned by `GET /registry`.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationSummary {
    pub key: String,
    pub label: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: RegistrationType,
}

impl From<&ComponentRegistration> for RegistrationSummary {
    fn from(reg: &ComponentRegistration) -> Self {
        Self {
            key: reg.key.clone(),
            label: reg.label.clone(),
            description: reg.description.clone(),
            kind: reg.kind,
        }
    }
}
