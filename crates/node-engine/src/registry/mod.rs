//! Component registry: resolves a registry key to either a compile-time
//! module factory or a remote-endpoint runner.

mod endpoint_runner;

pub use endpoint_runner::EndpointRunner;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::builtins::ModuleRegistry;
use crate::component::{Component, ComponentFactory, ComponentInfo, FlowRunner};
use crate::error::{EngineError, EngineResult};
use crate::event_bus::EventBus;
use crate::model::{ComponentRegistration, RegistrationConfig, RegistrationType};

const REGISTRY_FILE_NAME: &str = "registry.json";

pub struct ComponentRegistry {
    root: PathBuf,
    modules: ModuleRegistry,
}

impl ComponentRegistry {
    pub fn new(root: impl Into<PathBuf>) -> EngineResult<Self> {
        let root = root.into();
        if !root.exists() {
            return Err(EngineError::RegistryRootMissing {
                path: root.display().to_string(),
            });
        }
        Ok(Self {
            root,
            modules: ModuleRegistry::new(),
        })
    }

    /// Reads `registry.json` at `root`, then walks upward one directory
    /// at a time, merging additional `registry.json` files found on the
    /// way: an entry's first (nearest-to-root) appearance wins. Sorted
    /// by key. A missing file at any level is simply skipped; missing
    /// files everywhere yields an empty list.
    pub fn list_components(&self) -> EngineResult<Vec<ComponentRegistration>> {
        let mut seen = HashSet::new();
        let mut merged = Vec::new();

        for dir in ancestors(&self.root) {
            let path = dir.join(REGISTRY_FILE_NAME);
            if !path.is_file() {
                continue;
            }
            let text = std::fs::read_to_string(&path).map_err(|e| EngineError::RegistryParse {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
            let entries: Vec<ComponentRegistration> =
                serde_json::from_str(&text).map_err(|e| EngineError::RegistryParse {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })?;
            for entry in entries {
                if seen.insert(entry.key.clone()) {
                    merged.push(entry);
                }
            }
        }

        merged.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(merged)
    }

    /// Flow-local `registry` overrides are checked before the on-disk
    /// registry.
    pub fn resolve(
        &self,
        name: &str,
        flow_overrides: &[ComponentRegistration],
    ) -> EngineResult<Option<ComponentRegistration>> {
        if let Some(reg) = flow_overrides.iter().find(|r| r.key == name) {
            return Ok(Some(reg.clone()));
        }
        Ok(self
            .list_components()?
            .into_iter()
            .find(|r| r.key == name))
    }

    /// Resolves `name` and materializes a running component instance,
    /// or `Ok(None)` if no such registration exists.
    /// `_runner` and `_event_bus` are accepted (per the loader contract
    /// of §4.3) but unused by today's loader kinds; a future loader kind
    /// whose components need to recurse into sub-flows or emit directly
    /// at load time would thread them through here.
    pub fn load(
        &self,
        name: &str,
        flow_overrides: &[ComponentRegistration],
        _runner: Arc<dyn FlowRunner>,
        _event_bus: Arc<EventBus>,
        tunnel_auth: Option<String>,
    ) -> EngineResult<Option<(Box<dyn Component>, ComponentInfo)>> {
        let Some(reg) = self.resolve(name, flow_overrides)? else {
            return Ok(None);
        };

        match (reg.kind, &reg.config) {
            (RegistrationType::Module, RegistrationConfig::Module { class, .. }) => {
                let factory = self.modules.get(class).ok_or_else(|| EngineError::LoadFailure {
                    name: name.to_string(),
                    reason: format!("no builtin module class '{class}' registered"),
                })?;
                Ok(Some((factory.create(), factory.info())))
            }
            (
                RegistrationType::Endpoint,
                RegistrationConfig::Endpoint {
                    endpoint,
                    component_name,
                    class_name,
                },
            ) => {
                let component = EndpointRunner::new(
                    endpoint.clone(),
                    component_name.clone(),
                    class_name.clone(),
                    tunnel_auth,
                )
                .map_err(|e| EngineError::LoadFailure {
                    name: name.to_string(),
                    reason: e.to_string(),
                })?;
                let info = ComponentInfo {
                    name: reg.label.clone(),
                    description: reg.description.clone(),
                    ..Default::default()
                };
                Ok(Some((Box::new(component), info)))
            }
            _ => Err(EngineError::LoadFailure {
                name: name.to_string(),
                reason: "registration type and config shape disagree".to_string(),
            }),
        }
    }
}

/// `dir` itself followed by each ancestor up to the filesystem root, in
/// that order (nearest-to-root-of-search first, i.e. deepest first).
fn ancestors(dir: &Path) -> Vec<PathBuf> {
    dir.ancestors().map(Path::to_path_buf).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_registry(dir: &Path, json: &str) {
        let mut f = std::fs::File::create(dir.join(REGISTRY_FILE_NAME)).unwrap();
        f.write_all(json.as_bytes()).unwrap();
    }

    #[test]
    fn nearest_to_root_wins_on_duplicate_keys() {
        let tmp = tempdir();
        let child = tmp.join("child");
        std::fs::create_dir_all(&child).unwrap();

        write_registry(
            &tmp,
            r#"[{"key":"a","label":"parent","description":"","type":"module","config":{"module":"m","class":"Noop"}}]"#,
        );
        write_registry(
            &child,
            r#"[{"key":"a","label":"child","description":"","type":"module","config":{"module":"m","class":"Noop"}}]"#,
        );

        let registry = ComponentRegistry::new(&child).unwrap();
        let list = registry.list_components().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].label, "child");
    }

    #[test]
    fn missing_registry_files_yield_empty_list() {
        let tmp = tempdir();
        let registry = ComponentRegistry::new(&tmp).unwrap();
        assert!(registry.list_components().unwrap().is_empty());
    }

    fn tempdir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "node-engine-registry-test-{}",
            uuid::Uuid::new_v4()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }
}
