//! Static function metadata, as sent by the host at load time.
use funcbridge_proto::messages::{BindingInfo, RpcFunctionMetadata, binding_info::Direction};
use std::collections::HashMap;

/// One declared binding of a function: name, direction and declared type.
///
/// Sourced statically from function metadata; never mutated per
/// invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct BindingDefinition {
    pub name: String,
    pub binding_type: String,
    pub direction: Direction,
}

/// The metadata collaborator the context builder consumes: function name,
/// directory, and the declared binding set with the two special lookups
/// the builder needs (timer trigger, HTTP output).
#[derive(Clone, Debug)]
pub struct FunctionInfo {
    pub name: String,
    pub directory: String,
    bindings: HashMap<String, BindingInfo>,
    timer_trigger_name: Option<String>,
    http_output_name: Option<String>,
}

impl FunctionInfo {
    pub fn new(metadata: &RpcFunctionMetadata) -> Self {
        let bindings = metadata.bindings.clone();
        let timer_trigger_name = bindings
            .iter()
            .find(|(_, info)| info.r#type == "timerTrigger")
            .map(|(name, _)| name.clone());
        let http_output_name = bindings
            .iter()
            .find(|(_, info)| info.r#type == "http" && info.direction() != Direction::In)
            .map(|(name, _)| name.clone());

        Self {
            name: metadata.name.clone(),
            directory: metadata.directory.clone(),
            bindings,
            timer_trigger_name,
            http_output_name,
        }
    }

    /// The declared name of the timer-trigger binding, if the function has
    /// one.
    pub fn timer_trigger_name(&self) -> Option<&str> {
        self.timer_trigger_name.as_deref()
    }

    /// The declared name of the HTTP output binding, if the function has
    /// one.
    pub fn http_output_name(&self) -> Option<&str> {
        self.http_output_name.as_deref()
    }

    pub fn binding(&self, name: &str) -> Option<&BindingInfo> {
        self.bindings.get(name)
    }

    /// Declared output bindings (`out` and `inout` directions).
    pub fn output_bindings(&self) -> impl Iterator<Item = (&str, &BindingInfo)> {
        self.bindings
            .iter()
            .filter(|(_, info)| info.direction() != Direction::In)
            .map(|(name, info)| (name.as_str(), info))
    }

    /// The full static binding-definition set, ordered by binding name for
    /// determinism.
    pub fn binding_definitions(&self) -> Vec<BindingDefinition> {
        let mut definitions: Vec<_> = self
            .bindings
            .iter()
            .map(|(name, info)| BindingDefinition {
                name: name.clone(),
                binding_type: info.r#type.clone(),
                direction: info.direction(),
            })
            .collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> RpcFunctionMetadata {
        RpcFunctionMetadata {
            name: "myFunc".to_string(),
            directory: "/funcs/myFunc".to_string(),
            bindings: HashMap::from([
                (
                    "req".to_string(),
                    BindingInfo {
                        r#type: "httpTrigger".to_string(),
                        direction: Direction::In as i32,
                        data_type: 0,
                    },
                ),
                (
                    "res".to_string(),
                    BindingInfo {
                        r#type: "http".to_string(),
                        direction: Direction::Out as i32,
                        data_type: 0,
                    },
                ),
                (
                    "myTimer".to_string(),
                    BindingInfo {
                        r#type: "timerTrigger".to_string(),
                        direction: Direction::In as i32,
                        data_type: 0,
                    },
                ),
            ]),
            ..Default::default()
        }
    }

    #[test]
    fn resolves_special_binding_names() {
        let info = FunctionInfo::new(&metadata());
        assert_eq!(info.timer_trigger_name(), Some("myTimer"));
        assert_eq!(info.http_output_name(), Some("res"));
    }

    #[test]
    fn binding_definitions_are_ordered_and_complete() {
        let info = FunctionInfo::new(&metadata());
        let defs = info.binding_definitions();
        let names: Vec<_> = defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["myTimer", "req", "res"]);
        assert_eq!(defs[1].binding_type, "httpTrigger");
        assert_eq!(defs[1].direction, Direction::In);
    }
}
