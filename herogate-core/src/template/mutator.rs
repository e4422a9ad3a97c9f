//! Template mutations.
//!
//! The environment list lives on the first container definition. Every mutation
//! either fully applies or fails with `MalformedState`; nothing outside the edited
//! path is touched.

use super::container::ContainerDefinition;
use super::document::TemplateDocument;
use super::node::Node;
use super::path::{NodePath, Segment};
use super::procfile::ProcessSpec;
use crate::error::{HerogateError, Result};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Container definition list of the application task definition.
pub const CONTAINER_DEFINITIONS_PATH: &str =
    "Resources.HerogateApplicationContainer.Properties.ContainerDefinitions";

const ENVIRONMENT_KEY: &str = "Environment";

/// Environment variable of a container definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

impl EnvVar {
    fn from_node(node: &Node, path: &NodePath) -> Result<Self> {
        let map = node.as_map().ok_or_else(|| {
            HerogateError::malformed(
                format!("template at {}", path),
                format!("expected map, found {}", node.kind()),
            )
        })?;

        let field = |key: &str| -> Result<String> {
            match map.get(key).map(|n| n.as_scalar()) {
                Some(Some(scalar)) => Ok(scalar.to_text()),
                Some(None) => Err(HerogateError::malformed(
                    format!("template at {}.{}", path, key),
                    "expected scalar",
                )),
                None => Err(HerogateError::malformed(
                    format!("template at {}", path),
                    format!("missing key {:?}", key),
                )),
            }
        };

        Ok(Self { name: field("Name")?, value: field("Value")? })
    }

    fn to_node(&self) -> Node {
        Node::map([("Name", Node::string(&self.name)), ("Value", Node::string(&self.value))])
    }
}

/// Mutations of the application template.
pub struct TemplateMutator;

impl TemplateMutator {
    /// Environment variables of the first container definition, in template order.
    pub fn env_vars(doc: &TemplateDocument) -> Result<Vec<EnvVar>> {
        let path = environment_path();
        Self::env_list(doc)?
            .iter()
            .enumerate()
            .map(|(i, item)| EnvVar::from_node(item, &path.join(Segment::Index(i))))
            .collect()
    }

    /// Overlay `additions` on the environment list and write it back sorted by name.
    pub fn set_env_vars(
        doc: &mut TemplateDocument,
        additions: &BTreeMap<String, String>,
    ) -> Result<()> {
        let mut vars: BTreeMap<String, String> =
            Self::env_vars(doc)?.into_iter().map(|var| (var.name, var.value)).collect();
        vars.extend(additions.iter().map(|(k, v)| (k.clone(), v.clone())));

        let list = vars
            .into_iter()
            .map(|(name, value)| EnvVar { name, value }.to_node())
            .collect();

        debug!(count = additions.len(), "Setting environment variables");
        doc.set(&environment_path(), Node::List(list))
    }

    /// Drop the named variables. Remaining entries keep their order and content.
    pub fn unset_env_vars(doc: &mut TemplateDocument, names: &BTreeSet<String>) -> Result<()> {
        let path = environment_path();
        let items = Self::env_list(doc)?;

        let mut remaining = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let var = EnvVar::from_node(item, &path.join(Segment::Index(i)))?;
            if !names.contains(&var.name) {
                remaining.push(item.clone());
            }
        }

        if remaining.len() == items.len() {
            debug!("No environment variables to remove");
            return Ok(());
        }

        debug!(removed = items.len() - remaining.len(), "Removing environment variables");
        doc.set(&path, Node::List(remaining))
    }

    /// Replace the container definitions with one definition per process, ordered by
    /// process name. Each definition inherits `image` and the current environment list.
    ///
    /// An empty process set leaves the document untouched.
    pub fn regenerate_container_definitions(
        doc: &mut TemplateDocument,
        image: &str,
        processes: &BTreeMap<String, ProcessSpec>,
    ) -> Result<()> {
        if processes.is_empty() {
            debug!("No processes, keeping container definitions");
            return Ok(());
        }

        let definitions_path = NodePath::parse(CONTAINER_DEFINITIONS_PATH);
        let current = doc.get(&definitions_path)?;
        if current.as_list().is_none() {
            return Err(HerogateError::malformed(
                format!("template at {}", definitions_path),
                format!("expected list, found {}", current.kind()),
            ));
        }

        let environment = Node::List(Self::env_list(doc)?);
        let definitions = processes
            .iter()
            .map(|(name, process)| {
                ContainerDefinition::new(name, image, process, environment.clone()).to_node()
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(count = definitions.len(), image, "Regenerating container definitions");
        doc.set(&definitions_path, Node::List(definitions))
    }

    /// Raw environment list. An absent `Environment` key is an empty list; the
    /// container definition itself must exist.
    fn env_list(doc: &TemplateDocument) -> Result<Vec<Node>> {
        let definition_path =
            NodePath::parse(CONTAINER_DEFINITIONS_PATH).join(Segment::Index(0));
        let definition = doc.get(&definition_path)?;
        let map = definition.as_map().ok_or_else(|| {
            HerogateError::malformed(
                format!("template at {}", definition_path),
                format!("expected map, found {}", definition.kind()),
            )
        })?;

        match map.get(ENVIRONMENT_KEY) {
            None => Ok(Vec::new()),
            Some(Node::List(items)) => Ok(items.clone()),
            Some(other) => Err(HerogateError::malformed(
                format!("template at {}", environment_path()),
                format!("expected list, found {}", other.kind()),
            )),
        }
    }
}

fn environment_path() -> NodePath {
    NodePath::parse(CONTAINER_DEFINITIONS_PATH)
        .join(Segment::Index(0))
        .join(Segment::Key(ENVIRONMENT_KEY.to_string()))
}
