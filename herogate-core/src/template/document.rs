//! Template document with explicit path accessors.
//!
//! Accessors never coerce: a missing key, an out-of-range index or a node of the
//! wrong kind is a `MalformedState` naming the offending path.

use super::node::Node;
use super::path::{NodePath, Segment};
use crate::error::{HerogateError, Result};
use std::collections::BTreeMap;

/// Logical id map of the stack's resources.
const RESOURCES_KEY: &str = "Resources";

/// Parsed deployment template.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateDocument {
    root: Node,
}

impl TemplateDocument {
    pub fn new(root: Node) -> Self {
        Self { root }
    }

    /// Parse a template body (YAML or JSON).
    pub fn parse(body: &str) -> Result<Self> {
        let value: serde_yaml::Value = serde_yaml::from_str(body)
            .map_err(|e| HerogateError::malformed("template", e.to_string()))?;
        Ok(Self { root: Node::try_from(value)? })
    }

    /// Render the whole document. Map keys come out sorted.
    pub fn render(&self) -> Result<String> {
        serde_yaml::to_string(&self.root)
            .map_err(|e| HerogateError::Internal(format!("Failed to render template: {}", e)))
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn get(&self, path: &NodePath) -> Result<&Node> {
        let mut node = &self.root;
        for (depth, segment) in path.segments().iter().enumerate() {
            node = match step(node, segment) {
                Ok(child) => child,
                Err(reason) => return Err(at(path, depth, reason)),
            };
        }
        Ok(node)
    }

    pub fn get_mut(&mut self, path: &NodePath) -> Result<&mut Node> {
        let mut node = &mut self.root;
        for (depth, segment) in path.segments().iter().enumerate() {
            node = match step_mut(node, segment) {
                Ok(child) => child,
                Err(reason) => return Err(at(path, depth, reason)),
            };
        }
        Ok(node)
    }

    /// Set the node at `path`. The parent must exist; a missing map key is inserted.
    pub fn set(&mut self, path: &NodePath, value: Node) -> Result<()> {
        let Some((parent_path, last)) = path.split_last() else {
            self.root = value;
            return Ok(());
        };

        let depth = parent_path.segments().len();
        match (self.get_mut(&parent_path)?, last) {
            (Node::Map(map), Segment::Key(key)) => {
                map.insert(key.clone(), value);
            }
            (Node::Map(map), Segment::Index(index)) => {
                map.insert(index.to_string(), value);
            }
            (Node::List(list), Segment::Index(index)) => {
                let len = list.len();
                let slot = list.get_mut(*index).ok_or_else(|| {
                    at(path, depth, format!("index {} out of bounds (len {})", index, len))
                })?;
                *slot = value;
            }
            (other, Segment::Key(_)) => {
                return Err(at(path, depth, format!("expected map, found {}", other.kind())));
            }
            (other, Segment::Index(_)) => {
                return Err(at(path, depth, format!("expected list, found {}", other.kind())));
            }
        }
        Ok(())
    }

    /// The `Resources` map.
    pub fn resources(&self) -> Result<&BTreeMap<String, Node>> {
        let path = NodePath::parse(RESOURCES_KEY);
        let node = self.get(&path)?;
        node.as_map().ok_or_else(|| {
            HerogateError::malformed(
                format!("template at {}", path),
                format!("expected map, found {}", node.kind()),
            )
        })
    }
}

fn at(path: &NodePath, depth: usize, reason: String) -> HerogateError {
    HerogateError::malformed(format!("template at {}", path.prefix(depth + 1)), reason)
}

fn step<'a>(node: &'a Node, segment: &Segment) -> std::result::Result<&'a Node, String> {
    match (node, segment) {
        (Node::Map(map), Segment::Key(key)) => {
            map.get(key).ok_or_else(|| format!("missing key {:?}", key))
        }
        (Node::Map(map), Segment::Index(index)) => {
            map.get(&index.to_string()).ok_or_else(|| format!("missing key \"{}\"", index))
        }
        (Node::List(list), Segment::Index(index)) => list
            .get(*index)
            .ok_or_else(|| format!("index {} out of bounds (len {})", index, list.len())),
        (other, Segment::Key(_)) => Err(format!("expected map, found {}", other.kind())),
        (other, Segment::Index(_)) => Err(format!("expected list, found {}", other.kind())),
    }
}

fn step_mut<'a>(
    node: &'a mut Node,
    segment: &Segment,
) -> std::result::Result<&'a mut Node, String> {
    match (node, segment) {
        (Node::Map(map), Segment::Key(key)) => {
            map.get_mut(key).ok_or_else(|| format!("missing key {:?}", key))
        }
        (Node::Map(map), Segment::Index(index)) => {
            map.get_mut(&index.to_string()).ok_or_else(|| format!("missing key \"{}\"", index))
        }
        (Node::List(list), Segment::Index(index)) => {
            let len = list.len();
            list.get_mut(*index)
                .ok_or_else(|| format!("index {} out of bounds (len {})", index, len))
        }
        (other, Segment::Key(_)) => Err(format!("expected map, found {}", other.kind())),
        (other, Segment::Index(_)) => Err(format!("expected list, found {}", other.kind())),
    }
}
