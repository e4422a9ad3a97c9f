//! Typed template tree.
//!
//! Templates are trees of maps, lists and scalars. Maps are kept key-sorted, so a
//! rendered document always lists its keys alphabetically.

use crate::error::{HerogateError, Result};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_yaml::Value;
use std::collections::BTreeMap;

/// Leaf value of a template.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(serde_yaml::Number),
    String(String),
}

impl Scalar {
    /// Textual form of the scalar, as a template consumer would read it.
    pub fn to_text(&self) -> String {
        match self {
            Scalar::Null => String::new(),
            Scalar::Bool(b) => b.to_string(),
            Scalar::Number(n) => n.to_string(),
            Scalar::String(s) => s.clone(),
        }
    }
}

/// Template node.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Map(BTreeMap<String, Node>),
    List(Vec<Node>),
    Scalar(Scalar),
}

impl Node {
    pub fn string(value: impl Into<String>) -> Self {
        Node::Scalar(Scalar::String(value.into()))
    }

    /// Build a map node from key/value pairs.
    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Node)>,
    {
        Node::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Convert any serializable value into a node.
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self> {
        let value = serde_yaml::to_value(value)
            .map_err(|e| HerogateError::Internal(format!("Failed to serialize node: {}", e)))?;
        Node::try_from(value)
    }

    /// Short name of the node kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Map(_) => "map",
            Node::List(_) => "list",
            Node::Scalar(_) => "scalar",
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Node>> {
        match self {
            Node::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Node]> {
        match self {
            Node::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Node::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }
}

impl TryFrom<Value> for Node {
    type Error = HerogateError;

    fn try_from(value: Value) -> Result<Self> {
        Ok(match value {
            Value::Null => Node::Scalar(Scalar::Null),
            Value::Bool(b) => Node::Scalar(Scalar::Bool(b)),
            Value::Number(n) => Node::Scalar(Scalar::Number(n)),
            Value::String(s) => Node::Scalar(Scalar::String(s)),
            Value::Sequence(items) => {
                Node::List(items.into_iter().map(Node::try_from).collect::<Result<_>>()?)
            }
            Value::Mapping(mapping) => {
                let mut map = BTreeMap::new();
                for (key, value) in mapping {
                    map.insert(map_key(key)?, Node::try_from(value)?);
                }
                Node::Map(map)
            }
            Value::Tagged(tagged) => {
                let tag = tagged.tag.to_string();
                intrinsic(tag.trim_start_matches('!'), tagged.value)?
            }
        })
    }
}

fn map_key(key: Value) -> Result<String> {
    match key {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(HerogateError::malformed(
            "template",
            format!("unsupported map key {:?}", other),
        )),
    }
}

/// Expand a short-form intrinsic function (`!Ref X`) into its long form (`{Ref: X}`).
fn intrinsic(name: &str, value: Value) -> Result<Node> {
    let key = match name {
        "Ref" | "Condition" => name.to_string(),
        _ => format!("Fn::{}", name),
    };

    let value = match (name, value) {
        // `!GetAtt Resource.Attribute` is the short form of `[Resource, Attribute]`
        ("GetAtt", Value::String(s)) => match s.split_once('.') {
            Some((resource, attribute)) => {
                Node::List(vec![Node::string(resource), Node::string(attribute)])
            }
            None => Node::string(s),
        },
        (_, value) => Node::try_from(value)?,
    };

    Ok(Node::map([(key, value)]))
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Node::Map(map) => {
                let mut state = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map {
                    state.serialize_entry(key, value)?;
                }
                state.end()
            }
            Node::List(list) => {
                let mut state = serializer.serialize_seq(Some(list.len()))?;
                for item in list {
                    state.serialize_element(item)?;
                }
                state.end()
            }
            Node::Scalar(Scalar::Null) => serializer.serialize_unit(),
            Node::Scalar(Scalar::Bool(b)) => serializer.serialize_bool(*b),
            Node::Scalar(Scalar::Number(n)) => n.serialize(serializer),
            Node::Scalar(Scalar::String(s)) => serializer.serialize_str(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Node {
        Node::try_from(serde_yaml::from_str::<Value>(yaml).unwrap()).unwrap()
    }

    #[test]
    fn test_short_form_tags_are_expanded() {
        let node = parse(
            r#"
Group: !Ref HerogateApplicationContainerLogs
Arn: !GetAtt HerogateRegistry.Arn
Name: !Sub "${AWS::StackName}-web"
"#,
        );

        let expected = parse(
            r#"
Group: { Ref: HerogateApplicationContainerLogs }
Arn: { "Fn::GetAtt": [HerogateRegistry, Arn] }
Name: { "Fn::Sub": "${AWS::StackName}-web" }
"#,
        );
        assert_eq!(node, expected);
    }

    #[test]
    fn test_non_string_keys_become_strings() {
        let node = parse("1: one\ntrue: yes\n");
        let map = node.as_map().unwrap();
        assert!(map.contains_key("1"));
        assert!(map.contains_key("true"));
    }

    #[test]
    fn test_render_sorts_keys() {
        let node = parse("b: 1\na: [x, {d: 2, c: 3}]\n");
        let rendered = serde_yaml::to_string(&node).unwrap();
        assert_eq!(rendered, "a:\n- x\n- c: 3\n  d: 2\nb: 1\n");
    }

    #[test]
    fn test_scalar_text() {
        assert_eq!(parse("42").as_scalar().unwrap().to_text(), "42");
        assert_eq!(parse("true").as_scalar().unwrap().to_text(), "true");
        assert_eq!(parse("~").as_scalar().unwrap().to_text(), "");
    }

    #[test]
    fn test_from_serialize() {
        #[derive(serde::Serialize)]
        #[serde(rename_all = "PascalCase")]
        struct Mapping {
            container_port: u16,
        }

        let node = Node::from_serialize(&Mapping { container_port: 80 }).unwrap();
        assert_eq!(node, parse("ContainerPort: 80"));
    }
}
