//! Serializable node descriptors

use serde::{Deserialize, Serialize};

use crate::Reference;

/// A reference as it appears in serialized form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MarshalledReference {
    Number(i64),
    String(String),
}

impl From<&MarshalledReference> for Reference {
    fn from(value: &MarshalledReference) -> Self {
        match value {
            MarshalledReference::Number(value) => Reference::Number(*value),
            MarshalledReference::String(value) => Reference::from(value.as_str()),
        }
    }
}

/// A node that has not been built yet.
///
/// `children: None` describes a terminal node, `Some(vec![])` a node with a children sequence that
/// currently holds nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarshalledNode {
    pub reference: MarshalledReference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<MarshalledNode>>,
}

impl MarshalledNode {
    pub fn new(reference: impl Into<MarshalledReference>) -> Self {
        Self {
            reference: reference.into(),
            children: None,
        }
    }

    pub fn with_children(mut self, children: Vec<MarshalledNode>) -> Self {
        self.children = Some(children);
        self
    }

    pub fn reference(&self) -> Reference {
        Reference::from(&self.reference)
    }
}

impl From<&str> for MarshalledReference {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<i64> for MarshalledReference {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

#[test]
fn test_parse_marshalled_node() {
    let node: MarshalledNode = serde_json::from_str(
        r#"{ "reference": "list", "children": [{ "reference": "a" }, { "reference": 2, "children": [] }] }"#,
    )
    .unwrap();

    assert_eq!(
        node,
        MarshalledNode::new("list").with_children(vec![
            MarshalledNode::new("a"),
            MarshalledNode::new(2i64).with_children(vec![]),
        ])
    );
    assert_eq!(node.reference(), Reference::from("list"));
}
