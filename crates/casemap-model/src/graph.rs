//! Graph document handed to the rendering widget
//!
//! A strict tree of [`GraphNode`]s addressed by [`Address`]. Read-only
//! lookups (including the reverse parent lookup) live here. Structure only
//! changes through a rebuild; labels may be patched after a confirmed edit.

use crate::address::Address;
use crate::hierarchy::{CaseMode, ModuleId};
use crate::markup::PLACEHOLDER;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Display tag attached to a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeTag {
    /// Module node
    Module,
    /// Case node
    Case,
    /// Precondition property
    Precondition,
    /// Remark property
    Remark,
    /// Text-mode description
    TextDescription,
    /// Step description
    StepDescription,
    /// Step result or text-mode result
    ExpectedResult,
}

/// One node of the graph document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Node identity
    #[serde(serialize_with = "encode_address", deserialize_with = "decode_address")]
    pub address: Address,
    /// Text shown on the node
    pub label: String,
    /// Whether `label` is the empty placeholder rather than content
    #[serde(default)]
    pub placeholder: bool,
    /// Display tags
    #[serde(default)]
    pub tags: Vec<NodeTag>,
    /// Case mode, carried on case nodes only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<CaseMode>,
    /// Ordered children
    #[serde(default)]
    pub children: Vec<GraphNode>,
}

impl GraphNode {
    /// Create a leaf node
    #[must_use]
    pub fn new(address: Address, label: impl Into<String>) -> Self {
        Self {
            address,
            label: label.into(),
            placeholder: false,
            tags: Vec::new(),
            mode: None,
            children: Vec::new(),
        }
    }

    /// With tag
    #[inline]
    #[must_use]
    pub fn with_tag(mut self, tag: NodeTag) -> Self {
        self.tags.push(tag);
        self
    }

    /// With children
    #[inline]
    #[must_use]
    pub fn with_children(mut self, children: Vec<GraphNode>) -> Self {
        self.children = children;
        self
    }

    /// With child appended
    #[inline]
    #[must_use]
    pub fn with_child(mut self, child: GraphNode) -> Self {
        self.children.push(child);
        self
    }

    /// Mark the label as placeholder text
    #[inline]
    #[must_use]
    pub fn as_placeholder(mut self) -> Self {
        self.placeholder = true;
        self
    }

    /// Number of nodes in this subtree, including itself
    #[must_use]
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(GraphNode::subtree_len).sum::<usize>()
    }
}

/// Tree rooted at the synthetic root (or the filtered module)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphDocument {
    /// Root node
    pub root: GraphNode,
}

/// Module that structurally contains a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Container {
    /// Directly under the synthetic root
    Root,
    /// Under a module
    Module(ModuleId),
}

impl Container {
    /// Target module id, `None` meaning "no module"
    #[must_use]
    pub fn into_module_id(self) -> Option<ModuleId> {
        match self {
            Self::Root => None,
            Self::Module(id) => Some(id),
        }
    }
}

impl GraphDocument {
    /// Wrap a root node
    #[inline]
    #[must_use]
    pub fn new(root: GraphNode) -> Self {
        Self { root }
    }

    /// Find a node by address
    #[must_use]
    pub fn find(&self, target: &Address) -> Option<&GraphNode> {
        fn walk<'a>(node: &'a GraphNode, target: &Address) -> Option<&'a GraphNode> {
            if &node.address == target {
                return Some(node);
            }
            node.children.iter().find_map(|child| walk(child, target))
        }
        walk(&self.root, target)
    }

    /// Mutable node lookup
    pub fn find_mut(&mut self, target: &Address) -> Option<&mut GraphNode> {
        fn walk<'a>(node: &'a mut GraphNode, target: &Address) -> Option<&'a mut GraphNode> {
            if &node.address == target {
                return Some(node);
            }
            node.children
                .iter_mut()
                .find_map(|child| walk(child, target))
        }
        walk(&mut self.root, target)
    }

    /// Replace a node label after a confirmed edit
    ///
    /// Blank labels and the placeholder itself render as the placeholder.
    /// Returns false when the node is not in the document.
    pub fn relabel(&mut self, target: &Address, label: &str) -> bool {
        let Some(node) = self.find_mut(target) else {
            return false;
        };
        let text = label.trim();
        if text.is_empty() || text == PLACEHOLDER {
            node.label = PLACEHOLDER.to_string();
            node.placeholder = true;
        } else {
            node.label = label.to_string();
            node.placeholder = false;
        }
        true
    }

    /// Immediate structural parent of `target`
    ///
    /// `None` when `target` is the root or does not occur in the document.
    #[must_use]
    pub fn find_parent(&self, target: &Address) -> Option<&GraphNode> {
        fn walk<'a>(node: &'a GraphNode, target: &Address) -> Option<&'a GraphNode> {
            for child in &node.children {
                if &child.address == target {
                    return Some(node);
                }
                if let Some(found) = walk(child, target) {
                    return Some(found);
                }
            }
            None
        }
        walk(&self.root, target)
    }

    /// Module or root the node currently sits in
    ///
    /// `None` when the node is missing, is the root, or its parent is neither
    /// a module nor the synthetic root.
    #[must_use]
    pub fn container_of(&self, target: &Address) -> Option<Container> {
        match &self.find_parent(target)?.address {
            Address::Root => Some(Container::Root),
            Address::Module(id) => Some(Container::Module(id.clone())),
            _ => None,
        }
    }

    /// Whether `descendant` lies strictly inside the subtree of `ancestor`
    #[must_use]
    pub fn is_descendant(&self, ancestor: &Address, descendant: &Address) -> bool {
        self.find(ancestor).is_some_and(|node| {
            node.children
                .iter()
                .any(|child| subtree_contains(child, descendant))
        })
    }

    /// Every address in depth-first order
    #[must_use]
    pub fn addresses(&self) -> Vec<&Address> {
        fn walk<'a>(node: &'a GraphNode, out: &mut Vec<&'a Address>) {
            out.push(&node.address);
            for child in &node.children {
                walk(child, out);
            }
        }
        let mut out = Vec::new();
        walk(&self.root, &mut out);
        out
    }

    /// Total node count
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.root.subtree_len()
    }

    /// A document always has its root
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
}

fn subtree_contains(node: &GraphNode, target: &Address) -> bool {
    &node.address == target || node.children.iter().any(|child| subtree_contains(child, target))
}

fn encode_address<S: Serializer>(address: &Address, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(address)
}

fn decode_address<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Address, D::Error> {
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}
