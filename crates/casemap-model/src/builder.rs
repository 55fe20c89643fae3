//! Tree builder
//!
//! Flattens a fetched hierarchy into the graph document the widget renders
//! and, in the same walk, populates a fresh case mirror.

use crate::address::Address;
use crate::graph::{GraphDocument, GraphNode, NodeTag};
use crate::hierarchy::{Case, CaseField, CaseMode, Hierarchy, Module, ModuleId};
use crate::markup::{strip_markup, PLACEHOLDER};
use crate::mirror::CaseMirror;
use tracing::debug;

/// Labels the builder needs from configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Label of the synthetic root
    pub root_label: String,
    /// Label of a case with no name
    pub unnamed_case_label: String,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            root_label: "All cases".to_string(),
            unnamed_case_label: "(unnamed case)".to_string(),
        }
    }
}

/// Document and mirror produced by one build
#[derive(Debug, Clone)]
pub struct BuiltTree {
    /// Graph document for the widget
    pub document: GraphDocument,
    /// Mirror of every case in the document
    pub mirror: CaseMirror,
}

/// Builds graph documents from hierarchies
#[derive(Debug, Clone, Default)]
pub struct TreeBuilder {
    options: BuildOptions,
}

impl TreeBuilder {
    /// Create a builder
    #[inline]
    #[must_use]
    pub fn new(options: BuildOptions) -> Self {
        Self { options }
    }

    /// Build options in use
    #[inline]
    #[must_use]
    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Build the document and a fresh mirror
    ///
    /// With the synthetic `all` root the document root is [`Address::Root`]
    /// holding the top-level modules followed by root-level cases. A filtered
    /// fetch returns a module as root, which becomes a module node.
    #[must_use]
    pub fn build(&self, hierarchy: &Hierarchy) -> BuiltTree {
        let mut mirror = CaseMirror::new();
        let root = match hierarchy.as_module() {
            Some(module) => self.module_node(&module, &mut mirror),
            None => {
                let mut children: Vec<GraphNode> = hierarchy
                    .children
                    .iter()
                    .map(|module| self.module_node(module, &mut mirror))
                    .collect();
                children.extend(
                    hierarchy
                        .cases
                        .iter()
                        .map(|case| self.case_node(case, None, &mut mirror)),
                );
                GraphNode::new(Address::Root, self.options.root_label.clone())
                    .with_children(children)
            }
        };
        let document = GraphDocument::new(root);
        debug!(nodes = document.len(), cases = mirror.len(), "built graph document");
        BuiltTree { document, mirror }
    }

    fn module_node(&self, module: &Module, mirror: &mut CaseMirror) -> GraphNode {
        let mut children: Vec<GraphNode> = module
            .children
            .iter()
            .map(|child| self.module_node(child, mirror))
            .collect();
        children.extend(
            module
                .cases
                .iter()
                .map(|case| self.case_node(case, Some(&module.id), mirror)),
        );
        GraphNode::new(Address::Module(module.id.clone()), module.name.clone())
            .with_tag(NodeTag::Module)
            .with_children(children)
    }

    fn case_node(&self, case: &Case, module: Option<&ModuleId>, mirror: &mut CaseMirror) -> GraphNode {
        mirror.insert(case.clone(), module.cloned());

        let mut children = Vec::new();
        if let Some(node) = optional_prop(case, CaseField::Precondition, NodeTag::Precondition) {
            children.push(node);
        }
        match case.mode {
            CaseMode::Text => {
                if let Some(node) =
                    optional_prop(case, CaseField::TextDescription, NodeTag::TextDescription)
                {
                    let result = text_node(
                        Address::CaseProp {
                            case: case.id.clone(),
                            field: CaseField::TextResult,
                        },
                        &case.text_result,
                    )
                    .with_tag(NodeTag::ExpectedResult);
                    children.push(node.with_child(result));
                }
            }
            CaseMode::Steps => {
                for (index, step) in case.steps.iter().enumerate() {
                    let result = text_node(
                        Address::StepRes {
                            case: case.id.clone(),
                            index,
                        },
                        &step.result,
                    )
                    .with_tag(NodeTag::ExpectedResult);
                    let description = text_node(
                        Address::StepDesc {
                            case: case.id.clone(),
                            index,
                        },
                        &step.description,
                    )
                    .with_tag(NodeTag::StepDescription)
                    .with_child(result);
                    children.push(description);
                }
            }
        }
        if let Some(node) = optional_prop(case, CaseField::Remark, NodeTag::Remark) {
            children.push(node);
        }

        let mut node = GraphNode::new(Address::Case(case.id.clone()), self.case_label(case))
            .with_tag(NodeTag::Case)
            .with_children(children);
        node.mode = Some(case.mode);
        node
    }

    /// Node label of a case: code and name, or the unnamed label
    #[must_use]
    pub fn case_label(&self, case: &Case) -> String {
        let name = case.name.trim();
        if name.is_empty() {
            return self.options.unnamed_case_label.clone();
        }
        match case.display_code() {
            Some(code) => format!("{code} {name}"),
            None => name.to_string(),
        }
    }
}

/// Property node, present only when the stripped text is non-empty
fn optional_prop(case: &Case, field: CaseField, tag: NodeTag) -> Option<GraphNode> {
    let markup = case.field(field);
    if strip_markup(markup).is_empty() {
        return None;
    }
    let address = Address::CaseProp {
        case: case.id.clone(),
        field,
    };
    Some(text_node(address, markup).with_tag(tag))
}

/// Leaf with a stripped label, or the placeholder when blank
fn text_node(address: Address, stored: &str) -> GraphNode {
    let text = strip_markup(stored);
    if text.is_empty() || text == PLACEHOLDER {
        GraphNode::new(address, PLACEHOLDER).as_placeholder()
    } else {
        GraphNode::new(address, text)
    }
}
