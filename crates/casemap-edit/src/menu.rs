//! Context menu visibility

use casemap_model::{Address, CaseField, CaseMode, GraphNode};
use serde::Serialize;

/// Entries the mind-map context menu may offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuItem {
    /// Create a case in the module
    AddCase,
    /// Append a blank step
    AddStep,
    /// Insert a blank step before this one
    InsertStepAbove,
    /// Insert a blank step after this one
    InsertStepBelow,
    /// Show an empty precondition
    AddPrecondition,
    /// Show an empty text description
    AddTextDescription,
    /// Show an empty remark
    AddRemark,
    /// Switch the case to steps mode
    SwitchToSteps,
    /// Switch the case to text mode
    SwitchToText,
    /// Rename the module
    RenameModule,
    /// Delete or clear the node
    Delete,
}

/// Wording of the delete entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteLabel {
    /// Removes the node
    #[default]
    Delete,
    /// Empties the node's text
    ClearText,
}

/// Visible menu for one node
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Menu {
    /// Entries in display order
    pub items: Vec<MenuItem>,
    /// How the delete entry is labelled
    pub delete_label: DeleteLabel,
}

impl Menu {
    fn new(items: Vec<MenuItem>) -> Self {
        Self {
            items,
            delete_label: DeleteLabel::Delete,
        }
    }

    fn clearing(items: Vec<MenuItem>) -> Self {
        Self {
            items,
            delete_label: DeleteLabel::ClearText,
        }
    }

    /// Whether the entry is offered
    #[inline]
    #[must_use]
    pub fn contains(&self, item: MenuItem) -> bool {
        self.items.contains(&item)
    }
}

/// Menu for a node address given the case mode
#[must_use]
pub fn menu_for(address: &Address, mode: CaseMode) -> Menu {
    use MenuItem::{
        AddCase, AddPrecondition, AddRemark, AddStep, AddTextDescription, Delete, InsertStepAbove,
        InsertStepBelow, RenameModule, SwitchToSteps, SwitchToText,
    };

    match address {
        Address::Root => Menu::new(vec![AddCase]),
        Address::Module(_) => Menu::new(vec![AddCase, RenameModule]),
        Address::Case(_) => match mode {
            CaseMode::Text => Menu::new(vec![AddTextDescription, SwitchToSteps, Delete]),
            CaseMode::Steps => Menu::new(vec![
                AddCase,
                AddStep,
                AddPrecondition,
                AddRemark,
                SwitchToText,
                Delete,
            ]),
        },
        Address::CaseProp {
            field: CaseField::Precondition | CaseField::Remark,
            ..
        } => Menu::clearing(vec![Delete]),
        Address::StepDesc { .. } => {
            Menu::clearing(vec![InsertStepAbove, InsertStepBelow, Delete])
        }
        Address::CaseProp { .. } | Address::StepRes { .. } => Menu::default(),
    }
}

/// Menu for a rendered node, using the mode it carries
#[must_use]
pub fn menu_for_node(node: &GraphNode) -> Menu {
    menu_for(&node.address, node.mode.unwrap_or_default())
}

/// Most recent known mode wins over the one rendered on the node
#[inline]
#[must_use]
pub fn resolve_mode(rendered: Option<CaseMode>, latest: Option<CaseMode>) -> CaseMode {
    latest.or(rendered).unwrap_or_default()
}
