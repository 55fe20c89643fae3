//! Constraint gate
//!
//! Pre-flight predicates the widget consults before it lets a drag or an
//! in-place edit begin. Only the gestures the edit interpreter understands
//! are admitted; every generic widget primitive is refused.

use casemap_model::Address;
use tracing::debug;

/// Why a gesture was refused
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Denial {
    /// No node is being dragged
    #[error("nothing is being dragged")]
    NothingDragged,

    /// Target cannot receive children
    #[error("{0} cannot contain moved nodes")]
    TargetNotContainer(Address),

    /// Target cannot have structural siblings
    #[error("{0} is not a module or case")]
    TargetNotSibling(Address),

    /// Dragged node is neither a module nor a case
    #[error("{0} cannot be moved")]
    NotMovable(Address),

    /// Dragged node is the target itself
    #[error("{0} cannot be dropped onto itself")]
    OntoSelf(Address),

    /// Label of this node is not edited in place
    #[error("{0} is not editable in place")]
    NotEditable(Address),

    /// Generic widget primitive
    #[error("{0:?} is not supported on this graph")]
    Unsupported(GenericEdit),
}

/// Generic editing primitives offered by the widget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenericEdit {
    /// Add a child node
    AddChild,
    /// Insert a sibling node
    InsertSibling,
    /// Insert a parent node
    InsertParent,
    /// Remove nodes
    RemoveNodes,
    /// Move a node up among its siblings
    MoveUp,
    /// Move a node down among its siblings
    MoveDown,
}

/// Admission predicates
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstraintGate;

impl ConstraintGate {
    /// Create the gate
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Admit dropping `dragged` into `target`
    ///
    /// # Errors
    /// The first [`Denial`] found.
    pub fn admit_move_into(&self, dragged: &[Address], target: &Address) -> Result<(), Denial> {
        if !matches!(target, Address::Root | Address::Module(_)) {
            return deny(Denial::TargetNotContainer(target.clone()));
        }
        check_dragged(dragged, target)
    }

    /// Admit dropping `dragged` before or after `target`
    ///
    /// # Errors
    /// The first [`Denial`] found.
    pub fn admit_move_beside(&self, dragged: &[Address], target: &Address) -> Result<(), Denial> {
        if !target.is_structural() {
            return deny(Denial::TargetNotSibling(target.clone()));
        }
        check_dragged(dragged, target)
    }

    /// Admit starting an in-place label edit
    ///
    /// # Errors
    /// [`Denial::NotEditable`] for module, root and unknown nodes.
    pub fn admit_begin_edit(&self, address: &Address) -> Result<(), Denial> {
        if address.is_label_editable() {
            Ok(())
        } else {
            deny(Denial::NotEditable(address.clone()))
        }
    }

    /// Generic primitives are always refused
    ///
    /// # Errors
    /// Always [`Denial::Unsupported`].
    pub fn admit_generic(&self, edit: GenericEdit) -> Result<(), Denial> {
        deny(Denial::Unsupported(edit))
    }

    /// Widget-facing form of [`admit_move_into`](Self::admit_move_into)
    #[must_use]
    pub fn can_move_into(&self, dragged: &[&str], target: &str) -> bool {
        decode_gesture(dragged, target)
            .is_some_and(|(dragged, target)| self.admit_move_into(&dragged, &target).is_ok())
    }

    /// Widget-facing form of [`admit_move_beside`](Self::admit_move_beside) for "before"
    #[must_use]
    pub fn can_move_before(&self, dragged: &[&str], target: &str) -> bool {
        self.can_move_beside(dragged, target)
    }

    /// Widget-facing form of [`admit_move_beside`](Self::admit_move_beside) for "after"
    #[must_use]
    pub fn can_move_after(&self, dragged: &[&str], target: &str) -> bool {
        self.can_move_beside(dragged, target)
    }

    /// Widget-facing form of [`admit_begin_edit`](Self::admit_begin_edit)
    #[must_use]
    pub fn can_begin_edit(&self, id: &str) -> bool {
        Address::decode(id).is_some_and(|address| self.admit_begin_edit(&address).is_ok())
    }

    fn can_move_beside(&self, dragged: &[&str], target: &str) -> bool {
        decode_gesture(dragged, target)
            .is_some_and(|(dragged, target)| self.admit_move_beside(&dragged, &target).is_ok())
    }
}

fn check_dragged(dragged: &[Address], target: &Address) -> Result<(), Denial> {
    if dragged.is_empty() {
        return deny(Denial::NothingDragged);
    }
    for address in dragged {
        if !address.is_structural() {
            return deny(Denial::NotMovable(address.clone()));
        }
        if address == target {
            return deny(Denial::OntoSelf(address.clone()));
        }
    }
    Ok(())
}

/// Every id must decode; one malformed id refuses the whole drag
fn decode_gesture(dragged: &[&str], target: &str) -> Option<(Vec<Address>, Address)> {
    let target = Address::decode(target)?;
    let dragged = dragged
        .iter()
        .map(|id| Address::decode(id))
        .collect::<Option<Vec<_>>>()?;
    Some((dragged, target))
}

fn deny(denial: Denial) -> Result<(), Denial> {
    debug!(reason = %denial, "gate denied gesture");
    Err(denial)
}
