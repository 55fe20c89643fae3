//! Casemap Edit
//!
//! Everything between a widget gesture and a backend write:
//! - [`Operation`]: typed gestures decoded once from the widget payload
//! - [`ConstraintGate`]: admission predicates consulted before a drag or edit starts
//! - [`EditInterpreter`]: turns gestures and menu actions into [`EditPlan`]s
//! - [`menu_for`]: which context-menu entries a node offers
//!
//! Planning is pure. The interpreter reads the graph document and the case
//! mirror and returns data; issuing the writes is left to the dispatcher.
//!
//! # Example
//!
//! ```rust,ignore
//! use casemap_edit::{EditInterpreter, Operation};
//!
//! let op = Operation::from_json(payload)?;
//! let plan = EditInterpreter::default().plan(&document, &mirror, &op)?;
//! for planned in &plan.mutations {
//!     println!("{}", planned.mutation.kind());
//! }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod actions;
mod error;
mod gate;
mod interpreter;
mod menu;
mod operation;
mod plan;

pub use actions::{ContextAction, SEEDED_BLOCK};
pub use error::{OperationError, UnresolvedTarget};
pub use gate::{ConstraintGate, Denial, GenericEdit};
pub use interpreter::{pad_steps, EditInterpreter, InterpreterOptions, MAX_STEP_PADDING};
pub use menu::{menu_for, menu_for_node, resolve_mode, DeleteLabel, Menu, MenuItem};
pub use operation::{MoveOperation, Operation, Placement, RawNode, RawOperation};
pub use plan::{
    EditPlan, FailureKind, Mutation, NoticeKey, NoticeLevel, PlannedMutation, RejectReason,
    Rejection, ReloadPolicy, Skip,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for planning edits
    pub use crate::{
        ConstraintGate, ContextAction, EditInterpreter, EditPlan, Mutation, Operation, Placement,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
