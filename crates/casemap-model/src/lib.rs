//! Casemap Model
//!
//! Data model behind the case mind-map: the backend hierarchy, the typed
//! node address scheme, the graph document handed to the rendering widget
//! and the local case mirror.
//!
//! # Core Concepts
//!
//! - [`Address`]: typed identity of a graph node, string form at the boundary
//! - [`Hierarchy`]: modules, cases and steps as fetched from the backend
//! - [`TreeBuilder`]: turns a hierarchy into a [`GraphDocument`] plus a [`CaseMirror`]
//! - [`GraphDocument::find_parent`]: reverse lookup of a node's structural parent
//!
//! # Example
//!
//! ```rust,ignore
//! use casemap_model::{Hierarchy, Module, Case, TreeBuilder};
//!
//! let hierarchy = Hierarchy::all("All")
//!     .with_module(Module::new("a", "Auth").with_case(Case::new("c1", "Login")));
//! let tree = TreeBuilder::default().build(&hierarchy);
//! assert_eq!(tree.document.addresses().len(), 3);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod address;
mod builder;
mod graph;
mod hierarchy;
pub mod markup;
mod mirror;

pub use address::{Address, AddressError, AddressKind, ROOT_ADDRESS};
pub use builder::{BuildOptions, BuiltTree, TreeBuilder};
pub use graph::{Container, GraphDocument, GraphNode, NodeTag};
pub use hierarchy::{
    Case, CaseField, CaseId, CaseMode, CasePatch, Hierarchy, Module, ModuleCounts, ModuleFilter,
    ModuleId, NewCase, Step, ALL_ROOT_ID,
};
pub use markup::{plain_to_markup, strip_markup, EMPTY_BLOCK, PLACEHOLDER};
pub use mirror::{CaseMirror, MirrorEntry};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the case hierarchy and graph
    pub use crate::{
        Address, Case, CaseField, CaseId, CaseMirror, CaseMode, CasePatch, GraphDocument,
        GraphNode, Hierarchy, Module, ModuleId, Step, TreeBuilder,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
