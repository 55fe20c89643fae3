//! Casemap Sync
//!
//! Keeps the mind-map view and the backend case repository consistent.
//!
//! # Core Concepts
//!
//! - **Backend**: [`CaseBackend`] is the only path to storage; every call is awaited
//! - **Dispatcher**: [`MutationDispatcher`] runs edit plans, patches the mirror
//!   after confirmed writes and reloads when the plan says so
//! - **Notices**: each failure is reported once through a [`Notifier`]
//! - **Configuration**: [`MindmapConfig`] supplies labels and notice wording
//!
//! # Example
//!
//! ```rust,ignore
//! use casemap_sync::{MutationDispatcher, TracingNotifier};
//! use std::sync::Arc;
//!
//! let mut dispatcher = MutationDispatcher::new(backend, Arc::new(TracingNotifier));
//! dispatcher.reload().await;
//! let outcome = dispatcher.handle_json(payload).await?;
//! println!("{} mutations sent", outcome.attempted);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod backend;
mod config;
mod dispatcher;
mod error;
mod notice;

pub use backend::{apply_mutation, CaseBackend};
pub use config::{ConfigError, MindmapConfig, NoticeTexts};
pub use dispatcher::{DispatchOutcome, MutationDispatcher};
pub use error::{BackendError, SyncError};
pub use notice::{Notice, Notifier, Severity, TracingNotifier};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving the mind map
    pub use crate::{
        BackendError, CaseBackend, DispatchOutcome, MindmapConfig, MutationDispatcher, Notice,
        Notifier, SyncError,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
