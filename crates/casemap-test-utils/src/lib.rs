//! Testing utilities for the casemap workspace
//!
//! Shared fixtures, an in-memory backend and a recording notifier.

#![allow(missing_docs)]

mod backend;

pub use backend::{BackendCall, InMemoryBackend};

use casemap_model::{Case, CaseField, CaseMode, Hierarchy, Module, Step};
use casemap_sync::{MutationDispatcher, Notice, Notifier, Severity};
use std::sync::{Arc, Mutex, PoisonError};

/// Notifier that keeps every notice
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn messages(&self, severity: Severity) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter(|notice| notice.severity == severity)
            .map(|notice| notice.message)
            .collect()
    }

    pub fn clear(&self) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: &Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice.clone());
    }
}

/// Route `tracing` output to the test harness, honouring `RUST_LOG`
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Module A holding steps-mode case C1 with one step, and an empty module B
pub fn two_module_hierarchy() -> Hierarchy {
    Hierarchy::all("All")
        .with_module(Module::new("A", "Module A").with_case(
            Case::new("C1", "login").with_steps(vec![Step::new("<p>open</p>", "<p>ok</p>")]),
        ))
        .with_module(Module::new("B", "Module B"))
}

/// Text-mode case C2 with an empty description inside module A
pub fn text_mode_hierarchy() -> Hierarchy {
    Hierarchy::all("All").with_module(
        Module::new("A", "Module A").with_case(Case::new("C2", "report").with_mode(CaseMode::Text)),
    )
}

/// A > A1 > A2 with a case in A2, plus a case at the root
pub fn nested_hierarchy() -> Hierarchy {
    Hierarchy::all("All")
        .with_module(
            Module::new("A", "Module A").with_child(
                Module::new("A1", "Module A1").with_child(
                    Module::new("A2", "Module A2").with_case(
                        Case::new("C3", "deep")
                            .with_code("TC-3")
                            .with_field(CaseField::Precondition, "<p>logged in</p>")
                            .with_steps(vec![Step::new("a", "b"), Step::new("c", "d")]),
                    ),
                ),
            ),
        )
        .with_module(Module::new("B", "Module B"))
        .with_case(Case::new("C4", "loose"))
}

/// Dispatcher over an in-memory backend, already loaded
pub async fn loaded_dispatcher(
    hierarchy: Hierarchy,
) -> (MutationDispatcher, Arc<InMemoryBackend>, Arc<RecordingNotifier>) {
    let backend = Arc::new(InMemoryBackend::new(hierarchy));
    let notifier = Arc::new(RecordingNotifier::new());
    let mut dispatcher = MutationDispatcher::new(backend.clone(), notifier.clone());
    dispatcher.reload().await;
    backend.clear_calls().await;
    (dispatcher, backend, notifier)
}
