//! Mutation dispatcher
//!
//! Owns the loaded graph document, the case mirror and the module counts.
//! Carries out the interpreter's plans:
//! - mutations are awaited one after another, a failure does not stop the rest
//! - the mirror is patched only after the backend confirms a write
//! - every failure reaches the notifier once, nothing escapes silently
//! - the reload decision comes from the plan, or from a stale mirror

use crate::backend::{apply_mutation, CaseBackend};
use crate::config::MindmapConfig;
use crate::error::{BackendError, SyncError};
use crate::notice::{Notice, Notifier};
use casemap_edit::{
    menu_for, resolve_mode, ConstraintGate, ContextAction, EditInterpreter, EditPlan, Menu,
    Mutation, Operation, PlannedMutation, RawOperation, Skip,
};
use casemap_model::{Address, CaseMirror, GraphDocument, ModuleCounts, ModuleFilter, TreeBuilder};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What one dispatched gesture did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchOutcome {
    /// Mutations sent to the backend
    pub attempted: usize,
    /// Mutations the backend confirmed
    pub succeeded: usize,
    /// Mutations the backend rejected
    pub failed: usize,
    /// Elements refused before any call
    pub rejected: usize,
    /// Why nothing was written, for skipped label commits
    pub skipped: Option<Skip>,
    /// Whether a reload ran afterwards
    pub reloaded: bool,
}

impl DispatchOutcome {
    /// Whether no backend mutation was issued
    #[inline]
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.attempted == 0
    }
}

/// Single entry point for widget gestures and menu actions
pub struct MutationDispatcher {
    backend: Arc<dyn CaseBackend>,
    notifier: Arc<dyn Notifier>,
    config: MindmapConfig,
    builder: TreeBuilder,
    interpreter: EditInterpreter,
    gate: ConstraintGate,
    filter: ModuleFilter,
    document: Option<GraphDocument>,
    mirror: CaseMirror,
    counts: ModuleCounts,
}

impl std::fmt::Debug for MutationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationDispatcher")
            .field("filter", &self.filter)
            .field("loaded", &self.document.is_some())
            .field("mirrored", &self.mirror.len())
            .finish_non_exhaustive()
    }
}

impl MutationDispatcher {
    /// Create a dispatcher with default configuration; nothing is loaded yet
    #[must_use]
    pub fn new(backend: Arc<dyn CaseBackend>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            backend,
            notifier,
            config: MindmapConfig::default(),
            builder: TreeBuilder::default(),
            interpreter: EditInterpreter::default(),
            gate: ConstraintGate::new(),
            filter: ModuleFilter::all(),
            document: None,
            mirror: CaseMirror::new(),
            counts: ModuleCounts::default(),
        }
    }

    /// With configuration
    #[must_use]
    pub fn with_config(mut self, config: MindmapConfig) -> Self {
        self.builder = TreeBuilder::new(config.build_options());
        self.interpreter = EditInterpreter::new(config.interpreter_options());
        self.config = config;
        self
    }

    /// With module filter
    #[inline]
    #[must_use]
    pub fn with_filter(mut self, filter: ModuleFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Loaded graph document, if any
    #[inline]
    #[must_use]
    pub fn document(&self) -> Option<&GraphDocument> {
        self.document.as_ref()
    }

    /// Case mirror
    #[inline]
    #[must_use]
    pub fn mirror(&self) -> &CaseMirror {
        &self.mirror
    }

    /// Module counts from the last reload
    #[inline]
    #[must_use]
    pub fn counts(&self) -> &ModuleCounts {
        &self.counts
    }

    /// Active module filter
    #[inline]
    #[must_use]
    pub fn filter(&self) -> &ModuleFilter {
        &self.filter
    }

    /// Admission predicates for the widget
    #[inline]
    #[must_use]
    pub fn gate(&self) -> &ConstraintGate {
        &self.gate
    }

    /// Configuration in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &MindmapConfig {
        &self.config
    }

    /// Context menu for a node in the loaded document
    ///
    /// The mirrored case mode wins over the mode rendered on the node.
    #[must_use]
    pub fn menu_for(&self, address: &Address) -> Option<Menu> {
        let node = self.document.as_ref()?.find(address)?;
        let latest = address
            .case_id()
            .and_then(|id| self.mirror.get(id))
            .map(|case| case.mode);
        Some(menu_for(address, resolve_mode(node.mode, latest)))
    }

    /// Change the module filter and reload
    pub async fn set_filter(&mut self, filter: ModuleFilter) -> bool {
        self.filter = filter;
        self.reload().await
    }

    /// Fetch hierarchy and counts concurrently and rebuild the document
    ///
    /// Either fetch may fail without blocking the other. Returns whether a
    /// document is loaded afterwards.
    pub async fn reload(&mut self) -> bool {
        let (hierarchy, counts) = futures::join!(
            self.backend.fetch_hierarchy(self.filter.clone()),
            self.backend.fetch_module_counts(self.filter.clone()),
        );

        match counts {
            Ok(counts) => self.counts = counts,
            Err(err) => {
                warn!(error = %err, "module counts unavailable");
                self.counts = ModuleCounts::default();
            }
        }

        match hierarchy {
            Ok(hierarchy) => {
                let tree = self.builder.build(&hierarchy);
                info!(
                    nodes = tree.document.len(),
                    cases = tree.mirror.len(),
                    "mind map reloaded"
                );
                self.document = Some(tree.document);
                self.mirror = tree.mirror;
                true
            }
            Err(err) => {
                warn!(error = %err, "hierarchy reload failed");
                self.document = None;
                self.mirror = CaseMirror::new();
                let text = err.user_message(&self.config.notices.load_failed);
                self.notifier.notify(&Notice::error(text));
                false
            }
        }
    }

    /// Handle a widget payload encoded as JSON
    ///
    /// # Errors
    /// See [`handle_operation`](Self::handle_operation).
    pub async fn handle_json(&mut self, raw: &str) -> Result<DispatchOutcome, SyncError> {
        let raw = RawOperation::from_json(raw).map_err(|err| {
            debug!(error = %err, "ignoring undecodable widget payload");
            err
        })?;
        self.handle_operation(raw).await
    }

    /// Handle one completed widget gesture
    ///
    /// # Errors
    /// - [`SyncError::Operation`] when the payload does not decode (no notice)
    /// - [`SyncError::NotLoaded`] when no document is loaded
    /// - [`SyncError::UnresolvedTarget`] when a move has no target module (no calls)
    /// - [`SyncError::Backend`] with the first rejection, after notices and reload
    pub async fn handle_operation(
        &mut self,
        raw: RawOperation,
    ) -> Result<DispatchOutcome, SyncError> {
        let operation = Operation::try_from(raw).map_err(|err| {
            debug!(error = %err, "ignoring undecodable widget operation");
            err
        })?;
        self.dispatch(&operation).await
    }

    /// Handle an already decoded gesture
    ///
    /// # Errors
    /// See [`handle_operation`](Self::handle_operation).
    pub async fn dispatch(&mut self, operation: &Operation) -> Result<DispatchOutcome, SyncError> {
        let document = self.document.as_ref().ok_or(SyncError::NotLoaded)?;
        let plan = self
            .interpreter
            .plan(document, &self.mirror, operation)
            .map_err(|err| {
                warn!(operation = operation.name(), error = %err, "move rejected");
                err
            })?;

        let relabel = match operation {
            Operation::FinishEdit { address, label } => Some((address.clone(), label.clone())),
            Operation::Move(_) => None,
        };
        self.execute(plan, relabel).await
    }

    /// Plan and run a context-menu action on a node
    ///
    /// # Errors
    /// [`SyncError::NotLoaded`] without a document; [`SyncError::Backend`]
    /// with the first rejection.
    pub async fn handle_context_action(
        &mut self,
        address: &Address,
        action: ContextAction,
    ) -> Result<DispatchOutcome, SyncError> {
        let document = self.document.as_ref().ok_or(SyncError::NotLoaded)?;
        if document.find(address).is_none() {
            debug!(address = %address, "context action on node outside the document");
            return Ok(DispatchOutcome::default());
        }
        let plan = self.interpreter.plan_action(&self.mirror, address, &action);
        self.execute(plan, None).await
    }

    async fn execute(
        &mut self,
        plan: EditPlan,
        relabel: Option<(Address, String)>,
    ) -> Result<DispatchOutcome, SyncError> {
        if let Some(key) = plan.notice {
            let notice = Notice::new(key.level().into(), self.config.notices.text(key));
            self.notifier.notify(&notice);
        }

        let mut outcome = DispatchOutcome {
            rejected: plan.rejected.len(),
            skipped: plan.skip,
            ..DispatchOutcome::default()
        };
        let mut first_error: Option<BackendError> = None;

        for planned in &plan.mutations {
            outcome.attempted += 1;
            match apply_mutation(self.backend.as_ref(), &planned.mutation).await {
                Ok(()) => {
                    outcome.succeeded += 1;
                    self.confirm(planned);
                }
                Err(err) => {
                    outcome.failed += 1;
                    warn!(kind = planned.mutation.kind(), error = %err, "backend rejected mutation");
                    let kind = plan.failure.unwrap_or_else(|| planned.mutation.failure());
                    let text = err.user_message(self.config.notices.failure(kind));
                    self.notifier.notify(&Notice::error(text));
                    first_error.get_or_insert(err);
                }
            }
        }

        if outcome.failed == 0 && outcome.succeeded > 0 {
            if let (Some((address, label)), Some(document)) = (relabel, self.document.as_mut()) {
                let label = match &address {
                    Address::Case(case_id) => self
                        .mirror
                        .get(case_id)
                        .map_or(label, |case| self.builder.case_label(case)),
                    _ => label,
                };
                document.relabel(&address, &label);
            }
        }

        // a structural write leaves the mirror stale whatever the plan says
        if plan.reload_after(outcome.attempted) || !self.mirror.is_fresh() {
            outcome.reloaded = self.reload().await;
        }

        debug!(
            attempted = outcome.attempted,
            changed = outcome.succeeded,
            failed = outcome.failed,
            "plan finished"
        );
        match first_error {
            Some(err) => Err(err.into()),
            None => Ok(outcome),
        }
    }

    /// Local follow-up for a confirmed write
    fn confirm(&mut self, planned: &PlannedMutation) {
        if let Some((case_id, patch)) = &planned.mirror_patch {
            if !self.mirror.apply(case_id, patch) {
                debug!(case_id = %case_id, "confirmed write for unmirrored case");
            }
        }
        if planned.mutation.is_structural() {
            self.mirror.invalidate();
        }
        match &planned.mutation {
            Mutation::DeleteCase(_) => {
                self.notifier
                    .notify(&Notice::success(&self.config.notices.delete_succeeded));
            }
            Mutation::DeleteModule(module_id) => {
                self.notifier
                    .notify(&Notice::success(&self.config.notices.delete_succeeded));
                if self.filter.module_ids.contains(module_id) {
                    info!(module_id = %module_id, "filtered module deleted, showing all modules");
                    self.filter = ModuleFilter::all();
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockCaseBackend;
    use crate::notice::{MockNotifier, Severity};
    use casemap_edit::Placement;
    use casemap_model::{Case, CaseField, CaseId, Hierarchy, Module, ModuleId, Step};
    use mockall::predicate::eq;
    use pretty_assertions::assert_eq;

    fn hierarchy() -> Hierarchy {
        Hierarchy::all("All")
            .with_module(
                Module::new("A", "Module A")
                    .with_case(Case::new("C1", "login").with_steps(vec![Step::new("open", "ok")])),
            )
            .with_module(Module::new("B", "Module B"))
    }

    fn expect_reloads(backend: &mut MockCaseBackend, times: usize) {
        backend
            .expect_fetch_hierarchy()
            .times(times)
            .returning(|_| Ok(hierarchy()));
        backend
            .expect_fetch_module_counts()
            .times(times)
            .returning(|_| Ok(ModuleCounts::default()));
    }

    fn quiet() -> MockNotifier {
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().times(0);
        notifier
    }

    fn dispatcher(backend: MockCaseBackend, notifier: MockNotifier) -> MutationDispatcher {
        MutationDispatcher::new(Arc::new(backend), Arc::new(notifier))
    }

    #[tokio::test]
    async fn reload_builds_document_and_mirror() {
        let mut backend = MockCaseBackend::new();
        expect_reloads(&mut backend, 1);
        let mut dispatcher = dispatcher(backend, quiet());

        assert!(dispatcher.reload().await);
        let document = dispatcher.document().unwrap();
        assert!(document.find(&Address::Case(CaseId::new("C1"))).is_some());
        assert!(dispatcher.mirror().contains(&CaseId::new("C1")));
        assert!(dispatcher.mirror().is_fresh());
    }

    #[tokio::test]
    async fn failed_counts_do_not_block_hierarchy() {
        let mut backend = MockCaseBackend::new();
        backend
            .expect_fetch_hierarchy()
            .times(1)
            .returning(|_| Ok(hierarchy()));
        backend
            .expect_fetch_module_counts()
            .times(1)
            .returning(|_| Err(BackendError::Transport("timeout".into())));
        let mut dispatcher = dispatcher(backend, quiet());

        assert!(dispatcher.reload().await);
        assert_eq!(dispatcher.counts(), &ModuleCounts::default());
    }

    #[tokio::test]
    async fn failed_hierarchy_leaves_no_document() {
        let mut backend = MockCaseBackend::new();
        backend
            .expect_fetch_hierarchy()
            .times(1)
            .returning(|_| Err(BackendError::Transport("down".into())));
        backend
            .expect_fetch_module_counts()
            .times(1)
            .returning(|_| Ok(ModuleCounts::default()));
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(|notice| {
                notice.severity == Severity::Error && notice.message == "Failed to load the mind map"
            })
            .times(1)
            .return_const(());
        let mut dispatcher = dispatcher(backend, notifier);

        assert!(!dispatcher.reload().await);
        assert!(dispatcher.document().is_none());
        assert!(dispatcher.mirror().is_empty());
    }

    #[tokio::test]
    async fn operations_need_a_loaded_document() {
        let mut dispatcher = dispatcher(MockCaseBackend::new(), quiet());
        let err = dispatcher
            .handle_operation(RawOperation::finish_edit("case:C1", "renamed"))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::NotLoaded));
    }

    #[tokio::test]
    async fn undecodable_payload_is_ignored_without_notice() {
        let mut dispatcher = dispatcher(MockCaseBackend::new(), quiet());
        let err = dispatcher
            .handle_operation(RawOperation::named("removeNodes"))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Operation(_)));
    }

    #[tokio::test]
    async fn unresolved_target_issues_no_calls() {
        let mut backend = MockCaseBackend::new();
        expect_reloads(&mut backend, 1);
        let mut dispatcher = dispatcher(backend, quiet());
        dispatcher.reload().await;

        let step = "stepdesc:C1:0";
        let err = dispatcher
            .handle_operation(RawOperation::moved(Placement::Into, ["case:C1"], step))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::UnresolvedTarget(_)));
    }

    #[tokio::test]
    async fn label_commit_patches_mirror_without_reload() {
        let mut backend = MockCaseBackend::new();
        expect_reloads(&mut backend, 1);
        backend
            .expect_update_case()
            .withf(|id, patch| id == &CaseId::new("C1") && patch.remark.as_deref() == Some("<p>flaky</p>"))
            .times(1)
            .returning(|_, _| Ok(()));
        let mut dispatcher = dispatcher(backend, quiet());
        dispatcher.reload().await;

        let outcome = dispatcher
            .handle_operation(RawOperation::finish_edit("caseprop:C1:remark", "flaky"))
            .await
            .unwrap();
        assert_eq!(outcome.succeeded, 1);
        assert!(!outcome.reloaded);
        let case = dispatcher.mirror().get(&CaseId::new("C1")).unwrap();
        assert_eq!(case.field(CaseField::Remark), "<p>flaky</p>");
        assert!(dispatcher.mirror().is_fresh());
    }

    #[tokio::test]
    async fn rejected_move_notifies_and_still_reloads() {
        let mut backend = MockCaseBackend::new();
        expect_reloads(&mut backend, 2);
        backend
            .expect_update_case_module()
            .with(eq(vec![CaseId::new("C1")]), eq(Some(ModuleId::new("B"))))
            .times(1)
            .returning(|_, _| Err(BackendError::rejected("")));
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(|notice| notice.severity == Severity::Error && notice.message == "Move failed")
            .times(1)
            .return_const(());
        let mut dispatcher = dispatcher(backend, notifier);
        dispatcher.reload().await;

        let err = dispatcher
            .handle_operation(RawOperation::moved(Placement::Into, ["case:C1"], "module:B"))
            .await
            .unwrap_err();
        assert!(err.is_backend());
        assert!(dispatcher.document().is_some());
    }

    #[tokio::test]
    async fn failed_write_leaves_mirror_unpatched() {
        let mut backend = MockCaseBackend::new();
        expect_reloads(&mut backend, 1);
        backend
            .expect_update_case()
            .times(1)
            .returning(|_, _| Err(BackendError::rejected("locked")));
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(|notice| notice.message == "locked")
            .times(1)
            .return_const(());
        let mut dispatcher = dispatcher(backend, notifier);
        dispatcher.reload().await;

        let result = dispatcher
            .handle_operation(RawOperation::finish_edit("case:C1", "logout"))
            .await;
        assert!(result.is_err());
        assert_eq!(dispatcher.mirror().get(&CaseId::new("C1")).unwrap().name, "login");
    }

    #[tokio::test]
    async fn structural_write_reloads_even_without_reload_policy() {
        let mut backend = MockCaseBackend::new();
        expect_reloads(&mut backend, 2);
        backend
            .expect_update_case_module()
            .times(1)
            .returning(|_, _| Ok(()));
        let mut dispatcher = dispatcher(backend, quiet());
        dispatcher.reload().await;

        let plan = EditPlan {
            mutations: vec![PlannedMutation::new(Mutation::MoveCases {
                case_ids: vec![CaseId::new("C1")],
                target: Some(ModuleId::new("B")),
            })],
            ..EditPlan::default()
        };
        assert!(!plan.reload_after(1));
        let outcome = dispatcher.execute(plan, None).await.unwrap();
        assert!(outcome.reloaded);
        assert!(dispatcher.mirror().is_fresh());
    }

    #[tokio::test]
    async fn deleting_the_filtered_module_resets_the_filter() {
        let mut backend = MockCaseBackend::new();
        expect_reloads(&mut backend, 2);
        backend
            .expect_delete_module()
            .with(eq(ModuleId::new("A")))
            .times(1)
            .returning(|_| Ok(()));
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(|notice| notice.severity == Severity::Success)
            .times(1)
            .return_const(());
        let mut dispatcher = dispatcher(backend, notifier)
            .with_filter(ModuleFilter::modules([ModuleId::new("A")]));
        dispatcher.reload().await;

        let outcome = dispatcher
            .handle_context_action(&Address::Module(ModuleId::new("A")), ContextAction::DeleteNode)
            .await
            .unwrap();
        assert!(outcome.reloaded);
        assert!(dispatcher.filter().is_all());
    }

    #[tokio::test]
    async fn menu_uses_latest_mirrored_mode() {
        let mut backend = MockCaseBackend::new();
        expect_reloads(&mut backend, 1);
        let mut dispatcher = dispatcher(backend, quiet());
        dispatcher.reload().await;

        let menu = dispatcher.menu_for(&Address::Case(CaseId::new("C1"))).unwrap();
        assert!(menu.contains(casemap_edit::MenuItem::SwitchToText));
        assert!(dispatcher.menu_for(&Address::Case(CaseId::new("ghost"))).is_none());
    }
}
