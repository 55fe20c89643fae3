//! Backend collaborator
//!
//! The mind-map core owns no storage. Every read and write goes through
//! [`CaseBackend`]; the dispatcher awaits each call before touching local
//! state.

use crate::error::BackendError;
use casemap_edit::Mutation;
use casemap_model::{CaseId, CasePatch, Hierarchy, ModuleCounts, ModuleFilter, ModuleId, NewCase};
use tracing::info;

/// Remote case repository
///
/// Implement this trait to connect the dispatcher to a real service.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CaseBackend: Send + Sync {
    /// Load the module/case hierarchy, optionally filtered
    async fn fetch_hierarchy(&self, filter: ModuleFilter) -> Result<Hierarchy, BackendError>;

    /// Load per-module case totals
    async fn fetch_module_counts(&self, filter: ModuleFilter)
        -> Result<ModuleCounts, BackendError>;

    /// Partial case update
    async fn update_case(&self, case_id: CaseId, patch: CasePatch) -> Result<(), BackendError>;

    /// Reassign cases to a module (`None` = no module)
    async fn update_case_module(
        &self,
        case_ids: Vec<CaseId>,
        target: Option<ModuleId>,
    ) -> Result<(), BackendError>;

    /// Reparent a module (`None` = top level)
    async fn update_module_parent(
        &self,
        module_id: ModuleId,
        parent: Option<ModuleId>,
    ) -> Result<(), BackendError>;

    /// Rename a module
    async fn update_module_name(
        &self,
        module_id: ModuleId,
        name: String,
    ) -> Result<(), BackendError>;

    /// Create a case, returning its id
    async fn create_case(&self, case: NewCase) -> Result<CaseId, BackendError>;

    /// Delete a case
    async fn delete_case(&self, case_id: CaseId) -> Result<(), BackendError>;

    /// Delete a module with everything under it
    async fn delete_module(&self, module_id: ModuleId) -> Result<(), BackendError>;
}

/// Issue one planned mutation against the backend
///
/// # Errors
/// Whatever the backend returns for the call.
pub async fn apply_mutation(
    backend: &dyn CaseBackend,
    mutation: &Mutation,
) -> Result<(), BackendError> {
    info!(kind = mutation.kind(), "issuing mutation");
    match mutation {
        Mutation::UpdateCase { case_id, patch } => {
            backend.update_case(case_id.clone(), patch.clone()).await
        }
        Mutation::MoveCases { case_ids, target } => {
            backend
                .update_case_module(case_ids.clone(), target.clone())
                .await
        }
        Mutation::MoveModule { module_id, parent } => {
            backend
                .update_module_parent(module_id.clone(), parent.clone())
                .await
        }
        Mutation::RenameModule { module_id, name } => {
            backend
                .update_module_name(module_id.clone(), name.clone())
                .await
        }
        Mutation::CreateCase(case) => {
            let id = backend.create_case(case.clone()).await?;
            info!(case_id = %id, "case created");
            Ok(())
        }
        Mutation::DeleteCase(case_id) => backend.delete_case(case_id.clone()).await,
        Mutation::DeleteModule(module_id) => backend.delete_module(module_id.clone()).await,
    }
}
