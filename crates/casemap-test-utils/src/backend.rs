//! In-memory case backend
//!
//! Applies every mutation to its own hierarchy so a reload observes it, and
//! records each call for exact call-count assertions.

use async_trait::async_trait;
use casemap_model::{
    Case, CaseId, CasePatch, Hierarchy, Module, ModuleCounts, ModuleFilter, ModuleId, NewCase,
};
use casemap_sync::{BackendError, CaseBackend};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// One recorded backend call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    FetchHierarchy(ModuleFilter),
    FetchModuleCounts(ModuleFilter),
    UpdateCase {
        case_id: CaseId,
        patch: CasePatch,
    },
    UpdateCaseModule {
        case_ids: Vec<CaseId>,
        target: Option<ModuleId>,
    },
    UpdateModuleParent {
        module_id: ModuleId,
        parent: Option<ModuleId>,
    },
    UpdateModuleName {
        module_id: ModuleId,
        name: String,
    },
    CreateCase(NewCase),
    DeleteCase(CaseId),
    DeleteModule(ModuleId),
}

impl BackendCall {
    /// Whether the call writes
    #[must_use]
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Self::FetchHierarchy(_) | Self::FetchModuleCounts(_))
    }

    /// Method name, for failure injection
    #[must_use]
    pub fn method(&self) -> &'static str {
        match self {
            Self::FetchHierarchy(_) => "fetch_hierarchy",
            Self::FetchModuleCounts(_) => "fetch_module_counts",
            Self::UpdateCase { .. } => "update_case",
            Self::UpdateCaseModule { .. } => "update_case_module",
            Self::UpdateModuleParent { .. } => "update_module_parent",
            Self::UpdateModuleName { .. } => "update_module_name",
            Self::CreateCase(_) => "create_case",
            Self::DeleteCase(_) => "delete_case",
            Self::DeleteModule(_) => "delete_module",
        }
    }
}

/// Backend holding a hierarchy in memory
#[derive(Debug)]
pub struct InMemoryBackend {
    hierarchy: RwLock<Hierarchy>,
    calls: RwLock<Vec<BackendCall>>,
    failures: RwLock<HashMap<&'static str, BackendError>>,
    next_id: AtomicU64,
}

impl InMemoryBackend {
    #[must_use]
    pub fn new(hierarchy: Hierarchy) -> Self {
        Self {
            hierarchy: RwLock::new(hierarchy),
            calls: RwLock::new(Vec::new()),
            failures: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Make every call to `method` fail with `error` until cleared
    pub async fn fail(&self, method: &'static str, error: BackendError) {
        self.failures.write().await.insert(method, error);
    }

    /// Stop injecting failures
    pub async fn clear_failures(&self) {
        self.failures.write().await.clear();
    }

    /// Every call so far
    pub async fn calls(&self) -> Vec<BackendCall> {
        self.calls.read().await.clone()
    }

    /// Write calls only
    pub async fn mutations(&self) -> Vec<BackendCall> {
        self.calls
            .read()
            .await
            .iter()
            .filter(|call| call.is_mutation())
            .cloned()
            .collect()
    }

    /// Number of hierarchy fetches
    pub async fn reloads(&self) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|call| matches!(call, BackendCall::FetchHierarchy(_)))
            .count()
    }

    /// Forget recorded calls
    pub async fn clear_calls(&self) {
        self.calls.write().await.clear();
    }

    /// Current stored hierarchy
    pub async fn snapshot(&self) -> Hierarchy {
        self.hierarchy.read().await.clone()
    }

    async fn record(&self, call: BackendCall) -> Result<(), BackendError> {
        let method = call.method();
        self.calls.write().await.push(call);
        match self.failures.read().await.get(method) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CaseBackend for InMemoryBackend {
    async fn fetch_hierarchy(&self, filter: ModuleFilter) -> Result<Hierarchy, BackendError> {
        self.record(BackendCall::FetchHierarchy(filter.clone())).await?;
        let stored = self.hierarchy.read().await;
        if filter.is_all() {
            return Ok(stored.clone());
        }
        let modules: Vec<Module> = filter
            .module_ids
            .iter()
            .filter_map(|id| stored.find_module(id).cloned())
            .collect();
        match <[Module; 1]>::try_from(modules) {
            Ok([module]) => Ok(Hierarchy::from_module(module)),
            Err(modules) => Ok(modules
                .into_iter()
                .fold(Hierarchy::all(stored.name.clone()), Hierarchy::with_module)),
        }
    }

    async fn fetch_module_counts(
        &self,
        filter: ModuleFilter,
    ) -> Result<ModuleCounts, BackendError> {
        self.record(BackendCall::FetchModuleCounts(filter)).await?;
        let stored = self.hierarchy.read().await;
        let mut counts = ModuleCounts {
            total: stored.cases().len() as u64,
            ..ModuleCounts::default()
        };
        fn walk(module: &Module, counts: &mut ModuleCounts) {
            counts
                .per_module
                .insert(module.id.clone(), module.case_count() as u64);
            for child in &module.children {
                walk(child, counts);
            }
        }
        for module in &stored.children {
            walk(module, &mut counts);
        }
        Ok(counts)
    }

    async fn update_case(&self, case_id: CaseId, patch: CasePatch) -> Result<(), BackendError> {
        self.record(BackendCall::UpdateCase {
            case_id: case_id.clone(),
            patch: patch.clone(),
        })
        .await?;
        let mut stored = self.hierarchy.write().await;
        let case = find_case_mut(&mut stored, &case_id)
            .ok_or_else(|| BackendError::NotFound(case_id.to_string()))?;
        patch.apply_to(case);
        Ok(())
    }

    async fn update_case_module(
        &self,
        case_ids: Vec<CaseId>,
        target: Option<ModuleId>,
    ) -> Result<(), BackendError> {
        self.record(BackendCall::UpdateCaseModule {
            case_ids: case_ids.clone(),
            target: target.clone(),
        })
        .await?;
        let mut stored = self.hierarchy.write().await;
        if let Some(id) = &target {
            if stored.find_module(id).is_none() {
                return Err(BackendError::NotFound(id.to_string()));
            }
        }
        for case_id in case_ids {
            let mut case = take_case(&mut stored, &case_id)
                .ok_or_else(|| BackendError::NotFound(case_id.to_string()))?;
            case.module.clone_from(&target);
            match &target {
                Some(id) => {
                    if let Some(module) = find_module_mut(&mut stored.children, id) {
                        module.cases.push(case);
                    }
                }
                None => stored.cases.push(case),
            }
        }
        Ok(())
    }

    async fn update_module_parent(
        &self,
        module_id: ModuleId,
        parent: Option<ModuleId>,
    ) -> Result<(), BackendError> {
        self.record(BackendCall::UpdateModuleParent {
            module_id: module_id.clone(),
            parent: parent.clone(),
        })
        .await?;
        let mut stored = self.hierarchy.write().await;
        let module = take_module(&mut stored.children, &module_id)
            .ok_or_else(|| BackendError::NotFound(module_id.to_string()))?;
        match &parent {
            Some(id) => {
                let Some(target) = find_module_mut(&mut stored.children, id) else {
                    // put it back before failing
                    stored.children.push(module);
                    return Err(BackendError::NotFound(id.to_string()));
                };
                target.children.push(module);
            }
            None => stored.children.push(module),
        }
        Ok(())
    }

    async fn update_module_name(
        &self,
        module_id: ModuleId,
        name: String,
    ) -> Result<(), BackendError> {
        self.record(BackendCall::UpdateModuleName {
            module_id: module_id.clone(),
            name: name.clone(),
        })
        .await?;
        let mut stored = self.hierarchy.write().await;
        let module = find_module_mut(&mut stored.children, &module_id)
            .ok_or_else(|| BackendError::NotFound(module_id.to_string()))?;
        module.name = name;
        Ok(())
    }

    async fn create_case(&self, new_case: NewCase) -> Result<CaseId, BackendError> {
        self.record(BackendCall::CreateCase(new_case.clone())).await?;
        let id = CaseId::new(format!("new-{}", self.next_id.fetch_add(1, Ordering::Relaxed)));
        let mut case = Case::new(id.as_str(), new_case.name)
            .with_mode(new_case.mode)
            .with_steps(new_case.steps);
        case.module.clone_from(&new_case.module);
        let mut stored = self.hierarchy.write().await;
        match &new_case.module {
            Some(module_id) => find_module_mut(&mut stored.children, module_id)
                .ok_or_else(|| BackendError::NotFound(module_id.to_string()))?
                .cases
                .push(case),
            None => stored.cases.push(case),
        }
        Ok(id)
    }

    async fn delete_case(&self, case_id: CaseId) -> Result<(), BackendError> {
        self.record(BackendCall::DeleteCase(case_id.clone())).await?;
        let mut stored = self.hierarchy.write().await;
        take_case(&mut stored, &case_id)
            .map(drop)
            .ok_or_else(|| BackendError::NotFound(case_id.to_string()))
    }

    async fn delete_module(&self, module_id: ModuleId) -> Result<(), BackendError> {
        self.record(BackendCall::DeleteModule(module_id.clone())).await?;
        let mut stored = self.hierarchy.write().await;
        take_module(&mut stored.children, &module_id)
            .map(drop)
            .ok_or_else(|| BackendError::NotFound(module_id.to_string()))
    }
}

fn find_module_mut<'a>(modules: &'a mut [Module], id: &ModuleId) -> Option<&'a mut Module> {
    for module in modules {
        if &module.id == id {
            return Some(module);
        }
        if let Some(found) = find_module_mut(&mut module.children, id) {
            return Some(found);
        }
    }
    None
}

fn take_module(modules: &mut Vec<Module>, id: &ModuleId) -> Option<Module> {
    if let Some(position) = modules.iter().position(|module| &module.id == id) {
        return Some(modules.remove(position));
    }
    modules
        .iter_mut()
        .find_map(|module| take_module(&mut module.children, id))
}

fn find_case_mut<'a>(hierarchy: &'a mut Hierarchy, id: &CaseId) -> Option<&'a mut Case> {
    fn walk<'a>(module: &'a mut Module, id: &CaseId) -> Option<&'a mut Case> {
        if let Some(case) = module.cases.iter_mut().find(|case| &case.id == id) {
            return Some(case);
        }
        module.children.iter_mut().find_map(|child| walk(child, id))
    }
    if let Some(case) = hierarchy.cases.iter_mut().find(|case| &case.id == id) {
        return Some(case);
    }
    hierarchy
        .children
        .iter_mut()
        .find_map(|module| walk(module, id))
}

fn take_case(hierarchy: &mut Hierarchy, id: &CaseId) -> Option<Case> {
    fn take(cases: &mut Vec<Case>, id: &CaseId) -> Option<Case> {
        let position = cases.iter().position(|case| &case.id == id)?;
        Some(cases.remove(position))
    }
    fn walk(module: &mut Module, id: &CaseId) -> Option<Case> {
        take(&mut module.cases, id)
            .or_else(|| module.children.iter_mut().find_map(|child| walk(child, id)))
    }
    take(&mut hierarchy.cases, id).or_else(|| {
        hierarchy
            .children
            .iter_mut()
            .find_map(|module| walk(module, id))
    })
}
