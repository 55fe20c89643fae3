//! Local case mirror
//!
//! Write-through cache of the last-known case objects, keyed by case id.
//! Populated by the tree builder, patched only after a confirmed backend
//! write, and invalidated wholesale by structural changes.

use crate::hierarchy::{Case, CasePatch, CaseId, ModuleId};
use std::collections::HashMap;

/// Mirrored case plus the module it was found under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorEntry {
    /// Last-known case object
    pub case: Case,
    /// Containing module at load time; `None` for root-level cases
    pub module: Option<ModuleId>,
}

/// Case id → last-known case
#[derive(Debug, Clone, Default)]
pub struct CaseMirror {
    entries: HashMap<CaseId, MirrorEntry>,
    fresh: bool,
}

impl CaseMirror {
    /// Empty mirror, marked fresh
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            fresh: true,
        }
    }

    /// Register a case found under `module`
    pub fn insert(&mut self, case: Case, module: Option<ModuleId>) {
        let module = module.or_else(|| case.module.clone());
        self.entries
            .insert(case.id.clone(), MirrorEntry { case, module });
    }

    /// Mirrored case
    #[inline]
    #[must_use]
    pub fn get(&self, id: &CaseId) -> Option<&Case> {
        self.entries.get(id).map(|entry| &entry.case)
    }

    /// Mirrored entry
    #[inline]
    #[must_use]
    pub fn entry(&self, id: &CaseId) -> Option<&MirrorEntry> {
        self.entries.get(id)
    }

    /// Module the case belonged to at load time
    #[inline]
    #[must_use]
    pub fn module_of(&self, id: &CaseId) -> Option<&ModuleId> {
        self.entries.get(id).and_then(|entry| entry.module.as_ref())
    }

    /// Whether the case is mirrored
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &CaseId) -> bool {
        self.entries.contains_key(id)
    }

    /// Apply a confirmed write; returns false when the case is not mirrored
    pub fn apply(&mut self, id: &CaseId, patch: &CasePatch) -> bool {
        match self.entries.get_mut(id) {
            Some(entry) => {
                patch.apply_to(&mut entry.case);
                true
            }
            None => false,
        }
    }

    /// Mark the mirror stale; it stays readable until the next rebuild
    #[inline]
    pub fn invalidate(&mut self) {
        self.fresh = false;
    }

    /// Whether no structural change happened since the last rebuild
    #[inline]
    #[must_use]
    pub fn is_fresh(&self) -> bool {
        self.fresh
    }

    /// Number of mirrored cases
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is mirrored
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over mirrored case ids
    pub fn ids(&self) -> impl Iterator<Item = &CaseId> {
        self.entries.keys()
    }
}
