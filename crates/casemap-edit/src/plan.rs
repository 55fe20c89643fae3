//! Edit plans
//!
//! The interpreter never talks to the backend. It returns an [`EditPlan`]:
//! the backend mutations to issue in order, the mirror patch each one
//! carries on success, and the reload decision, all as plain data.

use casemap_model::{Address, CaseId, CasePatch, ModuleId, NewCase};
use serde::Serialize;

/// One backend write
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "args", rename_all = "snake_case")]
pub enum Mutation {
    /// Partial case update
    UpdateCase {
        /// Case to update
        case_id: CaseId,
        /// Fields to write
        patch: CasePatch,
    },
    /// Reassign cases to a module (`None` = no module)
    MoveCases {
        /// Cases to move
        case_ids: Vec<CaseId>,
        /// New module
        target: Option<ModuleId>,
    },
    /// Reparent a module (`None` = top level)
    MoveModule {
        /// Module to move
        module_id: ModuleId,
        /// New parent
        parent: Option<ModuleId>,
    },
    /// Rename a module
    RenameModule {
        /// Module to rename
        module_id: ModuleId,
        /// New name
        name: String,
    },
    /// Create a case
    CreateCase(NewCase),
    /// Delete a case
    DeleteCase(CaseId),
    /// Delete a module with its sub-modules and cases
    DeleteModule(ModuleId),
}

impl Mutation {
    /// Whether success changes the hierarchy shape (mirror must be rebuilt)
    #[must_use]
    pub fn is_structural(&self) -> bool {
        match self {
            Self::UpdateCase { patch, .. } => patch.mode.is_some(),
            Self::MoveCases { .. }
            | Self::MoveModule { .. }
            | Self::RenameModule { .. }
            | Self::CreateCase(_)
            | Self::DeleteCase(_)
            | Self::DeleteModule(_) => true,
        }
    }

    /// Short name for logs
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UpdateCase { .. } => "update_case",
            Self::MoveCases { .. } => "move_cases",
            Self::MoveModule { .. } => "move_module",
            Self::RenameModule { .. } => "rename_module",
            Self::CreateCase(_) => "create_case",
            Self::DeleteCase(_) => "delete_case",
            Self::DeleteModule(_) => "delete_module",
        }
    }

    /// Failure notice category
    #[must_use]
    pub fn failure(&self) -> FailureKind {
        match self {
            Self::UpdateCase { .. } | Self::RenameModule { .. } | Self::CreateCase(_) => {
                FailureKind::Save
            }
            Self::MoveCases { .. } | Self::MoveModule { .. } => FailureKind::Move,
            Self::DeleteCase(_) | Self::DeleteModule(_) => FailureKind::Delete,
        }
    }
}

/// Which default failure text applies to a mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Saving content
    Save,
    /// Moving nodes
    Move,
    /// Deleting nodes
    Delete,
    /// Any other context action
    Action,
}

/// A mutation plus the mirror patch applied once it succeeds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMutation {
    /// Backend write
    pub mutation: Mutation,
    /// Mirror update applied only after the backend confirms
    pub mirror_patch: Option<(CaseId, CasePatch)>,
}

impl PlannedMutation {
    /// Mutation with no mirror follow-up
    #[inline]
    #[must_use]
    pub fn new(mutation: Mutation) -> Self {
        Self {
            mutation,
            mirror_patch: None,
        }
    }

    /// Case update mirrored on success
    #[must_use]
    pub fn update_case(case_id: CaseId, patch: CasePatch) -> Self {
        Self {
            mirror_patch: Some((case_id.clone(), patch.clone())),
            mutation: Mutation::UpdateCase { case_id, patch },
        }
    }
}

/// When the dispatcher reloads after running a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReloadPolicy {
    /// Never; the mirror patches keep the view current
    #[default]
    Never,
    /// Only if at least one mutation was attempted (succeeded or failed)
    AfterMutations,
    /// Always, even when nothing was written
    Always,
}

/// Informational or warning message a plan raises instead of, or besides, writing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeKey {
    /// Precondition already has content
    PreconditionExists,
    /// Remark already has content
    RemarkExists,
    /// Text description already has content
    TextDescriptionExists,
    /// Add case used outside a module node
    AddCaseNeedsModule,
    /// Rename used outside a module node
    RenameNeedsModule,
    /// Rename with a blank name
    RenameNeedsName,
    /// Case action used outside a case node
    NeedsCaseNode,
    /// Step action on a text-mode case
    TextModeHasNoSteps,
    /// Step insertion outside a step node
    InsertNeedsStep,
    /// Node cannot be deleted
    DeleteUnsupported,
}

impl NoticeKey {
    /// Severity of the notice
    #[must_use]
    pub fn level(self) -> NoticeLevel {
        match self {
            Self::PreconditionExists
            | Self::RemarkExists
            | Self::TextDescriptionExists
            | Self::DeleteUnsupported => NoticeLevel::Info,
            Self::AddCaseNeedsModule
            | Self::RenameNeedsModule
            | Self::RenameNeedsName
            | Self::NeedsCaseNode
            | Self::TextModeHasNoSteps
            | Self::InsertNeedsStep => NoticeLevel::Warning,
        }
    }
}

/// Severity of a plan notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeLevel {
    /// Informational
    Info,
    /// Warning
    Warning,
}

/// Why an element of a move was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    /// Module dropped into itself
    SelfParent,
    /// Module dropped into one of its own descendants
    IntoDescendant,
}

/// One refused element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// Refused node
    pub address: Address,
    /// Why
    pub reason: RejectReason,
}

/// Why a label commit produces no write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Skip {
    /// Address kind is not label-editable
    NotEditable,
    /// Case is not in the mirror
    UnknownCase,
    /// Address of a node the case's mode does not render
    NotInView,
    /// Step index too far past the end of the step list
    OutOfRange,
    /// Value equals what is stored
    Unchanged,
}

/// Everything the dispatcher needs to carry out one gesture
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EditPlan {
    /// Mutations, issued sequentially
    pub mutations: Vec<PlannedMutation>,
    /// Reload decision
    pub reload: ReloadPolicy,
    /// Notice raised before any mutation
    pub notice: Option<NoticeKey>,
    /// Elements refused during planning
    pub rejected: Vec<Rejection>,
    /// Why nothing is written, for commits that skip
    pub skip: Option<Skip>,
    /// Failure text category for this plan
    pub failure: Option<FailureKind>,
}

impl EditPlan {
    /// Plan doing nothing
    #[inline]
    #[must_use]
    pub fn noop(skip: Skip) -> Self {
        Self {
            skip: Some(skip),
            ..Self::default()
        }
    }

    /// Plan that only raises a notice
    #[inline]
    #[must_use]
    pub fn notice(key: NoticeKey) -> Self {
        Self {
            notice: Some(key),
            ..Self::default()
        }
    }

    /// Plan with mutations
    #[must_use]
    pub fn with_mutations(mutations: Vec<PlannedMutation>, reload: ReloadPolicy) -> Self {
        Self {
            mutations,
            reload,
            ..Self::default()
        }
    }

    /// With failure category
    #[inline]
    #[must_use]
    pub fn failing_as(mut self, failure: FailureKind) -> Self {
        self.failure = Some(failure);
        self
    }

    /// With notice
    #[inline]
    #[must_use]
    pub fn with_notice(mut self, key: NoticeKey) -> Self {
        self.notice = Some(key);
        self
    }

    /// Whether the plan issues no backend call
    #[inline]
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.mutations.is_empty()
    }

    /// Whether the dispatcher reloads given how many mutations it attempted
    #[must_use]
    pub fn reload_after(&self, attempted: usize) -> bool {
        match self.reload {
            ReloadPolicy::Never => false,
            ReloadPolicy::AfterMutations => attempted > 0,
            ReloadPolicy::Always => true,
        }
    }
}
