//! Edit interpreter
//!
//! Turns typed widget operations into [`EditPlan`]s. Reads the graph
//! document and the case mirror, never writes either.

use crate::error::UnresolvedTarget;
use crate::operation::{MoveOperation, Operation, Placement};
use crate::plan::{
    EditPlan, FailureKind, Mutation, PlannedMutation, RejectReason, Rejection, ReloadPolicy, Skip,
};
use casemap_model::{
    plain_to_markup, strip_markup, Address, Case, CaseField, CaseMirror, CaseMode, CasePatch,
    GraphDocument, ModuleId, Step, PLACEHOLDER,
};
use tracing::debug;

/// Labels the interpreter must recognise or produce
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpreterOptions {
    /// Label the builder shows for a case with no name
    pub unnamed_case_label: String,
    /// Name given to cases created from the menu
    pub new_case_name: String,
}

impl Default for InterpreterOptions {
    fn default() -> Self {
        Self {
            unnamed_case_label: "(unnamed case)".to_string(),
            new_case_name: "New case".to_string(),
        }
    }
}

/// Stateless planner over the document and mirror
#[derive(Debug, Clone, Default)]
pub struct EditInterpreter {
    pub(crate) options: InterpreterOptions,
}

impl EditInterpreter {
    /// Create an interpreter
    #[inline]
    #[must_use]
    pub fn new(options: InterpreterOptions) -> Self {
        Self { options }
    }

    /// Plan any widget operation
    ///
    /// # Errors
    /// [`UnresolvedTarget`] for a move whose target module cannot be derived.
    pub fn plan(
        &self,
        document: &GraphDocument,
        mirror: &CaseMirror,
        operation: &Operation,
    ) -> Result<EditPlan, UnresolvedTarget> {
        match operation {
            Operation::FinishEdit { address, label } => {
                Ok(self.commit_label(mirror, address, label))
            }
            Operation::Move(op) => self.reparent(document, mirror, op),
        }
    }

    /// Plan a committed label edit
    ///
    /// Writes nothing when the value equals what the mirror holds. Step
    /// commits beyond the current array pad it with blank steps.
    #[must_use]
    pub fn commit_label(&self, mirror: &CaseMirror, address: &Address, label: &str) -> EditPlan {
        let Some(case_id) = address.case_id().filter(|_| address.is_label_editable()) else {
            debug!(address = %address, "label commit on non-editable node");
            return EditPlan::noop(Skip::NotEditable);
        };
        let Some(case) = mirror.get(case_id) else {
            debug!(case_id = %case_id, "label commit on unknown case");
            return EditPlan::noop(Skip::UnknownCase);
        };
        let text = normalize_label(label);

        let planned = match address {
            Address::Case(_) => self.commit_name(case, text),
            Address::CaseProp { field, .. } => commit_field(case, *field, text),
            Address::StepDesc { index, .. } => commit_step(case, *index, StepSide::Description, text),
            Address::StepRes { index, .. } => commit_step(case, *index, StepSide::Result, text),
            Address::Root | Address::Module(_) => Err(Skip::NotEditable),
        };

        match planned {
            Ok(planned) => EditPlan::with_mutations(vec![planned], ReloadPolicy::Never)
                .failing_as(FailureKind::Save),
            Err(skip) => {
                debug!(address = %address, ?skip, "label commit writes nothing");
                EditPlan::noop(skip)
            }
        }
    }

    fn commit_name(&self, case: &Case, text: &str) -> Result<PlannedMutation, Skip> {
        let name = match case.display_code() {
            Some(code) => text
                .strip_prefix(code)
                .and_then(|rest| rest.strip_prefix(' '))
                .unwrap_or(text),
            None => text,
        };
        let stored = case.name.trim();
        let unchanged = name.trim() == stored
            || (stored.is_empty() && name.trim() == self.options.unnamed_case_label);
        if unchanged {
            return Err(Skip::Unchanged);
        }
        Ok(PlannedMutation::update_case(
            case.id.clone(),
            CasePatch::name(name),
        ))
    }

    /// Plan a drag-reparent
    ///
    /// Cases already in the target module and modules already under the
    /// target are skipped. A module dropped into itself or one of its
    /// descendants is refused individually.
    ///
    /// # Errors
    /// [`UnresolvedTarget`] when no target module can be derived; nothing is planned.
    pub fn reparent(
        &self,
        document: &GraphDocument,
        mirror: &CaseMirror,
        op: &MoveOperation,
    ) -> Result<EditPlan, UnresolvedTarget> {
        let target = resolve_target(document, op).ok_or_else(|| {
            debug!(target = %op.target, placement = ?op.placement, "unresolved move target");
            UnresolvedTarget {
                target: op.target.clone(),
            }
        })?;

        let mut mutations = Vec::new();
        let mut rejected = Vec::new();
        for address in &op.moving {
            match address {
                Address::Case(case_id) => {
                    if mirror.module_of(case_id) == target.as_ref() {
                        debug!(case_id = %case_id, "case already in target module");
                        continue;
                    }
                    mutations.push(PlannedMutation::new(Mutation::MoveCases {
                        case_ids: vec![case_id.clone()],
                        target: target.clone(),
                    }));
                }
                Address::Module(module_id) => {
                    let parent = document
                        .container_of(address)
                        .and_then(|container| container.into_module_id());
                    if parent == target {
                        debug!(module_id = %module_id, "module already under target");
                        continue;
                    }
                    if let Some(reason) = refuse_module_move(document, module_id, target.as_ref()) {
                        debug!(module_id = %module_id, ?reason, "module move refused");
                        rejected.push(Rejection {
                            address: address.clone(),
                            reason,
                        });
                        continue;
                    }
                    mutations.push(PlannedMutation::new(Mutation::MoveModule {
                        module_id: module_id.clone(),
                        parent: target.clone(),
                    }));
                }
                _ => debug!(address = %address, "ignoring non-structural moved node"),
            }
        }

        let mut plan = EditPlan::with_mutations(mutations, ReloadPolicy::AfterMutations)
            .failing_as(FailureKind::Move);
        plan.rejected = rejected;
        Ok(plan)
    }
}

/// Module id receiving the moved nodes; `Some(None)` means top level
fn resolve_target(document: &GraphDocument, op: &MoveOperation) -> Option<Option<ModuleId>> {
    match op.placement {
        Placement::Into => match &op.target {
            Address::Root => Some(None),
            Address::Module(id) => Some(Some(id.clone())),
            _ => None,
        },
        Placement::Before | Placement::After => document
            .container_of(&op.target)
            .map(|container| container.into_module_id()),
    }
}

fn refuse_module_move(
    document: &GraphDocument,
    module_id: &ModuleId,
    target: Option<&ModuleId>,
) -> Option<RejectReason> {
    let target = target?;
    if target == module_id {
        return Some(RejectReason::SelfParent);
    }
    let own = Address::Module(module_id.clone());
    let candidate = Address::Module(target.clone());
    document
        .is_descendant(&own, &candidate)
        .then_some(RejectReason::IntoDescendant)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepSide {
    Description,
    Result,
}

fn commit_field(case: &Case, field: CaseField, text: &str) -> Result<PlannedMutation, Skip> {
    let text_only = matches!(field, CaseField::TextDescription | CaseField::TextResult);
    if text_only && case.mode == CaseMode::Steps {
        return Err(Skip::NotInView);
    }
    if text.trim() == stored_text(case.field(field)) {
        return Err(Skip::Unchanged);
    }
    Ok(PlannedMutation::update_case(
        case.id.clone(),
        CasePatch::field(field, plain_to_markup(text)),
    ))
}

fn commit_step(case: &Case, index: usize, side: StepSide, text: &str) -> Result<PlannedMutation, Skip> {
    if case.mode == CaseMode::Text {
        return Err(Skip::NotInView);
    }
    let current = case.steps.get(index).map_or("", |step| match side {
        StepSide::Description => step.description.as_str(),
        StepSide::Result => step.result.as_str(),
    });
    if text.trim() == stored_text(current) {
        return Err(Skip::Unchanged);
    }
    let mut steps = pad_steps(&case.steps, index).ok_or(Skip::OutOfRange)?;
    if let Some(slot) = steps.get_mut(index) {
        match side {
            StepSide::Description => slot.description = text.to_string(),
            StepSide::Result => slot.result = text.to_string(),
        }
    }
    Ok(PlannedMutation::update_case(
        case.id.clone(),
        CasePatch::steps(steps),
    ))
}

/// Most blank steps a single commit may add past the end
pub const MAX_STEP_PADDING: usize = 32;

/// Copy of `steps` long enough to hold `index`, padded with blank steps
///
/// `None` when `index` lies more than [`MAX_STEP_PADDING`] past the end.
#[must_use]
pub fn pad_steps(steps: &[Step], index: usize) -> Option<Vec<Step>> {
    let limit = steps.len().saturating_add(MAX_STEP_PADDING);
    if index > limit {
        return None;
    }
    let mut padded = steps.to_vec();
    let len = index.checked_add(1)?;
    if padded.len() < len {
        padded.resize(len, Step::blank());
    }
    Some(padded)
}

/// Committed placeholder means empty text
fn normalize_label(label: &str) -> &str {
    if label.trim() == PLACEHOLDER {
        ""
    } else {
        label
    }
}

/// Plain text of stored content, with the seeded placeholder counting as empty
pub(crate) fn stored_text(stored: &str) -> String {
    let text = strip_markup(stored);
    if text == PLACEHOLDER {
        String::new()
    } else {
        text
    }
}
