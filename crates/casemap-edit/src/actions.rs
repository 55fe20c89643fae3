//! Context actions
//!
//! Planning for the side-channel action menu. Every action that writes is
//! followed by a full reload; actions refused up front only raise a notice.

use crate::interpreter::EditInterpreter;
use crate::menu::MenuItem;
use crate::plan::{EditPlan, FailureKind, Mutation, NoticeKey, PlannedMutation, ReloadPolicy};
use casemap_model::{
    strip_markup, Address, Case, CaseField, CaseId, CaseMirror, CaseMode, CasePatch, NewCase,
    Step, ALL_ROOT_ID, EMPTY_BLOCK,
};
use tracing::debug;

/// Markup written so a freshly added property shows up as a placeholder node
pub const SEEDED_BLOCK: &str = "<p>(empty)</p>";

/// An action chosen from the context menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextAction {
    /// Create a case in the module
    AddCase,
    /// Append a blank step
    AddStep,
    /// Insert a blank step before the addressed step
    InsertStepAbove,
    /// Insert a blank step after the addressed step
    InsertStepBelow,
    /// Seed an empty precondition
    AddPrecondition,
    /// Seed an empty text description (switching to text mode if needed)
    AddTextDescription,
    /// Seed an empty remark
    AddRemark,
    /// Switch to steps mode
    SwitchToSteps,
    /// Switch to text mode
    SwitchToText,
    /// Rename the module to the given name
    RenameModule(String),
    /// Delete or clear the node
    DeleteNode,
}

impl ContextAction {
    /// Menu entry that triggers this action
    #[must_use]
    pub fn item(&self) -> MenuItem {
        match self {
            Self::AddCase => MenuItem::AddCase,
            Self::AddStep => MenuItem::AddStep,
            Self::InsertStepAbove => MenuItem::InsertStepAbove,
            Self::InsertStepBelow => MenuItem::InsertStepBelow,
            Self::AddPrecondition => MenuItem::AddPrecondition,
            Self::AddTextDescription => MenuItem::AddTextDescription,
            Self::AddRemark => MenuItem::AddRemark,
            Self::SwitchToSteps => MenuItem::SwitchToSteps,
            Self::SwitchToText => MenuItem::SwitchToText,
            Self::RenameModule(_) => MenuItem::RenameModule,
            Self::DeleteNode => MenuItem::Delete,
        }
    }
}

impl EditInterpreter {
    /// Plan a context action on the addressed node
    #[must_use]
    pub fn plan_action(
        &self,
        mirror: &CaseMirror,
        address: &Address,
        action: &ContextAction,
    ) -> EditPlan {
        let plan = match action {
            ContextAction::AddCase => self.add_case(address),
            ContextAction::RenameModule(name) => rename_module(address, name),
            ContextAction::DeleteNode => delete_node(mirror, address),
            ContextAction::AddPrecondition => {
                with_case(mirror, address, |case| seed_field(case, CaseField::Precondition))
            }
            ContextAction::AddRemark => {
                with_case(mirror, address, |case| seed_field(case, CaseField::Remark))
            }
            ContextAction::AddTextDescription => with_case(mirror, address, add_text_description),
            ContextAction::SwitchToText => with_case(mirror, address, switch_to_text),
            ContextAction::SwitchToSteps => with_case(mirror, address, switch_to_steps),
            ContextAction::AddStep => with_case(mirror, address, |case| {
                let len = case.steps.len();
                insert_step(case, len)
            }),
            ContextAction::InsertStepAbove | ContextAction::InsertStepBelow => {
                with_case(mirror, address, |case| {
                    let Some(index) = address.step_index() else {
                        return EditPlan::notice(NoticeKey::InsertNeedsStep);
                    };
                    let at = if matches!(action, ContextAction::InsertStepBelow) {
                        index.saturating_add(1)
                    } else {
                        index
                    };
                    insert_step(case, at)
                })
            }
        };
        if let Some(notice) = plan.notice {
            debug!(address = %address, action = ?action.item(), ?notice, "context action raised notice");
        }
        plan
    }

    fn add_case(&self, address: &Address) -> EditPlan {
        let Address::Module(module_id) = address else {
            return EditPlan::notice(NoticeKey::AddCaseNeedsModule);
        };
        let module = Some(module_id.clone()).filter(|id| id.as_str() != ALL_ROOT_ID);
        let new_case = NewCase {
            name: self.options.new_case_name.clone(),
            module,
            mode: CaseMode::Steps,
            steps: vec![Step::blank()],
        };
        always(vec![PlannedMutation::new(Mutation::CreateCase(new_case))])
    }
}

fn always(mutations: Vec<PlannedMutation>) -> EditPlan {
    EditPlan::with_mutations(mutations, ReloadPolicy::Always).failing_as(FailureKind::Action)
}

/// Resolve the case behind a case-scoped address; unmirrored cases act as empty
fn with_case(
    mirror: &CaseMirror,
    address: &Address,
    plan: impl FnOnce(&Case) -> EditPlan,
) -> EditPlan {
    let Some(case_id) = address.case_id() else {
        return EditPlan::notice(NoticeKey::NeedsCaseNode);
    };
    match mirror.get(case_id) {
        Some(case) => plan(case),
        None => plan(&Case::new(case_id.as_str(), "")),
    }
}

fn rename_module(address: &Address, name: &str) -> EditPlan {
    let Address::Module(module_id) = address else {
        return EditPlan::notice(NoticeKey::RenameNeedsModule);
    };
    let name = name.trim();
    if name.is_empty() {
        return EditPlan::notice(NoticeKey::RenameNeedsName);
    }
    always(vec![PlannedMutation::new(Mutation::RenameModule {
        module_id: module_id.clone(),
        name: name.to_string(),
    })])
    .failing_as(FailureKind::Save)
}

fn seed_field(case: &Case, field: CaseField) -> EditPlan {
    if !strip_markup(case.field(field)).is_empty() {
        let key = match field {
            CaseField::Precondition => NoticeKey::PreconditionExists,
            CaseField::Remark => NoticeKey::RemarkExists,
            CaseField::TextDescription | CaseField::TextResult => NoticeKey::TextDescriptionExists,
        };
        return EditPlan::notice(key);
    }
    always(vec![PlannedMutation::update_case(
        case.id.clone(),
        CasePatch::field(field, SEEDED_BLOCK),
    )])
}

fn add_text_description(case: &Case) -> EditPlan {
    let mut mutations = Vec::new();
    if case.mode != CaseMode::Text {
        mutations.push(PlannedMutation::update_case(
            case.id.clone(),
            CasePatch::mode(CaseMode::Text),
        ));
    }
    if !strip_markup(&case.text_description).is_empty() {
        return always(mutations).with_notice(NoticeKey::TextDescriptionExists);
    }
    mutations.push(PlannedMutation::update_case(
        case.id.clone(),
        CasePatch::field(CaseField::TextDescription, SEEDED_BLOCK),
    ));
    always(mutations)
}

fn switch_to_text(case: &Case) -> EditPlan {
    let mut patch = CasePatch::mode(CaseMode::Text);
    if strip_markup(&case.text_description).is_empty() {
        patch = patch.with_field(CaseField::TextDescription, SEEDED_BLOCK);
    }
    always(vec![PlannedMutation::update_case(case.id.clone(), patch)])
}

fn switch_to_steps(case: &Case) -> EditPlan {
    let mut patch = CasePatch::mode(CaseMode::Steps);
    if case.steps.is_empty() {
        patch.steps = Some(vec![Step::blank()]);
    }
    always(vec![PlannedMutation::update_case(case.id.clone(), patch)])
}

fn insert_step(case: &Case, at: usize) -> EditPlan {
    if case.mode == CaseMode::Text {
        return EditPlan::notice(NoticeKey::TextModeHasNoSteps);
    }
    let mut steps = case.steps.clone();
    steps.insert(at.min(steps.len()), Step::blank());
    always(vec![PlannedMutation::update_case(
        case.id.clone(),
        CasePatch::steps(steps),
    )])
}

fn delete_node(mirror: &CaseMirror, address: &Address) -> EditPlan {
    let mutation = match address {
        Address::Module(id) => PlannedMutation::new(Mutation::DeleteModule(id.clone())),
        Address::Case(id) => PlannedMutation::new(Mutation::DeleteCase(id.clone())),
        Address::CaseProp { case, field } => {
            let patch = match field {
                CaseField::TextDescription => {
                    CasePatch::field(CaseField::TextDescription, EMPTY_BLOCK)
                        .with_field(CaseField::TextResult, EMPTY_BLOCK)
                }
                other => CasePatch::field(*other, EMPTY_BLOCK),
            };
            PlannedMutation::update_case(case.clone(), patch)
        }
        Address::StepDesc { case, index } | Address::StepRes { case, index } => {
            let steps = remove_step(mirror, case, *index);
            PlannedMutation::update_case(case.clone(), CasePatch::steps(steps))
        }
        Address::Root => return EditPlan::notice(NoticeKey::DeleteUnsupported),
    };
    always(vec![mutation]).failing_as(FailureKind::Delete)
}

fn remove_step(mirror: &CaseMirror, case: &CaseId, index: usize) -> Vec<Step> {
    let mut steps = mirror.get(case).map(|case| case.steps.clone()).unwrap_or_default();
    if index < steps.len() {
        steps.remove(index);
    }
    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use casemap_model::ModuleId;
    use pretty_assertions::assert_eq;

    fn mirror() -> CaseMirror {
        let mut mirror = CaseMirror::new();
        mirror.insert(
            Case::new("c1", "steps")
                .with_steps(vec![Step::new("a", "1"), Step::new("b", "2")])
                .with_field(CaseField::Precondition, "<p>ready</p>"),
            Some(ModuleId::new("m1")),
        );
        mirror.insert(
            Case::new("c2", "text")
                .with_mode(CaseMode::Text)
                .with_field(CaseField::TextDescription, "<p>do</p>"),
            None,
        );
        mirror.insert(Case::new("c3", "blank"), None);
        mirror
    }

    fn case(id: &str) -> Address {
        Address::Case(CaseId::new(id))
    }

    fn plan(address: &Address, action: ContextAction) -> EditPlan {
        EditInterpreter::default().plan_action(&mirror(), address, &action)
    }

    fn patches(plan: &EditPlan) -> Vec<CasePatch> {
        plan.mutations
            .iter()
            .map(|planned| match &planned.mutation {
                Mutation::UpdateCase { patch, .. } => patch.clone(),
                other => panic!("unexpected mutation {other:?}"),
            })
            .collect()
    }

    #[test]
    fn add_case_only_on_modules() {
        let plan = plan(&Address::Module(ModuleId::new("m1")), ContextAction::AddCase);
        let Mutation::CreateCase(new_case) = &plan.mutations[0].mutation else {
            panic!("expected create");
        };
        assert_eq!(new_case.name, "New case");
        assert_eq!(new_case.module, Some(ModuleId::new("m1")));
        assert_eq!(new_case.steps, vec![Step::blank()]);
        assert_eq!(plan.reload, ReloadPolicy::Always);

        let refused = plan_root_add_case();
        assert_eq!(refused.notice, Some(NoticeKey::AddCaseNeedsModule));
        assert!(refused.is_noop());
    }

    fn plan_root_add_case() -> EditPlan {
        plan(&Address::Root, ContextAction::AddCase)
    }

    #[test]
    fn add_case_under_all_module_creates_at_root() {
        let plan = plan(&Address::Module(ModuleId::new("all")), ContextAction::AddCase);
        let Mutation::CreateCase(new_case) = &plan.mutations[0].mutation else {
            panic!("expected create");
        };
        assert_eq!(new_case.module, None);
    }

    #[test]
    fn existing_precondition_only_informs() {
        let plan = plan(&case("c1"), ContextAction::AddPrecondition);
        assert!(plan.is_noop());
        assert_eq!(plan.notice, Some(NoticeKey::PreconditionExists));
        assert!(!plan.reload_after(0));
    }

    #[test]
    fn add_remark_seeds_placeholder_block() {
        let plan = plan(&case("c1"), ContextAction::AddRemark);
        assert_eq!(
            patches(&plan),
            vec![CasePatch::field(CaseField::Remark, SEEDED_BLOCK)]
        );
    }

    #[test]
    fn add_text_description_switches_mode_first() {
        let plan = plan(&case("c3"), ContextAction::AddTextDescription);
        assert_eq!(
            patches(&plan),
            vec![
                CasePatch::mode(CaseMode::Text),
                CasePatch::field(CaseField::TextDescription, SEEDED_BLOCK),
            ]
        );

        let existing = self::plan(&case("c2"), ContextAction::AddTextDescription);
        assert!(existing.is_noop());
        assert_eq!(existing.notice, Some(NoticeKey::TextDescriptionExists));
        assert!(existing.reload_after(0));
    }

    #[test]
    fn mode_switches_seed_content() {
        assert_eq!(
            patches(&plan(&case("c3"), ContextAction::SwitchToText)),
            vec![CasePatch::mode(CaseMode::Text)
                .with_field(CaseField::TextDescription, SEEDED_BLOCK)]
        );
        let mut to_steps = CasePatch::mode(CaseMode::Steps);
        to_steps.steps = Some(vec![Step::blank()]);
        assert_eq!(patches(&plan(&case("c2"), ContextAction::SwitchToSteps)), vec![to_steps]);
        assert_eq!(
            patches(&plan(&case("c1"), ContextAction::SwitchToSteps)),
            vec![CasePatch::mode(CaseMode::Steps)]
        );
    }

    #[test]
    fn step_insertion() {
        let step0 = Address::StepDesc {
            case: CaseId::new("c1"),
            index: 0,
        };
        let above = patches(&plan(&step0, ContextAction::InsertStepAbove));
        assert_eq!(
            above[0].steps.as_deref(),
            Some(&[Step::blank(), Step::new("a", "1"), Step::new("b", "2")][..])
        );
        let below = patches(&plan(&step0, ContextAction::InsertStepBelow));
        assert_eq!(below[0].steps.as_ref().map(|s| s[1].clone()), Some(Step::blank()));

        let appended = patches(&plan(&case("c1"), ContextAction::AddStep));
        assert_eq!(appended[0].steps.as_ref().map(Vec::len), Some(3));

        let not_step = plan(&case("c1"), ContextAction::InsertStepAbove);
        assert_eq!(not_step.notice, Some(NoticeKey::InsertNeedsStep));
        let text = plan(&case("c2"), ContextAction::AddStep);
        assert_eq!(text.notice, Some(NoticeKey::TextModeHasNoSteps));
    }

    #[test]
    fn step_insertion_at_huge_index_appends() {
        for index in [usize::MAX, usize::MAX - 1, 40] {
            let address = Address::StepDesc {
                case: CaseId::new("c1"),
                index,
            };
            for action in [ContextAction::InsertStepBelow, ContextAction::InsertStepAbove] {
                let steps = patches(&plan(&address, action)).remove(0).steps.unwrap();
                assert_eq!(
                    steps,
                    vec![Step::new("a", "1"), Step::new("b", "2"), Step::blank()]
                );
            }
        }
    }

    #[test]
    fn rename_requires_module_and_name() {
        let module = Address::Module(ModuleId::new("m1"));
        let plan_ok = plan(&module, ContextAction::RenameModule("  Billing ".into()));
        assert_eq!(
            plan_ok.mutations[0].mutation,
            Mutation::RenameModule {
                module_id: ModuleId::new("m1"),
                name: "Billing".into(),
            }
        );
        let blank = plan(&module, ContextAction::RenameModule("   ".into()));
        assert_eq!(blank.notice, Some(NoticeKey::RenameNeedsName));
        let wrong = plan(&case("c1"), ContextAction::RenameModule("x".into()));
        assert_eq!(wrong.notice, Some(NoticeKey::RenameNeedsModule));
    }

    #[test]
    fn delete_variants() {
        let module = plan(&Address::Module(ModuleId::new("m1")), ContextAction::DeleteNode);
        assert_eq!(
            module.mutations[0].mutation,
            Mutation::DeleteModule(ModuleId::new("m1"))
        );
        assert_eq!(module.failure, Some(FailureKind::Delete));

        let description = Address::CaseProp {
            case: CaseId::new("c2"),
            field: CaseField::TextDescription,
        };
        assert_eq!(
            patches(&plan(&description, ContextAction::DeleteNode)),
            vec![CasePatch::field(CaseField::TextDescription, EMPTY_BLOCK)
                .with_field(CaseField::TextResult, EMPTY_BLOCK)]
        );

        let step = Address::StepRes {
            case: CaseId::new("c1"),
            index: 0,
        };
        assert_eq!(
            patches(&plan(&step, ContextAction::DeleteNode))[0].steps,
            Some(vec![Step::new("b", "2")])
        );

        let root = plan(&Address::Root, ContextAction::DeleteNode);
        assert_eq!(root.notice, Some(NoticeKey::DeleteUnsupported));
    }
}
