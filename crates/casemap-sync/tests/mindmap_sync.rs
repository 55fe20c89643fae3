//! Widget gestures driven end to end against the in-memory backend

use casemap_edit::{Placement, RawOperation, RejectReason, Skip};
use casemap_model::{Address, CaseField, CaseId, ModuleId, PLACEHOLDER};
use casemap_sync::{BackendError, Severity, SyncError};
use casemap_test_utils::{
    init_test_tracing, loaded_dispatcher, nested_hierarchy, text_mode_hierarchy,
    two_module_hierarchy, BackendCall,
};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn move_case_into_other_module_then_repeat() {
    init_test_tracing();
    let (mut dispatcher, backend, notifier) = loaded_dispatcher(two_module_hierarchy()).await;
    let op = RawOperation::moved(Placement::Into, ["case:C1"], "module:B");

    let outcome = dispatcher.handle_operation(op.clone()).await.unwrap();
    assert_eq!(outcome.succeeded, 1);
    assert!(outcome.reloaded);
    assert_eq!(
        backend.mutations().await,
        vec![BackendCall::UpdateCaseModule {
            case_ids: vec![CaseId::new("C1")],
            target: Some(ModuleId::new("B")),
        }]
    );
    assert_eq!(backend.reloads().await, 1);
    assert_eq!(
        dispatcher.mirror().module_of(&CaseId::new("C1")),
        Some(&ModuleId::new("B"))
    );

    backend.clear_calls().await;
    let again = dispatcher.handle_operation(op).await.unwrap();
    assert!(again.is_noop());
    assert!(!again.reloaded);
    assert!(backend.calls().await.is_empty());
    assert!(notifier.notices().is_empty());
}

#[tokio::test]
async fn unchanged_step_result_on_text_mode_case_is_ignored() {
    init_test_tracing();
    let (mut dispatcher, backend, _) = loaded_dispatcher(text_mode_hierarchy()).await;

    let outcome = dispatcher
        .handle_operation(RawOperation::finish_edit("stepres:C2:0", PLACEHOLDER))
        .await
        .unwrap();
    assert!(outcome.is_noop());
    assert_eq!(outcome.skipped, Some(Skip::NotInView));
    assert!(backend.calls().await.is_empty());
}

#[tokio::test]
async fn unchanged_labels_issue_no_calls() {
    init_test_tracing();
    let (mut dispatcher, backend, _) = loaded_dispatcher(nested_hierarchy()).await;

    for (address, label) in [
        ("case:C3", "TC-3 deep"),
        ("caseprop:C3:precondition", "logged in"),
        ("caseprop:C3:remark", PLACEHOLDER),
        ("stepdesc:C3:1", "c"),
        ("stepres:C3:0", "b"),
    ] {
        let outcome = dispatcher
            .handle_operation(RawOperation::finish_edit(address, label))
            .await
            .unwrap();
        assert_eq!(outcome.skipped, Some(Skip::Unchanged), "{address}");
    }
    assert!(backend.calls().await.is_empty());
}

#[tokio::test]
async fn property_labels_are_escaped_on_write() {
    init_test_tracing();
    let (mut dispatcher, backend, _) = loaded_dispatcher(two_module_hierarchy()).await;

    dispatcher
        .handle_operation(RawOperation::finish_edit(
            "caseprop:C1:precondition",
            "<script>&\"'",
        ))
        .await
        .unwrap();

    let stored = backend.snapshot().await;
    let markup = stored
        .find_case(&CaseId::new("C1"))
        .unwrap()
        .field(CaseField::Precondition)
        .to_string();
    assert_eq!(markup, "<p>&lt;script&gt;&amp;&quot;&#039;</p>");
    let inner = &markup["<p>".len()..markup.len() - "</p>".len()];
    assert!(!inner.contains('<') && !inner.contains('>'));
    assert!(inner.split('&').skip(1).all(|rest| {
        ["lt;", "gt;", "amp;", "quot;", "#039;"]
            .iter()
            .any(|entity| rest.starts_with(entity))
    }));
    assert_eq!(
        dispatcher
            .mirror()
            .get(&CaseId::new("C1"))
            .unwrap()
            .field(CaseField::Precondition),
        markup
    );
}

#[tokio::test]
async fn step_commit_beyond_the_end_pads_with_blank_steps() {
    init_test_tracing();
    let (mut dispatcher, backend, _) = loaded_dispatcher(nested_hierarchy()).await;

    dispatcher
        .handle_operation(RawOperation::finish_edit("stepres:C3:5", "done"))
        .await
        .unwrap();

    let steps = backend
        .snapshot()
        .await
        .find_case(&CaseId::new("C3"))
        .unwrap()
        .steps
        .clone();
    assert_eq!(steps.len(), 6);
    assert_eq!(steps[0].description, "a");
    assert_eq!(steps[1].result, "d");
    assert!(steps[2..5]
        .iter()
        .all(|step| step.description.is_empty() && step.result.is_empty()));
    assert_eq!(steps[5].result, "done");
}

#[tokio::test]
async fn label_commit_updates_the_rendered_node() {
    init_test_tracing();
    let (mut dispatcher, backend, _) = loaded_dispatcher(nested_hierarchy()).await;

    let outcome = dispatcher
        .handle_operation(RawOperation::finish_edit("stepdesc:C3:0", "press start"))
        .await
        .unwrap();
    assert!(!outcome.reloaded);
    assert_eq!(backend.reloads().await, 0);
    let address = Address::StepDesc {
        case: CaseId::new("C3"),
        index: 0,
    };
    let node = dispatcher.document().unwrap().find(&address).unwrap();
    assert_eq!(node.label, "press start");
}

#[tokio::test]
async fn case_rename_keeps_the_code_prefix() {
    init_test_tracing();
    let (mut dispatcher, backend, _) = loaded_dispatcher(nested_hierarchy()).await;
    let address = Address::Case(CaseId::new("C3"));

    dispatcher
        .handle_operation(RawOperation::finish_edit("case:C3", "renamed"))
        .await
        .unwrap();
    assert_eq!(backend.reloads().await, 0);
    let node = dispatcher.document().unwrap().find(&address).unwrap();
    assert_eq!(node.label, "TC-3 renamed");

    dispatcher
        .handle_operation(RawOperation::finish_edit("case:C3", "TC-3 again"))
        .await
        .unwrap();
    let node = dispatcher.document().unwrap().find(&address).unwrap();
    assert_eq!(node.label, "TC-3 again");
}

#[tokio::test]
async fn module_cannot_become_its_own_parent() {
    init_test_tracing();
    let (mut dispatcher, backend, _) = loaded_dispatcher(nested_hierarchy()).await;
    let before = dispatcher.mirror().len();

    let outcome = dispatcher
        .handle_operation(RawOperation::moved(Placement::Into, ["module:A"], "module:A"))
        .await
        .unwrap();
    assert_eq!(outcome.rejected, 1);
    assert!(outcome.is_noop());
    assert!(backend.calls().await.is_empty());
    assert_eq!(dispatcher.mirror().len(), before);
    assert!(dispatcher.mirror().is_fresh());
}

#[tokio::test]
async fn module_cannot_move_under_its_descendant() {
    init_test_tracing();
    let (dispatcher, _, _) = loaded_dispatcher(nested_hierarchy()).await;
    let document = dispatcher.document().unwrap();
    let op = casemap_edit::Operation::try_from(RawOperation::moved(
        Placement::Into,
        ["module:A"],
        "module:A2",
    ))
    .unwrap();
    let plan = casemap_edit::EditInterpreter::default()
        .plan(document, dispatcher.mirror(), &op)
        .unwrap();
    assert_eq!(plan.rejected[0].reason, RejectReason::IntoDescendant);
    assert!(plan.is_noop());
}

#[tokio::test]
async fn module_dropped_beside_a_root_case_moves_to_top_level() {
    init_test_tracing();
    let (mut dispatcher, backend, _) = loaded_dispatcher(nested_hierarchy()).await;

    dispatcher
        .handle_operation(RawOperation::moved(Placement::Before, ["module:A1"], "case:C4"))
        .await
        .unwrap();
    assert_eq!(
        backend.mutations().await,
        vec![BackendCall::UpdateModuleParent {
            module_id: ModuleId::new("A1"),
            parent: None,
        }]
    );
    let root = &dispatcher.document().unwrap().root;
    assert!(root
        .children
        .iter()
        .any(|node| node.address == Address::Module(ModuleId::new("A1"))));
}

#[tokio::test]
async fn partial_batch_failure_still_runs_every_element_and_reloads() {
    init_test_tracing();
    let (mut dispatcher, backend, notifier) = loaded_dispatcher(nested_hierarchy()).await;
    backend
        .fail("update_module_parent", BackendError::rejected("module locked"))
        .await;

    let err = dispatcher
        .handle_operation(RawOperation::moved(
            Placement::Into,
            ["module:A1", "case:C4"],
            "module:B",
        ))
        .await
        .unwrap_err();
    assert!(err.is_backend());
    assert_eq!(backend.mutations().await.len(), 2);
    assert_eq!(backend.reloads().await, 1);
    assert_eq!(notifier.messages(Severity::Error), vec!["module locked".to_string()]);
    assert_eq!(
        dispatcher.mirror().module_of(&CaseId::new("C4")),
        Some(&ModuleId::new("B"))
    );
}

#[tokio::test]
async fn unresolvable_target_fails_before_any_call() {
    init_test_tracing();
    let (mut dispatcher, backend, notifier) = loaded_dispatcher(nested_hierarchy()).await;

    let err = dispatcher
        .handle_operation(RawOperation::moved(
            Placement::After,
            ["case:C4"],
            "case:does-not-exist",
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::UnresolvedTarget(_)));
    assert!(backend.calls().await.is_empty());
    assert!(notifier.notices().is_empty());
}

#[tokio::test]
async fn malformed_json_payloads_are_ignored() {
    init_test_tracing();
    let (mut dispatcher, backend, notifier) = loaded_dispatcher(two_module_hierarchy()).await;

    let err = dispatcher.handle_json("{not json").await.unwrap_err();
    assert!(matches!(err, SyncError::Operation(_)));

    let payload = r#"{"name":"finishEdit","obj":{"id":"case:C1:remark","topic":"x"}}"#;
    let err = dispatcher.handle_json(payload).await.unwrap_err();
    assert!(matches!(err, SyncError::Operation(_)));

    assert!(backend.calls().await.is_empty());
    assert!(notifier.notices().is_empty());
}

#[tokio::test]
async fn json_payload_with_wrapped_node_commits() {
    init_test_tracing();
    let (mut dispatcher, backend, _) = loaded_dispatcher(two_module_hierarchy()).await;

    let payload = r#"{"name":"finishEdit","obj":{"nodeObj":{"id":"case:C1","topic":"logout"}}}"#;
    dispatcher.handle_json(payload).await.unwrap();
    assert_eq!(
        backend
            .snapshot()
            .await
            .find_case(&CaseId::new("C1"))
            .unwrap()
            .name,
        "logout"
    );
}

#[tokio::test]
async fn failed_hierarchy_reload_clears_the_view() {
    init_test_tracing();
    let (mut dispatcher, backend, notifier) = loaded_dispatcher(two_module_hierarchy()).await;
    backend
        .fail("fetch_hierarchy", BackendError::Transport("offline".into()))
        .await;

    assert!(!dispatcher.reload().await);
    assert!(dispatcher.document().is_none());
    assert_eq!(notifier.messages(Severity::Error).len(), 1);
    assert_eq!(dispatcher.counts().total, 1);

    backend.clear_failures().await;
    assert!(dispatcher.reload().await);
    assert!(dispatcher.document().is_some());
}
