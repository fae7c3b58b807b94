use std::sync::Arc;
use std::time::Duration;

use kc_core::discovery::discover_cases;
use kc_core::poll::{
    PollError,
    PollSettings,
};
use kc_core::prelude::*;
use kc_core::runner::run_case;
use kc_testutils::*;
use rstest::*;
use tracing_test::traced_test;

// Stand-in for the controller under test: reconciling the pipeline produces a service account
fn pipeline_reconciler(obj: &DynamicObject) -> Vec<DynamicObject> {
    match obj.types.as_ref() {
        Some(tm) if tm.kind == PIPELINE_GVK.kind => vec![test_service_account(TEST_SERVICE_ACCOUNT)],
        _ => vec![],
    }
}

// A controller with a bug: it also creates something it shouldn't have
fn overeager_reconciler(obj: &DynamicObject) -> Vec<DynamicObject> {
    let mut children = pipeline_reconciler(obj);
    if !children.is_empty() {
        children.push(test_frobnicator());
    }
    children
}

fn short_poll() -> PollSettings {
    PollSettings::new(Duration::from_secs(1), Duration::from_millis(10))
}

#[rstest]
#[traced_test]
#[tokio::test(start_paused = true)]
async fn test_run_case(basic_case_tree: CaseTree) {
    let cluster = Arc::new(FakeCluster::new().with_delay(2).with_reconciler(pipeline_reconciler));
    let ctx = HarnessContext::new(cluster.clone(), TEST_NAMESPACE);
    let cases = discover_cases(basic_case_tree.path()).unwrap();

    run_case(&ctx, &cases[0]).await.unwrap();

    // config and deploy manifests
    assert_eq!(cluster.apply_calls(), 2);
    assert_eq!(cluster.delete_calls(), 2);
    assert!(cluster.is_empty());
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn test_run_case_controller_never_reconciles(basic_case_tree: CaseTree) {
    let cluster = Arc::new(FakeCluster::new().with_delay(2));
    let ctx = HarnessContext::new(cluster.clone(), TEST_NAMESPACE).with_poll(short_poll());
    let cases = discover_cases(basic_case_tree.path()).unwrap();

    let err = run_case(&ctx, &cases[0]).await.unwrap_err();
    assert!(matches!(err.downcast_ref::<PollError>(), Some(PollError::Timeout { .. })));

    // Teardown still happened
    assert_eq!(cluster.delete_calls(), 2);
    assert!(cluster.is_empty());
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn test_run_case_forbidden_resource_created(basic_case_tree: CaseTree) {
    let cluster = Arc::new(FakeCluster::new().with_reconciler(overeager_reconciler));
    let ctx = HarnessContext::new(cluster.clone(), TEST_NAMESPACE).with_poll(short_poll());
    let cases = discover_cases(basic_case_tree.path()).unwrap();

    let err = run_case(&ctx, &cases[0]).await.unwrap_err();
    match err.downcast_ref::<PollError>() {
        Some(PollError::Timeout { description, .. }) => assert!(description.contains("the-frobnicator")),
        _ => panic!("unexpected error: {err:#}"),
    }
    assert!(cluster.is_empty());
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn test_run_case_without_config() {
    let tree = CaseTree::new();
    tree.add_file("no_config/deploy/00_cm.yaml", CONFIG_MAP_YAML)
        .add_file("no_config/expected/created/00_cm.yaml", CONFIG_MAP_YAML);
    let cluster = Arc::new(FakeCluster::new().with_delay(1));
    let ctx = HarnessContext::new(cluster.clone(), TEST_NAMESPACE);
    let cases = discover_cases(tree.path()).unwrap();

    run_case(&ctx, &cases[0]).await.unwrap();
    assert_eq!(cluster.apply_calls(), 1);
    assert_eq!(cluster.delete_calls(), 1);
    assert!(cluster.is_empty());
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn test_run_case_cluster_unreachable() {
    let tree = CaseTree::new();
    tree.add_file("c/deploy/00_cm.yaml", CONFIG_MAP_YAML);
    let cluster = Arc::new(FakeCluster::new());
    let ctx = HarnessContext::new(cluster.clone(), TEST_NAMESPACE).with_poll(short_poll());
    let cases = discover_cases(tree.path()).unwrap();

    // The apiserver stops answering reads; deploy can't confirm anything, but teardown still runs
    cluster.insert(test_config_map(TEST_CONFIG_MAP));
    cluster.fail_gets_with(ClusterError::Transient("connection reset".into()));

    let err = run_case(&ctx, &cases[0]).await.unwrap_err();
    assert!(matches!(err.downcast_ref::<PollError>(), Some(PollError::Timeout { .. })));
    assert_eq!(cluster.delete_calls(), 1);
}
