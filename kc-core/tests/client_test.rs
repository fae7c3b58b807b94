use std::path::Path;

// can't import prelude because that doesn't include "PATCH"
use httpmock::Method::*;
use kc_core::k8s::KubeClusterClient;
use kc_core::manifest::Manifest;
use kc_core::prelude::*;
use kc_testutils::*;
use kube::discovery::ApiResource;
use rstest::*;
use tracing_test::traced_test;

const CM_PATH: &str = "/api/v1/namespaces/test-namespace/configmaps/the-config-map";

fn fake_client() -> (MockServerBuilder, KubeClusterClient) {
    let (mut fake_apiserver, client) = make_fake_apiserver();
    fake_apiserver.handle_core_discovery();
    (fake_apiserver, KubeClusterClient::new(client, DEFAULT_FIELD_MANAGER))
}

#[rstest]
#[traced_test]
#[tokio::test]
async fn test_get_found(test_config_map: DynamicObject) {
    let (mut fake_apiserver, client) = fake_client();
    let served = as_served(&test_config_map);
    fake_apiserver
        .handle(move |when, then| {
            when.method(GET).path(CM_PATH);
            then.json_body_obj(&served);
        })
        .build();

    let obj = client.get(&test_config_map).await.unwrap();
    fake_apiserver.assert();
    assert_eq!(obj.name_any(), TEST_CONFIG_MAP);
    assert_eq!(obj.data["data"]["foo"], "bar");
}

#[rstest]
#[case::not_found(404, ClusterError::is_not_found)]
#[case::forbidden(403, ClusterError::is_terminal)]
#[case::invalid(422, ClusterError::is_terminal)]
#[case::server_error(500, |e: &ClusterError| matches!(e, ClusterError::Transient(_)))]
#[tokio::test]
async fn test_get_error_classification(
    test_config_map: DynamicObject,
    #[case] code: u16,
    #[case] check: fn(&ClusterError) -> bool,
) {
    let (mut fake_apiserver, client) = fake_client();
    fake_apiserver.handle_status(CM_PATH.into(), code).build();

    let err = client.get(&test_config_map).await.unwrap_err();
    assert!(check(&err), "unexpected error for {code}: {err}");
}

#[rstest]
#[tokio::test]
async fn test_get_cluster_scoped() {
    let (mut fake_apiserver, client) = fake_client();
    let ns = DynamicObject::new("some-namespace", &ApiResource::from_gvk(&NAMESPACE_GVK));
    let served = ns.clone();
    fake_apiserver
        .handle(move |when, then| {
            when.method(GET).path("/api/v1/namespaces/some-namespace");
            then.json_body_obj(&served);
        })
        .build();

    client.get(&ns).await.unwrap();
    fake_apiserver.assert();
}

#[rstest]
#[traced_test]
#[tokio::test]
async fn test_apply(test_config_map: DynamicObject, test_deployment: DynamicObject) {
    let (mut fake_apiserver, client) = fake_client();
    fake_apiserver
        .handle_apps_discovery()
        .handle(|when, then| {
            when.method(PATCH)
                .path(CM_PATH)
                .query_param("fieldManager", DEFAULT_FIELD_MANAGER)
                .query_param("force", "true");
            then.json_body(status_ok());
        })
        .handle(|when, then| {
            when.method(PATCH)
                .path("/apis/apps/v1/namespaces/test-namespace/deployments/the-deployment")
                .query_param("fieldManager", DEFAULT_FIELD_MANAGER);
            then.json_body(status_ok());
        })
        .build();

    let manifest = Manifest::from_objects(Path::new("objs.yaml"), vec![test_config_map, test_deployment]);
    client.apply(&manifest).await.unwrap();
    fake_apiserver.assert();
}

#[rstest]
#[tokio::test]
async fn test_apply_rejected(test_config_map: DynamicObject) {
    let (mut fake_apiserver, client) = fake_client();
    fake_apiserver.handle_status(CM_PATH.into(), 422).build();

    let manifest = Manifest::from_objects(Path::new("cm.yaml"), vec![test_config_map]);
    assert!(client.apply(&manifest).await.unwrap_err().is_terminal());
}

#[rstest]
#[traced_test]
#[tokio::test]
async fn test_delete_ignores_not_found(test_config_map: DynamicObject, test_deployment: DynamicObject) {
    let (mut fake_apiserver, client) = fake_client();
    fake_apiserver
        .handle_apps_discovery()
        .handle(|when, then| {
            when.method(DELETE)
                .path("/apis/apps/v1/namespaces/test-namespace/deployments/the-deployment");
            then.json_body(status_ok());
        })
        .handle_not_found(CM_PATH.into())
        .build();

    let manifest = Manifest::from_objects(Path::new("objs.yaml"), vec![test_config_map, test_deployment]);
    client.delete(&manifest).await.unwrap();
    fake_apiserver.assert();
}

#[rstest]
#[tokio::test]
async fn test_delete_forbidden(test_config_map: DynamicObject) {
    let (mut fake_apiserver, client) = fake_client();
    fake_apiserver.handle_status(CM_PATH.into(), 403).build();

    let manifest = Manifest::from_objects(Path::new("cm.yaml"), vec![test_config_map]);
    assert!(client.delete(&manifest).await.unwrap_err().is_terminal());
}
