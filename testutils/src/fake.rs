use httpmock::prelude::*;
use httpmock::{
    Mock,
    Then,
    When,
};
use serde_json::json;

pub struct MockServerBuilder {
    server: MockServer,
    handlers: Vec<Box<dyn Fn(When, Then)>>,
    mock_ids: Vec<usize>,
}

fn print_req(req: &HttpMockRequest) -> bool {
    // Use println instead of info! so that this works outside of the lib crate
    println!("    Received: {} {}", req.method(), req.uri().path());
    true
}

impl MockServerBuilder {
    pub fn new() -> MockServerBuilder {
        MockServerBuilder {
            server: MockServer::start(),
            handlers: vec![],
            mock_ids: vec![],
        }
    }

    pub fn assert(&self) {
        for id in &self.mock_ids {
            println!("checking assertions for mock {id}");
            Mock::new(*id, &self.server).assert()
        }
    }

    pub fn handle<F: Fn(When, Then) + 'static>(&mut self, f: F) -> &mut Self {
        self.handlers.push(Box::new(move |w, t| {
            let w = w.matches(print_req);
            f(w, t);
        }));
        self
    }

    pub fn handle_not_found(&mut self, path: String) -> &mut Self {
        self.handle_status(path, 404)
    }

    pub fn handle_status(&mut self, path: String, code: u16) -> &mut Self {
        self.handle(move |when, then| {
            when.path(&path);
            then.status(code).json_body(status_failure(code));
        })
    }

    // kube's dynamic discovery asks for the whole resource list of a group/version before it can
    // build an Api for a kind in that group
    pub fn handle_core_discovery(&mut self) -> &mut Self {
        self.handle(|when, then| {
            when.method(GET).path("/api/v1");
            then.json_body(core_v1_discovery());
        })
    }

    pub fn handle_apps_discovery(&mut self) -> &mut Self {
        self.handle(|when, then| {
            when.method(GET).path("/apis/apps/v1");
            then.json_body(apps_v1_discovery());
        })
    }

    pub fn build(&mut self) {
        for f in self.handlers.iter() {
            self.mock_ids.push(self.server.mock(f).id);
        }

        // Print all unmatched/unhandled requests for easier debugging;
        // this has to go last so that the other mock rules have a chance
        // to match first
        self.server.mock(|when, _| {
            when.matches(print_req);
        });
    }

    pub fn url(&self) -> http::Uri {
        http::Uri::try_from(self.server.url("/")).unwrap()
    }
}

impl Default for MockServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn make_fake_apiserver() -> (MockServerBuilder, kube::Client) {
    let builder = MockServerBuilder::new();
    let config = kube::Config::new(builder.url());
    let client = kube::Client::try_from(config).unwrap();
    (builder, client)
}

pub fn status_ok() -> serde_json::Value {
    json!({
      "kind": "Status",
      "apiVersion": "v1",
      "metadata": {},
      "status": "Success",
      "code": 200
    })
}

pub fn status_failure(code: u16) -> serde_json::Value {
    let reason = match code {
        400 => "BadRequest",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "NotFound",
        409 => "Conflict",
        422 => "Invalid",
        500 => "InternalError",
        503 => "ServiceUnavailable",
        _ => "Unknown",
    };
    json!({
      "kind": "Status",
      "apiVersion": "v1",
      "metadata": {},
      "status": "Failure",
      "message": format!("fake apiserver says {reason}"),
      "reason": reason,
      "code": code
    })
}

pub fn core_v1_discovery() -> serde_json::Value {
    resource_list(
        "v1",
        &[
            api_resource("configmaps", "ConfigMap", true),
            api_resource("namespaces", "Namespace", false),
            api_resource("secrets", "Secret", true),
            api_resource("serviceaccounts", "ServiceAccount", true),
            api_resource("services", "Service", true),
        ],
    )
}

pub fn apps_v1_discovery() -> serde_json::Value {
    resource_list("apps/v1", &[api_resource("deployments", "Deployment", true)])
}

fn resource_list(group_version: &str, resources: &[serde_json::Value]) -> serde_json::Value {
    json!({
        "kind": "APIResourceList",
        "apiVersion": "v1",
        "groupVersion": group_version,
        "resources": resources,
    })
}

fn api_resource(plural: &str, kind: &str, namespaced: bool) -> serde_json::Value {
    json!({
        "name": plural,
        "singularName": kind.to_lowercase(),
        "namespaced": namespaced,
        "kind": kind,
        "verbs": ["create", "delete", "get", "list", "patch", "update", "watch"],
    })
}
