use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::compare::ComparisonStore;
use crate::manifest::{
    Manifest,
    Transformer,
};
use crate::poll::PollSettings;
use crate::prelude::*;

// Everything a single test needs to talk to the cluster.  Each test should get its own context
// with its own namespace; nothing stops two contexts from pointing at the same namespace, but the
// tests will trip over each other if they do.
#[derive(Clone)]
pub struct HarnessContext {
    pub client: Arc<dyn ClusterClient>,
    pub namespace: String,
    pub transformers: Vec<Transformer>,
    pub poll: PollSettings,
    pub cancel: CancellationToken,
    pub comparators: Arc<ComparisonStore>,
}

impl HarnessContext {
    pub fn new(client: Arc<dyn ClusterClient>, namespace: &str) -> HarnessContext {
        HarnessContext {
            client,
            namespace: namespace.into(),
            transformers: vec![],
            poll: PollSettings::default(),
            cancel: CancellationToken::new(),
            comparators: Arc::new(ComparisonStore::default()),
        }
    }

    pub fn with_poll(mut self, poll: PollSettings) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_transformers(mut self, transformers: Vec<Transformer>) -> Self {
        self.transformers = transformers;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_comparators(mut self, comparators: Arc<ComparisonStore>) -> Self {
        self.comparators = comparators;
        self
    }

    // Load the manifest at path with the test namespace injected, followed by any additional
    // transforms configured for this context
    pub fn load_manifest(&self, path: &Path) -> anyhow::Result<Manifest> {
        let mut transformers = vec![Transformer::InjectNamespace(self.namespace.clone())];
        transformers.extend(self.transformers.iter().cloned());
        Manifest::from_path(path)?.transform(&transformers)
    }
}
