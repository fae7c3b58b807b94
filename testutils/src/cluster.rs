use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use kc_core::manifest::Manifest;
use kc_core::prelude::*;

use crate::objs::as_served;

type ObjKey = (String, String, String);

// A reconciler plays the part of the controller under test: it's called with every object that
// gets applied and returns the objects the controller would create in response.  Children are
// owned by their parent and disappear as soon as it's deleted.
pub type Reconciler = Box<dyn Fn(&DynamicObject) -> Vec<DynamicObject> + Send + Sync>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Phase {
    Appearing(usize),
    Present,
    Deleting(usize),
}

struct Entry {
    obj: DynamicObject,
    phase: Phase,
    owner: Option<ObjKey>,
}

#[derive(Default)]
struct FakeClusterState {
    objs: BTreeMap<ObjKey, Entry>,
    get_calls: usize,
    apply_calls: usize,
    delete_calls: usize,
    get_error: Option<ClusterError>,
}

/// In-memory stand-in for a cluster.  Applied objects only become visible after `delay` reads of
/// that object, and deleted objects linger for the same number of reads, which is enough to make
/// the harness actually poll.
#[derive(Default)]
pub struct FakeCluster {
    state: Mutex<FakeClusterState>,
    reconciler: Option<Reconciler>,
    delay: usize,
}

impl FakeCluster {
    pub fn new() -> FakeCluster {
        FakeCluster::default()
    }

    pub fn with_delay(mut self, delay: usize) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_reconciler<F>(mut self, f: F) -> Self
    where
        F: Fn(&DynamicObject) -> Vec<DynamicObject> + Send + Sync + 'static,
    {
        self.reconciler = Some(Box::new(f));
        self
    }

    // Put an object on the cluster immediately, bypassing apply
    pub fn insert(&self, obj: DynamicObject) {
        let mut state = self.state.lock().unwrap();
        state
            .objs
            .insert(key_for(&obj), Entry { obj: as_served(&obj), phase: Phase::Present, owner: None });
    }

    pub fn fail_gets_with(&self, err: ClusterError) {
        self.state.lock().unwrap().get_error = Some(err);
    }

    pub fn contains(&self, obj: &DynamicObject) -> bool {
        self.state.lock().unwrap().objs.contains_key(&key_for(obj))
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap().objs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get_calls(&self) -> usize {
        self.state.lock().unwrap().get_calls
    }

    pub fn apply_calls(&self) -> usize {
        self.state.lock().unwrap().apply_calls
    }

    pub fn delete_calls(&self) -> usize {
        self.state.lock().unwrap().delete_calls
    }
}

#[async_trait]
impl ClusterClient for FakeCluster {
    async fn get(&self, obj: &DynamicObject) -> Result<DynamicObject, ClusterError> {
        let mut state = self.state.lock().unwrap();
        state.get_calls += 1;
        if let Some(err) = &state.get_error {
            return Err(err.clone());
        }

        let key = key_for(obj);
        let not_found = || ClusterError::NotFound(obj.namespaced_name());
        let Some(entry) = state.objs.get_mut(&key) else {
            return Err(not_found());
        };

        let phase = entry.phase;
        match phase {
            Phase::Appearing(0) | Phase::Present => {
                entry.phase = Phase::Present;
                Ok(entry.obj.clone())
            },
            Phase::Appearing(n) => {
                entry.phase = Phase::Appearing(n - 1);
                Err(not_found())
            },
            Phase::Deleting(0) => {
                state.objs.remove(&key);
                Err(not_found())
            },
            Phase::Deleting(n) => {
                entry.phase = Phase::Deleting(n - 1);
                Ok(entry.obj.clone())
            },
        }
    }

    async fn apply(&self, manifest: &Manifest) -> Result<(), ClusterError> {
        let mut state = self.state.lock().unwrap();
        state.apply_calls += 1;
        for obj in manifest.resources() {
            let key = key_for(obj);
            let phase = match state.objs.get(&key) {
                Some(Entry { phase: Phase::Present, .. }) => Phase::Present,
                _ => Phase::Appearing(self.delay),
            };
            state.objs.insert(key.clone(), Entry { obj: as_served(obj), phase, owner: None });

            let children = self.reconciler.as_ref().map(|f| f(obj)).unwrap_or_default();
            for child in children {
                let entry = Entry {
                    obj: as_served(&child),
                    phase: Phase::Appearing(self.delay),
                    owner: Some(key.clone()),
                };
                state.objs.insert(key_for(&child), entry);
            }
        }
        Ok(())
    }

    async fn delete(&self, manifest: &Manifest) -> Result<(), ClusterError> {
        let mut state = self.state.lock().unwrap();
        state.delete_calls += 1;
        for obj in manifest.resources().iter().rev() {
            let key = key_for(obj);
            if !state.objs.contains_key(&key) {
                continue;
            }

            // Owned objects get garbage-collected right away
            state.objs.retain(|_, entry| entry.owner.as_ref() != Some(&key));
            if let Some(entry) = state.objs.get_mut(&key) {
                entry.phase = Phase::Deleting(self.delay);
            }
        }
        Ok(())
    }
}

fn key_for(obj: &DynamicObject) -> ObjKey {
    let kind = obj.types.as_ref().map(|tm| tm.kind.clone()).unwrap_or_default();
    (kind, obj.namespace().unwrap_or_default(), obj.name_any())
}
