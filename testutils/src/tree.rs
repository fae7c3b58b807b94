use std::path::{
    Path,
    PathBuf,
};

use assert_fs::TempDir;
use assert_fs::prelude::*;
use rstest::fixture;

use crate::constants::*;

// A scratch directory of declarative test cases, laid out the way the case discovery expects
pub struct CaseTree {
    dir: TempDir,
}

impl CaseTree {
    pub fn new() -> CaseTree {
        CaseTree { dir: TempDir::new().unwrap() }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    pub fn add_file(&self, rel: &str, contents: &str) -> &Self {
        let child = self.dir.child(rel);
        if let Some(parent) = Path::new(rel).parent() {
            self.dir.child(parent).create_dir_all().unwrap();
        }
        child.write_str(contents).unwrap();
        self
    }

    pub fn add_dir(&self, rel: &str) -> &Self {
        self.dir.child(rel).create_dir_all().unwrap();
        self
    }

    // The target doesn't have to exist
    pub fn add_symlink(&self, rel: &str, target: &Path) -> &Self {
        self.dir.child(rel).symlink_to_file(target).unwrap();
        self
    }
}

impl Default for CaseTree {
    fn default() -> Self {
        Self::new()
    }
}

// One case, "case_0": deploying a config map should result in a service account being created,
// and nothing named "the-frobnicator" showing up
#[fixture]
pub fn basic_case_tree() -> CaseTree {
    let tree = CaseTree::new();
    tree.add_file("case_0/deploy/00_configmap.yaml", CONFIG_MAP_YAML)
        .add_file("case_0/expected/created/00_sa.yaml", SERVICE_ACCOUNT_YAML)
        .add_file("case_0/expected/not_created/00_frobnicator.yaml", FROBNICATOR_YAML)
        .add_file("case_0/config.yaml", CONTROLLER_CR_YAML);
    tree
}
