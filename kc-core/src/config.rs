use std::collections::BTreeMap;
use std::collections::hash_map::DefaultHasher;
use std::fs::File;
use std::hash::{
    Hash,
    Hasher,
};
use std::path::{
    Path,
    PathBuf,
};

use anyhow::Context;
use serde::{
    Deserialize,
    Serialize,
};

use crate::manifest::Transformer;
use crate::poll::PollSettings;
use crate::prelude::*;

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HarnessConfig {
    pub cases_dir: PathBuf,
    pub namespace_prefix: String,
    pub field_manager: String,
    pub poll: PollSettings,

    // Added to every resource the harness loads, expected ones included
    pub extra_labels: BTreeMap<String, String>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        HarnessConfig {
            cases_dir: DEFAULT_CASES_DIR.into(),
            namespace_prefix: DEFAULT_NAMESPACE_PREFIX.into(),
            field_manager: DEFAULT_FIELD_MANAGER.into(),
            poll: PollSettings::default(),
            extra_labels: BTreeMap::new(),
        }
    }
}

impl HarnessConfig {
    pub fn load(filename: &Path) -> anyhow::Result<HarnessConfig> {
        let file = File::open(filename).with_context(|| format!("could not open config {}", filename.display()))?;
        Ok(serde_yaml::from_reader(file)?)
    }

    // Case directories can be called anything, but the namespace has to be a valid DNS-1123 label.
    // Anything that isn't a lowercase alphanumeric becomes a '-'; names that are too long get cut
    // short and a hash of the full name tacked on, so two long case names can't collide.
    pub fn namespace_for(&self, case_name: &str) -> String {
        let full_name = format!("{}-{}", self.namespace_prefix, case_name).to_lowercase();
        let name: String = full_name
            .chars()
            .map(|c| if c.is_ascii_lowercase() || c.is_ascii_digit() { c } else { '-' })
            .collect();
        let name = name.trim_matches('-');
        if name.len() <= MAX_NAMESPACE_LEN {
            return name.into();
        }

        let mut hasher = DefaultHasher::new();
        full_name.hash(&mut hasher);
        let suffix = format!("{:08x}", hasher.finish() as u32);

        // Everything is ASCII at this point, so byte offsets are char boundaries
        let head = name[..MAX_NAMESPACE_LEN - suffix.len() - 1].trim_end_matches('-');
        format!("{head}-{suffix}")
    }

    pub fn transformers(&self) -> Vec<Transformer> {
        if self.extra_labels.is_empty() {
            return vec![];
        }
        vec![Transformer::InjectLabels(self.extra_labels.clone())]
    }
}
