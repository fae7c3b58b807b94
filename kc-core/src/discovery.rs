use std::fs;
use std::io::ErrorKind;
use std::path::{
    Path,
    PathBuf,
};

use anyhow::Context;
use serde::Serialize;
use tracing::*;

use crate::errors::*;
use crate::prelude::*;

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Expectation {
    pub created: Vec<PathBuf>,
    pub not_created: Vec<PathBuf>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Case {
    pub name: String,
    pub description: String,
    pub config: PathBuf,
    pub deploy: Vec<PathBuf>,
    pub expected: Expectation,
}

/// Build one test case for every subdirectory of `cases_dir`, sorted by name.  Each case directory
/// looks like this:
///
/// ```text
/// <case-name>/
///   deploy/*                  (required, non-empty)
///   expected/created/*        (optional)
///   expected/not_created/*    (optional)
///   config.yaml               (optional; not checked here)
/// ```
///
/// Any error reading the tree fails the whole discovery; a half-discovered suite is worse than
/// none at all.
pub fn discover_cases(cases_dir: &Path) -> anyhow::Result<Vec<Case>> {
    let mut case_dirs = vec![];
    for entry in
        fs::read_dir(cases_dir).map_err(|e| HarnessError::case_dir_unreadable(&format!("{}: {e}", cases_dir.display())))?
    {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            case_dirs.push(entry.path());
        } else {
            debug!("skipping non-directory {}", entry.path().display());
        }
    }
    case_dirs.sort();

    let cases = case_dirs.iter().map(|dir| discover_case(dir)).collect::<anyhow::Result<Vec<_>>>()?;
    info!("discovered {} case(s) in {}", cases.len(), cases_dir.display());
    Ok(cases)
}

fn discover_case(case_dir: &Path) -> anyhow::Result<Case> {
    let name = case_dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| anyhow!("invalid case directory: {}", case_dir.display()))?;

    let deploy = list_files(&case_dir.join(CASE_DEPLOY_DIR)).with_context(|| format!("could not read case {name}"))?;
    if deploy.is_empty() {
        bail!(HarnessError::empty_deploy_dir(&name));
    }

    let expected = Expectation {
        created: list_optional_files(&case_dir.join(CASE_CREATED_DIR))?,
        not_created: list_optional_files(&case_dir.join(CASE_NOT_CREATED_DIR))?,
    };

    Ok(Case {
        description: format!("[{name}] - when the deploy manifests are applied"),
        config: case_dir.join(CASE_CONFIG_FILE),
        deploy,
        expected,
        name,
    })
}

// An optional directory that doesn't exist is the same as an empty one, but one that exists and
// can't be read is an error
fn list_optional_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    match fs::metadata(dir) {
        Ok(_) => list_files(dir),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(vec![]),
        Err(e) => Err(HarnessError::case_dir_unreadable(&format!("{}: {e}", dir.display()))),
    }
}

fn list_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = vec![];
    for entry in fs::read_dir(dir).map_err(|e| HarnessError::case_dir_unreadable(&format!("{}: {e}", dir.display())))? {
        // Follows symlinks, so a dangling link is an error rather than a missing manifest
        let path = entry?.path();
        let metadata =
            fs::metadata(&path).map_err(|e| HarnessError::case_dir_unreadable(&format!("{}: {e}", path.display())))?;
        if metadata.is_dir() {
            debug!("skipping directory {}", path.display());
        } else {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
