use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
};

use log::{debug, warn};
use thiserror::Error;

use crate::model::{requirement::include_target, PackageName, Requirement};

pub const DEFAULT_REQUIREMENT_FILES: [&str; 3] = [
    "requirements.txt",
    "local_requirements.txt",
    "test_requirements.txt",
];

#[derive(Error, Debug)]
pub enum RequirementsError {
    #[error("No requirements found.{}", verbose_hint(.verbose))]
    NoRequirementsFound { verbose: bool },
    #[error("Could not read requirements file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn verbose_hint(verbose: &bool) -> &'static str {
    if *verbose {
        ""
    } else {
        " Use -v for more information."
    }
}

/// Outcome of looking for one requirements file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestStatus {
    Found(Vec<String>),
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// Path as requested, before being joined to the project root.
    pub path: PathBuf,
    pub status: ManifestStatus,
}

impl Manifest {
    pub fn is_found(&self) -> bool {
        matches!(self.status, ManifestStatus::Found(_))
    }
}

/// Reads every candidate requirements file, in order. Missing files are recorded, not fatal.
///
/// Files pulled in with `-r`/`--requirement` are read right after the file that includes them,
/// relative to its directory. Each file is read once, so include cycles are harmless.
pub fn read_manifests(
    root: &Path,
    paths: &[PathBuf],
) -> Result<Vec<Manifest>, RequirementsError> {
    let mut manifests = Vec::new();
    let mut seen = BTreeSet::new();
    for path in paths {
        let mut stack = vec![path.clone()];
        while let Some(path) = stack.pop() {
            let full_path = root.join(&path);
            if !seen.insert(full_path.clone()) {
                debug!("Requirements file {} already read", full_path.display());
                continue;
            }
            let status = match std::fs::read_to_string(&full_path) {
                Ok(contents) => {
                    debug!("Reading requirements from {}", full_path.display());
                    ManifestStatus::Found(contents.lines().map(str::to_owned).collect())
                }
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                    debug!("Requirements file {} not found", full_path.display());
                    ManifestStatus::NotFound
                }
                Err(source) => {
                    return Err(RequirementsError::Io {
                        path: full_path,
                        source,
                    })
                }
            };
            if let ManifestStatus::Found(lines) = &status {
                let directory = path.parent().unwrap_or(Path::new(""));
                let includes: Vec<PathBuf> = lines
                    .iter()
                    .filter_map(|line| include_target(line))
                    .map(|target| directory.join(target))
                    .collect();
                stack.extend(includes.into_iter().rev());
            }
            manifests.push(Manifest { path, status });
        }
    }
    Ok(manifests)
}

/// Everything the requirements files ask for, merged across files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequirementSet {
    names: BTreeSet<PackageName>,
    editables: BTreeSet<String>,
}

impl RequirementSet {
    pub fn from_requirements(requirements: impl IntoIterator<Item = Requirement>) -> Self {
        let mut set = RequirementSet::default();
        for requirement in requirements {
            set.insert(requirement);
        }
        set
    }

    /// Parses every found manifest. Fails when the manifests have no non-empty line at all.
    pub fn resolve(manifests: &[Manifest], verbose: bool) -> Result<Self, RequirementsError> {
        let mut set = RequirementSet::default();
        let mut non_empty_lines = 0;
        for manifest in manifests {
            let ManifestStatus::Found(lines) = &manifest.status else {
                continue;
            };
            for line in lines {
                if !line.trim().is_empty() {
                    non_empty_lines += 1;
                }
                match Requirement::parse_line(line) {
                    Ok(Some(requirement)) => set.insert(requirement),
                    Ok(None) => {}
                    Err(err) => warn!(
                        "Ignoring line {:?} in {}: {err}",
                        line,
                        manifest.path.display()
                    ),
                }
            }
        }

        if non_empty_lines == 0 {
            return Err(RequirementsError::NoRequirementsFound { verbose });
        }
        if set.is_empty() {
            warn!("Requirements files list no packages, every installed root is extraneous");
        }
        debug!(
            "Resolved {} named and {} editable requirements",
            set.names.len(),
            set.editables.len()
        );
        Ok(set)
    }

    /// Replaces each editable line that matches an installed editable with that package's name.
    pub fn reconcile(&mut self, frozen_forms: &BTreeMap<String, PackageName>) {
        for (frozen, name) in frozen_forms {
            if self.editables.remove(frozen) {
                debug!("Editable requirement {frozen:?} is installed as {name}");
                self.names.insert(name.clone());
            }
        }
    }

    pub fn insert(&mut self, requirement: Requirement) {
        match requirement {
            Requirement::Name(name) => {
                self.names.insert(name);
            }
            Requirement::Editable(frozen) => {
                self.editables.insert(frozen);
            }
        }
    }

    pub fn contains(&self, name: &PackageName) -> bool {
        self.names.contains(name)
    }

    pub fn names(&self) -> &BTreeSet<PackageName> {
        &self.names
    }

    /// Editable lines that did not match any installed editable.
    pub fn editables(&self) -> &BTreeSet<String> {
        &self.editables
    }

    pub fn len(&self) -> usize {
        self.names.len() + self.editables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.editables.is_empty()
    }
}
