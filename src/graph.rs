use std::collections::{BTreeMap, BTreeSet};

use log::{debug, trace, warn};

use crate::model::{InstalledPackage, PackageName, PackageNode};

/// Forward and reverse dependency edges between installed distributions.
///
/// Built once from an installed-package snapshot. Edges only ever connect installed packages:
/// a requirement on something that is not installed is dropped while building.
#[derive(Debug, Default, Clone)]
pub struct DistributionGraph {
    nodes: BTreeMap<PackageName, PackageNode>,
    dependencies: BTreeMap<PackageName, BTreeSet<PackageName>>,
    dependents: BTreeMap<PackageName, BTreeSet<PackageName>>,
}

impl DistributionGraph {
    pub fn from_packages(packages: impl IntoIterator<Item = InstalledPackage>) -> Self {
        let mut nodes = BTreeMap::new();
        let mut requires = BTreeMap::new();
        for package in packages {
            let name = package.name().clone();
            if nodes.contains_key(&name) {
                warn!("{name} is installed more than once, ignoring the duplicate");
                continue;
            }
            nodes.insert(name.clone(), package.node);
            requires.insert(name, package.requires);
        }

        let mut dependencies: BTreeMap<PackageName, BTreeSet<PackageName>> = BTreeMap::new();
        let mut dependents: BTreeMap<PackageName, BTreeSet<PackageName>> = BTreeMap::new();
        for (name, requires) in requires {
            let mut edges = BTreeSet::new();
            for dependency in requires {
                if dependency == name {
                    debug!("Ignoring self dependency of {name}");
                } else if nodes.contains_key(&dependency) {
                    trace!("{name} -> {dependency}");
                    dependents
                        .entry(dependency.clone())
                        .or_default()
                        .insert(name.clone());
                    edges.insert(dependency);
                } else {
                    trace!("{name} requires {dependency}, which is not installed");
                }
            }
            dependencies.insert(name, edges);
        }

        debug!(
            "Built dependency graph with {} packages and {} edges",
            nodes.len(),
            dependencies.values().map(BTreeSet::len).sum::<usize>()
        );

        DistributionGraph {
            nodes,
            dependencies,
            dependents,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, name: &PackageName) -> Option<&PackageNode> {
        self.nodes.get(name)
    }

    pub fn contains(&self, name: &PackageName) -> bool {
        self.nodes.contains_key(name)
    }

    /// Direct dependencies of `name`; empty for packages that are not installed.
    pub fn dependencies<'a>(
        &'a self,
        name: &PackageName,
    ) -> impl Iterator<Item = &'a PackageName> + 'a {
        self.dependencies.get(name).into_iter().flatten()
    }

    /// Installed packages that directly depend on `name`.
    pub fn dependents<'a>(
        &'a self,
        name: &PackageName,
    ) -> impl Iterator<Item = &'a PackageName> + 'a {
        self.dependents.get(name).into_iter().flatten()
    }

    /// Packages nothing else depends on.
    pub fn roots(&self) -> BTreeSet<PackageName> {
        self.nodes
            .keys()
            .filter(|name| !self.dependents.contains_key(*name))
            .cloned()
            .collect()
    }

    /// Maps the frozen form of every editable root to its canonical name.
    pub fn editable_frozen_forms(&self) -> BTreeMap<String, PackageName> {
        self.roots()
            .into_iter()
            .filter_map(|name| {
                let node = self.nodes.get(&name)?;
                match (&node.frozen_form, node.editable) {
                    (Some(frozen), true) => Some((frozen.clone(), name)),
                    _ => None,
                }
            })
            .collect()
    }
}
