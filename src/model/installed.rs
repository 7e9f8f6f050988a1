use super::PackageName;

/// One installed distribution, as the graph sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageNode {
    pub name: PackageName,
    pub editable: bool,
    /// How an editable install is spelled in a requirements file, e.g. `-e /src/mylib`.
    pub frozen_form: Option<String>,
}

impl PackageNode {
    pub fn new(name: PackageName) -> Self {
        PackageNode {
            name,
            editable: false,
            frozen_form: None,
        }
    }

    pub fn editable(name: PackageName, frozen_form: impl Into<String>) -> Self {
        PackageNode {
            name,
            editable: true,
            frozen_form: Some(frozen_form.into()),
        }
    }
}

/// An installed distribution together with the names of its direct runtime dependencies.
///
/// Dependencies are recorded by name only; whether they are installed is for the graph to decide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPackage {
    pub node: PackageNode,
    pub requires: Vec<PackageName>,
}

impl InstalledPackage {
    pub fn new(node: PackageNode, requires: Vec<PackageName>) -> Self {
        InstalledPackage { node, requires }
    }

    pub fn name(&self) -> &PackageName {
        &self.node.name
    }
}
