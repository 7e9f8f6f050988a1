use std::collections::BTreeSet;

use log::debug;

use crate::{
    closure::uninstall_closure,
    extraneous::{extraneous_packages, Exclusions},
    graph::DistributionGraph,
    model::PackageName,
    requirements::RequirementSet,
};

/// What can be uninstalled, split into the extraneous roots and what goes with them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Analysis {
    /// Root packages that no requirements file asks for.
    pub extraneous: BTreeSet<PackageName>,
    /// Packages only installed for the sake of `extraneous`.
    pub uninstall: BTreeSet<PackageName>,
}

impl Analysis {
    pub fn is_empty(&self) -> bool {
        self.extraneous.is_empty()
    }

    /// `pip uninstall -y` followed by the extraneous packages, then the rest, each sorted by name.
    pub fn uninstall_command(&self) -> String {
        let mut command = String::from("pip uninstall -y");
        for name in self.extraneous.iter().chain(&self.uninstall) {
            command.push(' ');
            command.push_str(name.as_str());
        }
        command
    }
}

/// Runs the whole computation over an installed snapshot and reconciled requirements.
pub fn analyze(
    graph: &DistributionGraph,
    requirements: &RequirementSet,
    exclusions: &Exclusions,
) -> Analysis {
    let extraneous = extraneous_packages(&graph.roots(), requirements, exclusions);
    if extraneous.is_empty() {
        debug!("Nothing extraneous, skipping the uninstall closure");
        return Analysis::default();
    }

    // The walk does not know about exclusions, so they are taken out afterwards.
    let uninstall = uninstall_closure(graph, &extraneous)
        .into_iter()
        .filter(|name| !exclusions.contains(name) && !extraneous.contains(name))
        .collect();

    Analysis {
        extraneous,
        uninstall,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{
        graph::tests::{graph, name, names},
        model::{InstalledPackage, PackageNode, Requirement},
    };

    use pretty_assertions::assert_eq;

    fn requirements(entries: &[&str]) -> RequirementSet {
        RequirementSet::from_requirements(
            entries
                .iter()
                .map(|entry| Requirement::parse_line(entry).unwrap().unwrap()),
        )
    }

    #[test]
    fn extraneous_root_takes_its_orphan_along() {
        let graph = graph(&[("x", &[]), ("y", &["z"]), ("z", &[])]);

        let analysis = analyze(&graph, &requirements(&["x"]), &Exclusions::new([], false));

        assert_eq!(
            analysis,
            Analysis {
                extraneous: names(&["y"]),
                uninstall: names(&["z"]),
            }
        );
        assert_eq!(analysis.uninstall_command(), "pip uninstall -y y z");
    }

    #[test]
    fn nothing_extraneous() {
        let graph = graph(&[("x", &["z"]), ("z", &[]), ("pip", &[])]);

        let analysis = analyze(&graph, &requirements(&["x==1.0"]), &Exclusions::new([], false));

        assert!(analysis.is_empty());
        assert!(analysis.uninstall.is_empty());
    }

    #[test]
    fn empty_environment() {
        let graph = DistributionGraph::from_packages(Vec::new());

        let analysis = analyze(&graph, &requirements(&["x"]), &Exclusions::default());

        assert_eq!(analysis, Analysis::default());
    }

    #[test]
    fn excluded_packages_are_never_pulled_in() {
        // `setuptools` is only required by `y`, so the walk reaches it.
        let graph = graph(&[
            ("x", &[]),
            ("y", &["setuptools", "black"]),
            ("setuptools", &["wheel"]),
            ("black", &[]),
            ("wheel", &[]),
        ]);

        let analysis = analyze(
            &graph,
            &requirements(&["x"]),
            &Exclusions::new([name("black")], false),
        );

        assert_eq!(analysis.extraneous, names(&["y"]));
        assert_eq!(analysis.uninstall, names(&["wheel"]));
        for excluded in ["setuptools", "black"] {
            assert!(!analysis.uninstall.contains(&name(excluded)));
        }
    }

    #[test]
    fn editable_requirement_reconciles_to_installed_name() {
        let graph = DistributionGraph::from_packages([
            InstalledPackage::new(PackageNode::editable(name("mylib"), "-e ./mylib"), vec![]),
            InstalledPackage::new(PackageNode::new(name("other")), vec![]),
        ]);
        let mut requirements = requirements(&["-e ./mylib", "other"]);
        requirements.reconcile(&graph.editable_frozen_forms());

        let analysis = analyze(&graph, &requirements, &Exclusions::default());

        assert!(requirements.contains(&name("mylib")));
        assert!(analysis.is_empty());
    }

    #[test]
    fn unreconciled_editable_is_extraneous() {
        let graph = DistributionGraph::from_packages([
            InstalledPackage::new(PackageNode::editable(name("mylib"), "-e /src/mylib"), vec![]),
            InstalledPackage::new(PackageNode::new(name("other")), vec![]),
        ]);
        let mut requirements = requirements(&["-e ./mylib", "other"]);
        requirements.reconcile(&graph.editable_frozen_forms());

        let analysis = analyze(&graph, &requirements, &Exclusions::default());

        assert_eq!(analysis.extraneous, names(&["mylib"]));
    }

    #[test]
    fn dependencies_are_not_judged_against_manifests() {
        // `z` is not in any manifest but it is kept because `x` still needs it.
        let graph = graph(&[("x", &["z"]), ("z", &[])]);

        let analysis = analyze(&graph, &requirements(&["x"]), &Exclusions::default());

        assert!(analysis.is_empty());
    }

    #[test]
    fn several_extraneous_roots_share_their_dependencies() {
        let graph = graph(&[
            ("keep", &["shared"]),
            ("a", &["c", "shared"]),
            ("b", &["c"]),
            ("c", &["leaf"]),
            ("shared", &[]),
            ("leaf", &[]),
        ]);

        let analysis = analyze(&graph, &requirements(&["keep"]), &Exclusions::default());

        assert_eq!(analysis.extraneous, names(&["a", "b"]));
        assert_eq!(analysis.uninstall, names(&["c", "leaf"]));
        assert_eq!(analysis.uninstall_command(), "pip uninstall -y a b c leaf");
    }
}
