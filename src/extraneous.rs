use std::collections::BTreeSet;

use log::debug;

use crate::{model::PackageName, requirements::RequirementSet};

/// Packages the tool itself needs in order to run. Never reported unless running in full mode.
pub const DEFAULT_EXCLUSIONS: [&str; 4] = ["extraneous", "pipdeptree", "pip", "setuptools"];

/// Names that are never considered extraneous, even when no manifest mentions them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exclusions(BTreeSet<PackageName>);

impl Exclusions {
    /// `full` drops [`DEFAULT_EXCLUSIONS`] and keeps only `names`.
    pub fn new(names: impl IntoIterator<Item = PackageName>, full: bool) -> Self {
        let mut exclusions: BTreeSet<PackageName> = names.into_iter().collect();
        if !full {
            exclusions.extend(
                DEFAULT_EXCLUSIONS
                    .iter()
                    .filter_map(|name| PackageName::new(name).ok()),
            );
        }
        Exclusions(exclusions)
    }

    pub fn contains(&self, name: &PackageName) -> bool {
        self.0.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PackageName> {
        self.0.iter()
    }
}

/// Roots that no manifest requires and that are not excluded.
pub fn extraneous_packages(
    roots: &BTreeSet<PackageName>,
    requirements: &RequirementSet,
    exclusions: &Exclusions,
) -> BTreeSet<PackageName> {
    let extraneous: BTreeSet<PackageName> = roots
        .iter()
        .filter(|root| !requirements.contains(root) && !exclusions.contains(root))
        .cloned()
        .collect();
    debug!(
        "{} of {} root packages are extraneous",
        extraneous.len(),
        roots.len()
    );
    extraneous
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{
        graph::tests::{name, names},
        model::Requirement,
    };

    use pretty_assertions::assert_eq;

    fn requirements(entries: &[&str]) -> RequirementSet {
        RequirementSet::from_requirements(
            entries
                .iter()
                .map(|entry| Requirement::Name(name(entry))),
        )
    }

    #[test]
    fn defaults_are_excluded() {
        let exclusions = Exclusions::new([], false);

        for default in DEFAULT_EXCLUSIONS {
            assert!(exclusions.contains(&name(default)));
        }
    }

    #[test]
    fn full_mode_drops_defaults() {
        let exclusions = Exclusions::new([name("black")], true);

        assert!(!exclusions.contains(&name("pip")));
        assert_eq!(exclusions.iter().cloned().collect::<BTreeSet<_>>(), names(&["black"]));
    }

    #[test]
    fn roots_minus_requirements_minus_exclusions() {
        let roots = names(&["x", "y", "pip", "black"]);

        let extraneous = extraneous_packages(
            &roots,
            &requirements(&["x"]),
            &Exclusions::new([name("black")], false),
        );

        assert_eq!(extraneous, names(&["y"]));
    }

    #[test]
    fn full_mode_reports_tooling() {
        let roots = names(&["x", "pip", "setuptools"]);

        let extraneous =
            extraneous_packages(&roots, &requirements(&["x"]), &Exclusions::new([], true));

        assert_eq!(extraneous, names(&["pip", "setuptools"]));
    }

    #[test]
    fn requirement_spelling_does_not_matter() {
        let roots = names(&["zope-interface"]);

        let extraneous = extraneous_packages(
            &roots,
            &requirements(&["Zope.Interface"]),
            &Exclusions::default(),
        );

        assert!(extraneous.is_empty());
    }

    #[test]
    fn no_roots() {
        let extraneous = extraneous_packages(
            &BTreeSet::new(),
            &requirements(&["x"]),
            &Exclusions::default(),
        );

        assert!(extraneous.is_empty());
    }
}
