use std::collections::BTreeSet;

use log::{debug, trace};

use crate::{graph::DistributionGraph, model::PackageName};

/// Computes every package that can be uninstalled together with `seeds`.
///
/// Seeds are always part of the result. Any other package joins once all of its dependents have
/// joined, and every package that joins makes its own dependencies candidates in turn. Rejected
/// candidates are looked at again whenever another of their dependents joins, so the result is
/// the least fixpoint of that rule and does not depend on traversal order.
///
/// The walk uses an explicit stack. A package is expanded at most once, which bounds the work by
/// the number of edges and makes dependency cycles harmless.
pub fn uninstall_closure(
    graph: &DistributionGraph,
    seeds: &BTreeSet<PackageName>,
) -> BTreeSet<PackageName> {
    let mut closure: BTreeSet<PackageName> = seeds.clone();
    let mut expanded: BTreeSet<PackageName> = BTreeSet::new();
    let mut stack: Vec<&PackageName> = seeds.iter().rev().collect();

    while let Some(package) = stack.pop() {
        if expanded.contains(package) {
            continue;
        }

        if !seeds.contains(package) {
            let survivors: Vec<&PackageName> = graph
                .dependents(package)
                .filter(|dependent| !closure.contains(*dependent))
                .collect();
            if !survivors.is_empty() {
                trace!("Keeping {package}, still required by {survivors:?}");
                continue;
            }
            trace!("{package} is only required by packages being removed");
            closure.insert(package.clone());
        }

        expanded.insert(package.clone());
        stack.extend(
            graph
                .dependencies(package)
                .filter(|dependency| !expanded.contains(*dependency)),
        );
    }

    debug!(
        "Uninstall closure of {} packages has {} members",
        seeds.len(),
        closure.len()
    );

    closure
}
