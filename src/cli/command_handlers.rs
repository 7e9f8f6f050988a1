use log::{debug, info};
use owo_colors::OwoColorize;

use crate::{
    analysis::{analyze, Analysis},
    extraneous::Exclusions,
    graph::DistributionGraph,
    requirements::{read_manifests, Manifest, RequirementSet},
    site_packages::InstalledSource,
};
use std::{
    error::Error,
    io::{self, Write},
    path::{Path, PathBuf},
};

/// Handler to the check command
/// Reads the installed packages and the requirements files,
/// then writes the extraneous packages and the matching uninstall command to `out`.
/// With `color`, the extraneous packages are highlighted in yellow
pub fn do_check(
    root: &Path,
    requirement_files: &[PathBuf],
    exclusions: &Exclusions,
    source: &dyn InstalledSource,
    verbose: bool,
    color: bool,
    out: &mut impl Write,
) -> Result<Analysis, Box<dyn Error>> {
    let manifests = read_manifests(root, requirement_files)?;
    if verbose {
        write_sources(out, root, &source.locations(), &manifests)?;
    }

    let mut requirements = RequirementSet::resolve(&manifests, verbose)?;

    let graph = DistributionGraph::from_packages(source.installed_packages()?);
    requirements.reconcile(&graph.editable_frozen_forms());
    if !requirements.editables().is_empty() {
        info!(
            "Editable requirements not installed as editable: {}",
            requirements
                .editables()
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    let analysis = analyze(&graph, &requirements, exclusions);
    debug!(
        "{} extraneous and {} additional packages out of {} installed",
        analysis.extraneous.len(),
        analysis.uninstall.len(),
        graph.len()
    );
    write_analysis(out, &analysis, color)?;

    Ok(analysis)
}

fn write_sources(
    out: &mut impl Write,
    root: &Path,
    locations: &[PathBuf],
    manifests: &[Manifest],
) -> io::Result<()> {
    writeln!(out, "reading installed from:")?;
    for location in locations {
        writeln!(out, "\t{}", relative_to(root, location).display())?;
    }
    writeln!(out, "reading requirements from:")?;
    for manifest in manifests {
        let path = relative_to(root, &manifest.path).display();
        if manifest.is_found() {
            writeln!(out, "\t{path}")?;
        } else {
            writeln!(out, "\t{path} (Not Found)")?;
        }
    }
    Ok(())
}

fn write_analysis(out: &mut impl Write, analysis: &Analysis, color: bool) -> io::Result<()> {
    if analysis.is_empty() {
        return Ok(());
    }
    let extraneous = analysis
        .extraneous
        .iter()
        .map(|name| name.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    if color {
        writeln!(out, "{}", "extraneous packages:".yellow())?;
        writeln!(out, "\t{}", extraneous.yellow())?;
    } else {
        writeln!(out, "extraneous packages:")?;
        writeln!(out, "\t{extraneous}")?;
    }
    writeln!(out, "uninstall via:")?;
    writeln!(out, "\t{}", analysis.uninstall_command())
}

fn relative_to<'a>(root: &Path, path: &'a Path) -> &'a Path {
    path.strip_prefix(root).unwrap_or(path)
}
