use std::path::PathBuf;

use clap::Parser;

use crate::model::PackageName;

/// Finds installed Python packages that no requirements file asks for,
/// and prints the command to uninstall them together with what only they need.
#[derive(Debug, Parser)]
#[clap(version)]
pub struct CliArgs {
    /// Print the scanned site-packages directories and requirements files
    #[clap(short, long)]
    pub verbose: bool,
    /// Requirements file to read, relative to the project root. Replaces the defaults.
    /// Can be given multiple times.
    #[clap(short, long = "include", value_name = "PATH")]
    pub include: Vec<PathBuf>,
    /// Package never reported as extraneous. Can be given multiple times.
    #[clap(short, long = "exclude", value_name = "NAME")]
    pub exclude: Vec<PackageName>,
    /// Do not exclude extraneous, pipdeptree, pip and setuptools by default
    #[clap(short, long)]
    pub full: bool,
    /// site-packages directory to scan instead of the active environment's.
    /// Can be given multiple times.
    #[clap(long, value_name = "DIR")]
    pub site_packages: Vec<PathBuf>,
    /// Project root, where requirements files and extraneous.toml are looked up
    #[clap(long, value_name = "DIR")]
    pub root: Option<PathBuf>,
}
