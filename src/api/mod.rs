use std::{error::Error, io::Write, path::PathBuf};

use crate::{
    analysis::Analysis, cli::command_handlers::do_check, extraneous::Exclusions,
    site_packages::InstalledSource,
};

mod builder;

pub use builder::ExtraneousBuilder;

pub struct Extraneous {
    root: PathBuf,
    requirement_files: Vec<PathBuf>,
    exclusions: Exclusions,
    source: Box<dyn InstalledSource>,
    verbose: bool,
    color: bool,
}

impl Extraneous {
    pub fn builder() -> ExtraneousBuilder {
        ExtraneousBuilder::default()
    }

    /// Finds the extraneous packages and writes the report to `out`.
    ///
    /// In verbose mode the scanned directories and requirements files are written first,
    /// so they are visible even when no requirements are found.
    pub fn check(&self, out: &mut impl Write) -> Result<Analysis, Box<dyn Error>> {
        do_check(
            &self.root,
            &self.requirement_files,
            &self.exclusions,
            self.source.as_ref(),
            self.verbose,
            self.color,
            out,
        )
    }

    /// Same as [`Extraneous::check`] without any output.
    pub fn analyze(&self) -> Result<Analysis, Box<dyn Error>> {
        do_check(
            &self.root,
            &self.requirement_files,
            &self.exclusions,
            self.source.as_ref(),
            false,
            false,
            &mut std::io::sink(),
        )
    }
}
