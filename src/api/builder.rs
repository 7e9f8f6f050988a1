use std::{env, error::Error, path::PathBuf};

use crate::{
    extraneous::Exclusions,
    model::PackageName,
    requirements::DEFAULT_REQUIREMENT_FILES,
    site_packages::{InstalledSource, SitePackages},
    Extraneous,
};

#[derive(Default)]
pub struct ExtraneousBuilder {
    // Relative requirements files and site-packages directories are resolved against `root`
    root: Option<PathBuf>,
    requirement_files: Option<Vec<PathBuf>>,
    site_packages: Option<Vec<PathBuf>>,
    source: Option<Box<dyn InstalledSource>>,
    exclude: Vec<PackageName>,
    full: bool,
    verbose: bool,
    color: bool,
}

impl ExtraneousBuilder {
    /// Project root directory.
    ///
    /// Defaults to the current directory.
    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.root = Some(path.into());
        self
    }

    /// Requirements files to read, in order.
    ///
    /// Defaults to `requirements.txt`, `local_requirements.txt` and `test_requirements.txt`.
    pub fn requirement_files(
        mut self,
        paths: impl IntoIterator<Item = impl Into<PathBuf>>,
    ) -> Self {
        self.requirement_files = Some(paths.into_iter().map(Into::into).collect());
        self
    }

    /// `site-packages` directories to scan.
    ///
    /// Defaults to the ones of the active virtualenv or conda environment.
    pub fn site_packages(mut self, paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        self.site_packages = Some(paths.into_iter().map(Into::into).collect());
        self
    }

    /// Where installed packages come from. Takes precedence over `site_packages`.
    pub fn installed_source(mut self, source: impl InstalledSource + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Packages that are never reported, nor uninstalled along with others.
    pub fn exclude(mut self, names: impl IntoIterator<Item = PackageName>) -> Self {
        self.exclude.extend(names);
        self
    }

    /// Do not exclude `extraneous`, `pipdeptree`, `pip` and `setuptools` by default.
    pub fn full(mut self, full: bool) -> Self {
        self.full = full;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Highlight the extraneous packages with ANSI colors.
    ///
    /// Off by default. Writers such as `anstream::stdout()` strip the codes again when the output
    /// is not a terminal.
    pub fn color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn try_build(self) -> Result<Extraneous, Box<dyn Error>> {
        let Self {
            root,
            requirement_files,
            site_packages,
            source,
            exclude,
            full,
            verbose,
            color,
        } = self;
        let root = match root {
            Some(root) => root,
            None => env::current_dir()?,
        };

        let requirement_files = requirement_files.unwrap_or_else(|| {
            DEFAULT_REQUIREMENT_FILES
                .into_iter()
                .map(PathBuf::from)
                .collect()
        });

        let source: Box<dyn InstalledSource> = match (source, site_packages) {
            (Some(source), _) => source,
            (None, Some(directories)) => Box::new(SitePackages::new(
                directories.iter().map(|dir| root.join(dir)).collect(),
            )),
            (None, None) => Box::new(SitePackages::discover()?),
        };

        Ok(Extraneous {
            root,
            requirement_files,
            exclusions: Exclusions::new(exclude, full),
            source,
            verbose,
            color,
        })
    }
}
