use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    sync::OnceLock,
};

use log::{debug, trace, warn};
use mailparse::MailHeaderMap;
use regex_lite::Regex;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::model::{InstalledPackage, PackageName, PackageNode, ParseError};

#[derive(Error, Debug)]
pub enum SitePackagesError {
    #[error("Site packages directory {} does not exist", .0.display())]
    NotFound(PathBuf),
    #[error(
        "No Python environment found. Activate a virtualenv or point --site-packages at one."
    )]
    NoEnvironment,
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
    #[error("Error while reading {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
}

/// Anything that can list the distributions installed in an environment.
pub trait InstalledSource {
    fn installed_packages(&self) -> Result<Vec<InstalledPackage>, SitePackagesError>;

    /// Directories the packages are read from, for reporting.
    fn locations(&self) -> Vec<PathBuf>;
}

/// Installed distributions found in one or more `site-packages` directories.
///
/// Recognizes `*.dist-info` directories, legacy `*.egg-info` directories and files, and
/// `*.egg-link` editables.
///
/// See: <https://packaging.python.org/en/latest/specifications/recording-installed-packages/>
#[derive(Debug, Clone)]
pub struct SitePackages {
    directories: Vec<PathBuf>,
}

impl SitePackages {
    pub fn new(directories: Vec<PathBuf>) -> Self {
        SitePackages { directories }
    }

    /// Locates `site-packages` of the active virtualenv or conda environment.
    pub fn discover() -> Result<Self, SitePackagesError> {
        Self::discover_with(|var| std::env::var_os(var))
    }

    fn discover_with(
        lookup: impl Fn(&str) -> Option<OsString>,
    ) -> Result<Self, SitePackagesError> {
        for var in ["VIRTUAL_ENV", "CONDA_PREFIX"] {
            let Some(prefix) = lookup(var) else {
                continue;
            };
            let directories = site_packages_in(Path::new(&prefix))?;
            if directories.is_empty() {
                warn!(
                    "${var} points at {}, which has no site-packages",
                    Path::new(&prefix).display()
                );
                continue;
            }
            debug!("Using site-packages from ${var}: {:?}", directories);
            return Ok(SitePackages::new(directories));
        }
        Err(SitePackagesError::NoEnvironment)
    }

    fn read_directory(directory: &Path) -> Result<Vec<InstalledPackage>, SitePackagesError> {
        if !directory.is_dir() {
            return Err(SitePackagesError::NotFound(directory.to_path_buf()));
        }
        debug!("Reading installed distributions from {}", directory.display());

        let mut entries = std::fs::read_dir(directory)?
            .map(|entry| entry.map(|entry| entry.path()))
            .collect::<Result<Vec<_>, _>>()?;
        entries.sort();

        let mut packages = Vec::new();
        for path in entries {
            let package = match path.extension().and_then(|ext| ext.to_str()) {
                Some("dist-info") if path.is_dir() => read_dist_info(&path)?,
                Some("egg-info") => read_egg_info(&path)?,
                Some("egg-link") if path.is_file() => read_egg_link(&path)?,
                _ => None,
            };
            packages.extend(package);
        }
        Ok(packages)
    }
}

impl InstalledSource for SitePackages {
    fn installed_packages(&self) -> Result<Vec<InstalledPackage>, SitePackagesError> {
        let mut packages = Vec::new();
        for directory in &self.directories {
            packages.extend(Self::read_directory(directory)?);
        }
        Ok(packages)
    }

    fn locations(&self) -> Vec<PathBuf> {
        self.directories.clone()
    }
}

/// `lib/python3.X/site-packages` on Unix, `Lib/site-packages` on Windows.
fn site_packages_in(prefix: &Path) -> Result<Vec<PathBuf>, std::io::Error> {
    let windows = prefix.join("Lib").join("site-packages");
    if windows.is_dir() {
        return Ok(vec![windows]);
    }

    let lib = prefix.join("lib");
    if !lib.is_dir() {
        return Ok(vec![]);
    }
    let mut directories = Vec::new();
    for entry in std::fs::read_dir(lib)? {
        let entry = entry?;
        if entry.file_name().to_string_lossy().starts_with("python") {
            let site_packages = entry.path().join("site-packages");
            if site_packages.is_dir() {
                directories.push(site_packages);
            }
        }
    }
    directories.sort();
    Ok(directories)
}

/// The subset of `direct_url.json` that tells editable installs apart.
///
/// See: <https://packaging.python.org/en/latest/specifications/direct-url-data-structure/>
#[derive(Debug, Deserialize)]
struct DirectUrl {
    url: String,
    #[serde(default)]
    dir_info: Option<DirInfo>,
}

#[derive(Debug, Deserialize)]
struct DirInfo {
    #[serde(default)]
    editable: bool,
}

impl DirectUrl {
    /// How `pip freeze` spells this install, if it is editable.
    fn frozen_form(&self, name: &PackageName) -> Option<String> {
        if !self.dir_info.as_ref().is_some_and(|info| info.editable) {
            return None;
        }
        let frozen_form = match Url::parse(&self.url)
            .ok()
            .filter(|url| url.scheme() == "file")
            .and_then(|url| url.to_file_path().ok())
        {
            Some(checkout) => editable_frozen_form(&checkout, name),
            None => format!("-e {}", self.url),
        };
        Some(frozen_form)
    }
}

/// `-e git+<remote>@<commit>#egg=<name>` for git checkouts, `-e <path>` otherwise.
fn editable_frozen_form(checkout: &Path, name: &PackageName) -> String {
    git_frozen_form(checkout, name).unwrap_or_else(|| format!("-e {}", checkout.display()))
}

fn git_frozen_form(checkout: &Path, name: &PackageName) -> Option<String> {
    let git_dir = checkout.join(".git");
    if !git_dir.is_dir() {
        return None;
    }
    let config = std::fs::read_to_string(git_dir.join("config")).ok()?;
    let Some(remote) = git_remote_url(&config) else {
        debug!("{} has no git remote", checkout.display());
        return None;
    };
    let commit = git_head_commit(&git_dir)?;
    Some(format!(
        "-e git+{remote}@{commit}#egg={}",
        name.as_str().replace('-', "_")
    ))
}

/// The `origin` url of a `.git/config`, or else the first remote's.
fn git_remote_url(config: &str) -> Option<String> {
    let mut remote = None;
    let mut first = None;
    for line in config.lines().map(str::trim) {
        if let Some(section) = line.strip_prefix('[') {
            remote = section
                .trim_end_matches(']')
                .strip_prefix("remote ")
                .map(|name| name.trim().trim_matches('"').to_string());
            continue;
        }
        let (Some(remote), Some((key, value))) = (&remote, line.split_once('=')) else {
            continue;
        };
        if key.trim() != "url" {
            continue;
        }
        let url = pip_remote_url(value.trim());
        if remote == "origin" {
            return Some(url);
        }
        first.get_or_insert(url);
    }
    first
}

fn scp_like_url() -> &'static Regex {
    static SCP_LIKE_URL: OnceLock<Regex> = OnceLock::new();
    SCP_LIKE_URL.get_or_init(|| Regex::new(r"^(\w+@)?([^/:]+):(\w[^:]*)$").unwrap())
}

/// Rewrites scp-like remotes (`git@host:org/repo.git`) to `ssh://` urls, as pip does.
fn pip_remote_url(remote: &str) -> String {
    if remote.contains("://") {
        return remote.to_string();
    }
    match scp_like_url().captures(remote) {
        Some(captures) => format!(
            "ssh://{}{}/{}",
            captures.get(1).map_or("", |user| user.as_str()),
            &captures[2],
            &captures[3]
        ),
        None => remote.to_string(),
    }
}

/// Commit `HEAD` points at, following a branch through loose or packed refs.
fn git_head_commit(git_dir: &Path) -> Option<String> {
    let head = std::fs::read_to_string(git_dir.join("HEAD")).ok()?;
    let head = head.trim();
    let Some(reference) = head.strip_prefix("ref:").map(str::trim) else {
        return Some(head.to_string());
    };
    if let Ok(commit) = std::fs::read_to_string(git_dir.join(reference)) {
        return Some(commit.trim().to_string());
    }
    let packed_refs = std::fs::read_to_string(git_dir.join("packed-refs")).ok()?;
    packed_refs.lines().find_map(|line| {
        let (commit, name) = line.split_once(' ')?;
        (name.trim() == reference).then(|| commit.to_string())
    })
}

fn requires_dist_name() -> &'static Regex {
    static REQUIRES_DIST_NAME: OnceLock<Regex> = OnceLock::new();
    REQUIRES_DIST_NAME.get_or_init(|| Regex::new(r"^\s*([A-Za-z0-9][A-Za-z0-9._-]*)").unwrap())
}

fn extra_marker() -> &'static Regex {
    static EXTRA_MARKER: OnceLock<Regex> = OnceLock::new();
    EXTRA_MARKER.get_or_init(|| Regex::new(r"\bextra\b").unwrap())
}

/// Name of a `Requires-Dist` value, or `None` when it only applies to an extra.
fn parse_requires_dist(value: &str) -> Result<Option<PackageName>, ParseError> {
    let (requirement, marker) = value.split_once(';').unwrap_or((value, ""));
    if extra_marker().is_match(marker) {
        return Ok(None);
    }
    let name = requires_dist_name()
        .captures(requirement)
        .and_then(|captures| captures.get(1))
        .map(|name| name.as_str())
        .unwrap_or(requirement);
    PackageName::new(name).map(Some)
}

/// `Name` and non-optional `Requires-Dist` names of a `METADATA` or `PKG-INFO` file.
fn parse_metadata(contents: &[u8]) -> Result<(PackageName, Vec<PackageName>), ParseError> {
    let (headers, _) = mailparse::parse_headers(contents)?;
    let name = headers
        .get_first_value("Name")
        .ok_or(ParseError::MissingField("Name"))
        .and_then(PackageName::new)?;
    let mut requires = Vec::new();
    for value in headers.get_all_values("Requires-Dist") {
        match parse_requires_dist(&value) {
            Ok(Some(dependency)) => requires.push(dependency),
            Ok(None) => trace!("{name}: skipping optional requirement {value}"),
            Err(err) => warn!("{name}: ignoring requirement {value:?}: {err}"),
        }
    }
    Ok((name, requires))
}

/// Non-optional requirements of an egg's `requires.txt`.
///
/// Requirements under an `[extra]` or `[extra:marker]` section are skipped. Those under a
/// `[:marker]` section are kept, as markers are not evaluated.
///
/// See: <https://setuptools.pypa.io/en/latest/deprecated/python_eggs.html#dependency-metadata>
fn parse_requires_txt(contents: &str, name: &PackageName) -> Vec<PackageName> {
    let mut requires = Vec::new();
    let mut in_extra = false;
    for line in contents.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(section) = line.strip_prefix('[') {
            let section = section.trim_end_matches(']');
            let extra = section.split_once(':').map_or(section, |(extra, _)| extra);
            in_extra = !extra.trim().is_empty();
            continue;
        }
        if in_extra {
            trace!("{name}: skipping optional requirement {line}");
            continue;
        }
        match parse_requires_dist(line) {
            Ok(Some(dependency)) => requires.push(dependency),
            Ok(None) => trace!("{name}: skipping optional requirement {line}"),
            Err(err) => warn!("{name}: ignoring requirement {line:?}: {err}"),
        }
    }
    requires
}

/// Name part of a distribution file name, e.g. `cffi` for `cffi-1.16.0.dist-info` or
/// `vtk` for `vtk.egg-info`.
fn stem_name(path: &Path) -> Option<&str> {
    let stem = path.file_stem()?.to_str()?;
    Some(stem.split_once('-').map_or(stem, |(name, _)| name))
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, std::io::Error> {
    match std::fs::read(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

fn read_dist_info(path: &Path) -> Result<Option<InstalledPackage>, SitePackagesError> {
    let parse_error = |source| SitePackagesError::Parse {
        path: path.to_path_buf(),
        source,
    };

    let Some(stem_name) = stem_name(path) else {
        warn!("Ignoring unrecognized distribution {}", path.display());
        return Ok(None);
    };

    let (name, requires) = match read_optional(&path.join("METADATA"))? {
        Some(contents) => parse_metadata(&contents).map_err(parse_error)?,
        None => {
            warn!("{} has no METADATA, assuming no dependencies", path.display());
            (PackageName::new(stem_name).map_err(parse_error)?, vec![])
        }
    };

    let frozen_form = match read_optional(&path.join("direct_url.json"))? {
        Some(contents) => {
            let direct_url: DirectUrl = serde_json::from_slice(&contents)
                .map_err(|err| parse_error(ParseError::from(err)))?;
            direct_url.frozen_form(&name)
        }
        None => None,
    };
    let node = match frozen_form {
        Some(frozen_form) => PackageNode::editable(name, frozen_form),
        None => PackageNode::new(name),
    };

    trace!(
        "Found {} with {} requirements",
        node.name,
        requires.len()
    );
    Ok(Some(InstalledPackage::new(node, requires)))
}

/// Ex) `zstandard-0.22.0-py3.12.egg-info` as a directory, or `vtk-9.2.6.egg-info` as a single
/// `PKG-INFO` file.
fn read_egg_info(path: &Path) -> Result<Option<InstalledPackage>, SitePackagesError> {
    let parse_error = |source| SitePackagesError::Parse {
        path: path.to_path_buf(),
        source,
    };

    let Some(stem_name) = stem_name(path) else {
        warn!("Ignoring unrecognized distribution {}", path.display());
        return Ok(None);
    };

    let (metadata, requires_txt) = if path.is_dir() {
        (
            read_optional(&path.join("PKG-INFO"))?,
            read_optional(&path.join("requires.txt"))?,
        )
    } else {
        (Some(std::fs::read(path)?), None)
    };

    let (name, mut requires) = match metadata {
        Some(contents) => parse_metadata(&contents).map_err(parse_error)?,
        None => {
            warn!("{} has no PKG-INFO", path.display());
            (PackageName::new(stem_name).map_err(parse_error)?, vec![])
        }
    };
    if let Some(requires_txt) = requires_txt {
        requires.extend(parse_requires_txt(
            &String::from_utf8_lossy(&requires_txt),
            &name,
        ));
    }

    trace!("Found egg {name} with {} requirements", requires.len());
    Ok(Some(InstalledPackage::new(PackageNode::new(name), requires)))
}

/// Ex) `zstandard.egg-link`, holding the path of a checkout that contains `zstandard.egg-info`.
///
/// See: <https://setuptools.pypa.io/en/latest/deprecated/python_eggs.html#egg-links>
fn read_egg_link(path: &Path) -> Result<Option<InstalledPackage>, SitePackagesError> {
    let (Some(stem), Some(parent)) = (path.file_stem().and_then(|s| s.to_str()), path.parent())
    else {
        return Ok(None);
    };

    let contents = std::fs::read_to_string(path)?;
    let Some(target) = contents.lines().map(str::trim).find(|line| !line.is_empty()) else {
        warn!("Ignoring empty egg-link {}", path.display());
        return Ok(None);
    };
    let checkout = parent.join(target);

    let egg_info = checkout.join(format!("{}.egg-info", stem.replace('-', "_")));
    if !egg_info.exists() {
        warn!(
            "{} points at {}, which has no {}",
            path.display(),
            checkout.display(),
            egg_info.display()
        );
        return Ok(None);
    }
    let Some(package) = read_egg_info(&egg_info)? else {
        return Ok(None);
    };

    let frozen_form = editable_frozen_form(&checkout, package.name());
    Ok(Some(InstalledPackage::new(
        PackageNode::editable(package.node.name, frozen_form),
        package.requires,
    )))
}
