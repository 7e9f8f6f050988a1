use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

use crate::model::PackageName;

pub const CONFIG_FILE_NAME: &str = "extraneous.toml";

pub struct ExtraneousConfig {
    pub requirement_files: Option<Vec<PathBuf>>,
    pub exclude: Vec<PackageName>,
    pub site_packages: Option<Vec<PathBuf>>,
    pub full: bool,
}

impl ExtraneousConfig {
    /// Loads `extraneous.toml` from `root`, if present, overridden by `EXTRANEOUS_*` variables.
    pub fn load(root: &Path) -> anyhow::Result<Self> {
        let raw_config = RawConfig::load(Some(&root.join(CONFIG_FILE_NAME)), None)?;

        Ok(Self {
            requirement_files: raw_config.requirements.files,
            exclude: raw_config.exclude.names,
            site_packages: raw_config.site.dir,
            full: raw_config.full,
        })
    }
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct RawConfig {
    #[serde(default)]
    requirements: RequirementsConfig,
    #[serde(default)]
    exclude: ExcludeConfig,
    #[serde(default)]
    site: SiteConfig,
    #[serde(default)]
    full: bool,
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct RequirementsConfig {
    files: Option<Vec<PathBuf>>,
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct ExcludeConfig {
    #[serde(default)]
    names: Vec<PackageName>,
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct SiteConfig {
    dir: Option<Vec<PathBuf>>,
}

impl RawConfig {
    fn load(
        file: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(file) = file {
            builder = builder.add_source(File::from(file).format(FileFormat::Toml).required(false));
        }
        builder
            .add_source(
                Environment::with_prefix("EXTRANEOUS")
                    .separator("_")
                    .list_separator(",")
                    .with_list_parse_key("requirements.files")
                    .with_list_parse_key("exclude.names")
                    .with_list_parse_key("site.dir")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?
            .try_deserialize()
    }
}
