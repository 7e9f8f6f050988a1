use thiserror::Error;

pub mod installed;
pub mod name;
pub mod requirement;

pub use installed::{InstalledPackage, PackageNode};
pub use name::PackageName;
pub use requirement::Requirement;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error(
        "Not a valid package name: \"{0}\". Names must start and end with a letter or digit \
        and may only contain -, _, ., and alphanumeric characters"
    )]
    InvalidName(String),
    #[error("Error while parsing METADATA headers: {0}")]
    Metadata(#[from] mailparse::MailParseError),
    #[error("Error while parsing direct_url.json: {0}")]
    DirectUrl(#[from] serde_json::Error),
    #[error("Missing field `{0}` in METADATA")]
    MissingField(&'static str),
}
