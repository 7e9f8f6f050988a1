use std::{
    fmt::{Debug, Display},
    str::FromStr,
    sync::OnceLock,
};

use regex_lite::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use super::ParseError;

/// The normalized name of a Python distribution.
///
/// Lowercased, with every run of `-`, `_` and `.` collapsed to a single `-`, so
/// `Foo_Bar`, `foo.bar` and `FOO--bar` are all `foo-bar`.
///
/// See: <https://packaging.python.org/en/latest/specifications/name-normalization/>
#[derive(Clone, Hash, Serialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct PackageName(String);

fn separators() -> &'static Regex {
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();
    SEPARATORS.get_or_init(|| Regex::new(r"[-_.]+").unwrap())
}

fn valid_name() -> &'static Regex {
    static VALID_NAME: OnceLock<Regex> = OnceLock::new();
    VALID_NAME.get_or_init(|| Regex::new(r"(?i)^([A-Z0-9]|[A-Z0-9][A-Z0-9._-]*[A-Z0-9])$").unwrap())
}

impl PackageName {
    pub fn new(name: impl AsRef<str>) -> Result<Self, ParseError> {
        let name = name.as_ref();
        if !valid_name().is_match(name) {
            return Err(ParseError::InvalidName(name.to_string()));
        }
        let mut normalized = separators().replace_all(name, "-").into_owned();
        normalized.make_ascii_lowercase();
        Ok(PackageName(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for PackageName {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PackageName::new(s)
    }
}

impl<'de> Deserialize<'de> for PackageName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        PackageName::new(s).map_err(serde::de::Error::custom)
    }
}

impl Display for PackageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Debug for PackageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl AsRef<str> for PackageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn normalize_separators_and_case() {
        for input in [
            "friendly-bard",
            "Friendly-Bard",
            "FRIENDLY-BARD",
            "friendly.bard",
            "friendly_bard",
            "friendly--bard",
            "FrIeNdLy-._.-bArD",
        ] {
            assert_eq!(PackageName::new(input).unwrap().as_str(), "friendly-bard");
        }
    }

    #[test]
    fn spellings_compare_equal() {
        assert_eq!(
            PackageName::new("Foo_Bar").unwrap(),
            PackageName::new("foo.bar").unwrap()
        );
        assert_eq!(
            PackageName::new("FOO--bar").unwrap(),
            "foo-bar".parse::<PackageName>().unwrap()
        );
    }

    #[test]
    fn unchanged() {
        for input in ["friendly-bard", "1okay", "okay2", "a"] {
            assert_eq!(PackageName::new(input).unwrap().as_str(), input);
        }
    }

    #[test]
    fn invalid_names() {
        for input in [
            "",
            " starts-with-space",
            "-starts-with-dash",
            "ends-with-dash-",
            "includes!invalid-char",
            "space in middle",
            "-e ./mylib",
        ] {
            assert!(
                matches!(PackageName::new(input), Err(ParseError::InvalidName(_))),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn deserialize_normalizes() {
        let name: PackageName = serde_json::from_str("\"Zope.Interface\"").unwrap();
        assert_eq!(name.as_str(), "zope-interface");
    }
}
