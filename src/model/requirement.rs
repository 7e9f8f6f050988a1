use std::{fmt::Display, sync::OnceLock};

use log::trace;
use regex_lite::Regex;

use super::{PackageName, ParseError};

/// A single entry of a requirements file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Requirement {
    /// A named requirement, stripped of version specifiers, extras and markers.
    Name(PackageName),
    /// An editable line kept verbatim, e.g. `-e ./mylib` or `-e git+https://host/repo#egg=mylib`.
    Editable(String),
}

fn comment() -> &'static Regex {
    static COMMENT: OnceLock<Regex> = OnceLock::new();
    COMMENT.get_or_init(|| Regex::new(r"(^|\s)#.*$").unwrap())
}

/// Everything that may follow a bare name: comparison operators, extras, markers and URLs.
fn name_terminator() -> &'static Regex {
    static NAME_TERMINATOR: OnceLock<Regex> = OnceLock::new();
    NAME_TERMINATOR.get_or_init(|| Regex::new(r"[=<>~!;\[@\s]").unwrap())
}

impl Requirement {
    /// Parses one line of a requirements file.
    ///
    /// Returns `Ok(None)` for lines that carry no requirement: blanks, comments and pip options
    /// other than `-e`/`--editable`.
    pub fn parse_line(line: &str) -> Result<Option<Requirement>, ParseError> {
        let line = comment().replace(line, "");
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        if line.starts_with("-e") || line.starts_with("--editable") {
            return Ok(Some(Requirement::Editable(line.to_string())));
        }

        if line.starts_with('-') {
            trace!("Skipping option line {line}");
            return Ok(None);
        }

        let name = name_terminator().split(line).next().unwrap_or(line);
        PackageName::new(name).map(|name| Some(Requirement::Name(name)))
    }
}

/// Target of a `-r`/`--requirement` line, the path of another requirements file to read.
pub fn include_target(line: &str) -> Option<String> {
    let line = comment().replace(line, "");
    let line = line.trim();
    let target = line
        .strip_prefix("--requirement")
        .or_else(|| line.strip_prefix("-r"))?;
    let target = target.strip_prefix('=').unwrap_or(target).trim();
    (!target.is_empty()).then(|| target.to_string())
}

impl Display for Requirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Requirement::Name(name) => write!(f, "{name}"),
            Requirement::Editable(frozen) => f.write_str(frozen),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    fn name(s: &str) -> Option<Requirement> {
        Some(Requirement::Name(PackageName::new(s).unwrap()))
    }

    #[test]
    fn strips_version_specifiers() {
        assert_eq!(Requirement::parse_line("django==4.2").unwrap(), name("django"));
        assert_eq!(Requirement::parse_line("requests>=2.0").unwrap(), name("requests"));
        assert_eq!(Requirement::parse_line("attrs<23").unwrap(), name("attrs"));
        assert_eq!(Requirement::parse_line("numpy~=1.26").unwrap(), name("numpy"));
        assert_eq!(Requirement::parse_line("six!=1.0").unwrap(), name("six"));
        assert_eq!(Requirement::parse_line("flask").unwrap(), name("flask"));
    }

    #[test]
    fn stops_at_first_operator() {
        assert_eq!(
            Requirement::parse_line("pytz>=2020,<=2024").unwrap(),
            name("pytz")
        );
        assert_eq!(Requirement::parse_line("pkg == 1.0").unwrap(), name("pkg"));
    }

    #[test]
    fn strips_extras_markers_and_urls() {
        assert_eq!(
            Requirement::parse_line("celery[redis]>=5").unwrap(),
            name("celery")
        );
        assert_eq!(
            Requirement::parse_line("pywin32; sys_platform == 'win32'").unwrap(),
            name("pywin32")
        );
        assert_eq!(
            Requirement::parse_line("mylib @ https://example.com/mylib.whl").unwrap(),
            name("mylib")
        );
    }

    #[test]
    fn normalizes_names() {
        assert_eq!(
            Requirement::parse_line("Foo_Bar==1.0").unwrap(),
            name("foo-bar")
        );
    }

    #[test]
    fn keeps_editable_lines_verbatim() {
        assert_eq!(
            Requirement::parse_line("-e ./mylib").unwrap(),
            Some(Requirement::Editable("-e ./mylib".to_string()))
        );
        assert_eq!(
            Requirement::parse_line("  -e git+https://example.com/repo.git#egg=repo  ").unwrap(),
            Some(Requirement::Editable(
                "-e git+https://example.com/repo.git#egg=repo".to_string()
            ))
        );
        assert_eq!(
            Requirement::parse_line("--editable ./mylib").unwrap(),
            Some(Requirement::Editable("--editable ./mylib".to_string()))
        );
    }

    #[test]
    fn skips_blank_comment_and_option_lines() {
        for line in [
            "",
            "   ",
            "# pinned for prod",
            "-r base.txt",
            "--index-url https://example.com/simple",
        ] {
            assert_eq!(Requirement::parse_line(line).unwrap(), None, "{line:?}");
        }
    }

    #[test]
    fn strips_inline_comments() {
        assert_eq!(
            Requirement::parse_line("pytest==8.0  # tests only").unwrap(),
            name("pytest")
        );
    }

    #[test]
    fn include_targets() {
        assert_eq!(include_target("-r base.txt"), Some("base.txt".to_string()));
        assert_eq!(include_target("-rbase.txt"), Some("base.txt".to_string()));
        assert_eq!(
            include_target("--requirement=requirements/dev.txt  # dev"),
            Some("requirements/dev.txt".to_string())
        );
        assert_eq!(
            include_target("  --requirement base.txt"),
            Some("base.txt".to_string())
        );
        assert_eq!(include_target("-r"), None);
        assert_eq!(include_target("-c constraints.txt"), None);
        assert_eq!(include_target("requests"), None);
        assert_eq!(Requirement::parse_line("-r base.txt").unwrap(), None);
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            Requirement::parse_line("!!!"),
            Err(ParseError::InvalidName(_))
        ));
    }
}
