//! Module specifier grammar.
//!
//! A bare specifier is `(@scope/name | name)(/remainder)?`. Relative and
//! absolute specifiers (leading `.` or `/`) carry no package segment.

use std::sync::LazyLock;

use regex::Regex;

static BARE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(@\w[\w.-]*/\w[\w.-]*|\w[\w.-]*)(?:/(.*))?$").unwrap()
});

/// A specifier split into package and path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Specifier<'a> {
    /// `@scope/name` or `name`, absent for relative and absolute paths.
    pub package: Option<&'a str>,
    /// Path after the package, or the whole specifier when there is no package.
    pub remainder: Option<&'a str>,
}

impl<'a> Specifier<'a> {
    pub fn parse(specifier: &'a str) -> Self {
        if specifier.starts_with('.') || specifier.starts_with('/') {
            return Self {
                package: None,
                remainder: Some(specifier),
            };
        }

        match BARE.captures(specifier) {
            Some(caps) => Self {
                package: caps.get(1).map(|m| m.as_str()),
                remainder: caps.get(2).map(|m| m.as_str()).filter(|s| !s.is_empty()),
            },
            None => Self {
                package: None,
                remainder: Some(specifier).filter(|s| !s.is_empty()),
            },
        }
    }
}

/// Whether the specifier points off-site (`https://`, `data:`, ...).
pub fn is_external(specifier: &str) -> bool {
    specifier.contains("://") || specifier.starts_with("data:") || specifier.starts_with("blob:")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_package() {
        let spec = Specifier::parse("lit");
        assert_eq!(spec.package, Some("lit"));
        assert_eq!(spec.remainder, None);
    }

    #[test]
    fn test_package_with_remainder() {
        let spec = Specifier::parse("foo/bar/baz.js");
        assert_eq!(spec.package, Some("foo"));
        assert_eq!(spec.remainder, Some("bar/baz.js"));
    }

    #[test]
    fn test_scoped_package() {
        let spec = Specifier::parse("@scope/pkg");
        assert_eq!(spec.package, Some("@scope/pkg"));
        assert_eq!(spec.remainder, None);

        let spec = Specifier::parse("@scope/pkg/dist/es.js");
        assert_eq!(spec.package, Some("@scope/pkg"));
        assert_eq!(spec.remainder, Some("dist/es.js"));
    }

    #[test]
    fn test_trailing_slash_has_no_remainder() {
        let spec = Specifier::parse("foo/");
        assert_eq!(spec.package, Some("foo"));
        assert_eq!(spec.remainder, None);
    }

    #[test]
    fn test_relative_and_absolute() {
        for input in ["./local", "../up/x.js", "/abs/path"] {
            let spec = Specifier::parse(input);
            assert_eq!(spec.package, None, "{input}");
            assert_eq!(spec.remainder, Some(input));
        }
    }

    #[test]
    fn test_external() {
        assert!(is_external("https://cdn.example.com/x.js"));
        assert!(is_external("data:text/javascript,1"));
        assert!(!is_external("./x.js"));
        assert!(!is_external("lit"));
    }
}
