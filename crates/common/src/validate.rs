//! Validation helpers shared across crates that accept untrusted identifiers.

use crate::error::Error;
use regex::Regex;
use std::sync::OnceLock;

fn hostname_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9._-]+$").expect("static pattern is valid"))
}

/// Validate a container hostname: it becomes the cgroup directory name and
/// the runtime-directory suffix, so a malformed value is a path-traversal
/// vector, not just a cosmetic issue. Must match `[A-Za-z0-9._-]+` and not
/// begin with a dot.
pub fn hostname(name: &str) -> Result<(), Error> {
    if name.is_empty() {
        return Err(Error::InvalidArgument("hostname must not be empty".into()));
    }
    if name.starts_with('.') {
        return Err(Error::InvalidArgument(format!(
            "hostname {:?} must not begin with a dot",
            name
        )));
    }
    if !hostname_pattern().is_match(name) {
        return Err(Error::InvalidArgument(format!(
            "hostname {:?} contains characters outside [A-Za-z0-9._-]",
            name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_hostnames() {
        assert!(hostname("recipe-step-42").is_ok());
        assert!(hostname("build.worker_1").is_ok());
    }

    #[test]
    fn rejects_leading_dot() {
        assert!(hostname("..foo").is_err());
        assert!(hostname(".hidden").is_err());
    }

    #[test]
    fn rejects_path_separators() {
        assert!(hostname("foo/bar").is_err());
        assert!(hostname("../../etc").is_err());
    }

    #[test]
    fn rejects_empty() {
        assert!(hostname("").is_err());
    }
}
