//! # Utility Functions
//!
//! Path derivation for per-test report files and lenient level-name mapping
//! for values that come from users rather than from a fixed choice list.

use crate::level::Severity;
use std::path::{Path, PathBuf};

/// Make a test identity safe to use inside a file name.
///
/// Path separators, characters Windows refuses in file names and whitespace
/// become `_`. Plain function names such as `test_hello` are unchanged.
///
/// ```rust
/// # use test_logger::utils::sanitize_test_identity;
/// assert_eq!(sanitize_test_identity("test_hello"), "test_hello");
/// assert_eq!(sanitize_test_identity("tests/test_a.py::test_b"), "tests_test_a.py__test_b");
/// ```
pub fn sanitize_test_identity(test_identity: &str) -> String {
    test_identity
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_whitespace() => '_',
            c => c,
        })
        .collect()
}

/// `{reports_dir}/{test_identity}_{phase}.log`
pub fn report_path(reports_dir: &Path, test_identity: &str, phase: &str) -> PathBuf {
    reports_dir.join(format!(
        "{}_{}.log",
        sanitize_test_identity(test_identity),
        phase
    ))
}

/// Map free-form text to a severity.
///
/// The text is lower-cased and stripped of spaces, `-` and `_`; the first
/// level in registration order (debug, info, warning, error, critical, step,
/// substep, pass, fail) whose name contains it wins, so empty text maps to
/// `debug`. Anything that matches nothing falls back to `info`.
///
/// ```rust
/// # use test_logger::{utils::map_level_name, Severity};
/// assert_eq!(map_level_name("WARN"), Severity::Warning);
/// assert_eq!(map_level_name("Sub-Step"), Severity::Substep);
/// assert_eq!(map_level_name("verbose"), Severity::Info);
/// ```
pub fn map_level_name(name: &str) -> Severity {
    let normalized: String = name
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect();

    Severity::ALL
        .into_iter()
        .find(|level| level.name().contains(normalized.as_str()))
        .unwrap_or(Severity::Info)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_path() {
        assert_eq!(
            report_path(Path::new("./reports"), "test_hello", "setup"),
            PathBuf::from("./reports/test_hello_setup.log")
        );
        assert_eq!(
            report_path(Path::new("out"), "suite::case one", "call"),
            PathBuf::from("out/suite__case_one_call.log")
        );
    }

    #[test]
    fn test_map_level_name() {
        assert_eq!(map_level_name("debug"), Severity::Debug);
        assert_eq!(map_level_name("ERROR"), Severity::Error);
        assert_eq!(map_level_name("crit"), Severity::Critical);
        assert_eq!(map_level_name("pass"), Severity::Pass);
        assert_eq!(map_level_name(""), Severity::Debug);
        assert_eq!(map_level_name("nonsense"), Severity::Info);
    }

    #[test]
    fn test_map_level_name_uses_registration_order() {
        // "step" is contained in both "step" and "substep"; step is registered first.
        assert_eq!(map_level_name("step"), Severity::Step);
        assert_eq!(map_level_name("a"), Severity::Warning);
        assert_eq!(map_level_name("t"), Severity::Critical);
    }
}
