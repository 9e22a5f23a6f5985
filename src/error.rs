//! Error types for springbok
//!
//! Library errors use `thiserror`; the binary wraps them in `anyhow`.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for springbok operations
pub type SpringbokResult<T> = Result<T, SpringbokError>;

/// Main error type for springbok operations
#[derive(Error, Debug)]
pub enum SpringbokError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Syntax error while parsing a BUILD file
    #[error("{}:{line}: {message}", .file.display())]
    Parse {
        file: PathBuf,
        line: usize,
        message: String,
    },

    /// Directory contains no buildable Go sources.
    ///
    /// This is the expected result for most directories and is suppressed
    /// from logs by the walker.
    #[error("no buildable Go source files in {}", .dir.display())]
    NoGoSources { dir: PathBuf },

    /// Directory contains more than one buildable package and none matches
    /// the directory name. `packages` and `files` are parallel: one
    /// representative file per conflicting package.
    #[error("multiple packages in {}: {}", .dir.display(), format_package_conflict(.packages, .files))]
    MultiplePackages {
        dir: PathBuf,
        packages: Vec<String>,
        files: Vec<String>,
    },

    /// A source file declares a package other than the one it was added to
    #[error("{}: declares package '{actual}', expected '{expected}'", .file.display())]
    PackageNameMismatch {
        file: PathBuf,
        expected: String,
        actual: String,
    },

    /// A Go source file has no package clause
    #[error("{}: no package clause found", .file.display())]
    MissingPackageClause { file: PathBuf },

    /// An attribute expression has a shape the merger does not understand
    #[error("expression could not be matched{}", fmt_detail(.detail))]
    ExprShape { detail: Option<String> },

    /// A select dictionary contains the same condition label twice
    #[error("dict contains more than one case named {key:?}")]
    DuplicateDictKey { key: String },

    /// A dict entry or key had an unexpected form during merging
    #[error("malformed dict entry: {message}")]
    MalformedDictEntry { message: String },
}

impl SpringbokError {
    /// Shorthand for an expression-shape mismatch with a detail message
    pub fn expr_shape(detail: impl Into<String>) -> Self {
        SpringbokError::ExprShape {
            detail: Some(detail.into()),
        }
    }
}

fn fmt_detail(detail: &Option<String>) -> String {
    match detail {
        Some(d) => format!(": {d}"),
        None => String::new(),
    }
}

fn format_package_conflict(packages: &[String], files: &[String]) -> String {
    packages
        .iter()
        .zip(files.iter())
        .map(|(p, f)| format!("{p} ({f})"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiple_packages_display() {
        let err = SpringbokError::MultiplePackages {
            dir: PathBuf::from("src/widget"),
            packages: vec!["foo".to_string(), "bar".to_string()],
            files: vec!["foo.go".to_string(), "bar.go".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "multiple packages in src/widget: foo (foo.go), bar (bar.go)"
        );
    }

    #[test]
    fn test_expr_shape_display() {
        let err = SpringbokError::expr_shape("left operand not a list");
        assert_eq!(
            err.to_string(),
            "expression could not be matched: left operand not a list"
        );
        let bare = SpringbokError::ExprShape { detail: None };
        assert_eq!(bare.to_string(), "expression could not be matched");
    }
}
