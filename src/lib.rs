//! Springbok - BUILD file generator and incremental merger for Go trees
//!
//! Springbok scans a Go source tree, resolves one buildable package per
//! directory, generates Bazel BUILD rules for it, and merges them into any
//! existing BUILD file while preserving user edits, comments, and values
//! marked `# keep`.

pub mod bzl;
pub mod error;
pub mod fs;
pub mod generator;
pub mod merger;
pub mod packages;
pub mod platform;

// Re-exports for convenience
pub use bzl::{format_file, parse_file, parse_text, BuildFile, Expr, ExprKind};
pub use error::{SpringbokError, SpringbokResult};
pub use generator::Generator;
pub use merger::{merge_files, merge_rule, merge_with_existing, IGNORE_MARKER, KEEP_MARKER};
pub use packages::{find_package, walk, FileInfo, Package};
pub use platform::{BuildTags, Platform, PlatformConstraints};
