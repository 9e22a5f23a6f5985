//! Package discovery
//!
//! Walks a Go source tree and resolves, per directory, the single package
//! build rules should be generated for.

pub mod fileinfo;
pub mod package;
pub mod walk;

pub use fileinfo::{FileCategory, FileInfo};
pub use package::{Package, PlatformStrings};
pub use walk::{default_name_for, find_package, walk};
