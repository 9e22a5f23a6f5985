//! Per-directory package accumulation
//!
//! A `Package` collects the files of one directory that share a package
//! name, partitioned by role and by platform applicability. It is mutated
//! only through `add_file` during a single resolution pass and treated as
//! immutable once selected.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{SpringbokError, SpringbokResult};
use crate::packages::fileinfo::{FileCategory, FileInfo};
use crate::platform::{BuildTags, Platform, PlatformConstraints};

/// Strings split between the default build and per-platform builds
///
/// `generic` entries apply everywhere; `platform` entries apply only under
/// the matching `select` condition.
#[derive(Debug, Clone, Default)]
pub struct PlatformStrings {
    pub generic: Vec<String>,
    pub platform: BTreeMap<Platform, Vec<String>>,
}

impl PlatformStrings {
    pub fn is_empty(&self) -> bool {
        self.generic.is_empty() && self.platform.values().all(|v| v.is_empty())
    }

    fn push_generic(&mut self, value: &str) {
        if !self.generic.iter().any(|v| v == value) {
            self.generic.push(value.to_string());
        }
    }

    fn push_platform(&mut self, platform: &Platform, value: &str) {
        let list = self.platform.entry(platform.clone()).or_default();
        if !list.iter().any(|v| v == value) {
            list.push(value.to_string());
        }
    }

    /// Concatenation preserving order: all of `self`, then all of `other`
    pub fn union(&self, other: &PlatformStrings) -> PlatformStrings {
        let mut merged = self.clone();
        for value in &other.generic {
            merged.push_generic(value);
        }
        for (platform, values) in &other.platform {
            for value in values {
                merged.push_platform(platform, value);
            }
        }
        merged
    }
}

/// One buildable package resolved from a directory
#[derive(Debug, Clone)]
pub struct Package {
    pub dir: PathBuf,
    pub name: String,
    /// Pure Go sources, assembly, and prebuilt objects
    pub srcs: PlatformStrings,
    /// cgo Go sources plus C sources, headers, and SWIG interfaces
    pub cgo_srcs: PlatformStrings,
    /// `_test.go` sources
    pub test_srcs: PlatformStrings,
    pub imports: PlatformStrings,
    pub test_imports: PlatformStrings,
    pub has_cgo: bool,
    first_go_file: Option<String>,
}

impl Package {
    pub fn new(name: &str, dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            name: name.to_string(),
            srcs: PlatformStrings::default(),
            cgo_srcs: PlatformStrings::default(),
            test_srcs: PlatformStrings::default(),
            imports: PlatformStrings::default(),
            test_imports: PlatformStrings::default(),
            has_cgo: false,
            first_go_file: None,
        }
    }

    /// Whether the package contains at least one compiled Go source.
    /// Packages made up only of non-Go files do not count as buildable.
    pub fn has_go(&self) -> bool {
        self.first_go_file.is_some()
    }

    /// A representative Go file for diagnostics
    pub fn first_go_file(&self) -> Option<&str> {
        self.first_go_file.as_deref()
    }

    /// Add one classified file.
    ///
    /// `cgo_dir` is the directory-wide cgo flag: C sources and headers join
    /// the package only when some Go file in the directory uses cgo. Files
    /// applicable on every platform land in the generic partition, files
    /// applicable on a strict subset land in the per-platform partitions,
    /// and files applicable nowhere are dropped.
    pub fn add_file(
        &mut self,
        info: &FileInfo,
        cgo_dir: bool,
        tags: &BuildTags,
        platforms: &PlatformConstraints,
    ) -> SpringbokResult<()> {
        if let Some(declared) = &info.package_name {
            if *declared != self.name {
                return Err(SpringbokError::PackageNameMismatch {
                    file: info.path.clone(),
                    expected: self.name.clone(),
                    actual: declared.clone(),
                });
            }
        }

        let applicable: Vec<&Platform> = platforms
            .platforms()
            .iter()
            .filter(|p| info.applies_to(p, tags))
            .collect();
        if applicable.is_empty() && !platforms.is_empty() {
            return Ok(());
        }
        let generic = info.is_unconstrained() || applicable.len() == platforms.len();

        match info.category {
            FileCategory::Go => {
                if self.first_go_file.is_none() {
                    self.first_go_file = Some(info.name.clone());
                }
                let (srcs, imports) = if info.is_test {
                    (&mut self.test_srcs, &mut self.test_imports)
                } else if info.is_cgo {
                    self.has_cgo = true;
                    (&mut self.cgo_srcs, &mut self.imports)
                } else {
                    (&mut self.srcs, &mut self.imports)
                };
                if generic {
                    srcs.push_generic(&info.name);
                    for import in &info.imports {
                        imports.push_generic(import);
                    }
                } else {
                    for &platform in &applicable {
                        srcs.push_platform(platform, &info.name);
                        for import in &info.imports {
                            imports.push_platform(platform, import);
                        }
                    }
                }
            }
            FileCategory::Assembly | FileCategory::SysObject => {
                Self::push(&mut self.srcs, &info.name, generic, &applicable);
            }
            FileCategory::CSource | FileCategory::Header | FileCategory::Swig => {
                if cgo_dir {
                    Self::push(&mut self.cgo_srcs, &info.name, generic, &applicable);
                }
            }
        }
        Ok(())
    }

    fn push(set: &mut PlatformStrings, name: &str, generic: bool, applicable: &[&Platform]) {
        if generic {
            set.push_generic(name);
        } else {
            for &platform in applicable {
                set.push_platform(platform, name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packages::fileinfo::{go_file_info, other_file_info};
    use std::fs;
    use tempfile::TempDir;

    fn classify(dir: &TempDir, name: &str, content: &str) -> FileInfo {
        fs::write(dir.path().join(name), content).unwrap();
        go_file_info(dir.path(), name).unwrap()
    }

    #[test]
    fn test_platform_partition() {
        let dir = TempDir::new().unwrap();
        let tags = BuildTags::new();
        let platforms = PlatformConstraints::default();
        let mut pkg = Package::new("widget", dir.path());

        let a = classify(&dir, "a.go", "package widget\n");
        let linux = classify(&dir, "a_linux.go", "package widget\n");
        let wintest = classify(&dir, "a_windows_test.go", "package widget\n");

        pkg.add_file(&a, false, &tags, &platforms).unwrap();
        pkg.add_file(&linux, false, &tags, &platforms).unwrap();
        pkg.add_file(&wintest, false, &tags, &platforms).unwrap();

        assert_eq!(pkg.srcs.generic, vec!["a.go"]);
        let linux_srcs: Vec<&str> = pkg
            .srcs
            .platform
            .iter()
            .filter(|(p, _)| p.os == "linux")
            .flat_map(|(_, v)| v.iter().map(String::as_str))
            .collect();
        assert_eq!(linux_srcs, vec!["a_linux.go", "a_linux.go"]);
        assert!(pkg.test_srcs.generic.is_empty());
        let win_tests: Vec<&str> = pkg
            .test_srcs
            .platform
            .iter()
            .filter(|(p, _)| p.os == "windows")
            .flat_map(|(_, v)| v.iter().map(String::as_str))
            .collect();
        assert_eq!(win_tests, vec!["a_windows_test.go"]);
        assert!(pkg.has_go());
        assert_eq!(pkg.first_go_file(), Some("a.go"));
    }

    #[test]
    fn test_package_name_mismatch() {
        let dir = TempDir::new().unwrap();
        let tags = BuildTags::new();
        let platforms = PlatformConstraints::default();
        let mut pkg = Package::new("widget", dir.path());
        let other = classify(&dir, "b.go", "package gadget\n");
        assert!(pkg.add_file(&other, false, &tags, &platforms).is_err());
    }

    #[test]
    fn test_c_sources_need_cgo_dir() {
        let dir = TempDir::new().unwrap();
        let tags = BuildTags::new();
        let platforms = PlatformConstraints::default();
        let mut pkg = Package::new("widget", dir.path());

        let c = other_file_info(dir.path(), "impl.c").unwrap();
        pkg.add_file(&c, false, &tags, &platforms).unwrap();
        assert!(pkg.cgo_srcs.is_empty());

        pkg.add_file(&c, true, &tags, &platforms).unwrap();
        assert_eq!(pkg.cgo_srcs.generic, vec!["impl.c"]);
    }

    #[test]
    fn test_assembly_joins_without_cgo() {
        let dir = TempDir::new().unwrap();
        let tags = BuildTags::new();
        let platforms = PlatformConstraints::default();
        let mut pkg = Package::new("widget", dir.path());
        let asm = other_file_info(dir.path(), "fast_amd64.s").unwrap();
        pkg.add_file(&asm, false, &tags, &platforms).unwrap();
        assert!(pkg.srcs.generic.is_empty());
        assert!(!pkg.srcs.is_empty());
    }

    #[test]
    fn test_union_preserves_order_and_dedupes() {
        let mut a = PlatformStrings::default();
        a.push_generic("a.go");
        let mut b = PlatformStrings::default();
        b.push_generic("b.go");
        b.push_generic("a.go");
        let merged = a.union(&b);
        assert_eq!(merged.generic, vec!["a.go", "b.go"]);
    }
}
