//! Per-file metadata extraction
//!
//! Classifies one file without fully parsing it: package clause, import
//! list, `+build` tag lines, cgo detection, and the `_GOOS` / `_GOARCH`
//! filename suffix convention. Non-Go files are classified purely by their
//! extension and filename suffix.

use std::path::{Path, PathBuf};

use crate::error::{SpringbokError, SpringbokResult};
use crate::platform::{BuildTags, Platform, KNOWN_ARCH, KNOWN_OS};

/// Buildable file categories, grouped by how they join a package
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    /// `.go` source
    Go,
    /// C/C++ source, compiled only in cgo packages
    CSource,
    /// C/C++ header, shipped only with cgo packages
    Header,
    /// `.s` / `.S` / `.asm`, assembled in any package
    Assembly,
    /// SWIG interface, cgo only
    Swig,
    /// Prebuilt system object, linked into any package
    SysObject,
}

impl FileCategory {
    /// Category for a non-Go filename, from the fixed extension table.
    /// Returns `None` for files that never participate in a build.
    pub fn from_extension(name: &str) -> Option<FileCategory> {
        let ext = Path::new(name).extension()?.to_str()?;
        match ext {
            "c" | "cc" | "cpp" | "cxx" => Some(FileCategory::CSource),
            "h" | "hh" | "hpp" | "hxx" => Some(FileCategory::Header),
            "s" | "S" | "asm" => Some(FileCategory::Assembly),
            "swig" | "swigcxx" => Some(FileCategory::Swig),
            "syso" => Some(FileCategory::SysObject),
            _ => None,
        }
    }

    /// Whether this category requires the package to use cgo
    pub fn requires_cgo(self) -> bool {
        matches!(
            self,
            FileCategory::CSource | FileCategory::Header | FileCategory::Swig
        )
    }
}

/// One term of a `+build` group, e.g. `linux` or `!purego`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagTerm {
    pub negated: bool,
    pub name: String,
}

/// One `// +build` line: an OR of comma-joined AND groups
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagLine {
    pub groups: Vec<Vec<TagTerm>>,
}

impl TagLine {
    fn parse(rest: &str) -> TagLine {
        let groups = rest
            .split_whitespace()
            .map(|group| {
                group
                    .split(',')
                    .filter(|term| !term.is_empty())
                    .map(|term| {
                        let negated = term.starts_with('!');
                        TagTerm {
                            negated,
                            name: term.trim_start_matches('!').to_string(),
                        }
                    })
                    .collect()
            })
            .collect();
        TagLine { groups }
    }

    /// A line is satisfied if any group is; a group if every term is.
    fn satisfied(&self, platform: &Platform, tags: &BuildTags) -> bool {
        self.groups.iter().any(|group| {
            group
                .iter()
                .all(|term| term_matches(term, platform, tags))
        })
    }
}

fn term_matches(term: &TagTerm, platform: &Platform, tags: &BuildTags) -> bool {
    let value =
        term.name == platform.os || term.name == platform.arch || tags.is_set(&term.name);
    value != term.negated
}

/// Metadata for one file in a directory. Immutable once computed.
#[derive(Debug, Clone)]
pub struct FileInfo {
    pub name: String,
    pub path: PathBuf,
    pub category: FileCategory,
    /// Declared package name; `None` for non-Go files, which inherit the
    /// package they are added to
    pub package_name: Option<String>,
    pub is_test: bool,
    pub is_cgo: bool,
    pub imports: Vec<String>,
    pub tag_lines: Vec<TagLine>,
    pub suffix_os: Option<String>,
    pub suffix_arch: Option<String>,
}

impl FileInfo {
    /// Whether this file participates in a build for `platform`
    pub fn applies_to(&self, platform: &Platform, tags: &BuildTags) -> bool {
        if let Some(os) = &self.suffix_os {
            if *os != platform.os {
                return false;
            }
        }
        if let Some(arch) = &self.suffix_arch {
            if *arch != platform.arch {
                return false;
            }
        }
        self.tag_lines
            .iter()
            .all(|line| line.satisfied(platform, tags))
    }

    /// Whether the file carries no platform restriction at all
    pub fn is_unconstrained(&self) -> bool {
        self.suffix_os.is_none() && self.suffix_arch.is_none() && self.tag_lines.is_empty()
    }
}

/// Classify a Go source file, reading just enough of it to find the
/// `+build` lines, the package clause, and the import list.
pub fn go_file_info(dir: &Path, name: &str) -> SpringbokResult<FileInfo> {
    let path = dir.join(name);
    let content = std::fs::read_to_string(&path)?;
    let (is_test, suffix_os, suffix_arch) = parse_filename_suffix(name);

    let mut tag_lines = Vec::new();
    let mut package_name = None;
    let mut imports = Vec::new();
    let mut is_cgo = false;

    let mut in_block_comment = false;
    let mut in_import_block = false;

    for raw in content.lines() {
        let line = raw.trim();

        if in_block_comment {
            if line.contains("*/") {
                in_block_comment = false;
            }
            continue;
        }
        if line.starts_with("/*") {
            if !line.contains("*/") {
                in_block_comment = true;
            }
            continue;
        }

        if let Some(comment) = line.strip_prefix("//") {
            if package_name.is_none() {
                if let Some(rest) = comment.trim().strip_prefix("+build") {
                    // The directive must stand alone: "+buildfoo" is not one.
                    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                        tag_lines.push(TagLine::parse(rest));
                    }
                }
            }
            continue;
        }

        if in_import_block {
            if line.starts_with(')') {
                in_import_block = false;
            } else if let Some(import) = quoted_import(line) {
                if import == "C" {
                    is_cgo = true;
                } else {
                    imports.push(import);
                }
            }
            continue;
        }

        if package_name.is_none() {
            if let Some(rest) = line.strip_prefix("package ") {
                let name: String = rest
                    .chars()
                    .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
                    .collect();
                if !name.is_empty() {
                    package_name = Some(name);
                }
            } else if !line.is_empty() {
                return Err(SpringbokError::MissingPackageClause { file: path });
            }
            continue;
        }

        if line == "import (" || line.starts_with("import (") {
            in_import_block = true;
            continue;
        }
        if line.starts_with("import ") || line.starts_with("import\t") {
            if let Some(import) = quoted_import(line) {
                if import == "C" {
                    is_cgo = true;
                } else {
                    imports.push(import);
                }
            }
            continue;
        }

        // Import declarations precede all other top-level declarations, so
        // the first one of these ends the scan.
        if line.starts_with("func ")
            || line.starts_with("var ")
            || line.starts_with("const ")
            || line.starts_with("type ")
        {
            break;
        }
    }

    let package_name =
        package_name.ok_or(SpringbokError::MissingPackageClause { file: path.clone() })?;

    Ok(FileInfo {
        name: name.to_string(),
        path,
        category: FileCategory::Go,
        package_name: Some(package_name),
        is_test,
        is_cgo,
        imports,
        tag_lines,
        suffix_os,
        suffix_arch,
    })
}

/// Classify a non-Go file. Classification is driven purely by the filename:
/// the extension table picks the category, and the same `_GOOS` / `_GOARCH`
/// suffix rules apply. Returns `None` for files that never participate.
pub fn other_file_info(dir: &Path, name: &str) -> Option<FileInfo> {
    let category = FileCategory::from_extension(name)?;
    let (is_test, suffix_os, suffix_arch) = parse_filename_suffix(name);
    Some(FileInfo {
        name: name.to_string(),
        path: dir.join(name),
        category,
        package_name: None,
        is_test,
        is_cgo: false,
        imports: Vec::new(),
        tag_lines: Vec::new(),
        suffix_os,
        suffix_arch,
    })
}

/// Extract the first quoted string from an import line, skipping any alias
fn quoted_import(line: &str) -> Option<String> {
    let start = line.find('"')?;
    let rest = &line[start + 1..];
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

/// Decode the filename convention: an optional `_test` suffix, then
/// `name_GOOS.ext`, `name_GOARCH.ext`, or `name_GOOS_GOARCH.ext`. Suffixes
/// start at an underscore, so a bare `linux.go` carries no constraint while
/// `linux_amd64.go` is restricted to linux/amd64.
fn parse_filename_suffix(name: &str) -> (bool, Option<String>, Option<String>) {
    let stem = Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("");

    let (stem, is_test) = match stem.strip_suffix("_test") {
        Some(rest) => (rest, true),
        None => (stem, false),
    };

    let parts: Vec<&str> = stem.split('_').collect();
    let n = parts.len();
    if n >= 2 {
        let last = parts[n - 1];
        if KNOWN_ARCH.contains(&last) {
            if KNOWN_OS.contains(&parts[n - 2]) {
                return (
                    is_test,
                    Some(parts[n - 2].to_string()),
                    Some(last.to_string()),
                );
            }
            return (is_test, None, Some(last.to_string()));
        }
        if KNOWN_OS.contains(&last) {
            return (is_test, Some(last.to_string()), None);
        }
    }
    (is_test, None, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_and_classify(name: &str, content: &str) -> FileInfo {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(name), content).unwrap();
        go_file_info(dir.path(), name).unwrap()
    }

    #[test]
    fn test_package_and_imports() {
        let info = write_and_classify(
            "a.go",
            r#"package widget

import (
    "fmt"
    xio "io"
)

import "strings"

func f() {}
"#,
        );
        assert_eq!(info.package_name.as_deref(), Some("widget"));
        assert_eq!(info.imports, vec!["fmt", "io", "strings"]);
        assert!(!info.is_cgo);
        assert!(!info.is_test);
        assert!(info.is_unconstrained());
    }

    #[test]
    fn test_cgo_detection() {
        let info = write_and_classify("cgo.go", "package widget\n\nimport \"C\"\n");
        assert!(info.is_cgo);
        assert!(info.imports.is_empty());
    }

    #[test]
    fn test_filename_suffixes() {
        assert_eq!(
            parse_filename_suffix("a_linux.go"),
            (false, Some("linux".to_string()), None)
        );
        assert_eq!(
            parse_filename_suffix("a_linux_amd64.go"),
            (false, Some("linux".to_string()), Some("amd64".to_string()))
        );
        assert_eq!(
            parse_filename_suffix("a_amd64.go"),
            (false, None, Some("amd64".to_string()))
        );
        assert_eq!(
            parse_filename_suffix("a_windows_test.go"),
            (true, Some("windows".to_string()), None)
        );
        // A constraint needs an underscore before it.
        assert_eq!(parse_filename_suffix("linux.go"), (false, None, None));
        assert_eq!(
            parse_filename_suffix("linux_amd64.go"),
            (false, Some("linux".to_string()), Some("amd64".to_string()))
        );
    }

    #[test]
    fn test_build_tag_evaluation() {
        let info = write_and_classify(
            "a.go",
            "// +build linux,!purego darwin\n\npackage widget\n",
        );
        let tags = BuildTags::new();
        assert!(info.applies_to(&Platform::new("linux", "amd64"), &tags));
        assert!(info.applies_to(&Platform::new("darwin", "amd64"), &tags));
        assert!(!info.applies_to(&Platform::new("windows", "amd64"), &tags));

        let mut purego = BuildTags::new();
        purego.set("purego", true);
        assert!(!info.applies_to(&Platform::new("linux", "amd64"), &purego));
        assert!(info.applies_to(&Platform::new("darwin", "amd64"), &purego));
    }

    #[test]
    fn test_build_directive_needs_word_boundary() {
        let info = write_and_classify("a.go", "// +buildfoo\n\npackage widget\n");
        assert!(info.tag_lines.is_empty());
        assert!(info.is_unconstrained());

        let bare = write_and_classify("b.go", "// +build\n\npackage widget\n");
        assert_eq!(bare.tag_lines.len(), 1);
    }

    #[test]
    fn test_tag_lines_are_anded() {
        let info = write_and_classify("a.go", "// +build linux\n// +build amd64\n\npackage w\n");
        let tags = BuildTags::new();
        assert!(info.applies_to(&Platform::new("linux", "amd64"), &tags));
        assert!(!info.applies_to(&Platform::new("linux", "arm"), &tags));
    }

    #[test]
    fn test_missing_package_clause() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bad.go"), "func f() {}\n").unwrap();
        assert!(go_file_info(dir.path(), "bad.go").is_err());
    }

    #[test]
    fn test_other_file_categories() {
        let dir = Path::new("x");
        assert_eq!(
            other_file_info(dir, "a.c").unwrap().category,
            FileCategory::CSource
        );
        assert_eq!(
            other_file_info(dir, "asm_linux.s").unwrap().suffix_os,
            Some("linux".to_string())
        );
        assert!(other_file_info(dir, "README.md").is_none());
        assert!(FileCategory::from_extension("a.h").unwrap().requires_cgo());
        assert!(!FileCategory::from_extension("a.s").unwrap().requires_cgo());
    }
}
