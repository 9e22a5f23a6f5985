//! Directory traversal and per-directory package resolution
//!
//! `walk` visits every subdirectory under a root and invokes a callback
//! once for each directory that resolves to a buildable package. Errors are
//! logged and skip the offending file or directory; nothing aborts the walk.

use std::collections::BTreeMap;
use std::path::Path;

use ignore::WalkBuilder;

use crate::error::{SpringbokError, SpringbokResult};
use crate::packages::fileinfo::{go_file_info, other_file_info};
use crate::packages::package::Package;
use crate::platform::{BuildTags, PlatformConstraints};

/// Package name go/build reserves for standalone documentation files;
/// files declaring it never start or join a package.
const DOCUMENTATION_PACKAGE: &str = "documentation";

/// Fallback default package name when the prefix has no usable last segment
const UNNAMED_PACKAGE: &str = "unnamed";

/// Walk every subdirectory of `dir` and call `f` once per directory that
/// resolves to a buildable package.
///
/// Directories with an empty name, a leading dot, or the name `testdata`
/// are skipped entirely. A directory with no buildable Go sources is
/// silently skipped; any other resolution failure is logged and skipped.
pub fn walk(
    tags: &BuildTags,
    platforms: &PlatformConstraints,
    repo_root: &Path,
    go_prefix: &str,
    dir: &Path,
    f: &mut dyn FnMut(Package),
) {
    let walker = WalkBuilder::new(dir)
        .standard_filters(false)
        .sort_by_file_name(std::ffi::OsStr::cmp)
        .filter_entry(|entry| {
            if entry.depth() == 0 {
                return true;
            }
            match entry.file_type() {
                Some(t) if t.is_dir() => {
                    let name = entry.file_name().to_string_lossy();
                    !(name.is_empty() || name.starts_with('.') || name == "testdata")
                }
                _ => true,
            }
        })
        .build();

    for result in walker {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                log::error!("{err}");
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_dir()) {
            continue;
        }
        if let Some(pkg) = find_package(entry.path(), tags, platforms, repo_root, go_prefix) {
            f(pkg);
        }
    }
}

/// Resolve the single buildable package of one directory, non-recursively.
///
/// Returns `None` when the directory has no buildable Go sources (the
/// normal case, not logged) or when resolution fails for any other reason
/// (logged).
pub fn find_package(
    dir: &Path,
    tags: &BuildTags,
    platforms: &PlatformConstraints,
    repo_root: &Path,
    go_prefix: &str,
) -> Option<Package> {
    let reader = PackageReader {
        tags,
        platforms,
        repo_root,
        go_prefix,
        dir,
    };
    match reader.find_package() {
        Ok(pkg) => Some(pkg),
        Err(SpringbokError::NoGoSources { .. }) => None,
        Err(err) => {
            log::error!("{err}");
            None
        }
    }
}

/// Reads package metadata from one directory
struct PackageReader<'a> {
    tags: &'a BuildTags,
    platforms: &'a PlatformConstraints,
    repo_root: &'a Path,
    go_prefix: &'a str,
    dir: &'a Path,
}

impl PackageReader<'_> {
    fn find_package(&self) -> SpringbokResult<Package> {
        // List the directory and split into Go files and other files. Go
        // files are processed first: they decide which package is selected
        // when a directory holds several.
        let mut go_files = Vec::new();
        let mut other_files = Vec::new();
        let mut names = Vec::new();
        for entry in std::fs::read_dir(self.dir)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    log::error!("{}: {err}", self.dir.display());
                    continue;
                }
            };
            if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                continue;
            }
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        for name in names {
            if name.is_empty() || name.starts_with('.') || name.starts_with('_') {
                continue;
            }
            if name.ends_with(".go") {
                go_files.push(name);
            } else {
                other_files.push(name);
            }
        }

        let mut package_map: BTreeMap<String, Package> = BTreeMap::new();
        let mut cgo = false;
        for go_file in &go_files {
            let info = match go_file_info(self.dir, go_file) {
                Ok(info) => info,
                Err(err) => {
                    log::error!("{err}");
                    continue;
                }
            };
            let package_name = info
                .package_name
                .clone()
                .unwrap_or_else(|| UNNAMED_PACKAGE.to_string());
            if package_name == DOCUMENTATION_PACKAGE {
                continue;
            }
            // A file satisfying no target platform is no use to any package.
            if !self.platforms.is_empty()
                && !self
                    .platforms
                    .platforms()
                    .iter()
                    .any(|p| info.applies_to(p, self.tags))
            {
                continue;
            }

            cgo = cgo || info.is_cgo;

            let pkg = package_map
                .entry(package_name.clone())
                .or_insert_with(|| Package::new(&package_name, self.dir));
            if let Err(err) = pkg.add_file(&info, false, self.tags, self.platforms) {
                log::error!("{err}");
            }
        }

        let mut pkg = self.select_package(package_map)?;

        for other_file in &other_files {
            let Some(info) = other_file_info(self.dir, other_file) else {
                continue;
            };
            if let Err(err) = pkg.add_file(&info, cgo, self.tags, self.platforms) {
                log::error!("{err}");
            }
        }

        Ok(pkg)
    }

    /// Apply the single-package-selection policy over the accumulated map.
    fn select_package(&self, package_map: BTreeMap<String, Package>) -> SpringbokResult<Package> {
        let mut buildable: BTreeMap<String, Package> = package_map
            .into_iter()
            .filter(|(_, pkg)| pkg.has_go())
            .collect();

        if buildable.len() > 1 {
            let default = self.default_package_name();
            if let Some(pkg) = buildable.remove(&default) {
                return Ok(pkg);
            }
            let (packages, files) = buildable
                .iter()
                .map(|(name, pkg)| {
                    let file = pkg.first_go_file().unwrap_or("").to_string();
                    (name.clone(), file)
                })
                .unzip();
            return Err(SpringbokError::MultiplePackages {
                dir: self.dir.to_path_buf(),
                packages,
                files,
            });
        }

        match buildable.pop_first() {
            Some((_, pkg)) => Ok(pkg),
            None => Err(SpringbokError::NoGoSources {
                dir: self.dir.to_path_buf(),
            }),
        }
    }

    fn default_package_name(&self) -> String {
        default_name_for(self.dir, self.repo_root, self.go_prefix)
    }
}

/// The package name that wins a conflict in a directory: the directory base
/// name, or at the repository root the last segment of the Go prefix.
/// Callers that name rules (e.g. a binary at the root) use the same
/// convention.
pub fn default_name_for(dir: &Path, repo_root: &Path, go_prefix: &str) -> String {
    if dir != repo_root {
        return dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| UNNAMED_PACKAGE.to_string());
    }
    let name = go_prefix.trim_end_matches('/').rsplit('/').next().unwrap_or("");
    if name.is_empty() {
        UNNAMED_PACKAGE.to_string()
    } else {
        name.to_string()
    }
}
