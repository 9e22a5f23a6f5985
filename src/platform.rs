//! Target platforms and build tags
//!
//! A `Platform` is an (OS, architecture) pair. `PlatformConstraints` is the
//! enumerated set of platforms rules are generated for; a source file either
//! participates in the default build (applicable on every platform) or only
//! under `select` conditions for the platforms it matches.

use std::collections::HashMap;
use std::fmt;

/// Operating systems recognized in filename suffixes and `+build` tags
pub const KNOWN_OS: &[&str] = &[
    "android",
    "darwin",
    "dragonfly",
    "freebsd",
    "linux",
    "nacl",
    "netbsd",
    "openbsd",
    "plan9",
    "solaris",
    "windows",
];

/// Architectures recognized in filename suffixes and `+build` tags
pub const KNOWN_ARCH: &[&str] = &[
    "386", "amd64", "amd64p32", "arm", "arm64", "mips64", "mips64le", "ppc64", "ppc64le", "s390x",
];

/// One (OS, architecture) pair
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Platform {
    pub os: String,
    pub arch: String,
}

impl Platform {
    pub fn new(os: &str, arch: &str) -> Self {
        Self {
            os: os.to_string(),
            arch: arch.to_string(),
        }
    }

    /// Label of the `config_setting` used as a `select` condition key
    pub fn condition_label(&self) -> String {
        format!("@io_bazel_rules_go//go/platform:{}_{}", self.os, self.arch)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.os, self.arch)
    }
}

/// The set of platforms rules are generated for
///
/// Injected by the caller and shared read-only across the walk.
#[derive(Debug, Clone)]
pub struct PlatformConstraints {
    platforms: Vec<Platform>,
}

impl PlatformConstraints {
    pub fn new(platforms: Vec<Platform>) -> Self {
        Self { platforms }
    }

    pub fn platforms(&self) -> &[Platform] {
        &self.platforms
    }

    pub fn len(&self) -> usize {
        self.platforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }
}

impl Default for PlatformConstraints {
    /// Platforms the generated rules support out of the box
    fn default() -> Self {
        Self::new(vec![
            Platform::new("darwin", "amd64"),
            Platform::new("linux", "amd64"),
            Platform::new("linux", "arm"),
            Platform::new("windows", "amd64"),
        ])
    }
}

/// Build tags supplied by the caller, mapped to their truth value
///
/// Tags absent from the map evaluate to false.
#[derive(Debug, Clone, Default)]
pub struct BuildTags(HashMap<String, bool>);

impl BuildTags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a comma-separated tag list, e.g. `"purego,netgo"`
    pub fn from_list(list: &str) -> Self {
        let mut tags = HashMap::new();
        for tag in list.split(',') {
            let tag = tag.trim();
            if !tag.is_empty() {
                tags.insert(tag.to_string(), true);
            }
        }
        Self(tags)
    }

    pub fn set(&mut self, tag: &str, value: bool) {
        self.0.insert(tag.to_string(), value);
    }

    pub fn is_set(&self, tag: &str) -> bool {
        self.0.get(tag).copied().unwrap_or(false)
    }
}
