//! Rule generation from resolved packages
//!
//! Turns one `Package` into the generated statement list consumed by the
//! merger: a `load` of the rule kinds used, a `go_library` (or `go_binary`
//! for `package main`), and a `go_test` when test sources exist. Imports
//! under the repository's Go prefix become dependency labels; anything
//! outside the prefix is left for other tooling.

use std::path::Path;

use crate::bzl::ast::{BuildFile, Expr};
use crate::packages::package::{Package, PlatformStrings};
use crate::packages::walk::default_name_for;
use crate::merger::DEFAULT_CONDITION;

const RULES_GO_DEF: &str = "@io_bazel_rules_go//go:def.bzl";
const DEFAULT_LIBRARY_NAME: &str = "go_default_library";
const DEFAULT_TEST_NAME: &str = "go_default_test";

/// Generates BUILD rule statements for packages of one repository
pub struct Generator<'a> {
    repo_root: &'a Path,
    go_prefix: &'a str,
}

impl<'a> Generator<'a> {
    pub fn new(repo_root: &'a Path, go_prefix: &'a str) -> Self {
        Self {
            repo_root,
            go_prefix,
        }
    }

    /// Generate the statement list for one package. The file's path is the
    /// BUILD file the statements belong in.
    pub fn build_file(&self, pkg: &Package) -> BuildFile {
        let mut file = BuildFile::new(pkg.dir.join("BUILD"));
        let mut kinds = Vec::new();

        let srcs = pkg.srcs.union(&pkg.cgo_srcs);
        let own_label = self.own_label(pkg);
        let is_binary = pkg.name == "main";

        let mut library_rule = None;
        if !srcs.is_empty() {
            let (kind, name) = if is_binary {
                (
                    "go_binary",
                    default_name_for(&pkg.dir, self.repo_root, self.go_prefix),
                )
            } else {
                ("go_library", DEFAULT_LIBRARY_NAME.to_string())
            };
            kinds.push(kind);
            let mut rule = Expr::call(
                Expr::ident(kind),
                vec![Expr::key_value(Expr::ident("name"), Expr::string(name))],
            );
            if let Some(srcs) = platform_strings_expr(&srcs) {
                rule.set_attr("srcs", srcs);
            }
            if pkg.has_cgo {
                rule.set_attr("cgo", Expr::ident("True"));
            }
            if let Some(deps) = platform_strings_expr(&self.dep_labels(&pkg.imports, &own_label))
            {
                rule.set_attr("deps", deps);
            }
            rule.set_attr(
                "visibility",
                Expr::list(vec![Expr::string("//visibility:public")]),
            );
            library_rule = Some(rule);
        }

        let mut test_rule = None;
        if !pkg.test_srcs.is_empty() {
            kinds.push("go_test");
            let mut rule = Expr::call(
                Expr::ident("go_test"),
                vec![Expr::key_value(
                    Expr::ident("name"),
                    Expr::string(DEFAULT_TEST_NAME),
                )],
            );
            if let Some(srcs) = platform_strings_expr(&pkg.test_srcs) {
                rule.set_attr("srcs", srcs);
            }
            if library_rule.is_some() && !is_binary {
                rule.set_attr("library", Expr::string(format!(":{DEFAULT_LIBRARY_NAME}")));
            }
            if let Some(deps) =
                platform_strings_expr(&self.dep_labels(&pkg.test_imports, &own_label))
            {
                rule.set_attr("deps", deps);
            }
            test_rule = Some(rule);
        }

        if !kinds.is_empty() {
            kinds.sort_unstable();
            let mut args = vec![Expr::string(RULES_GO_DEF)];
            args.extend(kinds.into_iter().map(Expr::string));
            file.stmts.push(Expr::call(Expr::ident("load"), args));
        }
        file.stmts.extend(library_rule);
        file.stmts.extend(test_rule);
        file
    }

    /// Label other packages would use to depend on this one
    fn own_label(&self, pkg: &Package) -> String {
        match self.relative_label_path(&pkg.dir) {
            Some(rel) if !rel.is_empty() => format!("//{rel}:{DEFAULT_LIBRARY_NAME}"),
            _ => format!("//:{DEFAULT_LIBRARY_NAME}"),
        }
    }

    fn relative_label_path(&self, dir: &Path) -> Option<String> {
        let rel = dir.strip_prefix(self.repo_root).ok()?;
        let parts: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(parts.join("/"))
    }

    /// Map an import path to a dependency label. Imports outside the Go
    /// prefix resolve to `None`: cross-repository resolution is out of
    /// scope.
    fn import_label(&self, import: &str) -> Option<String> {
        if import == self.go_prefix {
            return Some(format!("//:{DEFAULT_LIBRARY_NAME}"));
        }
        let rest = import.strip_prefix(self.go_prefix)?.strip_prefix('/')?;
        Some(format!("//{rest}:{DEFAULT_LIBRARY_NAME}"))
    }

    /// Resolve an import set to sorted, deduplicated dependency labels,
    /// dropping self-references
    fn dep_labels(&self, imports: &PlatformStrings, own_label: &str) -> PlatformStrings {
        let map = |values: &[String]| -> Vec<String> {
            let mut labels: Vec<String> = values
                .iter()
                .filter_map(|import| self.import_label(import))
                .filter(|label| label != own_label)
                .collect();
            labels.sort();
            labels.dedup();
            labels
        };
        let mut deps = PlatformStrings {
            generic: map(&imports.generic),
            ..PlatformStrings::default()
        };
        for (platform, values) in &imports.platform {
            let labels = map(values);
            if !labels.is_empty() {
                deps.platform.insert(platform.clone(), labels);
            }
        }
        deps
    }
}

/// Build the attribute expression for a platform-split string set: a plain
/// list, a `select` over per-platform lists (with an empty default case),
/// or the `list + select(dict)` union of both.
fn platform_strings_expr(ps: &PlatformStrings) -> Option<Expr> {
    let list = if ps.generic.is_empty() {
        None
    } else {
        Some(Expr::list(
            ps.generic.iter().map(|s| Expr::string(s.as_str())).collect(),
        ))
    };

    let mut entries: Vec<Expr> = ps
        .platform
        .iter()
        .filter(|(_, values)| !values.is_empty())
        .map(|(platform, values)| {
            Expr::key_value(
                Expr::string(platform.condition_label()),
                Expr::list(values.iter().map(|s| Expr::string(s.as_str())).collect()),
            )
        })
        .collect();

    let select = if entries.is_empty() {
        None
    } else {
        entries.push(Expr::key_value(
            Expr::string(DEFAULT_CONDITION),
            Expr::list(Vec::new()),
        ));
        Some(Expr::call(Expr::ident("select"), vec![Expr::dict(entries)]))
    };

    match (list, select) {
        (None, select) => select,
        (list, None) => list,
        (Some(mut list), Some(select)) => {
            if let crate::bzl::ast::ExprKind::List {
                force_multiline, ..
            } = &mut list.kind
            {
                *force_multiline = true;
            }
            Some(Expr::binary("+", list, select))
        }
    }
}
