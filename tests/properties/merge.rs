//! Property tests for rule merging.

use std::path::Path;

use proptest::prelude::*;

use springbok::bzl::{format_file, parse_text, BuildFile, Expr, ExprKind};
use springbok::merger::merge_files;

fn label() -> impl Strategy<Value = String> {
    proptest::string::string_regex("//[a-z][a-z0-9]{0,6}:[a-z][a-z0-9]{0,6}").unwrap()
}

/// An existing dependency list entry; `true` marks it `# keep`.
fn old_dep() -> impl Strategy<Value = (String, bool)> {
    (label(), proptest::bool::ANY)
}

fn library(srcs: &[&str], deps: Vec<Expr>) -> BuildFile {
    let rule = Expr::call(
        Expr::ident("go_library"),
        vec![
            Expr::key_value(Expr::ident("name"), Expr::string("go_default_library")),
            Expr::key_value(
                Expr::ident("srcs"),
                Expr::list(srcs.iter().map(|s| Expr::string(*s)).collect()),
            ),
            Expr::key_value(Expr::ident("deps"), Expr::list(deps)),
        ],
    );
    let mut file = BuildFile::new("BUILD");
    file.stmts.push(rule);
    file
}

fn dep_strings(file: &BuildFile) -> Vec<String> {
    let deps = match file.stmts[0].attr("deps") {
        Some(deps) => deps,
        None => return Vec::new(),
    };
    match &deps.kind {
        ExprKind::List { items, .. } => items
            .iter()
            .filter_map(|i| i.as_string())
            .map(str::to_string)
            .collect(),
        other => panic!("expected deps list, got {other:?}"),
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 96,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: every `# keep` entry of the existing list survives the
    /// merge, ahead of any generated entry, and every generated entry not
    /// shadowed by a kept one is present.
    #[test]
    fn property_merge_preserves_keeps_and_generated_values(
        old_deps in proptest::collection::vec(old_dep(), 0..=6),
        gen_deps in proptest::collection::vec(label(), 0..=6),
    ) {
        let old_exprs = old_deps
            .iter()
            .map(|(l, keep)| {
                let mut e = Expr::string(l.as_str());
                if *keep {
                    e.comments.suffix.push("keep".to_string());
                }
                e
            })
            .collect();
        let old = library(&["old.go"], old_exprs);
        let gen = library(
            &["a.go"],
            gen_deps.iter().map(|l| Expr::string(l.as_str())).collect(),
        );

        let merged = merge_files(&gen, old);
        let merged_deps = dep_strings(&merged);

        let kept: Vec<&String> = old_deps
            .iter()
            .filter(|(_, keep)| *keep)
            .map(|(l, _)| l)
            .collect();
        // Kept entries come first, in their original order.
        prop_assert!(merged_deps.len() >= kept.len());
        for (got, want) in merged_deps.iter().zip(&kept) {
            prop_assert_eq!(got, *want);
        }
        // Generated entries survive unless a kept entry already names them.
        for dep in &gen_deps {
            if !kept.iter().any(|k| *k == dep) {
                prop_assert!(merged_deps.contains(dep), "missing generated dep {dep}");
            }
        }
        // Unmarked old entries are replaced by the generated list.
        for (dep, keep) in &old_deps {
            if !keep && !gen_deps.contains(dep) && !kept.iter().any(|k| *k == dep) {
                prop_assert!(!merged_deps.contains(dep), "stale dep {dep} survived");
            }
        }
    }

    /// PROPERTY: merging the same generated file into the previous merge
    /// result changes nothing.
    #[test]
    fn property_merge_is_idempotent(
        old_deps in proptest::collection::vec(old_dep(), 0..=6),
        gen_deps in proptest::collection::vec(label(), 0..=6),
    ) {
        let old_exprs = old_deps
            .iter()
            .map(|(l, keep)| {
                let mut e = Expr::string(l.as_str());
                if *keep {
                    e.comments.suffix.push("keep".to_string());
                }
                e
            })
            .collect();
        let old = library(&["old.go"], old_exprs);
        let gen = library(
            &["a.go"],
            gen_deps.iter().map(|l| Expr::string(l.as_str())).collect(),
        );

        let once = format_file(&merge_files(&gen, old));
        let reparsed = parse_text(Path::new("BUILD"), &once)
            .expect("merge output must re-parse");
        let twice = format_file(&merge_files(&gen, reparsed));
        prop_assert_eq!(once, twice);
    }
}
