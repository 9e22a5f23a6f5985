//! Property tests for BUILD parsing and printing.

use std::path::Path;

use proptest::prelude::*;

use springbok::bzl::{format_file, parse_text, BuildFile, Expr};

fn rule_name() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[a-z][a-z0-9_]{0,15}").unwrap()
}

fn label() -> impl Strategy<Value = String> {
    proptest::string::string_regex("//[a-z][a-z0-9_]{0,8}:[a-z][a-z0-9_]{0,8}").unwrap()
}

fn source_name() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[a-z][a-z0-9_]{0,12}\\.go").unwrap()
}

fn library_rule(name: String, srcs: Vec<String>, deps: Vec<String>) -> Expr {
    Expr::call(
        Expr::ident("go_library"),
        vec![
            Expr::key_value(Expr::ident("name"), Expr::string(name)),
            Expr::key_value(
                Expr::ident("srcs"),
                Expr::list(srcs.iter().map(|s| Expr::string(s.as_str())).collect()),
            ),
            Expr::key_value(
                Expr::ident("deps"),
                Expr::list(deps.iter().map(|s| Expr::string(s.as_str())).collect()),
            ),
        ],
    )
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: the parser never panics on arbitrary input; malformed
    /// content is always reported as an error.
    #[test]
    fn property_parse_never_panics(content in "(?s).{0,512}") {
        let _ = parse_text(Path::new("BUILD"), &content);
    }

    /// PROPERTY: printed output re-parses, and printing the re-parsed tree
    /// reproduces the output byte for byte.
    #[test]
    fn property_format_parse_format_is_stable(
        name in rule_name(),
        srcs in proptest::collection::vec(source_name(), 0..=4),
        deps in proptest::collection::vec(label(), 0..=4),
    ) {
        let mut file = BuildFile::new("BUILD");
        file.stmts.push(library_rule(name, srcs, deps));

        let once = format_file(&file);
        let reparsed = parse_text(Path::new("BUILD"), &once)
            .expect("printed output must re-parse");
        let twice = format_file(&reparsed);
        prop_assert_eq!(once, twice);
    }
}
