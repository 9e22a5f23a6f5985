//! Deterministic printer for BUILD files
//!
//! Output is canonical: rule calls with keyword arguments print one argument
//! per line with four-space indents, `load` calls and short comment-free
//! lists print inline, dicts always print one entry per line. Printing the
//! same AST twice yields byte-identical text.

use crate::bzl::ast::{BuildFile, Expr, ExprKind};

const INDENT: usize = 4;

/// Render a whole file, statements separated by blank lines
pub fn format_file(file: &BuildFile) -> String {
    let mut out = String::new();
    for (i, stmt) in file.stmts.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        for c in &stmt.comments.before {
            out.push_str(&format!("# {c}\n"));
        }
        out.push_str(&print_expr(stmt, 0));
        for c in &stmt.comments.suffix {
            out.push_str(&format!("  # {c}"));
        }
        out.push('\n');
        for c in &stmt.comments.after {
            out.push_str(&format!("# {c}\n"));
        }
    }
    out
}

fn pad(indent: usize) -> String {
    " ".repeat(indent)
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Render one expression. The result's first line carries no indentation
/// (the caller places it); continuation lines are indented relative to
/// `indent`.
fn print_expr(expr: &Expr, indent: usize) -> String {
    match &expr.kind {
        ExprKind::String(s) => quote(s),
        ExprKind::Ident(name) => name.clone(),
        ExprKind::List {
            items,
            force_multiline,
        } => print_list(items, *force_multiline, indent),
        ExprKind::Dict { entries } => print_elements("{", "}", entries, indent),
        ExprKind::KeyValue { key, value } => {
            let sep = match key.kind {
                ExprKind::Ident(_) => " = ",
                _ => ": ",
            };
            format!(
                "{}{}{}",
                print_expr(key, indent),
                sep,
                print_expr(value, indent)
            )
        }
        ExprKind::Call { func, args } => print_call(func, args, indent),
        ExprKind::Binary { op, lhs, rhs } => format!(
            "{} {} {}",
            print_expr(lhs, indent),
            op,
            print_expr(rhs, indent)
        ),
    }
}

fn print_list(items: &[Expr], force_multiline: bool, indent: usize) -> String {
    let inline = !force_multiline && items.len() <= 1 && items.iter().all(no_comments);
    if inline {
        match items.first() {
            None => "[]".to_string(),
            Some(item) => format!("[{}]", print_expr(item, indent)),
        }
    } else {
        print_elements("[", "]", items, indent)
    }
}

fn print_call(func: &Expr, args: &[Expr], indent: usize) -> String {
    let inline = args
        .iter()
        .all(|a| !matches!(a.kind, ExprKind::KeyValue { .. }) && no_comments(a));
    let func = print_expr(func, indent);
    if inline {
        let args: Vec<String> = args.iter().map(|a| print_expr(a, indent)).collect();
        format!("{}({})", func, args.join(", "))
    } else {
        let mut out = format!("{func}(\n");
        append_elements(&mut out, args, indent);
        out.push_str(&format!("{})", pad(indent)));
        out
    }
}

/// Multi-line bracketed sequence: one element per line, trailing commas.
fn print_elements(open: &str, close: &str, elements: &[Expr], indent: usize) -> String {
    let mut out = format!("{open}\n");
    append_elements(&mut out, elements, indent);
    out.push_str(&format!("{}{}", pad(indent), close));
    out
}

fn append_elements(out: &mut String, elements: &[Expr], indent: usize) {
    let inner = indent + INDENT;
    for element in elements {
        for c in &element.comments.before {
            out.push_str(&format!("{}# {c}\n", pad(inner)));
        }
        out.push_str(&format!("{}{},", pad(inner), print_expr(element, inner)));
        for c in &element.comments.suffix {
            out.push_str(&format!("  # {c}"));
        }
        out.push('\n');
        for c in &element.comments.after {
            out.push_str(&format!("{}# {c}\n", pad(inner)));
        }
    }
}

fn no_comments(expr: &Expr) -> bool {
    expr.comments.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bzl::parse::parse_text;
    use std::path::Path;

    #[test]
    fn test_format_rule() {
        let mut rule = Expr::call(
            Expr::ident("go_library"),
            vec![
                Expr::key_value(Expr::ident("name"), Expr::string("go_default_library")),
                Expr::key_value(
                    Expr::ident("srcs"),
                    Expr::list(vec![Expr::string("a.go"), Expr::string("b.go")]),
                ),
            ],
        );
        rule.set_attr("visibility", Expr::list(vec![Expr::string("//visibility:public")]));
        let mut file = BuildFile::new("BUILD");
        file.stmts.push(rule);

        assert_eq!(
            format_file(&file),
            r#"go_library(
    name = "go_default_library",
    srcs = [
        "a.go",
        "b.go",
    ],
    visibility = ["//visibility:public"],
)
"#
        );
    }

    #[test]
    fn test_format_load_inline() {
        let load = Expr::call(
            Expr::ident("load"),
            vec![
                Expr::string("@io_bazel_rules_go//go:def.bzl"),
                Expr::string("go_library"),
                Expr::string("go_test"),
            ],
        );
        let mut file = BuildFile::new("BUILD");
        file.stmts.push(load);
        assert_eq!(
            format_file(&file),
            "load(\"@io_bazel_rules_go//go:def.bzl\", \"go_library\", \"go_test\")\n"
        );
    }

    #[test]
    fn test_format_keeps_suffix_comments() {
        let text = r#"go_library(
    name = "go_default_library",
    deps = [
        "//a:a",
        "//b:b",  # keep
    ],
)
"#;
        let file = parse_text(Path::new("BUILD"), text).unwrap();
        assert_eq!(format_file(&file), text);
    }

    #[test]
    fn test_format_list_plus_select() {
        let text = r#"go_library(
    name = "go_default_library",
    srcs = [
        "a.go",
        "b.go",
    ] + select({
        "@io_bazel_rules_go//go/platform:linux_amd64": ["a_linux.go"],
        "//conditions:default": [],
    }),
)
"#;
        let file = parse_text(Path::new("BUILD"), text).unwrap();
        assert_eq!(format_file(&file), text);
    }

    #[test]
    fn test_format_parse_round_trip_is_stable() {
        let text = r#"# springbok:ignore
load("@io_bazel_rules_go//go:def.bzl", "go_library")

go_library(
    name = "go_default_library",
    srcs = ["a.go"],
    deps = [
        "//x:go_default_library",
        "//y:go_default_library",
    ],
)
"#;
        let once = format_file(&parse_text(Path::new("BUILD"), text).unwrap());
        let twice = format_file(&parse_text(Path::new("BUILD"), &once).unwrap());
        assert_eq!(once, text);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("a\"b\\c\n"), "\"a\\\"b\\\\c\\n\"");
    }
}
