//! Merging generated rules into existing BUILD files
//!
//! The merger reconciles a freshly generated file AST with the file already
//! on disk: auto-derived content is replaced, while user edits survive.
//! Comments ride along untouched, values carrying a `# keep` suffix comment
//! are never removed, and a `# springbok:ignore` comment anywhere at the
//! top level leaves the whole file alone. Merging is deterministic and
//! idempotent.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use crate::bzl::ast::{BuildFile, Expr, ExprKind};
use crate::bzl::parse::parse_file;
use crate::error::{SpringbokError, SpringbokResult};

/// Comment marker that tells springbok not to touch a BUILD file
pub const IGNORE_MARKER: &str = "springbok:ignore";

/// Suffix-comment marker that preserves a value across merges
pub const KEEP_MARKER: &str = "keep";

/// The `select` condition key that always sorts last and is always retained
pub const DEFAULT_CONDITION: &str = "//conditions:default";

/// Attributes eligible for structural merging. Everything else on an
/// existing rule is the user's domain and passes through verbatim.
const MERGEABLE_ATTRS: &[&str] = &["srcs", "deps", "library"];

/// Merge `gen` with the existing BUILD file at `existing_path`.
///
/// Returns `Ok(None)` when the existing file carries the ignore marker: the
/// file must be left untouched and no output produced. IO and parse errors
/// are returned to the caller, which logs them and skips the file.
pub fn merge_with_existing(
    gen: &BuildFile,
    existing_path: &Path,
) -> SpringbokResult<Option<BuildFile>> {
    let old = parse_file(existing_path)?;
    if should_ignore(&old) {
        return Ok(None);
    }
    Ok(Some(merge_files(gen, old)))
}

/// Merge generated statements into a parsed existing file.
///
/// Each generated statement replaces its match in place (by rule kind and
/// name, or by load path); statements without a match are appended after
/// all existing ones, in generated order.
pub fn merge_files(gen: &BuildFile, mut old: BuildFile) -> BuildFile {
    let mut appended = Vec::new();
    for stmt in &gen.stmts {
        if !stmt.is_call() {
            // The generator only emits calls; anything else is a bug here,
            // not a user-facing condition.
            panic!(
                "generated statement in {} is not a rule call: {:?}",
                gen.path.display(),
                stmt.kind
            );
        }
        let Some(i) = match_stmt(&old, stmt) else {
            appended.push(stmt.clone());
            continue;
        };
        let old_stmt = old.stmts[i].clone();
        let merged = if old_stmt.rule_kind() == Some("load") {
            merge_load(stmt, &old_stmt, &old)
        } else {
            merge_rule(stmt, &old_stmt)
        };
        old.stmts[i] = merged;
    }
    old.stmts.extend(appended);
    old
}

/// Merge two rules of the same kind and name.
///
/// Unnamed leading positional arguments of the existing rule are copied
/// through without merging. Attributes outside the mergeable allowlist, and
/// attributes whose argument carries a `# keep` suffix comment, are copied
/// verbatim, comments included. The rest go through `merge_expr`; a shape
/// mismatch falls back to the generated value, and a merge that produces
/// nothing drops the attribute.
pub fn merge_rule(gen: &Expr, old: &Expr) -> Expr {
    let old_args = match &old.kind {
        ExprKind::Call { args, .. } => args,
        _ => unreachable!("merge_rule called on non-call"),
    };

    let mut merged_args: Vec<Expr> = Vec::new();
    for arg in old_args {
        let (key, old_value) = match &arg.kind {
            ExprKind::KeyValue { key, value } => match key.as_ident() {
                Some(name) => (name, value.as_ref()),
                None => {
                    merged_args.push(arg.clone());
                    continue;
                }
            },
            // Positional arguments pass through unmerged.
            _ => {
                merged_args.push(arg.clone());
                continue;
            }
        };
        // The keep marker on an attribute rides on the `key = value`
        // argument node, not on the value expression inside it.
        if !MERGEABLE_ATTRS.contains(&key) || should_keep(arg) {
            merged_args.push(arg.clone());
            continue;
        }
        let merged_value = match merge_expr(gen.attr(key), Some(old_value)) {
            Ok(value) => value,
            Err(_) => gen.attr(key).cloned(),
        };
        if let Some(value) = merged_value {
            // Keep the existing attribute's comment envelope.
            let mut def = arg.clone();
            if let ExprKind::KeyValue {
                value: def_value, ..
            } = &mut def.kind
            {
                *def_value = Box::new(value);
            }
            merged_args.push(def);
        }
    }

    for key in gen.attr_keys() {
        let already = merged_args.iter().any(|arg| match &arg.kind {
            ExprKind::KeyValue { key: k, .. } => k.as_ident() == Some(key),
            _ => false,
        });
        if !already {
            if let Some(def) = gen.attr_def(key) {
                merged_args.push(def.clone());
            }
        }
    }

    let func = match &old.kind {
        ExprKind::Call { func, .. } => func.clone(),
        _ => unreachable!(),
    };
    Expr {
        kind: ExprKind::Call {
            func,
            args: merged_args,
        },
        comments: old.comments.clone(),
    }
}

/// Merge one generated attribute expression with the existing one.
///
/// Recognized shapes on either side: nothing, a string, a list, a
/// `select(dict)` call, or `list + select(dict)`. Anything else is a shape
/// error; the caller degrades to the generated value.
pub fn merge_expr(gen: Option<&Expr>, old: Option<&Expr>) -> SpringbokResult<Option<Expr>> {
    if let Some(gen) = gen {
        if gen.as_string().is_some() {
            if let Some(old) = old {
                if should_keep(old) {
                    return Ok(Some(old.clone()));
                }
            }
            return Ok(Some(gen.clone()));
        }
    }

    let (gen_list, gen_dict) = expr_list_and_dict(gen)?;
    let (old_list, old_dict) = expr_list_and_dict(old)?;

    let merged_list = merge_list(gen_list, old_list);
    let merged_dict = merge_dict(gen_dict, old_dict)?;
    let merged_select =
        merged_dict.map(|dict| Expr::call(Expr::ident("select"), vec![dict]));

    match (merged_list, merged_select) {
        (None, select) => Ok(select),
        (list, None) => Ok(list),
        (Some(mut list), Some(select)) => {
            if let ExprKind::List {
                force_multiline, ..
            } = &mut list.kind
            {
                *force_multiline = true;
            }
            Ok(Some(Expr::binary("+", list, select)))
        }
    }
}

/// Decompose an expression into its optional list part and optional
/// select-dict part
fn expr_list_and_dict(expr: Option<&Expr>) -> SpringbokResult<(Option<&Expr>, Option<&Expr>)> {
    let Some(expr) = expr else {
        return Ok((None, None));
    };
    match &expr.kind {
        ExprKind::List { .. } => Ok((Some(expr), None)),
        ExprKind::Call { .. } => match select_dict(expr) {
            Some(dict) => Ok((None, Some(dict))),
            None => Err(SpringbokError::ExprShape { detail: None }),
        },
        ExprKind::Binary { op, lhs, rhs } => {
            if op != "+" {
                return Err(SpringbokError::expr_shape(format!(
                    "unknown operator: {op}"
                )));
            }
            if !matches!(lhs.kind, ExprKind::List { .. }) {
                return Err(SpringbokError::expr_shape("left operand not a list"));
            }
            let dict = select_dict(rhs).ok_or_else(|| {
                SpringbokError::expr_shape("right operand not a call to select with a dict")
            })?;
            Ok((Some(lhs.as_ref()), Some(dict)))
        }
        _ => Err(SpringbokError::ExprShape { detail: None }),
    }
}

/// The dict argument of a `select({...})` call, if the call has that shape
fn select_dict(expr: &Expr) -> Option<&Expr> {
    match &expr.kind {
        ExprKind::Call { func, args }
            if func.as_ident() == Some("select") && args.len() == 1 =>
        {
            match &args[0].kind {
                ExprKind::Dict { .. } => Some(&args[0]),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Merge two lists. Existing elements marked `# keep` come first, in their
/// original order; generated elements follow, minus any whose string value
/// duplicates a kept element. An empty result is `None` (attribute omitted).
fn merge_list(gen: Option<&Expr>, old: Option<&Expr>) -> Option<Expr> {
    let Some(old) = old else {
        return gen.cloned();
    };
    let old_items = list_items(old);
    let gen_items = gen.map(list_items).unwrap_or_default();

    let mut merged = Vec::new();
    let mut kept: HashSet<&str> = HashSet::new();
    for item in old_items {
        if should_keep(item) {
            merged.push(item.clone());
            if let Some(s) = item.as_string() {
                kept.insert(s);
            }
        }
    }
    for item in gen_items {
        if let Some(s) = item.as_string() {
            if kept.contains(s) {
                continue;
            }
        }
        merged.push(item.clone());
    }

    if merged.is_empty() {
        None
    } else {
        Some(Expr::list(merged))
    }
}

fn list_items(expr: &Expr) -> &[Expr] {
    match &expr.kind {
        ExprKind::List { items, .. } => items,
        _ => &[],
    }
}

struct DictEntry {
    key: String,
    old_value: Option<Expr>,
    gen_value: Option<Expr>,
    merged_value: Option<Expr>,
}

/// Merge two select dictionaries over the union of their condition keys.
///
/// Per-key values merge with `merge_list`. The default case is always
/// retained (coerced to an empty list if needed) and always sorts last;
/// other keys sort lexicographically. A dictionary that ends up with no
/// non-default keys and an empty (or absent) default collapses to `None`.
fn merge_dict(gen: Option<&Expr>, old: Option<&Expr>) -> SpringbokResult<Option<Expr>> {
    let Some(old) = old else {
        return Ok(gen.cloned());
    };

    let mut entries: Vec<DictEntry> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for kv in dict_entries(old) {
        let (key, value) = dict_entry_key_value(kv)?;
        if index.contains_key(&key) {
            return Err(SpringbokError::DuplicateDictKey { key });
        }
        index.insert(key.clone(), entries.len());
        entries.push(DictEntry {
            key,
            old_value: Some(value.clone()),
            gen_value: None,
            merged_value: None,
        });
    }
    for kv in gen.map(dict_entries).unwrap_or_default() {
        let (key, value) = dict_entry_key_value(kv)?;
        match index.get(&key) {
            Some(&i) => {
                if entries[i].gen_value.is_some() {
                    return Err(SpringbokError::DuplicateDictKey { key });
                }
                entries[i].gen_value = Some(value.clone());
            }
            None => {
                index.insert(key.clone(), entries.len());
                entries.push(DictEntry {
                    key,
                    old_value: None,
                    gen_value: Some(value.clone()),
                    merged_value: None,
                });
            }
        }
    }

    let mut keys: Vec<String> = Vec::new();
    let mut have_default = false;
    for entry in &mut entries {
        entry.merged_value = merge_list(entry.gen_value.as_ref(), entry.old_value.as_ref());
        if entry.key == DEFAULT_CONDITION {
            have_default = true;
            if entry.merged_value.is_none() {
                entry.merged_value = Some(Expr::list(Vec::new()));
            }
        } else if entry.merged_value.is_some() {
            keys.push(entry.key.clone());
        }
    }

    if keys.is_empty() {
        let default_empty = entries
            .iter()
            .find(|e| e.key == DEFAULT_CONDITION)
            .map(|e| {
                e.merged_value
                    .as_ref()
                    .map(|v| list_items(v).is_empty())
                    .unwrap_or(true)
            })
            .unwrap_or(true);
        if !have_default || default_empty {
            return Ok(None);
        }
    }
    keys.sort();
    if have_default {
        keys.push(DEFAULT_CONDITION.to_string());
    }

    let merged_entries = keys
        .iter()
        .filter_map(|key| {
            let i = index[key];
            let value = entries[i].merged_value.take()?;
            Some(Expr::key_value(Expr::string(key.clone()), value))
        })
        .collect();
    Ok(Some(Expr::dict(merged_entries)))
}

fn dict_entries(expr: &Expr) -> &[Expr] {
    match &expr.kind {
        ExprKind::Dict { entries } => entries,
        _ => &[],
    }
}

fn dict_entry_key_value(entry: &Expr) -> SpringbokResult<(String, &Expr)> {
    let ExprKind::KeyValue { key, value } = &entry.kind else {
        return Err(SpringbokError::MalformedDictEntry {
            message: format!("entry was not a key-value pair: {:?}", entry.kind),
        });
    };
    let Some(key) = key.as_string() else {
        return Err(SpringbokError::MalformedDictEntry {
            message: format!("key was not a string: {:?}", key.kind),
        });
    };
    if !matches!(value.kind, ExprKind::List { .. }) {
        return Err(SpringbokError::MalformedDictEntry {
            message: format!("value was not a list: {:?}", value.kind),
        });
    }
    Ok((key.to_string(), value))
}

/// Merge two load statements of the same path: all generated symbols, plus
/// existing symbols still referenced by some rule in the file. Unused
/// existing symbols are pruned. Symbols sort ascending; the path stays put.
pub fn merge_load(gen: &Expr, old: &Expr, old_file: &BuildFile) -> Expr {
    let gen_args = call_args(gen);
    let old_args = call_args(old);

    let mut symbols: BTreeMap<String, Expr> = BTreeMap::new();
    for arg in gen_args.iter().skip(1) {
        if let Some(s) = arg.as_string() {
            symbols.insert(s.to_string(), arg.clone());
        }
    }
    for arg in old_args.iter().skip(1) {
        if let Some(s) = arg.as_string() {
            if !symbols.contains_key(s) && old_file.has_rule_kind(s) {
                symbols.insert(s.to_string(), arg.clone());
            }
        }
    }

    let mut args: Vec<Expr> = Vec::with_capacity(symbols.len() + 1);
    if let Some(path) = old_args.first() {
        args.push(path.clone());
    }
    args.extend(symbols.into_values());

    Expr {
        kind: ExprKind::Call {
            func: Box::new(Expr::ident("load")),
            args,
        },
        comments: old.comments.clone(),
    }
}

fn call_args(expr: &Expr) -> &[Expr] {
    match &expr.kind {
        ExprKind::Call { args, .. } => args,
        _ => &[],
    }
}

/// Find the existing statement a generated one replaces: load statements
/// match on their path, rules on (kind, name).
fn match_stmt(old: &BuildFile, gen: &Expr) -> Option<usize> {
    if gen.rule_kind() == Some("load") {
        let path = call_args(gen).first()?.as_string()?;
        old.stmts.iter().position(|s| {
            s.rule_kind() == Some("load")
                && call_args(s).first().and_then(Expr::as_string) == Some(path)
        })
    } else {
        let kind = gen.rule_kind()?;
        let name = gen.rule_name();
        old.stmts
            .iter()
            .position(|s| s.rule_kind() == Some(kind) && s.rule_name() == name)
    }
}

/// Whether the ignore marker appears in a comment before or after any
/// top-level statement
pub fn should_ignore(file: &BuildFile) -> bool {
    file.stmts.iter().any(|stmt| {
        has_marker(&stmt.comments.before, IGNORE_MARKER)
            || has_marker(&stmt.comments.after, IGNORE_MARKER)
    })
}

/// Whether an existing value must be preserved: its first suffix comment
/// starts with the keep marker
pub fn should_keep(expr: &Expr) -> bool {
    expr.comments
        .suffix
        .first()
        .is_some_and(|c| c.starts_with(KEEP_MARKER))
}

fn has_marker(comments: &[String], marker: &str) -> bool {
    comments.iter().any(|c| c.starts_with(marker))
}
