//! Expression tree for the BUILD subset springbok understands

use std::path::PathBuf;

/// Comments attached to an expression
///
/// `before` holds full-line comments above the node, `suffix` holds trailing
/// comments on the node's line, and `after` holds full-line comments that
/// follow the node without belonging to a later one. Comment text is stored
/// without the leading `#` and surrounding whitespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comments {
    pub before: Vec<String>,
    pub suffix: Vec<String>,
    pub after: Vec<String>,
}

impl Comments {
    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.suffix.is_empty() && self.after.is_empty()
    }
}

/// One expression node with its attached comments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expr {
    pub kind: ExprKind,
    pub comments: Comments,
}

/// The expression variants the merger recognizes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprKind {
    /// A quoted string literal
    String(String),
    /// A bare identifier, e.g. a rule kind or `True`
    Ident(String),
    /// `[a, b, c]`; `force_multiline` is a formatting hint only
    List {
        items: Vec<Expr>,
        force_multiline: bool,
    },
    /// `{k: v, ...}`; entries are `KeyValue` nodes
    Dict { entries: Vec<Expr> },
    /// `key = value` (call argument) or `key: value` (dict entry),
    /// distinguished by the key kind: idents print with `=`, strings with `:`
    KeyValue { key: Box<Expr>, value: Box<Expr> },
    /// `func(args...)`
    Call { func: Box<Expr>, args: Vec<Expr> },
    /// `lhs op rhs`; the only operator produced by the parser is `+`
    Binary {
        op: String,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    pub fn new(kind: ExprKind) -> Self {
        Self {
            kind,
            comments: Comments::default(),
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(ExprKind::String(value.into()))
    }

    pub fn ident(name: impl Into<String>) -> Self {
        Self::new(ExprKind::Ident(name.into()))
    }

    pub fn list(items: Vec<Expr>) -> Self {
        Self::new(ExprKind::List {
            items,
            force_multiline: false,
        })
    }

    pub fn dict(entries: Vec<Expr>) -> Self {
        Self::new(ExprKind::Dict { entries })
    }

    pub fn key_value(key: Expr, value: Expr) -> Self {
        Self::new(ExprKind::KeyValue {
            key: Box::new(key),
            value: Box::new(value),
        })
    }

    pub fn call(func: Expr, args: Vec<Expr>) -> Self {
        Self::new(ExprKind::Call {
            func: Box::new(func),
            args,
        })
    }

    pub fn binary(op: impl Into<String>, lhs: Expr, rhs: Expr) -> Self {
        Self::new(ExprKind::Binary {
            op: op.into(),
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    /// String literal value, or `None` for any other kind
    pub fn as_string(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_ident(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Ident(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_call(&self) -> bool {
        matches!(self.kind, ExprKind::Call { .. })
    }

    /// Rule kind of a call statement: the called identifier's name
    pub fn rule_kind(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Call { func, .. } => func.as_ident(),
            _ => None,
        }
    }

    /// Value of the `name` attribute of a rule call
    pub fn rule_name(&self) -> Option<&str> {
        self.attr("name")?.as_string()
    }

    /// Value of the named attribute of a rule call
    pub fn attr(&self, name: &str) -> Option<&Expr> {
        let args = match &self.kind {
            ExprKind::Call { args, .. } => args,
            _ => return None,
        };
        args.iter().find_map(|arg| match &arg.kind {
            ExprKind::KeyValue { key, value } if key.as_ident() == Some(name) => {
                Some(value.as_ref())
            }
            _ => None,
        })
    }

    /// The whole `name = value` argument node, comments included
    pub fn attr_def(&self, name: &str) -> Option<&Expr> {
        let args = match &self.kind {
            ExprKind::Call { args, .. } => args,
            _ => return None,
        };
        args.iter().find(|arg| match &arg.kind {
            ExprKind::KeyValue { key, .. } => key.as_ident() == Some(name),
            _ => false,
        })
    }

    /// Attribute names of a rule call, in argument order
    pub fn attr_keys(&self) -> Vec<&str> {
        let args = match &self.kind {
            ExprKind::Call { args, .. } => args,
            _ => return Vec::new(),
        };
        args.iter()
            .filter_map(|arg| match &arg.kind {
                ExprKind::KeyValue { key, .. } => key.as_ident(),
                _ => None,
            })
            .collect()
    }

    /// Append a `name = value` argument to a rule call.
    ///
    /// No-op on non-call expressions.
    pub fn set_attr(&mut self, name: &str, value: Expr) {
        if let ExprKind::Call { args, .. } = &mut self.kind {
            args.push(Expr::key_value(Expr::ident(name), value));
        }
    }
}

/// One parsed BUILD file: an ordered sequence of top-level statements
///
/// Statements are rule calls and `load` calls. Statement identity for
/// merging is (kind, name) for rules and the load path for loads, never the
/// position in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildFile {
    pub path: PathBuf,
    pub stmts: Vec<Expr>,
}

impl BuildFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            stmts: Vec::new(),
        }
    }

    /// Whether any rule call in the file has the given kind
    pub fn has_rule_kind(&self, kind: &str) -> bool {
        self.stmts.iter().any(|s| s.rule_kind() == Some(kind))
    }
}
