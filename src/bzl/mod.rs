//! Comment-preserving AST for BUILD files
//!
//! The merger only needs a small subset of the language: top-level call
//! statements (`load(...)` and rule calls), string and identifier literals,
//! lists, dicts, `key = value` arguments, `key: value` dict entries, and the
//! binary `+` that joins a list with a `select` call. Comments ride on the
//! node they annotate and survive parse/merge/print round trips.

pub mod ast;
pub mod parse;
pub mod print;

pub use ast::{BuildFile, Comments, Expr, ExprKind};
pub use parse::{parse_file, parse_text};
pub use print::format_file;
