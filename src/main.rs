//! Springbok CLI - BUILD file generator for Go source trees
//!
//! Usage: springbok --go-prefix example.com/repo [--mode fix|print|diff] [DIR]...
//!
//! Walks the given directories (default: the repository root), resolves one
//! buildable Go package per directory, and writes, prints, or diffs the
//! resulting BUILD files. Existing files are merged, not overwritten: user
//! edits, comments, and `# keep` values survive.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use similar::TextDiff;

use springbok::bzl::format_file;
use springbok::fs::write_atomic;
use springbok::generator::Generator;
use springbok::merger::merge_with_existing;
use springbok::packages::walk;
use springbok::platform::{BuildTags, PlatformConstraints};

/// Springbok - BUILD file generator and incremental merger for Go trees
#[derive(Parser, Debug)]
#[command(name = "springbok")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Go import path prefix of the repository (e.g. example.com/repo)
    #[arg(long)]
    go_prefix: String,

    /// Repository root directory
    #[arg(long, default_value = ".")]
    repo_root: PathBuf,

    /// Comma-separated build tags to treat as enabled
    #[arg(long, default_value = "")]
    build_tags: String,

    /// What to do with generated files
    #[arg(long, value_enum, default_value_t = Mode::Fix)]
    mode: Mode,

    /// Directories to process (default: the repository root)
    dirs: Vec<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Mode {
    /// Write merged BUILD files in place
    Fix,
    /// Print merged BUILD files to stdout
    Print,
    /// Show unified diffs of what fix would change
    Diff,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let repo_root = cli
        .repo_root
        .canonicalize()
        .with_context(|| format!("repo root {} not accessible", cli.repo_root.display()))?;
    let tags = BuildTags::from_list(&cli.build_tags);
    let platforms = PlatformConstraints::default();
    let generator = Generator::new(&repo_root, &cli.go_prefix);

    let dirs = if cli.dirs.is_empty() {
        vec![repo_root.clone()]
    } else {
        cli.dirs.clone()
    };

    for dir in &dirs {
        let dir = dir
            .canonicalize()
            .with_context(|| format!("directory {} not accessible", dir.display()))?;
        walk(
            &tags,
            &platforms,
            &repo_root,
            &cli.go_prefix,
            &dir,
            &mut |pkg| {
                if let Err(err) = process_package(&generator, &pkg, cli.mode) {
                    log::error!("{}: {err}", pkg.dir.display());
                }
            },
        );
    }

    Ok(())
}

fn process_package(
    generator: &Generator,
    pkg: &springbok::packages::Package,
    mode: Mode,
) -> Result<()> {
    let gen = generator.build_file(pkg);
    let build_path = pkg.dir.join("BUILD");

    let (old_text, merged) = if build_path.exists() {
        let old_text = std::fs::read_to_string(&build_path)?;
        match merge_with_existing(&gen, &build_path)? {
            Some(merged) => (old_text, merged),
            None => {
                log::debug!("{}: ignored", build_path.display());
                return Ok(());
            }
        }
    } else {
        (String::new(), gen)
    };

    let new_text = format_file(&merged);
    match mode {
        Mode::Fix => {
            if new_text != old_text {
                write_atomic(&build_path, &new_text)?;
            }
        }
        Mode::Print => {
            print!("{new_text}");
        }
        Mode::Diff => {
            if new_text != old_text {
                print_diff(&build_path, &old_text, &new_text);
            }
        }
    }
    Ok(())
}

fn print_diff(path: &Path, old: &str, new: &str) {
    let diff = TextDiff::from_lines(old, new);
    print!(
        "{}",
        diff.unified_diff()
            .context_radius(3)
            .header(
                &format!("a/{}", path.display()),
                &format!("b/{}", path.display())
            )
    );
}
