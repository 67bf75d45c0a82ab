mod build;
mod clean;
mod config;
mod init;
mod serve;

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::cli::Command;
use penmark::config::find_project_root;

pub fn run(command: Command) -> Result<()> {
    match command {
        Command::Init(args) => init::run_init_command(args),
        Command::Build(args) => build::run_build_command(args),
        Command::Serve(args) => serve::run_serve_command(args),
        Command::Clean(args) => clean::run_clean_command(args),
        Command::Config(args) => config::run_config_command(args),
    }
}

/// `--root` when given, otherwise the nearest directory holding penmark.yaml.
fn resolve_project_root(root: Option<&str>) -> Result<PathBuf> {
    match root {
        Some(value) => Ok(expand_tilde(value)),
        None => {
            let cwd = env::current_dir().context("failed to resolve current directory")?;
            find_project_root(&cwd)
        }
    }
}

fn expand_tilde(value: &str) -> PathBuf {
    let home = env::var_os("HOME").map(PathBuf::from);
    match (value.strip_prefix('~'), home) {
        (Some(""), Some(home)) => home,
        (Some(rest), Some(home)) if rest.starts_with('/') => home.join(&rest[1..]),
        _ => PathBuf::from(value),
    }
}
