use std::env;

use anyhow::Result;

use crate::cli::BuildArgs;
use penmark::build::{BuildPlan, build_site};

use super::resolve_project_root;

pub const DRAFTS_ENV: &str = "PENMARK_INCLUDE_DRAFTS";

pub fn run_build_command(args: BuildArgs) -> Result<()> {
    let root = resolve_project_root(args.root.as_deref())?;
    let plan = BuildPlan {
        include_drafts: args.drafts || drafts_from_env(env::var(DRAFTS_ENV).ok().as_deref()),
        force: args.force,
        verbose: args.verbose,
    };

    let summary = build_site(&root, plan)?;
    println!(
        "Built {} article(s): {} search item(s), {} preview(s) rendered, {} unchanged, {} stale file(s) removed",
        summary.articles,
        summary.search_items,
        summary.previews_rendered,
        summary.previews_unchanged,
        summary.stale_removed
    );
    Ok(())
}

fn drafts_from_env(value: Option<&str>) -> bool {
    value.is_some_and(|value| {
        matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes"
        )
    })
}
