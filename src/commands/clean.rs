use anyhow::Result;

use crate::cli::CleanArgs;
use penmark::build::{OUTPUT_DIR, STATE_DIR, remove_dir_if_exists};

use super::resolve_project_root;

pub fn run_clean_command(args: CleanArgs) -> Result<()> {
    let root = resolve_project_root(args.root.as_deref())?;

    let removed_output = remove_dir_if_exists(&root.join(OUTPUT_DIR))?;
    let removed_cache = remove_dir_if_exists(&root.join(STATE_DIR))?;

    match (removed_output, removed_cache) {
        (true, true) => println!("Removed {OUTPUT_DIR}/ output and cache state."),
        (true, false) => println!("Removed {OUTPUT_DIR}/ output (no cached state found)."),
        (false, true) => println!("No {OUTPUT_DIR}/ directory found; cleared cached state."),
        (false, false) => println!("Nothing to clean."),
    }

    Ok(())
}
