use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub const CONFIG_FILE: &str = "penmark.yaml";

/// True when `root` holds a `penmark.yaml`.
pub fn is_project_root(root: &Path) -> bool {
    root.join(CONFIG_FILE).is_file()
}

/// Nearest of `start` and its ancestors that is a project root.
pub fn find_project_root(start: impl AsRef<Path>) -> Result<PathBuf> {
    let start = start.as_ref();
    start
        .ancestors()
        .find(|dir| is_project_root(dir))
        .map(Path::to_path_buf)
        .with_context(|| {
            format!(
                "could not locate {CONFIG_FILE} in {} or any parent directory (run `penmark init` to create one)",
                start.display()
            )
        })
}

/// Next step for a project whose `dist/` is missing.
pub fn missing_output_hint(root: &Path) -> String {
    if is_project_root(root) {
        "run `penmark build` first".to_string()
    } else {
        format!(
            "{} has no {CONFIG_FILE}; run `penmark init` and `penmark build` first",
            root.display()
        )
    }
}
