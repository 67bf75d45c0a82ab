use std::env;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::InitArgs;
use penmark::build::CONTENT_DIR;
use penmark::config::{CONFIG_FILE, Config, is_project_root};

use super::expand_tilde;

const SAMPLE_ARTICLE: &str = r#"---
title: "Hello from penmark"
description: "A first article to check the pipeline."
date: "2024-01-01T09:00:00+09:00"
tags:
  - welcome
---

This is the starter article. Edit it or drop in your own Markdown files.

https://x.com/jack/status/20
"#;

pub fn run_init_command(args: InitArgs) -> Result<()> {
    let root = match args.root.as_deref() {
        Some(value) => expand_tilde(value),
        None => env::current_dir().context("failed to resolve current directory")?,
    };

    initialise(&root)?;

    let config = Config::load(root.join(CONFIG_FILE))?;
    println!("Initialized {}", root.display());
    for font in [&config.og.regular_font, &config.og.bold_font] {
        if !root.join(font).is_file() {
            println!("Place a font file at {font} before running `penmark build`.");
        }
    }
    Ok(())
}

fn initialise(root: &Path) -> Result<()> {
    let config_path = root.join(CONFIG_FILE);
    let config = if is_project_root(root) {
        Config::load(&config_path)?
    } else {
        fs::create_dir_all(root)
            .with_context(|| format!("failed to create {}", root.display()))?;
        let config = Config::default();
        config.save(&config_path)?;
        config
    };

    for collection in &config.collections {
        create_directory(&root.join(CONTENT_DIR).join(collection))?;
    }
    if let Some(fonts) = root.join(&config.og.regular_font).parent() {
        create_directory(fonts)?;
    }

    if let Some(first) = config.collections.first() {
        let sample = root.join(CONTENT_DIR).join(first).join("hello.md");
        if !sample.exists() {
            fs::write(&sample, SAMPLE_ARTICLE)
                .with_context(|| format!("failed to write {}", sample.display()))?;
        }
    }
    Ok(())
}

fn create_directory(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory {}", path.display()))?;
    }
    Ok(())
}
