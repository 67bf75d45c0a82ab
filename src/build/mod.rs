mod cache;
mod pages;
mod previews;
mod utils;

#[cfg(test)]
mod tests;

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use time::OffsetDateTime;

use crate::config::{CONFIG_FILE, Config};
use crate::content::{Article, discover_articles};
use crate::dates::DateCanon;
use crate::og::{FontAssets, OgRenderer, OgTemplate};
use crate::search::{IndexContext, build_index};
use crate::stats::build_stats;
use crate::tags::ConfiguredGlyphs;

use cache::{BuildCache, OG_PREFIX, PAGE_PREFIX};
use pages::render_pages;
use previews::{PreviewSettings, plan_previews, render_previews};
use utils::{compute_cache_digest, remove_stale_file, write_output};

pub use utils::{log_status, remove_dir_if_exists};

pub const OUTPUT_DIR: &str = "dist";
pub const CONTENT_DIR: &str = "content";
pub const STATE_DIR: &str = ".penmark";
pub(super) const CACHE_DIR: &str = ".penmark/cache";

#[derive(Clone, Copy, Debug, Default)]
pub struct BuildPlan {
    pub include_drafts: bool,
    pub force: bool,
    pub verbose: bool,
}

#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct BuildSummary {
    pub articles: usize,
    pub pages_rendered: usize,
    pub tweet_embeds: usize,
    pub search_items: usize,
    pub previews_rendered: usize,
    pub previews_unchanged: usize,
    pub stale_removed: usize,
}

/// Loads `penmark.yaml` and the card fonts, then builds every artifact into
/// `dist/`. Missing fonts abort before any content is read.
pub fn build_site(root: &Path, plan: BuildPlan) -> Result<BuildSummary> {
    build_project(root, plan, OffsetDateTime::now_utc(), |config| {
        let fonts = FontAssets::load(
            &root.join(&config.og.regular_font),
            &root.join(&config.og.bold_font),
            &config.og.font_family,
        )?;
        log_status(
            plan.verbose,
            "FONTS",
            format!(
                "Loaded {} / {}",
                fonts.family_for(400),
                fonts.family_for(700)
            ),
        );
        Ok(OgRenderer::with_default_engines(
            Arc::new(fonts),
            og_template(config),
        ))
    })
}

/// Loads and validates `penmark.yaml`, asks `make_renderer` for the card
/// renderer, then runs the pipeline.
pub fn build_project<F>(
    root: &Path,
    plan: BuildPlan,
    started: OffsetDateTime,
    make_renderer: F,
) -> Result<BuildSummary>
where
    F: FnOnce(&Config) -> Result<OgRenderer>,
{
    let config = Config::load(root.join(CONFIG_FILE))?;
    let renderer = make_renderer(&config)?;
    build_with_renderer(root, &config, &renderer, plan, started)
}

pub fn og_template(config: &Config) -> OgTemplate {
    OgTemplate {
        site_title: config.title.clone(),
        category_label: config.og.category_label.clone(),
        font_family: config.og.font_family.clone(),
    }
}

/// Runs the pipeline with an already constructed card renderer. `started`
/// stands in for undated articles and anchors the stats windows.
pub fn build_with_renderer(
    root: &Path,
    config: &Config,
    renderer: &OgRenderer,
    plan: BuildPlan,
    started: OffsetDateTime,
) -> Result<BuildSummary> {
    let timer = Instant::now();
    let mut summary = BuildSummary::default();
    let include_drafts = plan.include_drafts || config.include_drafts;
    if include_drafts {
        log_status(plan.verbose, "MODE", "Including drafts");
    }
    if plan.force {
        log_status(plan.verbose, "MODE", "Ignoring preview cache");
    }

    let canon = DateCanon::from_config(config)?;
    let glyphs = ConfiguredGlyphs::new(&config.tags);
    let base_path = config.normalized_base_path();
    let output_root = root.join(OUTPUT_DIR);

    log_status(plan.verbose, "STEP", "Loading content");
    let articles = discover_articles(root.join(CONTENT_DIR), config)?;
    let visible: Vec<&Article> = articles
        .iter()
        .filter(|article| include_drafts || !article.draft)
        .collect();
    summary.articles = visible.len();
    log_status(
        plan.verbose,
        "CONTENT",
        format!(
            "{} article(s), {} hidden draft(s)",
            visible.len(),
            articles.len() - visible.len()
        ),
    );

    log_status(plan.verbose, "STEP", "Rendering pages");
    let pages = render_pages(&visible, &config.markdown.tweet_cta)?;
    summary.pages_rendered = pages.len();
    summary.tweet_embeds = pages.iter().map(|page| page.embeds).sum();

    log_status(plan.verbose, "STEP", "Building search index");
    let indexed: Vec<Article> = articles
        .iter()
        .filter(|article| article.collection == config.search.collection)
        .cloned()
        .collect();
    let index = build_index(
        &indexed,
        &IndexContext {
            canon: &canon,
            glyphs: &glyphs,
            base_path: &base_path,
            og_dir: &config.og.output_dir,
            include_drafts,
        },
    )?;
    summary.search_items = index.entries.len();
    log_status(
        plan.verbose,
        "SEARCH",
        format!(
            "{} item(s), digest {}",
            index.entries.len(),
            &index.digest[..12]
        ),
    );

    let stats = build_stats(&index.entries, canon.local_date(started), &config.stats)?;
    let stats_bytes = stats.to_json()?;
    log_status(
        plan.verbose,
        "STATS",
        format!("{} characters in the last year", stats.year_char_total),
    );

    log_status(plan.verbose, "STEP", "Rendering preview images");
    let og_root = output_root.join(&config.og.output_dir);
    let cache = BuildCache::open(root)?;
    let template_digest = compute_cache_digest(&(&config.title, &config.og))?;
    let preview_plan = plan_previews(
        &visible,
        &PreviewSettings {
            canon: &canon,
            site_description: &config.description,
            template_digest: &template_digest,
            started,
            output_root: &og_root,
            force: plan.force,
        },
        &cache,
    )?;
    let previews = render_previews(&preview_plan.pending, renderer)?;
    summary.previews_rendered = previews.len();
    summary.previews_unchanged = preview_plan.unchanged;

    log_status(plan.verbose, "STEP", "Writing output");
    for page in &pages {
        write_output(&output_root.join(&page.relative_path), page.html.as_bytes())?;
    }
    write_output(&output_root.join(&config.search.asset_path), &index.bytes)?;
    write_output(&output_root.join(&config.stats.asset_path), &stats_bytes)?;
    for preview in &previews {
        write_output(&og_root.join(&preview.relative_path), &preview.png)?;
        cache.record(&preview.key, &preview.digest)?;
        log_status(plan.verbose, "OG", format!("Rendered {}", preview.key));
    }

    let page_keys: BTreeSet<String> = pages.iter().map(|page| page.key.clone()).collect();
    for key in &page_keys {
        cache.record_page(key)?;
    }
    let preview_keys: BTreeSet<String> = visible.iter().map(|article| article.key()).collect();
    for key in cache.prune(PAGE_PREFIX, &page_keys)? {
        if remove_stale_file(&output_root, &output_root.join(&key).join("index.html"))? {
            summary.stale_removed += 1;
            log_status(plan.verbose, "CLEAN", format!("Removed page {key}"));
        }
    }
    for key in cache.prune(OG_PREFIX, &preview_keys)? {
        if remove_stale_file(&og_root, &og_root.join(format!("{key}.png")))? {
            summary.stale_removed += 1;
            log_status(plan.verbose, "CLEAN", format!("Removed preview {key}"));
        }
    }
    cache.flush()?;

    log_status(
        plan.verbose,
        "DONE",
        format!(
            "{} page(s), {} preview(s) rendered, {} unchanged in {:.2?}",
            summary.pages_rendered,
            summary.previews_rendered,
            summary.previews_unchanged,
            timer.elapsed()
        ),
    );

    Ok(summary)
}
