use anyhow::{Context, Result, bail};
use blake3::Hasher;
use serde::Serialize;
use url::Url;

use crate::content::Article;
use crate::dates::DateCanon;
use crate::tags::TagGlyphs;
use crate::text::compute_stats;

#[derive(Debug)]
pub struct SearchIndexArtifact {
    pub bytes: Vec<u8>,
    pub digest: String,
    pub entries: Vec<SearchEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchEntry {
    pub title: String,
    pub description: String,
    pub date: String,
    pub date_key: String,
    pub tags: Vec<String>,
    pub tags_with_emoji: Vec<String>,
    pub url: String,
    pub og_image: String,
    pub fallback_image: String,
    pub word_count: usize,
    pub char_count: usize,
    pub reading_minutes: usize,
    pub search: String,
}

#[derive(Serialize)]
struct SearchIndex<'a> {
    items: &'a [SearchEntry],
}

/// Everything the index needs besides the articles themselves.
pub struct IndexContext<'a> {
    pub canon: &'a DateCanon,
    pub glyphs: &'a dyn TagGlyphs,
    pub base_path: &'a str,
    pub og_dir: &'a str,
    pub include_drafts: bool,
}

/// Drops drafts (unless included) and orders newest first. Equal dates keep
/// their collection order.
///
/// An included article without a date fails the whole selection: a search
/// index missing entries would hide content without anyone noticing.
pub fn select_articles(articles: &[Article], include_drafts: bool) -> Result<Vec<&Article>> {
    let mut selected = Vec::with_capacity(articles.len());
    for article in articles {
        if article.draft && !include_drafts {
            continue;
        }
        if article.date.is_none() {
            bail!(
                "{}: date is required for '{}'",
                article.source_path.display(),
                article.key()
            );
        }
        selected.push(article);
    }
    selected.sort_by(|left, right| right.date.cmp(&left.date));
    Ok(selected)
}

pub fn build_entries(articles: &[Article], context: &IndexContext<'_>) -> Result<Vec<SearchEntry>> {
    select_articles(articles, context.include_drafts)?
        .into_iter()
        .map(|article| build_entry(article, context))
        .collect()
}

pub fn build_index(articles: &[Article], context: &IndexContext<'_>) -> Result<SearchIndexArtifact> {
    let entries = build_entries(articles, context)?;
    let bytes = serde_json::to_vec(&SearchIndex { items: &entries })
        .context("failed to serialize search index")?;
    let mut hasher = Hasher::new();
    hasher.update(&bytes);
    let digest = hasher.finalize().to_hex().to_string();

    Ok(SearchIndexArtifact {
        bytes,
        digest,
        entries,
    })
}

fn build_entry(article: &Article, context: &IndexContext<'_>) -> Result<SearchEntry> {
    let date = article
        .date
        .with_context(|| format!("{}: date is required", article.source_path.display()))?;
    let stats = compute_stats(&article.body);

    let generated = with_base(context.base_path, &generated_image_path(context.og_dir, article))?;
    let (og_image, fallback_image) =
        resolve_og_image(article.og_image.as_deref(), generated, context.base_path)?;

    let description = article.description.clone().unwrap_or_default();
    let search = search_text(&article.title, &description, &article.tags);

    Ok(SearchEntry {
        title: article.title.clone(),
        description,
        date: context.canon.display_date(date)?,
        date_key: context.canon.sort_key(date)?,
        tags: article.tags.clone(),
        tags_with_emoji: article
            .tags
            .iter()
            .map(|tag| context.glyphs.decorate(tag))
            .collect(),
        url: with_base(context.base_path, &article.key())?,
        og_image,
        fallback_image,
        word_count: stats.word_count,
        char_count: stats.char_count,
        reading_minutes: stats.reading_minutes,
        search,
    })
}

/// Site-relative location of the generated preview, without the base path.
pub fn generated_image_path(og_dir: &str, article: &Article) -> String {
    format!("{}/{}.png", og_dir.trim_matches('/'), article.key())
}

/// Returns `(og_image, fallback_image)`.
///
/// Absolute URLs are kept verbatim, site-relative paths are moved under the
/// base path, and a missing image falls back to the generated one.
pub fn resolve_og_image(
    declared: Option<&str>,
    generated: String,
    base_path: &str,
) -> Result<(String, String)> {
    match declared {
        None => Ok((generated.clone(), generated)),
        Some(value) if value.starts_with("http") => Ok((value.to_string(), generated)),
        Some(value) => Ok((with_base(base_path, value)?, generated)),
    }
}

/// Resolves `value` against the site base path and returns the URL path,
/// e.g. `with_base("/sub/", "/blog/a")` is `/sub/blog/a`.
pub fn with_base(base_path: &str, value: &str) -> Result<String> {
    let base = format!("/{}/", base_path.trim_matches('/')).replace("//", "/");
    let origin = Url::parse("https://example.invalid").context("failed to build base origin")?;
    let resolved = origin
        .join(&base)
        .and_then(|site| site.join(value.strip_prefix('/').unwrap_or(value)))
        .with_context(|| format!("failed to resolve '{value}' against base path '{base}'"))?;
    Ok(resolved.path().to_string())
}

fn search_text(title: &str, description: &str, tags: &[String]) -> String {
    [title, description]
        .into_iter()
        .chain(tags.iter().map(String::as_str))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
