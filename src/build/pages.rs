use std::path::PathBuf;

use anyhow::{Context, Result};
use rayon::prelude::*;

use crate::content::Article;
use crate::markdown::render_markdown;

#[derive(Debug)]
pub(super) struct RenderedPage {
    pub(super) key: String,
    pub(super) relative_path: PathBuf,
    pub(super) html: String,
    pub(super) embeds: usize,
}

/// Renders every article body to an HTML fragment, in input order.
pub(super) fn render_pages(articles: &[&Article], tweet_cta: &str) -> Result<Vec<RenderedPage>> {
    articles
        .par_iter()
        .map(|article| {
            let relative_path = page_path(article)
                .with_context(|| format!("{}: invalid article id", article.source_path.display()))?;
            let rendered = render_markdown(&article.body, tweet_cta);
            Ok(RenderedPage {
                key: article.key(),
                relative_path,
                html: rendered.html,
                embeds: rendered.embeds,
            })
        })
        .collect()
}

fn page_path(article: &Article) -> Option<PathBuf> {
    let mut path = PathBuf::from(&article.collection);
    for segment in article.id.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            return None;
        }
        path.push(segment);
    }
    path.push("index.html");
    Some(path)
}
