use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use time::OffsetDateTime;

use super::cache::BuildCache;
use super::utils::compute_cache_digest;
use crate::content::Article;
use crate::dates::DateCanon;
use crate::og::OgRenderer;

/// Everything that ends up on a card; its digest keys the image cache.
#[derive(Debug, Serialize)]
struct CardInputs<'a> {
    title: &'a str,
    description: &'a str,
    date_label: String,
    template: &'a str,
}

pub(super) struct PreviewJob<'a> {
    pub(super) key: String,
    pub(super) relative_path: PathBuf,
    digest: String,
    title: &'a str,
    description: &'a str,
    date_label: String,
}

pub(super) struct RenderedPreview {
    pub(super) key: String,
    pub(super) relative_path: PathBuf,
    pub(super) digest: String,
    pub(super) png: Vec<u8>,
}

pub(super) struct PreviewPlan<'a> {
    pub(super) pending: Vec<PreviewJob<'a>>,
    pub(super) unchanged: usize,
}

pub(super) struct PreviewSettings<'a> {
    pub(super) canon: &'a DateCanon,
    pub(super) site_description: &'a str,
    pub(super) template_digest: &'a str,
    pub(super) started: OffsetDateTime,
    pub(super) output_root: &'a Path,
    pub(super) force: bool,
}

/// Works out which cards need rendering. Undated articles use the build
/// start time; articles without a description use the site description.
pub(super) fn plan_previews<'a>(
    articles: &[&'a Article],
    settings: &PreviewSettings<'a>,
    cache: &BuildCache,
) -> Result<PreviewPlan<'a>> {
    let mut pending = Vec::new();
    let mut unchanged = 0;

    for &article in articles {
        let key = article.key();
        let relative_path = PathBuf::from(format!("{key}.png"));
        let description = article
            .description
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(settings.site_description);
        let date_label = settings
            .canon
            .display_date(article.date.unwrap_or(settings.started))?;
        let digest = compute_cache_digest(&CardInputs {
            title: &article.title,
            description,
            date_label: date_label.clone(),
            template: settings.template_digest,
        })?;

        if !settings.force
            && cache.is_fresh(&key, &digest, &settings.output_root.join(&relative_path))?
        {
            unchanged += 1;
            continue;
        }

        pending.push(PreviewJob {
            key,
            relative_path,
            digest,
            title: &article.title,
            description,
            date_label,
        });
    }

    Ok(PreviewPlan { pending, unchanged })
}

pub(super) fn render_previews(
    jobs: &[PreviewJob<'_>],
    renderer: &OgRenderer,
) -> Result<Vec<RenderedPreview>> {
    jobs.par_iter()
        .map(|job| {
            let png = renderer
                .render(job.title, job.description, &job.date_label)
                .with_context(|| format!("failed to render preview image for {}", job.key))?;
            Ok(RenderedPreview {
                key: job.key.clone(),
                relative_path: job.relative_path.clone(),
                digest: job.digest.clone(),
                png,
            })
        })
        .collect()
}
