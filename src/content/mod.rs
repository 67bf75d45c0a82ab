use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};
use walkdir::WalkDir;

use crate::config::{Config, parse_timezone};


const INDEX_STEM: &str = "index";

/// One content entry. Read-only to the rest of the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    pub collection: String,
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub body: String,
    pub tags: Vec<String>,
    pub date: Option<OffsetDateTime>,
    pub draft: bool,
    pub og_image: Option<String>,
    pub source_path: PathBuf,
}

impl Article {
    /// `{collection}/{id}`, the key used for URLs and generated images.
    pub fn key(&self) -> String {
        format!("{}/{}", self.collection, self.id)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FrontMatter {
    title: Option<String>,
    description: Option<String>,
    date: Option<DateValue>,
    #[serde(deserialize_with = "deserialize_string_or_list")]
    tags: Vec<String>,
    draft: bool,
    #[serde(rename = "ogImage", alias = "og_image")]
    og_image: Option<String>,
}

/// YAML turns unquoted timestamps into strings already, but bare years and
/// similar values arrive as numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DateValue {
    Text(String),
    Number(i64),
}

/// Loads every article of every configured collection under `content_root`.
///
/// Collections are returned in configuration order and articles in path
/// order within each collection; that order is the tie-breaker for sorting.
pub fn discover_articles(content_root: impl AsRef<Path>, config: &Config) -> Result<Vec<Article>> {
    let content_root = content_root.as_ref();
    if !content_root.exists() {
        bail!("content directory {} does not exist", content_root.display());
    }

    let offset = parse_timezone(&config.timezone)?;
    let mut articles = Vec::new();
    for collection in &config.collections {
        let dir = content_root.join(collection);
        if !dir.exists() {
            continue;
        }
        articles.extend(discover_collection(&dir, collection, offset)?);
    }
    Ok(articles)
}

pub fn discover_collection(dir: &Path, collection: &str, offset: UtcOffset) -> Result<Vec<Article>> {
    let mut articles = Vec::new();
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .sort_by(|left, right| left.file_name().cmp(right.file_name()));

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() || !is_markdown(entry.path()) {
            continue;
        }
        let article = load_article(dir, entry.path(), collection, offset)?;
        if articles.iter().any(|existing: &Article| existing.id == article.id) {
            bail!(
                "{}: duplicate article id '{}' in collection '{}'",
                entry.path().display(),
                article.id,
                collection
            );
        }
        articles.push(article);
    }

    Ok(articles)
}

fn load_article(
    collection_dir: &Path,
    path: &Path,
    collection: &str,
    offset: UtcOffset,
) -> Result<Article> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let (front, body) = parse_front_matter(&raw)
        .with_context(|| format!("{}: missing or invalid front matter", path.display()))?;

    let title = front
        .title
        .map(|title| title.trim().to_string())
        .filter(|title| !title.is_empty())
        .with_context(|| format!("{}: title is required", path.display()))?;

    let date = match front.date {
        Some(DateValue::Text(value)) => Some(parse_article_date(&value, offset, path)?),
        Some(DateValue::Number(value)) => Some(parse_article_date(&value.to_string(), offset, path)?),
        None => None,
    };

    let description = front
        .description
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());
    let og_image = front
        .og_image
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());

    Ok(Article {
        collection: collection.to_string(),
        id: article_id(collection_dir, path)?,
        title,
        description,
        body,
        tags: front.tags.into_iter().filter(|tag| !tag.is_empty()).collect(),
        date,
        draft: front.draft,
        og_image,
        source_path: path.to_path_buf(),
    })
}

/// `notes/hello.md` and `notes/hello/index.md` both become `notes/hello`.
fn article_id(collection_dir: &Path, path: &Path) -> Result<String> {
    let relative = path
        .strip_prefix(collection_dir)
        .with_context(|| format!("{} is outside its collection", path.display()))?;
    let mut parts = relative
        .components()
        .map(|component| {
            component
                .as_os_str()
                .to_str()
                .map(str::to_string)
                .with_context(|| format!("{}: path is not valid utf-8", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    let file = parts.pop().unwrap_or_default();
    let stem = file
        .rsplit_once('.')
        .map(|(stem, _)| stem.to_string())
        .unwrap_or(file);
    if stem != INDEX_STEM || parts.is_empty() {
        parts.push(stem);
    }

    let id = parts.join("/");
    if id.is_empty() {
        bail!("{}: article id cannot be empty", path.display());
    }
    Ok(id)
}

fn parse_article_date(value: &str, offset: UtcOffset, origin: &Path) -> Result<OffsetDateTime> {
    let value = value.trim();
    if let Ok(datetime) = OffsetDateTime::parse(value, &Rfc3339) {
        return Ok(datetime);
    }

    let naive_format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    if let Ok(datetime) = PrimitiveDateTime::parse(value, naive_format) {
        return Ok(datetime.assume_offset(offset));
    }

    if let Some((main, offset_part)) = value.rsplit_once(' ')
        && let Ok(datetime) = PrimitiveDateTime::parse(main, naive_format)
        && let Ok(explicit) = parse_timezone(offset_part)
    {
        return Ok(datetime.assume_offset(explicit));
    }

    if let Ok(date) = Date::parse(value, format_description!("[year]-[month]-[day]")) {
        return Ok(PrimitiveDateTime::new(date, Time::MIDNIGHT).assume_offset(offset));
    }

    bail!(
        "{}: date must be RFC3339, 'YYYY-MM-DD', 'YYYY-MM-DD HH:MM:SS', or 'YYYY-MM-DD HH:MM:SS ±HH:MM'",
        origin.display()
    )
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("md") || ext.eq_ignore_ascii_case("markdown"))
        .unwrap_or(false)
}

fn parse_front_matter(raw: &str) -> Result<(FrontMatter, String)> {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let mut lines = raw.lines();
    match lines.next() {
        Some(line) if line.trim() == "---" => {}
        _ => bail!("front matter must start with ---"),
    }

    let mut yaml_lines = Vec::new();
    for line in &mut lines {
        if line.trim() == "---" {
            let yaml = yaml_lines.join("\n");
            let front: FrontMatter = if yaml.trim().is_empty() {
                FrontMatter::default()
            } else {
                serde_yaml::from_str(&yaml)?
            };
            let mut body = lines.collect::<Vec<_>>().join("\n");
            if body.starts_with('\n') {
                body.remove(0);
            }
            return Ok((front, body));
        }
        yaml_lines.push(line);
    }

    bail!("front matter not terminated with ---")
}

fn deserialize_string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Value {
        Many(Vec<String>),
        One(String),
        None(serde::de::IgnoredAny),
    }

    Ok(match Value::deserialize(deserializer)? {
        Value::Many(items) => items
            .into_iter()
            .map(|item| item.trim().to_string())
            .collect(),
        Value::One(value) => split_csv(&value)
            .into_iter()
            .map(|item| item.to_string())
            .collect(),
        Value::None(_) => Vec::new(),
    })
}

fn split_csv(input: &str) -> Vec<&str> {
    input
        .split(',')
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect()
}
