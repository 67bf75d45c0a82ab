use std::cell::RefCell;

use comrak::Arena;
use comrak::arena_tree::Node;
use comrak::nodes::{Ast, AstNode, NodeHtmlBlock, NodeValue};
use url::Url;

const TWITTER_HOSTS: &[&str] = &[
    "twitter.com",
    "www.twitter.com",
    "mobile.twitter.com",
    "x.com",
    "www.x.com",
];
const CANONICAL_BASE: &str = "https://twitter.com/";
const FALLBACK_LABEL: &str = "X";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TweetRef {
    pub normalized_url: String,
    pub user: Option<String>,
}

impl TweetRef {
    pub fn label(&self) -> String {
        match &self.user {
            Some(user) => format!("@{user}"),
            None => FALLBACK_LABEL.to_string(),
        }
    }
}

/// Canonicalizes a status URL onto `https://twitter.com/`.
///
/// Returns `None` for anything that is not a single status on a known host;
/// that is the "leave the paragraph alone" signal, not an error.
pub fn normalize_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let lower = trimmed.to_ascii_lowercase();
    let with_scheme = if lower.starts_with("http://") || lower.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let url = Url::parse(&with_scheme).ok()?;
    let host = url.host_str()?;
    if !TWITTER_HOSTS.contains(&host) {
        return None;
    }

    let segments = path_segments(&url);
    let path = match status_shape(&segments)? {
        (Some(user), id) => format!("{user}/status/{id}"),
        (None, id) => format!("i/web/status/{id}"),
    };

    let mut normalized = format!("{CANONICAL_BASE}{path}");
    if let Some(query) = url.query().filter(|query| !query.is_empty()) {
        normalized.push('?');
        normalized.push_str(query);
    }
    Some(normalized)
}

/// Splits a canonical URL back into its parts for labelling.
pub fn tweet_ref(normalized_url: &str) -> TweetRef {
    let user = Url::parse(normalized_url)
        .ok()
        .and_then(|url| {
            let segments = path_segments(&url);
            status_shape(&segments).and_then(|(user, _)| user.map(str::to_string))
        });

    TweetRef {
        normalized_url: normalized_url.to_string(),
        user,
    }
}

fn path_segments(url: &Url) -> Vec<&str> {
    url.path_segments()
        .map(|segments| segments.filter(|part| !part.is_empty()).collect())
        .unwrap_or_default()
}

/// `{user}/status/{id}` or `i/web/status/{id}`, trailing segments ignored.
fn status_shape<'s>(segments: &[&'s str]) -> Option<(Option<&'s str>, &'s str)> {
    match segments {
        [user, "status", id, ..] if is_numeric(id) => Some((Some(*user), *id)),
        ["i", "web", "status", id, ..] if is_numeric(id) => Some((None, *id)),
        _ => None,
    }
}

fn is_numeric(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|byte| byte.is_ascii_digit())
}

/// Escapes text for HTML and SVG, in element content or quoted attributes.
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// The card fragment. Every interpolated value is escaped here because the
/// fragment bypasses Markdown escaping.
pub fn embed_html(tweet: &TweetRef, cta: &str) -> String {
    format!(
        concat!(
            r#"<div class="twitter-card not-prose">"#,
            r#"<a class="twitter-card__link" href="{url}" rel="noopener noreferrer">"#,
            r#"<span class="twitter-card__label">Tweet</span>"#,
            r#"<span class="twitter-card__meta">{label}</span>"#,
            r#"<span class="twitter-card__cta">{cta}</span>"#,
            r#"</a></div>"#
        ),
        url = escape_html(&tweet.normalized_url),
        label = escape_html(&tweet.label()),
        cta = escape_html(cta),
    )
}

/// Replaces every qualifying paragraph under `root` with a raw HTML card and
/// returns how many were replaced.
///
/// Matches are collected in document order before any node is touched, so
/// the tree is never mutated while it is being walked.
pub fn embed_tweets<'a>(arena: &'a Arena<AstNode<'a>>, root: &'a AstNode<'a>, cta: &str) -> usize {
    let matches: Vec<(&'a AstNode<'a>, TweetRef)> = root
        .descendants()
        .filter_map(|node| paragraph_url(node).map(|url| (node, tweet_ref(&url))))
        .collect();

    for (paragraph, tweet) in &matches {
        let start = paragraph.data.borrow().sourcepos.start;
        let mut literal = embed_html(tweet, cta);
        literal.push('\n');
        let value = NodeValue::HtmlBlock(NodeHtmlBlock {
            block_type: 6,
            literal,
        });
        let card = arena.alloc(Node::new(RefCell::new(Ast::new(value, start))));
        paragraph.insert_before(card);
        paragraph.detach();
    }

    matches.len()
}

fn paragraph_url<'a>(node: &'a AstNode<'a>) -> Option<String> {
    if !matches!(node.data.borrow().value, NodeValue::Paragraph) {
        return None;
    }

    let child = node.first_child()?;
    if child.next_sibling().is_some() {
        return None;
    }

    let raw = match &child.data.borrow().value {
        NodeValue::Link(link) => link.url.to_string(),
        NodeValue::Text(literal) => {
            let text: &str = literal;
            text.to_string()
        }
        _ => return None,
    };

    normalize_url(&raw)
}
