//! Plain-text extraction and reading metrics for Markdown bodies.

use std::sync::LazyLock;

use regex::Regex;

/// Characters per minute assumed when estimating reading time.
/// Not adjusted by locale.
pub const CHARS_PER_MINUTE: usize = 450;

static FENCED_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```.*?```").expect("fenced code pattern"));
static INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`[^`]*`").expect("inline code pattern"));
static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("html tag pattern"));
static IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[[^\]]*\]\([^)]*\)").expect("image pattern"));
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]\([^)]*\)").expect("link pattern"));
static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[#>*_~=\-]+").expect("punctuation pattern"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextStats {
    pub normalized_text: String,
    pub word_count: usize,
    pub char_count: usize,
    pub reading_minutes: usize,
}

/// Strips code, markup, links and Markdown punctuation, then collapses
/// whitespace. Code is removed before punctuation so its contents never
/// count as prose.
pub fn normalize(markdown: &str) -> String {
    let mut text = FENCED_CODE.replace_all(markdown, " ").into_owned();
    for pattern in [&*INLINE_CODE, &*HTML_TAG, &*IMAGE, &*LINK, &*PUNCTUATION] {
        text = pattern.replace_all(&text, " ").into_owned();
    }
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

pub fn compute_stats(markdown: &str) -> TextStats {
    let normalized_text = normalize(markdown);
    let word_count = normalized_text.split_whitespace().count();
    let char_count = normalized_text
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .count();

    TextStats {
        reading_minutes: reading_minutes(char_count),
        normalized_text,
        word_count,
        char_count,
    }
}

pub fn reading_minutes(char_count: usize) -> usize {
    let minutes = (char_count as f64 / CHARS_PER_MINUTE as f64).round() as usize;
    minutes.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_has_one_minute_and_no_words() {
        let stats = compute_stats("");
        assert_eq!(stats.normalized_text, "");
        assert_eq!(stats.word_count, 0);
        assert_eq!(stats.char_count, 0);
        assert_eq!(stats.reading_minutes, 1);
    }

    #[test]
    fn code_blocks_are_removed_before_punctuation() {
        let markdown = "Intro\n\n```rust\nlet a = b - c; // # not prose\n```\n\nOutro";
        assert_eq!(normalize(markdown), "Intro Outro");
    }

    #[test]
    fn fenced_code_is_matched_lazily() {
        let markdown = "a ```one``` b ```two``` c";
        assert_eq!(normalize(markdown), "a b c");
    }

    #[test]
    fn strips_inline_code_html_images_and_links() {
        let markdown = "Use `cargo` <b>now</b> ![logo](logo.png) see [docs](https://docs.rs).";
        assert_eq!(normalize(markdown), "Use now see .");
    }

    #[test]
    fn strips_heading_and_emphasis_markers() {
        let markdown = "# Title\n\n> quote with **bold** and _em_ ~~gone~~ == --";
        let text = normalize(markdown);
        assert_eq!(text, "Title quote with bold and em gone");
        for marker in ['#', '>', '*', '_', '~', '=', '-', '<', '`'] {
            assert!(!text.contains(marker), "{marker} survived in {text:?}");
        }
    }

    #[test]
    fn counts_words_and_non_whitespace_characters() {
        let stats = compute_stats("Hello   brave\nnew world");
        assert_eq!(stats.normalized_text, "Hello brave new world");
        assert_eq!(stats.word_count, 4);
        assert_eq!(stats.char_count, 18);
        assert!(stats.char_count <= stats.normalized_text.len());
    }

    #[test]
    fn counts_multibyte_characters_once() {
        let stats = compute_stats("日本語の文章");
        assert_eq!(stats.word_count, 1);
        assert_eq!(stats.char_count, 6);
    }

    #[test]
    fn reading_time_rounds_to_nearest_minute() {
        assert_eq!(reading_minutes(0), 1);
        assert_eq!(reading_minutes(674), 1);
        assert_eq!(reading_minutes(675), 2);
        assert_eq!(reading_minutes(1350), 3);
        let stats = compute_stats(&"字".repeat(900));
        assert_eq!(stats.reading_minutes, 2);
    }
}
