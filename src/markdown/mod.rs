mod tweet;

use comrak::{Arena, Options, format_html, parse_document};

pub use tweet::{TweetRef, embed_html, embed_tweets, escape_html, normalize_url, tweet_ref};

pub struct MarkdownRender {
    pub html: String,
    pub embeds: usize,
}

/// Renders an article body to HTML, swapping bare status-link paragraphs for
/// tweet cards.
pub fn render_markdown(markdown: &str, tweet_cta: &str) -> MarkdownRender {
    let options = options();
    let arena = Arena::new();
    let root = parse_document(&arena, markdown, &options);

    let embeds = embed_tweets(&arena, root, tweet_cta);

    let mut html = String::new();
    format_html(root, &options, &mut html).expect("writing to String cannot fail");

    MarkdownRender { html, embeds }
}

fn options() -> Options<'static> {
    let mut options = Options::default();
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.strikethrough = true;
    options.extension.footnotes = true;
    options.render.hardbreaks = false;
    options.render.github_pre_lang = true;
    // Card markup is injected as raw HTML blocks.
    options.render.r#unsafe = true;
    options.render.width = 0;
    options
}

#[cfg(test)]
mod tests {
    use super::*;

    const CTA: &str = "Xで見る";

    #[test]
    fn bare_status_link_becomes_card() {
        let rendered = render_markdown("Before\n\nhttps://x.com/jdoe/status/42\n\nAfter", CTA);
        assert_eq!(rendered.embeds, 1);
        assert!(
            rendered
                .html
                .contains(r#"href="https://twitter.com/jdoe/status/42""#),
            "{}",
            rendered.html
        );
        assert!(
            rendered
                .html
                .contains(r#"<span class="twitter-card__meta">@jdoe</span>"#),
            "{}",
            rendered.html
        );
        assert!(rendered.html.contains("<p>Before</p>"), "{}", rendered.html);
        assert!(rendered.html.contains("<p>After</p>"), "{}", rendered.html);
    }

    #[test]
    fn status_link_with_trailing_text_is_untouched() {
        let rendered = render_markdown("https://x.com/jdoe/status/42 is great", CTA);
        assert_eq!(rendered.embeds, 0);
        assert!(!rendered.html.contains("twitter-card"), "{}", rendered.html);
        assert!(rendered.html.contains("<p><a href"), "{}", rendered.html);
    }

    #[test]
    fn scheme_less_text_link_is_embedded() {
        let rendered = render_markdown("twitter.com/foo/status/123", CTA);
        assert_eq!(rendered.embeds, 1);
        assert!(
            rendered
                .html
                .contains(r#"href="https://twitter.com/foo/status/123""#),
            "{}",
            rendered.html
        );
    }

    #[test]
    fn explicit_markdown_link_is_embedded() {
        let rendered = render_markdown("[tweet](https://mobile.twitter.com/i/web/status/7?s=20)", CTA);
        assert_eq!(rendered.embeds, 1);
        assert!(
            rendered
                .html
                .contains(r#"href="https://twitter.com/i/web/status/7?s=20""#),
            "{}",
            rendered.html
        );
        assert!(
            rendered
                .html
                .contains(r#"<span class="twitter-card__meta">X</span>"#),
            "{}",
            rendered.html
        );
    }

    #[test]
    fn nested_paragraphs_are_visited() {
        let markdown = "> https://x.com/a/status/1\n\n- item\n\n  https://x.com/b/status/2\n";
        let rendered = render_markdown(markdown, CTA);
        assert_eq!(rendered.embeds, 2, "{}", rendered.html);
        assert!(rendered.html.contains("<blockquote>"), "{}", rendered.html);
    }

    #[test]
    fn non_status_links_render_normally() {
        let rendered = render_markdown("https://twitter.com/foo", CTA);
        assert_eq!(rendered.embeds, 0);
        assert!(
            rendered
                .html
                .contains(r#"<a href="https://twitter.com/foo">"#),
            "{}",
            rendered.html
        );
    }

    #[test]
    fn renders_tables_and_code() {
        let markdown = "| h1 | h2 |\n| -- | -- |\n| a | b |\n\n```rust\nfn main() {}\n```";
        let rendered = render_markdown(markdown, CTA);
        assert!(rendered.html.contains("<table"), "{}", rendered.html);
        assert!(rendered.html.contains("lang=\"rust\""), "{}", rendered.html);
    }
}
