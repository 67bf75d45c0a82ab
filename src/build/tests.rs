use super::*;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::bail;
use tempfile::TempDir;
use time::macros::datetime;

use crate::og::{Canvas, LayoutEngine, LayoutNode, RasterOptions, Rasterizer};

struct TextLayout;

impl LayoutEngine for TextLayout {
    fn layout(&self, tree: &LayoutNode, _: &FontAssets, _: Canvas) -> Result<String> {
        Ok(format!("{tree:?}"))
    }
}

struct BrokenLayout;

impl LayoutEngine for BrokenLayout {
    fn layout(&self, _: &LayoutNode, _: &FontAssets, _: Canvas) -> Result<String> {
        bail!("layout exploded")
    }
}

struct CountingRasterizer {
    calls: Arc<AtomicUsize>,
}

impl Rasterizer for CountingRasterizer {
    fn rasterize(&self, svg: &str, _: &RasterOptions) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut png = b"\x89PNG".to_vec();
        png.extend_from_slice(svg.as_bytes());
        Ok(png)
    }
}

fn fonts() -> Arc<FontAssets> {
    Arc::new(FontAssets::from_bytes(Vec::new(), Vec::new(), "OgSans"))
}

fn renderer(calls: &Arc<AtomicUsize>) -> OgRenderer {
    OgRenderer::new(
        Box::new(TextLayout),
        Box::new(CountingRasterizer {
            calls: Arc::clone(calls),
        }),
        fonts(),
        og_template(&Config::default()),
    )
}

fn write_article(root: &Path, relative: &str, front_matter: &str, body: &str) {
    let path = root.join(CONTENT_DIR).join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, format!("---\n{front_matter}\n---\n{body}")).unwrap();
}

fn seed_site(root: &Path) {
    write_article(
        root,
        "blog/hello.md",
        "title: Hello\ndescription: First post\ndate: 2024-06-10T09:00:00+09:00\ntags: [rust]",
        "Some words here.\n\nhttps://x.com/jdoe/status/42\n",
    );
    write_article(
        root,
        "blog/older.md",
        "title: Older\ndate: 2024-01-05",
        "Earlier text.",
    );
    write_article(
        root,
        "blog/secret.md",
        "title: Secret\ndate: 2024-06-01\ndraft: true",
        "Hidden.",
    );
    write_article(
        root,
        "projects/tool/index.md",
        "title: Tool\ndate: 2023-03-01",
        "A project.",
    );
}

fn started() -> OffsetDateTime {
    datetime!(2024-06-12 03:00 UTC)
}

fn build(root: &Path, renderer: &OgRenderer, plan: BuildPlan) -> Result<BuildSummary> {
    build_with_renderer(root, &Config::default(), renderer, plan, started())
}

fn search_titles(root: &Path) -> Vec<String> {
    let raw = fs::read(root.join(OUTPUT_DIR).join("search.json")).unwrap();
    let json: serde_json::Value = serde_json::from_slice(&raw).unwrap();
    json["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["title"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn build_writes_every_artifact() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    seed_site(root);
    let calls = Arc::new(AtomicUsize::new(0));

    let summary = build(root, &renderer(&calls), BuildPlan::default()).unwrap();
    assert_eq!(summary.articles, 3);
    assert_eq!(summary.pages_rendered, 3);
    assert_eq!(summary.tweet_embeds, 1);
    assert_eq!(summary.search_items, 2);
    assert_eq!(summary.previews_rendered, 3);
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    let out = root.join(OUTPUT_DIR);
    let hello = fs::read_to_string(out.join("blog/hello/index.html")).unwrap();
    assert!(hello.contains("twitter-card"), "{hello}");
    assert!(out.join("projects/tool/index.html").is_file());
    assert!(!out.join("blog/secret/index.html").exists());

    assert_eq!(search_titles(root), vec!["Hello", "Older"]);
    let stats: serde_json::Value =
        serde_json::from_slice(&fs::read(out.join("stats.json")).unwrap()).unwrap();
    assert_eq!(stats["topPosts"].as_array().unwrap().len(), 2);
    assert_eq!(stats["dailySeries"][27]["date"], "2024-06-10");
    assert_eq!(stats["dailySeries"][27]["count"], 1);

    for key in ["blog/hello", "blog/older", "projects/tool"] {
        let png = fs::read(out.join("og-image").join(format!("{key}.png"))).unwrap();
        assert!(png.starts_with(b"\x89PNG"), "{key}");
    }
    assert!(!out.join("og-image/blog/secret.png").exists());
}

#[test]
fn preview_uses_site_description_when_missing() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    seed_site(root);
    let calls = Arc::new(AtomicUsize::new(0));
    build(root, &renderer(&calls), BuildPlan::default()).unwrap();

    let png = fs::read(root.join(OUTPUT_DIR).join("og-image/blog/older.png")).unwrap();
    let text = String::from_utf8_lossy(&png);
    assert!(text.contains(&Config::default().description), "{text}");
    assert!(text.contains("2024/01/05"), "{text}");
}

#[test]
fn drafts_are_published_when_requested() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    seed_site(root);
    let calls = Arc::new(AtomicUsize::new(0));
    let plan = BuildPlan {
        include_drafts: true,
        ..BuildPlan::default()
    };

    let summary = build(root, &renderer(&calls), plan).unwrap();
    assert_eq!(summary.articles, 4);
    assert_eq!(search_titles(root), vec!["Hello", "Secret", "Older"]);
    assert!(
        root.join(OUTPUT_DIR)
            .join("og-image/blog/secret.png")
            .is_file()
    );
}

#[test]
fn unchanged_previews_are_skipped_on_rebuild() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    seed_site(root);
    let calls = Arc::new(AtomicUsize::new(0));
    let renderer = renderer(&calls);

    build(root, &renderer, BuildPlan::default()).unwrap();
    let second = build(root, &renderer, BuildPlan::default()).unwrap();
    assert_eq!(second.previews_rendered, 0);
    assert_eq!(second.previews_unchanged, 3);

    write_article(
        root,
        "blog/older.md",
        "title: Older, renamed\ndate: 2024-01-05",
        "Earlier text.",
    );
    let third = build(root, &renderer, BuildPlan::default()).unwrap();
    assert_eq!(third.previews_rendered, 1);

    let forced = build(
        root,
        &renderer,
        BuildPlan {
            force: true,
            ..BuildPlan::default()
        },
    )
    .unwrap();
    assert_eq!(forced.previews_rendered, 3);
    assert_eq!(calls.load(Ordering::SeqCst), 7);
}

#[test]
fn deleted_preview_is_rendered_again() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    seed_site(root);
    let calls = Arc::new(AtomicUsize::new(0));
    let renderer = renderer(&calls);

    build(root, &renderer, BuildPlan::default()).unwrap();
    fs::remove_file(root.join(OUTPUT_DIR).join("og-image/blog/hello.png")).unwrap();
    let rebuilt = build(root, &renderer, BuildPlan::default()).unwrap();
    assert_eq!(rebuilt.previews_rendered, 1);
}

#[test]
fn undated_blog_article_fails_before_writing() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    seed_site(root);
    write_article(root, "blog/undated.md", "title: Undated", "No date.");
    let calls = Arc::new(AtomicUsize::new(0));

    let error = build(root, &renderer(&calls), BuildPlan::default()).unwrap_err();
    assert!(format!("{error:#}").contains("date is required"), "{error:#}");
    assert!(!root.join(OUTPUT_DIR).exists());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn undated_project_uses_build_time_on_its_card() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write_article(root, "projects/wip.md", "title: WIP", "Soon.");
    let calls = Arc::new(AtomicUsize::new(0));

    build(root, &renderer(&calls), BuildPlan::default()).unwrap();
    let png = fs::read(root.join(OUTPUT_DIR).join("og-image/projects/wip.png")).unwrap();
    // 03:00 UTC is noon at the default +09:00 offset.
    assert!(String::from_utf8_lossy(&png).contains("2024/06/12"));
}

#[test]
fn layout_failure_aborts_the_build() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    seed_site(root);
    let broken = OgRenderer::new(
        Box::new(BrokenLayout),
        Box::new(CountingRasterizer {
            calls: Arc::new(AtomicUsize::new(0)),
        }),
        fonts(),
        og_template(&Config::default()),
    );

    let error = build(root, &broken, BuildPlan::default()).unwrap_err();
    assert!(format!("{error:#}").contains("layout exploded"), "{error:#}");
    assert!(!root.join(OUTPUT_DIR).join("search.json").exists());
}

#[test]
fn missing_fonts_fail_before_content_is_read() {
    let dir = TempDir::new().unwrap();
    let error = build_site(dir.path(), BuildPlan::default()).unwrap_err();
    assert!(error.to_string().contains("OG font not found"), "{error}");
}

#[test]
fn production_build_unpublishes_earlier_draft_output() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    seed_site(root);
    let calls = Arc::new(AtomicUsize::new(0));
    let renderer = renderer(&calls);
    let out = root.join(OUTPUT_DIR);

    let with_drafts = BuildPlan {
        include_drafts: true,
        ..BuildPlan::default()
    };
    build(root, &renderer, with_drafts).unwrap();
    assert!(out.join("og-image/blog/secret.png").is_file());
    assert!(out.join("blog/secret/index.html").is_file());

    let production = build(root, &renderer, BuildPlan::default()).unwrap();
    assert_eq!(production.stale_removed, 2);
    assert!(!out.join("og-image/blog/secret.png").exists());
    assert!(!out.join("blog/secret").exists());
    assert!(out.join("og-image/blog/hello.png").is_file());
    assert!(out.join("blog/hello/index.html").is_file());
    assert_eq!(search_titles(root), vec!["Hello", "Older"]);
}

#[test]
fn deleted_article_output_is_removed() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    seed_site(root);
    let calls = Arc::new(AtomicUsize::new(0));
    let renderer = renderer(&calls);
    let out = root.join(OUTPUT_DIR);

    build(root, &renderer, BuildPlan::default()).unwrap();
    fs::remove_file(root.join(CONTENT_DIR).join("projects/tool/index.md")).unwrap();
    let rebuilt = build(root, &renderer, BuildPlan::default()).unwrap();

    assert_eq!(rebuilt.stale_removed, 2);
    assert!(!out.join("projects/tool").exists());
    assert!(!out.join("og-image/projects/tool.png").exists());
    assert_eq!(rebuilt.previews_unchanged, 2);

    let again = build(root, &renderer, BuildPlan::default()).unwrap();
    assert_eq!(again.stale_removed, 0);
}

#[test]
fn build_project_reads_saved_configuration() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    seed_site(root);
    let config = Config {
        title: "Field Notes".to_string(),
        base_path: "/notes/".to_string(),
        ..Config::default()
    };
    config.save(root.join(CONFIG_FILE)).unwrap();
    let calls = Arc::new(AtomicUsize::new(0));

    let summary = build_project(root, BuildPlan::default(), started(), |loaded| {
        assert_eq!(loaded, &config);
        Ok(renderer(&calls))
    })
    .unwrap();
    assert_eq!(summary.search_items, 2);

    let raw = fs::read(root.join(OUTPUT_DIR).join("search.json")).unwrap();
    let json: serde_json::Value = serde_json::from_slice(&raw).unwrap();
    assert_eq!(json["items"][0]["url"], "/notes/blog/hello");
    assert_eq!(json["items"][0]["ogImage"], "/notes/og-image/blog/hello.png");
}

#[test]
fn build_project_loads_default_configuration_file() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    seed_site(root);
    Config::default().save(root.join(CONFIG_FILE)).unwrap();
    let calls = Arc::new(AtomicUsize::new(0));

    let summary =
        build_project(root, BuildPlan::default(), started(), |_| Ok(renderer(&calls))).unwrap();
    assert_eq!(summary.articles, 3);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[test]
fn invalid_configuration_fails_before_renderer_is_built() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    fs::write(root.join(CONFIG_FILE), "timezone: Mars/Olympus\n").unwrap();

    let error = build_project(root, BuildPlan::default(), started(), |_| {
        panic!("renderer requested for an invalid configuration")
    })
    .unwrap_err();
    assert!(format!("{error:#}").contains("timezone"), "{error:#}");
}
