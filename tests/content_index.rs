use blogsmith::content::{ContentIndex, MarkdownRenderer, DEFAULT_CATEGORY, DEFAULT_TITLE};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, text: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

fn fixture() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(
        root,
        "2024/03/hello.md",
        "---\ntitle: \"Hello\"\ndate: \"2024-03-01\"\ncategory: \"Tech\"\ntags: [\"a\", \"b\"]\n---\n# Hi\n",
    );
    write(
        root,
        "2024/02/winter.md",
        "---\ntitle: Winter\ndate: 2024-02-01\ncategory: Life\ntags: [b, c]\n---\nCold.\n",
    );
    write(root, "2023/12/bare.md", "No front-matter here.\n");
    write(root, "README.md", "not a post");
    dir
}

#[tokio::test]
async fn test_lookup_scenario() {
    let dir = fixture();
    let index = ContentIndex::new(dir.path());

    let post = index.post("2024", "03", "hello").unwrap().unwrap();
    assert_eq!(post.year, "2024");
    assert_eq!(post.month, "03");
    assert_eq!(post.slug, "hello");
    assert_eq!(post.meta.title, "Hello");
    assert_eq!(post.meta.category, "Tech");
    assert_eq!(post.meta.tags, vec!["a", "b"]);

    let renderer = std::sync::Arc::new(MarkdownRenderer::new());
    let html = renderer.render_async(post.content.clone()).await.unwrap();
    assert!(html.contains("<h1>Hi</h1>"));
}

#[test]
fn test_missing_lookups_are_none() {
    let dir = fixture();
    let index = ContentIndex::new(dir.path());

    assert!(index.post("2024", "03", "nope").unwrap().is_none());
    assert!(index.post("2024", "04", "hello").unwrap().is_none());
    assert!(index.post("..", "2024", "03").unwrap().is_none());
    assert!(index.post("2024", "03", "../02/winter").unwrap().is_none());
    assert!(index.post("", "", "").unwrap().is_none());
}

#[test]
fn test_missing_root_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let index = ContentIndex::new(dir.path().join("content/blog"));

    assert!(index.all_posts().is_empty());
    assert!(index.categories().is_empty());
    assert!(index.tags().is_empty());
    assert!(index.posts_by_month().is_empty());
    assert!(index.post("2024", "03", "hello").unwrap().is_none());
}

#[test]
fn test_all_posts_sorted_with_defaults() {
    let dir = fixture();
    let index = ContentIndex::new(dir.path());

    let posts = index.all_posts();
    let slugs: Vec<_> = posts.iter().map(|p| p.slug.as_str()).collect();
    assert_eq!(slugs, vec!["hello", "winter", "bare"]);

    let bare = &posts[2];
    assert_eq!(bare.meta.title, DEFAULT_TITLE);
    assert_eq!(bare.meta.category, DEFAULT_CATEGORY);
    assert!(bare.meta.tags.is_empty());
    assert_eq!(bare.meta.description, "");
    assert_eq!(bare.content.trim(), "No front-matter here.");
}

#[test]
fn test_queries_are_consistent() {
    let dir = fixture();
    let index = ContentIndex::new(dir.path());

    assert_eq!(index.categories(), vec!["Life", "Tech", DEFAULT_CATEGORY]);
    assert_eq!(index.tags(), vec!["a", "b", "c"]);

    let total: usize = index
        .categories()
        .iter()
        .map(|c| index.posts_by_category(c).len())
        .sum();
    assert_eq!(total, index.all_posts().len());

    let tagged: Vec<_> = index.posts_by_tag("b").into_iter().map(|p| p.slug).collect();
    assert_eq!(tagged, vec!["hello", "winter"]);
    assert!(index.posts_by_tag("B").is_empty());

    let months: Vec<_> = index.posts_by_month().keys().cloned().collect();
    assert_eq!(months, vec!["2024-03", "2024-02", "2023-12"]);
}

#[test]
fn test_invalid_utf8_is_decoded_lossily() {
    let dir = tempfile::tempdir().unwrap();
    let month = dir.path().join("2024/05");
    fs::create_dir_all(&month).unwrap();
    let mut bytes = b"---\ntitle: Caf".to_vec();
    bytes.push(0xE9);
    bytes.extend_from_slice(b"\ndate: 2024-05-01\n---\nLatin-1 body\n");
    fs::write(month.join("cafe.md"), bytes).unwrap();

    let index = ContentIndex::new(dir.path());
    assert_eq!(index.all_posts().len(), 1);

    let post = index.post("2024", "05", "cafe").unwrap().unwrap();
    assert_eq!(post.meta.title, "Caf\u{FFFD}");
    assert_eq!(post.meta.date, "2024-05-01");
    assert_eq!(post.content.trim(), "Latin-1 body");
}

#[test]
fn test_rescans_on_every_query() {
    let dir = fixture();
    let index = ContentIndex::new(dir.path());
    assert_eq!(index.all_posts().len(), 3);

    write(
        dir.path(),
        "2024/04/spring.md",
        "---\ntitle: Spring\ndate: 2024-04-01\n---\n",
    );
    let posts = index.all_posts();
    assert_eq!(posts.len(), 4);
    assert_eq!(posts[0].slug, "spring");
}

#[test]
fn test_unsafe_markdown_is_stripped() {
    let renderer = MarkdownRenderer::new();
    let html = renderer.render(
        "Hi <script>alert(1)</script>\n\n<div onclick=\"steal()\">x</div>\n\n[bad](javascript:alert(1))\n",
    );
    assert!(!html.contains("<script"));
    assert!(!html.contains("onclick"));
    assert!(!html.contains("javascript:"));
}
