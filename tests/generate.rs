use blogsmith::commands::generate::build;
use blogsmith::Blog;
use std::fs;

fn site() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("blog.yml"),
        "title: Field Notes\nabout: Hello from **me**.\n",
    )
    .unwrap();

    let month = dir.path().join("content/blog/2024/03");
    fs::create_dir_all(&month).unwrap();
    fs::write(
        month.join("hello.md"),
        "---\ntitle: Hello\ndate: 2024-03-01\ncategory: Tech\ntags: [rust, ../x]\n---\n# Hi\n\n<script>alert(1)</script>\n",
    )
    .unwrap();
    dir
}

#[tokio::test]
async fn test_generate_writes_every_page() {
    let dir = site();
    let blog = Blog::new(dir.path()).unwrap();
    let stats = build(&blog).await.unwrap();

    assert_eq!(stats.posts, 1);
    assert_eq!(stats.categories, 1);
    // "../x" cannot be a directory name and is skipped
    assert_eq!(stats.tags, 1);

    let public = dir.path().join("public");
    for page in [
        "index.html",
        "404.html",
        "blog/index.html",
        "about/index.html",
        "blog/2024/03/hello/index.html",
        "category/Tech/index.html",
        "tag/rust/index.html",
    ] {
        assert!(public.join(page).is_file(), "missing {}", page);
    }

    let post = fs::read_to_string(public.join("blog/2024/03/hello/index.html")).unwrap();
    assert!(post.contains("<h1>Hi</h1>"));
    assert!(post.contains("Field Notes"));
    assert!(!post.contains("<script>alert"));

    let about = fs::read_to_string(public.join("about/index.html")).unwrap();
    assert!(about.contains("<strong>me</strong>"));
}

#[tokio::test]
async fn test_generate_empty_site_then_clean() {
    let dir = tempfile::tempdir().unwrap();
    let blog = Blog::new(dir.path()).unwrap();

    let stats = build(&blog).await.unwrap();
    assert_eq!(stats.posts, 0);
    assert_eq!(stats.pages, 4);
    assert!(blog.public_dir.join("index.html").is_file());

    blog.clean().unwrap();
    assert!(!blog.public_dir.exists());
}

#[tokio::test]
async fn test_listing_links_resolve_to_written_pages() {
    let dir = site();
    let month = dir.path().join("content/blog/2024/04");
    fs::create_dir_all(&month).unwrap();
    fs::write(
        month.join("network.md"),
        "---\ntitle: Networking\ndate: 2024-04-01\ncategory: Net/Ops\ntags: [TCP/IP, C++ & Rust]\n---\nPackets.\n",
    )
    .unwrap();

    let blog = Blog::new(dir.path()).unwrap();
    let stats = build(&blog).await.unwrap();
    assert_eq!(stats.categories, 1);
    assert_eq!(stats.tags, 2);

    let public = dir.path().join("public");
    let post = fs::read_to_string(public.join("blog/2024/04/network/index.html")).unwrap();
    assert!(!post.contains("TCP%2FIP"));
    assert!(post.contains(r#"<span class="badge">TCP&#x2F;IP</span>"#));
    assert!(post.contains(r#"href="/tag/C%2B%2B%20%26%20Rust/""#));

    // Every listing link in the built site points at a page that exists
    let mut checked = 0;
    for entry in walkdir::WalkDir::new(&public) {
        let entry = entry.unwrap();
        if entry.path().extension().map_or(true, |e| e != "html") {
            continue;
        }
        let html = fs::read_to_string(entry.path()).unwrap();
        for part in html.split("href=\"/").skip(1) {
            let target = &part[..part.find('"').unwrap()];
            if !(target.starts_with("tag/") || target.starts_with("category/")) {
                continue;
            }
            let decoded = percent_encoding::percent_decode_str(target).decode_utf8().unwrap();
            assert!(
                public.join(decoded.as_ref()).join("index.html").is_file(),
                "dead link /{} in {:?}",
                target,
                entry.path()
            );
            checked += 1;
        }
    }
    assert!(checked > 0);
}
