//! Page builders shared by the static generator and the server
//!
//! Each page is rendered from a [`PostSet`] snapshot. Lookups that find
//! nothing return `Ok(None)`, which callers turn into the 404 page.

use anyhow::Result;
use std::sync::Arc;
use tera::Context;

use crate::config::SiteConfig;
use crate::content::{MarkdownRenderer, Post, PostSet};
use crate::helpers;
use crate::templates::{LinkData, MonthData, PostData, SiteData, TemplateRenderer};

pub struct SiteViews {
    config: SiteConfig,
    content_dir: String,
    templates: TemplateRenderer,
    markdown: Arc<MarkdownRenderer>,
}

impl SiteViews {
    pub fn new(config: SiteConfig, markdown: Arc<MarkdownRenderer>) -> Result<Self> {
        Ok(Self {
            content_dir: config.content_dir.clone(),
            config,
            templates: TemplateRenderer::new()?,
            markdown,
        })
    }

    fn context(&self, active: &str) -> Context {
        let mut context = Context::new();
        context.insert("site", &SiteData::new(&self.config));
        context.insert("active", active);
        context
    }

    /// Home page: recent posts plus every category and tag
    pub fn home(&self, posts: &PostSet) -> Result<String> {
        let recent: Vec<Post> = posts
            .posts()
            .iter()
            .take(self.config.recent_posts)
            .cloned()
            .collect();

        let categories: Vec<LinkData> = posts
            .categories()
            .into_iter()
            .map(|name| LinkData {
                url: helpers::category_url(&self.config, &name),
                name,
            })
            .collect();
        let tags: Vec<LinkData> = posts
            .tags()
            .into_iter()
            .map(|name| LinkData {
                url: helpers::tag_url(&self.config, &name),
                name,
            })
            .collect();

        let mut context = self.context("home");
        context.insert("recent_posts", &PostData::list(&self.config, &recent));
        context.insert("categories", &categories);
        context.insert("tags", &tags);
        self.templates.render("home.html", &context)
    }

    /// Blog listing grouped by month, most recent month first
    pub fn blog(&self, posts: &PostSet) -> Result<String> {
        let months: Vec<MonthData> = posts
            .months()
            .into_iter()
            .map(|(key, group)| MonthData {
                key,
                posts: PostData::list(&self.config, &group),
            })
            .collect();

        let mut context = self.context("blog");
        context.insert("total", &posts.len());
        context.insert("months", &months);
        context.insert("content_dir", &self.content_dir);
        self.templates.render("blog.html", &context)
    }

    /// Detail page for one post; converts its markdown body
    pub async fn post(&self, post: &Post) -> Result<String> {
        let content = self.markdown.clone().render_async(post.content.clone()).await?;

        let mut context = self.context("blog");
        context.insert("post", &PostData::new(&self.config, post));
        context.insert("content", &content);
        self.templates.render("post.html", &context)
    }

    pub fn category(&self, posts: &PostSet, category: &str) -> Result<Option<String>> {
        self.listing("category", category, posts.by_category(category))
    }

    pub fn tag(&self, posts: &PostSet, tag: &str) -> Result<Option<String>> {
        self.listing("tag", tag, posts.by_tag(tag))
    }

    fn listing(&self, kind: &str, name: &str, matches: Vec<Post>) -> Result<Option<String>> {
        if matches.is_empty() {
            return Ok(None);
        }

        let mut context = self.context("blog");
        context.insert("kind", kind);
        context.insert("name", name);
        context.insert("posts", &PostData::list(&self.config, &matches));
        self.templates.render("listing.html", &context).map(Some)
    }

    pub async fn about(&self) -> Result<String> {
        let content = self
            .markdown
            .clone()
            .render_async(self.config.about.clone())
            .await?;

        let mut context = self.context("about");
        context.insert("content", &content);
        self.templates.render("about.html", &context)
    }

    pub fn not_found(&self) -> Result<String> {
        self.templates.render("not_found.html", &self.context(""))
    }
}
