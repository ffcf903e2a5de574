//! Built-in site templates using the Tera template engine
//!
//! Templates are embedded in the binary. Autoescaping stays on, so any
//! value from front-matter is escaped; converted post bodies and URLs built
//! by `helpers` are marked `safe` in the templates themselves.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::content::Post;
use crate::helpers;

/// Template renderer with the embedded site theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("site/layout.html")),
            ("macros.html", include_str!("site/macros.html")),
            ("home.html", include_str!("site/home.html")),
            ("blog.html", include_str!("site/blog.html")),
            ("post.html", include_str!("site/post.html")),
            ("listing.html", include_str!("site/listing.html")),
            ("about.html", include_str!("site/about.html")),
            ("not_found.html", include_str!("site/not_found.html")),
        ])?;

        tera.register_filter("date_format", date_format_filter);
        tera.register_filter("month_label", month_label_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Tera filter: display a post date with a chrono format
fn date_format_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("date_format", "value", String, value);
    let format = match args.get("format") {
        Some(val) => tera::try_get_value!("date_format", "format", String, val),
        None => "%Y-%m-%d".to_string(),
    };
    Ok(tera::Value::String(helpers::format_post_date(&s, &format)))
}

/// Tera filter: "2024-03" -> "March 2024"
fn month_label_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("month_label", "value", String, value);
    Ok(tera::Value::String(helpers::month_label(&s)))
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub description: String,
    pub author: String,
    pub language: String,
    pub date_format: String,
    pub home_url: String,
    pub blog_url: String,
    pub about_url: String,
    pub year: i32,
}

impl SiteData {
    pub fn new(config: &SiteConfig) -> Self {
        use chrono::Datelike;

        Self {
            title: config.title.clone(),
            description: config.description.clone(),
            author: config.author.clone(),
            language: config.language.clone(),
            date_format: config.date_format.clone(),
            home_url: helpers::url_for(config, ""),
            blog_url: helpers::url_for(config, "blog/"),
            about_url: helpers::url_for(config, "about/"),
            year: chrono::Local::now().year(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LinkData {
    pub name: String,
    /// `None` when the name has no listing page
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostData {
    pub title: String,
    pub date: String,
    pub datetime: Option<String>,
    pub description: String,
    pub url: String,
    pub permalink: String,
    pub category: LinkData,
    pub tags: Vec<LinkData>,
}

impl PostData {
    pub fn new(config: &SiteConfig, post: &Post) -> Self {
        Self {
            title: post.meta.title.clone(),
            date: post.meta.date.clone(),
            datetime: helpers::date_xml(&post.meta.date),
            description: post.meta.description.clone(),
            url: helpers::post_url(config, post),
            permalink: helpers::full_url_for(config, &helpers::post_path(post)),
            category: LinkData {
                name: post.meta.category.clone(),
                url: helpers::category_url(config, &post.meta.category),
            },
            tags: post
                .meta
                .tags
                .iter()
                .map(|tag| LinkData {
                    name: tag.clone(),
                    url: helpers::tag_url(config, tag),
                })
                .collect(),
        }
    }

    pub fn list(config: &SiteConfig, posts: &[Post]) -> Vec<Self> {
        posts.iter().map(|p| Self::new(config, p)).collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthData {
    pub key: String,
    pub posts: Vec<PostData>,
}
