//! Markdown rendering with sanitization and syntax highlighting

use lazy_static::lazy_static;
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, LinkType, Options, Parser, Tag, TagEnd};
use regex::Regex;
use std::sync::Arc;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::{styled_line_to_highlighted_html, IncludeBackground};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

use super::ContentError;
use crate::config::HighlightConfig;

/// URL schemes a link may point at; anything without a scheme is relative
const LINK_SCHEMES: &[&str] = &["http", "https", "mailto", "xmpp", "irc", "ircs"];
const IMAGE_SCHEMES: &[&str] = &["http", "https"];

lazy_static! {
    static ref BARE_URL: Regex =
        Regex::new(r"(?:https?://|www\.)[^\s<>]+").expect("autolink pattern is valid");
}

/// Markdown renderer with syntax highlighting
pub struct MarkdownRenderer {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme_name: String,
    highlight: bool,
    line_numbers: bool,
}

struct CodeBlock {
    lang: Option<String>,
    text: String,
}

impl MarkdownRenderer {
    /// Create a new markdown renderer
    pub fn new() -> Self {
        Self::with_options(&HighlightConfig::default())
    }

    /// Create with custom settings
    pub fn with_options(config: &HighlightConfig) -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
            theme_name: config.theme.clone(),
            highlight: config.enable,
            line_numbers: config.line_number,
        }
    }

    /// Render markdown to sanitized HTML.
    ///
    /// Raw HTML in the source is dropped and link/image URLs with a
    /// non-allowed scheme are emptied before the HTML is written, so the
    /// result can be embedded without further escaping. Any UTF-8 input
    /// renders; malformed markdown degrades to its best-effort reading.
    pub fn render(&self, markdown: &str) -> String {
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_GFM;
        let parser = Parser::new_ext(markdown, options);

        let mut events: Vec<Event> = Vec::new();
        let mut code: Option<CodeBlock> = None;
        let mut pending = String::new();
        let mut link_depth = 0usize;

        for event in parser {
            if let Some(block) = code.as_mut() {
                match event {
                    Event::Text(text) => block.text.push_str(&text),
                    Event::End(TagEnd::CodeBlock) => {
                        let html = self.highlight_code(&block.text, block.lang.as_deref());
                        events.push(Event::Html(CowStr::from(html)));
                        code = None;
                    }
                    _ => {}
                }
                continue;
            }

            // Adjacent text is merged so a URL split across events still links
            if let Event::Text(text) = &event {
                if link_depth == 0 {
                    pending.push_str(text);
                    continue;
                }
            }
            push_text_with_autolinks(&mut pending, &mut events);

            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let lang = match kind {
                        CodeBlockKind::Fenced(info) => info
                            .split(|c: char| c.is_whitespace() || c == ',')
                            .find(|s| !s.is_empty())
                            .map(str::to_string),
                        CodeBlockKind::Indented => None,
                    };
                    code = Some(CodeBlock {
                        lang,
                        text: String::new(),
                    });
                }
                Event::Html(raw) | Event::InlineHtml(raw) => {
                    tracing::debug!("Dropping raw HTML: {:?}", raw);
                }
                Event::Start(Tag::Link {
                    link_type,
                    dest_url,
                    title,
                    id,
                }) => {
                    link_depth += 1;
                    events.push(Event::Start(Tag::Link {
                        link_type,
                        dest_url: safe_url(dest_url, LINK_SCHEMES),
                        title,
                        id,
                    }));
                }
                Event::Start(Tag::Image {
                    link_type,
                    dest_url,
                    title,
                    id,
                }) => {
                    link_depth += 1;
                    events.push(Event::Start(Tag::Image {
                        link_type,
                        dest_url: safe_url(dest_url, IMAGE_SCHEMES),
                        title,
                        id,
                    }));
                }
                Event::End(end @ (TagEnd::Link | TagEnd::Image)) => {
                    link_depth = link_depth.saturating_sub(1);
                    events.push(Event::End(end));
                }
                other => events.push(other),
            }
        }
        push_text_with_autolinks(&mut pending, &mut events);

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());
        html_output
    }

    /// Render on the blocking pool; one document per call
    pub async fn render_async(self: Arc<Self>, markdown: String) -> Result<String, ContentError> {
        Ok(tokio::task::spawn_blocking(move || self.render(&markdown)).await?)
    }

    /// Highlight a code block
    fn highlight_code(&self, code: &str, lang: Option<&str>) -> String {
        if !self.highlight {
            return plain_code_block(code, lang.map(css_token).as_deref());
        }

        let syntax = self.find_syntax(code, lang);
        let label = match lang {
            Some(lang) => Some(css_token(lang)),
            None if syntax.name != "Plain Text" => Some(css_token(&syntax.name.to_lowercase())),
            None => None,
        };

        let Some(theme) = self.theme() else {
            return plain_code_block(code, label.as_deref());
        };

        match self.highlight_lines(code, syntax, theme) {
            Ok(lines) if self.line_numbers => add_line_numbers(&lines, label.as_deref()),
            Ok(lines) => format!(
                r#"<pre><code{}>{}</code></pre>"#,
                class_attr(label.as_deref()),
                lines.concat()
            ),
            Err(e) => {
                tracing::warn!("Highlighting failed, emitting plain code: {}", e);
                plain_code_block(code, label.as_deref())
            }
        }
    }

    /// Declared language first, then a first-line guess for undeclared blocks
    fn find_syntax(&self, code: &str, lang: Option<&str>) -> &SyntaxReference {
        let syntax = match lang {
            Some(lang) => self
                .syntax_set
                .find_syntax_by_token(lang)
                .or_else(|| self.syntax_set.find_syntax_by_extension(lang)),
            None => self.syntax_set.find_syntax_by_first_line(code),
        };
        syntax.unwrap_or_else(|| self.syntax_set.find_syntax_plain_text())
    }

    fn theme(&self) -> Option<&Theme> {
        self.theme_set
            .themes
            .get(&self.theme_name)
            .or_else(|| self.theme_set.themes.values().next())
    }

    fn highlight_lines(
        &self,
        code: &str,
        syntax: &SyntaxReference,
        theme: &Theme,
    ) -> Result<Vec<String>, syntect::Error> {
        let mut highlighter = HighlightLines::new(syntax, theme);
        LinesWithEndings::from(code)
            .map(|line| {
                let regions = highlighter.highlight_line(line, &self.syntax_set)?;
                styled_line_to_highlighted_html(&regions[..], IncludeBackground::No)
            })
            .collect()
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Flush buffered text, turning bare URLs into links
fn push_text_with_autolinks(pending: &mut String, events: &mut Vec<Event<'_>>) {
    if pending.is_empty() {
        return;
    }
    let text = std::mem::take(pending);

    let mut last = 0;
    for m in BARE_URL.find_iter(&text) {
        let boundary = text[..m.start()]
            .chars()
            .next_back()
            .map_or(true, |c| c.is_whitespace() || matches!(c, '*' | '_' | '~' | '('));
        if !boundary || m.start() < last {
            continue;
        }

        // Prefix is measured before trimming, which may eat the dot of `www.`
        let candidate = m.as_str();
        let prefix_len = if candidate.starts_with("www.") {
            4
        } else {
            candidate.find("://").map_or(0, |i| i + 3)
        };
        let url = trim_autolink(candidate);
        if url.len() <= prefix_len {
            continue;
        }

        if m.start() > last {
            events.push(Event::Text(CowStr::from(text[last..m.start()].to_string())));
        }
        let href = if url.starts_with("www.") {
            format!("http://{}", url)
        } else {
            url.to_string()
        };
        events.push(Event::Start(Tag::Link {
            link_type: LinkType::Autolink,
            dest_url: CowStr::from(href),
            title: CowStr::Borrowed(""),
            id: CowStr::Borrowed(""),
        }));
        events.push(Event::Text(CowStr::from(url.to_string())));
        events.push(Event::End(TagEnd::Link));
        last = m.start() + url.len();
    }

    if last < text.len() {
        events.push(Event::Text(CowStr::from(text[last..].to_string())));
    }
}

/// Strip trailing punctuation and unbalanced closing parens from a bare URL
fn trim_autolink(candidate: &str) -> &str {
    let mut end = candidate.len();
    while let Some(last) = candidate[..end].chars().next_back() {
        let s = &candidate[..end];
        let strip = match last {
            '?' | '!' | '.' | ',' | ':' | ';' | '*' | '_' | '~' | '\'' | '"' => true,
            ')' => s.matches(')').count() > s.matches('(').count(),
            _ => false,
        };
        if !strip {
            break;
        }
        end -= last.len_utf8();
    }
    &candidate[..end]
}

fn safe_url<'a>(url: CowStr<'a>, allowed: &[&str]) -> CowStr<'a> {
    if is_safe_url(&url, allowed) {
        url
    } else {
        tracing::debug!("Removing URL with disallowed scheme: {:?}", url);
        CowStr::Borrowed("")
    }
}

/// A URL is safe when it is relative or its scheme is in `allowed`
fn is_safe_url(url: &str, allowed: &[&str]) -> bool {
    // Browsers ignore whitespace and control characters inside the scheme
    let cleaned: String = url
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect();

    let Some(colon) = cleaned.find(':') else {
        return true;
    };
    let scheme = &cleaned[..colon];
    if scheme.contains(['/', '?', '#']) {
        return true;
    }
    allowed.contains(&scheme.to_ascii_lowercase().as_str())
}

/// Restrict a language label to characters safe inside a class attribute
fn css_token(lang: &str) -> String {
    lang.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '#' | '.'))
        .collect()
}

fn class_attr(label: Option<&str>) -> String {
    match label {
        Some(label) if !label.is_empty() => format!(r#" class="language-{}""#, label),
        _ => String::new(),
    }
}

fn plain_code_block(code: &str, label: Option<&str>) -> String {
    format!(
        r#"<pre><code{}>{}</code></pre>"#,
        class_attr(label),
        html_escape(code)
    )
}

/// Add line numbers to highlighted code
fn add_line_numbers(lines: &[String], label: Option<&str>) -> String {
    let gutter = (1..=lines.len())
        .map(|n| format!(r#"<span class="line-number">{}</span>"#, n))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"<figure class="highlight"><table><tr><td class="gutter"><pre>{}</pre></td><td class="code"><pre><code{}>{}</code></pre></td></tr></table></figure>"#,
        gutter,
        class_attr(label),
        lines.concat()
    )
}

/// Simple HTML escaping
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(markdown: &str) -> String {
        MarkdownRenderer::new().render(markdown)
    }

    #[test]
    fn test_render_basic_markdown() {
        let html = render("# Hello World\n\nThis is a test.");
        assert!(html.contains("<h1>Hello World</h1>"));
        assert!(html.contains("<p>This is a test.</p>"));
    }

    #[test]
    fn test_gfm_extensions() {
        let html = render("| a | b |\n|---|---|\n| 1 | 2 |\n\n~~old~~\n\n- [x] done\n- [ ] todo\n");
        assert!(html.contains("<table>"));
        assert!(html.contains("<del>old</del>"));
        assert!(html.contains(r#"type="checkbox""#));
    }

    #[test]
    fn test_script_block_removed() {
        let html = render("before\n\n<script>alert(1)</script>\n\nafter");
        assert!(!html.contains("<script"));
        assert!(html.contains("<p>before</p>"));
        assert!(html.contains("<p>after</p>"));
    }

    #[test]
    fn test_inline_handlers_removed() {
        let html = render(r##"Click <a href="#" onclick="steal()">here</a> or <img src=x onerror=alert(1)>"##);
        assert!(!html.contains("onclick"));
        assert!(!html.contains("onerror"));
        assert!(!html.contains("<img"));
        assert!(html.contains("here"));
    }

    #[test]
    fn test_iframe_and_style_removed() {
        let html = render("<iframe src=\"https://evil\"></iframe>\n\n<style>body{}</style>\n");
        assert!(!html.contains("<iframe"));
        assert!(!html.contains("<style"));
    }

    #[test]
    fn test_javascript_urls_removed() {
        let html = render("[x](javascript:alert(1)) [y](JaVaScRiPt:alert(1)) ![z](data:image/png;base64,AAAA)");
        assert!(!html.to_lowercase().contains("javascript:"));
        assert!(!html.contains("data:"));
        assert!(html.contains(r#"<a href="">x</a>"#));
    }

    #[test]
    fn test_safe_urls_kept() {
        let html = render("[a](https://example.com) [b](/blog/2024/03/hello/) [c](mailto:me@example.com) [d](#top)");
        assert!(html.contains(r#"href="https://example.com""#));
        assert!(html.contains(r#"href="/blog/2024/03/hello/""#));
        assert!(html.contains(r#"href="mailto:me@example.com""#));
        assert!(html.contains(r##"href="#top""##));
    }

    #[test]
    fn test_is_safe_url() {
        assert!(is_safe_url("relative/path", LINK_SCHEMES));
        assert!(is_safe_url("./a:b", LINK_SCHEMES));
        assert!(is_safe_url("?q=a:b", LINK_SCHEMES));
        assert!(!is_safe_url("java\tscript:alert(1)", LINK_SCHEMES));
        assert!(!is_safe_url(" vbscript:x", LINK_SCHEMES));
        assert!(!is_safe_url("mailto:a@b.c", IMAGE_SCHEMES));
    }

    #[test]
    fn test_bare_url_autolink() {
        let html = render("See https://example.com/a_b. Or www.rust-lang.org!");
        assert!(html.contains(r#"<a href="https://example.com/a_b">https://example.com/a_b</a>."#));
        assert!(html.contains(r#"<a href="http://www.rust-lang.org">www.rust-lang.org</a>!"#));
    }

    #[test]
    fn test_bare_www_prefix_not_linked() {
        let html = render("Ends with www.. and www.!");
        assert!(!html.contains("<a "));
        assert!(html.contains("Ends with www.. and www.!"));

        let html = render("Try http://. or www.x.");
        assert_eq!(html.matches("<a ").count(), 1);
        assert!(html.contains(r#"<a href="http://www.x">www.x</a>."#));
    }

    #[test]
    fn test_no_autolink_in_code_or_links() {
        let html = render("`https://inline.example` and [label https://x.example](https://y.example)");
        assert!(html.contains("<code>https://inline.example</code>"));
        assert_eq!(html.matches("<a ").count(), 1);
    }

    #[test]
    fn test_trim_autolink() {
        assert_eq!(trim_autolink("https://a.example/x)."), "https://a.example/x");
        assert_eq!(trim_autolink("https://a.example/(x)"), "https://a.example/(x)");
    }

    #[test]
    fn test_render_code_block() {
        let html = render("```rust\nfn main() {}\n```");
        assert!(html.contains(r#"<pre><code class="language-rust">"#));
        assert!(html.contains("<span"));
        assert!(html.contains("main"));
    }

    #[test]
    fn test_code_block_is_escaped() {
        let html = render("```\n<script>alert(1)</script>\n```");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;"));
        assert!(html.contains("alert"));
    }

    #[test]
    fn test_detects_language_from_first_line() {
        let html = render("```\n#!/bin/bash\necho hi\n```");
        assert!(html.contains("language-"));
    }

    #[test]
    fn test_line_numbers_and_disabled_highlight() {
        let config = HighlightConfig {
            line_number: true,
            ..HighlightConfig::default()
        };
        let html = MarkdownRenderer::with_options(&config).render("```rust\nlet a = 1;\nlet b = 2;\n```");
        assert!(html.contains(r#"<span class="line-number">2</span>"#));

        let config = HighlightConfig {
            enable: false,
            ..HighlightConfig::default()
        };
        let html = MarkdownRenderer::with_options(&config).render("```rust\nlet a = 1 < 2;\n```");
        assert_eq!(
            html.trim(),
            r#"<pre><code class="language-rust">let a = 1 &lt; 2;
</code></pre>"#
        );
    }

    #[test]
    fn test_malformed_markdown_renders() {
        let html = render("**unclosed *emphasis [link](\n\n| broken | table\n```\nnever closed");
        assert!(html.contains("unclosed"));
    }

    #[tokio::test]
    async fn test_render_async() {
        let renderer = Arc::new(MarkdownRenderer::new());
        let html = renderer.render_async("# Hi".to_string()).await.unwrap();
        assert!(html.contains("<h1>Hi</h1>"));
    }
}
