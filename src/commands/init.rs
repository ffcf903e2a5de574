//! Initialize a new blog

use anyhow::{bail, Result};
use std::fs;
use std::path::Path;

use crate::config::{SiteConfig, CONFIG_FILE};

const DEFAULT_CONFIG: &str = r#"# Site
title: My Blog
description: ''
author: ''
language: en

# URL
url: http://localhost:4000
root: /

# Directory
content_dir: content/blog
public_dir: public

# Writing
highlight:
  enable: true
  theme: InspiredGitHub
  line_number: false

# Display
date_format: '%B %-d, %Y'
recent_posts: 5

about: |
  Welcome! This blog collects notes on what I am learning.
"#;

/// Initialize a new site in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    let config_path = target_dir.join(CONFIG_FILE);
    if config_path.exists() {
        bail!("{:?} already exists", config_path);
    }

    fs::create_dir_all(target_dir)?;
    fs::write(&config_path, DEFAULT_CONFIG)?;

    let config = SiteConfig::load(&config_path)?;
    let now = chrono::Local::now();
    let month_dir = target_dir
        .join(&config.content_dir)
        .join(now.format("%Y").to_string())
        .join(now.format("%m").to_string());
    fs::create_dir_all(&month_dir)?;

    let sample_post = format!(
        r#"---
title: Hello World
date: {}
category: General
tags:
  - welcome
description: The first post on this blog.
---

# Hello World

This post lives at `{}/<year>/<month>/hello-world.md`. Create more with
`blogsmith new "My Title"`, then preview them with `blogsmith server`.

```rust
fn main() {{
    println!("Hello, world!");
}}
```
"#,
        now.format("%Y-%m-%d"),
        config.content_dir
    );

    fs::write(month_dir.join("hello-world.md"), sample_post)?;
    tracing::debug!("Initialized site at {:?}", target_dir);

    Ok(())
}
