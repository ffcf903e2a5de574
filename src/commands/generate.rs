//! Generate static files

use anyhow::Result;
use notify_debouncer_mini::notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, DebouncedEvent};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use crate::config::CONFIG_FILE;
use crate::generator::{GenerateStats, Generator};
use crate::Blog;

/// Generate the static site from a fresh scan of the content tree
pub async fn run(blog: &Blog) -> Result<()> {
    build(blog).await.map(|_| ())
}

/// Build and report what was written
pub async fn build(blog: &Blog) -> Result<GenerateStats> {
    let start = Instant::now();

    let posts = blog.index().load();
    tracing::info!("Loaded {} posts from {:?}", posts.len(), blog.content_dir);

    let generator = Generator::new(blog)?;
    let stats = generator.generate(&posts).await?;

    tracing::info!(
        "Generated {} pages ({} posts, {} categories, {} tags) in {:.2}s",
        stats.pages,
        stats.posts,
        stats.categories,
        stats.tags,
        start.elapsed().as_secs_f64()
    );

    Ok(stats)
}

/// Watch the content directory and configuration, regenerating on change.
///
/// Events are debounced, so a burst of saves becomes one rebuild and a save
/// landing during a rebuild is picked up right after it.
pub async fn watch(blog: &Blog) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut debouncer = new_debouncer(Duration::from_millis(500), move |res: DebounceEventResult| {
        let _ = tx.send(res);
    })?;

    if blog.content_dir.exists() {
        debouncer
            .watcher()
            .watch(&blog.content_dir, RecursiveMode::Recursive)?;
        tracing::debug!("Watching: {:?}", blog.content_dir);
    }
    let config_path = blog.base_dir.join(CONFIG_FILE);
    if config_path.exists() {
        debouncer
            .watcher()
            .watch(&config_path, RecursiveMode::NonRecursive)?;
        tracing::debug!("Watching: {:?}", config_path);
    }

    tracing::info!("Watching for changes. Press Ctrl+C to stop.");

    let mut current = blog.clone();
    while let Some(res) = rx.recv().await {
        let events = match res {
            Ok(events) => events,
            Err(e) => {
                tracing::error!("Watch error: {:?}", e);
                continue;
            }
        };

        let Some(next) = rebuild_target(&current, &events) else {
            continue;
        };
        current = next;

        tracing::info!("File changed, regenerating...");
        if let Err(e) = run(&current).await {
            tracing::error!("Generation failed: {:#}", e);
        }
    }

    Ok(())
}

/// The blog to rebuild after a batch of events, reloading it when the
/// configuration changed; `None` when nothing should be rebuilt
fn rebuild_target(current: &Blog, events: &[DebouncedEvent]) -> Option<Blog> {
    if events.is_empty() {
        return None;
    }
    if !events.iter().any(|e| e.path.ends_with(CONFIG_FILE)) {
        return Some(current.clone());
    }

    match Blog::new(&current.base_dir) {
        Ok(reloaded) => Some(reloaded),
        Err(e) => {
            tracing::error!("Configuration reload failed: {:#}", e);
            None
        }
    }
}
