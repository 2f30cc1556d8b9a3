//! Generate static files

use anyhow::Result;
use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebounceEventResult};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::time::Duration;

use crate::generator::Generator;
use crate::Blog;

/// Quiet period before a burst of file events triggers a rebuild
const DEBOUNCE: Duration = Duration::from_millis(500);

/// Generate the static site
pub fn run(blog: &Blog) -> Result<()> {
    let start = std::time::Instant::now();

    let generator = Generator::new(blog)?;
    generator.generate()?;

    let duration = start.elapsed();
    tracing::info!("Generated in {:.2}s", duration.as_secs_f64());

    Ok(())
}

/// Reload the config and regenerate, logging failures.
///
/// Returns whether the build succeeded.
pub fn rebuild(base_dir: &Path) -> bool {
    // Config edits take effect on the next build
    match Blog::new(base_dir).and_then(|fresh| run(&fresh)) {
        Ok(()) => true,
        Err(e) => {
            tracing::error!("Generation failed: {:#}", e);
            false
        }
    }
}

/// Watch the posts directory and config, regenerating on change
pub fn watch(blog: &Blog) -> Result<()> {
    tracing::info!("Watching for changes. Press Ctrl+C to stop.");
    watch_sources(blog, |_| {
        rebuild(&blog.base_dir);
    })
}

/// Watch the site sources and call `on_change` once per debounced batch
/// of changes. Blocks until the watcher goes away.
pub fn watch_sources<F>(blog: &Blog, on_change: F) -> Result<()>
where
    F: FnMut(&[PathBuf]),
{
    let (tx, rx) = channel();
    let mut debouncer = new_debouncer(DEBOUNCE, tx)?;

    debouncer
        .watcher()
        .watch(&blog.posts_dir, RecursiveMode::NonRecursive)?;
    tracing::debug!("Watching: {:?}", blog.posts_dir);

    let config_path = blog.config_path();
    if config_path.exists() {
        debouncer
            .watcher()
            .watch(&config_path, RecursiveMode::NonRecursive)?;
        tracing::debug!("Watching: {:?}", config_path);
    }

    dispatch_batches(rx, on_change);
    Ok(())
}

/// Every batch that arrives gets a callback, including batches queued up
/// while a previous callback was still running.
fn dispatch_batches<F>(rx: Receiver<DebounceEventResult>, mut on_change: F)
where
    F: FnMut(&[PathBuf]),
{
    for result in rx {
        match result {
            Ok(events) => {
                let changed: Vec<PathBuf> = events
                    .into_iter()
                    .map(|e| e.path)
                    .filter(|path| is_relevant(path))
                    .collect();

                if changed.is_empty() {
                    continue;
                }

                for path in &changed {
                    tracing::info!("File changed: {}", path.display());
                }
                on_change(&changed);
            }
            Err(e) => tracing::error!("Watch error: {:?}", e),
        }
    }
}

/// Editor swap and backup files do not count as changes
fn is_relevant(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    !name.starts_with('.') && !name.ends_with('~')
}
