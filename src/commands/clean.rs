//! Clean the public directory

use anyhow::Result;
use std::fs;

use crate::Blog;

/// Remove all generated output
pub fn run(blog: &Blog) -> Result<()> {
    blog.ensure_public_dir_is_disposable()?;
    if blog.public_dir.exists() {
        fs::remove_dir_all(&blog.public_dir)?;
        tracing::info!("Deleted: {:?}", blog.public_dir);
    }

    Ok(())
}
