//! Create a new post

use anyhow::{bail, Result};
use std::fs;
use std::path::PathBuf;

use crate::content::loader::post_paths;
use crate::Blog;

/// Create a new post file and return its path.
///
/// The id defaults to the slugified title.
pub fn create_post(blog: &Blog, title: &str, id: Option<&str>) -> Result<PathBuf> {
    let now = chrono::Local::now();

    let id = match id {
        Some(id) => id.trim().to_string(),
        None => slug::slugify(title),
    };
    if id.is_empty() || id.starts_with('.') || id.contains(['/', '\\']) {
        bail!("Invalid post id: {:?}", id);
    }

    fs::create_dir_all(&blog.posts_dir)?;
    let file_path = blog.posts_dir.join(format!("{}.md", id));

    // Any extension with the same stem would claim the same id
    if let Some(existing) = post_paths(&blog.posts_dir, &id).find(|path| path.exists()) {
        bail!("File already exists: {:?}", existing);
    }

    // Load scaffold template
    let scaffold_path = blog.base_dir.join("scaffolds").join("post.md");
    let scaffold_content = if scaffold_path.exists() {
        fs::read_to_string(&scaffold_path)?
    } else {
        "---\ntitle: '{{ title }}'\ndate: '{{ date }}'\n---\n".to_string()
    };

    // Single-quoted YAML escapes ' as ''
    let content = scaffold_content
        .replace("{{ title }}", &title.replace('\'', "''"))
        .replace("{{ date }}", &now.format("%Y-%m-%d").to_string());

    fs::write(&file_path, content)?;
    tracing::info!("Created: {:?}", file_path);

    Ok(file_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentLoader;
    use tempfile::TempDir;

    #[test]
    fn test_create_post_round_trips_title() {
        let tmp = TempDir::new().unwrap();
        let blog = Blog::new(tmp.path()).unwrap();

        let path = create_post(&blog, "Marco's First Post", None).unwrap();
        assert_eq!(path, blog.posts_dir.join("marco-s-first-post.md"));

        let post = ContentLoader::new(&blog).post_data("marco-s-first-post").unwrap();
        assert_eq!(post.title, "Marco's First Post");
        assert_eq!(post.date, chrono::Local::now().format("%Y-%m-%d").to_string());
    }

    #[test]
    fn test_create_post_with_explicit_id() {
        let tmp = TempDir::new().unwrap();
        let blog = Blog::new(tmp.path()).unwrap();

        create_post(&blog, "Hello", Some("hello-again")).unwrap();
        assert!(blog.posts_dir.join("hello-again.md").exists());
        assert!(create_post(&blog, "Hello", Some("hello-again")).is_err());
        assert!(create_post(&blog, "Hello", Some("../escape")).is_err());
    }

    #[test]
    fn test_create_post_refuses_stem_taken_by_other_extension() {
        let tmp = TempDir::new().unwrap();
        let blog = Blog::new(tmp.path()).unwrap();
        fs::create_dir_all(&blog.posts_dir).unwrap();
        fs::write(blog.posts_dir.join("taken.markdown"), "---\ntitle: Taken\n---\n").unwrap();

        assert!(create_post(&blog, "Taken", None).is_err());
        assert!(!blog.posts_dir.join("taken.md").exists());
    }
}
