//! Content loader - reads posts from the posts directory

use indexmap::IndexMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::post::sort_by_date_desc;
use super::{ContentError, FrontMatter, MarkdownRenderer, Post};
use crate::routes::StaticPath;
use crate::Blog;

/// Extensions recognised as posts, in lookup order
const MARKDOWN_EXTENSIONS: [&str; 2] = ["md", "markdown"];

/// Loads posts from the configured posts directory.
///
/// Nothing is cached: every call goes back to disk.
pub struct ContentLoader<'a> {
    blog: &'a Blog,
    renderer: MarkdownRenderer,
}

impl<'a> ContentLoader<'a> {
    /// Create a new content loader
    pub fn new(blog: &'a Blog) -> Self {
        let renderer = MarkdownRenderer::from_config(&blog.config.highlight);
        Self { blog, renderer }
    }

    /// All posts without their content, newest first
    pub fn sorted_posts_data(&self) -> Result<Vec<Post>, ContentError> {
        let mut posts = self
            .post_files()?
            .iter()
            .map(|path| self.read_post(path, &post_id(path), false))
            .collect::<Result<Vec<_>, _>>()?;

        sort_by_date_desc(&mut posts);
        tracing::debug!("Loaded {} posts from {:?}", posts.len(), self.blog.posts_dir);

        Ok(posts)
    }

    /// One path record per post file, for page generation
    pub fn all_post_ids(&self) -> Result<Vec<StaticPath>, ContentError> {
        Ok(self
            .post_files()?
            .iter()
            .map(|path| StaticPath::new().param("id", post_id(path)))
            .collect())
    }

    /// Load a single post with its rendered content
    pub fn post_data(&self, id: &str) -> Result<Post, ContentError> {
        let path = self.resolve(id)?;
        self.read_post(&path, id, true)
    }

    /// Markdown files directly inside the posts directory, in file-name order
    fn post_files(&self) -> Result<Vec<PathBuf>, ContentError> {
        let posts_dir = &self.blog.posts_dir;
        if !posts_dir.is_dir() {
            return Err(ContentError::io(
                posts_dir,
                std::io::Error::new(std::io::ErrorKind::NotFound, "posts directory not found"),
            ));
        }

        let mut files: IndexMap<String, PathBuf> = IndexMap::new();
        for entry in WalkDir::new(posts_dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| {
                let path = e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| posts_dir.clone());
                ContentError::io(path, e.into())
            })?;

            let path = entry.path();
            if path.is_file() && is_markdown_file(path) && !is_hidden(path) {
                let id = post_id(path);
                if let Some(first) = files.get(&id) {
                    return Err(ContentError::DuplicateId {
                        id,
                        first: first.clone(),
                        second: path.to_path_buf(),
                    });
                }
                files.insert(id, path.to_path_buf());
            }
        }

        Ok(files.into_values().collect())
    }

    /// Map an id to its source file; ids never escape the posts directory
    fn resolve(&self, id: &str) -> Result<PathBuf, ContentError> {
        let not_found = || ContentError::NotFound { id: id.to_string() };
        if id.is_empty() || id.starts_with('.') || id.contains(['/', '\\']) {
            return Err(not_found());
        }

        let mut found = post_paths(&self.blog.posts_dir, id).filter(|path| path.is_file());
        let first = found.next().ok_or_else(not_found)?;
        match found.next() {
            Some(second) => Err(ContentError::DuplicateId {
                id: id.to_string(),
                first,
                second,
            }),
            None => Ok(first),
        }
    }

    fn read_post(&self, path: &Path, id: &str, with_content: bool) -> Result<Post, ContentError> {
        let content = fs::read_to_string(path).map_err(|e| ContentError::io(path, e))?;
        let (fm, body) = FrontMatter::parse(&content);

        let title = fm.title.unwrap_or_else(|| id.to_string());
        let date = fm.date.unwrap_or_default();

        let mut post = Post::new(id.to_string(), title, date);
        post.extra = fm.extra;
        if with_content {
            post.content_html = Some(self.renderer.render(body));
        }

        Ok(post)
    }
}

/// Every file name a post with `id` could live under, in lookup order
pub(crate) fn post_paths<'p>(posts_dir: &'p Path, id: &'p str) -> impl Iterator<Item = PathBuf> + 'p {
    MARKDOWN_EXTENSIONS
        .iter()
        .map(move |ext| posts_dir.join(format!("{}.{}", id, ext)))
}

/// Post id: the file name with its extension stripped
fn post_id(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Check if a file is a markdown file
fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| MARKDOWN_EXTENSIONS.contains(&e))
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn write_post(dir: &Path, name: &str, title: &str, date: &str, body: &str) {
        let content = format!("---\ntitle: '{}'\ndate: '{}'\n---\n\n{}\n", title, date, body);
        fs::write(dir.join(name), content).unwrap();
    }

    fn setup() -> (TempDir, Blog) {
        let tmp = TempDir::new().unwrap();
        let posts = tmp.path().join("posts");
        fs::create_dir_all(&posts).unwrap();
        write_post(&posts, "pre-rendering.md", "Two Forms of Pre-rendering", "2020-01-01", "Pre-render **everything**.");
        write_post(&posts, "ssg-ssr.md", "When to Use Static Generation v.s. Server-side Rendering", "2020-01-02", "Use *SSG* when you can.");
        write_post(&posts, "same-day.markdown", "Same Day", "2020-01-01", "Tie.");
        fs::write(posts.join("notes.txt"), "not a post").unwrap();
        fs::write(posts.join(".draft.md"), "---\ntitle: hidden\n---\n").unwrap();
        fs::create_dir_all(posts.join("nested")).unwrap();
        write_post(&posts.join("nested"), "deep.md", "Deep", "2021-01-01", "Nested");

        let blog = Blog::new(tmp.path()).unwrap();
        (tmp, blog)
    }

    #[test]
    fn test_one_entry_per_file() {
        let (_tmp, blog) = setup();
        let loader = ContentLoader::new(&blog);
        let posts = loader.sorted_posts_data().unwrap();

        let ids: BTreeSet<_> = posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, BTreeSet::from(["pre-rendering", "same-day", "ssg-ssr"]));
        assert!(posts.iter().all(|p| p.content_html.is_none()));
    }

    #[test]
    fn test_sorted_newest_first_with_stable_ties() {
        let (_tmp, blog) = setup();
        let loader = ContentLoader::new(&blog);
        let posts = loader.sorted_posts_data().unwrap();

        let ids: Vec<_> = posts.iter().map(|p| p.id.as_str()).collect();
        // Equal dates keep file-name order
        assert_eq!(ids, vec!["ssg-ssr", "pre-rendering", "same-day"]);
    }

    #[test]
    fn test_all_post_ids_match_file_stems() {
        let (_tmp, blog) = setup();
        let loader = ContentLoader::new(&blog);
        let ids: BTreeSet<_> = loader
            .all_post_ids()
            .unwrap()
            .into_iter()
            .filter_map(|p| p.params.get("id").map(str::to_string))
            .collect();

        let expected: BTreeSet<_> = ["pre-rendering", "same-day", "ssg-ssr"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_post_data_known_id() {
        let (_tmp, blog) = setup();
        let loader = ContentLoader::new(&blog);
        let post = loader.post_data("pre-rendering").unwrap();

        assert_eq!(post.id, "pre-rendering");
        assert_eq!(post.title, "Two Forms of Pre-rendering");
        assert_eq!(post.date, "2020-01-01");
        assert!(post
            .content_html
            .as_deref()
            .unwrap()
            .contains("<strong>everything</strong>"));
    }

    #[test]
    fn test_post_data_markdown_extension() {
        let (_tmp, blog) = setup();
        let loader = ContentLoader::new(&blog);
        assert_eq!(loader.post_data("same-day").unwrap().title, "Same Day");
    }

    #[test]
    fn test_post_data_unknown_id() {
        let (_tmp, blog) = setup();
        let loader = ContentLoader::new(&blog);

        for id in ["missing", "notes", "", "../posts/ssg-ssr", "nested/deep", ".draft"] {
            let err = loader.post_data(id).unwrap_err();
            assert!(err.is_not_found(), "expected NotFound for {:?}, got {}", id, err);
        }
    }

    #[test]
    fn test_post_data_is_idempotent() {
        let (_tmp, blog) = setup();
        let loader = ContentLoader::new(&blog);
        let first = loader.post_data("ssg-ssr").unwrap();
        let second = loader.post_data("ssg-ssr").unwrap();
        assert_eq!(first.content_html, second.content_html);
        assert_eq!(first, second);
    }

    #[test]
    fn test_reads_fresh_content_each_call() {
        let (tmp, blog) = setup();
        let loader = ContentLoader::new(&blog);
        assert_eq!(loader.sorted_posts_data().unwrap().len(), 3);

        write_post(&tmp.path().join("posts"), "later.md", "Later", "2022-05-05", "x");
        let posts = loader.sorted_posts_data().unwrap();
        assert_eq!(posts.len(), 4);
        assert_eq!(posts[0].id, "later");
    }

    #[test]
    fn test_missing_frontmatter_falls_back_to_id() {
        let (tmp, blog) = setup();
        fs::write(tmp.path().join("posts/plain.md"), "Just text").unwrap();
        let loader = ContentLoader::new(&blog);

        let post = loader.post_data("plain").unwrap();
        assert_eq!(post.title, "plain");
        assert_eq!(post.date, "");
        // Undated posts sort last
        let posts = loader.sorted_posts_data().unwrap();
        assert_eq!(posts.last().unwrap().id, "plain");
    }

    #[test]
    fn test_same_stem_in_two_extensions_is_rejected() {
        let (tmp, blog) = setup();
        let posts = tmp.path().join("posts");
        write_post(&posts, "x.md", "From md", "2020-02-02", "md");
        write_post(&posts, "x.markdown", "From markdown", "2020-02-02", "markdown");
        let loader = ContentLoader::new(&blog);

        for err in [
            loader.sorted_posts_data().unwrap_err(),
            loader.all_post_ids().unwrap_err(),
            loader.post_data("x").unwrap_err(),
        ] {
            assert!(
                matches!(&err, ContentError::DuplicateId { id, .. } if id == "x"),
                "unexpected error: {}",
                err
            );
        }

        fs::remove_file(posts.join("x.md")).unwrap();
        let ids: Vec<_> = loader
            .all_post_ids()
            .unwrap()
            .into_iter()
            .filter_map(|p| p.params.get("id").map(str::to_string))
            .filter(|id| id == "x")
            .collect();
        assert_eq!(ids.len(), 1);
        assert_eq!(loader.post_data("x").unwrap().title, "From markdown");
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let blog = Blog::new(tmp.path()).unwrap();
        let loader = ContentLoader::new(&blog);

        let err = loader.sorted_posts_data().unwrap_err();
        assert!(matches!(err, ContentError::Io { .. }));
        assert!(matches!(loader.all_post_ids(), Err(ContentError::Io { .. })));
    }
}
