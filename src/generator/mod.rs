//! Generator module - renders routes to static HTML files

use anyhow::{Context as _, Result};
use indexmap::IndexMap;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tera::Context;

use crate::content::ContentLoader;
use crate::helpers::full_url_for;
use crate::routes::{HomeRoute, PathParams, PostRoute, StaticRoute};
use crate::templates::TemplateRenderer;
use crate::Blog;

/// Site-wide values available to every template as `site`
#[derive(Debug, Serialize)]
struct SiteData<'a> {
    title: &'a str,
    description: &'a str,
    author: &'a str,
    intro: &'a [String],
    url: &'a str,
    root: &'a str,
    extra: &'a IndexMap<String, serde_yaml::Value>,
}

/// Static site generator
pub struct Generator {
    blog: Blog,
    renderer: TemplateRenderer,
}

impl Generator {
    /// Create a new generator
    pub fn new(blog: &Blog) -> Result<Self> {
        let renderer = TemplateRenderer::new(&blog.config)?;
        Ok(Self {
            blog: blog.clone(),
            renderer,
        })
    }

    /// Generate the entire site, replacing any previous output.
    ///
    /// Returns the number of pages written.
    pub fn generate(&self) -> Result<usize> {
        self.prepare_public_dir()?;

        let loader = ContentLoader::new(&self.blog);
        let mut count = 0;
        count += self.generate_route(&loader, &HomeRoute)?;
        count += self.generate_route(&loader, &PostRoute::new(self.blog.config.fallback))?;

        self.generate_not_found()?;

        tracing::info!(
            "Generated {} pages into {:?}",
            count,
            self.blog.public_dir
        );
        Ok(count)
    }

    /// Render a single post page on demand and write it to the public directory
    pub fn render_post(&self, id: &str) -> Result<PathBuf> {
        let loader = ContentLoader::new(&self.blog);
        let route = PostRoute::new(self.blog.config.fallback);
        let mut params = PathParams::new();
        params.insert("id", id);
        self.render_route(&loader, &route, &params)
    }

    /// The 404 page as HTML
    pub fn render_not_found(&self) -> Result<String> {
        let mut context = self.base_context();
        context.insert("is_home", &false);
        context.insert("current_path", "/404");
        self.renderer.render("404.html", &context)
    }

    /// Render every path a route enumerates
    fn generate_route<R: StaticRoute>(&self, loader: &ContentLoader, route: &R) -> Result<usize> {
        let static_paths = route
            .static_paths(loader)
            .with_context(|| format!("Failed to enumerate paths for {}", route.pattern()))?;

        tracing::debug!(
            "Route {}: {} paths, fallback {:?}",
            route.pattern(),
            static_paths.paths.len(),
            static_paths.fallback
        );

        for path in &static_paths.paths {
            self.render_route(loader, route, &path.params)?;
        }

        Ok(static_paths.paths.len())
    }

    fn render_route<R: StaticRoute>(
        &self,
        loader: &ContentLoader,
        route: &R,
        params: &PathParams,
    ) -> Result<PathBuf> {
        let (url, file) = params.resolve(route.pattern())?;

        let props = route
            .static_props(loader, params)
            .with_context(|| format!("Failed to fetch props for {}", url))?;

        let mut context = Context::from_serialize(&props)?;
        context.extend(self.base_context());
        context.insert("is_home", &(route.pattern() == "/"));
        context.insert("current_path", &url);
        context.insert("canonical_url", &full_url_for(&self.blog.config, &url));

        let html = self
            .renderer
            .render(route.template(), &context)
            .with_context(|| format!("Failed to render {}", url))?;

        let output_path = self.blog.public_dir.join(file);
        self.write(&output_path, &html)?;
        Ok(output_path)
    }

    fn generate_not_found(&self) -> Result<()> {
        let html = self.render_not_found()?;
        self.write(&self.blog.public_dir.join("404.html"), &html)
    }

    fn base_context(&self) -> Context {
        let config = &self.blog.config;
        let site = SiteData {
            title: &config.title,
            description: &config.description,
            author: &config.author,
            intro: &config.intro,
            url: &config.url,
            root: &config.root,
            extra: &config.extra,
        };

        let mut context = Context::new();
        context.insert("site", &site);
        context
    }

    fn write(&self, output_path: &Path, html: &str) -> Result<()> {
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(output_path, html)
            .with_context(|| format!("Failed to write {:?}", output_path))?;
        tracing::debug!("Generated: {:?}", output_path);
        Ok(())
    }

    /// Start from an empty public directory so removed posts disappear
    fn prepare_public_dir(&self) -> Result<()> {
        let public_dir = &self.blog.public_dir;
        self.blog.ensure_public_dir_is_disposable()?;

        if public_dir.exists() {
            fs::remove_dir_all(public_dir)?;
        }
        fs::create_dir_all(public_dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentError;
    use tempfile::TempDir;

    fn setup(config: &str) -> (TempDir, Blog) {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("_config.yml"), config).unwrap();
        let posts = tmp.path().join("posts");
        fs::create_dir_all(&posts).unwrap();
        fs::write(
            posts.join("pre-rendering.md"),
            "---\ntitle: 'Two Forms of Pre-rendering'\ndate: '2020-01-01'\n---\n\nNext.js has **two forms**.\n",
        )
        .unwrap();
        fs::write(
            posts.join("ssg-ssr.md"),
            "---\ntitle: 'When to Use Static Generation'\ndate: '2020-01-02'\n---\n\nUse <script>alert(1)</script> wisely.\n",
        )
        .unwrap();
        let blog = Blog::new(tmp.path()).unwrap();
        (tmp, blog)
    }

    fn read(path: &Path) -> String {
        fs::read_to_string(path).unwrap()
    }

    #[test]
    fn test_generate_writes_all_pages() {
        let (_tmp, blog) = setup("title: Test Blog\nauthor: Marco\nintro:\n  - Hey, I am Marco.\n");
        let count = Generator::new(&blog).unwrap().generate().unwrap();
        assert_eq!(count, 3);

        let index = read(&blog.public_dir.join("index.html"));
        assert!(index.contains("<title>Test Blog</title>"));
        assert!(index.contains(r#"<link rel="canonical" href="http://localhost:3000/">"#));
        assert!(index.contains("Hey, I am Marco."));
        assert!(index.contains(r#"href="/posts/pre-rendering/""#));
        assert!(index.contains(r#"href="/posts/ssg-ssr/""#));
        assert!(index.contains(r#"<time datetime="2020-01-02">January 2, 2020</time>"#));
        // Newest first
        let newer = index.find("When to Use Static Generation").unwrap();
        let older = index.find("Two Forms of Pre-rendering").unwrap();
        assert!(newer < older);

        let post = read(&blog.public_dir.join("posts/pre-rendering/index.html"));
        assert!(post.contains("<title>Two Forms of Pre-rendering</title>"));
        assert!(post.contains("<strong>two forms</strong>"));
        assert!(post.contains("Back to home"));

        let unsafe_post = read(&blog.public_dir.join("posts/ssg-ssr/index.html"));
        assert!(!unsafe_post.contains("<script>alert"));

        assert!(read(&blog.public_dir.join("404.html")).contains("This page could not be found"));
    }

    #[test]
    fn test_generate_removes_stale_pages() {
        let (tmp, blog) = setup("");
        let generator = Generator::new(&blog).unwrap();
        generator.generate().unwrap();

        fs::remove_file(tmp.path().join("posts/ssg-ssr.md")).unwrap();
        assert_eq!(generator.generate().unwrap(), 2);
        assert!(!blog.public_dir.join("posts/ssg-ssr").exists());
    }

    #[test]
    fn test_generate_is_deterministic() {
        let (_tmp, blog) = setup("");
        let generator = Generator::new(&blog).unwrap();
        let page = blog.public_dir.join("posts/pre-rendering/index.html");

        generator.generate().unwrap();
        let first = read(&page);
        generator.generate().unwrap();
        assert_eq!(first, read(&page));
    }

    #[test]
    fn test_render_post_on_demand() {
        let (tmp, blog) = setup("");
        let generator = Generator::new(&blog).unwrap();
        generator.generate().unwrap();

        fs::write(
            tmp.path().join("posts/fresh.md"),
            "---\ntitle: Fresh\ndate: 2021-03-04\n---\nNew!\n",
        )
        .unwrap();
        let path = generator.render_post("fresh").unwrap();
        assert_eq!(path, blog.public_dir.join("posts/fresh/index.html"));
        assert!(read(&path).contains("March 4, 2021"));

        let err = generator.render_post("nope").unwrap_err();
        assert!(err
            .downcast_ref::<ContentError>()
            .map(ContentError::is_not_found)
            .unwrap_or(false));
    }

    #[test]
    fn test_refuses_to_overwrite_sources() {
        for public_dir in [".", "posts/..", "posts", "./posts/../posts"] {
            let (tmp, blog) = setup(&format!("public_dir: {}\n", public_dir));
            assert!(
                Generator::new(&blog).unwrap().generate().is_err(),
                "public_dir {:?} was accepted",
                public_dir
            );
            assert!(tmp.path().join("_config.yml").is_file());
            assert!(tmp.path().join("posts/pre-rendering.md").is_file());
        }
    }

    #[test]
    fn test_missing_posts_dir_fails_build() {
        let tmp = TempDir::new().unwrap();
        let blog = Blog::new(tmp.path()).unwrap();
        assert!(Generator::new(&blog).unwrap().generate().is_err());
    }
}
