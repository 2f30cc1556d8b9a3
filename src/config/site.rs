//! Site configuration (_config.yml)

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub author: String,
    /// Paragraphs shown above the post list on the home page
    pub intro: Vec<String>,

    // URL
    pub url: String,
    pub root: String,

    // Directory
    pub posts_dir: String,
    pub public_dir: String,

    /// Display format for post dates, date-fns style (`LLLL d, yyyy`)
    pub date_format: String,

    /// What happens to `/posts/<id>` paths that were not generated
    pub fallback: Fallback,

    #[serde(default)]
    pub highlight: HighlightConfig,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "My Blog".to_string(),
            description: String::new(),
            author: "John Doe".to_string(),
            intro: Vec::new(),

            url: "http://localhost:3000".to_string(),
            root: "/".to_string(),

            posts_dir: "posts".to_string(),
            public_dir: "out".to_string(),

            date_format: "LLLL d, yyyy".to_string(),
            fallback: Fallback::NotFound,
            highlight: HighlightConfig::default(),
            extra: IndexMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {:?}", path))?;

        // serde_yaml rejects documents without any node
        let is_blank = content
            .lines()
            .all(|l| l.trim().is_empty() || l.trim_start().starts_with('#'));
        if is_blank {
            return Ok(Self::default());
        }

        let config: SiteConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config {:?}", path))?;
        Ok(config)
    }
}

/// Fallback policy for dynamic paths that were not generated at build time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Fallback {
    /// Unknown paths yield 404
    #[default]
    NotFound,
    /// Unknown paths are rendered on first request, then served statically
    Blocking,
}

/// Code highlighting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub enable: bool,
    pub theme: String,
    pub line_number: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            enable: true,
            theme: "base16-ocean.dark".to_string(),
            line_number: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.posts_dir, "posts");
        assert_eq!(config.public_dir, "out");
        assert_eq!(config.fallback, Fallback::NotFound);
        assert!(config.highlight.enable);
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
title: Marco's Blog
author: Marco
intro:
  - Hey, I'm Marco.
  - I write things.
fallback: blocking
highlight:
  line_number: true
github_username: marco
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "Marco's Blog");
        assert_eq!(config.author, "Marco");
        assert_eq!(config.intro.len(), 2);
        assert_eq!(config.fallback, Fallback::Blocking);
        assert!(config.highlight.line_number);
        assert_eq!(config.highlight.theme, "base16-ocean.dark");
        assert_eq!(
            config.extra.get("github_username").and_then(|v| v.as_str()),
            Some("marco")
        );
        // Unspecified keys keep their defaults
        assert_eq!(config.posts_dir, "posts");
    }

    #[test]
    fn test_load_blank_config() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("_config.yml");
        std::fs::write(&path, "# nothing yet\n\n").unwrap();
        let config = SiteConfig::load(&path).unwrap();
        assert_eq!(config.title, SiteConfig::default().title);
    }
}
