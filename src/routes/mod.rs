//! Routes - the pages produced at build time
//!
//! A route names a URL pattern and a template, enumerates the concrete paths
//! it should be generated for, and fetches the props each path renders with.
//! Patterns use `[name]` for dynamic segments, e.g. `/posts/[id]`.

mod home;
mod post;

pub use home::{HomeProps, HomeRoute};
pub use post::{PostProps, PostRoute};

use anyhow::{anyhow, Result};
use indexmap::IndexMap;
use percent_encoding::percent_decode_str;
use serde::Serialize;
use std::path::PathBuf;

use crate::config::Fallback;
use crate::content::ContentLoader;
use crate::helpers::encode_segment;

/// Values for the dynamic segments of a route pattern
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PathParams(IndexMap<String, String>);

impl PathParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Fill in `pattern`, returning the public URL and the output file
    /// relative to the public directory
    pub fn resolve(&self, pattern: &str) -> Result<(String, PathBuf)> {
        let mut url = String::from("/");
        let mut file = PathBuf::new();

        for segment in pattern.split('/').filter(|s| !s.is_empty()) {
            let value = match dynamic_name(segment) {
                Some(name) => self
                    .get(name)
                    .filter(|v| is_safe_segment(v))
                    .ok_or_else(|| anyhow!("Missing or invalid param {:?} for {}", name, pattern))?,
                None => segment,
            };
            url.push_str(&encode_segment(value));
            url.push('/');
            file.push(value);
        }

        file.push("index.html");
        Ok((url, file))
    }

    /// Match a request path against `pattern`, extracting dynamic segments
    pub fn match_pattern(pattern: &str, path: &str) -> Option<Self> {
        let pattern_segments: Vec<_> = pattern.split('/').filter(|s| !s.is_empty()).collect();
        let path_segments: Vec<_> = path.split('/').filter(|s| !s.is_empty()).collect();
        if pattern_segments.len() != path_segments.len() {
            return None;
        }

        let mut params = PathParams::new();
        for (expected, actual) in pattern_segments.iter().zip(path_segments) {
            let actual = percent_decode_str(actual).decode_utf8().ok()?;
            match dynamic_name(expected) {
                Some(name) if is_safe_segment(&actual) => params.insert(name, actual),
                Some(_) => return None,
                None if *expected == actual => {}
                None => return None,
            }
        }
        Some(params)
    }
}

/// `[id]` -> `Some("id")`
fn dynamic_name(segment: &str) -> Option<&str> {
    segment.strip_prefix('[')?.strip_suffix(']')
}

fn is_safe_segment(value: &str) -> bool {
    !value.is_empty() && value != "." && value != ".." && !value.contains(['/', '\\'])
}

/// One concrete path of a dynamic route
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StaticPath {
    pub params: PathParams,
}

impl StaticPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key, value);
        self
    }
}

/// Paths to generate for a route, and what to do about the rest
#[derive(Debug, Clone, Serialize)]
pub struct StaticPaths {
    pub paths: Vec<StaticPath>,
    pub fallback: Fallback,
}

/// A page generated at build time
pub trait StaticRoute {
    /// Data handed to the template
    type Props: Serialize;

    /// URL pattern, e.g. `/posts/[id]`
    fn pattern(&self) -> &'static str;

    /// Template used to render the page
    fn template(&self) -> &'static str;

    /// Enumerate the paths to generate. Static routes have exactly one.
    fn static_paths(&self, _loader: &ContentLoader) -> Result<StaticPaths> {
        Ok(StaticPaths {
            paths: vec![StaticPath::new()],
            fallback: Fallback::NotFound,
        })
    }

    /// Fetch props for one path
    fn static_props(&self, loader: &ContentLoader, params: &PathParams) -> Result<Self::Props>;
}
