//! Single post page, one per file in the posts directory

use anyhow::{anyhow, Result};
use serde::Serialize;

use super::{PathParams, StaticPaths, StaticRoute};
use crate::config::Fallback;
use crate::content::{ContentLoader, Post};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostProps {
    pub post_data: Post,
}

pub struct PostRoute {
    fallback: Fallback,
}

impl PostRoute {
    pub fn new(fallback: Fallback) -> Self {
        Self { fallback }
    }
}

impl StaticRoute for PostRoute {
    type Props = PostProps;

    fn pattern(&self) -> &'static str {
        "/posts/[id]"
    }

    fn template(&self) -> &'static str {
        "post.html"
    }

    fn static_paths(&self, loader: &ContentLoader) -> Result<StaticPaths> {
        Ok(StaticPaths {
            paths: loader.all_post_ids()?,
            fallback: self.fallback,
        })
    }

    fn static_props(&self, loader: &ContentLoader, params: &PathParams) -> Result<PostProps> {
        let id = params
            .get("id")
            .ok_or_else(|| anyhow!("Missing id param for {}", self.pattern()))?;
        Ok(PostProps {
            post_data: loader.post_data(id)?,
        })
    }
}
