//! Home page: the site intro and the list of all posts

use anyhow::Result;
use serde::Serialize;

use super::{PathParams, StaticRoute};
use crate::content::{ContentLoader, Post};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeProps {
    pub all_posts_data: Vec<Post>,
}

pub struct HomeRoute;

impl StaticRoute for HomeRoute {
    type Props = HomeProps;

    fn pattern(&self) -> &'static str {
        "/"
    }

    fn template(&self) -> &'static str {
        "home.html"
    }

    fn static_props(&self, loader: &ContentLoader, _params: &PathParams) -> Result<HomeProps> {
        Ok(HomeProps {
            all_posts_data: loader.sorted_posts_data()?,
        })
    }
}
