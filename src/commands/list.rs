//! List site content

use anyhow::Result;

use crate::content::ContentLoader;
use crate::routes::{HomeRoute, PostRoute, StaticRoute};
use crate::server::API_ROUTES;
use crate::Blog;

/// List site content by type
pub fn run(blog: &Blog, content_type: &str) -> Result<()> {
    let loader = ContentLoader::new(blog);

    match content_type {
        "post" | "posts" => {
            let posts = loader.sorted_posts_data()?;
            println!("Posts ({}):", posts.len());
            for post in posts {
                println!("  {} - {} [{}]", display_date(&post.date), post.title, post.id);
            }
        }
        "id" | "ids" => {
            for path in loader.all_post_ids()? {
                if let Some(id) = path.params.get("id") {
                    println!("{}", id);
                }
            }
        }
        "route" | "routes" => {
            let routes = routes(&loader, blog)?;
            println!("Routes ({}):", routes.len());
            for route in routes {
                println!("  {}", route);
            }
        }
        _ => {
            anyhow::bail!(
                "Unknown type: {}. Available: post, id, route",
                content_type
            );
        }
    }

    Ok(())
}

/// Every URL the site answers: generated pages plus API endpoints
pub fn routes(loader: &ContentLoader, blog: &Blog) -> Result<Vec<String>> {
    let mut urls = Vec::new();
    collect(&mut urls, loader, &HomeRoute)?;
    collect(&mut urls, loader, &PostRoute::new(blog.config.fallback))?;
    urls.extend(API_ROUTES.iter().map(|r| r.to_string()));
    Ok(urls)
}

fn collect<R: StaticRoute>(urls: &mut Vec<String>, loader: &ContentLoader, route: &R) -> Result<()> {
    for path in route.static_paths(loader)?.paths {
        let (url, _) = path.params.resolve(route.pattern())?;
        urls.push(url);
    }
    Ok(())
}

fn display_date(date: &str) -> &str {
    if date.is_empty() {
        "----------"
    } else {
        date
    }
}
