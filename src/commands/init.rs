//! Initialize a new blog

use anyhow::{bail, Result};
use std::fs;
use std::path::Path;

use crate::CONFIG_FILE;

const DEFAULT_CONFIG: &str = r#"# Blog configuration

# Site
title: My Blog
description: A personal blog
author: John Doe
intro:
  - Hey, I'm John. I write about the things I build.

# URL
url: http://localhost:3000
root: /

# Directory
posts_dir: posts
public_dir: out

# Writing
## date-fns style pattern used to display post dates
date_format: LLLL d, yyyy
## not_found: unknown post paths yield 404
## blocking: unknown post paths are rendered on first request
fallback: not_found
highlight:
  enable: true
  theme: base16-ocean.dark
  line_number: false
"#;

const POST_SCAFFOLD: &str = r#"---
title: '{{ title }}'
date: '{{ date }}'
---
"#;

const SAMPLE_PRE_RENDERING: &str = r#"---
title: 'Two Forms of Pre-rendering'
date: '2020-01-01'
---

There are two forms of pre-rendering: **Static Generation** and **Server-side Rendering**. The difference is in **when** it generates the HTML for a page.

- **Static Generation** is the pre-rendering method that generates the HTML at **build time**. The pre-rendered HTML is then _reused_ on each request.
- **Server-side Rendering** is the pre-rendering method that generates the HTML on **each request**.

This blog only uses Static Generation.
"#;

const SAMPLE_SSG_SSR: &str = r#"---
title: 'When to Use Static Generation v.s. Server-side Rendering'
date: '2020-01-02'
---

We recommend using **Static Generation** whenever possible because your pages can be built once and served by a CDN, which makes them much faster than having a server render the page on every request.

You can use Static Generation for many types of pages, including:

- Marketing pages
- Blog posts
- E-commerce product listings
- Help and documentation

Ask yourself: "Can I pre-render this page **ahead** of a user's request?" If the answer is yes, then you should choose Static Generation.
"#;

/// Initialize a new site in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    let config_path = target_dir.join(CONFIG_FILE);
    if config_path.exists() {
        bail!("{:?} already exists", config_path);
    }

    fs::create_dir_all(target_dir.join("posts"))?;
    fs::create_dir_all(target_dir.join("scaffolds"))?;

    fs::write(&config_path, DEFAULT_CONFIG)?;
    fs::write(target_dir.join("scaffolds/post.md"), POST_SCAFFOLD)?;

    // Sample posts
    for (name, content) in [
        ("pre-rendering.md", SAMPLE_PRE_RENDERING),
        ("ssg-ssr.md", SAMPLE_SSG_SSR),
    ] {
        let path = target_dir.join("posts").join(name);
        if !path.exists() {
            fs::write(path, content)?;
        }
    }

    Ok(())
}
