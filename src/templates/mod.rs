//! Built-in templates using the Tera template engine
//!
//! The default theme is embedded in the binary. Filters available to
//! templates:
//!
//! - `date_format(format=...)`: format a post date, date-fns style pattern
//! - `time_tag(format=...)`: same, wrapped in a `<time>` element
//! - `url_for`: prefix a site path with the configured root
//! - `post_url`: link to a post page from its id
//! - `strip_html`, `truncate_chars(length=..., omission=...)`

use anyhow::Result;
use std::collections::HashMap;
use tera::{Context, Filter, Tera, Value};

use crate::config::SiteConfig;
use crate::helpers::{encode_segment, format_date, time_tag, url_for};

/// Template renderer with the embedded default theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new(config: &SiteConfig) -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("default/layout.html")),
            ("home.html", include_str!("default/home.html")),
            ("post.html", include_str!("default/post.html")),
            ("404.html", include_str!("default/404.html")),
        ])?;

        tera.register_filter(
            "date_format",
            DateFormat {
                default_format: config.date_format.clone(),
            },
        );
        tera.register_filter(
            "time_tag",
            TimeTag {
                default_format: config.date_format.clone(),
            },
        );
        tera.register_filter(
            "url_for",
            UrlFor {
                config: config.clone(),
            },
        );
        tera.register_filter(
            "post_url",
            PostUrl {
                config: config.clone(),
            },
        );
        tera.register_filter("strip_html", strip_html_filter);
        tera.register_filter("truncate_chars", truncate_chars_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

fn format_arg(name: &str, args: &HashMap<String, Value>, default: &str) -> tera::Result<String> {
    match args.get("format") {
        Some(val) => Ok(tera::try_get_value!(name, "format", String, val)),
        None => Ok(default.to_string()),
    }
}

/// Tera filter: format a post date
struct DateFormat {
    default_format: String,
}

impl Filter for DateFormat {
    fn filter(&self, value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
        let date = tera::try_get_value!("date_format", "value", String, value);
        let format = format_arg("date_format", args, &self.default_format)?;
        Ok(Value::String(format_date(&date, &format)))
    }
}

/// Tera filter: `<time>` element for a post date
struct TimeTag {
    default_format: String,
}

impl Filter for TimeTag {
    fn filter(&self, value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
        let date = tera::try_get_value!("time_tag", "value", String, value);
        let format = format_arg("time_tag", args, &self.default_format)?;
        Ok(Value::String(time_tag(&date, &format)))
    }

    // time_tag escapes its own output
    fn is_safe(&self) -> bool {
        true
    }
}

/// Tera filter: site path with root prefix
struct UrlFor {
    config: SiteConfig,
}

impl Filter for UrlFor {
    fn filter(&self, value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
        let path = tera::try_get_value!("url_for", "value", String, value);
        Ok(Value::String(url_for(&self.config, &path)))
    }

    fn is_safe(&self) -> bool {
        true
    }
}

/// Tera filter: post id to post page URL
struct PostUrl {
    config: SiteConfig,
}

impl Filter for PostUrl {
    fn filter(&self, value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
        let id = tera::try_get_value!("post_url", "value", String, value);
        let path = format!("/posts/{}/", encode_segment(&id));
        Ok(Value::String(url_for(&self.config, &path)))
    }

    fn is_safe(&self) -> bool {
        true
    }
}

/// Tera filter: strip HTML tags, leaving plain text.
///
/// Entities are decoded so the output is escaped exactly once by autoescape.
fn strip_html_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = tera::try_get_value!("strip_html", "value", String, value);
    let mut result = String::with_capacity(s.len());
    let mut in_tag = false;
    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }
    Ok(Value::String(decode_entities(&result)))
}

/// Reverse the entity escaping done while rendering markdown
fn decode_entities(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

/// Tera filter: truncate by character count
fn truncate_chars_filter(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = tera::try_get_value!("truncate_chars", "value", String, value);
    let length = match args.get("length") {
        Some(val) => tera::try_get_value!("truncate_chars", "length", usize, val),
        None => 150,
    };
    let omission = match args.get("omission") {
        Some(val) => tera::try_get_value!("truncate_chars", "omission", String, val),
        None => "...".to_string(),
    };

    let s = s.trim();
    if s.chars().count() <= length {
        Ok(Value::String(s.to_string()))
    } else {
        let truncated: String = s.chars().take(length).collect();
        Ok(Value::String(format!("{}{}", truncated.trim_end(), omission)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_str(template: &str, context: &Context) -> String {
        let mut renderer = TemplateRenderer::new(&SiteConfig::default()).unwrap();
        renderer
            .tera
            .add_raw_template("test.html", template)
            .unwrap();
        renderer.render("test.html", context).unwrap()
    }

    #[test]
    fn test_all_templates_load() {
        let renderer = TemplateRenderer::new(&SiteConfig::default()).unwrap();
        let names: Vec<_> = renderer.tera.get_template_names().collect();
        for name in ["layout.html", "home.html", "post.html", "404.html"] {
            assert!(names.contains(&name), "missing template {}", name);
        }
    }

    #[test]
    fn test_date_filters() {
        let mut context = Context::new();
        context.insert("date", "2020-01-02");
        assert_eq!(render_str("{{ date | date_format }}", &context), "January 2, 2020");
        assert_eq!(
            render_str(r#"{{ date | date_format(format="yyyy/MM/dd") }}"#, &context),
            "2020/01/02"
        );
        assert_eq!(
            render_str("{{ date | time_tag }}", &context),
            r#"<time datetime="2020-01-02">January 2, 2020</time>"#
        );
    }

    #[test]
    fn test_url_filters() {
        let mut context = Context::new();
        context.insert("id", "hello world");
        assert_eq!(render_str("{{ id | post_url }}", &context), "/posts/hello%20world/");
        assert_eq!(render_str(r#"{{ "/" | url_for }}"#, &context), "/");
    }

    #[test]
    fn test_strip_html_escapes_once() {
        let mut context = Context::new();
        context.insert("html", "<p>A &amp; B &lt;i&gt; &amp;lt;</p>");
        assert_eq!(
            render_str("{{ html | strip_html }}", &context),
            "A &amp; B &lt;i&gt; &amp;lt;"
        );
    }

    #[test]
    fn test_text_filters() {
        let mut context = Context::new();
        context.insert("html", "<p>Hello <strong>there</strong> friend</p>");
        assert_eq!(
            render_str("{{ html | strip_html | truncate_chars(length=11) }}", &context),
            "Hello there..."
        );
    }
}
