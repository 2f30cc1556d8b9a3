//! Date helper functions

use lazy_static::lazy_static;
use regex::Regex;
use std::fmt::Write;

use crate::content::parse_date_string;

lazy_static! {
    /// Quoted literals first, then longest tokens before their prefixes
    static ref DATE_FNS_TOKEN: Regex = Regex::new(
        r"'(?:[^']|'')*'|yyyy|yy|LLLL|LLL|LL|L|MMMM|MMM|MM|M|dd|d|EEEE|EEE|HH|H|hh|h|mm|m|ss|s|a"
    )
    .expect("date token pattern is valid");
}

/// Format a post date string using a date-fns style pattern
///
/// Unparseable dates are returned unchanged.
///
/// # Examples
/// ```ignore
/// format_date("2020-01-02", "LLLL d, yyyy") // -> "January 2, 2020"
/// ```
pub fn format_date(date: &str, format: &str) -> String {
    let Some(dt) = parse_date_string(date) else {
        return date.to_string();
    };

    let chrono_format = date_fns_to_chrono_format(format);
    let mut out = String::new();
    match write!(out, "{}", dt.format(&chrono_format)) {
        Ok(()) => out,
        Err(_) => date.to_string(),
    }
}

/// Generate a <time> HTML element
pub fn time_tag(date: &str, format: &str) -> String {
    format!(
        r#"<time datetime="{}">{}</time>"#,
        escape_attr(date),
        escape_attr(&format_date(date, format))
    )
}

/// Convert a date-fns format to a chrono format
fn date_fns_to_chrono_format(format: &str) -> String {
    let mut result = String::with_capacity(format.len() * 2);
    let mut last = 0;

    for m in DATE_FNS_TOKEN.find_iter(format) {
        push_literal(&mut result, &format[last..m.start()]);
        last = m.end();

        let token = m.as_str();
        if let Some(quoted) = token.strip_prefix('\'') {
            let inner = quoted.strip_suffix('\'').unwrap_or(quoted);
            if inner.is_empty() {
                // '' is an escaped single quote
                result.push('\'');
            } else {
                push_literal(&mut result, &inner.replace("''", "'"));
            }
            continue;
        }

        let spec = match token {
            "yyyy" => "%Y",
            "yy" => "%y",
            "LLLL" | "MMMM" => "%B",
            "LLL" | "MMM" => "%b",
            "LL" | "MM" => "%m",
            "L" | "M" => "%-m",
            "dd" => "%d",
            "d" => "%-d",
            "EEEE" => "%A",
            "EEE" => "%a",
            "HH" => "%H",
            "H" => "%-H",
            "hh" => "%I",
            "h" => "%-I",
            "mm" => "%M",
            "m" => "%-M",
            "ss" => "%S",
            "s" => "%-S",
            "a" => "%p",
            other => other,
        };
        result.push_str(spec);
    }

    push_literal(&mut result, &format[last..]);
    result
}

fn push_literal(out: &mut String, text: &str) {
    out.push_str(&text.replace('%', "%%"));
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
