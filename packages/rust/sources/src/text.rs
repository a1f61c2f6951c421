//! Small HTML/text helpers shared by the parsers.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Generate a URL-safe slug from a title.
pub fn slugify(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// All text under an element, whitespace-collapsed.
pub fn element_text(el: &ElementRef<'_>) -> String {
    clean_text(&el.text().collect::<String>())
}

/// Escape text for inclusion in generated HTML.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

static META_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("meta[content]").unwrap());

/// First non-empty `<meta>` content for any of `keys`, matched on
/// `property` or `name`.
pub fn meta_content(doc: &Html, keys: &[&str]) -> Option<String> {
    for key in keys {
        for el in doc.select(&META_SEL) {
            let attrs = el.value();
            let matches = attrs.attr("property") == Some(*key) || attrs.attr("name") == Some(*key);
            if !matches {
                continue;
            }
            if let Some(content) = attrs.attr("content") {
                let content = clean_text(content);
                if !content.is_empty() {
                    return Some(content);
                }
            }
        }
    }
    None
}

/// Every `<meta>` content for `key`, in document order.
pub fn meta_contents(doc: &Html, key: &str) -> Vec<String> {
    doc.select(&META_SEL)
        .filter(|el| {
            el.value().attr("property") == Some(key) || el.value().attr("name") == Some(key)
        })
        .filter_map(|el| el.value().attr("content").map(clean_text))
        .filter(|c| !c.is_empty())
        .collect()
}

/// Text of the first element matching `selector`.
pub fn first_text(doc: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    doc.select(&sel)
        .map(|el| element_text(&el))
        .find(|t| !t.is_empty())
}

/// Page title: `og:title`, then the first `<h1>`, then `<title>`.
pub fn page_title(doc: &Html) -> Option<String> {
    meta_content(doc, &["og:title", "twitter:title"])
        .or_else(|| first_text(doc, "h1"))
        .or_else(|| first_text(doc, "title"))
}

/// Resolve a possibly-relative reference against `base`, keeping only http(s).
pub fn resolve_url(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("data:")
    {
        return None;
    }
    let mut resolved = base.join(href).ok()?;
    if resolved.scheme() != "http" && resolved.scheme() != "https" {
        return None;
    }
    resolved.set_fragment(None);
    Some(resolved)
}

/// Split a comma/slash separated list ("A, B & C") into trimmed names.
pub fn split_list(text: &str) -> Vec<String> {
    text.split([',', '/', '|', ';'])
        .flat_map(|part| part.split(" & "))
        .flat_map(|part| part.split(" and "))
        .map(clean_text)
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_titles() {
        assert_eq!(slugify("Devara: Part 1 Review!"), "devara-part-1-review");
        assert_eq!(slugify("  Kalki 2898 AD  "), "kalki-2898-ad");
    }

    #[test]
    fn meta_lookup_prefers_first_key() {
        let doc = Html::parse_document(
            r#"<html><head>
                <meta name="description" content="plain">
                <meta property="og:description" content="  open   graph ">
            </head></html>"#,
        );
        assert_eq!(
            meta_content(&doc, &["og:description", "description"]).as_deref(),
            Some("open graph")
        );
        assert_eq!(meta_content(&doc, &["twitter:card"]), None);
    }

    #[test]
    fn resolve_skips_non_http() {
        let base = Url::parse("https://reviews.example.com/telugu/").unwrap();
        assert_eq!(
            resolve_url(&base, "../movie/devara#top").unwrap().as_str(),
            "https://reviews.example.com/movie/devara"
        );
        assert!(resolve_url(&base, "mailto:desk@example.com").is_none());
        assert!(resolve_url(&base, "data:image/png;base64,AAAA").is_none());
    }

    #[test]
    fn split_lists() {
        assert_eq!(
            split_list("NTR Jr, Saif Ali Khan & Janhvi Kapoor"),
            vec!["NTR Jr", "Saif Ali Khan", "Janhvi Kapoor"]
        );
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_html("<b>\"A&B\"</b>"), "&lt;b&gt;&quot;A&amp;B&quot;&lt;/b&gt;");
    }
}
