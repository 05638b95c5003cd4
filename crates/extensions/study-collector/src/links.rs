//! Anchor extraction.

use regex::Regex;
use scraper::{Html, Selector};

/// `href` values of every anchor matching `pattern`, in document order.
pub fn extract_links(html: &str, pattern: &Regex) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(anchors) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&anchors)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| pattern.is_match(href))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn study_pattern() -> Regex {
        Regex::new("^/study/[a-zA-Z0-9]+$").unwrap()
    }

    #[test]
    fn test_extracts_matching_hrefs_in_order() {
        let html = r#"
            <html><body>
              <a href="/study/abc123">One</a>
              <a href="/study/abc123/chapter1">Chapter</a>
              <a href="/study/XYZ9">Two</a>
              <a href="/study/">Index</a>
              <a href="https://lichess.org/study/zzz">Absolute</a>
              <a>No href</a>
            </body></html>
        "#;
        assert_eq!(
            extract_links(html, &study_pattern()),
            vec!["/study/abc123".to_string(), "/study/XYZ9".to_string()]
        );
    }

    #[test]
    fn test_duplicates_are_kept_for_caller() {
        let html = r#"<a href="/study/a1">x</a><a href="/study/a1">y</a>"#;
        assert_eq!(extract_links(html, &study_pattern()).len(), 2);
    }

    #[test]
    fn test_no_links() {
        assert!(extract_links("<p>empty</p>", &study_pattern()).is_empty());
    }
}
