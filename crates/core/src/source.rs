//! Locating the timetable PDF on a listing page.

use std::borrow::Cow;

use scraper::{Html, Selector};
use url::Url;

/// Whether an anchor target is a PDF whose (percent-decoded) text contains
/// `pattern`, both compared case-insensitively.
fn matches_pdf_link(href: &str, pattern: &str) -> bool {
    let decoded = urlencoding::decode(href).unwrap_or(Cow::Borrowed(href));
    let decoded = decoded.to_lowercase();
    decoded.ends_with(".pdf") && decoded.contains(&pattern.to_lowercase())
}

/// Finds the first `<a href>` ending in `.pdf` whose target contains
/// `pattern` and resolves it against `listing_url`.
pub fn discover_pdf_url(html: &str, listing_url: &str, pattern: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a[href]").ok()?;

    let href = document
        .select(&selector)
        .filter_map(|anchor| anchor.value().attr("href"))
        .map(str::trim)
        .find(|href| matches_pdf_link(href, pattern))?;

    resolve_url(listing_url, href)
}

/// Resolves `href` against the page it was found on.
pub fn resolve_url(base: &str, href: &str) -> Option<String> {
    let joined = Url::parse(base).ok()?.join(href.trim()).ok()?;
    Some(joined.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "https://school.example/orar/index.html";

    #[test]
    fn test_discover_relative_link() {
        let html = r#"<a href="docs/news.pdf">News</a> <a href="files/Orar_Liceu_2026.PDF">Orar</a>"#;
        assert_eq!(
            discover_pdf_url(html, LISTING, "orar_liceu"),
            Some("https://school.example/orar/files/Orar_Liceu_2026.PDF".into())
        );
    }

    #[test]
    fn test_discover_absolute_and_root_links() {
        let html = r#"<a href='https://cdn.example/x/orar-gimnaziu.pdf'>x</a>"#;
        assert_eq!(
            discover_pdf_url(html, LISTING, "gimnaziu"),
            Some("https://cdn.example/x/orar-gimnaziu.pdf".into())
        );

        let html = r#"<a href="/uploads/orar.pdf">x</a>"#;
        assert_eq!(
            discover_pdf_url(html, LISTING, "orar"),
            Some("https://school.example/uploads/orar.pdf".into())
        );
    }

    #[test]
    fn test_discover_percent_encoded_link() {
        let html = r#"<p><a href="orar%20liceu.pdf">Orar liceu</a></p>"#;
        assert_eq!(
            discover_pdf_url(html, LISTING, "Orar Liceu"),
            Some("https://school.example/orar/orar%20liceu.pdf".into())
        );
    }

    #[test]
    fn test_discover_ignores_non_anchor_markup() {
        let html = r#"<link href="orar-style.pdf"><a>orar.pdf</a><a href="orar.pdf.html">x</a>"#;
        assert_eq!(discover_pdf_url(html, LISTING, "orar"), None);
    }

    #[test]
    fn test_discover_pattern_is_literal() {
        let html = r#"<a href="orarXliceu.pdf">x</a>"#;
        assert_eq!(discover_pdf_url(html, LISTING, "orar.liceu"), None);
    }

    #[test]
    fn test_discover_no_match() {
        assert_eq!(discover_pdf_url("<p>nothing</p>", LISTING, "orar"), None);
    }

    #[test]
    fn test_resolve_url_shapes() {
        assert_eq!(
            resolve_url("https://a.example/x/y?page=2", "../z.pdf").as_deref(),
            Some("https://a.example/z.pdf")
        );
        assert_eq!(
            resolve_url("http://a.example", "z.pdf").as_deref(),
            Some("http://a.example/z.pdf")
        );
        assert_eq!(
            resolve_url("https://a.example/x/", "//cdn.example/z.pdf").as_deref(),
            Some("https://cdn.example/z.pdf")
        );
    }

    #[test]
    fn test_resolve_url_base_with_query() {
        assert_eq!(
            resolve_url("https://school.example?lang=ro", "orarliceu.pdf").as_deref(),
            Some("https://school.example/orarliceu.pdf")
        );
    }

    #[test]
    fn test_resolve_url_query_only_href() {
        assert_eq!(
            resolve_url("https://school.example/a/b", "?f=orar.pdf").as_deref(),
            Some("https://school.example/a/b?f=orar.pdf")
        );
    }

    #[test]
    fn test_resolve_url_invalid_base() {
        assert_eq!(resolve_url("not a url", "orar.pdf"), None);
    }
}
