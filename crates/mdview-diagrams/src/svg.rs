//! SVG post-processing.

use std::sync::LazyLock;

use quick_xml::escape::unescape;
use regex::{Captures, Regex};

static VIEW_BOX_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"viewBox="([^"]*)""#).expect("invalid viewBox regex"));

static TITLE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<title[^>]*>(.*?)</title>").expect("invalid title regex"));

/// Add an explicit `height` taken from the first `viewBox` attribute.
///
/// Mermaid output rendered with `useMaxWidth: false` may collapse to zero
/// height in some layouts; the last `viewBox` number is the intrinsic height.
#[must_use]
pub(crate) fn fix_height(svg: &str) -> String {
    VIEW_BOX_PATTERN
        .replacen(svg, 1, |caps: &Captures| {
            let height = caps[1].split_whitespace().last().unwrap_or_default();
            format!(r#"{} height="{height}""#, &caps[0])
        })
        .into_owned()
}

/// Text of the first non-empty `<title>` element, if any.
///
/// Serialized SVG escapes character data, so entity and character references
/// are decoded; the result is plain text. Malformed references are kept as-is.
#[must_use]
pub(crate) fn extract_title(svg: &str) -> Option<String> {
    let raw = TITLE_PATTERN.captures(svg)?.get(1)?.as_str().trim();
    let title = unescape(raw).map_or_else(|_| raw.to_owned(), |text| text.trim().to_owned());
    (!title.is_empty()).then_some(title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fix_height_from_view_box() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 200 100" style="max-width: 200px;"></svg>"#;

        assert_eq!(
            fix_height(svg),
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 200 100" height="100" style="max-width: 200px;"></svg>"#
        );
    }

    #[test]
    fn test_fix_height_fractional() {
        let fixed = fix_height(r#"<svg viewBox="-8 -8 316.5 254.25"></svg>"#);

        assert!(fixed.contains(r#"height="254.25""#));
    }

    #[test]
    fn test_fix_height_only_first_view_box() {
        let svg = r#"<svg viewBox="0 0 10 20"><svg viewBox="0 0 1 2"></svg></svg>"#;
        let fixed = fix_height(svg);

        assert_eq!(fixed.matches("height=").count(), 1);
        assert!(fixed.contains(r#"viewBox="0 0 10 20" height="20""#));
    }

    #[test]
    fn test_fix_height_without_view_box() {
        let svg = "<svg width=\"10\"></svg>";

        assert_eq!(fix_height(svg), svg);
    }

    #[test]
    fn test_extract_title() {
        let svg = r#"<svg><title id="chart-title">Order flow</title><g/></svg>"#;

        assert_eq!(extract_title(svg), Some("Order flow".to_owned()));
    }

    #[test]
    fn test_extract_title_decodes_references() {
        let svg = r#"<svg viewBox="0 0 10 20"><title>Orders &amp; Payments &lt;v2&gt; &#39;EU&#x27;</title></svg>"#;

        assert_eq!(
            extract_title(svg),
            Some("Orders & Payments <v2> 'EU'".to_owned())
        );
    }

    #[test]
    fn test_extract_title_keeps_malformed_reference() {
        assert_eq!(
            extract_title("<svg><title>R&D &bogus</title></svg>"),
            Some("R&D &bogus".to_owned())
        );
    }

    #[test]
    fn test_extract_title_missing_or_empty() {
        assert_eq!(extract_title("<svg><g/></svg>"), None);
        assert_eq!(extract_title("<svg><title> </title></svg>"), None);
    }
}
