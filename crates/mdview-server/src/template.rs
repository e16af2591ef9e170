//! HTML page template.

use std::fmt::Write;

use mdview_renderer::escape_html;

use crate::listing::ListingEntry;

/// Render a complete HTML page around already rendered Markdown.
pub(crate) fn render_page(
    stylesheets: &[String],
    listing: Option<&[ListingEntry]>,
    body_html: &str,
) -> String {
    let mut html = String::with_capacity(body_html.len() + 2048);

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str("<title>mdview</title>\n");
    for href in stylesheets {
        let _ = writeln!(
            html,
            "<link rel=\"stylesheet\" href=\"{}\">",
            escape_html(href)
        );
    }
    html.push_str("</head>\n<body>\n");

    if let Some(entries) = listing {
        render_listing(&mut html, entries);
    }

    html.push_str("<article class=\"markdown-body\">\n");
    html.push_str(body_html);
    html.push_str("\n</article>\n</body>\n</html>\n");
    html
}

fn render_listing(html: &mut String, entries: &[ListingEntry]) {
    html.push_str("<nav class=\"markdown-body\">\n<ul class=\"listing\">\n");
    for entry in entries {
        let suffix = if entry.is_dir { "/" } else { "" };
        let _ = writeln!(
            html,
            "<li><a href=\"{}\">{}{suffix}</a></li>",
            escape_html(&entry.href),
            escape_html(&entry.name)
        );
    }
    html.push_str("</ul>\n</nav>\n");
}
