//! Diagram block extraction.
//!
//! Recognizes fenced `mermaid` blocks line by line. With HWS meaning any
//! whitespace character other than `\n` (so a `\r` before the newline counts),
//! a block is:
//!
//! ```text
//! block := open body close
//! open  := HWS* "```mermaid" HWS* "\n"
//! body  := line*                   ; shortest run, ends at the first close line
//! close := HWS* "```" HWS* ( "\n" | EOF )
//! ```
//!
//! An open line with no close line after it is not a block and stays in the
//! document as plain text. Fences nested inside other fenced blocks are not
//! tracked.

use crate::consts::DIAGRAM_LANGUAGE;

/// A fenced diagram block found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramBlock {
    /// Body text between the fence lines, including line terminators.
    pub source: String,
    /// Byte offset of the start of the opening fence line.
    pub start: usize,
    /// Byte offset just past the closing fence (before its line terminator).
    pub end: usize,
}

/// A line of the document as byte offsets.
struct Line {
    start: usize,
    /// End of line content, i.e. the position of `\n` or the document end.
    content_end: usize,
    /// Start of the next line.
    next: usize,
}

impl Line {
    fn text<'a>(&self, document: &'a str) -> &'a str {
        &document[self.start..self.content_end]
    }

    fn has_terminator(&self) -> bool {
        self.next > self.content_end
    }
}

/// Extract all diagram blocks from `document` in document order.
#[must_use]
pub fn extract(document: &str) -> Vec<DiagramBlock> {
    let lines = split_lines(document);
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let open = &lines[i];
        if !(open.has_terminator() && is_open_fence(open.text(document))) {
            i += 1;
            continue;
        }

        // Any close line after a later open would also follow this one, so an
        // unterminated open means there are no more blocks.
        let Some(close) = (i + 1..lines.len()).find(|&j| is_close_fence(lines[j].text(document)))
        else {
            break;
        };

        blocks.push(DiagramBlock {
            source: document[open.next..lines[close].start].to_owned(),
            start: open.start,
            end: lines[close].content_end,
        });
        i = close + 1;
    }

    blocks
}

fn split_lines(document: &str) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut start = 0;
    for (pos, _) in document.match_indices('\n') {
        lines.push(Line {
            start,
            content_end: pos,
            next: pos + 1,
        });
        start = pos + 1;
    }
    if start < document.len() {
        lines.push(Line {
            start,
            content_end: document.len(),
            next: document.len(),
        });
    }
    lines
}

fn is_open_fence(line: &str) -> bool {
    line.trim()
        .strip_prefix("```")
        .is_some_and(|info| info == DIAGRAM_LANGUAGE)
}

fn is_close_fence(line: &str) -> bool {
    line.trim() == "```"
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sources(document: &str) -> Vec<String> {
        extract(document).into_iter().map(|b| b.source).collect()
    }

    #[test]
    fn test_single_block() {
        let doc = "# Title\n\n```mermaid\ngraph TD\n  A --> B\n```\n\nAfter\n";
        let blocks = extract(doc);

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].source, "graph TD\n  A --> B\n");
        assert_eq!(&doc[blocks[0].start..blocks[0].end], "```mermaid\ngraph TD\n  A --> B\n```");
    }

    #[test]
    fn test_multiple_blocks_in_order() {
        let doc = "```mermaid\nfirst\n```\ntext\n```mermaid\nsecond\n```\n```mermaid\nthird\n```";

        assert_eq!(sources(doc), vec!["first\n", "second\n", "third\n"]);
    }

    #[test]
    fn test_spans_do_not_overlap_and_increase() {
        let doc = "a\n```mermaid\nx\n```\nb\n```mermaid\ny\n```\nc";
        let blocks = extract(doc);

        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].end < blocks[1].start);
        assert_eq!(&doc[blocks[1].start..blocks[1].end], "```mermaid\ny\n```");
    }

    #[test]
    fn test_surrounding_whitespace_on_fences() {
        let doc = "  ```mermaid  \ngraph LR\n \t```\t\n";

        assert_eq!(sources(doc), vec!["graph LR\n"]);
    }

    #[test]
    fn test_crlf_line_endings() {
        let doc = "```mermaid\r\ngraph LR\r\n```\r\nrest";
        let blocks = extract(doc);

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].source, "graph LR\r\n");
        // The span keeps the closing line's `\r` but not its `\n`
        assert_eq!(&doc[blocks[0].end..], "\nrest");
    }

    #[test]
    fn test_empty_body_is_a_block() {
        let blocks = extract("```mermaid\n```\n");

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].source, "");
    }

    #[test]
    fn test_unterminated_block_is_ignored() {
        assert!(extract("```mermaid\ngraph TD\n  A --> B\n").is_empty());
    }

    #[test]
    fn test_other_languages_ignored() {
        let doc = "```rust\nfn main() {}\n```\n```mermaidx\nA\n```\n``` mermaid\nB\n```\n";

        assert!(extract(doc).is_empty());
    }

    #[test]
    fn test_four_backticks_not_an_open_fence() {
        assert!(extract("````mermaid\nA\n````\n").is_empty());
    }

    #[test]
    fn test_open_fence_without_newline_at_eof() {
        assert!(extract("text\n```mermaid").is_empty());
    }

    #[test]
    fn test_close_fence_at_eof_without_newline() {
        let doc = "```mermaid\nA --> B\n```";
        let blocks = extract(doc);

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].end, doc.len());
    }

    #[test]
    fn test_fence_with_text_does_not_close() {
        let doc = "```mermaid\nA\n```mermaid\nB\n```\n";

        // The inner open line is body text, not a close line
        assert_eq!(sources(doc), vec!["A\n```mermaid\nB\n"]);
    }

    #[test]
    fn test_no_blocks() {
        assert!(extract("").is_empty());
        assert!(extract("plain text only").is_empty());
    }
}
