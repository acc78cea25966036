use serde::Serialize;
use std::ops::Range;

const DEFAULT_INDENT: &str = "    ";

/// Information about an element's position within a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatInfo {
    pub start: PointFormatInfo,
    pub end: PointFormatInfo,
}

/// Format and position information about a point within a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PointFormatInfo {
    /// Byte offset within the file, from 0
    pub offset: usize,
    pub line_number_from1: usize,
    /// Character (not byte) column
    pub column_number_from1: usize,
    /// Number of indentation units at the start of the line
    pub indent_depth: usize,
    /// Unit of indentation, such as "\t" or "    "
    pub indent: String,
}

impl FormatInfo {
    /// Compute position info for `span` within `content`.
    pub fn for_span(content: &str, span: Range<usize>) -> Self {
        let indent = detect_indent(content);
        Self {
            start: PointFormatInfo::at(content, span.start, &indent),
            end: PointFormatInfo::at(content, span.end, &indent),
        }
    }

    /// Position info for `span` inside text that itself starts at `base`.
    ///
    /// Used by nodes that only see their parent's value rather than the whole file.
    pub fn within(base: &PointFormatInfo, text: &str, span: Range<usize>) -> Self {
        Self {
            start: PointFormatInfo::offset_from(base, text, span.start),
            end: PointFormatInfo::offset_from(base, text, span.end),
        }
    }
}

impl PointFormatInfo {
    pub fn at(content: &str, offset: usize, indent: &str) -> Self {
        let offset = floor_char_boundary(content, offset);
        let before = &content[..offset];
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let line_end = content[line_start..]
            .find('\n')
            .map(|i| line_start + i)
            .unwrap_or(content.len());

        Self {
            offset,
            line_number_from1: before.matches('\n').count() + 1,
            column_number_from1: content[line_start..offset].chars().count() + 1,
            indent_depth: indent_depth(&content[line_start..line_end], indent),
            indent: indent.to_string(),
        }
    }

    fn offset_from(base: &Self, text: &str, relative: usize) -> Self {
        let relative = floor_char_boundary(text, relative);
        let before = &text[..relative];
        let newlines = before.matches('\n').count();
        let (column, indent_depth) = match before.rfind('\n') {
            Some(i) => {
                let line_start = i + 1;
                let line_end = text[line_start..]
                    .find('\n')
                    .map(|j| line_start + j)
                    .unwrap_or(text.len());
                (
                    text[line_start..relative].chars().count() + 1,
                    indent_depth(&text[line_start..line_end], &base.indent),
                )
            }
            None => (
                base.column_number_from1 + before.chars().count(),
                base.indent_depth,
            ),
        };

        Self {
            offset: base.offset + relative,
            line_number_from1: base.line_number_from1 + newlines,
            column_number_from1: column,
            indent_depth,
            indent: base.indent.clone(),
        }
    }
}

/// Infer the indentation unit of a document: a tab if any line is
/// tab-indented, else the smallest run of leading spaces, else four spaces.
pub fn detect_indent(content: &str) -> String {
    let mut smallest: Option<usize> = None;
    for line in content.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if line.starts_with('\t') {
            return "\t".to_string();
        }
        let spaces = line.len() - line.trim_start_matches(' ').len();
        if spaces > 0 {
            smallest = Some(smallest.map_or(spaces, |s| s.min(spaces)));
        }
    }
    smallest
        .map(|n| " ".repeat(n))
        .unwrap_or_else(|| DEFAULT_INDENT.to_string())
}

fn indent_depth(line: &str, indent: &str) -> usize {
    let leading = &line[..line.len() - line.trim_start_matches([' ', '\t']).len()];
    if indent == "\t" {
        leading.matches('\t').count()
    } else if indent.is_empty() {
        0
    } else {
        leading.chars().filter(|c| *c == ' ').count() / indent.len()
    }
}

fn floor_char_boundary(text: &str, offset: usize) -> usize {
    let mut offset = offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}
