/*!
 * Immutable screenplay document with a line-split view.
 *
 * All positions are byte offsets into the original text and always fall on
 * character boundaries, so `&text[start..end]` is valid for any span
 * produced here.
 */

/// One line of the document, without its terminator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSpan {
    /// Zero-based line number
    pub index: usize,
    /// Offset of the first byte of the line
    pub start: usize,
    /// Offset one past the last content byte (newline and `\r` excluded)
    pub end: usize,
}

/// Raw document text plus its line index
#[derive(Debug, Clone)]
pub struct Document {
    text: String,
    lines: Vec<LineSpan>,
}

impl Document {
    /// Build the document and its line view
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut lines = Vec::new();
        let mut start = 0;

        for (index, segment) in text.split('\n').enumerate() {
            let end = start + segment.len();
            let content_end = if segment.ends_with('\r') { end - 1 } else { end };
            lines.push(LineSpan {
                index,
                start,
                end: content_end,
            });
            start = end + 1;
        }

        Self { text, lines }
    }

    /// Full raw text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Line spans in document order
    pub fn lines(&self) -> &[LineSpan] {
        &self.lines
    }

    /// Text of one line
    pub fn line_text(&self, span: &LineSpan) -> &str {
        &self.text[span.start..span.end]
    }

    /// Lines starting at or after `offset`
    pub fn lines_from(&self, offset: usize) -> impl Iterator<Item = (&LineSpan, &str)> {
        self.lines
            .iter()
            .filter(move |span| span.start >= offset)
            .map(move |span| (span, self.line_text(span)))
    }

    /// Substring between two offsets, clamped to the document
    pub fn slice(&self, start: usize, end: usize) -> &str {
        let end = end.min(self.text.len());
        let start = start.min(end);
        self.text.get(start..end).unwrap_or("")
    }
}
