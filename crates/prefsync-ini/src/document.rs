//! Line-oriented INI document with byte-preserving edits

/// One physical line of the document, stored without its terminator.
#[derive(Debug, Clone)]
struct Line {
    text: String,
    /// `"\n"`, `"\r\n"`, or empty for an unterminated final line.
    terminator: String,
    kind: LineKind,
}

#[derive(Debug, Clone, PartialEq)]
enum LineKind {
    Blank,
    Comment,
    Section {
        /// Header name, trimmed of surrounding whitespace for lookup.
        name: String,
    },
    KeyValue {
        /// Key, trimmed for lookup; raw spelling stays in `text`.
        key: String,
        /// Byte span of the trimmed value inside `text`.
        value_start: usize,
        value_end: usize,
    },
    Continuation {
        /// Trimmed content, joined onto the preceding key's value.
        value: String,
    },
    /// A line that fits no other class (e.g. stray un-indented text).
    Other,
}

/// A parsed INI document that re-emits unmodified input byte for byte.
///
/// Sections and keys are matched case-sensitively after trimming surrounding
/// whitespace. The empty section name addresses the preamble before the
/// first header.
#[derive(Debug, Clone)]
pub struct IniDocument {
    lines: Vec<Line>,
    /// Terminator used for newly inserted lines (first one seen in input).
    newline: String,
    ends_with_newline: bool,
}

impl IniDocument {
    /// Parse raw INI text. Never fails: unclassifiable lines are kept
    /// verbatim and ignored by lookups.
    pub fn parse(input: &str) -> Self {
        let mut lines = Vec::new();
        let mut newline: Option<String> = None;
        // Indent of the preceding key-value or continuation line, if any.
        let mut prev_indent: Option<usize> = None;

        for chunk in split_inclusive_lines(input) {
            let (text, terminator) = if let Some(stripped) = chunk.strip_suffix("\r\n") {
                (stripped, "\r\n")
            } else if let Some(stripped) = chunk.strip_suffix('\n') {
                (stripped, "\n")
            } else {
                (chunk, "")
            };
            if newline.is_none() && !terminator.is_empty() {
                newline = Some(terminator.to_string());
            }

            let kind = classify(text, prev_indent);
            prev_indent = if matches!(
                kind,
                LineKind::KeyValue { .. } | LineKind::Continuation { .. }
            ) {
                Some(indent_of(text))
            } else {
                None
            };
            lines.push(Line {
                text: text.to_string(),
                terminator: terminator.to_string(),
                kind,
            });
        }

        Self {
            lines,
            newline: newline.unwrap_or_else(|| "\n".to_string()),
            ends_with_newline: input.ends_with('\n') || input.is_empty(),
        }
    }

    /// Look up a value. Continuation lines are appended to the key's own
    /// value, space-joined in physical order. Returns `None` when the
    /// section or key is absent.
    pub fn get(&self, section: &str, key: &str) -> Option<String> {
        let key = key.trim();
        let (start, end) = self.section_bounds(section)?;
        for i in start..end {
            if let LineKind::KeyValue {
                key: k,
                value_start,
                value_end,
            } = &self.lines[i].kind
            {
                if k == key {
                    let mut parts: Vec<&str> = Vec::new();
                    let base = &self.lines[i].text[*value_start..*value_end];
                    if !base.is_empty() {
                        parts.push(base);
                    }
                    for line in &self.lines[i + 1..end] {
                        match &line.kind {
                            LineKind::Continuation { value } => {
                                if !value.is_empty() {
                                    parts.push(value);
                                }
                            }
                            _ => break,
                        }
                    }
                    return Some(parts.join(" "));
                }
            }
        }
        None
    }

    /// Write a value.
    ///
    /// An existing key has only its value span rewritten; delimiter,
    /// spacing, and any continuation lines after it are left alone. A
    /// missing key is appended to its section as `Key = Value`; a missing
    /// section is appended to the document followed by the new line.
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        let key = key.trim();
        if let Some((start, end)) = self.section_bounds(section) {
            for i in start..end {
                if let LineKind::KeyValue {
                    key: k,
                    value_start,
                    value_end,
                } = &self.lines[i].kind
                {
                    if k == key {
                        let (vs, ve) = (*value_start, *value_end);
                        let line = &mut self.lines[i];
                        let mut text = String::with_capacity(line.text.len() + value.len());
                        text.push_str(&line.text[..vs]);
                        text.push_str(value);
                        text.push_str(&line.text[ve..]);
                        line.text = text;
                        line.kind = LineKind::KeyValue {
                            key: key.to_string(),
                            value_start: vs,
                            value_end: vs + value.len(),
                        };
                        return;
                    }
                }
            }
            // Key missing: append after the last non-blank line of the
            // block so blank separators between sections stay where
            // they are.
            let mut at = start;
            for i in start..end {
                if self.lines[i].kind != LineKind::Blank {
                    at = i + 1;
                }
            }
            self.insert_line(at, canonical_line(key, value));
            return;
        }
        // Section missing entirely.
        let at = self.lines.len();
        self.insert_line(
            at,
            Line {
                text: format!("[{section}]"),
                terminator: String::new(),
                kind: LineKind::Section {
                    name: section.trim().to_string(),
                },
            },
        );
        let at = self.lines.len();
        self.insert_line(at, canonical_line(key, value));
    }

    /// Names of all section headers, in document order.
    pub fn sections(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter_map(|line| match &line.kind {
                LineKind::Section { name } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Keys of one section, in document order.
    pub fn keys(&self, section: &str) -> Vec<&str> {
        let Some((start, end)) = self.section_bounds(section) else {
            return Vec::new();
        };
        self.lines[start..end]
            .iter()
            .filter_map(|line| match &line.kind {
                LineKind::KeyValue { key, .. } => Some(key.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Re-emit the document. Unmodified input reproduces itself exactly.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(&line.text);
            out.push_str(&line.terminator);
        }
        out
    }

    /// Line range of a section's body: `(first_line, one_past_last)`.
    /// The empty name addresses the preamble before the first header.
    fn section_bounds(&self, section: &str) -> Option<(usize, usize)> {
        let section = section.trim();
        let mut start = None;
        if section.is_empty() {
            start = Some(0);
        }
        for (i, line) in self.lines.iter().enumerate() {
            if let LineKind::Section { name } = &line.kind {
                match start {
                    Some(s) => return Some((s, i)),
                    None if name == section => start = Some(i + 1),
                    None => {}
                }
            }
        }
        start.map(|s| (s, self.lines.len()))
    }

    fn insert_line(&mut self, at: usize, mut line: Line) {
        if at >= self.lines.len() {
            if let Some(last) = self.lines.last_mut() {
                if last.terminator.is_empty() {
                    last.terminator = self.newline.clone();
                }
            }
            line.terminator = if self.ends_with_newline || self.lines.is_empty() {
                self.newline.clone()
            } else {
                String::new()
            };
        } else {
            line.terminator = self.newline.clone();
        }
        self.lines.insert(at, line);
    }
}

fn canonical_line(key: &str, value: &str) -> Line {
    let text = format!("{key} = {value}");
    let value_start = key.len() + 3;
    Line {
        text,
        terminator: String::new(),
        kind: LineKind::KeyValue {
            key: key.to_string(),
            value_start,
            value_end: value_start + value.len(),
        },
    }
}

fn classify(text: &str, prev_indent: Option<usize>) -> LineKind {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return LineKind::Blank;
    }
    if trimmed.starts_with(';') || trimmed.starts_with('#') {
        return LineKind::Comment;
    }
    if trimmed.starts_with('[') && trimmed.ends_with(']') {
        return LineKind::Section {
            name: trimmed[1..trimmed.len() - 1].trim().to_string(),
        };
    }
    if let Some(delim) = find_delimiter(text) {
        let key = text[..delim].trim().to_string();
        let after_start = delim + 1;
        let after = &text[after_start..];
        let value = after.trim();
        let (value_start, value_end) = if value.is_empty() {
            (text.len(), text.len())
        } else {
            let start = after_start + (after.len() - after.trim_start().len());
            (start, start + value.len())
        };
        return LineKind::KeyValue {
            key,
            value_start,
            value_end,
        };
    }
    if let Some(prev) = prev_indent {
        if indent_of(text) > prev {
            return LineKind::Continuation {
                value: trimmed.to_string(),
            };
        }
    }
    LineKind::Other
}

/// Byte index of the first unescaped `=` or `:`, if any.
fn find_delimiter(text: &str) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => return Some(i),
            _ => {}
        }
    }
    None
}

fn indent_of(text: &str) -> usize {
    text.chars().take_while(|c| c.is_whitespace()).count()
}

/// Like `str::split_inclusive('\n')` but yields nothing for empty input.
fn split_inclusive_lines(input: &str) -> impl Iterator<Item = &str> {
    input.split_inclusive('\n')
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "; top comment\n\
                          [Main]\n\
                          key = value\n\
                          other: second  \n\
                          \n\
                          [Sub Section]\n\
                          \t# indented comment\n\
                          path=C:\\tmp\n";

    #[test]
    fn roundtrip_unmodified() {
        let doc = IniDocument::parse(SAMPLE);
        assert_eq!(doc.to_text(), SAMPLE);
    }

    #[test]
    fn roundtrip_no_trailing_newline() {
        let input = "[A]\nk = v";
        let doc = IniDocument::parse(input);
        assert_eq!(doc.to_text(), input);
    }

    #[test]
    fn roundtrip_crlf() {
        let input = "[A]\r\nk = v\r\n";
        let doc = IniDocument::parse(input);
        assert_eq!(doc.to_text(), input);
    }

    #[test]
    fn get_trims_and_matches_case_sensitively() {
        let doc = IniDocument::parse(SAMPLE);
        assert_eq!(doc.get("Main", "key").as_deref(), Some("value"));
        assert_eq!(doc.get("Main", "other").as_deref(), Some("second"));
        assert_eq!(doc.get("main", "key"), None);
        assert_eq!(doc.get("Main", "KEY"), None);
    }

    #[test]
    fn colon_delimiter_and_escaped_delimiters() {
        let doc = IniDocument::parse("[S]\na\\=b = c\n");
        assert_eq!(doc.get("S", "a\\=b").as_deref(), Some("c"));
    }

    #[test]
    fn continuation_lines_join_with_spaces() {
        let input = "[S]\nkey = first\n    second\n    third\nnext = x\n";
        let doc = IniDocument::parse(input);
        assert_eq!(doc.get("S", "key").as_deref(), Some("first second third"));
        assert_eq!(doc.get("S", "next").as_deref(), Some("x"));
    }

    #[test]
    fn continuation_requires_deeper_indent() {
        let input = "[S]\n  key = a\n  same\n";
        let doc = IniDocument::parse(input);
        // Same indent as the key line: not a continuation.
        assert_eq!(doc.get("S", "key").as_deref(), Some("a"));
    }

    #[test]
    fn set_existing_key_touches_only_value_span() {
        let mut doc = IniDocument::parse(SAMPLE);
        doc.set("Main", "other", "replaced");
        let out = doc.to_text();
        assert!(out.contains("other: replaced  \n"));
        // Every other line is untouched.
        for (a, b) in SAMPLE.lines().zip(out.lines()) {
            if !a.starts_with("other") {
                assert_eq!(a, b);
            }
        }
        assert_eq!(doc.get("Main", "other").as_deref(), Some("replaced"));
    }

    #[test]
    fn set_preserves_continuations() {
        let mut doc = IniDocument::parse("[S]\nkey = a\n    b\n");
        doc.set("S", "key", "z");
        assert_eq!(doc.to_text(), "[S]\nkey = z\n    b\n");
        assert_eq!(doc.get("S", "key").as_deref(), Some("z b"));
    }

    #[test]
    fn set_missing_key_appends_before_blank_separator() {
        let mut doc = IniDocument::parse("[A]\nk = v\n\n[B]\nx = y\n");
        doc.set("A", "new", "1");
        assert_eq!(doc.to_text(), "[A]\nk = v\nnew = 1\n\n[B]\nx = y\n");
    }

    #[test]
    fn set_missing_section_appends_header_and_line() {
        let mut doc = IniDocument::parse("[A]\nk = v\n");
        doc.set("B", "x", "y");
        assert_eq!(doc.to_text(), "[A]\nk = v\n[B]\nx = y\n");
        assert_eq!(doc.get("B", "x").as_deref(), Some("y"));
    }

    #[test]
    fn set_on_empty_document() {
        let mut doc = IniDocument::parse("");
        doc.set("A", "k", "v");
        assert_eq!(doc.to_text(), "[A]\nk = v\n");
    }

    #[test]
    fn preamble_addressed_by_empty_section() {
        let mut doc = IniDocument::parse("top = 1\n[A]\nk = v\n");
        assert_eq!(doc.get("", "top").as_deref(), Some("1"));
        doc.set("", "top", "2");
        assert_eq!(doc.to_text(), "top = 2\n[A]\nk = v\n");
    }

    #[test]
    fn sections_and_keys_enumeration() {
        let doc = IniDocument::parse(SAMPLE);
        assert_eq!(doc.sections(), vec!["Main", "Sub Section"]);
        assert_eq!(doc.keys("Main"), vec!["key", "other"]);
    }

    #[test]
    fn empty_value_lookup_and_replace() {
        let mut doc = IniDocument::parse("[S]\nk =\n");
        assert_eq!(doc.get("S", "k").as_deref(), Some(""));
        doc.set("S", "k", "now");
        assert_eq!(doc.get("S", "k").as_deref(), Some("now"));
        assert!(doc.to_text().starts_with("[S]\nk ="));
    }
}
