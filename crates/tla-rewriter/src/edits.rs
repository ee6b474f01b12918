//! Pending text edits and their application.
//!
//! Edits reference offsets into the original text and are applied in a
//! single batch, so recording one never shifts the others.

use tla_common::{ByteSpan, LineMap, SourceMap, SourceMapGenerator};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Edit {
    pub span: ByteSpan,
    pub replacement: String,
}

/// Non-overlapping edits, kept sorted by start offset.
#[derive(Clone, Debug, Default)]
pub struct EditList {
    edits: Vec<Edit>,
}

impl EditList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an edit. Returns false, leaving the list unchanged, when the
    /// span overlaps one already recorded.
    pub fn push(&mut self, span: ByteSpan, replacement: String) -> bool {
        let index = self.edits.partition_point(|e| e.span.start < span.start);
        let clashes_prev = index > 0 && self.edits[index - 1].span.overlaps(span);
        let clashes_next = self.edits.get(index).is_some_and(|e| {
            e.span.overlaps(span) || (e.span.start == span.start && !span.is_empty())
        });
        if clashes_prev || clashes_next {
            return false;
        }
        self.edits.insert(index, Edit { span, replacement });
        true
    }

    /// Whether `offset` falls inside a recorded edit.
    pub fn covers(&self, offset: u32) -> bool {
        let index = self.edits.partition_point(|e| e.span.end <= offset);
        self.edits.get(index).is_some_and(|e| e.span.contains(offset))
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Apply every edit and build a source map from the output back to
    /// `source`, registered under the name `file`.
    pub fn apply(&self, source: &str, file: &str) -> (String, SourceMap) {
        let mut writer = MappedWriter::new(source, file, self.replacement_len());
        let mut cursor = 0u32;
        for edit in &self.edits {
            writer.copy(cursor, edit.span.start);
            writer.replace(&edit.replacement, edit.span.start);
            cursor = edit.span.end;
        }
        writer.copy(cursor, source.len() as u32);
        writer.finish()
    }

    fn replacement_len(&self) -> usize {
        self.edits.iter().map(|e| e.replacement.len()).sum()
    }
}

/// Output buffer that records a mapping at the start of every generated
/// line and every copied segment.
struct MappedWriter<'a> {
    source: &'a str,
    line_map: LineMap,
    generator: SourceMapGenerator,
    source_index: u32,
    out: String,
    line: u32,
    /// UTF-16 column
    column: u32,
}

impl<'a> MappedWriter<'a> {
    fn new(source: &'a str, file: &str, extra: usize) -> Self {
        let mut generator = SourceMapGenerator::new(file.to_string());
        let source_index = generator.add_source_with_content(file.to_string(), source.to_string());
        MappedWriter {
            source,
            line_map: LineMap::build(source),
            generator,
            source_index,
            out: String::with_capacity(source.len() + extra),
            line: 0,
            column: 0,
        }
    }

    fn copy(&mut self, start: u32, end: u32) {
        let text = self.source.get(start as usize..end as usize).unwrap_or("");
        self.write(text, |i| start + i as u32);
    }

    fn replace(&mut self, text: &str, origin: u32) {
        self.write(text, |_| origin);
    }

    /// Append `text`; `origin(i)` is the original offset for the generated
    /// line starting at byte `i` of `text`.
    fn write(&mut self, text: &str, origin: impl Fn(usize) -> u32) {
        if text.is_empty() {
            return;
        }
        self.map_to(origin(0));

        let bytes = text.as_bytes();
        for (i, ch) in text.char_indices() {
            let line_break = ch == '\n' || (ch == '\r' && bytes.get(i + 1) != Some(&b'\n'));
            if line_break {
                self.line += 1;
                self.column = 0;
                if i + 1 < text.len() {
                    self.map_to(origin(i + 1));
                }
            } else {
                self.column += ch.len_utf16() as u32;
            }
        }
        self.out.push_str(text);
    }

    fn map_to(&mut self, offset: u32) {
        let original = self.line_map.offset_to_position(offset, self.source);
        self.generator.add_simple_mapping(
            self.line,
            self.column,
            self.source_index,
            original.line,
            original.character,
        );
    }

    fn finish(self) -> (String, SourceMap) {
        (self.out, self.generator.generate())
    }
}
