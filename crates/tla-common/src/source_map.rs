//! Source Map v3 generation.
//!
//! Mappings are collected as absolute (line, column) pairs and encoded on
//! demand into the Base64 VLQ `mappings` string.

use serde::{Deserialize, Serialize};

/// Base64 VLQ encoding as used by the `mappings` field.
pub mod vlq {
    const BASE64_CHARS: &[u8; 64] =
        b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

    const VLQ_BASE_SHIFT: u32 = 5;
    const VLQ_BASE: u32 = 1 << VLQ_BASE_SHIFT;
    const VLQ_BASE_MASK: u32 = VLQ_BASE - 1;
    const VLQ_CONTINUATION_BIT: u32 = VLQ_BASE;

    pub fn encode(value: i32) -> String {
        let mut out = String::new();
        encode_into(value, &mut out);
        out
    }

    /// Append the encoding of `value` to `out`. The sign lives in the LSB.
    pub fn encode_into(value: i32, out: &mut String) {
        let mut vlq = if value < 0 {
            ((value.unsigned_abs()) << 1) | 1
        } else {
            (value as u32) << 1
        };

        loop {
            let mut digit = vlq & VLQ_BASE_MASK;
            vlq >>= VLQ_BASE_SHIFT;
            if vlq > 0 {
                digit |= VLQ_CONTINUATION_BIT;
            }
            out.push(BASE64_CHARS[digit as usize] as char);
            if vlq == 0 {
                break;
            }
        }
    }

    /// Decode one value from the front of `input`.
    /// Returns the value and the number of characters consumed.
    pub fn decode(input: &str) -> Option<(i32, usize)> {
        let mut result: u32 = 0;
        let mut shift = 0u32;

        for (consumed, byte) in input.bytes().enumerate() {
            let digit = BASE64_CHARS.iter().position(|&c| c == byte)? as u32;
            if shift >= 32 {
                return None;
            }
            result |= (digit & VLQ_BASE_MASK) << shift;
            if digit & VLQ_CONTINUATION_BIT == 0 {
                let negative = result & 1 == 1;
                let magnitude = (result >> 1) as i32;
                let value = if negative { -magnitude } else { magnitude };
                return Some((value, consumed + 1));
            }
            shift += VLQ_BASE_SHIFT;
        }

        None
    }
}

/// One mapping from a generated position back to an original one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
    pub generated_line: u32,
    pub generated_column: u32,
    pub source_index: u32,
    pub original_line: u32,
    pub original_column: u32,
}

/// Serialized source map (revision 3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    pub version: u32,
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_root: Option<String>,
    pub sources: Vec<String>,
    #[serde(default)]
    pub sources_content: Vec<Option<String>>,
    pub names: Vec<String>,
    pub mappings: String,
}

impl SourceMap {
    pub fn to_json(&self) -> String {
        // A struct of strings and vectors always serializes.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Shift every mapping down by `lines` generated lines, for output that
    /// gained whole lines in front of the mapped text.
    pub fn prepend_lines(&mut self, lines: usize) {
        if lines == 0 {
            return;
        }
        // Each line's first segment restarts the column; other fields are
        // relative across lines and stay valid
        let mut mappings = ";".repeat(lines);
        mappings.push_str(&self.mappings);
        self.mappings = mappings;
    }
}

pub struct SourceMapGenerator {
    file: String,
    sources: Vec<String>,
    sources_content: Vec<Option<String>>,
    mappings: Vec<Mapping>,
}

impl SourceMapGenerator {
    pub fn new(file: String) -> Self {
        SourceMapGenerator {
            file,
            sources: Vec::new(),
            sources_content: Vec::new(),
            mappings: Vec::new(),
        }
    }

    pub fn add_source_with_content(&mut self, source: String, content: String) -> u32 {
        self.sources.push(source);
        self.sources_content.push(Some(content));
        (self.sources.len() - 1) as u32
    }

    pub fn add_simple_mapping(
        &mut self,
        generated_line: u32,
        generated_column: u32,
        source_index: u32,
        original_line: u32,
        original_column: u32,
    ) {
        self.add_mapping(Mapping {
            generated_line,
            generated_column,
            source_index,
            original_line,
            original_column,
        });
    }

    fn add_mapping(&mut self, mapping: Mapping) {
        // Skip exact duplicates of the previous generated position
        if let Some(last) = self.mappings.last()
            && last.generated_line == mapping.generated_line
            && last.generated_column == mapping.generated_column
        {
            return;
        }
        self.mappings.push(mapping);
    }

    pub fn generate(&self) -> SourceMap {
        SourceMap {
            version: 3,
            file: self.file.clone(),
            source_root: None,
            sources: self.sources.clone(),
            sources_content: self.sources_content.clone(),
            names: Vec::new(),
            mappings: self.encode_mappings(),
        }
    }

    pub fn to_json(&self) -> String {
        self.generate().to_json()
    }

    fn encode_mappings(&self) -> String {
        let mut sorted: Vec<&Mapping> = self.mappings.iter().collect();
        sorted.sort_by_key(|m| (m.generated_line, m.generated_column));

        let mut out = String::new();
        let mut current_line = 0u32;
        let mut prev_generated_column = 0i32;
        let mut prev_source_index = 0i32;
        let mut prev_original_line = 0i32;
        let mut prev_original_column = 0i32;
        let mut first_in_line = true;

        for mapping in sorted {
            while current_line < mapping.generated_line {
                out.push(';');
                current_line += 1;
                prev_generated_column = 0;
                first_in_line = true;
            }

            if !first_in_line {
                out.push(',');
            }
            first_in_line = false;

            vlq::encode_into(
                mapping.generated_column as i32 - prev_generated_column,
                &mut out,
            );
            prev_generated_column = mapping.generated_column as i32;

            vlq::encode_into(mapping.source_index as i32 - prev_source_index, &mut out);
            prev_source_index = mapping.source_index as i32;

            vlq::encode_into(mapping.original_line as i32 - prev_original_line, &mut out);
            prev_original_line = mapping.original_line as i32;

            vlq::encode_into(
                mapping.original_column as i32 - prev_original_column,
                &mut out,
            );
            prev_original_column = mapping.original_column as i32;
        }

        out
    }
}
