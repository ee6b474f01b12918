//! Scanner - tokenizer state machine.
//!
//! Produces one token per call to [`ScannerState::scan`]. Unlike a parser-driven
//! scanner, this one decides on its own whether `/` starts a regular expression
//! (from the previous significant token) and when a `}` resumes a template
//! literal (from a stack of open `${` substitutions). That makes a single
//! forward pass enough to tokenize a whole module.
//!
//! With [`LanguageVariant::Jsx`] the scanner also tracks open JSX elements.
//! Child text becomes one opaque [`SyntaxKind::JsxText`] token, while `{ ... }`
//! children and attribute values are scanned as ordinary code.

use bitflags::bitflags;
use tla_common::ByteSpan;

use crate::char_codes::{
    LINE_SEPARATOR, PARAGRAPH_SEPARATOR, is_digit, is_hex_digit, is_identifier_part,
    is_identifier_start, is_white_space_single_line,
};
use crate::syntax_kind::{SyntaxKind, text_to_keyword, token_is_comment};

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct TokenFlags: u8 {
        /// A line terminator appears between the previous token and this one.
        const PRECEDING_LINE_BREAK = 1 << 0;
        /// String, template, comment or regex that hit end of line/file unclosed.
        const UNTERMINATED = 1 << 1;
    }
}

/// Whether `<` in expression position may open a JSX element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LanguageVariant {
    #[default]
    Standard,
    Jsx,
}

impl LanguageVariant {
    /// JSX for `.jsx`/`.tsx` module ids (query strings ignored).
    pub fn from_path(id: &str) -> Self {
        let path = id.split(['?', '#']).next().unwrap_or(id);
        if path.ends_with(".jsx") || path.ends_with(".tsx") {
            LanguageVariant::Jsx
        } else {
            LanguageVariant::Standard
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum JsxMode {
    /// Inside `<name ...>`, or `</name>` when `closing`.
    Tag { closing: bool },
    /// Between an opening tag and its closing tag.
    Children,
    /// Inside a `{` opened from a tag or children, at this brace depth.
    Expression(u32),
}

/// A scanned token with its byte range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: SyntaxKind,
    pub start: u32,
    pub end: u32,
    pub flags: TokenFlags,
}

impl Token {
    #[inline]
    pub fn span(&self) -> ByteSpan {
        ByteSpan::new(self.start, self.end)
    }

    #[inline]
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        self.span().text(source)
    }

    #[inline]
    pub fn has_preceding_line_break(&self) -> bool {
        self.flags.contains(TokenFlags::PRECEDING_LINE_BREAK)
    }

    #[inline]
    pub fn is_unterminated(&self) -> bool {
        self.flags.contains(TokenFlags::UNTERMINATED)
    }
}

pub struct ScannerState<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
    token_start: usize,
    token: SyntaxKind,
    token_flags: TokenFlags,
    skip_trivia: bool,
    pending_line_break: bool,
    /// Last non-trivia token, used for the regex/division decision.
    last_significant: SyntaxKind,
    brace_depth: u32,
    /// Brace depth at each open `${`; a `}` at that depth resumes the template.
    template_stack: Vec<u32>,
    variant: LanguageVariant,
    jsx_stack: Vec<JsxMode>,
}

impl<'a> ScannerState<'a> {
    pub fn new(text: &'a str, skip_trivia: bool) -> Self {
        ScannerState {
            text,
            bytes: text.as_bytes(),
            pos: 0,
            token_start: 0,
            token: SyntaxKind::Unknown,
            token_flags: TokenFlags::empty(),
            skip_trivia,
            pending_line_break: false,
            last_significant: SyntaxKind::Unknown,
            brace_depth: 0,
            template_stack: Vec::new(),
            variant: LanguageVariant::Standard,
            jsx_stack: Vec::new(),
        }
    }

    pub fn with_variant(mut self, variant: LanguageVariant) -> Self {
        self.variant = variant;
        self
    }

    pub fn get_token(&self) -> SyntaxKind {
        self.token
    }

    pub fn get_token_start(&self) -> u32 {
        self.token_start as u32
    }

    pub fn get_token_end(&self) -> u32 {
        self.pos as u32
    }

    pub fn get_token_text(&self) -> &'a str {
        &self.text[self.token_start..self.pos]
    }

    pub fn get_token_flags(&self) -> TokenFlags {
        self.token_flags
    }

    pub fn has_preceding_line_break(&self) -> bool {
        self.token_flags.contains(TokenFlags::PRECEDING_LINE_BREAK)
    }

    pub fn is_unterminated(&self) -> bool {
        self.token_flags.contains(TokenFlags::UNTERMINATED)
    }

    /// Snapshot of the current token.
    pub fn token(&self) -> Token {
        Token {
            kind: self.token,
            start: self.token_start as u32,
            end: self.pos as u32,
            flags: self.token_flags,
        }
    }

    #[inline]
    fn peek(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    #[inline]
    fn current_char(&self) -> Option<char> {
        self.text.get(self.pos..).and_then(|rest| rest.chars().next())
    }

    fn finish(&mut self, kind: SyntaxKind) -> SyntaxKind {
        if self.pending_line_break {
            self.token_flags |= TokenFlags::PRECEDING_LINE_BREAK;
        }
        // Comments keep the pending break for the next real token
        if !token_is_comment(kind) {
            self.pending_line_break = false;
            self.last_significant = kind;
        }
        self.token = kind;
        kind
    }

    /// Advance `len` bytes and finish the token.
    #[inline]
    fn punct(&mut self, len: usize, kind: SyntaxKind) -> SyntaxKind {
        self.pos += len;
        self.finish(kind)
    }

    pub fn scan(&mut self) -> SyntaxKind {
        loop {
            self.token_start = self.pos;
            self.token_flags = TokenFlags::empty();

            let Some(byte) = self.peek(0) else {
                self.token = SyntaxKind::EndOfFileToken;
                if self.pending_line_break {
                    self.token_flags |= TokenFlags::PRECEDING_LINE_BREAK;
                }
                return SyntaxKind::EndOfFileToken;
            };

            match self.jsx_stack.last().copied() {
                Some(JsxMode::Children) => return self.scan_jsx_children(),
                Some(JsxMode::Tag { closing }) => {
                    if let Some(kind) = self.scan_jsx_tag(byte, closing) {
                        return kind;
                    }
                    continue;
                }
                _ => {}
            }

            match byte {
                b'\n' | b'\r' => {
                    if byte == b'\r' && self.peek(1) == Some(b'\n') {
                        self.pos += 2;
                    } else {
                        self.pos += 1;
                    }
                    self.pending_line_break = true;
                    if self.skip_trivia {
                        continue;
                    }
                    self.token = SyntaxKind::NewLineTrivia;
                    return SyntaxKind::NewLineTrivia;
                }
                b' ' | b'\t' | 0x0B | 0x0C => {
                    self.skip_whitespace();
                    if self.skip_trivia {
                        continue;
                    }
                    self.token = SyntaxKind::WhitespaceTrivia;
                    return SyntaxKind::WhitespaceTrivia;
                }
                b'#' if self.pos == 0 && self.peek(1) == Some(b'!') => {
                    self.skip_to_line_end();
                    if self.skip_trivia {
                        continue;
                    }
                    return self.finish(SyntaxKind::ShebangTrivia);
                }
                b'/' if self.peek(1) == Some(b'/') => {
                    self.skip_to_line_end();
                    if self.skip_trivia {
                        continue;
                    }
                    return self.finish(SyntaxKind::SingleLineCommentTrivia);
                }
                b'/' if self.peek(1) == Some(b'*') => {
                    let closed = self.skip_block_comment();
                    if !closed {
                        self.token_flags |= TokenFlags::UNTERMINATED;
                    }
                    if self.skip_trivia {
                        continue;
                    }
                    return self.finish(SyntaxKind::MultiLineCommentTrivia);
                }
                _ if byte >= 0x80 => {
                    let Some(ch) = self.current_char() else {
                        self.pos += 1;
                        return self.finish(SyntaxKind::Unknown);
                    };
                    if ch == LINE_SEPARATOR || ch == PARAGRAPH_SEPARATOR {
                        self.pos += ch.len_utf8();
                        self.pending_line_break = true;
                        if self.skip_trivia {
                            continue;
                        }
                        self.token = SyntaxKind::NewLineTrivia;
                        return SyntaxKind::NewLineTrivia;
                    }
                    if is_white_space_single_line(ch) {
                        self.skip_whitespace();
                        if self.skip_trivia {
                            continue;
                        }
                        self.token = SyntaxKind::WhitespaceTrivia;
                        return SyntaxKind::WhitespaceTrivia;
                    }
                    if is_identifier_start(ch) {
                        return self.scan_identifier();
                    }
                    self.pos += ch.len_utf8();
                    return self.finish(SyntaxKind::Unknown);
                }
                _ => return self.scan_significant(byte),
            }
        }
    }

    fn scan_significant(&mut self, byte: u8) -> SyntaxKind {
        use SyntaxKind::*;

        match byte {
            b'{' => {
                self.brace_depth += 1;
                self.punct(1, OpenBraceToken)
            }
            b'}' => {
                if self.template_stack.last() == Some(&self.brace_depth) {
                    self.pos += 1;
                    return self.scan_template_body(false);
                }
                if self.jsx_stack.last() == Some(&JsxMode::Expression(self.brace_depth)) {
                    self.jsx_stack.pop();
                }
                self.brace_depth = self.brace_depth.saturating_sub(1);
                self.punct(1, CloseBraceToken)
            }
            b'(' => self.punct(1, OpenParenToken),
            b')' => self.punct(1, CloseParenToken),
            b'[' => self.punct(1, OpenBracketToken),
            b']' => self.punct(1, CloseBracketToken),
            b';' => self.punct(1, SemicolonToken),
            b',' => self.punct(1, CommaToken),
            b'~' => self.punct(1, TildeToken),
            b'@' => self.punct(1, AtToken),
            b':' => self.punct(1, ColonToken),
            b'.' => {
                if self.peek(1).is_some_and(is_digit) {
                    return self.scan_number();
                }
                if self.peek(1) == Some(b'.') && self.peek(2) == Some(b'.') {
                    return self.punct(3, DotDotDotToken);
                }
                self.punct(1, DotToken)
            }
            b'?' => match (self.peek(1), self.peek(2)) {
                (Some(b'.'), next) if !next.is_some_and(is_digit) => {
                    self.punct(2, QuestionDotToken)
                }
                (Some(b'?'), Some(b'=')) => self.punct(3, QuestionQuestionEqualsToken),
                (Some(b'?'), _) => self.punct(2, QuestionQuestionToken),
                _ => self.punct(1, QuestionToken),
            },
            b'<' if self.starts_jsx_element() => {
                self.jsx_stack.push(JsxMode::Tag { closing: false });
                self.punct(1, LessThanToken)
            }
            b'<' => match (self.peek(1), self.peek(2)) {
                (Some(b'<'), Some(b'=')) => self.punct(3, LessThanLessThanEqualsToken),
                (Some(b'<'), _) => self.punct(2, LessThanLessThanToken),
                (Some(b'='), _) => self.punct(2, LessThanEqualsToken),
                _ => self.punct(1, LessThanToken),
            },
            b'>' => match (self.peek(1), self.peek(2), self.peek(3)) {
                (Some(b'>'), Some(b'>'), Some(b'=')) => {
                    self.punct(4, GreaterThanGreaterThanGreaterThanEqualsToken)
                }
                (Some(b'>'), Some(b'>'), _) => {
                    self.punct(3, GreaterThanGreaterThanGreaterThanToken)
                }
                (Some(b'>'), Some(b'='), _) => self.punct(3, GreaterThanGreaterThanEqualsToken),
                (Some(b'>'), _, _) => self.punct(2, GreaterThanGreaterThanToken),
                (Some(b'='), _, _) => self.punct(2, GreaterThanEqualsToken),
                _ => self.punct(1, GreaterThanToken),
            },
            b'=' => match (self.peek(1), self.peek(2)) {
                (Some(b'='), Some(b'=')) => self.punct(3, EqualsEqualsEqualsToken),
                (Some(b'='), _) => self.punct(2, EqualsEqualsToken),
                (Some(b'>'), _) => self.punct(2, EqualsGreaterThanToken),
                _ => self.punct(1, EqualsToken),
            },
            b'!' => match (self.peek(1), self.peek(2)) {
                (Some(b'='), Some(b'=')) => self.punct(3, ExclamationEqualsEqualsToken),
                (Some(b'='), _) => self.punct(2, ExclamationEqualsToken),
                _ => self.punct(1, ExclamationToken),
            },
            b'+' => match self.peek(1) {
                Some(b'+') => self.punct(2, PlusPlusToken),
                Some(b'=') => self.punct(2, PlusEqualsToken),
                _ => self.punct(1, PlusToken),
            },
            b'-' => match self.peek(1) {
                Some(b'-') => self.punct(2, MinusMinusToken),
                Some(b'=') => self.punct(2, MinusEqualsToken),
                _ => self.punct(1, MinusToken),
            },
            b'*' => match (self.peek(1), self.peek(2)) {
                (Some(b'*'), Some(b'=')) => self.punct(3, AsteriskAsteriskEqualsToken),
                (Some(b'*'), _) => self.punct(2, AsteriskAsteriskToken),
                (Some(b'='), _) => self.punct(2, AsteriskEqualsToken),
                _ => self.punct(1, AsteriskToken),
            },
            b'/' => {
                if regex_allowed_after(self.last_significant)
                    && let Some(kind) = self.try_scan_regex()
                {
                    return kind;
                }
                match self.peek(1) {
                    Some(b'=') => self.punct(2, SlashEqualsToken),
                    _ => self.punct(1, SlashToken),
                }
            }
            b'%' => match self.peek(1) {
                Some(b'=') => self.punct(2, PercentEqualsToken),
                _ => self.punct(1, PercentToken),
            },
            b'&' => match (self.peek(1), self.peek(2)) {
                (Some(b'&'), Some(b'=')) => self.punct(3, AmpersandAmpersandEqualsToken),
                (Some(b'&'), _) => self.punct(2, AmpersandAmpersandToken),
                (Some(b'='), _) => self.punct(2, AmpersandEqualsToken),
                _ => self.punct(1, AmpersandToken),
            },
            b'|' => match (self.peek(1), self.peek(2)) {
                (Some(b'|'), Some(b'=')) => self.punct(3, BarBarEqualsToken),
                (Some(b'|'), _) => self.punct(2, BarBarToken),
                (Some(b'='), _) => self.punct(2, BarEqualsToken),
                _ => self.punct(1, BarToken),
            },
            b'^' => match self.peek(1) {
                Some(b'=') => self.punct(2, CaretEqualsToken),
                _ => self.punct(1, CaretToken),
            },
            b'\'' | b'"' => self.scan_string(byte),
            b'`' => {
                self.pos += 1;
                self.scan_template_body(true)
            }
            b'0'..=b'9' => self.scan_number(),
            b'#' => {
                self.pos += 1;
                if self.current_char().is_some_and(is_identifier_start) {
                    self.skip_identifier_parts();
                    return self.finish(PrivateIdentifier);
                }
                self.finish(Unknown)
            }
            _ if is_identifier_start(byte as char) => self.scan_identifier(),
            _ => self.punct(1, Unknown),
        }
    }

    /// `<` opens a JSX element: expression position, followed by a tag name
    /// or `>`, and not a generic arrow head such as `<T,>` or `<T extends U>`.
    fn starts_jsx_element(&self) -> bool {
        if self.variant != LanguageVariant::Jsx || !regex_allowed_after(self.last_significant) {
            return false;
        }
        let rest = &self.text[self.pos + 1..];
        if rest.starts_with('>') {
            return true;
        }
        let Some(first) = rest.chars().next() else {
            return false;
        };
        if !is_identifier_start(first) {
            return false;
        }
        let name_len = rest
            .find(|c: char| !(is_identifier_part(c) || c == '-' || c == '.' || c == ':'))
            .unwrap_or(rest.len());
        let after = rest[name_len..].trim_start();
        !(after.starts_with(',')
            || after
                .strip_prefix("extends")
                .is_some_and(|tail| !tail.starts_with(|c: char| is_identifier_part(c))))
    }

    /// One token inside a JSX tag. Returns None after skipping whitespace.
    fn scan_jsx_tag(&mut self, byte: u8, closing: bool) -> Option<SyntaxKind> {
        use SyntaxKind::*;

        // Line breaks inside markup never end a statement
        self.pending_line_break = false;
        let kind = match byte {
            b' ' | b'\t' | b'\n' | b'\r' | 0x0B | 0x0C => {
                while self
                    .peek(0)
                    .is_some_and(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0B | 0x0C))
                {
                    self.pos += 1;
                }
                if self.skip_trivia {
                    return None;
                }
                self.token = WhitespaceTrivia;
                return Some(WhitespaceTrivia);
            }
            b'>' => {
                self.jsx_stack.pop();
                if closing {
                    return Some(self.punct(1, JsxTagEndToken));
                }
                self.jsx_stack.push(JsxMode::Children);
                self.punct(1, GreaterThanToken)
            }
            b'/' if self.peek(1) == Some(b'>') => {
                self.jsx_stack.pop();
                self.punct(2, SlashGreaterThanToken)
            }
            b'{' => {
                self.brace_depth += 1;
                self.jsx_stack.push(JsxMode::Expression(self.brace_depth));
                self.punct(1, OpenBraceToken)
            }
            b'=' => self.punct(1, EqualsToken),
            b'\'' | b'"' => self.scan_jsx_attribute_string(byte),
            _ if self.current_char().is_some_and(is_identifier_start) => {
                while let Some(ch) = self.current_char() {
                    if !(is_identifier_part(ch) || matches!(ch, '-' | '.' | ':')) {
                        break;
                    }
                    self.pos += ch.len_utf8();
                }
                self.finish(Identifier)
            }
            _ => {
                let len = self.current_char().map_or(1, char::len_utf8);
                self.punct(len, Unknown)
            }
        };
        Some(kind)
    }

    /// Attribute strings have no escapes and may span lines.
    fn scan_jsx_attribute_string(&mut self, quote: u8) -> SyntaxKind {
        self.pos += 1;
        match self.bytes[self.pos..].iter().position(|&b| b == quote) {
            Some(offset) => self.pos += offset + 1,
            None => {
                self.pos = self.bytes.len();
                self.token_flags |= TokenFlags::UNTERMINATED;
            }
        }
        self.finish(SyntaxKind::StringLiteral)
    }

    /// Child text, a `{` child expression, or the `<` of a nested or closing tag.
    fn scan_jsx_children(&mut self) -> SyntaxKind {
        use SyntaxKind::*;

        self.pending_line_break = false;
        match self.peek(0) {
            Some(b'{') => {
                self.brace_depth += 1;
                self.jsx_stack.push(JsxMode::Expression(self.brace_depth));
                self.punct(1, OpenBraceToken)
            }
            Some(b'<') if self.peek(1) == Some(b'/') => {
                // Children end here; the closing tag pops the element
                self.jsx_stack.pop();
                self.jsx_stack.push(JsxMode::Tag { closing: true });
                self.punct(2, LessThanSlashToken)
            }
            Some(b'<') => {
                self.jsx_stack.push(JsxMode::Tag { closing: false });
                self.punct(1, LessThanToken)
            }
            _ => {
                let rest = &self.bytes[self.pos..];
                match rest.iter().position(|&b| matches!(b, b'<' | b'{')) {
                    Some(offset) => self.pos += offset,
                    None => {
                        self.pos = self.bytes.len();
                        self.token_flags |= TokenFlags::UNTERMINATED;
                    }
                }
                self.finish(JsxText)
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if !is_white_space_single_line(ch) {
                break;
            }
            self.pos += ch.len_utf8();
        }
    }

    fn skip_to_line_end(&mut self) {
        while let Some(byte) = self.peek(0) {
            if byte == b'\n' || byte == b'\r' {
                break;
            }
            if byte >= 0x80
                && let Some(ch) = self.current_char()
            {
                if ch == LINE_SEPARATOR || ch == PARAGRAPH_SEPARATOR {
                    break;
                }
                self.pos += ch.len_utf8();
                continue;
            }
            self.pos += 1;
        }
    }

    /// Returns false when the comment runs to end of file.
    fn skip_block_comment(&mut self) -> bool {
        self.pos += 2;
        while let Some(byte) = self.peek(0) {
            match byte {
                b'*' if self.peek(1) == Some(b'/') => {
                    self.pos += 2;
                    return true;
                }
                b'\n' | b'\r' => {
                    self.pending_line_break = true;
                    self.pos += 1;
                }
                _ => self.pos += 1,
            }
        }
        false
    }

    fn skip_identifier_parts(&mut self) {
        while let Some(ch) = self.current_char() {
            if !is_identifier_part(ch) {
                break;
            }
            self.pos += ch.len_utf8();
        }
    }

    fn scan_identifier(&mut self) -> SyntaxKind {
        self.skip_identifier_parts();
        let text = &self.text[self.token_start..self.pos];
        let kind = text_to_keyword(text).unwrap_or(SyntaxKind::Identifier);
        self.finish(kind)
    }

    fn scan_string(&mut self, quote: u8) -> SyntaxKind {
        self.pos += 1;
        loop {
            let Some(byte) = self.peek(0) else {
                self.token_flags |= TokenFlags::UNTERMINATED;
                break;
            };
            match byte {
                _ if byte == quote => {
                    self.pos += 1;
                    break;
                }
                b'\\' => {
                    // Line continuation consumes \r\n as one
                    if self.peek(1) == Some(b'\r') && self.peek(2) == Some(b'\n') {
                        self.pos += 3;
                    } else {
                        self.pos += 2;
                    }
                }
                b'\n' | b'\r' => {
                    self.token_flags |= TokenFlags::UNTERMINATED;
                    break;
                }
                _ => self.pos += 1,
            }
        }
        self.pos = self.pos.min(self.bytes.len());
        self.finish(SyntaxKind::StringLiteral)
    }

    /// Scan template text after a backtick (`from_backtick`) or after the `}`
    /// that closes a substitution.
    fn scan_template_body(&mut self, from_backtick: bool) -> SyntaxKind {
        loop {
            let Some(byte) = self.peek(0) else {
                self.token_flags |= TokenFlags::UNTERMINATED;
                return self.end_template(from_backtick);
            };
            match byte {
                b'`' => {
                    self.pos += 1;
                    return self.end_template(from_backtick);
                }
                b'$' if self.peek(1) == Some(b'{') => {
                    self.pos += 2;
                    if from_backtick {
                        self.template_stack.push(self.brace_depth);
                        return self.finish(SyntaxKind::TemplateHead);
                    }
                    return self.finish(SyntaxKind::TemplateMiddle);
                }
                b'\\' => self.pos += 2,
                _ => self.pos += 1,
            }
        }
    }

    fn end_template(&mut self, from_backtick: bool) -> SyntaxKind {
        self.pos = self.pos.min(self.bytes.len());
        if from_backtick {
            return self.finish(SyntaxKind::NoSubstitutionTemplateLiteral);
        }
        self.template_stack.pop();
        self.finish(SyntaxKind::TemplateTail)
    }

    fn scan_number(&mut self) -> SyntaxKind {
        let radix_prefix = self.peek(0) == Some(b'0')
            && matches!(
                self.peek(1),
                Some(b'x' | b'X' | b'o' | b'O' | b'b' | b'B')
            );

        if radix_prefix {
            self.pos += 2;
            while self.peek(0).is_some_and(|b| is_hex_digit(b) || b == b'_') {
                self.pos += 1;
            }
        } else {
            self.skip_decimal_digits();
            if self.peek(0) == Some(b'.') {
                self.pos += 1;
                self.skip_decimal_digits();
            }
            if matches!(self.peek(0), Some(b'e' | b'E')) {
                let sign = usize::from(matches!(self.peek(1), Some(b'+' | b'-')));
                if self.peek(1 + sign).is_some_and(is_digit) {
                    self.pos += 1 + sign;
                    self.skip_decimal_digits();
                }
            }
        }

        if self.peek(0) == Some(b'n') {
            self.pos += 1;
        }
        self.finish(SyntaxKind::NumericLiteral)
    }

    fn skip_decimal_digits(&mut self) {
        while self.peek(0).is_some_and(|b| is_digit(b) || b == b'_') {
            self.pos += 1;
        }
    }

    /// Scan `/.../flags`. Returns None, leaving the cursor untouched, when the
    /// body hits a line break or end of file.
    fn try_scan_regex(&mut self) -> Option<SyntaxKind> {
        let mut cursor = self.pos + 1;
        let mut in_class = false;

        loop {
            let byte = *self.bytes.get(cursor)?;
            match byte {
                b'\n' | b'\r' => return None,
                b'\\' => {
                    let next = *self.bytes.get(cursor + 1)?;
                    if next == b'\n' || next == b'\r' {
                        return None;
                    }
                    cursor += 2;
                }
                b'[' => {
                    in_class = true;
                    cursor += 1;
                }
                b']' => {
                    in_class = false;
                    cursor += 1;
                }
                b'/' if !in_class => {
                    cursor += 1;
                    break;
                }
                _ => cursor += 1,
            }
        }

        self.pos = cursor;
        self.skip_identifier_parts();
        Some(self.finish(SyntaxKind::RegularExpressionLiteral))
    }
}

/// Whether a `/` after `prev` begins a regular expression rather than a division.
fn regex_allowed_after(prev: SyntaxKind) -> bool {
    use SyntaxKind::*;

    match prev {
        Identifier
        | PrivateIdentifier
        | NumericLiteral
        | StringLiteral
        | RegularExpressionLiteral
        | NoSubstitutionTemplateLiteral
        | TemplateTail
        | JsxTagEndToken
        | SlashGreaterThanToken
        | CloseParenToken
        | CloseBracketToken
        | CloseBraceToken
        | PlusPlusToken
        | MinusMinusToken
        | ThisKeyword
        | SuperKeyword
        | TrueKeyword
        | FalseKeyword
        | NullKeyword => false,
        // Contextual keywords read as identifiers in operand position
        AbstractKeyword | AsKeyword | AsyncKeyword | DeclareKeyword | GetKeyword
        | SatisfiesKeyword | SetKeyword | TypeKeyword | LetKeyword | StaticKeyword => false,
        _ => true,
    }
}

/// Tokenize a whole source file, dropping whitespace and newline trivia.
///
/// Comments are kept so callers can tell comment offsets apart from code;
/// line breaks survive as [`TokenFlags::PRECEDING_LINE_BREAK`].
pub fn tokenize(source: &str) -> Vec<Token> {
    tokenize_variant(source, LanguageVariant::Standard)
}

/// [`tokenize`] with JSX elements recognized when `variant` is JSX.
pub fn tokenize_variant(source: &str, variant: LanguageVariant) -> Vec<Token> {
    let mut scanner = ScannerState::new(source, false).with_variant(variant);
    let mut tokens = Vec::with_capacity(source.len() / 4);
    loop {
        match scanner.scan() {
            SyntaxKind::EndOfFileToken => break,
            SyntaxKind::WhitespaceTrivia | SyntaxKind::NewLineTrivia => continue,
            _ => tokens.push(scanner.token()),
        }
    }
    tokens
}
