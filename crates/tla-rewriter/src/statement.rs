//! Bounding and classifying the statement around a suspend-point.

use tla_common::ByteSpan;
use tla_scanner::{SyntaxKind, Token, token_is_identifier_or_keyword};

use crate::context::{Container, FrameKind, ModuleAnalysis, is_asi_boundary, is_identifier_like};

/// Token range of one statement, `first..=last`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatementRange {
    pub first: usize,
    pub last: usize,
    /// Whether `last` is the terminating `;`.
    pub has_semicolon: bool,
    /// Depth of the statement's own tokens.
    pub depth: u32,
}

impl StatementRange {
    /// Byte span of the whole statement, including its `;`.
    pub fn span(&self, tokens: &[Token]) -> ByteSpan {
        ByteSpan::new(tokens[self.first].start, tokens[self.last].end)
    }

    /// Byte span without the trailing `;`.
    pub fn body_span(&self, tokens: &[Token]) -> ByteSpan {
        let last = if self.has_semicolon && self.last > self.first {
            self.last - 1
        } else {
            self.last
        };
        ByteSpan::new(tokens[self.first].start, tokens[last].end)
    }

    pub fn contains(&self, index: usize) -> bool {
        self.first <= index && index <= self.last
    }

    /// Index one past the statement body (the `;` or `last + 1`).
    fn body_end(&self) -> usize {
        if self.has_semicolon { self.last } else { self.last + 1 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeclarationKeyword {
    Const,
    Let,
    Var,
}

impl DeclarationKeyword {
    pub fn from_kind(kind: SyntaxKind) -> Option<Self> {
        match kind {
            SyntaxKind::ConstKeyword => Some(DeclarationKeyword::Const),
            SyntaxKind::LetKeyword => Some(DeclarationKeyword::Let),
            SyntaxKind::VarKeyword => Some(DeclarationKeyword::Var),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeclarationKeyword::Const => "const",
            DeclarationKeyword::Let => "let",
            DeclarationKeyword::Var => "var",
        }
    }
}

/// `name` or `name = init`; a type annotation, if present, is not kept.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Declarator {
    pub name: ByteSpan,
    pub init: Option<ByteSpan>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StatementShape {
    ExpressionStatement,
    Declaration {
        keyword: DeclarationKeyword,
        declarators: Vec<Declarator>,
    },
    Unsupported(&'static str),
}

/// Bound the statement holding token `index`, a direct descendant of
/// `container`. Returns None when the surrounding brackets do not close.
pub fn bound_statement(
    analysis: &ModuleAnalysis,
    index: usize,
    container: Container,
) -> Option<StatementRange> {
    let first = statement_start(analysis, index, container);
    statement_end(analysis, first, container.depth)
}

fn statement_start(analysis: &ModuleAnalysis, index: usize, container: Container) -> usize {
    let tokens = &analysis.tokens;
    let depths = &analysis.depths;
    let mut first = index;

    while first > 0 {
        let prev = first - 1;
        if Some(prev) == container.open {
            break;
        }
        if depths[prev] == container.depth {
            match tokens[prev].kind {
                SyntaxKind::SemicolonToken => break,
                SyntaxKind::ColonToken if analysis.is_case_colon(prev) => break,
                SyntaxKind::CloseBraceToken
                    if analysis.frames[prev] != Some(FrameKind::Object) =>
                {
                    break;
                }
                _ => {}
            }
        }
        if depths[first] == container.depth && is_asi_boundary(&tokens[prev], &tokens[first]) {
            break;
        }
        first = prev;
    }
    first
}

fn statement_end(analysis: &ModuleAnalysis, first: usize, depth: u32) -> Option<StatementRange> {
    let tokens = &analysis.tokens;
    let depths = &analysis.depths;
    let mut index = first;

    while index < tokens.len() {
        let token_depth = depths[index];
        if token_depth < depth {
            // The container's closing brace
            if index == first || tokens[index].kind != SyntaxKind::CloseBraceToken {
                return None;
            }
            return Some(StatementRange {
                first,
                last: index - 1,
                has_semicolon: false,
                depth,
            });
        }
        if token_depth == depth {
            if tokens[index].kind == SyntaxKind::SemicolonToken {
                return Some(StatementRange {
                    first,
                    last: index,
                    has_semicolon: true,
                    depth,
                });
            }
            if index > first && is_asi_boundary(&tokens[index - 1], &tokens[index]) {
                return Some(StatementRange {
                    first,
                    last: index - 1,
                    has_semicolon: false,
                    depth,
                });
            }
        }
        index += 1;
    }

    // End of file: brackets opened inside the statement must have closed
    let last = tokens.len().checked_sub(1)?;
    if last < first || depths[last] != depth {
        return None;
    }
    Some(StatementRange {
        first,
        last,
        has_semicolon: false,
        depth,
    })
}

/// Decide how a bounded statement can be rewritten.
pub fn classify_statement(
    analysis: &ModuleAnalysis,
    source: &str,
    range: &StatementRange,
) -> StatementShape {
    use SyntaxKind::*;

    let tokens = &analysis.tokens;
    let first = tokens[range.first];
    let next = (range.first + 1 < range.body_end()).then(|| tokens[range.first + 1]);

    if let Some(keyword) = DeclarationKeyword::from_kind(first.kind) {
        // `let` used as a plain identifier
        let is_binding = next.is_some_and(|t| {
            t.kind == Identifier
                || is_identifier_like(t.kind)
                || matches!(t.kind, OpenBraceToken | OpenBracketToken)
        });
        if keyword != DeclarationKeyword::Let || is_binding {
            return match parse_declarators(analysis, range, range.first + 1) {
                Ok(declarators) => StatementShape::Declaration {
                    keyword,
                    declarators,
                },
                Err(reason) => StatementShape::Unsupported(reason),
            };
        }
    }

    match first.kind {
        AwaitKeyword => {
            // `await using x = ...` is a declaration
            if let Some(next) = next
                && next.kind == Identifier
                && next.text(source) == "using"
                && tokens
                    .get(range.first + 2)
                    .is_some_and(|t| t.kind == Identifier && !t.has_preceding_line_break())
            {
                return StatementShape::Unsupported("await using declaration");
            }
            StatementShape::ExpressionStatement
        }
        ImportKeyword => match next.map(|t| t.kind) {
            Some(OpenParenToken | DotToken) => StatementShape::ExpressionStatement,
            _ => StatementShape::Unsupported("import declaration"),
        },
        ExportKeyword => StatementShape::Unsupported("export declaration"),
        ClassKeyword | FunctionKeyword => StatementShape::Unsupported("declaration"),
        AsyncKeyword if next.is_some_and(|t| t.kind == FunctionKeyword) => {
            StatementShape::Unsupported("declaration")
        }
        Identifier => identifier_statement(next),
        kind if is_identifier_like(kind) => identifier_statement(next),
        NumericLiteral
        | StringLiteral
        | RegularExpressionLiteral
        | NoSubstitutionTemplateLiteral
        | TemplateHead
        | OpenParenToken
        | OpenBracketToken
        | ExclamationToken
        | TildeToken
        | PlusToken
        | MinusToken
        | PlusPlusToken
        | MinusMinusToken
        | TypeOfKeyword
        | VoidKeyword
        | DeleteKeyword
        | NewKeyword
        | ThisKeyword
        | SuperKeyword
        | NullKeyword
        | TrueKeyword
        | FalseKeyword => StatementShape::ExpressionStatement,
        _ => StatementShape::Unsupported("control statement"),
    }
}

fn identifier_statement(next: Option<Token>) -> StatementShape {
    use SyntaxKind::*;

    let Some(next) = next else {
        return StatementShape::ExpressionStatement;
    };
    match next.kind {
        ColonToken => StatementShape::Unsupported("labeled statement"),
        InKeyword | InstanceOfKeyword | AsKeyword | SatisfiesKeyword => {
            StatementShape::ExpressionStatement
        }
        // `using x`, `declare const x`, `type T`, ...
        kind if token_is_identifier_or_keyword(kind) && !next.has_preceding_line_break() => {
            StatementShape::Unsupported("declaration")
        }
        _ => StatementShape::ExpressionStatement,
    }
}

/// Parse `a = x, b: T = y, c` starting at `index`, stopping at the
/// statement body end.
fn parse_declarators(
    analysis: &ModuleAnalysis,
    range: &StatementRange,
    mut index: usize,
) -> Result<Vec<Declarator>, &'static str> {
    use SyntaxKind::*;

    let tokens = &analysis.tokens;
    let depths = &analysis.depths;
    let end = range.body_end();
    let mut declarators = Vec::new();

    while index < end {
        let name = tokens[index];
        if name.kind != Identifier && !is_identifier_like(name.kind) {
            return Err(match name.kind {
                OpenBraceToken | OpenBracketToken => "destructuring pattern",
                _ => "unexpected declarator",
            });
        }
        index += 1;

        if index < end && tokens[index].kind == ExclamationToken {
            index += 1;
        }

        // Type annotation runs to `=` or `,` at statement depth, outside
        // type arguments
        if index < end && tokens[index].kind == ColonToken {
            index += 1;
            let mut angles = 0i32;
            while index < end {
                let kind = tokens[index].kind;
                if angles <= 0
                    && depths[index] == range.depth
                    && matches!(kind, EqualsToken | CommaToken)
                {
                    break;
                }
                match kind {
                    LessThanToken => angles += 1,
                    GreaterThanToken => angles -= 1,
                    GreaterThanGreaterThanToken => angles -= 2,
                    GreaterThanGreaterThanGreaterThanToken => angles -= 3,
                    _ => {}
                }
                index += 1;
            }
        }

        let mut init = None;
        if index < end && tokens[index].kind == EqualsToken {
            let init_first = index + 1;
            index = init_first;
            while index < end && !(depths[index] == range.depth && tokens[index].kind == CommaToken)
            {
                index += 1;
            }
            if index == init_first {
                return Err("empty initializer");
            }
            init = Some(ByteSpan::new(tokens[init_first].start, tokens[index - 1].end));
        }

        declarators.push(Declarator {
            name: name.span(),
            init,
        });

        if index < end {
            if tokens[index].kind != CommaToken {
                return Err("unexpected token in declaration");
            }
            index += 1;
            if index == end {
                return Err("trailing comma in declaration");
            }
        }
    }

    if declarators.is_empty() {
        return Err("empty declaration");
    }
    Ok(declarators)
}
