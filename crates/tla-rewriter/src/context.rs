//! Lexical-context analysis.
//!
//! One forward pass over the token stream maintains a stack of bracket
//! frames. Each `{` is classified when it opens (function body, class body,
//! statement block or object literal), so for any token we know whether it
//! sits inside a callable body or at module top level without re-scanning
//! the text before it.

use smallvec::{SmallVec, smallvec};
use tla_common::ByteSpan;
use tla_scanner::{
    LanguageVariant, SyntaxKind, Token, token_is_comment, token_is_keyword, token_is_string_like,
};
use tracing::trace;

/// Syntactic context of a byte offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LexicalContext {
    /// Inside a string, template or regular expression literal.
    String,
    /// Inside a line or block comment.
    Comment,
    /// Inside a function, method, class or arrow body.
    FunctionBody,
    /// Module scope, including non-function blocks at module scope.
    TopLevel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParenRole {
    /// Head of `if`/`for`/`while`/`switch`/`catch`/`with`.
    ControlHead,
    /// Parameter list of a function, method or accessor.
    Parameters,
    Other,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameKind {
    Module,
    Block,
    FunctionBody,
    ClassBody,
    Object,
    Paren(ParenRole),
    Bracket,
    TemplateSubstitution,
    ConciseArrowBody,
}

impl FrameKind {
    /// Frames whose direct children are statements.
    pub fn holds_statements(self) -> bool {
        matches!(
            self,
            FrameKind::Module | FrameKind::Block | FrameKind::FunctionBody
        )
    }

    /// Frames that start a new callable scope.
    pub fn is_callable_scope(self) -> bool {
        matches!(
            self,
            FrameKind::FunctionBody | FrameKind::ClassBody | FrameKind::ConciseArrowBody
        )
    }

    fn closes_with_brace(self) -> bool {
        matches!(
            self,
            FrameKind::Block | FrameKind::FunctionBody | FrameKind::ClassBody | FrameKind::Object
        )
    }
}

#[derive(Clone, Copy, Debug)]
struct Frame {
    kind: FrameKind,
    /// Token index of the opener; `usize::MAX` for the module frame.
    open: usize,
}

/// The statement list that directly contains a suspend-point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Container {
    pub kind: FrameKind,
    /// Token index of the `{` that opened the block, if any.
    pub open: Option<usize>,
    /// Depth of the tokens that are direct children of the container.
    pub depth: u32,
}

/// An `await` keyword acting as a suspend-point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SuspendPoint {
    /// Index into [`ModuleAnalysis::tokens`].
    pub token: usize,
    pub offset: u32,
    pub context: LexicalContext,
    pub container: Container,
    /// `for await (...)`: the statement is a loop, not an expression.
    pub is_for_await: bool,
}

impl SuspendPoint {
    pub fn is_top_level(&self) -> bool {
        self.context == LexicalContext::TopLevel
    }
}

/// Tokens of one module plus everything derived from the frame pass.
#[derive(Debug)]
pub struct ModuleAnalysis {
    /// Code tokens, comments removed.
    pub tokens: Vec<Token>,
    /// Frame-stack depth at each token. Openers and closers carry the depth
    /// of the frame around them.
    pub depths: Vec<u32>,
    /// Frame opened (for openers) or closed (for closers) by each token.
    pub frames: Vec<Option<FrameKind>>,
    pub comments: Vec<ByteSpan>,
    pub suspend_points: Vec<SuspendPoint>,
    /// Token indices of `case x:`/`default:` colons, ascending.
    pub case_colons: Vec<usize>,
    /// False when brackets do not pair up or a literal/comment is unterminated.
    pub balanced: bool,
}

impl ModuleAnalysis {
    pub fn analyze(source: &str) -> Self {
        Self::analyze_with(source, LanguageVariant::Standard)
    }

    pub fn analyze_with(source: &str, variant: LanguageVariant) -> Self {
        let mut comments = Vec::new();
        let mut tokens = Vec::new();
        let mut balanced = true;

        for token in tla_scanner::tokenize_variant(source, variant) {
            if token.is_unterminated() {
                balanced = false;
            }
            if token_is_comment(token.kind) {
                comments.push(token.span());
            } else {
                tokens.push(token);
            }
        }

        let mut pass = FramePass::new(&tokens);
        pass.run();
        let FramePass {
            depths,
            frames,
            suspend_points,
            case_colons,
            balanced: frames_balanced,
            ..
        } = pass;

        ModuleAnalysis {
            tokens,
            depths,
            frames,
            comments,
            suspend_points,
            case_colons,
            balanced: balanced && frames_balanced,
        }
    }

    pub fn top_level_suspend_points(&self) -> impl Iterator<Item = &SuspendPoint> {
        self.suspend_points.iter().filter(|p| p.is_top_level())
    }

    pub fn kind(&self, index: usize) -> Option<SyntaxKind> {
        self.tokens.get(index).map(|t| t.kind)
    }

    pub fn is_case_colon(&self, index: usize) -> bool {
        self.case_colons.binary_search(&index).is_ok()
    }
}

/// Classify the context of `offset` within `source`.
pub fn classify_offset(source: &str, offset: u32) -> LexicalContext {
    let analysis = ModuleAnalysis::analyze(source);

    if analysis.comments.iter().any(|c| c.contains(offset)) {
        return LexicalContext::Comment;
    }

    // First token ending after the offset
    let index = analysis.tokens.partition_point(|t| t.end <= offset);
    if let Some(token) = analysis.tokens.get(index)
        && token.start <= offset
        && token_is_string_like(token.kind)
    {
        return LexicalContext::String;
    }

    let mut pass = FramePass::new(&analysis.tokens);
    pass.run_until(index);
    if index < analysis.tokens.len() {
        pass.close_concise_bodies(index);
    }
    if pass.in_callable_scope() {
        LexicalContext::FunctionBody
    } else {
        LexicalContext::TopLevel
    }
}

/// Tokens that can end an expression, so a following line break may
/// terminate the statement.
pub fn ends_expression(kind: SyntaxKind) -> bool {
    use SyntaxKind::*;
    matches!(
        kind,
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
            | NullKeyword
            | ReturnKeyword
            | BreakKeyword
            | ContinueKeyword
            | DebuggerKeyword
            | YieldKeyword
    ) || is_identifier_like(kind)
}

/// Tokens that continue the previous line's expression instead of starting
/// a new statement.
pub fn continues_expression(kind: SyntaxKind) -> bool {
    use SyntaxKind::*;
    match kind {
        OpenBraceToken | ExclamationToken | TildeToken | PlusPlusToken | MinusMinusToken
        | SemicolonToken | AtToken => false,
        InKeyword | InstanceOfKeyword | AsKeyword | SatisfiesKeyword => true,
        TemplateHead | NoSubstitutionTemplateLiteral => true,
        _ => tla_scanner::token_is_punctuation(kind),
    }
}

/// Line break between `prev` and `next` acts as a statement terminator.
pub fn is_asi_boundary(prev: &Token, next: &Token) -> bool {
    next.has_preceding_line_break() && ends_expression(prev.kind) && !continues_expression(next.kind)
}

/// Contextual keywords that behave as plain identifiers in expressions.
pub fn is_identifier_like(kind: SyntaxKind) -> bool {
    use SyntaxKind::*;
    matches!(
        kind,
        AbstractKeyword
            | AsKeyword
            | AsyncKeyword
            | DeclareKeyword
            | GetKeyword
            | OfKeyword
            | SatisfiesKeyword
            | SetKeyword
            | TypeKeyword
            | StaticKeyword
            | LetKeyword
            | ImplementsKeyword
            | PackageKeyword
            | PrivateKeyword
            | ProtectedKeyword
            | PublicKeyword
    )
}

const FRAME_STACK_INLINE: usize = 16;

struct FramePass<'t> {
    tokens: &'t [Token],
    stack: SmallVec<[Frame; FRAME_STACK_INLINE]>,
    depths: Vec<u32>,
    frames: Vec<Option<FrameKind>>,
    suspend_points: Vec<SuspendPoint>,
    case_colons: Vec<usize>,
    balanced: bool,
    /// Depth at which a closed parameter list waits for its body `{`.
    pending_function_body: Option<u32>,
    /// Depth of a return type annotation between a parameter list and its body.
    return_type: Option<u32>,
    /// Depth of a `function` keyword whose parameter list has not opened yet.
    pending_parameters: Option<u32>,
    /// Depth of a `class` keyword whose body has not opened yet.
    pending_class: Option<u32>,
    /// Depth of a `case`/`default` waiting for its colon.
    pending_case: Option<u32>,
    /// Role of the paren that closed on the previous token.
    last_closed_paren: Option<ParenRole>,
    /// The previous token was a `case`/`default`/label colon.
    statement_colon: bool,
}

impl<'t> FramePass<'t> {
    fn new(tokens: &'t [Token]) -> Self {
        FramePass {
            tokens,
            stack: smallvec![Frame {
                kind: FrameKind::Module,
                open: usize::MAX,
            }],
            depths: Vec::with_capacity(tokens.len()),
            frames: Vec::with_capacity(tokens.len()),
            suspend_points: Vec::new(),
            case_colons: Vec::new(),
            balanced: true,
            pending_function_body: None,
            return_type: None,
            pending_parameters: None,
            pending_class: None,
            pending_case: None,
            last_closed_paren: None,
            statement_colon: false,
        }
    }

    fn run(&mut self) {
        self.run_until(self.tokens.len());
        // Concise arrow bodies may run to end of file
        while self.top().kind == FrameKind::ConciseArrowBody {
            self.stack.pop();
        }
        if self.stack.len() != 1 {
            self.balanced = false;
        }
    }

    fn run_until(&mut self, end: usize) {
        for index in 0..end.min(self.tokens.len()) {
            self.step(index);
        }
    }

    #[inline]
    fn depth(&self) -> u32 {
        self.stack.len() as u32
    }

    #[inline]
    fn top(&self) -> Frame {
        // The module frame is never popped
        self.stack.last().copied().unwrap_or(Frame {
            kind: FrameKind::Module,
            open: usize::MAX,
        })
    }

    fn in_callable_scope(&self) -> bool {
        self.stack.iter().any(|f| f.kind.is_callable_scope())
    }

    /// Between the `:` after a parameter list and the body `{`.
    fn in_return_type(&self) -> bool {
        self.return_type
            .is_some_and(|d| self.pending_function_body == Some(d) && d <= self.depth())
    }

    fn prev_kind(&self, index: usize) -> Option<SyntaxKind> {
        index.checked_sub(1).map(|i| self.tokens[i].kind)
    }

    fn push(&mut self, kind: FrameKind, open: usize) {
        self.stack.push(Frame { kind, open });
        self.note_frame(kind);
    }

    fn note_frame(&mut self, kind: FrameKind) {
        if let Some(slot) = self.frames.last_mut() {
            *slot = Some(kind);
        }
    }

    /// Close concise arrow bodies that end before `token`.
    fn close_concise_bodies(&mut self, index: usize) {
        let token = &self.tokens[index];
        while self.top().kind == FrameKind::ConciseArrowBody {
            let ends = match token.kind {
                SyntaxKind::CommaToken
                | SyntaxKind::SemicolonToken
                | SyntaxKind::CloseParenToken
                | SyntaxKind::CloseBracketToken
                | SyntaxKind::CloseBraceToken
                | SyntaxKind::TemplateMiddle
                | SyntaxKind::TemplateTail => true,
                _ => index > 0 && is_asi_boundary(&self.tokens[index - 1], token),
            };
            if !ends {
                break;
            }
            self.stack.pop();
        }
    }

    /// Pop frames until one satisfying `is_match` is removed.
    fn pop_matching(&mut self, is_match: impl Fn(FrameKind) -> bool) -> Option<Frame> {
        let position = self.stack.iter().rposition(|f| is_match(f.kind))?;
        if position == 0 {
            return None;
        }
        if position + 1 != self.stack.len() {
            self.balanced = false;
        }
        let frame = self.stack[position];
        self.stack.truncate(position);
        self.note_frame(frame.kind);
        Some(frame)
    }

    fn step(&mut self, index: usize) {
        use SyntaxKind::*;

        self.close_concise_bodies(index);
        self.frames.push(None);

        let token = self.tokens[index];
        let prev = self.prev_kind(index);
        let statement_colon = std::mem::take(&mut self.statement_colon);
        let last_closed_paren = self.last_closed_paren.take();
        let depth = self.depth();

        match token.kind {
            OpenBraceToken => {
                self.depths.push(depth);
                let kind = self.classify_brace(index, prev, last_closed_paren, statement_colon);
                trace!(index, ?kind, "open brace");
                self.push(kind, index);
            }
            CloseBraceToken => {
                if self.pop_matching(FrameKind::closes_with_brace).is_none() {
                    self.balanced = false;
                }
                self.depths.push(self.depth());
                // `: { a: T } {` keeps waiting for the body after the type literal
                if !self.in_return_type() {
                    self.pending_function_body = None;
                }
            }
            OpenParenToken => {
                self.depths.push(depth);
                let role = self.classify_paren(index, prev, depth);
                self.push(FrameKind::Paren(role), index);
            }
            CloseParenToken => {
                match self.pop_matching(|k| matches!(k, FrameKind::Paren(_))) {
                    Some(Frame {
                        kind: FrameKind::Paren(role),
                        ..
                    }) => {
                        self.last_closed_paren = Some(role);
                        if role == ParenRole::Parameters {
                            self.pending_function_body = Some(self.depth());
                            self.return_type = None;
                        }
                    }
                    _ => self.balanced = false,
                }
                self.depths.push(self.depth());
            }
            OpenBracketToken => {
                self.depths.push(depth);
                self.push(FrameKind::Bracket, index);
            }
            CloseBracketToken => {
                if self
                    .pop_matching(|k| k == FrameKind::Bracket)
                    .is_none()
                {
                    self.balanced = false;
                }
                self.depths.push(self.depth());
            }
            TemplateHead => {
                self.depths.push(depth);
                self.push(FrameKind::TemplateSubstitution, index);
            }
            TemplateMiddle => {
                if self.top().kind != FrameKind::TemplateSubstitution {
                    self.balanced = false;
                }
                self.depths.push(self.depth().saturating_sub(1));
            }
            TemplateTail => {
                if self
                    .pop_matching(|k| k == FrameKind::TemplateSubstitution)
                    .is_none()
                {
                    self.balanced = false;
                }
                self.depths.push(self.depth());
            }
            EqualsGreaterThanToken => {
                self.depths.push(depth);
                // Function type inside a return type annotation
                if self.in_return_type() {
                    return;
                }
                self.pending_function_body = None;
                let next = self.tokens.get(index + 1).map(|t| t.kind);
                if next != Some(OpenBraceToken) {
                    self.push(FrameKind::ConciseArrowBody, index);
                }
            }
            FunctionKeyword => {
                self.depths.push(depth);
                self.pending_parameters = Some(depth);
            }
            ClassKeyword => {
                self.depths.push(depth);
                self.pending_class = Some(depth);
            }
            CaseKeyword | DefaultKeyword if self.top().kind.holds_statements() => {
                self.depths.push(depth);
                // `export default` and `x.default` are not switch labels
                if !matches!(prev, Some(ExportKeyword | DotToken | QuestionDotToken)) {
                    self.pending_case = Some(depth);
                }
            }
            ColonToken => {
                self.depths.push(depth);
                if self.pending_function_body == Some(depth) && prev == Some(CloseParenToken) {
                    self.return_type = Some(depth);
                } else if self.top().kind.holds_statements() {
                    if self.pending_case == Some(depth) {
                        self.pending_case = None;
                        self.statement_colon = true;
                        self.case_colons.push(index);
                    } else if prev == Some(Identifier) && self.starts_statement(index - 1) {
                        self.statement_colon = true;
                    }
                }
            }
            SemicolonToken => {
                self.depths.push(depth);
                if self.pending_function_body == Some(depth) {
                    self.pending_function_body = None;
                    self.return_type = None;
                }
                if self.pending_class == Some(depth) {
                    self.pending_class = None;
                }
            }
            CommaToken => {
                self.depths.push(depth);
                if self.pending_function_body == Some(depth) && !self.in_return_type() {
                    self.pending_function_body = None;
                }
            }
            QuestionToken => {
                self.depths.push(depth);
                if !self.in_return_type() {
                    self.pending_function_body = None;
                }
            }
            AwaitKeyword => {
                self.depths.push(depth);
                self.record_await(index, prev);
            }
            _ => self.depths.push(depth),
        }
    }

    fn classify_brace(
        &mut self,
        index: usize,
        prev: Option<SyntaxKind>,
        last_closed_paren: Option<ParenRole>,
        statement_colon: bool,
    ) -> FrameKind {
        use SyntaxKind::*;

        let depth = self.depth();
        let top = self.top().kind;

        if self.in_return_type() && self.return_type == Some(depth) {
            // A `{` where a type is expected opens a type literal
            if matches!(
                prev,
                Some(
                    ColonToken
                        | LessThanToken
                        | BarToken
                        | AmpersandToken
                        | CommaToken
                        | EqualsGreaterThanToken
                        | QuestionToken
                        | ExtendsKeyword
                        | OpenBracketToken
                )
            ) {
                return FrameKind::Object;
            }
            self.return_type = None;
            self.pending_function_body = None;
            return FrameKind::FunctionBody;
        }
        if prev == Some(EqualsGreaterThanToken) {
            return FrameKind::FunctionBody;
        }
        if self.pending_function_body == Some(depth) {
            self.pending_function_body = None;
            return FrameKind::FunctionBody;
        }
        if self.pending_class == Some(depth) {
            self.pending_class = None;
            return FrameKind::ClassBody;
        }
        if top == FrameKind::ClassBody && prev == Some(StaticKeyword) {
            return FrameKind::FunctionBody;
        }
        if !top.holds_statements() {
            return FrameKind::Object;
        }

        let statement_position = match prev {
            None => true,
            Some(SemicolonToken | OpenBraceToken | CloseBraceToken) => true,
            Some(CloseParenToken) => last_closed_paren == Some(ParenRole::ControlHead),
            Some(ElseKeyword | TryKeyword | CatchKeyword | FinallyKeyword | DoKeyword) => true,
            Some(ColonToken) => statement_colon,
            Some(_) => index > 0 && is_asi_boundary(&self.tokens[index - 1], &self.tokens[index]),
        };

        if statement_position {
            FrameKind::Block
        } else {
            FrameKind::Object
        }
    }

    fn classify_paren(&mut self, index: usize, prev: Option<SyntaxKind>, depth: u32) -> ParenRole {
        use SyntaxKind::*;

        if self.pending_parameters == Some(depth) {
            self.pending_parameters = None;
            return ParenRole::Parameters;
        }

        match prev {
            Some(IfKeyword | ForKeyword | WhileKeyword | SwitchKeyword | CatchKeyword | WithKeyword) => {
                ParenRole::ControlHead
            }
            // for await (...)
            Some(AwaitKeyword)
                if index
                    .checked_sub(2)
                    .is_some_and(|i| self.tokens[i].kind == ForKeyword) =>
            {
                ParenRole::ControlHead
            }
            Some(kind) if self.is_method_name_position(index, kind) => ParenRole::Parameters,
            _ => ParenRole::Other,
        }
    }

    /// `name(` directly inside a class body or object literal is a method.
    fn is_method_name_position(&self, index: usize, prev: SyntaxKind) -> bool {
        use SyntaxKind::*;

        let name_like = prev == Identifier
            || prev == PrivateIdentifier
            || prev == StringLiteral
            || prev == NumericLiteral
            || token_is_keyword(prev);
        let member_start = match self.top().kind {
            FrameKind::ClassBody | FrameKind::Object => match prev {
                CloseBracketToken => return true,
                GreaterThanToken => return self.top().kind == FrameKind::ClassBody,
                _ => name_like,
            },
            _ => return false,
        };
        // `a: f(x)` and `x = f(y)` are calls in a member's value
        let Some(before) = index.checked_sub(2).map(|i| &self.tokens[i]) else {
            return member_start;
        };
        member_start
            && (matches!(
                before.kind,
                OpenBraceToken | CloseBraceToken | CommaToken | SemicolonToken | AsteriskToken
            ) || before.kind == Identifier
                || is_identifier_like(before.kind)
                || is_asi_boundary(before, &self.tokens[index - 1]))
    }

    /// Whether the token at `index` begins a statement in its frame.
    fn starts_statement(&self, index: usize) -> bool {
        let Some(prev_index) = index.checked_sub(1) else {
            return true;
        };
        let prev = &self.tokens[prev_index];
        matches!(
            prev.kind,
            SyntaxKind::SemicolonToken | SyntaxKind::OpenBraceToken | SyntaxKind::CloseBraceToken
        ) || is_asi_boundary(prev, &self.tokens[index])
    }

    fn record_await(&mut self, index: usize, prev: Option<SyntaxKind>) {
        use SyntaxKind::*;

        // `obj.await` / `obj?.await` is a property name
        if matches!(prev, Some(DotToken | QuestionDotToken)) {
            return;
        }
        let next = self.tokens.get(index + 1).map(|t| t.kind);
        // `{ await: 1 }` or `class { await() {} }`
        let top = self.top().kind;
        if matches!(top, FrameKind::Object | FrameKind::ClassBody)
            && matches!(next, Some(ColonToken | OpenParenToken | CommaToken | CloseBraceToken))
        {
            return;
        }

        let context = if self.in_callable_scope() {
            LexicalContext::FunctionBody
        } else {
            LexicalContext::TopLevel
        };

        let container = self
            .stack
            .iter()
            .enumerate()
            .rev()
            .find(|(_, f)| f.kind.holds_statements())
            .map(|(position, f)| Container {
                kind: f.kind,
                open: (f.open != usize::MAX).then_some(f.open),
                depth: position as u32 + 1,
            })
            .unwrap_or(Container {
                kind: FrameKind::Module,
                open: None,
                depth: 1,
            });

        let point = SuspendPoint {
            token: index,
            offset: self.tokens[index].start,
            context,
            container,
            is_for_await: prev == Some(ForKeyword),
        };
        trace!(offset = point.offset, ?context, depth = container.depth, "suspend point");
        self.suspend_points.push(point);
    }
}
