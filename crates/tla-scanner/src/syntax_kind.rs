//! Token kinds produced by the scanner.
//!
//! A JavaScript/TypeScript token vocabulary. Contextual keywords (`async`,
//! `await`, `of`, `get`, ...) are scanned as keywords; consumers decide from
//! context whether they act as identifiers.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum SyntaxKind {
    Unknown,
    EndOfFileToken,
    // Trivia
    SingleLineCommentTrivia,
    MultiLineCommentTrivia,
    NewLineTrivia,
    WhitespaceTrivia,
    ShebangTrivia,
    // Literals
    NumericLiteral,
    StringLiteral,
    RegularExpressionLiteral,
    NoSubstitutionTemplateLiteral,
    JsxText,
    // Template pieces
    TemplateHead,
    TemplateMiddle,
    TemplateTail,
    // Punctuation
    OpenBraceToken,
    CloseBraceToken,
    OpenParenToken,
    CloseParenToken,
    OpenBracketToken,
    CloseBracketToken,
    DotToken,
    DotDotDotToken,
    SemicolonToken,
    CommaToken,
    QuestionDotToken,
    LessThanToken,
    GreaterThanToken,
    LessThanEqualsToken,
    GreaterThanEqualsToken,
    EqualsEqualsToken,
    ExclamationEqualsToken,
    EqualsEqualsEqualsToken,
    ExclamationEqualsEqualsToken,
    EqualsGreaterThanToken,
    PlusToken,
    MinusToken,
    AsteriskToken,
    AsteriskAsteriskToken,
    SlashToken,
    PercentToken,
    PlusPlusToken,
    MinusMinusToken,
    LessThanLessThanToken,
    GreaterThanGreaterThanToken,
    GreaterThanGreaterThanGreaterThanToken,
    AmpersandToken,
    BarToken,
    CaretToken,
    ExclamationToken,
    TildeToken,
    AmpersandAmpersandToken,
    BarBarToken,
    QuestionToken,
    ColonToken,
    AtToken,
    QuestionQuestionToken,
    // JSX tag punctuation
    LessThanSlashToken,
    SlashGreaterThanToken,
    /// `>` closing a `</name>` tag.
    JsxTagEndToken,
    // Assignment
    EqualsToken,
    PlusEqualsToken,
    MinusEqualsToken,
    AsteriskEqualsToken,
    AsteriskAsteriskEqualsToken,
    SlashEqualsToken,
    PercentEqualsToken,
    LessThanLessThanEqualsToken,
    GreaterThanGreaterThanEqualsToken,
    GreaterThanGreaterThanGreaterThanEqualsToken,
    AmpersandEqualsToken,
    BarEqualsToken,
    CaretEqualsToken,
    AmpersandAmpersandEqualsToken,
    BarBarEqualsToken,
    QuestionQuestionEqualsToken,
    // Identifiers
    Identifier,
    PrivateIdentifier,
    // Reserved words
    BreakKeyword,
    CaseKeyword,
    CatchKeyword,
    ClassKeyword,
    ConstKeyword,
    ContinueKeyword,
    DebuggerKeyword,
    DefaultKeyword,
    DeleteKeyword,
    DoKeyword,
    ElseKeyword,
    EnumKeyword,
    ExportKeyword,
    ExtendsKeyword,
    FalseKeyword,
    FinallyKeyword,
    ForKeyword,
    FunctionKeyword,
    IfKeyword,
    ImportKeyword,
    InKeyword,
    InstanceOfKeyword,
    NewKeyword,
    NullKeyword,
    ReturnKeyword,
    SuperKeyword,
    SwitchKeyword,
    ThisKeyword,
    ThrowKeyword,
    TrueKeyword,
    TryKeyword,
    TypeOfKeyword,
    VarKeyword,
    VoidKeyword,
    WhileKeyword,
    WithKeyword,
    // Strict mode reserved words
    ImplementsKeyword,
    InterfaceKeyword,
    LetKeyword,
    PackageKeyword,
    PrivateKeyword,
    ProtectedKeyword,
    PublicKeyword,
    StaticKeyword,
    YieldKeyword,
    // Contextual keywords
    AbstractKeyword,
    AsKeyword,
    AsyncKeyword,
    AwaitKeyword,
    DeclareKeyword,
    GetKeyword,
    OfKeyword,
    SatisfiesKeyword,
    SetKeyword,
    TypeKeyword,
}

pub const FIRST_KEYWORD: SyntaxKind = SyntaxKind::BreakKeyword;
pub const LAST_KEYWORD: SyntaxKind = SyntaxKind::TypeKeyword;
pub const FIRST_PUNCTUATION: SyntaxKind = SyntaxKind::OpenBraceToken;
pub const LAST_PUNCTUATION: SyntaxKind = SyntaxKind::QuestionQuestionEqualsToken;

pub fn token_is_keyword(kind: SyntaxKind) -> bool {
    kind >= FIRST_KEYWORD && kind <= LAST_KEYWORD
}

pub fn token_is_identifier_or_keyword(kind: SyntaxKind) -> bool {
    kind == SyntaxKind::Identifier || token_is_keyword(kind)
}

pub fn token_is_punctuation(kind: SyntaxKind) -> bool {
    kind >= FIRST_PUNCTUATION && kind <= LAST_PUNCTUATION
}

pub fn token_is_trivia(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::SingleLineCommentTrivia
            | SyntaxKind::MultiLineCommentTrivia
            | SyntaxKind::NewLineTrivia
            | SyntaxKind::WhitespaceTrivia
            | SyntaxKind::ShebangTrivia
    )
}

pub fn token_is_comment(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::SingleLineCommentTrivia
            | SyntaxKind::MultiLineCommentTrivia
            | SyntaxKind::ShebangTrivia
    )
}

/// String, template, regular expression and JSX text literals: tokens whose
/// text is not code.
pub fn token_is_string_like(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::StringLiteral
            | SyntaxKind::RegularExpressionLiteral
            | SyntaxKind::NoSubstitutionTemplateLiteral
            | SyntaxKind::JsxText
            | SyntaxKind::TemplateHead
            | SyntaxKind::TemplateMiddle
            | SyntaxKind::TemplateTail
    )
}

pub fn token_is_assignment_operator(kind: SyntaxKind) -> bool {
    kind >= SyntaxKind::EqualsToken && kind <= SyntaxKind::QuestionQuestionEqualsToken
}

/// Reserved words that cannot start an expression or continue one.
pub fn token_is_statement_keyword(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::BreakKeyword
            | SyntaxKind::CaseKeyword
            | SyntaxKind::CatchKeyword
            | SyntaxKind::ClassKeyword
            | SyntaxKind::ConstKeyword
            | SyntaxKind::ContinueKeyword
            | SyntaxKind::DebuggerKeyword
            | SyntaxKind::DefaultKeyword
            | SyntaxKind::DoKeyword
            | SyntaxKind::ElseKeyword
            | SyntaxKind::EnumKeyword
            | SyntaxKind::ExportKeyword
            | SyntaxKind::FinallyKeyword
            | SyntaxKind::ForKeyword
            | SyntaxKind::IfKeyword
            | SyntaxKind::ImportKeyword
            | SyntaxKind::ReturnKeyword
            | SyntaxKind::SwitchKeyword
            | SyntaxKind::ThrowKeyword
            | SyntaxKind::TryKeyword
            | SyntaxKind::VarKeyword
            | SyntaxKind::WhileKeyword
            | SyntaxKind::WithKeyword
            | SyntaxKind::InterfaceKeyword
    )
}

pub fn text_to_keyword(text: &str) -> Option<SyntaxKind> {
    let kind = match text {
        "break" => SyntaxKind::BreakKeyword,
        "case" => SyntaxKind::CaseKeyword,
        "catch" => SyntaxKind::CatchKeyword,
        "class" => SyntaxKind::ClassKeyword,
        "const" => SyntaxKind::ConstKeyword,
        "continue" => SyntaxKind::ContinueKeyword,
        "debugger" => SyntaxKind::DebuggerKeyword,
        "default" => SyntaxKind::DefaultKeyword,
        "delete" => SyntaxKind::DeleteKeyword,
        "do" => SyntaxKind::DoKeyword,
        "else" => SyntaxKind::ElseKeyword,
        "enum" => SyntaxKind::EnumKeyword,
        "export" => SyntaxKind::ExportKeyword,
        "extends" => SyntaxKind::ExtendsKeyword,
        "false" => SyntaxKind::FalseKeyword,
        "finally" => SyntaxKind::FinallyKeyword,
        "for" => SyntaxKind::ForKeyword,
        "function" => SyntaxKind::FunctionKeyword,
        "if" => SyntaxKind::IfKeyword,
        "import" => SyntaxKind::ImportKeyword,
        "in" => SyntaxKind::InKeyword,
        "instanceof" => SyntaxKind::InstanceOfKeyword,
        "new" => SyntaxKind::NewKeyword,
        "null" => SyntaxKind::NullKeyword,
        "return" => SyntaxKind::ReturnKeyword,
        "super" => SyntaxKind::SuperKeyword,
        "switch" => SyntaxKind::SwitchKeyword,
        "this" => SyntaxKind::ThisKeyword,
        "throw" => SyntaxKind::ThrowKeyword,
        "true" => SyntaxKind::TrueKeyword,
        "try" => SyntaxKind::TryKeyword,
        "typeof" => SyntaxKind::TypeOfKeyword,
        "var" => SyntaxKind::VarKeyword,
        "void" => SyntaxKind::VoidKeyword,
        "while" => SyntaxKind::WhileKeyword,
        "with" => SyntaxKind::WithKeyword,
        "implements" => SyntaxKind::ImplementsKeyword,
        "interface" => SyntaxKind::InterfaceKeyword,
        "let" => SyntaxKind::LetKeyword,
        "package" => SyntaxKind::PackageKeyword,
        "private" => SyntaxKind::PrivateKeyword,
        "protected" => SyntaxKind::ProtectedKeyword,
        "public" => SyntaxKind::PublicKeyword,
        "static" => SyntaxKind::StaticKeyword,
        "yield" => SyntaxKind::YieldKeyword,
        "abstract" => SyntaxKind::AbstractKeyword,
        "as" => SyntaxKind::AsKeyword,
        "async" => SyntaxKind::AsyncKeyword,
        "await" => SyntaxKind::AwaitKeyword,
        "declare" => SyntaxKind::DeclareKeyword,
        "get" => SyntaxKind::GetKeyword,
        "of" => SyntaxKind::OfKeyword,
        "satisfies" => SyntaxKind::SatisfiesKeyword,
        "set" => SyntaxKind::SetKeyword,
        "type" => SyntaxKind::TypeKeyword,
        _ => return None,
    };
    Some(kind)
}

pub fn keyword_to_text(kind: SyntaxKind) -> Option<&'static str> {
    let text = match kind {
        SyntaxKind::BreakKeyword => "break",
        SyntaxKind::CaseKeyword => "case",
        SyntaxKind::CatchKeyword => "catch",
        SyntaxKind::ClassKeyword => "class",
        SyntaxKind::ConstKeyword => "const",
        SyntaxKind::ContinueKeyword => "continue",
        SyntaxKind::DebuggerKeyword => "debugger",
        SyntaxKind::DefaultKeyword => "default",
        SyntaxKind::DeleteKeyword => "delete",
        SyntaxKind::DoKeyword => "do",
        SyntaxKind::ElseKeyword => "else",
        SyntaxKind::EnumKeyword => "enum",
        SyntaxKind::ExportKeyword => "export",
        SyntaxKind::ExtendsKeyword => "extends",
        SyntaxKind::FalseKeyword => "false",
        SyntaxKind::FinallyKeyword => "finally",
        SyntaxKind::ForKeyword => "for",
        SyntaxKind::FunctionKeyword => "function",
        SyntaxKind::IfKeyword => "if",
        SyntaxKind::ImportKeyword => "import",
        SyntaxKind::InKeyword => "in",
        SyntaxKind::InstanceOfKeyword => "instanceof",
        SyntaxKind::NewKeyword => "new",
        SyntaxKind::NullKeyword => "null",
        SyntaxKind::ReturnKeyword => "return",
        SyntaxKind::SuperKeyword => "super",
        SyntaxKind::SwitchKeyword => "switch",
        SyntaxKind::ThisKeyword => "this",
        SyntaxKind::ThrowKeyword => "throw",
        SyntaxKind::TrueKeyword => "true",
        SyntaxKind::TryKeyword => "try",
        SyntaxKind::TypeOfKeyword => "typeof",
        SyntaxKind::VarKeyword => "var",
        SyntaxKind::VoidKeyword => "void",
        SyntaxKind::WhileKeyword => "while",
        SyntaxKind::WithKeyword => "with",
        SyntaxKind::ImplementsKeyword => "implements",
        SyntaxKind::InterfaceKeyword => "interface",
        SyntaxKind::LetKeyword => "let",
        SyntaxKind::PackageKeyword => "package",
        SyntaxKind::PrivateKeyword => "private",
        SyntaxKind::ProtectedKeyword => "protected",
        SyntaxKind::PublicKeyword => "public",
        SyntaxKind::StaticKeyword => "static",
        SyntaxKind::YieldKeyword => "yield",
        SyntaxKind::AbstractKeyword => "abstract",
        SyntaxKind::AsKeyword => "as",
        SyntaxKind::AsyncKeyword => "async",
        SyntaxKind::AwaitKeyword => "await",
        SyntaxKind::DeclareKeyword => "declare",
        SyntaxKind::GetKeyword => "get",
        SyntaxKind::OfKeyword => "of",
        SyntaxKind::SatisfiesKeyword => "satisfies",
        SyntaxKind::SetKeyword => "set",
        SyntaxKind::TypeKeyword => "type",
        _ => return None,
    };
    Some(text)
}

pub fn punctuation_to_text(kind: SyntaxKind) -> Option<&'static str> {
    let text = match kind {
        SyntaxKind::OpenBraceToken => "{",
        SyntaxKind::CloseBraceToken => "}",
        SyntaxKind::OpenParenToken => "(",
        SyntaxKind::CloseParenToken => ")",
        SyntaxKind::OpenBracketToken => "[",
        SyntaxKind::CloseBracketToken => "]",
        SyntaxKind::DotToken => ".",
        SyntaxKind::DotDotDotToken => "...",
        SyntaxKind::SemicolonToken => ";",
        SyntaxKind::CommaToken => ",",
        SyntaxKind::QuestionDotToken => "?.",
        SyntaxKind::LessThanToken => "<",
        SyntaxKind::GreaterThanToken => ">",
        SyntaxKind::LessThanEqualsToken => "<=",
        SyntaxKind::GreaterThanEqualsToken => ">=",
        SyntaxKind::EqualsEqualsToken => "==",
        SyntaxKind::ExclamationEqualsToken => "!=",
        SyntaxKind::EqualsEqualsEqualsToken => "===",
        SyntaxKind::ExclamationEqualsEqualsToken => "!==",
        SyntaxKind::EqualsGreaterThanToken => "=>",
        SyntaxKind::PlusToken => "+",
        SyntaxKind::MinusToken => "-",
        SyntaxKind::AsteriskToken => "*",
        SyntaxKind::AsteriskAsteriskToken => "**",
        SyntaxKind::SlashToken => "/",
        SyntaxKind::PercentToken => "%",
        SyntaxKind::PlusPlusToken => "++",
        SyntaxKind::MinusMinusToken => "--",
        SyntaxKind::LessThanLessThanToken => "<<",
        SyntaxKind::GreaterThanGreaterThanToken => ">>",
        SyntaxKind::GreaterThanGreaterThanGreaterThanToken => ">>>",
        SyntaxKind::AmpersandToken => "&",
        SyntaxKind::BarToken => "|",
        SyntaxKind::CaretToken => "^",
        SyntaxKind::ExclamationToken => "!",
        SyntaxKind::TildeToken => "~",
        SyntaxKind::AmpersandAmpersandToken => "&&",
        SyntaxKind::BarBarToken => "||",
        SyntaxKind::QuestionToken => "?",
        SyntaxKind::ColonToken => ":",
        SyntaxKind::AtToken => "@",
        SyntaxKind::QuestionQuestionToken => "??",
        SyntaxKind::LessThanSlashToken => "</",
        SyntaxKind::SlashGreaterThanToken => "/>",
        SyntaxKind::JsxTagEndToken => ">",
        SyntaxKind::EqualsToken => "=",
        SyntaxKind::PlusEqualsToken => "+=",
        SyntaxKind::MinusEqualsToken => "-=",
        SyntaxKind::AsteriskEqualsToken => "*=",
        SyntaxKind::AsteriskAsteriskEqualsToken => "**=",
        SyntaxKind::SlashEqualsToken => "/=",
        SyntaxKind::PercentEqualsToken => "%=",
        SyntaxKind::LessThanLessThanEqualsToken => "<<=",
        SyntaxKind::GreaterThanGreaterThanEqualsToken => ">>=",
        SyntaxKind::GreaterThanGreaterThanGreaterThanEqualsToken => ">>>=",
        SyntaxKind::AmpersandEqualsToken => "&=",
        SyntaxKind::BarEqualsToken => "|=",
        SyntaxKind::CaretEqualsToken => "^=",
        SyntaxKind::AmpersandAmpersandEqualsToken => "&&=",
        SyntaxKind::BarBarEqualsToken => "||=",
        SyntaxKind::QuestionQuestionEqualsToken => "??=",
        _ => return None,
    };
    Some(text)
}
