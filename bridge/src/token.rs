//! Token kinds produced by the lexer (spec §4.1).

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Version,
    KwBridge,
    KwTool,
    KwConst,
    KwDefine,
    KwWith,
    KwAs,
    KwFrom,
    KwExtends,
    KwOn,
    KwError,
    KwInput,
    KwOutput,
    KwContext,

    Ident(String),
    Number(f64),
    Bool(bool),
    Null,
    /// An unquoted identifier that is also a recognized HTTP method atom. Literal-izes to the
    /// same `Value::String` a plain identifier would (spec §4.5 point 1); kept distinct at the
    /// token level only because the lexer recognizes it as its own atom class (spec §4.1).
    HttpMethod(String),
    Str(String),
    /// A bare `/...`-style path atom, captured until whitespace or a delimiter.
    BarePath(String),

    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Dot,
    Comma,
    Colon,
    Eq,
    /// `||`
    PipePipe,
    /// `??`
    QuestionQuestion,
    /// `<-`
    Arrow,
    /// `<-!`
    ForceArrow,
    /// `---` legacy top-level separator.
    Separator,
    /// Blank line, significant only for the legacy (brace-free) body-delimiting form.
    BlankLine,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: u32,
    pub column: u32,
}

pub fn keyword(ident: &str) -> Option<TokenKind> {
    match ident.to_ascii_lowercase().as_str() {
        "version" => Some(TokenKind::Version),
        "bridge" => Some(TokenKind::KwBridge),
        "tool" => Some(TokenKind::KwTool),
        "const" => Some(TokenKind::KwConst),
        "define" => Some(TokenKind::KwDefine),
        "with" => Some(TokenKind::KwWith),
        "as" => Some(TokenKind::KwAs),
        "from" => Some(TokenKind::KwFrom),
        "extends" => Some(TokenKind::KwExtends),
        "on" => Some(TokenKind::KwOn),
        "error" => Some(TokenKind::KwError),
        "input" => Some(TokenKind::KwInput),
        "output" => Some(TokenKind::KwOutput),
        "context" => Some(TokenKind::KwContext),
        "true" => Some(TokenKind::Bool(true)),
        "false" => Some(TokenKind::Bool(false)),
        "null" => Some(TokenKind::Null),
        _ => None,
    }
}

pub const HTTP_METHODS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "OPTIONS"];

pub fn is_http_method(ident: &str) -> bool {
    HTTP_METHODS.iter().any(|m| m.eq_ignore_ascii_case(ident))
}
