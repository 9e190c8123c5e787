use caos_common::span::Span;

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    /// Source text of the token. For string and byte-string literals this is
    /// the decoded contents without delimiters.
    pub lexeme: String,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span, lexeme: String) -> Self {
        Self { kind, span, lexeme }
    }

    /// The lexeme folded to lower case, as command names are matched.
    pub fn word(&self) -> String {
        self.lexeme.to_ascii_lowercase()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// A command or query name, e.g. `targ`, `new:`, `simp`.
    Word,
    IntLit,
    FloatLit,
    /// `"text"`
    StringLit,
    /// `[1 2 3]`: contents are kept raw and validated by the opcode.
    ByteStringLit,

    Eof,
    Error,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
