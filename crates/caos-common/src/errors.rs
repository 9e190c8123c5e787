use crate::span::Span;

/// Unified error type for the CAOS front end and engine.
#[derive(Debug, thiserror::Error)]
pub enum CaosError {
    #[error("Lexer error at {span}: {message}")]
    LexerError { message: String, span: Span },

    #[error("Parser error at {span}: {message}")]
    ParserError { message: String, span: Span },

    #[error("Runtime error: {message}")]
    RuntimeError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl CaosError {
    pub fn lexer(message: impl Into<String>, span: Span) -> Self {
        CaosError::LexerError { message: message.into(), span }
    }

    pub fn parser(message: impl Into<String>, span: Span) -> Self {
        CaosError::ParserError { message: message.into(), span }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        CaosError::RuntimeError { message: message.into() }
    }
}
