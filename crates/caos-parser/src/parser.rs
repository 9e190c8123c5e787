use caos_common::errors::CaosError;
use caos_common::span::Span;
use caos_ir::instruction::{Call, Literal, Operand};
use caos_ir::opcode::{OpCode, OpKind};
use caos_ir::script::Script;
use caos_lexer::lexer::Lexer;
use caos_lexer::token::{Token, TokenKind};

/// Keyword separating an injected install script from its removal script.
const REMOVAL_MARKER: &str = "rscr";

/// An injected script split at `rscr`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Injection {
    pub install: Script,
    pub removal: Option<Script>,
}

/// Signature-driven CAOS parser.
///
/// The command language has no grammar beyond "name followed by exactly the
/// declared operands", so parsing is a walk over the opcode table: each
/// command consumes `arity` operands, and each operand is a literal or a
/// nested query that in turn consumes its own operands.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<CaosError>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            errors: Vec::new(),
        }
    }

    /// Parse the whole token stream as one script. `rscr` is rejected here;
    /// use [`Parser::parse_injection`] for text that may carry a removal script.
    pub fn parse(mut self) -> Result<Script, Vec<CaosError>> {
        let script = self.parse_until_marker();
        if self.current_kind() != TokenKind::Eof {
            let span = self.current_span();
            self.errors.push(CaosError::parser(
                "unexpected 'rscr' outside an injected script",
                span,
            ));
        }
        self.finish(script)
    }

    /// Parse an injected script: everything up to `rscr` is the install
    /// script, everything after it the removal script.
    pub fn parse_injection(mut self) -> Result<Injection, Vec<CaosError>> {
        let install = self.parse_until_marker();
        let removal = if self.current_kind() == TokenKind::Eof {
            None
        } else {
            self.advance(); // rscr
            Some(self.parse_until_marker())
        };
        if self.current_kind() != TokenKind::Eof {
            let span = self.current_span();
            self.errors.push(CaosError::parser("duplicate 'rscr'", span));
        }
        self.finish(Injection { install, removal })
    }

    fn finish<T>(self, value: T) -> Result<T, Vec<CaosError>> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(self.errors)
        }
    }

    /// Parse commands until EOF or the removal marker (left unconsumed).
    fn parse_until_marker(&mut self) -> Script {
        let mut calls = Vec::new();
        while !self.is_at_end() && !self.at_removal_marker() {
            match self.parse_command() {
                Ok(call) => calls.push(call),
                Err(e) => {
                    self.errors.push(e);
                    self.synchronize();
                }
            }
        }
        Script::from(calls)
    }

    // =====================================================================
    // Calls
    // =====================================================================

    fn parse_command(&mut self) -> Result<Call, CaosError> {
        let (name, span) = self.read_name()?;
        let op = OpCode::lookup_command(&name).ok_or_else(|| {
            if OpCode::lookup_query(&name).is_some() {
                CaosError::parser(format!("'{}' is a value, not a command", name), span)
            } else {
                CaosError::parser(format!("unknown command '{}'", name), span)
            }
        })?;
        self.parse_operands(op, span)
    }

    fn parse_query(&mut self) -> Result<Call, CaosError> {
        let (name, span) = self.read_name()?;
        let op = OpCode::lookup_query(&name).ok_or_else(|| {
            if OpCode::lookup_command(&name).is_some() {
                CaosError::parser(format!("'{}' is a command, not a value", name), span)
            } else {
                CaosError::parser(format!("unknown value '{}'", name), span)
            }
        })?;
        debug_assert!(matches!(op.signature().kind, OpKind::Query(_)));
        self.parse_operands(op, span)
    }

    fn parse_operands(&mut self, op: OpCode, start: Span) -> Result<Call, CaosError> {
        let arity = op.signature().arity();
        let mut args = Vec::with_capacity(arity);
        for i in 0..arity {
            if self.is_at_end() || self.at_removal_marker() {
                return Err(CaosError::parser(
                    format!("{} expects {} operands, found {}", op, arity, i),
                    self.current_span(),
                ));
            }
            args.push(self.parse_operand()?);
        }
        let end = self.previous_span().unwrap_or(start);
        Ok(Call::new(op, args).at(start.merge(end)))
    }

    fn parse_operand(&mut self) -> Result<Operand, CaosError> {
        let token = self.current().clone();
        let literal = match token.kind {
            TokenKind::IntLit => {
                let n = token.lexeme.parse::<i32>().map_err(|_| {
                    let message = format!("integer '{}' out of range", token.lexeme);
                    CaosError::parser(message, token.span)
                })?;
                Literal::Int(n)
            }
            TokenKind::FloatLit => {
                let n = token.lexeme.parse::<f32>().map_err(|_| {
                    CaosError::parser(format!("bad float '{}'", token.lexeme), token.span)
                })?;
                Literal::Float(n)
            }
            TokenKind::StringLit => Literal::Str(token.lexeme),
            TokenKind::ByteStringLit => Literal::Bytes(token.lexeme),
            TokenKind::Word => return Ok(Operand::Query(self.parse_query()?)),
            TokenKind::Error => {
                return Err(CaosError::parser(
                    format!("invalid token '{}'", token.lexeme),
                    token.span,
                ));
            }
            TokenKind::Eof => {
                return Err(CaosError::parser("unexpected end of script", token.span));
            }
        };
        self.advance();
        Ok(Operand::Literal(literal))
    }

    /// Read an opcode name, joining namespace words such as `new:` with the
    /// word that follows.
    fn read_name(&mut self) -> Result<(String, Span), CaosError> {
        let token = self.current().clone();
        if token.kind != TokenKind::Word {
            return Err(CaosError::parser(
                format!("expected a command name, found {} '{}'", token.kind, token.lexeme),
                token.span,
            ));
        }
        self.advance();
        let mut name = token.word();
        let mut span = token.span;
        if OpCode::is_namespace(&name) {
            let next = self.current().clone();
            if next.kind != TokenKind::Word {
                return Err(CaosError::parser(
                    format!("'{}' must be followed by a name", name),
                    next.span,
                ));
            }
            self.advance();
            name = format!("{} {}", name, next.word());
            span = span.merge(next.span);
        }
        Ok((name, span))
    }

    // =====================================================================
    // Helpers
    // =====================================================================

    fn current(&self) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.pos.min(last)]
    }

    fn current_kind(&self) -> TokenKind {
        if self.tokens.is_empty() {
            TokenKind::Eof
        } else {
            self.current().kind
        }
    }

    fn current_span(&self) -> Span {
        if self.tokens.is_empty() {
            Span::default()
        } else {
            self.current().span
        }
    }

    fn previous_span(&self) -> Option<Span> {
        self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)).map(|t| t.span)
    }

    fn is_at_end(&self) -> bool {
        self.current_kind() == TokenKind::Eof
    }

    fn at_removal_marker(&self) -> bool {
        self.current_kind() == TokenKind::Word && self.current().word() == REMOVAL_MARKER
    }

    fn advance(&mut self) {
        if !self.is_at_end() {
            self.pos += 1;
        }
    }

    /// Skip ahead to the next word that names a command.
    fn synchronize(&mut self) {
        if !self.at_removal_marker() {
            self.advance();
        }
        while !self.is_at_end() && !self.at_removal_marker() {
            let token = self.current();
            let word = token.word();
            if token.kind == TokenKind::Word
                && (OpCode::lookup_command(&word).is_some() || OpCode::is_namespace(&word))
            {
                return;
            }
            self.advance();
        }
    }
}

/// Tokenize `source`, collecting every lexer error.
pub fn lex(source: &str) -> Result<Vec<Token>, Vec<CaosError>> {
    let (tokens, errors) = Lexer::new(source).tokenize();
    if errors.is_empty() {
        return Ok(tokens);
    }
    let spans = tokens.iter().filter(|t| t.kind == TokenKind::Error).map(|t| t.span);
    Err(errors
        .into_iter()
        .zip(spans.chain(std::iter::repeat(Span::default())))
        .map(|(message, span)| CaosError::lexer(message, span))
        .collect())
}

fn join_errors(errors: Vec<CaosError>) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Convenience: lex and parse script text in one step.
pub fn compile(source: &str) -> Result<Script, String> {
    let tokens = lex(source).map_err(join_errors)?;
    Parser::new(tokens).parse().map_err(join_errors)
}

/// Convenience: lex and parse injected text that may contain `rscr`.
pub fn compile_injection(source: &str) -> Result<Injection, String> {
    let tokens = lex(source).map_err(join_errors)?;
    Parser::new(tokens).parse_injection().map_err(join_errors)
}
