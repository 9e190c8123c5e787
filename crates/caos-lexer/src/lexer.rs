use caos_common::span::Span;
use crate::token::{Token, TokenKind};

/// The CAOS lexer. Converts script text into a stream of tokens.
///
/// Whitespace (including newlines) only separates tokens; `*` starts a
/// comment running to the end of the line.
pub struct Lexer<'src> {
    source: &'src str,
    bytes: &'src [u8],
    pos: usize,
    tokens: Vec<Token>,
    errors: Vec<String>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Tokenize the entire source, returning tokens and any errors.
    pub fn tokenize(mut self) -> (Vec<Token>, Vec<String>) {
        while !self.is_at_end() {
            self.skip_whitespace_and_comments();
            if self.is_at_end() {
                break;
            }

            let ch = self.peek();
            match ch {
                b'"' => self.lex_string(),
                b'[' => self.lex_byte_string(),
                b'0'..=b'9' => self.lex_number(),
                b'-' if self.peek_next().is_ascii_digit() => self.lex_number(),
                b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.lex_word(),
                _ => {
                    let start = self.pos;
                    self.advance_char();
                    let found = &self.source[start..self.pos];
                    self.errors.push(format!(
                        "unexpected character '{}' at position {}",
                        found, start
                    ));
                    self.push_token(TokenKind::Error, start, self.pos);
                }
            }
        }

        self.push_token(TokenKind::Eof, self.pos, self.pos);
        (self.tokens, self.errors)
    }

    // =====================================================================
    // Literals
    // =====================================================================

    fn lex_string(&mut self) {
        let start = self.pos;
        self.advance(); // opening "
        let mut value = String::new();

        while !self.is_at_end() && self.peek() != b'"' {
            if self.peek() == b'\\' {
                self.advance();
                let escaped = match self.peek() {
                    b'n' => '\n',
                    b't' => '\t',
                    b'r' => '\r',
                    b'"' => '"',
                    b'\\' => '\\',
                    0 if self.is_at_end() => break,
                    _ => {
                        // Unknown escapes are kept verbatim, whatever their width.
                        let esc_start = self.pos;
                        self.advance_char();
                        value.push('\\');
                        value.push_str(&self.source[esc_start..self.pos]);
                        continue;
                    }
                };
                value.push(escaped);
                self.advance();
            } else {
                let char_start = self.pos;
                self.advance_char();
                value.push_str(&self.source[char_start..self.pos]);
            }
        }

        if self.is_at_end() {
            self.errors.push(format!("unterminated string at position {}", start));
            self.push_token(TokenKind::Error, start, self.pos);
            return;
        }

        self.advance(); // closing "
        let span = Span::new(start as u32, self.pos as u32);
        self.tokens.push(Token::new(TokenKind::StringLit, span, value));
    }

    fn lex_byte_string(&mut self) {
        let start = self.pos;
        self.advance(); // [
        let body_start = self.pos;

        while !self.is_at_end() && self.peek() != b']' {
            self.advance_char();
        }

        if self.is_at_end() {
            self.errors.push(format!("unterminated byte string at position {}", start));
            self.push_token(TokenKind::Error, start, self.pos);
            return;
        }

        let body = self.source[body_start..self.pos].to_string();
        self.advance(); // ]
        let span = Span::new(start as u32, self.pos as u32);
        self.tokens.push(Token::new(TokenKind::ByteStringLit, span, body));
    }

    fn lex_number(&mut self) {
        let start = self.pos;
        if self.peek() == b'-' {
            self.advance();
        }
        while !self.is_at_end() && self.peek().is_ascii_digit() {
            self.advance();
        }
        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.advance(); // '.'
            while !self.is_at_end() && self.peek().is_ascii_digit() {
                self.advance();
            }
            self.push_token(TokenKind::FloatLit, start, self.pos);
        } else {
            self.push_token(TokenKind::IntLit, start, self.pos);
        }
    }

    /// Words may contain digits and a trailing colon (`new:`, `va00`).
    fn lex_word(&mut self) {
        let start = self.pos;
        while !self.is_at_end()
            && (self.peek().is_ascii_alphanumeric() || matches!(self.peek(), b'_' | b':'))
        {
            self.advance();
        }
        self.push_token(TokenKind::Word, start, self.pos);
    }

    // =====================================================================
    // Helpers
    // =====================================================================

    fn is_at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn peek(&self) -> u8 {
        if self.is_at_end() { 0 } else { self.bytes[self.pos] }
    }

    fn peek_next(&self) -> u8 {
        if self.pos + 1 >= self.bytes.len() { 0 } else { self.bytes[self.pos + 1] }
    }

    fn advance(&mut self) -> u8 {
        let ch = self.peek();
        self.pos += 1;
        ch
    }

    /// Advance over one full UTF-8 character.
    fn advance_char(&mut self) {
        self.pos += 1;
        while !self.is_at_end() && !self.source.is_char_boundary(self.pos) {
            self.pos += 1;
        }
    }

    fn push_token(&mut self, kind: TokenKind, start: usize, end: usize) {
        let lexeme = self.source[start..end].to_string();
        self.tokens.push(Token::new(
            kind,
            Span::new(start as u32, end as u32),
            lexeme,
        ));
    }

    fn skip_whitespace_and_comments(&mut self) {
        while !self.is_at_end() {
            match self.peek() {
                b' ' | b'\t' | b'\r' | b'\n' | b',' => {
                    self.advance();
                }
                b'*' => {
                    while !self.is_at_end() && self.peek() != b'\n' {
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token> {
        let (tokens, errors) = Lexer::new(source).tokenize();
        assert!(errors.is_empty(), "lexer errors: {:?}", errors);
        tokens
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_new_simp_line() {
        assert_eq!(
            kinds("new: simp 2 3 4 \"blnk\" 2 0 5000"),
            vec![
                TokenKind::Word,
                TokenKind::Word,
                TokenKind::IntLit,
                TokenKind::IntLit,
                TokenKind::IntLit,
                TokenKind::StringLit,
                TokenKind::IntLit,
                TokenKind::IntLit,
                TokenKind::IntLit,
                TokenKind::Eof,
            ]
        );
        let tokens = lex("new: simp");
        assert_eq!(tokens[0].lexeme, "new:");
        assert_eq!(tokens[1].lexeme, "simp");
    }

    #[test]
    fn test_words_fold_case() {
        let tokens = lex("TARG Pntr");
        assert_eq!(tokens[0].word(), "targ");
        assert_eq!(tokens[1].word(), "pntr");
    }

    #[test]
    fn test_negative_and_float() {
        let tokens = lex("attr -12 3.5");
        assert_eq!(tokens[1].kind, TokenKind::IntLit);
        assert_eq!(tokens[1].lexeme, "-12");
        assert_eq!(tokens[2].kind, TokenKind::FloatLit);
        assert_eq!(tokens[2].lexeme, "3.5");
    }

    #[test]
    fn test_byte_string_kept_raw() {
        let tokens = lex("anim [1 2x 3]");
        assert_eq!(tokens[1].kind, TokenKind::ByteStringLit);
        assert_eq!(tokens[1].lexeme, "1 2x 3");
    }

    #[test]
    fn test_string_escapes() {
        let tokens = lex(r#"outs "a\"b\n""#);
        assert_eq!(tokens[1].kind, TokenKind::StringLit);
        assert_eq!(tokens[1].lexeme, "a\"b\n");
    }

    #[test]
    fn test_unknown_escape_of_multibyte_char() {
        let tokens = lex("outs \"\\éx\" outs \"é\\q\"");
        assert_eq!(tokens[1].kind, TokenKind::StringLit);
        assert_eq!(tokens[1].lexeme, "\\éx");
        assert_eq!(tokens[3].lexeme, "é\\q");
        assert_eq!(tokens[4].kind, TokenKind::Eof);
    }

    #[test]
    fn test_comments_and_newlines_skipped() {
        assert_eq!(
            kinds("* make a thing\ntarg pntr * trailing\nrscr\n"),
            vec![TokenKind::Word, TokenKind::Word, TokenKind::Word, TokenKind::Eof]
        );
    }

    #[test]
    fn test_unterminated_string_reports_error() {
        let (tokens, errors) = Lexer::new("outs \"oops").tokenize();
        assert_eq!(errors.len(), 1);
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Error));
    }

    #[test]
    fn test_unterminated_byte_string_reports_error() {
        let (_, errors) = Lexer::new("anim [1 2").tokenize();
        assert!(errors[0].contains("unterminated byte string"));
    }

    #[test]
    fn test_unexpected_character() {
        let (_, errors) = Lexer::new("targ @").tokenize();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains('@'));
    }
}
