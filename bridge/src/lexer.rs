//! Tokenizer for Bridge DSL text (spec §4.1).
//!
//! CRLF is normalized to LF up front so the rest of the lexer only ever sees `\n`. Tabs count
//! as whitespace. `#` starts a line comment. `---` is the legacy top-level instruction
//! separator. A line containing nothing (after whitespace/comment stripping) produces a
//! [`TokenKind::BlankLine`] token, which the parser uses to close a brace-free legacy body.

use crate::error::ParseError;
use crate::token::{is_http_method, keyword, Token, TokenKind};

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        let normalized = source.replace("\r\n", "\n").replace('\r', "\n");
        Lexer { chars: normalized.chars().collect(), pos: 0, line: 1, column: 1 }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            let is_eof = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn make(&self, kind: TokenKind, line: u32, column: u32) -> Token {
        Token { kind, line, column }
    }

    fn next_token(&mut self) -> Result<Token, ParseError> {
        loop {
            let (line, column) = (self.line, self.column);
            match self.peek() {
                None => return Ok(self.make(TokenKind::Eof, line, column)),
                Some(' ') | Some('\t') => {
                    self.advance();
                    continue;
                }
                Some('\n') => {
                    // Blank line iff everything on this physical line so far was whitespace,
                    // i.e. we haven't emitted a non-blank token since the previous newline.
                    // That is tracked by the caller re-checking column == 1 after only
                    // whitespace was skipped above.
                    let was_line_start = column == 1;
                    self.advance();
                    if was_line_start {
                        return Ok(self.make(TokenKind::BlankLine, line, column));
                    }
                    continue;
                }
                Some('#') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                    continue;
                }
                Some('-') if self.peek_at(1) == Some('-') && self.peek_at(2) == Some('-') => {
                    self.advance();
                    self.advance();
                    self.advance();
                    return Ok(self.make(TokenKind::Separator, line, column));
                }
                Some('<') if self.peek_at(1) == Some('-') && self.peek_at(2) == Some('!') => {
                    self.advance();
                    self.advance();
                    self.advance();
                    return Ok(self.make(TokenKind::ForceArrow, line, column));
                }
                Some('<') if self.peek_at(1) == Some('-') => {
                    self.advance();
                    self.advance();
                    return Ok(self.make(TokenKind::Arrow, line, column));
                }
                Some('|') if self.peek_at(1) == Some('|') => {
                    self.advance();
                    self.advance();
                    return Ok(self.make(TokenKind::PipePipe, line, column));
                }
                Some('?') if self.peek_at(1) == Some('?') => {
                    self.advance();
                    self.advance();
                    return Ok(self.make(TokenKind::QuestionQuestion, line, column));
                }
                Some('{') => {
                    self.advance();
                    return Ok(self.make(TokenKind::LBrace, line, column));
                }
                Some('}') => {
                    self.advance();
                    return Ok(self.make(TokenKind::RBrace, line, column));
                }
                Some('[') => {
                    self.advance();
                    return Ok(self.make(TokenKind::LBracket, line, column));
                }
                Some(']') => {
                    self.advance();
                    return Ok(self.make(TokenKind::RBracket, line, column));
                }
                Some('.') => {
                    self.advance();
                    return Ok(self.make(TokenKind::Dot, line, column));
                }
                Some(',') => {
                    self.advance();
                    return Ok(self.make(TokenKind::Comma, line, column));
                }
                Some(':') => {
                    self.advance();
                    return Ok(self.make(TokenKind::Colon, line, column));
                }
                Some('=') => {
                    self.advance();
                    return Ok(self.make(TokenKind::Eq, line, column));
                }
                Some('"') => return self.lex_string(line, column),
                Some('/') => return self.lex_bare_path(line, column),
                Some(c) if c.is_ascii_digit() || (c == '-' && self.peek_at(1).map_or(false, |d| d.is_ascii_digit())) => {
                    return self.lex_number(line, column)
                }
                Some(c) if c.is_alphabetic() || c == '_' => return self.lex_ident(line, column),
                Some(c) => {
                    return Err(ParseError::new(line, column, format!("unexpected character '{c}'")))
                }
            }
        }
    }

    fn lex_string(&mut self, line: u32, column: u32) -> Result<Token, ParseError> {
        self.advance(); // opening quote
        let mut s = String::new();
        loop {
            match self.advance() {
                None => return Err(ParseError::new(line, column, "unterminated string literal")),
                Some('"') => break,
                Some('\\') => match self.advance() {
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some('"') => s.push('"'),
                    Some('\\') => s.push('\\'),
                    Some(other) => s.push(other),
                    None => return Err(ParseError::new(line, column, "unterminated string literal")),
                },
                Some(c) => s.push(c),
            }
        }
        Ok(self.make(TokenKind::Str(s), line, column))
    }

    fn lex_bare_path(&mut self, line: u32, column: u32) -> Result<Token, ParseError> {
        let mut s = String::new();
        while let Some(c) = self.peek() {
            if c.is_whitespace() || matches!(c, '{' | '}' | ',' | ')' | '(') {
                break;
            }
            s.push(c);
            self.advance();
        }
        Ok(self.make(TokenKind::BarePath(s), line, column))
    }

    fn lex_number(&mut self, line: u32, column: u32) -> Result<Token, ParseError> {
        let mut s = String::new();
        if self.peek() == Some('-') {
            s.push('-');
            self.advance();
        }
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                s.push(c);
                self.advance();
            } else {
                break;
            }
        }
        if self.peek() == Some('.') && self.peek_at(1).map_or(false, |c| c.is_ascii_digit()) {
            s.push('.');
            self.advance();
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    s.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
        }
        let n: f64 = s
            .parse()
            .map_err(|_| ParseError::new(line, column, format!("invalid number literal '{s}'")))?;
        Ok(self.make(TokenKind::Number(n), line, column))
    }

    fn lex_ident(&mut self, line: u32, column: u32) -> Result<Token, ParseError> {
        let mut s = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                s.push(c);
                self.advance();
            } else {
                break;
            }
        }
        if let Some(kw) = keyword(&s) {
            return Ok(self.make(kw, line, column));
        }
        if is_http_method(&s) {
            return Ok(self.make(TokenKind::HttpMethod(s), line, column));
        }
        Ok(self.make(TokenKind::Ident(s), line, column))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src).tokenize().unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_keywords_and_arrows() {
        let k = kinds("bridge Query.dashboard {\n  with input as i\n  x <- i.a\n  y <-! i.b\n}\n");
        assert!(k.contains(&TokenKind::KwBridge));
        assert!(k.contains(&TokenKind::Arrow));
        assert!(k.contains(&TokenKind::ForceArrow));
    }

    #[test]
    fn lexes_fallback_operators() {
        let k = kinds("x <- i.a || 1 ?? i.b");
        assert!(k.contains(&TokenKind::PipePipe));
        assert!(k.contains(&TokenKind::QuestionQuestion));
    }

    #[test]
    fn lexes_string_with_escapes() {
        let k = kinds(r#""hello \"world\"""#);
        assert_eq!(k[0], TokenKind::Str("hello \"world\"".to_string()));
    }

    #[test]
    fn lexes_number_and_bool_and_null() {
        let k = kinds("35000000 true false null");
        assert_eq!(k[0], TokenKind::Number(35000000.0));
        assert_eq!(k[1], TokenKind::Bool(true));
        assert_eq!(k[2], TokenKind::Bool(false));
        assert_eq!(k[3], TokenKind::Null);
    }

    #[test]
    fn lexes_http_method_atom_distinct_from_ident() {
        let k = kinds("method = GET");
        assert_eq!(k[2], TokenKind::HttpMethod("GET".to_string()));
    }

    #[test]
    fn lexes_bare_path() {
        let k = kinds("path = /users/{id}");
        assert!(matches!(&k[2], TokenKind::BarePath(p) if p == "/users/"));
    }

    #[test]
    fn skips_comments() {
        let k = kinds("# a comment\nbridge Query.x {}\n");
        assert_eq!(k[0], TokenKind::KwBridge);
    }

    #[test]
    fn emits_blank_line_token() {
        let k = kinds("a = 1\n\nb = 2\n");
        assert!(k.contains(&TokenKind::BlankLine));
    }

    #[test]
    fn emits_separator_token() {
        let k = kinds("const a = 1\n---\nconst b = 2\n");
        assert!(k.contains(&TokenKind::Separator));
    }

    #[test]
    fn unterminated_string_is_parse_error() {
        let err = Lexer::new("\"oops").tokenize().unwrap_err();
        assert_eq!(err.line, 1);
    }
}
