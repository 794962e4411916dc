//! Lexer for the condition and numeric expression language.

use super::error::ParseError;
use super::token::{Token, TokenKind};

/// Splits an expression into tokens.
pub struct Lexer<'a> {
    input: &'a str,
    chars: Vec<(usize, char)>,
    index: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer over the input.
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().collect(),
            index: 0,
        }
    }

    /// Tokenizes the whole input, ending with an `Eof` token.
    pub fn tokenize(mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.index).map(|(_, c)| *c)
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.chars.get(self.index + n).map(|(_, c)| *c)
    }

    fn offset(&self) -> usize {
        self.chars
            .get(self.index)
            .map_or(self.input.len(), |(pos, _)| *pos)
    }

    fn error(&self, message: impl Into<String>, position: usize) -> ParseError {
        ParseError::new(message, position, self.input)
    }

    fn next_token(&mut self) -> Result<Token, ParseError> {
        while self.peek().is_some_and(char::is_whitespace) {
            self.index += 1;
        }

        let start = self.offset();
        let Some(c) = self.peek() else {
            return Ok(Token::new(TokenKind::Eof, start));
        };

        if c.is_ascii_digit() || (c == '.' && self.peek_at(1).is_some_and(|n| n.is_ascii_digit())) {
            return self.read_number(start);
        }
        if c.is_alphabetic() || c == '_' {
            return Ok(self.read_identifier(start));
        }
        if c == '"' || c == '\'' {
            return self.read_string(start, c);
        }

        let two = (c, self.peek_at(1));
        let (kind, width) = match two {
            ('&', Some('&')) => (TokenKind::And, 2),
            ('|', Some('|')) => (TokenKind::Or, 2),
            ('=', Some('=')) => (TokenKind::Eq, 2),
            ('!', Some('=')) => (TokenKind::NotEq, 2),
            ('<', Some('=')) => (TokenKind::Le, 2),
            ('>', Some('=')) => (TokenKind::Ge, 2),
            ('!', _) => (TokenKind::Not, 1),
            ('<', _) => (TokenKind::Lt, 1),
            ('>', _) => (TokenKind::Gt, 1),
            ('+', _) => (TokenKind::Plus, 1),
            ('-', _) => (TokenKind::Minus, 1),
            ('*', _) => (TokenKind::Star, 1),
            ('/', _) => (TokenKind::Slash, 1),
            ('%', _) => (TokenKind::Percent, 1),
            ('^', _) => (TokenKind::Caret, 1),
            ('(', _) => (TokenKind::LParen, 1),
            (')', _) => (TokenKind::RParen, 1),
            (',', _) => (TokenKind::Comma, 1),
            ('=', _) => return Err(self.error("Single '=' is not an operator; use '=='", start)),
            ('&' | '|', _) => {
                return Err(self.error(format!("Expected '{c}{c}'"), start));
            }
            _ => return Err(self.error(format!("Unexpected character '{c}'"), start)),
        };
        self.index += width;
        Ok(Token::new(kind, start))
    }

    fn read_number(&mut self, start: usize) -> Result<Token, ParseError> {
        let mut text = String::new();
        let mut is_float = false;

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
            } else if c == '.' && !is_float {
                is_float = true;
                text.push(c);
            } else if (c == 'e' || c == 'E')
                && (self.peek_at(1).is_some_and(|n| n.is_ascii_digit())
                    || (matches!(self.peek_at(1), Some('+' | '-'))
                        && self.peek_at(2).is_some_and(|n| n.is_ascii_digit())))
            {
                is_float = true;
                text.push(c);
                self.index += 1;
                if let Some(sign) = self.peek().filter(|s| *s == '+' || *s == '-') {
                    text.push(sign);
                    self.index += 1;
                }
                continue;
            } else {
                break;
            }
            self.index += 1;
        }

        if !is_float {
            if let Ok(i) = text.parse::<i64>() {
                return Ok(Token::new(TokenKind::Integer(i), start));
            }
        }
        text.parse::<f64>()
            .map(|f| Token::new(TokenKind::Float(f), start))
            .map_err(|_| self.error(format!("Invalid number '{text}'"), start))
    }

    fn read_identifier(&mut self, start: usize) -> Token {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            let continues_path = c == '.'
                && self
                    .peek_at(1)
                    .is_some_and(|n| n.is_alphanumeric() || n == '_');
            if c.is_alphanumeric() || c == '_' || continues_path {
                text.push(c);
                self.index += 1;
            } else {
                break;
            }
        }
        Token::new(TokenKind::Ident(text), start)
    }

    fn read_string(&mut self, start: usize, quote: char) -> Result<Token, ParseError> {
        self.index += 1;
        let mut text = String::new();
        while let Some(c) = self.peek() {
            self.index += 1;
            if c == quote {
                return Ok(Token::new(TokenKind::Str(text), start));
            }
            if c == '\\' {
                match self.peek() {
                    Some(escaped) => {
                        self.index += 1;
                        text.push(match escaped {
                            'n' => '\n',
                            't' => '\t',
                            other => other,
                        });
                    }
                    None => break,
                }
            } else {
                text.push(c);
            }
        }
        Err(self.error("Unterminated string literal", start))
    }
}
