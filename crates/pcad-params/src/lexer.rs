//! Tokenizer for expression source text

use crate::error::{SyntaxError, SyntaxErrorKind};

/// Kinds of lexical tokens
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
    Comma,
}

/// A token with its position in the source
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte offset of the first character
    pub offset: usize,
    /// Length in bytes
    pub len: usize,
}

impl Token {
    /// Source text of this token
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.offset..self.offset + self.len]
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Split `source` into tokens, skipping whitespace.
pub fn tokenize(source: &str) -> Result<Vec<Token>, SyntaxError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        // Tokens are ASCII; anything else is reported by its full char
        let Some(c) = source[pos..].chars().next() else {
            break;
        };

        if c.is_whitespace() {
            pos += c.len_utf8();
            continue;
        }

        let single = match c {
            '+' => Some(TokenKind::Plus),
            '-' => Some(TokenKind::Minus),
            '*' => Some(TokenKind::Star),
            '/' => Some(TokenKind::Slash),
            '^' => Some(TokenKind::Caret),
            '(' => Some(TokenKind::LParen),
            ')' => Some(TokenKind::RParen),
            ',' => Some(TokenKind::Comma),
            _ => None,
        };
        if let Some(kind) = single {
            tokens.push(Token {
                kind,
                offset: pos,
                len: 1,
            });
            pos += 1;
            continue;
        }

        if c.is_ascii_digit() || (c == '.' && bytes.get(pos + 1).is_some_and(u8::is_ascii_digit))
        {
            let len = scan_number(&bytes[pos..]);
            let text = &source[pos..pos + len];
            let value = text
                .parse::<f64>()
                .map_err(|_| SyntaxError::new(SyntaxErrorKind::UnexpectedChar(c), pos))?;
            if !value.is_finite() {
                return Err(SyntaxError::new(
                    SyntaxErrorKind::NumberOutOfRange(text.to_string()),
                    pos,
                ));
            }
            tokens.push(Token {
                kind: TokenKind::Number(value),
                offset: pos,
                len,
            });
            pos += len;
            continue;
        }

        if is_ident_start(c) {
            let len = source[pos..]
                .find(|ch: char| !is_ident_continue(ch))
                .unwrap_or(source.len() - pos);
            tokens.push(Token {
                kind: TokenKind::Ident(source[pos..pos + len].to_string()),
                offset: pos,
                len,
            });
            pos += len;
            continue;
        }

        return Err(SyntaxError::new(SyntaxErrorKind::UnexpectedChar(c), pos));
    }

    Ok(tokens)
}

/// Length of the numeric literal at the start of `bytes`.
///
/// Accepts `12`, `1.5`, `.5`, `3.` and an exponent `e[+-]digits`. An `e` not
/// followed by digits is left for the next token.
fn scan_number(bytes: &[u8]) -> usize {
    let digits = |from: usize| {
        bytes[from..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    let mut len = digits(0);
    if bytes.get(len) == Some(&b'.') {
        len += 1;
        len += digits(len);
    }

    if matches!(bytes.get(len), Some(b'e' | b'E')) {
        let mut exp = len + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_digits = digits(exp);
        if exp_digits > 0 {
            len = exp + exp_digits;
        }
    }

    len
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_numbers() {
        assert_eq!(kinds("42"), vec![TokenKind::Number(42.0)]);
        assert_eq!(kinds(".5"), vec![TokenKind::Number(0.5)]);
        assert_eq!(kinds("1.5e-3"), vec![TokenKind::Number(1.5e-3)]);
        assert_eq!(kinds("2E+2"), vec![TokenKind::Number(200.0)]);
    }

    #[test]
    fn test_dangling_exponent_is_identifier() {
        assert_eq!(
            kinds("2e"),
            vec![TokenKind::Number(2.0), TokenKind::Ident("e".into())]
        );
    }

    #[test]
    fn test_operators_and_offsets() {
        let tokens = tokenize("a_1 * (b+2)").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Ident("a_1".into()));
        assert_eq!(tokens[1].kind, TokenKind::Star);
        assert_eq!(tokens[1].offset, 4);
        assert_eq!(tokens[2].kind, TokenKind::LParen);
        assert_eq!(tokens[4].offset, 8);
    }

    #[test]
    fn test_overflowing_literal_rejected() {
        let err = tokenize("2 * 1e999").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::NumberOutOfRange("1e999".into()));
        assert_eq!(err.offset, 4);
        assert_eq!(kinds("1e308"), vec![TokenKind::Number(1e308)]);
    }

    #[test]
    fn test_unexpected_char() {
        let err = tokenize("1 + #").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::UnexpectedChar('#'));
        assert_eq!(err.offset, 4);
    }

    #[test]
    fn test_non_ascii_reported_whole() {
        let err = tokenize("2 × 3").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::UnexpectedChar('×'));
        assert_eq!(err.offset, 2);
    }
}
