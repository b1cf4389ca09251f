use super::error::{CompileError, CompileErrorKind};
use crate::units;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Numeric literal, already scaled to canonical units.
    Number(f64),
    /// Quoted string literal (content without quotes).
    Str(String),
    Ident(String),
    // Punctuation
    Dot,
    Comma,
    LParen,
    RParen,
    // Comparison operators
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    // Logical operators
    And,
    Or,
    Not,
    // Arithmetic operators
    Plus,
    Minus,
    Star,
    Slash,
    Eof,
}

#[derive(Debug, Clone)]
pub struct Spanned {
    pub token: Token,
    /// Byte offset of the first character of the token.
    pub offset: usize,
    /// Source text of the token, for diagnostics.
    pub text: String,
}

pub fn lex(src: &str) -> Result<Vec<Spanned>, CompileError> {
    let mut tokens = Vec::new();
    let chars: Vec<(usize, char)> = src.char_indices().collect();
    let mut pos = 0usize;

    let offset_at = |i: usize| chars.get(i).map(|(o, _)| *o).unwrap_or(src.len());

    while pos < chars.len() {
        let (start, c) = chars[pos];

        if c.is_whitespace() {
            pos += 1;
            continue;
        }

        // String literal, either quote style
        if c == '\'' || c == '"' {
            let quote = c;
            pos += 1;
            let mut s = String::new();
            loop {
                let Some(&(_, sc)) = chars.get(pos) else {
                    return Err(CompileError::new(
                        CompileErrorKind::UnterminatedString,
                        start,
                        &src[start..],
                    ));
                };
                pos += 1;
                if sc == quote {
                    break;
                }
                s.push(sc);
            }
            tokens.push(Spanned {
                token: Token::Str(s),
                offset: start,
                text: src[start..offset_at(pos)].to_string(),
            });
            continue;
        }

        // Number with optional unit suffix
        if c.is_ascii_digit() || (c == '.' && matches!(chars.get(pos + 1), Some((_, d)) if d.is_ascii_digit())) {
            while pos < chars.len() && chars[pos].1.is_ascii_digit() {
                pos += 1;
            }
            if pos + 1 < chars.len() && chars[pos].1 == '.' && chars[pos + 1].1.is_ascii_digit() {
                pos += 1;
                while pos < chars.len() && chars[pos].1.is_ascii_digit() {
                    pos += 1;
                }
            }
            let number_end = offset_at(pos);
            while pos < chars.len() && chars[pos].1.is_ascii_alphabetic() {
                pos += 1;
            }
            let end = offset_at(pos);
            let text = &src[start..end];
            let value: f64 = src[start..number_end].parse().map_err(|_| {
                CompileError::new(CompileErrorKind::InvalidNumber, start, text)
            })?;
            let suffix = &src[number_end..end];
            let scale = if suffix.is_empty() {
                1.0
            } else {
                units::unit_scale(suffix).ok_or_else(|| {
                    CompileError::new(CompileErrorKind::UnknownUnit, number_end, suffix)
                })?
            };
            tokens.push(Spanned {
                token: Token::Number(value * scale),
                offset: start,
                text: text.to_string(),
            });
            continue;
        }

        // Identifier
        if c.is_alphabetic() || c == '_' {
            while pos < chars.len() && (chars[pos].1.is_alphanumeric() || chars[pos].1 == '_') {
                pos += 1;
            }
            let text = &src[start..offset_at(pos)];
            tokens.push(Spanned {
                token: Token::Ident(text.to_string()),
                offset: start,
                text: text.to_string(),
            });
            continue;
        }

        // Operators and punctuation
        let next = chars.get(pos + 1).map(|(_, n)| *n);
        let (token, width) = match (c, next) {
            ('=', Some('=')) => (Token::Eq, 2),
            ('!', Some('=')) => (Token::Neq, 2),
            ('<', Some('=')) => (Token::Lte, 2),
            ('>', Some('=')) => (Token::Gte, 2),
            ('&', Some('&')) => (Token::And, 2),
            ('|', Some('|')) => (Token::Or, 2),
            ('<', _) => (Token::Lt, 1),
            ('>', _) => (Token::Gt, 1),
            ('!', _) => (Token::Not, 1),
            ('+', _) => (Token::Plus, 1),
            ('-', _) => (Token::Minus, 1),
            ('*', _) => (Token::Star, 1),
            ('/', _) => (Token::Slash, 1),
            ('.', _) => (Token::Dot, 1),
            (',', _) => (Token::Comma, 1),
            ('(', _) => (Token::LParen, 1),
            (')', _) => (Token::RParen, 1),
            _ => {
                return Err(CompileError::new(
                    CompileErrorKind::UnexpectedChar,
                    start,
                    c.to_string(),
                ))
            }
        };
        pos += width;
        tokens.push(Spanned {
            token,
            offset: start,
            text: src[start..offset_at(pos)].to_string(),
        });
    }

    tokens.push(Spanned {
        token: Token::Eof,
        offset: src.len(),
        text: String::new(),
    });
    Ok(tokens)
}
