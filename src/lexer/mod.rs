//! # Lexer
//!
//! Tokenizes source text into the flat token stream the parser consumes
//! (§4.2). Lexing is fatal on the first error: no partial token stream is
//! ever handed to the parser (§7).
//!
//! ## Recognition order
//!
//! 1. Whitespace and `//` line comments (discarded).
//! 2. Reserved words, checked before the general identifier rule.
//! 3. Forbidden reserved words borrowed from a superset language — these
//!    are rejected with a named, fatal error rather than silently lexed as
//!    identifiers.
//! 4. Identifiers.
//! 5. Numeric literals, hex before decimal (a single lookahead, not two
//!    separate regex passes — see the Open Questions in the original spec).
//! 6. String literals with a small escape set.
//! 7. Symbols, multi-character operators before single characters.
//!
//! Anything left over is an invalid token.

pub mod cursor;
pub mod token;


use crate::error::LexError;
use cursor::Cursor;
use token::{Token, TokenKind, FORBIDDEN_KEYWORDS, KEYWORDS};

/// Tokenize `source`, stopping at the first lexical error (§7).
pub fn lex(source: &str) -> Result<Vec<Token>, LexError> {
    log::debug!("lex: {} bytes of source", source.len());
    let mut cursor = Cursor::new(source);
    let mut tokens = Vec::new();

    while let Some(token) = lex_token(&mut cursor)? {
        tokens.push(token);
    }

    let eof_line = cursor.line();
    tokens.push(Token {
        kind: TokenKind::Eof,
        text: String::new(),
        line: eof_line,
    });

    log::debug!("lex: produced {} tokens", tokens.len());
    Ok(tokens)
}

fn lex_token(cursor: &mut Cursor) -> Result<Option<Token>, LexError> {
    skip_whitespace_and_comments(cursor);

    if cursor.is_at_end() {
        return Ok(None);
    }

    let line = cursor.line();
    let ch = cursor.peek().unwrap();

    if ch == '"' {
        return lex_string(cursor, line).map(Some);
    }
    if ch.is_ascii_digit() {
        return Ok(Some(lex_number(cursor, line)));
    }
    if ch.is_ascii_alphabetic() || ch == '_' {
        return lex_word(cursor, line).map(Some);
    }
    if let Some(tok) = lex_symbol(cursor, line) {
        return Ok(Some(tok));
    }

    let snippet: String = std::iter::once(ch).collect();
    cursor.advance();
    Err(LexError::invalid_token(line, snippet))
}

fn skip_whitespace_and_comments(cursor: &mut Cursor) {
    loop {
        match cursor.peek() {
            Some(c) if c.is_whitespace() => {
                cursor.advance();
            }
            Some('/') if cursor.peek_at(1) == Some('/') => {
                while !matches!(cursor.peek(), None | Some('\n')) {
                    cursor.advance();
                }
            }
            _ => return,
        }
    }
}

fn lex_word(cursor: &mut Cursor, line: usize) -> Result<Token, LexError> {
    let mut text = String::new();
    while let Some(c) = cursor.peek() {
        if c.is_ascii_alphanumeric() || c == '_' {
            text.push(c);
            cursor.advance();
        } else {
            break;
        }
    }

    if FORBIDDEN_KEYWORDS.contains(&text.as_str()) {
        return Err(LexError::reserved_word(line, &text));
    }

    let kind = if KEYWORDS.contains(&text.as_str()) {
        TokenKind::Keyword
    } else {
        TokenKind::Id
    };

    Ok(Token { kind, text, line })
}

/// Hex has priority over decimal; the lookahead for `0x`/`0X` happens once,
/// not as a second independent regex pass over the same prefix.
fn lex_number(cursor: &mut Cursor, line: usize) -> Token {
    if cursor.peek() == Some('0') && matches!(cursor.peek_at(1), Some('x') | Some('X')) {
        let mut text = String::from("0x");
        cursor.advance();
        cursor.advance();
        let mut digits = String::new();
        while let Some(c) = cursor.peek() {
            if c.is_ascii_hexdigit() {
                digits.push(c);
                text.push(c);
                cursor.advance();
            } else {
                break;
            }
        }
        let value = i64::from_str_radix(&digits, 16).unwrap_or(0);
        return Token {
            kind: TokenKind::HexLit(value),
            text,
            line,
        };
    }

    let mut text = String::new();
    while let Some(c) = cursor.peek() {
        if c.is_ascii_digit() {
            text.push(c);
            cursor.advance();
        } else {
            break;
        }
    }
    let value: i64 = text.parse().unwrap_or(0);
    Token {
        kind: TokenKind::DecimalLit(value),
        text,
        line,
    }
}

fn lex_string(cursor: &mut Cursor, line: usize) -> Result<Token, LexError> {
    cursor.advance(); // opening quote
    let mut raw = String::from("\"");
    let mut processed = String::new();

    loop {
        match cursor.peek() {
            None | Some('\n') => {
                return Err(LexError::invalid_token(line, format!("\"{raw}")));
            }
            Some('"') => {
                cursor.advance();
                raw.push('"');
                break;
            }
            Some('\\') => {
                raw.push('\\');
                cursor.advance();
                match cursor.peek() {
                    Some(esc @ ('\\' | '"' | 'n' | 't')) => {
                        raw.push(esc);
                        cursor.advance();
                        processed.push(match esc {
                            '\\' => '\\',
                            '"' => '"',
                            'n' => '\n',
                            't' => '\t',
                            _ => unreachable!(),
                        });
                    }
                    Some(other) => {
                        return Err(LexError::invalid_token(
                            line,
                            format!("unknown escape sequence \\{other}"),
                        ));
                    }
                    None => {
                        return Err(LexError::invalid_token(line, format!("\"{raw}")));
                    }
                }
            }
            Some(c) => {
                raw.push(c);
                processed.push(c);
                cursor.advance();
            }
        }
    }

    Ok(Token {
        kind: TokenKind::StringLit(processed),
        text: raw,
        line,
    })
}

const MULTI_CHAR_SYMBOLS: &[&str] = &["==", "!=", "<=", ">=", "&&", "||"];
const SINGLE_CHAR_SYMBOLS: &[char] = &[
    '[', ']', '(', ')', '{', '}', ';', '=', ',', '+', '*', '-', '/', '%', '<', '>', '!',
];

fn lex_symbol(cursor: &mut Cursor, line: usize) -> Option<Token> {
    let first = cursor.peek()?;
    let second = cursor.peek_at(1);

    if let Some(second) = second {
        let two: String = [first, second].iter().collect();
        if MULTI_CHAR_SYMBOLS.contains(&two.as_str()) {
            cursor.advance();
            cursor.advance();
            return Some(Token {
                kind: TokenKind::Symbol,
                text: two,
                line,
            });
        }
    }

    if SINGLE_CHAR_SYMBOLS.contains(&first) {
        cursor.advance();
        return Some(Token {
            kind: TokenKind::Symbol,
            text: first.to_string(),
            line,
        });
    }

    None
}
