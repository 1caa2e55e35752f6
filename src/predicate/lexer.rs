//! Predicate lexer. Tokenizes a predicate string.

use crate::{Error, Result};

/// A token from the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub text: String,
}

/// Source span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// Token kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Connectors
    And, Or, Not,

    // Literals
    True, False, Integer, Float, StringLiteral,

    Identifier,

    // Punctuation
    LParen, RParen, Dot,

    // Comparison operators
    Eq, Neq, Lt, Lte, Gt, Gte,

    Eof,
}

impl TokenKind {
    pub fn is_comparison(self) -> bool {
        matches!(self, TokenKind::Eq | TokenKind::Neq | TokenKind::Lt | TokenKind::Lte | TokenKind::Gt | TokenKind::Gte)
    }
}

/// Tokenize a predicate string.
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(pos, ch)) = chars.peek() {
        match ch {
            c if c.is_whitespace() => { chars.next(); }

            // String literals
            '\'' | '"' => {
                let quote = ch;
                chars.next();
                let start = pos;
                let mut s = String::new();
                loop {
                    match chars.next() {
                        Some((_, '\\')) => {
                            if let Some((_, escaped)) = chars.next() {
                                match escaped {
                                    'n' => s.push('\n'),
                                    't' => s.push('\t'),
                                    '\\' => s.push('\\'),
                                    c if c == quote => s.push(c),
                                    c => { s.push('\\'); s.push(c); }
                                }
                            }
                        }
                        Some((end, c)) if c == quote => {
                            tokens.push(Token {
                                kind: TokenKind::StringLiteral,
                                span: Span { start, end: end + 1 },
                                text: s,
                            });
                            break;
                        }
                        Some((_, c)) => s.push(c),
                        None => return Err(Error::SyntaxError {
                            position: start,
                            message: "Unterminated string literal".into(),
                        }),
                    }
                }
            }

            // Numbers, optionally signed
            c if c.is_ascii_digit() || (c == '-' && next_is_digit(&chars)) => {
                let start = pos;
                let mut num = String::new();
                num.push(c);
                chars.next();
                let mut is_float = false;
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_ascii_digit() {
                        num.push(c);
                        chars.next();
                    } else if c == '.' && !is_float && next_is_digit(&chars) {
                        is_float = true;
                        num.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token {
                    kind: if is_float { TokenKind::Float } else { TokenKind::Integer },
                    span: Span { start, end: start + num.len() },
                    text: num,
                });
            }

            // Identifiers and keywords
            c if c.is_alphabetic() || c == '_' => {
                let start = pos;
                let mut ident = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' {
                        ident.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let kind = keyword_or_ident(&ident);
                tokens.push(Token {
                    kind,
                    span: Span { start, end: start + ident.len() },
                    text: ident,
                });
            }

            '(' => { chars.next(); tokens.push(punct(TokenKind::LParen, pos, "(")); }
            ')' => { chars.next(); tokens.push(punct(TokenKind::RParen, pos, ")")); }
            '.' => { chars.next(); tokens.push(punct(TokenKind::Dot, pos, ".")); }
            '=' => {
                chars.next();
                if matches!(chars.peek(), Some(&(_, '='))) {
                    chars.next();
                    tokens.push(punct(TokenKind::Eq, pos, "=="));
                } else {
                    tokens.push(punct(TokenKind::Eq, pos, "="));
                }
            }
            '!' => {
                chars.next();
                if matches!(chars.peek(), Some(&(_, '='))) {
                    chars.next();
                    tokens.push(punct(TokenKind::Neq, pos, "!="));
                } else {
                    tokens.push(punct(TokenKind::Not, pos, "!"));
                }
            }
            '<' => {
                chars.next();
                if matches!(chars.peek(), Some(&(_, '='))) {
                    chars.next();
                    tokens.push(punct(TokenKind::Lte, pos, "<="));
                } else if matches!(chars.peek(), Some(&(_, '>'))) {
                    chars.next();
                    tokens.push(punct(TokenKind::Neq, pos, "<>"));
                } else {
                    tokens.push(punct(TokenKind::Lt, pos, "<"));
                }
            }
            '>' => {
                chars.next();
                if matches!(chars.peek(), Some(&(_, '='))) {
                    chars.next();
                    tokens.push(punct(TokenKind::Gte, pos, ">="));
                } else {
                    tokens.push(punct(TokenKind::Gt, pos, ">"));
                }
            }
            '&' | '|' => {
                chars.next();
                if matches!(chars.peek(), Some(&(_, c)) if c == ch) {
                    chars.next();
                    let (kind, text) = if ch == '&' { (TokenKind::And, "&&") } else { (TokenKind::Or, "||") };
                    tokens.push(punct(kind, pos, text));
                } else {
                    return Err(Error::SyntaxError {
                        position: pos,
                        message: format!("Unexpected character: '{ch}'"),
                    });
                }
            }

            other => {
                return Err(Error::SyntaxError {
                    position: pos,
                    message: format!("Unexpected character: '{other}'"),
                });
            }
        }
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        span: Span { start: input.len(), end: input.len() },
        text: String::new(),
    });

    Ok(tokens)
}

fn next_is_digit(chars: &std::iter::Peekable<std::str::CharIndices<'_>>) -> bool {
    matches!(chars.clone().nth(1), Some((_, c)) if c.is_ascii_digit())
}

fn punct(kind: TokenKind, pos: usize, text: &str) -> Token {
    Token {
        kind,
        span: Span { start: pos, end: pos + text.len() },
        text: text.to_string(),
    }
}

fn keyword_or_ident(s: &str) -> TokenKind {
    match s.to_uppercase().as_str() {
        "AND" => TokenKind::And,
        "OR" => TokenKind::Or,
        "NOT" => TokenKind::Not,
        "TRUE" => TokenKind::True,
        "FALSE" => TokenKind::False,
        _ => TokenKind::Identifier,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).unwrap().iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_simple_comparison() {
        assert_eq!(kinds("distance_to.target < 5"), vec![
            TokenKind::Identifier,
            TokenKind::Dot,
            TokenKind::Identifier,
            TokenKind::Lt,
            TokenKind::Integer,
            TokenKind::Eof,
        ]);
    }

    #[test]
    fn test_connectors_and_aliases() {
        assert_eq!(kinds("a.b = 1 and not c.d != 2 || e.f <> x"), vec![
            TokenKind::Identifier, TokenKind::Dot, TokenKind::Identifier, TokenKind::Eq, TokenKind::Integer,
            TokenKind::And, TokenKind::Not,
            TokenKind::Identifier, TokenKind::Dot, TokenKind::Identifier, TokenKind::Neq, TokenKind::Integer,
            TokenKind::Or,
            TokenKind::Identifier, TokenKind::Dot, TokenKind::Identifier, TokenKind::Neq, TokenKind::Identifier,
            TokenKind::Eof,
        ]);
    }

    #[test]
    fn test_numbers() {
        let tokens = tokenize("-2.5 10").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Float);
        assert_eq!(tokens[0].text, "-2.5");
        assert_eq!(tokens[1].kind, TokenKind::Integer);
        assert_eq!(tokens[1].span, Span { start: 5, end: 7 });
    }

    #[test]
    fn test_string_literal() {
        let tokens = tokenize("'open road'").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::StringLiteral);
        assert_eq!(tokens[0].text, "open road");
    }

    #[test]
    fn test_unterminated_string() {
        assert!(tokenize("kind = 'road").is_err());
    }

    #[test]
    fn test_unexpected_character() {
        match tokenize("speed.value # 3") {
            Err(Error::SyntaxError { position, .. }) => assert_eq!(position, 12),
            other => panic!("expected syntax error, got {other:?}"),
        }
    }
}
