use super::ExprError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Ident(String),
    True,
    False,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    LParen,
    RParen,
    Gt,
    Ge,
    Lt,
    Le,
    EqEq,
    NotEq,
    AndAnd,
    OrOr,
    Bang,
}

/// A token together with the byte offset it starts at.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub offset: usize,
}

/// Split an expression into tokens.
///
/// Identifiers are always lexed whole, so a rule named `sum` can never match
/// inside `summary` or `sum_total`.
pub fn tokenize(source: &str) -> Result<Vec<Spanned>, ExprError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let c = bytes[pos];

        if c.is_ascii_whitespace() {
            pos += 1;
            continue;
        }

        let start = pos;

        if c.is_ascii_digit() || (c == b'.' && bytes.get(pos + 1).is_some_and(u8::is_ascii_digit)) {
            let (value, end) = lex_number(source, pos)?;
            tokens.push(Spanned {
                token: Token::Number(value),
                offset: start,
            });
            pos = end;
            continue;
        }

        if c.is_ascii_alphabetic() || c == b'_' {
            while pos < bytes.len() && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'_') {
                pos += 1;
            }
            let word = &source[start..pos];
            let token = match word {
                "true" => Token::True,
                "false" => Token::False,
                _ => Token::Ident(word.to_string()),
            };
            tokens.push(Spanned {
                token,
                offset: start,
            });
            continue;
        }

        let next = bytes.get(pos + 1).copied();
        let (token, width) = match (c, next) {
            (b'=', Some(b'=')) => {
                // `===` is accepted as plain equality
                if bytes.get(pos + 2) == Some(&b'=') {
                    (Token::EqEq, 3)
                } else {
                    (Token::EqEq, 2)
                }
            }
            (b'!', Some(b'=')) => {
                if bytes.get(pos + 2) == Some(&b'=') {
                    (Token::NotEq, 3)
                } else {
                    (Token::NotEq, 2)
                }
            }
            (b'>', Some(b'=')) => (Token::Ge, 2),
            (b'<', Some(b'=')) => (Token::Le, 2),
            (b'&', Some(b'&')) => (Token::AndAnd, 2),
            (b'|', Some(b'|')) => (Token::OrOr, 2),
            (b'>', _) => (Token::Gt, 1),
            (b'<', _) => (Token::Lt, 1),
            (b'!', _) => (Token::Bang, 1),
            (b'+', _) => (Token::Plus, 1),
            (b'-', _) => (Token::Minus, 1),
            (b'*', _) => (Token::Star, 1),
            (b'/', _) => (Token::Slash, 1),
            (b'%', _) => (Token::Percent, 1),
            (b'(', _) => (Token::LParen, 1),
            (b')', _) => (Token::RParen, 1),
            _ => {
                let found = source[start..].chars().next().unwrap_or('?');
                return Err(ExprError::UnexpectedCharacter {
                    found,
                    offset: start,
                });
            }
        };

        tokens.push(Spanned {
            token,
            offset: start,
        });
        pos += width;
    }

    Ok(tokens)
}

fn lex_number(source: &str, start: usize) -> Result<(f64, usize), ExprError> {
    let bytes = source.as_bytes();
    let mut pos = start;

    while pos < bytes.len() && (bytes[pos].is_ascii_digit() || bytes[pos] == b'.') {
        pos += 1;
    }

    // Optional exponent: only consumed when digits follow
    if pos < bytes.len() && (bytes[pos] == b'e' || bytes[pos] == b'E') {
        let mut probe = pos + 1;
        if probe < bytes.len() && (bytes[probe] == b'+' || bytes[probe] == b'-') {
            probe += 1;
        }
        if probe < bytes.len() && bytes[probe].is_ascii_digit() {
            pos = probe;
            while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                pos += 1;
            }
        }
    }

    let text = &source[start..pos];
    text.parse::<f64>()
        .map(|value| (value, pos))
        .map_err(|_| ExprError::InvalidNumber {
            text: text.to_string(),
            offset: start,
        })
}

/// Identifier names in source order, without parsing.
///
/// Used as a fallback for dependency discovery when an expression lexes but
/// does not parse.
pub fn identifier_tokens(source: &str) -> Result<Vec<String>, ExprError> {
    Ok(tokenize(source)?
        .into_iter()
        .filter_map(|spanned| match spanned.token {
            Token::Ident(name) => Some(name),
            _ => None,
        })
        .collect())
}
