//! Tokenizer for restriction expressions.
//!
//! A single anchored regex is applied at the current offset, like the command
//! splitter this crate grew out of. Whitespace between tokens is skipped.

use super::error::{ExpressionError, Result};
use lazy_static::lazy_static;
use regex::Regex;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Str(String),
    True,
    False,
    Null,
    And,
    Or,
    Not,
    In,
    /// Raw model path text, e.g. `settings:common.debug.value?`.
    Path(String),
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    LParen,
    RParen,
}

impl Token {
    pub fn describe(&self) -> String {
        match self {
            Token::Number(n) => format!("number {n}"),
            Token::Str(s) => format!("string '{s}'"),
            Token::Path(p) => format!("path '{p}'"),
            other => format!("'{}'", other.symbol()),
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Token::True => "true",
            Token::False => "false",
            Token::Null => "null",
            Token::And => "and",
            Token::Or => "or",
            Token::Not => "not",
            Token::In => "in",
            Token::Eq => "==",
            Token::Ne => "!=",
            Token::Lt => "<",
            Token::Le => "<=",
            Token::Gt => ">",
            Token::Ge => ">=",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::Number(_) | Token::Str(_) | Token::Path(_) => "",
        }
    }
}

/// A token and the byte offset it starts at.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub position: usize,
}

lazy_static! {
    static ref TOKEN_RE: Regex = Regex::new(
        r#"^(?:(?P<num>[0-9]+(?:\.[0-9]+)?)|'(?P<sq>[^']*)'|"(?P<dq>[^"]*)"|(?P<path>(?:\w+:)?\w[\w.\-]*\??)|(?P<op>==|!=|<=|>=|&&|\|\||[<>+\-*/%!()]))"#
    )
    .expect("Invalid token regex");
}

/// Split `source` into tokens.
pub fn tokenize(source: &str) -> Result<Vec<Spanned>> {
    let mut tokens = Vec::new();
    let mut position = 0;

    loop {
        let rest = &source[position..];
        let trimmed = rest.trim_start();
        position += rest.len() - trimmed.len();
        if trimmed.is_empty() {
            break;
        }

        let caps = TOKEN_RE.captures(trimmed).ok_or_else(|| {
            let first = trimmed.chars().next().unwrap_or_default();
            if first == '\'' || first == '"' {
                ExpressionError::syntax(position, "unterminated string")
            } else {
                ExpressionError::syntax(position, format!("unexpected character '{first}'"))
            }
        })?;

        let token = if let Some(num) = caps.name("num") {
            let n = num.as_str().parse::<f64>().map_err(|e| {
                ExpressionError::syntax(position, format!("bad number {}: {e}", num.as_str()))
            })?;
            Token::Number(n)
        } else if let Some(s) = caps.name("sq").or_else(|| caps.name("dq")) {
            Token::Str(s.as_str().to_string())
        } else if let Some(path) = caps.name("path") {
            keyword(path.as_str()).unwrap_or_else(|| Token::Path(path.as_str().to_string()))
        } else if let Some(op) = caps.name("op") {
            operator(op.as_str())
                .ok_or_else(|| ExpressionError::syntax(position, "unknown operator"))?
        } else {
            return Err(ExpressionError::syntax(position, "unrecognised token"));
        };

        tokens.push(Spanned { token, position });
        position += caps.get(0).map(|m| m.len()).unwrap_or(0);
    }

    log::trace!("tokenize({source}) -> {} tokens", tokens.len());
    Ok(tokens)
}

fn keyword(word: &str) -> Option<Token> {
    match word {
        "true" => Some(Token::True),
        "false" => Some(Token::False),
        "null" => Some(Token::Null),
        "and" => Some(Token::And),
        "or" => Some(Token::Or),
        "not" => Some(Token::Not),
        "in" => Some(Token::In),
        _ => None,
    }
}

fn operator(op: &str) -> Option<Token> {
    let token = match op {
        "==" => Token::Eq,
        "!=" => Token::Ne,
        "<=" => Token::Le,
        ">=" => Token::Ge,
        "<" => Token::Lt,
        ">" => Token::Gt,
        "&&" => Token::And,
        "||" => Token::Or,
        "!" => Token::Not,
        "+" => Token::Plus,
        "-" => Token::Minus,
        "*" => Token::Star,
        "/" => Token::Slash,
        "%" => Token::Percent,
        "(" => Token::LParen,
        ")" => Token::RParen,
        _ => return None,
    };
    Some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    #[test]
    fn test_tokenize_comparison() {
        assert_eq!(
            kinds("settings:foo.value != 'bar'"),
            vec![
                Token::Path("settings:foo.value".to_string()),
                Token::Ne,
                Token::Str("bar".to_string()),
            ]
        );
    }

    #[test]
    fn test_tokenize_keywords_and_symbols() {
        assert_eq!(
            kinds("not (a and b) || !c && true"),
            vec![
                Token::Not,
                Token::LParen,
                Token::Path("a".to_string()),
                Token::And,
                Token::Path("b".to_string()),
                Token::RParen,
                Token::Or,
                Token::Not,
                Token::Path("c".to_string()),
                Token::And,
                Token::True,
            ]
        );
    }

    #[test]
    fn test_tokenize_numbers_and_arithmetic() {
        assert_eq!(
            kinds("1.5*2 - x%3"),
            vec![
                Token::Number(1.5),
                Token::Star,
                Token::Number(2.0),
                Token::Minus,
                Token::Path("x".to_string()),
                Token::Percent,
                Token::Number(3.0),
            ]
        );
    }

    #[test]
    fn test_tokenize_dashed_and_optional_path() {
        assert_eq!(
            kinds("cluster:net-provider? == \"neutron\""),
            vec![
                Token::Path("cluster:net-provider?".to_string()),
                Token::Eq,
                Token::Str("neutron".to_string()),
            ]
        );
    }

    #[test]
    fn test_positions() {
        let tokens = tokenize("  a ==  1").unwrap();
        let positions: Vec<usize> = tokens.iter().map(|t| t.position).collect();
        assert_eq!(positions, vec![2, 4, 8]);
    }

    #[test]
    fn test_tokenize_errors() {
        assert_eq!(
            tokenize("a == 'open"),
            Err(ExpressionError::syntax(5, "unterminated string"))
        );
        assert_eq!(
            tokenize("a = 1"),
            Err(ExpressionError::syntax(2, "unexpected character '='"))
        );
        assert_eq!(tokenize("   ").unwrap(), vec![]);
    }
}
