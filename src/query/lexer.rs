//! Tokenizer for query statements

use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Keyword or property/type name; keywords are matched case-insensitively.
    Word(String),
    Str(String),
    Int(i64),
    Star,
    Comma,
    LParen,
    RParen,
    Eq,
    Ne,
}

impl Token {
    pub fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, Token::Word(w) if w.eq_ignore_ascii_case(keyword))
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | ':' | '.' | '-')
}

pub fn tokenize(input: &str) -> Result<Vec<Token>, ApiError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(pos, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '=' => {
                chars.next();
                tokens.push(Token::Eq);
            }
            '<' => {
                chars.next();
                match chars.next() {
                    Some((_, '>')) => tokens.push(Token::Ne),
                    _ => {
                        return Err(ApiError::InvalidArgument(format!(
                            "Unsupported operator at offset {}",
                            pos
                        )))
                    }
                }
            }
            '\'' => {
                chars.next();
                let mut value = String::new();
                loop {
                    match chars.next() {
                        Some((_, '\'')) => {
                            if let Some(&(_, '\'')) = chars.peek() {
                                chars.next();
                                value.push('\'');
                            } else {
                                break;
                            }
                        }
                        Some((_, c)) => value.push(c),
                        None => {
                            return Err(ApiError::InvalidArgument(format!(
                                "Unterminated string starting at offset {}",
                                pos
                            )))
                        }
                    }
                }
                tokens.push(Token::Str(value));
            }
            c if c.is_ascii_digit() || c == '-' => {
                let mut text = String::new();
                text.push(c);
                chars.next();
                while let Some(&(_, d)) = chars.peek() {
                    if !d.is_ascii_digit() {
                        break;
                    }
                    text.push(d);
                    chars.next();
                }
                let value = text.parse::<i64>().map_err(|_| {
                    ApiError::InvalidArgument(format!("Invalid number {:?} at offset {}", text, pos))
                })?;
                tokens.push(Token::Int(value));
            }
            c if is_word_char(c) => {
                let mut word = String::new();
                while let Some(&(_, w)) = chars.peek() {
                    if !is_word_char(w) {
                        break;
                    }
                    word.push(w);
                    chars.next();
                }
                tokens.push(Token::Word(word));
            }
            other => {
                return Err(ApiError::InvalidArgument(format!(
                    "Unexpected character {:?} at offset {}",
                    other, pos
                )))
            }
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens() {
        let tokens = tokenize("SELECT * FROM cmis:document WHERE a <> 'it''s' AND b = -3").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Word("SELECT".into()),
                Token::Star,
                Token::Word("FROM".into()),
                Token::Word("cmis:document".into()),
                Token::Word("WHERE".into()),
                Token::Word("a".into()),
                Token::Ne,
                Token::Str("it's".into()),
                Token::Word("AND".into()),
                Token::Word("b".into()),
                Token::Eq,
                Token::Int(-3),
            ]
        );
        assert!(tokens[0].is_keyword("select"));
    }

    #[test]
    fn test_errors() {
        assert!(tokenize("a = 'open").is_err());
        assert!(tokenize("a < 3").is_err());
        assert!(tokenize("a = -").is_err());
        assert!(tokenize("a ; b").is_err());
    }
}
