use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Lowercased search term. An empty term matches everything.
    Term(String),
    And,
    Or,
    Not,
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Term(term) => write!(f, "{term:?}"),
            Token::And => write!(f, "AND"),
            Token::Or => write!(f, "OR"),
            Token::Not => write!(f, "NOT"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
        }
    }
}

/// Split a raw query into tokens and insert the implicit `AND`s.
///
/// Never fails: an unterminated quote runs to the end of input.
pub fn tokenize(input: &str) -> Vec<Token> {
    let chars: Vec<char> = input.chars().collect();
    let len = chars.len();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < len {
        match chars[i] {
            c if c.is_whitespace() => {
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '"' => {
                let phrase = read_quoted(&chars, &mut i);
                tokens.push(Token::Term(phrase.to_lowercase()));
            }
            _ => {
                let word = read_word(&chars, &mut i);
                tokens.push(keyword_or_term(word));
            }
        }
    }

    insert_implicit_and(tokens)
}

fn keyword_or_term(word: String) -> Token {
    if word.eq_ignore_ascii_case("and") {
        Token::And
    } else if word.eq_ignore_ascii_case("or") {
        Token::Or
    } else if word.eq_ignore_ascii_case("not") {
        Token::Not
    } else {
        Token::Term(word.to_lowercase())
    }
}

fn read_quoted(chars: &[char], i: &mut usize) -> String {
    *i += 1; // opening quote
    let mut s = String::new();
    while *i < chars.len() {
        if chars[*i] == '"' {
            *i += 1;
            return s;
        }
        s.push(chars[*i]);
        *i += 1;
    }
    s
}

fn read_word(chars: &[char], i: &mut usize) -> String {
    let mut word = String::new();
    while *i < chars.len() {
        match chars[*i] {
            c if c.is_whitespace() => break,
            '(' | ')' => break,
            c => {
                word.push(c);
                *i += 1;
            }
        }
    }
    word
}

/// `foo bar` → `foo AND bar`, `foo (bar)` → `foo AND (bar)`,
/// `foo NOT bar` → `foo AND NOT bar`.
fn insert_implicit_and(tokens: Vec<Token>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len() * 2);
    for tok in tokens {
        let left_closes = matches!(out.last(), Some(Token::Term(_) | Token::RParen));
        let right_opens = matches!(tok, Token::Term(_) | Token::LParen | Token::Not);
        if left_closes && right_opens {
            out.push(Token::And);
        }
        out.push(tok);
    }
    out
}
