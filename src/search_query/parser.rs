use super::lexer::Token;

impl Token {
    fn precedence(&self) -> u8 {
        match self {
            Token::Not => 3,
            Token::And => 2,
            Token::Or => 1,
            _ => 0,
        }
    }

    fn is_left_assoc(&self) -> bool {
        !matches!(self, Token::Not)
    }
}

/// Reorder infix tokens into postfix (shunting-yard).
///
/// Malformed input never fails here: an unmatched `)` is ignored and a
/// stray `(` left on the stack is dropped.
pub fn to_postfix(tokens: Vec<Token>) -> Vec<Token> {
    let mut output: Vec<Token> = Vec::with_capacity(tokens.len());
    let mut ops: Vec<Token> = Vec::new();

    for tok in tokens {
        match tok {
            Token::Term(_) => output.push(tok),
            Token::LParen => ops.push(tok),
            Token::RParen => {
                while let Some(top) = ops.pop() {
                    if top == Token::LParen {
                        break;
                    }
                    output.push(top);
                }
            }
            Token::And | Token::Or | Token::Not => {
                while let Some(top) = ops.last() {
                    if *top == Token::LParen {
                        break;
                    }
                    let (p_top, p_cur) = (top.precedence(), tok.precedence());
                    if p_top > p_cur || (p_top == p_cur && tok.is_left_assoc()) {
                        if let Some(top) = ops.pop() {
                            output.push(top);
                        }
                    } else {
                        break;
                    }
                }
                ops.push(tok);
            }
        }
    }

    while let Some(top) = ops.pop() {
        if top != Token::LParen {
            output.push(top);
        }
    }

    output
}
