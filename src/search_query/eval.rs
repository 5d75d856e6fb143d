use super::lexer::Token;

/// Evaluate a postfix token sequence against lowercased searchable text.
///
/// Fails open: an empty sequence or an operand stack underflow yields `true`.
pub fn eval(postfix: &[Token], text: &str) -> bool {
    let mut stack: Vec<bool> = Vec::with_capacity(postfix.len());

    for tok in postfix {
        match tok {
            Token::Term(term) => stack.push(term.is_empty() || text.contains(term.as_str())),
            Token::Not => match stack.pop() {
                Some(a) => stack.push(!a),
                None => return true,
            },
            Token::And | Token::Or => {
                let (Some(b), Some(a)) = (stack.pop(), stack.pop()) else {
                    return true;
                };
                stack.push(if *tok == Token::And { a && b } else { a || b });
            }
            // parens never reach postfix output
            Token::LParen | Token::RParen => {}
        }
    }

    stack.last().copied().unwrap_or(true)
}
