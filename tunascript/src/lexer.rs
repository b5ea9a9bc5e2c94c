//! Flat token view of `TunaScript` source.
//!
//! The parser works on the grammar directly; this module exposes the same
//! token rules as a positioned stream for diagnostics, tooling and the
//! nesting guard.

use std::fmt;

use pest::Parser;

use crate::error::TsError;
use crate::syntax::{Rule, TunaParser, describe_rule};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenClass {
    Set,
    Equal,
    NotEqual,
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
    Plus,
    Minus,
    Star,
    Slash,
    IncrementBy,
    DecrementBy,
    Increment,
    Decrement,
    Not,
    And,
    Or,
    Comma,
    LeftParen,
    RightParen,
    Identifier,
    Boolean,
    Number,
    QuotedText,
    Text,
}

impl TokenClass {
    fn from_rule(rule: Rule) -> Option<Self> {
        let class = match rule {
            Rule::op_set => TokenClass::Set,
            Rule::op_eq => TokenClass::Equal,
            Rule::op_ne => TokenClass::NotEqual,
            Rule::op_lt => TokenClass::LessThan,
            Rule::op_le => TokenClass::LessOrEqual,
            Rule::op_gt => TokenClass::GreaterThan,
            Rule::op_ge => TokenClass::GreaterOrEqual,
            Rule::op_plus => TokenClass::Plus,
            Rule::op_minus => TokenClass::Minus,
            Rule::op_mul => TokenClass::Star,
            Rule::op_div => TokenClass::Slash,
            Rule::op_inc_by => TokenClass::IncrementBy,
            Rule::op_dec_by => TokenClass::DecrementBy,
            Rule::op_incr => TokenClass::Increment,
            Rule::op_decr => TokenClass::Decrement,
            Rule::op_not => TokenClass::Not,
            Rule::op_and => TokenClass::And,
            Rule::op_or => TokenClass::Or,
            Rule::comma => TokenClass::Comma,
            Rule::lparen => TokenClass::LeftParen,
            Rule::rparen => TokenClass::RightParen,
            Rule::id => TokenClass::Identifier,
            Rule::boolean => TokenClass::Boolean,
            Rule::num => TokenClass::Number,
            Rule::quoted => TokenClass::QuotedText,
            Rule::text => TokenClass::Text,
            _ => return None,
        };
        Some(class)
    }

    /// True for tokens after which a `-` or `!` must be a prefix operator.
    pub fn expects_operand(self) -> bool {
        !matches!(
            self,
            TokenClass::RightParen
                | TokenClass::Identifier
                | TokenClass::Boolean
                | TokenClass::Number
                | TokenClass::QuotedText
                | TokenClass::Text
                | TokenClass::Increment
                | TokenClass::Decrement
        )
    }

    /// `=`, `+=` or `-=`.
    pub fn assigns(self) -> bool {
        matches!(self, TokenClass::Set | TokenClass::IncrementBy | TokenClass::DecrementBy)
    }
}

impl fmt::Display for TokenClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenClass::Identifier => "identifier",
            TokenClass::Boolean => "bool",
            TokenClass::Number => "num",
            TokenClass::QuotedText => "@str",
            TokenClass::Text => "str",
            TokenClass::Comma => "comma",
            TokenClass::LeftParen => "lparen",
            TokenClass::RightParen => "rparen",
            _ => "op",
        };
        f.write_str(name)
    }
}

/// A lexeme with its class and 1-based source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub class: TokenClass,
    pub lexeme: String,
    pub line: usize,
    pub col: usize,
}

/// Split `source` into tokens, discarding whitespace.
///
/// # Errors
/// Returns a syntax error at the first character that starts no valid token,
/// such as an unterminated `@` quote or a lone `&`.
pub fn lex(source: &str) -> Result<Vec<Token>, TsError> {
    let mut pairs = TunaParser::parse(Rule::tokens, source).map_err(|e| TsError::from_pest(&e, describe_rule))?;
    let Some(stream) = pairs.next() else {
        return Ok(Vec::new());
    };
    let tokens = stream
        .into_inner()
        .filter_map(|pair| {
            let class = TokenClass::from_rule(pair.as_rule())?;
            let (line, col) = pair.line_col();
            Some(Token {
                class,
                lexeme: pair.as_str().to_string(),
                line,
                col,
            })
        })
        .collect();
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classes(src: &str) -> Vec<TokenClass> {
        lex(src).expect("lex ok").into_iter().map(|t| t.class).collect()
    }

    #[test]
    fn longest_operator_wins() {
        use TokenClass::*;
        assert_eq!(classes("$X += 2"), vec![Identifier, IncrementBy, Number]);
        assert_eq!(classes("$X++"), vec![Identifier, Increment]);
        assert_eq!(classes("1 <= 2 < 3"), vec![Number, LessOrEqual, Number, LessThan, Number]);
        assert_eq!(classes("!$A != $B == $C"), vec![Not, Identifier, NotEqual, Identifier, Equal, Identifier]);
        assert_eq!(classes("$A = -1"), vec![Identifier, Set, Minus, Number]);
    }

    #[test]
    fn unquoted_text_keeps_inner_spaces() {
        let toks = lex("$OUTPUT(the old  lamp , 3)").expect("lex ok");
        let texts: Vec<&str> = toks.iter().map(|t| t.lexeme.as_str()).collect();
        assert_eq!(texts, vec!["$OUTPUT", "(", "the old  lamp", ",", "3", ")"]);
    }

    #[test]
    fn numbers_and_booleans_yield_to_longer_text() {
        use TokenClass::*;
        assert_eq!(classes("5"), vec![Number]);
        assert_eq!(classes("5 apples"), vec![Text]);
        assert_eq!(classes("1.5.3"), vec![Text]);
        assert_eq!(classes("ON"), vec![Boolean]);
        assert_eq!(classes("online"), vec![Text]);
        assert_eq!(classes("no way"), vec![Text]);
        assert_eq!(classes("2e5 + yes"), vec![Number, Plus, Boolean]);
    }

    #[test]
    fn quoted_text_and_escapes() {
        use TokenClass::*;
        assert_eq!(classes("@a + b@"), vec![QuotedText]);
        assert_eq!(classes("a\\+b"), vec![Text]);
        assert_eq!(classes("\\5"), vec![Text]);
    }

    #[test]
    fn positions_are_one_based() {
        let toks = lex("$A\n  + 2").expect("lex ok");
        assert_eq!((toks[1].line, toks[1].col), (2, 3));
        assert_eq!((toks[2].line, toks[2].col), (2, 5));
    }

    #[test]
    fn stray_characters_are_errors() {
        assert!(lex("@unterminated").is_err());
        assert!(lex("$A & $B").is_err());
    }
}
