//! Parser and AST builders for `TunaScript`.
//!
//! Wraps the Pest-generated grammar with a nesting guard and the builder
//! functions that turn parse-tree pairs into [`Ast`] nodes.

use std::io::Read;

use log::debug;
use pest::Parser;
use pest_derive::Parser as PestParser;

use crate::ast::Ast;
use crate::error::TsError;
use crate::lexer::{self, TokenClass};

mod build;
mod helpers;

pub(crate) use helpers::unescape;

/// Maximum depth of groups, prefix operators and chained assignments accepted
/// by [`parse`].
pub const MAX_NESTING: usize = 64;

/// Maximum depth of a built statement tree, counting every operator level.
pub const MAX_DEPTH: usize = 256;

#[derive(PestParser)]
#[grammar = "src/syntax/tunascript.pest"]
pub(crate) struct TunaParser;

/// Parse a full `TunaScript` statement sequence.
///
/// # Errors
/// Returns a positioned error if the source does not lex or parse, nests too
/// deeply, or calls a function that does not exist or with the wrong number
/// of arguments.
pub fn parse(source: &str) -> Result<Ast, TsError> {
    check_nesting(source)?;
    let mut pairs = TunaParser::parse(Rule::script, source).map_err(|e| TsError::from_pest(&e, describe_rule))?;
    let Some(script) = pairs.next() else {
        return Ok(Ast::default());
    };
    let mut nodes = Vec::new();
    for pair in script.into_inner() {
        if pair.as_rule() == Rule::expr {
            nodes.push(build::expr(pair, 1)?);
        }
    }
    debug!("parsed {} TunaScript statement(s)", nodes.len());
    Ok(Ast { nodes })
}

/// Like [`parse`], but blank source is an empty [`Ast`] rather than an error.
/// Template directives such as `$[[IF]]` hold blank conditions.
pub(crate) fn parse_condition(source: &str) -> Result<Ast, TsError> {
    if source.trim().is_empty() {
        return Ok(Ast::default());
    }
    parse(source)
}

/// Read all of `reader` and parse it as `TunaScript`.
///
/// # Errors
/// Returns [`TsError::Io`] if reading fails, otherwise as [`parse`].
pub fn parse_reader(mut reader: impl Read) -> Result<Ast, TsError> {
    let mut source = String::new();
    reader.read_to_string(&mut source)?;
    parse(&source)
}

/// Reject inputs whose groups, prefix operators or chained assignments nest
/// past [`MAX_NESTING`] before handing them to the recursive grammar.
fn check_nesting(source: &str) -> Result<(), TsError> {
    let tokens = lexer::lex(source)?;
    // prefix-operator runs waiting on each open group
    let mut suspended: Vec<usize> = Vec::new();
    let mut suspended_total = 0usize;
    let mut prefix_run = 0usize;
    // `$A = $B = ...` nests one level per link
    let mut assign_run = 0usize;
    let mut prev: Option<TokenClass> = None;
    let mut before_prev: Option<TokenClass> = None;

    for tok in &tokens {
        match tok.class {
            TokenClass::Not | TokenClass::Minus if prev.is_none_or(TokenClass::expects_operand) => {
                prefix_run += 1;
            },
            TokenClass::LeftParen => {
                suspended.push(prefix_run);
                suspended_total += prefix_run;
                prefix_run = 0;
            },
            TokenClass::RightParen => {
                prefix_run = 0;
                if let Some(run) = suspended.pop() {
                    suspended_total -= run;
                }
            },
            TokenClass::Set | TokenClass::IncrementBy | TokenClass::DecrementBy => {
                prefix_run = 0;
                let chained = prev == Some(TokenClass::Identifier) && before_prev.is_some_and(TokenClass::assigns);
                assign_run = if chained { assign_run + 1 } else { 1 };
            },
            _ => prefix_run = 0,
        }
        let depth = suspended.len() + suspended_total + prefix_run;
        if depth > MAX_NESTING || assign_run > MAX_NESTING {
            return Err(TsError::TooDeep {
                line: tok.line,
                col: tok.col,
                limit: MAX_NESTING,
            });
        }
        before_prev = prev;
        prev = Some(tok.class);
    }
    Ok(())
}

/// Human-readable names for grammar rules in syntax errors.
pub(crate) fn describe_rule(rule: &Rule) -> &'static str {
    match rule {
        Rule::EOI => "end of input",
        Rule::expr | Rule::assign | Rule::bool_op | Rule::equality | Rule::comparison => "expression",
        Rule::sum | Rule::product | Rule::negation => "expression",
        Rule::group | Rule::lparen => "`(`",
        Rule::rparen => "`)`",
        Rule::comma => "`,`",
        Rule::call | Rule::arg_list => "function call",
        Rule::id | Rule::incr | Rule::decr => "flag or function name",
        Rule::num => "number",
        Rule::boolean => "boolean",
        Rule::quoted => "@-quoted text",
        Rule::text => "text",
        Rule::op_inc_by => "`+=`",
        Rule::op_dec_by => "`-=`",
        Rule::op_incr => "`++`",
        Rule::op_decr => "`--`",
        Rule::op_le => "`<=`",
        Rule::op_ge => "`>=`",
        Rule::op_ne => "`!=`",
        Rule::op_eq => "`==`",
        Rule::op_and => "`&&`",
        Rule::op_or => "`||`",
        Rule::op_lt => "`<`",
        Rule::op_gt => "`>`",
        Rule::op_set => "`=`",
        Rule::op_plus => "`+`",
        Rule::op_minus => "`-`",
        Rule::op_mul => "`*`",
        Rule::op_div => "`/`",
        Rule::op_not => "`!`",
        _ => "token",
    }
}
