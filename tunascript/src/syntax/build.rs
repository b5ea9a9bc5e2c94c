use pest::iterators::Pair;

use super::{MAX_DEPTH, Rule};

use super::helpers::{boolean, number, unescape, unquote};
use crate::ast::{AssignOp, BinaryOp, Node, UnaryOp};
use crate::error::TsError;
use crate::registry;
use crate::value::Value;

fn construct(pair: &Pair<Rule>, message: impl Into<String>) -> TsError {
    let (line, col) = pair.line_col();
    TsError::Construct {
        line,
        col,
        message: message.into(),
    }
}

fn shape(pair: &Pair<Rule>, what: &str) -> TsError {
    construct(pair, format!("unexpected grammar shape: {what}"))
}

fn next_pair<'a>(it: &mut impl Iterator<Item = Pair<'a, Rule>>, parent: &Pair<'a, Rule>, what: &str) -> Result<Pair<'a, Rule>, TsError> {
    it.next().ok_or_else(|| shape(parent, what))
}

/// Depth of a child of a node at `depth`, or an error at `pair` once the
/// built tree would grow past [`MAX_DEPTH`].
fn nested(pair: &Pair<Rule>, depth: usize) -> Result<usize, TsError> {
    if depth >= MAX_DEPTH {
        let (line, col) = pair.line_col();
        return Err(TsError::TooDeep {
            line,
            col,
            limit: MAX_DEPTH,
        });
    }
    Ok(depth + 1)
}

/// `$NAME` -> `NAME`
fn ident_name(pair: &Pair<Rule>) -> String {
    pair.as_str().trim_start_matches('$').to_uppercase()
}

/// Build a statement whose root node sits `depth` levels down the tree.
pub(super) fn expr(pair: Pair<Rule>, depth: usize) -> Result<Node, TsError> {
    let outer = pair.clone();
    let inner = next_pair(&mut pair.into_inner(), &outer, "empty expression")?;
    match inner.as_rule() {
        Rule::assign => assign(inner, depth),
        Rule::bool_op => binary_chain(inner, depth),
        _ => Err(shape(&inner, "expected assignment or operator chain")),
    }
}

fn assign(pair: Pair<Rule>, depth: usize) -> Result<Node, TsError> {
    let outer = pair.clone();
    let mut it = pair.into_inner();
    let flag = ident_name(&next_pair(&mut it, &outer, "assignment target")?);
    let op_pair = next_pair(&mut it, &outer, "assignment operator")?;
    let op = match op_pair.as_rule() {
        Rule::op_set => AssignOp::Set,
        Rule::op_inc_by => AssignOp::IncrementBy,
        Rule::op_dec_by => AssignOp::DecrementBy,
        _ => return Err(shape(&op_pair, "unknown assignment operator")),
    };
    let value = expr(next_pair(&mut it, &outer, "assigned value")?, nested(&op_pair, depth)?)?;
    Ok(Node::Assignment {
        flag,
        op,
        value: Some(Box::new(value)),
    })
}

fn binary_op(pair: &Pair<Rule>) -> Result<BinaryOp, TsError> {
    let op = match pair.as_rule() {
        Rule::op_or => BinaryOp::Or,
        Rule::op_and => BinaryOp::And,
        Rule::op_eq => BinaryOp::Equal,
        Rule::op_ne => BinaryOp::NotEqual,
        Rule::op_lt => BinaryOp::LessThan,
        Rule::op_le => BinaryOp::LessOrEqual,
        Rule::op_gt => BinaryOp::GreaterThan,
        Rule::op_ge => BinaryOp::GreaterOrEqual,
        Rule::op_plus => BinaryOp::Add,
        Rule::op_minus => BinaryOp::Subtract,
        Rule::op_mul => BinaryOp::Multiply,
        Rule::op_div => BinaryOp::Divide,
        _ => return Err(shape(pair, "unknown binary operator")),
    };
    Ok(op)
}

/// Fold `operand (op operand)*` levels left-associatively, descending through
/// the precedence rules until reaching a negation.
///
/// A chain of `n` operators puts its leftmost operand `n` levels below the
/// chain's root, so long flat chains count against [`MAX_DEPTH`] too.
fn binary_chain(pair: Pair<Rule>, depth: usize) -> Result<Node, TsError> {
    if pair.as_rule() == Rule::negation {
        return negation(pair, depth);
    }
    let outer = pair.clone();
    let parts: Vec<Pair<Rule>> = pair.into_inner().collect();
    let ops = parts.len() / 2;
    if ops == 0 {
        return binary_chain(next_pair(&mut parts.into_iter(), &outer, "left operand")?, depth);
    }
    if depth + ops > MAX_DEPTH {
        let over = parts.get(2 * MAX_DEPTH.saturating_sub(depth) + 1).unwrap_or(&outer);
        let (line, col) = over.line_col();
        return Err(TsError::TooDeep {
            line,
            col,
            limit: MAX_DEPTH,
        });
    }

    let mut it = parts.into_iter();
    let mut left = binary_chain(next_pair(&mut it, &outer, "left operand")?, depth + ops)?;
    let mut level = depth + ops;
    while let Some(op_pair) = it.next() {
        let op = binary_op(&op_pair)?;
        let right = binary_chain(next_pair(&mut it, &outer, "right operand")?, level)?;
        level -= 1;
        left = Node::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        };
    }
    Ok(left)
}

fn negation(pair: Pair<Rule>, depth: usize) -> Result<Node, TsError> {
    let outer = pair.clone();
    let mut it = pair.into_inner();
    let first = next_pair(&mut it, &outer, "negation operand")?;
    let op = match first.as_rule() {
        Rule::op_not => UnaryOp::Not,
        Rule::op_minus => UnaryOp::Negate,
        _ => return term(first, depth),
    };
    let operand = negation(next_pair(&mut it, &outer, "prefix operand")?, nested(&first, depth)?)?;
    Ok(Node::UnaryOp {
        op,
        operand: Box::new(operand),
    })
}

fn term(pair: Pair<Rule>, depth: usize) -> Result<Node, TsError> {
    match pair.as_rule() {
        Rule::group => group(pair, depth),
        Rule::call => call(pair, depth),
        Rule::incr | Rule::decr => postfix(pair),
        Rule::id => Ok(Node::Flag(ident_name(&pair))),
        Rule::num => number(pair.as_str()).map(Node::literal).map_err(|m| construct(&pair, m)),
        Rule::boolean => boolean(pair.as_str())
            .map(|b| Node::literal(Value::Bool(b)))
            .map_err(|m| construct(&pair, m)),
        Rule::quoted => Ok(Node::Literal {
            value: Value::Text(unquote(pair.as_str())),
            quoted: true,
        }),
        Rule::text => Ok(Node::literal(Value::Text(unescape(pair.as_str())))),
        _ => Err(shape(&pair, "expected a value")),
    }
}

fn group(pair: Pair<Rule>, depth: usize) -> Result<Node, TsError> {
    let outer = pair.clone();
    let inner = pair
        .into_inner()
        .find(|p| p.as_rule() == Rule::expr)
        .ok_or_else(|| shape(&outer, "empty group"))?;
    let depth = nested(&outer, depth)?;
    Ok(Node::Group(Box::new(expr(inner, depth)?)))
}

fn call(pair: Pair<Rule>, depth: usize) -> Result<Node, TsError> {
    let outer = pair.clone();
    let mut it = pair.into_inner();
    let id = next_pair(&mut it, &outer, "function name")?;
    let name = ident_name(&id);
    let arg_list = next_pair(&mut it, &outer, "argument list")?;

    let arg_depth = nested(&arg_list, depth)?;
    let mut args = Vec::new();
    for arg in arg_list.into_inner() {
        if arg.as_rule() == Rule::expr {
            args.push(expr(arg, arg_depth)?);
        }
    }

    let sig = registry::lookup(&name).ok_or_else(|| construct(&id, format!("${name}() is not a defined function")))?;
    sig.check_arity(args.len()).map_err(|m| construct(&id, m))?;
    Ok(Node::Func { name, args })
}

fn postfix(pair: Pair<Rule>) -> Result<Node, TsError> {
    let op = if pair.as_rule() == Rule::incr {
        AssignOp::Increment
    } else {
        AssignOp::Decrement
    };
    let outer = pair.clone();
    let id = next_pair(&mut pair.into_inner(), &outer, "postfix target")?;
    Ok(Node::Assignment {
        flag: ident_name(&id),
        op,
        value: None,
    })
}
