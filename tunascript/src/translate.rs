//! Rewriting operator syntax as built-in calls.
//!
//! `$X += $Y * 2` becomes `$INC(X, $MULT($Y, 2))`. The result evaluates to
//! the same values and has the same effects as the input.

use crate::ast::{AssignOp, BinaryOp, Node, UnaryOp};
use crate::error::TsError;
use crate::syntax;
use crate::value::Value;

/// Parse `source` and print it back using only built-in calls.
///
/// # Errors
/// Returns the parse error if `source` is not valid `TunaScript`.
pub fn translate_operators(source: &str) -> Result<String, TsError> {
    let ast = syntax::parse(source)?;
    let lines: Vec<String> = ast.nodes.iter().map(|n| to_builtin_calls(n).tunascript()).collect();
    Ok(lines.join("\n"))
}

fn call(name: &str, args: Vec<Node>) -> Node {
    Node::Func {
        name: name.to_string(),
        args,
    }
}

/// The operator-free equivalent of `node`. Groups are kept so the output
/// reads like the input.
pub fn to_builtin_calls(node: &Node) -> Node {
    match node {
        Node::Literal { .. } | Node::Flag(_) => node.clone(),
        Node::Group(inner) => Node::Group(Box::new(to_builtin_calls(inner))),
        Node::Func { name, args } => call(name, args.iter().map(to_builtin_calls).collect()),
        Node::UnaryOp { op, operand } => {
            let name = match op {
                UnaryOp::Negate => "NEG",
                UnaryOp::Not => "NOT",
            };
            call(name, vec![to_builtin_calls(operand)])
        },
        Node::BinaryOp { op, left, right } => {
            let args = vec![to_builtin_calls(left), to_builtin_calls(right)];
            let (name, negated) = match op {
                BinaryOp::Add => ("ADD", false),
                BinaryOp::Subtract => ("SUB", false),
                BinaryOp::Multiply => ("MULT", false),
                BinaryOp::Divide => ("DIV", false),
                BinaryOp::And => ("AND", false),
                BinaryOp::Or => ("OR", false),
                BinaryOp::Equal => ("FLAG_IS", false),
                BinaryOp::NotEqual => ("FLAG_IS", true),
                BinaryOp::LessThan => ("FLAG_LESS_THAN", false),
                BinaryOp::GreaterOrEqual => ("FLAG_LESS_THAN", true),
                BinaryOp::GreaterThan => ("FLAG_GREATER_THAN", false),
                BinaryOp::LessOrEqual => ("FLAG_GREATER_THAN", true),
            };
            let inner = call(name, args);
            if negated { call("NOT", vec![inner]) } else { inner }
        },
        Node::Assignment { flag, op, value } => {
            let mut args = vec![Node::literal(Value::Text(flag.clone()))];
            args.extend(value.as_deref().map(to_builtin_calls));
            let name = match op {
                AssignOp::Set => "SET",
                AssignOp::Increment | AssignOp::IncrementBy => "INC",
                AssignOp::Decrement | AssignOp::DecrementBy => "DEC",
            };
            call(name, args)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::Interpreter;
    use crate::world::MemoryWorld;

    #[test]
    fn operators_become_calls() {
        assert_eq!(translate_operators("1 + 2 * 3").expect("ok"), "$ADD(1, $MULT(2, 3))");
        assert_eq!(translate_operators("$X += $Y").expect("ok"), "$INC(X, $Y)");
        assert_eq!(translate_operators("$X--").expect("ok"), "$DEC(X)");
        assert_eq!(translate_operators("-(1 - 2)").expect("ok"), "$NEG(($SUB(1, 2)))");
        assert_eq!(translate_operators("$A != 1").expect("ok"), "$NOT($FLAG_IS($A, 1))");
        assert_eq!(translate_operators("$A <= 1").expect("ok"), "$NOT($FLAG_GREATER_THAN($A, 1))");
        assert_eq!(translate_operators("$OUTPUT(!$B)").expect("ok"), "$OUTPUT($NOT($B))");
    }

    #[test]
    fn statements_stay_on_their_own_lines() {
        let out = translate_operators("$A = 1\n$B = $A >= 2").expect("ok");
        assert_eq!(out, "$SET(A, 1)\n$SET(B, $NOT($FLAG_LESS_THAN($A, 2)))");
    }

    #[test]
    fn translation_preserves_results() {
        let src = "$G = 4 $H = 2.5 $G * $H - 1 > 8 || !($G == 4) && $G != $H";
        let translated = translate_operators(src).expect("ok");

        let mut plain = Interpreter::new(MemoryWorld::new());
        let mut calls = Interpreter::new(MemoryWorld::new());
        assert_eq!(
            plain.eval(src).expect("eval ok"),
            calls.eval(&translated).expect("eval ok")
        );
        assert_eq!(plain.flags(), calls.flags());
    }
}
