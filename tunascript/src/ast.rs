//! Typed syntax tree for `TunaScript` statements.
//!
//! Nodes own their children outright. Flag and function names are stored
//! upper-cased and without the leading `$`.
//!
//! Two renderings are provided: [`fmt::Display`] prints an indented tree that
//! is stable enough for line-by-line comparisons, and [`Node::tunascript`]
//! prints source code that parses back into an equivalent tree.

use std::fmt;

use crate::lexer::{self, TokenClass};
use crate::registry;
use crate::value::Value;

/// A parsed sequence of statements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ast {
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// `quoted` is only ever true for text written as `@...@`.
    Literal { value: Value, quoted: bool },
    Flag(String),
    /// `value` is `None` for `++` and `--`.
    Assignment {
        flag: String,
        op: AssignOp,
        value: Option<Box<Node>>,
    },
    Func { name: String, args: Vec<Node> },
    Group(Box<Node>),
    BinaryOp {
        op: BinaryOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    UnaryOp { op: UnaryOp, operand: Box<Node> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Equal,
    NotEqual,
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Set,
    Increment,
    Decrement,
    IncrementBy,
    DecrementBy,
}

impl BinaryOp {
    /// Operator as written in source.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::LessThan => "<",
            BinaryOp::LessOrEqual => "<=",
            BinaryOp::GreaterThan => ">",
            BinaryOp::GreaterOrEqual => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    /// Apply the operator to two already-evaluated operands.
    pub fn apply(self, left: &Value, right: &Value) -> Value {
        match self {
            BinaryOp::Equal => Value::Bool(left.equal_to(right)),
            BinaryOp::NotEqual => Value::Bool(!left.equal_to(right)),
            BinaryOp::LessThan => Value::Bool(left.less_than(right)),
            BinaryOp::LessOrEqual => Value::Bool(left.less_or_equal(right)),
            BinaryOp::GreaterThan => Value::Bool(left.greater_than(right)),
            BinaryOp::GreaterOrEqual => Value::Bool(left.greater_or_equal(right)),
            BinaryOp::Add => left.add(right),
            BinaryOp::Subtract => left.subtract(right),
            BinaryOp::Multiply => left.multiply(right),
            BinaryOp::Divide => left.divide(right),
            BinaryOp::And => left.and(right),
            BinaryOp::Or => left.or(right),
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BinaryOp::Equal => "EQUALITY",
            BinaryOp::NotEqual => "NON_EQUALITY",
            BinaryOp::LessThan => "LESS_THAN",
            BinaryOp::LessOrEqual => "LESS_THAN_EQUALITY",
            BinaryOp::GreaterThan => "GREATER_THAN",
            BinaryOp::GreaterOrEqual => "GREATER_THAN_EQUALITY",
            BinaryOp::Add => "ADDITION",
            BinaryOp::Subtract => "SUBTRACTION",
            BinaryOp::Multiply => "MULTIPLICATION",
            BinaryOp::Divide => "DIVISION",
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
        })
    }
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Negate => "-",
            UnaryOp::Not => "!",
        }
    }

    pub fn apply(self, operand: &Value) -> Value {
        match self {
            UnaryOp::Negate => operand.negate(),
            UnaryOp::Not => operand.not(),
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnaryOp::Negate => "NEGATION",
            UnaryOp::Not => "NOT",
        })
    }
}

impl AssignOp {
    pub fn symbol(self) -> &'static str {
        match self {
            AssignOp::Set => "=",
            AssignOp::Increment => "++",
            AssignOp::Decrement => "--",
            AssignOp::IncrementBy => "+=",
            AssignOp::DecrementBy => "-=",
        }
    }
}

impl fmt::Display for AssignOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AssignOp::Set => "SET",
            AssignOp::Increment => "INCREMENT_ONE",
            AssignOp::Decrement => "DECREMENT_ONE",
            AssignOp::IncrementBy => "INCREMENT_AMOUNT",
            AssignOp::DecrementBy => "DECREMENT_AMOUNT",
        })
    }
}

impl Node {
    /// An unquoted literal.
    pub fn literal(value: Value) -> Node {
        Node::Literal { value, quoted: false }
    }

    /// Source code that parses back to an equivalent node.
    pub fn tunascript(&self) -> String {
        match self {
            Node::Literal { value, quoted } => match value {
                Value::Text(s) if *quoted || s.is_empty() => value.quoted(),
                Value::Text(_) => escape_ambiguous_text(value.escaped()),
                _ => value.to_string(),
            },
            Node::Flag(name) => format!("${name}"),
            Node::Assignment { flag, op, value: None } => format!("${flag}{}", op.symbol()),
            Node::Assignment {
                flag,
                op,
                value: Some(value),
            } => format!("${flag} {} {}", op.symbol(), value.tunascript()),
            Node::Func { name, args } => {
                let args: Vec<String> = args.iter().map(Node::tunascript).collect();
                format!("${name}({})", args.join(", "))
            },
            Node::Group(inner) => format!("({})", inner.tunascript()),
            Node::BinaryOp { op, left, right } => {
                format!("{} {} {}", left.tunascript(), op.symbol(), right.tunascript())
            },
            Node::UnaryOp { op, operand } => {
                let operand = operand.tunascript();
                // keep `- -x` from turning into `--x`
                if *op == UnaryOp::Negate && operand.starts_with('-') {
                    format!("{} {operand}", op.symbol())
                } else {
                    format!("{}{operand}", op.symbol())
                }
            },
        }
    }

    /// The first assignment or side-effecting call in this subtree, visiting
    /// left to right, depth first.
    pub fn first_side_effect(&self) -> Option<&Node> {
        match self {
            Node::Assignment { .. } => Some(self),
            Node::Func { name, args } => {
                if registry::lookup(name).is_some_and(|sig| sig.side_effects) {
                    Some(self)
                } else {
                    args.iter().find_map(Node::first_side_effect)
                }
            },
            Node::Group(inner) => inner.first_side_effect(),
            Node::BinaryOp { left, right, .. } => left.first_side_effect().or_else(|| right.first_side_effect()),
            Node::UnaryOp { operand, .. } => operand.first_side_effect(),
            Node::Literal { .. } | Node::Flag(_) => None,
        }
    }
}

/// Unquoted text that would re-lex as a number or boolean gets its first
/// character escaped so it stays text.
fn escape_ambiguous_text(escaped: String) -> String {
    let ambiguous = matches!(
        lexer::lex(&escaped).as_deref(),
        Ok([tok]) if matches!(tok.class, TokenClass::Number | TokenClass::Boolean)
    );
    if ambiguous { format!("\\{escaped}") } else { escaped }
}

/// Indent every line after the first by `amount` spaces.
pub(crate) fn indent_continuation(s: &str, amount: usize) -> String {
    let pad = format!("\n{}", " ".repeat(amount));
    s.replace('\n', &pad)
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Literal { value, quoted } => {
                let kind = match value {
                    Value::Int(_) => "NUMBER/INT",
                    Value::Float(_) => "NUMBER/FLOAT",
                    Value::Bool(_) => "BINARY/BOOL",
                    Value::Text(_) if *quoted => "TEXT/@STRING",
                    Value::Text(_) => "TEXT/STRING",
                };
                if value.is_text() {
                    write!(f, "[LITERAL {kind} \"{value}\"]")
                } else {
                    write!(f, "[LITERAL {kind} {value}]")
                }
            },
            Node::Flag(name) => write!(f, "[FLAG ${name}]"),
            Node::Func { name, args } if args.is_empty() => write!(f, "[FUNC ${name}]"),
            Node::Func { name, args } => {
                writeln!(f, "[FUNC ${name}")?;
                for arg in args {
                    writeln!(f, " A: {}", indent_continuation(&arg.to_string(), 4))?;
                }
                f.write_str("]")
            },
            Node::Group(inner) => {
                write!(f, "[GROUP\n E: {}\n]", indent_continuation(&inner.to_string(), 4))
            },
            Node::BinaryOp { op, left, right } => write!(
                f,
                "[BINARY_OP {op}\n L: {}\n R: {}\n]",
                indent_continuation(&left.to_string(), 4),
                indent_continuation(&right.to_string(), 4)
            ),
            Node::UnaryOp { op, operand } => write!(
                f,
                "[UNARY_OP {op}\n O: {}\n]",
                indent_continuation(&operand.to_string(), 4)
            ),
            Node::Assignment { flag, op, value: None } => write!(f, "[ASSIGNMENT {op} ${flag}]"),
            Node::Assignment {
                flag,
                op,
                value: Some(value),
            } => write!(
                f,
                "[ASSIGNMENT {op} ${flag}\n V: {}\n]",
                indent_continuation(&value.to_string(), 4)
            ),
        }
    }
}

impl Ast {
    /// Source code for every statement, one per line.
    pub fn tunascript(&self) -> String {
        let lines: Vec<String> = self.nodes.iter().map(Node::tunascript).collect();
        lines.join("\n")
    }

    /// The first assignment or side-effecting call in any statement.
    pub fn first_side_effect(&self) -> Option<&Node> {
        self.nodes.iter().find_map(Node::first_side_effect)
    }
}

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AST")?;
        for node in &self.nodes {
            write!(f, "\n S: {}", indent_continuation(&node.to_string(), 4))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse;

    fn text(s: &str) -> Node {
        Node::literal(Value::Text(s.to_string()))
    }

    #[test]
    fn tree_rendering() {
        let ast = parse("$X = $ADD(2, @two@)").expect("parse ok");
        let expected = "AST
 S: [ASSIGNMENT SET $X
     V: [FUNC $ADD
         A: [LITERAL NUMBER/INT 2]
         A: [LITERAL TEXT/@STRING \"two\"]
        ]
    ]";
        assert_eq!(ast.to_string(), expected);
    }

    #[test]
    fn binary_tree_rendering() {
        let ast = parse("!($A || 1.5)").expect("parse ok");
        let expected = "AST
 S: [UNARY_OP NOT
     O: [GROUP
         E: [BINARY_OP OR
             L: [FLAG $A]
             R: [LITERAL NUMBER/FLOAT 1.5]
            ]
        ]
    ]";
        assert_eq!(ast.to_string(), expected);
    }

    #[test]
    fn unparse_reparses_to_same_tree() {
        for src in [
            "$X = 5",
            "$COUNT++",
            "$COUNT -= $STEP * 2",
            "$OUTPUT(@Hello, world@)",
            "!($A && $B) || $C != off",
            "- -3",
            "$MOVE(player, kitchen)",
            "-(2 + 3) / 4.25",
        ] {
            let ast = parse(src).expect("parse ok");
            let reparsed = parse(&ast.tunascript()).expect("reparse ok");
            assert_eq!(ast, reparsed, "round trip of {src:?} via {:?}", ast.tunascript());
        }
    }

    #[test]
    fn text_that_looks_like_other_literals_is_escaped() {
        assert_eq!(text("42").tunascript(), "\\42");
        assert_eq!(text("yes").tunascript(), "\\yes");
        assert_eq!(text("yes sir").tunascript(), "yes sir");
        assert_eq!(text("").tunascript(), "@@");
        assert_eq!(text("a, b").tunascript(), "a\\, b");
    }

    #[test]
    fn side_effects_are_found_depth_first() {
        let ast = parse("$FLAG_IS($X, 1) && $NOT($ENABLE(LIGHT))").expect("parse ok");
        let Some(Node::Func { name, .. }) = ast.first_side_effect() else {
            panic!("expected a side-effecting call");
        };
        assert_eq!(name, "ENABLE");

        let ast = parse("$X > 3 && $IN_INVEN(lamp)").expect("parse ok");
        assert!(ast.first_side_effect().is_none());

        let ast = parse("($X += 1)").expect("parse ok");
        assert!(matches!(ast.first_side_effect(), Some(Node::Assignment { .. })));
    }
}
