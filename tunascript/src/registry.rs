//! Built-in function signatures.
//!
//! The table is fixed at compile time. Calls are checked against it while the
//! AST is built, so an [`Ast`](crate::ast::Ast) produced by the parser never
//! names an unknown function or passes the wrong number of arguments.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Native implementation a signature dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Add,
    Sub,
    Mult,
    Div,
    Neg,
    Or,
    And,
    Not,
    FlagEnabled,
    FlagDisabled,
    FlagIs,
    FlagLessThan,
    FlagGreaterThan,
    Enable,
    Disable,
    Toggle,
    Inc,
    Dec,
    Set,
    InInven,
    Move,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub name: &'static str,
    pub required_args: usize,
    pub optional_args: usize,
    /// Whether calling the function changes flags or the world.
    pub side_effects: bool,
    pub builtin: Builtin,
}

const fn sig(name: &'static str, required_args: usize, optional_args: usize, side_effects: bool, builtin: Builtin) -> Signature {
    Signature {
        name,
        required_args,
        optional_args,
        side_effects,
        builtin,
    }
}

pub static BUILTINS: &[Signature] = &[
    sig("ADD", 2, 0, false, Builtin::Add),
    sig("SUB", 2, 0, false, Builtin::Sub),
    sig("MULT", 2, 0, false, Builtin::Mult),
    sig("DIV", 2, 0, false, Builtin::Div),
    sig("NEG", 1, 0, false, Builtin::Neg),
    sig("OR", 2, 0, false, Builtin::Or),
    sig("AND", 2, 0, false, Builtin::And),
    sig("NOT", 1, 0, false, Builtin::Not),
    sig("FLAG_ENABLED", 1, 0, false, Builtin::FlagEnabled),
    sig("FLAG_DISABLED", 1, 0, false, Builtin::FlagDisabled),
    sig("FLAG_IS", 2, 0, false, Builtin::FlagIs),
    sig("FLAG_LESS_THAN", 2, 0, false, Builtin::FlagLessThan),
    sig("FLAG_GREATER_THAN", 2, 0, false, Builtin::FlagGreaterThan),
    sig("ENABLE", 1, 0, true, Builtin::Enable),
    sig("DISABLE", 1, 0, true, Builtin::Disable),
    sig("TOGGLE", 1, 0, true, Builtin::Toggle),
    sig("INC", 1, 1, true, Builtin::Inc),
    sig("DEC", 1, 1, true, Builtin::Dec),
    sig("SET", 2, 0, true, Builtin::Set),
    sig("IN_INVEN", 1, 0, false, Builtin::InInven),
    sig("MOVE", 2, 0, true, Builtin::Move),
    sig("OUTPUT", 1, 0, true, Builtin::Output),
];

static BY_NAME: LazyLock<HashMap<&'static str, &'static Signature>> =
    LazyLock::new(|| BUILTINS.iter().map(|s| (s.name, s)).collect());

/// Find a built-in by name, ignoring case and an optional leading `$`.
pub fn lookup(name: &str) -> Option<&'static Signature> {
    let name = name.strip_prefix('$').unwrap_or(name);
    BY_NAME.get(name.to_uppercase().as_str()).copied()
}

impl Signature {
    pub fn max_args(&self) -> usize {
        self.required_args + self.optional_args
    }

    pub fn accepts(&self, count: usize) -> bool {
        (self.required_args..=self.max_args()).contains(&count)
    }

    /// Check an argument count, describing the accepted range on failure.
    ///
    /// # Errors
    /// Returns a message such as `"$ADD() requires exactly 2 arguments"`.
    pub fn check_arity(&self, count: usize) -> Result<(), String> {
        if self.accepts(count) {
            return Ok(());
        }
        let expected = match (self.required_args, self.max_args()) {
            (0, 0) => "takes no arguments".to_string(),
            (1, 1) => "requires exactly 1 argument".to_string(),
            (n, m) if n == m => format!("requires exactly {n} arguments"),
            (n, m) => format!("requires between {n} and {m} arguments"),
        };
        Err(format!("${}() {expected}, but {count} given", self.name))
    }
}
