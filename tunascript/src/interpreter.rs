//! Evaluation of `TunaScript` and expansion templates.
//!
//! An [`Interpreter`] owns the flag store and a [`World`]. Parsing never
//! touches either; executing an [`Ast`] walks it strictly left to right,
//! evaluating every operand (`&&` and `||` included) before combining them.

use std::collections::HashMap;
use std::io::Read;

use log::{debug, info};

use crate::ast::{AssignOp, Ast, Node};
use crate::error::TsError;
use crate::expansion::{self, Template};
use crate::syntax;
use crate::value::Value;
use crate::world::World;

mod builtins;

pub struct Interpreter<W: World> {
    world: W,
    flags: HashMap<String, Value>,
    initial_flags: HashMap<String, Value>,
    last_result: Value,
    file: Option<String>,
}

impl<W: World> Interpreter<W> {
    /// An interpreter with no flags set.
    pub fn new(world: W) -> Self {
        Interpreter {
            world,
            flags: HashMap::new(),
            initial_flags: HashMap::new(),
            last_result: Value::default(),
            file: None,
        }
    }

    /// An interpreter whose flags start (and reset) to `flags`.
    pub fn with_flags(world: W, flags: HashMap<String, Value>) -> Self {
        let mut interp = Self::new(world);
        interp.set_initial_flags(flags);
        interp.init();
        interp
    }

    /// Replace the snapshot that [`init`](Self::init) restores. Current flags
    /// are untouched until the next `init`.
    pub fn set_initial_flags(&mut self, flags: HashMap<String, Value>) {
        self.initial_flags = flags.into_iter().map(|(k, v)| (k.to_uppercase(), v)).collect();
    }

    /// Reset flags to the initial snapshot and forget the last result. The
    /// file name is kept.
    pub fn init(&mut self) {
        self.flags.clone_from(&self.initial_flags);
        self.last_result = Value::default();
        info!("interpreter reset with {} initial flag(s)", self.flags.len());
    }

    /// Name of the source being worked on, prefixed to parse errors.
    pub fn set_file(&mut self, file: Option<impl Into<String>>) {
        self.file = file.map(Into::into);
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub fn into_world(self) -> W {
        self.world
    }

    /// Value of the most recent non-empty statement sequence.
    pub fn last_result(&self) -> &Value {
        &self.last_result
    }

    /// # Errors
    /// See [`syntax::parse`]; errors carry the file name if one is set.
    pub fn parse(&self, source: &str) -> Result<Ast, TsError> {
        syntax::parse(source).map_err(|e| e.in_file(self.file()))
    }

    /// # Errors
    /// See [`syntax::parse_reader`]; errors carry the file name if one is set.
    pub fn parse_reader(&self, reader: impl Read) -> Result<Ast, TsError> {
        syntax::parse_reader(reader).map_err(|e| e.in_file(self.file()))
    }

    /// Parse and run `source`, returning the value of its last statement.
    ///
    /// # Errors
    /// Returns the parse error; nothing runs if the source does not parse.
    pub fn eval(&mut self, source: &str) -> Result<Value, TsError> {
        let ast = self.parse(source)?;
        Ok(self.exec(&ast))
    }

    /// # Errors
    /// Returns read and parse errors; nothing runs if either occurs.
    pub fn eval_reader(&mut self, reader: impl Read) -> Result<Value, TsError> {
        let ast = self.parse_reader(reader)?;
        Ok(self.exec(&ast))
    }

    /// Run every statement in order and return the last one's value.
    ///
    /// An empty `ast` returns the zero value and leaves
    /// [`last_result`](Self::last_result) alone.
    pub fn exec(&mut self, ast: &Ast) -> Value {
        let mut result = Value::default();
        for node in &ast.nodes {
            result = self.eval_node(node);
            self.last_result = result.clone();
        }
        debug!("executed {} statement(s) -> {result:?}", ast.nodes.len());
        result
    }

    fn eval_node(&mut self, node: &Node) -> Value {
        match node {
            Node::Literal { value, .. } => value.clone(),
            Node::Flag(name) => self.flags.get(name).cloned().unwrap_or_default(),
            Node::Group(inner) => self.eval_node(inner),
            Node::BinaryOp { op, left, right } => {
                let left = self.eval_node(left);
                let right = self.eval_node(right);
                op.apply(&left, &right)
            },
            Node::UnaryOp { op, operand } => {
                let operand = self.eval_node(operand);
                op.apply(&operand)
            },
            Node::Assignment { flag, op, value } => self.assign(flag, *op, value.as_deref()),
            Node::Func { name, args } => {
                let args: Vec<Value> = args.iter().map(|arg| self.eval_node(arg)).collect();
                builtins::call(self, name, &args)
            },
        }
    }

    fn assign(&mut self, flag: &str, op: AssignOp, value: Option<&Node>) -> Value {
        let amount = value.map(|node| self.eval_node(node));
        let current = self.flags.get(flag).cloned().unwrap_or_default();
        let one = Value::Int(1);
        let new = match op {
            AssignOp::Set => amount.unwrap_or_default(),
            AssignOp::Increment => current.add(&one),
            AssignOp::Decrement => current.subtract(&one),
            AssignOp::IncrementBy => current.add(&amount.unwrap_or_default()),
            AssignOp::DecrementBy => current.subtract(&amount.unwrap_or_default()),
        };
        self.flags.insert(flag.to_string(), new.clone());
        new
    }

    /// Parse a template, checking every condition up front.
    ///
    /// # Errors
    /// See [`expansion::parse_template`]; errors carry the file name if one
    /// is set.
    pub fn parse_template(&self, source: &str) -> Result<Template, TsError> {
        expansion::parse_template(source).map_err(|e| e.in_file(self.file()))
    }

    /// # Errors
    /// Returns read errors, otherwise as [`parse_template`](Self::parse_template).
    pub fn parse_template_reader(&self, mut reader: impl Read) -> Result<Template, TsError> {
        let mut source = String::new();
        reader
            .read_to_string(&mut source)
            .map_err(|e| TsError::from(e).in_file(self.file()))?;
        self.parse_template(&source)
    }

    /// Expand a parsed template against the current flags.
    ///
    /// # Errors
    /// Only templates from [`expansion::parse`] can fail here, when a raw
    /// condition turns out not to parse or to have side effects.
    pub fn exec_template(&mut self, tmpl: &Template) -> Result<String, TsError> {
        expansion::render(self, &tmpl.blocks).map_err(|e| e.in_file(self.file.as_deref()))
    }

    /// Parse and expand a template in one step.
    ///
    /// # Errors
    /// As [`parse_template`](Self::parse_template).
    pub fn expand(&mut self, source: &str) -> Result<String, TsError> {
        let tmpl = self.parse_template(source)?;
        self.exec_template(&tmpl)
    }

    /// # Errors
    /// As [`parse_template_reader`](Self::parse_template_reader).
    pub fn expand_reader(&mut self, reader: impl Read) -> Result<String, TsError> {
        let tmpl = self.parse_template_reader(reader)?;
        self.exec_template(&tmpl)
    }

    /// Set a flag from free text, inferring its type.
    ///
    /// # Errors
    /// Returns [`TsError::FlagLabel`] unless the upper-cased label is made of
    /// `A-Z`, `0-9` and `_` only.
    pub fn add_flag(&mut self, label: &str, text: &str) -> Result<(), TsError> {
        let label = checked_label(label)?;
        self.flags.insert(label, Value::parse_loose(text));
        Ok(())
    }

    /// Set a flag to `value` directly.
    pub fn set_flag(&mut self, label: &str, value: impl Into<Value>) {
        self.flags.insert(label.to_uppercase(), value.into());
    }

    /// Names of all set flags, sorted.
    pub fn list_flags(&self) -> Vec<String> {
        let mut names: Vec<String> = self.flags.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn get_flag(&self, label: &str) -> Option<&Value> {
        self.flags.get(&label.to_uppercase())
    }

    /// String form of a flag, or `""` if it is unset.
    pub fn flag_text(&self, label: &str) -> String {
        self.get_flag(label).map(Value::cast_to_string).unwrap_or_default()
    }

    pub fn flags(&self) -> &HashMap<String, Value> {
        &self.flags
    }
}

/// Upper-case `label` and check it against `[A-Z0-9_]+`.
pub(crate) fn checked_label(label: &str) -> Result<String, TsError> {
    let upper = label.to_uppercase();
    let valid = !upper.is_empty() && upper.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
    if valid { Ok(upper) } else { Err(TsError::FlagLabel(upper)) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::MemoryWorld;

    fn interp() -> Interpreter<MemoryWorld> {
        Interpreter::new(MemoryWorld::new())
    }

    #[test]
    fn assignment_sets_and_returns() {
        let mut ts = interp();
        assert_eq!(ts.eval("$X = 5").expect("eval ok"), Value::Int(5));
        assert_eq!(ts.get_flag("x"), Some(&Value::Int(5)));
    }

    #[test]
    fn increments_start_from_zero() {
        let mut ts = interp();
        assert_eq!(ts.eval("$X++").expect("eval ok"), Value::Int(1));
        assert_eq!(ts.eval("$Y--").expect("eval ok"), Value::Int(-1));
        assert_eq!(ts.eval("$X += 2").expect("eval ok"), Value::Int(3));
        assert_eq!(ts.eval("$Z -= 2.5").expect("eval ok"), Value::Float(-2.5));
    }

    #[test]
    fn last_statement_wins() {
        let mut ts = interp();
        assert_eq!(ts.eval("$A = 1 $B = $A + 1 $B * 10").expect("eval ok"), Value::Int(20));
        assert_eq!(ts.last_result(), &Value::Int(20));
    }

    #[test]
    fn empty_ast_leaves_last_result() {
        let mut ts = interp();
        ts.eval("7").expect("eval ok");
        assert_eq!(ts.exec(&Ast::default()), Value::Int(0));
        assert_eq!(ts.last_result(), &Value::Int(7));
    }

    #[test]
    fn unset_flags_read_as_zero() {
        let mut ts = interp();
        assert_eq!(ts.eval("$NOPE").expect("eval ok"), Value::Int(0));
        assert_eq!(ts.flag_text("NOPE"), "");
        assert!(ts.list_flags().is_empty());
    }

    #[test]
    fn init_restores_the_snapshot() {
        let mut ts = Interpreter::with_flags(MemoryWorld::new(), HashMap::from([("lamp_lit".to_string(), Value::Bool(true))]));
        ts.eval("$LAMP_LIT = off $EXTRA = 1").expect("eval ok");
        ts.init();
        assert_eq!(ts.list_flags(), vec!["LAMP_LIT"]);
        assert_eq!(ts.flag_text("lamp_lit"), "ON");
        assert_eq!(ts.last_result(), &Value::Int(0));
    }

    #[test]
    fn add_flag_validates_labels() {
        let mut ts = interp();
        ts.add_flag("door_open", "yes").expect("valid label");
        ts.add_flag("COUNT", "12").expect("valid label");
        assert_eq!(ts.get_flag("DOOR_OPEN"), Some(&Value::Bool(true)));
        assert_eq!(ts.get_flag("count"), Some(&Value::Int(12)));
        assert!(matches!(ts.add_flag("bad-label", "1"), Err(TsError::FlagLabel(l)) if l == "BAD-LABEL"));
        assert!(ts.add_flag("", "1").is_err());
        assert_eq!(ts.list_flags(), vec!["COUNT", "DOOR_OPEN"]);
    }

    #[test]
    fn file_name_prefixes_parse_errors() {
        let mut ts = interp();
        ts.set_file(Some("intro.tuna"));
        let err = ts.eval("$X = (").expect_err("syntax error");
        assert!(err.to_string().starts_with("intro.tuna: syntax error"), "{err}");
    }

    #[test]
    fn expand_uses_current_flags() {
        let mut ts = interp();
        ts.set_flag("name", "Ada");
        assert_eq!(ts.expand("Hello, $NAME!").expect("expand ok"), "Hello, Ada!");
    }

    #[test]
    fn evaluation_runs_left_to_right() {
        let mut ts = interp();
        let v = ts.eval("($X = 2) * ($X = $X + 3)").expect("eval ok");
        assert_eq!(v, Value::Int(10));
    }
}
