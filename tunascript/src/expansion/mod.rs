//! Expansion templates.
//!
//! A template is prose with `$FLAG` references and `$[[IF cond]]` branches.
//! Conditions are `TunaScript`. [`parse`] keeps them as raw text to be parsed
//! when first evaluated, while [`parse_template`] parses all of them up front
//! and rejects any that could change state.

use std::fmt;

use log::debug;

use crate::ast::{Ast, Node, indent_continuation};
use crate::error::TsError;
use crate::interpreter::Interpreter;
use crate::syntax;
use crate::world::World;

mod parser;

/// Column at which text blocks wrap in tree dumps.
const DUMP_WIDTH: usize = 60;

/// A parsed template: blocks in the order they expand.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Template {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Text(TextBlock),
    /// Upper-cased flag name without the `$`.
    Flag(String),
    Branch(Branch),
}

/// Literal text, with escapes already decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock {
    pub text: String,
    /// The text starts with a space.
    pub left_trim: bool,
    /// The text ends with a space.
    pub right_trim: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub if_block: CondBlock,
    pub else_ifs: Vec<CondBlock>,
    /// `None` when there is no `$[[ELSE]]`.
    pub else_blocks: Option<Vec<Block>>,
}

/// One condition of a branch and the blocks it guards.
#[derive(Debug, Clone, PartialEq)]
pub struct CondBlock {
    pub cond: Condition,
    pub content: Vec<Block>,
    /// Position of the directive that holds the condition.
    pub line: usize,
    pub col: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Source text, parsed on first evaluation.
    Raw(String),
    Parsed(Ast),
}

impl TextBlock {
    pub fn new(text: String) -> Self {
        let left_trim = text.starts_with(' ');
        let right_trim = text.ends_with(' ');
        TextBlock {
            text,
            left_trim,
            right_trim,
        }
    }
}

/// Parse a template without touching its conditions.
///
/// # Errors
/// Returns a syntax error for unbalanced or malformed directives.
pub fn parse(source: &str) -> Result<Template, TsError> {
    let tmpl = parser::parse(source)?;
    debug!("parsed template with {} top-level block(s)", tmpl.blocks.len());
    Ok(tmpl)
}

/// Parse a template and every condition in it, rejecting conditions that
/// assign flags or call built-ins with side effects.
///
/// # Errors
/// Returns a syntax error for malformed directives, a [`TsError::Template`]
/// wrapping any error in a condition, or [`TsError::SideEffect`].
pub fn parse_template(source: &str) -> Result<Template, TsError> {
    let mut tmpl = parse(source)?;
    prepare_blocks(&mut tmpl.blocks)?;
    Ok(tmpl)
}

fn prepare_blocks(blocks: &mut [Block]) -> Result<(), TsError> {
    for block in blocks {
        if let Block::Branch(branch) = block {
            for cond in branch.conditions_mut() {
                cond.prepare()?;
                prepare_blocks(&mut cond.content)?;
            }
            if let Some(else_blocks) = &mut branch.else_blocks {
                prepare_blocks(else_blocks)?;
            }
        }
    }
    Ok(())
}

impl Branch {
    fn conditions_mut(&mut self) -> impl Iterator<Item = &mut CondBlock> {
        std::iter::once(&mut self.if_block).chain(self.else_ifs.iter_mut())
    }
}

impl CondBlock {
    /// Parse a raw condition in place and check that it is query-only.
    fn prepare(&mut self) -> Result<(), TsError> {
        if let Condition::Raw(raw) = &self.cond {
            let ast = self.parse_condition(raw)?;
            self.cond = Condition::Parsed(ast);
        }
        Ok(())
    }

    fn parse_condition(&self, raw: &str) -> Result<Ast, TsError> {
        let ast = syntax::parse_condition(raw).map_err(|e| TsError::Template {
            line: self.line,
            col: self.col,
            source: Box::new(e),
        })?;
        if let Some(node) = ast.first_side_effect() {
            return Err(TsError::SideEffect {
                line: self.line,
                col: self.col,
                what: describe_side_effect(node),
            });
        }
        Ok(ast)
    }
}

fn describe_side_effect(node: &Node) -> String {
    match node {
        Node::Func { name, .. } => format!("${name}()"),
        Node::Assignment { flag, .. } => format!("assigning to ${flag}"),
        other => other.tunascript(),
    }
}

/// Expand `blocks` against the interpreter's flags.
///
/// Raw conditions are parsed and checked as they are reached; parsed ones are
/// used as they are.
pub(crate) fn render<W: World>(interp: &mut Interpreter<W>, blocks: &[Block]) -> Result<String, TsError> {
    let mut out = String::new();
    for (idx, block) in blocks.iter().enumerate() {
        match block {
            Block::Text(text) => out.push_str(&text.text),
            Block::Flag(name) => out.push_str(&interp.flag_text(name)),
            Block::Branch(branch) => {
                let expanded = render_branch(interp, branch)?;
                if expanded.is_empty() {
                    collapse_gap(&mut out, idx.checked_sub(1).and_then(|i| blocks.get(i)), blocks.get(idx + 1));
                }
                out.push_str(&expanded);
            },
        }
    }
    Ok(out)
}

/// An empty branch between two spaces would leave a double space; drop the
/// one space that ended the preceding text. Other whitespace is kept.
fn collapse_gap(out: &mut String, prev: Option<&Block>, next: Option<&Block>) {
    if let (Some(Block::Text(prev)), Some(Block::Text(next))) = (prev, next)
        && prev.right_trim
        && next.left_trim
        && out.ends_with(' ')
    {
        out.pop();
    }
}

fn render_branch<W: World>(interp: &mut Interpreter<W>, branch: &Branch) -> Result<String, TsError> {
    let conds = std::iter::once(&branch.if_block).chain(&branch.else_ifs);
    for cond in conds {
        if condition_holds(interp, cond)? {
            return render(interp, &cond.content);
        }
    }
    match &branch.else_blocks {
        Some(blocks) => render(interp, blocks),
        None => Ok(String::new()),
    }
}

fn condition_holds<W: World>(interp: &mut Interpreter<W>, cond: &CondBlock) -> Result<bool, TsError> {
    let value = match &cond.cond {
        Condition::Parsed(ast) => interp.exec(ast),
        Condition::Raw(raw) => {
            let ast = cond.parse_condition(raw)?;
            interp.exec(&ast)
        },
    };
    Ok(value.cast_to_bool())
}

impl Template {
    /// Template source that parses back to an equivalent template.
    pub fn template(&self) -> String {
        blocks_source(&self.blocks)
    }
}

fn blocks_source(blocks: &[Block]) -> String {
    let mut out = String::new();
    for block in blocks {
        match block {
            Block::Text(text) => out.push_str(&text.text.replace('\\', "\\\\").replace('$', "\\$")),
            Block::Flag(name) => {
                out.push('$');
                out.push_str(name);
            },
            Block::Branch(branch) => {
                push_directive(&mut out, "IF", &branch.if_block.cond);
                out.push_str(&blocks_source(&branch.if_block.content));
                for elif in &branch.else_ifs {
                    push_directive(&mut out, "ELSE IF", &elif.cond);
                    out.push_str(&blocks_source(&elif.content));
                }
                if let Some(else_blocks) = &branch.else_blocks {
                    out.push_str("$[[ELSE]]");
                    out.push_str(&blocks_source(else_blocks));
                }
                out.push_str("$[[ENDIF]]");
            },
        }
    }
    out
}

fn push_directive(out: &mut String, keyword: &str, cond: &Condition) {
    out.push_str("$[[");
    out.push_str(keyword);
    let source = match cond {
        Condition::Raw(raw) => raw.clone(),
        Condition::Parsed(ast) => ast.tunascript(),
    };
    if !source.is_empty() {
        out.push(' ');
        out.push_str(&source);
    }
    out.push_str("]]");
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Template")?;
        if self.blocks.is_empty() {
            return f.write_str("(empty)");
        }
        for block in &self.blocks {
            write!(f, "\n B: {}", indent_continuation(&block.to_string(), 4))?;
        }
        Ok(())
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Block::Text(text) => {
                let wrapped = textwrap::fill(&text.text, DUMP_WIDTH);
                write!(
                    f,
                    "[TEXT ltrim={} rtrim={}\n    {}\n]",
                    text.left_trim,
                    text.right_trim,
                    indent_continuation(&wrapped, 4)
                )
            },
            Block::Flag(name) => write!(f, "[FLAG ${name}]"),
            Block::Branch(branch) => {
                f.write_str("[BRANCH\n")?;
                writeln!(f, " I: {}", indent_continuation(&branch.if_block.to_string(), 4))?;
                for elif in &branch.else_ifs {
                    writeln!(f, " EI:{}", indent_continuation(&elif.to_string(), 4))?;
                }
                for block in branch.else_blocks.iter().flatten() {
                    writeln!(f, " E: {}", indent_continuation(&block.to_string(), 4))?;
                }
                f.write_str("]")
            },
        }
    }
}

impl fmt::Display for CondBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cond = match &self.cond {
            Condition::Raw(raw) => format!("(raw) {raw}"),
            Condition::Parsed(ast) => ast.to_string(),
        };
        write!(f, "[COND\n IF:{}", indent_continuation(&cond, 4))?;
        for block in &self.content {
            write!(f, "\n C: {}", indent_continuation(&block.to_string(), 4))?;
        }
        f.write_str("]")
    }
}
