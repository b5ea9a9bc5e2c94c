use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser as PestParser;

use super::{Block, Branch, CondBlock, Condition, Template, TextBlock};
use crate::error::TsError;
use crate::syntax::unescape;

#[derive(PestParser)]
#[grammar = "src/expansion/template.pest"]
struct TemplateParser;

/// Parse template source, leaving every condition raw.
pub(super) fn parse(source: &str) -> Result<Template, TsError> {
    let mut pairs = TemplateParser::parse(Rule::template, source).map_err(|e| TsError::from_pest(&e, describe_rule))?;
    let Some(root) = pairs.next() else {
        return Ok(Template::default());
    };
    let blocks = match root.into_inner().find(|p| p.as_rule() == Rule::blocks) {
        Some(pair) => build_blocks(pair)?,
        None => Vec::new(),
    };
    Ok(Template { blocks })
}

fn shape(pair: &Pair<Rule>, what: &str) -> TsError {
    let (line, col) = pair.line_col();
    TsError::Construct {
        line,
        col,
        message: format!("unexpected template shape: {what}"),
    }
}

fn build_blocks(pair: Pair<Rule>) -> Result<Vec<Block>, TsError> {
    pair.into_inner()
        .map(|inner| match inner.as_rule() {
            Rule::text => Ok(Block::Text(TextBlock::new(unescape(inner.as_str())))),
            Rule::flag => Ok(Block::Flag(inner.as_str().trim_start_matches('$').to_uppercase())),
            Rule::branch => build_branch(inner).map(Block::Branch),
            _ => Err(shape(&inner, "expected text, flag or branch")),
        })
        .collect()
}

fn build_branch(pair: Pair<Rule>) -> Result<Branch, TsError> {
    let outer = pair.clone();
    let mut it = pair.into_inner();
    let if_dir = it.next().ok_or_else(|| shape(&outer, "missing IF"))?;
    let if_body = it.next().ok_or_else(|| shape(&outer, "missing IF content"))?;
    let mut branch = Branch {
        if_block: cond_block(if_dir, if_body)?,
        else_ifs: Vec::new(),
        else_blocks: None,
    };

    for clause in it {
        match clause.as_rule() {
            Rule::elseif_clause => {
                let outer = clause.clone();
                let mut parts = clause.into_inner();
                let dir = parts.next().ok_or_else(|| shape(&outer, "missing ELSE IF"))?;
                let body = parts.next().ok_or_else(|| shape(&outer, "missing ELSE IF content"))?;
                branch.else_ifs.push(cond_block(dir, body)?);
            },
            Rule::else_clause => {
                let body = clause
                    .clone()
                    .into_inner()
                    .find(|p| p.as_rule() == Rule::blocks)
                    .ok_or_else(|| shape(&clause, "missing ELSE content"))?;
                branch.else_blocks = Some(build_blocks(body)?);
            },
            Rule::endif_dir => {},
            _ => return Err(shape(&clause, "unexpected branch clause")),
        }
    }
    Ok(branch)
}

fn cond_block(directive: Pair<Rule>, body: Pair<Rule>) -> Result<CondBlock, TsError> {
    let (line, col) = directive.line_col();
    let raw = directive
        .into_inner()
        .find(|p| p.as_rule() == Rule::cond)
        .map(|p| p.as_str().trim().to_string())
        .unwrap_or_default();
    Ok(CondBlock {
        cond: Condition::Raw(raw),
        content: build_blocks(body)?,
        line,
        col,
    })
}

fn describe_rule(rule: &Rule) -> &'static str {
    match rule {
        Rule::EOI => "end of input",
        Rule::blocks | Rule::text => "text",
        Rule::flag => "flag",
        Rule::branch | Rule::if_dir => "`$[[IF ...]]`",
        Rule::elseif_clause | Rule::elseif_dir => "`$[[ELSE IF ...]]`",
        Rule::else_clause | Rule::else_dir => "`$[[ELSE]]`",
        Rule::endif_dir => "`$[[ENDIF]]`",
        Rule::cond => "condition",
        _ => "template",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Block {
        Block::Text(TextBlock::new(s.to_string()))
    }

    fn raw(block: &CondBlock) -> &str {
        match &block.cond {
            Condition::Raw(s) => s,
            Condition::Parsed(_) => panic!("expected a raw condition"),
        }
    }

    #[test]
    fn text_and_flags() {
        let tmpl = parse("You have $gold coins.").expect("parse ok");
        assert_eq!(tmpl.blocks, vec![text("You have "), Block::Flag("GOLD".into()), text(" coins.")]);
    }

    #[test]
    fn lone_dollars_and_escapes_are_text() {
        let tmpl = parse(r"costs $ 5 or \$GOLD, path C:\\x").expect("parse ok");
        assert_eq!(tmpl.blocks, vec![text(r"costs $ 5 or $GOLD, path C:\x")]);
    }

    #[test]
    fn branch_with_every_clause() {
        let src = "$[[IF $A]]a$[[ELSE IF $B]]b$[[elif $C]]c$[[ElseIf $D]]d$[[ELSE]]e$[[ENDIF]]";
        let tmpl = parse(src).expect("parse ok");
        let [Block::Branch(branch)] = tmpl.blocks.as_slice() else {
            panic!("expected a single branch, got {:?}", tmpl.blocks);
        };
        assert_eq!(raw(&branch.if_block), "$A");
        let conds: Vec<&str> = branch.else_ifs.iter().map(raw).collect();
        assert_eq!(conds, vec!["$B", "$C", "$D"]);
        assert_eq!(branch.else_blocks, Some(vec![text("e")]));
    }

    #[test]
    fn branches_nest() {
        let src = "$[[IF $A]]x$[[IF $B]]y$[[ENDIF]]z$[[ENDIF]]";
        let tmpl = parse(src).expect("parse ok");
        let [Block::Branch(outer)] = tmpl.blocks.as_slice() else {
            panic!("expected a single branch");
        };
        assert_eq!(outer.if_block.content.len(), 3);
        assert!(matches!(outer.if_block.content[1], Block::Branch(_)));
    }

    #[test]
    fn directive_positions_are_recorded() {
        let tmpl = parse("line one\n  $[[IF $X]]yes$[[ENDIF]]").expect("parse ok");
        let Some(Block::Branch(branch)) = tmpl.blocks.get(1) else {
            panic!("expected branch second");
        };
        assert_eq!((branch.if_block.line, branch.if_block.col), (2, 3));
    }

    #[test]
    fn empty_condition_is_allowed() {
        let tmpl = parse("$[[IF]]never$[[ENDIF]]").expect("parse ok");
        let [Block::Branch(branch)] = tmpl.blocks.as_slice() else {
            panic!("expected branch");
        };
        assert_eq!(raw(&branch.if_block), "");
    }

    #[test]
    fn unbalanced_directives_are_syntax_errors() {
        assert!(matches!(parse("$[[IF $X]]open"), Err(TsError::Syntax { .. })));
        assert!(matches!(parse("stray $[[ENDIF]]"), Err(TsError::Syntax { .. })));
        assert!(matches!(parse("$[[IFFY]]x$[[ENDIF]]"), Err(TsError::Syntax { .. })));
    }
}
