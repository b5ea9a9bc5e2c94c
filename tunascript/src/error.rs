//! Error type shared by the lexer, parser, AST builder and template engine.

use pest::RuleType;
use pest::error::{Error as PestError, ErrorVariant, LineColLocation};

/// Everything that can go wrong while turning source text into something
/// executable. Evaluation itself never fails.
#[derive(Debug, thiserror::Error)]
pub enum TsError {
    /// Malformed tokens or a grammar violation.
    #[error("syntax error around line {line}, char {col}: {message}\n{snippet}")]
    Syntax {
        line: usize,
        col: usize,
        message: String,
        snippet: String,
    },
    /// Source that parses but cannot become a valid AST (unknown function,
    /// wrong argument count, bad literal).
    #[error("around line {line}, char {col}: {message}")]
    Construct { line: usize, col: usize, message: String },
    #[error("around line {line}, char {col}: expression nests deeper than {limit} levels")]
    TooDeep { line: usize, col: usize, limit: usize },
    /// A problem inside the `TunaScript` condition of a template directive.
    #[error("in template directive around line {line}, char {col}:\n{source}")]
    Template {
        line: usize,
        col: usize,
        #[source]
        source: Box<TsError>,
    },
    /// A template condition that would assign a flag or call a built-in with
    /// side effects.
    #[error("around line {line}, char {col}: {what} changes things, so it can't be used in templates")]
    SideEffect { line: usize, col: usize, what: String },
    #[error("flag label {0:?} does not match pattern /[A-Z0-9_]+/")]
    FlagLabel(String),
    #[error("{file}: {source}")]
    InFile {
        file: String,
        #[source]
        source: Box<TsError>,
    },
    #[error("could not read source: {0}")]
    Io(#[from] std::io::Error),
}

impl TsError {
    /// Convert a pest failure into a positioned syntax error, naming rules with `describe`.
    pub(crate) fn from_pest<R: RuleType>(err: &PestError<R>, describe: impl Fn(&R) -> &'static str) -> Self {
        let (line, col) = match err.line_col {
            LineColLocation::Pos(pos) | LineColLocation::Span(pos, _) => pos,
        };
        let source_line = err.line();
        let found = match source_line.chars().nth(col.saturating_sub(1)) {
            Some(ch) => format!("{ch:?}"),
            None => "end of input".to_string(),
        };
        let message = match &err.variant {
            ErrorVariant::ParsingError { positives, .. } if !positives.is_empty() => {
                let mut names: Vec<&str> = Vec::new();
                for name in positives.iter().map(&describe) {
                    if !names.contains(&name) {
                        names.push(name);
                    }
                }
                format!("unexpected {found}; expected {}", join_alternatives(&names))
            },
            ErrorVariant::ParsingError { .. } => format!("unexpected {found}"),
            ErrorVariant::CustomError { message } => message.clone(),
        };
        TsError::Syntax {
            line,
            col,
            message,
            snippet: caret_snippet(source_line, col),
        }
    }

    /// Attach a file name for diagnostics, unless one is already attached.
    pub(crate) fn in_file(self, file: Option<&str>) -> Self {
        match file {
            Some(name) if !matches!(self, TsError::InFile { .. }) => TsError::InFile {
                file: name.to_string(),
                source: Box::new(self),
            },
            _ => self,
        }
    }
}

/// "a", "a or b", "a, b, or c"
fn join_alternatives(names: &[&str]) -> String {
    match names {
        [] => String::new(),
        [one] => (*one).to_string(),
        [a, b] => format!("{a} or {b}"),
        [rest @ .., last] => format!("{}, or {last}", rest.join(", ")),
    }
}

/// The offending source line with a caret under column `col` (1-based).
pub(crate) fn caret_snippet(line: &str, col: usize) -> String {
    let line = line.trim_end_matches(['\r', '\n']);
    let mut out = String::with_capacity(line.len() * 2 + 2);
    out.push_str(line);
    out.push('\n');
    for ch in line.chars().take(col.saturating_sub(1)) {
        out.push(if ch == '\t' { '\t' } else { ' ' });
    }
    out.push('^');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alternatives_read_naturally() {
        assert_eq!(join_alternatives(&["number"]), "number");
        assert_eq!(join_alternatives(&["number", "text"]), "number or text");
        assert_eq!(join_alternatives(&["`(`", "number", "text"]), "`(`, number, or text");
    }

    #[test]
    fn caret_points_at_column() {
        assert_eq!(caret_snippet("$X = = 5", 6), "$X = = 5\n     ^");
        assert_eq!(caret_snippet("\tbad", 2), "\tbad\n\t^");
    }

    #[test]
    fn file_context_is_applied_once() {
        let err = TsError::FlagLabel("A-B".into()).in_file(Some("room.ts")).in_file(Some("other.ts"));
        assert_eq!(err.to_string(), "room.ts: flag label \"A-B\" does not match pattern /[A-Z0-9_]+/");
    }
}
