/// Splitting the playground buffer into classified statements

use serde::Serialize;

/// Prefix that turns an expression into a full interactive component.
pub const RENDER_KEYWORD: &str = "render ";

const IMPORT_KEYWORD: &str = "import ";

/// A single line of the snippet buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawLine<'a> {
    /// 1-based line number
    pub number: usize,
    pub text: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StatementKind {
    Import,
    RenderExpression,
    /// Value bindings and standalone type signatures
    Assignment,
    /// Anything else; rendered as a displayable value
    Expression,
}

impl StatementKind {
    /// Whether statements of this kind get their own synthesized module.
    pub fn is_displayable(self) -> bool {
        matches!(self, StatementKind::Expression | StatementKind::RenderExpression)
    }
}

/// A logical statement, possibly spanning several indented lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Statement {
    /// Merged text; continuation lines are joined with a single space
    pub text: String,
    /// 1-based line the statement starts on
    pub line: usize,
    /// Number of source lines folded into this statement
    pub continuation_lines: usize,
    pub kind: StatementKind,
}

impl Statement {
    pub fn is_displayable(&self) -> bool {
        self.kind.is_displayable()
    }
}

type Predicate = fn(&str) -> bool;

/// Evaluated top to bottom; the first matching predicate decides the kind.
const CLASSIFIERS: &[(Predicate, StatementKind)] = &[
    (is_import, StatementKind::Import),
    (is_render_expression, StatementKind::RenderExpression),
    (is_binding, StatementKind::Assignment),
    (is_type_signature, StatementKind::Assignment),
];

fn is_import(text: &str) -> bool {
    text.starts_with(IMPORT_KEYWORD)
}

/// `render = ...` and `render : ...` define a value called `render`, so they
/// fall through to the assignment checks.
fn is_render_expression(text: &str) -> bool {
    match text.strip_prefix(RENDER_KEYWORD) {
        Some(rest) => !matches!(rest.split_whitespace().next(), Some("=") | Some(":")),
        None => false,
    }
}

fn is_binding(text: &str) -> bool {
    text.split_whitespace().any(|token| token == "=")
}

fn is_type_signature(text: &str) -> bool {
    text.split_whitespace().nth(1) == Some(":")
}

/// Decide the kind of a single (already merged) statement.
pub fn classify_text(text: &str) -> StatementKind {
    CLASSIFIERS
        .iter()
        .find(|(predicate, _)| predicate(text))
        .map(|(_, kind)| *kind)
        .unwrap_or(StatementKind::Expression)
}

/// Split a buffer into numbered lines. An empty buffer has no lines.
pub fn raw_lines(text: &str) -> impl Iterator<Item = RawLine<'_>> {
    let lines = if text.is_empty() {
        None
    } else {
        Some(text.split('\n'))
    };

    lines.into_iter().flatten().enumerate().map(|(i, line)| RawLine {
        number: i + 1,
        text: line.strip_suffix('\r').unwrap_or(line),
    })
}

fn is_continuation(line: &RawLine<'_>) -> bool {
    line.number > 1 && line.text.starts_with([' ', '\t'])
}

/// Tokenize the playground buffer into classified statements, in source order.
pub fn classify(text: &str) -> Vec<Statement> {
    let mut statements: Vec<Statement> = Vec::new();

    for line in raw_lines(text) {
        match statements.last_mut() {
            Some(current) if is_continuation(&line) => {
                current.text.push(' ');
                current.text.push_str(line.text);
                current.continuation_lines += 1;
            }
            _ => statements.push(Statement {
                text: line.text.to_string(),
                line: line.number,
                continuation_lines: 1,
                kind: StatementKind::Expression,
            }),
        }
    }

    for statement in &mut statements {
        statement.kind = classify_text(&statement.text);
    }

    statements
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_buffer_has_no_statements() {
        assert!(classify("").is_empty());
    }

    #[test]
    fn test_precedence() {
        assert_eq!(classify_text("import Html"), StatementKind::Import);
        assert_eq!(classify_text("import Html exposing (a = b)"), StatementKind::Import);
        assert_eq!(classify_text("import Html : x"), StatementKind::Import);
        assert_eq!(classify_text("render view model"), StatementKind::RenderExpression);
        assert_eq!(classify_text("view model"), StatementKind::Expression);
        assert_eq!(classify_text("x = 5"), StatementKind::Assignment);
        assert_eq!(classify_text("x : Int"), StatementKind::Assignment);
        assert_eq!(classify_text("add : Int -> Int = 1"), StatementKind::Assignment);
        assert_eq!(classify_text("1 + 2"), StatementKind::Expression);
    }

    #[test]
    fn test_render_as_a_name_is_an_assignment() {
        assert_eq!(classify_text("render = 5"), StatementKind::Assignment);
        assert_eq!(classify_text("render : Int"), StatementKind::Assignment);
        assert_eq!(
            classify_text("render { model = 0, view = view, update = update }"),
            StatementKind::RenderExpression
        );
    }

    #[test]
    fn test_equality_operator_is_not_a_binding() {
        assert_eq!(classify_text("1 == 1"), StatementKind::Expression);
        assert_eq!(classify_text("x=5"), StatementKind::Expression);
    }

    #[test]
    fn test_whitespace_only_statement_is_an_expression() {
        let statements = classify("   ");
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].kind, StatementKind::Expression);
    }

    #[test]
    fn test_continuation_lines_are_merged() {
        let source = "double x =\n    x * 2\ndouble 4";
        let statements = classify(source);

        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0].text, "double x =     x * 2");
        assert_eq!(statements[0].continuation_lines, 2);
        assert_eq!(statements[0].kind, StatementKind::Assignment);
        assert_eq!(statements[1].line, 3);
        assert_eq!(statements[1].kind, StatementKind::Expression);
    }

    #[test]
    fn test_indented_first_line_starts_a_statement() {
        let statements = classify("  42\n  + 1");
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].text, "  42   + 1");
        assert_eq!(statements[0].continuation_lines, 2);
    }

    #[test]
    fn test_line_accounting_round_trips() {
        let sources = [
            "a",
            "a\nb\n",
            "f x =\n  case x of\n    _ -> 1\nf 2\n\nimport Html\n  ",
            "\r\n\r\nx : Int\r\nx = 4\r\n",
        ];
        for source in sources {
            let total: usize = classify(source).iter().map(|s| s.continuation_lines).sum();
            assert_eq!(total, source.split('\n').count(), "source: {:?}", source);
        }
    }

    #[test]
    fn test_trailing_newline_yields_blank_expression() {
        let statements = classify("1 + 1\n");
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[1].text, "");
        assert_eq!(statements[1].kind, StatementKind::Expression);
    }

    #[test]
    fn test_crlf_is_stripped() {
        let statements = classify("x = 1\r\nx");
        assert_eq!(statements[0].text, "x = 1");
        assert_eq!(statements[1].text, "x");
    }
}
