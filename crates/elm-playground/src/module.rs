/// Module synthesis for playground expressions
///
/// This module handles:
/// - Naming and wrapping the user's primary code module
/// - Collecting imports and assignments shared by every expression
/// - Emitting one self-contained module per displayable expression

use crate::config::PlaygroundConfig;
use crate::statement::{RENDER_KEYWORD, Statement, StatementKind};

const MODULE_KEYWORD: &str = "module ";

/// The user's own code unit, imported by every synthesized module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryModule {
    /// Declared module name, or the configured default
    pub name: String,
    /// Source exactly as it will be written to the workspace
    pub source: String,
}

/// A generated compilation unit for one expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedModule {
    /// Module name, also the stem of its source and artifact files
    pub name: String,
    /// Position among the displayable statements
    pub index: usize,
    pub source: String,
}

/// Everything written to the workspace for one compile request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Synthesis {
    pub primary: PrimaryModule,
    pub modules: Vec<SynthesizedModule>,
}

/// Name of the module synthesized for the expression at `index`.
pub fn module_name(index: usize) -> String {
    format!("Main{}", index)
}

/// Dotted segments, each an uppercase letter followed by letters, digits or `_`.
///
/// The name becomes a file name in the workspace, so nothing else is accepted.
pub fn is_module_name(name: &str) -> bool {
    name.split('.').all(|segment| {
        let mut chars = segment.chars();
        chars.next().is_some_and(|c| c.is_ascii_uppercase())
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    })
}

/// Generates module sources from classified statements
pub struct ModuleSynthesizer<'a> {
    config: &'a PlaygroundConfig,
}

impl<'a> ModuleSynthesizer<'a> {
    pub fn new(config: &'a PlaygroundConfig) -> Self {
        Self { config }
    }

    /// Name the user's code and give it a module header if it lacks one.
    pub fn primary_module(&self, code: &str) -> PrimaryModule {
        let declared = code
            .starts_with(MODULE_KEYWORD)
            .then(|| code.split_whitespace().nth(1))
            .flatten()
            .filter(|name| is_module_name(name));

        match declared {
            Some(name) => PrimaryModule {
                name: name.to_string(),
                source: code.to_string(),
            },
            None => PrimaryModule {
                name: self.config.default_module.clone(),
                source: format!(
                    "module {} exposing (..)\n\n{}",
                    self.config.default_module, code
                ),
            },
        }
    }

    /// Build the primary module plus one module per displayable statement.
    pub fn synthesize(&self, primary_code: &str, statements: &[Statement]) -> Synthesis {
        let primary = self.primary_module(primary_code);

        let shared_imports = join_kind(statements, StatementKind::Import);
        let shared_assignments = join_kind(statements, StatementKind::Assignment);

        let modules = statements
            .iter()
            .filter(|s| s.is_displayable())
            .enumerate()
            .map(|(index, statement)| {
                let name = module_name(index);
                let source = self.module_source(
                    &name,
                    &primary.name,
                    &shared_imports,
                    &shared_assignments,
                    statement,
                );
                SynthesizedModule { name, index, source }
            })
            .collect();

        Synthesis { primary, modules }
    }

    fn module_source(
        &self,
        name: &str,
        primary: &str,
        shared_imports: &str,
        shared_assignments: &str,
        statement: &Statement,
    ) -> String {
        // Header: exactly `boilerplate_lines()` lines
        let mut lines = Vec::with_capacity(self.config.boilerplate_lines() + 4);
        lines.push(format!("module {} exposing (..)", name));
        lines.extend(self.config.framework_imports.iter().cloned());
        lines.push(format!("import {} exposing (..)", primary));

        if !shared_imports.is_empty() {
            lines.push(shared_imports.to_string());
        }
        if !shared_assignments.is_empty() {
            lines.push(shared_assignments.to_string());
        }

        lines.push("main =".to_string());
        lines.push(format!("    {}", entry_point(statement)));

        lines.join("\n")
    }
}

fn join_kind(statements: &[Statement], kind: StatementKind) -> String {
    statements
        .iter()
        .filter(|s| s.kind == kind)
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Right-hand side of `main` for a displayable statement.
fn entry_point(statement: &Statement) -> String {
    match statement.kind {
        StatementKind::RenderExpression => {
            let component = statement
                .text
                .strip_prefix(RENDER_KEYWORD)
                .unwrap_or(&statement.text);
            let program = if component.contains("subscriptions") {
                "program"
            } else {
                "beginnerProgram"
            };
            format!("{} {}", program, component)
        }
        _ => format!("text {}", display_chunk(&statement.text)),
    }
}

/// Stringify an expression; blank text would make `toString ()` ill-typed.
fn display_chunk(expression: &str) -> String {
    if expression.trim().is_empty() {
        "\" \"".to_string()
    } else {
        format!("(toString ({}))", expression)
    }
}
