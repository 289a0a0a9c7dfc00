/// Translation of raw compiler output into user-facing diagnostics

use std::fmt;

use serde::Serialize;

use crate::config::PlaygroundConfig;

/// A compiler error with line numbers pointing into the user's snippet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub text: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Rewrites compiler diagnostics for synthesized modules.
#[derive(Debug, Clone)]
pub struct ErrorTranslator {
    line_offset: usize,
    echo_prefix: String,
}

impl ErrorTranslator {
    pub fn new(config: &PlaygroundConfig) -> Self {
        Self {
            line_offset: config.boilerplate_lines(),
            echo_prefix: config.compiler.echo_prefix.clone(),
        }
    }

    pub fn translate(&self, raw: &str) -> Diagnostic {
        let body = self.strip_command_echo(raw);
        let text = body
            .split('\n')
            .map(|line| self.shift_line(line))
            .collect::<Vec<_>>()
            .join("\n");

        Diagnostic { text }
    }

    /// The first line of a raw diagnostic repeats the command that failed.
    fn strip_command_echo<'r>(&self, raw: &'r str) -> &'r str {
        if self.echo_prefix.is_empty() || !raw.starts_with(&self.echo_prefix) {
            return raw;
        }
        match raw.split_once('\n') {
            Some((_, rest)) => rest,
            None => "",
        }
    }

    /// `12| code` becomes `7| code`. A line at or above the offset points into the
    /// synthesized header, so it keeps the generated module's numbering.
    fn shift_line<'l>(&self, line: &'l str) -> std::borrow::Cow<'l, str> {
        let digits = line.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 || line.as_bytes().get(digits) != Some(&b'|') {
            return line.into();
        }

        match line[..digits].parse::<usize>() {
            Ok(number) if number > self.line_offset => {
                format!("{}{}", number - self.line_offset, &line[digits..]).into()
            }
            _ => line.into(),
        }
    }
}
