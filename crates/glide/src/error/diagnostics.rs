//! # Diagnostic Utilities
//!
//! Rendering of parse failures against the input they came from.

use std::fmt::Write;

use crate::error::ParseError;
use crate::input::Input;

/// Format a parse error with the offending input line and a caret
///
/// # Example
///
/// ```rust,ignore
/// if let Some(error) = result.error() {
///     eprintln!("{}", format_with_context(error, &input));
/// }
/// ```
#[must_use]
pub fn format_with_context(error: &ParseError, input: &Input) -> String {
    let position = input.line_col(error.index());
    let mut output = String::new();

    let _ = writeln!(output, "error: {error}");
    let _ = writeln!(output, "  --> input:{position}");

    let gutter = (position.line + 1).to_string();
    let pad = " ".repeat(gutter.len());
    let _ = writeln!(output, "{pad} |");
    let _ = writeln!(output, "{gutter} | {}", input.line_text(position.line));
    let _ = writeln!(output, "{pad} | {}^", " ".repeat(position.column as usize));
    if let Some(slot) = error.slot() {
        let _ = writeln!(output, "{pad} = while parsing `{slot}`");
    }

    output
}

/// Describe what sits at `index`, for error messages
#[must_use]
pub fn describe_position(input: &Input, index: usize) -> String {
    match input.char_at(index) {
        Some(c) => format!("{c:?}"),
        None => "end of input".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gss::GssNodeId;

    #[test]
    fn test_caret_under_failure() {
        let input = Input::new("let x\nfoo bar");
        let error = ParseError::NoDerivation {
            slot: "Stmt ::= 'foo' . Expr".into(),
            index: 10,
            line: 1,
            column: 4,
            gss: GssNodeId::ROOT,
        };
        let rendered = format_with_context(&error, &input);
        assert!(rendered.contains("input:2:5"));
        assert!(rendered.contains("2 | foo bar"));
        assert!(rendered.contains("\n  |     ^"));
        assert!(rendered.contains("while parsing `Stmt ::= 'foo' . Expr`"));
    }

    #[test]
    fn test_describe_position() {
        let input = Input::new("ab");
        assert_eq!(describe_position(&input, 1), "'b'");
        assert_eq!(describe_position(&input, 2), "end of input");
    }
}
