//! # Error Types
//!
//! Errors, results and statistics for grammar construction and parsing.
//!
//! ## Overview
//!
//! Errors fall into three groups with different lifetimes:
//!
//! - [`GrammarError`]: raised while building a [`Grammar`](crate::grammar::Grammar)
//!   or compiling it into a [`GrammarGraph`](crate::graph::GrammarGraph). Fatal.
//! - [`EvalError`]: raised by the expression interpreter. Local to one
//!   transition: the parser drops that branch and keeps going.
//! - [`ParseError`]: reported once, when no derivation of the whole input
//!   exists. Carries the deepest failure the parser reached.
//!
//! ## Diagnostics Support
//!
//! When the `diagnostics` feature is enabled, errors integrate with [`miette`]
//! and carry stable diagnostic codes.

pub mod diagnostics;

use std::time::Duration;

use compact_str::CompactString;
use thiserror::Error;

#[cfg(feature = "diagnostics")]
use miette::Diagnostic;

use crate::gss::GssNodeId;
use crate::sppf::{Sppf, SppfNodeId};

/// Errors raised while building or compiling a grammar
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum GrammarError {
    #[error("Undefined nonterminal `{name}` referenced from `{referenced_from}`")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::undefined_nonterminal)))]
    UndefinedNonterminal {
        name: CompactString,
        referenced_from: CompactString,
    },

    #[error("Parameter `{parameter}` declared twice on `{nonterminal}`")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::duplicate_parameter)))]
    DuplicateParameter {
        nonterminal: CompactString,
        parameter: CompactString,
    },

    #[error("`{nonterminal}` expects {expected} argument(s) but {found} were given in `{context}`")]
    #[cfg_attr(
        feature = "diagnostics",
        diagnostic(
            code(grammar::arity_mismatch),
            help("Check the parameter list declared with `GrammarBuilder::parameters`")
        )
    )]
    ArityMismatch {
        nonterminal: CompactString,
        expected: usize,
        found: usize,
        context: CompactString,
    },

    #[error("Undeclared variable `{name}` in a rule of `{nonterminal}`")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::undeclared_variable)))]
    UndeclaredVariable {
        name: CompactString,
        nonterminal: CompactString,
    },

    #[error("Invalid regular expression `{pattern}`: {reason}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::invalid_regex)))]
    InvalidRegex {
        pattern: CompactString,
        reason: String,
    },

    #[error("No start symbol specified")]
    #[cfg_attr(
        feature = "diagnostics",
        diagnostic(
            code(grammar::missing_start),
            help("Call `GrammarBuilder::start` with a defined nonterminal")
        )
    )]
    MissingStartSymbol,

    #[error("Empty character class in a rule of `{nonterminal}`")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::empty_char_class)))]
    EmptyCharClass { nonterminal: CompactString },
}

/// Errors raised while evaluating an expression or statement
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum EvalError {
    #[error("Type mismatch: expected {expected}, found {found}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(eval::type_mismatch)))]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Unbound variable `{name}`")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(eval::unbound_variable)))]
    UnboundVariable { name: CompactString },

    #[error("Division by zero")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(eval::division_by_zero)))]
    DivisionByZero,

    #[error("`{function}` expects {expected} argument(s), found {found}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(eval::bad_arity)))]
    BadArity {
        function: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Index {index} out of bounds for length {len}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(eval::index_out_of_bounds)))]
    IndexOutOfBounds { index: usize, len: usize },
}

impl EvalError {
    /// Create a type mismatch error
    #[must_use]
    pub const fn type_mismatch(expected: &'static str, found: &'static str) -> Self {
        Self::TypeMismatch { expected, found }
    }

    /// Create an unbound variable error
    #[must_use]
    pub fn unbound(name: impl Into<CompactString>) -> Self {
        Self::UnboundVariable { name: name.into() }
    }
}

/// The reason a parse produced no derivation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum ParseError {
    #[error("No derivation: parsing stopped at {l}:{c} in `{slot}`", l = .line + 1, c = .column + 1)]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(parser::no_derivation)))]
    NoDerivation {
        /// Display name of the slot where the deepest failure happened
        slot: CompactString,
        /// Code point index of the failure
        index: usize,
        line: u32,
        column: u32,
        /// GSS node active at the failure
        gss: GssNodeId,
    },

    #[error("Input cannot start `{nonterminal}`: found {found}")]
    #[cfg_attr(
        feature = "diagnostics",
        diagnostic(
            code(parser::inadmissible),
            help("The first character is not in the start symbol's first set")
        )
    )]
    Inadmissible {
        nonterminal: CompactString,
        /// Always 0, kept for uniform reporting
        index: usize,
        found: CompactString,
    },
}

impl ParseError {
    /// Input index of the failure
    #[must_use]
    pub const fn index(&self) -> usize {
        match self {
            Self::NoDerivation { index, .. } | Self::Inadmissible { index, .. } => *index,
        }
    }

    /// Slot display name, for failures inside the parse loop
    #[must_use]
    pub fn slot(&self) -> Option<&str> {
        match self {
            Self::NoDerivation { slot, .. } => Some(slot),
            Self::Inadmissible { .. } => None,
        }
    }

    /// GSS node active at the failure
    #[must_use]
    pub const fn gss_node(&self) -> Option<GssNodeId> {
        match self {
            Self::NoDerivation { gss, .. } => Some(*gss),
            Self::Inadmissible { .. } => None,
        }
    }

    /// Render this error with the offending input line and a caret
    #[must_use]
    pub fn format_with_context(&self, input: &crate::input::Input) -> String {
        diagnostics::format_with_context(self, input)
    }
}

/// Counters collected during one parse
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ParseStatistics {
    /// Distinct descriptors scheduled (and processed)
    pub descriptors: usize,
    pub gss_nodes: usize,
    pub gss_edges: usize,
    pub gss_pops: usize,
    /// SPPF nodes created, excluding the dummy
    pub sppf_nodes: usize,
    pub packed_nodes: usize,
    /// Nodes with more than one packed node, over the whole forest
    pub ambiguous_nodes: usize,
    /// Ambiguous nodes reachable from the root; zero on failure
    pub reachable_ambiguous_nodes: usize,
    pub terminal_memo_hits: usize,
    /// Transitions dropped because an expression failed to evaluate
    pub eval_errors: usize,
    pub parse_time: Duration,
}

/// Outcome of [`GllParser::parse`](crate::parser::GllParser::parse)
#[derive(Debug)]
pub enum ParseResult {
    Success {
        forest: Sppf,
        /// `Nonterminal(start, 0, len)`
        root: SppfNodeId,
        statistics: ParseStatistics,
    },
    Failure {
        error: ParseError,
        statistics: ParseStatistics,
    },
}

impl ParseResult {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    #[must_use]
    pub const fn statistics(&self) -> &ParseStatistics {
        match self {
            Self::Success { statistics, .. } | Self::Failure { statistics, .. } => statistics,
        }
    }

    /// The forest and its root, on success
    #[must_use]
    pub const fn forest(&self) -> Option<(&Sppf, SppfNodeId)> {
        match self {
            Self::Success { forest, root, .. } => Some((forest, *root)),
            Self::Failure { .. } => None,
        }
    }

    /// The error, on failure
    #[must_use]
    pub const fn error(&self) -> Option<&ParseError> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error, .. } => Some(error),
        }
    }

    /// Convert into a `Result`, discarding statistics
    ///
    /// # Errors
    ///
    /// Returns the [`ParseError`] when the parse failed.
    pub fn into_result(self) -> Result<(Sppf, SppfNodeId), ParseError> {
        match self {
            Self::Success { forest, root, .. } => Ok((forest, root)),
            Self::Failure { error, .. } => Err(error),
        }
    }
}
