//! Symbols, conditions and rules.

use std::fmt;

use compact_str::CompactString;

use crate::datadep::expr::{Expression, Statement, write_list};
use crate::terminal::{CharSet, Pattern};

/// A condition attached before or after a symbol
///
/// A condition that does not hold drops the branch it guards. Conditions
/// never consume input.
#[derive(Debug, Clone)]
pub enum Condition {
    /// A boolean expression over the environment
    DataDependent(Expression),
    /// The terminal must match right after the symbol
    Follow(Pattern),
    NotFollow(Pattern),
    /// The terminal must match right before the symbol
    Precede(Pattern),
    NotPrecede(Pattern),
    /// The symbol's yield must not be exactly a match of the terminal
    NotMatch(Pattern),
    /// The symbol starts at column 0
    StartOfLine,
    /// The symbol ends before a line break or at the end of input
    EndOfLine,
    /// The symbol ends at the end of input
    EndOfFile,
}

impl Condition {
    /// Shorthand for [`Condition::DataDependent`]
    #[must_use]
    pub const fn when(expression: Expression) -> Self {
        Self::DataDependent(expression)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DataDependent(expression) => write!(f, "[{expression}]"),
            Self::Follow(pattern) => write!(f, ">>{pattern}"),
            Self::NotFollow(pattern) => write!(f, "!>>{pattern}"),
            Self::Precede(pattern) => write!(f, "{pattern}<<"),
            Self::NotPrecede(pattern) => write!(f, "{pattern}!<<"),
            Self::NotMatch(pattern) => write!(f, "\\{pattern}"),
            Self::StartOfLine => f.write_str("^"),
            Self::EndOfLine => f.write_str("$"),
            Self::EndOfFile => f.write_str("$$"),
        }
    }
}

/// The shape of a symbol
#[derive(Debug, Clone)]
pub enum SymbolKind {
    Terminal(Pattern),
    Nonterminal {
        name: CompactString,
        arguments: Vec<Expression>,
    },
    /// A scoped sequence
    Block(Vec<Symbol>),
    /// A symbol followed by statements
    Code {
        symbol: Box<Symbol>,
        statements: Vec<Statement>,
    },
    /// A symbol followed by a guard
    Conditional {
        symbol: Box<Symbol>,
        condition: Expression,
    },
    IfThen {
        condition: Expression,
        then: Box<Symbol>,
    },
    IfThenElse {
        condition: Expression,
        then: Box<Symbol>,
        otherwise: Box<Symbol>,
    },
    While {
        condition: Expression,
        body: Box<Symbol>,
    },
    Epsilon,
}

/// A symbol of a rule body, with its label, binding and conditions
#[derive(Debug, Clone)]
pub struct Symbol {
    pub kind: SymbolKind,
    /// Label bound to the symbol's extent and value
    pub label: Option<CompactString>,
    /// Variable bound to the value a nonterminal returns
    pub variable: Option<CompactString>,
    pub preconditions: Vec<Condition>,
    pub postconditions: Vec<Condition>,
}

impl Symbol {
    #[must_use]
    pub const fn new(kind: SymbolKind) -> Self {
        Self {
            kind,
            label: None,
            variable: None,
            preconditions: Vec::new(),
            postconditions: Vec::new(),
        }
    }

    /// A literal terminal
    #[must_use]
    pub fn literal(text: &str) -> Self {
        Self::terminal(Pattern::Literal(text.into()))
    }

    /// A character class terminal
    #[must_use]
    pub fn char_class(set: CharSet) -> Self {
        Self::terminal(Pattern::CharClass(set))
    }

    /// A regular expression terminal
    #[must_use]
    pub fn regex(source: &str) -> Self {
        Self::terminal(Pattern::Regex(source.into()))
    }

    /// Any single code point
    #[must_use]
    pub fn any() -> Self {
        Self::terminal(Pattern::Any)
    }

    #[must_use]
    pub const fn terminal(pattern: Pattern) -> Self {
        Self::new(SymbolKind::Terminal(pattern))
    }

    /// A call to a parameterless nonterminal
    #[must_use]
    pub fn nonterminal(name: &str) -> Self {
        Self::call(name, [])
    }

    /// A call to a nonterminal with arguments
    #[must_use]
    pub fn call(name: &str, arguments: impl IntoIterator<Item = Expression>) -> Self {
        Self::new(SymbolKind::Nonterminal {
            name: name.into(),
            arguments: arguments.into_iter().collect(),
        })
    }

    #[must_use]
    pub fn block(symbols: impl IntoIterator<Item = Self>) -> Self {
        Self::new(SymbolKind::Block(symbols.into_iter().collect()))
    }

    #[must_use]
    pub fn code(symbol: Self, statements: impl IntoIterator<Item = Statement>) -> Self {
        Self::new(SymbolKind::Code {
            symbol: Box::new(symbol),
            statements: statements.into_iter().collect(),
        })
    }

    #[must_use]
    pub fn conditional(symbol: Self, condition: Expression) -> Self {
        Self::new(SymbolKind::Conditional {
            symbol: Box::new(symbol),
            condition,
        })
    }

    #[must_use]
    pub fn if_then(condition: Expression, then: Self) -> Self {
        Self::new(SymbolKind::IfThen {
            condition,
            then: Box::new(then),
        })
    }

    #[must_use]
    pub fn if_then_else(condition: Expression, then: Self, otherwise: Self) -> Self {
        Self::new(SymbolKind::IfThenElse {
            condition,
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    #[must_use]
    pub fn while_loop(condition: Expression, body: Self) -> Self {
        Self::new(SymbolKind::While {
            condition,
            body: Box::new(body),
        })
    }

    #[must_use]
    pub const fn epsilon() -> Self {
        Self::new(SymbolKind::Epsilon)
    }

    /// Bind the symbol's extent to `label`
    #[must_use]
    pub fn labelled(mut self, label: &str) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Bind the nonterminal's return value to `variable`
    #[must_use]
    pub fn bind(mut self, variable: &str) -> Self {
        self.variable = Some(variable.into());
        self
    }

    /// Add a condition checked before the symbol
    #[must_use]
    pub fn precondition(mut self, condition: Condition) -> Self {
        self.preconditions.push(condition);
        self
    }

    /// Add a condition checked after the symbol
    #[must_use]
    pub fn postcondition(mut self, condition: Condition) -> Self {
        self.postconditions.push(condition);
        self
    }

    /// Whether parsing this symbol can produce SPPF nodes
    #[must_use]
    pub fn produces_nodes(&self) -> bool {
        match &self.kind {
            SymbolKind::Terminal(_) | SymbolKind::Nonterminal { .. } => true,
            SymbolKind::Block(symbols) => symbols.iter().any(Self::produces_nodes),
            SymbolKind::Code { symbol, .. } | SymbolKind::Conditional { symbol, .. } => {
                symbol.produces_nodes()
            }
            SymbolKind::IfThen { then, .. } => then.produces_nodes(),
            SymbolKind::IfThenElse {
                then, otherwise, ..
            } => then.produces_nodes() || otherwise.produces_nodes(),
            SymbolKind::While { body, .. } => body.produces_nodes(),
            SymbolKind::Epsilon => false,
        }
    }

    /// Whether every path through this symbol produces an SPPF node
    #[must_use]
    pub fn always_produces_nodes(&self) -> bool {
        match &self.kind {
            SymbolKind::Terminal(_) | SymbolKind::Nonterminal { .. } => true,
            SymbolKind::Block(symbols) => symbols.iter().any(Self::always_produces_nodes),
            SymbolKind::Code { symbol, .. } | SymbolKind::Conditional { symbol, .. } => {
                symbol.always_produces_nodes()
            }
            SymbolKind::IfThenElse {
                then, otherwise, ..
            } => then.always_produces_nodes() && otherwise.always_produces_nodes(),
            SymbolKind::IfThen { .. } | SymbolKind::While { .. } | SymbolKind::Epsilon => false,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for condition in &self.preconditions {
            write!(f, "{condition} ")?;
        }
        if let Some(label) = &self.label {
            write!(f, "{label}:")?;
        }
        if let Some(variable) = &self.variable {
            write!(f, "{variable}=")?;
        }
        match &self.kind {
            SymbolKind::Terminal(pattern) => write!(f, "{pattern}")?,
            SymbolKind::Nonterminal { name, arguments } => {
                f.write_str(name)?;
                if !arguments.is_empty() {
                    f.write_str("(")?;
                    write_list(f, arguments)?;
                    f.write_str(")")?;
                }
            }
            SymbolKind::Block(symbols) => {
                f.write_str("(")?;
                write_sequence(f, symbols)?;
                f.write_str(")")?;
            }
            SymbolKind::Code { symbol, statements } => {
                write!(f, "{symbol} {{")?;
                for statement in statements {
                    write!(f, " {statement}")?;
                }
                f.write_str(" }")?;
            }
            SymbolKind::Conditional { symbol, condition } => {
                write!(f, "{symbol} when {condition}")?;
            }
            SymbolKind::IfThen { condition, then } => write!(f, "if {condition} {then}")?,
            SymbolKind::IfThenElse {
                condition,
                then,
                otherwise,
            } => write!(f, "if {condition} {then} else {otherwise}")?,
            SymbolKind::While { condition, body } => write!(f, "while {condition} {body}")?,
            SymbolKind::Epsilon => f.write_str("ε")?,
        }
        for condition in &self.postconditions {
            write!(f, " {condition}")?;
        }
        Ok(())
    }
}

pub(crate) fn write_sequence(f: &mut fmt::Formatter<'_>, symbols: &[Symbol]) -> fmt::Result {
    for (i, symbol) in symbols.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{symbol}")?;
    }
    Ok(())
}

/// One alternative of a nonterminal
#[derive(Debug, Clone)]
pub struct Rule {
    pub body: Vec<Symbol>,
    /// Value of the call, evaluated at the end of the rule
    pub returns: Option<Expression>,
}

impl Rule {
    #[must_use]
    pub fn new(body: impl IntoIterator<Item = Symbol>) -> Self {
        Self {
            body: body.into_iter().collect(),
            returns: None,
        }
    }

    /// Set the return expression
    #[must_use]
    pub fn returning(mut self, expression: Expression) -> Self {
        self.returns = Some(expression);
        self
    }
}
