//! Expression and statement syntax trees.

use std::fmt;

use compact_str::CompactString;

use super::env::Address;
use super::value::Value;

/// A variable reference
///
/// Built by name; the resolution pass fills in the address so evaluation
/// indexes the environment directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Variable {
    pub name: CompactString,
    pub address: Option<Address>,
}

impl Variable {
    #[must_use]
    pub fn named(name: impl Into<CompactString>) -> Self {
        Self {
            name: name.into(),
            address: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::And => "&&",
            Self::Or => "||",
        }
    }
}

/// Accessors on a label binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Accessor {
    /// Left extent
    Lext,
    /// Right extent
    Rext,
    /// The text the symbol matched
    Yield,
    /// The value returned by the symbol's rule
    Val,
}

/// Built-in functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    /// `indent(i)`: column of input index `i`
    Indent,
    /// `line(i)`: line of input index `i`
    Line,
    /// `len(s)`: length of a string or tuple
    Len,
    Min,
    Max,
    /// `int(s)`: parse a decimal integer
    ToInt,
}

impl Builtin {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Indent => "indent",
            Self::Line => "line",
            Self::Len => "len",
            Self::Min => "min",
            Self::Max => "max",
            Self::ToInt => "int",
        }
    }
}

/// An expression of the data-dependent language
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expression {
    Literal(Value),
    Variable(Variable),
    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    Access {
        accessor: Accessor,
        target: Box<Expression>,
    },
    Call {
        function: Builtin,
        arguments: Vec<Expression>,
    },
    Tuple(Vec<Expression>),
    /// The current input index
    Position,
}

impl Expression {
    #[must_use]
    pub fn int(value: i64) -> Self {
        Self::Literal(Value::Int(value))
    }

    #[must_use]
    pub fn bool(value: bool) -> Self {
        Self::Literal(Value::Bool(value))
    }

    #[must_use]
    pub fn string(value: &str) -> Self {
        Self::Literal(Value::from(value))
    }

    #[must_use]
    pub fn var(name: impl Into<CompactString>) -> Self {
        Self::Variable(Variable::named(name))
    }

    #[must_use]
    pub fn binary(op: BinaryOp, lhs: Self, rhs: Self) -> Self {
        Self::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    #[must_use]
    pub fn not(operand: Self) -> Self {
        Self::Unary {
            op: UnaryOp::Not,
            operand: Box::new(operand),
        }
    }

    #[must_use]
    pub fn neg(operand: Self) -> Self {
        Self::Unary {
            op: UnaryOp::Neg,
            operand: Box::new(operand),
        }
    }

    /// `label.lext`
    #[must_use]
    pub fn lext(label: &str) -> Self {
        Self::access(Accessor::Lext, label)
    }

    /// `label.rext`
    #[must_use]
    pub fn rext(label: &str) -> Self {
        Self::access(Accessor::Rext, label)
    }

    /// `label.yield`
    #[must_use]
    pub fn yield_of(label: &str) -> Self {
        Self::access(Accessor::Yield, label)
    }

    /// `label.val`
    #[must_use]
    pub fn val(label: &str) -> Self {
        Self::access(Accessor::Val, label)
    }

    fn access(accessor: Accessor, label: &str) -> Self {
        Self::Access {
            accessor,
            target: Box::new(Self::var(label)),
        }
    }

    #[must_use]
    pub fn call(function: Builtin, arguments: impl IntoIterator<Item = Self>) -> Self {
        Self::Call {
            function,
            arguments: arguments.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn plus(self, rhs: Self) -> Self {
        Self::binary(BinaryOp::Add, self, rhs)
    }

    #[must_use]
    pub fn minus(self, rhs: Self) -> Self {
        Self::binary(BinaryOp::Sub, self, rhs)
    }

    #[must_use]
    pub fn equals(self, rhs: Self) -> Self {
        Self::binary(BinaryOp::Eq, self, rhs)
    }

    #[must_use]
    pub fn lt(self, rhs: Self) -> Self {
        Self::binary(BinaryOp::Lt, self, rhs)
    }

    #[must_use]
    pub fn le(self, rhs: Self) -> Self {
        Self::binary(BinaryOp::Le, self, rhs)
    }

    #[must_use]
    pub fn gt(self, rhs: Self) -> Self {
        Self::binary(BinaryOp::Gt, self, rhs)
    }

    #[must_use]
    pub fn ge(self, rhs: Self) -> Self {
        Self::binary(BinaryOp::Ge, self, rhs)
    }

    #[must_use]
    pub fn and(self, rhs: Self) -> Self {
        Self::binary(BinaryOp::And, self, rhs)
    }

    #[must_use]
    pub fn or(self, rhs: Self) -> Self {
        Self::binary(BinaryOp::Or, self, rhs)
    }
}

impl From<i64> for Expression {
    fn from(value: i64) -> Self {
        Self::int(value)
    }
}

impl From<bool> for Expression {
    fn from(value: bool) -> Self {
        Self::bool(value)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => write!(f, "{value}"),
            Self::Variable(variable) => f.write_str(&variable.name),
            Self::Unary { op, operand } => match op {
                UnaryOp::Not => write!(f, "!{operand}"),
                UnaryOp::Neg => write!(f, "-{operand}"),
            },
            Self::Binary { op, lhs, rhs } => write!(f, "({lhs} {} {rhs})", op.symbol()),
            Self::Access { accessor, target } => {
                let name = match accessor {
                    Accessor::Lext => "lext",
                    Accessor::Rext => "rext",
                    Accessor::Yield => "yield",
                    Accessor::Val => "val",
                };
                write!(f, "{target}.{name}")
            }
            Self::Call {
                function,
                arguments,
            } => {
                write!(f, "{}(", function.name())?;
                write_list(f, arguments)?;
                f.write_str(")")
            }
            Self::Tuple(items) => {
                f.write_str("(")?;
                write_list(f, items)?;
                f.write_str(")")
            }
            Self::Position => f.write_str("$pos"),
        }
    }
}

pub(crate) fn write_list(f: &mut fmt::Formatter<'_>, items: &[Expression]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

/// A statement of a code block
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Statement {
    /// Evaluate for its failure, discarding the value
    Expression(Expression),
    /// Bind a new variable in the innermost scope
    Declare {
        name: CompactString,
        value: Expression,
    },
    /// Update an existing variable
    Assign {
        target: Variable,
        value: Expression,
    },
}

impl Statement {
    #[must_use]
    pub fn declare(name: impl Into<CompactString>, value: Expression) -> Self {
        Self::Declare {
            name: name.into(),
            value,
        }
    }

    #[must_use]
    pub fn assign(name: impl Into<CompactString>, value: Expression) -> Self {
        Self::Assign {
            target: Variable::named(name),
            value,
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expression(expression) => write!(f, "{expression};"),
            Self::Declare { name, value } => write!(f, "var {name} = {value};"),
            Self::Assign { target, value } => write!(f, "{} = {value};", target.name),
        }
    }
}
