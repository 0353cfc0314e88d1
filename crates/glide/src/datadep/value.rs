//! Runtime values of the expression language.

use std::fmt;
use std::sync::Arc;

use compact_str::CompactString;

use crate::error::EvalError;

/// A value bound in an environment or passed as an argument
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Str(CompactString),
    /// What a label is bound to: the extent of a parsed symbol and its value
    Node(Arc<NodeValue>),
    Tuple(Arc<[Value]>),
}

/// Extent and result of a labelled symbol
///
/// `right` is `None` between the label's entry and exit bindings, that is
/// while the symbol itself is still being parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeValue {
    pub left: usize,
    pub right: Option<usize>,
    pub value: Value,
}

impl Value {
    /// A label bound at entry, before the symbol is parsed
    #[must_use]
    pub fn node_entry(left: usize) -> Self {
        Self::Node(Arc::new(NodeValue {
            left,
            right: None,
            value: Self::Null,
        }))
    }

    /// A label bound at exit
    #[must_use]
    pub fn node(left: usize, right: usize, value: Self) -> Self {
        Self::Node(Arc::new(NodeValue {
            left,
            right: Some(right),
            value,
        }))
    }

    /// Name of the value's type, for error messages
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Str(_) => "string",
            Self::Node(_) => "node",
            Self::Tuple(_) => "tuple",
        }
    }

    /// # Errors
    ///
    /// [`EvalError::TypeMismatch`] unless the value is an integer.
    pub fn as_int(&self) -> Result<i64, EvalError> {
        match self {
            Self::Int(value) => Ok(*value),
            other => Err(EvalError::type_mismatch("int", other.type_name())),
        }
    }

    /// # Errors
    ///
    /// [`EvalError::TypeMismatch`] unless the value is a boolean.
    pub fn as_bool(&self) -> Result<bool, EvalError> {
        match self {
            Self::Bool(value) => Ok(*value),
            other => Err(EvalError::type_mismatch("bool", other.type_name())),
        }
    }

    /// # Errors
    ///
    /// [`EvalError::TypeMismatch`] unless the value is a string.
    pub fn as_str(&self) -> Result<&str, EvalError> {
        match self {
            Self::Str(value) => Ok(value),
            other => Err(EvalError::type_mismatch("string", other.type_name())),
        }
    }

    /// # Errors
    ///
    /// [`EvalError::TypeMismatch`] unless the value is a label binding.
    pub fn as_node(&self) -> Result<&NodeValue, EvalError> {
        match self {
            Self::Node(node) => Ok(node),
            other => Err(EvalError::type_mismatch("node", other.type_name())),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.into())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Str(value) => write!(f, "{value:?}"),
            Self::Node(node) => match node.right {
                Some(right) => write!(f, "<{}..{}>", node.left, right),
                None => write!(f, "<{}..>", node.left),
            },
            Self::Tuple(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors_report_type() {
        assert_eq!(Value::Int(3).as_int(), Ok(3));
        assert_eq!(
            Value::Bool(true).as_int(),
            Err(EvalError::type_mismatch("int", "bool"))
        );
        assert_eq!(Value::from("x").as_str(), Ok("x"));
        assert!(Value::Null.as_node().is_err());
    }

    #[test]
    fn test_node_values_compare_structurally() {
        assert_eq!(Value::node(1, 3, Value::Null), Value::node(1, 3, Value::Null));
        assert_ne!(Value::node(1, 3, Value::Null), Value::node_entry(1));
        assert_eq!(Value::node_entry(4).to_string(), "<4..>");
    }
}
