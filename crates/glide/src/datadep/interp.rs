//! Tree-walking interpreter for expressions and statements.

use std::sync::Arc;

use super::env::{Address, Environment};
use super::expr::{Accessor, BinaryOp, Builtin, Expression, Statement, UnaryOp, Variable};
use super::value::{NodeValue, Value};
use crate::error::EvalError;
use crate::input::Input;

/// What an expression can observe while it is evaluated
pub trait EvalContext {
    fn input(&self) -> &Input;

    /// The current input index
    fn position(&self) -> usize;

    fn environment(&self) -> &Environment;

    fn lookup(&self, name: &str) -> Option<&Value> {
        self.environment().lookup(name)
    }

    fn lookup_at(&self, address: Address) -> Option<&Value> {
        self.environment().lookup_at(address)
    }
}

/// The evaluation context used by the parser
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    input: &'a Input,
    position: usize,
    environment: &'a Environment,
}

impl<'a> Context<'a> {
    #[must_use]
    pub const fn new(input: &'a Input, position: usize, environment: &'a Environment) -> Self {
        Self {
            input,
            position,
            environment,
        }
    }
}

impl EvalContext for Context<'_> {
    fn input(&self) -> &Input {
        self.input
    }

    fn position(&self) -> usize {
        self.position
    }

    fn environment(&self) -> &Environment {
        self.environment
    }
}

impl Expression {
    /// Evaluate against a context
    ///
    /// # Errors
    ///
    /// Any [`EvalError`]; the parser drops the enclosing transition.
    pub fn interpret<C: EvalContext + ?Sized>(&self, ctx: &C) -> Result<Value, EvalError> {
        match self {
            Self::Literal(value) => Ok(value.clone()),
            Self::Variable(variable) => lookup(ctx, variable),
            Self::Unary { op, operand } => {
                let value = operand.interpret(ctx)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!value.as_bool()?)),
                    UnaryOp::Neg => Ok(Value::Int(value.as_int()?.wrapping_neg())),
                }
            }
            Self::Binary { op, lhs, rhs } => binary(ctx, *op, lhs, rhs),
            Self::Access { accessor, target } => {
                let target = target.interpret(ctx)?;
                access(ctx, *accessor, target.as_node()?)
            }
            Self::Call {
                function,
                arguments,
            } => {
                let arguments = arguments
                    .iter()
                    .map(|argument| argument.interpret(ctx))
                    .collect::<Result<Vec<_>, _>>()?;
                call(ctx, *function, &arguments)
            }
            Self::Tuple(items) => {
                let items = items
                    .iter()
                    .map(|item| item.interpret(ctx))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Tuple(Arc::from(items)))
            }
            Self::Position => Ok(Value::Int(ctx.position() as i64)),
        }
    }

    /// Evaluate to a boolean
    ///
    /// # Errors
    ///
    /// [`EvalError::TypeMismatch`] for non-boolean results, plus any
    /// evaluation error.
    pub fn test<C: EvalContext + ?Sized>(&self, ctx: &C) -> Result<bool, EvalError> {
        self.interpret(ctx)?.as_bool()
    }
}

impl Statement {
    /// Execute, returning the environment the statement produces
    ///
    /// # Errors
    ///
    /// Any [`EvalError`] raised by the right-hand side or the assignment.
    pub fn execute<C: EvalContext + ?Sized>(&self, ctx: &C) -> Result<Environment, EvalError> {
        let env = ctx.environment();
        match self {
            Self::Expression(expression) => {
                expression.interpret(ctx)?;
                Ok(env.clone())
            }
            Self::Declare { name, value } => Ok(env.declare(name.clone(), value.interpret(ctx)?)),
            Self::Assign { target, value } => {
                let value = value.interpret(ctx)?;
                match target.address {
                    Some(address) => env.assign_at(address, value),
                    None => env.assign(&target.name, value),
                }
            }
        }
    }
}

/// Run statements in order, threading the environment through
///
/// # Errors
///
/// The first [`EvalError`]; earlier effects are discarded with it.
pub fn execute_all(
    statements: &[Statement],
    input: &Input,
    position: usize,
    environment: &Environment,
) -> Result<Environment, EvalError> {
    let mut env = environment.clone();
    for statement in statements {
        env = statement.execute(&Context::new(input, position, &env))?;
    }
    Ok(env)
}

fn lookup<C: EvalContext + ?Sized>(ctx: &C, variable: &Variable) -> Result<Value, EvalError> {
    let value = match variable.address {
        Some(address) => ctx.lookup_at(address),
        None => ctx.lookup(&variable.name),
    };
    value
        .cloned()
        .ok_or_else(|| EvalError::unbound(variable.name.clone()))
}

fn binary<C: EvalContext + ?Sized>(
    ctx: &C,
    op: BinaryOp,
    lhs: &Expression,
    rhs: &Expression,
) -> Result<Value, EvalError> {
    let operands = || -> Result<(Value, Value), EvalError> {
        Ok((lhs.interpret(ctx)?, rhs.interpret(ctx)?))
    };
    let integers = || -> Result<(i64, i64), EvalError> {
        let (a, b) = operands()?;
        Ok((a.as_int()?, b.as_int()?))
    };

    let value = match op {
        BinaryOp::And => Value::Bool(lhs.test(ctx)? && rhs.test(ctx)?),
        BinaryOp::Or => Value::Bool(lhs.test(ctx)? || rhs.test(ctx)?),
        BinaryOp::Eq => {
            let (a, b) = operands()?;
            Value::Bool(a == b)
        }
        BinaryOp::Ne => {
            let (a, b) = operands()?;
            Value::Bool(a != b)
        }
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let (a, b) = operands()?;
            let ordering = match (&a, &b) {
                (Value::Int(x), Value::Int(y)) => x.cmp(y),
                (Value::Str(x), Value::Str(y)) => x.cmp(y),
                _ => return Err(EvalError::type_mismatch(a.type_name(), b.type_name())),
            };
            Value::Bool(match op {
                BinaryOp::Lt => ordering.is_lt(),
                BinaryOp::Le => ordering.is_le(),
                BinaryOp::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            })
        }
        BinaryOp::Add => match operands()? {
            (Value::Str(mut a), Value::Str(b)) => {
                a.push_str(&b);
                Value::Str(a)
            }
            (a, b) => Value::Int(a.as_int()?.wrapping_add(b.as_int()?)),
        },
        BinaryOp::Sub => {
            let (a, b) = integers()?;
            Value::Int(a.wrapping_sub(b))
        }
        BinaryOp::Mul => {
            let (a, b) = integers()?;
            Value::Int(a.wrapping_mul(b))
        }
        BinaryOp::Div | BinaryOp::Rem => {
            let (a, b) = integers()?;
            if b == 0 {
                return Err(EvalError::DivisionByZero);
            }
            Value::Int(if op == BinaryOp::Div {
                a.wrapping_div(b)
            } else {
                a.wrapping_rem(b)
            })
        }
    };
    Ok(value)
}

fn access<C: EvalContext + ?Sized>(
    ctx: &C,
    accessor: Accessor,
    node: &NodeValue,
) -> Result<Value, EvalError> {
    let right = || {
        node.right
            .ok_or(EvalError::type_mismatch("complete node", "open node"))
    };
    match accessor {
        Accessor::Lext => Ok(Value::Int(node.left as i64)),
        Accessor::Rext => Ok(Value::Int(right()? as i64)),
        Accessor::Yield => Ok(Value::from(ctx.input().slice(node.left, right()?))),
        Accessor::Val => Ok(node.value.clone()),
    }
}

fn call<C: EvalContext + ?Sized>(
    ctx: &C,
    function: Builtin,
    arguments: &[Value],
) -> Result<Value, EvalError> {
    let exactly_one = || match arguments {
        [argument] => Ok(argument),
        _ => Err(EvalError::BadArity {
            function: function.name(),
            expected: 1,
            found: arguments.len(),
        }),
    };
    let input_index = |value: &Value| -> Result<usize, EvalError> {
        let index = value.as_int()?;
        let len = ctx.input().len();
        usize::try_from(index)
            .ok()
            .filter(|&index| index <= len)
            .ok_or(EvalError::IndexOutOfBounds {
                index: index.max(0) as usize,
                len,
            })
    };

    match function {
        Builtin::Indent => {
            let index = input_index(exactly_one()?)?;
            Ok(Value::Int(i64::from(ctx.input().column(index))))
        }
        Builtin::Line => {
            let index = input_index(exactly_one()?)?;
            Ok(Value::Int(i64::from(ctx.input().line(index))))
        }
        Builtin::Len => match exactly_one()? {
            Value::Str(text) => Ok(Value::Int(text.chars().count() as i64)),
            Value::Tuple(items) => Ok(Value::Int(items.len() as i64)),
            Value::Node(node) => {
                let right = node
                    .right
                    .ok_or(EvalError::type_mismatch("complete node", "open node"))?;
                Ok(Value::Int((right - node.left) as i64))
            }
            other => Err(EvalError::type_mismatch("string", other.type_name())),
        },
        Builtin::Min | Builtin::Max => {
            let mut values = arguments.iter().map(Value::as_int);
            let first = values.next().ok_or(EvalError::BadArity {
                function: function.name(),
                expected: 1,
                found: 0,
            })??;
            values.try_fold(first, |acc, value| -> Result<i64, EvalError> {
                let value = value?;
                Ok(if function == Builtin::Min {
                    acc.min(value)
                } else {
                    acc.max(value)
                })
            })
            .map(Value::Int)
        }
        Builtin::ToInt => {
            let text = exactly_one()?.as_str()?;
            text.trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| EvalError::type_mismatch("integer literal", "string"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(expression: &Expression, env: &Environment) -> Result<Value, EvalError> {
        let input = Input::new("ab\n  cd");
        expression.interpret(&Context::new(&input, 5, env))
    }

    #[test]
    fn test_arithmetic_and_comparison() {
        let env = Environment::root([("l", Value::Int(2)), ("r", Value::Int(0))]);
        let expr = Expression::int(3)
            .ge(Expression::var("l"))
            .and(Expression::int(3).ge(Expression::var("r")));
        assert_eq!(eval(&expr, &env), Ok(Value::Bool(true)));

        let sum = Expression::var("l").plus(Expression::int(40));
        assert_eq!(eval(&sum, &env), Ok(Value::Int(42)));
        assert_eq!(
            eval(&Expression::neg(Expression::var("l")), &env),
            Ok(Value::Int(-2))
        );
    }

    #[test]
    fn test_short_circuit_skips_errors() {
        let env = Environment::empty();
        let expr = Expression::bool(false).and(Expression::var("missing"));
        assert_eq!(eval(&expr, &env), Ok(Value::Bool(false)));
        let expr = Expression::bool(true).or(Expression::var("missing"));
        assert_eq!(eval(&expr, &env), Ok(Value::Bool(true)));
        let expr = Expression::bool(true).and(Expression::var("missing"));
        assert_eq!(eval(&expr, &env), Err(EvalError::unbound("missing")));
    }

    #[test]
    fn test_type_mismatch_and_division() {
        let env = Environment::empty();
        let expr = Expression::int(1).plus(Expression::bool(true));
        assert_eq!(
            eval(&expr, &env),
            Err(EvalError::type_mismatch("int", "bool"))
        );
        let expr = Expression::binary(BinaryOp::Div, 1.into(), 0.into());
        assert_eq!(eval(&expr, &env), Err(EvalError::DivisionByZero));
        let expr = Expression::int(1).lt(Expression::string("x"));
        assert!(eval(&expr, &env).is_err());
    }

    #[test]
    fn test_label_accessors() {
        let env = Environment::root([("x", Value::node(5, 7, Value::Int(9)))]);
        assert_eq!(eval(&Expression::lext("x"), &env), Ok(Value::Int(5)));
        assert_eq!(eval(&Expression::rext("x"), &env), Ok(Value::Int(7)));
        assert_eq!(eval(&Expression::yield_of("x"), &env), Ok(Value::from("cd")));
        assert_eq!(eval(&Expression::val("x"), &env), Ok(Value::Int(9)));

        let open = Environment::root([("x", Value::node_entry(5))]);
        assert_eq!(eval(&Expression::lext("x"), &open), Ok(Value::Int(5)));
        assert!(eval(&Expression::rext("x"), &open).is_err());
    }

    #[test]
    fn test_builtins() {
        let env = Environment::root([("x", Value::node(5, 7, Value::Null))]);
        let indent = Expression::call(Builtin::Indent, [Expression::lext("x")]);
        assert_eq!(eval(&indent, &env), Ok(Value::Int(2)));
        let line = Expression::call(Builtin::Line, [Expression::Position]);
        assert_eq!(eval(&line, &env), Ok(Value::Int(1)));
        let len = Expression::call(Builtin::Len, [Expression::yield_of("x")]);
        assert_eq!(eval(&len, &env), Ok(Value::Int(2)));
        let min = Expression::call(Builtin::Min, [3.into(), 1.into(), 2.into()]);
        assert_eq!(eval(&min, &env), Ok(Value::Int(1)));
        let max = Expression::call(Builtin::Max, [3.into(), 7.into()]);
        assert_eq!(eval(&max, &env), Ok(Value::Int(7)));
        let int = Expression::call(Builtin::ToInt, [Expression::string("12")]);
        assert_eq!(eval(&int, &env), Ok(Value::Int(12)));
        let bad = Expression::call(Builtin::Indent, []);
        assert!(matches!(eval(&bad, &env), Err(EvalError::BadArity { .. })));
        let out = Expression::call(Builtin::Indent, [100.into()]);
        assert!(matches!(eval(&out, &env), Err(EvalError::IndexOutOfBounds { .. })));
    }

    #[test]
    fn test_statements_thread_environment() {
        let input = Input::new("");
        let env = Environment::root([("n", Value::Int(3))]);
        let statements = [
            Statement::declare("m", Expression::var("n").plus(1.into())),
            Statement::assign("n", Expression::var("m").plus(Expression::var("n"))),
            Statement::Expression(Expression::var("n")),
        ];
        let result = execute_all(&statements, &input, 0, &env).unwrap();
        assert_eq!(result.lookup("n"), Some(&Value::Int(7)));
        assert_eq!(result.lookup("m"), Some(&Value::Int(4)));
        assert_eq!(env.lookup("n"), Some(&Value::Int(3)));

        let failing = [Statement::assign("zz", 1.into())];
        assert!(execute_all(&failing, &input, 0, &env).is_err());
    }
}
