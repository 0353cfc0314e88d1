//! Static name resolution.
//!
//! The graph compiler walks each rule body with a [`Scopes`] tracker that
//! mirrors, frame for frame, the environments the parser builds at runtime.
//! Every variable reference is rewritten to its `(depth, index)` address so
//! evaluation never searches by name. A name that is not in scope is a
//! compile-time [`GrammarError::UndeclaredVariable`].

use compact_str::CompactString;

use super::env::Address;
use super::expr::{Expression, Statement, Variable};
use crate::error::GrammarError;

/// Names in scope at one point of a rule body, innermost frame last
#[derive(Debug, Clone)]
pub struct Scopes {
    frames: Vec<Vec<CompactString>>,
    nonterminal: CompactString,
}

impl Scopes {
    /// Scopes of a rule body: one frame holding the parameters
    #[must_use]
    pub fn new<I>(nonterminal: &str, parameters: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<CompactString>,
    {
        Self {
            frames: vec![parameters.into_iter().map(Into::into).collect()],
            nonterminal: nonterminal.into(),
        }
    }

    pub fn push(&mut self) {
        self.frames.push(Vec::new());
    }

    pub fn pop(&mut self) {
        self.frames.pop();
    }

    /// Bind `name` in the innermost frame, returning its address there
    pub fn declare(&mut self, name: &str) -> Address {
        if self.frames.is_empty() {
            self.frames.push(Vec::new());
        }
        let innermost = self.frames.len() - 1;
        let frame = &mut self.frames[innermost];
        frame.push(name.into());
        Address::new(0, (frame.len() - 1) as u32)
    }

    /// Address of the innermost binding called `name`
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<Address> {
        self.frames
            .iter()
            .rev()
            .enumerate()
            .find_map(|(depth, frame)| {
                frame
                    .iter()
                    .rposition(|bound| bound == name)
                    .map(|index| Address::new(depth as u32, index as u32))
            })
    }

    /// Number of open frames
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    fn undeclared(&self, name: &str) -> GrammarError {
        GrammarError::UndeclaredVariable {
            name: name.into(),
            nonterminal: self.nonterminal.clone(),
        }
    }

    fn variable(&self, variable: &Variable) -> Result<Variable, GrammarError> {
        let address = self
            .resolve(&variable.name)
            .ok_or_else(|| self.undeclared(&variable.name))?;
        Ok(Variable {
            name: variable.name.clone(),
            address: Some(address),
        })
    }

    /// Rewrite every variable reference of `expression` to its address
    ///
    /// # Errors
    ///
    /// [`GrammarError::UndeclaredVariable`] for a name not in scope.
    pub fn resolve_expression(&self, expression: &Expression) -> Result<Expression, GrammarError> {
        let resolved = match expression {
            Expression::Literal(_) | Expression::Position => expression.clone(),
            Expression::Variable(variable) => Expression::Variable(self.variable(variable)?),
            Expression::Unary { op, operand } => Expression::Unary {
                op: *op,
                operand: Box::new(self.resolve_expression(operand)?),
            },
            Expression::Binary { op, lhs, rhs } => Expression::Binary {
                op: *op,
                lhs: Box::new(self.resolve_expression(lhs)?),
                rhs: Box::new(self.resolve_expression(rhs)?),
            },
            Expression::Access { accessor, target } => Expression::Access {
                accessor: *accessor,
                target: Box::new(self.resolve_expression(target)?),
            },
            Expression::Call {
                function,
                arguments,
            } => Expression::Call {
                function: *function,
                arguments: self.resolve_all(arguments)?,
            },
            Expression::Tuple(items) => Expression::Tuple(self.resolve_all(items)?),
        };
        Ok(resolved)
    }

    /// Resolve a list of expressions
    ///
    /// # Errors
    ///
    /// The first [`GrammarError::UndeclaredVariable`].
    pub fn resolve_all(&self, expressions: &[Expression]) -> Result<Vec<Expression>, GrammarError> {
        expressions
            .iter()
            .map(|expression| self.resolve_expression(expression))
            .collect()
    }

    /// Resolve a statement; a declaration extends the innermost frame
    ///
    /// The right-hand side of `var x = e` is resolved before `x` is bound.
    ///
    /// # Errors
    ///
    /// [`GrammarError::UndeclaredVariable`] for a name not in scope.
    pub fn resolve_statement(&mut self, statement: &Statement) -> Result<Statement, GrammarError> {
        let resolved = match statement {
            Statement::Expression(expression) => {
                Statement::Expression(self.resolve_expression(expression)?)
            }
            Statement::Declare { name, value } => {
                let value = self.resolve_expression(value)?;
                self.declare(name);
                Statement::Declare {
                    name: name.clone(),
                    value,
                }
            }
            Statement::Assign { target, value } => Statement::Assign {
                target: self.variable(target)?,
                value: self.resolve_expression(value)?,
            },
        };
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datadep::env::Environment;
    use crate::datadep::interp::{Context, execute_all};
    use crate::datadep::value::Value;
    use crate::input::Input;

    #[test]
    fn test_addresses_match_runtime_layout() {
        let mut scopes = Scopes::new("E", ["l", "r"]);
        scopes.push();
        let x = scopes.declare("x");
        assert_eq!(x, Address::new(0, 0));
        assert_eq!(scopes.resolve("l"), Some(Address::new(1, 0)));
        assert_eq!(scopes.resolve("r"), Some(Address::new(1, 1)));

        let env = Environment::root([("l", Value::Int(1)), ("r", Value::Int(2))])
            .push_scope()
            .declare("x", Value::Int(3));
        assert_eq!(env.lookup_at(scopes.resolve("r").unwrap()), Some(&Value::Int(2)));
        assert_eq!(env.lookup_at(x), Some(&Value::Int(3)));
    }

    #[test]
    fn test_shadowing_resolves_innermost() {
        let mut scopes = Scopes::new("S", ["n"]);
        scopes.push();
        scopes.declare("n");
        assert_eq!(scopes.resolve("n"), Some(Address::new(0, 0)));
        scopes.pop();
        assert_eq!(scopes.resolve("n"), Some(Address::new(0, 0)));
        assert_eq!(scopes.depth(), 1);
    }

    #[test]
    fn test_undeclared_variable() {
        let scopes = Scopes::new("S", Vec::<&str>::new());
        let error = scopes
            .resolve_expression(&Expression::var("y").plus(1.into()))
            .unwrap_err();
        assert_eq!(
            error,
            GrammarError::UndeclaredVariable {
                name: "y".into(),
                nonterminal: "S".into()
            }
        );
    }

    #[test]
    fn test_declared_statement_rhs_sees_outer_binding() {
        let mut scopes = Scopes::new("S", ["n"]);
        let statements = [
            Statement::declare("n", Expression::var("n").plus(1.into())),
            Statement::assign("n", Expression::var("n").plus(10.into())),
        ];
        let resolved: Vec<_> = statements
            .iter()
            .map(|statement| scopes.resolve_statement(statement))
            .collect::<Result<_, _>>()
            .unwrap();

        let input = Input::new("");
        let env = Environment::root([("n", Value::Int(1))]);
        let result = execute_all(&resolved, &input, 0, &env).unwrap();
        let ctx = Context::new(&input, 0, &result);
        assert_eq!(
            Expression::var("n").interpret(&ctx),
            Ok(Value::Int(12))
        );
        assert_eq!(result.lookup_at(Address::new(0, 0)), Some(&Value::Int(1)));
    }
}
