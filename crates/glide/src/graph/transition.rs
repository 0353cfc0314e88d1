//! Transitions between grammar slots.

use compact_str::CompactString;

use super::slot::SlotId;
use crate::datadep::{Address, Context, Environment, Expression, Statement, Value};
use crate::error::EvalError;
use crate::grammar::NonterminalId;
use crate::input::Input;
use crate::terminal::{Terminal, TerminalId};

/// Where an SPPF-producing symbol sits in its rule
///
/// Chosen statically by the compiler. It decides how the symbol's node is
/// combined with the node built so far (see
/// [`Sppf::combine`](crate::sppf::Sppf::combine)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Position {
    /// Nothing producing a node can precede the symbol
    First,
    /// The symbol leads to the end of the rule
    Last,
    FirstAndLast,
    Middle,
}

impl Position {
    #[must_use]
    pub const fn classify(first: bool, last: bool) -> Self {
        match (first, last) {
            (true, true) => Self::FirstAndLast,
            (true, false) => Self::First,
            (false, true) => Self::Last,
            (false, false) => Self::Middle,
        }
    }

    #[must_use]
    pub const fn is_last(self) -> bool {
        matches!(self, Self::Last | Self::FirstAndLast)
    }
}

/// A compiled condition
#[derive(Debug, Clone)]
pub enum Guard {
    Expression(Expression),
    Follow(TerminalId),
    NotFollow(TerminalId),
    Precede(TerminalId),
    NotPrecede(TerminalId),
    NotMatch(TerminalId),
    StartOfLine,
    EndOfLine,
    EndOfFile,
}

impl Guard {
    /// Check the guard for a symbol spanning `left..right`
    ///
    /// Preconditions are checked with `left == right`. Expressions see
    /// `right` as the current position.
    ///
    /// # Errors
    ///
    /// Evaluation errors of [`Guard::Expression`].
    pub fn holds(
        &self,
        terminals: &[Terminal],
        input: &Input,
        left: usize,
        right: usize,
        environment: &Environment,
    ) -> Result<bool, EvalError> {
        let terminal = |id: TerminalId| &terminals[id.index()];
        let holds = match self {
            Self::Expression(expression) => {
                return expression.test(&Context::new(input, right, environment));
            }
            Self::Follow(id) => terminal(*id).match_at(input, right).is_some(),
            Self::NotFollow(id) => terminal(*id).match_at(input, right).is_none(),
            Self::Precede(id) => terminal(*id).matches_ending_at(input, left),
            Self::NotPrecede(id) => !terminal(*id).matches_ending_at(input, left),
            Self::NotMatch(id) => terminal(*id).match_at(input, left) != Some(right - left),
            Self::StartOfLine => input.is_start_of_line(left),
            Self::EndOfLine => input.is_end_of_line(right),
            Self::EndOfFile => input.is_end(right),
        };
        Ok(holds)
    }
}

/// Variables a symbol binds when it has been parsed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExitBinding {
    /// Receives the symbol's extent and value
    pub label: Option<Address>,
    /// Receives the value returned by a nonterminal
    pub variable: Option<Address>,
}

impl ExitBinding {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.label.is_none() && self.variable.is_none()
    }

    /// Bind the extent `left..right` and `value`
    ///
    /// # Errors
    ///
    /// [`EvalError::IndexOutOfBounds`] if an address does not exist.
    pub fn apply(
        &self,
        environment: &Environment,
        left: usize,
        right: usize,
        value: &Value,
    ) -> Result<Environment, EvalError> {
        if self.is_empty() {
            return Ok(environment.clone());
        }
        let mut environment = environment.clone();
        if let Some(address) = self.variable {
            environment = environment.assign_at(address, value.clone())?;
        }
        if let Some(address) = self.label {
            environment = environment.assign_at(address, Value::node(left, right, value.clone()))?;
        }
        Ok(environment)
    }
}

/// Matching a terminal
#[derive(Debug, Clone)]
pub struct TerminalTransition {
    pub terminal: TerminalId,
    pub position: Position,
    pub exit: ExitBinding,
    pub preconditions: Vec<Guard>,
    pub postconditions: Vec<Guard>,
}

/// Calling a nonterminal; the destination is the return slot
#[derive(Debug, Clone)]
pub struct CallTransition {
    pub callee: NonterminalId,
    pub arguments: Vec<Expression>,
    pub preconditions: Vec<Guard>,
}

/// What happens at a return slot when a callee pops
#[derive(Debug, Clone)]
pub struct ReturnSite {
    pub position: Position,
    pub exit: ExitBinding,
    pub postconditions: Vec<Guard>,
}

/// Transitions that consume no input and build no node
#[derive(Debug, Clone)]
pub enum EpsilonAction {
    Plain,
    OpenScope,
    CloseScope,
    /// Bind a label to its left extent
    DeclareLabel(CompactString),
    /// Bind a variable to null until the symbol returns
    DeclareVariable(CompactString),
    /// Complete a label bound by [`EpsilonAction::DeclareLabel`]
    CloseLabel(Address),
    /// Check conditions of a control symbol
    ///
    /// With an `extent` the symbol started where the label at that address
    /// starts; without one it is empty at the current position.
    Check {
        guards: Vec<Guard>,
        extent: Option<Address>,
    },
}

#[derive(Debug, Clone)]
pub enum TransitionKind {
    Terminal(TerminalTransition),
    Call(CallTransition),
    Epsilon(EpsilonAction),
    /// Continue at the destination if the condition holds, otherwise at
    /// `otherwise` (or nowhere)
    Conditional {
        condition: Expression,
        otherwise: Option<SlotId>,
    },
    Code(Vec<Statement>),
}

/// An edge of the grammar graph
#[derive(Debug, Clone)]
pub struct Transition {
    pub origin: SlotId,
    pub destination: SlotId,
    pub kind: TransitionKind,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::Pattern;

    #[test]
    fn test_position_classification() {
        assert_eq!(Position::classify(true, true), Position::FirstAndLast);
        assert_eq!(Position::classify(true, false), Position::First);
        assert_eq!(Position::classify(false, true), Position::Last);
        assert_eq!(Position::classify(false, false), Position::Middle);
        assert!(Position::FirstAndLast.is_last());
        assert!(!Position::First.is_last());
    }

    #[test]
    fn test_lexical_guards() {
        let terminals = vec![
            Terminal::compile(&Pattern::from("if"), "T").unwrap(),
            Terminal::compile(&Pattern::Regex("[a-z]".into()), "T").unwrap(),
        ];
        let input = Input::new("if x\nab");
        let env = Environment::empty();
        let check = |guard: Guard, left, right| guard.holds(&terminals, &input, left, right, &env).unwrap();

        assert!(!check(Guard::NotMatch(TerminalId::new(0)), 0, 2));
        assert!(check(Guard::NotMatch(TerminalId::new(0)), 0, 1));
        assert!(check(Guard::Precede(TerminalId::new(0)), 2, 2));
        assert!(check(Guard::NotFollow(TerminalId::new(1)), 0, 2));
        assert!(!check(Guard::NotFollow(TerminalId::new(1)), 0, 1));
        assert!(check(Guard::Follow(TerminalId::new(1)), 3, 3));
        assert!(check(Guard::StartOfLine, 5, 5));
        assert!(!check(Guard::StartOfLine, 6, 6));
        assert!(check(Guard::EndOfLine, 3, 4));
        assert!(check(Guard::EndOfFile, 5, 7));
    }

    #[test]
    fn test_exit_binding_assigns_label_and_variable() {
        let env = Environment::root([("p", Value::Int(0))])
            .declare("x", Value::node_entry(2))
            .declare("v", Value::Null);
        let exit = ExitBinding {
            label: Some(Address::new(0, 1)),
            variable: Some(Address::new(0, 2)),
        };
        let bound = exit.apply(&env, 2, 5, &Value::Int(7)).unwrap();
        assert_eq!(bound.lookup("x"), Some(&Value::node(2, 5, Value::Int(7))));
        assert_eq!(bound.lookup("v"), Some(&Value::Int(7)));
        assert_eq!(ExitBinding::default().apply(&env, 0, 0, &Value::Null), Ok(env));
    }
}
