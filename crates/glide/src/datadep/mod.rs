//! # Data-Dependent Evaluation
//!
//! The expression language that lets a grammar inspect and steer its own
//! parse: label accessors, arithmetic, comparisons and a handful of
//! built-ins, evaluated against persistent scoped environments.
//!
//! - [`value`]: runtime values, including label bindings
//! - [`env`]: persistent environments of scope frames
//! - [`expr`]: expression and statement trees
//! - [`interp`]: the interpreter and the [`EvalContext`](interp::EvalContext) seam
//! - [`resolve`]: the static pass turning names into environment addresses

pub mod env;
pub mod expr;
pub mod interp;
pub mod resolve;
pub mod value;

pub use env::{Address, Environment};
pub use expr::{Accessor, BinaryOp, Builtin, Expression, Statement, UnaryOp, Variable};
pub use interp::{Context, EvalContext, execute_all};
pub use resolve::Scopes;
pub use value::{NodeValue, Value};
