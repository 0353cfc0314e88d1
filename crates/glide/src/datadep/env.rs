//! Persistent environments.
//!
//! An environment is a chain of scope frames shared through `Arc`. Each frame
//! stores its bindings inline in a `SmallVec`. Extending an environment copies
//! the innermost frame and links it to the unchanged parents, so every
//! descriptor and GSS edge can keep its own environment without copying the
//! whole chain.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use compact_str::CompactString;
use smallvec::SmallVec;

use super::value::Value;
use crate::error::EvalError;

/// Static location of a variable
///
/// `depth` counts frames outwards from the innermost (0), `index` is the
/// binding's position inside that frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
    pub depth: u32,
    pub index: u32,
}

impl Address {
    #[must_use]
    pub const fn new(depth: u32, index: u32) -> Self {
        Self { depth, index }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Binding {
    name: CompactString,
    value: Value,
}

type Bindings = SmallVec<[Binding; 4]>;

#[derive(Debug)]
struct Frame {
    bindings: Bindings,
    parent: Option<Arc<Frame>>,
    depth: usize,
}

impl Frame {
    fn new(bindings: Bindings, parent: Option<Arc<Self>>) -> Arc<Self> {
        let depth = parent.as_ref().map_or(1, |p| p.depth + 1);
        Arc::new(Self {
            bindings,
            parent,
            depth,
        })
    }
}

/// An immutable, structurally shared variable environment
#[derive(Clone, Default)]
pub struct Environment {
    head: Option<Arc<Frame>>,
}

impl Environment {
    /// An environment with no frames
    #[must_use]
    pub const fn empty() -> Self {
        Self { head: None }
    }

    /// A single frame holding `bindings` in order
    ///
    /// Every rule body starts from one of these, holding its parameters.
    #[must_use]
    pub fn root<N, I>(bindings: I) -> Self
    where
        N: Into<CompactString>,
        I: IntoIterator<Item = (N, Value)>,
    {
        let bindings = bindings
            .into_iter()
            .map(|(name, value)| Binding {
                name: name.into(),
                value,
            })
            .collect();
        Self {
            head: Some(Frame::new(bindings, None)),
        }
    }

    /// Open a new, empty innermost frame
    #[must_use]
    pub fn push_scope(&self) -> Self {
        Self {
            head: Some(Frame::new(Bindings::new(), self.head.clone())),
        }
    }

    /// Drop the innermost frame
    #[must_use]
    pub fn pop_scope(&self) -> Self {
        Self {
            head: self.head.as_ref().and_then(|frame| frame.parent.clone()),
        }
    }

    /// Add a binding to the innermost frame
    ///
    /// A name already bound in the frame is shadowed, not replaced.
    #[must_use]
    pub fn declare(&self, name: impl Into<CompactString>, value: Value) -> Self {
        let binding = Binding {
            name: name.into(),
            value,
        };
        let (mut bindings, parent) = match &self.head {
            Some(frame) => (frame.bindings.clone(), frame.parent.clone()),
            None => (Bindings::new(), None),
        };
        bindings.push(binding);
        Self {
            head: Some(Frame::new(bindings, parent)),
        }
    }

    /// Replace the value at a resolved address
    ///
    /// Frames between the innermost one and the target are copied; the frames
    /// outside the target stay shared.
    ///
    /// # Errors
    ///
    /// [`EvalError::IndexOutOfBounds`] when the address does not exist.
    pub fn assign_at(&self, address: Address, value: Value) -> Result<Self, EvalError> {
        let mut above = Vec::with_capacity(address.depth as usize);
        let mut current = self.head.as_ref();
        for _ in 0..address.depth {
            let frame = current.ok_or(EvalError::IndexOutOfBounds {
                index: address.depth as usize,
                len: self.frame_count(),
            })?;
            above.push(frame);
            current = frame.parent.as_ref();
        }
        let target = current.ok_or(EvalError::IndexOutOfBounds {
            index: address.depth as usize,
            len: self.frame_count(),
        })?;

        let mut bindings = target.bindings.clone();
        let len = bindings.len();
        let binding = bindings
            .get_mut(address.index as usize)
            .ok_or(EvalError::IndexOutOfBounds {
                index: address.index as usize,
                len,
            })?;
        binding.value = value;

        let mut rebuilt = Frame::new(bindings, target.parent.clone());
        for frame in above.into_iter().rev() {
            rebuilt = Frame::new(frame.bindings.clone(), Some(rebuilt));
        }
        Ok(Self {
            head: Some(rebuilt),
        })
    }

    /// Replace the value of the innermost binding called `name`
    ///
    /// # Errors
    ///
    /// [`EvalError::UnboundVariable`] when no frame binds `name`.
    pub fn assign(&self, name: &str, value: Value) -> Result<Self, EvalError> {
        let address = self.address_of(name).ok_or_else(|| EvalError::unbound(name))?;
        self.assign_at(address, value)
    }

    /// Value of the innermost binding called `name`
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.frames().find_map(|frame| {
            frame
                .bindings
                .iter()
                .rev()
                .find(|binding| binding.name == name)
                .map(|binding| &binding.value)
        })
    }

    /// Value at a resolved address
    #[must_use]
    pub fn lookup_at(&self, address: Address) -> Option<&Value> {
        self.frames()
            .nth(address.depth as usize)?
            .bindings
            .get(address.index as usize)
            .map(|binding| &binding.value)
    }

    /// Address of the innermost binding called `name`
    #[must_use]
    pub fn address_of(&self, name: &str) -> Option<Address> {
        self.frames().enumerate().find_map(|(depth, frame)| {
            frame
                .bindings
                .iter()
                .rposition(|binding| binding.name == name)
                .map(|index| Address::new(depth as u32, index as u32))
        })
    }

    /// Number of frames
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.head.as_ref().map_or(0, |frame| frame.depth)
    }

    /// Number of bindings across all frames
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames().map(|frame| frame.bindings.len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bindings from the innermost frame outwards, latest first
    pub fn bindings(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.frames().flat_map(|frame| {
            frame
                .bindings
                .iter()
                .rev()
                .map(|binding| (binding.name.as_str(), &binding.value))
        })
    }

    fn frames(&self) -> Frames<'_> {
        Frames {
            current: self.head.as_ref(),
        }
    }
}

struct Frames<'a> {
    current: Option<&'a Arc<Frame>>,
}

impl<'a> Iterator for Frames<'a> {
    type Item = &'a Frame;

    fn next(&mut self) -> Option<Self::Item> {
        let frame = self.current?;
        self.current = frame.parent.as_ref();
        Some(frame)
    }
}

impl PartialEq for Environment {
    fn eq(&self, other: &Self) -> bool {
        let (mut a, mut b) = (self.head.as_ref(), other.head.as_ref());
        loop {
            match (a, b) {
                (None, None) => return true,
                (Some(x), Some(y)) => {
                    if Arc::ptr_eq(x, y) {
                        return true;
                    }
                    if x.depth != y.depth || x.bindings != y.bindings {
                        return false;
                    }
                    a = x.parent.as_ref();
                    b = y.parent.as_ref();
                }
                _ => return false,
            }
        }
    }
}

impl Eq for Environment {}

impl Hash for Environment {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.frame_count().hash(state);
        for frame in self.frames() {
            frame.bindings.len().hash(state);
            for binding in &frame.bindings {
                binding.hash(state);
            }
        }
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.frames().map(|frame| {
                frame
                    .bindings
                    .iter()
                    .map(|binding| (binding.name.as_str(), &binding.value))
                    .collect::<Vec<_>>()
            }))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::hash::BuildHasher;

    fn hash_of(env: &Environment) -> u64 {
        ahash::RandomState::with_seeds(1, 2, 3, 4).hash_one(env)
    }

    #[test]
    fn test_declare_does_not_mutate() {
        let base = Environment::root([("l", Value::Int(0))]);
        let extended = base.declare("x", Value::Int(1));
        assert_eq!(base.lookup("x"), None);
        assert_eq!(extended.lookup("x"), Some(&Value::Int(1)));
        assert_eq!(extended.lookup("l"), Some(&Value::Int(0)));
        assert_eq!(base.len(), 1);
        assert_eq!(extended.len(), 2);
    }

    #[test]
    fn test_scopes_shadow_and_pop() {
        let env = Environment::root([("x", Value::Int(1))])
            .push_scope()
            .declare("x", Value::Int(2));
        assert_eq!(env.lookup("x"), Some(&Value::Int(2)));
        assert_eq!(env.address_of("x"), Some(Address::new(0, 0)));
        let outer = env.pop_scope();
        assert_eq!(outer.lookup("x"), Some(&Value::Int(1)));
        assert_eq!(outer.frame_count(), 1);
    }

    #[test]
    fn test_assign_copies_path_only() {
        let base = Environment::root([("n", Value::Int(3))]).push_scope();
        let updated = base.assign("n", Value::Int(2)).unwrap();
        assert_eq!(base.lookup("n"), Some(&Value::Int(3)));
        assert_eq!(updated.lookup("n"), Some(&Value::Int(2)));
        assert_eq!(updated.frame_count(), 2);
        assert_eq!(updated.lookup_at(Address::new(1, 0)), Some(&Value::Int(2)));
    }

    #[test]
    fn test_assign_errors() {
        let env = Environment::root([("a", Value::Null)]);
        assert_eq!(
            env.assign("b", Value::Null),
            Err(EvalError::unbound("b"))
        );
        assert!(env.assign_at(Address::new(0, 5), Value::Null).is_err());
        assert!(env.assign_at(Address::new(3, 0), Value::Null).is_err());
    }

    #[test]
    fn test_structural_equality_and_hash() {
        let a = Environment::root([("x", Value::Int(1))]).declare("y", Value::Bool(true));
        let b = Environment::root([("x", Value::Int(1))]).declare("y", Value::Bool(true));
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));

        let c = a.assign("y", Value::Bool(false)).unwrap();
        assert_ne!(a, c);
        assert_ne!(a, a.push_scope());
        assert_eq!(Environment::empty(), Environment::default());
    }

    #[test]
    fn test_many_bindings_spill() {
        let mut env = Environment::root(std::iter::empty::<(&str, Value)>());
        for i in 0..10 {
            env = env.declare(format!("v{i}"), Value::Int(i));
        }
        assert_eq!(env.len(), 10);
        assert_eq!(env.lookup("v7"), Some(&Value::Int(7)));
        assert_eq!(env.lookup_at(Address::new(0, 9)), Some(&Value::Int(9)));
    }
}
