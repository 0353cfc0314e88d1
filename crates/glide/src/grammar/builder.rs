use std::fmt;

use compact_str::CompactString;
use lasso::{Key, Rodeo};
use smallvec::SmallVec;

use super::symbol::{Rule, Symbol, write_sequence};
use super::validate::validate_grammar;
use crate::error::GrammarError;

/// Dense identifier of a nonterminal, in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct NonterminalId(u32);

impl NonterminalId {
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index as u32)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A nonterminal with its parameters and alternatives
#[derive(Debug, Clone)]
pub struct NonterminalDecl {
    pub name: CompactString,
    pub parameters: SmallVec<[CompactString; 2]>,
    pub rules: Vec<Rule>,
}

impl NonterminalDecl {
    #[must_use]
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }
}

/// An immutable grammar: nonterminals, their rules and a start symbol
///
/// Nonterminal names are interned; ids follow declaration order.
///
/// # Example
///
/// ```rust
/// use glide::grammar::{Grammar, Symbol};
///
/// let grammar = Grammar::builder()
///     .start("S")
///     .rule("S", [Symbol::nonterminal("S"), Symbol::literal("a")])
///     .rule("S", [Symbol::literal("a")])
///     .build()
///     .expect("valid grammar");
/// assert_eq!(grammar.nonterminal_count(), 1);
/// ```
#[derive(Clone)]
pub struct Grammar {
    nonterminals: Vec<NonterminalDecl>,
    interner: Rodeo,
    start: NonterminalId,
}

impl Grammar {
    #[must_use]
    pub fn builder() -> GrammarBuilder {
        GrammarBuilder::new()
    }

    #[must_use]
    pub const fn start(&self) -> NonterminalId {
        self.start
    }

    /// Look up a nonterminal by name
    #[must_use]
    pub fn nonterminal_id(&self, name: &str) -> Option<NonterminalId> {
        self.interner
            .get(name)
            .map(|key| NonterminalId::new(key.into_usize()))
    }

    #[must_use]
    pub fn nonterminal(&self, id: NonterminalId) -> &NonterminalDecl {
        &self.nonterminals[id.index()]
    }

    #[must_use]
    pub fn name(&self, id: NonterminalId) -> &str {
        &self.nonterminals[id.index()].name
    }

    #[must_use]
    pub fn nonterminal_count(&self) -> usize {
        self.nonterminals.len()
    }

    /// All nonterminals with their ids
    pub fn nonterminals(&self) -> impl Iterator<Item = (NonterminalId, &NonterminalDecl)> {
        self.nonterminals
            .iter()
            .enumerate()
            .map(|(index, decl)| (NonterminalId::new(index), decl))
    }

    /// Total number of alternatives
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.nonterminals.iter().map(|decl| decl.rules.len()).sum()
    }
}

impl fmt::Debug for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grammar")
            .field("start", &self.name(self.start))
            .field("nonterminals", &self.nonterminals.len())
            .field("rules", &self.rule_count())
            .finish()
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for decl in &self.nonterminals {
            f.write_str(&decl.name)?;
            if !decl.parameters.is_empty() {
                write!(f, "({})", decl.parameters.join(", "))?;
            }
            f.write_str(" ::=")?;
            for (i, rule) in decl.rules.iter().enumerate() {
                if i > 0 {
                    f.write_str("\n    |")?;
                }
                if rule.body.is_empty() {
                    f.write_str(" ε")?;
                } else {
                    f.write_str(" ")?;
                    write_sequence(f, &rule.body)?;
                }
                if let Some(returns) = &rule.returns {
                    write!(f, " {{ return {returns}; }}")?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Builder for [`Grammar`]
pub struct GrammarBuilder {
    interner: Rodeo,
    nonterminals: Vec<NonterminalDecl>,
    start: Option<CompactString>,
    errors: Vec<GrammarError>,
}

impl Default for GrammarBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GrammarBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            interner: Rodeo::default(),
            nonterminals: Vec::new(),
            start: None,
            errors: Vec::new(),
        }
    }

    fn declare(&mut self, name: &str) -> usize {
        let index = self.interner.get_or_intern(name).into_usize();
        if index == self.nonterminals.len() {
            self.nonterminals.push(NonterminalDecl {
                name: name.into(),
                parameters: SmallVec::new(),
                rules: Vec::new(),
            });
        }
        index
    }

    /// Set the start symbol
    #[must_use]
    pub fn start(mut self, name: &str) -> Self {
        self.start = Some(name.into());
        self
    }

    /// Declare the parameters of a nonterminal, in order
    #[must_use]
    pub fn parameters<'a>(mut self, name: &str, parameters: impl IntoIterator<Item = &'a str>) -> Self {
        let index = self.declare(name);
        let mut declared: SmallVec<[CompactString; 2]> = SmallVec::new();
        for parameter in parameters {
            if declared.iter().any(|existing| existing == parameter) {
                self.errors.push(GrammarError::DuplicateParameter {
                    nonterminal: name.into(),
                    parameter: parameter.into(),
                });
            }
            declared.push(parameter.into());
        }
        self.nonterminals[index].parameters = declared;
        self
    }

    /// Add an alternative from a sequence of symbols
    #[must_use]
    pub fn rule(self, name: &str, body: impl IntoIterator<Item = Symbol>) -> Self {
        self.add_rule(name, Rule::new(body))
    }

    /// Add an alternative
    #[must_use]
    pub fn add_rule(mut self, name: &str, rule: Rule) -> Self {
        let index = self.declare(name);
        self.nonterminals[index].rules.push(rule);
        self
    }

    /// Validate and build the grammar
    ///
    /// # Errors
    ///
    /// [`GrammarError::MissingStartSymbol`] when no (defined) start symbol
    /// is set, [`GrammarError::DuplicateParameter`] and
    /// [`GrammarError::UndefinedNonterminal`] for malformed declarations.
    pub fn build(self) -> Result<Grammar, GrammarError> {
        if let Some(error) = self.errors.into_iter().next() {
            return Err(error);
        }
        let start = self
            .start
            .as_deref()
            .and_then(|name| self.interner.get(name))
            .map(|key| NonterminalId::new(key.into_usize()))
            .ok_or(GrammarError::MissingStartSymbol)?;

        let grammar = Grammar {
            nonterminals: self.nonterminals,
            interner: self.interner,
            start,
        };
        validate_grammar(&grammar)?;
        Ok(grammar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datadep::expr::Expression;

    #[test]
    fn test_ids_follow_declaration_order() {
        let grammar = Grammar::builder()
            .start("S")
            .rule("S", [Symbol::nonterminal("A"), Symbol::nonterminal("B")])
            .rule("A", [Symbol::literal("a")])
            .rule("B", [])
            .build()
            .unwrap();
        assert_eq!(grammar.start(), NonterminalId::new(0));
        assert_eq!(grammar.nonterminal_id("A"), Some(NonterminalId::new(1)));
        assert_eq!(grammar.name(NonterminalId::new(2)), "B");
        assert_eq!(grammar.rule_count(), 3);
        assert_eq!(grammar.nonterminal_id("C"), None);
    }

    #[test]
    fn test_missing_start_symbol() {
        let result = Grammar::builder().rule("S", [Symbol::literal("a")]).build();
        assert_eq!(result.unwrap_err(), GrammarError::MissingStartSymbol);
        let result = Grammar::builder()
            .start("T")
            .rule("S", [Symbol::literal("a")])
            .build();
        assert_eq!(result.unwrap_err(), GrammarError::MissingStartSymbol);
    }

    #[test]
    fn test_duplicate_parameter() {
        let result = Grammar::builder()
            .start("E")
            .parameters("E", ["l", "l"])
            .rule("E", [Symbol::literal("a")])
            .build();
        assert_eq!(
            result.unwrap_err(),
            GrammarError::DuplicateParameter {
                nonterminal: "E".into(),
                parameter: "l".into()
            }
        );
    }

    #[test]
    fn test_display() {
        let grammar = Grammar::builder()
            .start("E")
            .parameters("E", ["p"])
            .add_rule(
                "E",
                Rule::new([Symbol::literal("a")]).returning(Expression::var("p")),
            )
            .rule("E", [])
            .build()
            .unwrap();
        assert_eq!(grammar.to_string(), "E(p) ::= 'a' { return p; }\n    | ε\n");
    }
}
