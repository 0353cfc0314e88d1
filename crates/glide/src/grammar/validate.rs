use super::builder::{Grammar, NonterminalId};
use super::symbol::{Symbol, SymbolKind};
use crate::error::GrammarError;

/// Validate a grammar for undefined references
///
/// Left recursion is accepted: the parser handles it.
///
/// # Errors
///
/// [`GrammarError::UndefinedNonterminal`] for a call to a name that was never
/// given rules or parameters.
pub fn validate_grammar(grammar: &Grammar) -> Result<(), GrammarError> {
    for (_, decl) in grammar.nonterminals() {
        for rule in &decl.rules {
            check_undefined_nonterminals(grammar, &rule.body, &decl.name)?;
        }
    }
    Ok(())
}

fn check_undefined_nonterminals(
    grammar: &Grammar,
    symbols: &[Symbol],
    referenced_from: &str,
) -> Result<(), GrammarError> {
    let mut result = Ok(());
    walk_symbols(symbols, &mut |symbol| {
        if let SymbolKind::Nonterminal { name, .. } = &symbol.kind
            && result.is_ok()
            && grammar.nonterminal_id(name).is_none()
        {
            result = Err(GrammarError::UndefinedNonterminal {
                name: name.clone(),
                referenced_from: referenced_from.into(),
            });
        }
    });
    result
}

/// Visit every symbol of a sequence, including nested ones, in order
pub fn walk_symbols(symbols: &[Symbol], visit: &mut impl FnMut(&Symbol)) {
    for symbol in symbols {
        walk_symbol(symbol, visit);
    }
}

fn walk_symbol(symbol: &Symbol, visit: &mut impl FnMut(&Symbol)) {
    visit(symbol);
    match &symbol.kind {
        SymbolKind::Block(symbols) => walk_symbols(symbols, visit),
        SymbolKind::Code { symbol, .. }
        | SymbolKind::Conditional { symbol, .. }
        | SymbolKind::IfThen { then: symbol, .. }
        | SymbolKind::While { body: symbol, .. } => walk_symbol(symbol, visit),
        SymbolKind::IfThenElse {
            then, otherwise, ..
        } => {
            walk_symbol(then, visit);
            walk_symbol(otherwise, visit);
        }
        SymbolKind::Terminal(_) | SymbolKind::Nonterminal { .. } | SymbolKind::Epsilon => {}
    }
}

/// Nonterminals with an alternative that starts by calling themselves
#[must_use]
pub fn directly_left_recursive(grammar: &Grammar) -> Vec<NonterminalId> {
    grammar
        .nonterminals()
        .filter(|(_, decl)| {
            decl.rules.iter().any(|rule| {
                rule.body.first().is_some_and(|symbol| {
                    matches!(&symbol.kind, SymbolKind::Nonterminal { name, .. } if *name == decl.name)
                })
            })
        })
        .map(|(id, _)| id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datadep::expr::Expression;

    #[test]
    fn test_undefined_nonterminal_in_nested_symbol() {
        let result = Grammar::builder()
            .start("S")
            .rule(
                "S",
                [Symbol::while_loop(
                    Expression::bool(true),
                    Symbol::block([Symbol::literal("a"), Symbol::nonterminal("Missing")]),
                )],
            )
            .build();
        assert_eq!(
            result.unwrap_err(),
            GrammarError::UndefinedNonterminal {
                name: "Missing".into(),
                referenced_from: "S".into()
            }
        );
    }

    #[test]
    fn test_parameters_alone_define_a_nonterminal() {
        let result = Grammar::builder()
            .start("S")
            .parameters("Empty", [])
            .rule("S", [Symbol::nonterminal("Empty")])
            .build();
        assert!(result.is_ok());
    }

    #[test]
    fn test_left_recursion_is_reported_not_rejected() {
        let grammar = Grammar::builder()
            .start("E")
            .rule("E", [Symbol::nonterminal("E"), Symbol::literal("+"), Symbol::literal("a")])
            .rule("E", [Symbol::literal("a")])
            .rule("F", [Symbol::literal("b"), Symbol::nonterminal("F")])
            .build()
            .unwrap();
        assert_eq!(directly_left_recursive(&grammar), vec![NonterminalId::new(0)]);
    }
}
