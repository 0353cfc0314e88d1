#![no_main]
use glide::grammar::{Condition, Grammar, Symbol};
use glide::input::Input;
use glide::parser::{GllParser, ParserConfig, WorklistOrder};
use glide::sppf::visit::{count_derivations, render};
use glide::Expression;
use libfuzzer_sys::fuzz_target;

/// An ambiguous grammar with left recursion, nullable rules and a
/// data-dependent guard
fn grammar() -> Option<Grammar> {
    Grammar::builder()
        .start("S")
        .rule("S", [Symbol::nonterminal("S"), Symbol::nonterminal("S")])
        .rule("S", [Symbol::nonterminal("S"), Symbol::literal("+"), Symbol::nonterminal("S")])
        .rule("S", [Symbol::regex("[a-c]"), Symbol::nonterminal("N")])
        .rule("S", [Symbol::literal("("), Symbol::nonterminal("S"), Symbol::literal(")")])
        .rule(
            "N",
            [Symbol::literal("x")
                .labelled("x")
                .postcondition(Condition::when(Expression::lext("x").gt(0.into())))],
        )
        .rule("N", [])
        .build()
        .ok()
}

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    // Ambiguity grows exponentially with length
    if text.chars().count() > 24 {
        return;
    }
    let Some(grammar) = grammar() else {
        return;
    };
    let input = Input::new(text);

    let Ok(mut fifo) = GllParser::from_grammar(&grammar, ParserConfig::default()) else {
        return;
    };
    let mut lifo = GllParser::new(
        std::sync::Arc::clone(fifo.graph()),
        ParserConfig::new().with_worklist(WorklistOrder::Lifo),
    );

    let first = fifo.parse(&input);
    let second = lifo.parse(&input);
    assert_eq!(first.is_success(), second.is_success());

    if let (Some((a, ra)), Some((b, rb))) = (first.forest(), second.forest()) {
        assert_eq!(render(a, ra, fifo.graph(), &input), render(b, rb, lifo.graph(), &input));
        let _ = count_derivations(a, ra);
    }
    if let Some(error) = first.error() {
        assert!(error.index() <= input.len());
    }
});
