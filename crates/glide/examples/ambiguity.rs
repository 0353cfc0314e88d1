//! Ambiguous expression grammar example
//!
//! This example demonstrates how to:
//! 1. Build a left-recursive, ambiguous grammar
//! 2. Parse input into a shared packed parse forest
//! 3. Count derivations and inspect ambiguous nodes
//! 4. Report a parse failure with its input context

use glide::error::diagnostics::format_with_context;
use glide::grammar::{Grammar, Symbol};
use glide::input::Input;
use glide::parser::{GllParser, ParserConfig};
use glide::sppf::ForestStats;
use glide::sppf::visit::{count_derivations, reachable, render, yield_text};

fn main() {
    let grammar = Grammar::builder()
        .start("E")
        .rule("E", [Symbol::nonterminal("E"), Symbol::literal("+"), Symbol::nonterminal("E")])
        .rule("E", [Symbol::nonterminal("E"), Symbol::literal("*"), Symbol::nonterminal("E")])
        .rule("E", [Symbol::regex("[0-9]+")])
        .build()
        .expect("Failed to build grammar");

    let mut parser =
        GllParser::from_grammar(&grammar, ParserConfig::default()).expect("Failed to compile grammar");
    println!("Grammar graph: {:?}", parser.graph().statistics());

    for text in ["1+2*3", "1+2*3+4", "1+*2"] {
        let input = Input::new(text);
        let result = parser.parse(&input);
        println!("\nInput: {text}");
        println!("  statistics: {:?}", result.statistics());

        match result.forest() {
            Some((forest, root)) => {
                let stats = ForestStats::collect(forest, root);
                println!(
                    "  derivations: {:?}, reachable nodes: {}, ambiguous: {}",
                    count_derivations(forest, root),
                    stats.nodes,
                    stats.ambiguous
                );
                for id in reachable(forest, root) {
                    let node = forest.node(id);
                    if node.is_ambiguous() {
                        println!(
                            "  `{}` has {} readings",
                            yield_text(forest, id, &input),
                            node.packed().len()
                        );
                    }
                }
                if text.len() <= 5 {
                    println!("{}", render(forest, root, parser.graph(), &input));
                }
            }
            None => {
                if let Some(error) = result.error() {
                    println!("{}", format_with_context(error, &input));
                }
            }
        }
    }
}
