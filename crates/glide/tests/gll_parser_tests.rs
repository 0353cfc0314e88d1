//! Tests for the GLL parser on plain context-free grammars

use glide::grammar::{Grammar, Symbol};
use glide::gss::GssNodeId;
use glide::input::Input;
use glide::parser::{GllParser, GssIdentity, LookupDistribution, ParserConfig, WorklistOrder};
use glide::sppf::visit::{count_derivations, reachable, render, yield_text};
use glide::sppf::{ForestStats, NodeLabel};
use glide::{ParseError, ParseResult};

fn abc() -> Grammar {
    Grammar::builder()
        .start("S")
        .rule(
            "S",
            [Symbol::nonterminal("A"), Symbol::nonterminal("B"), Symbol::literal("c")],
        )
        .rule("A", [Symbol::literal("a")])
        .rule("A", [])
        .rule("B", [Symbol::literal("a")])
        .rule("B", [])
        .build()
        .unwrap()
}

fn parse(grammar: &Grammar, text: &str) -> ParseResult {
    let mut parser = GllParser::from_grammar(grammar, ParserConfig::default()).unwrap();
    parser.parse(&Input::new(text))
}

/// Number of derivations and reachable ambiguous nodes of a successful parse
fn shape(result: &ParseResult) -> (Option<u128>, usize) {
    let (forest, root) = result.forest().expect("parse should succeed");
    (
        count_derivations(forest, root),
        ForestStats::collect(forest, root).ambiguous,
    )
}

#[test]
fn test_empty_prefix_rules() {
    let grammar = abc();
    let input = Input::new("c");
    let mut parser = GllParser::from_grammar(&grammar, ParserConfig::default()).unwrap();
    let result = parser.parse(&input);
    assert_eq!(shape(&result), (Some(1), 0));

    let (forest, root) = result.forest().unwrap();
    let epsilons = reachable(forest, root)
        .into_iter()
        .filter(|&id| forest.node(id).label() == NodeLabel::Epsilon)
        .count();
    assert_eq!(epsilons, 1);
    assert_eq!(yield_text(forest, root, &input), "c");
}

#[test]
fn test_unexpected_first_character() {
    let result = parse(&abc(), "b");
    let error = result.error().unwrap();
    assert_eq!(error.index(), 0);
    assert!(matches!(error, ParseError::Inadmissible { .. }));
}

#[test]
fn test_ambiguous_split_between_nullable_nonterminals() {
    let result = parse(&abc(), "ac");
    assert_eq!(shape(&result), (Some(2), 1));
    assert_eq!(result.statistics().ambiguous_nodes, 1);
    assert_eq!(result.statistics().reachable_ambiguous_nodes, 1);
}

#[test]
fn test_both_nonterminals_consume() {
    let result = parse(&abc(), "aac");
    assert_eq!(shape(&result), (Some(1), 0));
    // `A ::= 'a'` and `B ::= 'a'` also meet at `S ::= A B . 'c'` over 0..1,
    // a prefix the accepted derivation does not use
    assert_eq!(result.statistics().ambiguous_nodes, 1);
    assert_eq!(result.statistics().reachable_ambiguous_nodes, 0);
}

#[test]
fn test_too_long_input_fails() {
    let result = parse(&abc(), "aaac");
    let error = result.error().unwrap();
    assert_eq!(error.index(), 2);
    assert_eq!(error.slot(), Some("S ::= A B . 'c'"));
}

#[test]
fn test_highly_ambiguous_grammar() {
    let grammar = Grammar::builder()
        .start("S")
        .rule("S", [Symbol::nonterminal("S"), Symbol::nonterminal("S")])
        .rule("S", [Symbol::literal("a")])
        .build()
        .unwrap();
    // Catalan numbers
    for (text, expected) in [("a", 1), ("aa", 1), ("aaa", 2), ("aaaa", 5), ("aaaaa", 14)] {
        let result = parse(&grammar, text);
        assert_eq!(shape(&result).0, Some(expected), "input {text:?}");
    }
}

#[test]
fn test_ambiguous_expression_grammar() {
    let grammar = Grammar::builder()
        .start("E")
        .rule("E", [Symbol::nonterminal("E"), Symbol::literal("+"), Symbol::nonterminal("E")])
        .rule("E", [Symbol::nonterminal("E"), Symbol::literal("*"), Symbol::nonterminal("E")])
        .rule("E", [Symbol::literal("a")])
        .build()
        .unwrap();
    let result = parse(&grammar, "a+a*a");
    assert_eq!(shape(&result), (Some(2), 1));

    let result = parse(&grammar, "a+a*a+a");
    assert_eq!(shape(&result).0, Some(5));
}

#[test]
fn test_left_recursion_is_unambiguous() {
    let grammar = Grammar::builder()
        .start("E")
        .rule("E", [Symbol::nonterminal("E"), Symbol::literal("+"), Symbol::nonterminal("T")])
        .rule("E", [Symbol::nonterminal("T")])
        .rule("T", [Symbol::literal("a")])
        .rule("T", [Symbol::literal("("), Symbol::nonterminal("E"), Symbol::literal(")")])
        .build()
        .unwrap();
    for text in ["a", "a+a", "a+a+a+a", "(a+a)+a", "a+((a))"] {
        let result = parse(&grammar, text);
        assert_eq!(shape(&result), (Some(1), 0), "input {text:?}");
        assert_eq!(result.statistics().ambiguous_nodes, 0);
    }
    assert!(!parse(&grammar, "a+").is_success());
    assert!(!parse(&grammar, "(a").is_success());
}

#[test]
fn test_indirect_left_recursion() {
    let grammar = Grammar::builder()
        .start("A")
        .rule("A", [Symbol::nonterminal("B"), Symbol::literal("x")])
        .rule("A", [Symbol::literal("y")])
        .rule("B", [Symbol::nonterminal("A")])
        .build()
        .unwrap();
    assert_eq!(shape(&parse(&grammar, "yxxx")), (Some(1), 0));
    assert!(!parse(&grammar, "yxy").is_success());
}

#[test]
fn test_cyclic_grammar_terminates() {
    let grammar = Grammar::builder()
        .start("S")
        .rule("S", [Symbol::nonterminal("S")])
        .rule("S", [Symbol::literal("a")])
        .build()
        .unwrap();
    let result = parse(&grammar, "a");
    assert!(result.is_success());
    let (forest, root) = result.forest().unwrap();
    assert_eq!(count_derivations(forest, root), None);
    assert!(forest.node(root).is_ambiguous());
}

#[test]
fn test_empty_input() {
    let grammar = Grammar::builder()
        .start("S")
        .rule("S", [Symbol::literal("a"), Symbol::nonterminal("S")])
        .rule("S", [])
        .build()
        .unwrap();
    let result = parse(&grammar, "");
    assert_eq!(shape(&result), (Some(1), 0));
    assert_eq!(shape(&parse(&grammar, "aaa")), (Some(1), 0));
}

#[test]
fn test_failure_position_and_context() {
    let grammar = Grammar::builder()
        .start("S")
        .rule("S", [Symbol::literal("a"), Symbol::literal("\n"), Symbol::literal("b")])
        .build()
        .unwrap();
    let input = Input::new("a\nc");
    let mut parser = GllParser::from_grammar(&grammar, ParserConfig::default()).unwrap();
    let result = parser.parse(&input);
    let error = result.error().unwrap();
    match error {
        ParseError::NoDerivation {
            index,
            line,
            column,
            gss,
            ..
        } => {
            assert_eq!((*index, *line, *column), (2, 1, 0));
            assert_eq!(*gss, GssNodeId::ROOT);
        }
        other => panic!("expected NoDerivation, got {other:?}"),
    }
    let rendered = error.format_with_context(&input);
    assert!(rendered.contains("input:2:1"));
    assert!(rendered.contains("2 | c"));
}

#[test]
fn test_configurations_agree() {
    let grammar = Grammar::builder()
        .start("E")
        .rule("E", [Symbol::nonterminal("E"), Symbol::literal("+"), Symbol::nonterminal("E")])
        .rule("E", [Symbol::literal("a")])
        .build()
        .unwrap();
    let input = Input::new("a+a+a+a");

    let mut rendered = Vec::new();
    for gss_identity in [GssIdentity::Array, GssIdentity::HashMap] {
        for lookup_distribution in [LookupDistribution::Global, LookupDistribution::Distributed] {
            for worklist in [WorklistOrder::Fifo, WorklistOrder::Lifo] {
                let config = ParserConfig::new()
                    .with_gss_identity(gss_identity)
                    .with_lookup_distribution(lookup_distribution)
                    .with_worklist(worklist);
                let mut parser = GllParser::from_grammar(&grammar, config).unwrap();
                let result = parser.parse(&input);
                let (forest, root) = result.forest().unwrap();
                assert_eq!(count_derivations(forest, root), Some(5));
                rendered.push(render(forest, root, parser.graph(), &input));
            }
        }
    }
    assert!(rendered.windows(2).all(|pair| pair[0] == pair[1]));
}

#[test]
fn test_shared_graph_between_parsers() {
    let grammar = abc();
    let first = GllParser::from_grammar(&grammar, ParserConfig::default()).unwrap();
    let graph = std::sync::Arc::clone(first.graph());
    let handles: Vec<_> = ["c", "ac", "aac"]
        .into_iter()
        .map(|text| {
            let graph = std::sync::Arc::clone(&graph);
            std::thread::spawn(move || {
                let mut parser = GllParser::new(graph, ParserConfig::default());
                parser.parse(&Input::new(text)).is_success()
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap());
    }
}

#[test]
fn test_regex_and_class_terminals() {
    let grammar = Grammar::builder()
        .start("List")
        .rule("List", [Symbol::nonterminal("Item")])
        .rule(
            "List",
            [Symbol::nonterminal("List"), Symbol::literal(","), Symbol::nonterminal("Item")],
        )
        .rule("Item", [Symbol::regex("[a-z]+")])
        .rule("Item", [Symbol::regex("[0-9]+")])
        .build()
        .unwrap();
    let input = Input::new("abc,12,ü");
    let result = parse(&grammar, input.text());
    let error = result.error().unwrap();
    assert_eq!(error.index(), 7);

    let result = parse(&grammar, "abc,12,x");
    assert_eq!(shape(&result), (Some(1), 0));
}
