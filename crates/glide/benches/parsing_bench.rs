use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use glide::grammar::{Condition, Grammar, Symbol};
use glide::input::Input;
use glide::parser::{GllParser, GssIdentity, LookupDistribution, ParserConfig};
use glide::{Expression, GrammarGraph};
use std::hint::black_box;

fn expression_grammar() -> Grammar {
    Grammar::builder()
        .start("E")
        .rule("E", [Symbol::nonterminal("E"), Symbol::literal("+"), Symbol::nonterminal("T")])
        .rule("E", [Symbol::nonterminal("T")])
        .rule("T", [Symbol::nonterminal("T"), Symbol::literal("*"), Symbol::nonterminal("F")])
        .rule("T", [Symbol::nonterminal("F")])
        .rule("F", [Symbol::regex("[0-9]+")])
        .rule("F", [Symbol::literal("("), Symbol::nonterminal("E"), Symbol::literal(")")])
        .build()
        .unwrap()
}

fn ambiguous_grammar() -> Grammar {
    Grammar::builder()
        .start("S")
        .rule("S", [Symbol::nonterminal("S"), Symbol::nonterminal("S")])
        .rule("S", [Symbol::literal("a")])
        .build()
        .unwrap()
}

fn precedence_grammar() -> Grammar {
    let at_most = |level: i64| Condition::when(Expression::var("p").le(level.into()));
    Grammar::builder()
        .start("S")
        .rule("S", [Symbol::call("E", [Expression::int(0)])])
        .parameters("E", ["p"])
        .rule(
            "E",
            [
                Symbol::call("E", [Expression::int(1)]).precondition(at_most(1)),
                Symbol::literal("+"),
                Symbol::call("E", [Expression::int(2)]),
            ],
        )
        .rule(
            "E",
            [
                Symbol::call("E", [Expression::int(2)]).precondition(at_most(2)),
                Symbol::literal("*"),
                Symbol::call("E", [Expression::int(3)]),
            ],
        )
        .rule("E", [Symbol::regex("[0-9]+")])
        .build()
        .unwrap()
}

fn arithmetic(terms: usize) -> String {
    (0..terms)
        .map(|i| if i % 3 == 2 { format!("({i}*{i})") } else { i.to_string() })
        .collect::<Vec<_>>()
        .join("+")
}

fn bench_compile(c: &mut Criterion) {
    let grammar = precedence_grammar();
    c.bench_function("compile_precedence_grammar", |b| {
        b.iter(|| black_box(GrammarGraph::compile(black_box(&grammar)).unwrap()));
    });
}

fn bench_unambiguous(c: &mut Criterion) {
    let grammar = expression_grammar();
    let mut group = c.benchmark_group("expression_parsing");
    for terms in [8, 64, 256] {
        let input = Input::new(arithmetic(terms));
        let mut parser = GllParser::from_grammar(&grammar, ParserConfig::default()).unwrap();
        group.bench_with_input(BenchmarkId::new("left_recursive", terms), &input, |b, input| {
            b.iter(|| black_box(parser.parse(black_box(input)).is_success()));
        });
    }
    group.finish();
}

fn bench_ambiguous(c: &mut Criterion) {
    let grammar = ambiguous_grammar();
    let mut group = c.benchmark_group("ambiguous_parsing");
    for len in [8, 16, 32] {
        let input = Input::new("a".repeat(len));
        let mut parser = GllParser::from_grammar(&grammar, ParserConfig::default()).unwrap();
        group.bench_with_input(BenchmarkId::new("s_s_a", len), &input, |b, input| {
            b.iter(|| black_box(parser.parse(black_box(input)).is_success()));
        });
    }
    group.finish();
}

fn bench_data_dependent(c: &mut Criterion) {
    let grammar = precedence_grammar();
    let input = Input::new(arithmetic(64).replace(['(', ')'], ""));
    let mut parser = GllParser::from_grammar(&grammar, ParserConfig::default()).unwrap();
    c.bench_function("precedence_preconditions", |b| {
        b.iter(|| black_box(parser.parse(black_box(&input)).is_success()));
    });
}

fn bench_configurations(c: &mut Criterion) {
    let grammar = expression_grammar();
    let input = Input::new(arithmetic(128));
    let mut group = c.benchmark_group("configurations");
    for (name, gss_identity, lookup_distribution) in [
        ("array_distributed", GssIdentity::Array, LookupDistribution::Distributed),
        ("array_global", GssIdentity::Array, LookupDistribution::Global),
        ("hashmap_distributed", GssIdentity::HashMap, LookupDistribution::Distributed),
        ("hashmap_global", GssIdentity::HashMap, LookupDistribution::Global),
    ] {
        let config = ParserConfig::new()
            .with_gss_identity(gss_identity)
            .with_lookup_distribution(lookup_distribution);
        let mut parser = GllParser::from_grammar(&grammar, config).unwrap();
        group.bench_function(name, |b| {
            b.iter(|| black_box(parser.parse(black_box(&input)).is_success()));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_compile,
    bench_unambiguous,
    bench_ambiguous,
    bench_data_dependent,
    bench_configurations
);
criterion_main!(benches);
