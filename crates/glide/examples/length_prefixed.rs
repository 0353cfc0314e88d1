//! Data-dependent grammar example
//!
//! A length-prefixed string format such as `5:hello`, which no context-free
//! grammar can describe. The number is parsed by a nonterminal that returns
//! its value, and a counted loop consumes exactly that many characters.

use glide::datadep::Builtin;
use glide::grammar::{Grammar, Rule, Symbol};
use glide::input::Input;
use glide::parser::{GllParser, ParserConfig};
use glide::{Expression, Statement};

fn main() {
    let number = Rule::new([Symbol::regex("[0-9]+").labelled("digits")])
        .returning(Expression::call(Builtin::ToInt, [Expression::yield_of("digits")]));

    let grammar = Grammar::builder()
        .start("Items")
        .rule("Items", [Symbol::nonterminal("Item")])
        .rule("Items", [Symbol::nonterminal("Item"), Symbol::nonterminal("Items")])
        .rule(
            "Item",
            [
                Symbol::code(
                    Symbol::nonterminal("Number").labelled("n"),
                    [Statement::declare("rest", Expression::val("n"))],
                ),
                Symbol::literal(":"),
                Symbol::while_loop(
                    Expression::var("rest").gt(0.into()),
                    Symbol::code(
                        Symbol::any(),
                        [Statement::assign("rest", Expression::var("rest").minus(1.into()))],
                    ),
                ),
            ],
        )
        .add_rule("Number", number)
        .build()
        .expect("Failed to build grammar");

    let mut parser =
        GllParser::from_grammar(&grammar, ParserConfig::default()).expect("Failed to compile grammar");

    for text in ["5:hello", "3:abc2:de", "3:a:b1::", "4:abc"] {
        let result = parser.parse(&Input::new(text));
        match result.error() {
            None => println!("{text:>12}  ok ({} descriptors)", result.statistics().descriptors),
            Some(error) => println!("{text:>12}  {error}"),
        }
    }
}
