//! Lowering of a [`Grammar`] into the slot graph.
//!
//! Every nonterminal gets an entry slot and every alternative a chain of
//! slots, one per dotted position, ending in an end-of-rule slot. Control
//! symbols are desugared into epsilon, conditional and code transitions over
//! inner slots named after the position they start from. Variable references
//! are resolved to environment addresses on the way.

use compact_str::{CompactString, format_compact};
use smallvec::SmallVec;

use super::first;
use super::slot::{GrammarSlot, SlotId, SlotKind};
use super::transition::{
    CallTransition, EpsilonAction, ExitBinding, Guard, Position, ReturnSite, TerminalTransition,
    Transition, TransitionKind,
};
use super::{GrammarGraph, NonterminalInfo};
use crate::FastMap;
use crate::datadep::{Expression, Scopes, Statement};
use crate::error::GrammarError;
use crate::grammar::validate::directly_left_recursive;
use crate::grammar::{Condition, Grammar, NonterminalId, Rule, Symbol, SymbolKind};
use crate::terminal::{Pattern, Terminal, TerminalId};

/// Name of the hidden binding holding the left extent of an unlabelled
/// control symbol with postconditions
const EXTENT_MARKER: &str = "@extent";

/// Whether SPPF nodes have been produced on the paths reaching a point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Produced {
    Nothing,
    Maybe,
    Always,
}

impl Produced {
    const fn join(self, other: Self) -> Self {
        match (self, other) {
            (Self::Nothing, Self::Nothing) => Self::Nothing,
            (Self::Always, Self::Always) => Self::Always,
            _ => Self::Maybe,
        }
    }
}

struct RuleContext {
    head: NonterminalId,
    end: SlotId,
    scopes: Scopes,
    produced: Produced,
    loop_depth: u32,
    /// Name of the top-level position inner slots are named after
    prefix: CompactString,
    counter: usize,
}

impl RuleContext {
    fn position(&self, destination: SlotId) -> Position {
        Position::classify(
            self.produced == Produced::Nothing && self.loop_depth == 0,
            destination == self.end,
        )
    }
}

struct Compiler<'g> {
    grammar: &'g Grammar,
    slots: Vec<GrammarSlot>,
    terminals: Vec<Terminal>,
    terminal_index: FastMap<CompactString, TerminalId>,
    names: FastMap<CompactString, SlotId>,
    entries: Vec<SlotId>,
    first_slots: Vec<SmallVec<[SlotId; 4]>>,
}

/// Compile `grammar` into its slot graph
pub(crate) fn compile(grammar: &Grammar) -> Result<GrammarGraph, GrammarError> {
    let start = grammar.nonterminal(grammar.start());
    if start.arity() != 0 {
        return Err(GrammarError::ArityMismatch {
            nonterminal: start.name.clone(),
            expected: start.arity(),
            found: 0,
            context: "start symbol".into(),
        });
    }

    let mut compiler = Compiler {
        grammar,
        slots: Vec::new(),
        terminals: Vec::new(),
        terminal_index: FastMap::default(),
        names: FastMap::default(),
        entries: Vec::with_capacity(grammar.nonterminal_count()),
        first_slots: vec![SmallVec::new(); grammar.nonterminal_count()],
    };
    for (id, decl) in grammar.nonterminals() {
        let entry = compiler.allocate(id, SlotKind::Entry, decl.name.clone());
        compiler.entries.push(entry);
    }
    for (id, decl) in grammar.nonterminals() {
        for (index, rule) in decl.rules.iter().enumerate() {
            compiler.compile_rule(id, index, rule)?;
        }
    }
    Ok(compiler.finish())
}

/// `S ::= A . B 'c'`
fn dotted(head: &str, symbols: &[String], dot: usize) -> CompactString {
    let mut name = format_compact!("{head} ::=");
    for (index, symbol) in symbols.iter().enumerate() {
        if index == dot {
            name.push_str(" .");
        }
        name.push(' ');
        name.push_str(symbol);
    }
    if dot == symbols.len() {
        name.push_str(" .");
    }
    name
}

impl<'g> Compiler<'g> {
    fn finish(self) -> GrammarGraph {
        let Self {
            grammar,
            slots,
            terminals,
            names,
            entries,
            first_slots,
            ..
        } = self;

        let firsts = first::compute(&slots, &terminals, &first_slots);
        let nonterminals: Vec<NonterminalInfo> = grammar
            .nonterminals()
            .zip(first_slots)
            .zip(firsts)
            .map(|(((id, decl), first_slots), first)| NonterminalInfo {
                id,
                name: decl.name.clone(),
                parameters: decl.parameters.clone(),
                entry: entries[id.index()],
                first_slots,
                first,
            })
            .collect();
        let nonterminal_names = nonterminals
            .iter()
            .map(|info| (info.name.clone(), info.id))
            .collect();

        GrammarGraph {
            slots,
            terminals,
            nonterminals,
            names,
            nonterminal_names,
            start: grammar.start(),
            left_recursive: directly_left_recursive(grammar),
        }
    }

    fn allocate(&mut self, nonterminal: NonterminalId, kind: SlotKind, name: CompactString) -> SlotId {
        let id = SlotId::new(self.slots.len());
        let mut unique = name.clone();
        let mut suffix = 2;
        while self.names.contains_key(&unique) {
            unique = format_compact!("{name} #{suffix}");
            suffix += 1;
        }
        self.names.insert(unique.clone(), id);
        self.slots.push(GrammarSlot {
            id,
            nonterminal,
            kind,
            name: unique,
            transitions: SmallVec::new(),
            return_site: None,
        });
        id
    }

    fn inner(&mut self, ctx: &mut RuleContext) -> SlotId {
        ctx.counter += 1;
        let name = format_compact!("{} [{}]", ctx.prefix, ctx.counter);
        self.allocate(ctx.head, SlotKind::Body, name)
    }

    fn connect(&mut self, origin: SlotId, destination: SlotId, kind: TransitionKind) {
        self.slots[origin.index()].transitions.push(Transition {
            origin,
            destination,
            kind,
        });
    }

    fn intern(&mut self, pattern: &Pattern, head: NonterminalId) -> Result<TerminalId, GrammarError> {
        let key = format_compact!("{pattern}");
        if let Some(&id) = self.terminal_index.get(&key) {
            return Ok(id);
        }
        let terminal = Terminal::compile(pattern, self.grammar.name(head))?;
        let id = TerminalId::new(self.terminals.len());
        self.terminals.push(terminal);
        self.terminal_index.insert(key, id);
        Ok(id)
    }

    fn compile_rule(&mut self, head: NonterminalId, index: usize, rule: &Rule) -> Result<(), GrammarError> {
        let grammar = self.grammar;
        let decl = grammar.nonterminal(head);
        let rendered: Vec<String> = rule.body.iter().map(ToString::to_string).collect();

        let mut positions = Vec::with_capacity(rule.body.len() + 1);
        for dot in 0..=rule.body.len() {
            let kind = if dot == rule.body.len() {
                SlotKind::End {
                    rule: index,
                    returns: None,
                }
            } else {
                SlotKind::Body
            };
            positions.push(self.allocate(head, kind, dotted(&decl.name, &rendered, dot)));
        }
        let end = positions[rule.body.len()];
        self.first_slots[head.index()].push(positions[0]);

        let mut ctx = RuleContext {
            head,
            end,
            scopes: Scopes::new(&decl.name, decl.parameters.iter().cloned()),
            produced: Produced::Nothing,
            loop_depth: 0,
            prefix: CompactString::default(),
            counter: 0,
        };
        for (dot, symbol) in rule.body.iter().enumerate() {
            ctx.prefix = self.slots[positions[dot].index()].name.clone();
            ctx.counter = 0;
            self.compile_symbol(&mut ctx, symbol, positions[dot], positions[dot + 1])?;
        }

        let returns = rule
            .returns
            .as_ref()
            .map(|expression| ctx.scopes.resolve_expression(expression))
            .transpose()?;
        self.slots[end.index()].kind = SlotKind::End {
            rule: index,
            returns,
        };
        Ok(())
    }

    fn compile_symbol(
        &mut self,
        ctx: &mut RuleContext,
        symbol: &Symbol,
        from: SlotId,
        to: SlotId,
    ) -> Result<(), GrammarError> {
        match &symbol.kind {
            SymbolKind::Terminal(pattern) => self.compile_terminal(ctx, symbol, pattern, from, to),
            SymbolKind::Nonterminal { name, arguments } => {
                self.compile_call(ctx, symbol, name, arguments, from, to)
            }
            _ => self.compile_control(ctx, symbol, from, to),
        }
    }

    /// Entry epsilons declaring the symbol's label and variable
    fn declare_bindings(
        &mut self,
        ctx: &mut RuleContext,
        symbol: &Symbol,
        mut from: SlotId,
    ) -> (SlotId, ExitBinding) {
        let mut exit = ExitBinding::default();
        if let Some(label) = &symbol.label {
            let next = self.inner(ctx);
            self.connect(from, next, TransitionKind::Epsilon(EpsilonAction::DeclareLabel(label.clone())));
            exit.label = Some(ctx.scopes.declare(label));
            from = next;
        }
        if let Some(variable) = &symbol.variable {
            let next = self.inner(ctx);
            self.connect(
                from,
                next,
                TransitionKind::Epsilon(EpsilonAction::DeclareVariable(variable.clone())),
            );
            exit.variable = Some(ctx.scopes.declare(variable));
            from = next;
        }
        (from, exit)
    }

    fn compile_terminal(
        &mut self,
        ctx: &mut RuleContext,
        symbol: &Symbol,
        pattern: &Pattern,
        from: SlotId,
        to: SlotId,
    ) -> Result<(), GrammarError> {
        let terminal = self.intern(pattern, ctx.head)?;
        let preconditions = self.guards(ctx, &symbol.preconditions)?;
        let (from, exit) = self.declare_bindings(ctx, symbol, from);
        let postconditions = self.guards(ctx, &symbol.postconditions)?;

        let position = ctx.position(to);
        self.connect(
            from,
            to,
            TransitionKind::Terminal(TerminalTransition {
                terminal,
                position,
                exit,
                preconditions,
                postconditions,
            }),
        );
        ctx.produced = Produced::Always;
        Ok(())
    }

    fn compile_call(
        &mut self,
        ctx: &mut RuleContext,
        symbol: &Symbol,
        name: &str,
        arguments: &[Expression],
        from: SlotId,
        to: SlotId,
    ) -> Result<(), GrammarError> {
        let grammar = self.grammar;
        let callee = grammar
            .nonterminal_id(name)
            .ok_or_else(|| GrammarError::UndefinedNonterminal {
                name: name.into(),
                referenced_from: grammar.name(ctx.head).into(),
            })?;
        let expected = grammar.nonterminal(callee).arity();
        if expected != arguments.len() {
            return Err(GrammarError::ArityMismatch {
                nonterminal: name.into(),
                expected,
                found: arguments.len(),
                context: symbol.to_string().into(),
            });
        }

        let arguments = ctx.scopes.resolve_all(arguments)?;
        let preconditions = self.guards(ctx, &symbol.preconditions)?;
        let (from, exit) = self.declare_bindings(ctx, symbol, from);
        let postconditions = self.guards(ctx, &symbol.postconditions)?;

        let position = ctx.position(to);
        self.connect(
            from,
            to,
            TransitionKind::Call(CallTransition {
                callee,
                arguments,
                preconditions,
            }),
        );
        self.slots[to.index()].return_site = Some(ReturnSite {
            position,
            exit,
            postconditions,
        });
        ctx.produced = Produced::Always;
        Ok(())
    }

    /// Wrap a control symbol with its condition checks and label
    fn compile_control(
        &mut self,
        ctx: &mut RuleContext,
        symbol: &Symbol,
        mut from: SlotId,
        to: SlotId,
    ) -> Result<(), GrammarError> {
        if !symbol.preconditions.is_empty() {
            let guards = self.guards(ctx, &symbol.preconditions)?;
            let next = self.inner(ctx);
            self.connect(
                from,
                next,
                TransitionKind::Epsilon(EpsilonAction::Check { guards, extent: None }),
            );
            from = next;
        }
        let (mut from, exit) = self.declare_bindings(ctx, symbol, from);
        if exit.label.is_none() && symbol.postconditions.is_empty() {
            return self.compile_structure(ctx, &symbol.kind, from, to);
        }

        // postconditions need the left extent; unlabelled symbols keep it in
        // a marker no expression can name
        let mut extent = exit.label;
        if extent.is_none() {
            let next = self.inner(ctx);
            self.connect(
                from,
                next,
                TransitionKind::Epsilon(EpsilonAction::DeclareLabel(EXTENT_MARKER.into())),
            );
            extent = Some(ctx.scopes.declare(EXTENT_MARKER));
            from = next;
        }

        let mut end = self.inner(ctx);
        self.compile_structure(ctx, &symbol.kind, from, end)?;
        if let Some(label) = exit.label {
            let next = if symbol.postconditions.is_empty() {
                to
            } else {
                self.inner(ctx)
            };
            self.connect(end, next, TransitionKind::Epsilon(EpsilonAction::CloseLabel(label)));
            end = next;
        }
        if !symbol.postconditions.is_empty() {
            let guards = self.guards(ctx, &symbol.postconditions)?;
            self.connect(end, to, TransitionKind::Epsilon(EpsilonAction::Check { guards, extent }));
        }
        Ok(())
    }

    fn compile_structure(
        &mut self,
        ctx: &mut RuleContext,
        kind: &SymbolKind,
        from: SlotId,
        to: SlotId,
    ) -> Result<(), GrammarError> {
        match kind {
            SymbolKind::Terminal(_) | SymbolKind::Nonterminal { .. } => {
                unreachable!("terminals and calls are compiled by `compile_symbol`")
            }
            SymbolKind::Epsilon => {
                self.connect(from, to, TransitionKind::Epsilon(EpsilonAction::Plain));
            }
            SymbolKind::Block(symbols) => {
                let mut current = self.inner(ctx);
                self.connect(from, current, TransitionKind::Epsilon(EpsilonAction::OpenScope));
                ctx.scopes.push();
                for symbol in symbols {
                    let next = self.inner(ctx);
                    self.compile_symbol(ctx, symbol, current, next)?;
                    current = next;
                }
                ctx.scopes.pop();
                self.connect(current, to, TransitionKind::Epsilon(EpsilonAction::CloseScope));
            }
            SymbolKind::Code { symbol, statements } => {
                let mid = self.inner(ctx);
                self.compile_symbol(ctx, symbol, from, mid)?;
                let statements = statements
                    .iter()
                    .map(|statement| ctx.scopes.resolve_statement(statement))
                    .collect::<Result<Vec<Statement>, _>>()?;
                self.connect(mid, to, TransitionKind::Code(statements));
            }
            SymbolKind::Conditional { symbol, condition } => {
                let mid = self.inner(ctx);
                self.compile_symbol(ctx, symbol, from, mid)?;
                let condition = ctx.scopes.resolve_expression(condition)?;
                self.connect(
                    mid,
                    to,
                    TransitionKind::Conditional {
                        condition,
                        otherwise: None,
                    },
                );
            }
            SymbolKind::IfThen { condition, then } => {
                let condition = ctx.scopes.resolve_expression(condition)?;
                let branch = self.inner(ctx);
                self.connect(
                    from,
                    branch,
                    TransitionKind::Conditional {
                        condition,
                        otherwise: Some(to),
                    },
                );
                let before = ctx.produced;
                self.compile_branch(ctx, then, branch, to)?;
                ctx.produced = before.join(ctx.produced);
            }
            SymbolKind::IfThenElse {
                condition,
                then,
                otherwise,
            } => {
                let condition = ctx.scopes.resolve_expression(condition)?;
                let then_start = self.inner(ctx);
                let else_start = self.inner(ctx);
                self.connect(
                    from,
                    then_start,
                    TransitionKind::Conditional {
                        condition,
                        otherwise: Some(else_start),
                    },
                );
                let before = ctx.produced;
                self.compile_branch(ctx, then, then_start, to)?;
                let after_then = ctx.produced;
                ctx.produced = before;
                self.compile_branch(ctx, otherwise, else_start, to)?;
                ctx.produced = after_then.join(ctx.produced);
            }
            SymbolKind::While { condition, body } => {
                let condition = ctx.scopes.resolve_expression(condition)?;
                let body_start = self.inner(ctx);
                self.connect(
                    from,
                    body_start,
                    TransitionKind::Conditional {
                        condition,
                        otherwise: Some(to),
                    },
                );
                let before = ctx.produced;
                ctx.loop_depth += 1;
                self.compile_branch(ctx, body, body_start, from)?;
                ctx.loop_depth -= 1;
                ctx.produced = before.join(ctx.produced);
            }
        }
        Ok(())
    }

    /// `start -> open scope -> symbol -> close scope -> to`
    fn compile_branch(
        &mut self,
        ctx: &mut RuleContext,
        symbol: &Symbol,
        start: SlotId,
        to: SlotId,
    ) -> Result<(), GrammarError> {
        let open = self.inner(ctx);
        self.connect(start, open, TransitionKind::Epsilon(EpsilonAction::OpenScope));
        ctx.scopes.push();
        let close = self.inner(ctx);
        self.compile_symbol(ctx, symbol, open, close)?;
        ctx.scopes.pop();
        self.connect(close, to, TransitionKind::Epsilon(EpsilonAction::CloseScope));
        Ok(())
    }

    fn guards(&mut self, ctx: &RuleContext, conditions: &[Condition]) -> Result<Vec<Guard>, GrammarError> {
        conditions
            .iter()
            .map(|condition| self.guard(ctx, condition))
            .collect()
    }

    fn guard(&mut self, ctx: &RuleContext, condition: &Condition) -> Result<Guard, GrammarError> {
        let guard = match condition {
            Condition::DataDependent(expression) => {
                Guard::Expression(ctx.scopes.resolve_expression(expression)?)
            }
            Condition::Follow(pattern) => Guard::Follow(self.intern(pattern, ctx.head)?),
            Condition::NotFollow(pattern) => Guard::NotFollow(self.intern(pattern, ctx.head)?),
            Condition::Precede(pattern) => Guard::Precede(self.intern(pattern, ctx.head)?),
            Condition::NotPrecede(pattern) => Guard::NotPrecede(self.intern(pattern, ctx.head)?),
            Condition::NotMatch(pattern) => Guard::NotMatch(self.intern(pattern, ctx.head)?),
            Condition::StartOfLine => Guard::StartOfLine,
            Condition::EndOfLine => Guard::EndOfLine,
            Condition::EndOfFile => Guard::EndOfFile,
        };
        Ok(guard)
    }
}
