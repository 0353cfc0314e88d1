//! The GLL driver loop.
//!
//! Descriptors are taken from the worklist one at a time and the
//! transitions of their slot are executed. Transitions are the only
//! producers of new descriptors, and every descriptor passes the worklist's
//! seen-set, so the loop terminates for every context-free grammar.

use std::time::Instant;

use compact_str::CompactString;

use super::config::ParserConfig;
use super::descriptor::{Descriptor, Worklist};
use crate::FastMap;
use crate::datadep::{Context, Environment, Value, execute_all};
use crate::error::diagnostics::describe_position;
use crate::error::{EvalError, ParseError, ParseResult, ParseStatistics};
use crate::grammar::NonterminalId;
use crate::graph::{
    CallTransition, EpsilonAction, GrammarGraph, Guard, SlotId, SlotKind, TerminalTransition, TransitionKind,
};
use crate::gss::{Arguments, Gss, GssEdge, GssNodeId, Pop};
use crate::input::Input;
use crate::sppf::{ForestStats, Sppf, SppfNodeId};
use crate::terminal::TerminalId;

/// Deepest point a parse branch died at
#[derive(Debug, Clone, Copy)]
struct Failure {
    index: usize,
    slot: SlotId,
    gss: GssNodeId,
}

/// Per-input tables of a parser, reused across parses
#[derive(Debug, Default)]
pub struct GllParserState {
    pub(crate) gss: Gss,
    pub(crate) sppf: Sppf,
    pub(crate) worklist: Worklist,
    terminal_memo: FastMap<(TerminalId, usize), Option<usize>>,
    failure: Option<Failure>,
    memo_hits: usize,
    eval_errors: usize,
}

impl GllParserState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear every table, sizing them for `graph` and `input`
    pub fn reset(&mut self, graph: &GrammarGraph, input: &Input, config: &ParserConfig) {
        self.gss
            .reset(config.gss_identity, graph.slots().len(), input.len());
        self.sppf = Sppf::for_graph(graph, config.lookup_distribution);
        self.worklist.reset(config.worklist);
        self.terminal_memo.clear();
        self.failure = None;
        self.memo_hits = 0;
        self.eval_errors = 0;
    }

    fn statistics(&self, started: Instant) -> ParseStatistics {
        ParseStatistics {
            descriptors: self.worklist.total(),
            gss_nodes: self.gss.len(),
            gss_edges: self.gss.edge_count(),
            gss_pops: self.gss.pop_count(),
            sppf_nodes: self.sppf.len(),
            packed_nodes: self.sppf.packed_count(),
            ambiguous_nodes: self.sppf.ambiguous_count(),
            reachable_ambiguous_nodes: 0,
            terminal_memo_hits: self.memo_hits,
            eval_errors: self.eval_errors,
            parse_time: started.elapsed(),
        }
    }
}

/// Parse `input` with `graph`, starting from the graph's start symbol
pub(crate) fn parse(
    graph: &GrammarGraph,
    input: &Input,
    config: &ParserConfig,
    state: &mut GllParserState,
) -> ParseResult {
    let started = Instant::now();
    state.reset(graph, input, config);

    let start = graph.nonterminal(graph.start());
    if !start.first.admits(graph.terminals(), input) {
        return ParseResult::Failure {
            error: ParseError::Inadmissible {
                nonterminal: start.name.clone(),
                index: 0,
                found: describe_position(input, 0).into(),
            },
            statistics: state.statistics(started),
        };
    }

    let mut driver = Driver {
        graph,
        input,
        state,
        root: None,
    };
    let environment = Environment::root(std::iter::empty::<(CompactString, Value)>());
    for &slot in &start.first_slots {
        driver.advance(slot, GssNodeId::ROOT, 0, SppfNodeId::DUMMY, environment.clone());
    }
    while let Some(descriptor) = driver.state.worklist.next() {
        driver.execute(descriptor);
    }

    let root = driver.root;
    let failure = driver.state.failure.unwrap_or(Failure {
        index: 0,
        slot: start.entry,
        gss: GssNodeId::ROOT,
    });
    let statistics = state.statistics(started);
    match root {
        Some(root) => ParseResult::Success {
            statistics: ParseStatistics {
                reachable_ambiguous_nodes: ForestStats::collect(&state.sppf, root).ambiguous,
                ..statistics
            },
            forest: std::mem::take(&mut state.sppf),
            root,
        },
        None => ParseResult::Failure {
            error: ParseError::NoDerivation {
                slot: graph.slot(failure.slot).name().into(),
                index: failure.index,
                line: input.line(failure.index),
                column: input.column(failure.index),
                gss: failure.gss,
            },
            statistics,
        },
    }
}

struct Driver<'a> {
    graph: &'a GrammarGraph,
    input: &'a Input,
    state: &'a mut GllParserState,
    /// `start` node over the whole input, once a start rule completed
    root: Option<SppfNodeId>,
}

impl Driver<'_> {
    fn execute(&mut self, descriptor: Descriptor) {
        let graph = self.graph;
        let slot = graph.slot(descriptor.slot);
        if slot.is_end() {
            self.pop(&descriptor);
            return;
        }
        let Descriptor {
            gss,
            index,
            sppf,
            ref environment,
            ..
        } = descriptor;

        for transition in slot.transitions() {
            let destination = transition.destination;
            match &transition.kind {
                TransitionKind::Terminal(terminal) => {
                    self.match_terminal(terminal, &descriptor, destination);
                }
                TransitionKind::Call(call) => {
                    self.call(call, &descriptor, destination);
                }
                TransitionKind::Epsilon(action) => {
                    let Some(environment) = self.epsilon(action, descriptor.slot, gss, index, environment) else {
                        continue;
                    };
                    self.advance(destination, gss, index, sppf, environment);
                }
                TransitionKind::Conditional {
                    condition,
                    otherwise,
                } => match condition.test(&Context::new(self.input, index, environment)) {
                    Ok(true) => self.advance(destination, gss, index, sppf, environment.clone()),
                    Ok(false) => match otherwise {
                        Some(otherwise) => self.advance(*otherwise, gss, index, sppf, environment.clone()),
                        None => self.record_failure(index, descriptor.slot, gss),
                    },
                    Err(_) => self.eval_failed(index, descriptor.slot, gss),
                },
                TransitionKind::Code(statements) => {
                    match execute_all(statements, self.input, index, environment) {
                        Ok(environment) => self.advance(destination, gss, index, sppf, environment),
                        Err(_) => self.eval_failed(index, descriptor.slot, gss),
                    }
                }
            }
        }
    }

    fn match_terminal(&mut self, terminal: &TerminalTransition, descriptor: &Descriptor, destination: SlotId) {
        let Descriptor {
            slot: origin,
            gss,
            index,
            sppf: w,
            ref environment,
        } = *descriptor;
        if !self.check(&terminal.preconditions, index, index, environment, origin, gss) {
            return;
        }
        let Some(length) = self.matched_length(terminal.terminal, index) else {
            self.record_failure(index, origin, gss);
            return;
        };
        let right = index + length;
        let environment = match terminal.exit.apply(environment, index, right, &Value::Null) {
            Ok(environment) => environment,
            Err(_) => return self.eval_failed(index, origin, gss),
        };
        if !self.check(&terminal.postconditions, index, right, &environment, origin, gss) {
            return;
        }

        let context = self.state.gss.node(gss).context();
        let sppf = &mut self.state.sppf;
        let z = sppf.terminal_node(terminal.terminal, index, right);
        let head = self.graph.slot(destination).nonterminal();
        let node = sppf.combine(terminal.position, destination, head, context, w, z);
        self.schedule(destination, gss, right, node, environment);
    }

    fn call(&mut self, call: &CallTransition, descriptor: &Descriptor, return_slot: SlotId) {
        let Descriptor {
            slot: origin,
            gss,
            index,
            ref environment,
            ..
        } = *descriptor;
        if !self.check(&call.preconditions, index, index, environment, origin, gss) {
            return;
        }
        let ctx = Context::new(self.input, index, environment);
        let arguments = match call
            .arguments
            .iter()
            .map(|argument| argument.interpret(&ctx))
            .collect::<Result<Arguments, _>>()
        {
            Ok(arguments) => arguments,
            Err(_) => return self.eval_failed(index, origin, gss),
        };
        self.create(return_slot, call.callee, descriptor, arguments);
    }

    /// Find or create the callee's GSS node and link the caller to it
    ///
    /// A new node starts every alternative of the callee; a new edge is
    /// replayed against every result the node was already popped with.
    fn create(&mut self, return_slot: SlotId, callee: NonterminalId, caller: &Descriptor, arguments: Arguments) {
        let index = caller.index;
        let graph = self.graph;
        let info = graph.nonterminal(callee);
        let context = self.state.sppf.intern_arguments(&arguments);
        let (node, created) = self
            .state
            .gss
            .find_or_create(info.entry, callee, index, arguments.clone(), context);
        if created {
            let parameters = Environment::root(info.parameters.iter().cloned().zip(arguments));
            for &slot in &info.first_slots {
                self.advance(slot, node, index, SppfNodeId::DUMMY, parameters.clone());
            }
        }

        let edge = GssEdge {
            return_slot,
            sppf: caller.sppf,
            caller: caller.gss,
            environment: caller.environment.clone(),
        };
        if self.state.gss.add_edge(node, edge.clone()) {
            let pops = self.state.gss.pops(node).to_vec();
            for pop in &pops {
                self.resume(&edge, pop);
            }
        }
    }

    /// A rule of the called nonterminal reached its end
    fn pop(&mut self, descriptor: &Descriptor) {
        let graph = self.graph;
        let slot = graph.slot(descriptor.slot);
        if descriptor.gss == GssNodeId::ROOT {
            if descriptor.index == self.input.len() {
                self.root = Some(descriptor.sppf);
            } else {
                self.record_failure(descriptor.index, descriptor.slot, descriptor.gss);
            }
            return;
        }

        let value = match slot.kind() {
            SlotKind::End {
                returns: Some(returns),
                ..
            } => match returns.interpret(&Context::new(self.input, descriptor.index, &descriptor.environment)) {
                Ok(value) => value,
                Err(_) => return self.eval_failed(descriptor.index, descriptor.slot, descriptor.gss),
            },
            _ => Value::Null,
        };
        let pop = Pop {
            sppf: descriptor.sppf,
            value,
        };
        if !self.state.gss.record_pop(descriptor.gss, pop.clone()) {
            return;
        }
        let edges = self.state.gss.edges(descriptor.gss).to_vec();
        for edge in &edges {
            self.resume(edge, &pop);
        }
    }

    /// Continue a caller after its callee derived `pop.sppf`
    fn resume(&mut self, edge: &GssEdge, pop: &Pop) {
        let graph = self.graph;
        let slot = graph.slot(edge.return_slot);
        let Some(site) = slot.return_site() else {
            return;
        };
        let callee = self.state.sppf.node(pop.sppf);
        let (left, right) = (callee.left(), callee.right());

        let environment = match site.exit.apply(&edge.environment, left, right, &pop.value) {
            Ok(environment) => environment,
            Err(_) => return self.eval_failed(right, edge.return_slot, edge.caller),
        };
        if !self.check(&site.postconditions, left, right, &environment, edge.return_slot, edge.caller) {
            return;
        }
        let context = self.state.gss.node(edge.caller).context();
        let node = self.state.sppf.combine(
            site.position,
            edge.return_slot,
            slot.nonterminal(),
            context,
            edge.sppf,
            pop.sppf,
        );
        self.schedule(edge.return_slot, edge.caller, right, node, environment);
    }

    /// Apply an epsilon action to the environment; `None` drops the branch
    fn epsilon(
        &mut self,
        action: &EpsilonAction,
        origin: SlotId,
        gss: GssNodeId,
        index: usize,
        environment: &Environment,
    ) -> Option<Environment> {
        let environment = match action {
            EpsilonAction::Plain => environment.clone(),
            EpsilonAction::OpenScope => environment.push_scope(),
            EpsilonAction::CloseScope => environment.pop_scope(),
            EpsilonAction::DeclareLabel(label) => environment.declare(label.clone(), Value::node_entry(index)),
            EpsilonAction::DeclareVariable(variable) => environment.declare(variable.clone(), Value::Null),
            EpsilonAction::CloseLabel(address) => {
                let closed = environment
                    .lookup_at(*address)
                    .ok_or(EvalError::IndexOutOfBounds {
                        index: address.index as usize,
                        len: environment.len(),
                    })
                    .and_then(Value::as_node)
                    .and_then(|node| environment.assign_at(*address, Value::node(node.left, index, Value::Null)));
                match closed {
                    Ok(environment) => environment,
                    Err(_) => {
                        self.eval_failed(index, origin, gss);
                        return None;
                    }
                }
            }
            EpsilonAction::Check { guards, extent } => {
                let left = match extent {
                    Some(address) => match environment
                        .lookup_at(*address)
                        .ok_or(EvalError::IndexOutOfBounds {
                            index: address.index as usize,
                            len: environment.len(),
                        })
                        .and_then(Value::as_node)
                    {
                        Ok(node) => node.left,
                        Err(_) => {
                            self.eval_failed(index, origin, gss);
                            return None;
                        }
                    },
                    None => index,
                };
                if !self.check(guards, left, index, environment, origin, gss) {
                    return None;
                }
                environment.clone()
            }
        };
        Some(environment)
    }

    /// Schedule a descriptor, closing the rule first when `slot` is its end
    fn advance(&mut self, slot: SlotId, gss: GssNodeId, index: usize, w: SppfNodeId, environment: Environment) {
        let graph = self.graph;
        let target = graph.slot(slot);
        let sppf = if target.is_end() {
            let context = self.state.gss.node(gss).context();
            self.state
                .sppf
                .finish_rule(slot, target.nonterminal(), context, w, index)
        } else {
            w
        };
        self.schedule(slot, gss, index, sppf, environment);
    }

    fn schedule(&mut self, slot: SlotId, gss: GssNodeId, index: usize, sppf: SppfNodeId, environment: Environment) {
        self.state.worklist.add(Descriptor {
            slot,
            gss,
            index,
            sppf,
            environment,
        });
    }

    fn matched_length(&mut self, terminal: TerminalId, index: usize) -> Option<usize> {
        if let Some(&length) = self.state.terminal_memo.get(&(terminal, index)) {
            self.state.memo_hits += 1;
            return length;
        }
        let length = self.graph.terminal(terminal).match_at(self.input, index);
        self.state.terminal_memo.insert((terminal, index), length);
        length
    }

    /// Check guards in order; the first that fails drops the branch
    fn check(
        &mut self,
        guards: &[Guard],
        left: usize,
        right: usize,
        environment: &Environment,
        origin: SlotId,
        gss: GssNodeId,
    ) -> bool {
        for guard in guards {
            match guard.holds(self.graph.terminals(), self.input, left, right, environment) {
                Ok(true) => {}
                Ok(false) => {
                    self.record_failure(left, origin, gss);
                    return false;
                }
                Err(_) => {
                    self.eval_failed(left, origin, gss);
                    return false;
                }
            }
        }
        true
    }

    fn eval_failed(&mut self, index: usize, slot: SlotId, gss: GssNodeId) {
        self.state.eval_errors += 1;
        self.record_failure(index, slot, gss);
    }

    /// Keep the deepest failure; later ones win ties
    fn record_failure(&mut self, index: usize, slot: SlotId, gss: GssNodeId) {
        if self.state.failure.is_none_or(|failure| index >= failure.index) {
            self.state.failure = Some(Failure { index, slot, gss });
        }
    }
}
