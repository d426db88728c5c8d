//! Virtual machine over classified instruction streams.
//!
//! The VM consumes instructions one-by-one, like a builder consuming
//! tokens: each step folds the instruction into the current state, appends
//! an edge to the graph and a record to the trace. There is no halt
//! instruction; a run ends when the stream does.

use crate::classify::Instruction;
use crate::error::{CoverageFault, RunError};
use crate::graph::{GraphBuilder, TransitionGraph};
use crate::rule::{StandardRule, TransitionRule};
use crate::state::MachineState;
use crate::trace::{ExecutionRecord, ExecutionTrace};

/// Result of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Run {
    pub trace: ExecutionTrace,
    pub graph: TransitionGraph,
}

/// Deterministic state machine for one line.
#[derive(Debug)]
pub struct Vm<R = StandardRule> {
    rule: R,
    state: MachineState,
    graph: GraphBuilder,
    records: Vec<ExecutionRecord>,
    /// Position the next instruction must carry.
    next_position: usize,
    /// Byte offset where the previous token ended.
    last_end: usize,
}

impl Default for Vm<StandardRule> {
    fn default() -> Self {
        Self::new()
    }
}

impl Vm<StandardRule> {
    /// Create a VM at the origin with the standard rule.
    pub fn new() -> Self {
        Self::with_rule(StandardRule)
    }
}

impl<R: TransitionRule> Vm<R> {
    /// Create a VM at the origin with a custom rule.
    pub fn with_rule(rule: R) -> Self {
        Self {
            rule,
            state: MachineState::ORIGIN,
            graph: GraphBuilder::new(),
            records: Vec::new(),
            next_position: 0,
            last_end: 0,
        }
    }

    /// Current machine state.
    pub fn state(&self) -> MachineState {
        self.state
    }

    /// Number of instructions executed so far.
    pub fn steps(&self) -> usize {
        self.records.len()
    }

    /// Execute one instruction.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::TokenizerCoverageViolation`] if the instruction
    /// is out of position order or overlaps the previous token. The VM is
    /// left unchanged in that case.
    pub fn step(&mut self, instruction: Instruction) -> Result<MachineState, RunError> {
        let position = instruction.token.position();
        if position != self.next_position {
            return Err(CoverageFault::PositionSkipped {
                expected: self.next_position,
                found: position,
            }
            .into());
        }
        let span = instruction.token.span();
        if span.start < self.last_end || span.end < span.start {
            return Err(CoverageFault::Overlap { position }.into());
        }

        let before = self.state;
        let after = self.rule.apply(before, instruction.op, instruction.vector);
        tracing::trace!(
            position,
            token = instruction.token.text(),
            op = %instruction.op,
            %before,
            %after,
            "vm step"
        );

        self.graph.add_edge(before, after, instruction.op, position);
        self.records.push(ExecutionRecord {
            token: instruction.token,
            verdict: instruction.verdict,
            op: instruction.op,
            vector: instruction.vector,
            state_before: before,
            state_after: after,
        });

        self.state = after;
        self.next_position += 1;
        self.last_end = span.end;
        Ok(after)
    }

    /// Finish the run, freezing trace and graph.
    pub fn finish(self) -> Run {
        Run {
            trace: ExecutionTrace::from_records(self.records),
            graph: self.graph.finish(),
        }
    }

    /// Execute a whole stream from the origin.
    ///
    /// # Errors
    ///
    /// Returns the first coverage violation; no partial run is returned.
    pub fn run<I>(rule: R, instructions: I) -> Result<Run, RunError>
    where
        I: IntoIterator<Item = Instruction>,
    {
        let mut vm = Self::with_rule(rule);
        for instruction in instructions {
            vm.step(instruction)?;
        }
        Ok(vm.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Verdict;
    use crate::state::{Depth, Flow, OperatorTag, Phase, StateVector};
    use crate::token::{Span, Token};

    fn instr(
        text: &str,
        position: usize,
        start: usize,
        op: OperatorTag,
        vector: StateVector,
    ) -> Instruction {
        let span = Span::new(start, start + text.len());
        let token = Token::new(text, position, span, None);
        Instruction::new(token, Verdict::PartiallyValid, op, vector)
    }

    fn forward(depth: u8) -> StateVector {
        StateVector::new(Depth::Level(depth), Phase::Final, Flow::Forward)
    }

    #[test]
    fn test_empty_stream() {
        let run = Vm::run(StandardRule, Vec::<Instruction>::new()).unwrap();
        assert!(run.trace.is_empty());
        assert!(run.graph.is_empty());
    }

    #[test]
    fn test_single_step() {
        let mut vm = Vm::new();
        let after = vm
            .step(instr("qokeedy", 0, 0, OperatorTag::Qo, forward(1)))
            .unwrap();
        assert_eq!(after, MachineState::new(1, Phase::Final, Flow::Forward));
        assert_eq!(vm.state(), after);
        assert_eq!(vm.steps(), 1);

        let run = vm.finish();
        assert_eq!(run.trace.len(), 1);
        assert_eq!(run.trace.records()[0].state_before, MachineState::ORIGIN);
        assert_eq!(run.graph.node_count(), 2);
        assert_eq!(run.graph.edges()[0].op, OperatorTag::Qo);
    }

    #[test]
    fn test_unclassified_step_is_identity() {
        let mut vm = Vm::new();
        vm.step(instr("qokeedy", 0, 0, OperatorTag::Qo, forward(2))).unwrap();
        let before = vm.state();
        let after = vm
            .step(instr("dy", 1, 8, OperatorTag::Unclassified, forward(1)))
            .unwrap();
        assert_eq!(before, after);

        let run = vm.finish();
        assert!(run.trace.records()[1].is_identity());
        // The self-loop is still an edge.
        assert_eq!(run.graph.edge_count(), 2);
        assert_eq!(run.graph.node_count(), 2);
    }

    #[test]
    fn test_skipped_position_rejected_without_mutation() {
        let mut vm = Vm::new();
        vm.step(instr("ol", 0, 0, OperatorTag::Ol, forward(1))).unwrap();
        let state = vm.state();
        let err = vm
            .step(instr("dy", 2, 3, OperatorTag::Unclassified, forward(1)))
            .unwrap_err();
        assert_eq!(
            err,
            RunError::TokenizerCoverageViolation(CoverageFault::PositionSkipped {
                expected: 1,
                found: 2
            })
        );
        assert_eq!(vm.state(), state);
        assert_eq!(vm.steps(), 1);
    }

    #[test]
    fn test_overlapping_span_rejected() {
        let stream = vec![
            instr("qokeedy", 0, 0, OperatorTag::Qo, forward(1)),
            instr("dy", 1, 5, OperatorTag::Unclassified, StateVector::UNDEFINED),
        ];
        assert_eq!(
            Vm::run(StandardRule, stream),
            Err(RunError::TokenizerCoverageViolation(CoverageFault::Overlap {
                position: 1
            }))
        );
    }

    #[test]
    fn test_custom_rule() {
        struct Counter;
        impl TransitionRule for Counter {
            fn apply(&self, s: MachineState, _: OperatorTag, _: StateVector) -> MachineState {
                MachineState::new(s.depth + 1, s.phase, s.flow)
            }
        }

        let stream = (0..3).map(|i| {
            instr("y", i, i * 2, OperatorTag::Unclassified, StateVector::UNDEFINED)
        });
        let run = Vm::run(Counter, stream).unwrap();
        assert_eq!(run.trace.final_state().map(|s| s.depth), Some(3));
        assert_eq!(run.graph.node_count(), 4);
    }

    #[test]
    fn test_graph_matches_trace_replay() {
        let stream = vec![
            instr("qokeedy", 0, 0, OperatorTag::Qo, forward(1)),
            instr("ol", 1, 8, OperatorTag::Ol, forward(3)),
            instr("dy", 2, 11, OperatorTag::Unclassified, forward(1)),
            instr("al", 3, 14, OperatorTag::Al, forward(2)),
        ];
        let run = Vm::run(StandardRule, stream).unwrap();
        assert_eq!(TransitionGraph::from_trace(&run.trace), run.graph);
    }
}
