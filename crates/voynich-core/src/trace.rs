//! Execution trace: one record per executed instruction.

use serde::Serialize;

use crate::grammar::Verdict;
use crate::state::{MachineState, OperatorTag, StateVector};
use crate::token::Token;

/// One VM step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionRecord {
    pub token: Token,
    pub verdict: Verdict,
    pub op: OperatorTag,
    pub vector: StateVector,
    pub state_before: MachineState,
    pub state_after: MachineState,
}

impl ExecutionRecord {
    /// True when the step left the state unchanged.
    pub fn is_identity(&self) -> bool {
        self.state_before == self.state_after
    }
}

/// Ordered, immutable log of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ExecutionTrace {
    records: Vec<ExecutionRecord>,
}

impl ExecutionTrace {
    pub(crate) fn from_records(records: Vec<ExecutionRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[ExecutionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ExecutionRecord> {
        self.records.iter()
    }

    /// State after the last step, if any step ran.
    pub fn final_state(&self) -> Option<MachineState> {
        self.records.last().map(|r| r.state_after)
    }
}

impl<'a> IntoIterator for &'a ExecutionTrace {
    type Item = &'a ExecutionRecord;
    type IntoIter = std::slice::Iter<'a, ExecutionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
